use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use dialoguer::{Input, Select};
use log::{debug, warn};

use crate::config::{self, Config, RenderEngine};
use crate::core::pipeline::{Downloader, Progress};
use crate::core::scanner;
use crate::error::DownloadError;
use crate::models::CoverStatus;
use crate::sources::browser::{HeadlessChrome, StaticPage};
use crate::sources::http::HttpFetcher;
use crate::sources::PageRenderer;

#[derive(Parser)]
#[command(name = "sunodl", about = "suno.com 곡 다운로더 (커버 아트와 ID3 태그 포함)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// MP3를 저장할 디렉토리 (기본값: 설정 파일 또는 music)
    #[arg(short, long, value_name = "DIR", global = true)]
    pub output_dir: Option<PathBuf>,

    /// 아티스트 태그로 기록할 이름
    #[arg(long)]
    pub artist: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 다운로드한 곡의 태그 현황 표시
    List {
        /// 스캔할 디렉토리
        directory: Option<PathBuf>,
    },
    /// 저장 위치와 렌더러 설정
    Config,
}

pub fn run(cli: Cli) -> Result<()> {
    let mut cfg = config::load_config();
    if let Some(dir) = cli.output_dir {
        cfg.download.output_dir = dir;
    }
    if let Some(artist) = cli.artist {
        cfg.download.artist = Some(artist);
    }

    match cli.command {
        Some(Commands::List { directory }) => {
            cmd_list(directory.as_deref().unwrap_or(&cfg.download.output_dir))
        }
        Some(Commands::Config) => cmd_config(cfg),
        None => cmd_download(&cfg),
    }
}

/// 대화형 입력 소스. 테스트에서는 미리 준비한 입력으로 대체한다.
pub trait Prompt {
    fn read_link(&mut self) -> Result<String>;
    fn ask_continue(&mut self) -> Result<String>;
}

pub struct ConsolePrompt;

impl Prompt for ConsolePrompt {
    fn read_link(&mut self) -> Result<String> {
        let link = Input::<String>::new()
            .with_prompt("\n곡 페이지 링크를 입력하세요")
            .interact_text()?;
        Ok(link)
    }

    fn ask_continue(&mut self) -> Result<String> {
        let answer = Input::<String>::new()
            .with_prompt("계속하시겠습니까? (y/n)")
            .allow_empty(true)
            .interact_text()?;
        Ok(answer)
    }
}

fn build_downloader(cfg: &Config) -> Result<Downloader> {
    let renderer: Box<dyn PageRenderer> = match cfg.renderer.engine {
        RenderEngine::Chrome => Box::new(HeadlessChrome::new(&cfg.renderer)),
        RenderEngine::Static => Box::new(StaticPage::new(HttpFetcher::new()?)),
    };
    let fetcher = HttpFetcher::new()?;

    Ok(
        Downloader::new(renderer, Box::new(fetcher), &cfg.download.output_dir)
            .with_artist(cfg.download.artist.clone()),
    )
}

fn cmd_download(cfg: &Config) -> Result<()> {
    let downloader = build_downloader(cfg)?;
    let stdout = io::stdout();
    run_session(&downloader, &mut ConsolePrompt, &mut stdout.lock())
}

/// 링크를 하나씩 받아 처리하는 대화형 루프.
/// 계속 여부에 정확히 "n"을 입력해야 끝난다. 링크 처리 오류는 출력만 하고 넘어간다.
pub fn run_session(
    downloader: &Downloader,
    prompt: &mut dyn Prompt,
    out: &mut dyn Write,
) -> Result<()> {
    writeln!(out, "suno.com 음악 다운로드 프로그램")?;
    writeln!(out, "suno.com에서 마음에 드는 곡의 페이지로 가서 링크를 복사하세요.")?;
    writeln!(
        out,
        "예시 링크: https://suno.com/song/eaba4d6e-f7ab-4bc4-a48b-6e2c8d859dbc"
    )?;
    writeln!(out, "아래에 링크를 붙여넣고 Enter를 누르세요.")?;
    writeln!(out, "저장 위치: {}", downloader.output_dir().display())?;

    loop {
        let link = prompt.read_link()?;
        process_link(downloader, &link, out)?;

        if prompt.ask_continue()? == "n" {
            break;
        }
    }

    Ok(())
}

fn process_link(downloader: &Downloader, link: &str, out: &mut dyn Write) -> io::Result<()> {
    let result = downloader.download(link, &mut |progress| {
        if let Err(e) = print_progress(out, progress) {
            debug!("진행 상황 출력 실패: {}", e);
        }
    });

    match result {
        Ok(report) => {
            match &report.cover {
                CoverStatus::Embedded => writeln!(out, "커버 추가 완료: {}", report.file_name)?,
                CoverStatus::Failed(_) => writeln!(out, "커버 추가 실패: {}", report.file_name)?,
                CoverStatus::Missing => {}
            }
            debug!("'{}' 처리 완료", report.title);
            writeln!(
                out,
                "{} 다운로드 완료: {}",
                report.file_name,
                report.path.display()
            )?;
        }
        Err(DownloadError::MissingTitle) => {
            debug!("제목이 없어 건너뜀: {}", link);
        }
        Err(e) => {
            warn!("{} 처리 실패: {:?}", link, e);
            writeln!(out, "{}", e)?;
        }
    }

    Ok(())
}

fn print_progress(out: &mut dyn Write, progress: Progress<'_>) -> io::Result<()> {
    match progress {
        Progress::TitleFound(title) => writeln!(out, "곡 제목: {}", title),
        Progress::CoverFetched { mime_type, size } => {
            writeln!(out, "커버 이미지: {} ({} bytes)", mime_type, size)
        }
        Progress::CoverMissing => writeln!(out, "커버 이미지가 없습니다"),
        Progress::Downloading(path) => writeln!(out, "다운로드 중: {}", path.display()),
    }
}

fn cmd_list(directory: &Path) -> Result<()> {
    let files = scanner::scan_directory(directory)?;

    if files.is_empty() {
        println!("{}에서 MP3 파일을 찾을 수 없습니다", directory.display());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["파일", "제목", "아티스트", "앨범", "커버"]);

    for file in &files {
        let (title, artist, album, cover) = match &file.current_tags {
            Some(t) => (
                t.display_title().to_string(),
                t.display_artist().to_string(),
                t.display_album().to_string(),
                t.cover_mime.clone().unwrap_or_else(|| "없음".to_string()),
            ),
            None => (
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
            ),
        };

        table.add_row(vec![
            Cell::new(file.filename()),
            Cell::new(&title),
            Cell::new(&artist),
            Cell::new(&album),
            Cell::new(&cover),
        ]);
    }

    println!("{table}");
    println!(
        "\n총 {} 파일 (태그 있음: {}, 커버 있음: {})",
        files.len(),
        files.iter().filter(|f| f.has_tags).count(),
        files
            .iter()
            .filter(|f| f
                .current_tags
                .as_ref()
                .is_some_and(|t| t.cover_mime.is_some()))
            .count(),
    );

    Ok(())
}

fn cmd_config(mut cfg: Config) -> Result<()> {
    println!("sunodl 설정 ({})\n", config::config_path().display());

    let output_dir: String = Input::new()
        .with_prompt("저장 디렉토리")
        .with_initial_text(cfg.download.output_dir.display().to_string())
        .interact_text()?;

    let artist: String = Input::new()
        .with_prompt("아티스트 (비우면 기록하지 않음)")
        .with_initial_text(cfg.download.artist.clone().unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;

    let engines = ["chrome (헤드리스 브라우저)", "static (HTML만 요청)"];
    let current = match cfg.renderer.engine {
        RenderEngine::Chrome => 0,
        RenderEngine::Static => 1,
    };
    let selection = Select::new()
        .with_prompt("렌더러")
        .items(&engines)
        .default(current)
        .interact()?;

    let browser: String = Input::new()
        .with_prompt("브라우저 경로 (비우면 자동 탐색)")
        .with_initial_text(
            cfg.renderer
                .browser
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        )
        .allow_empty(true)
        .interact_text()?;

    cfg.download.output_dir = PathBuf::from(output_dir.trim());
    cfg.download.artist = Some(artist.trim().to_string()).filter(|a| !a.is_empty());
    cfg.renderer.engine = if selection == 0 {
        RenderEngine::Chrome
    } else {
        RenderEngine::Static
    };
    cfg.renderer.browser = Some(PathBuf::from(browser.trim())).filter(|p| !p.as_os_str().is_empty());

    config::save_config(&cfg)?;
    println!("\n설정이 저장되었습니다!");
    Ok(())
}
