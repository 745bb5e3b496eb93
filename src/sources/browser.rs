use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use log::{debug, info};

use crate::config::RendererConfig;
use crate::error::RenderError;
use crate::sources::http::HttpFetcher;
use crate::sources::{AssetFetcher, PageRenderer};

/// 브라우저 경로를 지정하지 않았을 때 순서대로 시도하는 실행 파일.
const BROWSER_CANDIDATES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
];

/// 헤드리스 Chromium으로 페이지를 렌더링한다.
///
/// `--virtual-time-budget`이 끝날 때까지 대기한 뒤 `--dump-dom`으로 DOM을 받는다.
/// 가상 시간은 네트워크 요청이 남아 있는 동안 흐르지 않으므로
/// 네트워크가 잠잠해질 때까지 기다리는 효과가 있다.
pub struct HeadlessChrome {
    browser: Option<PathBuf>,
    virtual_time_budget_ms: u64,
}

impl HeadlessChrome {
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            browser: config.browser.clone(),
            virtual_time_budget_ms: config.virtual_time_budget_ms,
        }
    }

    fn build_command(&self, program: &Path, url: &str) -> Command {
        let mut cmd = Command::new(program);
        cmd.arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--hide-scrollbars")
            .arg("--mute-audio")
            .arg(format!("--user-agent={}", crate::sources::http::USER_AGENT))
            .arg(format!("--virtual-time-budget={}", self.virtual_time_budget_ms))
            .arg("--dump-dom")
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    /// 설정된 브라우저를 실행한다. 설정이 없으면 후보를 차례로 시도한다.
    fn run(&self, url: &str) -> Result<Output, RenderError> {
        if let Some(ref browser) = self.browser {
            return Ok(self.build_command(browser, url).output()?);
        }

        for candidate in BROWSER_CANDIDATES {
            match self.build_command(Path::new(candidate), url).output() {
                Ok(output) => {
                    debug!("브라우저 사용: {}", candidate);
                    return Ok(output);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(RenderError::BrowserNotFound(BROWSER_CANDIDATES.join(", ")))
    }
}

impl PageRenderer for HeadlessChrome {
    fn render(&self, url: &str) -> Result<String, RenderError> {
        info!("렌더링 중: {}", url);
        let output = self.run(url)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::Exited(format!(
                "{} ({})",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// 스크립트를 실행하지 않고 서버가 준 HTML을 그대로 사용하는 렌더러.
/// 브라우저가 없는 환경을 위한 대안이다.
pub struct StaticPage {
    fetcher: HttpFetcher,
}

impl StaticPage {
    pub fn new(fetcher: HttpFetcher) -> Self {
        Self { fetcher }
    }
}

impl PageRenderer for StaticPage {
    fn render(&self, url: &str) -> Result<String, RenderError> {
        info!("정적 페이지 요청: {}", url);
        let mut html = String::new();
        self.fetcher
            .open(url)?
            .read_to_string(&mut html)
            .map_err(crate::error::FetchError::from)?;
        Ok(html)
    }
}
