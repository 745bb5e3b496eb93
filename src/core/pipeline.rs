use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::core::{extractor, renamer, tagger};
use crate::error::{DownloadError, FetchError};
use crate::models::{CoverImage, CoverStatus, DownloadReport, TrackMetadata, TrackRef};
use crate::sources::{AssetFetcher, PageRenderer};

/// 다운로드 진행 단계. 세션 루프가 단계별 상태 메시지를 출력하는 데 쓴다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress<'a> {
    TitleFound(&'a str),
    CoverFetched { mime_type: &'static str, size: usize },
    CoverMissing,
    Downloading(&'a Path),
}

/// 곡 페이지 링크 하나를 MP3 파일로 받아 커버와 태그를 붙인다.
pub struct Downloader {
    renderer: Box<dyn PageRenderer>,
    fetcher: Box<dyn AssetFetcher>,
    output_dir: PathBuf,
    artist: Option<String>,
}

impl Downloader {
    pub fn new(
        renderer: Box<dyn PageRenderer>,
        fetcher: Box<dyn AssetFetcher>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            renderer,
            fetcher,
            output_dir: output_dir.into(),
            artist: None,
        }
    }

    pub fn with_artist(mut self, artist: Option<String>) -> Self {
        self.artist = artist.filter(|a| !a.trim().is_empty());
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 링크 검증 → 렌더링 → 메타데이터 추출 → 커버 다운로드 → MP3 다운로드 → 태그 기록.
    /// 어느 단계든 실패하면 그 링크만 포기하고 오류를 돌려준다.
    pub fn download(
        &self,
        link: &str,
        progress: &mut dyn FnMut(Progress<'_>),
    ) -> Result<DownloadReport, DownloadError> {
        let track = TrackRef::from_song_url(link.trim()).ok_or(DownloadError::InvalidUrl)?;
        debug!("트랙 ID: {}", track);

        let html = self.renderer.render(&track.embed_url())?;
        let metadata = TrackMetadata {
            title: extractor::extract_title(&html).ok_or(DownloadError::MissingTitle)?,
            cover_url: extractor::extract_cover_url(&html),
        };
        progress(Progress::TitleFound(&metadata.title));

        let cover = metadata
            .cover_url
            .as_deref()
            .and_then(|url| self.fetch_cover(url));
        match cover {
            Some(ref c) => progress(Progress::CoverFetched {
                mime_type: c.mime_type,
                size: c.data.len(),
            }),
            None => progress(Progress::CoverMissing),
        }

        let file_name = renamer::build_filename(&metadata.title);
        let path = self.output_dir.join(&file_name);
        fs::create_dir_all(&self.output_dir)?;

        progress(Progress::Downloading(&path));
        let written = self.download_audio(&track.download_url(), &file_name, &path)?;
        info!("{} 저장 완료 ({} bytes)", path.display(), written);

        let cover_status = match cover {
            None => CoverStatus::Missing,
            Some(cover) => {
                let artist = self.artist.as_deref();
                match tagger::write_cover_tags(&path, &cover, &metadata.title, artist) {
                    Ok(()) => CoverStatus::Embedded,
                    Err(e) => {
                        error!("커버 추가 실패 ({}): {:?}", path.display(), e);
                        CoverStatus::Failed(format!("{:#}", e))
                    }
                }
            }
        };

        Ok(DownloadReport {
            title: metadata.title,
            file_name,
            path,
            cover: cover_status,
        })
    }

    /// 커버 이미지를 받는다. 실패해도 다운로드는 계속되므로 None만 돌려준다.
    fn fetch_cover(&self, url: &str) -> Option<CoverImage> {
        match self.fetcher.fetch_bytes(url) {
            Ok(data) if data.is_empty() => {
                warn!("커버 이미지가 비어 있습니다: {}", url);
                None
            }
            Ok(data) => Some(CoverImage::from_bytes(data)),
            Err(e) => {
                warn!("커버 이미지 다운로드 실패 ({}): {}", url, e);
                None
            }
        }
    }

    /// 응답 본문을 `.part` 파일로 스트리밍한 뒤 최종 경로로 옮긴다.
    fn download_audio(&self, url: &str, file_name: &str, path: &Path) -> Result<u64, DownloadError> {
        let mut body = self.fetcher.open(url).map_err(|e| match e {
            FetchError::Status(status) => DownloadError::Http {
                file_name: file_name.to_string(),
                status,
            },
            source => DownloadError::Transfer {
                file_name: file_name.to_string(),
                source,
            },
        })?;

        let part = renamer::partial_path(path);
        let copied = File::create(&part).and_then(|mut file| {
            let n = io::copy(&mut body, &mut file)?;
            file.sync_all()?;
            Ok(n)
        });

        match copied {
            Ok(n) => {
                fs::rename(&part, path)?;
                Ok(n)
            }
            Err(e) => {
                if let Err(rm) = fs::remove_file(&part) {
                    debug!("임시 파일 삭제 실패 ({}): {}", part.display(), rm);
                }
                Err(DownloadError::Transfer {
                    file_name: file_name.to_string(),
                    source: FetchError::Io(e),
                })
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io::{Cursor, Read};
    use std::rc::Rc;

    use id3::{Tag, TagLike};

    use super::*;
    use crate::core::tagger::tests::{fake_mp3, PNG_BYTES};
    use crate::error::RenderError;

    pub const SONG_HTML: &str = r#"<html><head><title>Cool Song | Suno</title></head>
        <body><div><img src="https://img/cover.png"></div></body></html>"#;

    pub struct FakeRenderer {
        pub html: Option<String>,
        pub calls: Rc<RefCell<Vec<String>>>,
    }

    impl FakeRenderer {
        pub fn new(html: &str) -> Self {
            Self {
                html: Some(html.to_string()),
                calls: Rc::default(),
            }
        }

        pub fn failing() -> Self {
            Self {
                html: None,
                calls: Rc::default(),
            }
        }
    }

    impl PageRenderer for FakeRenderer {
        fn render(&self, url: &str) -> Result<String, RenderError> {
            self.calls.borrow_mut().push(url.to_string());
            self.html
                .clone()
                .ok_or_else(|| RenderError::Exited("exit status: 1 (net::ERR_NAME_NOT_RESOLVED)".into()))
        }
    }

    /// 앞부분을 돌려준 뒤 연결이 끊긴 것처럼 실패하는 본문.
    struct ResetAfter {
        head: Cursor<Vec<u8>>,
    }

    impl Read for ResetAfter {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.head.read(buf)? {
                0 => Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "connection reset by peer",
                )),
                n => Ok(n),
            }
        }
    }

    /// URL별로 (상태 코드, 본문)을 돌려준다. 등록되지 않은 URL은 404.
    #[derive(Default)]
    pub struct FakeFetcher {
        pub responses: HashMap<String, (u16, Vec<u8>)>,
        pub resets: HashMap<String, Vec<u8>>,
        pub calls: Rc<RefCell<Vec<String>>>,
    }

    impl FakeFetcher {
        pub fn with(mut self, url: &str, status: u16, body: &[u8]) -> Self {
            self.responses.insert(url.to_string(), (status, body.to_vec()));
            self
        }

        /// 200 응답 후 `head`만큼 읽히고 연결이 끊긴다.
        pub fn with_reset(mut self, url: &str, head: &[u8]) -> Self {
            self.resets.insert(url.to_string(), head.to_vec());
            self
        }
    }

    impl AssetFetcher for FakeFetcher {
        fn open(&self, url: &str) -> Result<Box<dyn Read>, FetchError> {
            self.calls.borrow_mut().push(url.to_string());
            if let Some(head) = self.resets.get(url) {
                return Ok(Box::new(ResetAfter {
                    head: Cursor::new(head.clone()),
                }));
            }
            match self.responses.get(url) {
                Some((200, body)) => Ok(Box::new(Cursor::new(body.clone()))),
                Some((status, _)) => Err(FetchError::Status(*status)),
                None => Err(FetchError::Status(404)),
            }
        }
    }

    pub fn suno_fetcher() -> FakeFetcher {
        FakeFetcher::default()
            .with("https://cdn1.suno.ai/abc123.mp3", 200, &fake_mp3())
            .with("https://img/cover.png", 200, PNG_BYTES)
    }

    fn ignore(_: Progress<'_>) {}

    #[test]
    fn test_end_to_end_download() {
        let dir = tempfile::tempdir().unwrap();
        let music = dir.path().join("music");
        let renderer = FakeRenderer::new(SONG_HTML);
        let rendered = renderer.calls.clone();
        let downloader = Downloader::new(Box::new(renderer), Box::new(suno_fetcher()), &music);

        let report = downloader
            .download("https://suno.com/song/abc123", &mut ignore)
            .unwrap();

        assert_eq!(rendered.borrow().as_slice(), ["https://suno.com/embed/abc123"]);
        assert_eq!(report.title, "Cool Song");
        assert_eq!(report.file_name, "Cool Song.mp3");
        assert_eq!(report.path, music.join("Cool Song.mp3"));
        assert_eq!(report.cover, CoverStatus::Embedded);
        assert!(!music.join("Cool Song.mp3.part").exists());

        let tag = Tag::read_from_path(&report.path).unwrap();
        assert_eq!(tag.title(), Some("Cool Song"));
        assert_eq!(tag.album(), Some("Suno Track"));
        assert_eq!(tag.artist(), None);
        assert_eq!(tag.pictures().count(), 1);
        assert_eq!(tag.pictures().next().unwrap().mime_type, "image/png");
    }

    #[test]
    fn test_progress_events() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Downloader::new(
            Box::new(FakeRenderer::new(SONG_HTML)),
            Box::new(suno_fetcher()),
            dir.path(),
        );

        let mut events = Vec::new();
        downloader
            .download("https://suno.com/song/abc123", &mut |p| {
                events.push(format!("{:?}", p))
            })
            .unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0], r#"TitleFound("Cool Song")"#);
        assert!(events[1].starts_with(r#"CoverFetched { mime_type: "image/png""#));
        assert!(events[2].starts_with("Downloading("));
    }

    #[test]
    fn test_artist_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Downloader::new(
            Box::new(FakeRenderer::new(SONG_HTML)),
            Box::new(suno_fetcher()),
            dir.path(),
        )
        .with_artist(Some("Someone".to_string()));

        let report = downloader
            .download("https://suno.com/song/abc123", &mut ignore)
            .unwrap();
        let tag = Tag::read_from_path(&report.path).unwrap();
        assert_eq!(tag.artist(), Some("Someone"));
    }

    #[test]
    fn test_rejects_foreign_url() {
        let dir = tempfile::tempdir().unwrap();
        let music = dir.path().join("music");
        let renderer = FakeRenderer::new(SONG_HTML);
        let rendered = renderer.calls.clone();
        let downloader = Downloader::new(Box::new(renderer), Box::new(suno_fetcher()), &music);

        let err = downloader
            .download("https://example.com/song/x", &mut ignore)
            .unwrap_err();

        assert!(matches!(err, DownloadError::InvalidUrl));
        assert!(err.to_string().contains("https://suno.com/song/"));
        assert!(rendered.borrow().is_empty());
        assert!(!music.exists());
    }

    #[test]
    fn test_missing_title_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let music = dir.path().join("music");
        let fetcher = suno_fetcher();
        let fetched = fetcher.calls.clone();
        let downloader = Downloader::new(
            Box::new(FakeRenderer::new("<html><body><img src=\"https://img/cover.png\"></body></html>")),
            Box::new(fetcher),
            &music,
        );

        let err = downloader
            .download("https://suno.com/song/abc123", &mut ignore)
            .unwrap_err();

        assert!(matches!(err, DownloadError::MissingTitle));
        assert!(fetched.borrow().is_empty());
        assert!(!music.exists());
    }

    #[test]
    fn test_render_failure() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Downloader::new(
            Box::new(FakeRenderer::failing()),
            Box::new(suno_fetcher()),
            dir.path().join("music"),
        );

        let err = downloader
            .download("https://suno.com/song/abc123", &mut ignore)
            .unwrap_err();
        assert!(matches!(err, DownloadError::Render(_)));
    }

    #[test]
    fn test_download_404() {
        let dir = tempfile::tempdir().unwrap();
        let music = dir.path().join("music");
        let fetcher = FakeFetcher::default()
            .with("https://cdn1.suno.ai/abc123.mp3", 404, b"")
            .with("https://img/cover.png", 200, PNG_BYTES);
        let downloader = Downloader::new(
            Box::new(FakeRenderer::new(SONG_HTML)),
            Box::new(fetcher),
            &music,
        );

        let err = downloader
            .download("https://suno.com/song/abc123", &mut ignore)
            .unwrap_err();

        assert!(matches!(err, DownloadError::Http { status: 404, .. }));
        let message = err.to_string();
        assert!(message.contains("404"), "{}", message);
        assert!(message.contains("Cool Song.mp3"), "{}", message);
        assert!(music.is_dir());
        assert!(!music.join("Cool Song.mp3").exists());
        assert!(!music.join("Cool Song.mp3.part").exists());
    }

    /// 지원하지 않는 ID3 버전(9) 헤더로 시작하는 오디오.
    pub fn unreadable_tag_mp3() -> Vec<u8> {
        let mut data = b"ID3\x09\x00\x00\x00\x00\x00\x10".to_vec();
        data.extend(fake_mp3());
        data
    }

    #[test]
    fn test_tag_failure_keeps_download() {
        let dir = tempfile::tempdir().unwrap();
        let body = unreadable_tag_mp3();
        let fetcher = FakeFetcher::default()
            .with("https://cdn1.suno.ai/abc123.mp3", 200, &body)
            .with("https://img/cover.png", 200, PNG_BYTES);
        let downloader = Downloader::new(
            Box::new(FakeRenderer::new(SONG_HTML)),
            Box::new(fetcher),
            dir.path(),
        );

        let report = downloader
            .download("https://suno.com/song/abc123", &mut ignore)
            .unwrap();

        assert!(matches!(report.cover, CoverStatus::Failed(_)), "{:?}", report.cover);
        assert_eq!(std::fs::read(&report.path).unwrap(), body);
        assert!(!dir.path().join("Cool Song.mp3.part").exists());
    }

    #[test]
    fn test_stream_error_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::default()
            .with_reset("https://cdn1.suno.ai/abc123.mp3", &fake_mp3()[..64])
            .with("https://img/cover.png", 200, PNG_BYTES);
        let downloader = Downloader::new(
            Box::new(FakeRenderer::new(SONG_HTML)),
            Box::new(fetcher),
            dir.path(),
        );

        let err = downloader
            .download("https://suno.com/song/abc123", &mut ignore)
            .unwrap_err();

        assert!(matches!(err, DownloadError::Transfer { .. }), "{:?}", err);
        assert!(err.to_string().starts_with("다운로드 오류 Cool Song.mp3:"), "{}", err);
        assert!(!dir.path().join("Cool Song.mp3").exists());
        assert!(!dir.path().join("Cool Song.mp3.part").exists());
    }

    #[test]
    fn test_cover_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::default()
            .with("https://cdn1.suno.ai/abc123.mp3", 200, &fake_mp3())
            .with("https://img/cover.png", 500, b"");
        let downloader = Downloader::new(
            Box::new(FakeRenderer::new(SONG_HTML)),
            Box::new(fetcher),
            dir.path(),
        );

        let mut saw_missing = false;
        let report = downloader
            .download("https://suno.com/song/abc123", &mut |p| {
                saw_missing |= p == Progress::CoverMissing
            })
            .unwrap();

        assert!(saw_missing);
        assert_eq!(report.cover, CoverStatus::Missing);
        assert_eq!(std::fs::read(&report.path).unwrap(), fake_mp3());
    }

    #[test]
    fn test_page_without_image() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = suno_fetcher();
        let fetched = fetcher.calls.clone();
        let downloader = Downloader::new(
            Box::new(FakeRenderer::new("<title>Cool Song | Suno</title>")),
            Box::new(fetcher),
            dir.path(),
        );

        let report = downloader
            .download("https://suno.com/song/abc123", &mut ignore)
            .unwrap();
        assert_eq!(report.cover, CoverStatus::Missing);
        assert_eq!(fetched.borrow().as_slice(), ["https://cdn1.suno.ai/abc123.mp3"]);
    }

    #[test]
    fn test_quotes_removed_from_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Downloader::new(
            Box::new(FakeRenderer::new(r#"<title>Say "Hi" | Suno</title>"#)),
            Box::new(suno_fetcher()),
            dir.path(),
        );

        let report = downloader
            .download("https://suno.com/song/abc123", &mut ignore)
            .unwrap();
        assert_eq!(report.file_name, "Say Hi.mp3");
        assert!(dir.path().join("Say Hi.mp3").exists());
    }
}
