use std::path::PathBuf;

/// suno.com 곡 페이지 URL의 마지막 경로 세그먼트.
/// 임베드 페이지 URL과 CDN 다운로드 URL을 만드는 데 쓰인다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRef(String);

impl TrackRef {
    /// 빈 문자열은 허용하지 않는다.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TrackRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 렌더링된 임베드 페이지에서 추출한 곡 정보.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: String,
    pub cover_url: Option<String>,
}

/// 커버 이미지 바이너리와 매직 바이트로 판별한 MIME 타입.
#[derive(Debug, Clone)]
pub struct CoverImage {
    pub mime_type: &'static str,
    pub data: Vec<u8>,
}

/// 커버 삽입 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverStatus {
    Embedded,
    Failed(String),
    Missing,
}

/// 다운로드 한 건의 결과.
#[derive(Debug, Clone)]
pub struct DownloadReport {
    pub title: String,
    pub file_name: String,
    pub path: PathBuf,
    pub cover: CoverStatus,
}

/// MP3 파일에서 읽은 태그 정보.
#[derive(Debug, Clone, Default)]
pub struct TrackInfo {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub cover_mime: Option<String>,
}

impl TrackInfo {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("알 수 없음")
    }

    pub fn display_artist(&self) -> &str {
        self.artist.as_deref().unwrap_or("-")
    }

    pub fn display_album(&self) -> &str {
        self.album.as_deref().unwrap_or("-")
    }
}

#[derive(Debug, Clone)]
pub struct Mp3File {
    pub path: PathBuf,
    pub current_tags: Option<TrackInfo>,
    pub has_tags: bool,
}

impl Mp3File {
    pub fn filename(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("알 수 없음")
    }
}
