use crate::models::TrackRef;

pub const SONG_URL_PREFIX: &str = "https://suno.com/song/";

const EMBED_URL_BASE: &str = "https://suno.com/embed/";
const CDN_URL_BASE: &str = "https://cdn1.suno.ai/";

impl TrackRef {
    /// 곡 페이지 URL에서 트랙 ID를 추출한다.
    /// 접두사가 다르거나 ID가 비어 있으면 None을 반환한다.
    /// 공유 링크의 `?sh=...` 쿼리와 `#` 프래그먼트는 버린다.
    pub fn from_song_url(url: &str) -> Option<Self> {
        if !url.starts_with(SONG_URL_PREFIX) {
            return None;
        }
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let id = path.rsplit('/').next().unwrap_or_default();
        TrackRef::new(id)
    }

    /// 클라이언트 렌더링이 필요한 임베드 페이지 URL.
    pub fn embed_url(&self) -> String {
        format!("{}{}", EMBED_URL_BASE, self.as_str())
    }

    /// MP3 원본 파일의 CDN URL.
    pub fn download_url(&self) -> String {
        format!("{}{}.mp3", CDN_URL_BASE, self.as_str())
    }
}
