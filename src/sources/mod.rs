pub mod browser;
pub mod http;
pub mod suno;

use std::io::Read;

use crate::error::{FetchError, RenderError};

/// 스크립트 실행이 끝난 페이지 HTML을 돌려주는 렌더러 트레이트.
/// 헤드리스 브라우저와 정적 HTTP 요청 두 가지 구현이 있다.
pub trait PageRenderer {
    fn render(&self, url: &str) -> Result<String, RenderError>;
}

/// 임의의 URL에 GET 요청을 보내는 트레이트.
pub trait AssetFetcher {
    /// 응답 상태가 200일 때만 본문 스트림을 반환한다.
    fn open(&self, url: &str) -> Result<Box<dyn Read>, FetchError>;

    /// 본문 전체를 메모리로 읽는다.
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut body = self.open(url)?;
        let mut data = Vec::new();
        body.read_to_end(&mut data)?;
        Ok(data)
    }
}
