use thiserror::Error;

use crate::sources::suno::SONG_URL_PREFIX;

/// 외부 HTTP 요청 실패.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP 상태 코드 {0}")]
    Status(u16),

    #[error("전송 오류: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("읽기 오류: {0}")]
    Io(#[from] std::io::Error),
}

/// 페이지 렌더링 실패.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("브라우저를 찾을 수 없습니다 (시도: {0})")]
    BrowserNotFound(String),

    #[error("브라우저 실행 오류: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("브라우저가 비정상 종료했습니다: {0}")]
    Exited(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// 링크 하나를 처리하는 동안 생길 수 있는 오류.
/// 세션 루프는 종류별로 메시지를 다르게 출력하고 다음 링크로 넘어간다.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("잘못된 URL입니다. '{}'로 시작해야 합니다", SONG_URL_PREFIX)]
    InvalidUrl,

    #[error("페이지 렌더링 오류: {0}")]
    Render(#[from] RenderError),

    #[error("곡 제목을 찾을 수 없습니다")]
    MissingTitle,

    #[error("다운로드 오류 {file_name}: {status}")]
    Http { file_name: String, status: u16 },

    #[error("다운로드 오류 {file_name}: {source}")]
    Transfer {
        file_name: String,
        #[source]
        source: FetchError,
    },

    #[error("파일 쓰기 오류: {0}")]
    Io(#[from] std::io::Error),
}
