use std::io::Read;
use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;
use reqwest::StatusCode;

use crate::error::FetchError;
use crate::sources::AssetFetcher;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// reqwest 블로킹 클라이언트 기반 fetcher.
/// 타임아웃과 재시도는 두지 않는다.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(None::<Duration>)
            .build()
            .context("HTTP 클라이언트 생성에 실패했습니다")?;

        Ok(Self { client })
    }
}

impl AssetFetcher for HttpFetcher {
    fn open(&self, url: &str) -> Result<Box<dyn Read>, FetchError> {
        debug!("GET {}", url);
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(Box::new(resp))
    }
}
