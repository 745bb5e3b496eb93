use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DownloadConfig {
    /// MP3를 저장할 디렉토리
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// 설정하면 TPE1(아티스트) 프레임으로 기록된다
    pub artist: Option<String>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            artist: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RenderEngine {
    /// 헤드리스 Chromium
    #[default]
    Chrome,
    /// 스크립트 실행 없이 HTML만 받는다
    Static,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RendererConfig {
    #[serde(default)]
    pub engine: RenderEngine,
    pub browser: Option<PathBuf>,
    #[serde(default = "default_virtual_time_budget_ms")]
    pub virtual_time_budget_ms: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            engine: RenderEngine::default(),
            browser: None,
            virtual_time_budget_ms: default_virtual_time_budget_ms(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("music")
}

fn default_virtual_time_budget_ms() -> u64 {
    10_000
}

pub fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
        .join(".config")
        .join("sunodl")
        .join("config.toml")
}

/// 설정 파일을 읽는다. 파일이 없거나 파싱에 실패하면 기본값을 쓴다.
pub fn load_config() -> Config {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            log::warn!("설정 파일을 해석할 수 없어 기본값을 사용합니다 ({}): {}", path.display(), e);
            Config::default()
        }),
        Err(_) => Config::default(),
    }
}

pub fn save_config(config: &Config) -> Result<()> {
    save_config_to(config, &config_path())
}

pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
