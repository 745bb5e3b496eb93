use std::path::Path;

use anyhow::Result;
use log::debug;

use crate::core::tagger;
use crate::models::Mp3File;

/// 다운로드 디렉토리의 MP3 파일을 이름순으로 나열한다.
/// 하위 디렉토리와 `.part` 임시 파일은 보지 않는다.
pub fn scan_directory(dir: &Path) -> Result<Vec<Mp3File>> {
    if !dir.is_dir() {
        anyhow::bail!("{}은(는) 디렉토리가 아닙니다", dir.display());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_mp3(&path) {
            files.push(load_mp3_file(&path));
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// 확장자가 .mp3인지 확인한다 (대소문자 무시).
fn is_mp3(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("mp3"))
        .unwrap_or(false)
}

fn load_mp3_file(path: &Path) -> Mp3File {
    match tagger::read_tags(path) {
        Ok(Some(tags)) => Mp3File {
            path: path.to_path_buf(),
            has_tags: true,
            current_tags: Some(tags),
        },
        other => {
            if let Err(e) = other {
                debug!("태그 읽기 실패 ({}): {}", path.display(), e);
            }
            Mp3File {
                path: path.to_path_buf(),
                has_tags: false,
                current_tags: None,
            }
        }
    }
}
