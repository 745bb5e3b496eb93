use std::path::{Path, PathBuf};

/// 큰따옴표를 지우고, 경로를 벗어날 수 있는 문자는 `_`로 치환한다.
pub fn sanitize_filename(s: &str) -> String {
    s.chars()
        .filter(|&c| c != '"')
        .map(|c| {
            if c == '/' || c == '\0' {
                return '_';
            }
            if cfg!(target_os = "windows") {
                if matches!(c, '\\' | ':' | '*' | '?' | '<' | '>' | '|') {
                    return '_';
                }
                if c.is_ascii_control() {
                    return '_';
                }
            }
            if cfg!(target_os = "macos") && c == ':' {
                return '_';
            }
            c
        })
        .collect()
}

/// 곡 제목으로 `"{title}.mp3"` 파일명을 만든다.
pub fn build_filename(title: &str) -> String {
    format!("{}.mp3", sanitize_filename(title))
}

/// 다운로드 중에 쓰는 임시 파일 경로. 완료 후 최종 이름으로 바뀐다.
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}
