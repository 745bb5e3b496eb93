use std::path::Path;

use anyhow::{Context, Result};
use id3::frame::{Picture, PictureType};
use id3::{Frame, Tag, TagLike, Version};

use crate::models::{CoverImage, TrackInfo};

/// 모든 다운로드에 기록되는 앨범명.
pub const ALBUM_NAME: &str = "Suno Track";

const COVER_DESCRIPTION: &str = "Cover";

/// 태그에 적용할 프레임 교체 작업.
/// 각 작업은 같은 종류의 기존 프레임을 모두 지운 뒤 새 프레임 하나를 넣는다.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameUpdate {
    Picture { mime_type: String, data: Vec<u8> },
    Text { id: &'static str, value: String },
}

impl FrameUpdate {
    fn apply(self, tag: &mut Tag) {
        match self {
            FrameUpdate::Picture { mime_type, data } => {
                tag.remove_all_pictures();
                tag.add_frame(Picture {
                    mime_type,
                    picture_type: PictureType::CoverFront,
                    description: COVER_DESCRIPTION.to_string(),
                    data,
                });
            }
            FrameUpdate::Text { id, value } => {
                tag.remove(id);
                tag.add_frame(Frame::text(id, value));
            }
        }
    }
}

/// 커버, 제목, 아티스트(선택), 앨범 프레임 교체 목록을 만든다.
pub fn plan_updates(cover: &CoverImage, title: &str, artist: Option<&str>) -> Vec<FrameUpdate> {
    let mut updates = vec![
        FrameUpdate::Picture {
            mime_type: cover.mime_type.to_string(),
            data: cover.data.clone(),
        },
        FrameUpdate::Text {
            id: "TIT2",
            value: title.to_string(),
        },
    ];
    if let Some(artist) = artist {
        updates.push(FrameUpdate::Text {
            id: "TPE1",
            value: artist.to_string(),
        });
    }
    updates.push(FrameUpdate::Text {
        id: "TALB",
        value: ALBUM_NAME.to_string(),
    });
    updates
}

/// MP3 파일에 커버와 제목/아티스트/앨범 태그를 기록한다.
///
/// 기존 태그가 없으면 빈 태그에서 시작한다. 모든 변경은 메모리에서 끝낸 뒤
/// 마지막에 한 번만 ID3v2.3으로 저장하므로, 도중에 실패하면 파일은 그대로 남는다.
pub fn write_cover_tags(
    path: &Path,
    cover: &CoverImage,
    title: &str,
    artist: Option<&str>,
) -> Result<()> {
    let mut tag = load_or_new(path)?;

    for update in plan_updates(cover, title, artist) {
        update.apply(&mut tag);
    }

    tag.write_to_path(path, Version::Id3v23)
        .with_context(|| format!("태그를 저장할 수 없습니다: {}", path.display()))?;
    Ok(())
}

fn load_or_new(path: &Path) -> Result<Tag> {
    match Tag::read_from_path(path) {
        Ok(tag) => Ok(tag),
        Err(id3::Error {
            kind: id3::ErrorKind::NoTag,
            ..
        }) => Ok(Tag::new()),
        Err(e) => {
            Err(anyhow::Error::new(e).context(format!("태그를 읽을 수 없습니다: {}", path.display())))
        }
    }
}

/// MP3 파일에서 ID3 태그를 읽어 TrackInfo로 변환한다.
/// 태그가 없거나 제목/아티스트/앨범이 모두 비어있으면 None을 반환한다.
pub fn read_tags(path: &Path) -> Result<Option<TrackInfo>> {
    let tag = match Tag::read_from_path(path) {
        Ok(tag) => tag,
        Err(id3::Error {
            kind: id3::ErrorKind::NoTag,
            ..
        }) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let has_any = tag.title().is_some() || tag.artist().is_some() || tag.album().is_some();

    if !has_any {
        return Ok(None);
    }

    let info = TrackInfo {
        title: tag.title().map(|s| s.to_string()),
        artist: tag.artist().map(|s| s.to_string()),
        album: tag.album().map(|s| s.to_string()),
        cover_mime: tag.pictures().next().map(|pic| pic.mime_type.clone()),
    };

    Ok(Some(info))
}

/// 이미지 바이너리의 매직 바이트로 MIME 타입을 판별한다.
/// 알 수 없는 형식은 JPEG로 취급한다.
pub fn detect_mime_type(data: &[u8]) -> &'static str {
    if data.starts_with(&[0xFF, 0xD8]) {
        "image/jpeg"
    } else if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        "image/png"
    } else {
        "image/jpeg"
    }
}

impl CoverImage {
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            mime_type: detect_mime_type(&data),
            data,
        }
    }
}
