use std::fs;
use std::path::{Path, PathBuf};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_MEDIA_TYPE: &str = "image/png";

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to read image `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("`{0}` is not a PNG, JPEG, GIF or WebP image")]
    NotAnImage(PathBuf),
}

/// An encoded raster image, stored as a `data:<media-type>;base64,<payload>` URL.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct ImageData(String);

impl ImageData {
    /// Wraps an already encoded data URL.
    pub fn from_data_url(url: impl Into<String>) -> Self {
        ImageData(url.into())
    }

    /// Encodes raw image bytes under the given media type.
    pub fn from_bytes(media_type: &str, bytes: &[u8]) -> Self {
        ImageData(format!("data:{};base64,{}", media_type, STANDARD.encode(bytes)))
    }

    /// Reads an image file from disk and encodes it.
    ///
    /// The media type is sniffed from the file's magic bytes, falling back to
    /// the extension. Anything that is neither is rejected.
    pub fn from_path(path: &Path) -> Result<Self, ImageError> {
        let bytes = fs::read(path).map_err(|source| ImageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let media_type = sniff_media_type(&bytes)
            .or_else(|| media_type_for_extension(path))
            .ok_or_else(|| ImageError::NotAnImage(path.to_path_buf()))?;
        Ok(Self::from_bytes(media_type, &bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Media type declared in the data URL header, `image/png` when unknown.
    pub fn media_type(&self) -> &'static str {
        let header = self.0.split(',').next().unwrap_or_default();
        if header.contains("data:image/png") {
            "image/png"
        } else if header.contains("data:image/jpeg") || header.contains("data:image/jpg") {
            "image/jpeg"
        } else if header.contains("data:image/gif") {
            "image/gif"
        } else if header.contains("data:image/webp") {
            "image/webp"
        } else {
            DEFAULT_MEDIA_TYPE
        }
    }

    /// The base64 payload after the first comma (empty if there is none).
    pub fn base64_payload(&self) -> &str {
        self.0.split_once(',').map(|(_, data)| data).unwrap_or_default()
    }

    /// Approximate decoded size in bytes, for display.
    pub fn byte_len(&self) -> usize {
        self.base64_payload().len() / 4 * 3
    }
}

fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF8") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

fn media_type_for_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn media_type_follows_data_url_header() {
        assert_eq!(ImageData::from_data_url("data:image/jpg;base64,AAAA").media_type(), "image/jpeg");
        assert_eq!(ImageData::from_data_url("data:image/webp;base64,AAAA").media_type(), "image/webp");
        assert_eq!(ImageData::from_data_url("data:image/gif;base64,AAAA").media_type(), "image/gif");
        assert_eq!(ImageData::from_data_url("not a data url").media_type(), "image/png");
    }

    #[test]
    fn payload_is_text_after_first_comma() {
        let img = ImageData::from_bytes("image/png", b"hello");
        assert_eq!(img.as_str(), "data:image/png;base64,aGVsbG8=");
        assert_eq!(img.base64_payload(), "aGVsbG8=");
        assert_eq!(ImageData::from_data_url("no-comma").base64_payload(), "");
    }

    #[test]
    fn from_path_sniffs_magic_bytes_over_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0]).unwrap();

        let img = ImageData::from_path(&path).unwrap();
        assert_eq!(img.media_type(), "image/jpeg");
    }

    #[test]
    fn from_path_rejects_non_images() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "just text").unwrap();

        assert!(matches!(ImageData::from_path(&path), Err(ImageError::NotAnImage(_))));
    }
}
