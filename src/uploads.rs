// Photo storage for bootcamp images.
use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

use crate::config::config;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Please upload a file")]
    NoFile,

    #[error("Please upload an image file")]
    NotAnImage,

    #[error("Please upload an image less than {max} bytes")]
    TooLarge { max: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Writes bootcamp photos under the configured directory as
/// `photo_<bootcamp_id>.<ext>`, with the extension taken from the declared
/// content type. Re-uploading replaces the previous photo.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
    max_bytes: u64,
}

impl PhotoStore {
    pub fn from_config() -> Self {
        let uploads = &config().uploads;
        Self::new(&uploads.dir, uploads.max_file_bytes)
    }

    pub fn new(dir: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub async fn save(
        &self,
        bootcamp_id: Uuid,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::NoFile);
        }
        let ext = image_extension(content_type).ok_or(UploadError::NotAnImage)?;
        if bytes.len() as u64 > self.max_bytes {
            return Err(UploadError::TooLarge {
                max: self.max_bytes,
            });
        }

        let filename = format!("photo_{}.{}", bootcamp_id, ext);
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&filename), bytes).await?;
        Ok(filename)
    }
}

/// File extension for an `image/*` content type; anything else is refused.
fn image_extension(content_type: Option<&str>) -> Option<&'static str> {
    let essence = content_type?.split(';').next()?.trim();
    let subtype = essence.strip_prefix("image/")?;
    let ext = match subtype {
        "jpeg" => "jpg",
        "png" => "png",
        "gif" => "gif",
        "webp" => "webp",
        "bmp" => "bmp",
        "tiff" => "tif",
        "svg+xml" => "svg",
        _ => return None,
    };
    Some(ext)
}
