use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

/// Largest accepted upload.
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Image formats accepted for review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Both the file extension and the declared content type must name an
    /// accepted format.
    pub fn detect(original_name: &str, content_type: Option<&str>) -> Option<Self> {
        let ext = Path::new(original_name)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        let by_ext = match ext.as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            _ => return None,
        };

        let by_mime = match content_type?.to_ascii_lowercase().as_str() {
            "image/png" => Self::Png,
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Self::Jpeg,
            _ => return None,
        };

        (by_ext == by_mime).then_some(by_ext)
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

/// On-disk store for uploaded images.
///
/// Each upload lands at `{dir}/{uuid}.{ext}`; that filename is the blob
/// handle recorded on the image and served under `/uploads/`.
pub struct BlobStorage {
    dir: PathBuf,
}

impl BlobStorage {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Upload directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a new blob and return its generated filename.
    pub async fn save(&self, format: ImageFormat, data: &[u8]) -> Result<String> {
        let filename = format!("{}.{}", Uuid::new_v4(), format.extension());
        let path = self.dir.join(&filename);

        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        Ok(filename)
    }

    /// Remove a blob. A file that is already gone is not an error.
    pub async fn delete(&self, filename: &str) -> Result<()> {
        if filename.is_empty() || filename.contains(['/', '\\']) || filename.starts_with('.') {
            bail!("Refusing to delete suspicious blob name {:?}", filename);
        }

        match fs::remove_file(self.dir.join(filename)).await {
            Ok(()) => {
                info!("Deleted blob {}", filename);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Blob {} already gone", filename);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_png_and_jpeg_only() {
        assert_eq!(
            ImageFormat::detect("logo.PNG", Some("image/png")),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::detect("photo.jpeg", Some("image/jpeg")),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(ImageFormat::detect("photo.jpg", None), None);
        assert_eq!(ImageFormat::detect("anim.gif", Some("image/gif")), None);
        assert_eq!(ImageFormat::detect("logo.png", Some("image/jpeg")), None);
        assert_eq!(ImageFormat::detect("noext", Some("image/png")), None);
    }

    #[tokio::test]
    async fn save_then_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = BlobStorage::new(dir.path().join("uploads")).await.unwrap();

        let name = storage.save(ImageFormat::Png, b"\x89PNG").await.unwrap();
        assert!(name.ends_with(".png"));
        assert_eq!(fs::read(storage.dir().join(&name)).await.unwrap(), b"\x89PNG");

        storage.delete(&name).await.unwrap();
        assert!(!storage.dir().join(&name).exists());
        // second delete is a no-op
        storage.delete(&name).await.unwrap();
    }

    #[tokio::test]
    async fn refuses_paths_outside_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let storage = BlobStorage::new(dir.path().to_path_buf()).await.unwrap();
        assert!(storage.delete("../etc/passwd").await.is_err());
        assert!(storage.delete(".hidden").await.is_err());
    }
}
