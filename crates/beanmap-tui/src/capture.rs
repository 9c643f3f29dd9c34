//! Photo capture from an image file.
//!
//! A `PhotoCapture` holds its image source open from the moment it is
//! acquired until it is captured, cancelled or dropped with its view.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::debug;

use beanmap_core::models::mime_for_extension;

/// Largest image accepted, in bytes. Photos are stored inline.
const MAX_PHOTO_BYTES: u64 = 10 * 1024 * 1024;

pub struct PhotoCapture {
    file: File,
    path: PathBuf,
    mime: &'static str,
    len: u64,
}

impl PhotoCapture {
    /// Acquire the image source at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .with_context(|| format!("Cannot open {}", path.display()))?;
        let metadata = file.metadata()?;
        if !metadata.is_file() {
            bail!("{} is not a file", path.display());
        }
        if metadata.len() > MAX_PHOTO_BYTES {
            bail!(
                "{} is too large ({} bytes, limit {})",
                path.display(),
                metadata.len(),
                MAX_PHOTO_BYTES
            );
        }

        let mime = path
            .extension()
            .and_then(|e| e.to_str())
            .map(mime_for_extension)
            .unwrap_or("image/jpeg");
        debug!(path = %path.display(), "Acquired photo source");

        Ok(Self {
            file,
            path,
            mime,
            len: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    pub fn size_bytes(&self) -> u64 {
        self.len
    }

    /// Read the image and release the source.
    pub fn capture(mut self) -> Result<(Vec<u8>, &'static str)> {
        let mut bytes = Vec::with_capacity(self.len as usize);
        self.file
            .read_to_end(&mut bytes)
            .with_context(|| format!("Cannot read {}", self.path.display()))?;
        Ok((bytes, self.mime))
    }

    /// Release the source without capturing.
    pub fn cancel(self) {
        debug!(path = %self.path.display(), "Photo capture cancelled");
    }
}

impl Drop for PhotoCapture {
    fn drop(&mut self) {
        debug!(path = %self.path.display(), "Released photo source");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_capture_reads_image() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("latte.png");
        std::fs::write(&path, b"\x89PNG").unwrap();

        let capture = PhotoCapture::open(&path).unwrap();
        assert_eq!(capture.mime(), "image/png");
        assert_eq!(capture.size_bytes(), 4);
        let (bytes, mime) = capture.capture().unwrap();
        assert_eq!(bytes, b"\x89PNG".to_vec());
        assert_eq!(mime, "image/png");
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(PhotoCapture::open(dir.path().join("nope.jpg")).is_err());
    }

    #[test]
    fn test_directory_rejected() {
        let dir = TempDir::new().unwrap();
        assert!(PhotoCapture::open(dir.path()).is_err());
    }
}
