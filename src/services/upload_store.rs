//! src/services/upload_store.rs
//!
//! UploadStore keeps location images on local disk under
//! `base_path/images/{uuid}.{ext}`. Only the generated file name is
//! recorded in the database; the files are served back under `/images`.

use bytes::Bytes;
use futures::{Stream, StreamExt, pin_mut};
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

const IMAGES_DIR: &str = "images";
const MAX_EXTENSION_LEN: usize = 5;

#[derive(Clone, Debug)]
pub struct UploadStore {
    /// Root directory for everything uploaded through the API.
    pub base_path: PathBuf,
}

/// A file that has been fully written and renamed into place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredFile {
    pub filename: String,
    pub size_bytes: u64,
}

impl UploadStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Directory holding stored images.
    pub fn images_dir(&self) -> PathBuf {
        self.base_path.join(IMAGES_DIR)
    }

    /// Stream an image to disk under a fresh name.
    ///
    /// - Writes bytes incrementally to a temporary file.
    /// - Flushes and fsyncs before renaming into place.
    /// - Removes the temporary file on any error.
    pub async fn store_image<S>(
        &self,
        original_name: Option<&str>,
        stream: S,
    ) -> io::Result<StoredFile>
    where
        S: Stream<Item = io::Result<Bytes>>,
    {
        let dir = self.images_dir();
        fs::create_dir_all(&dir).await?;

        let filename = match original_name.and_then(safe_extension) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        let final_path = dir.join(&filename);
        let tmp_path = dir.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;

        let mut size_bytes: u64 = 0;
        pin_mut!(stream);
        while let Some(chunk_res) = stream.next().await {
            let chunk = match chunk_res {
                Ok(chunk) => chunk,
                Err(err) => {
                    let _ = fs::remove_file(&tmp_path).await;
                    return Err(err);
                }
            };
            size_bytes += chunk.len() as u64;
            if let Err(err) = file.write_all(&chunk).await {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(err);
            }
        }
        if let Err(err) = file.flush().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err);
        }
        if let Err(err) = file.sync_all().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err);
        }
        drop(file);

        if let Err(err) = fs::rename(&tmp_path, &final_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err);
        }

        debug!(filename = %filename, size_bytes, "stored uploaded image");
        Ok(StoredFile {
            filename,
            size_bytes,
        })
    }

    /// Best-effort removal of a stored image. Missing files are ignored.
    pub async fn remove_image(&self, filename: &str) {
        let Some(path) = self.image_path(filename) else {
            debug!(filename, "refusing to remove image with unsafe name");
            return;
        };
        match fs::remove_file(&path).await {
            Ok(_) => debug!("removed image {}", path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("image {} already missing", path.display());
            }
            Err(err) => debug!("failed to remove image {}: {}", path.display(), err),
        }
    }

    /// Full path of a stored image, or `None` if the name could escape the
    /// images directory.
    pub fn image_path(&self, filename: &str) -> Option<PathBuf> {
        let plain = !filename.is_empty()
            && !filename.starts_with('.')
            && Path::new(filename).file_name().and_then(|n| n.to_str()) == Some(filename);
        plain.then(|| self.images_dir().join(filename))
    }
}

/// Lowercased extension of an uploaded file name if it is short and
/// alphanumeric.
fn safe_extension(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
