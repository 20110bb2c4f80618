//! Directory-backed asset store.
//!
//! Blobs are written to a scratch directory under a fresh name and the name
//! becomes the asset reference attached to the record.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{new_asset_name, AssetStore};
use crate::error::{Error, Result};
use crate::models::{ImageBlob, ImageFormat};
use crate::record::AssetRef;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileAssetStore {
    root: PathBuf,
}

impl FileAssetStore {
    /// Open (and create when missing) an asset directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Scratch store under the system temp directory.
    pub fn scratch() -> Result<Self> {
        Self::open(std::env::temp_dir().join("corkboard-assets"))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Remove a stored asset. Missing files are ignored.
    pub async fn remove(&self, reference: &AssetRef) -> Result<()> {
        let path = self.path_for(reference)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }

    fn path_for(&self, reference: &AssetRef) -> Result<PathBuf> {
        let name = reference.as_str();
        if name.is_empty() || name.contains(&['/', '\\'][..]) || name.starts_with('.') {
            return Err(Error::InvalidReference(format!(
                "asset name '{name}' is not a plain file name"
            )));
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl AssetStore for FileAssetStore {
    async fn put(&self, blob: &ImageBlob) -> Result<AssetRef> {
        let reference = AssetRef::new(new_asset_name(blob.format));
        let path = self.path_for(&reference)?;
        tokio::fs::write(&path, &blob.bytes).await?;
        tracing::debug!("Wrote asset {} ({} bytes)", path.display(), blob.bytes.len());
        Ok(reference)
    }

    async fn get(&self, reference: &AssetRef) -> Result<ImageBlob> {
        let path = self.path_for(reference)?;
        let format = ImageFormat::from_extension(reference.as_str()).ok_or_else(|| {
            Error::MalformedRecord(format!("asset {reference} has no image extension"))
        })?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(ImageBlob::new(format, bytes)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("asset {reference}")))
            }
            Err(error) => Err(error.into()),
        }
    }
}
