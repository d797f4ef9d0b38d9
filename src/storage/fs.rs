use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::key::key_segments;
use super::{ObjectStore, StorageError};

/// Object storage backed by a local directory: `<root>/<bucket>/<key>`.
pub struct FsObjectStore {
    base_path: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: &Path) -> Self {
        Self {
            base_path: root.to_path_buf(),
        }
    }

    pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        let mut path = self.base_path.join(bucket_dir(bucket)?);
        for segment in key_segments(key)? {
            path.push(segment);
        }
        Ok(path)
    }

    fn temp_path(&self, bucket: &str) -> Result<PathBuf, StorageError> {
        Ok(self
            .base_path
            .join(bucket_dir(bucket)?)
            .join(".tmp")
            .join(Uuid::new_v4().to_string()))
    }
}

fn bucket_dir(bucket: &str) -> Result<&str, StorageError> {
    let segments = key_segments(bucket)?;
    match segments.as_slice() {
        [single] => Ok(*single),
        _ => Err(StorageError::InvalidKey(bucket.to_string())),
    }
}

#[cfg(unix)]
fn set_restrictive_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn set_restrictive_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

impl ObjectStore for FsObjectStore {
    fn put(&self, bucket: &str, key: &str, data: &[u8], private: bool) -> Result<(), StorageError> {
        let final_path = self.object_path(bucket, key)?;
        let temp_path = self.temp_path(bucket)?;
        if let Some(parent) = temp_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut temp_file = File::create(&temp_path)?;
        temp_file.write_all(data)?;
        temp_file.sync_all()?;
        if private {
            set_restrictive_permissions(&temp_path)?;
        }

        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&temp_path, &final_path)?;

        tracing::debug!(
            "Stored {} ({} bytes, sha256 {})",
            final_path.display(),
            data.len(),
            hex::encode(Sha256::digest(data))
        );
        Ok(())
    }
}
