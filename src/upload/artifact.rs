use crate::error::UploadError;
use crate::upload::types::Artifact;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tracing::info;

/// Destination for processed workbooks.
pub trait SaveArtifact: Send + Sync {
    fn save(&self, artifact: &Artifact) -> Result<PathBuf, UploadError>;
}

/// Saves artifacts into a directory under their fixed file name.
///
/// Bytes go to a temporary file next to the target first, which is then
/// renamed over it, so a half-written workbook never carries the final name.
#[derive(Debug, Clone)]
pub struct ArtifactSaver {
    dir: PathBuf,
}

impl ArtifactSaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SaveArtifact for ArtifactSaver {
    fn save(&self, artifact: &Artifact) -> Result<PathBuf, UploadError> {
        let target = self.dir.join(&artifact.file_name);
        let save_err = |source| UploadError::Save {
            path: target.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(save_err)?;
        let mut temp = NamedTempFile::new_in(&self.dir).map_err(save_err)?;
        temp.write_all(&artifact.bytes).map_err(save_err)?;
        temp.flush().map_err(save_err)?;
        temp.persist(&target).map_err(|e| save_err(e.error))?;

        info!("Saved {} bytes to {}", artifact.bytes.len(), target.display());
        Ok(target)
    }
}
