//! Build inputs loaded from disk, and the output writer.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BuildError, Result};

/// Kernel-language text that gets compiled.
#[derive(Debug, Clone)]
pub struct SourceModule {
    pub path: PathBuf,
    pub text: Vec<u8>,
}

impl SourceModule {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            text: read_file(path)?,
        })
    }

    /// Name used for include resolution and messages: the path as given.
    pub fn name(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// A previously compiled or linked program. Only ever linked.
#[derive(Debug, Clone)]
pub struct BinaryModule {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl BinaryModule {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            bytes: read_file(path)?,
        })
    }
}

pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| BuildError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|source| BuildError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_names_path() {
        let err = SourceModule::load(Path::new("/nonexistent/kernel.cl")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/kernel.cl"));
    }

    #[test]
    fn load_keeps_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("k.bin");
        write_file(&path, &[0, 159, 146, 150]).unwrap();
        let module = BinaryModule::load(&path).unwrap();
        assert_eq!(module.bytes, vec![0, 159, 146, 150]);
    }
}
