//! Recovery phrases only reach the key tool through a file on disk. The file is
//! unique per call, readable by the owner only, and removed when the guard drops,
//! whichever way the caller leaves the scope.

use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::Result;

pub struct SecretFile {
    file: NamedTempFile,
}

impl SecretFile {
    pub fn create(contents: &str) -> Result<Self> {
        let file = tempfile::Builder::new()
            .prefix("phrase-")
            .suffix(".txt")
            .tempfile()?;
        Self::fill(file, contents)
    }

    pub fn create_in(dir: &Path, contents: &str) -> Result<Self> {
        let file = tempfile::Builder::new()
            .prefix("phrase-")
            .suffix(".txt")
            .tempfile_in(dir)?;
        Self::fill(file, contents)
    }

    fn fill(mut file: NamedTempFile, contents: &str) -> Result<Self> {
        file.write_all(contents.as_bytes())?;
        file.flush()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl std::fmt::Debug for SecretFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretFile")
            .field("path", &self.path())
            .finish()
    }
}
