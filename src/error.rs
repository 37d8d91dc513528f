//! Library error taxonomy.
//!
//! Rejections (empty line, similar line, exact duplicate) are data and never
//! show up here; only failures that stop an operation do.

use std::io;
use std::path::{Path, PathBuf};

/// Errors raised by the corpus engines
#[derive(Debug, thiserror::Error)]
pub enum CullError
{
    /// File missing and uncreatable, read, write, append or rename failure
    #[error("I/O error on {}: {source}", path.display())]
    Io
    {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Similarity threshold outside (0, 1]
    #[error("invalid similarity threshold {0}: expected a value in (0, 1]")]
    InvalidThreshold(f64),

    /// A thread panicked while holding the appender lock
    #[error("appender state lock poisoned")]
    Poisoned,
}

impl CullError
{
    /// Attach a path to a raw I/O error
    pub fn io(
        path: impl AsRef<Path>,
        source: io::Error,
    ) -> Self
    {
        Self::Io { path: path.as_ref().to_path_buf(), source }
    }
}

pub type Result<T, E = CullError> = std::result::Result<T, E>;

/// Extension trait mirroring `anyhow::Context` for path-tagged I/O errors
pub(crate) trait IoPathExt<T>
{
    fn at_path(
        self,
        path: &Path,
    ) -> Result<T>;
}

impl<T> IoPathExt<T> for io::Result<T>
{
    fn at_path(
        self,
        path: &Path,
    ) -> Result<T>
    {
        self.map_err(|e| CullError::io(path, e))
    }
}
