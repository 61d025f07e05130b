//! Download fallback targets.

use crate::error::Result;

/// Where documents go when no remote repository is configured.
///
/// In a browser this triggers a file download; natively it writes into a
/// directory the operator uploads by hand.
pub trait DownloadSink {
    /// Save `contents` under `file_name`, returning where it ended up.
    fn save(&self, file_name: &str, contents: &str) -> Result<String>;
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::DirectorySink;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;

    use super::DownloadSink;
    use crate::error::{CmsError, Result};

    /// Writes downloads into a directory, creating it on first use.
    #[derive(Debug, Clone)]
    pub struct DirectorySink {
        dir: PathBuf,
    }

    impl DirectorySink {
        /// Save downloads into `dir`, created on first write.
        pub fn new(dir: impl Into<PathBuf>) -> Self {
            Self { dir: dir.into() }
        }
    }

    impl DownloadSink for DirectorySink {
        fn save(&self, file_name: &str, contents: &str) -> Result<String> {
            std::fs::create_dir_all(&self.dir)?;
            let path = self.dir.join(file_name);
            std::fs::write(&path, contents).map_err(|source| CmsError::FileWrite {
                path: path.clone(),
                source,
            })?;
            Ok(path.display().to_string())
        }
    }

}
