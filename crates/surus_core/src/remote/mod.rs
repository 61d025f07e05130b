//! Remote repository client.
//!
//! Publishing writes JSON documents into the website's source repository
//! through a content API with three primitives:
//!
//! - [`RemoteRepository::read_hash`]: current content hash of a path, or `None`
//!   if the path does not exist yet
//! - [`RemoteRepository::write`]: commit new content, conditioned on the hash
//!   read before (omitted only when creating the path)
//! - [`RemoteRepository::validate_access`]: check the credential may push
//!
//! Failures are returned as [`RemoteError`] carrying the remote status and
//! message. Nothing here retries; the operator re-triggers a failed publish.
//!
//! ## Object safety
//!
//! The trait returns boxed futures so publishers can hold a
//! `&dyn RemoteRepository` and tests can swap in an in-memory remote.

#[cfg(feature = "github")]
mod github;

#[cfg(feature = "github")]
pub use github::GitHubRepository;

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

/// A boxed future for object-safe async methods.
///
/// On native targets, futures are `Send` for compatibility with multi-threaded runtimes.
#[cfg(not(target_arch = "wasm32"))]
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A boxed future for object-safe async methods.
///
/// WASM version without `Send` requirement - JavaScript is single-threaded.
#[cfg(target_arch = "wasm32")]
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Errors returned by a remote repository.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The remote answered with a non-success status.
    #[error("Remote error {status}: {message}")]
    Http {
        /// Response status code
        status: u16,
        /// Message returned by the remote
        message: String,
    },

    /// The file changed on the remote since its hash was read.
    #[error("Conflict writing {path}: the remote file changed since it was read")]
    Conflict {
        /// Repository-relative path
        path: String,
    },

    /// The credential can read the repository but not push to it.
    #[error("Token does not have write access to {repository}")]
    AccessDenied {
        /// "owner/repo"
        repository: String,
    },

    /// The request never got an answer.
    #[error("Network error: {0}")]
    Transport(String),

    /// The remote answered with something unexpected.
    #[error("Unexpected response from remote: {0}")]
    Decode(String),
}

impl RemoteError {
    /// HTTP status associated with the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Http { status, .. } => Some(*status),
            RemoteError::Conflict { .. } => Some(409),
            RemoteError::AccessDenied { .. } => Some(403),
            RemoteError::Transport(_) | RemoteError::Decode(_) => None,
        }
    }
}

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// A file on the remote after a successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RemoteFile {
    /// Repository-relative path
    pub path: String,
    /// Content hash to pass as `previous_hash` on the next write
    pub hash: String,
}

/// Commit message used for every published file.
pub fn commit_message(path: &str) -> String {
    format!("Update {} from CMS", path)
}

/// Remote repository holding the site's published content.
#[cfg(not(target_arch = "wasm32"))]
pub trait RemoteRepository: Send + Sync {
    /// Short description for logs and reports ("owner/repo@main").
    fn describe(&self) -> String;

    /// Current content hash at `path`, or `None` if the path does not exist.
    fn read_hash<'a>(&'a self, path: &'a str) -> BoxFuture<'a, RemoteResult<Option<String>>>;

    /// Commit `content` to `path`.
    ///
    /// `previous_hash` must match the remote's current hash, or the write is
    /// rejected with [`RemoteError::Conflict`]. Pass `None` only to create a path.
    fn write<'a>(
        &'a self,
        path: &'a str,
        content: &'a [u8],
        message: &'a str,
        previous_hash: Option<&'a str>,
    ) -> BoxFuture<'a, RemoteResult<RemoteFile>>;

    /// Confirm the credential has write permission on the repository.
    fn validate_access<'a>(&'a self) -> BoxFuture<'a, RemoteResult<()>>;
}

/// Remote repository holding the site's published content.
#[cfg(target_arch = "wasm32")]
pub trait RemoteRepository {
    /// Short description for logs and reports ("owner/repo@main").
    fn describe(&self) -> String;

    /// Current content hash at `path`, or `None` if the path does not exist.
    fn read_hash<'a>(&'a self, path: &'a str) -> BoxFuture<'a, RemoteResult<Option<String>>>;

    /// Commit `content` to `path`, conditioned on `previous_hash`.
    fn write<'a>(
        &'a self,
        path: &'a str,
        content: &'a [u8],
        message: &'a str,
        previous_hash: Option<&'a str>,
    ) -> BoxFuture<'a, RemoteResult<RemoteFile>>;

    /// Confirm the credential has write permission on the repository.
    fn validate_access<'a>(&'a self) -> BoxFuture<'a, RemoteResult<()>>;
}

#[cfg(test)]
mod tests {
    use futures_lite::future::block_on;

    use super::*;
    use crate::test_utils::MemoryRemote;

    #[test]
    fn test_read_hash_absent_path_is_none() {
        let remote = MemoryRemote::new();
        assert_eq!(block_on(remote.read_hash("public/data/blog.json")), Ok(None));
    }

    #[test]
    fn test_write_requires_matching_hash() {
        let remote = MemoryRemote::new().with_file("public/data/blog.json", "[]");
        let h1 = block_on(remote.read_hash("public/data/blog.json"))
            .unwrap()
            .unwrap();

        // Someone else commits in between
        remote.commit_external("public/data/blog.json", "[1]");

        let err = block_on(remote.write(
            "public/data/blog.json",
            b"[2]",
            &commit_message("public/data/blog.json"),
            Some(&h1),
        ))
        .unwrap_err();
        assert!(matches!(err, RemoteError::Conflict { .. }));
        assert_eq!(remote.content("public/data/blog.json").as_deref(), Some("[1]"));
    }

    #[test]
    fn test_write_with_current_hash_returns_new_hash() {
        let remote = MemoryRemote::new().with_file("team.json", "[]");
        let h1 = block_on(remote.read_hash("team.json")).unwrap().unwrap();
        let file = block_on(remote.write("team.json", b"[{}]", "msg", Some(&h1))).unwrap();
        assert_ne!(file.hash, h1);
        assert_eq!(block_on(remote.read_hash("team.json")), Ok(Some(file.hash)));
    }

    #[test]
    fn test_error_status() {
        assert_eq!(
            RemoteError::Conflict {
                path: "x".to_string()
            }
            .status(),
            Some(409)
        );
        assert_eq!(RemoteError::Transport("down".to_string()).status(), None);
    }

    #[test]
    fn test_commit_message() {
        assert_eq!(
            commit_message("public/data/blog.json"),
            "Update public/data/blog.json from CMS"
        );
    }
}
