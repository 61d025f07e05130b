//! In-memory doubles for the remote repository and download targets.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::error::Result;
use crate::publish::DownloadSink;
use crate::remote::{BoxFuture, RemoteError, RemoteFile, RemoteRepository, RemoteResult};

#[derive(Default)]
struct RemoteState {
    files: HashMap<String, (Vec<u8>, String)>,
    version: u64,
    messages: Vec<String>,
}

impl RemoteState {
    fn commit(&mut self, path: &str, content: Vec<u8>) -> String {
        self.version += 1;
        let hash = format!("hash-{}", self.version);
        self.files.insert(path.to_string(), (content, hash.clone()));
        hash
    }
}

/// Remote repository held in memory, enforcing hash-conditioned writes.
#[derive(Default)]
pub(crate) struct MemoryRemote {
    state: Mutex<RemoteState>,
    deny_access: bool,
    failing: HashSet<String>,
    racing: HashSet<String>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.commit_external(path, content);
        self
    }

    /// Credentials lack push permission.
    pub fn deny_access(mut self) -> Self {
        self.deny_access = true;
        self
    }

    /// Writes to `path` fail with a server error.
    pub fn fail_on(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    /// Someone else commits `path` right after every hash read.
    pub fn race_on(mut self, path: &str) -> Self {
        self.racing.insert(path.to_string());
        self
    }

    /// Commit made outside the publisher.
    pub fn commit_external(&self, path: &str, content: &str) {
        let mut state = self.state.lock().unwrap();
        state.commit(path, content.as_bytes().to_vec());
    }

    pub fn content(&self, path: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .files
            .get(path)
            .map(|(bytes, _)| String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn bytes(&self, path: &str) -> Option<Vec<u8>> {
        let state = self.state.lock().unwrap();
        state.files.get(path).map(|(bytes, _)| bytes.clone())
    }

    /// Commit messages of publisher writes, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.state.lock().unwrap().messages.clone()
    }
}

impl RemoteRepository for MemoryRemote {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn read_hash<'a>(&'a self, path: &'a str) -> BoxFuture<'a, RemoteResult<Option<String>>> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            let hash = state.files.get(path).map(|(_, hash)| hash.clone());
            if self.racing.contains(path) {
                state.commit(path, b"[\"edited elsewhere\"]".to_vec());
            }
            Ok(hash)
        })
    }

    fn write<'a>(
        &'a self,
        path: &'a str,
        content: &'a [u8],
        message: &'a str,
        previous_hash: Option<&'a str>,
    ) -> BoxFuture<'a, RemoteResult<RemoteFile>> {
        Box::pin(async move {
            if self.failing.contains(path) {
                return Err(RemoteError::Http {
                    status: 500,
                    message: "Internal Server Error".to_string(),
                });
            }

            let mut state = self.state.lock().unwrap();
            let current = state.files.get(path).map(|(_, hash)| hash.as_str());
            if current != previous_hash {
                return Err(RemoteError::Conflict {
                    path: path.to_string(),
                });
            }

            let hash = state.commit(path, content.to_vec());
            state.messages.push(message.to_string());
            Ok(RemoteFile {
                path: path.to_string(),
                hash,
            })
        })
    }

    fn validate_access<'a>(&'a self) -> BoxFuture<'a, RemoteResult<()>> {
        Box::pin(async move {
            if self.deny_access {
                Err(RemoteError::AccessDenied {
                    repository: "memory".to_string(),
                })
            } else {
                Ok(())
            }
        })
    }
}

/// Download target that keeps saved documents in memory.
#[derive(Default)]
pub(crate) struct RecordingSink {
    saved: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    pub fn names(&self) -> Vec<String> {
        let saved = self.saved.lock().unwrap();
        saved.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn contents(&self, prefix: &str) -> Option<String> {
        let saved = self.saved.lock().unwrap();
        saved
            .iter()
            .find(|(name, _)| name.starts_with(prefix))
            .map(|(_, contents)| contents.clone())
    }
}

impl DownloadSink for RecordingSink {
    fn save(&self, file_name: &str, contents: &str) -> Result<String> {
        let mut saved = self.saved.lock().unwrap();
        saved.push((file_name.to_string(), contents.to_string()));
        Ok(format!("memory://{}", file_name))
    }
}
