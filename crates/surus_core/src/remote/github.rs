//! GitHub contents API backend.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::debug;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::{BoxFuture, RemoteError, RemoteFile, RemoteRepository, RemoteResult};
use crate::config::RemoteConfig;

const USER_AGENT: &str = "surus-cms";
const ACCEPT: &str = "application/vnd.github.v3+json";

#[derive(Deserialize)]
struct ContentMetadata {
    sha: String,
}

#[derive(Deserialize)]
struct WriteResponse {
    content: WrittenContent,
}

#[derive(Deserialize)]
struct WrittenContent {
    path: String,
    sha: String,
}

#[derive(Serialize)]
struct WriteRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Deserialize)]
struct RepositoryInfo {
    #[serde(default)]
    permissions: Option<Permissions>,
}

#[derive(Deserialize, Default)]
struct Permissions {
    #[serde(default)]
    push: bool,
    #[serde(default)]
    admin: bool,
}

/// Repository on GitHub (or a GitHub Enterprise instance) written through the contents API.
#[derive(Debug, Clone)]
pub struct GitHubRepository {
    client: Client,
    config: RemoteConfig,
}

impl GitHubRepository {
    /// Create a client for the repository described by `config`.
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn contents_url(&self, path: &str) -> String {
        let encoded: Vec<_> = path
            .trim_start_matches('/')
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_base(),
            urlencoding::encode(&self.config.owner),
            urlencoding::encode(&self.config.repo),
            encoded.join("/")
        )
    }

    fn repository_url(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            self.config.api_base(),
            urlencoding::encode(&self.config.owner),
            urlencoding::encode(&self.config.repo)
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.config.token)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
    }

    async fn send(request: RequestBuilder) -> RemoteResult<Response> {
        request
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))
    }

    async fn http_error(response: Response) -> RemoteError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|json| json.get("message")?.as_str().map(str::to_string))
            .unwrap_or(body);
        RemoteError::Http { status, message }
    }

    async fn decode<T: for<'de> Deserialize<'de>>(response: Response) -> RemoteResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

impl RemoteRepository for GitHubRepository {
    fn describe(&self) -> String {
        format!("{}@{}", self.config.repository(), self.config.branch)
    }

    fn read_hash<'a>(&'a self, path: &'a str) -> BoxFuture<'a, RemoteResult<Option<String>>> {
        Box::pin(async move {
            let url = format!(
                "{}?ref={}",
                self.contents_url(path),
                urlencoding::encode(&self.config.branch)
            );
            let response = Self::send(self.authorized(self.client.get(url))).await?;

            match response.status() {
                StatusCode::NOT_FOUND => {
                    debug!("{} does not exist on {}", path, self.describe());
                    Ok(None)
                }
                status if status.is_success() => {
                    let metadata: ContentMetadata = Self::decode(response).await?;
                    Ok(Some(metadata.sha))
                }
                _ => Err(Self::http_error(response).await),
            }
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
            let body = WriteRequest {
                message,
                content: STANDARD.encode(content),
                branch: &self.config.branch,
                sha: previous_hash,
            };
            let request = self.authorized(self.client.put(self.contents_url(path)).json(&body));
            let response = Self::send(request).await?;

            match response.status() {
                StatusCode::CONFLICT => Err(RemoteError::Conflict {
                    path: path.to_string(),
                }),
                status if status.is_success() => {
                    let written: WriteResponse = Self::decode(response).await?;
                    Ok(RemoteFile {
                        path: written.content.path,
                        hash: written.content.sha,
                    })
                }
                _ => Err(Self::http_error(response).await),
            }
        })
    }

    fn validate_access<'a>(&'a self) -> BoxFuture<'a, RemoteResult<()>> {
        Box::pin(async move {
            let response =
                Self::send(self.authorized(self.client.get(self.repository_url()))).await?;
            if !response.status().is_success() {
                return Err(Self::http_error(response).await);
            }

            let info: RepositoryInfo = Self::decode(response).await?;
            let permissions = info.permissions.unwrap_or_default();
            if permissions.push || permissions.admin {
                Ok(())
            } else {
                Err(RemoteError::AccessDenied {
                    repository: self.config.repository(),
                })
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> GitHubRepository {
        GitHubRepository::new(RemoteConfig {
            token: "t".to_string(),
            owner: "surus".to_string(),
            repo: "website".to_string(),
            branch: "main".to_string(),
            api_url: Some("https://ghe.example.com/api/v3/".to_string()),
        })
    }

    #[test]
    fn test_contents_url_encodes_segments() {
        assert_eq!(
            repo().contents_url("public/images/uploads/my file.png"),
            "https://ghe.example.com/api/v3/repos/surus/website/contents/public/images/uploads/my%20file.png"
        );
    }

    #[test]
    fn test_write_request_omits_missing_hash() {
        let body = WriteRequest {
            message: "m",
            content: STANDARD.encode(b"[]"),
            branch: "main",
            sha: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("sha").is_none());
        assert_eq!(json["content"], "W10=");
    }

    #[test]
    fn test_describe() {
        assert_eq!(repo().describe(), "surus/website@main");
    }
}
