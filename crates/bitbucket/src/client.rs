//! The HTTP client.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use scm::wire::{CloudRepository, ServerRepository};
use scm::{
    ApiError, BitbucketApi, BitbucketType, GitRef, OwnerName, PayloadError, PullRequest,
    Repository, RepositoryName,
};

use crate::{cloud, server};

/// REST root of Bitbucket Cloud.
pub const CLOUD_API_URL: &str = "https://api.bitbucket.org";

const PAGE_SIZE: u32 = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How requests authenticate. Resolving a credential id into a secret is the
/// caller's concern.
#[derive(Clone)]
pub enum Credentials {
    Basic { username: String, password: String },
    Bearer(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::Bearer(_) => f.debug_tuple("Bearer").field(&"<redacted>").finish(),
        }
    }
}

/// [`BitbucketApi`] over HTTP, for either Cloud or Server.
#[derive(Debug, Clone)]
pub struct BitbucketClient {
    http: Client,
    kind: BitbucketType,
    base_url: String,
    credentials: Option<Credentials>,
}

/// The next Cloud page, unless the provider points back at a page already read.
fn next_cloud_page(visited: &HashSet<String>, next: Option<String>) -> Option<String> {
    let next = next?;
    if visited.contains(&next) {
        warn!(url = %next, "Bitbucket repeated a page link; stopping pagination");
        return None;
    }
    Some(next)
}

/// The next Server page start, unless it fails to move past `start`.
fn next_server_start(start: u64, next: Option<u64>) -> Option<u64> {
    let next = next?;
    if next <= start {
        warn!(start, next, "Bitbucket page start did not advance; stopping pagination");
        return None;
    }
    Some(next)
}

fn with_query(url: &str, query: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}

impl BitbucketClient {
    /// Client for Bitbucket Cloud at [`CLOUD_API_URL`].
    pub fn cloud(credentials: Option<Credentials>) -> Result<Self, ApiError> {
        Self::new(BitbucketType::Cloud, CLOUD_API_URL, credentials)
    }

    /// Client for a Bitbucket Server instance.
    pub fn server(server_url: &str, credentials: Option<Credentials>) -> Result<Self, ApiError> {
        Self::new(BitbucketType::Server, server_url, credentials)
    }

    /// `base_url` is the Cloud API root or the Server base URL.
    pub fn new(
        kind: BitbucketType,
        base_url: &str,
        credentials: Option<Credentials>,
    ) -> Result<Self, ApiError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let http = Client::builder()
            .user_agent(concat!("bitbucket-source/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Transport {
                url: base_url.clone(),
                message: e.to_string(),
            })?;
        Ok(Self {
            http,
            kind,
            base_url,
            credentials,
        })
    }

    pub fn kind(&self) -> BitbucketType {
        self.kind
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some(Credentials::Basic { username, password }) => {
                request.basic_auth(username, Some(password))
            }
            Some(Credentials::Bearer(token)) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, kind: &'static str) -> Result<T, ApiError> {
        debug!(url = url, "GET");
        let response = self
            .authenticate(self.http.get(url))
            .send()
            .await
            .map_err(|e| ApiError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| ApiError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&body).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source: PayloadError::Malformed { kind, source },
        })
    }

    async fn cloud_values<T: DeserializeOwned>(
        &self,
        url: String,
        kind: &'static str,
    ) -> Result<Vec<T>, ApiError> {
        let mut values = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(with_query(&url, &format!("pagelen={PAGE_SIZE}")));
        while let Some(url) = next {
            let page: cloud::Page<T> = self.get_json(&url, kind).await?;
            values.extend(page.values);
            visited.insert(url);
            next = next_cloud_page(&visited, page.next);
        }
        Ok(values)
    }

    async fn server_values<T: DeserializeOwned>(
        &self,
        url: String,
        kind: &'static str,
    ) -> Result<Vec<T>, ApiError> {
        let mut values = Vec::new();
        let mut start = 0;
        loop {
            let page_url = with_query(&url, &format!("start={start}&limit={PAGE_SIZE}"));
            let page: server::Page<T> = self.get_json(&page_url, kind).await?;
            let next = next_server_start(start, page.next_start());
            values.extend(page.values);
            match next {
                Some(next) => start = next,
                None => return Ok(values),
            }
        }
    }

    fn cloud_repository_url(&self, owner: &OwnerName, repository: &RepositoryName) -> String {
        format!("{}/2.0/repositories/{owner}/{repository}", self.base_url)
    }

    fn server_repository_url(&self, owner: &OwnerName, repository: &RepositoryName) -> String {
        format!(
            "{}/rest/api/1.0/projects/{owner}/repos/{repository}",
            self.base_url
        )
    }

    async fn list_refs(
        &self,
        owner: &OwnerName,
        repository: &RepositoryName,
        cloud_path: &str,
        server_path: &str,
    ) -> Result<Vec<GitRef>, ApiError> {
        let refs = match self.kind {
            BitbucketType::Cloud => {
                let url = format!("{}/{cloud_path}", self.cloud_repository_url(owner, repository));
                self.cloud_values::<cloud::Ref>(url, cloud::REFS)
                    .await?
                    .into_iter()
                    .filter_map(cloud::Ref::into_git_ref)
                    .collect()
            }
            BitbucketType::Server => {
                let url = format!("{}/{server_path}", self.server_repository_url(owner, repository));
                self.server_values::<server::Ref>(url, server::REFS)
                    .await?
                    .into_iter()
                    .filter_map(server::Ref::into_git_ref)
                    .collect()
            }
        };
        Ok(refs)
    }
}

fn decode_error(url: String) -> impl FnOnce(PayloadError) -> ApiError {
    move |source| ApiError::Decode { url, source }
}

#[async_trait]
impl BitbucketApi for BitbucketClient {
    async fn list_repositories(&self, owner: &OwnerName) -> Result<Vec<Repository>, ApiError> {
        match self.kind {
            BitbucketType::Cloud => {
                let url = format!("{}/2.0/repositories/{owner}", self.base_url);
                let values: Vec<CloudRepository> =
                    self.cloud_values(url.clone(), cloud::REPOSITORIES).await?;
                cloud::into_repositories(values).map_err(decode_error(url))
            }
            BitbucketType::Server => {
                let url = format!("{}/rest/api/1.0/projects/{owner}/repos", self.base_url);
                let values: Vec<ServerRepository> =
                    self.server_values(url.clone(), server::REPOSITORIES).await?;
                server::into_repositories(values).map_err(decode_error(url))
            }
        }
    }

    async fn list_branches(
        &self,
        owner: &OwnerName,
        repository: &RepositoryName,
    ) -> Result<Vec<GitRef>, ApiError> {
        self.list_refs(owner, repository, "refs/branches", "branches").await
    }

    async fn list_tags(
        &self,
        owner: &OwnerName,
        repository: &RepositoryName,
    ) -> Result<Vec<GitRef>, ApiError> {
        self.list_refs(owner, repository, "refs/tags", "tags").await
    }

    async fn list_pull_requests(
        &self,
        owner: &OwnerName,
        repository: &RepositoryName,
    ) -> Result<Vec<PullRequest>, ApiError> {
        let mut pull_requests = Vec::new();
        match self.kind {
            BitbucketType::Cloud => {
                let url = format!(
                    "{}/pullrequests?state=OPEN",
                    self.cloud_repository_url(owner, repository)
                );
                let entries: Vec<cloud::PullRequestEntry> =
                    self.cloud_values(url.clone(), cloud::PULL_REQUESTS).await?;
                for entry in entries {
                    if let Some(pr) = entry.into_pull_request().map_err(decode_error(url.clone()))? {
                        pull_requests.push(pr);
                    }
                }
            }
            BitbucketType::Server => {
                let url = format!(
                    "{}/pull-requests?state=OPEN",
                    self.server_repository_url(owner, repository)
                );
                let entries: Vec<server::PullRequestEntry> =
                    self.server_values(url.clone(), server::PULL_REQUESTS).await?;
                for entry in entries {
                    if let Some(pr) = entry.into_pull_request().map_err(decode_error(url.clone()))? {
                        pull_requests.push(pr);
                    }
                }
            }
        }
        Ok(pull_requests)
    }
}
