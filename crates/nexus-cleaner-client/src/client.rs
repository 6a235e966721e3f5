//! Nexus REST API client.
//!
//! This module provides the client used to list docker repositories and their
//! components, and to delete assets or components.

use std::collections::HashSet;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::api::{
    Component, Page, Repository, ASSETS_PATH, COMPONENTS_PATH, REPOSITORIES_PATH, SEARCH_PATH,
};
use crate::config::{NexusAuth, NexusConfig};
use crate::error::ClientError;

/// Longest error body kept in an error message.
const MAX_ERROR_BODY: usize = 1000;

/// Client for the Nexus Repository Manager REST API.
#[derive(Debug)]
pub struct NexusClient {
    config: NexusConfig,
    base: Url,
    http: reqwest::Client,
}

impl NexusClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be created.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use nexus_cleaner_client::{NexusAuth, NexusClient, NexusConfig};
    ///
    /// let config = NexusConfig::new("https://nexus.example.com")
    ///     .with_auth(NexusAuth::basic("cleaner", "secret"));
    /// let client = NexusClient::new(config)?;
    /// # Ok::<(), nexus_cleaner_client::ClientError>(())
    /// ```
    pub fn new(config: NexusConfig) -> Result<Self, ClientError> {
        let base = Url::parse(&config.url).map_err(|_| ClientError::InvalidUrl {
            url: config.url.clone(),
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl {
                url: config.url.clone(),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ClientError::ConnectionFailed {
                url: config.url.clone(),
                source: e,
            })?;

        Ok(Self { config, base, http })
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &NexusConfig {
        &self.config
    }

    /// Lists every repository visible to the configured user.
    ///
    /// # Errors
    ///
    /// Returns an error if Nexus cannot be reached or rejects the request.
    pub async fn list_repositories(&self) -> Result<Vec<Repository>, ClientError> {
        self.get_json(self.endpoint(REPOSITORIES_PATH)).await
    }

    /// Returns the names of all hosted docker repositories.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository listing fails.
    pub async fn docker_repositories(&self) -> Result<Vec<String>, ClientError> {
        let repositories = self.list_repositories().await?;
        Ok(repositories
            .into_iter()
            .filter(Repository::is_hosted_docker)
            .map(|repository| repository.name)
            .collect())
    }

    /// Lists every component of a repository, following continuation tokens
    /// until the last page.
    ///
    /// # Errors
    ///
    /// Returns an error if any page cannot be fetched or decoded, or
    /// [`ClientError::PaginationLoop`] if Nexus repeats a continuation token.
    pub async fn list_components(&self, repository: &str) -> Result<Vec<Component>, ClientError> {
        let mut components = Vec::new();
        let mut token: Option<String> = None;
        let mut seen: HashSet<String> = HashSet::new();

        loop {
            let page = self.search_page(repository, token.as_deref()).await?;
            debug!(
                repository,
                items = page.items.len(),
                more = page.continuation_token.is_some(),
                "Fetched search page"
            );
            components.extend(page.items);

            match page.continuation_token {
                Some(next) if !next.is_empty() => {
                    if !seen.insert(next.clone()) {
                        return Err(ClientError::PaginationLoop {
                            repository: repository.to_string(),
                            token: next,
                        });
                    }
                    token = Some(next);
                }
                _ => break,
            }
        }

        Ok(components)
    }

    /// Fetches a single page of the component search for a repository.
    ///
    /// # Errors
    ///
    /// Returns an error if the page cannot be fetched or decoded.
    pub async fn search_page(
        &self,
        repository: &str,
        continuation_token: Option<&str>,
    ) -> Result<Page<Component>, ClientError> {
        let mut url = self.endpoint(SEARCH_PATH);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("repository", repository);
            if let Some(token) = continuation_token {
                query.append_pair("continuationToken", token);
            }
        }

        self.get_json(url).await
    }

    /// Deletes a single asset.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if the asset no longer exists, or
    /// another error if the request fails.
    pub async fn delete_asset(&self, id: &str) -> Result<(), ClientError> {
        let url = self.resource(ASSETS_PATH, id)?;
        self.delete(url).await
    }

    /// Deletes a component together with all of its assets.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if the component no longer exists, or
    /// another error if the request fails.
    pub async fn delete_component(&self, id: &str) -> Result<(), ClientError> {
        let url = self.resource(COMPONENTS_PATH, id)?;
        self.delete(url).await
    }

    /// Builds an endpoint URL below the configured base, keeping any context
    /// path the base carries (e.g., `https://host/nexus`).
    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        let joined = format!("{}{path}", url.path().trim_end_matches('/'));
        url.set_path(&joined);
        url.set_query(None);
        url
    }

    /// Builds `<endpoint>/<id>` with the id percent-encoded as one segment.
    fn resource(&self, path: &str, id: &str) -> Result<Url, ClientError> {
        let mut url = self.endpoint(path);
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl {
                url: self.config.url.clone(),
            })?
            .push(id);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        debug!(%url, "GET");

        let response = self
            .http
            .get(url.clone())
            .headers(self.auth_headers()?)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let body = Self::check(response, &url).await?.text().await?;

        serde_json::from_str(&body).map_err(|e| ClientError::InvalidResponse {
            url: url.to_string(),
            source: e,
        })
    }

    async fn delete(&self, url: Url) -> Result<(), ClientError> {
        debug!(%url, "DELETE");

        let response = self
            .http
            .delete(url.clone())
            .headers(self.auth_headers()?)
            .send()
            .await?;
        Self::check(response, &url).await?;

        Ok(())
    }

    /// Maps non-success responses to errors.
    async fn check(response: Response, url: &Url) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message: String = response
            .text()
            .await
            .unwrap_or_default()
            .chars()
            .take(MAX_ERROR_BODY)
            .collect();

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ClientError::AuthenticationFailed {
                    status: status.as_u16(),
                    message,
                }
            }
            StatusCode::NOT_FOUND => ClientError::NotFound {
                resource: url.path().to_string(),
            },
            _ => ClientError::HttpError {
                status: status.as_u16(),
                message,
            },
        })
    }

    /// Creates authentication headers based on configuration.
    fn auth_headers(&self) -> Result<HeaderMap, ClientError> {
        let mut headers = HeaderMap::new();

        match &self.config.auth {
            NexusAuth::None => {}
            NexusAuth::Basic { username, password } => {
                let credentials = base64::Engine::encode(
                    &base64::engine::general_purpose::STANDARD,
                    format!("{username}:{password}"),
                );
                let mut value = HeaderValue::from_str(&format!("Basic {credentials}"))
                    .map_err(|_| ClientError::AuthenticationFailed {
                        status: 0,
                        message: "Invalid credentials".to_string(),
                    })?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
        }

        Ok(headers)
    }
}
