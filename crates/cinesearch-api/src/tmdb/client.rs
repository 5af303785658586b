//! `TmdbClient` - TMDB API client implementation.

use anyhow::{Context, Result, bail};
use reqwest::{Client, RequestBuilder};
use tracing::instrument;
use url::Url;

use super::api::TmdbApi;
use super::types::{SearchMovieParams, SearchResult, TmdbErrorResponse};

/// Default base URL for TMDB API v3.
const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3/";

/// TMDB credential.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// v3 API key, sent as the `api_key` query parameter.
    ApiKey(String),
    /// v4 read access token, sent as `Authorization: Bearer`.
    BearerToken(String),
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey(***)"),
            Self::BearerToken(_) => f.write_str("BearerToken(***)"),
        }
    }
}

impl Credential {
    /// Attaches the credential to a request.
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Self::ApiKey(key) => request.query(&[("api_key", key.as_str())]),
            Self::BearerToken(token) => request.bearer_auth(token),
        }
    }
}

/// TMDB API client.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClient {
    /// HTTP client.
    http_client: Client,
    /// Base URL for API requests.
    base_url: Url,
    /// API credential.
    credential: Credential,
}

/// Builder for `TmdbClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClientBuilder {
    base_url: Option<Url>,
    credential: Option<Credential>,
    user_agent: Option<String>,
}

impl TmdbClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            credential: None,
            user_agent: None,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the API credential (required).
    #[must_use]
    pub fn credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Sets a v3 API key as the credential.
    #[must_use]
    pub fn api_key(self, key: impl Into<String>) -> Self {
        self.credential(Credential::ApiKey(key.into()))
    }

    /// Sets a v4 bearer token as the credential.
    #[must_use]
    pub fn api_token(self, token: impl Into<String>) -> Self {
        self.credential(Credential::BearerToken(token.into()))
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `credential` is not set.
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<TmdbClient> {
        let credential = self.credential.context("credential is required")?;
        let user_agent = self.user_agent.context("user_agent is required")?;

        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            let result = Url::parse(DEFAULT_BASE_URL);
            result.context("invalid default base URL")?
        };

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(TmdbClient {
            http_client,
            base_url,
            credential,
        })
    }
}

impl TmdbClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> TmdbClientBuilder {
        TmdbClientBuilder::new()
    }

    /// Sends a GET request with the credential and query params.
    ///
    /// Query values are percent-encoded by `reqwest`.
    #[instrument(skip_all)]
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self
            .base_url
            .join(path)
            .with_context(|| format!("failed to join URL path: {path}"))?;

        let request = self
            .credential
            .apply(self.http_client.get(url))
            .query(query)
            .build()
            .with_context(|| format!("failed to build request: {path}"))?;

        tracing::debug!(path, "TMDB API request");

        let result = self.http_client.execute(request).await;
        let response = result.with_context(|| format!("request failed: {path}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to read body>"));
            if let Ok(error_response) = serde_json::from_str::<TmdbErrorResponse>(&body) {
                bail!(
                    "TMDB API error (HTTP {}): code={}, message={}",
                    status,
                    error_response.status_code,
                    error_response.status_message,
                );
            }
            bail!("TMDB API error (HTTP {status}): {body}");
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read response body: {path}"))?;
        let raw_result: std::result::Result<T, _> = serde_json::from_str(&body);
        let parsed =
            raw_result.with_context(|| format!("failed to decode JSON response: {path}"))?;
        Ok(parsed)
    }
}

impl TmdbApi for TmdbClient {
    #[instrument(skip_all, fields(query = %params.query))]
    async fn search_movie(&self, params: &SearchMovieParams) -> Result<SearchResult> {
        let mut query: Vec<(&str, String)> = vec![
            ("query", params.query.clone()),
            ("include_adult", params.include_adult.to_string()),
        ];
        if let Some(ref language) = params.language {
            query.push(("language", language.clone()));
        }

        let result: SearchResult = self.get_json("search/movie", &query).await?;
        tracing::debug!(
            results = result.len(),
            total_results = result.total_results,
            "TMDB search/movie response"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;

    fn client_for(mock_server: &wiremock::MockServer, credential: Credential) -> TmdbClient {
        let base_url = format!("{}/3/", mock_server.uri());
        TmdbClient::builder()
            .base_url(base_url.parse().unwrap())
            .credential(credential)
            .user_agent("test/0.0.0")
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_credential() {
        // Arrange & Act
        let result = TmdbClient::builder().user_agent("test/0.0.0").build();

        // Assert
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("credential is required")
        );
    }

    #[test]
    fn test_builder_requires_user_agent() {
        // Arrange & Act
        let result = TmdbClient::builder().api_key("test-key").build();

        // Assert
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("user_agent is required")
        );
    }

    #[test]
    fn test_builder_with_required_fields_succeeds() {
        // Arrange & Act
        let result = TmdbClient::builder()
            .api_key("test-key")
            .user_agent("test/0.0.0")
            .build();

        // Assert
        assert!(result.is_ok());
    }

    #[test]
    fn test_builder_with_custom_base_url() {
        // Arrange
        let custom_url = Url::parse("http://localhost:8080/3/").unwrap();

        // Act
        let client = TmdbClient::builder()
            .base_url(custom_url.clone())
            .api_token("test-token")
            .user_agent("test/0.0.0")
            .build()
            .unwrap();

        // Assert
        assert_eq!(client.base_url, custom_url);
        assert_eq!(
            client.credential,
            Credential::BearerToken(String::from("test-token"))
        );
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        // Arrange
        let credential = Credential::ApiKey(String::from("super-secret"));

        // Act
        let debug = format!("{credential:?}");

        // Assert
        assert!(!debug.contains("super-secret"));
    }

    #[tokio::test]
    async fn test_search_movie_via_http() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/search_movie_matrix.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/3/search/movie"))
            .and(wiremock::matchers::query_param("query", "matrix"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, Credential::ApiKey(String::from("k")));
        let params = SearchMovieParams::new("matrix");

        // Act
        let response = client.search_movie(&params).await.unwrap();

        // Assert
        assert_eq!(response.len(), 3);
        assert_eq!(response.results[0].title, "The Matrix");
    }

    #[tokio::test]
    async fn test_api_key_is_sent_as_query_param() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/search_movie_empty.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::query_param("api_key", "my-secret-key"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(
            &mock_server,
            Credential::ApiKey(String::from("my-secret-key")),
        );

        // Act & Assert (mock expect(1) verifies the api_key parameter)
        client
            .search_movie(&SearchMovieParams::new("test"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_bearer_token_is_sent() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/search_movie_empty.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::header(
                "Authorization",
                "Bearer my-secret-token",
            ))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(
            &mock_server,
            Credential::BearerToken(String::from("my-secret-token")),
        );

        // Act & Assert (mock expect(1) verifies Authorization header)
        client
            .search_movie(&SearchMovieParams::new("test"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_query_is_percent_encoded() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/search_movie_empty.json");

        // The matcher compares decoded values, so a raw `&` would have split the query.
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::query_param("query", "fast & furious"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, Credential::ApiKey(String::from("k")));

        // Act & Assert
        client
            .search_movie(&SearchMovieParams::new("fast & furious"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_language_param_is_sent() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/search_movie_empty.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::query_param("language", "ar-SA"))
            .and(wiremock::matchers::query_param("include_adult", "false"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, Credential::ApiKey(String::from("k")));
        let params = SearchMovieParams::new("test").language("ar-SA");

        // Act & Assert
        client.search_movie(&params).await.unwrap();
    }

    #[tokio::test]
    async fn test_http_error_returns_tmdb_error() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let error_body = r#"{"status_code":7,"status_message":"Invalid API key: You must be granted a valid key.","success":false}"#;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(401).set_body_string(error_body))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, Credential::ApiKey(String::from("bad")));

        // Act
        let result = client.search_movie(&SearchMovieParams::new("test")).await;

        // Assert
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("TMDB API error"));
        assert!(err.contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_http_error_without_envelope() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(503).set_body_string("upstream down"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, Credential::ApiKey(String::from("k")));

        // Act
        let result = client.search_movie(&SearchMovieParams::new("test")).await;

        // Assert (no retry on server errors)
        let err = result.unwrap_err().to_string();
        assert!(err.contains("HTTP 503"));
        assert!(err.contains("upstream down"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_error() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, Credential::ApiKey(String::from("k")));

        // Act
        let result = client.search_movie(&SearchMovieParams::new("test")).await;

        // Assert
        let err = format!("{:#}", result.unwrap_err());
        assert!(err.contains("failed to decode JSON response"));
    }
}
