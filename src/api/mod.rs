//! Story API client
//!
//! Blocking client for the remote Story API: account registration and login,
//! the story feed, story upload (authenticated or guest) and web push
//! subscription. Also replays queued offline mutations for the sync processor.

mod types;

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, multipart};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{Result, TellmyError};
use crate::storage::Story;
use crate::sync::{ReplayMethod, ReplayRequest, ReplayResponse, ReplayTransport};

pub use types::{
    ApiMessage, LoginResult, NewStory, PushKeys, PushSubscription, StoryQuery,
};
use types::{
    LoginRequest, LoginResponse, RegisterRequest, StoryDetailResponse, StoryListResponse,
    UnsubscribeRequest,
};

/// Default Story API base URL.
pub const DEFAULT_BASE_URL: &str = "https://story-api.dicoding.dev/v1";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Story API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    token: Option<String>,
    http: Client,
}

impl ApiClient {
    /// Create a client for `base_url` with the given request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| TellmyError::Config(format!("invalid api base url {base_url}: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(TellmyError::Config(format!(
                "api base url must be http(s): {base_url}"
            )));
        }
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tellmy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TellmyError::Config(format!("HTTP client error: {e}")))?;

        Ok(Self {
            base_url,
            token: None,
            http,
        })
    }

    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an absolute URL, or a path relative to the base URL.
    pub fn resolve(&self, target: &str) -> Result<Url> {
        if let Ok(url) = Url::parse(target) {
            return Ok(url);
        }
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            target.trim_start_matches('/')
        );
        Url::parse(&joined)
            .map_err(|e| TellmyError::Validation(format!("invalid request url {target}: {e}")))
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    pub fn register(&self, name: &str, email: &str, password: &str) -> Result<ApiMessage> {
        info!(email, "registering account");
        let builder = self
            .http
            .post(self.resolve("/register")?)
            .json(&RegisterRequest {
                name,
                email,
                password,
            });
        let message: ApiMessage = self.execute(builder)?;
        check_envelope(&message)?;
        Ok(message)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<LoginResult> {
        info!(email, "logging in");
        let builder = self
            .http
            .post(self.resolve("/login")?)
            .json(&LoginRequest { email, password });
        let response: LoginResponse = self.execute(builder)?;
        check_envelope(&response.envelope)?;
        response
            .login_result
            .ok_or_else(|| TellmyError::Api("login response carried no token".to_string()))
    }

    // =========================================================================
    // Stories
    // =========================================================================

    /// Fetch one page of the story feed.
    pub fn list_stories(&self, query: &StoryQuery) -> Result<Vec<Story>> {
        let mut url = self.resolve("/stories")?;
        url.query_pairs_mut()
            .append_pair("page", &query.page.to_string())
            .append_pair("size", &query.size.to_string())
            .append_pair("location", if query.with_location { "1" } else { "0" });

        let builder = self.authorized(self.http.get(url))?;
        let response: StoryListResponse = self.execute(builder)?;
        check_envelope(&response.envelope)?;
        debug!(
            page = query.page,
            count = response.list_story.len(),
            "fetched story page"
        );
        Ok(response.list_story)
    }

    pub fn story_detail(&self, id: &str) -> Result<Story> {
        let builder = self.authorized(self.http.get(self.resolve(&format!("/stories/{id}"))?))?;
        let response: StoryDetailResponse = match self.execute(builder) {
            Err(TellmyError::Http { status: 404, .. }) => {
                return Err(TellmyError::StoryNotFound(id.to_string()));
            }
            other => other?,
        };
        check_envelope(&response.envelope)?;
        response
            .story
            .ok_or_else(|| TellmyError::StoryNotFound(id.to_string()))
    }

    /// Upload a story as the logged-in user.
    pub fn add_story(&self, story: &NewStory) -> Result<ApiMessage> {
        let builder = self
            .authorized(self.http.post(self.resolve("/stories")?))?
            .multipart(story_form(story)?);
        self.upload(builder)
    }

    /// Upload a story without an account.
    pub fn add_story_guest(&self, story: &NewStory) -> Result<ApiMessage> {
        let builder = self
            .http
            .post(self.resolve("/stories/guest")?)
            .multipart(story_form(story)?);
        self.upload(builder)
    }

    fn upload(&self, builder: RequestBuilder) -> Result<ApiMessage> {
        let message: ApiMessage = self.execute(builder)?;
        check_envelope(&message)?;
        info!(message = %message.message, "story uploaded");
        Ok(message)
    }

    // =========================================================================
    // Web push
    // =========================================================================

    pub fn subscribe_push(&self, subscription: &PushSubscription) -> Result<ApiMessage> {
        let builder = self
            .authorized(self.http.post(self.resolve("/notifications/subscribe")?))?
            .json(subscription);
        let message: ApiMessage = self.execute(builder)?;
        check_envelope(&message)?;
        Ok(message)
    }

    pub fn unsubscribe_push(&self, endpoint: &str) -> Result<ApiMessage> {
        let builder = self
            .authorized(self.http.delete(self.resolve("/notifications/subscribe")?))?
            .json(&UnsubscribeRequest { endpoint });
        let message: ApiMessage = self.execute(builder)?;
        check_envelope(&message)?;
        Ok(message)
    }

    fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        match &self.token {
            Some(token) => Ok(builder.bearer_auth(token)),
            None => Err(TellmyError::Unauthenticated(
                "this request needs an access token".to_string(),
            )),
        }
    }

    fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder
            .send()
            .map_err(|e| TellmyError::Network(format!("HTTP request failed: {e}")))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| TellmyError::Network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(http_error(status, &body));
        }
        serde_json::from_str(&body)
            .map_err(|e| TellmyError::Api(format!("invalid response ({status}): {e}")))
    }
}

impl ReplayTransport for ApiClient {
    fn replay(&self, request: &ReplayRequest<'_>) -> Result<ReplayResponse> {
        let url = self.resolve(request.url)?;
        let method = match request.method {
            ReplayMethod::Post => Method::POST,
            ReplayMethod::Delete => Method::DELETE,
        };
        debug!(%method, %url, has_body = request.body.is_some(), "replaying queued mutation");

        let mut builder = self.http.request(method, url);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = request.body {
            builder = builder.json(body);
        }
        let response = builder
            .send()
            .map_err(|e| TellmyError::Network(format!("HTTP request failed: {e}")))?;
        let status = response.status();
        Ok(ReplayResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        })
    }
}

fn story_form(story: &NewStory) -> Result<multipart::Form> {
    if story.description.trim().is_empty() {
        return Err(TellmyError::Validation(
            "story description must not be empty".to_string(),
        ));
    }
    let mut form = multipart::Form::new().text("description", story.description.clone());
    if let Some(photo) = &story.photo {
        form = form.file("photo", photo).map_err(|e| {
            TellmyError::Validation(format!("cannot read photo {}: {e}", photo.display()))
        })?;
    }
    if let (Some(lat), Some(lon)) = (story.lat, story.lon) {
        form = form.text("lat", lat.to_string()).text("lon", lon.to_string());
    }
    Ok(form)
}

fn check_envelope(message: &ApiMessage) -> Result<()> {
    if message.error {
        return Err(TellmyError::Api(message.message.clone()));
    }
    Ok(())
}

fn http_error(status: StatusCode, body: &str) -> TellmyError {
    let message = serde_json::from_str::<ApiMessage>(body)
        .ok()
        .map(|m| m.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_string());
    TellmyError::Http {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.base_url(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn resolve_joins_relative_paths() {
        let client = ApiClient::new("https://story-api.dicoding.dev/v1/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(
            client.resolve("/stories").unwrap().as_str(),
            "https://story-api.dicoding.dev/v1/stories"
        );
        assert_eq!(
            client.resolve("stories/guest").unwrap().as_str(),
            "https://story-api.dicoding.dev/v1/stories/guest"
        );
        assert_eq!(
            client.resolve("https://other.test/x").unwrap().as_str(),
            "https://other.test/x"
        );
    }

    #[test]
    fn rejects_non_http_base_url() {
        assert!(matches!(
            ApiClient::new("ftp://example.test", DEFAULT_TIMEOUT),
            Err(TellmyError::Config(_))
        ));
        assert!(ApiClient::new("not a url", DEFAULT_TIMEOUT).is_err());
    }

    #[test]
    fn login_returns_token() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/login")
                .json_body(json!({"email": "a@b.test", "password": "secret123"}));
            then.status(200).json_body(json!({
                "error": false,
                "message": "success",
                "loginResult": {"userId": "user-1", "name": "Ana", "token": "tok-123"}
            }));
        });

        let result = client(&server).login("a@b.test", "secret123").unwrap();
        mock.assert();
        assert_eq!(result.token, "tok-123");
        assert_eq!(result.name, "Ana");
    }

    #[test]
    fn http_error_carries_api_message() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/login");
            then.status(401)
                .json_body(json!({"error": true, "message": "Invalid password"}));
        });

        let err = client(&server).login("a@b.test", "wrong").unwrap_err();
        match err {
            TellmyError::Http { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid password");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn list_stories_sends_bearer_and_paging() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/stories")
                .query_param("page", "2")
                .query_param("size", "5")
                .query_param("location", "1")
                .header("authorization", "Bearer tok");
            then.status(200).json_body(json!({
                "error": false,
                "message": "Stories fetched successfully",
                "listStory": [
                    {"id": "story-1", "name": "Ana", "description": "one"},
                    {"id": "story-2", "name": "Budi", "description": "two", "lat": 1.5, "lon": 2.5}
                ]
            }));
        });

        let stories = client(&server)
            .with_token(Some("tok".to_string()))
            .list_stories(&StoryQuery {
                page: 2,
                size: 5,
                with_location: true,
            })
            .unwrap();
        mock.assert();
        assert_eq!(stories.len(), 2);
        assert_eq!(stories[1].lat, Some(1.5));
    }

    #[test]
    fn authenticated_calls_need_a_token() {
        let server = MockServer::start();
        let err = client(&server)
            .list_stories(&StoryQuery::default())
            .unwrap_err();
        assert!(matches!(err, TellmyError::Unauthenticated(_)));
    }

    #[test]
    fn story_detail_maps_404_to_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/stories/missing");
            then.status(404)
                .json_body(json!({"error": true, "message": "Story not found"}));
        });

        let err = client(&server)
            .with_token(Some("tok".to_string()))
            .story_detail("missing")
            .unwrap_err();
        assert!(matches!(err, TellmyError::StoryNotFound(id) if id == "missing"));
    }

    #[test]
    fn guest_upload_is_multipart_without_auth() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/stories/guest")
                .body_includes("name=\"description\"")
                .body_includes("hello from the road");
            then.status(201)
                .json_body(json!({"error": false, "message": "success"}));
        });

        let story = NewStory {
            description: "hello from the road".to_string(),
            ..NewStory::default()
        };
        let message = client(&server).add_story_guest(&story).unwrap();
        mock.assert();
        assert_eq!(message.message, "success");
    }

    #[test]
    fn envelope_error_flag_is_an_api_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/register");
            then.status(200)
                .json_body(json!({"error": true, "message": "Email is already taken"}));
        });

        let err = client(&server)
            .register("Ana", "a@b.test", "secret123")
            .unwrap_err();
        assert!(matches!(err, TellmyError::Api(msg) if msg.contains("already taken")));
    }

    #[test]
    fn replay_reports_status_text() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(DELETE)
                .path("/stories/abc")
                .header("authorization", "Bearer tok");
            then.status(500);
        });

        let client = client(&server).with_token(Some("tok".to_string()));
        let response = client
            .replay(&ReplayRequest {
                method: ReplayMethod::Delete,
                url: "/stories/abc",
                body: None,
            })
            .unwrap();
        mock.assert();
        assert_eq!(response.status, 500);
        assert_eq!(response.status_text, "Internal Server Error");
    }

    #[test]
    fn unreachable_host_is_a_network_error() {
        let client = ApiClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = client.register("a", "b@c.test", "pw").unwrap_err();
        assert!(matches!(err, TellmyError::Network(_)));
        assert!(err.is_transient());
    }
}
