//! Wire types for the Story API.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::storage::Story;

/// Envelope every Story API response carries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub user_id: String,
    pub name: String,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(flatten)]
    pub envelope: ApiMessage,
    #[serde(rename = "loginResult")]
    pub login_result: Option<LoginResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StoryListResponse {
    #[serde(flatten)]
    pub envelope: ApiMessage,
    #[serde(rename = "listStory", default)]
    pub list_story: Vec<Story>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StoryDetailResponse {
    #[serde(flatten)]
    pub envelope: ApiMessage,
    pub story: Option<Story>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// A story about to be posted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewStory {
    pub description: String,
    /// Photo uploaded with the story; required by the remote API.
    pub photo: Option<PathBuf>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Query for one page of the story feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoryQuery {
    pub page: u32,
    pub size: u32,
    /// Only stories that carry a location.
    pub with_location: bool,
}

impl Default for StoryQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: 10,
            with_location: false,
        }
    }
}

/// Web push subscription keys as produced by a push service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushKeys {
    pub p256dh: String,
    pub auth: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscription {
    pub endpoint: String,
    pub keys: PushKeys,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct UnsubscribeRequest<'a> {
    pub endpoint: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_response_decodes() {
        let raw = r#"{
            "error": false,
            "message": "success",
            "loginResult": {"userId": "user-yj5pc_LARC_AgK61", "name": "Arif Faizin", "token": "abc.def"}
        }"#;
        let parsed: LoginResponse = serde_json::from_str(raw).unwrap();
        assert!(!parsed.envelope.error);
        assert_eq!(parsed.login_result.unwrap().token, "abc.def");
    }

    #[test]
    fn list_response_tolerates_missing_list() {
        let parsed: StoryListResponse =
            serde_json::from_str(r#"{"error": true, "message": "Missing authentication"}"#).unwrap();
        assert!(parsed.envelope.error);
        assert!(parsed.list_story.is_empty());
    }

    #[test]
    fn push_subscription_serializes_nested_keys() {
        let sub = PushSubscription {
            endpoint: "https://push.example/abc".to_string(),
            keys: PushKeys {
                p256dh: "key".to_string(),
                auth: "secret".to_string(),
            },
        };
        let json = serde_json::to_value(&sub).unwrap();
        assert_eq!(json["keys"]["p256dh"], "key");
        assert_eq!(json["endpoint"], "https://push.example/abc");
    }
}
