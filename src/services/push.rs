//! Web push subscription state.

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::stories::Submission;
use crate::api::{ApiClient, ApiMessage, PushSubscription};
use crate::error::{Result, TellmyError};
use crate::network::Connectivity;
use crate::storage::{LocalStore, MutationKind};

pub const SUBSCRIBED_KEY: &str = "push.subscribed";
pub const ENDPOINT_KEY: &str = "push.endpoint";

/// Endpoint queued subscription changes are replayed against.
pub const SUBSCRIBE_ENDPOINT: &str = "/notifications/subscribe";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PushStatus {
    pub subscribed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

pub struct PushService<'a> {
    store: &'a LocalStore,
    api: &'a ApiClient,
    connectivity: &'a dyn Connectivity,
}

impl<'a> PushService<'a> {
    pub fn new(
        store: &'a LocalStore,
        api: &'a ApiClient,
        connectivity: &'a dyn Connectivity,
    ) -> Self {
        Self {
            store,
            api,
            connectivity,
        }
    }

    /// Register `subscription`, or queue the registration when the API is unreachable.
    ///
    /// The remembered state follows the request either way.
    pub fn subscribe(&self, subscription: &PushSubscription) -> Result<Submission> {
        let submission = if self.connectivity.is_offline() {
            info!("offline, queueing push subscription");
            self.enqueue(MutationKind::Post, serde_json::to_value(subscription)?)?
        } else {
            match self.api.subscribe_push(subscription) {
                Ok(ApiMessage { message, .. }) => Submission::Sent { message },
                Err(err @ TellmyError::Network(_)) => {
                    warn!(error = %err, "push subscribe failed, queueing for later");
                    self.enqueue(MutationKind::Post, serde_json::to_value(subscription)?)?
                }
                Err(err) => return Err(err),
            }
        };

        self.store.set_preference(SUBSCRIBED_KEY, &Value::Bool(true))?;
        self.store
            .set_preference(ENDPOINT_KEY, &Value::from(subscription.endpoint.clone()))?;
        info!(endpoint = %subscription.endpoint, "push subscription registered");
        Ok(submission)
    }

    /// Unsubscribe `endpoint`, or the remembered endpoint when `None`.
    pub fn unsubscribe(&self, endpoint: Option<&str>) -> Result<Submission> {
        let remembered = self.status()?.endpoint;
        let endpoint = endpoint
            .map(str::to_string)
            .or(remembered)
            .ok_or_else(|| TellmyError::NotFound("no push subscription to remove".to_string()))?;

        let submission = if self.connectivity.is_offline() {
            info!("offline, queueing push unsubscribe");
            self.enqueue(MutationKind::Delete, json!({ "endpoint": endpoint }))?
        } else {
            match self.api.unsubscribe_push(&endpoint) {
                Ok(ApiMessage { message, .. }) => Submission::Sent { message },
                Err(err @ TellmyError::Network(_)) => {
                    warn!(error = %err, "push unsubscribe failed, queueing for later");
                    self.enqueue(MutationKind::Delete, json!({ "endpoint": endpoint }))?
                }
                Err(err) => return Err(err),
            }
        };

        self.store.set_preference(SUBSCRIBED_KEY, &Value::Bool(false))?;
        self.store.delete_preference(ENDPOINT_KEY)?;
        info!(endpoint = %endpoint, "push subscription removed");
        Ok(submission)
    }

    fn enqueue(&self, kind: MutationKind, payload: Value) -> Result<Submission> {
        let item = self.store.enqueue(kind, Some(&payload), SUBSCRIBE_ENDPOINT)?;
        Ok(Submission::Queued { item })
    }

    pub fn status(&self) -> Result<PushStatus> {
        Ok(PushStatus {
            subscribed: self
                .store
                .get_preference_as::<bool>(SUBSCRIBED_KEY)?
                .unwrap_or(false),
            endpoint: self.store.get_preference_as::<String>(ENDPOINT_KEY)?,
        })
    }
}
