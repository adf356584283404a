//! Account session: the access token lives in the preferences collection.

use serde_json::Value;
use tracing::info;

use crate::api::{ApiClient, ApiMessage, LoginResult};
use crate::error::{Result, TellmyError};
use crate::storage::LocalStore;

pub const ACCESS_TOKEN_KEY: &str = "auth.access_token";
pub const USER_NAME_KEY: &str = "auth.user_name";

/// Minimum password length the Story API accepts at registration.
const MIN_PASSWORD_LEN: usize = 8;

/// Stored access token, if any.
pub fn stored_token(store: &LocalStore) -> Result<Option<String>> {
    store.get_preference_as::<String>(ACCESS_TOKEN_KEY)
}

pub struct Session<'a> {
    store: &'a LocalStore,
    api: &'a ApiClient,
}

impl<'a> Session<'a> {
    pub const fn new(store: &'a LocalStore, api: &'a ApiClient) -> Self {
        Self { store, api }
    }

    pub fn register(&self, name: &str, email: &str, password: &str) -> Result<ApiMessage> {
        validate_credentials(email, password)?;
        if name.trim().is_empty() {
            return Err(TellmyError::Validation("name must not be empty".to_string()));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(TellmyError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        self.api.register(name, email, password)
    }

    /// Log in and remember the access token.
    pub fn login(&self, email: &str, password: &str) -> Result<LoginResult> {
        validate_credentials(email, password)?;
        let result = self.api.login(email, password)?;
        self.store
            .set_preference(ACCESS_TOKEN_KEY, &Value::from(result.token.clone()))?;
        self.store
            .set_preference(USER_NAME_KEY, &Value::from(result.name.clone()))?;
        info!(user_id = %result.user_id, "logged in");
        Ok(result)
    }

    /// Forget the stored credentials. Other local data is kept.
    pub fn logout(&self) -> Result<()> {
        self.store.delete_preference(ACCESS_TOKEN_KEY)?;
        self.store.delete_preference(USER_NAME_KEY)?;
        info!("logged out");
        Ok(())
    }

    pub fn access_token(&self) -> Result<Option<String>> {
        stored_token(self.store)
    }

    pub fn user_name(&self) -> Result<Option<String>> {
        self.store.get_preference_as::<String>(USER_NAME_KEY)
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<()> {
    if !email.contains('@') {
        return Err(TellmyError::Validation(format!("invalid email: {email}")));
    }
    if password.is_empty() {
        return Err(TellmyError::Validation("password must not be empty".to_string()));
    }
    Ok(())
}
