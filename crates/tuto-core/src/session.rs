//! Session lifecycle state machine.
//!
//! An explicitly constructed `Session` owns the in-memory state and the
//! collaborators it needs (API client, token store). There is no ambient
//! global store; callers inject a `Session` wherever one is needed.
//!
//! All operations are single-writer by convention: nothing here guards
//! against two concurrent `login` calls. The UI disables duplicate
//! submission; the state machine itself only guarantees that transitions
//! are whole-state replacements.

use serde::Serialize;
use serde_json::{Value, json};

use crate::api::{ApiClient, ApiError, detail_message};
use crate::auth::{Role, StudentProfile, TokenPair, TokenStore, UserProfile, build_user};

/// Observable session state.
///
/// Invariants: `is_authenticated` implies `user` is present;
/// `is_rehydrating` is true only during the single startup check.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub user: Option<UserProfile>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub is_rehydrating: bool,
    pub error: Option<String>,
}

/// Registration form, in the client's own vocabulary.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub class_cycle: Option<String>,
    pub class_level: Option<String>,
    pub series: Option<String>,
    pub teaching_cycle: Option<String>,
}

/// Wire shape of POST auth/register/. The backend contract mixes snake_case
/// identity fields with camelCase school fields.
#[derive(Debug, Serialize)]
struct RegisterPayload<'a> {
    username: &'a str,
    email: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    password: &'a str,
    role: &'static str,
    #[serde(rename = "classCycle", skip_serializing_if = "Option::is_none")]
    class_cycle: Option<&'a str>,
    #[serde(rename = "classLevel", skip_serializing_if = "Option::is_none")]
    class_level: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    series: Option<&'a str>,
    #[serde(rename = "teachingCycle", skip_serializing_if = "Option::is_none")]
    teaching_cycle: Option<&'a str>,
}

/// The session state machine.
pub struct Session {
    api: ApiClient,
    tokens: TokenStore,
    state: SessionState,
}

impl Session {
    /// Creates an anonymous session.
    pub fn new(api: ApiClient, tokens: TokenStore) -> Self {
        Self {
            api,
            tokens,
            state: SessionState::default(),
        }
    }

    /// Current state, read-only.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Authenticates with the backend and loads the canonical profile.
    ///
    /// On success the token pair is persisted and the state becomes
    /// authenticated. On any failure nothing is persisted, the state carries
    /// a human-readable error, and the failure is re-raised so the caller's
    /// UI can react.
    ///
    /// # Errors
    /// `ApiError::Network` or `ApiError::Api` from either backend call.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), ApiError> {
        self.state.is_loading = true;
        self.state.error = None;

        match self.try_login(username, password).await {
            Ok(user) => {
                self.state.user = Some(user);
                self.state.is_authenticated = true;
                self.state.is_loading = false;
                Ok(())
            }
            Err(err) => {
                self.state.user = None;
                self.state.is_authenticated = false;
                self.state.is_loading = false;
                self.state.error = Some(detail_message(&err));
                Err(err)
            }
        }
    }

    async fn try_login(&self, username: &str, password: &str) -> Result<UserProfile, ApiError> {
        let body = json!({ "username": username, "password": password });
        let response = self.api.post_json("auth/login/", &body).await?;

        let pair = extract_token_pair(&response)?;

        // Tokens are persisted best-effort; an in-memory session still works
        // when the write fails, it just won't survive a restart.
        if let Err(err) = self.tokens.save(&pair) {
            tracing::warn!(error = %err, "could not persist tokens");
        }

        // The profile fetch uses the token we just received, never a re-read
        // of the store: the store write above may not have landed yet.
        let profile = self
            .api
            .get_json_with_token("auth/profile/", &pair.access)
            .await?;
        build_user(profile)
    }

    /// Registers a new student account.
    ///
    /// Success does NOT authenticate; the caller is expected to redirect to
    /// the login flow.
    ///
    /// # Errors
    /// `ApiError::Network` or `ApiError::Api`; the state's error field is
    /// set from the response body before re-raising.
    pub async fn register(&mut self, form: &RegistrationForm) -> Result<(), ApiError> {
        self.state.is_loading = true;
        self.state.error = None;

        let payload = serde_json::to_value(RegisterPayload {
            username: &form.username,
            email: &form.email,
            first_name: &form.first_name,
            last_name: &form.last_name,
            password: &form.password,
            role: Role::Student.as_str(),
            class_cycle: form.class_cycle.as_deref(),
            class_level: form.class_level.as_deref(),
            series: form.series.as_deref(),
            teaching_cycle: form.teaching_cycle.as_deref(),
        })
        .unwrap_or(Value::Null);

        match self.api.post_json("auth/register/", &payload).await {
            Ok(_) => {
                self.state.is_loading = false;
                Ok(())
            }
            Err(err) => {
                self.state.is_loading = false;
                self.state.error = Some(detail_message(&err));
                Err(err)
            }
        }
    }

    /// Clears stored tokens (best-effort) and resets to anonymous.
    /// Safe to call from any state, including when already anonymous.
    pub fn logout(&mut self) {
        if let Err(err) = self.tokens.clear() {
            tracing::debug!(error = %err, "token clear failed during logout");
        }
        self.state.user = None;
        self.state.is_authenticated = false;
        self.state.error = None;
    }

    /// Best-effort refresh of the student sub-profile after a side effect
    /// (e.g. completing the diagnostic). Failures are absorbed: the `Err`
    /// branch is deliberately discarded, keeping the cached profile.
    pub async fn refresh_profile(&mut self) {
        if self.state.user.is_none() {
            return;
        }

        match self.fetch_student_profile().await {
            Ok(student_profile) => {
                if let Some(user) = &mut self.state.user {
                    user.student_profile = student_profile;
                }
            }
            Err(err) => {
                tracing::debug!(error = %err, "profile refresh failed; keeping cached profile");
            }
        }
    }

    async fn fetch_student_profile(&self) -> Result<Option<StudentProfile>, ApiError> {
        let response = self.api.get_json("auth/profile/").await?;
        Ok(build_user(response)?.student_profile)
    }

    /// Reconstructs the session from stored tokens at startup.
    ///
    /// Runs exactly once per process by convention. Never returns an error:
    /// an invalid stored token is an expected, recoverable condition, so
    /// every failure normalizes to the anonymous state (with the store
    /// cleared) and `is_rehydrating` always ends false.
    pub async fn rehydrate(&mut self) {
        self.state.is_rehydrating = true;

        let user = match self.tokens.load() {
            None => None,
            Some(pair) => {
                // Same rule as login: validate with the in-memory token.
                match self
                    .api
                    .get_json_with_token("auth/profile/", &pair.access)
                    .await
                    .and_then(build_user)
                {
                    Ok(user) => Some(user),
                    Err(err) => {
                        tracing::debug!(error = %err, "stored session rejected; clearing tokens");
                        if let Err(err) = self.tokens.clear() {
                            tracing::debug!(error = %err, "token clear failed during rehydrate");
                        }
                        None
                    }
                }
            }
        };

        self.state.is_authenticated = user.is_some();
        self.state.user = user;
        self.state.is_rehydrating = false;
    }

    /// Changes the account password. Requires an authenticated session.
    ///
    /// # Errors
    /// `ApiError::Validation` when no session is active, otherwise
    /// `ApiError::Network`/`ApiError::Api` from the backend call.
    pub async fn change_password(&mut self, current: &str, new: &str) -> Result<(), ApiError> {
        if !self.state.is_authenticated {
            return Err(ApiError::Validation("Aucune session active".to_string()));
        }

        let body = json!({ "current_password": current, "new_password": new });
        match self.api.post_json("auth/change-password/", &body).await {
            Ok(_) => Ok(()),
            Err(err) => {
                self.state.error = Some(detail_message(&err));
                Err(err)
            }
        }
    }

    /// Clears the transient error without touching anything else.
    pub fn clear_error(&mut self) {
        self.state.error = None;
    }
}

/// Pulls `{access, refresh}` out of a login response.
fn extract_token_pair(response: &Value) -> Result<TokenPair, ApiError> {
    let access = response
        .get("access")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    let refresh = response
        .get("refresh")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();

    if access.is_empty() || refresh.is_empty() {
        return Err(ApiError::Api {
            status: reqwest::StatusCode::OK,
            body: response.clone(),
        });
    }

    Ok(TokenPair {
        access: access.to_string(),
        refresh: refresh.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: token pair extraction rejects half pairs.
    #[test]
    fn test_extract_token_pair() {
        let pair = extract_token_pair(&json!({"access": "A", "refresh": "R"})).unwrap();
        assert_eq!(pair.access, "A");
        assert_eq!(pair.refresh, "R");

        assert!(extract_token_pair(&json!({"access": "A"})).is_err());
        assert!(extract_token_pair(&json!({"refresh": "R"})).is_err());
        assert!(extract_token_pair(&json!({"access": "  ", "refresh": "R"})).is_err());
        assert!(extract_token_pair(&json!({})).is_err());
    }

    /// Test: registration payload uses the backend's mixed-case contract.
    #[test]
    fn test_register_payload_shape() {
        let payload = serde_json::to_value(RegisterPayload {
            username: "alice",
            email: "alice@example.com",
            first_name: "Alice",
            last_name: "Martin",
            password: "secret",
            role: "student",
            class_cycle: Some("secondaire"),
            class_level: Some("3e"),
            series: None,
            teaching_cycle: None,
        })
        .unwrap();

        assert_eq!(payload["first_name"], "Alice");
        assert_eq!(payload["last_name"], "Martin");
        assert_eq!(payload["classCycle"], "secondaire");
        assert_eq!(payload["classLevel"], "3e");
        assert_eq!(payload["role"], "student");
        assert!(payload.get("series").is_none());
        assert!(payload.get("teachingCycle").is_none());
    }
}
