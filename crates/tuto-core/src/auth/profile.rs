//! User profile mapping from the backend wire contract.
//!
//! The profile is rebuilt fresh from every `auth/profile/` response; it is
//! never merged or patched, except for the narrower student-profile refresh
//! in the session layer.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::api::ApiError;

/// Account role. The backend contract pins every account to `student`;
/// the historical teacher-inclusive contract is superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Student,
}

impl Role {
    /// Wire value sent in registration payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
        }
    }
}

/// Onboarding state attached to a student account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentProfile {
    /// Whether the one-time diagnostic assessment has been completed.
    pub diagnostic_completed: bool,
    /// Class level label, e.g. "3e".
    pub class_level: Option<String>,
}

/// The in-memory user, owned by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    /// Display name: first + last name, falling back to the username.
    pub name: String,
    pub role: Role,
    pub student_profile: Option<StudentProfile>,
}

/// Wire shape of GET auth/profile/.
#[derive(Debug, Default, Deserialize)]
struct ProfileResponse {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    username: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    student_profile: Option<StudentProfileResponse>,
}

/// Wire shape of the nested `student_profile` object.
#[derive(Debug, Default, Deserialize)]
struct StudentProfileResponse {
    #[serde(default)]
    diagnostic_completed: bool,
    #[serde(default)]
    class_level: Option<String>,
}

/// Builds the in-memory user from a profile response body.
///
/// # Errors
/// Returns `ApiError::Api` carrying the original body when the response is
/// not the expected shape; callers treat that like any other rejected
/// profile fetch.
pub fn build_user(body: Value) -> Result<UserProfile, ApiError> {
    let profile: ProfileResponse = match serde_json::from_value(body.clone()) {
        Ok(profile) => profile,
        Err(err) => {
            tracing::debug!(error = %err, "unexpected profile payload shape");
            return Err(ApiError::Api {
                status: StatusCode::OK,
                body,
            });
        }
    };

    let full_name = format!("{} {}", profile.first_name, profile.last_name)
        .trim()
        .to_string();
    let name = if full_name.is_empty() {
        profile.username.clone()
    } else {
        full_name
    };

    Ok(UserProfile {
        id: stringify_id(&profile.id),
        username: profile.username,
        name,
        role: Role::Student,
        student_profile: profile.student_profile.map(|sp| StudentProfile {
            diagnostic_completed: sp.diagnostic_completed,
            class_level: sp.class_level,
        }),
    })
}

/// Stable identifier as a string, whether the backend sends a number or a
/// string.
fn stringify_id(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
