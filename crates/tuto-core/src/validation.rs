//! Client-side form validation.
//!
//! These checks never reach the network; messages are shown inline by the
//! calling UI. Levels 2nde/1ere/Terminale additionally require a series
//! when the student is in the secondary cycle.

use std::collections::BTreeMap;

/// Field name -> message. Empty means the form is valid.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: BTreeMap<&'static str, String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }
}

/// Class levels that require a series in the secondary cycle.
const SERIES_LEVELS: [&str; 3] = ["2nde", "1ere", "Terminale"];

pub fn validate_email(email: &str) -> bool {
    // name@domain.tld, no whitespace — same loose shape check as the forms
    // always used. The backend does the real validation.
    let Some((local, rest)) = email.split_once('@') else {
        return false;
    };
    let Some((domain, tld)) = rest.rsplit_once('.') else {
        return false;
    };
    let clean = |s: &str| !s.is_empty() && !s.contains(char::is_whitespace) && !s.contains('@');
    clean(local) && clean(domain) && clean(tld)
}

pub fn validate_password(password: &str) -> Option<String> {
    if password.len() < 6 {
        return Some("Le mot de passe doit contenir au moins 6 caractères".to_string());
    }
    None
}

pub fn validate_name(name: &str) -> Option<String> {
    if name.trim().chars().count() < 2 {
        return Some("Le nom doit contenir au moins 2 caractères".to_string());
    }
    None
}

/// Checks the login form. Both fields are required; the backend decides
/// whether the credentials are any good.
pub fn validate_login_form(username: &str, password: &str) -> ValidationResult {
    let mut result = ValidationResult::default();

    if username.trim().is_empty() {
        result.push("username", "Le nom d'utilisateur est requis");
    }
    if password.is_empty() {
        result.push("password", "Le mot de passe est requis");
    }

    result
}

/// Checks the student registration form.
#[allow(clippy::too_many_arguments)]
pub fn validate_register_form(
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
    class_cycle: Option<&str>,
    class_level: Option<&str>,
    series: Option<&str>,
) -> ValidationResult {
    let mut result = ValidationResult::default();

    if let Some(message) = validate_name(first_name) {
        result.push("firstName", message);
    }
    if let Some(message) = validate_name(last_name) {
        result.push("lastName", message);
    }

    if email.is_empty() {
        result.push("email", "L'email est requis");
    } else if !validate_email(email) {
        result.push("email", "Email invalide");
    }

    if let Some(message) = validate_password(password) {
        result.push("password", message);
    }
    if password != confirm_password {
        result.push("confirmPassword", "Les mots de passe ne correspondent pas");
    }

    if class_cycle.is_none_or(|c| c.trim().is_empty()) {
        result.push("classCycle", "Le cycle est requis");
    }
    if class_level.is_none_or(|l| l.trim().is_empty()) {
        result.push("classLevel", "La classe est requise");
    }

    if class_cycle == Some("secondaire") {
        let needs_series = class_level.is_some_and(|l| SERIES_LEVELS.contains(&l));
        if needs_series && series.is_none_or(|s| s.trim().is_empty()) {
            result.push("series", "La serie est requise");
        }
    }

    result
}
