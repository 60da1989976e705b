//! Navigation gating.
//!
//! A pure decision function from session state to the top-level route tree,
//! plus the deep-link guard that re-checks the active route on every
//! navigation change in URL-addressable deployments.

use crate::session::SessionState;

/// Screens reachable without a session.
pub const AUTH_ROUTES: [&str; 2] = ["Login", "Register"];

/// Route the guard resets to when a deep link lands on a protected screen.
pub const LOGIN_ROUTE: &str = "Login";

/// The mutually exclusive top-level route trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTree {
    /// Render nothing while the stored session is being checked. The only
    /// state where the gate withholds a decision, so the login screen never
    /// flashes before rehydration resolves.
    Splash,
    /// Login and registration screens.
    Auth,
    /// The one-time diagnostic assessment flow.
    Evaluation,
    /// The main application.
    Main,
}

/// Selects which route tree to mount for the given session state.
///
/// Authenticated students who have not completed the diagnostic are hard
/// redirected to the evaluation tree regardless of where they were.
pub fn select_route(state: &SessionState) -> RouteTree {
    if state.is_rehydrating {
        return RouteTree::Splash;
    }

    if !state.is_authenticated {
        return RouteTree::Auth;
    }

    let needs_diagnostic = state
        .user
        .as_ref()
        .and_then(|user| user.student_profile.as_ref())
        .is_some_and(|sp| !sp.diagnostic_completed);

    if needs_diagnostic {
        RouteTree::Evaluation
    } else {
        RouteTree::Main
    }
}

/// Deep-link guard, evaluated on every navigation state change.
///
/// Deep links can open protected routes directly, bypassing the mount
/// decision. When the session is not authenticated and the resolved route is
/// not an auth screen, the caller must reset navigation to the returned
/// route. The current route is consumed read-only.
pub fn enforce_route(state: &SessionState, current_route: &str) -> Option<&'static str> {
    if state.is_rehydrating {
        // Nothing is mounted yet; the gate handles this state.
        return None;
    }

    if !state.is_authenticated && !AUTH_ROUTES.contains(&current_route) {
        return Some(LOGIN_ROUTE);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Role, StudentProfile, UserProfile};

    fn student(diagnostic_completed: bool) -> UserProfile {
        UserProfile {
            id: "7".to_string(),
            username: "alice".to_string(),
            name: "Alice".to_string(),
            role: Role::Student,
            student_profile: Some(StudentProfile {
                diagnostic_completed,
                class_level: Some("3e".to_string()),
            }),
        }
    }

    fn authenticated(user: UserProfile) -> SessionState {
        SessionState {
            user: Some(user),
            is_authenticated: true,
            ..SessionState::default()
        }
    }

    /// Test: rehydration always wins, regardless of the other fields.
    #[test]
    fn test_rehydrating_selects_splash() {
        let mut state = authenticated(student(true));
        state.is_rehydrating = true;
        assert_eq!(select_route(&state), RouteTree::Splash);

        let anonymous = SessionState {
            is_rehydrating: true,
            ..SessionState::default()
        };
        assert_eq!(select_route(&anonymous), RouteTree::Splash);
    }

    /// Test: anonymous sessions mount the auth tree.
    #[test]
    fn test_anonymous_selects_auth() {
        assert_eq!(select_route(&SessionState::default()), RouteTree::Auth);
    }

    /// Test: incomplete diagnostic forces the evaluation tree.
    #[test]
    fn test_incomplete_diagnostic_selects_evaluation() {
        let state = authenticated(student(false));
        assert_eq!(select_route(&state), RouteTree::Evaluation);
    }

    /// Test: completed diagnostic mounts the main tree.
    #[test]
    fn test_completed_diagnostic_selects_main() {
        let state = authenticated(student(true));
        assert_eq!(select_route(&state), RouteTree::Main);
    }

    /// Test: no student profile at all goes straight to main.
    #[test]
    fn test_no_student_profile_selects_main() {
        let mut user = student(false);
        user.student_profile = None;
        assert_eq!(select_route(&authenticated(user)), RouteTree::Main);
    }

    /// Test: guard resets protected routes for anonymous sessions.
    #[test]
    fn test_guard_resets_protected_route() {
        let state = SessionState::default();
        assert_eq!(enforce_route(&state, "Home"), Some(LOGIN_ROUTE));
        assert_eq!(enforce_route(&state, "Settings"), Some(LOGIN_ROUTE));
    }

    /// Test: guard leaves auth screens alone.
    #[test]
    fn test_guard_allows_auth_routes() {
        let state = SessionState::default();
        assert_eq!(enforce_route(&state, "Login"), None);
        assert_eq!(enforce_route(&state, "Register"), None);
    }

    /// Test: guard is inert while rehydrating and when authenticated.
    #[test]
    fn test_guard_inert_otherwise() {
        let rehydrating = SessionState {
            is_rehydrating: true,
            ..SessionState::default()
        };
        assert_eq!(enforce_route(&rehydrating, "Home"), None);

        let state = authenticated(student(true));
        assert_eq!(enforce_route(&state, "Home"), None);
    }
}
