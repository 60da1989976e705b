//! Authentication building blocks: persisted tokens and profile mapping.

pub mod profile;
pub mod tokens;

pub use profile::{Role, StudentProfile, UserProfile, build_user};
pub use tokens::{TokenPair, TokenStore};
