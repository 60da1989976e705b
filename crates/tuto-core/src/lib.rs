//! Core tuto library (session lifecycle, API client, routing, config).

pub mod api;
pub mod auth;
pub mod config;
pub mod prefs;
pub mod routing;
pub mod session;
pub mod validation;
