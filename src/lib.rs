//! Job Board — session-scoped job posting CRUD service.

pub mod app;
pub mod config;
pub mod error;
pub mod jobs;
pub mod session;
