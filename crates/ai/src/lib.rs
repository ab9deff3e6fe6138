//! `gpsrhub-ai`
//!
//! **Responsibility:** the AI compliance checker boundary.
//!
//! The user asks a free-text question, optionally with a product photo; a hosted
//! completion endpoint answers in markdown. This crate validates the request, talks
//! to the endpoint, and turns the markdown into a typed block tree for display. It
//! never touches product state.

pub mod client;
pub mod config;
pub mod loading;
pub mod markdown;
pub mod request;
pub mod result;

pub use client::{ComplianceChecker, HttpComplianceChecker};
pub use config::CheckerConfig;
pub use loading::loading_message;
pub use markdown::{Block, Inline, ListItem};
pub use request::ComplianceCheckRequest;
pub use result::{AiError, CheckResult};
