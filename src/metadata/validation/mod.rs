//! Validation performed when an assembly is published.
//!
//! Publication is the point after which an assembly is immutable and shared, so every
//! structural check happens there. [`ValidationConfig`] selects the optional checks.

mod config;
mod member;
mod nested;
mod orchestrator;

pub use config::ValidationConfig;
pub(crate) use member::MemberOwnership;
pub(crate) use orchestrator::Orchestrator;
