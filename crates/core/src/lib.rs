//! `gobot-core`: ticket domain building blocks.
//!
//! This crate contains **pure domain** primitives (no IO, no async):
//! identifiers, the ticket/clarification shapes exchanged with the AI
//! backend, and the formatting helpers used to write results back to Jira.

pub mod adf;
pub mod attachment;
pub mod description;
pub mod error;
pub mod id;
pub mod ticket;

pub use error::{DomainError, DomainResult};
pub use id::{InstallId, JobId, LicenseKey};
pub use ticket::{ClarifiedOutput, CodeGenOutput, IssueData};
