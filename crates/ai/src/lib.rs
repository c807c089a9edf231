//! `gobot-ai`
//!
//! **Responsibility:** client boundary to the remote AI backend and the
//! license/usage service.
//!
//! This crate does not know about jobs, queues or status records:
//! - It turns ticket data into backend requests.
//! - It performs one HTTP call per operation and maps failures to [`AiError`].
//! - Results are returned as opaque JSON; callers decide whether to interpret them.

pub mod backend;
pub mod client;
pub mod error;
pub mod license;
pub mod request;

pub use backend::{AiBackend, LicenseBackend};
pub use client::BackendClient;
pub use error::AiError;
pub use license::{Feedback, FeedbackType, InstallKey, KeyUsage, KeyValidation};
pub use request::{ClarifyRequest, CodeGenRequest};
