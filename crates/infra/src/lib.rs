//! `gobot-infra`
//!
//! **Responsibility:** the job queue and polling facade.
//!
//! - Job records and their status store (in-memory, Redis behind `redis`)
//! - Submission, background processing and polling of AI jobs
//! - Process configuration shared by the binaries

pub mod config;
pub mod jobs;
pub mod workers;

pub use config::{AppConfig, ConfigError, StoreBackend};
