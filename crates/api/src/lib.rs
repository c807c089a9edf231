//! HTTP API: server, routing, request/response mapping, and a typed client.

pub mod app;
pub mod client;

pub use client::{ApiClient, ClientError};
