//! Typed async client for the Hydra continuous-build service.

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod filter;
pub mod models;
pub mod services;
pub mod stats;
pub mod transport;
pub mod traversal;

#[cfg(test)]
mod test_support;

pub use client::HydraClient;
pub use config::{ClientConfig, debug_print_config};
pub use context::CallContext;
pub use error::ClientError;
pub use filter::{BuildFilter, build_url, evaluation_url, filter_builds, parse_build_id};
pub use models::*;
pub use services::*;
pub use stats::{BuildStatistics, calculate_statistics};
pub use transport::{SESSION_COOKIE, Session, Transport};
pub use traversal::{EVALUATION_POLL_INTERVAL, latest_build_for_job, wait_for_jobset_evaluation};
