//! dupdash: dashboard for API duplicate-detection scans.
//!
//! Fetches categorized duplicate groups from a scan service, aggregates
//! them into similarity statistics, and serves them through the CLI and an
//! embedded web dashboard.

pub mod aggregate;
pub mod cli;
pub mod client;
pub mod config;
pub mod filter;
pub mod history;
pub mod logging;
pub mod model;
pub mod store;
pub mod web;
