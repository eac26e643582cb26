//! Anomaly Suite Integration Tests
//!
//! Runs the harness end to end against the in-memory store:
//! - Full suite in strict and optimistic mode
//! - Idempotent fixtures
//! - Oracle detection under snapshot-only validation

#[path = "../common/mod.rs"]
mod common;

mod detection;
mod fixtures;
mod full_suite;
