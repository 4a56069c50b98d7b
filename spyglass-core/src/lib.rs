//! Spyglass Core
//!
//! Core types shared across the Spyglass scan-observation tools.
//!
//! This crate contains:
//! - Domain types: Core business entities (jobs, log entries)
//! - Protocol: Wire envelope and message types for the progress stream

pub mod domain;
pub mod protocol;
