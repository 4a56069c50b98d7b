//! Core domain types
//!
//! This module contains the domain structures shared between the streaming
//! client and its consumers. These mirror the records the scan backend
//! reports over the wire; the client never constructs them itself.

pub mod job;
pub mod log;
