//! Data types: persisted records, API payloads, and MongoDB plumbing.

pub mod api;
pub mod common;
pub mod mongodb;
