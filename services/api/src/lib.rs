//! services/api/src/lib.rs
//!
//! The tutor API service as a library, shared by the `api` and `openapi`
//! binaries and the integration tests.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
