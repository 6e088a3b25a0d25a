//! services/api/src/lib.rs
//!
//! Library half of the `api` service: adapters, configuration, errors and the
//! HTTP layer. The binaries in `src/bin` only wire these together.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
