//! Qryti benchmarking suite
//!
//! Benchmarks for the response cache, the request path of the API client and
//! configuration/response parsing.

pub mod common;

pub use common::*;
