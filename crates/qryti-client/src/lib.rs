//! HTTP client for the Qryti compliance backend
//!
//! This crate owns every outbound call to the backend: it attaches bearer
//! authentication, retries transient failures with linear backoff, shares
//! one network call between concurrent identical GETs and caches successful
//! GET responses for a bounded time in a bounded, insertion-ordered cache.
//!
//! The transport and the session store are injected, so tests can swap in
//! mock servers or in-memory doubles.

pub mod api;
pub mod cache;
pub mod client;
pub mod storage;
pub mod transport;

// Re-export main types
pub use api::{ClientsApi, ModelsApi, ProfileApi, ReportsApi};
pub use cache::{CacheEntry, CacheStats, InFlightRegistry, ResponseCache};
pub use client::{ApiClient, ApiClientBuilder, CacheConfig, ClientConfig, RequestOptions, RetryConfig};
pub use storage::{FileStore, MemoryStore, SessionStore};
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};

use qryti_core::error::QrytiError;

/// Result type for client operations
pub type ClientResult<T> = Result<T, QrytiError>;
