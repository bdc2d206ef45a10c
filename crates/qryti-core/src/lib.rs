//! # qryti-core
//!
//! Core types and utilities shared across all Qryti crates.
//!
//! This crate provides:
//! - Session and UserProfile types for the authenticated identity
//! - ApiResponse, the single response envelope every call is normalized to
//! - Resource records for compliance clients, AI models and reports
//! - QrytiError enum for unified error handling
//! - URL and path helpers used for request building and cache invalidation
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (Session, ApiResponse, AiModel, etc.)
//! - `error`: Error types and result aliases
//! - `utils`: Utility functions and helpers

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{QrytiError, QrytiResult};
pub use types::{
    AiModel, ApiResponse, ComplianceClient, ModelFilters, ModelUpdate, NewAiModel, NewClient,
    Registration, Report, ReportDownload, ReportRequest, RiskLevel, Session, UserProfile,
};
