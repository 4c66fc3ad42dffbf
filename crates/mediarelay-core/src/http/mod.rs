//! HTTP layer for provider API communication
//!
//! - Request building from provider descriptors, including multipart bodies
//! - Credential placement (query, header, form field)
//! - Single-shot transport with classified outcomes
//! - Fixed-delay retry over those outcomes
//! - Response normalization into media items

pub mod auth;
pub mod builder;
pub mod client;
pub mod error;
pub mod multipart;
pub mod normalizer;
pub mod retry;

pub use auth::{AuthHandler, CredentialPlacement};
pub use builder::{PreparedRequest, RequestBuilder, WirePayload};
pub use client::{TransportClient, TransportConfig, TransportOutcome};
pub use error::{ErrorClassification, HttpError};
pub use multipart::{FilePart, MultipartBody, MultipartBuilder};
pub use normalizer::ResponseNormalizer;
pub use retry::{execute_with_retry, RetryDecision, RetryHandler, RetryPolicy};
