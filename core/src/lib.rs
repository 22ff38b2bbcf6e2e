//! Bing Webmaster URL submission and traffic lookup.
//!
//! # Overview
//! Submits published post URLs to the Bing Webmaster API and fetches the
//! indexing and traffic info Bing holds for them, caching the merged result
//! for four hours.
//!
//! # Design
//! - `WebmasterClient` builds `HttpRequest` values and parses `HttpResponse`
//!   values without doing I/O; a `Transport` executes them. `UreqTransport`
//!   is the blocking production transport.
//! - `WebmasterService` owns the settings, a transport and a
//!   `ResponseCache`, and enforces the preconditions before any request.
//! - Date fields are formatted for display by `sanitize` on every read; the
//!   cache keeps the upstream values.

pub mod cache;
pub mod client;
pub mod error;
pub mod http;
pub mod sanitize;
pub mod service;
pub mod settings;
pub mod types;

pub use cache::{Clock, ManualClock, MemoryCache, ResponseCache, SystemClock};
pub use client::{ApiResponse, WebmasterClient};
pub use error::{ApiError, ServiceError, SettingsError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use service::WebmasterService;
pub use settings::Settings;
pub use types::{Post, PostStatus, Record, SubmitReadiness};
