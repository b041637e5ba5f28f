//! # Report Relay
//!
//! A streaming HTTP relay for a weekly-report writing assistant. A client
//! POSTs raw work notes; the relay builds a chat-completion prompt, opens a
//! streaming request against an OpenAI-compatible backend, parses the
//! provider's Server-Sent-Events protocol incrementally, and re-emits the
//! generated text as a plain byte stream, with backpressure, cancellation,
//! and early termination handled on both legs.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use report_relay::{Config, AppState, create_router};
//! use std::net::SocketAddr;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::for_test(); // or Config::parse_args() for CLI
//!     let state = AppState::new(config)?;
//!     let app = create_router(state);
//!
//!     let addr = SocketAddr::from(([0, 0, 0, 0], 8080));
//!     let listener = tokio::net::TcpListener::bind(addr).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`config`] - Configuration from CLI arguments and environment
//! - [`credentials`] - Per-request credential selection and validation
//! - [`prompt`] - Prompt assembly from pasted notes
//! - [`upstream`] - The outbound streaming completion request
//! - [`sse`] - Incremental event-stream parsing
//! - [`relay`] - Delta normalization into the outbound byte stream
//! - [`server`] - HTTP routes, handlers, and application state
//! - [`error`] - The crate-wide error type

// Core infrastructure
pub mod core;
pub mod config;
pub mod error;
pub mod schemas;

// Domain modules
pub mod credentials;
pub mod prompt;
pub mod upstream;
pub mod sse;
pub mod relay;

pub mod server;

// Re-export commonly used types for convenience
pub use config::Config;
pub use credentials::KeySelector;
pub use error::RelayError;
pub use prompt::PromptBuilder;
pub use relay::RelayStream;
pub use schemas::{CompletionChunk, CompletionRequest, GenerateRequest, Message};
pub use sse::{EventStream, EventStreamParser, ProviderEvent};
pub use upstream::UpstreamClient;

pub use self::core::http_client::{HttpClientBuilder, HttpClientConfig};
pub use server::{create_router, AppState};

/// The result type used throughout the library
pub type Result<T> = std::result::Result<T, RelayError>;
