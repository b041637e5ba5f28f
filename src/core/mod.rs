//! Core infrastructure shared across the relay.

pub mod http_client;
