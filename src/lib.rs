//! Ringo smart-lock bridge
//!
//! Async client and device layer for the Ringo cloud smart-lock API, meant
//! to sit behind a home automation host.
//!
//! # Features
//!
//! - Bearer token lifecycle with a single in-flight authentication
//! - Bounded retries with forced reauthentication on a rejected token
//! - Lock discovery, key management and door opening
//! - Per-lock unlock state machine with a cancelable auto-lock timer
//! - Named remote actions answering with a `{success, result|error}` envelope

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod lock;
pub mod logging;
pub mod services;

// Re-export main types for convenience
pub use client::RingoClient;
pub use config::{credentials::Credentials, BridgeConfig};
pub use connection::{Connection, ConnectionSlot};
pub use error::{Result, RingoError};
pub use services::{ServiceResponse, Services};
