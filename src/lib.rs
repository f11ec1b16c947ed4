//! # OrionKV
//!
//! A replicated in-memory key-value store with:
//! - A segmented write-ahead log for durability
//! - Crash recovery by log replay
//! - Primary/replica replication over a position-based update feed
//! - A length-framed TCP client protocol
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                             │
//! │        (framed requests, semaphore-bounded workers)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Database Executor                          │
//! │        (parser, replica policy, WAL-before-engine)          │
//! └──────────┬──────────────────────────────┬───────────────────┘
//!            │                              │
//!            ▼                              ▼
//!     ┌─────────────┐               ┌─────────────┐
//!     │ Segmented   │──────────────▶│   Engine    │
//!     │    WAL      │   replay      │ (RwLock map │
//!     │ (fsync'd)   │               │  / sharded) │
//!     └──────┬──────┘               └─────────────┘
//!            │
//!            ▼
//!     ┌─────────────┐
//!     │ Replication │  primary: serve updates after a position
//!     │    feed     │  replica: pull + apply on a timer
//!     └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod database;
pub mod network;
pub mod protocol;
pub mod replication;
pub mod storage;
pub mod wal;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::AppConfig;
pub use database::Database;
pub use error::{OrionError, Result};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of OrionKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
