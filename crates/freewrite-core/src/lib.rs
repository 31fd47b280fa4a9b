//! freewrite-core - Core library for Freewrite
//!
//! This crate contains the journal entry model, the local SQLite entry store,
//! the client for the remote journal service, and the offline-first sync
//! engine that reconciles the two.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod remote;
pub mod services;
pub mod state;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{EntryId, JournalEntry};
