//! fieldsync-core - Core library for Fieldsync
//!
//! Offline-first task store and sync engine: field workers edit tasks with
//! or without connectivity, edits are queued durably, and a single-flight
//! cycle pushes them to the remote authority, recording conflicts for a
//! human to resolve.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Task, TaskId};
