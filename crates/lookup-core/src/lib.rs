//! Core types and utilities for revit-lookup
//!
//! # Modules
//!
//! - `config`: Environment file loading
//! - `context`: Ambient session context and host document access
//! - `error`: Error types and Result alias
//! - `inspect`: Inspectable/Resolver/Extension traits and the member table
//! - `settings`: Persisted filters and the read-only snapshot
//! - `types`: Value model and member metadata

pub mod config;
pub mod context;
pub mod error;
pub mod inspect;
pub mod settings;
pub mod types;

// Re-exports
pub use context::{Context, HostDocument};
pub use error::{Error, InvocationError, Result};
pub use inspect::{
    Extension, ExtensionEntry, ExtensionManager, Inspectable, MemberDef, MemberTable,
    MemberThunk, Resolver,
};
pub use settings::{Settings, SettingsSnapshot, SettingsStore};
pub use types::*;
