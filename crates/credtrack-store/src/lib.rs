//! credtrack-store: record store backends.
//!
//! Implements the `CreditStore` trait for a PostgREST endpoint and for
//! in-memory fixtures, and loads the credtrack configuration that picks
//! between them.

pub mod config;
pub mod fixture;
pub mod memory;
pub mod rest;

pub use config::{
    create_store, load_config, load_config_from, parse_config, CredtrackConfig, StoreConfig,
};
pub use fixture::{load_fixture, validate_fixture, Fixture, ValidationWarning};
pub use memory::MemoryStore;
pub use rest::RestStore;
