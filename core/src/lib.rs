//! ENCRYPTEN Core Library
//! 
//! Core types, traits, and abstractions for the ENCRYPTEN membership-gated governance engine.
//! This crate provides the foundation for all other ENCRYPTEN components.

pub mod types;
pub mod traits;
pub mod clock;
pub mod error;
pub mod config;

pub use types::*;
pub use traits::*;
pub use clock::*;
pub use error::*;
pub use config::*;
