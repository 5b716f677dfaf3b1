//! # NoteVerse Core
//!
//! The domain layer of the NoteVerse posts API.
//! This crate contains the post model, the ownership rules and the
//! repository ports, with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod gateway;
pub mod ports;

pub use error::DomainError;
pub use gateway::PostGateway;
