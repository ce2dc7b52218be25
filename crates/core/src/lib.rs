//! Core business logic for denuncia.
//!
//! Services sit between the HTTP layer and the repositories: they check
//! roles, validate input, bound store calls with the configured deadline and
//! shape complaints for output.

pub mod services;

pub use services::*;
