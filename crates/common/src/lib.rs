//! Common utilities and shared types for denuncia.
//!
//! This crate provides foundational components used across all denuncia crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID record ids and short public search ids via [`IdGenerator`]
//! - **Deadlines**: Bounded store calls via [`with_deadline`]
//!
//! # Example
//!
//! ```no_run
//! use denuncia_common::{AppResult, Config, IdGenerator};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     println!("{} listing {} per page", id_gen.generate(), config.feed.page_limit);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod deadline;
pub mod error;
pub mod id;

pub use config::Config;
pub use deadline::with_deadline;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
