//! IFX Core - Call-level interface abstractions for the Informix adapter
//!
//! This crate provides the fundamental traits and types that all other
//! IFX crates depend on. It defines:
//!
//! - `Connector` - The black-box connect primitive
//! - `RawConnection` / `RawCursor` - The physical connection and statement handles
//! - `Clock` - Time source used by retry and health logic
//! - Common types like `Value`, `Row`, `ColumnDescription`, etc.

mod clock;
mod connection;
mod error;
pub mod sql_type;
mod types;


pub use clock::*;
pub use connection::*;
pub use error::*;
pub use types::*;
