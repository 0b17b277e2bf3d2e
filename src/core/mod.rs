// src/core/mod.rs

//! Core data structures and types

pub mod error;
pub mod qubit;
pub mod state;

pub use error::QkdError;
pub use qubit::{ClbitId, QubitId};
pub use state::StateVector;

pub mod constants;
pub use constants::qkd_constants::{CLASSICAL_CHSH_BOUND, TSIRELSON_BOUND};
