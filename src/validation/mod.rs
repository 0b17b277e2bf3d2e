// src/validation/mod.rs

//! State vector sanity checks.

use crate::core::{QkdError, StateVector};

const DEFAULT_NORM_TOLERANCE: f64 = 1e-9;

/// Checks that the squared amplitudes sum to 1 within `tolerance`
/// (default `1e-9`).
///
/// # Returns
/// * `Ok(())` if normalized within tolerance.
/// * `Err(QkdError::Incoherence)` otherwise.
pub fn check_normalization(state: &StateVector, tolerance: Option<f64>) -> Result<(), QkdError> {
    let effective_tolerance = tolerance.unwrap_or(DEFAULT_NORM_TOLERANCE);
    let norm_sq: f64 = state.vector().iter().map(|c| c.norm_sqr()).sum();
    if (norm_sq - 1.0).abs() > effective_tolerance {
        Err(QkdError::Incoherence {
            message: format!(
                "State vector normalization failed. Sum(|c_i|^2) = {} (Deviation > {})",
                norm_sq, effective_tolerance
            ),
        })
    } else {
        Ok(())
    }
}

/// Checks that the vector length is a power of two and the state is normalized.
pub fn validate_state(state: &StateVector, norm_tolerance: Option<f64>) -> Result<(), QkdError> {
    if !state.dim().is_power_of_two() {
        return Err(QkdError::Incoherence {
            message: format!("State dimension {} is not a power of two", state.dim()),
        });
    }
    check_normalization(state, norm_tolerance)
}
