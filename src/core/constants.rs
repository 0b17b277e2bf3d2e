//! Numeric constants used by the simulator and the CHSH test.

/// Constants shared across the crate
pub mod qkd_constants {
    /// 1/√2, the amplitude of an equal superposition.
    pub const FRAC_1_SQRT_2: f64 = std::f64::consts::FRAC_1_SQRT_2;
    /// Used for phase angles (`e^(iθ)`)
    pub const PI: f64 = std::f64::consts::PI;
    /// Largest |CHSH| reachable by a local hidden-variable model.
    pub const CLASSICAL_CHSH_BOUND: f64 = 2.0;
    /// Tsirelson's bound 2√2, the largest |CHSH| quantum mechanics allows.
    pub const TSIRELSON_BOUND: f64 = 2.0 * std::f64::consts::SQRT_2;
    /// Amplitudes below this squared magnitude are treated as zero.
    pub const AMPLITUDE_TOLERANCE: f64 = 1e-12;
}
