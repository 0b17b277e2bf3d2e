// src/protocol/basis.rs

//! Measurement bases and the parties' settings.
//!
//! Observables are spin projections in the X–Z plane:
//! X, Z, W = (X+Z)/√2 and V = (Z−X)/√2. Alice chooses among X, W, Z and Bob
//! among W, Z, V, so the pairs (W, W) and (Z, Z) give key bits and the pairs
//! built from {X, Z} × {W, V} feed the CHSH test.

use crate::core::QkdError;
use crate::operations::Gate;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Observable measured on one qubit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Basis {
    /// σx
    X,
    /// (σx + σz)/√2
    W,
    /// σz
    Z,
    /// (σz − σx)/√2
    V,
}

impl Basis {
    /// Gates (in time order) that rotate this observable onto Z, so that a
    /// computational-basis measurement afterwards measures the observable.
    pub fn rotation(&self) -> &'static [Gate] {
        match self {
            Basis::X => &[Gate::H],
            Basis::W => &[Gate::S, Gate::H, Gate::T, Gate::H],
            Basis::Z => &[],
            Basis::V => &[Gate::S, Gate::H, Gate::Tdg, Gate::H],
        }
    }

    /// Gates (in time order) undoing [`Basis::rotation`].
    pub fn unrotation(&self) -> Vec<Gate> {
        self.rotation().iter().rev().map(Gate::inverse).collect()
    }

    /// Unit vector of the observable in the (x, z) plane.
    pub fn direction(&self) -> (f64, f64) {
        let r = std::f64::consts::FRAC_1_SQRT_2;
        match self {
            Basis::X => (1.0, 0.0),
            Basis::W => (r, r),
            Basis::Z => (0.0, 1.0),
            Basis::V => (-r, r),
        }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Basis::X => "X",
            Basis::W => "W",
            Basis::Z => "Z",
            Basis::V => "V",
        };
        f.write_str(label)
    }
}

/// Alice's measurement setting, numbered 1–3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AliceSetting {
    /// a1 = X
    A1,
    /// a2 = W
    A2,
    /// a3 = Z
    A3,
}

impl AliceSetting {
    /// All settings in order.
    pub const ALL: [AliceSetting; 3] = [AliceSetting::A1, AliceSetting::A2, AliceSetting::A3];

    /// The observable this setting measures.
    pub fn basis(&self) -> Basis {
        match self {
            AliceSetting::A1 => Basis::X,
            AliceSetting::A2 => Basis::W,
            AliceSetting::A3 => Basis::Z,
        }
    }

    /// Setting number, 1..=3.
    pub fn index(&self) -> u8 {
        match self {
            AliceSetting::A1 => 1,
            AliceSetting::A2 => 2,
            AliceSetting::A3 => 3,
        }
    }

    /// Uniformly random setting.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..3)]
    }
}

impl TryFrom<u8> for AliceSetting {
    type Error = QkdError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(AliceSetting::A1),
            2 => Ok(AliceSetting::A2),
            3 => Ok(AliceSetting::A3),
            other => Err(QkdError::InvalidOperation {
                message: format!("Alice's setting must be 1, 2 or 3, got {}", other),
            }),
        }
    }
}

/// Bob's measurement setting, numbered 1–3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BobSetting {
    /// b1 = W
    B1,
    /// b2 = Z
    B2,
    /// b3 = V
    B3,
}

impl BobSetting {
    /// All settings in order.
    pub const ALL: [BobSetting; 3] = [BobSetting::B1, BobSetting::B2, BobSetting::B3];

    /// The observable this setting measures.
    pub fn basis(&self) -> Basis {
        match self {
            BobSetting::B1 => Basis::W,
            BobSetting::B2 => Basis::Z,
            BobSetting::B3 => Basis::V,
        }
    }

    /// Setting number, 1..=3.
    pub fn index(&self) -> u8 {
        match self {
            BobSetting::B1 => 1,
            BobSetting::B2 => 2,
            BobSetting::B3 => 3,
        }
    }

    /// Uniformly random setting.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..3)]
    }
}

impl TryFrom<u8> for BobSetting {
    type Error = QkdError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(BobSetting::B1),
            2 => Ok(BobSetting::B2),
            3 => Ok(BobSetting::B3),
            other => Err(QkdError::InvalidOperation {
                message: format!("Bob's setting must be 1, 2 or 3, got {}", other),
            }),
        }
    }
}

/// `true` when both parties measured the same observable, so the trial
/// contributes a key bit.
pub fn is_key_pair(alice: AliceSetting, bob: BobSetting) -> bool {
    alice.basis() == bob.basis()
}
