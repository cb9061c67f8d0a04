//! Volume correction to the 20 degC reference.
//!
//! The default table follows the generalized products layout: the thermal
//! expansion coefficient alpha depends on the product density class and
//! VCF = exp(-alpha * dT * (1 + 0.8 * alpha * dT)) with dT = t - 20.

use super::{density_at_20c, REFERENCE_TEMP_C};
use std::ops::RangeInclusive;

/// A replaceable coefficient lookup.
///
/// Implementations must return exactly `1.0` at the reference temperature,
/// be continuous over their operating range, and hold no hidden state.
/// `None` means the pair is outside the range the table covers.
pub trait VolumeCorrection: Send + Sync + std::fmt::Debug {
    fn factor(&self, sg: f64, temp_c: f64) -> Option<f64>;
}

pub const SG_RANGE: RangeInclusive<f64> = 0.60..=1.10;
pub const TEMP_RANGE_C: RangeInclusive<f64> = -10.0..=60.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Coefficients {
    a: f64,
    k0: f64,
    k1: f64,
}

impl Coefficients {
    fn alpha(&self, rho: f64) -> f64 {
        self.a + self.k0 / (rho * rho) + self.k1 / rho
    }
}

const GASOLINES: Coefficients = Coefficients { a: 0.0, k0: 346.4228, k1: 0.4388 };
const TRANSITION: Coefficients = Coefficients { a: -0.00336312, k0: 2680.3206, k1: 0.0 };
const JET_FUELS: Coefficients = Coefficients { a: 0.0, k0: 594.5418, k1: 0.0 };
const FUEL_OILS: Coefficients = Coefficients { a: 0.0, k0: 186.9696, k1: 0.4862 };

// Class boundaries in kg/m3
const GASOLINE_MAX: f64 = 770.352;
const TRANSITION_MAX: f64 = 787.5;
const JET_MAX: f64 = 838.3;

fn coefficients(rho: f64) -> Coefficients {
    if rho < GASOLINE_MAX {
        GASOLINES
    } else if rho < TRANSITION_MAX {
        TRANSITION
    } else if rho < JET_MAX {
        JET_FUELS
    } else {
        FUEL_OILS
    }
}

/// Generalized refined products table.
#[derive(Debug, Clone, Copy, Default)]
pub struct Astm54b;

impl VolumeCorrection for Astm54b {
    fn factor(&self, sg: f64, temp_c: f64) -> Option<f64> {
        if !SG_RANGE.contains(&sg) || !TEMP_RANGE_C.contains(&temp_c) {
            return None;
        }
        if temp_c == REFERENCE_TEMP_C {
            return Some(1.0);
        }
        let rho = density_at_20c(sg);
        let alpha = coefficients(rho).alpha(rho);
        let dt = temp_c - REFERENCE_TEMP_C;
        Some((-alpha * dt * (1.0 + 0.8 * alpha * dt)).exp())
    }
}
