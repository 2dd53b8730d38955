/*
    Nyx, blazing fast astrodynamics
    Copyright (C) 2023 Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use crate::errors::ErrorKind;
use crate::time::{Duration, Epoch};
use snafu::prelude::*;

mod bodies;
pub use self::bodies::*;

mod frames;
pub use self::frames::*;

mod state;
pub use self::state::*;

mod orbit;
pub use self::orbit::*;

mod conic;
pub use self::conic::*;

mod equinoctial;
pub use self::equinoctial::*;

mod tle;
pub use self::tle::*;

mod orientation;
pub use self::orientation::*;

mod propulsion;
pub use self::propulsion::*;

mod spacecraft;
pub use self::spacecraft::*;

mod site;
pub use self::site::*;

/// Standard gravity, in m/s^2, used in the rocket equation.
pub const STD_GRAVITY: f64 = 9.80665;

/// If an orbit has an eccentricity below the following value, true and mean anomalies are considered equal
/// when solving Kepler's equation.
pub const ECC_EPSILON: f64 = 1e-11;

/// Orbits with an eccentricity below this value are circular for the maneuver triggers.
pub const CIRCULAR_ECC: f64 = 1e-5;

/// Orbits whose eccentricity is within this distance of 1.0 are treated as parabolic.
pub const PARABOLIC_ECC_TOL: f64 = 1e-9;

/// A trait allowing for something to have an epoch
pub trait TimeTagged {
    /// Retrieve the Epoch
    fn epoch(&self) -> Epoch;
    /// Set the Epoch
    fn set_epoch(&mut self, epoch: Epoch);

    /// Shift this epoch by a duration (can be negative)
    fn shift_by(&mut self, duration: Duration) {
        self.set_epoch(self.epoch() + duration);
    }
}

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AstroError {
    #[snafu(display("invalid orbital elements: {details}"))]
    InvalidElements { details: String },
    #[snafu(display("cannot {action}: {kind} trajectory (e = {ecc}) is not periodic"))]
    NotPeriodic {
        action: &'static str,
        kind: TrajectoryKind,
        ecc: f64,
    },
    #[snafu(display("two-line elements line {line}: {details}"))]
    TleParse { line: usize, details: String },
    #[snafu(display("no data for body {id}"))]
    UnknownBody { id: i32 },
    #[snafu(display("unknown frame `{name}`"))]
    UnknownFrame { name: String },
    #[snafu(display("cannot {action} in frame {frame}"))]
    FrameUsage { action: &'static str, frame: Frame },
    #[snafu(display("invalid {resource}: {details}"))]
    InvalidResource {
        resource: &'static str,
        details: String,
    },
    #[snafu(display("{resource} with serial number `{serial}` already on board"))]
    DuplicateResource {
        resource: &'static str,
        serial: String,
    },
    #[snafu(display("no {resource} with serial number `{serial}` on board"))]
    UnknownResource {
        resource: &'static str,
        serial: String,
    },
    #[snafu(display("total mass of {mass_kg} kg would exceed the maximum operating mass of {max_kg} kg"))]
    MassBudget { mass_kg: f64, max_kg: f64 },
    #[snafu(display(
        "fuel tank `{serial}` holds {quantity_kg} kg out of {capacity_kg} kg: cannot change it by {delta_kg} kg"
    ))]
    FuelQuantity {
        serial: String,
        quantity_kg: f64,
        capacity_kg: f64,
        delta_kg: f64,
    },
}

impl AstroError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TleParse { .. } | Self::UnknownFrame { .. } => ErrorKind::Parse,
            Self::UnknownBody { .. } => ErrorKind::MissingData,
            Self::UnknownResource { .. } => ErrorKind::Configuration,
            _ => ErrorKind::InvalidArgument,
        }
    }
}
