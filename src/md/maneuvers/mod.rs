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

use super::ManeuverError;
use crate::cosmic::{Spacecraft, StateOrientation, StateVector};
use crate::linalg::Vector3;
use crate::time::Duration;
use std::fmt;

mod trigger;
pub use trigger::FlagTrigger;

mod base;
pub use base::Maneuver;

mod apsis;
pub use apsis::{ApogeeHeightChange, PerigeeHeightChange};

mod apsidal;
pub use apsidal::ApsidalAlignment;

mod combined;
pub use combined::Combined;

mod plane;
pub use plane::PlaneChange;

mod phasing;
pub use phasing::Phasing;

mod attitudes;
pub use attitudes::{Attitude, AttitudeHold, PointingTarget};

/// What a maneuver does: when it fires, which velocity change it applies and how the spacecraft is oriented.
///
/// The orientation is computed after the delta-v, on each state inserted by the maneuver.
pub trait ManeuverStrategy: Send + Sync + fmt::Display {
    /// Evaluates the trigger on this state against the previously evaluated one and stores it.
    /// Never returns true on the first evaluation.
    fn can_execute(&mut self, state: &StateVector) -> bool;

    /// Velocity change to apply at this state, in the frame of the state.
    fn compute_delta_v(
        &mut self,
        spacecraft: &Spacecraft,
        state: &StateVector,
    ) -> Result<Vector3<f64>, ManeuverError>;

    fn compute_orientation(
        &self,
        spacecraft: &Spacecraft,
        state: &StateVector,
    ) -> Result<StateOrientation, ManeuverError>;

    /// Duration after the maneuver point during which no other maneuver may execute, if the strategy computes one.
    fn maneuver_hold(&self) -> Option<Duration> {
        None
    }

    /// Checks the strategy against the spacecraft before propagation.
    fn validate(&self, _spacecraft: &Spacecraft) -> Result<(), ManeuverError> {
        Ok(())
    }
}

/// Index of a maneuver in the arena of its propagator
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ManeuverId(pub(crate) usize);

impl fmt::Display for ManeuverId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ManeuverStatus {
    /// Not yet handed to the propagator
    Idle,
    /// Standby maneuver, its trigger is evaluated at each step
    Monitoring,
    /// The trigger fired and the maneuver is being computed
    Armed,
    Executed,
    Failed,
}

impl fmt::Display for ManeuverStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Outcome of an attempt to execute a maneuver.
#[derive(Debug, PartialEq)]
pub enum ManeuverResult {
    Executed,
    /// The maneuver did not execute at this point but may later on
    TooEarly { reason: String },
    /// The maneuver failed and will not be retried
    Invalid { error: ManeuverError },
}

impl ManeuverResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Executed)
    }

    pub fn can_retry_later(&self) -> bool {
        matches!(self, Self::TooEarly { .. })
    }

    pub fn is_executed_too_early(&self) -> bool {
        matches!(self, Self::TooEarly { .. })
    }

    pub fn message(&self) -> String {
        match self {
            Self::Executed => "maneuver successfully executed".to_string(),
            Self::TooEarly { reason } => reason.clone(),
            Self::Invalid { error } => error.to_string(),
        }
    }
}

impl fmt::Display for ManeuverResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}
