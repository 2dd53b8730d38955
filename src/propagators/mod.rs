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

use snafu::prelude::*;
use std::fmt;

mod verlet;
pub use verlet::*;
mod tle;
pub use tle::*;
mod trajectory;
pub use trajectory::*;
mod propagator;
pub use propagator::*;

use crate::cosmic::{AstroError, Spacecraft, StateVector};
use crate::dynamics::DynamicsError;
use crate::errors::ErrorKind;
use crate::md::ManeuverError;
use crate::time::Duration;

/// A fixed step integrator: advances a state by exactly one step, preserving its frame and center of motion.
pub trait Integrator: Send + Sync + fmt::Display {
    /// Step of this integrator, strictly positive
    fn step(&self) -> Duration;

    /// Returns the state one step after the provided state.
    fn integrate(
        &mut self,
        spacecraft: &Spacecraft,
        state: &StateVector,
    ) -> Result<StateVector, PropagationError>;
}

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PropagationError {
    #[snafu(display("encountered a dynamics error {source}"))]
    Dynamics { source: DynamicsError },
    #[snafu(display("propagation failed because {source}"))]
    PropAstro { source: AstroError },
    #[snafu(display("maneuver setup failed: {source}"))]
    PropManeuver { source: ManeuverError },
    #[snafu(display("integration step must be strictly positive, got {step}"))]
    InvalidStep { step: Duration },
    #[snafu(display("the integrator requires at least one force model"))]
    NoForceModels,
}

impl PropagationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Dynamics { source } => source.kind(),
            Self::PropAstro { source } => source.kind(),
            Self::PropManeuver { source } => source.kind(),
            Self::InvalidStep { .. } | Self::NoForceModels => ErrorKind::InvalidArgument,
        }
    }
}
