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

use super::{Integrator, InvalidStepSnafu, PropAstroSnafu, PropagationError};
use crate::cosmic::{OrbitalState, Spacecraft, StateVector, TLE};
use crate::time::Duration;
use snafu::{ensure, ResultExt};
use std::fmt;

/// Analytic "integrator" which evaluates two-line elements at each step instead of integrating forces.
#[derive(Clone, Debug)]
pub struct TleIntegrator {
    step: Duration,
    tle: TLE,
}

impl TleIntegrator {
    pub fn new(step: Duration, tle: TLE) -> Result<Self, PropagationError> {
        ensure!(step > Duration::ZERO, InvalidStepSnafu { step });
        Ok(Self { step, tle })
    }
}

impl Integrator for TleIntegrator {
    fn step(&self) -> Duration {
        self.step
    }

    fn integrate(
        &mut self,
        _spacecraft: &Spacecraft,
        state: &StateVector,
    ) -> Result<StateVector, PropagationError> {
        self.tle
            .to_state_vector(state.epoch + self.step)
            .to_frame(state.frame)
            .context(PropAstroSnafu)
    }
}

impl fmt::Display for TleIntegrator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TLE integrator ({}) for {}", self.step, self.tle.name)
    }
}
