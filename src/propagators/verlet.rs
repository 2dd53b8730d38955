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

use super::{DynamicsSnafu, Integrator, InvalidStepSnafu, NoForceModelsSnafu, PropagationError};
use crate::cosmic::{Spacecraft, StateVector};
use crate::dynamics::{ForceModel, OblatenessPerturbation, PointMassGravity};
use crate::linalg::Vector3;
use crate::time::{Duration, Epoch};
use snafu::{ensure, ResultExt};
use std::fmt;
use std::sync::Arc;

/// Velocity Verlet (kick-drift-kick) integrator, second order and symplectic.
///
/// The acceleration at the end of a step is cached and reused at the start of the next one, as long as
/// the next step starts from that same state.
#[derive(Clone)]
pub struct VelocityVerlet {
    step: Duration,
    forces: Vec<Arc<dyn ForceModel>>,
    cached: Option<(Epoch, Vector3<f64>, Vector3<f64>)>,
}

impl VelocityVerlet {
    pub fn new(step: Duration, forces: Vec<Arc<dyn ForceModel>>) -> Result<Self, PropagationError> {
        ensure!(step > Duration::ZERO, InvalidStepSnafu { step });
        ensure!(!forces.is_empty(), NoForceModelsSnafu);
        Ok(Self {
            step,
            forces,
            cached: None,
        })
    }

    /// Two body dynamics only
    pub fn two_body(step: Duration) -> Result<Self, PropagationError> {
        Self::new(step, vec![Arc::new(PointMassGravity)])
    }

    /// Two body dynamics and the J2 perturbation of the center of motion
    pub fn with_j2(step: Duration) -> Result<Self, PropagationError> {
        Self::new(
            step,
            vec![Arc::new(PointMassGravity), Arc::new(OblatenessPerturbation)],
        )
    }

    fn acceleration(
        &self,
        spacecraft: &Spacecraft,
        state: &StateVector,
    ) -> Result<Vector3<f64>, PropagationError> {
        let mut accel = Vector3::zeros();
        for model in &self.forces {
            accel += model.apply(spacecraft, state).context(DynamicsSnafu)?;
        }
        Ok(accel)
    }
}

impl Integrator for VelocityVerlet {
    fn step(&self) -> Duration {
        self.step
    }

    fn integrate(
        &mut self,
        spacecraft: &Spacecraft,
        state: &StateVector,
    ) -> Result<StateVector, PropagationError> {
        let h = self.step.to_seconds();
        let accel = match self.cached {
            Some((epoch, position, accel)) if epoch == state.epoch && position == state.position_m => accel,
            _ => self.acceleration(spacecraft, state)?,
        };

        let mut next = state.clone();
        next.velocity_m_s += accel * 0.5 * h;
        next.position_m += next.velocity_m_s * h;
        next.epoch = state.epoch + self.step;

        let next_accel = self.acceleration(spacecraft, &next)?;
        next.velocity_m_s += next_accel * 0.5 * h;
        self.cached = Some((next.epoch, next.position_m, next_accel));

        Ok(next)
    }
}

impl fmt::Display for VelocityVerlet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let names: Vec<String> = self.forces.iter().map(|model| format!("{model}")).collect();
        write!(f, "velocity Verlet ({}) with {}", self.step, names.join(", "))
    }
}
