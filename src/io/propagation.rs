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
use super::{duration_from_str, duration_to_str, epoch_from_str, epoch_to_str, ConfigError, ConfigRepr};
use crate::cosmic::{OrbitalParameters, Spacecraft};
use crate::propagators::{Integrator, PropagationError, Propagator, TleIntegrator, VelocityVerlet};
use crate::time::{Duration, Epoch, Window};
use serde::{Deserialize, Serialize};

/// Force models of the propagation
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicsKind {
    #[default]
    TwoBody,
    /// Point mass gravity and the J2 perturbation of the center of motion
    J2,
    /// Evaluates the two-line elements of the initial orbit at each step
    Tle,
}

/// Propagation window, step and dynamics, e.g.
///
/// ```yaml
/// start: 2023-01-01T00:00:00 TDB
/// end: 2023-01-02T00:00:00 TDB
/// step: 10 s
/// dynamics: j2
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PropagatorConfig {
    #[serde(serialize_with = "epoch_to_str", deserialize_with = "epoch_from_str")]
    pub start: Epoch,
    #[serde(serialize_with = "epoch_to_str", deserialize_with = "epoch_from_str")]
    pub end: Epoch,
    #[serde(serialize_with = "duration_to_str", deserialize_with = "duration_from_str")]
    pub step: Duration,
    #[serde(default)]
    pub dynamics: DynamicsKind,
}

impl ConfigRepr for PropagatorConfig {}

impl PropagatorConfig {
    pub fn window(&self) -> Result<Window, ConfigError> {
        Window::new(self.start, self.end).map_err(|e| ConfigError::InvalidConfig(e.to_string()))
    }

    /// Builds the integrator of these dynamics for the spacecraft.
    pub fn integrator(&self, spacecraft: &Spacecraft) -> Result<Box<dyn Integrator>, ConfigError> {
        let integrator: Result<Box<dyn Integrator>, PropagationError> = match self.dynamics {
            DynamicsKind::TwoBody => VelocityVerlet::two_body(self.step).map(|i| Box::new(i) as Box<dyn Integrator>),
            DynamicsKind::J2 => VelocityVerlet::with_j2(self.step).map(|i| Box::new(i) as Box<dyn Integrator>),
            DynamicsKind::Tle => match &spacecraft.initial_orbit {
                OrbitalParameters::Tle(tle) => {
                    TleIntegrator::new(self.step, tle.clone()).map(|i| Box::new(i) as Box<dyn Integrator>)
                }
                _ => {
                    return Err(ConfigError::InvalidConfig(format!(
                        "TLE dynamics require the initial orbit of {} to be two-line elements",
                        spacecraft.name
                    )))
                }
            },
        };
        integrator.map_err(|e| ConfigError::InvalidConfig(e.to_string()))
    }

    /// Builds the propagator of this spacecraft, without any maneuver.
    pub fn into_propagator(self, spacecraft: Spacecraft) -> Result<Propagator, ConfigError> {
        let window = self.window()?;
        let integrator = self.integrator(&spacecraft)?;
        info!("{} propagator of {} over {window}", integrator, spacecraft.name);
        Ok(Propagator::new(spacecraft, integrator, window))
    }
}
