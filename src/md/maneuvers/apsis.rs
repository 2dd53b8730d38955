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

use super::{FlagTrigger, ManeuverStrategy};
use crate::cosmic::{OrbitalState, Spacecraft, StateOrientation, StateVector};
use crate::linalg::Vector3;
use crate::md::{InvalidTargetSnafu, ManeuverError};
use snafu::ensure;
use std::fmt;

fn ensure_radius(target_radius_m: f64) -> Result<(), ManeuverError> {
    ensure!(
        target_radius_m.is_finite() && target_radius_m > 0.0,
        InvalidTargetSnafu {
            details: format!("target radius must be positive, got {target_radius_m} m")
        }
    );
    Ok(())
}

/// Tangential burn at `burn_radius_m` placing the opposite apsis at `target_radius_m`
fn tangential_delta_v(state: &StateVector, burn_radius_m: f64, target_radius_m: f64) -> Vector3<f64> {
    let v_final = (state.gm() * (2.0 / burn_radius_m - 2.0 / (burn_radius_m + target_radius_m))).sqrt();
    state.v_hat() * (v_final - state.vmag_m_s())
}

/// Front along the velocity, or against it when the apsis is lowered
fn tangential_orientation(state: &StateVector, raising: bool) -> StateOrientation {
    let direction = if raising { state.v_hat() } else { -state.v_hat() };
    StateOrientation::pointing(&Spacecraft::FRONT, &direction, state.epoch, state.frame)
}

/// Changes the apogee radius with a tangential burn at perigee.
#[derive(Clone, Debug)]
pub struct ApogeeHeightChange {
    pub target_radius_m: f64,
    trigger: FlagTrigger,
}

impl ApogeeHeightChange {
    pub fn new(target_radius_m: f64) -> Result<Self, ManeuverError> {
        ensure_radius(target_radius_m)?;
        Ok(Self {
            target_radius_m,
            trigger: FlagTrigger::new(),
        })
    }
}

impl ManeuverStrategy for ApogeeHeightChange {
    /// Fires at perigee, i.e. when the spacecraft stops approaching it. On a circular orbit, any point is a perigee.
    fn can_execute(&mut self, state: &StateVector) -> bool {
        if state.is_circular() {
            let fired = self.trigger.after_first();
            if fired {
                warn!("{self}: orbit is circular, burning at {}", state.epoch);
            }
            return fired;
        }
        let approaching_perigee = state.perigee_vector().dot(&state.velocity_m_s) > 0.0;
        self.trigger.falling_edge(approaching_perigee)
    }

    fn compute_delta_v(
        &mut self,
        _spacecraft: &Spacecraft,
        state: &StateVector,
    ) -> Result<Vector3<f64>, ManeuverError> {
        Ok(tangential_delta_v(
            state,
            state.perigee_vector().norm(),
            self.target_radius_m,
        ))
    }

    fn compute_orientation(
        &self,
        _spacecraft: &Spacecraft,
        state: &StateVector,
    ) -> Result<StateOrientation, ManeuverError> {
        let raising = self.target_radius_m >= state.apogee_vector().norm();
        Ok(tangential_orientation(state, raising))
    }
}

impl fmt::Display for ApogeeHeightChange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "apogee change to {:.3} km", self.target_radius_m / 1e3)
    }
}

/// Changes the perigee radius with a tangential burn at apogee.
#[derive(Clone, Debug)]
pub struct PerigeeHeightChange {
    pub target_radius_m: f64,
    trigger: FlagTrigger,
}

impl PerigeeHeightChange {
    pub fn new(target_radius_m: f64) -> Result<Self, ManeuverError> {
        ensure_radius(target_radius_m)?;
        Ok(Self {
            target_radius_m,
            trigger: FlagTrigger::new(),
        })
    }
}

impl ManeuverStrategy for PerigeeHeightChange {
    fn can_execute(&mut self, state: &StateVector) -> bool {
        if state.is_circular() {
            let fired = self.trigger.after_first();
            if fired {
                warn!("{self}: orbit is circular, burning at {}", state.epoch);
            }
            return fired;
        }
        let approaching_apogee = state.apogee_vector().dot(&state.velocity_m_s) > 0.0;
        self.trigger.falling_edge(approaching_apogee)
    }

    fn compute_delta_v(
        &mut self,
        _spacecraft: &Spacecraft,
        state: &StateVector,
    ) -> Result<Vector3<f64>, ManeuverError> {
        Ok(tangential_delta_v(
            state,
            state.apogee_vector().norm(),
            self.target_radius_m,
        ))
    }

    fn compute_orientation(
        &self,
        _spacecraft: &Spacecraft,
        state: &StateVector,
    ) -> Result<StateOrientation, ManeuverError> {
        let raising = self.target_radius_m >= state.perigee_vector().norm();
        Ok(tangential_orientation(state, raising))
    }
}

impl fmt::Display for PerigeeHeightChange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "perigee change to {:.3} km", self.target_radius_m / 1e3)
    }
}
