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
use crate::cosmic::{OrbitalParameters, OrbitalState, Spacecraft, StateOrientation, StateVector};
use crate::linalg::Vector3;
use crate::md::{InvalidTargetSnafu, ManeuverError};
use crate::time::{Duration, Unit};
use crate::utils::between_0_tau;
use snafu::ensure;
use std::f64::consts::TAU;
use std::fmt;

/// Fraction of the drift duration during which no other maneuver may execute
const HOLD_FRACTION: f64 = 0.9;

/// Inserts the spacecraft on a drift orbit at perigee, so that it meets the target after the requested
/// number of revolutions, back at the same perigee.
///
/// The spacecraft and the target must share the same orbit.
#[derive(Clone, Debug)]
pub struct Phasing {
    pub target: OrbitalParameters,
    pub revolutions: u32,
    trigger: FlagTrigger,
    drift_period: Option<Duration>,
    delta_v_m_s: Option<Vector3<f64>>,
}

impl Phasing {
    pub fn new(target: OrbitalParameters, revolutions: u32) -> Result<Self, ManeuverError> {
        ensure!(
            revolutions > 0,
            InvalidTargetSnafu {
                details: "phasing requires at least one revolution"
            }
        );
        ensure!(
            target.is_elliptical(),
            InvalidTargetSnafu {
                details: format!("phasing requires an elliptical target, got e = {}", target.eccentricity())
            }
        );
        Ok(Self {
            target,
            revolutions,
            trigger: FlagTrigger::new(),
            drift_period: None,
            delta_v_m_s: None,
        })
    }

    /// Period of the drift orbit, once computed
    pub fn drift_period(&self) -> Option<Duration> {
        self.drift_period
    }

    /// Period of the drift orbit which compensates the phase of the target from this state, at perigee.
    pub fn compute_drift_period(&self, state: &StateVector) -> Result<Duration, ManeuverError> {
        let ecc = state.eccentricity();
        let period_s = state.period()?.to_seconds();
        let delta_nu = between_0_tau(self.target.true_longitude_at(state.epoch) - state.true_longitude_rad());
        let ecc_anomaly = 2.0 * (((1.0 - ecc) / (1.0 + ecc)).sqrt() * (delta_nu / 2.0).tan()).atan();
        let target_lead_s = period_s / TAU * (ecc_anomaly - ecc * ecc_anomaly.sin());
        Ok((period_s - target_lead_s / f64::from(self.revolutions)) * Unit::Second)
    }
}

impl ManeuverStrategy for Phasing {
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
        let gm = state.gm();
        let drift_period = self.compute_drift_period(state)?;
        let drift_sma = (gm.sqrt() * drift_period.to_seconds() / TAU).powf(2.0 / 3.0);
        let rp = state.perigee_vector().norm();
        let ra = 2.0 * drift_sma - rp;
        ensure!(
            ra > 0.0,
            InvalidTargetSnafu {
                details: format!("drift orbit of {drift_period} is not reachable from a perigee of {rp} m")
            }
        );
        let drift_h = (2.0 * gm).sqrt() * (ra * rp / (ra + rp)).sqrt();
        let target_h = self.target.specific_angular_momentum().norm();
        let delta_v = state.v_hat() * ((drift_h - target_h) / rp);

        self.drift_period = Some(drift_period);
        self.delta_v_m_s = Some(delta_v);
        Ok(delta_v)
    }

    fn compute_orientation(
        &self,
        _spacecraft: &Spacecraft,
        state: &StateVector,
    ) -> Result<StateOrientation, ManeuverError> {
        let retrograde = self
            .delta_v_m_s
            .map_or(false, |dv| dv.dot(&state.velocity_m_s) < 0.0);
        let direction = if retrograde { -state.v_hat() } else { state.v_hat() };
        Ok(StateOrientation::pointing(
            &Spacecraft::FRONT,
            &direction,
            state.epoch,
            state.frame,
        ))
    }

    fn maneuver_hold(&self) -> Option<Duration> {
        self.drift_period
            .map(|period| (HOLD_FRACTION * period.to_seconds() * f64::from(self.revolutions)) * Unit::Second)
    }
}

impl fmt::Display for Phasing {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "phasing over {} revolution(s)", self.revolutions)
    }
}
