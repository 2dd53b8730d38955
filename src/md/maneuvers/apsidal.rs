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
use crate::md::{InfeasibleSnafu, InvalidTargetSnafu, ManeuverError};
use crate::utils::{between_0_tau, rotate_about, signed_angle};
use snafu::{ensure, OptionExt};
use std::fmt;

/// The two points where the current orbit crosses the target orbit
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Intersection {
    P,
    Q,
}

/// Rotates the line of apsides onto the one of a coplanar target orbit, burning at one of the two
/// intersections of the orbits.
///
/// With `θ` the angle from the current perigee to the target perigee, the intersections are the true
/// anomalies solving `A cos ν + B sin ν = C` where `A = h2² e1 − h1² e2 cos θ`, `B = −h1² e2 sin θ`
/// and `C = h1² − h2²`.
#[derive(Clone, Debug)]
pub struct ApsidalAlignment {
    pub target: OrbitalParameters,
    p_trigger: FlagTrigger,
    q_trigger: FlagTrigger,
    intersection: Option<Intersection>,
    delta_v_m_s: Option<Vector3<f64>>,
}

impl ApsidalAlignment {
    /// The target must be an elliptical, non circular orbit.
    pub fn new(target: OrbitalParameters) -> Result<Self, ManeuverError> {
        ensure!(
            target.is_elliptical() && !target.is_circular(),
            InvalidTargetSnafu {
                details: format!(
                    "apsidal alignment requires an eccentric elliptical target, got e = {}",
                    target.eccentricity()
                )
            }
        );
        Ok(Self {
            target,
            p_trigger: FlagTrigger::new(),
            q_trigger: FlagTrigger::new(),
            intersection: None,
            delta_v_m_s: None,
        })
    }

    /// Intersection at which the maneuver fired, if it did
    pub fn intersection(&self) -> Option<Intersection> {
        self.intersection
    }

    fn target_at(&self, state: &StateVector) -> Result<StateVector, ManeuverError> {
        Ok(self.target.to_state_vector(state.epoch).to_frame(state.frame)?)
    }

    /// Angle from the current perigee to the target perigee, in the direction of motion, in [0, 2π)
    pub fn theta_rad(&self, state: &StateVector) -> Result<f64, ManeuverError> {
        let target = self.target_at(state)?;
        Ok(between_0_tau(signed_angle(
            &state.perigee_vector(),
            &target.perigee_vector(),
            &state.specific_angular_momentum(),
        )))
    }

    /// True anomalies of the intersections P and Q on the current orbit.
    pub fn intersection_true_anomalies(&self, state: &StateVector) -> Result<(f64, f64), ManeuverError> {
        let target = self.target_at(state)?;
        let theta = self.theta_rad(state)?;
        let h1_sq = state.specific_angular_momentum().norm_squared();
        let h2_sq = target.specific_angular_momentum().norm_squared();
        let a = h2_sq * state.eccentricity() - h1_sq * target.eccentricity() * theta.cos();
        let b = -h1_sq * target.eccentricity() * theta.sin();
        let c = h1_sq - h2_sq;
        let alpha = (b / a).atan();
        let spread = ((c / a) * alpha.cos()).acos();
        let (nu_p, nu_q) = (alpha + spread, alpha - spread);
        ensure!(
            nu_p.is_finite() && nu_q.is_finite(),
            InfeasibleSnafu {
                details: "apsidal alignment requires the orbits to intersect"
            }
        );
        Ok((between_0_tau(nu_p), between_0_tau(nu_q)))
    }
}

impl ManeuverStrategy for ApsidalAlignment {
    /// Fires right after passing P or Q. Without intersection, fires on the second evaluation so that the
    /// delta-v computation reports the infeasibility.
    fn can_execute(&mut self, state: &StateVector) -> bool {
        let (nu_p, nu_q) = match self.intersection_true_anomalies(state) {
            Ok(anomalies) => anomalies,
            Err(e) => {
                trace!("{self}: {e}");
                return self.p_trigger.after_first();
            }
        };
        let hvec = state.specific_angular_momentum();
        let periapsis = state.periapsis_direction();
        let motion = hvec.cross(&state.position_m);
        let ahead = |nu: f64| rotate_about(&periapsis, &hvec, nu).dot(&motion) > 0.0;

        let passed_p = self.p_trigger.falling_edge(ahead(nu_p));
        let passed_q = self.q_trigger.falling_edge(ahead(nu_q));
        if passed_p {
            self.intersection = Some(Intersection::P);
        } else if passed_q {
            self.intersection = Some(Intersection::Q);
        }
        passed_p || passed_q
    }

    fn compute_delta_v(
        &mut self,
        _spacecraft: &Spacecraft,
        state: &StateVector,
    ) -> Result<Vector3<f64>, ManeuverError> {
        let (nu_p, nu_q) = self.intersection_true_anomalies(state)?;
        let nu = match self.intersection.context(InfeasibleSnafu {
            details: "maneuver point must be at an intersection of the orbits",
        })? {
            Intersection::P => nu_p,
            Intersection::Q => nu_q,
        };
        let target = self.target_at(state)?;
        let target_nu = nu - self.theta_rad(state)?;
        let on_target = target.state_vector_at_true_anomaly(target_nu)?;
        let delta_v = on_target.velocity_m_s - state.velocity_m_s;
        self.delta_v_m_s = Some(delta_v);
        Ok(delta_v)
    }

    fn compute_orientation(
        &self,
        _spacecraft: &Spacecraft,
        state: &StateVector,
    ) -> Result<StateOrientation, ManeuverError> {
        let direction = match self.delta_v_m_s {
            Some(dv) if dv.norm() > f64::EPSILON => dv.normalize(),
            _ => state.v_hat(),
        };
        Ok(StateOrientation::pointing(
            &Spacecraft::FRONT,
            &direction,
            state.epoch,
            state.frame,
        ))
    }
}

impl fmt::Display for ApsidalAlignment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "apsidal alignment on periapsis argument {:.3} deg",
            self.target.aop_rad().to_degrees()
        )
    }
}
