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
use crate::cosmic::{ConicElements, OrbitalState, Spacecraft, StateOrientation, StateVector};
use crate::linalg::Vector3;
use crate::md::{InvalidTargetSnafu, ManeuverError};
use crate::utils::between_0_tau;
use snafu::ensure;
use std::f64::consts::PI;
use std::fmt;

/// Maximum norm of the cross product of the unit node and apogee directions for them to be considered aligned
const NODE_APOGEE_ALIGNMENT: f64 = 0.1;

/// Changes the inclination and the perigee radius in a single burn at the apogee, when the apogee lies
/// on the line of nodes (typically the apogee burn of a transfer to a geostationary orbit).
///
/// The right ascension of the ascending node is kept. If the target perigee is above the current apogee,
/// the burn point becomes the perigee of the new orbit.
#[derive(Clone, Debug)]
pub struct Combined {
    pub target_inclination_rad: f64,
    pub target_perigee_m: f64,
    trigger: FlagTrigger,
    delta_v_m_s: Option<Vector3<f64>>,
}

impl Combined {
    pub fn new(target_inclination_rad: f64, target_perigee_m: f64) -> Result<Self, ManeuverError> {
        ensure!(
            (0.0..=PI).contains(&target_inclination_rad),
            InvalidTargetSnafu {
                details: format!("inclination must be in [0, π], got {target_inclination_rad} rad")
            }
        );
        ensure!(
            target_perigee_m.is_finite() && target_perigee_m > 0.0,
            InvalidTargetSnafu {
                details: format!("target perigee must be positive, got {target_perigee_m} m")
            }
        );
        Ok(Self {
            target_inclination_rad,
            target_perigee_m,
            trigger: FlagTrigger::new(),
            delta_v_m_s: None,
        })
    }

    /// Orbit after the burn, with the burn point on one of its apsides.
    pub fn target_elements(&self, state: &StateVector) -> Result<ConicElements, ManeuverError> {
        let ra = state.apogee_vector().norm();
        let arg_latitude = between_0_tau(state.aop_rad() + state.true_anomaly_rad());
        let (rp, ecc, aop, ma) = if self.target_perigee_m > ra {
            let ecc = 1.0 - 2.0 / ((self.target_perigee_m / ra) + 1.0);
            (ra, ecc, arg_latitude, 0.0)
        } else {
            let ecc = 1.0 - 2.0 / ((ra / self.target_perigee_m) + 1.0);
            (self.target_perigee_m, ecc, between_0_tau(arg_latitude - PI), PI)
        };
        Ok(ConicElements::new(
            state.center.clone(),
            rp,
            ecc,
            self.target_inclination_rad,
            state.raan_rad(),
            aop,
            ma,
            state.epoch,
            state.frame,
        )?)
    }
}

impl ManeuverStrategy for Combined {
    /// Fires when crossing the line of nodes on the apogee side, if the apogee is near that line.
    fn can_execute(&mut self, state: &StateVector) -> bool {
        let node = state.ascending_node_vector();
        let along_track = state.specific_angular_momentum().normalize().cross(&state.r_hat());
        let crossed = self.trigger.toggled(node.dot(&along_track) > 0.0);
        if !crossed {
            return false;
        }
        if state.is_circular() {
            return true;
        }
        let apogee = state.apogee_vector();
        let aligned = node.cross(&apogee.normalize()).norm() <= NODE_APOGEE_ALIGNMENT;
        if !aligned {
            debug!("{self}: crossed the line of nodes away from the apogee");
        }
        aligned && state.position_m.dot(&apogee) > 0.0
    }

    fn compute_delta_v(
        &mut self,
        _spacecraft: &Spacecraft,
        state: &StateVector,
    ) -> Result<Vector3<f64>, ManeuverError> {
        let target = self.target_elements(state)?;
        let delta_v = target.state_vector().velocity_m_s - state.velocity_m_s;
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

impl fmt::Display for Combined {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "combined change to {:.3} deg and perigee {:.3} km",
            self.target_inclination_rad.to_degrees(),
            self.target_perigee_m / 1e3
        )
    }
}

#[cfg(test)]
mod ut_combined {
    use super::*;
    use crate::cosmic::{CelestialBody, Frame};
    use crate::time::Epoch;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    const RP: f64 = 6_678_000.0;
    const RA: f64 = 42_164_000.0;

    /// Transfer orbit with its apogee on the ascending node
    fn gto(ta_deg: f64) -> StateVector {
        StateVector::keplerian(
            CelestialBody::earth(),
            (RP + RA) / 2.0,
            (RA - RP) / (RA + RP),
            28.5f64.to_radians(),
            0.3,
            PI,
            ta_deg.to_radians(),
            Epoch::from_tdb_seconds(0.0),
            Frame::ICRF,
        )
        .unwrap()
    }

    #[test]
    fn fires_at_apogee_node() {
        let mut mnvr = Combined::new(0.0, RA).unwrap();
        let fired: Vec<bool> = [90.0, 170.0, 190.0, 270.0, 350.0, 10.0, 170.0, 190.0]
            .iter()
            .map(|ta| mnvr.can_execute(&gto(*ta)))
            .collect();
        // The descending node crossing at perigee is ignored
        assert_eq!(fired, vec![false, false, true, false, false, false, false, true]);
    }

    #[test]
    fn gto_to_geo() {
        let mut mnvr = Combined::new(0.0, RA).unwrap();
        let point = gto(180.0);
        let sc = Spacecraft::new(-1, "sc", 1000.0, 3000.0, point.clone().into()).unwrap();
        let dv = mnvr.compute_delta_v(&sc, &point).unwrap();
        assert_relative_eq!(dv.norm(), 1830.234690103131, max_relative = 1e-6);

        let geo = point.with_dv(dv);
        assert_abs_diff_eq!(geo.inclination_rad(), 0.0, epsilon = 1e-6);
        assert!(geo.eccentricity() < 1e-6);
        assert_relative_eq!(geo.sma_m(), RA, max_relative = 1e-6);

        let attitude = mnvr.compute_orientation(&sc, &point).unwrap();
        assert_abs_diff_eq!(
            attitude.to_reference(&Spacecraft::FRONT),
            dv.normalize(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn perigee_above_apogee() {
        let mut mnvr = Combined::new(0.0, 50_000_000.0).unwrap();
        let point = gto(180.0);
        let target = mnvr.target_elements(&point).unwrap();
        assert_relative_eq!(target.periapsis_m, RA, max_relative = 1e-9);
        assert_abs_diff_eq!(target.mean_anomaly_rad, 0.0);

        let sc = Spacecraft::new(-1, "sc", 1000.0, 3000.0, point.clone().into()).unwrap();
        let after = point.with_dv(mnvr.compute_delta_v(&sc, &point).unwrap());
        assert_relative_eq!(after.apoapsis_m().unwrap(), 50_000_000.0, max_relative = 1e-6);
    }

    #[test]
    fn invalid_targets() {
        assert!(Combined::new(-0.1, RA).is_err());
        assert!(Combined::new(0.0, 0.0).is_err());
    }
}
