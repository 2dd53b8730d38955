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

use super::{DynamicsError, ForceModel, SingularitySnafu, UnsupportedFrameSnafu};
use crate::cosmic::{Frame, Spacecraft, StateVector};
use crate::linalg::{Matrix3, Vector3};
use snafu::ensure;
use std::fmt;

/// Newtonian gravity of the center of motion of the state.
#[derive(Copy, Clone, Debug, Default)]
pub struct PointMassGravity;

impl ForceModel for PointMassGravity {
    fn apply(&self, _spacecraft: &Spacecraft, state: &StateVector) -> Result<Vector3<f64>, DynamicsError> {
        let rmag = state.rmag_m();
        ensure!(
            rmag > f64::EPSILON,
            SingularitySnafu {
                model: "point mass gravity",
                rmag_m: rmag
            }
        );
        Ok(-state.center.gm_m3_s2 / rmag.powi(3) * state.position_m)
    }
}

impl fmt::Display for PointMassGravity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "point mass gravity")
    }
}

/// J2 perturbation of the center of motion.
///
/// The acceleration is computed in the body fixed frame of the center of motion at the epoch of the
/// state and rotated back into the frame of the state.
#[derive(Copy, Clone, Debug, Default)]
pub struct OblatenessPerturbation;

impl OblatenessPerturbation {
    /// Rotation from the frame of the state into the body fixed frame of its center of motion
    fn dcm_to_body_fixed(state: &StateVector) -> Result<Matrix3<f64>, DynamicsError> {
        let icrf_to_bf = state.center.rotation.dcm_to_body_fixed(state.epoch);
        match state.frame {
            Frame::ICRF => Ok(icrf_to_bf),
            Frame::EclipticJ2000 => Ok(icrf_to_bf * Frame::ecliptic_dcm().transpose()),
            Frame::BodyFixed(id) if id == state.center.id => Ok(Matrix3::identity()),
            frame => UnsupportedFrameSnafu {
                model: "oblateness",
                frame,
            }
            .fail(),
        }
    }
}

impl ForceModel for OblatenessPerturbation {
    fn apply(&self, _spacecraft: &Spacecraft, state: &StateVector) -> Result<Vector3<f64>, DynamicsError> {
        let body = &state.center;
        if body.j2 == 0.0 {
            return Ok(Vector3::zeros());
        }
        let dcm = Self::dcm_to_body_fixed(state)?;
        // Kilometer scaled coordinates keep the fifth powers well conditioned.
        let r_km = dcm * state.position_m / 1e3;
        let rmag_km = r_km.norm();
        ensure!(
            rmag_km > f64::EPSILON,
            SingularitySnafu {
                model: "oblateness",
                rmag_m: rmag_km * 1e3
            }
        );
        let gm_km3_s2 = body.gm_m3_s2 * 1e-9;
        let radius_km = body.equatorial_radius_m / 1e3;
        let z2 = (r_km.z / rmag_km).powi(2);
        let factor = -1.5 * body.j2 * gm_km3_s2 * radius_km.powi(2) / rmag_km.powi(5);
        let accel_km_s2 = Vector3::new(
            factor * r_km.x * (1.0 - 5.0 * z2),
            factor * r_km.y * (1.0 - 5.0 * z2),
            factor * r_km.z * (3.0 - 5.0 * z2),
        );
        Ok(dcm.transpose() * accel_km_s2 * 1e3)
    }
}

impl fmt::Display for OblatenessPerturbation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "J2 oblateness")
    }
}
