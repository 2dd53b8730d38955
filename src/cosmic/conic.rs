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

use super::{
    AstroError, CelestialBody, Frame, InvalidElementsSnafu, OrbitalState, StateVector,
    TimeTagged, TrajectoryKind,
};
use crate::linalg::Vector3;
use crate::time::Epoch;
use snafu::ensure;
use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

/// Classical orbital elements, with the periapsis radius instead of the semi-major axis so that
/// parabolic trajectories are representable.
#[derive(Clone, Debug, PartialEq)]
pub struct ConicElements {
    pub center: Arc<CelestialBody>,
    /// Radius of periapsis, in meters
    pub periapsis_m: f64,
    pub ecc: f64,
    pub inc_rad: f64,
    pub raan_rad: f64,
    pub aop_rad: f64,
    /// Mean anomaly at the epoch (Barker's mean anomaly for parabolic trajectories)
    pub mean_anomaly_rad: f64,
    pub epoch: Epoch,
    pub frame: Frame,
}

impl ConicElements {
    /// Builds conic elements from the periapsis radius, fails on a non positive periapsis or a negative eccentricity.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        center: Arc<CelestialBody>,
        periapsis_m: f64,
        ecc: f64,
        inc_rad: f64,
        raan_rad: f64,
        aop_rad: f64,
        mean_anomaly_rad: f64,
        epoch: Epoch,
        frame: Frame,
    ) -> Result<Self, AstroError> {
        ensure!(
            periapsis_m.is_finite() && periapsis_m > 0.0,
            InvalidElementsSnafu {
                details: format!("periapsis radius must be positive, got {periapsis_m} m")
            }
        );
        ensure!(
            ecc.is_finite() && ecc >= 0.0,
            InvalidElementsSnafu {
                details: format!("eccentricity must be non-negative, got {ecc}")
            }
        );
        Ok(Self {
            center,
            periapsis_m,
            ecc,
            inc_rad,
            raan_rad,
            aop_rad,
            mean_anomaly_rad,
            epoch,
            frame,
        })
    }

    /// Builds elliptical elements from the semi-major axis.
    ///
    /// Fails if the semi-major axis is not positive or the eccentricity is not in [0, 1).
    #[allow(clippy::too_many_arguments)]
    pub fn from_sma(
        center: Arc<CelestialBody>,
        sma_m: f64,
        ecc: f64,
        inc_rad: f64,
        raan_rad: f64,
        aop_rad: f64,
        mean_anomaly_rad: f64,
        epoch: Epoch,
        frame: Frame,
    ) -> Result<Self, AstroError> {
        ensure!(
            sma_m > 0.0,
            InvalidElementsSnafu {
                details: format!("semi-major axis of an elliptical orbit must be positive, got {sma_m} m")
            }
        );
        ensure!(
            TrajectoryKind::from_ecc(ecc) == TrajectoryKind::Elliptical,
            InvalidElementsSnafu {
                details: format!("eccentricity of an elliptical orbit must be in [0, 1), got {ecc}")
            }
        );
        Self::new(
            center,
            sma_m * (1.0 - ecc),
            ecc,
            inc_rad,
            raan_rad,
            aop_rad,
            mean_anomaly_rad,
            epoch,
            frame,
        )
    }

    /// Computes the elements of the provided state.
    pub fn from_state_vector(sv: &StateVector) -> Self {
        Self {
            center: sv.center.clone(),
            periapsis_m: sv.periapsis_m(),
            ecc: sv.eccentricity(),
            inc_rad: sv.inclination_rad(),
            raan_rad: sv.raan_rad(),
            aop_rad: sv.aop_rad(),
            mean_anomaly_rad: sv.mean_anomaly_rad(),
            epoch: sv.epoch,
            frame: sv.frame,
        }
    }

    /// Returns a copy of these elements with another mean anomaly
    pub fn with_mean_anomaly(&self, mean_anomaly_rad: f64) -> Self {
        let mut me = self.clone();
        me.mean_anomaly_rad = mean_anomaly_rad;
        me
    }
}

/// Returns the position and velocity on the conic at the provided true anomaly.
///
/// Algorithm from GMAT's StateConversionUtil::ComputeKeplToCart, with the semi-latus rectum as input.
#[allow(clippy::too_many_arguments)]
pub(crate) fn conic_to_cartesian(
    gm: f64,
    semi_parameter_m: f64,
    ecc: f64,
    inc_rad: f64,
    raan_rad: f64,
    aop_rad: f64,
    ta_rad: f64,
) -> (Vector3<f64>, Vector3<f64>) {
    let radius = semi_parameter_m / (1.0 + ecc * ta_rad.cos());
    let (sin_aop_ta, cos_aop_ta) = (aop_rad + ta_rad).sin_cos();
    let (sin_inc, cos_inc) = inc_rad.sin_cos();
    let (sin_raan, cos_raan) = raan_rad.sin_cos();
    let (sin_aop, cos_aop) = aop_rad.sin_cos();
    let position = Vector3::new(
        radius * (cos_aop_ta * cos_raan - cos_inc * sin_aop_ta * sin_raan),
        radius * (cos_aop_ta * sin_raan + cos_inc * sin_aop_ta * cos_raan),
        radius * sin_aop_ta * sin_inc,
    );

    let sqrt_gm_p = (gm / semi_parameter_m).sqrt();
    let cos_ta_ecc = ta_rad.cos() + ecc;
    let sin_ta = ta_rad.sin();
    let velocity = Vector3::new(
        sqrt_gm_p * cos_ta_ecc * (-sin_aop * cos_raan - cos_inc * sin_raan * cos_aop)
            - sqrt_gm_p * sin_ta * (cos_aop * cos_raan - cos_inc * sin_raan * sin_aop),
        sqrt_gm_p * cos_ta_ecc * (-sin_aop * sin_raan + cos_inc * cos_raan * cos_aop)
            - sqrt_gm_p * sin_ta * (cos_aop * sin_raan + cos_inc * cos_raan * sin_aop),
        sqrt_gm_p * (cos_ta_ecc * sin_inc * cos_aop - sin_ta * sin_inc * sin_aop),
    );
    (position, velocity)
}

impl TimeTagged for ConicElements {
    fn epoch(&self) -> Epoch {
        self.epoch
    }

    fn set_epoch(&mut self, epoch: Epoch) {
        self.epoch = epoch
    }
}

impl OrbitalState for ConicElements {
    fn central_body(&self) -> &Arc<CelestialBody> {
        &self.center
    }

    fn frame(&self) -> Frame {
        self.frame
    }

    fn to_state_vector(&self, epoch: Epoch) -> StateVector {
        let ta = self.true_anomaly_at(epoch);
        if self.is_hyperbolic() && ta.abs() >= PI - (1.0 / self.ecc).acos() {
            warn!("true anomaly {ta} rad is beyond the asymptote of the hyperbola");
        }
        let (position_m, velocity_m_s) = conic_to_cartesian(
            self.gm(),
            self.semi_parameter_m(),
            self.ecc,
            self.inc_rad,
            self.raan_rad,
            self.aop_rad,
            ta,
        );
        StateVector::new(self.center.clone(), position_m, velocity_m_s, epoch, self.frame)
    }

    fn eccentricity(&self) -> f64 {
        self.ecc
    }

    fn sma_m(&self) -> f64 {
        match self.trajectory_kind() {
            TrajectoryKind::Parabolic => f64::INFINITY,
            _ => self.periapsis_m / (1.0 - self.ecc),
        }
    }

    fn periapsis_m(&self) -> f64 {
        self.periapsis_m
    }

    fn inclination_rad(&self) -> f64 {
        self.inc_rad
    }

    fn raan_rad(&self) -> f64 {
        self.raan_rad
    }

    fn aop_rad(&self) -> f64 {
        self.aop_rad
    }

    fn mean_anomaly_rad(&self) -> f64 {
        self.mean_anomaly_rad
    }

    fn specific_angular_momentum(&self) -> Vector3<f64> {
        self.state_vector().specific_angular_momentum()
    }
}

impl fmt::Display for ConicElements {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{} around {}] {}\trp = {:.3} m\te = {:.9}\ti = {:.9} rad\traan = {:.9} rad\taop = {:.9} rad\tma = {:.9} rad",
            self.frame,
            self.center.name,
            self.epoch,
            self.periapsis_m,
            self.ecc,
            self.inc_rad,
            self.raan_rad,
            self.aop_rad,
            self.mean_anomaly_rad
        )
    }
}
