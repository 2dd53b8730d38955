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
    TimeTagged,
};
use crate::linalg::{Matrix3, Vector3};
use crate::time::Epoch;
use crate::utils::{between_0_tau, r1, r3};
use snafu::ensure;
use std::f64::consts::FRAC_PI_2;
use std::fmt;
use std::sync::Arc;

/// Equinoctial elements with secular rates of the longitude of periapsis and of the node.
///
/// The elements are expressed in the plane of a reference pole given by its right ascension and
/// declination in the working frame. With the default pole (RA = -90 deg, Dec = 90 deg) the element
/// frame coincides with the working frame. These elements are not singular for circular or equatorial orbits.
#[derive(Clone, Debug, PartialEq)]
pub struct EquinoctialElements {
    pub center: Arc<CelestialBody>,
    pub sma_m: f64,
    /// e sin(ϖ)
    pub h: f64,
    /// e cos(ϖ)
    pub k: f64,
    /// tan(i/2) sin(Ω)
    pub p: f64,
    /// tan(i/2) cos(Ω)
    pub q: f64,
    /// Mean longitude at the epoch
    pub mean_longitude_rad: f64,
    pub periapsis_longitude_rate_rad_s: f64,
    pub node_longitude_rate_rad_s: f64,
    pub pole_ra_rad: f64,
    pub pole_dec_rad: f64,
    pub epoch: Epoch,
    pub frame: Frame,
}

impl EquinoctialElements {
    /// Initializes equinoctial elements without secular rates and with the default pole.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        center: Arc<CelestialBody>,
        sma_m: f64,
        h: f64,
        k: f64,
        p: f64,
        q: f64,
        mean_longitude_rad: f64,
        epoch: Epoch,
        frame: Frame,
    ) -> Result<Self, AstroError> {
        ensure!(
            sma_m > 0.0,
            InvalidElementsSnafu {
                details: format!("equinoctial semi-major axis must be positive, got {sma_m} m")
            }
        );
        ensure!(
            h * h + k * k < 1.0,
            InvalidElementsSnafu {
                details: format!("equinoctial elements must be elliptical, got h = {h} and k = {k}")
            }
        );
        Ok(Self {
            center,
            sma_m,
            h,
            k,
            p,
            q,
            mean_longitude_rad,
            periapsis_longitude_rate_rad_s: 0.0,
            node_longitude_rate_rad_s: 0.0,
            pole_ra_rad: -FRAC_PI_2,
            pole_dec_rad: FRAC_PI_2,
            epoch,
            frame,
        })
    }

    /// Initializes equinoctial elements from the classical elements
    #[allow(clippy::too_many_arguments)]
    pub fn from_keplerian(
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
        let lon_periapsis = aop_rad + raan_rad;
        let tan_half_inc = (inc_rad / 2.0).tan();
        Self::new(
            center,
            sma_m,
            ecc * lon_periapsis.sin(),
            ecc * lon_periapsis.cos(),
            tan_half_inc * raan_rad.sin(),
            tan_half_inc * raan_rad.cos(),
            mean_anomaly_rad + lon_periapsis,
            epoch,
            frame,
        )
    }

    /// Sets the secular rates of the longitude of periapsis and of the ascending node, in rad/s
    pub fn with_rates(mut self, periapsis_longitude_rate_rad_s: f64, node_longitude_rate_rad_s: f64) -> Self {
        self.periapsis_longitude_rate_rad_s = periapsis_longitude_rate_rad_s;
        self.node_longitude_rate_rad_s = node_longitude_rate_rad_s;
        self
    }

    /// Sets the reference pole of the elements, in the working frame
    pub fn with_pole(mut self, pole_ra_rad: f64, pole_dec_rad: f64) -> Self {
        self.pole_ra_rad = pole_ra_rad;
        self.pole_dec_rad = pole_dec_rad;
        self
    }

    /// Two-body mean motion, in rad/s
    pub fn kepler_mean_motion_rad_s(&self) -> f64 {
        (self.center.gm_m3_s2 / self.sma_m.powi(3)).sqrt()
    }

    /// Rotation from the element frame to the working frame
    fn dcm_to_working_frame(&self) -> Matrix3<f64> {
        (r1(FRAC_PI_2 - self.pole_dec_rad) * r3(FRAC_PI_2 + self.pole_ra_rad)).transpose()
    }

    /// Solves the equinoctial Kepler equation `L = F + h cos F - k sin F` for the eccentric longitude.
    fn eccentric_longitude(h: f64, k: f64, mean_longitude: f64) -> f64 {
        let mut lon = mean_longitude;
        for _ in 0..50 {
            let (sin_f, cos_f) = lon.sin_cos();
            let delta =
                (lon + h * cos_f - k * sin_f - mean_longitude) / (1.0 - h * sin_f - k * cos_f);
            lon -= delta;
            if delta.abs() < 1e-15 {
                break;
            }
        }
        lon
    }
}

impl TimeTagged for EquinoctialElements {
    fn epoch(&self) -> Epoch {
        self.epoch
    }

    fn set_epoch(&mut self, epoch: Epoch) {
        self.epoch = epoch
    }
}

impl OrbitalState for EquinoctialElements {
    fn central_body(&self) -> &Arc<CelestialBody> {
        &self.center
    }

    fn frame(&self) -> Frame {
        self.frame
    }

    fn to_state_vector(&self, epoch: Epoch) -> StateVector {
        let dt = (epoch - self.epoch).to_seconds();
        let n = self.kepler_mean_motion_rad_s();
        let a = self.sma_m;

        // Secular drift of the periapsis and of the node
        let ecc = self.h.hypot(self.k);
        let tan_half_inc = self.p.hypot(self.q);
        let lon_periapsis = self.h.atan2(self.k) + self.periapsis_longitude_rate_rad_s * dt;
        let lon_node = self.p.atan2(self.q) + self.node_longitude_rate_rad_s * dt;
        let (h, k) = (ecc * lon_periapsis.sin(), ecc * lon_periapsis.cos());
        let (p, q) = (tan_half_inc * lon_node.sin(), tan_half_inc * lon_node.cos());
        let mean_longitude = self.mean_longitude_rad
            + (n + self.periapsis_longitude_rate_rad_s + self.node_longitude_rate_rad_s) * dt;

        let lon = Self::eccentric_longitude(h, k, between_0_tau(mean_longitude));
        let (sin_f, cos_f) = lon.sin_cos();

        let denom = 1.0 + p * p + q * q;
        let f_hat = Vector3::new(1.0 - p * p + q * q, 2.0 * p * q, -2.0 * p) / denom;
        let g_hat = Vector3::new(2.0 * p * q, 1.0 + p * p - q * q, 2.0 * q) / denom;

        let b = 1.0 / (1.0 + (1.0 - h * h - k * k).sqrt());
        let x1 = a * ((1.0 - h * h * b) * cos_f + h * k * b * sin_f - k);
        let y1 = a * ((1.0 - k * k * b) * sin_f + h * k * b * cos_f - h);
        let radius = a * (1.0 - k * cos_f - h * sin_f);
        let factor = n * a * a / radius;
        let dx1 = factor * (h * k * b * cos_f - (1.0 - h * h * b) * sin_f);
        let dy1 = factor * ((1.0 - k * k * b) * cos_f - h * k * b * sin_f);

        let dcm = self.dcm_to_working_frame();
        StateVector::new(
            self.center.clone(),
            dcm * (f_hat * x1 + g_hat * y1),
            dcm * (f_hat * dx1 + g_hat * dy1),
            epoch,
            self.frame,
        )
    }

    fn eccentricity(&self) -> f64 {
        self.h.hypot(self.k)
    }

    fn sma_m(&self) -> f64 {
        self.sma_m
    }

    fn periapsis_m(&self) -> f64 {
        self.sma_m * (1.0 - self.eccentricity())
    }

    // The angles are computed from the state so that they refer to the working frame, whatever the pole.

    fn inclination_rad(&self) -> f64 {
        self.state_vector().inclination_rad()
    }

    fn raan_rad(&self) -> f64 {
        self.state_vector().raan_rad()
    }

    fn aop_rad(&self) -> f64 {
        self.state_vector().aop_rad()
    }

    fn mean_anomaly_rad(&self) -> f64 {
        self.state_vector().mean_anomaly_rad()
    }
}

impl fmt::Display for EquinoctialElements {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{} around {}] {}\ta = {:.3} m\th = {:.9}\tk = {:.9}\tp = {:.9}\tq = {:.9}\tL = {:.9} rad",
            self.frame,
            self.center.name,
            self.epoch,
            self.sma_m,
            self.h,
            self.k,
            self.p,
            self.q,
            self.mean_longitude_rad
        )
    }
}
