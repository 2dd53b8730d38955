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
    mean_anomaly_from_true, AstroError, BodyProvider, CelestialBody, ConicElements, Frame,
    FrameUsageSnafu, OrbitalState, TimeTagged, ECC_EPSILON,
};
use crate::linalg::{Matrix6, Vector3, Vector6};
use crate::time::Epoch;
use crate::utils::{between_0_tau, between_pm_pi, invert_state_dcm};
use snafu::ensure;
use std::f64::consts::TAU;
use std::fmt;
use std::sync::Arc;

/// Cartesian position and velocity of an object with respect to its center of motion.
///
/// Unless noted otherwise, the element computations follow GMAT's StateConversionUtil. The state is
/// stored in Cartesian coordinates since they are never singular; the elements are computed on demand.
#[derive(Clone, Debug, PartialEq)]
pub struct StateVector {
    /// in meters
    pub position_m: Vector3<f64>,
    /// in meters per second
    pub velocity_m_s: Vector3<f64>,
    pub epoch: Epoch,
    pub frame: Frame,
    pub center: Arc<CelestialBody>,
}

impl StateVector {
    pub fn new(
        center: Arc<CelestialBody>,
        position_m: Vector3<f64>,
        velocity_m_s: Vector3<f64>,
        epoch: Epoch,
        frame: Frame,
    ) -> Self {
        if center.gm_m3_s2.abs() < f64::EPSILON {
            warn!(
                "GM of {} is near zero: expect math errors in the orbital elements",
                center.name
            );
        }
        Self {
            position_m,
            velocity_m_s,
            epoch,
            frame,
            center,
        }
    }

    /// Creates a new state from its components.
    ///
    /// **Units:** m, m, m, m/s, m/s, m/s
    #[allow(clippy::too_many_arguments)]
    pub fn cartesian(
        center: Arc<CelestialBody>,
        x_m: f64,
        y_m: f64,
        z_m: f64,
        vx_m_s: f64,
        vy_m_s: f64,
        vz_m_s: f64,
        epoch: Epoch,
        frame: Frame,
    ) -> Self {
        Self::new(
            center,
            Vector3::new(x_m, y_m, z_m),
            Vector3::new(vx_m_s, vy_m_s, vz_m_s),
            epoch,
            frame,
        )
    }

    /// Creates a state from Keplerian elements, the anomaly being the true anomaly.
    ///
    /// **Units:** m, none, rad, rad, rad, rad
    #[allow(clippy::too_many_arguments)]
    pub fn keplerian(
        center: Arc<CelestialBody>,
        sma_m: f64,
        ecc: f64,
        inc_rad: f64,
        raan_rad: f64,
        aop_rad: f64,
        ta_rad: f64,
        epoch: Epoch,
        frame: Frame,
    ) -> Result<Self, AstroError> {
        let ma_rad = mean_anomaly_from_true(ta_rad, ecc);
        Ok(ConicElements::from_sma(
            center, sma_m, ecc, inc_rad, raan_rad, aop_rad, ma_rad, epoch, frame,
        )?
        .state_vector())
    }

    /// Returns the 6 dimensional Cartesian vector
    pub fn to_cartesian_vec(&self) -> Vector6<f64> {
        Vector6::new(
            self.position_m.x,
            self.position_m.y,
            self.position_m.z,
            self.velocity_m_s.x,
            self.velocity_m_s.y,
            self.velocity_m_s.z,
        )
    }

    /// Returns a copy of this state with the position and velocity of the provided vector
    pub fn with_cartesian_vec(&self, state: &Vector6<f64>) -> Self {
        let mut me = self.clone();
        me.position_m = state.fixed_rows::<3>(0).into_owned();
        me.velocity_m_s = state.fixed_rows::<3>(3).into_owned();
        me
    }

    pub fn rmag_m(&self) -> f64 {
        self.position_m.norm()
    }

    pub fn vmag_m_s(&self) -> f64 {
        self.velocity_m_s.norm()
    }

    /// Unit vector of the position
    pub fn r_hat(&self) -> Vector3<f64> {
        self.position_m / self.rmag_m()
    }

    /// Unit vector of the velocity
    pub fn v_hat(&self) -> Vector3<f64> {
        self.velocity_m_s / self.vmag_m_s()
    }

    /// Applies an impulsive velocity change, in m/s, in the frame of this state
    pub fn apply_dv(&mut self, dv: Vector3<f64>) {
        self.velocity_m_s += dv;
    }

    /// Returns a copy of this state after an impulsive velocity change, in m/s
    pub fn with_dv(&self, dv: Vector3<f64>) -> Self {
        let mut me = self.clone();
        me.apply_dv(dv);
        me
    }

    /// Returns true if both states are at the same epoch, in the same frame and within the tolerances.
    pub fn eq_within(&self, other: &Self, position_tol_m: f64, velocity_tol_m_s: f64) -> bool {
        self.epoch == other.epoch
            && self.frame == other.frame
            && (self.position_m - other.position_m).norm() <= position_tol_m
            && (self.velocity_m_s - other.velocity_m_s).norm() <= velocity_tol_m_s
    }

    /// State rotation from the ICRF into the provided frame, only using the center of motion.
    fn dcm_from_icrf(&self, frame: Frame) -> Result<Matrix6<f64>, AstroError> {
        match frame {
            Frame::ICRF => Ok(Matrix6::identity()),
            Frame::EclipticJ2000 => Ok(Frame::ecliptic_state_dcm()),
            Frame::BodyFixed(id) => {
                ensure!(
                    id == self.center.id,
                    FrameUsageSnafu {
                        action: "rotate into another body's fixed frame without a body provider",
                        frame
                    }
                );
                Ok(self.center.rotation.state_dcm_to_body_fixed(self.epoch))
            }
        }
    }

    /// Rotates this state into the provided frame.
    ///
    /// Body fixed frames are only supported for the center of motion: use [`Self::to_frame_using`] otherwise.
    pub fn to_frame(&self, frame: Frame) -> Result<Self, AstroError> {
        if frame == self.frame {
            return Ok(self.clone());
        }
        let to_icrf = invert_state_dcm(&self.dcm_from_icrf(self.frame)?);
        let dcm = self.dcm_from_icrf(frame)? * to_icrf;
        let mut me = self.with_cartesian_vec(&(dcm * self.to_cartesian_vec()));
        me.frame = frame;
        Ok(me)
    }

    /// Rotates this state into the provided frame using the provider's frame metadata.
    pub fn to_frame_using(
        &self,
        provider: &dyn BodyProvider,
        frame: Frame,
    ) -> Result<Self, AstroError> {
        let dcm = provider.state_transformation(self.frame, frame, self.epoch)?;
        let mut me = self.with_cartesian_vec(&(dcm * self.to_cartesian_vec()));
        me.frame = frame;
        Ok(me)
    }

    /// Returns true if the orbit plane is (nearly) the XY plane of the frame
    fn is_equatorial(&self) -> bool {
        let hvec = self.specific_angular_momentum();
        Vector3::z().cross(&hvec).norm() < 1e-12 * hvec.norm()
    }

    /// Node vector from the Z axis of the frame, which is the zero vector for equatorial orbits
    fn node_vector(&self) -> Vector3<f64> {
        Vector3::z().cross(&self.specific_angular_momentum())
    }
}

impl TimeTagged for StateVector {
    fn epoch(&self) -> Epoch {
        self.epoch
    }

    fn set_epoch(&mut self, epoch: Epoch) {
        self.epoch = epoch
    }
}

impl OrbitalState for StateVector {
    fn central_body(&self) -> &Arc<CelestialBody> {
        &self.center
    }

    fn frame(&self) -> Frame {
        self.frame
    }

    fn to_state_vector(&self, epoch: Epoch) -> StateVector {
        if epoch == self.epoch {
            return self.clone();
        }
        if self.frame.is_inertial() {
            return ConicElements::from_state_vector(self).to_state_vector(epoch);
        }
        // Kepler's laws only hold in an inertial frame
        match self
            .to_frame(Frame::ICRF)
            .and_then(|inertial| inertial.to_state_vector(epoch).to_frame(self.frame))
        {
            Ok(sv) => sv,
            Err(e) => {
                warn!("{e}: propagating in the rotating frame {}", self.frame);
                ConicElements::from_state_vector(self).to_state_vector(epoch)
            }
        }
    }

    fn eccentricity(&self) -> f64 {
        self.eccentricity_vector().norm()
    }

    fn sma_m(&self) -> f64 {
        let energy = self.specific_energy();
        if energy.abs() < f64::EPSILON {
            f64::INFINITY
        } else {
            -self.gm() / (2.0 * energy)
        }
    }

    fn periapsis_m(&self) -> f64 {
        let p = self.specific_angular_momentum().norm_squared() / self.gm();
        p / (1.0 + self.eccentricity())
    }

    fn inclination_rad(&self) -> f64 {
        let hvec = self.specific_angular_momentum();
        (hvec.z / hvec.norm()).clamp(-1.0, 1.0).acos()
    }

    fn raan_rad(&self) -> f64 {
        if self.is_equatorial() {
            return 0.0;
        }
        let n = self.node_vector();
        let raan = (n.x / n.norm()).clamp(-1.0, 1.0).acos();
        if n.y < 0.0 {
            TAU - raan
        } else {
            raan
        }
    }

    fn aop_rad(&self) -> f64 {
        let ecc = self.eccentricity();
        if ecc < ECC_EPSILON {
            // Undefined on circular orbits: the periapsis is placed on the line of nodes
            return 0.0;
        }
        let evec = self.eccentricity_vector();
        if self.is_equatorial() {
            // Longitude of periapsis
            let lon = evec.y.atan2(evec.x);
            return between_0_tau(if self.specific_angular_momentum().z < 0.0 {
                -lon
            } else {
                lon
            });
        }
        let n = self.node_vector();
        let aop = (n.dot(&evec) / (n.norm() * ecc)).clamp(-1.0, 1.0).acos();
        if evec.z < 0.0 {
            TAU - aop
        } else {
            aop
        }
    }

    /// Returns the true anomaly, between 0 and 2π for elliptical orbits and between -π and π otherwise.
    ///
    /// On circular orbits this is the argument of latitude (or the true longitude if the orbit is also
    /// equatorial), consistent with the zero argument of periapsis.
    fn true_anomaly_rad(&self) -> f64 {
        let ecc = self.eccentricity();
        let ta = if ecc < ECC_EPSILON {
            if self.is_equatorial() {
                let lon = self.position_m.y.atan2(self.position_m.x);
                if self.specific_angular_momentum().z < 0.0 {
                    -lon
                } else {
                    lon
                }
            } else {
                let n = self.node_vector();
                let aol = (n.dot(&self.position_m) / (n.norm() * self.rmag_m()))
                    .clamp(-1.0, 1.0)
                    .acos();
                if self.position_m.z < 0.0 {
                    TAU - aol
                } else {
                    aol
                }
            }
        } else {
            let cos_nu = self.eccentricity_vector().dot(&self.position_m) / (ecc * self.rmag_m());
            let ta = cos_nu.clamp(-1.0, 1.0).acos();
            if self.position_m.dot(&self.velocity_m_s) < 0.0 {
                TAU - ta
            } else {
                ta
            }
        };
        if self.is_elliptical() {
            between_0_tau(ta)
        } else {
            between_pm_pi(ta)
        }
    }

    fn mean_anomaly_rad(&self) -> f64 {
        mean_anomaly_from_true(self.true_anomaly_rad(), self.eccentricity())
    }

    fn specific_angular_momentum(&self) -> Vector3<f64> {
        self.position_m.cross(&self.velocity_m_s)
    }

    fn specific_energy(&self) -> f64 {
        self.vmag_m_s().powi(2) / 2.0 - self.gm() / self.rmag_m()
    }

    fn state_vector(&self) -> StateVector {
        self.clone()
    }

    fn eccentricity_vector(&self) -> Vector3<f64> {
        self.velocity_m_s.cross(&self.specific_angular_momentum()) / self.gm() - self.r_hat()
    }
}

impl fmt::Display for StateVector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{} around {}] {}\tposition = [{:.6}, {:.6}, {:.6}] m\tvelocity = [{:.6}, {:.6}, {:.6}] m/s",
            self.frame,
            self.center.name,
            self.epoch,
            self.position_m.x,
            self.position_m.y,
            self.position_m.z,
            self.velocity_m_s.x,
            self.velocity_m_s.y,
            self.velocity_m_s.z
        )
    }
}
