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
    AstroError, CelestialBody, ConicElements, EquinoctialElements, Frame, NotPeriodicSnafu,
    StateVector, TimeTagged, CIRCULAR_ECC, ECC_EPSILON, PARABOLIC_ECC_TOL, TLE,
};
use crate::linalg::Vector3;
use crate::time::{Epoch, Unit};
use crate::utils::{between_0_tau, between_pm_pi};
use snafu::ensure;
use std::f64::consts::{PI, TAU};
use std::fmt;
use std::sync::Arc;

/// Maximum number of Newton iterations when solving Kepler's equation
const KEPLER_MAX_ITER: usize = 50;
/// Convergence threshold on the anomaly when solving Kepler's equation, in radians
const KEPLER_TOL: f64 = 1e-15;

/// Classification of a conic trajectory from its eccentricity
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TrajectoryKind {
    Elliptical,
    Parabolic,
    Hyperbolic,
}

impl TrajectoryKind {
    pub fn from_ecc(ecc: f64) -> Self {
        if (ecc - 1.0).abs() <= PARABOLIC_ECC_TOL {
            Self::Parabolic
        } else if ecc < 1.0 {
            Self::Elliptical
        } else {
            Self::Hyperbolic
        }
    }
}

impl fmt::Display for TrajectoryKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Elliptical => write!(f, "elliptical"),
            Self::Parabolic => write!(f, "parabolic"),
            Self::Hyperbolic => write!(f, "hyperbolic"),
        }
    }
}

/// Solves Kepler's equation `M = E - e sin E` for the eccentric anomaly with a Newton iteration.
///
/// Near circular orbits return the mean anomaly directly.
pub fn eccentric_anomaly_from_mean(ma_rad: f64, ecc: f64) -> f64 {
    if ecc < ECC_EPSILON {
        return ma_rad;
    }
    let mut ea = if ecc < 0.8 { ma_rad } else { PI.copysign(ma_rad) };
    for _ in 0..KEPLER_MAX_ITER {
        let delta = (ea - ecc * ea.sin() - ma_rad) / (1.0 - ecc * ea.cos());
        ea -= delta;
        if delta.abs() < KEPLER_TOL {
            return ea;
        }
    }
    warn!("Kepler's equation did not converge for M = {ma_rad} rad and e = {ecc}");
    ea
}

/// Solves the hyperbolic Kepler equation `M = e sinh H - H` for the hyperbolic anomaly.
pub fn hyperbolic_anomaly_from_mean(ma_rad: f64, ecc: f64) -> f64 {
    let mut ha = (ma_rad / ecc).asinh();
    for _ in 0..KEPLER_MAX_ITER {
        let delta = (ecc * ha.sinh() - ha - ma_rad) / (ecc * ha.cosh() - 1.0);
        ha -= delta;
        if delta.abs() < KEPLER_TOL * ha.abs().max(1.0) {
            return ha;
        }
    }
    warn!("hyperbolic Kepler equation did not converge for M = {ma_rad} and e = {ecc}");
    ha
}

/// Solves Barker's equation `M = D + D^3 / 3` in closed form, returning `D = tan(ν/2)`.
pub fn parabolic_anomaly_from_mean(ma: f64) -> f64 {
    let b = 1.5 * ma;
    let root = (b * b + 1.0).sqrt();
    (b + root).cbrt() + (b - root).cbrt()
}

/// Returns the true anomaly for the provided mean anomaly on a conic of the provided eccentricity.
///
/// For parabolic trajectories the mean anomaly is Barker's `D + D^3 / 3`.
pub fn true_anomaly_from_mean(ma_rad: f64, ecc: f64) -> f64 {
    match TrajectoryKind::from_ecc(ecc) {
        TrajectoryKind::Elliptical => {
            if ecc < ECC_EPSILON {
                return between_0_tau(ma_rad);
            }
            let ea = eccentric_anomaly_from_mean(between_pm_pi(ma_rad), ecc);
            let (sin_ea, cos_ea) = ea.sin_cos();
            between_0_tau(((1.0 - ecc * ecc).sqrt() * sin_ea).atan2(cos_ea - ecc))
        }
        TrajectoryKind::Parabolic => 2.0 * parabolic_anomaly_from_mean(ma_rad).atan(),
        TrajectoryKind::Hyperbolic => {
            let ha = hyperbolic_anomaly_from_mean(ma_rad, ecc);
            2.0 * (((ecc + 1.0) / (ecc - 1.0)).sqrt() * (ha / 2.0).tanh()).atan()
        }
    }
}

/// Returns the mean anomaly for the provided true anomaly, between 0 and 2π for elliptical orbits.
pub fn mean_anomaly_from_true(ta_rad: f64, ecc: f64) -> f64 {
    match TrajectoryKind::from_ecc(ecc) {
        TrajectoryKind::Elliptical => {
            if ecc < ECC_EPSILON {
                return between_0_tau(ta_rad);
            }
            let (sin_ta, cos_ta) = ta_rad.sin_cos();
            let denom = 1.0 + ecc * cos_ta;
            let sin_ea = (1.0 - ecc * ecc).sqrt() * sin_ta / denom;
            let cos_ea = (ecc + cos_ta) / denom;
            let ea = sin_ea.atan2(cos_ea);
            between_0_tau(ea - ecc * ea.sin())
        }
        TrajectoryKind::Parabolic => {
            let d = (ta_rad / 2.0).tan();
            d + d.powi(3) / 3.0
        }
        TrajectoryKind::Hyperbolic => {
            let ta = between_pm_pi(ta_rad);
            let ha = 2.0 * (((ecc - 1.0) / (ecc + 1.0)).sqrt() * (ta / 2.0).tan()).atanh();
            ecc * ha.sinh() - ha
        }
    }
}

/// The capabilities shared by every orbital state representation.
///
/// Each representation stores its own elements, and must be able to produce the Cartesian state at
/// any epoch and its classical orbital elements. Everything else is derived from these.
pub trait OrbitalState: TimeTagged + Send + Sync + fmt::Display {
    /// The center of motion
    fn central_body(&self) -> &Arc<CelestialBody>;

    /// The frame in which this state is expressed
    fn frame(&self) -> Frame;

    /// Returns the Cartesian state at the target epoch, propagated analytically.
    fn to_state_vector(&self, epoch: Epoch) -> StateVector;

    fn eccentricity(&self) -> f64;

    /// Semi-major axis in meters, negative for hyperbolic trajectories and infinite for parabolic ones
    fn sma_m(&self) -> f64;

    /// Radius of periapsis, in meters
    fn periapsis_m(&self) -> f64;

    fn inclination_rad(&self) -> f64;

    /// Right ascension of the ascending node
    fn raan_rad(&self) -> f64;

    /// Argument of periapsis
    fn aop_rad(&self) -> f64;

    /// Mean anomaly at the epoch of this state
    fn mean_anomaly_rad(&self) -> f64;

    /// Specific angular momentum vector, in m^2/s
    fn specific_angular_momentum(&self) -> Vector3<f64> {
        self.state_vector().specific_angular_momentum()
    }

    /// Specific orbital energy, in m^2/s^2
    fn specific_energy(&self) -> f64 {
        match self.trajectory_kind() {
            TrajectoryKind::Parabolic => 0.0,
            _ => -self.gm() / (2.0 * self.sma_m()),
        }
    }

    /// Gravitational parameter of the center of motion
    fn gm(&self) -> f64 {
        self.central_body().gm_m3_s2
    }

    /// Returns the Cartesian state at the epoch of this state.
    fn state_vector(&self) -> StateVector {
        self.to_state_vector(self.epoch())
    }

    fn trajectory_kind(&self) -> TrajectoryKind {
        TrajectoryKind::from_ecc(self.eccentricity())
    }

    fn is_elliptical(&self) -> bool {
        self.trajectory_kind() == TrajectoryKind::Elliptical
    }

    fn is_parabolic(&self) -> bool {
        self.trajectory_kind() == TrajectoryKind::Parabolic
    }

    fn is_hyperbolic(&self) -> bool {
        self.trajectory_kind() == TrajectoryKind::Hyperbolic
    }

    fn is_circular(&self) -> bool {
        self.eccentricity() < CIRCULAR_ECC
    }

    /// Semi-latus rectum, in meters
    fn semi_parameter_m(&self) -> f64 {
        self.periapsis_m() * (1.0 + self.eccentricity())
    }

    /// Radius of apoapsis, in meters, only defined for elliptical orbits
    fn apoapsis_m(&self) -> Result<f64, AstroError> {
        self.ensure_periodic("compute the apoapsis")?;
        Ok(self.sma_m() * (1.0 + self.eccentricity()))
    }

    /// Orbital period, only defined for elliptical orbits
    fn period(&self) -> Result<crate::time::Duration, AstroError> {
        self.ensure_periodic("compute the period")?;
        Ok(TAU * (self.sma_m().powi(3) / self.gm()).sqrt() * Unit::Second)
    }

    /// Rate of the mean anomaly in rad/s.
    ///
    /// For hyperbolic trajectories this is `sqrt(μ / (-a)^3)` and for parabolic ones the rate of
    /// Barker's mean anomaly `sqrt(μ / (2 q^3))`.
    fn mean_motion_rad_s(&self) -> f64 {
        match self.trajectory_kind() {
            TrajectoryKind::Parabolic => (self.gm() / (2.0 * self.periapsis_m().powi(3))).sqrt(),
            _ => (self.gm() / self.sma_m().abs().powi(3)).sqrt(),
        }
    }

    fn true_anomaly_rad(&self) -> f64 {
        true_anomaly_from_mean(self.mean_anomaly_rad(), self.eccentricity())
    }

    /// Eccentric anomaly at the epoch of this state (elliptical orbits)
    fn eccentric_anomaly_rad(&self) -> f64 {
        self.eccentric_anomaly_at(self.epoch())
    }

    /// Mean anomaly at the provided epoch, between 0 and 2π for elliptical orbits
    fn mean_anomaly_at(&self, epoch: Epoch) -> f64 {
        let ma = self.mean_anomaly_rad()
            + self.mean_motion_rad_s() * (epoch - self.epoch()).to_seconds();
        if self.is_elliptical() {
            between_0_tau(ma)
        } else {
            ma
        }
    }

    /// Eccentric anomaly at the provided epoch, hyperbolic anomaly on hyperbolic trajectories
    fn eccentric_anomaly_at(&self, epoch: Epoch) -> f64 {
        let ma = self.mean_anomaly_at(epoch);
        match self.trajectory_kind() {
            TrajectoryKind::Elliptical => between_0_tau(eccentric_anomaly_from_mean(
                between_pm_pi(ma),
                self.eccentricity(),
            )),
            TrajectoryKind::Parabolic => parabolic_anomaly_from_mean(ma),
            TrajectoryKind::Hyperbolic => hyperbolic_anomaly_from_mean(ma, self.eccentricity()),
        }
    }

    fn true_anomaly_at(&self, epoch: Epoch) -> f64 {
        true_anomaly_from_mean(self.mean_anomaly_at(epoch), self.eccentricity())
    }

    /// Returns the first epoch at or after the epoch of this state when the mean anomaly reaches the target.
    fn time_to_mean_anomaly(&self, ma_rad: f64) -> Result<Epoch, AstroError> {
        self.ensure_periodic("compute the time to a mean anomaly")?;
        let delta = between_0_tau(ma_rad - self.mean_anomaly_rad());
        Ok(self.epoch() + (delta / self.mean_motion_rad_s()) * Unit::Second)
    }

    /// Returns the first epoch at or after the epoch of this state when the true anomaly reaches the target.
    fn time_to_true_anomaly(&self, ta_rad: f64) -> Result<Epoch, AstroError> {
        self.ensure_periodic("compute the time to a true anomaly")?;
        self.time_to_mean_anomaly(mean_anomaly_from_true(
            between_0_tau(ta_rad),
            self.eccentricity(),
        ))
    }

    /// Returns the state at the next passage at the provided true anomaly.
    fn state_vector_at_true_anomaly(&self, ta_rad: f64) -> Result<StateVector, AstroError> {
        Ok(self.to_state_vector(self.time_to_true_anomaly(ta_rad)?))
    }

    /// Eccentricity vector, pointing toward periapsis.
    fn eccentricity_vector(&self) -> Vector3<f64> {
        let sv = self.state_vector();
        sv.velocity_m_s.cross(&sv.specific_angular_momentum()) / self.gm() - sv.r_hat()
    }

    /// Direction of periapsis, or the current position direction on a circular orbit.
    fn periapsis_direction(&self) -> Vector3<f64> {
        let evec = self.eccentricity_vector();
        if evec.norm() < ECC_EPSILON {
            self.state_vector().r_hat()
        } else {
            evec.normalize()
        }
    }

    /// Vector from the center of motion to the perigee
    fn perigee_vector(&self) -> Vector3<f64> {
        self.periapsis_direction() * self.periapsis_m()
    }

    /// Vector from the center of motion to the apogee (opposite of the periapsis for open trajectories)
    fn apogee_vector(&self) -> Vector3<f64> {
        let radius = match self.trajectory_kind() {
            TrajectoryKind::Elliptical => self.sma_m() * (1.0 + self.eccentricity()),
            _ => self.periapsis_m(),
        };
        -self.periapsis_direction() * radius
    }

    /// Unit vector toward the ascending node on the equator of the center of motion.
    ///
    /// Equatorial orbits use the X axis of the frame as the line of nodes.
    fn ascending_node_vector(&self) -> Vector3<f64> {
        let pole = pole_in_frame(self.central_body(), self.frame());
        let node = pole.cross(&self.specific_angular_momentum());
        if node.norm() < 1e-12 * self.specific_angular_momentum().norm() {
            Vector3::x()
        } else {
            node.normalize()
        }
    }

    fn velocity_at_perigee_m_s(&self) -> f64 {
        let inv_sma = (1.0 - self.eccentricity()) / self.periapsis_m();
        (self.gm() * (2.0 / self.periapsis_m() - inv_sma)).sqrt()
    }

    fn velocity_at_apogee_m_s(&self) -> Result<f64, AstroError> {
        let ra = self.apoapsis_m()?;
        Ok((self.gm() * (2.0 / ra - 1.0 / self.sma_m())).sqrt())
    }

    /// Sum of the RAAN, the argument of periapsis and the true anomaly, between 0 and 2π
    fn true_longitude_rad(&self) -> f64 {
        between_0_tau(self.raan_rad() + self.aop_rad() + self.true_anomaly_rad())
    }

    fn true_longitude_at(&self, epoch: Epoch) -> f64 {
        between_0_tau(self.raan_rad() + self.aop_rad() + self.true_anomaly_at(epoch))
    }

    /// Sum of the RAAN, the argument of periapsis and the mean anomaly, between 0 and 2π
    fn mean_longitude_rad(&self) -> f64 {
        between_0_tau(self.raan_rad() + self.aop_rad() + self.mean_anomaly_rad())
    }

    /// Fails for trajectories which are not elliptical
    fn ensure_periodic(&self, action: &'static str) -> Result<(), AstroError> {
        let kind = self.trajectory_kind();
        ensure!(
            kind == TrajectoryKind::Elliptical,
            NotPeriodicSnafu {
                action,
                kind,
                ecc: self.eccentricity()
            }
        );
        Ok(())
    }
}

/// Returns the north pole of the body expressed in the provided frame.
pub(crate) fn pole_in_frame(body: &CelestialBody, frame: Frame) -> Vector3<f64> {
    let pole_icrf = body.rotation.pole_direction();
    match frame {
        Frame::ICRF => pole_icrf,
        Frame::EclipticJ2000 => Frame::ecliptic_dcm() * pole_icrf,
        Frame::BodyFixed(_) => Vector3::z(),
    }
}

/// Any orbital state representation.
#[derive(Clone, Debug, PartialEq)]
pub enum OrbitalParameters {
    StateVector(StateVector),
    Conic(ConicElements),
    Equinoctial(EquinoctialElements),
    Tle(TLE),
}

macro_rules! dispatch {
    ($self:ident, $inner:ident => $expr:expr) => {
        match $self {
            OrbitalParameters::StateVector($inner) => $expr,
            OrbitalParameters::Conic($inner) => $expr,
            OrbitalParameters::Equinoctial($inner) => $expr,
            OrbitalParameters::Tle($inner) => $expr,
        }
    };
}

impl TimeTagged for OrbitalParameters {
    fn epoch(&self) -> Epoch {
        dispatch!(self, s => s.epoch())
    }

    fn set_epoch(&mut self, epoch: Epoch) {
        dispatch!(self, s => s.set_epoch(epoch))
    }
}

impl OrbitalState for OrbitalParameters {
    fn central_body(&self) -> &Arc<CelestialBody> {
        dispatch!(self, s => s.central_body())
    }

    fn frame(&self) -> Frame {
        dispatch!(self, s => s.frame())
    }

    fn to_state_vector(&self, epoch: Epoch) -> StateVector {
        dispatch!(self, s => s.to_state_vector(epoch))
    }

    fn eccentricity(&self) -> f64 {
        dispatch!(self, s => s.eccentricity())
    }

    fn sma_m(&self) -> f64 {
        dispatch!(self, s => s.sma_m())
    }

    fn periapsis_m(&self) -> f64 {
        dispatch!(self, s => s.periapsis_m())
    }

    fn inclination_rad(&self) -> f64 {
        dispatch!(self, s => s.inclination_rad())
    }

    fn raan_rad(&self) -> f64 {
        dispatch!(self, s => s.raan_rad())
    }

    fn aop_rad(&self) -> f64 {
        dispatch!(self, s => s.aop_rad())
    }

    fn mean_anomaly_rad(&self) -> f64 {
        dispatch!(self, s => s.mean_anomaly_rad())
    }

    fn true_anomaly_rad(&self) -> f64 {
        dispatch!(self, s => s.true_anomaly_rad())
    }

    fn specific_angular_momentum(&self) -> Vector3<f64> {
        dispatch!(self, s => s.specific_angular_momentum())
    }

    fn specific_energy(&self) -> f64 {
        dispatch!(self, s => s.specific_energy())
    }
}

impl fmt::Display for OrbitalParameters {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        dispatch!(self, s => write!(f, "{s}"))
    }
}

impl From<StateVector> for OrbitalParameters {
    fn from(sv: StateVector) -> Self {
        Self::StateVector(sv)
    }
}

impl From<ConicElements> for OrbitalParameters {
    fn from(conic: ConicElements) -> Self {
        Self::Conic(conic)
    }
}

impl From<EquinoctialElements> for OrbitalParameters {
    fn from(eq: EquinoctialElements) -> Self {
        Self::Equinoctial(eq)
    }
}

impl From<TLE> for OrbitalParameters {
    fn from(tle: TLE) -> Self {
        Self::Tle(tle)
    }
}
