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

use super::{AstroError, Frame, UnknownBodySnafu};
use crate::linalg::{Matrix3, Matrix6, Vector3};
use crate::time::{Duration, Epoch, Unit};
use crate::utils::{invert_state_dcm, r1, r3, tilde_matrix};
use lazy_static::lazy_static;
use snafu::OptionExt;
use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_2, TAU};
use std::fmt;
use std::sync::Arc;

/// NAIF identifier of the solar system barycenter
pub const SSB_ID: i32 = 0;
/// NAIF identifier of the Sun
pub const SUN_ID: i32 = 10;
/// NAIF identifier of the Earth Moon barycenter
pub const EMB_ID: i32 = 3;
/// NAIF identifier of the Earth
pub const EARTH_ID: i32 = 399;
/// NAIF identifier of the Moon
pub const MOON_ID: i32 = 301;

/// Seconds in a Julian day, used by the rotation model rates.
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Uniform rotation model of a body, following the IAU report conventions without the
/// precession and nutation terms.
///
/// The pole is fixed in the inertial frame and the prime meridian rotates at a constant rate from
/// its angle at J2000 TDB.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RotationModel {
    /// Right ascension of the north pole, in radians
    pub pole_ra_rad: f64,
    /// Declination of the north pole, in radians
    pub pole_dec_rad: f64,
    /// Prime meridian angle at J2000 TDB, in radians
    pub prime_meridian_rad: f64,
    /// Prime meridian rate, in radians per second
    pub rate_rad_s: f64,
}

impl RotationModel {
    /// Builds a rotation model from the IAU degree values, the rate being in degrees per day.
    pub fn from_iau_deg(pole_ra_deg: f64, pole_dec_deg: f64, w0_deg: f64, wdot_deg_day: f64) -> Self {
        Self {
            pole_ra_rad: pole_ra_deg.to_radians(),
            pole_dec_rad: pole_dec_deg.to_radians(),
            prime_meridian_rad: w0_deg.to_radians(),
            rate_rad_s: wdot_deg_day.to_radians() / SECONDS_PER_DAY,
        }
    }

    /// A body which does not rotate with respect to the inertial frame.
    pub fn inertial() -> Self {
        Self {
            pole_ra_rad: 0.0,
            pole_dec_rad: FRAC_PI_2,
            prime_meridian_rad: 0.0,
            rate_rad_s: 0.0,
        }
    }

    /// Prime meridian angle at the provided epoch
    pub fn prime_meridian_at(&self, epoch: Epoch) -> f64 {
        self.prime_meridian_rad + self.rate_rad_s * epoch.to_tdb_seconds()
    }

    /// Direction cosine matrix from the inertial frame to the body fixed frame at the provided epoch.
    pub fn dcm_to_body_fixed(&self, epoch: Epoch) -> Matrix3<f64> {
        r3(self.prime_meridian_at(epoch))
            * r1(FRAC_PI_2 - self.pole_dec_rad)
            * r3(FRAC_PI_2 + self.pole_ra_rad)
    }

    /// Unit vector of the north pole, in the inertial frame.
    pub fn pole_direction(&self) -> Vector3<f64> {
        let (sin_dec, cos_dec) = self.pole_dec_rad.sin_cos();
        let (sin_ra, cos_ra) = self.pole_ra_rad.sin_cos();
        Vector3::new(cos_dec * cos_ra, cos_dec * sin_ra, sin_dec)
    }

    /// Angular velocity of the body fixed frame, expressed in the body fixed frame.
    pub fn angular_velocity(&self) -> Vector3<f64> {
        Vector3::new(0.0, 0.0, self.rate_rad_s)
    }

    /// Returns the 6x6 state transformation from the inertial frame to the body fixed frame.
    pub fn state_dcm_to_body_fixed(&self, epoch: Epoch) -> Matrix6<f64> {
        let dcm = self.dcm_to_body_fixed(epoch);
        let dcm_dot = -tilde_matrix(&self.angular_velocity()) * dcm;
        let mut rslt = Matrix6::zeros();
        rslt.fixed_view_mut::<3, 3>(0, 0).copy_from(&dcm);
        rslt.fixed_view_mut::<3, 3>(3, 3).copy_from(&dcm);
        rslt.fixed_view_mut::<3, 3>(3, 0).copy_from(&dcm_dot);
        rslt
    }
}

/// A celestial body: mass parameter, shape, zonal harmonics and rotation.
///
/// Bodies are immutable once built and are shared between orbital states through an `Arc`.
#[derive(Clone, Debug, PartialEq)]
pub struct CelestialBody {
    /// NAIF identifier
    pub id: i32,
    pub name: String,
    /// Gravitational parameter, in m^3/s^2
    pub gm_m3_s2: f64,
    /// Equatorial radius, in meters
    pub equatorial_radius_m: f64,
    /// Polar radius, in meters
    pub polar_radius_m: f64,
    pub j2: f64,
    pub j3: f64,
    pub j4: f64,
    /// Identifier of the body this body orbits, if any
    pub parent_id: Option<i32>,
    pub rotation: RotationModel,
}

impl CelestialBody {
    /// Initializes a spherical body without zonal harmonics which does not rotate.
    pub fn point_mass(id: i32, name: &str, gm_m3_s2: f64, radius_m: f64) -> Self {
        Self {
            id,
            name: name.to_string(),
            gm_m3_s2,
            equatorial_radius_m: radius_m,
            polar_radius_m: radius_m,
            j2: 0.0,
            j3: 0.0,
            j4: 0.0,
            parent_id: None,
            rotation: RotationModel::inertial(),
        }
    }

    pub fn with_parent(mut self, parent_id: i32) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_zonals(mut self, j2: f64, j3: f64, j4: f64) -> Self {
        self.j2 = j2;
        self.j3 = j3;
        self.j4 = j4;
        self
    }

    pub fn with_rotation(mut self, rotation: RotationModel) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_polar_radius(mut self, polar_radius_m: f64) -> Self {
        self.polar_radius_m = polar_radius_m;
        self
    }

    /// Returns the Earth from the default catalog
    pub fn earth() -> Arc<Self> {
        default_body(EARTH_ID)
    }

    /// Returns the Moon from the default catalog
    pub fn moon() -> Arc<Self> {
        default_body(MOON_ID)
    }

    /// Returns the Sun from the default catalog
    pub fn sun() -> Arc<Self> {
        default_body(SUN_ID)
    }

    /// Flattening of the reference ellipsoid
    pub fn flattening(&self) -> f64 {
        (self.equatorial_radius_m - self.polar_radius_m) / self.equatorial_radius_m
    }

    /// The inertial frame centered on this body
    pub fn inertial_frame(&self) -> Frame {
        Frame::ICRF
    }

    /// The body fixed frame of this body
    pub fn body_fixed_frame(&self) -> Frame {
        Frame::BodyFixed(self.id)
    }

    /// Angular velocity of the body around its pole, in radians per second
    pub fn angular_velocity(&self) -> f64 {
        self.rotation.rate_rad_s
    }

    /// Duration of one rotation of the body with respect to the inertial frame
    pub fn sidereal_rotation_period(&self) -> Duration {
        if self.rotation.rate_rad_s.abs() < f64::EPSILON {
            return Duration::MAX;
        }
        (TAU / self.rotation.rate_rad_s.abs()) * Unit::Second
    }
}

impl fmt::Display for CelestialBody {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({}, μ = {:e} m^3/s^2)", self.name, self.id, self.gm_m3_s2)
    }
}

/// Provides body constants and frame transformations, given a NAIF identifier.
///
/// This is the interface to the ephemeris and frame metadata provider: anything able to supply these
/// constants (e.g. planetary constant kernels) can back the propagation.
pub trait BodyProvider: Send + Sync {
    /// Returns the body with the provided identifier
    fn body(&self, id: i32) -> Result<Arc<CelestialBody>, AstroError>;

    /// Returns the 6x6 state transformation matrix converting a state from `from` to `to` at the epoch.
    fn state_transformation(
        &self,
        from: Frame,
        to: Frame,
        epoch: Epoch,
    ) -> Result<Matrix6<f64>, AstroError> {
        let to_inertial = match from {
            Frame::ICRF => Matrix6::identity(),
            Frame::EclipticJ2000 => invert_state_dcm(&Frame::ecliptic_state_dcm()),
            Frame::BodyFixed(id) => {
                invert_state_dcm(&self.body(id)?.rotation.state_dcm_to_body_fixed(epoch))
            }
        };
        let from_inertial = match to {
            Frame::ICRF => Matrix6::identity(),
            Frame::EclipticJ2000 => Frame::ecliptic_state_dcm(),
            Frame::BodyFixed(id) => self.body(id)?.rotation.state_dcm_to_body_fixed(epoch),
        };
        Ok(from_inertial * to_inertial)
    }
}

/// An in-memory catalog of celestial bodies, indexed by their NAIF identifier.
#[derive(Clone, Debug, Default)]
pub struct BodyCatalog {
    bodies: BTreeMap<i32, Arc<CelestialBody>>,
}

impl BodyCatalog {
    /// Initializes an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Sun, Earth Moon barycenter, Earth and Moon, with the IAU 2009 rotation constants and the
    /// planetary constants of the `pck00010` kernel.
    pub fn solar_system() -> Self {
        let mut me = Self::new();
        let sun = CelestialBody::point_mass(SUN_ID, "Sun", 1.327_124_400_419_393_8e20, 696_000_000.0)
            .with_parent(SSB_ID)
            .with_rotation(RotationModel::from_iau_deg(286.13, 63.87, 84.176, 14.184_000_0));
        let ssb = CelestialBody::point_mass(SSB_ID, "Solar System Barycenter", sun.gm_m3_s2, 0.0);
        let earth = CelestialBody::point_mass(EARTH_ID, "Earth", 3.986_004_354_36e14, 6_378_136.6)
            .with_polar_radius(6_356_751.9)
            .with_zonals(1.082_616e-3, -2.538_81e-6, -1.655_97e-6)
            .with_parent(EMB_ID)
            .with_rotation(RotationModel::from_iau_deg(0.0, 90.0, 190.147, 360.985_623_5));
        let moon = CelestialBody::point_mass(MOON_ID, "Moon", 4.902_800_066e12, 1_737_400.0)
            .with_zonals(2.032_156_846_495_257e-4, 8.475_9e-6, -9.591_9e-6)
            .with_parent(EMB_ID)
            .with_rotation(RotationModel::from_iau_deg(269.9949, 66.5392, 38.3213, 13.176_358_15));
        let emb = CelestialBody::point_mass(
            EMB_ID,
            "Earth Moon Barycenter",
            earth.gm_m3_s2 + moon.gm_m3_s2,
            0.0,
        )
        .with_parent(SUN_ID);

        for body in [ssb, sun, emb, earth, moon] {
            me.insert(body);
        }
        me
    }

    /// Adds (or replaces) a body in this catalog
    pub fn insert(&mut self, body: CelestialBody) -> Arc<CelestialBody> {
        let body = Arc::new(body);
        self.bodies.insert(body.id, body.clone());
        body
    }

    /// Returns the chain of parents of the provided body, closest first, up to the root.
    pub fn ancestors(&self, id: i32) -> Result<Vec<Arc<CelestialBody>>, AstroError> {
        let mut chain = Vec::new();
        let mut current = self.body(id)?;
        while let Some(parent_id) = current.parent_id {
            // Guard against ill-formed catalogs which would loop forever
            if chain.len() > self.bodies.len() {
                break;
            }
            current = self.body(parent_id)?;
            chain.push(current.clone());
        }
        Ok(chain)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

impl BodyProvider for BodyCatalog {
    fn body(&self, id: i32) -> Result<Arc<CelestialBody>, AstroError> {
        self.bodies
            .get(&id)
            .cloned()
            .context(UnknownBodySnafu { id })
    }
}

lazy_static! {
    /// Default catalog used by the convenience constructors of [`CelestialBody`].
    pub static ref DEFAULT_CATALOG: BodyCatalog = BodyCatalog::solar_system();
}

fn default_body(id: i32) -> Arc<CelestialBody> {
    match DEFAULT_CATALOG.body(id) {
        Ok(body) => body,
        // The default catalog is built in, so this only occurs if it was built without this body.
        Err(_) => Arc::new(CelestialBody::point_mass(id, "Unknown", 0.0, 0.0)),
    }
}
