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

use super::{AstroError, CelestialBody, Frame, InvalidResourceSnafu, StateVector};
use crate::linalg::{Matrix3, Vector3};
use crate::time::Epoch;
use crate::utils::{between_0_tau, between_pm_pi};
use serde_derive::{Deserialize, Serialize};
use snafu::ensure;
use std::f64::consts::TAU;
use std::fmt;
use std::sync::Arc;

/// Planetodetic coordinates with respect to the reference ellipsoid of a body.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Planetodetic {
    pub longitude_rad: f64,
    pub latitude_rad: f64,
    pub altitude_m: f64,
}

impl Planetodetic {
    pub fn new(longitude_rad: f64, latitude_rad: f64, altitude_m: f64) -> Self {
        Self {
            longitude_rad,
            latitude_rad,
            altitude_m,
        }
    }

    /// Position in the body fixed frame of the body.
    /// Reference: G. Xu and Y. Xu, "GPS", DOI 10.1007/978-3-662-50367-6_2, 2016
    pub fn to_body_fixed(&self, body: &CelestialBody) -> Vector3<f64> {
        let flattening = body.flattening();
        let e2 = 2.0 * flattening - flattening.powi(2);
        let (sin_long, cos_long) = self.longitude_rad.sin_cos();
        let (sin_lat, cos_lat) = self.latitude_rad.sin_cos();
        let c_body = body.equatorial_radius_m / (1.0 - e2 * sin_lat.powi(2)).sqrt();
        let s_body = c_body * (1.0 - flattening).powi(2);
        Vector3::new(
            (c_body + self.altitude_m) * cos_lat * cos_long,
            (c_body + self.altitude_m) * cos_lat * sin_long,
            (s_body + self.altitude_m) * sin_lat,
        )
    }

    /// Planetodetic coordinates of a position in the body fixed frame.
    /// Reference: Vallado, 4th Ed., Algorithm 12 page 172.
    pub fn from_body_fixed(position_m: &Vector3<f64>, body: &CelestialBody) -> Self {
        let flattening = body.flattening();
        let e2 = flattening * (2.0 - flattening);
        let r_delta = position_m.x.hypot(position_m.y);
        let longitude_rad = position_m.y.atan2(position_m.x);

        let mut latitude = position_m.z.atan2(r_delta);
        let mut c_body = body.equatorial_radius_m;
        for _ in 0..20 {
            c_body = body.equatorial_radius_m / (1.0 - e2 * latitude.sin().powi(2)).sqrt();
            let new_latitude = (position_m.z + c_body * e2 * latitude.sin()).atan2(r_delta);
            let converged = (latitude - new_latitude).abs() < 1e-12;
            latitude = new_latitude;
            if converged {
                break;
            }
        }

        let altitude_m = if latitude.cos().abs() < 0.1 {
            // Near the poles
            position_m.z / latitude.sin() - c_body * (1.0 - e2)
        } else {
            r_delta / latitude.cos() - c_body
        };

        Self {
            longitude_rad: between_pm_pi(longitude_rad),
            latitude_rad: latitude,
            altitude_m,
        }
    }
}

/// Azimuth (from north, clockwise), elevation above the local horizon and range of a target seen from a site.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HorizontalCoordinates {
    pub azimuth_rad: f64,
    pub elevation_rad: f64,
    pub range_m: f64,
}

/// A ground site on a celestial body.
#[derive(Clone, Debug, PartialEq)]
pub struct Site {
    id: i32,
    pub name: String,
    pub body: Arc<CelestialBody>,
    pub coordinates: Planetodetic,
}

impl Site {
    /// Initializes a new site, its id must be within [0, 1000).
    pub fn new(
        id: i32,
        name: &str,
        body: Arc<CelestialBody>,
        coordinates: Planetodetic,
    ) -> Result<Self, AstroError> {
        ensure!(
            (0..1000).contains(&id),
            InvalidResourceSnafu {
                resource: "site",
                details: format!("id must be within [0, 1000), got {id}")
            }
        );
        ensure!(
            coordinates.latitude_rad.abs() <= std::f64::consts::FRAC_PI_2,
            InvalidResourceSnafu {
                resource: "site",
                details: format!("latitude must be within ±π/2, got {} rad", coordinates.latitude_rad)
            }
        );
        Ok(Self {
            id,
            name: name.to_string(),
            body,
            coordinates,
        })
    }

    /// Identifier of the site, unique across bodies
    pub fn naif_id(&self) -> i32 {
        self.body.id * 1000 + self.id
    }

    pub fn body_fixed_position(&self) -> Vector3<f64> {
        self.coordinates.to_body_fixed(&self.body)
    }

    /// State of the site in the body fixed frame of its body (fixed position, zero velocity)
    pub fn body_fixed_state(&self, epoch: Epoch) -> StateVector {
        StateVector::new(
            self.body.clone(),
            self.body_fixed_position(),
            Vector3::zeros(),
            epoch,
            self.body.body_fixed_frame(),
        )
    }

    /// State of the site in the requested frame, at the provided epoch
    pub fn state_vector(&self, frame: Frame, epoch: Epoch) -> Result<StateVector, AstroError> {
        self.body_fixed_state(epoch).to_frame(frame)
    }

    /// Rotation from the local East-North-Up frame to the body fixed frame
    pub fn enu_to_body_fixed(&self) -> Matrix3<f64> {
        let (sin_long, cos_long) = self.coordinates.longitude_rad.sin_cos();
        let (sin_lat, cos_lat) = self.coordinates.latitude_rad.sin_cos();
        let east = Vector3::new(-sin_long, cos_long, 0.0);
        let north = Vector3::new(-sin_lat * cos_long, -sin_lat * sin_long, cos_lat);
        let up = Vector3::new(cos_lat * cos_long, cos_lat * sin_long, sin_lat);
        Matrix3::from_columns(&[east, north, up])
    }

    /// Azimuth, elevation and range of the target as seen from this site.
    /// The target must be expressed in a frame which can be rotated into the body fixed frame of the site's body.
    pub fn horizontal_coordinates(&self, target: &StateVector) -> Result<HorizontalCoordinates, AstroError> {
        let target_bf = target.to_frame(self.body.body_fixed_frame())?;
        let relative = target_bf.position_m - self.body_fixed_position();
        let enu = self.enu_to_body_fixed().transpose() * relative;
        let range_m = enu.norm();
        Ok(HorizontalCoordinates {
            azimuth_rad: between_0_tau(enu.x.atan2(enu.y)),
            elevation_rad: (enu.z / range_m).asin(),
            range_m,
        })
    }

    /// Angle between the local vertical and the direction of the Sun (incidence angle), with the Sun
    /// direction given in the body fixed frame.
    pub fn sun_incidence_rad(&self, sun_direction_body_fixed: &Vector3<f64>) -> f64 {
        let up = self.enu_to_body_fixed().column(2).into_owned();
        up.angle(sun_direction_body_fixed)
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} ({}) on {}: long. {:.6} deg, lat. {:.6} deg, alt. {:.3} m",
            self.name,
            self.naif_id(),
            self.body.name,
            self.coordinates.longitude_rad.to_degrees(),
            self.coordinates.latitude_rad.to_degrees(),
            self.coordinates.altitude_m
        )
    }
}

/// Range of allowed launch azimuths, from `start_rad` clockwise to `end_rad`
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AzimuthRange {
    pub start_rad: f64,
    pub end_rad: f64,
}

impl AzimuthRange {
    pub fn new(start_rad: f64, end_rad: f64) -> Self {
        Self {
            start_rad: between_0_tau(start_rad),
            end_rad: between_0_tau(end_rad),
        }
    }

    /// Angular span, handling the wrap around north
    pub fn span_rad(&self) -> f64 {
        let span = self.end_rad - self.start_rad;
        if span < 0.0 {
            span + TAU
        } else {
            span
        }
    }

    pub fn contains(&self, azimuth_rad: f64) -> bool {
        let from_start = between_0_tau(azimuth_rad - self.start_rad);
        from_start <= self.span_rad()
    }
}

/// A site from which launches may occur within its allowed azimuth ranges.
#[derive(Clone, Debug, PartialEq)]
pub struct LaunchSite {
    pub site: Site,
    pub azimuths: Vec<AzimuthRange>,
}

impl LaunchSite {
    pub fn new(site: Site) -> Self {
        Self {
            site,
            azimuths: Vec::new(),
        }
    }

    pub fn with_azimuth_range(mut self, range: AzimuthRange) -> Self {
        self.azimuths.push(range);
        self
    }

    /// Returns true if the azimuth can be flown from this site. A site without ranges allows every azimuth.
    pub fn is_azimuth_allowed(&self, azimuth_rad: f64) -> bool {
        self.azimuths.is_empty() || self.azimuths.iter().any(|range| range.contains(azimuth_rad))
    }
}

#[cfg(test)]
mod ut_site {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn kourou() -> Site {
        Site::new(
            1,
            "Kourou",
            CelestialBody::earth(),
            Planetodetic::new(-52.768_f64.to_radians(), 5.232_f64.to_radians(), 14.0),
        )
        .unwrap()
    }

    #[test]
    fn planetodetic_round_trip() {
        let site = kourou();
        let position = site.body_fixed_position();
        let back = Planetodetic::from_body_fixed(&position, &site.body);
        assert_abs_diff_eq!(back.longitude_rad, site.coordinates.longitude_rad, epsilon = 1e-12);
        assert_abs_diff_eq!(back.latitude_rad, site.coordinates.latitude_rad, epsilon = 1e-10);
        assert_abs_diff_eq!(back.altitude_m, 14.0, epsilon = 1e-4);

        let pole = Planetodetic::new(0.3, 1.55, 100.0);
        let back = Planetodetic::from_body_fixed(&pole.to_body_fixed(&site.body), &site.body);
        assert_abs_diff_eq!(back.latitude_rad, 1.55, epsilon = 1e-10);
        assert_abs_diff_eq!(back.altitude_m, 100.0, epsilon = 1e-4);

        assert!(Site::new(1000, "bad", site.body.clone(), site.coordinates).is_err());
        assert_eq!(site.naif_id(), 399_001);
    }

    #[test]
    fn inertial_state_and_horizon() {
        let site = kourou();
        let epoch = Epoch::from_tdb_seconds(3600.0);
        let inertial = site.state_vector(Frame::ICRF, epoch).unwrap();
        assert_abs_diff_eq!(inertial.rmag_m(), site.body_fixed_position().norm(), epsilon = 1e-6);
        // The site moves with the rotation of the Earth
        let expected_speed = site.body.angular_velocity() * site.body_fixed_position().xy().norm();
        assert_abs_diff_eq!(inertial.vmag_m_s(), expected_speed, epsilon = 1e-6);

        // A target straight above the site
        let up = site.enu_to_body_fixed().column(2).into_owned();
        let mut above = site.body_fixed_state(epoch);
        above.position_m += up * 500_000.0;
        let hc = site.horizontal_coordinates(&above).unwrap();
        assert_abs_diff_eq!(hc.elevation_rad, std::f64::consts::FRAC_PI_2, epsilon = 1e-9);
        assert_abs_diff_eq!(hc.range_m, 500_000.0, epsilon = 1e-6);
    }

    #[test]
    fn azimuth_ranges() {
        let launch = LaunchSite::new(kourou())
            .with_azimuth_range(AzimuthRange::new(350.0_f64.to_radians(), 10.0_f64.to_radians()))
            .with_azimuth_range(AzimuthRange::new(1.5, 2.0));
        assert!(launch.is_azimuth_allowed(0.0));
        assert!(launch.is_azimuth_allowed(355.0_f64.to_radians()));
        assert!(launch.is_azimuth_allowed(1.7));
        assert!(!launch.is_azimuth_allowed(1.0));
        assert!(LaunchSite::new(kourou()).is_azimuth_allowed(4.0));
    }
}
