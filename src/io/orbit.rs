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
use crate::cosmic::{BodyProvider, ConicElements, Frame, OrbitalParameters, OrbitalState, StateVector, TLE};
use crate::io::{epoch_from_str, epoch_to_str, ConfigError, ConfigRepr};
use crate::linalg::Vector3;
use crate::time::Epoch;
use serde::{Deserialize, Serialize};

/// Cartesian state, in meters and meters per second
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CartesianOrbit {
    /// NAIF identifier of the center of motion
    pub center: i32,
    pub frame: Frame,
    #[serde(serialize_with = "epoch_to_str", deserialize_with = "epoch_from_str")]
    pub epoch: Epoch,
    pub x_m: f64,
    pub y_m: f64,
    pub z_m: f64,
    pub vx_m_s: f64,
    pub vy_m_s: f64,
    pub vz_m_s: f64,
}

/// Keplerian elements of an elliptical orbit, angles in degrees
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct KeplerianOrbit {
    pub center: i32,
    pub frame: Frame,
    #[serde(serialize_with = "epoch_to_str", deserialize_with = "epoch_from_str")]
    pub epoch: Epoch,
    pub sma_m: f64,
    pub ecc: f64,
    pub inc_deg: f64,
    pub raan_deg: f64,
    pub aop_deg: f64,
    pub ma_deg: f64,
}

/// Two-line elements, optionally preceded by the name of the object
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TleOrbit {
    #[serde(default)]
    pub name: String,
    pub line1: String,
    pub line2: String,
}

/// Initial orbit of a configuration file: the representation is inferred from the fields present.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum OrbitConfig {
    Cartesian(CartesianOrbit),
    Keplerian(KeplerianOrbit),
    Tle(TleOrbit),
}

impl ConfigRepr for OrbitConfig {}

impl OrbitConfig {
    /// Builds the orbital parameters, fetching the center of motion from the provider.
    pub fn to_parameters(&self, bodies: &dyn BodyProvider) -> Result<OrbitalParameters, ConfigError> {
        Ok(match self {
            Self::Cartesian(cart) => StateVector::new(
                bodies.body(cart.center)?,
                Vector3::new(cart.x_m, cart.y_m, cart.z_m),
                Vector3::new(cart.vx_m_s, cart.vy_m_s, cart.vz_m_s),
                cart.epoch,
                cart.frame,
            )
            .into(),
            Self::Keplerian(kep) => ConicElements::from_sma(
                bodies.body(kep.center)?,
                kep.sma_m,
                kep.ecc,
                kep.inc_deg.to_radians(),
                kep.raan_deg.to_radians(),
                kep.aop_deg.to_radians(),
                kep.ma_deg.to_radians(),
                kep.epoch,
                kep.frame,
            )?
            .into(),
            Self::Tle(tle) => TLE::from_lines(&tle.name, &tle.line1, &tle.line2)?.into(),
        })
    }

    /// Configuration of the provided orbit: TLEs keep their lines, conic elements are written as
    /// Keplerian elements and every other representation as a Cartesian state.
    pub fn from_parameters(orbit: &OrbitalParameters) -> Self {
        match orbit {
            OrbitalParameters::Tle(tle) => {
                let (line1, line2) = tle.lines();
                Self::Tle(TleOrbit {
                    name: tle.name.clone(),
                    line1: line1.to_string(),
                    line2: line2.to_string(),
                })
            }
            OrbitalParameters::Conic(conic) if conic.is_elliptical() => Self::Keplerian(KeplerianOrbit {
                center: conic.center.id,
                frame: conic.frame,
                epoch: conic.epoch,
                sma_m: conic.sma_m(),
                ecc: conic.ecc,
                inc_deg: conic.inc_rad.to_degrees(),
                raan_deg: conic.raan_rad.to_degrees(),
                aop_deg: conic.aop_rad.to_degrees(),
                ma_deg: conic.mean_anomaly_rad.to_degrees(),
            }),
            _ => {
                let sv = orbit.state_vector();
                Self::Cartesian(CartesianOrbit {
                    center: sv.center.id,
                    frame: sv.frame,
                    epoch: sv.epoch,
                    x_m: sv.position_m.x,
                    y_m: sv.position_m.y,
                    z_m: sv.position_m.z,
                    vx_m_s: sv.velocity_m_s.x,
                    vy_m_s: sv.velocity_m_s.y,
                    vz_m_s: sv.velocity_m_s.z,
                })
            }
        }
    }
}
