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

use super::AstroError;
use crate::linalg::{Matrix3, Matrix6};
use crate::utils::r1;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Obliquity of the ecliptic at J2000, in arcseconds (IAU 1976)
pub const OBLIQUITY_J2000_ARCSEC: f64 = 84_381.448;

/// Reference frames in which a state may be expressed.
///
/// Every frame is centered on the center of motion of the state which uses it: the frame only defines
/// the orientation of the axes.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub enum Frame {
    /// International Celestial Reference Frame, the working inertial frame
    ICRF,
    /// Mean ecliptic and equinox of J2000
    EclipticJ2000,
    /// Body fixed frame of the body with this NAIF identifier, rotating with it
    BodyFixed(i32),
}

impl Frame {
    pub fn is_inertial(&self) -> bool {
        !matches!(self, Self::BodyFixed(_))
    }

    /// Rotation from the ICRF to the ecliptic frame.
    pub fn ecliptic_dcm() -> Matrix3<f64> {
        r1((OBLIQUITY_J2000_ARCSEC / 3600.0).to_radians())
    }

    /// State transformation from the ICRF to the ecliptic frame (both are inertial).
    pub fn ecliptic_state_dcm() -> Matrix6<f64> {
        let dcm = Self::ecliptic_dcm();
        let mut rslt = Matrix6::zeros();
        rslt.fixed_view_mut::<3, 3>(0, 0).copy_from(&dcm);
        rslt.fixed_view_mut::<3, 3>(3, 3).copy_from(&dcm);
        rslt
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ICRF => write!(f, "ICRF"),
            Self::EclipticJ2000 => write!(f, "ECLIPJ2000"),
            Self::BodyFixed(id) => write!(f, "IAU_{id}"),
        }
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl FromStr for Frame {
    type Err = AstroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        match name.to_uppercase().as_str() {
            "ICRF" | "J2000" => Ok(Self::ICRF),
            "ECLIPJ2000" => Ok(Self::EclipticJ2000),
            upper => match upper.strip_prefix("IAU_").map(|id| id.parse::<i32>()) {
                Some(Ok(id)) => Ok(Self::BodyFixed(id)),
                _ => Err(AstroError::UnknownFrame {
                    name: name.to_string(),
                }),
            },
        }
    }
}

impl Serialize for Frame {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Frame {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Frame::from_str(&name).map_err(serde::de::Error::custom)
    }
}
