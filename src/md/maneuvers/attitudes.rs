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
use crate::cosmic::{OrbitalParameters, OrbitalState, Site, Spacecraft, StateOrientation, StateVector};
use crate::linalg::Vector3;
use crate::md::{InvalidTargetSnafu, ManeuverError};
use snafu::{ensure, OptionExt};
use std::fmt;

/// Object toward which an attitude points.
#[derive(Clone, Debug, PartialEq)]
pub enum PointingTarget {
    /// Another object orbiting the same center of motion
    Orbit(OrbitalParameters),
    /// A site on the center of motion
    Site(Site),
}

impl PointingTarget {
    /// Vector from the spacecraft to the target, in the frame of the state
    pub fn relative_position(&self, state: &StateVector) -> Result<Vector3<f64>, ManeuverError> {
        let target_position = match self {
            Self::Orbit(orbit) => {
                ensure!(
                    orbit.central_body().id == state.center.id,
                    InvalidTargetSnafu {
                        details: format!(
                            "target orbits {} but the spacecraft orbits {}",
                            orbit.central_body().name,
                            state.center.name
                        )
                    }
                );
                orbit.to_state_vector(state.epoch).to_frame(state.frame)?.position_m
            }
            Self::Site(site) => {
                ensure!(
                    site.body.id == state.center.id,
                    InvalidTargetSnafu {
                        details: format!(
                            "site {} is on {} but the spacecraft orbits {}",
                            site.name, site.body.name, state.center.name
                        )
                    }
                );
                site.state_vector(state.frame, state.epoch)?.position_m
            }
        };
        Ok(target_position - state.position_m)
    }
}

impl fmt::Display for PointingTarget {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Orbit(orbit) => write!(f, "object on {orbit}"),
            Self::Site(site) => write!(f, "site {}", site.name),
        }
    }
}

/// The attitudes a spacecraft may hold. Each one aligns the front of the spacecraft, or the boresight
/// of an instrument, with a direction.
#[derive(Clone, Debug, PartialEq)]
pub enum Attitude {
    Prograde,
    Retrograde,
    /// Toward the center of motion
    Nadir,
    Zenith,
    TowardObject(PointingTarget),
    InstrumentPointing { instrument_id: u16, target: PointingTarget },
}

impl Attitude {
    pub fn orientation(
        &self,
        spacecraft: &Spacecraft,
        state: &StateVector,
    ) -> Result<StateOrientation, ManeuverError> {
        let (body_axis, direction) = match self {
            Self::Prograde => (Spacecraft::FRONT, state.v_hat()),
            Self::Retrograde => (Spacecraft::FRONT, -state.v_hat()),
            Self::Nadir => (Spacecraft::FRONT, -state.r_hat()),
            Self::Zenith => (Spacecraft::FRONT, state.r_hat()),
            Self::TowardObject(target) => (Spacecraft::FRONT, target.relative_position(state)?.normalize()),
            Self::InstrumentPointing {
                instrument_id,
                target,
            } => {
                let instrument = spacecraft.instrument(*instrument_id).context(InvalidTargetSnafu {
                    details: format!("instrument {instrument_id} is not on board of {}", spacecraft.name),
                })?;
                (
                    instrument.boresight_in_spacecraft_frame(),
                    target.relative_position(state)?.normalize(),
                )
            }
        };
        Ok(StateOrientation::pointing(
            &body_axis,
            &direction,
            state.epoch,
            state.frame,
        ))
    }
}

impl fmt::Display for Attitude {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Prograde => write!(f, "prograde"),
            Self::Retrograde => write!(f, "retrograde"),
            Self::Nadir => write!(f, "nadir"),
            Self::Zenith => write!(f, "zenith"),
            Self::TowardObject(target) => write!(f, "toward {target}"),
            Self::InstrumentPointing {
                instrument_id,
                target,
            } => write!(f, "instrument {instrument_id} toward {target}"),
        }
    }
}

/// Attitude change without thrust, executable from the second evaluation on.
///
/// Use the attitude hold of the maneuver to keep the attitude over a duration.
#[derive(Clone, Debug)]
pub struct AttitudeHold {
    pub attitude: Attitude,
    trigger: FlagTrigger,
}

impl AttitudeHold {
    pub fn new(attitude: Attitude) -> Self {
        Self {
            attitude,
            trigger: FlagTrigger::new(),
        }
    }
}

impl From<Attitude> for AttitudeHold {
    fn from(attitude: Attitude) -> Self {
        Self::new(attitude)
    }
}

impl ManeuverStrategy for AttitudeHold {
    fn can_execute(&mut self, _state: &StateVector) -> bool {
        self.trigger.after_first()
    }

    fn compute_delta_v(
        &mut self,
        _spacecraft: &Spacecraft,
        _state: &StateVector,
    ) -> Result<Vector3<f64>, ManeuverError> {
        Ok(Vector3::zeros())
    }

    fn compute_orientation(
        &self,
        spacecraft: &Spacecraft,
        state: &StateVector,
    ) -> Result<StateOrientation, ManeuverError> {
        self.attitude.orientation(spacecraft, state)
    }

    fn validate(&self, spacecraft: &Spacecraft) -> Result<(), ManeuverError> {
        if let Attitude::InstrumentPointing { instrument_id, .. } = &self.attitude {
            ensure!(
                spacecraft.instrument(*instrument_id).is_some(),
                InvalidTargetSnafu {
                    details: format!("instrument {instrument_id} is not on board of {}", spacecraft.name)
                }
            );
        }
        Ok(())
    }
}

impl fmt::Display for AttitudeHold {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} attitude", self.attitude)
    }
}
