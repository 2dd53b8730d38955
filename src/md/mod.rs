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

use crate::cosmic::AstroError;
use crate::errors::ErrorKind;
use crate::io::KernelError;
use crate::time::Window;
use snafu::prelude::*;

/// Impulsive maneuvers and attitudes, driven by the propagator.
pub mod maneuvers;
pub use maneuvers::{
    Maneuver, ManeuverId, ManeuverResult, ManeuverStatus, ManeuverStrategy, PointingTarget,
};

/// Launch windows from a launch site toward a target orbit plane.
pub mod launch;
pub use launch::{
    DaylightFinder, GeometryConstraint, GeometryFinder, Launch, LaunchWindow, OFFICIAL_TWILIGHT_RAD,
};

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ManeuverError {
    #[snafu(display("a maneuver requires at least one engine"))]
    NoEngines,
    #[snafu(display("engine `{serial}` is not on board of {spacecraft}"))]
    UnknownEngine { serial: String, spacecraft: String },
    #[snafu(display("no maneuver with id {id}"))]
    UnknownManeuver { id: usize },
    #[snafu(display("maneuver is not feasible: {details}"))]
    Infeasible { details: String },
    #[snafu(display(
        "not enough delta-v: {required_m_s:.6} m/s required but only {available_m_s:.6} m/s available"
    ))]
    InsufficientDeltaV {
        required_m_s: f64,
        available_m_s: f64,
    },
    #[snafu(display("maneuver computation failed: {source}"))]
    ManeuverAstro { source: AstroError },
    #[snafu(display("invalid maneuver target: {details}"))]
    InvalidTarget { details: String },
    #[snafu(display("no launch window in {window}"))]
    NoLaunchWindow { window: Window },
    #[snafu(display("geometry search failed: {source}"))]
    Geometry { source: KernelError },
}

impl ManeuverError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoEngines | Self::UnknownEngine { .. } | Self::UnknownManeuver { .. } => {
                ErrorKind::Configuration
            }
            Self::Infeasible { .. } | Self::InsufficientDeltaV { .. } | Self::NoLaunchWindow { .. } => {
                ErrorKind::ManeuverInfeasible
            }
            Self::ManeuverAstro { source } => source.kind(),
            Self::InvalidTarget { .. } => ErrorKind::InvalidArgument,
            Self::Geometry { source } => source.kind(),
        }
    }
}

impl From<AstroError> for ManeuverError {
    fn from(source: AstroError) -> Self {
        Self::ManeuverAstro { source }
    }
}
