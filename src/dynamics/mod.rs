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

use crate::cosmic::{AstroError, Frame, Spacecraft, StateVector};
use crate::errors::ErrorKind;
use crate::linalg::Vector3;
use snafu::Snafu;

use std::fmt;

/// Gravity models: the point mass of the center of motion and its oblateness.
pub mod gravity;
pub use self::gravity::*;

/// A trait for immutable dynamics that return an acceleration, in m/s^2.
///
/// Force models are composed in the integrator: the accelerations of every model are summed.
pub trait ForceModel: Send + Sync + fmt::Display {
    /// Acceleration applied on the spacecraft at the provided state, expressed in the frame of the state.
    fn apply(&self, spacecraft: &Spacecraft, state: &StateVector) -> Result<Vector3<f64>, DynamicsError>;
}

/// Dynamical model errors.
#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DynamicsError {
    /// Astrodynamics error.
    #[snafu(display("dynamical model encountered an astro error: {source}"))]
    DynamicsAstro { source: AstroError },
    #[snafu(display("{model} is not defined at the center of motion (r = {rmag_m} m)"))]
    Singularity { model: &'static str, rmag_m: f64 },
    #[snafu(display("{model} cannot be evaluated in {frame}"))]
    UnsupportedFrame { model: &'static str, frame: Frame },
}

impl DynamicsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DynamicsAstro { source } => source.kind(),
            _ => ErrorKind::InvalidArgument,
        }
    }
}
