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

/*! # nyx-mission

Orbit propagation and maneuver planning for mission design.

The crate propagates a spacecraft over a time window with a fixed step integrator and a set of
force models, and drives a chain of maneuvers (apsis height changes, plane changes, phasing, attitude
holds, ...) which decide at each step whether they must fire, and if so rewrite the propagated
trajectory in place.

All quantities are in SI units (meters, seconds, kilograms, radians) unless the name says otherwise.
*/

/// Provides the propagators (fixed step integrators and the maneuver-aware propagator).
pub mod propagators;

/// Provides the force models used by the numerical integrators.
pub mod dynamics;

/// Provides the celestial bodies, orbital states, orientations and the spacecraft resource model.
pub mod cosmic;

/// Utility functions shared by different modules, and which may be useful to engineers.
pub mod utils;

/// Interpolation helpers used by the kernel stores.
pub mod polyfit;

mod errors;
/// Nyx will (almost) never panic and functions which may fail will return an error.
pub use self::errors::{ErrorKind, NyxError};

/// All the input/output needs for this library: configuration files, ephemeris and orientation kernels.
pub mod io;

/// All of the mission design tools: maneuvers, attitudes and launch windows.
pub mod md;

mod window;

#[macro_use]
extern crate log;
extern crate hifitime;
extern crate nalgebra as na;

/// Re-export of hifitime, along with the time windows
pub mod time {
    pub use crate::window::Window;
    pub use hifitime::*;
}

/// Re-export nalgebra
pub mod linalg {
    pub use na::base::*;
    pub use na::geometry::{Quaternion, Rotation3, UnitQuaternion};
}

/// Re-export some useful things
pub use self::cosmic::{
    CelestialBody, ConicElements, EquinoctialElements, Frame, OrbitalParameters, OrbitalState,
    Spacecraft, StateOrientation, StateVector, TimeTagged, TLE,
};
