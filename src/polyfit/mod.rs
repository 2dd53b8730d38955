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

use snafu::prelude::*;

pub mod hermite;
pub use hermite::{hermite_eval, HermiteSeries};

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum InterpolationError {
    #[snafu(display("no data to interpolate"))]
    NoInterpolationData,
    #[snafu(display("{xs} abscissas but {ys} values and {derivs} derivatives"))]
    MismatchedLengths { xs: usize, ys: usize, derivs: usize },
    #[snafu(display("abscissa {x} is repeated"))]
    RepeatedAbscissa { x: f64 },
    #[snafu(display("interpolation at {x} is not a number"))]
    InvalidInterpolation { x: f64 },
}
