/*
    Nyx, blazing fast astrodynamics
    Copyright (C) 2021 Christopher Rabotin <christopher.rabotin@gmail.com>

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
    InterpolationError, InvalidInterpolationSnafu, MismatchedLengthsSnafu, NoInterpolationDataSnafu,
    RepeatedAbscissaSnafu,
};
use snafu::ensure;

/// Hermite interpolating polynomial in its Newton form, built with divided differences on the doubled
/// abscissas (Burden & Faires, Numerical Analysis, algorithm 3.3).
#[derive(Clone, Debug, PartialEq)]
pub struct HermiteSeries {
    /// Each abscissa, twice
    nodes: Vec<f64>,
    /// Diagonal of the divided difference table
    coefficients: Vec<f64>,
}

impl HermiteSeries {
    /// Builds the interpolation of the values and first derivatives at the provided abscissas.
    ///
    /// ```
    /// use nyx_mission::polyfit::HermiteSeries;
    ///
    /// let xs: Vec<_> = (0..8).map(|i| i as f64).collect();
    /// let ys: Vec<_> = xs.iter().map(|x| x.cos()).collect();
    /// let derivs: Vec<_> = xs.iter().map(|x| -x.sin()).collect();
    ///
    /// let series = HermiteSeries::new(&xs, &ys, &derivs).unwrap();
    /// let (value, deriv) = series.eval_n_deriv(3.0);
    /// assert!((value - 3.0_f64.cos()).abs() < 1e-10);
    /// assert!((deriv + 3.0_f64.sin()).abs() < 1e-10);
    /// ```
    pub fn new(xs: &[f64], ys: &[f64], derivs: &[f64]) -> Result<Self, InterpolationError> {
        ensure!(!xs.is_empty(), NoInterpolationDataSnafu);
        ensure!(
            xs.len() == ys.len() && xs.len() == derivs.len(),
            MismatchedLengthsSnafu {
                xs: xs.len(),
                ys: ys.len(),
                derivs: derivs.len()
            }
        );
        for pair in xs.windows(2) {
            ensure!(pair[0] != pair[1], RepeatedAbscissaSnafu { x: pair[1] });
        }

        let size = 2 * xs.len();
        let mut nodes = vec![0.0; size];
        // Column-major table, `table[i + j * size]` is the j-th divided difference ending at node i
        let mut table = vec![0.0; size * size];

        for i in 0..xs.len() {
            nodes[2 * i] = xs[i];
            nodes[2 * i + 1] = xs[i];
            table[2 * i] = ys[i];
            table[2 * i + 1] = ys[i];
            table[2 * i + 1 + size] = derivs[i];
            if i != 0 {
                table[2 * i + size] = (table[2 * i] - table[2 * i - 1]) / (nodes[2 * i] - nodes[2 * i - 1]);
            }
        }

        for i in 2..size {
            for j in 2..=i {
                table[i + j * size] = (table[i + (j - 1) * size] - table[i - 1 + (j - 1) * size])
                    / (nodes[i] - nodes[i - j]);
            }
        }

        let coefficients = (0..size).map(|k| table[k + k * size]).collect();
        Ok(Self {
            nodes,
            coefficients,
        })
    }

    /// Degree of the polynomial
    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Evaluates the polynomial and its first derivative with Horner's scheme on the Newton form.
    pub fn eval_n_deriv(&self, x: f64) -> (f64, f64) {
        let last = self.coefficients.len() - 1;
        let mut value = self.coefficients[last];
        let mut deriv = 0.0;
        for k in (0..last).rev() {
            deriv = deriv * (x - self.nodes[k]) + value;
            value = value * (x - self.nodes[k]) + self.coefficients[k];
        }
        (value, deriv)
    }

    pub fn eval(&self, x: f64) -> f64 {
        self.eval_n_deriv(x).0
    }
}

/// Interpolates the value and the derivative at `x`, failing if the result is not a number.
pub fn hermite_eval(xs: &[f64], ys: &[f64], derivs: &[f64], x: f64) -> Result<(f64, f64), InterpolationError> {
    let (value, deriv) = HermiteSeries::new(xs, ys, derivs)?.eval_n_deriv(x);
    ensure!(
        value.is_finite() && deriv.is_finite(),
        InvalidInterpolationSnafu { x }
    );
    Ok((value, deriv))
}
