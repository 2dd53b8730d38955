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

use crate::linalg::{Matrix3, Matrix6, Unit, UnitQuaternion, Vector3};
use std::f64::consts::{PI, TAU};

/// Returns the tilde matrix from the provided Vector3, i.e. the matrix such that `tilde(a) * b = a x b`.
pub fn tilde_matrix(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(
        0.0,
        -v[(2, 0)],
        v[(1, 0)],
        v[(2, 0)],
        0.0,
        -v[(0, 0)],
        -v[(1, 0)],
        v[(0, 0)],
        0.0,
    )
}

/// Returns the provided angle bounded between 0.0 and 2π
pub fn between_0_tau(angle: f64) -> f64 {
    let mut bounded = angle % TAU;
    if bounded < 0.0 {
        bounded += TAU;
    }
    bounded
}

/// Returns the provided angle bounded between -π and +π
pub fn between_pm_pi(angle: f64) -> f64 {
    let mut bounded = between_0_tau(angle);
    if bounded > PI {
        bounded -= TAU;
    }
    bounded
}

/// Returns the angle from `a` to `b`, positive when the rotation from `a` to `b` is counter-clockwise
/// around `plane_normal`.
pub fn signed_angle(a: &Vector3<f64>, b: &Vector3<f64>, plane_normal: &Vector3<f64>) -> f64 {
    let angle = a.angle(b);
    if a.cross(b).dot(plane_normal) < 0.0 {
        -angle
    } else {
        angle
    }
}

/// Rotates the vector around the axis by the provided angle (right hand rule).
pub fn rotate_about(v: &Vector3<f64>, axis: &Vector3<f64>, angle: f64) -> Vector3<f64> {
    UnitQuaternion::from_axis_angle(&Unit::new_normalize(*axis), angle) * v
}

/// Returns the quaternion rotating `from` onto `to`, using the identity when the vectors are
/// already aligned and a half turn about any perpendicular axis when they are opposed.
pub fn rotation_between(from: &Vector3<f64>, to: &Vector3<f64>) -> UnitQuaternion<f64> {
    match UnitQuaternion::rotation_between(from, to) {
        Some(q) => q,
        None => {
            if from.dot(to) > 0.0 {
                UnitQuaternion::identity()
            } else {
                let mut axis = from.cross(&Vector3::x());
                if axis.norm() < 1e-12 {
                    axis = from.cross(&Vector3::y());
                }
                UnitQuaternion::from_axis_angle(&Unit::new_normalize(axis), PI)
            }
        }
    }
}

/// Rotation matrix around the X axis (frame rotation, i.e. transposed of the vector rotation)
pub fn r1(angle: f64) -> Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    Matrix3::new(1.0, 0.0, 0.0, 0.0, c, s, 0.0, -s, c)
}

/// Rotation matrix around the Z axis (frame rotation, i.e. transposed of the vector rotation)
pub fn r3(angle: f64) -> Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    Matrix3::new(c, s, 0.0, -s, c, 0.0, 0.0, 0.0, 1.0)
}

/// Inverts a 6x6 state rotation `[[R, 0], [dR, R]]` using the orthogonality of `R`.
pub fn invert_state_dcm(dcm: &Matrix6<f64>) -> Matrix6<f64> {
    let mut rslt = Matrix6::zeros();
    let rot_t = dcm.fixed_view::<3, 3>(0, 0).transpose();
    let rot_dot_t = dcm.fixed_view::<3, 3>(3, 0).transpose();
    rslt.fixed_view_mut::<3, 3>(0, 0).copy_from(&rot_t);
    rslt.fixed_view_mut::<3, 3>(3, 3).copy_from(&rot_t);
    rslt.fixed_view_mut::<3, 3>(3, 0).copy_from(&rot_dot_t);
    rslt
}
