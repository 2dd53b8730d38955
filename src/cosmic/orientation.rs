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

use super::{Frame, TimeTagged};
use crate::linalg::{UnitQuaternion, Vector3};
use crate::time::Epoch;
use crate::utils::rotation_between;
use std::fmt;

/// Attitude of the spacecraft at an epoch: the rotation from the spacecraft frame to the reference
/// frame and the angular velocity of the spacecraft.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StateOrientation {
    pub orientation: UnitQuaternion<f64>,
    /// in rad/s, expressed in the reference frame
    pub angular_velocity_rad_s: Vector3<f64>,
    pub epoch: Epoch,
    pub frame: Frame,
}

impl StateOrientation {
    pub fn new(
        orientation: UnitQuaternion<f64>,
        angular_velocity_rad_s: Vector3<f64>,
        epoch: Epoch,
        frame: Frame,
    ) -> Self {
        Self {
            orientation,
            angular_velocity_rad_s,
            epoch,
            frame,
        }
    }

    /// Attitude aligning the spacecraft axis `body_axis` with `direction`, without angular velocity.
    pub fn pointing(
        body_axis: &Vector3<f64>,
        direction: &Vector3<f64>,
        epoch: Epoch,
        frame: Frame,
    ) -> Self {
        Self::new(rotation_between(body_axis, direction), Vector3::zeros(), epoch, frame)
    }

    /// Returns the direction of the provided spacecraft axis in the reference frame.
    pub fn to_reference(&self, body_vector: &Vector3<f64>) -> Vector3<f64> {
        self.orientation * body_vector
    }

    /// Spherical linear interpolation between this orientation and the next one, the angular
    /// velocity being interpolated linearly.
    pub fn interpolate(&self, next: &Self, epoch: Epoch) -> Self {
        let span = (next.epoch - self.epoch).to_seconds();
        let t = if span.abs() < f64::EPSILON {
            0.0
        } else {
            ((epoch - self.epoch).to_seconds() / span).clamp(0.0, 1.0)
        };
        let orientation = self
            .orientation
            .try_slerp(&next.orientation, t, 1e-12)
            .unwrap_or(if t < 0.5 { self.orientation } else { next.orientation });
        Self {
            orientation,
            angular_velocity_rad_s: self.angular_velocity_rad_s
                + (next.angular_velocity_rad_s - self.angular_velocity_rad_s) * t,
            epoch,
            frame: self.frame,
        }
    }
}

impl TimeTagged for StateOrientation {
    fn epoch(&self) -> Epoch {
        self.epoch
    }

    fn set_epoch(&mut self, epoch: Epoch) {
        self.epoch = epoch
    }
}

impl fmt::Display for StateOrientation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let q = self.orientation.quaternion();
        write!(
            f,
            "[{}] {}\tq = [{:.9}, {:.9}, {:.9}, {:.9}]\tω = [{:.3e}, {:.3e}, {:.3e}] rad/s",
            self.frame,
            self.epoch,
            q.w,
            q.i,
            q.j,
            q.k,
            self.angular_velocity_rad_s.x,
            self.angular_velocity_rad_s.y,
            self.angular_velocity_rad_s.z
        )
    }
}
