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
use crate::cosmic::{OrbitalParameters, OrbitalState, Spacecraft, StateOrientation, StateVector};
use crate::linalg::Vector3;
use crate::md::{InfeasibleSnafu, ManeuverError};
use crate::utils::rotate_about;
use snafu::ensure;
use std::f64::consts::FRAC_PI_2;
use std::fmt;

/// Below this norm of the cross product of the unit normals, the planes are the same
const COPLANAR_EPSILON: f64 = 1e-12;

/// Node between the current and the target orbital planes
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Ascending,
    Descending,
}

/// Rotates the orbital plane onto the plane of the target orbit, at the next crossing of the line of
/// nodes between both planes.
///
/// Successive detections alternate between the ascending and the descending nodes. The speed is kept:
/// the horizontal velocity is rotated about the radial direction by the relative inclination.
#[derive(Clone, Debug)]
pub struct PlaneChange {
    pub target: OrbitalParameters,
    trigger: FlagTrigger,
    node: Option<Node>,
    delta_v_m_s: Option<Vector3<f64>>,
}

impl PlaneChange {
    pub fn new(target: OrbitalParameters) -> Self {
        Self {
            target,
            trigger: FlagTrigger::new(),
            node: None,
            delta_v_m_s: None,
        }
    }

    /// Last node at which the maneuver fired
    pub fn node(&self) -> Option<Node> {
        self.node
    }

    fn target_normal(&self, state: &StateVector) -> Result<Vector3<f64>, ManeuverError> {
        Ok(self
            .target
            .to_state_vector(state.epoch)
            .to_frame(state.frame)?
            .specific_angular_momentum()
            .normalize())
    }

    /// Unit vector toward the ascending node, i.e. the cross product of the target and current plane normals
    pub fn ascending_node(&self, state: &StateVector) -> Result<Vector3<f64>, ManeuverError> {
        let node = self
            .target_normal(state)?
            .cross(&state.specific_angular_momentum().normalize());
        ensure!(
            node.norm() > COPLANAR_EPSILON,
            InfeasibleSnafu {
                details: "current and target orbits are already coplanar"
            }
        );
        Ok(node.normalize())
    }

    /// Dihedral angle between the current and target planes
    pub fn relative_inclination_rad(&self, state: &StateVector) -> Result<f64, ManeuverError> {
        let cos_theta = self
            .target_normal(state)?
            .dot(&state.specific_angular_momentum().normalize());
        Ok(cos_theta.clamp(-1.0, 1.0).acos())
    }
}

impl ManeuverStrategy for PlaneChange {
    fn can_execute(&mut self, state: &StateVector) -> bool {
        let node = match self.ascending_node(state) {
            Ok(node) => node,
            Err(e) => {
                trace!("{self}: {e}");
                return false;
            }
        };
        let along_track = state.specific_angular_momentum().normalize().cross(&state.r_hat());
        let approaching = node.dot(&along_track) > 0.0;
        let crossed = self.trigger.toggled(approaching);
        if crossed {
            // Leaving the "approaching" side means the ascending node was just passed
            self.node = Some(if approaching {
                Node::Descending
            } else {
                Node::Ascending
            });
        }
        crossed
    }

    fn compute_delta_v(
        &mut self,
        _spacecraft: &Spacecraft,
        state: &StateVector,
    ) -> Result<Vector3<f64>, ManeuverError> {
        let node = self.ascending_node(state)?;
        let theta = self.relative_inclination_rad(state)?;
        let r = state.position_m;
        let v_horizontal = state.velocity_m_s - r * (state.velocity_m_s.dot(&r) / r.norm_squared());
        let angle = if r.dot(&node) > 0.0 {
            -(FRAC_PI_2 + theta / 2.0)
        } else {
            FRAC_PI_2 + theta / 2.0
        };
        let delta_v = rotate_about(&v_horizontal.normalize(), &r, angle)
            * (2.0 * v_horizontal.norm() * (theta / 2.0).sin());
        self.delta_v_m_s = Some(delta_v);
        Ok(delta_v)
    }

    fn compute_orientation(
        &self,
        _spacecraft: &Spacecraft,
        state: &StateVector,
    ) -> Result<StateOrientation, ManeuverError> {
        let direction = match self.delta_v_m_s {
            Some(dv) if dv.norm() > f64::EPSILON => dv.normalize(),
            _ => state.specific_angular_momentum().normalize(),
        };
        Ok(StateOrientation::pointing(
            &Spacecraft::FRONT,
            &direction,
            state.epoch,
            state.frame,
        ))
    }
}

impl fmt::Display for PlaneChange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "plane change to inc = {:.3} deg, raan = {:.3} deg",
            self.target.inclination_rad().to_degrees(),
            self.target.raan_rad().to_degrees()
        )
    }
}

#[cfg(test)]
mod ut_plane {
    use super::*;
    use crate::cosmic::{CelestialBody, Frame};
    use crate::errors::ErrorKind;
    use crate::time::Epoch;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn circular(inc_deg: f64, raan_rad: f64, u_deg: f64) -> StateVector {
        StateVector::keplerian(
            CelestialBody::earth(),
            7_000_000.0,
            0.0,
            inc_deg.to_radians(),
            raan_rad,
            0.0,
            u_deg.to_radians(),
            Epoch::from_tdb_seconds(0.0),
            Frame::ICRF,
        )
        .unwrap()
    }

    fn target() -> OrbitalParameters {
        circular(40.0, 0.8, 0.0).into()
    }

    #[test]
    fn alternates_nodes() {
        // The line of nodes is at an argument of latitude of 67.09 deg and 247.09 deg
        let mut mnvr = PlaneChange::new(target());
        assert_relative_eq!(
            mnvr.relative_inclination_rad(&circular(28.5, 0.3, 0.0)).unwrap(),
            19.545203766834486f64.to_radians(),
            max_relative = 1e-12
        );
        let fired: Vec<(bool, Option<Node>)> = [0.0, 60.0, 70.0, 200.0, 240.0, 250.0, 260.0]
            .iter()
            .map(|u| (mnvr.can_execute(&circular(28.5, 0.3, *u)), mnvr.node()))
            .collect();
        assert_eq!(
            fired,
            vec![
                (false, None),
                (false, None),
                (true, Some(Node::Descending)),
                (false, Some(Node::Descending)),
                (false, Some(Node::Descending)),
                (true, Some(Node::Ascending)),
                (false, Some(Node::Ascending)),
            ]
        );
    }

    #[test]
    fn rotates_onto_target_plane() {
        let target_h = target().specific_angular_momentum().normalize();
        for u_deg in [67.09375017678286, 247.09375017678286] {
            let mut mnvr = PlaneChange::new(target());
            let point = circular(28.5, 0.3, u_deg);
            let sc = Spacecraft::new(-1, "sc", 1000.0, 3000.0, point.clone().into()).unwrap();
            let dv = mnvr.compute_delta_v(&sc, &point).unwrap();
            assert_relative_eq!(dv.norm(), 2561.708043224868, max_relative = 1e-9);

            let after = point.with_dv(dv);
            assert_abs_diff_eq!(
                after.specific_angular_momentum().normalize(),
                target_h,
                epsilon = 1e-9
            );
            assert_relative_eq!(after.vmag_m_s(), point.vmag_m_s(), max_relative = 1e-12);

            let attitude = mnvr.compute_orientation(&sc, &point).unwrap();
            assert_abs_diff_eq!(
                attitude.to_reference(&Spacecraft::FRONT),
                dv.normalize(),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn coplanar_target() {
        let mut mnvr = PlaneChange::new(circular(28.5, 0.3, 90.0).into());
        let point = circular(28.5, 0.3, 10.0);
        for _ in 0..3 {
            assert!(!mnvr.can_execute(&point));
        }
        assert_eq!(mnvr.node(), None);
        let sc = Spacecraft::new(-1, "sc", 1000.0, 3000.0, point.clone().into()).unwrap();
        let err = mnvr.compute_delta_v(&sc, &point).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ManeuverInfeasible);

        // Once the planes differ, the first evaluation only initializes the node detection
        mnvr.target = target();
        assert!(!mnvr.can_execute(&circular(28.5, 0.3, 70.0)));
        assert!(mnvr.can_execute(&circular(28.5, 0.3, 250.0)));
    }
}
