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
use super::{Integrator, PropManeuverSnafu, PropagationError, Trajectory};
use crate::cosmic::{OrbitalState, Spacecraft, StateOrientation, StateVector};
use crate::io::{EphemerisStore, KernelError, OrientationStore};
use crate::md::{Maneuver, ManeuverError, ManeuverId, ManeuverResult, ManeuverStatus};
use crate::time::Window;
use snafu::ResultExt;
use std::fmt;

/// Propagates a spacecraft over a time window with a fixed step integrator, offering each propagated
/// state to the standby maneuver.
///
/// The propagator owns the maneuvers in an arena: they are added with [`Propagator::add_maneuver`] and
/// then referred to by their [`ManeuverId`]. Once the standby maneuver executes, the next maneuver of its
/// chain becomes the standby one and may not execute before the end of the maneuver window of the former.
pub struct Propagator {
    window: Window,
    integrator: Box<dyn Integrator>,
    trajectory: Trajectory,
    maneuvers: Vec<Maneuver>,
    standby: Option<ManeuverId>,
}

impl Propagator {
    pub fn new(spacecraft: Spacecraft, integrator: Box<dyn Integrator>, window: Window) -> Self {
        Self {
            window,
            integrator,
            trajectory: Trajectory::new(spacecraft),
            maneuvers: Vec::new(),
            standby: None,
        }
    }

    pub fn window(&self) -> Window {
        self.window
    }

    pub fn spacecraft(&self) -> &Spacecraft {
        &self.trajectory.spacecraft
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    /// Propagated states, in increasing epoch order
    pub fn states(&self) -> &[StateVector] {
        self.trajectory.states()
    }

    pub fn orientations(&self) -> &[StateOrientation] {
        self.trajectory.orientations()
    }

    /// Validates the maneuver against the spacecraft and moves it in the arena of this propagator.
    pub fn add_maneuver(&mut self, maneuver: Maneuver) -> Result<ManeuverId, PropagationError> {
        maneuver
            .validate(&self.trajectory.spacecraft)
            .context(PropManeuverSnafu)?;
        self.maneuvers.push(maneuver);
        Ok(ManeuverId(self.maneuvers.len() - 1))
    }

    pub fn maneuver(&self, id: ManeuverId) -> Result<&Maneuver, PropagationError> {
        self.maneuvers.get(id.0).ok_or(PropagationError::PropManeuver {
            source: ManeuverError::UnknownManeuver { id: id.0 },
        })
    }

    pub fn maneuvers(&self) -> &[Maneuver] {
        &self.maneuvers
    }

    /// Chains `next` after `id`: it becomes the standby maneuver once `id` has executed.
    pub fn set_next_maneuver(&mut self, id: ManeuverId, next: ManeuverId) -> Result<(), PropagationError> {
        self.maneuver(next)?;
        self.maneuver(id)?;
        self.maneuvers[id.0].next = Some(next);
        Ok(())
    }

    /// Sets the first maneuver to monitor during propagation.
    pub fn set_standby_maneuver(&mut self, id: ManeuverId) -> Result<(), PropagationError> {
        self.maneuver(id)?;
        self.standby = Some(id);
        Ok(())
    }

    pub fn standby_maneuver(&self) -> Option<ManeuverId> {
        self.standby
    }

    /// Propagates over the whole window, executing the maneuvers along the way.
    ///
    /// The last integration step may end after the window end. A maneuver which fails is reported
    /// through its status and clears the standby maneuver, propagation carries on without it.
    pub fn propagate(&mut self) -> Result<(), PropagationError> {
        let start = self.window.start();
        let end = self.window.end();
        info!(
            "propagating {} from {start} to {end} with {}",
            self.trajectory.spacecraft.name, self.integrator
        );

        self.trajectory.clear();
        let initial = self.trajectory.spacecraft.initial_orbit.to_state_vector(start);
        // Back of the spacecraft toward the center of motion
        self.trajectory.add_state_orientation(StateOrientation::pointing(
            &Spacecraft::BACK,
            &-initial.r_hat(),
            start,
            initial.frame,
        ));
        self.trajectory.add_state_vector(initial);

        if let Some(id) = self.standby {
            self.maneuvers[id.0].handle(None);
        }

        while let Some(last) = self.trajectory.last_state().cloned() {
            if last.epoch >= end {
                break;
            }
            if let Some(id) = self.standby {
                self.offer(id, &last);
            }
            // A maneuver may have rewritten the history past the last state
            let from = match self.trajectory.last_state() {
                Some(state) if state.epoch >= end => break,
                Some(state) => state.clone(),
                None => break,
            };
            let next = self
                .integrator
                .integrate(&self.trajectory.spacecraft, &from)?;
            trace!("{next}");
            self.trajectory.add_state_vector(next);
        }

        if let Some(last) = self.trajectory.last_orientation().copied() {
            let mut final_orientation = last;
            final_orientation.epoch = end;
            if last.epoch < end {
                self.trajectory.add_state_orientation(final_orientation);
            }
        }

        for maneuver in &self.maneuvers {
            if maneuver.status() == ManeuverStatus::Monitoring {
                warn!("{maneuver} was not executed before {end}");
            }
        }
        info!(
            "propagation done: {} states, {} orientations",
            self.trajectory.states().len(),
            self.trajectory.orientations().len()
        );
        Ok(())
    }

    /// Offers the state to the standby maneuver and moves the standby along the chain when it executes.
    fn offer(&mut self, id: ManeuverId, state: &StateVector) {
        let maneuver = &mut self.maneuvers[id.0];
        match maneuver.try_execute(state, &mut self.trajectory) {
            ManeuverResult::Executed => {
                let not_before = maneuver.maneuver_window().map(|window| window.end());
                self.standby = maneuver.next();
                if let Some(next) = self.standby {
                    debug!("maneuver {next} on standby after {not_before:?}");
                    self.maneuvers[next.0].handle(not_before);
                }
            }
            ManeuverResult::TooEarly { .. } => {}
            ManeuverResult::Invalid { error } => {
                warn!("{maneuver} dropped: {error}");
                self.standby = None;
            }
        }
    }

    /// Window covered by the orientation history: the propagation window extended by the attitude
    /// windows of the executed maneuvers.
    pub fn orientation_coverage(&self) -> Window {
        self.maneuvers
            .iter()
            .filter_map(|maneuver| maneuver.attitude_window())
            .fold(self.window, |coverage, attitude| coverage.merge(&attitude))
    }

    /// Writes the propagated states to an ephemeris kernel.
    pub fn write_ephemeris(&self, store: &mut dyn EphemerisStore) -> Result<(), KernelError> {
        store.write_data(self.trajectory.states())
    }

    /// Writes the orientation history to an orientation kernel.
    pub fn write_orientations(&self, store: &mut dyn OrientationStore) -> Result<(), KernelError> {
        store.write_data(self.trajectory.orientations())
    }
}

impl fmt::Display for Propagator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "propagator of {} over {} with {} and {} maneuver(s)",
            self.trajectory.spacecraft.name,
            self.window,
            self.integrator,
            self.maneuvers.len()
        )
    }
}
