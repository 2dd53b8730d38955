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

use crate::cosmic::{Spacecraft, StateOrientation, StateVector};
use crate::time::Epoch;

/// The spacecraft being propagated along with its time ordered state and orientation histories.
///
/// Entries are only ever appended in increasing epoch order; truncation is the only deletion.
#[derive(Clone, Debug)]
pub struct Trajectory {
    pub spacecraft: Spacecraft,
    states: Vec<StateVector>,
    orientations: Vec<StateOrientation>,
}

impl Trajectory {
    pub fn new(spacecraft: Spacecraft) -> Self {
        Self {
            spacecraft,
            states: Vec::new(),
            orientations: Vec::new(),
        }
    }

    pub fn states(&self) -> &[StateVector] {
        &self.states
    }

    pub fn orientations(&self) -> &[StateOrientation] {
        &self.orientations
    }

    pub fn last_state(&self) -> Option<&StateVector> {
        self.states.last()
    }

    pub fn last_orientation(&self) -> Option<&StateOrientation> {
        self.orientations.last()
    }

    /// Appends the state if it is strictly after the last state, ignores it otherwise.
    pub fn add_state_vector(&mut self, state: StateVector) -> bool {
        match self.states.last() {
            Some(last) if last.epoch >= state.epoch => {
                trace!("ignoring state at {} (last state at {})", state.epoch, last.epoch);
                false
            }
            _ => {
                self.states.push(state);
                true
            }
        }
    }

    /// Appends the orientation, replacing the last one if the new orientation is not strictly after it.
    pub fn add_state_orientation(&mut self, orientation: StateOrientation) {
        if self
            .orientations
            .last()
            .map_or(false, |last| last.epoch >= orientation.epoch)
        {
            self.orientations.pop();
        }
        self.orientations.push(orientation);
    }

    /// Last state at or before the provided epoch, or None if the epoch precedes the history.
    pub fn find_nearest_lower_state_vector(&self, epoch: Epoch) -> Option<&StateVector> {
        let idx = self.states.partition_point(|state| state.epoch <= epoch);
        if idx == 0 {
            None
        } else {
            Some(&self.states[idx - 1])
        }
    }

    /// Removes every state at or after the provided epoch.
    pub fn erase_data_from_epoch_to_end(&mut self, epoch: Epoch) {
        let idx = self.states.partition_point(|state| state.epoch < epoch);
        self.states.truncate(idx);
    }

    /// Drops both histories, keeping the spacecraft
    pub fn clear(&mut self) {
        self.states.clear();
        self.orientations.clear();
    }

    /// Orientation at the provided epoch, interpolated between the surrounding samples.
    pub fn orientation_at(&self, epoch: Epoch) -> Option<StateOrientation> {
        let idx = self.orientations.partition_point(|so| so.epoch <= epoch);
        if idx == 0 {
            return None;
        }
        let before = &self.orientations[idx - 1];
        match self.orientations.get(idx) {
            Some(after) => Some(before.interpolate(after, epoch)),
            None if before.epoch == epoch => Some(*before),
            None => None,
        }
    }
}
