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

/// Remembers the last evaluation of a boolean condition to detect its changes between two points.
///
/// The first evaluation only initializes the trigger and never fires.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FlagTrigger {
    previous: Option<bool>,
}

impl FlagTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once at least one point was evaluated
    pub fn initialized(&self) -> bool {
        self.previous.is_some()
    }

    /// Fires when the condition switches from true to false.
    pub fn falling_edge(&mut self, flag: bool) -> bool {
        let fired = self.previous == Some(true) && !flag;
        self.previous = Some(flag);
        fired
    }

    /// Fires on any change of the condition.
    pub fn toggled(&mut self, flag: bool) -> bool {
        let fired = self.previous.map_or(false, |prev| prev != flag);
        self.previous = Some(flag);
        fired
    }

    /// Fires on every evaluation but the first one.
    pub fn after_first(&mut self) -> bool {
        let fired = self.initialized();
        self.previous = Some(false);
        fired
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}
