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

use hifitime::{Duration, Epoch, TimeScale};
use snafu::prelude::*;
use std::fmt;

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum WindowError {
    #[snafu(display("window start {start} is after its end {end}"))]
    Reversed { start: Epoch, end: Epoch },
    #[snafu(display("window length must be non-negative, got {length}"))]
    NegativeLength { length: Duration },
}

/// A time window, i.e. an ordered pair of epochs where the start is never after the end.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Window {
    start: Epoch,
    end: Epoch,
}

impl Window {
    /// Builds a new window, fails if `start` is after `end`.
    pub fn new(start: Epoch, end: Epoch) -> Result<Self, WindowError> {
        ensure!(start <= end, ReversedSnafu { start, end });
        Ok(Self { start, end })
    }

    /// Builds a new window starting at `start` and lasting `length`.
    pub fn from_start_and_length(start: Epoch, length: Duration) -> Result<Self, WindowError> {
        ensure!(length >= Duration::ZERO, NegativeLengthSnafu { length });
        Ok(Self {
            start,
            end: start + length,
        })
    }

    /// A window of zero length at the provided epoch.
    pub fn instant(epoch: Epoch) -> Self {
        Self {
            start: epoch,
            end: epoch,
        }
    }

    pub fn start(&self) -> Epoch {
        self.start
    }

    pub fn end(&self) -> Epoch {
        self.end
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }

    /// Returns true if the epoch is within this window, bounds included.
    pub fn contains(&self, epoch: Epoch) -> bool {
        epoch >= self.start && epoch <= self.end
    }

    /// Returns true if both windows share more than a single boundary epoch.
    pub fn intersects(&self, other: &Self) -> bool {
        !(other.start >= self.end || other.end <= self.start)
    }

    /// Returns the common part of both windows, if any.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if !self.intersects(other) {
            return None;
        }
        Some(Self {
            start: if self.start > other.start { self.start } else { other.start },
            end: if self.end < other.end { self.end } else { other.end },
        })
    }

    /// Returns the smallest window covering both windows.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            start: if self.start < other.start { self.start } else { other.start },
            end: if self.end > other.end { self.end } else { other.end },
        }
    }

    /// Shifts both bounds by the provided duration (which may be negative).
    pub fn shift_by(&self, duration: Duration) -> Self {
        Self {
            start: self.start + duration,
            end: self.end + duration,
        }
    }

    /// Returns this window with both bounds expressed in the requested time scale.
    pub fn to_time_scale(&self, ts: TimeScale) -> Self {
        Self {
            start: self.start.to_time_scale(ts),
            end: self.end.to_time_scale(ts),
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{} : {}] ({})", self.start, self.end, self.length())
    }
}

#[cfg(test)]
mod ut_window {
    use super::*;
    use hifitime::Unit;

    fn tdb(seconds: f64) -> Epoch {
        Epoch::from_tdb_seconds(seconds)
    }

    #[test]
    fn window_invariants() {
        assert!(Window::new(tdb(10.0), tdb(5.0)).is_err());
        assert!(Window::from_start_and_length(tdb(10.0), -1.0 * Unit::Second).is_err());

        let w = Window::from_start_and_length(tdb(10.0), 5.0 * Unit::Second).unwrap();
        assert_eq!(w.end(), tdb(15.0));
        assert_eq!(w.length(), 5.0 * Unit::Second);
        assert!(w.contains(tdb(10.0)));
        assert!(w.contains(tdb(15.0)));
        assert!(!w.contains(tdb(15.5)));

        let shifted = w.shift_by(-10.0 * Unit::Second);
        assert_eq!(shifted.start(), tdb(0.0));
        assert_eq!(shifted.length(), w.length());
    }

    #[test]
    fn window_set_operations() {
        let a = Window::new(tdb(0.0), tdb(10.0)).unwrap();
        let b = Window::new(tdb(5.0), tdb(20.0)).unwrap();
        let c = Window::new(tdb(10.0), tdb(20.0)).unwrap();

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert_eq!(a.intersection(&b), Some(Window::new(tdb(5.0), tdb(10.0)).unwrap()));
        assert_eq!(a.intersection(&c), None);
        assert_eq!(a.merge(&c), Window::new(tdb(0.0), tdb(20.0)).unwrap());
    }
}
