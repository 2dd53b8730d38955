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

use crate::cosmic::AstroError;
use crate::dynamics::DynamicsError;
use crate::io::{ConfigError, KernelError};
use crate::md::ManeuverError;
use crate::propagators::PropagationError;
use crate::window::WindowError;
use snafu::prelude::*;
use std::fmt;

/// Top level error of the crate, wrapping the error of each module.
///
/// Use [`NyxError::kind`] to know which family of failure occurred without matching on every variant.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum NyxError {
    #[snafu(context(false), display("{source}"))]
    Astro { source: AstroError },
    #[snafu(context(false), display("{source}"))]
    Dynamics { source: DynamicsError },
    #[snafu(context(false), display("{source}"))]
    Propagation { source: PropagationError },
    #[snafu(context(false), display("{source}"))]
    Maneuver { source: ManeuverError },
    #[snafu(context(false), display("{source}"))]
    Kernel { source: KernelError },
    #[snafu(context(false), display("{source}"))]
    Config { source: ConfigError },
    #[snafu(context(false), display("{source}"))]
    TimeWindow { source: WindowError },
}

/// The families of errors this crate may return.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed construction parameters: negative capacity, out of range quantities, duplicate identifiers, empty required strings.
    InvalidArgument,
    /// Malformed two-line elements, ephemeris or configuration text.
    Parse,
    /// Kernel or metadata lookup miss.
    MissingData,
    /// Insufficient delta-v or a geometrically unreachable target.
    ManeuverInfeasible,
    /// Fatal setup error, e.g. a maneuver referencing an engine which is not on board.
    Configuration,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::InvalidArgument => "invalid argument",
            Self::Parse => "parse error",
            Self::MissingData => "missing data",
            Self::ManeuverInfeasible => "maneuver infeasible",
            Self::Configuration => "configuration error",
        };
        write!(f, "{name}")
    }
}

impl NyxError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Astro { source } => source.kind(),
            Self::Dynamics { source } => source.kind(),
            Self::Propagation { source } => source.kind(),
            Self::Maneuver { source } => source.kind(),
            Self::Kernel { source } => source.kind(),
            Self::Config { source } => match source {
                ConfigError::ParseError(_) => ErrorKind::Parse,
                ConfigError::ReadError(_) => ErrorKind::MissingData,
                ConfigError::InvalidConfig(_) => ErrorKind::Configuration,
            },
            Self::TimeWindow { .. } => ErrorKind::InvalidArgument,
        }
    }
}

#[cfg(test)]
mod ut_errors {
    use super::*;

    #[test]
    fn kind_follows_source() {
        let err: NyxError = AstroError::UnknownBody { id: 42 }.into();
        assert_eq!(err.kind(), ErrorKind::MissingData);
        assert_eq!(format!("{err}"), "no data for body 42");

        let err: NyxError = ConfigError::InvalidConfig("no tank".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
