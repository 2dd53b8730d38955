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

use super::conic::conic_to_cartesian;
use super::{
    true_anomaly_from_mean, AstroError, CelestialBody, Frame, OrbitalState, StateVector,
    TimeTagged, TleParseSnafu,
};
use crate::time::{Epoch, Unit};
use crate::utils::between_0_tau;
use snafu::ensure;
use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Two-line element set.
///
/// The elements are mean elements. Propagation uses a simplified analytic model: Kepler motion with
/// the secular J2 drift of the node, of the argument of perigee and of the mean anomaly, plus the
/// first derivative of the mean motion as a drag term. The resulting states are given in the ICRF.
#[derive(Clone, Debug, PartialEq)]
pub struct TLE {
    pub center: Arc<CelestialBody>,
    /// Name of the object, empty if the set only has two lines
    pub name: String,
    pub satellite_number: u32,
    pub classification: char,
    pub international_designator: String,
    pub epoch: Epoch,
    /// Half of the first derivative of the mean motion, in rad/s^2
    pub mean_motion_dot_2: f64,
    /// Sixth of the second derivative of the mean motion, in rad/s^3
    pub mean_motion_ddot_6: f64,
    /// Drag term, in inverse Earth radii
    pub bstar: f64,
    pub element_set_number: u32,
    pub inc_rad: f64,
    pub raan_rad: f64,
    pub ecc: f64,
    pub aop_rad: f64,
    pub mean_anomaly_rad: f64,
    /// Mean motion, in rad/s
    pub mean_motion_rad_s: f64,
    pub revolution_number: u32,
    lines: [String; 2],
}

/// Returns the trimmed text in the 1-indexed inclusive column range
fn columns(line: &str, first: usize, last: usize) -> &str {
    line.get(first - 1..last).unwrap_or("").trim()
}

fn parse_field<T: FromStr>(line_no: usize, line: &str, first: usize, last: usize, what: &str) -> Result<T, AstroError> {
    let text = columns(line, first, last);
    text.parse::<T>().map_err(|_| AstroError::TleParse {
        line: line_no,
        details: format!("cannot parse {what} from `{text}` (columns {first}-{last})"),
    })
}

/// Parses the fields with an implied leading decimal point and a power of ten exponent, e.g. `-11606-4`.
fn parse_exp_field(line_no: usize, line: &str, first: usize, last: usize, what: &str) -> Result<f64, AstroError> {
    let text = columns(line, first, last);
    let err = || AstroError::TleParse {
        line: line_no,
        details: format!("cannot parse {what} from `{text}` (columns {first}-{last})"),
    };
    if text.len() < 3 {
        return Err(err());
    }
    let (mantissa, exponent) = text.split_at(text.len() - 2);
    let (sign, digits) = match mantissa.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", mantissa.trim_start_matches('+')),
    };
    let mantissa = format!("{sign}0.{digits}").parse::<f64>().map_err(|_| err())?;
    let exponent = exponent.parse::<i32>().map_err(|_| err())?;
    Ok(mantissa * 10_f64.powi(exponent))
}

/// Validates the modulo 10 checksum in the last column of the line.
fn verify_checksum(line_no: usize, line: &str) -> Result<(), AstroError> {
    let sum: u32 = line
        .chars()
        .take(68)
        .map(|c| match c {
            '-' => 1,
            c => c.to_digit(10).unwrap_or(0),
        })
        .sum();
    let expected: u32 = parse_field(line_no, line, 69, 69, "checksum")?;
    ensure!(
        sum % 10 == expected,
        TleParseSnafu {
            line: line_no,
            details: format!("checksum mismatch: computed {} but line says {expected}", sum % 10)
        }
    );
    Ok(())
}

impl TLE {
    /// Parses two or three lines (the first being the name) of a TLE around the Earth.
    pub fn parse(text: &str) -> Result<Self, AstroError> {
        let lines: Vec<&str> = text
            .lines()
            .map(|l| l.trim_end())
            .filter(|l| !l.is_empty())
            .collect();
        match lines.as_slice() {
            [line1, line2] => Self::from_lines("", line1, line2),
            [name, line1, line2] => Self::from_lines(name.trim(), line1, line2),
            _ => Err(AstroError::TleParse {
                line: 0usize,
                details: format!("expected two or three lines, got {}", lines.len()),
            }),
        }
    }

    /// Parses both lines of a TLE around the Earth.
    pub fn from_lines(name: &str, line1: &str, line2: &str) -> Result<Self, AstroError> {
        for (line_no, line) in [(1, line1), (2, line2)] {
            ensure!(
                line.len() == 69,
                TleParseSnafu {
                    line: line_no,
                    details: format!("expected 69 characters, got {}", line.len())
                }
            );
            ensure!(
                line.starts_with(&format!("{line_no} ")),
                TleParseSnafu {
                    line: line_no,
                    details: format!("line must start with `{line_no} `")
                }
            );
            verify_checksum(line_no, line)?;
        }

        let satellite_number: u32 = parse_field(1, line1, 3, 7, "satellite number")?;
        let satellite_number_2: u32 = parse_field(2, line2, 3, 7, "satellite number")?;
        ensure!(
            satellite_number == satellite_number_2,
            TleParseSnafu {
                line: 2usize,
                details: format!("satellite number {satellite_number_2} differs from line 1 ({satellite_number})")
            }
        );
        let classification = columns(line1, 8, 8).chars().next().unwrap_or('U');

        // Epoch: two digit year (57 and after are in the twentieth century) and fractional day of year
        let year: i32 = parse_field(1, line1, 19, 20, "epoch year")?;
        let year = if year < 57 { 2000 + year } else { 1900 + year };
        let day_of_year: f64 = parse_field(1, line1, 21, 32, "epoch day")?;
        let epoch = Epoch::from_gregorian_utc_at_midnight(year, 1, 1)
            + (day_of_year - 1.0) * Unit::Day;

        let rev_per_day = TAU / SECONDS_PER_DAY;
        let ndot_2: f64 = parse_field(1, line1, 34, 43, "first derivative of the mean motion")?;
        let nddot_6 = parse_exp_field(1, line1, 45, 52, "second derivative of the mean motion")?;
        let bstar = parse_exp_field(1, line1, 54, 61, "BSTAR")?;
        let element_set_number: u32 = parse_field(1, line1, 65, 68, "element set number")?;

        let inc_deg: f64 = parse_field(2, line2, 9, 16, "inclination")?;
        let raan_deg: f64 = parse_field(2, line2, 18, 25, "right ascension of the ascending node")?;
        let ecc: f64 = parse_field(2, line2, 27, 33, "eccentricity")
            .and_then(|digits: u32| format!("0.{digits:07}").parse::<f64>().map_err(|_| AstroError::TleParse {
                line: 2usize,
                details: "invalid eccentricity".to_string(),
            }))?;
        let aop_deg: f64 = parse_field(2, line2, 35, 42, "argument of perigee")?;
        let ma_deg: f64 = parse_field(2, line2, 44, 51, "mean anomaly")?;
        let mean_motion: f64 = parse_field(2, line2, 53, 63, "mean motion")?;
        ensure!(
            mean_motion > 0.0,
            TleParseSnafu {
                line: 2usize,
                details: format!("mean motion must be positive, got {mean_motion} rev/day")
            }
        );
        let revolution_number: u32 = parse_field(2, line2, 64, 68, "revolution number")?;

        Ok(Self {
            center: CelestialBody::earth(),
            name: name.to_string(),
            satellite_number,
            classification,
            international_designator: columns(line1, 10, 17).to_string(),
            epoch,
            mean_motion_dot_2: ndot_2 * rev_per_day / SECONDS_PER_DAY,
            mean_motion_ddot_6: nddot_6 * rev_per_day / SECONDS_PER_DAY.powi(2),
            bstar,
            element_set_number,
            inc_rad: inc_deg.to_radians(),
            raan_rad: raan_deg.to_radians(),
            ecc,
            aop_rad: aop_deg.to_radians(),
            mean_anomaly_rad: ma_deg.to_radians(),
            mean_motion_rad_s: mean_motion * rev_per_day,
            revolution_number,
            lines: [line1.to_string(), line2.to_string()],
        })
    }

    /// The raw lines of this TLE
    pub fn lines(&self) -> (&str, &str) {
        (&self.lines[0], &self.lines[1])
    }

    fn sma_from_mean_motion(&self, mean_motion_rad_s: f64) -> f64 {
        (self.gm() / mean_motion_rad_s.powi(2)).cbrt()
    }

    /// Secular rates of the RAAN, the argument of perigee and the mean anomaly due to J2, in rad/s
    pub fn secular_rates(&self) -> (f64, f64, f64) {
        let n = self.mean_motion_rad_s;
        let p = self.sma_from_mean_motion(n) * (1.0 - self.ecc.powi(2));
        let factor = n * self.center.j2 * (self.center.equatorial_radius_m / p).powi(2);
        let cos_inc = self.inc_rad.cos();
        let raan_dot = -1.5 * factor * cos_inc;
        let aop_dot = 0.75 * factor * (5.0 * cos_inc.powi(2) - 1.0);
        let ma_dot =
            n + 0.75 * factor * (1.0 - self.ecc.powi(2)).sqrt() * (3.0 * cos_inc.powi(2) - 1.0);
        (raan_dot, aop_dot, ma_dot)
    }
}

impl FromStr for TLE {
    type Err = AstroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TimeTagged for TLE {
    fn epoch(&self) -> Epoch {
        self.epoch
    }

    fn set_epoch(&mut self, epoch: Epoch) {
        self.epoch = epoch
    }
}

impl OrbitalState for TLE {
    fn central_body(&self) -> &Arc<CelestialBody> {
        &self.center
    }

    fn frame(&self) -> Frame {
        Frame::ICRF
    }

    fn to_state_vector(&self, epoch: Epoch) -> StateVector {
        let dt = (epoch - self.epoch).to_seconds();
        let (raan_dot, aop_dot, ma_dot) = self.secular_rates();
        let mean_motion = self.mean_motion_rad_s + 2.0 * self.mean_motion_dot_2 * dt;
        let ma = self.mean_anomaly_rad + ma_dot * dt + self.mean_motion_dot_2 * dt.powi(2);
        let sma = self.sma_from_mean_motion(mean_motion);
        let ta = true_anomaly_from_mean(between_0_tau(ma), self.ecc);
        let (position_m, velocity_m_s) = conic_to_cartesian(
            self.gm(),
            sma * (1.0 - self.ecc.powi(2)),
            self.ecc,
            self.inc_rad,
            self.raan_rad + raan_dot * dt,
            self.aop_rad + aop_dot * dt,
            ta,
        );
        StateVector::new(self.center.clone(), position_m, velocity_m_s, epoch, Frame::ICRF)
    }

    fn eccentricity(&self) -> f64 {
        self.ecc
    }

    fn sma_m(&self) -> f64 {
        self.sma_from_mean_motion(self.mean_motion_rad_s)
    }

    fn periapsis_m(&self) -> f64 {
        self.sma_m() * (1.0 - self.ecc)
    }

    fn inclination_rad(&self) -> f64 {
        self.inc_rad
    }

    fn raan_rad(&self) -> f64 {
        self.raan_rad
    }

    fn aop_rad(&self) -> f64 {
        self.aop_rad
    }

    fn mean_anomaly_rad(&self) -> f64 {
        self.mean_anomaly_rad
    }

    fn mean_motion_rad_s(&self) -> f64 {
        self.mean_motion_rad_s
    }
}

impl fmt::Display for TLE {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if !self.name.is_empty() {
            writeln!(f, "{}", self.name)?;
        }
        write!(f, "{}\n{}", self.lines[0], self.lines[1])
    }
}

#[cfg(test)]
mod ut_tle {
    use super::*;
    use approx::assert_abs_diff_eq;

    const ISS: &str = "ISS (ZARYA)
1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927
2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

    #[test]
    fn parse_iss() {
        let tle = TLE::parse(ISS).unwrap();
        assert_eq!(tle.name, "ISS (ZARYA)");
        assert_eq!(tle.satellite_number, 25544);
        assert_eq!(tle.classification, 'U');
        assert_eq!(tle.international_designator, "98067A");
        assert_eq!(tle.element_set_number, 292);
        assert_eq!(tle.revolution_number, 56353);
        assert_abs_diff_eq!(tle.ecc, 0.0006703, epsilon = 1e-12);
        assert_abs_diff_eq!(tle.bstar, -0.11606e-4, epsilon = 1e-15);
        assert_abs_diff_eq!(tle.inc_rad, 51.6416_f64.to_radians(), epsilon = 1e-12);

        let (y, m, d, h, min, s, _) = tle.epoch.to_gregorian_utc();
        assert_eq!((y, m, d, h, min, s), (2008, 9, 20, 12, 25, 40));

        let sma = tle.sma_m();
        assert!(sma > 6.7e6 && sma < 6.8e6, "{sma}");
        let sv = tle.state_vector();
        assert_abs_diff_eq!(sv.rmag_m(), sma, epsilon = 10_000.0);
        assert_eq!(format!("{tle}"), ISS);
    }

    #[test]
    fn reject_malformed() {
        let mut lines = ISS.lines().skip(1);
        let line1 = lines.next().unwrap();
        let line2 = lines.next().unwrap();
        // Corrupted checksum
        let bad = format!("{}8", &line1[..68]);
        let err = TLE::from_lines("", &bad, line2).unwrap_err();
        assert!(matches!(err, AstroError::TleParse { line: 1, .. }));
        // Truncated line
        assert!(TLE::from_lines("", line1, &line2[..60]).is_err());
        // Single line
        assert!(TLE::parse(line1).is_err());
    }

    #[test]
    fn secular_drift() {
        let tle = TLE::parse(ISS).unwrap();
        let (raan_dot, aop_dot, _) = tle.secular_rates();
        // ISS regresses by about five degrees per day
        assert_abs_diff_eq!(raan_dot.to_degrees() * 86_400.0, -5.0, epsilon = 0.3);
        assert!(aop_dot > 0.0);
        let later = tle.to_state_vector(tle.epoch + 1.0 * Unit::Day);
        assert_abs_diff_eq!(later.raan_rad(), between_0_tau(tle.raan_rad + raan_dot * 86_400.0), epsilon = 1e-3);
    }
}
