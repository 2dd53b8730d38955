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
use super::{GeometrySnafu, InvalidTargetSnafu, ManeuverError, NoLaunchWindowSnafu};
use crate::cosmic::{Frame, LaunchSite, OrbitalParameters, OrbitalState, Site};
use crate::io::{Aberration, EphemerisStore};
use crate::linalg::Vector3;
use crate::time::{Duration, Epoch, Unit, Window};
use crate::utils::between_0_tau;
use snafu::{ensure, ResultExt};
use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;

/// Official twilight: the Sun center is 0.8333 deg below the horizon (refraction and solar radius).
pub const OFFICIAL_TWILIGHT_RAD: f64 = 0.014_543_828_656_868_749;

/// NAIF identifier of the Sun
const SUN_ID: i32 = 10;

/// Longest step of the plane crossing search
const MAX_CROSSING_STEP_S: f64 = 3_600.0;

/// Plane crossings and illumination boundaries are refined until the bracket is shorter than this
const CROSSING_PRECISION_S: f64 = 1.0;
const BOUNDARY_PRECISION_S: f64 = 1e-3;

/// A geometric condition on a site, evaluated over a search window.
#[derive(Clone, Debug, PartialEq)]
pub enum GeometryConstraint {
    /// The Sun is above the horizon, lowered by the twilight angle
    Daylight { site: Site, twilight_rad: f64 },
    Night { site: Site, twilight_rad: f64 },
}

impl GeometryConstraint {
    pub fn site(&self) -> &Site {
        match self {
            Self::Daylight { site, .. } | Self::Night { site, .. } => site,
        }
    }

    /// Returns whether the constraint holds for the Sun incidence at the site
    pub fn is_satisfied(&self, incidence_rad: f64) -> bool {
        match self {
            Self::Daylight { twilight_rad, .. } => incidence_rad < FRAC_PI_2 - twilight_rad,
            Self::Night { twilight_rad, .. } => incidence_rad > FRAC_PI_2 - twilight_rad,
        }
    }
}

impl fmt::Display for GeometryConstraint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Daylight { site, .. } => write!(f, "daylight at {}", site.name),
            Self::Night { site, .. } => write!(f, "night at {}", site.name),
        }
    }
}

/// Finds the sub-windows of a search window during which a geometric constraint holds.
pub trait GeometryFinder: Send + Sync {
    /// Returns the windows satisfying the constraint, in increasing order.
    fn find_windows(
        &self,
        search: Window,
        constraint: &GeometryConstraint,
    ) -> Result<Vec<Window>, ManeuverError>;
}

/// Illumination finder using the ephemeris of the Sun around the body of the sites.
///
/// The incidence is sampled every `step`, and each change of the constraint is refined by bisection.
/// Illumination periods shorter than the step may be missed.
pub struct DaylightFinder<'a> {
    pub sun: &'a dyn EphemerisStore,
    pub step: Duration,
}

impl<'a> DaylightFinder<'a> {
    pub fn new(sun: &'a dyn EphemerisStore, step: Duration) -> Result<Self, ManeuverError> {
        ensure!(
            sun.object_id() == SUN_ID,
            InvalidTargetSnafu {
                details: format!("illumination requires the Sun ephemeris, got object {}", sun.object_id())
            }
        );
        ensure!(
            step > Duration::ZERO,
            InvalidTargetSnafu {
                details: format!("search step must be positive, got {step}")
            }
        );
        Ok(Self { sun, step })
    }

    /// Angle between the local vertical of the site and the direction of the Sun.
    pub fn incidence_rad(&self, site: &Site, epoch: Epoch) -> Result<f64, ManeuverError> {
        let sun = self
            .sun
            .read_at(epoch, site.body.body_fixed_frame(), Aberration::None, site.body.id)
            .context(GeometrySnafu)?;
        let direction = sun.position_m - site.body_fixed_position();
        Ok(site.sun_incidence_rad(&direction))
    }

    /// Bisects between an epoch where the constraint is `satisfied` and one where it is not, returning
    /// the tightest bracket.
    fn refine(
        &self,
        constraint: &GeometryConstraint,
        mut before: Epoch,
        mut after: Epoch,
        satisfied: bool,
    ) -> Result<(Epoch, Epoch), ManeuverError> {
        while (after - before).to_seconds() > BOUNDARY_PRECISION_S {
            let mid = before + (after - before) * 0.5;
            if constraint.is_satisfied(self.incidence_rad(constraint.site(), mid)?) == satisfied {
                before = mid;
            } else {
                after = mid;
            }
        }
        Ok((before, after))
    }
}

impl<'a> GeometryFinder for DaylightFinder<'a> {
    fn find_windows(
        &self,
        search: Window,
        constraint: &GeometryConstraint,
    ) -> Result<Vec<Window>, ManeuverError> {
        let site = constraint.site();
        let mut windows = Vec::new();
        let mut epoch = search.start();
        let mut satisfied = constraint.is_satisfied(self.incidence_rad(site, epoch)?);
        let mut opened = satisfied.then_some(epoch);

        while epoch < search.end() {
            let next = if epoch + self.step > search.end() {
                search.end()
            } else {
                epoch + self.step
            };
            let now = constraint.is_satisfied(self.incidence_rad(site, next)?);
            if now != satisfied {
                let (before, after) = self.refine(constraint, epoch, next, satisfied)?;
                if now {
                    opened = Some(after);
                } else if let Some(window) = opened.take().and_then(|start| Window::new(start, before).ok()) {
                    windows.push(window);
                }
                satisfied = now;
            }
            epoch = next;
        }
        if let Some(window) = opened.and_then(|start| Window::new(start, search.end()).ok()) {
            windows.push(window);
        }
        debug!("{} window(s) of {constraint} in {search}", windows.len());
        Ok(windows)
    }
}

/// An instant at which the launch site crosses the plane of the target orbit.
#[derive(Clone, Debug, PartialEq)]
pub struct LaunchWindow {
    pub launch_site: LaunchSite,
    pub window: Window,
    /// Northerly launch, toward the ascending node of the target
    pub ascending: bool,
    pub inertial_azimuth_rad: f64,
    pub non_inertial_azimuth_rad: f64,
    pub inertial_insertion_velocity_m_s: f64,
    pub non_inertial_insertion_velocity_m_s: f64,
}

impl fmt::Display for LaunchWindow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} launch from {} at {}: azimuth {:.3} deg (inertial {:.3} deg), insertion at {:.3} m/s (inertial {:.3} m/s)",
            if self.ascending { "ascending" } else { "descending" },
            self.launch_site.site.name,
            self.window.start(),
            self.non_inertial_azimuth_rad.to_degrees(),
            self.inertial_azimuth_rad.to_degrees(),
            self.non_inertial_insertion_velocity_m_s,
            self.inertial_insertion_velocity_m_s
        )
    }
}

/// Launch from a site directly into the plane of a target orbit, inserting at its periapsis velocity.
///
/// Launches occur when the rotation of the body brings the site into the target plane, twice per
/// sidereal rotation: once heading toward the ascending node of the target and once toward its
/// descending node.
#[derive(Clone, Debug)]
pub struct Launch {
    pub launch_site: LaunchSite,
    pub recovery_site: Site,
    pub launch_by_day: bool,
    pub twilight_rad: f64,
    target: OrbitalParameters,
    /// Unit angular momentum of the target, in the inertial frame
    target_normal: Vector3<f64>,
    ascending_node: Vector3<f64>,
    inclination_rad: f64,
    delta_l_rad: f64,
}

impl Launch {
    pub fn new(
        launch_site: LaunchSite,
        recovery_site: Site,
        launch_by_day: bool,
        target: OrbitalParameters,
    ) -> Result<Self, ManeuverError> {
        let body = launch_site.site.body.clone();
        ensure!(
            target.central_body().id == body.id && recovery_site.body.id == body.id,
            InvalidTargetSnafu {
                details: format!(
                    "launch from {} requires the target and the recovery site on the same body, got {} and {}",
                    body.name,
                    target.central_body().name,
                    recovery_site.body.name
                )
            }
        );

        let target_normal = target
            .state_vector()
            .to_frame(Frame::ICRF)?
            .specific_angular_momentum()
            .normalize();
        let pole = body.rotation.pole_direction();
        let inclination_rad = target_normal.angle(&pole);
        let node = pole.cross(&target_normal);
        ensure!(
            node.norm() > 1e-12,
            InvalidTargetSnafu {
                details: "an equatorial target orbit has no line of nodes"
            }
        );

        let latitude_rad = launch_site.site.coordinates.latitude_rad;
        ensure!(
            latitude_rad.abs() <= inclination_rad.min(PI - inclination_rad),
            InvalidTargetSnafu {
                details: format!(
                    "{} at latitude {:.3} deg never crosses a plane inclined by {:.3} deg",
                    launch_site.site.name,
                    latitude_rad.to_degrees(),
                    inclination_rad.to_degrees()
                )
            }
        );

        let position = launch_site.site.body_fixed_position();
        let geocentric_latitude_rad = position.z.atan2(position.x.hypot(position.y));
        let delta_l_rad = (geocentric_latitude_rad.tan() / inclination_rad.tan()).asin();

        Ok(Self {
            launch_site,
            recovery_site,
            launch_by_day,
            twilight_rad: OFFICIAL_TWILIGHT_RAD,
            target,
            target_normal,
            ascending_node: node.normalize(),
            inclination_rad,
            delta_l_rad,
        })
    }

    /// Overrides the twilight angle used for the daylight constraints.
    pub fn with_twilight(mut self, twilight_rad: f64) -> Self {
        self.twilight_rad = twilight_rad;
        self
    }

    pub fn target(&self) -> &OrbitalParameters {
        &self.target
    }

    /// Inclination of the target plane on the equator of the body
    pub fn inclination_rad(&self) -> f64 {
        self.inclination_rad
    }

    /// Angle along the parallel of the site between its plane crossing and the line of nodes
    pub fn delta_l_rad(&self) -> f64 {
        self.delta_l_rad
    }

    pub fn inertial_ascending_azimuth_rad(&self) -> f64 {
        let latitude_rad = self.launch_site.site.coordinates.latitude_rad;
        between_0_tau((self.inclination_rad.cos() / latitude_rad.cos()).clamp(-1.0, 1.0).asin())
    }

    pub fn inertial_descending_azimuth_rad(&self) -> f64 {
        between_0_tau(PI - self.inertial_ascending_azimuth_rad())
    }

    pub fn inertial_insertion_velocity_m_s(&self) -> f64 {
        self.target.velocity_at_perigee_m_s()
    }

    /// Speed of the launch site due to the rotation of its body
    pub fn site_rotation_speed_m_s(&self) -> f64 {
        let position = self.launch_site.site.body_fixed_position();
        self.launch_site.site.body.angular_velocity() * position.x.hypot(position.y)
    }

    /// Components (east, north) of the insertion velocity relative to the rotating site
    fn relative_insertion_velocity(&self) -> (f64, f64) {
        let velocity = self.inertial_insertion_velocity_m_s();
        let azimuth = self.inertial_ascending_azimuth_rad();
        (
            velocity * azimuth.sin() - self.site_rotation_speed_m_s(),
            velocity * azimuth.cos(),
        )
    }

    pub fn non_inertial_ascending_azimuth_rad(&self) -> f64 {
        let (east, north) = self.relative_insertion_velocity();
        between_0_tau(east.atan2(north))
    }

    pub fn non_inertial_descending_azimuth_rad(&self) -> f64 {
        between_0_tau(PI - self.non_inertial_ascending_azimuth_rad())
    }

    pub fn non_inertial_insertion_velocity_m_s(&self) -> f64 {
        let (east, north) = self.relative_insertion_velocity();
        east.hypot(north)
    }

    fn window_at(&self, epoch: Epoch, ascending: bool) -> LaunchWindow {
        let (inertial_azimuth_rad, non_inertial_azimuth_rad) = if ascending {
            (
                self.inertial_ascending_azimuth_rad(),
                self.non_inertial_ascending_azimuth_rad(),
            )
        } else {
            (
                self.inertial_descending_azimuth_rad(),
                self.non_inertial_descending_azimuth_rad(),
            )
        };
        LaunchWindow {
            launch_site: self.launch_site.clone(),
            window: Window::instant(epoch),
            ascending,
            inertial_azimuth_rad,
            non_inertial_azimuth_rad,
            inertial_insertion_velocity_m_s: self.inertial_insertion_velocity_m_s(),
            non_inertial_insertion_velocity_m_s: self.non_inertial_insertion_velocity_m_s(),
        }
    }

    fn site_position(&self, epoch: Epoch) -> Result<Vector3<f64>, ManeuverError> {
        Ok(self
            .launch_site
            .site
            .state_vector(Frame::ICRF, epoch)?
            .position_m)
    }

    /// Returns every crossing of the target plane by the launch site within the search window.
    ///
    /// The first crossing is found by stepping through the window and halving the step, reversed, at
    /// each side change. The following ones alternate between the ascending and the descending
    /// crossings, half a sidereal rotation apart and corrected by the angle to the line of nodes.
    pub fn find_plane_crossings(&self, search: Window) -> Result<Vec<LaunchWindow>, ManeuverError> {
        let mut step = if search.length().to_seconds() * 0.5 > MAX_CROSSING_STEP_S {
            MAX_CROSSING_STEP_S * Unit::Second
        } else {
            search.length() * 0.5
        };
        let mut epoch = search.start();
        let mut above = self.target_normal.dot(&self.site_position(epoch)?) > 0.0;
        let mut bracketed = false;
        let mut crossing = None;

        while epoch <= search.end() && step != Duration::ZERO {
            epoch = epoch + step;
            let now_above = self.target_normal.dot(&self.site_position(epoch)?) > 0.0;
            if now_above != above {
                above = now_above;
                bracketed = true;
                step = step * -0.5;
            }
            if bracketed && step.abs().to_seconds() < CROSSING_PRECISION_S {
                crossing = Some(epoch);
                break;
            }
        }

        let mut windows = Vec::new();
        let Some(mut epoch) = crossing.filter(|epoch| search.contains(*epoch)) else {
            debug!("{} does not cross the target plane in {search}", self.launch_site.site.name);
            return Ok(windows);
        };

        let mut ascending = self.site_position(epoch)?.dot(&self.ascending_node) > 0.0;
        windows.push(self.window_at(epoch, ascending));

        let body = &self.launch_site.site.body;
        let half_rotation = body.sidereal_rotation_period() * 0.5;
        let node_offset_s = 2.0 * self.delta_l_rad / body.angular_velocity();
        loop {
            ascending = !ascending;
            let offset_s = if ascending { node_offset_s } else { -node_offset_s };
            epoch = epoch + half_rotation + offset_s * Unit::Second;
            if epoch > search.end() {
                break;
            }
            windows.push(self.window_at(epoch, ascending));
        }
        Ok(windows)
    }

    /// Returns the launch windows within the search window, ordered by epoch.
    ///
    /// When launching by day, the plane crossings are only searched while both the launch and the
    /// recovery sites are in daylight. Crossings whose azimuth is not allowed from the launch site are
    /// discarded.
    pub fn launch_windows(
        &self,
        search: Window,
        finder: &dyn GeometryFinder,
    ) -> Result<Vec<LaunchWindow>, ManeuverError> {
        let candidates = if self.launch_by_day {
            let launch_days = finder.find_windows(
                search,
                &GeometryConstraint::Daylight {
                    site: self.launch_site.site.clone(),
                    twilight_rad: self.twilight_rad,
                },
            )?;
            let recovery_days = finder.find_windows(
                search,
                &GeometryConstraint::Daylight {
                    site: self.recovery_site.clone(),
                    twilight_rad: self.twilight_rad,
                },
            )?;
            let mut both = Vec::new();
            for launch_day in &launch_days {
                both.extend(
                    recovery_days
                        .iter()
                        .filter_map(|recovery_day| launch_day.intersection(recovery_day)),
                );
            }
            if both.is_empty() {
                warn!(
                    "no common daylight at {} and {} in {search}",
                    self.launch_site.site.name, self.recovery_site.name
                );
            }
            both
        } else {
            vec![search]
        };

        let mut windows = Vec::new();
        for candidate in candidates {
            for window in self.find_plane_crossings(candidate)? {
                if self
                    .launch_site
                    .is_azimuth_allowed(window.non_inertial_azimuth_rad)
                {
                    windows.push(window);
                } else {
                    debug!("azimuth not allowed for {window}");
                }
            }
        }
        windows.sort_by(|a, b| a.window.start().cmp(&b.window.start()));
        ensure!(!windows.is_empty(), NoLaunchWindowSnafu { window: search });
        info!("{} launch window(s) from {} in {search}", windows.len(), self.launch_site.site.name);
        Ok(windows)
    }
}

#[cfg(test)]
mod ut_launch {
    use super::*;
    use crate::cosmic::{AzimuthRange, CelestialBody, ConicElements, Planetodetic, StateVector};
    use crate::errors::ErrorKind;
    use crate::io::MemoryEphemeris;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn epoch() -> Epoch {
        Epoch::from_tdb_seconds(4.3e8)
    }

    fn site(lat_deg: f64) -> Site {
        Site::new(
            1,
            "S1",
            CelestialBody::earth(),
            Planetodetic::new(-81.0_f64.to_radians(), lat_deg.to_radians(), 0.0),
        )
        .unwrap()
    }

    fn target(inc_deg: f64) -> OrbitalParameters {
        ConicElements::new(
            CelestialBody::earth(),
            6_728_137.0,
            0.0,
            inc_deg.to_radians(),
            0.0,
            0.0,
            0.0,
            epoch(),
            Frame::ICRF,
        )
        .unwrap()
        .into()
    }

    fn launch() -> Launch {
        Launch::new(LaunchSite::new(site(28.5)), site(28.5), false, target(51.6494)).unwrap()
    }

    #[test]
    fn azimuths_and_velocities() {
        let launch = launch();
        assert_abs_diff_eq!(
            launch.inertial_ascending_azimuth_rad().to_degrees(),
            44.91287240479324,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            launch.inertial_descending_azimuth_rad().to_degrees(),
            135.08712759520677,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            launch.inertial_insertion_velocity_m_s(),
            7696.99973045244,
            max_relative = 1e-12
        );
        assert_abs_diff_eq!(
            launch.non_inertial_ascending_azimuth_rad().to_degrees(),
            42.67358224266129,
            epsilon = 1e-8
        );
        assert_abs_diff_eq!(
            launch.non_inertial_descending_azimuth_rad().to_degrees(),
            137.3264177573387,
            epsilon = 1e-8
        );
        assert_abs_diff_eq!(
            launch.non_inertial_insertion_velocity_m_s(),
            7413.858962837165,
            epsilon = 1e-6
        );
    }

    #[test]
    fn retrograde_target() {
        let launch = Launch::new(LaunchSite::new(site(28.5)), site(28.5), false, target(110.0)).unwrap();
        let azimuth = launch.inertial_ascending_azimuth_rad().to_degrees();
        assert!(azimuth > 270.0 && azimuth < 360.0, "{azimuth}");
        assert!(launch.non_inertial_insertion_velocity_m_s() > launch.inertial_insertion_velocity_m_s());
    }

    #[test]
    fn unreachable_targets() {
        assert!(Launch::new(LaunchSite::new(site(60.0)), site(28.5), false, target(51.6494)).is_err());
        assert!(Launch::new(LaunchSite::new(site(28.5)), site(28.5), false, target(0.0)).is_err());
        let lunar: OrbitalParameters = StateVector::cartesian(
            CelestialBody::moon(),
            2_000_000.0,
            0.0,
            0.0,
            0.0,
            1_000.0,
            1_000.0,
            epoch(),
            Frame::ICRF,
        )
        .into();
        let err = Launch::new(LaunchSite::new(site(28.5)), site(28.5), false, lunar).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn plane_crossings() {
        let launch = launch();
        let search = Window::from_start_and_length(epoch(), 2.0 * Unit::Day).unwrap();
        let windows = launch.find_plane_crossings(search).unwrap();
        assert!(windows.len() >= 3, "{} windows", windows.len());

        for (i, window) in windows.iter().enumerate() {
            assert!(search.contains(window.window.start()));
            let position = launch.site_position(window.window.start()).unwrap();
            assert!(
                launch.target_normal.dot(&position.normalize()).abs() < 1e-4,
                "{window}"
            );
            if i > 0 {
                assert_ne!(window.ascending, windows[i - 1].ascending);
                assert!(window.window.start() > windows[i - 1].window.start());
            }
            let expected = if window.ascending {
                launch.inertial_ascending_azimuth_rad()
            } else {
                launch.inertial_descending_azimuth_rad()
            };
            assert_eq!(window.inertial_azimuth_rad, expected);
        }
    }

    struct FixedFinder {
        windows: Vec<Window>,
    }

    impl GeometryFinder for FixedFinder {
        fn find_windows(
            &self,
            search: Window,
            _constraint: &GeometryConstraint,
        ) -> Result<Vec<Window>, ManeuverError> {
            Ok(self
                .windows
                .iter()
                .filter_map(|window| window.intersection(&search))
                .collect())
        }
    }

    #[test]
    fn launch_by_day() {
        let search = Window::from_start_and_length(epoch(), 2.0 * Unit::Day).unwrap();
        let all = launch().find_plane_crossings(search).unwrap();

        // Daylight around the second crossing only
        let around = Window::new(
            all[1].window.start() - 1.0 * Unit::Hour,
            all[1].window.start() + 1.0 * Unit::Hour,
        )
        .unwrap();
        let mut by_day = launch();
        by_day.launch_by_day = true;
        let finder = FixedFinder {
            windows: vec![around],
        };
        let windows = by_day.launch_windows(search, &finder).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].ascending, all[1].ascending);
        assert!(
            (windows[0].window.start() - all[1].window.start()).abs() < 2.0 * Unit::Second,
            "{} vs {}",
            windows[0].window.start(),
            all[1].window.start()
        );

        let night = FixedFinder { windows: vec![] };
        let err = by_day.launch_windows(search, &night).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ManeuverInfeasible);
    }

    #[test]
    fn azimuth_constraints() {
        let search = Window::from_start_and_length(epoch(), 2.0 * Unit::Day).unwrap();
        let northeast = LaunchSite::new(site(28.5))
            .with_azimuth_range(AzimuthRange::new(30.0_f64.to_radians(), 60.0_f64.to_radians()));
        let launch = Launch::new(northeast, site(28.5), false, target(51.6494)).unwrap();
        let finder = FixedFinder { windows: vec![] };
        let windows = launch.launch_windows(search, &finder).unwrap();
        assert!(!windows.is_empty());
        assert!(windows.iter().all(|window| window.ascending));

        let south = LaunchSite::new(site(28.5))
            .with_azimuth_range(AzimuthRange::new(170.0_f64.to_radians(), 190.0_f64.to_radians()));
        let launch = Launch::new(south, site(28.5), false, target(51.6494)).unwrap();
        assert!(launch.launch_windows(search, &finder).is_err());
    }

    /// Sun fixed on the X axis of the inertial frame, seen from the Earth
    fn fixed_sun(start: Epoch, end: Epoch) -> MemoryEphemeris {
        let mut sun = MemoryEphemeris::new(SUN_ID);
        let mut states = Vec::new();
        let mut epoch = start;
        while epoch <= end {
            states.push(StateVector::cartesian(
                CelestialBody::earth(),
                1.495_978_707e11,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
                epoch,
                Frame::ICRF,
            ));
            epoch = epoch + 1.0 * Unit::Hour;
        }
        sun.write_data(&states).unwrap();
        sun
    }

    #[test]
    fn daylight_at_the_equator() {
        let earth = CelestialBody::earth();
        let sidereal_day = earth.sidereal_rotation_period();
        let search = Window::from_start_and_length(epoch(), sidereal_day).unwrap();
        let sun = fixed_sun(epoch() - 2.0 * Unit::Hour, epoch() + 26.0 * Unit::Hour);
        let finder = DaylightFinder::new(&sun, 10.0 * Unit::Minute).unwrap();
        let equator = Site::new(2, "equator", earth, Planetodetic::new(0.0, 0.0, 0.0)).unwrap();

        let day = GeometryConstraint::Daylight {
            site: equator.clone(),
            twilight_rad: OFFICIAL_TWILIGHT_RAD,
        };
        let windows = finder.find_windows(search, &day).unwrap();
        assert!(!windows.is_empty() && windows.len() <= 2);
        let daylight_s: f64 = windows.iter().map(|w| w.length().to_seconds()).sum();
        assert_abs_diff_eq!(
            daylight_s,
            sidereal_day.to_seconds() * (180.0 - 2.0 * 0.8333) / 360.0,
            epsilon = 5.0
        );
        for window in &windows {
            let mid = window.start() + window.length() * 0.5;
            assert!(day.is_satisfied(finder.incidence_rad(&equator, mid).unwrap()));
        }

        let night = GeometryConstraint::Night {
            site: equator,
            twilight_rad: OFFICIAL_TWILIGHT_RAD,
        };
        let night_s: f64 = finder
            .find_windows(search, &night)
            .unwrap()
            .iter()
            .map(|w| w.length().to_seconds())
            .sum();
        assert_abs_diff_eq!(daylight_s + night_s, sidereal_day.to_seconds(), epsilon = 1.0);

        assert!(DaylightFinder::new(&MemoryEphemeris::new(301), 1.0 * Unit::Minute).is_err());
    }
}
