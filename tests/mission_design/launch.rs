extern crate nyx_mission as nyx;

use approx::assert_abs_diff_eq;
use nyx::cosmic::{
    AzimuthRange, CelestialBody, ConicElements, Frame, LaunchSite, OrbitalParameters, Planetodetic, Site,
    StateVector,
};
use nyx::io::{EphemerisStore, MemoryEphemeris};
use nyx::md::{DaylightFinder, GeometryConstraint, GeometryFinder, Launch, OFFICIAL_TWILIGHT_RAD};
use nyx::time::{Epoch, Unit, Window};
use nyx::ErrorKind;
use rstest::*;

const AU_M: f64 = 1.495_978_707e11;

#[fixture]
fn epoch() -> Epoch {
    Epoch::from_gregorian_utc_at_noon(2024, 3, 20)
}

fn cape(lon_deg: f64) -> Site {
    Site::new(
        2,
        "cape",
        CelestialBody::earth(),
        Planetodetic::new(lon_deg.to_radians(), 28.5_f64.to_radians(), 10.0),
    )
    .unwrap()
}

fn iss_plane(epoch: Epoch) -> OrbitalParameters {
    ConicElements::new(
        CelestialBody::earth(),
        6_778_000.0,
        0.0005,
        51.64_f64.to_radians(),
        1.2,
        0.4,
        0.0,
        epoch,
        Frame::ICRF,
    )
    .unwrap()
    .into()
}

/// Sun fixed in the inertial frame, sampled hourly
fn sun_toward(direction: &StateVector, start: Epoch, end: Epoch) -> MemoryEphemeris {
    let sun_m = direction.position_m.normalize() * AU_M;
    let mut states = Vec::new();
    let mut epoch = start;
    while epoch <= end {
        states.push(StateVector::cartesian(
            CelestialBody::earth(),
            sun_m.x,
            sun_m.y,
            sun_m.z,
            0.0,
            0.0,
            0.0,
            epoch,
            Frame::ICRF,
        ));
        epoch = epoch + 1.0 * Unit::Hour;
    }
    let mut sun = MemoryEphemeris::new(10);
    sun.write_data(&states).unwrap();
    sun
}

#[rstest]
fn daylight_launches(epoch: Epoch) {
    let _ = pretty_env_logger::try_init();
    let search = Window::from_start_and_length(epoch, 3.0 * Unit::Day).unwrap();
    let anytime = Launch::new(LaunchSite::new(cape(-80.6)), cape(-75.6), false, iss_plane(epoch)).unwrap();

    let crossings = anytime.find_plane_crossings(search).unwrap();
    assert!(crossings.len() >= 5, "{} crossings", crossings.len());
    let noon = crossings[0].window.start();

    // The first crossing happens at local noon at the launch site
    let overhead = cape(-80.6).state_vector(Frame::ICRF, noon).unwrap();
    let sun = sun_toward(&overhead, epoch - 1.0 * Unit::Day, epoch + 4.0 * Unit::Day);
    let finder = DaylightFinder::new(&sun, 10.0 * Unit::Minute).unwrap();

    let mut by_day = anytime.clone();
    by_day.launch_by_day = true;
    let windows = by_day.launch_windows(search, &finder).unwrap();
    assert!(windows.len() < crossings.len());
    assert!(
        windows
            .iter()
            .any(|w| (w.window.start() - noon).to_seconds().abs() < 5.0),
        "noon crossing missing"
    );
    for window in &windows {
        for site in [&by_day.launch_site.site, &by_day.recovery_site] {
            let incidence = finder.incidence_rad(site, window.window.start()).unwrap();
            assert!(
                GeometryConstraint::Daylight {
                    site: site.clone(),
                    twilight_rad: OFFICIAL_TWILIGHT_RAD
                }
                .is_satisfied(incidence),
                "{window}"
            );
        }
    }

    // Nights are exactly the complement of days at the launch site
    let days = finder
        .find_windows(
            search,
            &GeometryConstraint::Daylight {
                site: cape(-80.6),
                twilight_rad: OFFICIAL_TWILIGHT_RAD,
            },
        )
        .unwrap();
    for crossing in crossings.iter().filter(|c| !days.iter().any(|d| d.contains(c.window.start()))) {
        assert!(windows.iter().all(|w| w.window != crossing.window));
    }
}

#[rstest]
fn northerly_launches_only(epoch: Epoch) {
    let _ = pretty_env_logger::try_init();
    let search = Window::from_start_and_length(epoch, 2.0 * Unit::Day).unwrap();
    let site = LaunchSite::new(cape(-80.6)).with_azimuth_range(AzimuthRange::new(
        35.0_f64.to_radians(),
        60.0_f64.to_radians(),
    ));
    let launch = Launch::new(site, cape(-80.6), false, iss_plane(epoch)).unwrap();
    let sun = sun_toward(
        &cape(-80.6).state_vector(Frame::ICRF, epoch).unwrap(),
        epoch,
        epoch + 2.0 * Unit::Day,
    );
    let finder = DaylightFinder::new(&sun, 10.0 * Unit::Minute).unwrap();

    let windows = launch.launch_windows(search, &finder).unwrap();
    assert!(windows.len() >= 2);
    for pair in windows.windows(2) {
        // Once per sidereal day
        assert_abs_diff_eq!(
            (pair[1].window.start() - pair[0].window.start()).to_seconds(),
            CelestialBody::earth().sidereal_rotation_period().to_seconds(),
            epsilon = 10.0
        );
    }
    for window in &windows {
        assert!(window.ascending);
        assert_abs_diff_eq!(window.non_inertial_azimuth_rad.to_degrees(), 42.7, epsilon = 0.5);
    }

    let southerly = LaunchSite::new(cape(-80.6)).with_azimuth_range(AzimuthRange::new(
        170.0_f64.to_radians(),
        190.0_f64.to_radians(),
    ));
    let never = Launch::new(southerly, cape(-80.6), false, iss_plane(epoch)).unwrap();
    assert_eq!(
        never.launch_windows(search, &finder).unwrap_err().kind(),
        ErrorKind::ManeuverInfeasible
    );
}
