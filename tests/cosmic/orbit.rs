extern crate nyx_mission as nyx;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use nyx::cosmic::{BodyCatalog, CelestialBody, ConicElements, Frame, OrbitalState, StateVector, TLE};
use nyx::time::{Epoch, Unit};
use rstest::*;
use std::f64::consts::TAU;

#[fixture]
fn epoch() -> Epoch {
    Epoch::from_gregorian_tai_at_noon(2023, 3, 21)
}

#[fixture]
fn molniya(epoch: Epoch) -> StateVector {
    StateVector::keplerian(
        CelestialBody::earth(),
        26_600_000.0,
        0.74,
        63.4_f64.to_radians(),
        1.2,
        270.0_f64.to_radians(),
        0.4,
        epoch,
        Frame::ICRF,
    )
    .unwrap()
}

#[rstest]
fn keplerian_elements(molniya: StateVector) {
    let _ = pretty_env_logger::try_init();
    assert_relative_eq!(molniya.sma_m(), 26_600_000.0, max_relative = 1e-12);
    assert_abs_diff_eq!(molniya.eccentricity(), 0.74, epsilon = 1e-12);
    assert_abs_diff_eq!(molniya.inclination_rad(), 63.4_f64.to_radians(), epsilon = 1e-12);
    assert_abs_diff_eq!(molniya.raan_rad(), 1.2, epsilon = 1e-12);
    assert_abs_diff_eq!(molniya.aop_rad(), 270.0_f64.to_radians(), epsilon = 1e-10);
    assert_abs_diff_eq!(molniya.true_anomaly_rad(), 0.4, epsilon = 1e-10);
    assert!(molniya.is_elliptical());
    assert!(!molniya.is_circular());
}

#[rstest]
fn conic_propagation_is_periodic(molniya: StateVector) {
    let period = molniya.period().unwrap();
    let later = molniya.to_state_vector(molniya.epoch + period);
    assert_abs_diff_eq!(later.position_m, molniya.position_m, epsilon = 1e-3);
    assert_abs_diff_eq!(later.velocity_m_s, molniya.velocity_m_s, epsilon = 1e-6);

    let conic = ConicElements::from_sma(
        CelestialBody::earth(),
        molniya.sma_m(),
        molniya.eccentricity(),
        molniya.inclination_rad(),
        molniya.raan_rad(),
        molniya.aop_rad(),
        molniya.mean_anomaly_rad(),
        molniya.epoch,
        Frame::ICRF,
    )
    .unwrap();
    let half = molniya.epoch + period * 0.5;
    assert_abs_diff_eq!(
        conic.to_state_vector(half).position_m,
        molniya.to_state_vector(half).position_m,
        epsilon = 1e-3
    );
    assert_abs_diff_eq!(
        (conic.mean_anomaly_at(half) - molniya.mean_anomaly_rad()).rem_euclid(TAU),
        TAU / 2.0,
        epsilon = 1e-9
    );
}

#[rstest]
fn frame_round_trips(molniya: StateVector) {
    let catalog = BodyCatalog::solar_system();
    for frame in [Frame::EclipticJ2000, Frame::BodyFixed(399)] {
        let converted = molniya.to_frame_using(&catalog, frame).unwrap();
        assert_eq!(converted.frame, frame);
        assert_relative_eq!(converted.rmag_m(), molniya.rmag_m(), max_relative = 1e-12);
        let back = converted.to_frame_using(&catalog, Frame::ICRF).unwrap();
        assert_abs_diff_eq!(back.position_m, molniya.position_m, epsilon = 1e-6);
        assert_abs_diff_eq!(back.velocity_m_s, molniya.velocity_m_s, epsilon = 1e-9);
    }

    // The body fixed frame rotates once per sidereal day
    let earth = CelestialBody::earth();
    let fixed = molniya.to_frame(Frame::BodyFixed(399)).unwrap();
    let mut later = molniya.clone();
    later.epoch = molniya.epoch + earth.sidereal_rotation_period();
    let later = later.to_frame(Frame::BodyFixed(399)).unwrap();
    // Nanosecond epoch rounding over a day leaves sub-centimeter drift
    assert_abs_diff_eq!(later.position_m, fixed.position_m, epsilon = 1e-2);
}

#[test]
fn two_line_elements() {
    let tle = TLE::from_lines(
        "ISS (ZARYA)",
        "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927",
        "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537",
    )
    .unwrap();
    assert_eq!(tle.satellite_number, 25544);
    assert_eq!(tle.name, "ISS (ZARYA)");
    assert_abs_diff_eq!(tle.inclination_rad(), 51.6416_f64.to_radians(), epsilon = 1e-12);
    assert_abs_diff_eq!(tle.eccentricity(), 0.0006703, epsilon = 1e-12);

    let state = tle.to_state_vector(tle.epoch);
    assert!(state.rmag_m() > 6.70e6 && state.rmag_m() < 6.75e6, "{state}");
    assert_eq!(state.center.id, 399);

    let an_hour_later = tle.to_state_vector(tle.epoch + 1.0 * Unit::Hour);
    assert_relative_eq!(an_hour_later.sma_m(), state.sma_m(), max_relative = 1e-6);

    // Corrupted checksum
    assert!(TLE::from_lines(
        "ISS (ZARYA)",
        "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2928",
        "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537",
    )
    .is_err());
}
