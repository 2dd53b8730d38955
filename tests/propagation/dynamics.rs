extern crate nyx_mission as nyx;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use nyx::cosmic::{CelestialBody, Frame, OrbitalState, Spacecraft, StateVector, TLE};
use nyx::propagators::{Integrator, TleIntegrator, VelocityVerlet};
use nyx::time::{Epoch, Unit};
use nyx::utils::between_pm_pi;
use rstest::*;

#[fixture]
fn leo() -> StateVector {
    StateVector::keplerian(
        CelestialBody::earth(),
        6_778_000.0,
        0.001,
        51.6_f64.to_radians(),
        0.5,
        0.3,
        0.0,
        Epoch::from_gregorian_tai_at_midnight(2023, 1, 1),
        Frame::ICRF,
    )
    .unwrap()
}

fn spacecraft(orbit: &StateVector) -> Spacecraft {
    Spacecraft::new(-5, "sc", 500.0, 1000.0, orbit.clone().into()).unwrap()
}

fn integrate(integrator: &mut dyn Integrator, sc: &Spacecraft, from: &StateVector, steps: usize) -> StateVector {
    let mut state = from.clone();
    for _ in 0..steps {
        state = integrator.integrate(sc, &state).unwrap();
    }
    state
}

#[rstest]
fn two_body_conserves_energy(leo: StateVector) {
    let _ = pretty_env_logger::try_init();
    let sc = spacecraft(&leo);
    let mut verlet = VelocityVerlet::two_body(5.0 * Unit::Second).unwrap();
    let period_s = leo.period().unwrap().to_seconds();
    let steps = (period_s / 5.0).round() as usize;
    let final_state = integrate(&mut verlet, &sc, &leo, steps);

    assert_eq!(final_state.epoch, leo.epoch + (steps as f64 * 5.0) * Unit::Second);
    assert_eq!(final_state.frame, Frame::ICRF);
    assert_abs_diff_eq!(
        final_state.specific_energy(),
        leo.specific_energy(),
        epsilon = 1e-5
    );
    assert_relative_eq!(
        final_state.specific_angular_momentum().norm(),
        leo.specific_angular_momentum().norm(),
        max_relative = 1e-9
    );
    // Back near the start after one revolution
    let analytic = leo.to_state_vector(final_state.epoch);
    assert!((final_state.position_m - analytic.position_m).norm() < 1_000.0);
}

#[rstest]
fn j2_nodal_regression(leo: StateVector) {
    let earth = CelestialBody::earth();
    let sc = spacecraft(&leo);
    let mut verlet = VelocityVerlet::with_j2(10.0 * Unit::Second).unwrap();
    let mut two_body = VelocityVerlet::two_body(10.0 * Unit::Second).unwrap();

    // Fifteen revolutions, close to a day
    let period_s = leo.period().unwrap().to_seconds();
    let steps = (15.0 * period_s / 10.0).round() as usize;
    let perturbed = integrate(&mut verlet, &sc, &leo, steps);
    let unperturbed = integrate(&mut two_body, &sc, &leo, steps);

    let elapsed_s = (perturbed.epoch - leo.epoch).to_seconds();
    let p = leo.semi_parameter_m();
    let expected_rate = -1.5 * leo.mean_motion_rad_s() * earth.j2 * (earth.equatorial_radius_m / p).powi(2)
        * leo.inclination_rad().cos();
    let drift = between_pm_pi(perturbed.raan_rad() - leo.raan_rad());
    assert_relative_eq!(drift / elapsed_s, expected_rate, max_relative = 0.05);

    // Without J2 the plane does not move
    assert_abs_diff_eq!(unperturbed.raan_rad(), leo.raan_rad(), epsilon = 1e-9);
    assert_abs_diff_eq!(unperturbed.inclination_rad(), leo.inclination_rad(), epsilon = 1e-9);
}

#[test]
fn tle_integrator_follows_the_elements() {
    let tle = TLE::from_lines(
        "ISS (ZARYA)",
        "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927",
        "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537",
    )
    .unwrap();
    let start = tle.to_state_vector(tle.epoch);
    let sc = Spacecraft::new(-25544, "ISS", 400_000.0, 500_000.0, tle.clone().into()).unwrap();
    let mut integrator = TleIntegrator::new(1.0 * Unit::Minute, tle.clone()).unwrap();
    let after = integrate(&mut integrator, &sc, &start, 90);
    let expected = tle.to_state_vector(tle.epoch + 90.0 * Unit::Minute);
    assert_eq!(after.epoch, expected.epoch);
    assert_abs_diff_eq!(after.position_m, expected.position_m, epsilon = 1e-6);

    assert!(TleIntegrator::new(-1.0 * Unit::Minute, tle).is_err());
}
