extern crate nyx_mission as nyx;

use approx::assert_abs_diff_eq;
use nyx::cosmic::{CelestialBody, Frame, OrbitalParameters, OrbitalState, Spacecraft, StateVector};
use nyx::linalg::Vector3;
use nyx::md::maneuvers::{ApsidalAlignment, Phasing};
use nyx::md::{Maneuver, ManeuverStatus};
use nyx::propagators::{Propagator, VelocityVerlet};
use nyx::time::{Epoch, Unit, Window};

fn orbit(sma_m: f64, ecc: f64, aop_deg: f64, ta_deg: f64) -> StateVector {
    StateVector::keplerian(
        CelestialBody::earth(),
        sma_m,
        ecc,
        0.3,
        0.5,
        aop_deg.to_radians(),
        ta_deg.to_radians(),
        Epoch::from_tdb_seconds(0.0),
        Frame::ICRF,
    )
    .unwrap()
}

fn propagator(initial: StateVector, length_s: f64) -> Propagator {
    let mut sc = Spacecraft::new(-30, "chaser", 800.0, 1500.0, initial.into()).unwrap();
    sc.add_fuel_tank("ft1", 600.0, 600.0).unwrap();
    sc.add_engine("eng1", "main", "ft1", Vector3::zeros(), Spacecraft::BACK, 320.0, 2.0)
        .unwrap();
    let window = Window::from_start_and_length(Epoch::from_tdb_seconds(0.0), length_s * Unit::Second).unwrap();
    Propagator::new(
        sc,
        Box::new(VelocityVerlet::two_body(1.0 * Unit::Second).unwrap()),
        window,
    )
}

#[test]
fn phasing_rendezvous() {
    let _ = pretty_env_logger::try_init();
    let target: OrbitalParameters = orbit(10_000_000.0, 0.1, 60.0, 30.0).into();
    let mut prop = propagator(orbit(10_000_000.0, 0.1, 60.0, -20.0), 31_000.0);
    let id = prop
        .add_maneuver(Maneuver::new(&["eng1"], Phasing::new(target.clone(), 3).unwrap()).unwrap())
        .unwrap();
    prop.set_standby_maneuver(id).unwrap();
    prop.propagate().unwrap();

    let phasing = prop.maneuver(id).unwrap();
    assert_eq!(phasing.status(), ManeuverStatus::Executed);
    // Slowing down: the chaser lags behind and lets the target come around
    let burn = phasing.thrust_window().unwrap();
    let point = burn.start() + burn.length() * 0.5;
    let before = prop.states()[0].clone();
    assert!(phasing.delta_v_m_s().unwrap().dot(&before.to_state_vector(point).velocity_m_s) < 0.0);

    let drift = prop
        .trajectory()
        .find_nearest_lower_state_vector(point + 60.0 * Unit::Second)
        .unwrap()
        .clone();
    assert!(drift.period().unwrap() < before.period().unwrap());
    let meeting = point + drift.period().unwrap() * 3.0;
    assert!(prop.window().contains(meeting));

    let chaser = prop
        .trajectory()
        .find_nearest_lower_state_vector(meeting)
        .unwrap()
        .to_state_vector(meeting);
    let gap = chaser.position_m - target.to_state_vector(meeting).position_m;
    assert!(gap.norm() < 5_000.0, "gap of {} m", gap.norm());
}

#[test]
fn rotate_line_of_apsides() {
    let _ = pretty_env_logger::try_init();
    let target: OrbitalParameters = orbit(10_000_000.0, 0.2, 30.0, 0.0).into();
    let mut prop = propagator(orbit(10_000_000.0, 0.2, 0.0, 0.0), 3_000.0);
    let id = prop
        .add_maneuver(Maneuver::new(&["eng1"], ApsidalAlignment::new(target).unwrap()).unwrap())
        .unwrap();
    prop.set_standby_maneuver(id).unwrap();
    prop.propagate().unwrap();

    let alignment = prop.maneuver(id).unwrap();
    assert_eq!(alignment.status(), ManeuverStatus::Executed);
    assert!(alignment.fuel_burned_kg() > 0.0);

    let aligned = prop.states().last().unwrap();
    assert_abs_diff_eq!(aligned.aop_rad().to_degrees(), 30.0, epsilon = 1.0);
    assert_abs_diff_eq!(aligned.eccentricity(), 0.2, epsilon = 5e-3);
    assert_abs_diff_eq!(aligned.sma_m(), 10_000_000.0, epsilon = 50_000.0);
}
