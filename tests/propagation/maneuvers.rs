extern crate nyx_mission as nyx;

use crate::test_data;
use approx::{assert_abs_diff_eq, assert_relative_eq};
use nyx::cosmic::{BodyCatalog, CelestialBody, Frame, OrbitalState, Spacecraft, StateVector};
use nyx::io::{ConfigRepr, Configurable, PropagatorConfig};
use nyx::linalg::Vector3;
use nyx::md::maneuvers::{ApogeeHeightChange, Attitude, AttitudeHold, PerigeeHeightChange, PlaneChange};
use nyx::md::{Maneuver, ManeuverStatus};
use nyx::propagators::{Propagator, VelocityVerlet};
use nyx::time::{Epoch, Unit, Window};

#[test]
fn hohmann_transfer_to_geo() {
    let _ = pretty_env_logger::try_init();
    let catalog = BodyCatalog::solar_system();
    let sc = Spacecraft::from_yaml(test_data("spacecraft.yaml"), &catalog).unwrap();
    let cfg = PropagatorConfig::load(test_data("propagator.yaml")).unwrap();
    let mut prop = cfg.into_propagator(sc).unwrap();

    let raise = prop
        .add_maneuver(Maneuver::new(&["eng1"], ApogeeHeightChange::new(42_164_000.0).unwrap()).unwrap())
        .unwrap();
    let circularize = prop
        .add_maneuver(Maneuver::new(&["eng1"], PerigeeHeightChange::new(42_164_000.0).unwrap()).unwrap())
        .unwrap();
    prop.set_next_maneuver(raise, circularize).unwrap();
    prop.set_standby_maneuver(raise).unwrap();
    prop.propagate().unwrap();

    let first = prop.maneuver(raise).unwrap();
    let second = prop.maneuver(circularize).unwrap();
    assert_eq!(first.status(), ManeuverStatus::Executed);
    assert_eq!(second.status(), ManeuverStatus::Executed);
    assert!(prop.standby_maneuver().is_none());

    assert_relative_eq!(first.delta_v_m_s().unwrap().norm(), 2425.769, max_relative = 1e-3);
    assert_relative_eq!(second.delta_v_m_s().unwrap().norm(), 1466.839, max_relative = 1e-2);

    // Half of the transfer orbit between both burns
    let transfer_s = (second.thrust_window().unwrap().start() - first.thrust_window().unwrap().start()).to_seconds();
    assert!((transfer_s - 18_990.05).abs() < 60.0, "transfer of {transfer_s} s");

    let geo = prop.states().last().unwrap();
    assert!(geo.eccentricity() < 5e-3, "{geo}");
    assert_relative_eq!(geo.sma_m(), 42_164_000.0, max_relative = 5e-3);

    let burned_kg = first.fuel_burned_kg() + second.fuel_burned_kg();
    assert_relative_eq!(burned_kg, 1787.54, max_relative = 1e-2);
    assert_relative_eq!(prop.spacecraft().fuel_mass_kg(), 2000.0 - burned_kg, epsilon = 1e-6);
}

fn circular(inc_deg: f64, u_deg: f64) -> StateVector {
    StateVector::keplerian(
        CelestialBody::earth(),
        7_000_000.0,
        0.0,
        inc_deg.to_radians(),
        0.3,
        0.0,
        u_deg.to_radians(),
        Epoch::from_tdb_seconds(0.0),
        Frame::ICRF,
    )
    .unwrap()
}

#[test]
fn plane_change_after_attitude_hold() {
    let _ = pretty_env_logger::try_init();
    let mut sc = Spacecraft::new(-9, "plane changer", 1000.0, 3000.0, circular(28.5, 10.0).into()).unwrap();
    sc.add_fuel_tank("ft1", 2000.0, 2000.0).unwrap();
    sc.add_engine("eng1", "main", "ft1", Vector3::zeros(), Spacecraft::BACK, 300.0, 50.0)
        .unwrap();

    let window = Window::new(Epoch::from_tdb_seconds(0.0), Epoch::from_tdb_seconds(6_000.0)).unwrap();
    let verlet = VelocityVerlet::two_body(10.0 * Unit::Second).unwrap();
    let mut prop = Propagator::new(sc, Box::new(verlet), window);

    let nadir = prop
        .add_maneuver(
            Maneuver::new(&["eng1"], AttitudeHold::new(Attitude::Nadir))
                .unwrap()
                .with_attitude_hold(600.0 * Unit::Second),
        )
        .unwrap();
    let plane = prop
        .add_maneuver(Maneuver::new(&["eng1"], PlaneChange::new(circular(40.0, 0.0).into())).unwrap())
        .unwrap();
    prop.set_next_maneuver(nadir, plane).unwrap();
    prop.set_standby_maneuver(nadir).unwrap();
    prop.propagate().unwrap();

    let hold = prop.maneuver(nadir).unwrap();
    let change = prop.maneuver(plane).unwrap();
    assert_eq!(hold.status(), ManeuverStatus::Executed);
    assert_eq!(change.status(), ManeuverStatus::Executed);
    assert_eq!(change.minimum_epoch(), Some(hold.attitude_window().unwrap().end()));
    assert!(change.thrust_window().unwrap().start() >= hold.attitude_window().unwrap().end());

    // Burn at the descending node of the equator, half a revolution after the start
    let burn = change.thrust_window().unwrap().start();
    assert!((burn.to_tdb_seconds() - 2_750.0).abs() < 120.0, "burn at {burn}");

    let last = prop.states().last().unwrap();
    assert_abs_diff_eq!(last.inclination_rad().to_degrees(), 40.0, epsilon = 0.1);
    // Firing up to one 10 s step past the node shifts the node line by at most 3.4e-3 rad
    assert_abs_diff_eq!(last.raan_rad(), 0.3, epsilon = 4e-3);
    assert_relative_eq!(last.vmag_m_s(), circular(28.5, 10.0).vmag_m_s(), max_relative = 1e-3);

    // The orientation history covers the whole propagation
    assert_eq!(prop.orientation_coverage(), prop.window());
    let t = hold.attitude_window().unwrap().start() + 300.0 * Unit::Second;
    let state = prop.trajectory().find_nearest_lower_state_vector(t).unwrap().clone();
    let orientation = prop.trajectory().orientation_at(t).unwrap();
    assert_abs_diff_eq!(
        orientation.to_reference(&Spacecraft::FRONT),
        -state.r_hat(),
        epsilon = 1e-6
    );
}
