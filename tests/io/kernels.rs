extern crate nyx_mission as nyx;

use crate::{test_data, test_output};
use approx::assert_abs_diff_eq;
use nyx::cosmic::{BodyCatalog, CelestialBody, Frame, Spacecraft};
use nyx::io::{
    Aberration, ConfigRepr, Configurable, CsvEphemeris, CsvOrientation, EphemerisStore, ExportCfg,
    MemoryEphemeris, OrientationStore, PropagatorConfig,
};
use nyx::propagators::Propagator;
use nyx::time::{Epoch, Unit};
use rstest::*;

#[fixture]
fn propagated() -> Propagator {
    let _ = pretty_env_logger::try_init();
    let catalog = BodyCatalog::solar_system();
    let sc = Spacecraft::from_yaml(test_data("spacecraft.yaml"), &catalog).unwrap();
    let mut cfg = PropagatorConfig::load(test_data("propagator.yaml")).unwrap();
    cfg.end = cfg.start + 2.0 * Unit::Hour;
    let mut prop = cfg.into_propagator(sc).unwrap();
    prop.propagate().unwrap();
    prop
}

#[rstest]
fn ephemeris_round_trip(propagated: Propagator) {
    let catalog = BodyCatalog::solar_system();
    let id = propagated.spacecraft().id();
    let path = test_output("ephemeris_round_trip.csv");

    let mut memory = MemoryEphemeris::new(id);
    propagated.write_ephemeris(&mut memory).unwrap();
    let mut csv = CsvEphemeris::create(&path, id, ExportCfg::default());
    propagated.write_ephemeris(&mut csv).unwrap();

    let reopened = CsvEphemeris::open(&path, &catalog).unwrap();
    assert_eq!(reopened.object_id(), id);
    assert_eq!(reopened.samples().len(), propagated.states().len());
    assert_eq!(reopened.coverage().unwrap(), memory.coverage().unwrap());
    assert_eq!(reopened.coverage().unwrap().start(), propagated.window().start());

    // Between two samples
    let epoch = propagated.window().start() + 1234.5 * Unit::Second;
    for frame in [Frame::ICRF, CelestialBody::earth().body_fixed_frame()] {
        let expected = memory.read_at(epoch, frame, Aberration::None, 399).unwrap();
        let read = reopened.read_at(epoch, frame, Aberration::None, 399).unwrap();
        assert_eq!(read.frame, frame);
        assert_abs_diff_eq!(read.position_m, expected.position_m, epsilon = 1e-6);
        assert_abs_diff_eq!(read.velocity_m_s, expected.velocity_m_s, epsilon = 1e-9);
    }

    // The light leaving the spacecraft takes about 22 ms to reach the center
    let geometric = reopened.read_at(epoch, Frame::ICRF, Aberration::None, 399).unwrap();
    let delayed = reopened.read_at(epoch, Frame::ICRF, Aberration::LightTime, 399).unwrap();
    assert_eq!(delayed.epoch, epoch);
    let shift_m = (geometric.position_m - delayed.position_m).norm();
    assert!((100.0..250.0).contains(&shift_m), "{shift_m} m");

    // Only the center of motion may observe the spacecraft
    assert!(reopened.read_at(epoch, Frame::ICRF, Aberration::None, 301).is_err());
    let outside = propagated.window().end() + 1.0 * Unit::Day;
    assert!(reopened.read_at(outside, Frame::ICRF, Aberration::None, 399).is_err());
}

#[rstest]
fn bounded_export(propagated: Propagator) {
    let catalog = BodyCatalog::solar_system();
    let id = propagated.spacecraft().id();
    let path = test_output("bounded_export.csv");
    let start = propagated.window().start() + 10.0 * Unit::Minute;
    let end = propagated.window().start() + 20.0 * Unit::Minute;

    let cfg = ExportCfg::builder().start_epoch(start).end_epoch(end).build();
    let mut csv = CsvEphemeris::create(&path, id, cfg);
    propagated.write_ephemeris(&mut csv).unwrap();

    let reopened = CsvEphemeris::open(&path, &catalog).unwrap();
    let coverage = reopened.coverage().unwrap();
    assert_eq!(coverage.start(), start);
    assert_eq!(coverage.end(), end);
    assert_eq!(reopened.samples().len(), 61);
}

#[rstest]
fn orientation_round_trip(propagated: Propagator) {
    let id = propagated.spacecraft().id();
    let path = test_output("orientation_round_trip.csv");
    let mut csv = CsvOrientation::create(&path, id, ExportCfg::default());
    propagated.write_orientations(&mut csv).unwrap();

    let reopened = CsvOrientation::open(&path).unwrap();
    assert_eq!(reopened.object_id(), id);
    assert_eq!(reopened.coverage().unwrap(), propagated.orientation_coverage());

    // Without maneuvers, the back of the spacecraft keeps pointing along the initial nadir
    let epoch: Epoch = propagated.window().start() + 30.0 * Unit::Minute;
    let orientation = reopened.read_at(epoch, Frame::ICRF).unwrap();
    let initial_nadir = -propagated.states()[0].r_hat();
    assert_abs_diff_eq!(
        orientation.to_reference(&Spacecraft::BACK),
        initial_nadir,
        epsilon = 1e-9
    );
    assert!(reopened.read_at(epoch, CelestialBody::earth().body_fixed_frame()).is_err());
}
