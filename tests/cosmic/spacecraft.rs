extern crate nyx_mission as nyx;

use crate::test_data;
use approx::assert_relative_eq;
use nyx::cosmic::{BodyCatalog, FovShape, Spacecraft};
use nyx::io::Configurable;
use nyx::linalg::Vector3;
use nyx::time::Unit;
use nyx::ErrorKind;
use nyx::NyxError;
use rstest::*;

#[fixture]
fn demonstrator() -> Spacecraft {
    Spacecraft::from_yaml(test_data("spacecraft.yaml"), &BodyCatalog::solar_system()).unwrap()
}

#[rstest]
fn resources_from_configuration(demonstrator: Spacecraft) {
    let _ = pretty_env_logger::try_init();
    assert_eq!(demonstrator.id(), -172);
    assert_eq!(demonstrator.fuel_tanks().len(), 1);
    assert_eq!(demonstrator.engines()[0].fuel_tank, "ft1");
    assert_eq!(demonstrator.total_mass_kg(), 3050.0);
    assert_eq!(demonstrator.instrument(601).unwrap().shape, FovShape::Rectangular);

    // The imager looks along the front of the spacecraft
    let imager = demonstrator.instrument(601).unwrap();
    assert!(imager.is_in_field_of_view(&Spacecraft::FRONT));
    assert!(imager.is_in_field_of_view(&Vector3::new(0.04, 1.0, 0.0)));
    assert!(!imager.is_in_field_of_view(&Vector3::new(0.0, 1.0, 0.04)));
    assert!(!imager.is_in_field_of_view(&Spacecraft::BACK));
}

#[rstest]
fn burning_fuel(mut demonstrator: Spacecraft) {
    let full_dv = demonstrator.remaining_delta_v("eng1").unwrap();
    assert_relative_eq!(
        full_dv,
        450.0 * 9.80665 * (3050.0_f64 / 1050.0).ln(),
        max_relative = 1e-12
    );

    let burned = demonstrator.burn("eng1", 10.0 * Unit::Second).unwrap();
    assert_eq!(burned, 500.0);
    assert_eq!(demonstrator.fuel_mass_kg(), 1500.0);
    assert!(demonstrator.remaining_delta_v("eng1").unwrap() < full_dv);

    // Cannot burn more than what is left in the tank
    let err: NyxError = demonstrator.burn("eng1", 31.0 * Unit::Second).unwrap_err().into();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(demonstrator.fuel_mass_kg(), 1500.0);

    let err: NyxError = demonstrator.burn("eng2", 1.0 * Unit::Second).unwrap_err().into();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[rstest]
fn mass_budget(mut demonstrator: Spacecraft) {
    // 150 kg of margin below the maximum operating mass
    assert!(demonstrator.add_payload("pl2", "cubesat", 200.0).is_err());
    demonstrator.add_payload("pl2", "cubesat", 100.0).unwrap();
    assert!(demonstrator.add_payload("pl2", "cubesat", 10.0).is_err());

    let released = demonstrator.release_payload("pl1").unwrap();
    assert_eq!(released.mass_kg, 50.0);
    assert_eq!(demonstrator.total_mass_kg(), 3100.0);
    assert!(demonstrator.release_payload("pl1").is_err());
}

#[rstest]
fn configuration_round_trip(demonstrator: Spacecraft) {
    let cfg = demonstrator.to_config().unwrap();
    let yaml = serde_yaml::to_string(&cfg).unwrap();
    let reloaded = Spacecraft::from_config(
        serde_yaml::from_str(&yaml).unwrap(),
        &BodyCatalog::solar_system(),
    )
    .unwrap();
    assert_eq!(reloaded, demonstrator);
}
