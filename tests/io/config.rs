extern crate nyx_mission as nyx;

use crate::test_data;
use approx::assert_relative_eq;
use nyx::cosmic::{BodyCatalog, OrbitalParameters, OrbitalState};
use nyx::io::{ConfigRepr, DynamicsKind, OrbitConfig, PropagatorConfig};
use nyx::time::Unit;

#[test]
fn orbits_from_yaml() {
    let _ = pretty_env_logger::try_init();
    let catalog = BodyCatalog::solar_system();
    let configs = OrbitConfig::load_many(test_data("orbits.yaml")).unwrap();
    assert_eq!(configs.len(), 3);
    assert!(matches!(configs[0], OrbitConfig::Keplerian(_)));
    assert!(matches!(configs[1], OrbitConfig::Tle(_)));
    assert!(matches!(configs[2], OrbitConfig::Cartesian(_)));

    let orbits = configs
        .iter()
        .map(|cfg| cfg.to_parameters(&catalog))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    assert_relative_eq!(orbits[0].sma_m(), 42_164_000.0, max_relative = 1e-12);
    assert_relative_eq!(orbits[0].inclination_rad().to_degrees(), 0.05, max_relative = 1e-12);

    match &orbits[1] {
        OrbitalParameters::Tle(tle) => {
            assert_eq!(tle.name, "ISS (ZARYA)");
            assert_eq!(tle.satellite_number, 25544);
        }
        other => panic!("expected a TLE, got {other}"),
    }
    assert_relative_eq!(orbits[1].inclination_rad().to_degrees(), 51.6416, max_relative = 1e-9);

    assert_eq!(orbits[2].central_body().id, 301);
    assert!(orbits[2].is_elliptical());

    // Writing the configurations back keeps their representation
    for (cfg, orbit) in configs.iter().zip(&orbits) {
        let back = OrbitConfig::from_parameters(orbit);
        assert_eq!(
            std::mem::discriminant(&back),
            std::mem::discriminant(cfg),
            "{orbit}"
        );
    }
}

#[test]
fn unknown_center() {
    let yaml = r#"
- center: 599
  frame: ICRF
  epoch: 2023-01-01T00:00:00 TDB
  x_m: 1.0e8
  y_m: 0.0
  z_m: 0.0
  vx_m_s: 0.0
  vy_m_s: 1.0e4
  vz_m_s: 0.0
"#;
    let configs = OrbitConfig::loads_many(yaml).unwrap();
    assert!(configs[0].to_parameters(&BodyCatalog::solar_system()).is_err());
}

#[test]
fn propagator_from_yaml() {
    let cfg = PropagatorConfig::load(test_data("propagator.yaml")).unwrap();
    assert_eq!(cfg.dynamics, DynamicsKind::TwoBody);
    assert_eq!(cfg.step, 10.0 * Unit::Second);
    assert_eq!(cfg.window().unwrap().length(), 30_000.0 * Unit::Second);

    let j2: PropagatorConfig = serde_yaml::from_str(
        "start: 2023-01-01T00:00:00 TDB\nend: 2023-01-01T01:00:00 TDB\nstep: 1 min\ndynamics: j2\n",
    )
    .unwrap();
    assert_eq!(j2.dynamics, DynamicsKind::J2);
    assert_eq!(j2.step, 1.0 * Unit::Minute);
}
