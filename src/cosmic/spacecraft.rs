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

use super::{
    AstroError, DuplicateResourceSnafu, Engine, FuelTank, InvalidResourceSnafu, MassBudgetSnafu,
    OrbitalParameters, UnknownResourceSnafu,
};
use crate::linalg::{UnitQuaternion, Vector3};
use crate::time::Duration;
use serde_derive::{Deserialize, Serialize};
use snafu::{ensure, OptionExt};
use std::fmt;

/// A releasable payload, its mass counts in the spacecraft mass until released.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub serial_number: String,
    pub name: String,
    pub mass_kg: f64,
}

impl Payload {
    pub fn new(serial_number: &str, name: &str, mass_kg: f64) -> Result<Self, AstroError> {
        ensure!(
            !serial_number.trim().is_empty(),
            InvalidResourceSnafu {
                resource: "payload",
                details: "serial number must be filled"
            }
        );
        ensure!(
            mass_kg > 0.0,
            InvalidResourceSnafu {
                resource: "payload",
                details: format!("mass must be positive, got {mass_kg} kg")
            }
        );
        Ok(Self {
            serial_number: serial_number.to_string(),
            name: name.to_string(),
            mass_kg,
        })
    }
}

/// Shape of the field of view of an instrument
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FovShape {
    Circular,
    Rectangular,
    Elliptical,
}

/// An instrument mounted on the spacecraft.
///
/// The orientation is the set of X-Y-Z Euler angles (radians) rotating the spacecraft frame onto the
/// instrument frame. The boresight and the reference vector are expressed in the instrument frame.
/// The field of view angle is the half angle along the reference vector and the cross angle is the half
/// angle along the axis perpendicular to both the boresight and the reference vector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: u16,
    pub name: String,
    pub orientation_rad: Vector3<f64>,
    pub shape: FovShape,
    pub boresight: Vector3<f64>,
    pub fov_ref_vector: Vector3<f64>,
    pub fov_angle_rad: f64,
    pub cross_angle_rad: f64,
}

impl Instrument {
    /// Initializes an instrument with a circular field of view.
    pub fn circular(
        id: u16,
        name: &str,
        orientation_rad: Vector3<f64>,
        boresight: Vector3<f64>,
        fov_ref_vector: Vector3<f64>,
        fov_angle_rad: f64,
    ) -> Result<Self, AstroError> {
        Self::validated(Self {
            id,
            name: name.to_string(),
            orientation_rad,
            shape: FovShape::Circular,
            boresight,
            fov_ref_vector,
            fov_angle_rad,
            cross_angle_rad: fov_angle_rad,
        })
    }

    /// Initializes an instrument with a rectangular or elliptical field of view.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u16,
        name: &str,
        orientation_rad: Vector3<f64>,
        shape: FovShape,
        boresight: Vector3<f64>,
        fov_ref_vector: Vector3<f64>,
        fov_angle_rad: f64,
        cross_angle_rad: f64,
    ) -> Result<Self, AstroError> {
        ensure!(
            shape != FovShape::Circular,
            InvalidResourceSnafu {
                resource: "instrument",
                details: "a circular field of view has no cross angle, use `Instrument::circular`"
            }
        );
        Self::validated(Self {
            id,
            name: name.to_string(),
            orientation_rad,
            shape,
            boresight,
            fov_ref_vector,
            fov_angle_rad,
            cross_angle_rad,
        })
    }

    fn validated(self) -> Result<Self, AstroError> {
        ensure!(
            self.id < 1000,
            InvalidResourceSnafu {
                resource: "instrument",
                details: format!("id must be below 1000, got {}", self.id)
            }
        );
        ensure!(
            !self.name.trim().is_empty(),
            InvalidResourceSnafu {
                resource: "instrument",
                details: "name must be filled"
            }
        );
        ensure!(
            self.boresight.norm() > f64::EPSILON
                && self.boresight.cross(&self.fov_ref_vector).norm() > f64::EPSILON,
            InvalidResourceSnafu {
                resource: "instrument",
                details: "boresight and reference vector must be non-null and not colinear"
            }
        );
        ensure!(
            self.fov_angle_rad > 0.0 && self.cross_angle_rad > 0.0,
            InvalidResourceSnafu {
                resource: "instrument",
                details: "field of view angles must be positive"
            }
        );
        Ok(self)
    }

    /// Identifier of the instrument for the spacecraft with the provided (negative) id
    pub fn naif_id(&self, spacecraft_id: i32) -> i32 {
        spacecraft_id * 1000 - i32::from(self.id)
    }

    /// Rotation from the instrument frame to the spacecraft frame
    pub fn rotation_to_spacecraft(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_euler_angles(
            self.orientation_rad.x,
            self.orientation_rad.y,
            self.orientation_rad.z,
        )
        .inverse()
    }

    /// Boresight direction in the spacecraft frame
    pub fn boresight_in_spacecraft_frame(&self) -> Vector3<f64> {
        (self.rotation_to_spacecraft() * self.boresight).normalize()
    }

    /// Returns whether the provided direction, in the spacecraft frame, is within the field of view.
    pub fn is_in_field_of_view(&self, direction: &Vector3<f64>) -> bool {
        let dir = self.rotation_to_spacecraft().inverse() * direction;
        let bore = self.boresight.normalize();
        let along_bore = dir.dot(&bore);
        if along_bore <= 0.0 {
            return false;
        }
        match self.shape {
            FovShape::Circular => bore.angle(&dir) <= self.fov_angle_rad,
            _ => {
                let ref_axis = (self.fov_ref_vector - bore * self.fov_ref_vector.dot(&bore)).normalize();
                let cross_axis = bore.cross(&ref_axis);
                let ref_angle = dir.dot(&ref_axis).atan2(along_bore);
                let cross_angle = dir.dot(&cross_axis).atan2(along_bore);
                if self.shape == FovShape::Rectangular {
                    ref_angle.abs() <= self.fov_angle_rad && cross_angle.abs() <= self.cross_angle_rad
                } else {
                    (ref_angle / self.fov_angle_rad).powi(2) + (cross_angle / self.cross_angle_rad).powi(2)
                        <= 1.0
                }
            }
        }
    }
}

/// A spacecraft with its resources and its initial orbital parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Spacecraft {
    id: i32,
    pub name: String,
    dry_mass_kg: f64,
    max_operating_mass_kg: f64,
    fuel_tanks: Vec<FuelTank>,
    engines: Vec<Engine>,
    payloads: Vec<Payload>,
    instruments: Vec<Instrument>,
    pub initial_orbit: OrbitalParameters,
}

impl Spacecraft {
    pub const UP: Vector3<f64> = Vector3::new(0.0, 0.0, 1.0);
    pub const DOWN: Vector3<f64> = Vector3::new(0.0, 0.0, -1.0);
    pub const FRONT: Vector3<f64> = Vector3::new(0.0, 1.0, 0.0);
    pub const BACK: Vector3<f64> = Vector3::new(0.0, -1.0, 0.0);
    pub const RIGHT: Vector3<f64> = Vector3::new(1.0, 0.0, 0.0);
    pub const LEFT: Vector3<f64> = Vector3::new(-1.0, 0.0, 0.0);

    /// Initializes a new spacecraft without any resources. The id must be negative.
    pub fn new(
        id: i32,
        name: &str,
        dry_mass_kg: f64,
        max_operating_mass_kg: f64,
        initial_orbit: OrbitalParameters,
    ) -> Result<Self, AstroError> {
        ensure!(
            id < 0,
            InvalidResourceSnafu {
                resource: "spacecraft",
                details: format!("id must be negative, got {id}")
            }
        );
        ensure!(
            !name.trim().is_empty(),
            InvalidResourceSnafu {
                resource: "spacecraft",
                details: "name must be filled"
            }
        );
        ensure!(
            dry_mass_kg > 0.0,
            InvalidResourceSnafu {
                resource: "spacecraft",
                details: format!("dry mass must be positive, got {dry_mass_kg} kg")
            }
        );
        ensure!(
            max_operating_mass_kg >= dry_mass_kg,
            MassBudgetSnafu {
                mass_kg: dry_mass_kg,
                max_kg: max_operating_mass_kg
            }
        );
        Ok(Self {
            id,
            name: name.to_string(),
            dry_mass_kg,
            max_operating_mass_kg,
            fuel_tanks: Vec::new(),
            engines: Vec::new(),
            payloads: Vec::new(),
            instruments: Vec::new(),
            initial_orbit,
        })
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn dry_mass_kg(&self) -> f64 {
        self.dry_mass_kg
    }

    pub fn max_operating_mass_kg(&self) -> f64 {
        self.max_operating_mass_kg
    }

    pub fn fuel_mass_kg(&self) -> f64 {
        self.fuel_tanks.iter().map(|tank| tank.quantity_kg()).sum()
    }

    pub fn payload_mass_kg(&self) -> f64 {
        self.payloads.iter().map(|payload| payload.mass_kg).sum()
    }

    /// Dry mass, fuel and payloads
    pub fn total_mass_kg(&self) -> f64 {
        self.dry_mass_kg + self.fuel_mass_kg() + self.payload_mass_kg()
    }

    fn ensure_mass_budget(&self, additional_kg: f64) -> Result<(), AstroError> {
        let mass_kg = self.total_mass_kg() + additional_kg;
        ensure!(
            mass_kg <= self.max_operating_mass_kg,
            MassBudgetSnafu {
                mass_kg,
                max_kg: self.max_operating_mass_kg
            }
        );
        Ok(())
    }

    pub fn add_fuel_tank(
        &mut self,
        serial_number: &str,
        capacity_kg: f64,
        quantity_kg: f64,
    ) -> Result<(), AstroError> {
        let tank = FuelTank::new(serial_number, capacity_kg, quantity_kg)?;
        ensure!(
            self.fuel_tank(serial_number).is_none(),
            DuplicateResourceSnafu {
                resource: "fuel tank",
                serial: serial_number
            }
        );
        self.ensure_mass_budget(quantity_kg)?;
        self.fuel_tanks.push(tank);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_engine(
        &mut self,
        serial_number: &str,
        name: &str,
        fuel_tank: &str,
        position_m: Vector3<f64>,
        orientation: Vector3<f64>,
        isp_s: f64,
        fuel_flow_kg_s: f64,
    ) -> Result<(), AstroError> {
        let engine = Engine::new(
            serial_number,
            name,
            fuel_tank,
            position_m,
            orientation,
            isp_s,
            fuel_flow_kg_s,
        )?;
        ensure!(
            self.engine(serial_number).is_none(),
            DuplicateResourceSnafu {
                resource: "engine",
                serial: serial_number
            }
        );
        ensure!(
            self.fuel_tank(fuel_tank).is_some(),
            UnknownResourceSnafu {
                resource: "fuel tank",
                serial: fuel_tank
            }
        );
        self.engines.push(engine);
        Ok(())
    }

    pub fn add_payload(&mut self, serial_number: &str, name: &str, mass_kg: f64) -> Result<(), AstroError> {
        let payload = Payload::new(serial_number, name, mass_kg)?;
        ensure!(
            self.payloads.iter().all(|p| p.serial_number != serial_number),
            DuplicateResourceSnafu {
                resource: "payload",
                serial: serial_number
            }
        );
        self.ensure_mass_budget(mass_kg)?;
        self.payloads.push(payload);
        Ok(())
    }

    /// Removes the payload from the spacecraft and returns it.
    pub fn release_payload(&mut self, serial_number: &str) -> Result<Payload, AstroError> {
        let idx = self
            .payloads
            .iter()
            .position(|p| p.serial_number == serial_number)
            .context(UnknownResourceSnafu {
                resource: "payload",
                serial: serial_number,
            })?;
        let payload = self.payloads.remove(idx);
        info!("{} released payload {}", self.name, payload.serial_number);
        Ok(payload)
    }

    pub fn add_instrument(&mut self, instrument: Instrument) -> Result<(), AstroError> {
        ensure!(
            self.instrument(instrument.id).is_none(),
            DuplicateResourceSnafu {
                resource: "instrument",
                serial: instrument.id.to_string()
            }
        );
        self.instruments.push(instrument);
        Ok(())
    }

    pub fn fuel_tanks(&self) -> &[FuelTank] {
        &self.fuel_tanks
    }

    pub fn engines(&self) -> &[Engine] {
        &self.engines
    }

    pub fn payloads(&self) -> &[Payload] {
        &self.payloads
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn fuel_tank(&self, serial_number: &str) -> Option<&FuelTank> {
        self.fuel_tanks.iter().find(|t| t.serial_number == serial_number)
    }

    pub fn engine(&self, serial_number: &str) -> Option<&Engine> {
        self.engines.iter().find(|e| e.serial_number == serial_number)
    }

    pub fn instrument(&self, id: u16) -> Option<&Instrument> {
        self.instruments.iter().find(|i| i.id == id)
    }

    /// Returns the engine with this serial number or an unknown resource error
    pub fn try_engine(&self, serial_number: &str) -> Result<&Engine, AstroError> {
        self.engine(serial_number).context(UnknownResourceSnafu {
            resource: "engine",
            serial: serial_number,
        })
    }

    /// Adds (or removes if negative) fuel to the tank with this serial number.
    pub fn update_fuel_quantity(&mut self, serial_number: &str, delta_kg: f64) -> Result<(), AstroError> {
        if delta_kg > 0.0 {
            self.ensure_mass_budget(delta_kg)?;
        }
        self.fuel_tanks
            .iter_mut()
            .find(|t| t.serial_number == serial_number)
            .context(UnknownResourceSnafu {
                resource: "fuel tank",
                serial: serial_number,
            })?
            .update_fuel_quantity(delta_kg)
    }

    /// Delta-v still achievable by this engine alone, with the fuel of its tank.
    pub fn remaining_delta_v(&self, engine_serial: &str) -> Result<f64, AstroError> {
        let engine = self.try_engine(engine_serial)?;
        let tank = self.fuel_tank(&engine.fuel_tank).context(UnknownResourceSnafu {
            resource: "fuel tank",
            serial: engine.fuel_tank.as_str(),
        })?;
        let mass = self.total_mass_kg();
        Ok(Engine::delta_v(engine.isp_s, mass, mass - tank.quantity_kg()))
    }

    /// Fires the engine during the provided duration and returns the fuel consumed, in kg.
    pub fn burn(&mut self, engine_serial: &str, duration: Duration) -> Result<f64, AstroError> {
        let engine = self.try_engine(engine_serial)?;
        let fuel_kg = engine.fuel_flow_kg_s * duration.to_seconds();
        ensure!(
            fuel_kg >= 0.0,
            InvalidResourceSnafu {
                resource: "burn",
                details: format!("duration must be positive, got {duration}")
            }
        );
        let tank = engine.fuel_tank.clone();
        self.update_fuel_quantity(&tank, -fuel_kg)?;
        Ok(fuel_kg)
    }
}

impl fmt::Display for Spacecraft {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} ({}): {:.3} kg ({:.3} kg dry, {:.3} kg fuel in {} tank(s), {} engine(s), {} payload(s))",
            self.name,
            self.id,
            self.total_mass_kg(),
            self.dry_mass_kg,
            self.fuel_mass_kg(),
            self.fuel_tanks.len(),
            self.engines.len(),
            self.payloads.len()
        )
    }
}

#[cfg(test)]
mod ut_spacecraft {
    use super::*;
    use crate::cosmic::{CelestialBody, Frame, StateVector};
    use crate::errors::ErrorKind;
    use crate::time::{Epoch, Unit};
    use approx::assert_relative_eq;

    fn spacecraft() -> Spacecraft {
        let orbit = StateVector::new(
            CelestialBody::earth(),
            Vector3::new(6_678_000.0, 0.0, 0.0),
            Vector3::new(0.0, 7727.0, 0.0),
            Epoch::from_tdb_seconds(0.0),
            Frame::ICRF,
        );
        Spacecraft::new(-1, "sc", 1000.0, 3000.0, orbit.into()).unwrap()
    }

    #[test]
    fn resources() {
        assert!(Spacecraft::new(1, "sc", 1000.0, 3000.0, spacecraft().initial_orbit).is_err());

        let mut sc = spacecraft();
        sc.add_fuel_tank("ft1", 1000.0, 900.0).unwrap();
        assert!(sc.add_fuel_tank("ft1", 1000.0, 900.0).is_err());
        let err = sc.add_fuel_tank("ft2", 2000.0, 1500.0).unwrap_err();
        assert!(matches!(err, AstroError::MassBudget { .. }));
        assert_eq!(sc.fuel_tanks().len(), 1);

        let err = sc
            .add_engine("e1", "main", "ft9", Vector3::zeros(), Spacecraft::FRONT, 300.0, 50.0)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        sc.add_engine("e1", "main", "ft1", Vector3::zeros(), Spacecraft::FRONT, 300.0, 50.0)
            .unwrap();
        assert!(sc
            .add_engine("e1", "main", "ft1", Vector3::zeros(), Spacecraft::FRONT, 300.0, 50.0)
            .is_err());

        sc.add_payload("pl1", "cubesat", 50.0).unwrap();
        assert!(sc.add_payload("pl1", "cubesat", 50.0).is_err());
        assert_relative_eq!(sc.total_mass_kg(), 1950.0);
        let released = sc.release_payload("pl1").unwrap();
        assert_eq!(released.mass_kg, 50.0);
        assert!(sc.release_payload("pl1").is_err());
        assert_relative_eq!(sc.total_mass_kg(), 1900.0);
    }

    #[test]
    fn burn_and_remaining_dv() {
        let mut sc = spacecraft();
        sc.add_fuel_tank("ft1", 1000.0, 900.0).unwrap();
        sc.add_engine("e1", "main", "ft1", Vector3::zeros(), Spacecraft::FRONT, 300.0, 50.0)
            .unwrap();
        assert_relative_eq!(
            sc.remaining_delta_v("e1").unwrap(),
            Engine::delta_v(300.0, 1900.0, 1000.0)
        );
        let fuel = sc.burn("e1", 10.0 * Unit::Second).unwrap();
        assert_relative_eq!(fuel, 500.0);
        assert_relative_eq!(sc.fuel_mass_kg(), 400.0);
        // Not enough fuel left for another 10 seconds
        assert!(sc.burn("e1", 10.0 * Unit::Second).is_err());
        assert_relative_eq!(sc.fuel_mass_kg(), 400.0);
        assert!(sc.remaining_delta_v("nope").is_err());
    }

    #[test]
    fn instrument_fov() {
        let mut sc = spacecraft();
        assert!(Instrument::circular(1000, "cam", Vector3::zeros(), Vector3::z(), Vector3::x(), 0.1).is_err());
        let cam = Instrument::circular(600, "cam", Vector3::zeros(), Vector3::z(), Vector3::x(), 0.1)
            .unwrap();
        assert_eq!(cam.naif_id(sc.id()), -1600);
        assert!(cam.is_in_field_of_view(&Vector3::new(0.05, 0.0, 1.0)));
        assert!(!cam.is_in_field_of_view(&Vector3::new(0.2, 0.0, 1.0)));
        assert!(!cam.is_in_field_of_view(&-Vector3::z()));

        let rect = Instrument::new(
            601,
            "spectro",
            Vector3::zeros(),
            FovShape::Rectangular,
            Vector3::z(),
            Vector3::x(),
            0.2,
            0.05,
        )
        .unwrap();
        assert!(rect.is_in_field_of_view(&Vector3::new(0.15, 0.0, 1.0)));
        assert!(!rect.is_in_field_of_view(&Vector3::new(0.0, 0.15, 1.0)));

        sc.add_instrument(cam.clone()).unwrap();
        assert!(sc.add_instrument(cam).is_err());
        sc.add_instrument(rect).unwrap();
        assert_eq!(sc.instruments().len(), 2);
    }
}
