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

use super::{AstroError, FuelQuantitySnafu, InvalidResourceSnafu, STD_GRAVITY};
use crate::linalg::Vector3;
use crate::time::{Duration, Unit};
use serde_derive::{Deserialize, Serialize};
use snafu::ensure;
use std::fmt;

/// A fuel tank, its quantity is always within [0, capacity].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FuelTank {
    pub serial_number: String,
    pub capacity_kg: f64,
    pub initial_quantity_kg: f64,
    quantity_kg: f64,
}

impl FuelTank {
    pub fn new(serial_number: &str, capacity_kg: f64, quantity_kg: f64) -> Result<Self, AstroError> {
        ensure!(
            !serial_number.trim().is_empty(),
            InvalidResourceSnafu {
                resource: "fuel tank",
                details: "serial number must be filled"
            }
        );
        ensure!(
            capacity_kg > 0.0,
            InvalidResourceSnafu {
                resource: "fuel tank",
                details: format!("capacity must be positive, got {capacity_kg} kg")
            }
        );
        ensure!(
            (0.0..=capacity_kg).contains(&quantity_kg),
            InvalidResourceSnafu {
                resource: "fuel tank",
                details: format!("quantity must be within [0, {capacity_kg}] kg, got {quantity_kg} kg")
            }
        );
        Ok(Self {
            serial_number: serial_number.to_string(),
            capacity_kg,
            initial_quantity_kg: quantity_kg,
            quantity_kg,
        })
    }

    /// Current quantity of fuel, in kg
    pub fn quantity_kg(&self) -> f64 {
        self.quantity_kg
    }

    pub fn is_empty(&self) -> bool {
        self.quantity_kg <= 0.0
    }

    /// Adds (or removes if negative) fuel. Fails without changing the tank if the result is out of [0, capacity].
    pub fn update_fuel_quantity(&mut self, delta_kg: f64) -> Result<(), AstroError> {
        let updated = self.quantity_kg + delta_kg;
        ensure!(
            delta_kg.is_finite() && (0.0..=self.capacity_kg).contains(&updated),
            FuelQuantitySnafu {
                serial: self.serial_number.clone(),
                quantity_kg: self.quantity_kg,
                capacity_kg: self.capacity_kg,
                delta_kg
            }
        );
        self.quantity_kg = updated;
        Ok(())
    }
}

impl fmt::Display for FuelTank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "tank {}: {:.3} / {:.3} kg",
            self.serial_number, self.quantity_kg, self.capacity_kg
        )
    }
}

/// An engine, drawing its fuel from the tank with the serial number `fuel_tank`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Engine {
    pub serial_number: String,
    pub name: String,
    pub fuel_tank: String,
    /// Position in the spacecraft frame, in meters
    pub position_m: Vector3<f64>,
    /// Thrust direction in the spacecraft frame
    pub orientation: Vector3<f64>,
    /// Specific impulse, in seconds
    pub isp_s: f64,
    /// in kg/s
    pub fuel_flow_kg_s: f64,
}

impl Engine {
    pub fn new(
        serial_number: &str,
        name: &str,
        fuel_tank: &str,
        position_m: Vector3<f64>,
        orientation: Vector3<f64>,
        isp_s: f64,
        fuel_flow_kg_s: f64,
    ) -> Result<Self, AstroError> {
        ensure!(
            !serial_number.trim().is_empty(),
            InvalidResourceSnafu {
                resource: "engine",
                details: "serial number must be filled"
            }
        );
        ensure!(
            !name.trim().is_empty(),
            InvalidResourceSnafu {
                resource: "engine",
                details: "name must be filled"
            }
        );
        ensure!(
            isp_s > 0.0,
            InvalidResourceSnafu {
                resource: "engine",
                details: format!("ISP must be positive, got {isp_s} s")
            }
        );
        ensure!(
            fuel_flow_kg_s > 0.0,
            InvalidResourceSnafu {
                resource: "engine",
                details: format!("fuel flow must be positive, got {fuel_flow_kg_s} kg/s")
            }
        );
        Ok(Self {
            serial_number: serial_number.to_string(),
            name: name.to_string(),
            fuel_tank: fuel_tank.to_string(),
            position_m,
            orientation,
            isp_s,
            fuel_flow_kg_s,
        })
    }

    /// Thrust in Newtons
    pub fn thrust_n(&self) -> f64 {
        self.isp_s * self.fuel_flow_kg_s * STD_GRAVITY
    }

    /// Tsiolkovsky rocket equation: delta-v (m/s) achieved when the mass goes from `initial_mass_kg` to `final_mass_kg`.
    pub fn delta_v(isp_s: f64, initial_mass_kg: f64, final_mass_kg: f64) -> f64 {
        isp_s * STD_GRAVITY * (initial_mass_kg / final_mass_kg).ln()
    }

    /// Burn duration needed to achieve the delta-v (m/s) with the provided fuel flow (kg/s).
    pub fn delta_t(isp_s: f64, initial_mass_kg: f64, fuel_flow_kg_s: f64, delta_v_m_s: f64) -> Duration {
        (Self::delta_m(isp_s, initial_mass_kg, delta_v_m_s) / fuel_flow_kg_s) * Unit::Second
    }

    /// Propellant mass consumed to achieve the delta-v (m/s).
    pub fn delta_m(isp_s: f64, initial_mass_kg: f64, delta_v_m_s: f64) -> f64 {
        initial_mass_kg * (1.0 - (-delta_v_m_s / (isp_s * STD_GRAVITY)).exp())
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "engine {} ({}): ISP {} s, flow {} kg/s, tank {}",
            self.serial_number, self.name, self.isp_s, self.fuel_flow_kg_s, self.fuel_tank
        )
    }
}

#[cfg(test)]
mod ut_propulsion {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn fuel_invariant() {
        assert!(FuelTank::new("", 10.0, 1.0).is_err());
        assert!(FuelTank::new("ft1", 0.0, 0.0).is_err());
        assert!(FuelTank::new("ft1", 10.0, 11.0).is_err());
        assert!(FuelTank::new("ft1", 10.0, -1.0).is_err());

        let mut tank = FuelTank::new("ft1", 10.0, 5.0).unwrap();
        tank.update_fuel_quantity(5.0).unwrap();
        assert_eq!(tank.quantity_kg(), 10.0);
        assert!(tank.update_fuel_quantity(0.1).is_err());
        assert_eq!(tank.quantity_kg(), 10.0);
        tank.update_fuel_quantity(-10.0).unwrap();
        assert!(tank.is_empty());
        assert!(tank.update_fuel_quantity(-1e-9).is_err());
        assert_eq!(tank.quantity_kg(), 0.0);
        assert_eq!(tank.initial_quantity_kg, 5.0);
    }

    #[test]
    fn rocket_equation_consistency() {
        for (isp, mass, flow, dv) in [(300.0, 3000.0, 50.0, 2000.0), (450.0, 12_000.0, 1.5, 35.0)] {
            let dt = Engine::delta_t(isp, mass, flow, dv).to_seconds();
            let dm = flow * dt;
            assert_relative_eq!(dm, Engine::delta_m(isp, mass, dv), max_relative = 1e-9);
            assert_relative_eq!(Engine::delta_v(isp, mass, mass - dm), dv, max_relative = 1e-9);
        }
    }

    #[test]
    fn engine_validation() {
        let pos = Vector3::zeros();
        let dir = Vector3::y();
        assert!(Engine::new("", "e", "ft1", pos, dir, 300.0, 50.0).is_err());
        assert!(Engine::new("e1", "", "ft1", pos, dir, 300.0, 50.0).is_err());
        assert!(Engine::new("e1", "e", "ft1", pos, dir, 0.0, 50.0).is_err());
        assert!(Engine::new("e1", "e", "ft1", pos, dir, 300.0, -1.0).is_err());
        let engine = Engine::new("e1", "e", "ft1", pos, dir, 300.0, 50.0).unwrap();
        assert_relative_eq!(engine.thrust_n(), 300.0 * 50.0 * STD_GRAVITY);
    }
}
