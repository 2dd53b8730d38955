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
use super::{ConfigError, ConfigRepr, Configurable, OrbitConfig};
use crate::cosmic::{BodyProvider, FovShape, Instrument, Spacecraft};
use crate::linalg::Vector3;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FuelTankConfig {
    pub serial_number: String,
    pub capacity_kg: f64,
    pub quantity_kg: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    pub serial_number: String,
    pub name: String,
    /// Serial number of the tank feeding this engine
    pub fuel_tank: String,
    #[serde(default)]
    pub position_m: Vector3<f64>,
    /// Thrust direction in the spacecraft frame
    pub orientation: Vector3<f64>,
    pub isp_s: f64,
    pub fuel_flow_kg_s: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PayloadConfig {
    pub serial_number: String,
    pub name: String,
    pub mass_kg: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct InstrumentConfig {
    pub id: u16,
    pub name: String,
    /// X-Y-Z Euler angles from the spacecraft frame to the instrument frame
    #[serde(default)]
    pub orientation_rad: Vector3<f64>,
    #[serde(default = "circular")]
    pub shape: FovShape,
    pub boresight: Vector3<f64>,
    pub fov_ref_vector: Vector3<f64>,
    pub fov_angle_rad: f64,
    /// Only for rectangular and elliptical fields of view
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_angle_rad: Option<f64>,
}

fn circular() -> FovShape {
    FovShape::Circular
}

impl InstrumentConfig {
    fn build(&self) -> Result<Instrument, ConfigError> {
        let instrument = match (self.shape, self.cross_angle_rad) {
            (FovShape::Circular, _) => Instrument::circular(
                self.id,
                &self.name,
                self.orientation_rad,
                self.boresight,
                self.fov_ref_vector,
                self.fov_angle_rad,
            )?,
            (shape, Some(cross_angle_rad)) => Instrument::new(
                self.id,
                &self.name,
                self.orientation_rad,
                shape,
                self.boresight,
                self.fov_ref_vector,
                self.fov_angle_rad,
                cross_angle_rad,
            )?,
            (shape, None) => {
                return Err(ConfigError::InvalidConfig(format!(
                    "instrument {}: a {shape:?} field of view requires a cross angle",
                    self.id
                )))
            }
        };
        Ok(instrument)
    }
}

/// Spacecraft and its resources as written in a configuration file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SpacecraftConfig {
    /// Negative NAIF identifier
    pub id: i32,
    pub name: String,
    pub dry_mass_kg: f64,
    pub max_operating_mass_kg: f64,
    pub orbit: OrbitConfig,
    #[serde(default)]
    pub fuel_tanks: Vec<FuelTankConfig>,
    #[serde(default)]
    pub engines: Vec<EngineConfig>,
    #[serde(default)]
    pub payloads: Vec<PayloadConfig>,
    #[serde(default)]
    pub instruments: Vec<InstrumentConfig>,
}

impl ConfigRepr for SpacecraftConfig {}

impl Configurable for Spacecraft {
    type IntermediateRepr = SpacecraftConfig;

    fn from_config(cfg: Self::IntermediateRepr, bodies: &dyn BodyProvider) -> Result<Self, ConfigError> {
        let orbit = cfg.orbit.to_parameters(bodies)?;
        let mut sc = Spacecraft::new(
            cfg.id,
            &cfg.name,
            cfg.dry_mass_kg,
            cfg.max_operating_mass_kg,
            orbit,
        )?;
        for tank in &cfg.fuel_tanks {
            sc.add_fuel_tank(&tank.serial_number, tank.capacity_kg, tank.quantity_kg)?;
        }
        for engine in &cfg.engines {
            sc.add_engine(
                &engine.serial_number,
                &engine.name,
                &engine.fuel_tank,
                engine.position_m,
                engine.orientation,
                engine.isp_s,
                engine.fuel_flow_kg_s,
            )?;
        }
        for payload in &cfg.payloads {
            sc.add_payload(&payload.serial_number, &payload.name, payload.mass_kg)?;
        }
        for instrument in &cfg.instruments {
            sc.add_instrument(instrument.build()?)?;
        }
        debug!(
            "configured {}: {} tank(s), {} engine(s), total mass {} kg",
            sc.name,
            sc.fuel_tanks().len(),
            sc.engines().len(),
            sc.total_mass_kg()
        );
        Ok(sc)
    }

    fn to_config(&self) -> Result<Self::IntermediateRepr, ConfigError> {
        Ok(SpacecraftConfig {
            id: self.id(),
            name: self.name.clone(),
            dry_mass_kg: self.dry_mass_kg(),
            max_operating_mass_kg: self.max_operating_mass_kg(),
            orbit: OrbitConfig::from_parameters(&self.initial_orbit),
            fuel_tanks: self
                .fuel_tanks()
                .iter()
                .map(|tank| FuelTankConfig {
                    serial_number: tank.serial_number.clone(),
                    capacity_kg: tank.capacity_kg,
                    quantity_kg: tank.quantity_kg(),
                })
                .collect(),
            engines: self
                .engines()
                .iter()
                .map(|engine| EngineConfig {
                    serial_number: engine.serial_number.clone(),
                    name: engine.name.clone(),
                    fuel_tank: engine.fuel_tank.clone(),
                    position_m: engine.position_m,
                    orientation: engine.orientation,
                    isp_s: engine.isp_s,
                    fuel_flow_kg_s: engine.fuel_flow_kg_s,
                })
                .collect(),
            payloads: self
                .payloads()
                .iter()
                .map(|payload| PayloadConfig {
                    serial_number: payload.serial_number.clone(),
                    name: payload.name.clone(),
                    mass_kg: payload.mass_kg,
                })
                .collect(),
            instruments: self
                .instruments()
                .iter()
                .map(|instrument| InstrumentConfig {
                    id: instrument.id,
                    name: instrument.name.clone(),
                    orientation_rad: instrument.orientation_rad,
                    shape: instrument.shape,
                    boresight: instrument.boresight,
                    fov_ref_vector: instrument.fov_ref_vector,
                    fov_angle_rad: instrument.fov_angle_rad,
                    cross_angle_rad: match instrument.shape {
                        FovShape::Circular => None,
                        _ => Some(instrument.cross_angle_rad),
                    },
                })
                .collect(),
        })
    }
}
