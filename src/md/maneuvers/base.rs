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

use super::{ManeuverId, ManeuverResult, ManeuverStatus, ManeuverStrategy};
use crate::cosmic::{AstroError, Engine, OrbitalState, Spacecraft, StateVector, STD_GRAVITY};
use crate::linalg::Vector3;
use crate::md::{InsufficientDeltaVSnafu, ManeuverError, NoEnginesSnafu, UnknownEngineSnafu};
use crate::propagators::Trajectory;
use crate::time::{Duration, Epoch, Unit, Window};
use snafu::ensure;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A maneuver: a strategy executed with a set of engines, and the outcome of its execution.
///
/// The maneuver is handed to a [`crate::propagators::Propagator`] which offers it every propagated
/// state until it executes. Execution consumes the fuel from the spacecraft tanks and rewrites the
/// propagated history from the beginning of the attitude window.
pub struct Maneuver {
    engines: Vec<String>,
    strategy: Box<dyn ManeuverStrategy>,
    minimum_epoch: Option<Epoch>,
    attitude_hold: Duration,
    maneuver_hold: Duration,
    status: ManeuverStatus,
    pub(crate) next: Option<ManeuverId>,
    delta_v_m_s: Option<Vector3<f64>>,
    fuel_burned_kg: f64,
    thrust_duration: Duration,
    thrust_window: Option<Window>,
    attitude_window: Option<Window>,
    maneuver_window: Option<Window>,
}

/// How an execution attempt stopped before failing or succeeding
enum Execution {
    Done,
    TooEarly(String),
}

impl Maneuver {
    /// Initializes a maneuver using the engines with the provided serial numbers.
    pub fn new<S: ManeuverStrategy + 'static>(
        engines: &[&str],
        strategy: S,
    ) -> Result<Self, ManeuverError> {
        ensure!(!engines.is_empty(), NoEnginesSnafu);
        Ok(Self {
            engines: engines.iter().map(|serial| serial.to_string()).collect(),
            strategy: Box::new(strategy),
            minimum_epoch: None,
            attitude_hold: Duration::ZERO,
            maneuver_hold: Duration::ZERO,
            status: ManeuverStatus::Idle,
            next: None,
            delta_v_m_s: None,
            fuel_burned_kg: 0.0,
            thrust_duration: Duration::ZERO,
            thrust_window: None,
            attitude_window: None,
            maneuver_window: None,
        })
    }

    /// The attitude window may not start before this epoch.
    pub fn with_minimum_epoch(mut self, epoch: Epoch) -> Self {
        self.minimum_epoch = Some(epoch);
        self
    }

    /// Minimum duration of the attitude window, starting with the thrust.
    pub fn with_attitude_hold(mut self, hold: Duration) -> Self {
        self.attitude_hold = hold;
        self
    }

    /// Duration after the maneuver point before which the next maneuver may not start.
    pub fn with_maneuver_hold(mut self, hold: Duration) -> Self {
        self.maneuver_hold = hold;
        self
    }

    pub fn engines(&self) -> &[String] {
        &self.engines
    }

    pub fn strategy(&self) -> &dyn ManeuverStrategy {
        self.strategy.as_ref()
    }

    pub fn minimum_epoch(&self) -> Option<Epoch> {
        self.minimum_epoch
    }

    pub fn status(&self) -> ManeuverStatus {
        self.status
    }

    pub fn next(&self) -> Option<ManeuverId> {
        self.next
    }

    /// Delta-v computed on the last execution attempt, kept for diagnostics when the maneuver failed.
    pub fn delta_v_m_s(&self) -> Option<Vector3<f64>> {
        self.delta_v_m_s
    }

    pub fn fuel_burned_kg(&self) -> f64 {
        self.fuel_burned_kg
    }

    pub fn thrust_duration(&self) -> Duration {
        self.thrust_duration
    }

    pub fn thrust_window(&self) -> Option<Window> {
        self.thrust_window
    }

    pub fn attitude_window(&self) -> Option<Window> {
        self.attitude_window
    }

    pub fn maneuver_window(&self) -> Option<Window> {
        self.maneuver_window
    }

    /// Checks that every engine is on board and that the strategy is compatible with the spacecraft.
    pub fn validate(&self, spacecraft: &Spacecraft) -> Result<(), ManeuverError> {
        for serial in &self.engines {
            ensure!(
                spacecraft.engine(serial).is_some(),
                UnknownEngineSnafu {
                    serial: serial.clone(),
                    spacecraft: spacecraft.name.clone(),
                }
            );
        }
        self.strategy.validate(spacecraft)
    }

    /// Makes this maneuver the one monitored by the propagator. The minimum epoch only ever moves forward.
    pub(crate) fn handle(&mut self, not_before: Option<Epoch>) {
        if let Some(epoch) = not_before {
            self.minimum_epoch = Some(match self.minimum_epoch {
                Some(current) if current > epoch => current,
                _ => epoch,
            });
        }
        self.status = ManeuverStatus::Monitoring;
    }

    /// Evaluates the trigger of the strategy on this state.
    pub fn can_execute(&mut self, state: &StateVector) -> bool {
        self.strategy.can_execute(state)
    }

    /// Executes the maneuver at this point if its trigger fired.
    ///
    /// On success, the fuel is taken from the tanks of the spacecraft of the trajectory and the history
    /// is rewritten from the start of the attitude window. A maneuver which cannot be executed yet leaves
    /// the trajectory untouched; a failed maneuver only keeps its computed delta-v.
    pub fn try_execute(&mut self, point: &StateVector, trajectory: &mut Trajectory) -> ManeuverResult {
        if !self.can_execute(point) {
            return ManeuverResult::TooEarly {
                reason: format!("trigger of {} not reached at {}", self.strategy, point.epoch),
            };
        }
        self.status = ManeuverStatus::Armed;
        debug!("{} armed at {}", self.strategy, point.epoch);

        match self.execute_at(point, trajectory) {
            Ok(Execution::Done) => {
                self.status = ManeuverStatus::Executed;
                info!(
                    "{} executed at {}: |Δv| = {:.6} m/s, {:.3} kg of fuel over {}",
                    self.strategy,
                    point.epoch,
                    self.delta_v_m_s.map_or(0.0, |dv| dv.norm()),
                    self.fuel_burned_kg,
                    self.thrust_duration
                );
                ManeuverResult::Executed
            }
            Ok(Execution::TooEarly(reason)) => {
                self.status = ManeuverStatus::Monitoring;
                debug!("{}: {reason}", self.strategy);
                ManeuverResult::TooEarly { reason }
            }
            Err(error) => {
                self.status = ManeuverStatus::Failed;
                warn!("{} failed at {}: {error}", self.strategy, point.epoch);
                ManeuverResult::Invalid { error }
            }
        }
    }

    fn execute_at(
        &mut self,
        point: &StateVector,
        trajectory: &mut Trajectory,
    ) -> Result<Execution, ManeuverError> {
        let delta_v = self
            .strategy
            .compute_delta_v(&trajectory.spacecraft, point)?;
        self.delta_v_m_s = Some(delta_v);
        let dv_m_s = delta_v.norm();

        let engines = self
            .engines
            .iter()
            .map(|serial| trajectory.spacecraft.try_engine(serial).cloned())
            .collect::<Result<Vec<Engine>, AstroError>>()?;

        let spacecraft = &trajectory.spacecraft;
        let mass_kg = spacecraft.total_mass_kg();
        let isp_s = average_isp(spacecraft, &engines);
        let available_m_s = Engine::delta_v(isp_s, mass_kg, mass_kg - candidate_fuel_kg(spacecraft, &engines));
        ensure!(
            available_m_s >= dv_m_s,
            InsufficientDeltaVSnafu {
                required_m_s: dv_m_s,
                available_m_s
            }
        );

        // Plan the thrust on a copy of the spacecraft, only committed once the windows are valid
        let mut planned = spacecraft.clone();
        let (thrust_s, fuel_burned_kg) = if dv_m_s > 0.0 {
            spread_thrust(&mut planned, &engines, dv_m_s)?
        } else {
            (0.0, 0.0)
        };
        let thrust_duration = thrust_s * Unit::Second;

        let thrust_window = window(point.epoch - (thrust_s / 2.0) * Unit::Second, thrust_duration)?;
        let attitude_window = if self.attitude_hold > thrust_duration {
            window(thrust_window.start(), self.attitude_hold)?
        } else {
            thrust_window
        };

        if let Some(minimum_epoch) = self.minimum_epoch {
            if attitude_window.start() < minimum_epoch {
                return Ok(Execution::TooEarly(format!(
                    "attitude window would start at {} before {minimum_epoch}",
                    attitude_window.start()
                )));
            }
        }

        let maneuver_hold = self.strategy.maneuver_hold().unwrap_or(self.maneuver_hold);
        let maneuver_window = attitude_window
            .merge(&thrust_window)
            .merge(&window(point.epoch, maneuver_hold)?);

        let begin_epoch = attitude_window.start();
        let begin = trajectory
            .find_nearest_lower_state_vector(begin_epoch)
            .map_or_else(
                || point.to_state_vector(begin_epoch),
                |nearest| nearest.to_state_vector(begin_epoch),
            );
        let post_burn = point.with_dv(delta_v);

        // Compute every sample before touching the history
        let mut samples = vec![begin, post_burn.clone()];
        if attitude_window.length() > Duration::ZERO {
            let remaining_s = (attitude_window.end() - point.epoch).to_seconds();
            for i in 1..=(remaining_s.floor() as i64) {
                samples.push(post_burn.to_state_vector(point.epoch + (i as f64) * Unit::Second));
            }
            samples.push(post_burn.to_state_vector(attitude_window.end()));
        }
        let orientations = samples
            .iter()
            .map(|state| self.strategy.compute_orientation(&planned, state))
            .collect::<Result<Vec<_>, ManeuverError>>()?;

        trajectory.spacecraft = planned;
        trajectory.erase_data_from_epoch_to_end(begin_epoch);
        for (state, orientation) in samples.into_iter().zip(orientations) {
            if trajectory.add_state_vector(state) {
                trajectory.add_state_orientation(orientation);
            }
        }

        self.fuel_burned_kg = fuel_burned_kg;
        self.thrust_duration = thrust_duration;
        self.thrust_window = Some(thrust_window);
        self.attitude_window = Some(attitude_window);
        self.maneuver_window = Some(maneuver_window);
        Ok(Execution::Done)
    }
}

impl fmt::Display for Maneuver {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} with engine(s) {} ({})",
            self.strategy,
            self.engines.join(", "),
            self.status
        )
    }
}

impl fmt::Debug for Maneuver {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self}")
    }
}

fn window(start: Epoch, length: Duration) -> Result<Window, ManeuverError> {
    Window::from_start_and_length(start, length).map_err(|e| ManeuverError::Infeasible {
        details: e.to_string(),
    })
}

/// Engines which can still thrust, grouped by fuel tank, with the cumulated fuel flow of each tank
fn active_tanks(spacecraft: &Spacecraft, engines: &[Engine]) -> BTreeMap<String, f64> {
    let mut tanks = BTreeMap::new();
    for engine in engines {
        if spacecraft
            .fuel_tank(&engine.fuel_tank)
            .map_or(false, |tank| !tank.is_empty())
        {
            *tanks.entry(engine.fuel_tank.clone()).or_insert(0.0) += engine.fuel_flow_kg_s;
        }
    }
    tanks
}

fn fuel_flow(spacecraft: &Spacecraft, engines: &[Engine]) -> f64 {
    active_tanks(spacecraft, engines).values().sum()
}

/// Fuel held by the distinct tanks feeding the engines
fn candidate_fuel_kg(spacecraft: &Spacecraft, engines: &[Engine]) -> f64 {
    let tanks: BTreeSet<&str> = engines.iter().map(|engine| engine.fuel_tank.as_str()).collect();
    tanks
        .into_iter()
        .filter_map(|serial| spacecraft.fuel_tank(serial))
        .map(|tank| tank.quantity_kg())
        .sum()
}

/// Thrust weighted specific impulse of the engines whose tank is not empty, zero if none can thrust
fn average_isp(spacecraft: &Spacecraft, engines: &[Engine]) -> f64 {
    let flow = fuel_flow(spacecraft, engines);
    if flow <= 0.0 {
        return 0.0;
    }
    let thrust: f64 = engines
        .iter()
        .filter(|engine| {
            spacecraft
                .fuel_tank(&engine.fuel_tank)
                .map_or(false, |tank| !tank.is_empty())
        })
        .map(|engine| engine.thrust_n())
        .sum();
    thrust / STD_GRAVITY / flow
}

/// Shortest time before one of the tanks in use runs dry, in seconds
fn min_remaining_thrust_s(spacecraft: &Spacecraft, engines: &[Engine]) -> Option<f64> {
    active_tanks(spacecraft, engines)
        .iter()
        .filter_map(|(serial, flow)| {
            spacecraft
                .fuel_tank(serial)
                .map(|tank| tank.quantity_kg() / flow)
        })
        .reduce(f64::min)
}

/// Fires every engine which can thrust for the duration and returns the fuel burned
fn burn(spacecraft: &mut Spacecraft, engines: &[Engine], duration_s: f64) -> Result<f64, AstroError> {
    let mut burned_kg = 0.0;
    for (serial, flow) in active_tanks(spacecraft, engines) {
        let available_kg = spacecraft
            .fuel_tank(&serial)
            .map_or(0.0, |tank| tank.quantity_kg());
        let fuel_kg = (flow * duration_s).min(available_kg);
        spacecraft.update_fuel_quantity(&serial, -fuel_kg)?;
        burned_kg += fuel_kg;
    }
    Ok(burned_kg)
}

/// Spreads the delta-v over the engines and returns the thrust duration in seconds and the fuel burned.
///
/// The engines thrust together until the first tank runs dry, then the remaining delta-v is recomputed
/// with the engines still fed, and so on.
fn spread_thrust(
    spacecraft: &mut Spacecraft,
    engines: &[Engine],
    delta_v_m_s: f64,
) -> Result<(f64, f64), AstroError> {
    let remaining_thrust_s = |sc: &Spacecraft, dv: f64| {
        let flow = fuel_flow(sc, engines);
        if flow <= 0.0 {
            0.0
        } else {
            Engine::delta_m(average_isp(sc, engines), sc.total_mass_kg(), dv) / flow
        }
    };

    let mut thrust_s = 0.0;
    let mut fuel_kg = 0.0;
    let mut cumulated_dv = 0.0;
    let mut remaining_s = remaining_thrust_s(spacecraft, delta_v_m_s);
    while let Some(step_s) = min_remaining_thrust_s(spacecraft, engines) {
        if step_s >= remaining_s {
            break;
        }
        let isp_s = average_isp(spacecraft, engines);
        let burned_kg = burn(spacecraft, engines, step_s)?;
        let mass_kg = spacecraft.total_mass_kg();
        cumulated_dv += Engine::delta_v(isp_s, mass_kg + burned_kg, mass_kg);
        thrust_s += step_s;
        fuel_kg += burned_kg;
        remaining_s = remaining_thrust_s(spacecraft, delta_v_m_s - cumulated_dv);
        trace!("tank emptied after {thrust_s} s, {remaining_s} s of thrust remaining");
    }
    fuel_kg += burn(spacecraft, engines, remaining_s)?;
    Ok((thrust_s + remaining_s, fuel_kg))
}
