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
    ensure_increasing, epoch_from_tdb_parts, epoch_to_tdb_parts, metadata_header, Aberration,
    EmptyKernelSnafu, ExportCfg, KernelAstroSnafu, KernelError, KernelInterpolationSnafu,
    MixedSamplesSnafu, NotCoveredSnafu, UnknownObserverSnafu,
};
use crate::cosmic::{BodyProvider, Frame, StateVector};
use crate::linalg::Vector3;
use crate::polyfit::hermite_eval;
use crate::time::{Epoch, Unit, Window};
use serde::{Deserialize, Serialize};
use snafu::{ensure, OptionExt, ResultExt};
use std::path::{Path, PathBuf};

/// Speed of light in vacuum, in m/s
pub const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;

/// Number of samples on each side of the requested epoch used by the interpolation
const SAMPLES_PER_SIDE: usize = 2;

/// Light time iterations, each one refines the emission epoch
const LIGHT_TIME_ITERATIONS: usize = 3;

/// Storage of the time ordered states of an object, relative to its center of motion.
pub trait EphemerisStore: Send + Sync {
    /// NAIF identifier of the object
    fn object_id(&self) -> i32;

    /// Appends the states to this kernel: any stored sample at or after the first new state is replaced.
    fn write_data(&mut self, states: &[StateVector]) -> Result<(), KernelError>;

    /// State of the object at the epoch, seen from the observer, in the requested frame.
    ///
    /// The observer must be the center of motion of the stored states.
    fn read_at(
        &self,
        epoch: Epoch,
        frame: Frame,
        aberration: Aberration,
        observer_id: i32,
    ) -> Result<StateVector, KernelError>;

    /// Time span between the first and the last samples
    fn coverage(&self) -> Result<Window, KernelError>;
}

/// An ephemeris kept in memory.
#[derive(Clone, Debug, PartialEq)]
pub struct MemoryEphemeris {
    object_id: i32,
    samples: Vec<StateVector>,
}

impl MemoryEphemeris {
    pub fn new(object_id: i32) -> Self {
        Self {
            object_id,
            samples: Vec::new(),
        }
    }

    pub fn samples(&self) -> &[StateVector] {
        &self.samples
    }

    /// Geometric state at the epoch, in the frame of the samples.
    ///
    /// Hermite interpolation of the position using the velocities as derivatives, over the two samples on
    /// each side of the epoch. The velocity is the derivative of the interpolated position.
    pub fn interpolate(&self, epoch: Epoch) -> Result<StateVector, KernelError> {
        let coverage = self.coverage()?;
        ensure!(
            coverage.contains(epoch),
            NotCoveredSnafu {
                object_id: self.object_id,
                epoch,
                coverage
            }
        );

        let idx = self.samples.partition_point(|state| state.epoch < epoch);
        if let Some(sample) = self.samples.get(idx) {
            if sample.epoch == epoch {
                return Ok(sample.clone());
            }
        }

        let first = idx.saturating_sub(SAMPLES_PER_SIDE);
        let last = (idx + SAMPLES_PER_SIDE).min(self.samples.len());
        let subset = &self.samples[first..last];
        let ref_epoch = subset[0].epoch;
        let ts: Vec<f64> = subset
            .iter()
            .map(|state| (state.epoch - ref_epoch).to_seconds())
            .collect();
        let t = (epoch - ref_epoch).to_seconds();

        let mut position_m = Vector3::zeros();
        let mut velocity_m_s = Vector3::zeros();
        for axis in 0..3 {
            let values: Vec<f64> = subset.iter().map(|state| state.position_m[axis]).collect();
            let derivs: Vec<f64> = subset.iter().map(|state| state.velocity_m_s[axis]).collect();
            let (value, deriv) = hermite_eval(&ts, &values, &derivs, t).context(KernelInterpolationSnafu)?;
            position_m[axis] = value;
            velocity_m_s[axis] = deriv;
        }

        Ok(StateVector::new(
            subset[0].center.clone(),
            position_m,
            velocity_m_s,
            epoch,
            subset[0].frame,
        ))
    }
}

impl EphemerisStore for MemoryEphemeris {
    fn object_id(&self) -> i32 {
        self.object_id
    }

    fn write_data(&mut self, states: &[StateVector]) -> Result<(), KernelError> {
        let reference = match self.samples.first().or(states.first()) {
            Some(state) => state.clone(),
            None => return Ok(()),
        };
        ensure_increasing(states.iter().map(|state| state.epoch))?;
        for state in states {
            ensure!(
                state.center.id == reference.center.id,
                MixedSamplesSnafu {
                    details: format!(
                        "center of motion ({} and {})",
                        reference.center.name, state.center.name
                    )
                }
            );
            ensure!(
                state.frame == reference.frame,
                MixedSamplesSnafu {
                    details: format!("frame ({} and {})", reference.frame, state.frame)
                }
            );
        }

        if let Some(first) = states.first() {
            let keep = self.samples.partition_point(|state| state.epoch < first.epoch);
            self.samples.truncate(keep);
        }
        self.samples.extend_from_slice(states);
        debug!(
            "ephemeris of {} now holds {} samples",
            self.object_id,
            self.samples.len()
        );
        Ok(())
    }

    fn read_at(
        &self,
        epoch: Epoch,
        frame: Frame,
        aberration: Aberration,
        observer_id: i32,
    ) -> Result<StateVector, KernelError> {
        let center_id = self
            .samples
            .first()
            .context(EmptyKernelSnafu {
                object_id: self.object_id,
            })?
            .center
            .id;
        ensure!(
            observer_id == center_id,
            UnknownObserverSnafu {
                observer_id,
                object_id: self.object_id,
                center_id
            }
        );

        let state = match aberration {
            Aberration::None => self.interpolate(epoch)?,
            Aberration::LightTime => {
                let mut state = self.interpolate(epoch)?;
                for _ in 0..LIGHT_TIME_ITERATIONS {
                    let light_time = (state.rmag_m() / SPEED_OF_LIGHT_M_S) * Unit::Second;
                    state = self.interpolate(epoch - light_time)?;
                }
                state.epoch = epoch;
                state
            }
        };

        state.to_frame(frame).context(KernelAstroSnafu)
    }

    fn coverage(&self) -> Result<Window, KernelError> {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => Ok(Window::new(first.epoch, last.epoch).map_err(|_| {
                KernelError::UnorderedSamples { epoch: last.epoch }
            })?),
            _ => Err(KernelError::EmptyKernel {
                object_id: self.object_id,
            }),
        }
    }
}

/// One line of an ephemeris file. The epoch is stored both as a human readable string and as the exact
/// TDB duration from the reference epoch, which is used on read.
#[derive(Debug, Serialize, Deserialize)]
struct EphemerisRecord {
    object_id: i32,
    center_id: i32,
    frame: Frame,
    epoch: String,
    tdb_centuries: i16,
    tdb_nanoseconds: u64,
    x_m: f64,
    y_m: f64,
    z_m: f64,
    vx_m_s: f64,
    vy_m_s: f64,
    vz_m_s: f64,
}

impl EphemerisRecord {
    fn from_state(object_id: i32, state: &StateVector) -> Self {
        let (tdb_centuries, tdb_nanoseconds) = epoch_to_tdb_parts(state.epoch);
        Self {
            object_id,
            center_id: state.center.id,
            frame: state.frame,
            epoch: format!("{}", state.epoch),
            tdb_centuries,
            tdb_nanoseconds,
            x_m: state.position_m.x,
            y_m: state.position_m.y,
            z_m: state.position_m.z,
            vx_m_s: state.velocity_m_s.x,
            vy_m_s: state.velocity_m_s.y,
            vz_m_s: state.velocity_m_s.z,
        }
    }

    fn to_state(&self, bodies: &dyn BodyProvider) -> Result<StateVector, KernelError> {
        Ok(StateVector::new(
            bodies.body(self.center_id).context(KernelAstroSnafu)?,
            Vector3::new(self.x_m, self.y_m, self.z_m),
            Vector3::new(self.vx_m_s, self.vy_m_s, self.vz_m_s),
            epoch_from_tdb_parts(self.tdb_centuries, self.tdb_nanoseconds),
            self.frame,
        ))
    }
}

/// An ephemeris backed by a CSV file, rewritten on each write.
///
/// The file starts with `#` comment lines holding the object identifier and the export metadata,
/// followed by one record per state.
#[derive(Clone, Debug)]
pub struct CsvEphemeris {
    path: PathBuf,
    cfg: ExportCfg,
    data: MemoryEphemeris,
}

impl CsvEphemeris {
    /// Prepares a new ephemeris file, only written on the first call to `write_data`.
    pub fn create<P: AsRef<Path>>(path: P, object_id: i32, cfg: ExportCfg) -> Self {
        Self {
            path: cfg.actual_path(path),
            cfg,
            data: MemoryEphemeris::new(object_id),
        }
    }

    /// Loads an ephemeris file, fetching the centers of motion from the provider.
    pub fn open<P: AsRef<Path>>(path: P, bodies: &dyn BodyProvider) -> Result<Self, KernelError> {
        let path = path.as_ref().to_path_buf();
        let (object_id, records) = super::read_kernel_file::<EphemerisRecord>(&path)?;
        let mut states = Vec::with_capacity(records.len());
        for record in records {
            ensure!(
                record.object_id == object_id,
                MixedSamplesSnafu {
                    details: format!("object ({object_id} and {})", record.object_id)
                }
            );
            states.push(record.to_state(bodies)?);
        }
        let mut data = MemoryEphemeris::new(object_id);
        data.write_data(&states)?;
        info!("loaded {} states of {object_id} from {}", states.len(), path.display());
        Ok(Self {
            path,
            cfg: ExportCfg::default(),
            data,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn samples(&self) -> &[StateVector] {
        self.data.samples()
    }

    fn flush(&self) -> Result<(), KernelError> {
        let header = metadata_header("Ephemeris", self.data.object_id, &self.cfg);
        let records = self
            .data
            .samples()
            .iter()
            .map(|state| EphemerisRecord::from_state(self.data.object_id, state));
        super::write_kernel_file(&self.path, &header, records)
    }
}

impl EphemerisStore for CsvEphemeris {
    fn object_id(&self) -> i32 {
        self.data.object_id
    }

    fn write_data(&mut self, states: &[StateVector]) -> Result<(), KernelError> {
        let exported: Vec<StateVector> = states
            .iter()
            .filter(|state| self.cfg.includes(state.epoch))
            .cloned()
            .collect();
        self.data.write_data(&exported)?;
        self.flush()
    }

    fn read_at(
        &self,
        epoch: Epoch,
        frame: Frame,
        aberration: Aberration,
        observer_id: i32,
    ) -> Result<StateVector, KernelError> {
        self.data.read_at(epoch, frame, aberration, observer_id)
    }

    fn coverage(&self) -> Result<Window, KernelError> {
        self.data.coverage()
    }
}

#[cfg(test)]
mod ut_ephemeris {
    use super::*;
    use crate::cosmic::{BodyCatalog, CelestialBody, OrbitalState};
    use crate::errors::ErrorKind;
    use approx::assert_abs_diff_eq;

    fn orbit() -> StateVector {
        StateVector::keplerian(
            CelestialBody::earth(),
            7_000_000.0,
            0.01,
            0.9,
            0.3,
            0.2,
            0.1,
            Epoch::from_tdb_seconds(0.0),
            Frame::ICRF,
        )
        .unwrap()
    }

    fn samples(count: usize, step_s: f64) -> Vec<StateVector> {
        let orbit = orbit();
        (0..count)
            .map(|i| orbit.to_state_vector(Epoch::from_tdb_seconds(i as f64 * step_s)))
            .collect()
    }

    fn kernel() -> MemoryEphemeris {
        let mut kernel = MemoryEphemeris::new(-12);
        kernel.write_data(&samples(20, 60.0)).unwrap();
        kernel
    }

    #[test]
    fn interpolation() {
        let kernel = kernel();
        let coverage = kernel.coverage().unwrap();
        assert_eq!(coverage.start(), Epoch::from_tdb_seconds(0.0));
        assert_eq!(coverage.end(), Epoch::from_tdb_seconds(1140.0));

        for t in [0.0, 12.5, 30.0, 601.0, 1100.0, 1140.0] {
            let epoch = Epoch::from_tdb_seconds(t);
            let state = kernel.read_at(epoch, Frame::ICRF, Aberration::None, 399).unwrap();
            let expected = orbit().to_state_vector(epoch);
            assert_eq!(state.epoch, epoch);
            assert_abs_diff_eq!(state.position_m, expected.position_m, epsilon = 1e-2);
            assert_abs_diff_eq!(state.velocity_m_s, expected.velocity_m_s, epsilon = 1e-3);
        }

        // Samples are returned as is
        let sample = &kernel.samples()[3];
        assert_eq!(&kernel.interpolate(sample.epoch).unwrap(), sample);
    }

    #[test]
    fn light_time() {
        let kernel = kernel();
        let epoch = Epoch::from_tdb_seconds(500.0);
        let state = kernel
            .read_at(epoch, Frame::ICRF, Aberration::LightTime, 399)
            .unwrap();
        let light_time_s = orbit().to_state_vector(epoch).rmag_m() / SPEED_OF_LIGHT_M_S;
        let expected = orbit().to_state_vector(epoch - light_time_s * Unit::Second);
        assert_eq!(state.epoch, epoch);
        assert_abs_diff_eq!(state.position_m, expected.position_m, epsilon = 1e-2);
        // About 23 ms of light time at 7000 km
        assert!((state.position_m - orbit().to_state_vector(epoch).position_m).norm() > 100.0);
    }

    #[test]
    fn body_fixed_read() {
        let kernel = kernel();
        let epoch = Epoch::from_tdb_seconds(90.0);
        let fixed = kernel
            .read_at(epoch, Frame::BodyFixed(399), Aberration::None, 399)
            .unwrap();
        let expected = orbit()
            .to_state_vector(epoch)
            .to_frame(Frame::BodyFixed(399))
            .unwrap();
        assert_eq!(fixed.frame, Frame::BodyFixed(399));
        assert_abs_diff_eq!(fixed.position_m, expected.position_m, epsilon = 1e-2);
    }

    #[test]
    fn read_errors() {
        let kernel = kernel();
        let late = kernel
            .read_at(Epoch::from_tdb_seconds(1200.0), Frame::ICRF, Aberration::None, 399)
            .unwrap_err();
        assert_eq!(late.kind(), ErrorKind::MissingData);
        assert!(matches!(late, KernelError::NotCovered { .. }));
        assert!(matches!(
            kernel.read_at(Epoch::from_tdb_seconds(10.0), Frame::ICRF, Aberration::None, 10),
            Err(KernelError::UnknownObserver { .. })
        ));
        assert_eq!(
            MemoryEphemeris::new(-3).coverage(),
            Err(KernelError::EmptyKernel { object_id: -3 })
        );
    }

    #[test]
    fn write_errors() {
        let mut kernel = kernel();
        let mut reversed = samples(3, 10.0);
        reversed.reverse();
        assert!(matches!(
            kernel.write_data(&reversed),
            Err(KernelError::UnorderedSamples { .. })
        ));
        let lunar = StateVector::cartesian(
            CelestialBody::moon(),
            2_000_000.0,
            0.0,
            0.0,
            0.0,
            1_500.0,
            0.0,
            Epoch::from_tdb_seconds(2000.0),
            Frame::ICRF,
        );
        assert!(matches!(
            kernel.write_data(&[lunar]),
            Err(KernelError::MixedSamples { .. })
        ));
        assert_eq!(kernel.samples().len(), 20);

        // Overlapping data replaces the end of the kernel
        kernel.write_data(&samples(5, 100.0)).unwrap();
        assert_eq!(kernel.samples().len(), 5);
        assert_eq!(kernel.coverage().unwrap().end(), Epoch::from_tdb_seconds(400.0));
    }

    #[test]
    fn csv_round_trip() {
        let _ = pretty_env_logger::try_init();
        let path = std::env::temp_dir().join("nyx-mission-ut").join("ephemeris-round-trip.csv");
        let cfg = ExportCfg::from_metadata(vec![("mission".to_string(), "round trip".to_string())]);
        let written = samples(10, 37.5);

        let mut kernel = CsvEphemeris::create(&path, -12, cfg);
        kernel.write_data(&written).unwrap();

        let loaded = CsvEphemeris::open(&path, &BodyCatalog::solar_system()).unwrap();
        assert_eq!(loaded.object_id(), -12);
        assert_eq!(loaded.samples(), &written[..]);
        assert_eq!(loaded.coverage(), kernel.coverage());
    }

    #[test]
    fn csv_export_bounds() {
        let path = std::env::temp_dir().join("nyx-mission-ut").join("ephemeris-bounds.csv");
        let cfg = ExportCfg::builder()
            .start_epoch(Epoch::from_tdb_seconds(100.0))
            .end_epoch(Epoch::from_tdb_seconds(300.0))
            .build();
        let mut kernel = CsvEphemeris::create(&path, -12, cfg);
        kernel.write_data(&samples(10, 50.0)).unwrap();
        assert_eq!(kernel.samples().len(), 5);

        let loaded = CsvEphemeris::open(&path, &BodyCatalog::solar_system()).unwrap();
        assert_eq!(loaded.samples(), kernel.samples());
        assert!(CsvEphemeris::open(std::env::temp_dir().join("nyx-mission-ut/none.csv"), &BodyCatalog::solar_system()).is_err());
    }
}
