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
    ensure_increasing, epoch_from_tdb_parts, epoch_to_tdb_parts, metadata_header, ExportCfg,
    FrameMismatchSnafu, KernelError, MixedSamplesSnafu, NotCoveredSnafu,
};
use crate::cosmic::{Frame, StateOrientation};
use crate::linalg::{Quaternion, UnitQuaternion, Vector3};
use crate::time::{Epoch, Window};
use serde::{Deserialize, Serialize};
use snafu::ensure;
use std::path::{Path, PathBuf};

/// Storage of the time ordered orientations of an object.
pub trait OrientationStore: Send + Sync {
    fn object_id(&self) -> i32;

    /// Appends the orientations: any stored sample at or after the first new one is replaced.
    fn write_data(&mut self, orientations: &[StateOrientation]) -> Result<(), KernelError>;

    /// Orientation at the epoch, interpolated between the surrounding samples.
    fn read_at(&self, epoch: Epoch, frame: Frame) -> Result<StateOrientation, KernelError>;

    fn coverage(&self) -> Result<Window, KernelError>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct MemoryOrientation {
    object_id: i32,
    samples: Vec<StateOrientation>,
}

impl MemoryOrientation {
    pub fn new(object_id: i32) -> Self {
        Self {
            object_id,
            samples: Vec::new(),
        }
    }

    pub fn samples(&self) -> &[StateOrientation] {
        &self.samples
    }
}

impl OrientationStore for MemoryOrientation {
    fn object_id(&self) -> i32 {
        self.object_id
    }

    fn write_data(&mut self, orientations: &[StateOrientation]) -> Result<(), KernelError> {
        let frame = match self.samples.first().or(orientations.first()) {
            Some(sample) => sample.frame,
            None => return Ok(()),
        };
        ensure_increasing(orientations.iter().map(|so| so.epoch))?;
        for so in orientations {
            ensure!(
                so.frame == frame,
                MixedSamplesSnafu {
                    details: format!("frame ({frame} and {})", so.frame)
                }
            );
        }
        if let Some(first) = orientations.first() {
            let keep = self.samples.partition_point(|so| so.epoch < first.epoch);
            self.samples.truncate(keep);
        }
        self.samples.extend_from_slice(orientations);
        Ok(())
    }

    fn read_at(&self, epoch: Epoch, frame: Frame) -> Result<StateOrientation, KernelError> {
        let coverage = self.coverage()?;
        ensure!(
            coverage.contains(epoch),
            NotCoveredSnafu {
                object_id: self.object_id,
                epoch,
                coverage
            }
        );
        let stored = self.samples[0].frame;
        ensure!(
            stored == frame,
            FrameMismatchSnafu {
                stored,
                requested: frame
            }
        );

        let idx = self.samples.partition_point(|so| so.epoch <= epoch);
        let before = &self.samples[idx - 1];
        Ok(match self.samples.get(idx) {
            Some(after) if before.epoch != epoch => before.interpolate(after, epoch),
            _ => *before,
        })
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

#[derive(Debug, Serialize, Deserialize)]
struct OrientationRecord {
    object_id: i32,
    frame: Frame,
    epoch: String,
    tdb_centuries: i16,
    tdb_nanoseconds: u64,
    qw: f64,
    qx: f64,
    qy: f64,
    qz: f64,
    wx_rad_s: f64,
    wy_rad_s: f64,
    wz_rad_s: f64,
}

impl OrientationRecord {
    fn from_orientation(object_id: i32, so: &StateOrientation) -> Self {
        let (tdb_centuries, tdb_nanoseconds) = epoch_to_tdb_parts(so.epoch);
        let q = so.orientation.quaternion();
        Self {
            object_id,
            frame: so.frame,
            epoch: format!("{}", so.epoch),
            tdb_centuries,
            tdb_nanoseconds,
            qw: q.w,
            qx: q.i,
            qy: q.j,
            qz: q.k,
            wx_rad_s: so.angular_velocity_rad_s.x,
            wy_rad_s: so.angular_velocity_rad_s.y,
            wz_rad_s: so.angular_velocity_rad_s.z,
        }
    }

    fn to_orientation(&self) -> StateOrientation {
        // Already normalized when written
        let orientation = UnitQuaternion::new_unchecked(Quaternion::new(self.qw, self.qx, self.qy, self.qz));
        StateOrientation::new(
            orientation,
            Vector3::new(self.wx_rad_s, self.wy_rad_s, self.wz_rad_s),
            epoch_from_tdb_parts(self.tdb_centuries, self.tdb_nanoseconds),
            self.frame,
        )
    }
}

/// An orientation kernel backed by a CSV file, rewritten on each write.
#[derive(Clone, Debug)]
pub struct CsvOrientation {
    path: PathBuf,
    cfg: ExportCfg,
    data: MemoryOrientation,
}

impl CsvOrientation {
    pub fn create<P: AsRef<Path>>(path: P, object_id: i32, cfg: ExportCfg) -> Self {
        Self {
            path: cfg.actual_path(path),
            cfg,
            data: MemoryOrientation::new(object_id),
        }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, KernelError> {
        let path = path.as_ref().to_path_buf();
        let (object_id, records) = super::read_kernel_file::<OrientationRecord>(&path)?;
        let mut orientations = Vec::with_capacity(records.len());
        for record in records {
            ensure!(
                record.object_id == object_id,
                MixedSamplesSnafu {
                    details: format!("object ({object_id} and {})", record.object_id)
                }
            );
            orientations.push(record.to_orientation());
        }
        let mut data = MemoryOrientation::new(object_id);
        data.write_data(&orientations)?;
        Ok(Self {
            path,
            cfg: ExportCfg::default(),
            data,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn samples(&self) -> &[StateOrientation] {
        self.data.samples()
    }
}

impl OrientationStore for CsvOrientation {
    fn object_id(&self) -> i32 {
        self.data.object_id
    }

    fn write_data(&mut self, orientations: &[StateOrientation]) -> Result<(), KernelError> {
        let exported: Vec<StateOrientation> = orientations
            .iter()
            .filter(|so| self.cfg.includes(so.epoch))
            .copied()
            .collect();
        self.data.write_data(&exported)?;

        let header = metadata_header("Orientation", self.data.object_id, &self.cfg);
        let records = self
            .data
            .samples()
            .iter()
            .map(|so| OrientationRecord::from_orientation(self.data.object_id, so));
        super::write_kernel_file(&self.path, &header, records)
    }

    fn read_at(&self, epoch: Epoch, frame: Frame) -> Result<StateOrientation, KernelError> {
        self.data.read_at(epoch, frame)
    }

    fn coverage(&self) -> Result<Window, KernelError> {
        self.data.coverage()
    }
}
