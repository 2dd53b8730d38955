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
use crate::cosmic::{AstroError, BodyProvider, Frame};
use crate::errors::ErrorKind;
use crate::polyfit::InterpolationError;
use crate::time::{Duration, Epoch, Window};
use hifitime::prelude::{Format, Formatter};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde::{Serialize, Serializer};
use snafu::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use typed_builder::TypedBuilder;

/// Ephemeris kernels: time ordered state vectors of an object, interpolated on read.
pub mod ephemeris;
pub use ephemeris::{CsvEphemeris, EphemerisStore, MemoryEphemeris};
/// Orientation kernels: time ordered attitudes of an object, interpolated on read.
pub mod orientation;
pub use orientation::{CsvOrientation, MemoryOrientation, OrientationStore};
pub mod orbit;
pub use orbit::OrbitConfig;
pub mod spacecraft;
pub use spacecraft::{EngineConfig, FuelTankConfig, InstrumentConfig, PayloadConfig, SpacecraftConfig};
pub mod propagation;
pub use propagation::{DynamicsKind, PropagatorConfig};

use std::io;
use thiserror::Error;

/// Configuration for exporting a kernel to a CSV file.
#[derive(Clone, Debug, Default, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
pub struct ExportCfg {
    /// Start epoch to export, defaults to the first sample
    #[builder(default, setter(strip_option))]
    pub start_epoch: Option<Epoch>,
    /// End epoch to export, defaults to the last sample
    #[builder(default, setter(strip_option))]
    pub end_epoch: Option<Epoch>,
    /// Additional metadata written as comments at the top of the file
    #[builder(default, setter(strip_option))]
    pub metadata: Option<HashMap<String, String>>,
    /// Set to true to append the timestamp to the filename
    #[builder(default)]
    pub timestamp: bool,
}

impl ExportCfg {
    /// Initialize a new configuration with the given metadata entries.
    pub fn from_metadata(metadata: Vec<(String, String)>) -> Self {
        Self {
            metadata: Some(metadata.into_iter().collect()),
            ..Default::default()
        }
    }

    /// Initialize a new default configuration but timestamp the filename.
    pub fn timestamped() -> Self {
        Self {
            timestamp: true,
            ..Default::default()
        }
    }

    /// Returns true if the epoch is within the export bounds
    pub fn includes(&self, epoch: Epoch) -> bool {
        self.start_epoch.map_or(true, |start| epoch >= start)
            && self.end_epoch.map_or(true, |end| epoch <= end)
    }

    /// Modifies the provided path to include the timestamp if required.
    pub(crate) fn actual_path<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        let mut path_buf = path.as_ref().to_path_buf();
        if !self.timestamp {
            return path_buf;
        }
        let (stem, ext) = match (path_buf.file_stem(), path_buf.extension()) {
            (Some(stem), Some(ext)) => (
                stem.to_string_lossy().to_string(),
                ext.to_string_lossy().to_string(),
            ),
            _ => return path_buf,
        };
        match (Epoch::now(), Format::from_str("%Y-%m-%dT%H-%M-%S")) {
            (Ok(now), Ok(format)) => {
                let stamp = Formatter::new(now, format);
                path_buf.set_file_name(format!("{stem}-{stamp}.{ext}"));
            }
            _ => warn!("could not timestamp {}, using it as is", path_buf.display()),
        }
        path_buf
    }
}

/// Aberration correction applied when reading an ephemeris
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aberration {
    /// Geometric state
    #[default]
    None,
    /// State of the object when the light received at the epoch left it
    LightTime,
}

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum KernelError {
    #[snafu(display("no data for object {object_id} at {epoch}: kernel covers {coverage}"))]
    NotCovered {
        object_id: i32,
        epoch: Epoch,
        coverage: Window,
    },
    #[snafu(display("kernel of object {object_id} holds no data"))]
    EmptyKernel { object_id: i32 },
    #[snafu(display("cannot observe from {observer_id}: data of object {object_id} is relative to {center_id}"))]
    UnknownObserver {
        observer_id: i32,
        object_id: i32,
        center_id: i32,
    },
    #[snafu(display("samples must be in strictly increasing order, sample at {epoch} is not"))]
    UnorderedSamples { epoch: Epoch },
    #[snafu(display("all samples of a kernel must share the same {details}"))]
    MixedSamples { details: String },
    #[snafu(display("kernel data is in {stored}, cannot read it in {requested}"))]
    FrameMismatch { stored: Frame, requested: Frame },
    #[snafu(display("kernel file {path}: {details}"))]
    KernelIo { path: String, details: String },
    #[snafu(display("malformed kernel {path}: {details}"))]
    KernelParse { path: String, details: String },
    #[snafu(display("kernel data is invalid: {source}"))]
    KernelAstro { source: AstroError },
    #[snafu(display("kernel interpolation failed: {source}"))]
    KernelInterpolation { source: InterpolationError },
}

impl KernelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotCovered { .. }
            | Self::EmptyKernel { .. }
            | Self::UnknownObserver { .. }
            | Self::KernelIo { .. } => ErrorKind::MissingData,
            Self::KernelParse { .. } => ErrorKind::Parse,
            Self::KernelAstro { source } => source.kind(),
            Self::UnorderedSamples { .. }
            | Self::MixedSamples { .. }
            | Self::FrameMismatch { .. }
            | Self::KernelInterpolation { .. } => ErrorKind::InvalidArgument,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] io::Error),

    #[error("Failed to parse YAML configuration file: {0}")]
    ParseError(#[source] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PartialEq for ConfigError {
    /// No two configuration errors match
    fn eq(&self, _other: &Self) -> bool {
        false
    }
}

impl From<AstroError> for ConfigError {
    fn from(error: AstroError) -> Self {
        Self::InvalidConfig(error.to_string())
    }
}

pub trait ConfigRepr: Debug + Sized + Serialize + DeserializeOwned {
    /// Builds the configuration representation from the path to a yaml
    fn load<P>(path: P) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        serde_yaml::from_reader(reader).map_err(ConfigError::ParseError)
    }

    /// Builds a sequence of "Selves" from the provided path to a yaml
    fn load_many<P>(path: P) -> Result<Vec<Self>, ConfigError>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        serde_yaml::from_reader(reader).map_err(ConfigError::ParseError)
    }

    /// Builds a map of names to "selves" from the provided path to a yaml
    fn load_named<P>(path: P) -> Result<BTreeMap<String, Self>, ConfigError>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        serde_yaml::from_reader(reader).map_err(ConfigError::ParseError)
    }

    /// Builds a sequence of "Selves" from the provided string of a yaml
    fn loads_many(data: &str) -> Result<Vec<Self>, ConfigError> {
        debug!("Loading YAML:\n{data}");
        serde_yaml::from_str(data).map_err(ConfigError::ParseError)
    }
}

/// Trait to specify that a structure can be configured from a YAML file.
pub trait Configurable
where
    Self: Sized,
{
    /// The intermediate representation needed to create `Self` or to serialize Self.
    type IntermediateRepr: ConfigRepr;

    fn from_yaml<P: AsRef<Path>>(path: P, bodies: &dyn BodyProvider) -> Result<Self, ConfigError> {
        Self::from_config(Self::IntermediateRepr::load(path)?, bodies)
    }

    /// Creates a new instance of `self` from the configuration, fetching the celestial bodies from the provider.
    fn from_config(cfg: Self::IntermediateRepr, bodies: &dyn BodyProvider) -> Result<Self, ConfigError>;

    /// Converts self into the intermediate representation which is serializable.
    fn to_config(&self) -> Result<Self::IntermediateRepr, ConfigError>;
}

pub(crate) fn epoch_to_str<S>(epoch: &Epoch, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format!("{epoch}"))
}

/// A deserializer from Epoch string
pub(crate) fn epoch_from_str<'de, D>(deserializer: D) -> Result<Epoch, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Epoch::from_str(&s).map_err(serde::de::Error::custom)
}

pub(crate) fn duration_to_str<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format!("{duration}"))
}

/// A deserializer from Duration string
pub(crate) fn duration_from_str<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Duration::from_str(&s).map_err(serde::de::Error::custom)
}

/// Builds the time tag of a kernel record: the TDB duration since the reference epoch, split in centuries
/// and nanoseconds, which converts back to the exact same epoch.
pub(crate) fn epoch_to_tdb_parts(epoch: Epoch) -> (i16, u64) {
    epoch.to_tdb_duration().to_parts()
}

pub(crate) fn epoch_from_tdb_parts(centuries: i16, nanoseconds: u64) -> Epoch {
    Epoch::from_tdb_duration(Duration::from_parts(centuries, nanoseconds))
}

/// Ensures that the samples are in strictly increasing epoch order
pub(crate) fn ensure_increasing(epochs: impl Iterator<Item = Epoch>) -> Result<(), KernelError> {
    let mut previous: Option<Epoch> = None;
    for epoch in epochs {
        if let Some(prev) = previous {
            ensure!(epoch > prev, UnorderedSamplesSnafu { epoch });
        }
        previous = Some(epoch);
    }
    Ok(())
}

/// Writes the metadata comments of a kernel file
pub(crate) fn metadata_header(kind: &str, object_id: i32, cfg: &ExportCfg) -> String {
    let mut header = format!(
        "# {kind} kernel of object {object_id}\n# Generated by {} v{}\n",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
    if let Some(metadata) = &cfg.metadata {
        let ordered: BTreeMap<_, _> = metadata.iter().collect();
        for (key, value) in ordered {
            header.push_str(&format!("# {key}: {value}\n"));
        }
    }
    header
}

/// Writes the header comments followed by the records of a kernel file, creating the parent directories.
pub(crate) fn write_kernel_file<R: Serialize>(
    path: &Path,
    header: &str,
    records: impl Iterator<Item = R>,
) -> Result<(), KernelError> {
    let io_error = |details: String| KernelError::KernelIo {
        path: path.display().to_string(),
        details,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| io_error(e.to_string()))?;
        }
    }
    let mut file = File::create(path).map_err(|e| io_error(e.to_string()))?;
    file.write_all(header.as_bytes())
        .map_err(|e| io_error(e.to_string()))?;

    let mut wtr = csv::Writer::from_writer(file);
    let mut count = 0;
    for record in records {
        wtr.serialize(record).map_err(|e| io_error(e.to_string()))?;
        count += 1;
    }
    wtr.flush().map_err(|e| io_error(e.to_string()))?;
    debug!("wrote {count} records to {}", path.display());
    Ok(())
}

/// Reads the object identifier from the header comments of a kernel file, and all of its records.
pub(crate) fn read_kernel_file<R: DeserializeOwned>(path: &Path) -> Result<(i32, Vec<R>), KernelError> {
    let content = fs::read_to_string(path).map_err(|e| KernelError::KernelIo {
        path: path.display().to_string(),
        details: e.to_string(),
    })?;
    let object_id = content
        .lines()
        .take_while(|line| line.starts_with('#'))
        .find_map(|line| line.split("kernel of object ").nth(1))
        .and_then(|id| id.trim().parse::<i32>().ok())
        .context(KernelParseSnafu {
            path: path.display().to_string(),
            details: "no object identifier in the header",
        })?;

    let mut rdr = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .from_reader(content.as_bytes());
    let records = rdr
        .deserialize()
        .collect::<Result<Vec<R>, csv::Error>>()
        .map_err(|e| KernelError::KernelParse {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;
    Ok((object_id, records))
}

#[cfg(test)]
mod ut_io {
    use super::*;
    use crate::time::Unit;

    #[test]
    fn export_bounds() {
        let cfg = ExportCfg::builder()
            .start_epoch(Epoch::from_tdb_seconds(10.0))
            .end_epoch(Epoch::from_tdb_seconds(20.0))
            .build();
        assert!(!cfg.includes(Epoch::from_tdb_seconds(9.0)));
        assert!(cfg.includes(Epoch::from_tdb_seconds(10.0)));
        assert!(cfg.includes(Epoch::from_tdb_seconds(20.0)));
        assert!(!cfg.includes(Epoch::from_tdb_seconds(20.0) + 1.0 * Unit::Nanosecond));
        assert!(ExportCfg::default().includes(Epoch::from_tdb_seconds(-1e9)));
    }

    #[test]
    fn timestamped_path() {
        let path = ExportCfg::timestamped().actual_path("output_data/ephem.csv");
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("ephem-"), "{name}");
        assert!(name.ends_with(".csv"), "{name}");
        assert_eq!(
            ExportCfg::default().actual_path("output_data/ephem.csv"),
            PathBuf::from("output_data/ephem.csv")
        );
    }

    #[test]
    fn metadata_is_sorted() {
        let cfg = ExportCfg::from_metadata(vec![
            ("mission".to_string(), "demo".to_string()),
            ("author".to_string(), "ops".to_string()),
        ]);
        let header = metadata_header("Ephemeris", -12, &cfg);
        let author = header.find("# author: ops").unwrap();
        let mission = header.find("# mission: demo").unwrap();
        assert!(author < mission);
        assert!(header.starts_with("# Ephemeris kernel of object -12"));
    }

    #[test]
    fn tdb_parts_are_exact() {
        let epoch = Epoch::from_tdb_seconds(729_735_633.0) + 123_456_789.0 * Unit::Nanosecond;
        let (centuries, nanoseconds) = epoch_to_tdb_parts(epoch);
        assert_eq!(epoch_from_tdb_parts(centuries, nanoseconds), epoch);
    }

    #[test]
    fn unordered() {
        let epochs = [10.0, 20.0, 20.0].map(Epoch::from_tdb_seconds);
        assert_eq!(
            ensure_increasing(epochs.into_iter()),
            Err(KernelError::UnorderedSamples {
                epoch: Epoch::from_tdb_seconds(20.0)
            })
        );
        assert!(ensure_increasing([1.0, 2.0].map(Epoch::from_tdb_seconds).into_iter()).is_ok());
    }
}
