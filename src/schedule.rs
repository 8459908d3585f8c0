//! Schedule-file driven thermostat offsets.
//!
//! An occupancy-style schedule (one numeric column of a CSV file) scales a
//! setpoint offset: for every sample `v`,
//!
//! ```text
//! heating = heating_setpoint + v * heating_offset
//! cooling = cooling_setpoint + v * cooling_offset
//! ```
//!
//! The derived series are written as a two-column CSV that the model reads
//! back through two [`ScheduleFile`] references, heating in column 1 and
//! cooling in column 2.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("failed to access schedule file: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: cannot parse {value:?} as a number")]
    Parse { line: usize, value: String },

    #[error("line {line}: column {column} is missing")]
    MissingColumn { line: usize, column: usize },

    #[error("expected {expected} samples, found {found}")]
    TooFewSamples { expected: usize, found: usize },

    #[error("column numbers start at 1")]
    ZeroColumn,
}

/// Reference to one numeric column of a CSV schedule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleFile {
    pub name: String,
    pub path: PathBuf,
    /// 1-based column number.
    pub column: usize,
    /// Header rows before the first sample.
    pub rows_to_skip: usize,
    /// Samples to read (8760 for an hourly year).
    pub samples: usize,
    pub minutes_per_item: u32,
}

impl ScheduleFile {
    /// Reads the referenced samples.
    pub fn read(&self) -> Result<Vec<f64>, ScheduleError> {
        let file = File::open(&self.path)?;
        self.parse(BufReader::new(file))
    }

    fn parse<R: BufRead>(&self, reader: R) -> Result<Vec<f64>, ScheduleError> {
        if self.column == 0 {
            return Err(ScheduleError::ZeroColumn);
        }
        let mut values = Vec::with_capacity(self.samples);
        for (index, line) in reader.lines().enumerate().skip(self.rows_to_skip) {
            if values.len() == self.samples {
                break;
            }
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let field = line
                .split(',')
                .nth(self.column - 1)
                .ok_or(ScheduleError::MissingColumn {
                    line: index + 1,
                    column: self.column,
                })?
                .trim();
            let value = field.parse::<f64>().map_err(|_| ScheduleError::Parse {
                line: index + 1,
                value: field.to_string(),
            })?;
            values.push(value);
        }
        if values.len() < self.samples {
            return Err(ScheduleError::TooFewSamples {
                expected: self.samples,
                found: values.len(),
            });
        }
        debug!(schedule = %self.name, samples = values.len(), "read schedule column");
        Ok(values)
    }
}

/// Base setpoints and per-unit offsets, °F.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThermostatOffset {
    pub heating_setpoint: f64,
    pub cooling_setpoint: f64,
    pub heating_offset: f64,
    pub cooling_offset: f64,
}

/// Heating and cooling setpoint series of equal length.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SetpointSeries {
    pub heating: Vec<f64>,
    pub cooling: Vec<f64>,
}

impl ThermostatOffset {
    pub fn apply(&self, driver: &[f64]) -> SetpointSeries {
        SetpointSeries {
            heating: driver
                .iter()
                .map(|v| self.heating_setpoint + v * self.heating_offset)
                .collect(),
            cooling: driver
                .iter()
                .map(|v| self.cooling_setpoint + v * self.cooling_offset)
                .collect(),
        }
    }
}

impl SetpointSeries {
    pub fn to_csv(&self) -> String {
        let mut csv = String::from("heating_setpoint,cooling_setpoint\n");
        for (heat, cool) in self.heating.iter().zip(&self.cooling) {
            csv.push_str(&format!("{heat},{cool}\n"));
        }
        csv
    }

    /// Writes the series and returns the two schedule references that read
    /// it back.
    pub fn write(
        &self,
        path: &Path,
        minutes_per_item: u32,
    ) -> Result<(ScheduleFile, ScheduleFile), ScheduleError> {
        let mut file = File::create(path)?;
        file.write_all(self.to_csv().as_bytes())?;

        let reference = |name: &str, column: usize| ScheduleFile {
            name: name.to_string(),
            path: path.to_path_buf(),
            column,
            rows_to_skip: 1,
            samples: self.heating.len(),
            minutes_per_item,
        };
        Ok((
            reference("HeatingSetpoint", 1),
            reference("CoolingSetpoint", 2),
        ))
    }
}

/// Reads `source`, derives setpoints and writes them to `output`.
pub fn write_thermostat_offsets(
    source: &ScheduleFile,
    offset: &ThermostatOffset,
    output: &Path,
) -> Result<(ScheduleFile, ScheduleFile), ScheduleError> {
    let driver = source.read()?;
    offset.apply(&driver).write(output, source.minutes_per_item)
}
