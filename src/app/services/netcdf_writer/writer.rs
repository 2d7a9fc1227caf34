//! NetCDF container writer for one station dataset
//!
//! Performs the per-column numeric coercion with the missing-value sentinel,
//! applies the unit conversions and metadata from the static mapping table,
//! and writes one self-describing container per station. The container is
//! staged in a temporary sibling file and renamed into place on success.

use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::app::models::{CellValue, StationDataset};
use crate::app::services::netcdf_writer::schema::{self, Conversion};
use crate::constants::{
    CORRUPT_LINE_MARKER, DEFLATE_LEVEL, FILL_VALUE, LOCAL_TIME_FIELD, TIME_CALENDAR, TIME_UNITS,
    time_epoch,
};
use crate::{Error, Result};

/// Counters for one container write
#[derive(Debug, Clone, Default)]
pub struct WriteStats {
    /// Observation rows serialized along the time axis
    pub rows: usize,
    /// Numeric variables written with the fill-value sentinel
    pub numeric_variables: usize,
    /// String variables written as plain sequences
    pub string_variables: usize,
}

impl WriteStats {
    /// Total data variables written, excluding the time axis and position
    pub fn variables(&self) -> usize {
        self.numeric_variables + self.string_variables
    }
}

/// Writer for one station's output container
pub struct NetcdfWriter {
    output_path: PathBuf,
    position: Option<(f64, f64)>,
    source_dir: PathBuf,
}

impl NetcdfWriter {
    /// Create a writer targeting `output_path`.
    ///
    /// `position` is the optional fixed (latitude, longitude) pair;
    /// `source_dir` only feeds the free-text description attribute.
    pub fn new(output_path: &Path, position: Option<(f64, f64)>, source_dir: &Path) -> Self {
        Self {
            output_path: output_path.to_path_buf(),
            position,
            source_dir: source_dir.to_path_buf(),
        }
    }

    /// Serialize the dataset, staging through a temporary file so the final
    /// path only ever holds a complete container
    pub fn write(&self, dataset: &StationDataset) -> Result<WriteStats> {
        let parent = match self.output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let staging = tempfile::Builder::new()
            .prefix(dataset.station_id())
            .suffix(".nc.part")
            .tempfile_in(parent)
            .map_err(|e| Error::io("failed to create staging file", e))?;

        let stats = self.write_container(staging.path(), dataset)?;

        staging
            .persist(&self.output_path)
            .map_err(|e| Error::io("failed to move output into place", e.error))?;

        info!(
            "Wrote {} ({} rows, {} variables)",
            self.output_path.display(),
            stats.rows,
            stats.variables()
        );
        Ok(stats)
    }

    fn write_container(&self, path: &Path, dataset: &StationDataset) -> Result<WriteStats> {
        let mut file = netcdf::create(path).map_err(|e| {
            Error::netcdf_writing(
                path.display().to_string(),
                "failed to create container",
                Some(e),
            )
        })?;

        file.add_attribute(
            "description",
            format!("Hobby meteorologists data {}", self.source_dir.display()).as_str(),
        )?;
        file.add_attribute(
            "history",
            format!("Created {}", Local::now().format("%a %b %e %H:%M:%S %Y")).as_str(),
        )?;

        self.write_time_axis(&mut file, dataset)?;
        self.write_position(&mut file)?;

        let mut stats = WriteStats {
            rows: dataset.len(),
            ..WriteStats::default()
        };
        let mut written_names: Vec<String> = Vec::new();

        for field in dataset.field_order() {
            if field == dataset.time_field()
                || field == LOCAL_TIME_FIELD
                || field == CORRUPT_LINE_MARKER
                || field.is_empty()
            {
                continue;
            }
            let Some(column) = dataset.column(field) else {
                continue;
            };

            let spec = schema::lookup(field);
            if spec.is_some_and(|spec| spec.omit) {
                debug!("Dropping superseded column {}", field);
                continue;
            }

            let output_name = spec
                .map(|spec| spec.resolved_name(field))
                .unwrap_or(field.as_str());
            if written_names.iter().any(|name| name == output_name) {
                warn!(
                    "Column {} collapses onto existing variable {}, skipping",
                    field, output_name
                );
                continue;
            }

            if column.iter().any(CellValue::is_number) {
                self.write_numeric_column(&mut file, output_name, column, spec)?;
                stats.numeric_variables += 1;
            } else {
                self.write_string_column(&mut file, output_name, column, spec)?;
                stats.string_variables += 1;
            }
            written_names.push(output_name.to_string());
        }

        Ok(stats)
    }

    /// Time axis: growable dimension, integer minutes since the fixed epoch
    fn write_time_axis(&self, file: &mut netcdf::FileMut, dataset: &StationDataset) -> Result<()> {
        file.add_unlimited_dimension("time")?;

        let epoch = time_epoch();
        let minutes: Vec<i32> = dataset
            .timestamps()
            .iter()
            .map(|timestamp| (*timestamp - epoch).num_minutes() as i32)
            .collect();

        let mut variable = file.add_variable::<i32>("time", &["time"])?;
        variable.set_compression(DEFLATE_LEVEL, true)?;
        variable.put_attribute("units", TIME_UNITS)?;
        variable.put_attribute("calendar", TIME_CALENDAR)?;
        variable.put_attribute("standard_name", "time")?;
        variable.put_attribute("long_name", "time in UTC")?;
        variable.put_values(&minutes, (&[0], &[minutes.len()]))?;

        Ok(())
    }

    /// Optional fixed position as scalar one-element series, independent of
    /// the time dimension
    fn write_position(&self, file: &mut netcdf::FileMut) -> Result<()> {
        let Some((latitude, longitude)) = self.position else {
            return Ok(());
        };

        file.add_dimension("longitude", 1)?;
        let mut lon_var = file.add_variable::<f32>("longitude", &["longitude"])?;
        lon_var.put_attribute("units", "degrees_east")?;
        lon_var.put_attribute("axis", "X")?;
        lon_var.put_attribute("standard_name", "longitude")?;
        lon_var.put_values(&[longitude as f32], (&[0], &[1]))?;

        file.add_dimension("latitude", 1)?;
        let mut lat_var = file.add_variable::<f32>("latitude", &["latitude"])?;
        lat_var.put_attribute("units", "degrees_north")?;
        lat_var.put_attribute("axis", "Y")?;
        lat_var.put_attribute("standard_name", "latitude")?;
        lat_var.put_values(&[latitude as f32], (&[0], &[1]))?;

        Ok(())
    }

    /// A column with at least one numeric cell becomes a numeric series;
    /// remaining non-numeric cells turn into the fill-value sentinel
    fn write_numeric_column(
        &self,
        file: &mut netcdf::FileMut,
        output_name: &str,
        column: &[CellValue],
        spec: Option<&'static schema::VariableSpec>,
    ) -> Result<()> {
        let conversion = spec.map(|spec| spec.conversion).unwrap_or(Conversion::None);
        let values: Vec<f64> = column
            .iter()
            .map(|cell| match cell.as_number() {
                Some(number) => conversion.apply(number),
                None => FILL_VALUE,
            })
            .collect();

        let mut variable = file.add_variable::<f64>(output_name, &["time"])?;
        variable.set_compression(DEFLATE_LEVEL, true)?;
        variable.set_fill_value(FILL_VALUE)?;
        Self::put_metadata(&mut variable, spec)?;
        variable.put_values(&values, (&[0], &[values.len()]))?;

        Ok(())
    }

    /// String columns have no fill-value support and serialize as-is
    fn write_string_column(
        &self,
        file: &mut netcdf::FileMut,
        output_name: &str,
        column: &[CellValue],
        spec: Option<&'static schema::VariableSpec>,
    ) -> Result<()> {
        let mut variable = file.add_string_variable(output_name, &["time"])?;
        Self::put_metadata(&mut variable, spec)?;
        for (index, cell) in column.iter().enumerate() {
            variable.put_string(cell.as_text().unwrap_or(""), (index,))?;
        }
        Ok(())
    }

    fn put_metadata(
        variable: &mut netcdf::VariableMut,
        spec: Option<&'static schema::VariableSpec>,
    ) -> Result<()> {
        let Some(spec) = spec else {
            return Ok(());
        };
        if let Some(units) = spec.units {
            variable.put_attribute("units", units)?;
        }
        if let Some(standard_name) = spec.standard_name {
            variable.put_attribute("standard_name", standard_name)?;
        }
        if let Some(long_name) = spec.long_name {
            variable.put_attribute("long_name", long_name)?;
        }
        Ok(())
    }
}
