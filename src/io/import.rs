//! CSV import for the load catalog and forecast points.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::catalog::DeviceRecord;
use crate::error::DataShapeError;
use crate::forecast::ForecastPoint;

fn open(path: &Path) -> Result<File, DataShapeError> {
    File::open(path).map_err(|source| DataShapeError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input)
}

/// Reads catalog records from CSV.
///
/// Columns: `name,power_kw,duration_slots,earliest_slot,latest_slot,
/// priority,kind`. Empty cells are treated as absent; unknown columns are
/// rejected.
///
/// # Errors
///
/// Returns a [`DataShapeError`] if any row cannot be decoded.
pub fn read_catalog_csv(input: impl Read) -> Result<Vec<DeviceRecord>, DataShapeError> {
    let mut rdr = reader(input);
    let mut records = Vec::new();
    for row in rdr.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

/// Reads catalog records from a CSV file.
///
/// # Errors
///
/// Returns a [`DataShapeError`] if the file cannot be opened or decoded.
pub fn load_catalog_csv(path: &Path) -> Result<Vec<DeviceRecord>, DataShapeError> {
    read_catalog_csv(open(path)?)
}

/// Reads forecast points from CSV.
///
/// Columns: `timestamp` (RFC 3339 with offset), `generation_wh` and an
/// optional `irradiance_w_m2`.
///
/// # Errors
///
/// Returns a [`DataShapeError`] if any row cannot be decoded.
pub fn read_forecast_csv(input: impl Read) -> Result<Vec<ForecastPoint>, DataShapeError> {
    let mut rdr = reader(input);
    let mut points = Vec::new();
    for row in rdr.deserialize() {
        points.push(row?);
    }
    Ok(points)
}

/// Reads forecast points from a CSV file.
///
/// # Errors
///
/// Returns a [`DataShapeError`] if the file cannot be opened or decoded.
pub fn load_forecast_csv(path: &Path) -> Result<Vec<ForecastPoint>, DataShapeError> {
    read_forecast_csv(open(path)?)
}
