//! CSV export for the schedule table and the derived timeline.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use chrono::DateTime;
use chrono_tz::Tz;

use crate::catalog::column_name;
use crate::schedule::table::ScheduleTable;
use crate::schedule::timeline::Interval;

/// Leading schedule columns before the per-device columns.
const SCHEDULE_HEADER_HEAD: [&str; 4] = ["timestamp", "slot", "generation_wh", "base_load_kW"];

/// Trailing schedule column.
const SCHEDULE_HEADER_TAIL: &str = "total_load_kW";

/// Timeline column header.
const TIMELINE_HEADER: [&str; 4] = ["device", "start", "end", "duration_min"];

fn timestamp(at: &DateTime<Tz>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// Exports the schedule table to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_schedule_csv(table: &ScheduleTable, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_schedule_csv(table, io::BufWriter::new(file))
}

/// Writes the schedule table as CSV to any writer.
///
/// One row per slot: start timestamp, slot index, generation, base load,
/// one `<device>_kW` column per scheduled device, and the total. Output is
/// byte-identical for identical tables.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_schedule_csv(table: &ScheduleTable, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    let mut header: Vec<String> = SCHEDULE_HEADER_HEAD.iter().map(|h| h.to_string()).collect();
    header.extend(table.devices().iter().map(|d| column_name(d)));
    header.push(SCHEDULE_HEADER_TAIL.to_string());
    wtr.write_record(&header)?;

    for row in table.rows() {
        let mut record = vec![
            timestamp(&row.start),
            row.slot.to_string(),
            format!("{:.2}", row.generation_wh),
            format!("{:.3}", row.base_kw),
        ];
        record.extend(row.device_kw.iter().map(|kw| format!("{kw:.3}")));
        record.push(format!("{:.3}", row.total_kw));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports timeline intervals to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_timeline_csv(intervals: &[Interval], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_timeline_csv(intervals, io::BufWriter::new(file))
}

/// Writes timeline intervals as CSV, using display labels for device names.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_timeline_csv(intervals: &[Interval], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(TIMELINE_HEADER)?;
    for interval in intervals {
        wtr.write_record(&[
            interval.label(),
            timestamp(&interval.start),
            timestamp(&interval.end),
            interval.duration_minutes().to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BaseLoad, Device, LoadCatalog};
    use crate::forecast::SlotForecast;
    use crate::schedule::engine::Scheduler;
    use crate::schedule::timeline;
    use crate::schedule::types::DayGrid;
    use chrono::NaiveDate;

    fn table() -> ScheduleTable {
        let grid = DayGrid::new(
            NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            chrono_tz::Africa::Nairobi,
        );
        let mut gen_wh = [0.0_f32; 48];
        gen_wh[24] = 900.0;
        let catalog = LoadCatalog::new(
            vec![Device::controllable("water_pump", 3.0, 1).with_priority(1)],
            BaseLoad::constant(0.5),
        )
        .unwrap();
        Scheduler::unconstrained()
            .schedule(&grid, &SlotForecast::from_slots(&gen_wh), &catalog)
            .table
    }

    #[test]
    fn schedule_header_lists_device_columns() {
        let mut buf = Vec::new();
        write_schedule_csv(&table(), &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        assert_eq!(
            output.lines().next(),
            Some("timestamp,slot,generation_wh,base_load_kW,water_pump_kW,total_load_kW")
        );
        assert_eq!(output.lines().count(), 49);
    }

    #[test]
    fn schedule_rows_carry_local_timestamps() {
        let mut buf = Vec::new();
        write_schedule_csv(&table(), &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let row = output.lines().nth(25).unwrap();
        assert_eq!(row, "2025-03-14T12:00:00+03:00,24,900.00,0.500,3.000,3.500");
    }

    #[test]
    fn timeline_uses_labels_and_minutes() {
        let intervals = timeline::from_table(&table());
        let mut buf = Vec::new();
        write_timeline_csv(&intervals, &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "device,start,end,duration_min");
        assert_eq!(
            lines[1],
            "water pump,2025-03-14T12:00:00+03:00,2025-03-14T12:30:00+03:00,30"
        );
    }

    #[test]
    fn deterministic_output() {
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_schedule_csv(&table(), &mut buf1).unwrap();
        write_schedule_csv(&table(), &mut buf2).unwrap();
        assert_eq!(buf1, buf2);
    }
}
