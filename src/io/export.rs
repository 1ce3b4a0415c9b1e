//! CSV export of dispatch reports and decision sets, and candidate import.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use crate::dispatch::{Block, DecisionSet, VariableLayout};
use crate::report::StepBalance;

/// Column header for per-step balance export.
const STEPS_HEADER: &str = "t,solar,wind,biomass,fixed_load,dispatchable_load,\
                            charge,discharge,settlement_net,physical_net,export,import";

/// Column header for long-format decision export.
const DECISION_HEADER: &str = "variable,asset,t,value";

/// Exports per-step balances to a CSV file at the given path.
///
/// # Arguments
///
/// * `steps` - Report rows, one per step
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_steps_csv(steps: &[StepBalance], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_steps_csv(steps, io::BufWriter::new(file))
}

/// Writes per-step balances as CSV to any writer.
///
/// Output is deterministic for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_steps_csv(steps: &[StepBalance], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(STEPS_HEADER.split(',').map(str::trim))?;

    for s in steps {
        wtr.write_record(&[
            s.t.to_string(),
            format!("{:.6}", s.solar),
            format!("{:.6}", s.wind),
            format!("{:.6}", s.biomass),
            format!("{:.6}", s.fixed_load),
            format!("{:.6}", s.dispatchable_load),
            format!("{:.6}", s.charge),
            format!("{:.6}", s.discharge),
            format!("{:.6}", s.settlement_net),
            format!("{:.6}", s.physical_net),
            format!("{:.6}", s.export),
            format!("{:.6}", s.import),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports a decision set in long format to a CSV file.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_decision_csv(
    decision: &DecisionSet,
    layout: &VariableLayout,
    path: &Path,
) -> io::Result<()> {
    let file = File::create(path)?;
    write_decision_csv(decision, layout, io::BufWriter::new(file))
}

/// Writes a decision set as `variable,asset,t,value` rows.
///
/// Rows follow block order, then step, then asset, matching the flat
/// vector order.
///
/// # Errors
///
/// Returns `InvalidInput` if `decision` was shaped for another layout, or
/// an `io::Error` if writing fails.
pub fn write_decision_csv(
    decision: &DecisionSet,
    layout: &VariableLayout,
    writer: impl Write,
) -> io::Result<()> {
    decision
        .check_shape(layout)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(DECISION_HEADER.split(','))?;

    for block in Block::ALL {
        let m = decision.matrix(block);
        for t in 0..layout.horizon() {
            for i in 0..layout.span(block).assets {
                wtr.write_record(&[
                    block.name().to_string(),
                    i.to_string(),
                    t.to_string(),
                    format!("{}", m[[i, t]]),
                ])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Reads a candidate vector from a CSV file.
///
/// # Errors
///
/// See [`read_candidate_csv`].
pub fn import_candidate_csv(path: &Path) -> io::Result<Vec<f64>> {
    read_candidate_csv(File::open(path)?)
}

/// Reads a candidate vector: one number per row, taken from the last column.
///
/// A non-numeric first row is treated as a header. Both a single column of
/// values and the long format written by [`write_decision_csv`] are
/// accepted.
///
/// # Errors
///
/// Returns `InvalidData` for a non-numeric value after the first row.
pub fn read_candidate_csv(reader: impl Read) -> io::Result<Vec<f64>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut values = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let Some(field) = record.iter().last() else {
            continue;
        };
        match field.parse::<f64>() {
            Ok(v) => values.push(v),
            Err(_) if row == 0 => {}
            Err(e) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("row {}: \"{field}\" is not a number: {e}", row + 1),
                ));
            }
        }
    }
    Ok(values)
}
