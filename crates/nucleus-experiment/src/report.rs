//! Tab-delimited report output keyed by scenario id.

use std::io::{BufRead, Write};

use indexmap::IndexSet;
use nucleus_core::ScenarioId;

use crate::error::ExperimentError;

/// A typed output item a simulation releases for report aggregation.
///
/// Handlers release rows into the run's output buffer; the experiment
/// runner collects them after the run and forwards them, keyed by
/// scenario, to the report writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    fields: Vec<String>,
}

impl ReportRow {
    /// A row from its field values.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// The field values, in column order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

/// Writes tab-delimited rows with a `scenario` key column and a stable
/// header.
///
/// All writes for one report go through one writer, which is the
/// serialization boundary the experiment layer guarantees per output
/// file.
pub struct ReportWriter<W: Write> {
    sink: W,
    columns: Vec<String>,
    header_written: bool,
}

impl<W: Write> ReportWriter<W> {
    /// A writer over `sink` with the given data columns. The header
    /// adds a leading `scenario` column.
    pub fn new<S: Into<String>>(sink: W, columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            sink,
            columns: columns.into_iter().map(Into::into).collect(),
            header_written: false,
        }
    }

    /// Write one row for `scenario`, emitting the header first if this
    /// is the first row.
    ///
    /// # Errors
    ///
    /// [`ExperimentError::ColumnMismatch`] if the row's field count
    /// does not match the declared columns, and I/O failures from the
    /// sink. Nothing is written for a mismatched row.
    pub fn write_row(
        &mut self,
        scenario: ScenarioId,
        row: &ReportRow,
    ) -> Result<(), ExperimentError> {
        if row.fields.len() != self.columns.len() {
            return Err(ExperimentError::ColumnMismatch {
                expected: self.columns.len(),
                found: row.fields.len(),
            });
        }
        if !self.header_written {
            write!(self.sink, "scenario")?;
            for column in &self.columns {
                write!(self.sink, "\t{column}")?;
            }
            writeln!(self.sink)?;
            self.header_written = true;
        }
        write!(self.sink, "{scenario}")?;
        for field in &row.fields {
            write!(self.sink, "\t{field}")?;
        }
        writeln!(self.sink)?;
        Ok(())
    }

    /// Flush and return the underlying sink.
    pub fn finish(mut self) -> Result<W, ExperimentError> {
        self.sink.flush()?;
        Ok(self.sink)
    }
}

/// Copy a previously written report, keeping the header and only the
/// rows belonging to `completed` scenarios.
///
/// Used when resuming an experiment: rows from scenarios that did not
/// finish are dropped so their reruns do not produce duplicates.
///
/// # Errors
///
/// [`ExperimentError::MalformedRow`] if a data line's first field is
/// not a scenario id, and I/O failures from either side.
pub fn retain_completed<R: BufRead, W: Write>(
    input: R,
    output: &mut W,
    completed: &[ScenarioId],
) -> Result<(), ExperimentError> {
    let keep: IndexSet<ScenarioId> = completed.iter().copied().collect();
    for (index, line) in input.lines().enumerate() {
        let line = line?;
        if index == 0 {
            writeln!(output, "{line}")?;
            continue;
        }
        if line.is_empty() {
            continue;
        }
        let id = line
            .split('\t')
            .next()
            .and_then(|s| s.parse::<u32>().ok())
            .ok_or(ExperimentError::MalformedRow { line: index + 1 })?;
        if keep.contains(&ScenarioId(id)) {
            writeln!(output, "{line}")?;
        }
    }
    Ok(())
}
