//! Export use case: push performance records to a time-series database.
//!
//! One point per record, written in record order. Writes are synchronous
//! and never retried; the first failure stops the export.

use anyhow::Context;
use perftab_adapters::{FieldValue, Point, PointWriter};
use perftab_types::{MEASUREMENT, PerfRecord};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub records: Vec<PerfRecord>,
    pub bucket: String,
    pub label: String,

    /// Points per write call. `1` writes every point on its own.
    pub batch_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    /// Points acknowledged by the database.
    pub written: usize,
    /// Write calls issued.
    pub writes: usize,
}

pub struct ExportUseCase<W: PointWriter> {
    writer: W,
}

impl<W: PointWriter> ExportUseCase<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    pub fn execute(&mut self, req: &ExportRequest) -> anyhow::Result<ExportOutcome> {
        let points: Vec<Point> = req
            .records
            .iter()
            .map(|r| point_for(r, &req.label))
            .collect();

        let total = points.len();
        let mut outcome = ExportOutcome {
            written: 0,
            writes: 0,
        };

        for chunk in points.chunks(req.batch_size.max(1)) {
            self.writer.write(&req.bucket, chunk).with_context(|| {
                format!(
                    "export aborted after {} of {} points were written",
                    outcome.written, total
                )
            })?;
            outcome.written += chunk.len();
            outcome.writes += 1;
            debug!(written = outcome.written, total, "points written");
        }

        info!(
            points = outcome.written,
            bucket = %req.bucket,
            label = %req.label,
            "export finished"
        );
        Ok(outcome)
    }
}

/// The point stored for one performance record.
///
/// `Variable` is a string field rather than a tag, so it is not indexed.
pub fn point_for(record: &PerfRecord, label: &str) -> Point {
    Point::new(MEASUREMENT)
        .tag("environ", record.environ.as_str())
        .tag("system", record.system.as_str())
        .tag("label", label)
        .field("Variable", FieldValue::Text(record.variable.clone()))
        .field("Value", FieldValue::Float(f64::from(record.value)))
        .field("Name", FieldValue::Text(record.name.clone()))
}
