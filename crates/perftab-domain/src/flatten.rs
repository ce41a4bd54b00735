use crate::DomainError;
use perftab_types::{PassRecord, PerfRecord, RecordSet, Report, ReportMode, Testcase};
use serde_json::Value;

/// Index of the measured value inside a perfvalue tuple.
const VALUE_INDEX: usize = 0;
/// Index of the unit string inside a perfvalue tuple.
const UNIT_INDEX: usize = 4;

/// The parts of a perfvalue tuple that end up in a [`PerfRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct PerfValue {
    pub value: f32,
    pub unit: String,
}

/// Flatten one report into the requested view.
///
/// Testcases are visited run by run, in document order.
pub fn flatten(report: &Report, mode: ReportMode) -> Result<RecordSet, DomainError> {
    flatten_all(std::slice::from_ref(report), mode)
}

/// Flatten several reports into one record set, in argument order.
pub fn flatten_all(reports: &[Report], mode: ReportMode) -> Result<RecordSet, DomainError> {
    let testcases = reports
        .iter()
        .flat_map(|r| r.runs.iter())
        .flat_map(|run| run.testcases.iter());

    match mode {
        ReportMode::Pass => Ok(RecordSet::Pass(testcases.map(pass_record).collect())),
        ReportMode::Performance => {
            let mut records = Vec::new();
            for tc in testcases {
                perf_records(tc, &mut records)?;
            }
            Ok(RecordSet::Performance(records))
        }
    }
}

fn pass_record(tc: &Testcase) -> PassRecord {
    let result = match &tc.fail_phase {
        None => "Passed".to_string(),
        Some(phase) => format!("Failed: {phase}"),
    };

    PassRecord {
        name: tc.display_name.clone(),
        jobid: tc.jobid_display(),
        system: tc.system.clone(),
        environ: tc.environ.clone(),
        result,
    }
}

fn perf_records(tc: &Testcase, out: &mut Vec<PerfRecord>) -> Result<(), DomainError> {
    // Testcases without perfvalues (e.g. failed before the performance stage)
    // simply contribute nothing.
    let Some(perfvalues) = &tc.perfvalues else {
        return Ok(());
    };

    let jobid = tc.jobid_display();
    for (key, raw) in perfvalues {
        let variable = variable_name(key)?;
        let PerfValue { value, unit } = parse_perf_value(key, raw)?;
        out.push(PerfRecord {
            name: tc.display_name.clone(),
            jobid: jobid.clone(),
            system: tc.system.clone(),
            environ: tc.environ.clone(),
            variable: variable.to_string(),
            unit,
            value,
        });
    }
    Ok(())
}

/// Third `:`-separated segment of a perfvalue key.
pub fn variable_name(key: &str) -> Result<&str, DomainError> {
    key.split(':').nth(2).ok_or_else(|| DomainError::MalformedKey {
        key: key.to_string(),
    })
}

/// Validate a `[value, reference, lower, upper, unit, ...]` tuple.
///
/// A `null` value becomes NaN and a `null` unit becomes an empty string.
pub fn parse_perf_value(key: &str, raw: &Value) -> Result<PerfValue, DomainError> {
    let malformed = |reason: &str| DomainError::MalformedPerfValue {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    let items = raw.as_array().ok_or_else(|| malformed("expected an array"))?;
    if items.len() <= UNIT_INDEX {
        return Err(malformed(&format!(
            "expected at least {} elements, got {}",
            UNIT_INDEX + 1,
            items.len()
        )));
    }

    let value = match &items[VALUE_INDEX] {
        Value::Null => f32::NAN,
        Value::Number(n) => n
            .as_f64()
            .map(|v| v as f32)
            .ok_or_else(|| malformed("value is not representable as a float"))?,
        _ => return Err(malformed("value is not a number")),
    };

    let unit = match &items[UNIT_INDEX] {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        _ => return Err(malformed("unit is not a string")),
    };

    Ok(PerfValue { value, unit })
}
