//! Pipeline orchestration
//!
//! Public helpers that chain the components together:
//! 1. Detection - classify the session input, record it, explain it
//! 2. Synthesis - sample synthetic rows and render them as a table

use rand::Rng;
use serde::Serialize;

use crate::error::ScreenError;
use crate::formatter;
use crate::ledger::ResultLedger;
use crate::oracle::Oracle;
use crate::sampler;
use crate::session::DetectionSession;
use crate::table::ReferenceTable;
use crate::types::ResultRecord;

/// Outcome of a detection run
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    pub record: ResultRecord,
    /// `Err` carries the explanation failure; the record is persisted either way
    #[serde(serialize_with = "serialize_explanation")]
    pub explanation: Result<String, String>,
}

fn serialize_explanation<S>(
    value: &Result<String, String>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match value {
        Ok(text) => serializer.serialize_some(text),
        Err(_) => serializer.serialize_none(),
    }
}

/// Classify the session input, persist the label, then ask for an explanation.
///
/// Detection failures leave the ledger untouched. An explanation failure is
/// reported in [`Detection::explanation`] since the record already exists.
pub fn detect_and_record(
    session: &mut DetectionSession,
    oracle: &dyn Oracle,
    ledger: &dyn ResultLedger,
) -> Result<Detection, ScreenError> {
    let record = session.detect(oracle, ledger)?.clone();
    let explanation = session.explain(oracle).map_err(|e| {
        tracing::warn!(error = %e, "explanation failed");
        e.to_string()
    });

    Ok(Detection {
        record,
        explanation,
    })
}

/// Generate `n` synthetic rows and render them under the table's column names
pub fn synthesize<R: Rng + ?Sized>(
    table: &ReferenceTable,
    n: usize,
    rng: &mut R,
) -> Result<String, ScreenError> {
    let rows: Vec<_> = sampler::generate(table, n, rng)?
        .into_iter()
        .map(|row| row.into_values())
        .collect();
    formatter::render(&table.column_names(), &rows)
}
