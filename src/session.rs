//! Detection session state
//!
//! A session moves `NoInput → InputLoaded → DetectionRun → Explained`. Loading
//! new input is allowed from any state and starts a fresh cycle.

use serde::Serialize;

use crate::error::ScreenError;
use crate::ledger::ResultLedger;
use crate::oracle::{detection_prompt, Oracle};
use crate::types::{CanonicalRow, ResultRecord};

/// Where a session is in its detection cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NoInput,
    InputLoaded,
    DetectionRun,
    Explained,
}

/// Holds the current canonical row and the last detection result
#[derive(Debug, Clone)]
pub struct DetectionSession {
    state: SessionState,
    input: Option<CanonicalRow>,
    last_result: Option<ResultRecord>,
}

impl Default for DetectionSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::NoInput,
            input: None,
            last_result: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn input(&self) -> Option<&CanonicalRow> {
        self.input.as_ref()
    }

    pub fn last_result(&self) -> Option<&ResultRecord> {
        self.last_result.as_ref()
    }

    /// Replace the current input and start a new cycle
    pub fn load(&mut self, row: CanonicalRow) {
        tracing::debug!(method = %row.method(), details = row.details(), "session input loaded");
        self.input = Some(row);
        self.last_result = None;
        self.state = SessionState::InputLoaded;
    }

    /// Classify the current input and record the label.
    ///
    /// Fails with `NoInput` when nothing is loaded. Nothing is written to the
    /// ledger unless the oracle returns a label.
    pub fn detect(
        &mut self,
        oracle: &dyn Oracle,
        ledger: &dyn ResultLedger,
    ) -> Result<&ResultRecord, ScreenError> {
        let row = self.input.as_ref().ok_or(ScreenError::NoInput)?;

        let label = oracle.classify(&detection_prompt(row))?;
        let record = ledger.append(row.method().as_str(), row.details(), &label)?;
        tracing::info!(id = record.id, result = %record.result, "detection complete");

        self.state = SessionState::DetectionRun;
        Ok(self.last_result.insert(record))
    }

    /// Ask the oracle to explain the last detection result
    pub fn explain(&mut self, oracle: &dyn Oracle) -> Result<String, ScreenError> {
        let record = self.last_result.as_ref().ok_or(ScreenError::NoDetection)?;
        let explanation = oracle.explain(&record.result)?;
        self.state = SessionState::Explained;
        Ok(explanation)
    }
}
