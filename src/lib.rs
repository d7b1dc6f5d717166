//! Sleep Screen - sleep apnea risk screening from sleep health data
//!
//! Sleep Screen turns one of several input sources into a single canonical
//! feature row, hands it to a classification oracle, and records the verdict
//! in an append-only ledger. It can also generate synthetic records by
//! resampling each column of a reference dataset.
//!
//! ## Modules
//!
//! - **Input**: tabular loading and normalization of reference rows, uploaded
//!   files, and questionnaire answers into a [`CanonicalRow`]
//! - **Synthesis**: per-column resampling and aligned table rendering
//! - **Results**: the oracle boundary, detection sessions, and the result ledger

pub mod config;
pub mod error;
pub mod formatter;
pub mod ledger;
pub mod normalizer;
pub mod oracle;
pub mod pipeline;
pub mod sampler;
pub mod session;
pub mod table;
pub mod types;

pub use config::Config;
pub use error::ScreenError;
pub use ledger::{MemoryLedger, ResultLedger, SqliteLedger};
pub use normalizer::{InputSource, Normalizer, Questionnaire, QUESTIONS};
pub use oracle::{ChatOracle, Oracle};
pub use pipeline::{detect_and_record, synthesize};
pub use session::{DetectionSession, SessionState};
pub use table::ReferenceTable;
pub use types::{CanonicalRow, ResultRecord, SyntheticRow, Value};

/// Crate version, reported by the CLI
pub const SCREEN_VERSION: &str = env!("CARGO_PKG_VERSION");
