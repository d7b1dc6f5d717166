//! Synthetic row generation
//!
//! Each synthetic value is drawn uniformly from the distinct non-missing
//! values observed in its column. Columns are sampled independently, so
//! relationships between columns in the reference data are not preserved.
//!
//! Numerically equal cells count as one domain member: `8` and `8.0` merge,
//! as do `0.0` and `-0.0`. The first spelling seen is the one sampled.

use std::collections::HashSet;

use rand::Rng;

use crate::error::ScreenError;
use crate::table::{Column, ReferenceTable};
use crate::types::{SyntheticRow, Value};

/// Identity of a cell within a sampling domain
#[derive(Debug, PartialEq, Eq, Hash)]
enum DomainKey<'a> {
    Whole(i64),
    Fraction(u64),
    Text(&'a str),
}

fn domain_key(value: &Value) -> Option<DomainKey<'_>> {
    match value {
        Value::Missing => None,
        Value::Integer(i) => Some(DomainKey::Whole(*i)),
        Value::Float(f) if f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(f) => {
            Some(DomainKey::Whole(*f as i64))
        }
        Value::Float(f) => Some(DomainKey::Fraction(f.to_bits())),
        Value::Text(s) => Some(DomainKey::Text(s)),
    }
}

/// Distinct non-missing values of a column, in first-seen order
pub fn column_domain(column: &Column) -> Vec<Value> {
    let mut seen = HashSet::new();
    column
        .values
        .iter()
        .filter(|v| match domain_key(*v) {
            Some(key) => seen.insert(key),
            None => false,
        })
        .cloned()
        .collect()
}

/// Non-empty set of values a column can take
#[derive(Debug, Clone, PartialEq)]
pub struct Domain(Vec<Value>);

impl Domain {
    /// `None` when the column has no non-missing values
    pub fn of(column: &Column) -> Option<Self> {
        let values = column_domain(column);
        if values.is_empty() {
            None
        } else {
            Some(Self(values))
        }
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    /// Uniform draw; the range is never empty since a domain has a member
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &Value {
        &self.0[rng.gen_range(0..self.0.len())]
    }
}

/// Sampler over the per-column domains of a reference table
#[derive(Debug, Clone)]
pub struct SyntheticSampler {
    domains: Vec<Domain>,
}

impl SyntheticSampler {
    /// Compute every column's domain. Fails with `EmptyDomain` naming the
    /// first column that has nothing to sample from.
    pub fn new(table: &ReferenceTable) -> Result<Self, ScreenError> {
        let domains = table
            .columns()
            .iter()
            .map(|column| {
                Domain::of(column).ok_or_else(|| ScreenError::EmptyDomain {
                    column: column.name.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { domains })
    }

    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    /// Draw a single row
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> SyntheticRow {
        let values = self
            .domains
            .iter()
            .map(|domain| domain.choose(rng).clone())
            .collect();
        SyntheticRow::new(values)
    }
}

/// Generate `n` synthetic rows from `table`. `n = 0` yields an empty vector.
pub fn generate<R: Rng + ?Sized>(
    table: &ReferenceTable,
    n: usize,
    rng: &mut R,
) -> Result<Vec<SyntheticRow>, ScreenError> {
    if n == 0 {
        return Ok(Vec::new());
    }
    let sampler = SyntheticSampler::new(table)?;
    let rows: Vec<SyntheticRow> = (0..n).map(|_| sampler.sample(rng)).collect();
    tracing::debug!(
        rows = rows.len(),
        columns = table.column_count(),
        "generated synthetic rows"
    );
    Ok(rows)
}

/// [`generate`] using the thread-local RNG
pub fn generate_with_thread_rng(
    table: &ReferenceTable,
    n: usize,
) -> Result<Vec<SyntheticRow>, ScreenError> {
    generate(table, n, &mut rand::thread_rng())
}
