//! Numeric filter.

use tracing::debug;

use super::{scalar_text, Filter, FilterBase, FilterData, FilterOptions};
use crate::query::{CompareOp, Condition, QueryBuilder};
use crate::value::Value;

/// Maps an operator key to a comparison; equality when unknown.
///
/// Numeric keys follow the form convention: 1 `>=`, 2 `>`, 3 `=`, 4 `<=`,
/// 5 `<`.
pub(crate) fn compare_op(key: Option<&str>) -> CompareOp {
    match key {
        Some("gte" | "1") => CompareOp::Gte,
        Some("gt" | "2") => CompareOp::Gt,
        Some("lte" | "4") => CompareOp::Lte,
        Some("lt" | "5") => CompareOp::Lt,
        Some("ne") => CompareOp::Ne,
        _ => CompareOp::Eq,
    }
}

/// Parses numeric input, keeping integers exact.
fn parse_number(value: &serde_json::Value) -> Option<Value> {
    if let Some(n) = value.as_i64() {
        return Some(Value::Int(n));
    }
    if let Some(f) = value.as_f64() {
        return Some(Value::Float(f));
    }
    let text = scalar_text(value)?;
    text.parse::<i64>()
        .map(Value::Int)
        .or_else(|_| text.parse::<f64>().map(Value::Float))
        .ok()
        .filter(|v| !matches!(v, Value::Float(f) if !f.is_finite()))
}

/// A filter comparing a numeric field against the input.
pub struct NumberFilter {
    base: FilterBase,
}

impl NumberFilter {
    /// Creates a new number filter with default options.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_options(name, FilterOptions::default())
    }

    /// Creates a new number filter.
    pub fn with_options(name: impl Into<String>, options: FilterOptions) -> Self {
        Self {
            base: FilterBase::new(name, options),
        }
    }
}

impl Filter for NumberFilter {
    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn apply(&self, query: &mut dyn QueryBuilder, data: Option<&FilterData>) -> bool {
        let Some(data) = data.filter(|d| !d.is_empty()) else {
            return false;
        };
        let Some(number) = parse_number(&data.value) else {
            debug!(filter = self.base.name(), value = %data.value, "ignoring non-numeric input");
            return false;
        };

        let op = compare_op(self.base.operator(data));
        let field = self.base.field_ref(query);
        self.base.push(query, Condition::compare(&field, op, number));
        true
    }
}
