//! Calendar date filters.
//!
//! Dates compare by whole day: `eq 2024-03-01` matches any time on that
//! day, `gt 2024-03-01` starts at midnight of the next day.

use chrono::NaiveDate;
use tracing::debug;

use super::{scalar_text, Filter, FilterBase, FilterData, FilterOptions};
use crate::query::{CompareOp, Condition, QueryBuilder};
use crate::value::{parse_date, Value};

fn day_start(date: NaiveDate) -> Value {
    date.and_hms_opt(0, 0, 0)
        .map_or(Value::Date(date), Value::DateTime)
}

fn next_day_start(date: NaiveDate) -> Value {
    day_start(date.succ_opt().unwrap_or(date))
}

fn date_input(value: &serde_json::Value) -> Option<NaiveDate> {
    parse_date(&scalar_text(value)?)
}

/// A filter comparing a date or datetime field against one day.
///
/// Operators: `eq` (default), `gt`, `gte`, `lt`, `lte`, `null`,
/// `not_null`. The null checks ignore the value.
pub struct DateFilter {
    base: FilterBase,
}

impl DateFilter {
    /// Creates a new date filter with default options.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_options(name, FilterOptions::default())
    }

    /// Creates a new date filter.
    pub fn with_options(name: impl Into<String>, options: FilterOptions) -> Self {
        Self {
            base: FilterBase::new(name, options),
        }
    }
}

impl Filter for DateFilter {
    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn apply(&self, query: &mut dyn QueryBuilder, data: Option<&FilterData>) -> bool {
        let Some(data) = data else {
            return false;
        };

        let operator = self.base.operator(data);
        if let Some(key @ ("null" | "not_null")) = operator {
            let field = self.base.field_ref(query);
            let condition = if key == "null" {
                Condition::is_null(&field)
            } else {
                Condition::is_not_null(&field)
            };
            self.base.push(query, condition);
            return true;
        }

        let Some(date) = date_input(&data.value) else {
            if !data.is_empty() {
                debug!(filter = self.base.name(), value = %data.value, "ignoring unparseable date");
            }
            return false;
        };

        let field = self.base.field_ref(query);
        let condition = match super::number::compare_op(operator) {
            CompareOp::Eq => Condition::All(vec![
                Condition::compare(&field, CompareOp::Gte, day_start(date)),
                Condition::compare(&field, CompareOp::Lt, next_day_start(date)),
            ]),
            CompareOp::Ne => Condition::Any(vec![
                Condition::compare(&field, CompareOp::Lt, day_start(date)),
                Condition::compare(&field, CompareOp::Gte, next_day_start(date)),
            ]),
            CompareOp::Gt => Condition::compare(&field, CompareOp::Gte, next_day_start(date)),
            CompareOp::Gte => Condition::compare(&field, CompareOp::Gte, day_start(date)),
            CompareOp::Lt => Condition::compare(&field, CompareOp::Lt, day_start(date)),
            CompareOp::Lte => Condition::compare(&field, CompareOp::Lt, next_day_start(date)),
        };
        self.base.push(query, condition);
        true
    }
}

/// A filter for date ranges given as `{"start": .., "end": ..}`.
///
/// Either bound may be omitted; both are inclusive days. The
/// `not_between` operator inverts the range.
pub struct DateRangeFilter {
    base: FilterBase,
}

impl DateRangeFilter {
    /// Creates a new date range filter with default options.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_options(name, FilterOptions::default())
    }

    /// Creates a new date range filter.
    pub fn with_options(name: impl Into<String>, options: FilterOptions) -> Self {
        Self {
            base: FilterBase::new(name, options),
        }
    }
}

impl Filter for DateRangeFilter {
    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn apply(&self, query: &mut dyn QueryBuilder, data: Option<&FilterData>) -> bool {
        let Some(data) = data.filter(|d| !d.is_empty()) else {
            return false;
        };

        let start = data.value.get("start").and_then(date_input);
        let end = data.value.get("end").and_then(date_input);
        if start.is_none() && end.is_none() {
            debug!(filter = self.base.name(), value = %data.value, "ignoring date range input");
            return false;
        }

        let field = self.base.field_ref(query);
        let mut bounds = Vec::new();
        if let Some(start) = start {
            bounds.push(Condition::compare(&field, CompareOp::Gte, day_start(start)));
        }
        if let Some(end) = end {
            bounds.push(Condition::compare(&field, CompareOp::Lt, next_day_start(end)));
        }

        let range = if bounds.len() == 1 {
            bounds.remove(0)
        } else {
            Condition::All(bounds)
        };
        let condition = if matches!(self.base.operator(data), Some("not_between" | "2")) {
            range.not()
        } else {
            range
        };
        self.base.push(query, condition);
        true
    }
}
