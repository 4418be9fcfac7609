//! Predicates that filters push into a query.
//!
//! A [`Condition`] is backend neutral: the in-memory backend evaluates it
//! against rows, the SQL backend renders it to a parameterized fragment.

use std::fmt;

use crate::value::Value;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal (=)
    Eq,
    /// Not equal (!=)
    Ne,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Ne => write!(f, "!="),
            Self::Gt => write!(f, ">"),
            Self::Gte => write!(f, ">="),
            Self::Lt => write!(f, "<"),
            Self::Lte => write!(f, "<="),
        }
    }
}

/// A predicate over qualified fields (`alias.field`).
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Simple comparison: field op value
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
    /// LIKE pattern match, `%` and `_` wildcards
    Like {
        field: String,
        pattern: String,
        case_sensitive: bool,
        negated: bool,
    },
    /// IS NULL check
    IsNull { field: String },
    /// IS NOT NULL check
    IsNotNull { field: String },
    /// IN / NOT IN list check
    In {
        field: String,
        values: Vec<Value>,
        negated: bool,
    },
    /// BETWEEN range check, both bounds inclusive
    Between {
        field: String,
        low: Value,
        high: Value,
    },
    /// All children must hold
    All(Vec<Condition>),
    /// At least one child must hold
    Any(Vec<Condition>),
    /// NOT negation
    Not(Box<Condition>),
}

impl Condition {
    /// Creates a comparison condition.
    pub fn compare(field: &str, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::Compare {
            field: field.to_string(),
            op,
            value: value.into(),
        }
    }

    /// Creates an equality condition (field = value).
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    /// Creates an inequality condition (field != value).
    pub fn ne(field: &str, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Ne, value)
    }

    /// Creates a LIKE condition.
    pub fn like(field: &str, pattern: impl Into<String>, case_sensitive: bool) -> Self {
        Self::Like {
            field: field.to_string(),
            pattern: pattern.into(),
            case_sensitive,
            negated: false,
        }
    }

    /// Creates a NOT LIKE condition.
    pub fn not_like(field: &str, pattern: impl Into<String>, case_sensitive: bool) -> Self {
        Self::Like {
            field: field.to_string(),
            pattern: pattern.into(),
            case_sensitive,
            negated: true,
        }
    }

    /// Creates an IS NULL condition.
    pub fn is_null(field: &str) -> Self {
        Self::IsNull {
            field: field.to_string(),
        }
    }

    /// Creates an IS NOT NULL condition.
    pub fn is_not_null(field: &str) -> Self {
        Self::IsNotNull {
            field: field.to_string(),
        }
    }

    /// Creates an IN list condition.
    pub fn in_list(field: &str, values: Vec<Value>) -> Self {
        Self::In {
            field: field.to_string(),
            values,
            negated: false,
        }
    }

    /// Creates a NOT IN list condition.
    pub fn not_in_list(field: &str, values: Vec<Value>) -> Self {
        Self::In {
            field: field.to_string(),
            values,
            negated: true,
        }
    }

    /// Creates a BETWEEN condition.
    pub fn between(field: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::Between {
            field: field.to_string(),
            low: low.into(),
            high: high.into(),
        }
    }

    /// Negates this condition.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Renders the condition as a parameterized SQL fragment.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        match self {
            Self::Compare { field, op, value } => (format!("{field} {op} ?"), vec![value.clone()]),
            Self::Like {
                field,
                pattern,
                case_sensitive,
                negated,
            } => {
                let not = if *negated { "NOT " } else { "" };
                if *case_sensitive {
                    (
                        format!("{field} {not}LIKE ?"),
                        vec![Value::Text(pattern.clone())],
                    )
                } else {
                    (
                        format!("LOWER({field}) {not}LIKE ?"),
                        vec![Value::Text(pattern.to_lowercase())],
                    )
                }
            }
            Self::IsNull { field } => (format!("{field} IS NULL"), vec![]),
            Self::IsNotNull { field } => (format!("{field} IS NOT NULL"), vec![]),
            Self::In {
                field,
                values,
                negated,
            } => {
                let placeholders: Vec<&str> = values.iter().map(|_| "?").collect();
                let not = if *negated { "NOT " } else { "" };
                (
                    format!("{field} {not}IN ({})", placeholders.join(", ")),
                    values.clone(),
                )
            }
            Self::Between { field, low, high } => (
                format!("{field} BETWEEN ? AND ?"),
                vec![low.clone(), high.clone()],
            ),
            Self::All(children) => join_sql(children, " AND "),
            Self::Any(children) => join_sql(children, " OR "),
            Self::Not(inner) => {
                let (sql, params) = inner.to_sql();
                (format!("NOT ({sql})"), params)
            }
        }
    }
}

fn join_sql(children: &[Condition], separator: &str) -> (String, Vec<Value>) {
    let mut params = Vec::new();
    let parts: Vec<String> = children
        .iter()
        .map(|child| {
            let (sql, child_params) = child.to_sql();
            params.extend(child_params);
            format!("({sql})")
        })
        .collect();
    (parts.join(separator), params)
}

/// The WHERE clause a query accumulates while filters are applied.
///
/// Conditions added with `and_where` must all hold; conditions added with
/// `or_where` form one group of which at least one must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    all: Vec<Condition>,
    any: Vec<Condition>,
}

impl WhereClause {
    /// Creates an empty clause.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a condition that must hold.
    pub fn and_where(&mut self, condition: Condition) {
        self.all.push(condition);
    }

    /// Adds a condition to the OR group.
    pub fn or_where(&mut self, condition: Condition) {
        self.any.push(condition);
    }

    /// Returns true if no condition was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.all.is_empty() && self.any.is_empty()
    }

    /// Collapses the clause into a single condition.
    #[must_use]
    pub fn to_condition(&self) -> Option<Condition> {
        let mut parts = self.all.clone();
        match self.any.len() {
            0 => {}
            1 => parts.push(self.any[0].clone()),
            _ => parts.push(Condition::Any(self.any.clone())),
        }
        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(Condition::All(parts)),
        }
    }

    /// Renders the clause without the `WHERE` keyword.
    pub fn to_sql(&self) -> Option<(String, Vec<Value>)> {
        let condition = self.to_condition()?;
        let (sql, params) = match &condition {
            Condition::All(children) => {
                let mut params = Vec::new();
                let parts: Vec<String> = children
                    .iter()
                    .map(|child| {
                        let (sql, child_params) = child.to_sql();
                        params.extend(child_params);
                        match child {
                            Condition::Any(_) => format!("({sql})"),
                            _ => sql,
                        }
                    })
                    .collect();
                (parts.join(" AND "), params)
            }
            other => other.to_sql(),
        };
        Some((sql, params))
    }
}
