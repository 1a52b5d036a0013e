//! Row predicates with index pruning
//!
//! A `Condition` is checked two ways:
//! - `is_data_ok` tests one decoded row exactly.
//! - `is_index_possible` tests a key range `[low, high)` taken from two
//!   neighbouring index entries and answers whether any row inside the range
//!   could satisfy the condition. It may say yes too often, never too rarely.

use std::cmp::Ordering;

use crate::storage::value::Value;

/// Column of the leading primary-key field
const LEADING_KEY_FIELD: usize = 0;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl CompareOp {
    /// Does `ord = cmp(row, literal)` satisfy the operator
    pub fn matches(self, ord: Ordering) -> bool {
        match self {
            CompareOp::Equal => ord == Ordering::Equal,
            CompareOp::NotEqual => ord != Ordering::Equal,
            CompareOp::Less => ord == Ordering::Less,
            CompareOp::LessOrEqual => ord != Ordering::Greater,
            CompareOp::Greater => ord == Ordering::Greater,
            CompareOp::GreaterOrEqual => ord != Ordering::Less,
        }
    }

    /// Could a key in `[low, high)` satisfy the operator, given
    /// `c1 = cmp(low, literal)` and `c2 = cmp(high, literal)`
    fn range_possible(self, c1: Ordering, c2: Ordering) -> bool {
        match self {
            CompareOp::Equal => c1.is_le() && c2.is_ge(),
            // only a range pinned to exactly the literal holds nothing else
            CompareOp::NotEqual => !(c1.is_eq() && c2.is_eq()),
            CompareOp::Greater => c2.is_gt(),
            CompareOp::GreaterOrEqual => c2.is_ge(),
            CompareOp::Less => c1.is_lt(),
            CompareOp::LessOrEqual => c1.is_le(),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Equal => "=",
            CompareOp::NotEqual => "<>",
            CompareOp::Less => "<",
            CompareOp::LessOrEqual => "<=",
            CompareOp::Greater => ">",
            CompareOp::GreaterOrEqual => ">=",
        }
    }
}

/// Predicate over decoded rows
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `row[field] <op> value`
    Compare {
        op: CompareOp,
        value: Value,
        field: usize,
    },
    /// All must hold; empty is true
    And(Vec<Condition>),
    /// Any must hold; empty is false
    Or(Vec<Condition>),
}

impl Condition {
    pub fn compare(op: CompareOp, field: usize, value: impl Into<Value>) -> Self {
        Condition::Compare {
            op,
            value: value.into(),
            field,
        }
    }

    pub fn eq(field: usize, value: impl Into<Value>) -> Self {
        Self::compare(CompareOp::Equal, field, value)
    }

    pub fn ne(field: usize, value: impl Into<Value>) -> Self {
        Self::compare(CompareOp::NotEqual, field, value)
    }

    pub fn lt(field: usize, value: impl Into<Value>) -> Self {
        Self::compare(CompareOp::Less, field, value)
    }

    pub fn le(field: usize, value: impl Into<Value>) -> Self {
        Self::compare(CompareOp::LessOrEqual, field, value)
    }

    pub fn gt(field: usize, value: impl Into<Value>) -> Self {
        Self::compare(CompareOp::Greater, field, value)
    }

    pub fn ge(field: usize, value: impl Into<Value>) -> Self {
        Self::compare(CompareOp::GreaterOrEqual, field, value)
    }

    pub fn and(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Condition::And(conditions.into_iter().collect())
    }

    pub fn or(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Condition::Or(conditions.into_iter().collect())
    }

    /// `low <= row[field] <= high`
    pub fn between(field: usize, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Condition::And(vec![Self::ge(field, low), Self::le(field, high)])
    }

    /// Exact test against one decoded row. Missing columns read as `Null`.
    pub fn is_data_ok(&self, row: &[Value]) -> bool {
        match self {
            Condition::Compare { op, value, field } => {
                let actual = row.get(*field).unwrap_or(&Value::Null);
                op.matches(actual.compare(value))
            }
            Condition::And(all) => all.iter().all(|c| c.is_data_ok(row)),
            Condition::Or(any) => any.iter().any(|c| c.is_data_ok(row)),
        }
    }

    /// Could a row with key in `[low, high)` satisfy the condition.
    ///
    /// `high` is `None` for the last entry of an index block, whose range is
    /// unbounded above. Index entries are ordered by the whole key, so only
    /// comparisons on the leading key column can prune; others always pass.
    pub fn is_index_possible(&self, low: &[Value], high: Option<&[Value]>) -> bool {
        match self {
            Condition::Compare { op, value, field } => {
                if *field != LEADING_KEY_FIELD {
                    return true;
                }
                let c1 = low.get(*field).unwrap_or(&Value::Null).compare(value);
                let c2 = match high {
                    Some(high) => high.get(*field).unwrap_or(&Value::Null).compare(value),
                    None => Ordering::Greater,
                };
                op.range_possible(c1, c2)
            }
            Condition::And(all) => all.iter().all(|c| c.is_index_possible(low, high)),
            Condition::Or(any) => any.iter().any(|c| c.is_index_possible(low, high)),
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let join = |f: &mut std::fmt::Formatter<'_>, parts: &[Condition], sep: &str| {
            write!(f, "(")?;
            for (i, c) in parts.iter().enumerate() {
                if i > 0 {
                    write!(f, " {} ", sep)?;
                }
                write!(f, "{}", c)?;
            }
            write!(f, ")")
        };
        match self {
            Condition::Compare { op, value, field } => {
                write!(f, "#{} {} {:?}", field, op.symbol(), value)
            }
            Condition::And(all) => join(f, all, "AND"),
            Condition::Or(any) => join(f, any, "OR"),
        }
    }
}
