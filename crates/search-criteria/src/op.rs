//! Comparison operations and their single-character wire codes.
//!
//! The [`Operation`] enum is closed: every variant owns exactly one ASCII
//! code and no two variants share one, so the code-to-operation mapping is
//! total over [`all_codes`] and empty everywhere else.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::SearchError;

/// Comparison operation of a criterion.
///
/// | Operation | Code |
/// |-----------|------|
/// | `Equals` | `:` |
/// | `NotEquals` | `!` |
/// | `IsNull` | `@` |
/// | `Like` | `~` |
/// | `LessThanOrEqual` | `<` |
/// | `GreaterThanOrEqual` | `>` |
/// | `In` | `_` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Field equals the value.
    Equals,
    /// Field differs from the value.
    NotEquals,
    /// Field is null. The criterion value is ignored.
    IsNull,
    /// Field contains the value (text fields only).
    Like,
    /// Field is less than or equal to the value.
    LessThanOrEqual,
    /// Field is greater than or equal to the value.
    GreaterThanOrEqual,
    /// Field equals one element of a list value.
    In,
}

impl Operation {
    /// All operations in declaration order.
    pub const ALL: [Operation; 7] = [
        Operation::Equals,
        Operation::NotEquals,
        Operation::IsNull,
        Operation::Like,
        Operation::LessThanOrEqual,
        Operation::GreaterThanOrEqual,
        Operation::In,
    ];

    /// Returns the wire code of this operation.
    pub fn code(self) -> char {
        match self {
            Operation::Equals => ':',
            Operation::NotEquals => '!',
            Operation::IsNull => '@',
            Operation::Like => '~',
            Operation::LessThanOrEqual => '<',
            Operation::GreaterThanOrEqual => '>',
            Operation::In => '_',
        }
    }

    /// Looks up the operation for a wire code.
    pub fn from_code(code: char) -> Option<Operation> {
        match code {
            ':' => Some(Operation::Equals),
            '!' => Some(Operation::NotEquals),
            '@' => Some(Operation::IsNull),
            '~' => Some(Operation::Like),
            '<' => Some(Operation::LessThanOrEqual),
            '>' => Some(Operation::GreaterThanOrEqual),
            '_' => Some(Operation::In),
            _ => None,
        }
    }

    /// Returns `true` for operations that need an ordered or textual field.
    pub fn needs_ordering(self) -> bool {
        matches!(
            self,
            Operation::Like | Operation::LessThanOrEqual | Operation::GreaterThanOrEqual
        )
    }

    /// Evaluates an ordering-based operation.
    ///
    /// Returns `None` for operations that are not decided by an ordering
    /// (`IsNull`, `Like`, `In`).
    pub fn eval_ordering(self, ordering: Ordering) -> Option<bool> {
        match self {
            Operation::Equals => Some(ordering == Ordering::Equal),
            Operation::NotEquals => Some(ordering != Ordering::Equal),
            Operation::LessThanOrEqual => Some(ordering != Ordering::Greater),
            Operation::GreaterThanOrEqual => Some(ordering != Ordering::Less),
            Operation::IsNull | Operation::Like | Operation::In => None,
        }
    }

    /// Returns the display name of this operation.
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Equals => "equals",
            Operation::NotEquals => "not_equals",
            Operation::IsNull => "is_null",
            Operation::Like => "like",
            Operation::LessThanOrEqual => "less_than_or_equal",
            Operation::GreaterThanOrEqual => "greater_than_or_equal",
            Operation::In => "in",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Accepts either a display name (`"not_equals"`) or a wire code (`"!"`).
impl FromStr for Operation {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        if let (Some(code), None) = (chars.next(), chars.next()) {
            if let Some(op) = Operation::from_code(code) {
                return Ok(op);
            }
        }
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| SearchError::parse(s, "unknown operation"))
    }
}

/// Returns the wire code for `op`.
pub fn code_for(op: Operation) -> char {
    op.code()
}

/// Returns the operation for `code`, or `None` outside the fixed code set.
pub fn operation_for(code: char) -> Option<Operation> {
    Operation::from_code(code)
}

/// Concatenation of every code in declaration order: `":!@~<>_"`.
pub fn all_codes() -> String {
    Operation::ALL.iter().map(|op| op.code()).collect()
}
