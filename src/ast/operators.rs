use std::fmt;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    /// Equal (`==`), deep structural equality
    Equal,
    /// Not equal (`!=`)
    NotEqual,
    /// Less than (`<`), numbers only
    LessThan,
    /// Less than or equal (`<=`), numbers only
    LessEqual,
    /// Greater than (`>`), numbers only
    GreaterThan,
    /// Greater than or equal (`>=`), numbers only
    GreaterEqual,
}

impl Comparator {
    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::Equal => "==",
            Comparator::NotEqual => "!=",
            Comparator::LessThan => "<",
            Comparator::LessEqual => "<=",
            Comparator::GreaterThan => ">",
            Comparator::GreaterEqual => ">=",
        }
    }

    /// True for the operators that only order numbers.
    pub fn is_ordering(self) -> bool {
        !matches!(self, Comparator::Equal | Comparator::NotEqual)
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
