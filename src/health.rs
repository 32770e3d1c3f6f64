//! Health condition evaluation for raw metric samples

use tracing::warn;

/// Comparison operator of a health condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    Equal,
    NotEqual,
}

/// A parsed health condition: a comparison operator plus a numeric threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthCondition {
    pub comparison: Comparison,
    pub threshold: f64,
}

impl HealthCondition {
    /// Parse a condition expression such as `"> 0"` or `">= 0.95"`.
    ///
    /// Two-character operators are matched before their single-character
    /// prefixes so `">="` never reads as `">"` followed by garbage.
    pub fn parse(condition: &str) -> Option<Self> {
        let expr = condition.trim();

        let (comparison, rest) = if let Some(rest) = expr.strip_prefix(">=") {
            (Comparison::GreaterOrEqual, rest)
        } else if let Some(rest) = expr.strip_prefix("<=") {
            (Comparison::LessOrEqual, rest)
        } else if let Some(rest) = expr.strip_prefix("==") {
            (Comparison::Equal, rest)
        } else if let Some(rest) = expr.strip_prefix("!=") {
            (Comparison::NotEqual, rest)
        } else if let Some(rest) = expr.strip_prefix('>') {
            (Comparison::Greater, rest)
        } else if let Some(rest) = expr.strip_prefix('<') {
            (Comparison::Less, rest)
        } else {
            return None;
        };

        let threshold: f64 = rest.trim_start().parse().ok()?;

        Some(Self {
            comparison,
            threshold,
        })
    }

    /// Apply the condition to an already-parsed sample value.
    pub fn holds(&self, value: f64) -> bool {
        match self.comparison {
            Comparison::Greater => value > self.threshold,
            Comparison::GreaterOrEqual => value >= self.threshold,
            Comparison::Less => value < self.threshold,
            Comparison::LessOrEqual => value <= self.threshold,
            Comparison::Equal => value == self.threshold,
            Comparison::NotEqual => value != self.threshold,
        }
    }
}

/// Evaluate a raw sample value against a health condition expression.
///
/// A value that does not parse as a number is never healthy. A condition that
/// does not match the `<operator> <threshold>` grammar is logged and read as
/// unhealthy rather than failing the request.
pub fn evaluate(raw_value: &str, condition: &str) -> bool {
    let value: f64 = match raw_value.trim().parse() {
        Ok(value) => value,
        Err(_) => return false,
    };

    match HealthCondition::parse(condition) {
        Some(parsed) => parsed.holds(value),
        None => {
            warn!(
                "Health condition '{}' is not evaluable, treating sample as unhealthy",
                condition
            );
            false
        }
    }
}
