//! `nth-child(an+b)` arithmetic
//!
//! Indexes are 1-based positions among element siblings.

use crate::error::{Result, SelectorError};

/// Compiled `an+b` matcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NthChild {
    /// `|a|`, zero for a fixed index
    step: i64,
    /// `b` reduced into `[0, step)` when `step > 0`
    offset: i64,
    lower: i64,
    upper: Option<i64>,
}

impl NthChild {
    /// Parse `odd`, `even`, an integer, or an `an+b` formula
    pub fn parse(formula: &str) -> Result<Self> {
        let compact: String = formula
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        let invalid = || SelectorError::InvalidNth(formula.to_string());

        match compact.as_str() {
            "odd" => return Self::from_coefficients(2, 1).ok_or_else(invalid),
            "even" => return Self::from_coefficients(2, 0).ok_or_else(invalid),
            "" => return Err(invalid()),
            _ => {}
        }

        let Some((a_text, b_text)) = compact.split_once('n') else {
            let index = compact.parse::<i64>().map_err(|_| invalid())?;
            return Self::from_coefficients(0, index).ok_or_else(invalid);
        };

        let a = match a_text {
            "" | "+" => 1,
            "-" => -1,
            text => text.parse::<i64>().map_err(|_| invalid())?,
        };
        let b = match b_text {
            "" => 0,
            text if text.starts_with('+') || text.starts_with('-') => {
                text.parse::<i64>().map_err(|_| invalid())?
            }
            _ => return Err(invalid()),
        };

        Self::from_coefficients(a, b).ok_or_else(invalid)
    }

    /// `None` when `|a|` does not fit in an `i64`
    pub fn from_coefficients(a: i64, b: i64) -> Option<Self> {
        let nth = if a > 0 {
            // Smallest index of the progression that is >= 1 and >= b
            let lower = if b > a { b - b.rem_euclid(a) } else { 0 };
            Self {
                step: a,
                offset: b.rem_euclid(a),
                lower,
                upper: None,
            }
        } else if a < 0 {
            // Finite set: b, b - |a|, b - 2|a|, ... down to 1
            let step = a.checked_neg()?;
            Self {
                step,
                offset: b.rem_euclid(step),
                lower: 0,
                upper: Some(b),
            }
        } else {
            Self {
                step: 0,
                offset: b,
                lower: b,
                upper: Some(b),
            }
        };
        Some(nth)
    }

    pub fn matches(&self, index: i64) -> bool {
        if self.step == 0 {
            return index == self.offset;
        }
        index >= self.lower
            && self.upper.map_or(true, |upper| index <= upper)
            && index.rem_euclid(self.step) == self.offset
    }
}
