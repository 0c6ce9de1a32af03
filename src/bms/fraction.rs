//! Positions inside a measure.

use std::fmt;

use num::integer::gcd;

/// A position in a measure as `numerator / denominator`, where the denominator is the number of slots of the data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fraction {
    /// Index of the slot.
    pub numerator: i64,
    /// Number of the slots.
    pub denominator: i64,
}

impl Fraction {
    /// Creates a new fraction without reducing.
    #[must_use]
    pub const fn new(numerator: i64, denominator: i64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// The value as a float, or `-1.0` if the denominator is zero.
    #[must_use]
    pub fn value(self) -> f64 {
        if self.denominator == 0 {
            return -1.0;
        }
        self.numerator as f64 / self.denominator as f64
    }

    /// Divides both terms by their greatest common divisor until they are coprime.
    pub fn reduce(&mut self) {
        loop {
            let divisor = gcd(self.numerator, self.denominator);
            if divisor <= 1 {
                break;
            }
            self.numerator /= divisor;
            self.denominator /= divisor;
        }
    }

    /// The reduced copy.
    #[must_use]
    pub fn reduced(mut self) -> Self {
        self.reduce();
        self
    }

    /// Whether two fractions are the same value, compared exactly.
    #[must_use]
    pub fn same_value(self, other: Self) -> bool {
        i128::from(self.numerator) * i128::from(other.denominator)
            == i128::from(other.numerator) * i128::from(self.denominator)
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}
