//! Exact rational numbers, the payload the pipelines push around.
//!
//! [`Fraction`] keeps its sign on the numerator and always has a positive
//! denominator. Construction does not reduce; call [`Fraction::reduce`] for
//! lowest terms. Comparison is by value, so `2/4 == 1/2`.
//!
//! ```
//! use flux_concurrency::fraction::{reduced_multiplier, Fraction};
//!
//! let half = Fraction::new(2, 4).unwrap().reduce();
//! assert_eq!(half.to_string(), "1/2");
//!
//! let product = half * reduced_multiplier();
//! assert_eq!(product.to_mixed_string(), "2 1/4");
//! ```

mod generator;

use std::cmp::Ordering;
use std::fmt;
use std::ops::Mul;

pub use generator::FractionSource;

/// Numerator of the constant every pipeline multiplies by.
pub const MULTIPLIER_NUMERATOR: i128 = 846_122_553_600_669_882;
/// Denominator of the constant every pipeline multiplies by.
pub const MULTIPLIER_DENOMINATOR: i128 = 188_027_234_133_482_196;

/// Errors from building a [`Fraction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FractionError {
    /// The denominator was zero.
    #[error("denominator cannot be zero")]
    DivisionByZero,
}

/// A rational number `numerator / denominator`.
#[derive(Clone, Copy, Debug)]
pub struct Fraction {
    numerator: i128,
    denominator: i128,
}

impl Fraction {
    /// Zero, as `0/1`.
    pub const ZERO: Fraction = Fraction {
        numerator: 0,
        denominator: 1,
    };

    /// Build `numerator / denominator` without reducing it.
    ///
    /// # Errors
    ///
    /// Returns [`FractionError::DivisionByZero`] if `denominator` is zero.
    pub fn new(numerator: i128, denominator: i128) -> Result<Self, FractionError> {
        if denominator == 0 {
            return Err(FractionError::DivisionByZero);
        }
        Ok(Self::normalized(numerator, denominator))
    }

    /// Move the sign onto the numerator. `denominator` must be non-zero.
    fn normalized(numerator: i128, denominator: i128) -> Self {
        if denominator < 0 {
            Self {
                numerator: -numerator,
                denominator: -denominator,
            }
        } else {
            Self {
                numerator,
                denominator,
            }
        }
    }

    /// The numerator; carries the sign.
    pub fn numerator(&self) -> i128 {
        self.numerator
    }

    /// The denominator; always positive.
    pub fn denominator(&self) -> i128 {
        self.denominator
    }

    /// This fraction in lowest terms.
    pub fn reduce(self) -> Self {
        let divisor = gcd(self.numerator, self.denominator);
        Self {
            numerator: self.numerator / divisor,
            denominator: self.denominator / divisor,
        }
    }

    /// Whether this fraction is already in lowest terms.
    pub fn is_reduced(&self) -> bool {
        gcd(self.numerator, self.denominator) == 1
    }

    /// Whether this fraction is greater than zero.
    pub fn is_positive(&self) -> bool {
        self.numerator > 0
    }

    /// Multiply, returning `None` on overflow.
    ///
    /// Common factors are cancelled before multiplying, so the product is in
    /// lowest terms whenever both operands are.
    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        let left = gcd(self.numerator, rhs.denominator);
        let right = gcd(rhs.numerator, self.denominator);
        let numerator = (self.numerator / left).checked_mul(rhs.numerator / right)?;
        let denominator = (self.denominator / right).checked_mul(rhs.denominator / left)?;
        Some(Self {
            numerator,
            denominator,
        })
    }

    /// Format as a mixed number: `4 1/2`, `-3/4`, `7`.
    pub fn to_mixed_string(&self) -> String {
        let reduced = self.reduce();
        let whole = reduced.numerator / reduced.denominator;
        let rest = (reduced.numerator % reduced.denominator).abs();
        match (whole, rest) {
            (_, 0) => whole.to_string(),
            (0, _) => reduced.to_string(),
            _ => format!("{whole} {rest}/{}", reduced.denominator),
        }
    }
}

impl Default for Fraction {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Mul for Fraction {
    type Output = Fraction;

    /// # Panics
    ///
    /// Panics if the product does not fit, like integer multiplication in
    /// debug builds.
    fn mul(self, rhs: Self) -> Self::Output {
        match self.checked_mul(rhs) {
            Some(product) => product,
            None => panic!("fraction multiplication overflowed: {self} * {rhs}"),
        }
    }
}

impl PartialEq for Fraction {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Fraction {}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(
            (self.numerator, self.denominator),
            (other.numerator, other.denominator),
        )
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// The constant multiplier, in lowest terms (`9/2`).
pub fn reduced_multiplier() -> Fraction {
    Fraction::normalized(MULTIPLIER_NUMERATOR, MULTIPLIER_DENOMINATOR).reduce()
}

/// Greatest common divisor; never zero for a non-zero `b`.
fn gcd(a: i128, b: i128) -> i128 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Compare `a/b` with `c/d` (positive denominators) by expanding both into
/// continued fractions, which never multiplies and so cannot overflow.
fn compare((mut a, mut b): (i128, i128), (mut c, mut d): (i128, i128)) -> Ordering {
    let mut flipped = false;
    loop {
        let (q1, r1) = (a.div_euclid(b), a.rem_euclid(b));
        let (q2, r2) = (c.div_euclid(d), c.rem_euclid(d));
        let ordering = match (q1.cmp(&q2), r1, r2) {
            (Ordering::Equal, 0, 0) => Ordering::Equal,
            (Ordering::Equal, 0, _) => Ordering::Less,
            (Ordering::Equal, _, 0) => Ordering::Greater,
            (Ordering::Equal, _, _) => {
                // r1/b vs r2/d is b/r1 vs d/r2, reversed.
                (a, b, c, d) = (b, r1, d, r2);
                flipped = !flipped;
                continue;
            }
            (ordering, _, _) => ordering,
        };
        return if flipped { ordering.reverse() } else { ordering };
    }
}
