use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::Fraction;

/// A shared source of random fractions.
///
/// Seeded sources produce the same sequence on every run, as long as values
/// are drawn in the same order.
#[derive(Debug)]
pub struct FractionSource {
    rng: Mutex<StdRng>,
}

impl FractionSource {
    /// A deterministic source.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// A source seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// A random positive numerator in `1..=i32::MAX`.
    pub fn numerator(&self) -> i128 {
        self.rng.lock().gen_range(1..=i128::from(i32::MAX))
    }

    /// A large random fraction with a value in `[1, 20)`, close to a random
    /// factor in `1..=10`.
    ///
    /// The denominator is the numerator divided by a random factor in
    /// `1..=10`. With `reduced` unset the fraction is left as built, which
    /// usually means it is far from lowest terms.
    pub fn make_fraction(&self, reduced: bool) -> Fraction {
        let (numerator, factor) = {
            let mut rng = self.rng.lock();
            (
                rng.gen_range(10..=i128::from(i64::MAX)),
                rng.gen_range(1..=10),
            )
        };
        // numerator >= 10 >= factor, so the denominator is never zero.
        let fraction = Fraction::normalized(numerator, numerator / factor);
        if reduced {
            fraction.reduce()
        } else {
            fraction
        }
    }
}

impl Default for FractionSource {
    fn default() -> Self {
        Self::from_entropy()
    }
}
