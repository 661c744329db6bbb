//! End-to-end pipelines over random fractions.
//!
//! Each entry point builds a complete pipeline and returns a
//! [`SingleResult<()>`](SingleResult) that resolves once the sorted results
//! have been printed. Nothing runs until that result is driven.
//!
//! - [`fraction_exceptions`]: a fixed list of denominators, one of which is
//!   zero, fanned out with per-element recovery.
//! - [`fraction_multiplications_create`]: a demand-driven generator bounded
//!   by [`Flux::take`](crate::flux::Flux::take).
//! - [`fraction_multiplications_bridge`]: a plain iterator whose elements are
//!   joined through a [`Barrier`].
//!
//! The `*_products` functions build the same pipelines minus the report, for
//! callers that want the values.

use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::flux::{self, FluxSink, DEFAULT_CONCURRENCY};
use crate::fraction::{reduced_multiplier, Fraction, FractionSource};
use crate::report::{sort_and_report, Transcript};
use crate::scheduler::Scheduler;
use crate::single::{Barrier, SingleResult};

/// Denominators fed to [`fraction_exceptions`]; the zero is deliberate.
pub const DENOMINATORS: [i128; 5] = [3, 4, 2, 0, 1];

/// How many fractions the generator-driven pipelines produce by default.
pub const DEFAULT_COUNT: usize = 10;

/// Run-time settings shared by every pipeline.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Number of fractions the generator-driven pipelines produce.
    pub count: usize,
    /// Seed for the fraction source; `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Fan-out limit for every `expand`.
    pub concurrency: NonZeroUsize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
            seed: None,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl PipelineConfig {
    /// A fresh fraction source for one pipeline run.
    pub fn source(&self) -> Arc<FractionSource> {
        let source = match self.seed {
            Some(seed) => FractionSource::seeded(seed),
            None => FractionSource::from_entropy(),
        };
        Arc::new(source)
    }
}

/// Reduce `unreduced` and multiply it by the constant multiplier.
///
/// Both steps are separate computations placed on `scheduler`, the second
/// chained after the first.
pub fn reduce_and_multiply(unreduced: Fraction, scheduler: &Scheduler) -> SingleResult<Fraction> {
    let next = scheduler.clone();
    let multiplier = reduced_multiplier();
    SingleResult::from_fn(move || unreduced.reduce())
        .run_on(scheduler.clone())
        .flat_map(move |reduced| SingleResult::from_fn(move || reduced * multiplier).run_on(next))
}

/// Divide a random numerator by each of [`DENOMINATORS`] on the parallel
/// scheduler, multiply by the constant and keep the positive products.
///
/// A zero denominator fails only its own element: the failure is written to
/// `transcript` and replaced by zero, which the positivity filter drops.
pub fn recovered_products(
    config: &PipelineConfig,
    transcript: &Transcript,
) -> SingleResult<Vec<Fraction>> {
    let source = config.source();
    let transcript = transcript.clone();
    let multiplier = reduced_multiplier();

    flux::from_iter(DENOMINATORS)
        .expand(config.concurrency, move |denominator| {
            let numerator = source.numerator();
            let (failures, products) = (transcript.clone(), transcript.clone());
            SingleResult::from_computation(move || Fraction::new(numerator, denominator))
                .run_on(Scheduler::parallel())
                .recover(move |err| {
                    failures.line(format_args!("exception = {err}"));
                    SingleResult::just(Fraction::ZERO)
                })
                .map(move |fraction| {
                    products.line(format_args!(
                        "{} x {}",
                        fraction.to_mixed_string(),
                        multiplier.to_mixed_string()
                    ));
                    fraction * multiplier
                })
        })
        .filter(Fraction::is_positive)
        .collect()
}

/// Run [`recovered_products`] and report the result.
pub fn fraction_exceptions(config: &PipelineConfig) -> SingleResult<()> {
    let transcript = Transcript::new("fraction_exceptions");
    recovered_products(config, &transcript)
        .flat_map(move |products| sort_and_report(products, transcript))
}

/// Pull `config.count` unreduced fractions from a demand-driven generator and
/// reduce and multiply each one on the parallel scheduler.
pub fn created_products(config: &PipelineConfig) -> SingleResult<Vec<Fraction>> {
    let source = config.source();
    let parallel = Scheduler::parallel();

    flux::create(move |sink: &FluxSink<Fraction>, requested| {
        for _ in 0..requested {
            sink.next(source.make_fraction(false));
        }
    })
    .take(config.count)
    .expand(config.concurrency, move |unreduced| {
        reduce_and_multiply(unreduced, &parallel)
    })
    .collect()
}

/// Run [`created_products`] and report the result.
pub fn fraction_multiplications_create(config: &PipelineConfig) -> SingleResult<()> {
    let transcript = Transcript::new("fraction_multiplications_create");
    created_products(config).flat_map(move |products| sort_and_report(products, transcript))
}

/// Reduce and multiply `config.count` fractions taken from a plain iterator,
/// each on `scheduler`, and wait for all of them through a [`Barrier`].
pub fn bridged_products(config: &PipelineConfig, scheduler: &Scheduler) -> SingleResult<Vec<Fraction>> {
    let source = config.source();
    let barrier: Barrier<Fraction> = std::iter::repeat_with(|| source.make_fraction(false))
        .take(config.count)
        .map(|unreduced| reduce_and_multiply(unreduced, scheduler))
        .collect();
    barrier.into()
}

/// Run [`bridged_products`] and report the result.
pub fn fraction_multiplications_bridge(
    config: &PipelineConfig,
    scheduler: &Scheduler,
) -> SingleResult<()> {
    let transcript = Transcript::new("fraction_multiplications_bridge");
    bridged_products(config, scheduler)
        .flat_map(move |products| sort_and_report(products, transcript))
}

#[cfg(test)]
mod test {
    use super::*;

    fn seeded(seed: u64) -> PipelineConfig {
        PipelineConfig {
            seed: Some(seed),
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn zero_denominator_is_isolated() {
        let config = seeded(17);
        let transcript = Transcript::new("test");
        let mut products = recovered_products(&config, &transcript).wait().unwrap();
        products.sort_unstable();

        // Replay the numerators in the order the pipeline drew them.
        let source = config.source();
        let multiplier = reduced_multiplier();
        let mut expected: Vec<_> = DENOMINATORS
            .iter()
            .map(|&denominator| (source.numerator(), denominator))
            .filter(|&(_, denominator)| denominator != 0)
            .map(|(numerator, denominator)| Fraction::new(numerator, denominator).unwrap() * multiplier)
            .collect();
        expected.sort_unstable();

        assert_eq!(products, expected);

        let contents = transcript.contents();
        assert_eq!(contents.matches("exception = denominator cannot be zero").count(), 1);
        assert_eq!(contents.matches(" x 4 1/2").count(), DENOMINATORS.len());
        assert!(contents.contains("     0 x 4 1/2\n"));
    }

    #[test]
    fn reduce_and_multiply_uses_both_steps() {
        let unreduced = Fraction::new(40, 20).unwrap();
        let product = reduce_and_multiply(unreduced, &Scheduler::parallel())
            .wait()
            .unwrap();
        assert_eq!((product.numerator(), product.denominator()), (9, 1));
    }

    #[test]
    fn created_products_respect_the_count() {
        let config = PipelineConfig {
            count: 7,
            ..seeded(3)
        };
        let products = created_products(&config).wait().unwrap();
        assert_eq!(products.len(), 7);
        assert!(products.iter().all(|p| p.is_reduced() && p.is_positive()));
    }

    #[test]
    fn bridged_products_match_created_ones() {
        let config = seeded(99);
        let mut created = created_products(&config).wait().unwrap();
        let mut bridged = bridged_products(&config, &Scheduler::parallel()).wait().unwrap();
        created.sort_unstable();
        bridged.sort_unstable();
        assert_eq!(created, bridged);
    }
}
