use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use flux_concurrency::flux::{self, FluxSink, DEFAULT_CONCURRENCY};
use flux_concurrency::fraction::{Fraction, FractionError};
use flux_concurrency::pipelines::{self, PipelineConfig};
use flux_concurrency::report::{sort_and_report, Transcript};
use flux_concurrency::{Error, Scheduler, SingleResult};

fn seeded(seed: u64) -> PipelineConfig {
    PipelineConfig {
        seed: Some(seed),
        ..PipelineConfig::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn exceptions_pipeline_reports_four_ascending_products() {
    let config = seeded(2024);
    let transcript = Transcript::new("fraction_exceptions");
    let products = pipelines::recovered_products(&config, &transcript)
        .await
        .unwrap();
    assert_eq!(products.len(), 4);
    assert!(products.iter().all(Fraction::is_positive));

    sort_and_report(products, transcript.clone()).await.unwrap();

    let contents = transcript.contents();
    assert!(contents.starts_with(">> Calling fraction_exceptions()\n"));
    assert_eq!(contents.matches("     exception = ").count(), 1);

    let reported: Vec<&str> = contents
        .split("Printing sorted results:\n")
        .nth(1)
        .unwrap()
        .lines()
        .collect();
    assert_eq!(reported.len(), 4);
    assert!(reported.iter().all(|line| line.starts_with("     ")));
}

#[tokio::test(flavor = "multi_thread")]
async fn entry_points_resolve() {
    let config = PipelineConfig {
        count: 5,
        ..seeded(1)
    };
    let stealer = Scheduler::from_tokio(tokio::runtime::Handle::current());

    pipelines::fraction_exceptions(&config).await.unwrap();
    pipelines::fraction_multiplications_create(&config)
        .await
        .unwrap();
    pipelines::fraction_multiplications_bridge(&config, &stealer)
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn bridge_runs_on_an_external_pool() {
    let stealer = Scheduler::from_tokio(tokio::runtime::Handle::current());
    let products = pipelines::bridged_products(&seeded(5), &stealer)
        .await
        .unwrap();
    assert_eq!(products.len(), 10);
    assert!(products.iter().all(|p| p.is_reduced() && p.is_positive()));
}

#[tokio::test(flavor = "multi_thread")]
async fn recovery_stays_local_to_its_element() {
    let mut values = flux::from_iter(0..12u32)
        .expand(DEFAULT_CONCURRENCY, |n| {
            SingleResult::from_computation(move || {
                if n % 3 == 0 {
                    Err(FractionError::DivisionByZero)
                } else {
                    Ok(n * 10)
                }
            })
            .run_on(Scheduler::parallel())
            .recover(|err| {
                assert_eq!(
                    err.downcast_ref::<FractionError>(),
                    Some(&FractionError::DivisionByZero)
                );
                SingleResult::just(0)
            })
        })
        .collect()
        .await
        .unwrap();
    values.sort_unstable();

    let mut expected: Vec<u32> = (0..12).map(|n| if n % 3 == 0 { 0 } else { n * 10 }).collect();
    expected.sort_unstable();
    assert_eq!(values, expected);
}

#[tokio::test(flavor = "multi_thread")]
async fn unrecovered_failure_fails_the_collect() {
    let err = flux::from_iter([3, 0, 1])
        .expand(DEFAULT_CONCURRENCY, |denominator| {
            SingleResult::from_computation(move || Fraction::new(1, denominator))
                .run_on(Scheduler::parallel())
        })
        .collect()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Computation(_)));
    assert!(!err.is_pipeline_failure());
    assert_eq!(err.to_string(), "denominator cannot be zero");
}

#[tokio::test(flavor = "multi_thread")]
async fn take_stops_a_push_source() {
    let requests = Arc::new(AtomicU64::new(0));
    let counter = requests.clone();
    let items = flux::create(move |sink: &FluxSink<u64>, requested| {
        let first = counter.fetch_add(requested, Ordering::SeqCst);
        for n in first..first + requested {
            sink.next(n);
        }
    })
    .take(6)
    .collect()
    .await
    .unwrap();

    assert_eq!(items, [0, 1, 2, 3, 4, 5]);
    assert_eq!(requests.load(Ordering::SeqCst), 6);
}
