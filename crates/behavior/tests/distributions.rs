//! Statistical properties of the behavior generators.
//!
//! These run large sample counts and assert loose (3-sigma or percentage)
//! bounds, so they are deterministic given the fixed seeds and cannot flake.

use stampede_behavior::{ArchetypeRegistry, DelayOptions, TimingGenerator, TimingProfile};
use stampede_rng::DeterministicRng;

#[test]
fn skip_rate_converges_to_configured_probability() {
    let mut registry = ArchetypeRegistry::with_defaults(DeterministicRng::new(20_001));

    let trials = 10_000u32;
    let skips = (0..trials)
        .filter(|_| registry.should_skip("whale").unwrap())
        .count() as f64;
    let observed = skips / f64::from(trials);

    // Binomial std dev for p=0.8 over 10k trials.
    let sigma = (0.8 * 0.2 / f64::from(trials)).sqrt();
    let bound = 3.0 * sigma;
    println!("observed skip rate {observed:.4}, bound ±{bound:.4}");
    assert!(
        (observed - 0.8).abs() < bound,
        "skip rate {observed} outside 3 sigma of 0.8"
    );
}

#[test]
fn delay_distribution_is_triangular_around_the_midpoint() {
    let mut generator = TimingGenerator::empty(DeterministicRng::new(20_002));
    generator
        .add_profile("spread", TimingProfile::new(2_000, 8_000, 0.3))
        .unwrap();

    let trials = 50_000usize;
    let mut sum = 0u64;
    let mut near_mid = 0usize;
    let mut near_min = 0usize;
    let mut near_max = 0usize;
    // 600ms buckets centered on 2000, 5000, and 8000.
    for _ in 0..trials {
        let ms = generator
            .sample_delay("spread", DelayOptions::without_variance())
            .unwrap();
        assert!((2_000..=8_000).contains(&ms), "delay {ms} out of range");
        sum += ms;
        if ms.abs_diff(5_000) <= 300 {
            near_mid += 1;
        }
        if ms.abs_diff(2_000) <= 300 {
            near_min += 1;
        }
        if ms.abs_diff(8_000) <= 300 {
            near_max += 1;
        }
    }

    let mean = sum as f64 / trials as f64;
    println!("mean {mean:.1}, mid bucket {near_mid}, min bucket {near_min}, max bucket {near_max}");
    assert!(
        (mean - 5_000.0).abs() < 250.0,
        "mean {mean} more than 5% away from 5000"
    );
    // Triangular shape: the midpoint bucket must clearly dominate both tails.
    assert!(near_mid > near_min * 2, "midpoint not denser than min tail");
    assert!(near_mid > near_max * 2, "midpoint not denser than max tail");
}

#[test]
fn whale_sizes_round_trip_across_instances() {
    let mut a = ArchetypeRegistry::with_defaults(DeterministicRng::new(12345));
    let mut b = ArchetypeRegistry::with_defaults(DeterministicRng::new(12345));

    let sizes_a: Vec<f64> = (0..100)
        .map(|_| a.generate_transaction_size("whale").unwrap())
        .collect();
    let sizes_b: Vec<f64> = (0..100)
        .map(|_| b.generate_transaction_size("whale").unwrap())
        .collect();

    for (i, (x, y)) in sizes_a.iter().zip(&sizes_b).enumerate() {
        assert_eq!(x.to_bits(), y.to_bits(), "size #{i} diverged: {x} vs {y}");
        assert!((10.0..=1_000.0).contains(x), "size #{i} out of range: {x}");
    }
}

#[test]
fn power_law_is_heavy_tailed() {
    let mut registry = ArchetypeRegistry::with_defaults(DeterministicRng::new(20_003));

    let trials = 10_000usize;
    let sizes: Vec<f64> = (0..trials)
        .map(|_| registry.generate_transaction_size("whale").unwrap())
        .collect();

    let below_100 = sizes.iter().filter(|s| **s < 100.0).count();
    let above_500 = sizes.iter().filter(|s| **s > 500.0).count();
    let mean = sizes.iter().sum::<f64>() / trials as f64;

    println!("below 100: {below_100}, above 500: {above_500}, mean {mean:.1}");
    // Range [10, 1000] with exponent 1.5: the bulk sits far below the
    // arithmetic midpoint, with a thin but non-empty large tail.
    assert!(below_100 > trials / 2, "small values not dominant");
    assert!(above_500 > 0, "tail completely empty");
    assert!(mean < 505.0, "mean {mean} not pulled below the midpoint");
}
