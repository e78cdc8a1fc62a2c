use hw_sample::stat::{mean, RollingMean};
use hw_sample::{DensityOfStates, Histogram};
use proptest::prelude::*;

proptest! {
    #[test]
    fn every_value_is_counted_exactly_once(values in prop::collection::vec(-20.0f64..20.0, 0..200)) {
        let mut h = Histogram::new(8, -10.0, 10.0);
        for v in &values {
            h.add(*v);
        }
        let in_range: f64 = h.data().iter().sum();
        prop_assert_eq!(in_range as u64, h.count());
        prop_assert_eq!(h.count() + h.below() + h.above(), values.len() as u64);
    }

    #[test]
    fn rolling_mean_is_the_mean_of_the_window(
        values in prop::collection::vec(-100.0f64..100.0, 1..60),
        capacity in 1usize..20,
    ) {
        let mut rm = RollingMean::new(capacity);
        for v in &values {
            rm.add(*v);
        }
        let start = values.len().saturating_sub(capacity);
        prop_assert!((rm.mean() - mean(&values[start..])).abs() < 1e-9);
    }

    #[test]
    fn normalized_densities_sum_to_one(ln_g in prop::collection::vec(-50.0f64..50.0, 1..30)) {
        let borders: Vec<f64> = (0..=ln_g.len()).map(|i| i as f64).collect();
        let mut density = DensityOfStates::from_parts(borders, ln_g);
        density.normalize();
        let total: f64 = density.values().iter().map(|g| g.exp()).sum();
        prop_assert!((total - 1.0).abs() < 1e-9);
    }
}
