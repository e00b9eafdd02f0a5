mod common;
use common::assert_float_eq;

use booksim::metrics::SampleMetric;

#[test]
fn test_quantiles_degenerate() {
    let mut m: SampleMetric = Default::default();
    let init = 111111.0;
    m.add(init);
    for q in &[0.0, 0.25, 0.5, 0.75, 1.0] {
        let val = m.quantile(*q);
        assert_float_eq(val, init, 1e-9);
    }
}

#[test]
fn test_quantiles_simple() {
    let mut m: SampleMetric = Default::default();
    for i in (0..11).rev() {
        m.add(i as f64);
    }
    for q in &[0.0, 0.25, 0.5, 0.75, 0.9, 1.0] {
        let val = m.quantile(*q);
        assert_float_eq(val, 10.0 * (*q), 1e-12);
    }
}

#[test]
fn test_quantile_interpolation() {
    let mut m: SampleMetric = Default::default();
    m.add(1.);
    m.add(2.);
    assert_float_eq(m.quantile(0.5), 1.5, 1e-12);
    assert_float_eq(m.quantile(0.99), 1.99, 1e-12);
}

#[test]
fn test_simple_methods() {
    let mut m: SampleMetric = Default::default();
    for i in 0..111 {
        m.add(i as f64);
    }
    assert_eq!(m.len(), 111);
    assert_float_eq(m.sum(), 6105.0, 1e-12);
    assert_float_eq(m.mean(), 55.0, 1e-12);
    assert_float_eq(m.min().unwrap(), 0.0, 1e-12);
    assert_float_eq(m.max().unwrap(), 110.0, 1e-12);
    assert_float_eq(m.biased_variance(), 1026.6666666666666, 1e-9);
    assert_float_eq(m.unbiased_variance(), 1036.0, 1e-9);
}

#[test]
fn test_empty() {
    let m: SampleMetric = Default::default();
    assert!(m.is_empty());
    assert!(m.mean().is_nan());
    assert!(m.quantile(0.5).is_nan());
    assert_eq!(m.min(), None);
}
