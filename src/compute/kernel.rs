//! Elementwise field arithmetic, four lanes at a time.
//!
//! Lanes and the scalar tail evaluate the same expression in the same order,
//! so results do not depend on where a cell falls relative to a lane boundary.

use wide::f64x4;

const LANES: usize = 4;

#[inline(always)]
fn load(src: &[f64], start: usize) -> f64x4 {
    let mut buf = [0.0; LANES];
    buf.copy_from_slice(&src[start..start + LANES]);
    f64x4::from(buf)
}

/// `dest[i] = Σ weight * term[i]` over every `(weight, term)` pair.
pub fn weighted_sum(dest: &mut [f64], terms: &[(f64, &[f64])]) {
    let len = dest.len();
    debug_assert!(terms.iter().all(|(_, t)| t.len() == len));
    let split = len - len % LANES;

    for start in (0..split).step_by(LANES) {
        let mut acc = f64x4::splat(0.0);
        for &(weight, term) in terms {
            acc = acc + f64x4::splat(weight) * load(term, start);
        }
        dest[start..start + LANES].copy_from_slice(&acc.to_array());
    }
    for i in split..len {
        let mut acc = 0.0;
        for &(weight, term) in terms {
            acc = acc + weight * term[i];
        }
        dest[i] = acc;
    }
}

/// `values[i] = max(values[i], floor)`.
pub fn clamp_min(values: &mut [f64], floor: f64) {
    let len = values.len();
    let split = len - len % LANES;
    let lanes_floor = f64x4::splat(floor);
    for start in (0..split).step_by(LANES) {
        let v = load(values, start).max(lanes_floor);
        values[start..start + LANES].copy_from_slice(&v.to_array());
    }
    for v in &mut values[split..] {
        *v = v.max(floor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(3)]
    #[case(4)]
    #[case(11)]
    fn test_weighted_sum_matches_scalar(#[case] len: usize) {
        let a: Vec<f64> = (0..len).map(|i| i as f64 * 0.1).collect();
        let b: Vec<f64> = (0..len).map(|i| 1.0 / (i as f64 + 1.0)).collect();
        let mut dest = vec![f64::NAN; len];
        weighted_sum(&mut dest, &[(1.0, &a), (-2.0, &b)]);
        for i in 0..len {
            assert_eq!(dest[i], 0.0 + 1.0 * a[i] + -2.0 * b[i]);
        }
    }

    #[test]
    fn test_clamp_min() {
        let mut v = vec![-1.0, 2.0, -0.5, 0.0, -3.0];
        clamp_min(&mut v, 0.0);
        assert_eq!(v, vec![0.0, 2.0, 0.0, 0.0, 0.0]);
    }
}
