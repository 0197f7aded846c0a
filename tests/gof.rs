// MIT License

// Copyright (c) 2023 Ryan Andersen

// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:

// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Statistical goodness-of-fit coverage: every exact sampler family should
//! reproduce its target distribution closely enough that a chi-square test
//! can't reject it at the 5% level, over a fixed battery of target vectors.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::ToPrimitive;
use rand::rngs::ThreadRng;

use discrete_sampling::alias::Alias;
use discrete_sampling::interval::IntervalIntegerCdf;
use discrete_sampling::ky::KyEncoding;
use discrete_sampling::ky::KyMatrix;
use discrete_sampling::rand::{thread_rng_bitstream, RandomBitStream};
use discrete_sampling::rejection::{RejectionBinarySearch, RejectionHashTable, RejectionKyAugmented, RejectionUniform};

const SAMPLE_COUNT: usize = 10_000;

/// Lanczos approximation to `ln(gamma(x))`, g=7 n=9 coefficients.
fn ln_gamma(x: f64) -> f64 {
    const G: f64 = 7.0;
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];
    if x < 0.5 {
        // Reflection formula.
        (std::f64::consts::PI / (std::f64::consts::PI * x).sin()).ln() - ln_gamma(1.0 - x)
    } else {
        let x = x - 1.0;
        let mut a = COEFFS[0];
        let t = x + G + 0.5;
        for (i, c) in COEFFS.iter().enumerate().skip(1) {
            a += c / (x + i as f64);
        }
        0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + a.ln()
    }
}

/// Regularized lower incomplete gamma function `P(a, x)`, via series
/// expansion (`x < a + 1`) or a continued fraction (`x >= a + 1`).
fn gamma_inc_lower_reg(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x < a + 1.0 {
        let mut term = 1.0 / a;
        let mut sum = term;
        let mut n = a;
        for _ in 0..500 {
            n += 1.0;
            term *= x / n;
            sum += term;
            if term.abs() < sum.abs() * 1e-15 {
                break;
            }
        }
        sum * (-x + a * x.ln() - ln_gamma(a)).exp()
    } else {
        // Continued fraction for the upper incomplete gamma, Q(a,x).
        let mut b = x + 1.0 - a;
        let mut c = 1e300;
        let mut d = 1.0 / b;
        let mut h = d;
        for i in 1..500 {
            let an = -(i as f64) * (i as f64 - a);
            b += 2.0;
            d = an * d + b;
            if d.abs() < 1e-300 {
                d = 1e-300;
            }
            c = b + an / c;
            if c.abs() < 1e-300 {
                c = 1e-300;
            }
            d = 1.0 / d;
            let del = d * c;
            h *= del;
            if (del - 1.0).abs() < 1e-15 {
                break;
            }
        }
        let q = (-x + a * x.ln() - ln_gamma(a)).exp() * h;
        1.0 - q
    }
}

fn chi_square_p_value(observed: &[usize], p: &[BigRational]) -> f64 {
    let n: f64 = observed.iter().sum::<usize>() as f64;
    let mut stat = 0.0;
    for (&o, pi) in observed.iter().zip(p) {
        let expected = n * pi.to_f64().expect("probability converts to f64");
        if expected > 0.0 {
            let diff = o as f64 - expected;
            stat += diff * diff / expected;
        }
    }
    let nonzero_categories = p.iter().filter(|pi| pi.to_f64().unwrap_or(0.0) != 0.0).count().max(1);
    let dof = (nonzero_categories - 1).max(1) as f64;
    1.0 - gamma_inc_lower_reg(dof / 2.0, stat / 2.0)
}

fn ratio(n: i64, d: i64) -> BigRational {
    BigRational::new(BigInt::from(n), BigInt::from(d))
}

fn targets() -> Vec<Vec<BigRational>> {
    vec![
        vec![ratio(1, 2), ratio(1, 2)],
        vec![ratio(1, 7), ratio(6, 7)],
        vec![ratio(1, 19), ratio(6, 19), ratio(10, 19), ratio(2, 19)],
        vec![ratio(10, 15), ratio(1, 15), ratio(4, 15)],
    ]
}

fn assert_gof(name: &str, p: &[BigRational], mut sample: impl FnMut(&mut RandomBitStream<ThreadRng>) -> usize) {
    let mut coin = thread_rng_bitstream(32);
    let mut observed = vec![0usize; p.len()];
    for _ in 0..SAMPLE_COUNT {
        observed[sample(&mut coin)] += 1;
    }
    let p_value = chi_square_p_value(&observed, p);
    assert!(p_value > 0.05, "{name} failed chi-square GOF for {p:?}: p-value {p_value} (observed {observed:?})");
}

#[test]
fn ky_encoding_matches_every_target() {
    for p in targets() {
        let sampler = KyEncoding::construct(&p).unwrap();
        assert_gof("ky-encoding", &p, |coin| sampler.sample(coin));
    }
}

#[test]
fn ky_matrix_matches_every_target() {
    for p in targets() {
        let sampler = KyMatrix::construct(&p).unwrap();
        assert_gof("ky-matrix", &p, |coin| sampler.sample(coin));
    }
}

#[test]
fn ky_matrix_cached_matches_every_target() {
    for p in targets() {
        let sampler = KyMatrix::construct(&p).unwrap().into_cached();
        assert_gof("ky-matrix-cached", &p, |coin| sampler.sample(coin));
    }
}

#[test]
fn rejection_uniform_matches_every_target() {
    for p in targets() {
        let sampler = RejectionUniform::construct(&p).unwrap();
        assert_gof("rejection-uniform", &p, |coin| sampler.sample(coin));
    }
}

#[test]
fn rejection_hash_table_matches_every_target() {
    for p in targets() {
        let sampler = RejectionHashTable::construct(&p).unwrap();
        assert_gof("rejection-hash", &p, |coin| sampler.sample(coin));
    }
}

#[test]
fn rejection_binary_search_matches_every_target() {
    for p in targets() {
        let sampler = RejectionBinarySearch::construct(&p).unwrap();
        assert_gof("rejection-binary", &p, |coin| sampler.sample(coin));
    }
}

#[test]
fn rejection_ky_augmented_matches_every_target() {
    for p in targets() {
        let sampler = RejectionKyAugmented::construct(&p).unwrap();
        assert_gof("rejection-encoding", &p, |coin| sampler.sample(coin));
    }
}

#[test]
fn interval_matches_every_target() {
    for p in targets() {
        let sampler = IntervalIntegerCdf::construct_default(&p).unwrap();
        assert_gof("interval", &p, |coin| sampler.sample(coin).unwrap());
    }
}

#[test]
fn alias_matches_every_target() {
    for p in targets() {
        let sampler = Alias::construct(&p).unwrap();
        assert_gof("alias", &p, |coin| sampler.sample(coin));
    }
}
