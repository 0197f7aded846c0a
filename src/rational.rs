//! Rational arithmetic and the "k-l number system".
//!
//! This is the shared substrate every sampler family in the crate is built
//! on: turning a probability vector into an exact common denominator `Z` and
//! integer numerators, expressing `1/Z`'s eventually-periodic binary
//! expansion as a `(k, l)` pair, and converting between a numerator and its
//! `k`-bit representation in that mixed-radix system.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::error::{Error, Result};

/// Least `Z` such that every `p_i` is an integer multiple of `1/Z`.
pub fn common_denominator(p: &[BigRational]) -> BigUint {
    p.iter().fold(BigUint::one(), |acc, r| {
        let denom = r.denom().to_biguint().expect("denominator is non-negative");
        acc.lcm(&denom)
    })
}

/// Integer numerators of `p` expressed over the common denominator `z`.
///
/// Assumes `z` is a multiple of every `p_i`'s denominator (true of
/// `z = common_denominator(p)`).
pub fn numerators(z: &BigUint, p: &[BigRational]) -> Vec<BigUint> {
    p.iter()
        .map(|r| {
            let denom = r.denom().to_biguint().expect("denominator is non-negative");
            let numer = r.numer().to_biguint().expect("probability must be non-negative");
            let (q, rem) = z.div_rem(&denom);
            debug_assert!(rem.is_zero(), "Z must be a multiple of each denominator");
            q * numer
        })
        .collect()
}

/// Validate that `p` is a well-formed probability vector: non-empty, every
/// entry non-negative, and the entries sum to exactly 1.
pub fn validate_distribution(p: &[BigRational]) -> Result<()> {
    if p.is_empty() {
        return Err(Error::EmptyDistribution);
    }
    if let Some(index) = p.iter().position(|r| r.is_negative()) {
        return Err(Error::NegativeProbability { index });
    }
    let sum: BigRational = p.iter().cloned().fold(BigRational::zero(), |a, b| a + b);
    if sum != BigRational::one() {
        return Err(Error::NotNormalized {
            numerator: sum.numer().to_string(),
            denominator: sum.denom().to_string(),
        });
    }
    Ok(())
}

/// Process-wide cache of multiplicative orders, since repeated
/// constructions over related `Z` values (sweeps, batches of related
/// distributions) recompute the same orders often.
fn order_cache() -> &'static Mutex<HashMap<BigUint, u64>> {
    static CACHE: OnceLock<Mutex<HashMap<BigUint, u64>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Multiplicative order of 2 modulo an odd `m` (order of 2 in (Z/mZ)*).
///
/// Replaces the native `orderm2` helper the original implementation shelled
/// out to: iterate `v <- 2v mod m` until `v` returns to 1, counting steps.
pub fn multiplicative_order_of_two(m: &BigUint) -> u64 {
    if let Some(&cached) = order_cache().lock().unwrap().get(m) {
        return cached;
    }
    let order = if m.is_one() {
        1
    } else {
        let two = BigUint::from(2u32);
        let mut v = &two % m;
        let mut r: u64 = 1;
        while !v.is_one() {
            v = (&v * &two) % m;
            r += 1;
        }
        r
    };
    order_cache().lock().unwrap().insert(m.clone(), order);
    order
}

/// Length of the preperiod (`l`) and total length (`k`) of the binary
/// expansion of `1/m`.
///
/// For odd `m`, `l = 0` and `k` is the multiplicative order of 2 mod `m`.
/// For `m = 2^w * m'` with `m'` odd, `l = w` and `k = w` (if `m' = 1`) or
/// `k = order(m') + w` otherwise.
pub fn binary_expansion_length(m: &BigUint) -> (u32, u32) {
    assert!(!m.is_zero(), "binary expansion length undefined for 0");
    if m.is_odd() {
        let k = multiplicative_order_of_two(m) as u32;
        return (k, 0);
    }
    let mut mp = m >> 1u32;
    let mut w: u32 = 1;
    while mp.is_even() {
        w += 1;
        mp >>= 1u32;
    }
    if mp.is_one() {
        (w, w)
    } else {
        let kp = multiplicative_order_of_two(&mp) as u32;
        (kp + w, w)
    }
}

/// Smallest `k` such that `2^k >= m` (`m` must be nonzero).
pub fn ceil_log2(m: &BigUint) -> u32 {
    assert!(!m.is_zero(), "ceil_log2 undefined for 0");
    let bits = m.bits() as u32;
    let is_pow2 = *m == BigUint::one() << (bits - 1);
    if is_pow2 {
        bits - 1
    } else {
        bits
    }
}

/// `Zkl(k, l) = 2^k - 2^l` when `l < k`, else `2^k`.
pub fn zkl(k: u32, l: u32) -> BigUint {
    assert!(l <= k);
    let base = BigUint::one() << k;
    if l < k {
        base - (BigUint::one() << l)
    } else {
        base
    }
}

/// `Zb(k, l) = 2^(k-l) - 1` when `l < k`, else `2^(k-l) = 1`.
pub fn zb(k: u32, l: u32) -> BigUint {
    assert!(l <= k);
    let base = BigUint::one() << (k - l);
    if l < k {
        base - BigUint::one()
    } else {
        base
    }
}

/// Big-endian `width`-bit encoding of `x`. `x` must fit in `width` bits.
pub fn encode_binary(x: &BigUint, width: u32) -> Vec<u8> {
    if width == 0 {
        assert!(x.is_zero());
        return Vec::new();
    }
    assert!(x.bits() <= width as u64);
    (0..width)
        .map(|i| {
            let bit_pos = width - 1 - i;
            u8::from(x.bit(bit_pos as u64))
        })
        .collect()
}

fn bits_to_biguint(bits: &[u8]) -> BigUint {
    let mut acc = BigUint::zero();
    for &b in bits {
        acc <<= 1u32;
        if b != 0 {
            acc |= BigUint::one();
        }
    }
    acc
}

/// Binary expansion of `m / Zkl(k, l)` in the `l`-bit prefix ‖ `(k-l)`-bit
/// suffix layout of the k-l number system.
pub fn frac_to_bits(m: &BigUint, k: u32, l: u32) -> Vec<u8> {
    debug_assert!(*m < zkl(k, l) || (k == 1 && l == 0));
    let (x, y) = if l == k {
        (m.clone(), BigUint::zero())
    } else if l == 0 {
        (BigUint::zero(), m.clone())
    } else {
        let b = zb(k, l);
        let x = m / &b;
        let y = m - &b * &x;
        (x, y)
    };
    let mut bits = encode_binary(&x, l);
    bits.extend(encode_binary(&y, k - l));
    bits
}

/// Binary expansion of `m / 2^k` (the `l = k` dyadic special case).
pub fn frac_to_bits_dyadic(m: &BigUint, k: u32) -> Vec<u8> {
    encode_binary(m, k)
}

/// Inverse of `frac_to_bits`: returns `(numerator, Zkl(k, l))`.
pub fn bits_to_frac(bits: &[u8], k: u32, l: u32) -> (BigUint, BigUint) {
    assert_eq!(bits.len() as u32, k);
    let prefix = &bits[..l as usize];
    let suffix = &bits[l as usize..];
    let int_prefix = bits_to_biguint(prefix);
    let int_suffix = bits_to_biguint(suffix);
    let numerator = zb(k, l) * int_prefix + int_suffix;
    (numerator, zkl(k, l))
}

/// Simplify `(M_i / Zkl(k, l))` to lowest terms, per spec.md §4.1:
///
/// 1. If any `M_i == Zkl`, the distribution collapses to the trivial
///    1-bit sampler (all mass on that outcome).
/// 2. If `l > 0` and every `M_i` is even, halve all and decrement `(k, l)`.
/// 3. If every `M_i` is equal and `Zkl / M_0` is a power of two, collapse to
///    a uniform distribution over a smaller `(k, l)`.
/// 4. Otherwise, return unchanged.
pub fn reduce_fractions(ms: &[BigUint], k: u32, l: u32) -> Result<(Vec<BigUint>, u32, u32)> {
    let target = zkl(k, l);
    let sum: BigUint = ms.iter().fold(BigUint::zero(), |acc, m| acc + m);
    if sum != target {
        return Err(Error::SumInvariantViolated(
            ms.iter().map(|m| m.to_string()).collect(),
            k,
            l,
        ));
    }

    if ms.iter().any(|m| *m == target) {
        let reduced: Vec<BigUint> = ms.iter().map(|m| m / &target).collect();
        return Ok((reduced, 1, 0));
    }
    if l == 0 {
        return Ok((ms.to_vec(), k, l));
    }
    if ms.iter().all(|m| m.is_even()) {
        let halved: Vec<BigUint> = ms.iter().map(|m| m >> 1u32).collect();
        return reduce_fractions(&halved, k - 1, l - 1);
    }
    if ms.iter().all(|m| *m == ms[0]) {
        let remainder = &target / &ms[0];
        debug_assert_eq!(&remainder * &ms[0], target);
        let base = remainder.bits() as u32 - 1;
        debug_assert_eq!(BigUint::one() << base, remainder);
        return Ok((vec![BigUint::one(); ms.len()], base, base));
    }
    Ok((ms.to_vec(), k, l))
}

/// Binary expansion of `a/b` for `0 <= a <= b`, via the k-l number system.
///
/// Returns `(preperiod, period)` bit vectors. `a/b` need not be in lowest
/// terms. Agrees with [`binary_expansion_by_doubling`]; see
/// `binary_expansion_matches_doubling_for_a_range_of_fractions` for the
/// cross-check between the two.
pub fn binary_expansion(a: &BigUint, b: &BigUint) -> (Vec<u8>, Vec<u8>) {
    assert!(a <= b);
    if a == b {
        return (Vec::new(), vec![1]);
    }
    let g = a.gcd(b);
    let an = a / &g;
    let bn = b / &g;
    let (k, l) = binary_expansion_length(&bn);
    let zkl_val = zkl(k, l);
    let (numerator, rem) = (&zkl_val * &an).div_rem(&bn);
    debug_assert!(rem.is_zero(), "Zkl must be a multiple of the reduced denominator");
    let bits = frac_to_bits(&numerator, k, l);
    let (prefix, suffix) = bits.split_at(l as usize);
    (prefix.to_vec(), suffix.to_vec())
}

/// Binary expansion of `a/b` via the classic "double and detect a repeated
/// remainder" technique, independent of the k-l construction.
pub fn binary_expansion_by_doubling(a: &BigUint, b: &BigUint) -> (Vec<u8>, Vec<u8>) {
    assert!(a <= b);
    let mut x = a.clone();
    let mut xs: Vec<u8> = Vec::new();
    let mut cache: HashMap<BigUint, usize> = HashMap::new();
    let mut i = 0usize;
    let split = loop {
        x *= 2u32;
        if let Some(&l) = cache.get(&x) {
            break l;
        }
        let d = u8::from(*b <= x);
        xs.push(d);
        cache.insert(x.clone(), i);
        i += 1;
        if x == *b {
            break i;
        }
        if x > *b {
            x -= b;
        }
    };
    let (prefix, suffix) = xs.split_at(split);
    (prefix.to_vec(), suffix.to_vec())
}

/// Decode an `f64` into its exact `BigRational` value (the IEEE 754 value,
/// not a rounded decimal approximation), equivalent to Python's
/// `float.as_integer_ratio()`.
pub fn f64_to_exact_ratio(x: f64) -> BigRational {
    assert!(x.is_finite(), "cannot convert non-finite float to a ratio");
    if x == 0.0 {
        return BigRational::zero();
    }
    let bits = x.to_bits();
    let sign = if (bits >> 63) & 1 == 1 { Sign::Minus } else { Sign::Plus };
    let mut exponent = ((bits >> 52) & 0x7ff) as i64;
    let mut mantissa = bits & 0x000f_ffff_ffff_ffff;
    if exponent == 0 {
        // Subnormal.
        exponent = -1074;
    } else {
        mantissa |= 1u64 << 52;
        exponent -= 1075;
    }
    let numer = BigInt::from_biguint(sign, BigUint::from(mantissa));
    if exponent >= 0 {
        BigRational::from_integer(numer << exponent as usize)
    } else {
        let denom = BigInt::one() << (-exponent) as usize;
        BigRational::new(numer, denom)
    }
}

/// Dyadic (power-of-two-denominator) approximation of a probability vector
/// given as floating-point values, right-padded to a common bit width `k`.
///
/// Renormalizes for floating-point rounding: any shortfall from summing to 1
/// is added to the first component, any excess is removed from the first
/// component whose value exceeds it.
pub fn dyadic_approximation(p: &[f64]) -> Result<(Vec<Vec<u8>>, u32)> {
    if p.is_empty() {
        return Err(Error::EmptyDistribution);
    }
    let mut dyadics: Vec<BigRational> = p.iter().map(|&x| f64_to_exact_ratio(x)).collect();
    let sum: BigRational = dyadics.iter().cloned().fold(BigRational::zero(), |a, b| a + b);
    let underflow = BigRational::one() - sum;
    if underflow.is_positive() {
        dyadics[0] = dyadics[0].clone() + underflow;
    } else if underflow.is_negative() {
        let overflow = -underflow;
        let target = dyadics
            .iter()
            .position(|d| *d > overflow)
            .ok_or_else(|| {
                Error::SumInvariantViolated(p.iter().map(|x| x.to_string()).collect(), 0, 0)
            })?;
        dyadics[target] = dyadics[target].clone() - overflow;
    }
    debug_assert_eq!(
        dyadics.iter().cloned().fold(BigRational::zero(), |a, b| a + b),
        BigRational::one()
    );

    let expansions: Vec<Vec<u8>> = dyadics
        .iter()
        .map(|d| {
            let numer = d.numer().to_biguint().expect("dyadic numerator is non-negative");
            let denom = d.denom().to_biguint().expect("dyadic denominator is positive");
            binary_expansion(&numer, &denom).0
        })
        .collect();
    let k = expansions.iter().map(Vec::len).max().unwrap_or(0) as u32;
    let padded = expansions
        .into_iter()
        .map(|mut e| {
            e.resize(k as usize, 0);
            e
        })
        .collect();
    Ok((padded, k))
}

/// Binary (Shannon) entropy, in bits, of a probability vector.
pub fn compute_entropy(p: &[BigRational]) -> f64 {
    p.iter()
        .filter(|x| !x.is_zero())
        .map(|x| {
            let v = x.to_f64().expect("probability should be representable as f64");
            -v.log2() * v
        })
        .sum()
}

/// All `2^k` length-`k` binary strings, MSB first. Test/debug helper used to
/// exhaustively drive a sampler over every coin-flip sequence.
pub fn all_bitstrings(k: u32) -> Vec<Vec<u8>> {
    if k == 0 {
        return vec![Vec::new()];
    }
    (0u64..(1u64 << k))
        .map(|w| (0..k).map(|i| ((w >> (k - 1 - i)) & 1) as u8).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratio(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    #[test]
    fn numerators_sum_to_common_denominator() {
        let p = vec![ratio(1, 3), ratio(1, 4), ratio(5, 12)];
        let z = common_denominator(&p);
        let ms = numerators(&z, &p);
        let sum: BigUint = ms.iter().fold(BigUint::zero(), |a, m| a + m);
        assert_eq!(sum, z);
    }

    #[test]
    fn numerators_sum_to_common_denominator_with_zero_weights() {
        let p = vec![ratio(0, 1), ratio(1, 2), ratio(0, 1), ratio(1, 2)];
        let z = common_denominator(&p);
        let ms = numerators(&z, &p);
        let sum: BigUint = ms.iter().fold(BigUint::zero(), |a, m| a + m);
        assert_eq!(sum, z);
    }

    #[test]
    fn frac_bits_round_trip_across_k_and_l() {
        for k in 1..=12u32 {
            for l in 0..=k {
                let target = zkl(k, l);
                let mut samples = vec![BigUint::zero()];
                if target > BigUint::one() {
                    samples.push(&target - BigUint::one());
                    samples.push(&target >> 1u32);
                }
                for m in samples {
                    if m >= target {
                        continue;
                    }
                    let bits = frac_to_bits(&m, k, l);
                    assert_eq!(bits.len() as u32, k, "k={k} l={l} m={m}");
                    let (numer, z) = bits_to_frac(&bits, k, l);
                    assert_eq!(z, target, "k={k} l={l} m={m}");
                    assert_eq!(numer, m, "k={k} l={l} m={m}");
                }
            }
        }
    }

    #[test]
    fn frac_to_bits_matches_dyadic_when_l_equals_k() {
        for k in 1..=12u32 {
            let target = BigUint::one() << k;
            let mut samples = vec![BigUint::zero(), &target >> 1u32];
            if target > BigUint::one() {
                samples.push(&target - BigUint::one());
            }
            for m in samples {
                if m >= target {
                    continue;
                }
                assert_eq!(frac_to_bits(&m, k, k), frac_to_bits_dyadic(&m, k), "k={k} m={m}");
            }
        }
    }

    #[test]
    fn binary_expansion_length_table_for_m_2_to_16() {
        // (k, l) expected for m = 2..=16.
        let expected: [(u32, u32); 15] = [
            (1, 1),   // 2
            (2, 0),   // 3
            (2, 2),   // 4
            (4, 0),   // 5
            (3, 1),   // 6
            (3, 0),   // 7
            (3, 3),   // 8
            (6, 0),   // 9
            (5, 1),   // 10
            (10, 0),  // 11
            (4, 2),   // 12
            (12, 0),  // 13
            (4, 1),   // 14
            (4, 0),   // 15
            (4, 4),   // 16
        ];
        for (i, &(k, l)) in expected.iter().enumerate() {
            let m = BigUint::from((i as u32) + 2);
            assert_eq!(binary_expansion_length(&m), (k, l), "m={m}");
        }
    }

    #[test]
    fn reduce_fractions_halves_an_all_even_dyadic_pair() {
        let ms = vec![BigUint::from(2u32), BigUint::from(2u32)];
        let (reduced, k, l) = reduce_fractions(&ms, 2, 2).unwrap();
        assert_eq!(reduced, vec![BigUint::from(1u32), BigUint::from(1u32)]);
        assert_eq!((k, l), (1, 1));
    }

    #[test]
    fn reduce_fractions_halves_repeatedly_down_to_lowest_terms() {
        let ms = vec![BigUint::from(4u32), BigUint::from(8u32), BigUint::from(4u32)];
        let (reduced, k, l) = reduce_fractions(&ms, 4, 4).unwrap();
        assert_eq!(reduced, vec![BigUint::from(1u32), BigUint::from(2u32), BigUint::from(1u32)]);
        assert_eq!((k, l), (2, 2));
    }

    #[test]
    fn reduce_fractions_collapses_a_single_nonzero_weight() {
        let k = 4u32;
        let full = (BigUint::one() << k) - BigUint::one();
        let ms = vec![full.clone(), BigUint::zero(), BigUint::zero(), BigUint::zero()];
        let (reduced, rk, rl) = reduce_fractions(&ms, k, 0).unwrap();
        assert_eq!(
            reduced,
            vec![BigUint::from(1u32), BigUint::zero(), BigUint::zero(), BigUint::zero()]
        );
        assert_eq!((rk, rl), (1, 0));
    }

    #[test]
    fn reduce_fractions_leaves_a_non_reducible_pair_unchanged() {
        let ms = vec![BigUint::from(3u32), BigUint::from(1u32)];
        let (reduced, k, l) = reduce_fractions(&ms, 2, 2).unwrap();
        assert_eq!(reduced, ms);
        assert_eq!((k, l), (2, 2));
    }

    #[test]
    fn binary_expansion_matches_doubling_for_a_range_of_fractions() {
        for b in 1u32..30 {
            for a in 0..=b {
                let (p1, s1) = binary_expansion(&BigUint::from(a), &BigUint::from(b));
                let (p2, s2) = binary_expansion_by_doubling(&BigUint::from(a), &BigUint::from(b));
                assert_eq!(p1, p2, "preperiod mismatch for {a}/{b}");
                assert_eq!(s1, s2, "period mismatch for {a}/{b}");
            }
        }
    }
}
