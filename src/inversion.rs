//! Inversion sampling: draw a uniform `k`-bit word and look it up against a
//! quantized CDF built from fractional endpoints.
//!
//! Two boundary conventions for turning a fractional endpoint list into
//! per-outcome integer counts are kept as distinct operations, since they
//! answer different questions about where an exact-integer endpoint's
//! boundary integer belongs: `lt` credits it to the bucket starting there,
//! `lte` credits it to the bucket ending there. Only `lt` reproduces a
//! target distribution exactly whenever `Z` is a multiple of its common
//! denominator; `lte` generally does not, even then.

use num_bigint::{BigInt, BigUint};
use num_rational::BigRational;
use num_traits::{One, Zero};

use crate::bitstream::FairCoin;
use crate::error::Result;
use crate::rational::validate_distribution;
use crate::rejection::draw_word;

fn ceil_uint(x: &BigRational) -> BigUint {
    x.ceil()
        .to_integer()
        .to_biguint()
        .expect("ceiling of a non-negative rational is non-negative")
}

fn floor_uint(x: &BigRational) -> BigUint {
    x.floor()
        .to_integer()
        .to_biguint()
        .expect("floor of a non-negative rational is non-negative")
}

/// `v_i` = number of integers in `[l[i-1], l[i])`, with `l[-1]` implicitly 0.
pub fn count_num_integers_between_lt(l: &[BigRational]) -> Vec<BigUint> {
    let mut out = Vec::with_capacity(l.len());
    let mut prev = BigUint::zero();
    for li in l {
        let cur = ceil_uint(li);
        out.push(&cur - &prev);
        prev = cur;
    }
    out
}

/// `v_i` = number of integers in `(l[i-1], l[i]]`, with `l[-1]` implicitly 0
/// and every integer credited to the bucket it closes rather than the one it
/// opens — except `Z = l[last]` itself, which is never a valid sample and so
/// is never credited anywhere.
pub fn count_num_integers_between_lte(l: &[BigRational]) -> Vec<BigUint> {
    let z = l.last().cloned().unwrap_or_else(BigRational::zero);
    let mut out = Vec::with_capacity(l.len());
    let mut prev = BigUint::zero();
    for li in l {
        let cur = if li.is_integer() && *li < z {
            floor_uint(li) + BigUint::one()
        } else {
            ceil_uint(li)
        };
        out.push(&cur - &prev);
        prev = cur;
    }
    out
}

fn cumulative_endpoints(z: &BigUint, p: &[BigRational]) -> Vec<BigRational> {
    let zr = BigRational::from_integer(BigInt::from(z.clone()));
    let mut acc = BigRational::zero();
    p.iter()
        .map(|pi| {
            acc = &acc + pi;
            &zr * &acc
        })
        .collect()
}

fn counts_to_probabilities(z: &BigUint, counts: &[BigUint]) -> Vec<BigRational> {
    let denom = BigInt::from(z.clone());
    counts
        .iter()
        .map(|c| BigRational::new(BigInt::from(c.clone()), denom.clone()))
        .collect()
}

fn prefix_sum(counts: &[BigUint]) -> Vec<BigUint> {
    let mut out = Vec::with_capacity(counts.len());
    let mut acc = BigUint::zero();
    for c in counts {
        acc += c;
        out.push(acc.clone());
    }
    out
}

/// Find the bucket `i` such that `w` falls in `[cdf[i-1], cdf[i])`, `cdf`
/// being the inclusive prefix sums of per-outcome counts.
fn bucket_of(cdf: &[BigUint], w: &BigUint) -> usize {
    let mut lo = 0usize;
    let mut hi = cdf.len() - 1;
    while lo < hi {
        let mid = (lo + hi) / 2;
        if cdf[mid] <= *w {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

/// What distribution inversion sampling at bit budget `k` actually achieves
/// for target probabilities `p`, under the closed-left/open-right
/// convention. Exact whenever `2^k` is a multiple of `p`'s common
/// denominator.
pub fn get_inversion_probabilities_lt(z: &BigUint, p: &[BigRational]) -> Result<Vec<BigRational>> {
    validate_distribution(p)?;
    let counts = count_num_integers_between_lt(&cumulative_endpoints(z, p));
    Ok(counts_to_probabilities(z, &counts))
}

/// As [`get_inversion_probabilities_lt`], under the open-left/closed-right
/// convention. Generally inexact even when `2^k` is a multiple of `p`'s
/// common denominator, since a boundary landing exactly on an integer below
/// `Z` shifts a unit of probability mass to the preceding outcome.
pub fn get_inversion_probabilities_lte(z: &BigUint, p: &[BigRational]) -> Result<Vec<BigRational>> {
    validate_distribution(p)?;
    let counts = count_num_integers_between_lte(&cumulative_endpoints(z, p));
    Ok(counts_to_probabilities(z, &counts))
}

/// Inversion sampler, closed-left/open-right convention: draws an exact
/// uniform `k`-bit word and finds its bucket in the quantized CDF. Never
/// rejects, costs exactly `k` coin flips per sample.
#[derive(Clone, Debug)]
pub struct InversionLt {
    k: u32,
    cdf: Vec<BigUint>,
}

impl InversionLt {
    pub fn construct(p: &[BigRational], k: u32) -> Result<Self> {
        validate_distribution(p)?;
        let z = BigUint::one() << k;
        let counts = count_num_integers_between_lt(&cumulative_endpoints(&z, p));
        log::trace!("inversion::lt: quantized to k={k} bits");
        Ok(Self { k, cdf: prefix_sum(&counts) })
    }

    pub fn k(&self) -> u32 {
        self.k
    }

    pub fn sample(&self, coin: &mut impl FairCoin) -> usize {
        let w = BigUint::from(draw_word(coin, self.k));
        bucket_of(&self.cdf, &w)
    }
}

/// Inversion sampler, open-left/closed-right convention. See
/// [`count_num_integers_between_lte`] for the boundary rule.
#[derive(Clone, Debug)]
pub struct InversionLte {
    k: u32,
    cdf: Vec<BigUint>,
}

impl InversionLte {
    pub fn construct(p: &[BigRational], k: u32) -> Result<Self> {
        validate_distribution(p)?;
        let z = BigUint::one() << k;
        let counts = count_num_integers_between_lte(&cumulative_endpoints(&z, p));
        Ok(Self { k, cdf: prefix_sum(&counts) })
    }

    pub fn k(&self) -> u32 {
        self.k
    }

    pub fn sample(&self, coin: &mut impl FairCoin) -> usize {
        let w = BigUint::from(draw_word(coin, self.k));
        bucket_of(&self.cdf, &w)
    }
}

/// Construct-and-sample-once convenience, mirroring a bare-function call
/// site that doesn't want to hold onto the sampler between draws.
pub fn sample_inversion_lt(p: &[BigRational], k: u32, coin: &mut impl FairCoin) -> Result<usize> {
    Ok(InversionLt::construct(p, k)?.sample(coin))
}

/// As [`sample_inversion_lt`], open-left/closed-right convention.
pub fn sample_inversion_lte(p: &[BigRational], k: u32, coin: &mut impl FairCoin) -> Result<usize> {
    Ok(InversionLte::construct(p, k)?.sample(coin))
}
