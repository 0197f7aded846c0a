//! Rejection samplers: upper-bound `p` by a distribution that's cheap to
//! draw from exactly, and redraw on reject.
//!
//! `RejectionKyAugmented` is the teacher crate's own `Generator`, carried
//! forward almost unchanged in spirit: build a Knuth-Yao tree over the
//! weights padded with a reject bucket up to the next power of two, and
//! redraw whenever the walk lands on that bucket. The difference is that it
//! now goes through the shared rational substrate and `KyEncoding` rather
//! than its own bespoke `usize`-weight tree.

use num_bigint::BigUint;
use num_rational::BigRational;
use num_traits::Zero;

use crate::bitstream::{next_bit, FairCoin};
use crate::error::{Error, Result};
use crate::ky::KyEncoding;
use crate::rational::{ceil_log2, common_denominator, numerators, validate_distribution};

/// Draw a `k`-bit unsigned integer, one coin flip per bit, MSB first.
/// Requires `k <= 64` since the result is returned packed into a `u64`.
pub(crate) fn draw_word(coin: &mut impl FairCoin, k: u32) -> u64 {
    debug_assert!(k <= 64);
    let mut w: u64 = 0;
    for _ in 0..k {
        w = (w << 1) | u64::from(next_bit(coin));
    }
    w
}

/// Lumbroso's optimal uniform sampler: draws a uniform outcome in `0..n`
/// using an expected `log2(n) + O(1)` bits, never more than `O(log n)`.
pub fn sample_fdr(n: usize, coin: &mut impl FairCoin) -> usize {
    assert!(n > 0, "sample_fdr requires at least one outcome");
    let n = n as u64;
    let mut v: u64 = 1;
    let mut c: u64 = 0;
    loop {
        v *= 2;
        c = 2 * c + u64::from(next_bit(coin));
        if n <= v {
            if c < n {
                return c as usize;
            }
            v -= n;
            c -= n;
        }
    }
}

/// Returns `true` with probability exactly `a / m` (`a <= m`), using an
/// expected at most 2 coin flips.
pub fn sample_inversion_bernoulli(a: &BigUint, m: &BigUint, coin: &mut impl FairCoin) -> bool {
    debug_assert!(a <= m);
    let mut v = a.clone();
    loop {
        v *= 2u32;
        let accept = if m <= &v {
            v -= m;
            true
        } else {
            false
        };
        if next_bit(coin) == 1 {
            return accept;
        }
    }
}

/// Shared construction path: validate `p` and return its exact numerators
/// over the common denominator `Z`.
fn prepare(p: &[BigRational]) -> Result<Vec<BigUint>> {
    validate_distribution(p)?;
    let z = common_denominator(p);
    Ok(numerators(&z, p))
}

/// Uniform/fdr rejection sampler: draw an index uniformly, accept it with
/// probability proportional to its weight.
#[derive(Clone, Debug)]
pub struct RejectionUniform {
    ms: Vec<BigUint>,
    max_m: BigUint,
}

impl RejectionUniform {
    pub fn construct(p: &[BigRational]) -> Result<Self> {
        let ms = prepare(p)?;
        let max_m = ms.iter().max().cloned().unwrap_or_else(BigUint::zero);
        Ok(Self { ms, max_m })
    }

    /// Rebuild from previously serialized weights and their max.
    pub fn from_parts(ms: Vec<BigUint>, max_m: BigUint) -> Self {
        Self { ms, max_m }
    }

    pub fn n(&self) -> usize {
        self.ms.len()
    }

    pub fn weights(&self) -> &[BigUint] {
        &self.ms
    }

    pub fn max_weight(&self) -> &BigUint {
        &self.max_m
    }

    pub fn sample(&self, coin: &mut impl FairCoin) -> usize {
        loop {
            let j = sample_fdr(self.ms.len(), coin);
            if sample_inversion_bernoulli(&self.ms[j], &self.max_m, coin) {
                return j;
            }
        }
    }
}

/// Hash-table rejection sampler: draw a uniform `k`-bit integer `W` in
/// `[0, 2^k)`; if `W >= Z`, reject and redraw; else return `table[W]`.
#[derive(Clone, Debug)]
pub struct RejectionHashTable {
    k: u32,
    z: BigUint,
    table: Vec<usize>,
}

impl RejectionHashTable {
    pub fn construct(p: &[BigRational]) -> Result<Self> {
        let ms = prepare(p)?;
        let z: BigUint = ms.iter().fold(BigUint::zero(), |a, m| a + m);
        let k = ceil_log2(&z);
        log::trace!("rejection::hash_table: Z={z} k={k}, reject probability {}/{}", (BigUint::from(1u32) << k) - &z, BigUint::from(1u32) << k);
        let mut table = Vec::new();
        for (i, m) in ms.iter().enumerate() {
            let mut count = m.clone();
            let one = BigUint::from(1u32);
            while !count.is_zero() {
                table.push(i);
                count -= &one;
            }
        }
        Ok(Self { k, z, table })
    }

    pub fn k(&self) -> u32 {
        self.k
    }

    pub fn z(&self) -> &BigUint {
        &self.z
    }

    pub fn table(&self) -> &[usize] {
        &self.table
    }

    /// Rebuild from a previously serialized table.
    pub fn from_parts(k: u32, z: BigUint, table: Vec<usize>) -> Self {
        Self { k, z, table }
    }

    pub fn sample(&self, coin: &mut impl FairCoin) -> usize {
        loop {
            let w = draw_word(coin, self.k);
            if BigUint::from(w) >= self.z {
                continue;
            }
            return self.table[w as usize];
        }
    }
}

/// Binary-search-on-CDF rejection sampler: same draw-and-reject as the hash
/// table, but looks the accepted `W` up in the cumulative distribution by
/// binary search instead of a direct `2^k`-sized table.
#[derive(Clone, Debug)]
pub struct RejectionBinarySearch {
    k: u32,
    z: BigUint,
    cdf: Vec<BigUint>,
}

impl RejectionBinarySearch {
    pub fn construct(p: &[BigRational]) -> Result<Self> {
        let ms = prepare(p)?;
        let mut cdf = Vec::with_capacity(ms.len() + 1);
        cdf.push(BigUint::zero());
        for m in &ms {
            cdf.push(cdf.last().unwrap() + m);
        }
        let z = cdf.last().unwrap().clone();
        let k = ceil_log2(&z);
        Ok(Self { k, z, cdf })
    }

    pub fn k(&self) -> u32 {
        self.k
    }

    pub fn z(&self) -> &BigUint {
        &self.z
    }

    pub fn cdf(&self) -> &[BigUint] {
        &self.cdf
    }

    /// Rebuild from a previously serialized CDF.
    pub fn from_parts(k: u32, cdf: Vec<BigUint>) -> Self {
        let z = cdf.last().cloned().unwrap_or_else(BigUint::zero);
        Self { k, z, cdf }
    }

    pub fn sample(&self, coin: &mut impl FairCoin) -> usize {
        loop {
            let w = draw_word(coin, self.k);
            let w = BigUint::from(w);
            if w >= self.z {
                continue;
            }
            let mut lo = 0usize;
            let mut hi = self.cdf.len() - 1;
            while lo + 1 < hi {
                let mid = (lo + hi) / 2;
                if self.cdf[mid] <= w {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            return lo;
        }
    }
}

/// KY-over-augmented rejection sampler: a Knuth-Yao tree built over the
/// weights padded with one extra "reject" bucket up to the next power of
/// two; any walk that lands on the reject bucket redraws from the root.
///
/// This is the teacher crate's `Generator`, reimplemented over
/// [`KyEncoding`] instead of its own bespoke tree.
#[derive(Clone, Debug)]
pub struct RejectionKyAugmented {
    n: usize,
    ky: KyEncoding,
}

impl RejectionKyAugmented {
    pub fn construct(p: &[BigRational]) -> Result<Self> {
        let ms = prepare(p)?;
        Self::construct_from_weights(&ms)
    }

    /// Build directly from non-negative integer weights, mirroring the
    /// teacher's `Generator::new(distribution: &[usize])`.
    fn construct_from_weights(ms: &[BigUint]) -> Result<Self> {
        let n = ms.len();
        let sum: BigUint = ms.iter().fold(BigUint::zero(), |a, m| a + m);
        if sum.is_zero() {
            return Err(Error::EmptyDistribution);
        }
        let depth = ceil_log2(&sum);
        let target = BigUint::from(1u32) << depth;
        let reject = &target - &sum;
        log::debug!(
            "rejection::ky_augmented: padded {} weights to 2^{depth}, reject mass {reject}/{target}",
            ms.len()
        );

        let mut augmented = ms.to_vec();
        if !reject.is_zero() {
            augmented.push(reject);
        }

        let ky = KyEncoding::construct_from_numerators(&augmented, depth, depth)?;
        Ok(Self { n, ky })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn sample(&self, coin: &mut impl FairCoin) -> usize {
        loop {
            let r = self.ky.sample(coin);
            if r < self.n {
                return r;
            }
        }
    }
}

/// Drop-in continuation of the teacher's own `Generator`: construction from
/// non-negative integer weights, panicking (rather than returning a
/// `Result`) on a distribution with fewer than two non-zero weights, exactly
/// as `Generator::new` always has.
#[derive(Clone, Debug)]
pub struct Generator(RejectionKyAugmented);

impl Generator {
    /// Create a new DDG tree for the FLDR algorithm from a list of
    /// non-negative integer weights, returning an error rather than
    /// panicking if `distribution` has fewer than two non-zero weights.
    pub fn try_new(distribution: &[usize]) -> Result<Self> {
        if distribution.iter().filter(|&&w| w > 0).count() < 2 {
            return Err(Error::TooFewNonZeroWeights);
        }
        let ms: Vec<BigUint> = distribution.iter().map(|&w| BigUint::from(w)).collect();
        Ok(Generator(RejectionKyAugmented::construct_from_weights(&ms)?))
    }

    /// Create a new DDG tree for the FLDR algorithm from a list of
    /// non-negative integer weights.
    ///
    /// # Panics
    /// Will panic if `distribution` has less than two non-zero weights.
    #[must_use]
    pub fn new(distribution: &[usize]) -> Self {
        Self::try_new(distribution).expect("The distribution must have at least two non-zero weights.")
    }

    /// Sample a random item from the discrete distribution using a given
    /// `FairCoin`. The item is returned as an index into the initial input
    /// distribution.
    pub fn sample(&self, fair_coin: &mut impl FairCoin) -> usize {
        self.0.sample(fair_coin)
    }
}
