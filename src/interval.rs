//! Interval (arithmetic-coding-style) samplers.
//!
//! Two distinct constructions are kept as separate public operations,
//! per the explicit design-note resolution: a preprocessed bit-interval
//! refinement against precomputed integer endpoints, and a rejection-free
//! integer-CDF refinement that cross-multiplies instead of dividing.

use num_bigint::BigUint;
use num_rational::BigRational;
use num_traits::{One, Zero};

use crate::bitstream::{next_bit, FairCoin};
use crate::error::{Error, Result};
use crate::rational::{ceil_log2, common_denominator, numerators, validate_distribution};

fn round_half_up(x: &BigRational) -> BigUint {
    let two_numer_plus_denom = x.numer() * 2 + x.denom();
    let two_denom = x.denom() * 2;
    (two_numer_plus_denom / two_denom)
        .to_biguint()
        .expect("rounded probability endpoint is non-negative")
}

/// Bit-interval refinement, preprocessed against `k`-bit integer CDF
/// endpoints `F`. An approximate sampler: `k` bounds both the refinement
/// precision and the bit budget, so outcomes with probability far below
/// `2^-k` may never be reachable.
#[derive(Clone, Debug)]
pub struct IntervalBitRefinement {
    n: usize,
    k: u32,
    f: Vec<BigUint>,
}

impl IntervalBitRefinement {
    /// `k` is the bit precision of the endpoint table; `k - 1` is also the
    /// sampler's bit budget per draw.
    pub fn construct(p: &[BigRational], k: u32) -> Result<Self> {
        validate_distribution(p)?;
        assert!(k >= 1, "need at least one bit of precision");
        let n = p.len();
        if n == 1 {
            return Ok(Self { n, k, f: vec![BigUint::zero(), BigUint::one() << (k - 1)] });
        }
        let scale = BigRational::from_integer((BigUint::one() << (k - 1)).into());
        let mut q = BigRational::zero();
        let mut f = Vec::with_capacity(n + 1);
        f.push(BigUint::zero());
        for pi in p {
            q = q + pi;
            f.push(round_half_up(&(&scale * &q)));
        }
        *f.last_mut().unwrap() = BigUint::one() << (k - 1);
        Ok(Self { n, k, f })
    }

    pub fn k(&self) -> u32 {
        self.k
    }

    pub fn sample(&self, coin: &mut impl FairCoin) -> Result<usize> {
        if self.n == 1 {
            return Ok(0);
        }
        let mut alpha = BigUint::zero();
        let mut r = BigUint::one() << (self.k - 1);
        for _ in 0..(self.k - 1) {
            let b = next_bit(coin);
            let half_r = &r >> 1u32;
            let a = if b == 0 { 1u32 } else { 2u32 };
            let new_alpha = &alpha + BigUint::from(a - 1) * &half_r;
            let new_beta = &new_alpha + BigUint::from(a) * &half_r;
            alpha = new_alpha;
            r = half_r;
            for i in 0..self.n {
                if self.f[i] <= alpha && new_beta <= self.f[i + 1] {
                    return Ok(i);
                }
            }
        }
        Err(Error::PrecisionExhausted(self.k - 1))
    }
}

/// Integer-CDF refinement: maintains a dyadic interval `[alpha/den,
/// beta/den]` and looks it up against the exact integer CDF via
/// cross-multiplied comparisons, never dividing. Rejection-free: every bit
/// drawn makes progress, but a caller-chosen `max_bits` still bounds worst
/// case, since a probability can in principle require arbitrarily many bits
/// to resolve.
#[derive(Clone, Debug)]
pub struct IntervalIntegerCdf {
    n: usize,
    z: BigUint,
    cdf: Vec<BigUint>,
    max_bits: u32,
}

impl IntervalIntegerCdf {
    pub fn construct(p: &[BigRational], max_bits: u32) -> Result<Self> {
        validate_distribution(p)?;
        let z = common_denominator(p);
        let ms = numerators(&z, p);
        let n = ms.len();
        let mut cdf = Vec::with_capacity(n + 1);
        cdf.push(BigUint::zero());
        for m in &ms {
            cdf.push(cdf.last().unwrap() + m);
        }
        Ok(Self { n, z, cdf, max_bits })
    }

    /// Convenience constructor: bit budget is `Z`'s bit length plus 64
    /// guard bits, ample for any practical distribution.
    pub fn construct_default(p: &[BigRational]) -> Result<Self> {
        let z = common_denominator(p);
        let guard = if z.is_zero() { 64 } else { ceil_log2(&z) + 64 };
        log::debug!("interval::construct_default: Z={z}, bit budget {guard}");
        Self::construct(p, guard)
    }

    pub fn z(&self) -> &BigUint {
        &self.z
    }

    pub fn cdf(&self) -> &[BigUint] {
        &self.cdf
    }

    pub fn max_bits(&self) -> u32 {
        self.max_bits
    }

    /// Rebuild from a previously serialized CDF; `max_bits` bounds the
    /// sampler's worst-case bit budget same as at original construction.
    pub fn from_parts(max_bits: u32, cdf: Vec<BigUint>) -> Self {
        let n = cdf.len().saturating_sub(1);
        let z = cdf.last().cloned().unwrap_or_else(BigUint::zero);
        Self { n, z, cdf, max_bits }
    }

    pub fn sample(&self, coin: &mut impl FairCoin) -> Result<usize> {
        if self.n == 1 {
            return Ok(0);
        }
        let mut alpha = BigUint::zero();
        let mut beta = BigUint::one();
        let mut den = BigUint::one();
        for _ in 0..self.max_bits {
            let b = next_bit(coin);
            let width = &beta - &alpha;
            let new_alpha = &alpha * 2u32 + &width * BigUint::from(b);
            let new_beta = &alpha * 2u32 + &width * BigUint::from(b + 1);
            alpha = new_alpha;
            beta = new_beta;
            if alpha.is_even() && beta.is_even() {
                alpha >>= 1u32;
                beta >>= 1u32;
            } else {
                den *= 2u32;
            }

            for j in 1..=self.n {
                let lhs1 = &self.cdf[j - 1] * &den;
                let rhs1 = &alpha * &self.z;
                let lhs2 = &beta * &self.z;
                let rhs2 = &self.cdf[j] * &den;
                if lhs1 <= rhs1 && lhs2 <= rhs2 {
                    return Ok(j - 1);
                }
            }
        }
        Err(Error::PrecisionExhausted(self.max_bits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitstream::{BitStream, RandomWord};

    fn ratio_vec(weights: &[u32]) -> Vec<BigRational> {
        let z: u32 = weights.iter().sum();
        weights
            .iter()
            .map(|&w| BigRational::new(w.into(), z.into()))
            .collect()
    }

    struct CycleBits(Vec<u8>, usize);
    impl RandomWord for CycleBits {
        fn next_word(&mut self, bits: u32) -> u64 {
            let mut w = 0u64;
            for _ in 0..bits {
                let b = self.0[self.1 % self.0.len()];
                self.1 += 1;
                w = (w << 1) | u64::from(b);
            }
            w
        }
    }

    #[test]
    fn bit_refinement_always_returns_a_valid_outcome_or_exhausts_precision() {
        let p = ratio_vec(&[1, 3, 4]);
        let sampler = IntervalBitRefinement::construct(&p, 16).unwrap();
        for seed in [vec![0, 1, 1, 0], vec![1, 1, 1, 1], vec![0, 0, 0, 0, 1]] {
            let mut coin = BitStream::new(1, CycleBits(seed, 0));
            match sampler.sample(&mut coin) {
                Ok(i) => assert!(i < 3),
                Err(Error::PrecisionExhausted(_)) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
    }

    #[test]
    fn integer_cdf_refinement_always_returns_a_valid_outcome() {
        let p = ratio_vec(&[1, 3, 4]);
        let sampler = IntervalIntegerCdf::construct_default(&p).unwrap();
        let mut coin = BitStream::new(1, CycleBits(vec![0, 1, 1, 0, 1, 0, 0, 1], 0));
        for _ in 0..20 {
            let row = sampler.sample(&mut coin).unwrap();
            assert!(row < 3);
        }
    }
}
