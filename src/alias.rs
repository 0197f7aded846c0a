//! The (exact) alias method: Walker/Vose preprocessing, with per-column
//! acceptance decided by an exact Bernoulli draw rather than a biased
//! floating-point coin.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::One;

use num_bigint::BigUint;

use crate::bitstream::FairCoin;
use crate::error::{Error, Result};
use crate::rational::{common_denominator, numerators, validate_distribution};
use crate::rejection::{sample_fdr, sample_inversion_bernoulli};

/// An alias table: `q[i]` is outcome `i`'s exact acceptance probability,
/// `j[i]` is the outcome to return on rejection. `ms` is the integer
/// numerators `p` was built from, kept alongside for serialization.
#[derive(Clone, Debug)]
pub struct Alias {
    n: usize,
    q: Vec<BigRational>,
    j: Vec<usize>,
    ms: Vec<BigUint>,
}

impl Alias {
    pub fn construct(p: &[BigRational]) -> Result<Self> {
        validate_distribution(p)?;
        let n = p.len();
        let z = common_denominator(p);
        let ms = numerators(&z, p);
        let k = BigRational::from_integer(BigInt::from(n));
        let mut q: Vec<BigRational> = p.iter().map(|pi| &k * pi).collect();
        let mut j: Vec<usize> = (0..n).collect();

        let mut smaller: Vec<usize> = Vec::new();
        let mut greater: Vec<usize> = Vec::new();
        for i in 0..n {
            if q[i] < BigRational::one() {
                smaller.push(i);
            } else {
                greater.push(i);
            }
        }

        while let Some(l) = smaller.pop() {
            let g = greater.pop().ok_or(Error::AliasPreprocessInconsistent)?;
            j[l] = g;
            q[g] = &q[g] - (BigRational::one() - &q[l]);
            if q[g] < BigRational::one() {
                smaller.push(g);
            } else {
                greater.push(g);
            }
        }

        // Residual `greater` rows never donated their full deficit away:
        // they always accept.
        for g in greater {
            q[g] = BigRational::one();
        }

        log::debug!("alias::construct: built {n}-row table over Z={z}");
        Ok(Self { n, q, j, ms })
    }

    /// Rebuild an `Alias` table from its previously serialized parts.
    pub fn from_parts(n: usize, q: Vec<BigRational>, j: Vec<usize>, ms: Vec<BigUint>) -> Self {
        Self { n, q, j, ms }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn q(&self) -> &[BigRational] {
        &self.q
    }

    pub fn alias(&self) -> &[usize] {
        &self.j
    }

    /// The integer numerators `p` was built from, over their common
    /// denominator.
    pub fn ms(&self) -> &[BigUint] {
        &self.ms
    }

    pub fn sample(&self, coin: &mut impl FairCoin) -> usize {
        let r = sample_fdr(self.n, coin);
        let numer = self.q[r].numer().to_biguint().expect("acceptance probability is non-negative");
        let denom = self.q[r].denom().to_biguint().expect("denominator is positive");
        if sample_inversion_bernoulli(&numer, &denom, coin) {
            r
        } else {
            self.j[r]
        }
    }
}
