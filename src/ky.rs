//! The Knuth-Yao discrete distribution generator, in its three exact forms
//! (encoding, matrix, matrix-cached) plus an approximate form built on a
//! dyadic approximation of `p`.

use num_bigint::BigUint;
use num_rational::BigRational;

use crate::bitstream::{next_bit, FairCoin};
use crate::error::Result;
use crate::matrix::{hamming_matrix, hamming_vector, make_ddg_matrix, DdgMatrix};
use crate::packing::{pack_tree, PackedEncoding};
use crate::rational::{binary_expansion_length, common_denominator, numerators, validate_distribution};
use crate::tree::make_ddg_tree;

/// Common construction path shared by all three exact forms: validate `p`,
/// find its exact common denominator and numerators, and the `(k, l)` of
/// `1/Z`'s binary expansion.
fn prepare(p: &[BigRational]) -> Result<(Vec<BigUint>, u32, u32)> {
    validate_distribution(p)?;
    let z = common_denominator(p);
    let ms = numerators(&z, p);
    let (k, l) = binary_expansion_length(&z);
    log::debug!("ky::prepare: n={} Z={} k={} l={}", ms.len(), z, k, l);
    Ok((ms, k, l))
}

/// The encoding-form KY sampler: a single flat array walk per sample, the
/// fastest of the three forms once built.
#[derive(Clone, Debug)]
pub struct KyEncoding {
    n: usize,
    k: u32,
    enc: PackedEncoding,
}

impl KyEncoding {
    /// Build from a validated probability vector.
    pub fn construct(p: &[BigRational]) -> Result<Self> {
        let (ms, k, l) = prepare(p)?;
        Self::construct_from_numerators(&ms, k, l)
    }

    /// Build directly from exact numerators `M` over `Zkl(k, l)`, bypassing
    /// the `BigRational` normalization path (useful when `M`/`(k, l)` are
    /// already known, e.g. when deserializing).
    pub fn construct_from_numerators(ms: &[BigUint], k: u32, l: u32) -> Result<Self> {
        let n = ms.len();
        if n == 1 {
            log::trace!("ky::encoding: single outcome, no tree built");
            return Ok(Self {
                n,
                k: 0,
                enc: PackedEncoding::from_raw(vec![-1]),
            });
        }
        let (matrix, k, l) = make_ddg_matrix(ms, k, l)?;
        let tree = make_ddg_tree(&matrix, l);
        let enc = pack_tree(&tree, l);
        log::trace!("ky::encoding: built packed tree of {} nodes", enc.len());
        Ok(Self { n, k, enc })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn k(&self) -> u32 {
        self.k
    }

    /// The raw packed array, for serialization.
    pub fn encoding(&self) -> &PackedEncoding {
        &self.enc
    }

    /// Rebuild a `KyEncoding` from a previously serialized packed array.
    pub fn from_parts(n: usize, k: u32, enc: PackedEncoding) -> Self {
        Self { n, k, enc }
    }

    /// Draw a single outcome (a `0..n` row index).
    pub fn sample(&self, coin: &mut impl FairCoin) -> usize {
        self.enc.sample(|| next_bit(coin))
    }
}

/// The matrix-form KY sampler: walks the DDG matrix column by column,
/// re-scanning rows on every bit. Slower than [`KyEncoding`] but its state
/// (`P`, `k`, `l`) is the most direct serialization of the DDG construction.
#[derive(Clone, Debug)]
pub struct KyMatrix {
    matrix: DdgMatrix,
    l: u32,
}

impl KyMatrix {
    pub fn construct(p: &[BigRational]) -> Result<Self> {
        let (ms, k, l) = prepare(p)?;
        Self::construct_from_numerators(&ms, k, l)
    }

    pub fn construct_from_numerators(ms: &[BigUint], k: u32, l: u32) -> Result<Self> {
        let (matrix, _k, l) = make_ddg_matrix(ms, k, l)?;
        Ok(Self { matrix, l })
    }

    pub fn from_parts(matrix: DdgMatrix, l: u32) -> Self {
        Self { matrix, l }
    }

    pub fn n(&self) -> usize {
        self.matrix.n()
    }

    pub fn k(&self) -> u32 {
        self.matrix.k()
    }

    pub fn l(&self) -> u32 {
        self.l
    }

    pub fn matrix(&self) -> &DdgMatrix {
        &self.matrix
    }

    /// Derive the Hamming cache `(h, T)` needed to build a [`KyMatrixCached`]
    /// over this same matrix.
    pub fn into_cached(self) -> KyMatrixCached {
        let h = hamming_vector(&self.matrix);
        let t = hamming_matrix(&self.matrix);
        KyMatrixCached {
            n: self.matrix.n(),
            k: self.matrix.k(),
            l: self.l,
            h,
            t,
        }
    }

    pub fn sample(&self, coin: &mut impl FairCoin) -> usize {
        let n = self.matrix.n();
        if n == 1 {
            return 0;
        }
        let k = self.matrix.k();
        let mut d: i64 = 0;
        let mut c: u32 = 0;
        loop {
            let b = i64::from(next_bit(coin));
            d = 2 * d + (1 - b);
            for r in 0..n {
                d -= i64::from(self.matrix.get(r, c));
                if d == -1 {
                    return r;
                }
            }
            c = if c == k - 1 { self.l } else { c + 1 };
        }
    }
}

/// The cached matrix-form KY sampler: same walk as [`KyMatrix`], but against
/// the Hamming cache `(h, T)` instead of re-scanning `P`'s rows every bit.
#[derive(Clone, Debug)]
pub struct KyMatrixCached {
    n: usize,
    k: u32,
    l: u32,
    h: Vec<u32>,
    t: Vec<Vec<usize>>,
}

impl KyMatrixCached {
    pub fn construct(p: &[BigRational]) -> Result<Self> {
        Ok(KyMatrix::construct(p)?.into_cached())
    }

    pub fn construct_from_numerators(ms: &[BigUint], k: u32, l: u32) -> Result<Self> {
        Ok(KyMatrix::construct_from_numerators(ms, k, l)?.into_cached())
    }

    pub fn from_parts(n: usize, k: u32, l: u32, h: Vec<u32>, t: Vec<Vec<usize>>) -> Self {
        Self { n, k, l, h, t }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn k(&self) -> u32 {
        self.k
    }

    pub fn l(&self) -> u32 {
        self.l
    }

    pub fn h(&self) -> &[u32] {
        &self.h
    }

    pub fn t(&self) -> &[Vec<usize>] {
        &self.t
    }

    pub fn sample(&self, coin: &mut impl FairCoin) -> usize {
        if self.n == 1 {
            return 0;
        }
        let mut d: i64 = 0;
        let mut c: u32 = 0;
        loop {
            let b = i64::from(next_bit(coin));
            d = 2 * d + (1 - b);
            let h_c = i64::from(self.h[c as usize]);
            if d < h_c {
                return self.t[c as usize][d as usize];
            }
            d -= h_c;
            c = if c == self.k - 1 { self.l } else { c + 1 };
        }
    }
}

/// Approximate KY: sample from the nearest dyadic (power-of-two-denominator)
/// approximation of `p`, built by truncating each `p_i`'s exact binary
/// expansion to `k` bits (`l = k`, no periodic tail, exact and fast).
#[derive(Clone, Debug)]
pub struct KyApprox {
    inner: KyEncoding,
}

impl KyApprox {
    /// Build from floating-point probabilities (the natural representation
    /// for an approximation anyway, since the precision is bounded by `f64`).
    pub fn construct(p: &[f64]) -> Result<Self> {
        let (bits, k) = crate::rational::dyadic_approximation(p)?;
        let ms: Vec<BigUint> = bits
            .iter()
            .map(|row| row.iter().fold(BigUint::from(0u32), |acc, &b| (acc << 1u32) | BigUint::from(b)))
            .collect();
        let inner = KyEncoding::construct_from_numerators(&ms, k, k)?;
        Ok(Self { inner })
    }

    pub fn n(&self) -> usize {
        self.inner.n()
    }

    pub fn k(&self) -> u32 {
        self.inner.k()
    }

    pub fn sample(&self, coin: &mut impl FairCoin) -> usize {
        self.inner.sample(coin)
    }
}
