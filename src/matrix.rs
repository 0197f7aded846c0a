//! The Knuth-Yao discrete-distribution-generator (DDG) matrix, and the
//! column-Hamming-weight cache derived from it.

use num_bigint::BigUint;

use crate::error::Result;
use crate::rational::{frac_to_bits, reduce_fractions};

/// An `n x k` matrix of bits: row `i` is the `k`-bit expansion of `M_i /
/// Zkl(k, l)` in the k-l number system. Stored flat (row-major) rather than
/// as `Vec<Vec<u8>>`, matching the teacher's own flat `level_label_matrix`
/// layout choice.
#[derive(Clone, Debug)]
pub struct DdgMatrix {
    n: usize,
    k: u32,
    bits: Vec<u8>,
}

impl DdgMatrix {
    /// Number of outcomes (rows).
    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of columns (the `k` bit-precision of this matrix).
    pub fn k(&self) -> u32 {
        self.k
    }

    /// Bit at `(row, col)`.
    pub fn get(&self, row: usize, col: u32) -> u8 {
        self.bits[row * self.k as usize + col as usize]
    }

    /// The `k`-bit row label for `row`.
    pub fn row(&self, row: usize) -> &[u8] {
        let start = row * self.k as usize;
        &self.bits[start..start + self.k as usize]
    }

    /// Column `col` across every row, in row order.
    pub fn column(&self, col: u32) -> impl Iterator<Item = u8> + '_ {
        (0..self.n).map(move |r| self.get(r, col))
    }

    /// Rebuild a matrix from its previously serialized flat bits.
    pub fn from_parts(n: usize, k: u32, bits: Vec<u8>) -> Self {
        debug_assert_eq!(bits.len(), n * k as usize, "bits must be exactly n * k long");
        Self { n, k, bits }
    }
}

/// Build the DDG matrix from numerators `M` and `(k, l)`, after first
/// reducing `(M, k, l)` to lowest terms. Returns the matrix and the reduced
/// `(k, l)`.
pub fn make_ddg_matrix(ms: &[BigUint], k: u32, l: u32) -> Result<(DdgMatrix, u32, u32)> {
    let (ms, k, l) = reduce_fractions(ms, k, l)?;
    if k != l {
        log::trace!("matrix::make_ddg_matrix: reduced to k={k} l={l} (periodic)");
    }
    let n = ms.len();
    let mut bits = Vec::with_capacity(n * k as usize);
    for m in &ms {
        bits.extend(frac_to_bits(m, k, l));
    }
    Ok((DdgMatrix { n, k, bits }, k, l))
}

/// Column Hamming weights: `h[j] = sum_i P[i][j]`.
pub fn hamming_vector(p: &DdgMatrix) -> Vec<u32> {
    (0..p.k()).map(|j| p.column(j).map(u32::from).sum()).collect()
}

/// Column-indexed label matrix: `t[j]` lists, in ascending row order, the
/// row indices `i` with `P[i][j] = 1`. `t[j][d]` is spec.md's `T[d][j]`.
pub fn hamming_matrix(p: &DdgMatrix) -> Vec<Vec<usize>> {
    (0..p.k())
        .map(|j| {
            (0..p.n())
                .filter(|&i| p.get(i, j) == 1)
                .collect::<Vec<usize>>()
        })
        .collect()
}
