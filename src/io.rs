//! Text serialization for every sampler family, plus a "distribution file"
//! pairing a weight vector with its binary entropy.
//!
//! Grounded in the original's `writeio.py`: whitespace-separated ASCII,
//! one logical section per line, base-10 integers. Rationals (the alias
//! table's `q`) are written `numerator/denominator`, always with an
//! explicit denominator even when it's 1, so a reader never has to guess.

use std::fmt::Write as _;
use std::str::FromStr;

use num_bigint::{BigInt, BigUint};
use num_rational::BigRational;
use num_traits::Zero;

use crate::alias::Alias;
use crate::error::{Error, Result};
use crate::interval::IntervalIntegerCdf;
use crate::ky::{KyEncoding, KyMatrix, KyMatrixCached};
use crate::matrix::DdgMatrix;
use crate::packing::PackedEncoding;
use crate::rational::compute_entropy;
use crate::rejection::{RejectionBinarySearch, RejectionHashTable, RejectionUniform};

struct Tokens<'a> {
    it: std::str::SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(s: &'a str) -> Self {
        Self { it: s.split_whitespace() }
    }

    fn next_str(&mut self) -> Result<&'a str> {
        self.it.next().ok_or_else(|| Error::Parse("unexpected end of input".to_string()))
    }

    fn next_t<T: FromStr>(&mut self, what: &str) -> Result<T> {
        self.next_str()?.parse().map_err(|_| Error::Parse(format!("expected {what}")))
    }

    fn next_usize(&mut self) -> Result<usize> {
        self.next_t("an integer")
    }

    fn next_u32(&mut self) -> Result<u32> {
        self.next_t("an integer")
    }

    fn next_isize(&mut self) -> Result<isize> {
        self.next_t("an integer")
    }

    fn next_biguint(&mut self) -> Result<BigUint> {
        self.next_t("a non-negative integer")
    }

    fn next_bit(&mut self) -> Result<u8> {
        match self.next_str()? {
            "0" => Ok(0),
            "1" => Ok(1),
            other => Err(Error::Parse(format!("expected a single bit, got {other}"))),
        }
    }

    fn next_rational(&mut self) -> Result<BigRational> {
        let tok = self.next_str()?;
        let (n, d) = tok
            .split_once('/')
            .ok_or_else(|| Error::Parse(format!("expected numerator/denominator, got {tok}")))?;
        let numer: BigInt = n.parse().map_err(|_| Error::Parse(format!("bad numerator in {tok}")))?;
        let denom: BigInt = d.parse().map_err(|_| Error::Parse(format!("bad denominator in {tok}")))?;
        if denom.is_zero() {
            return Err(Error::Parse(format!("zero denominator in {tok}")));
        }
        Ok(BigRational::new(numer, denom))
    }
}

fn format_rational(r: &BigRational) -> String {
    format!("{}/{}", r.numer(), r.denom())
}

fn write_array<T: std::fmt::Display>(out: &mut String, items: impl ExactSizeIterator<Item = T>) {
    let _ = write!(out, "{}", items.len());
    for v in items {
        let _ = write!(out, " {v}");
    }
    let _ = writeln!(out);
}

/// `n k\n` then `len enc_0 enc_1 …\n`.
pub fn write_ky_encoding(enc: &KyEncoding) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", enc.n(), enc.k());
    write_array(&mut out, enc.encoding().as_slice().iter());
    out
}

pub fn read_ky_encoding(s: &str) -> Result<KyEncoding> {
    let mut t = Tokens::new(s);
    let n = t.next_usize()?;
    let k = t.next_u32()?;
    let len = t.next_usize()?;
    let mut enc = Vec::with_capacity(len);
    for _ in 0..len {
        enc.push(t.next_isize()?);
    }
    Ok(KyEncoding::from_parts(n, k, PackedEncoding::from_raw(enc)))
}

/// `k l\n` then `n k\n`, then `n` rows of `k` bits each.
pub fn write_ky_matrix(matrix: &DdgMatrix, l: u32) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", matrix.k(), l);
    let _ = writeln!(out, "{} {}", matrix.n(), matrix.k());
    for i in 0..matrix.n() {
        let row: Vec<String> = matrix.row(i).iter().map(|b| b.to_string()).collect();
        let _ = writeln!(out, "{}", row.join(" "));
    }
    out
}

pub fn read_ky_matrix(s: &str) -> Result<(DdgMatrix, u32)> {
    let mut t = Tokens::new(s);
    let k = t.next_u32()?;
    let l = t.next_u32()?;
    let n = t.next_usize()?;
    let k2 = t.next_u32()?;
    if k2 != k {
        return Err(Error::Parse("k in header does not match k in body".to_string()));
    }
    let mut bits = Vec::with_capacity(n * k as usize);
    for _ in 0..(n * k as usize) {
        bits.push(t.next_bit()?);
    }
    Ok((DdgMatrix::from_parts(n, k, bits), l))
}

/// `k l\n` then `len h_0 … h_{k−1}\n`, then `n k\n`, then `n` rows of `k`
/// integers: row `d`, column `j` is `T[j][d]` when `d < h[j]`, else a dead
/// padding cell (never read back).
pub fn write_ky_matrix_cached(cached: &KyMatrixCached) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", cached.k(), cached.l());
    write_array(&mut out, cached.h().iter());
    let _ = writeln!(out, "{} {}", cached.n(), cached.k());
    for d in 0..cached.n() {
        let row: Vec<String> = (0..cached.k() as usize)
            .map(|j| cached.t()[j].get(d).copied().unwrap_or(0).to_string())
            .collect();
        let _ = writeln!(out, "{}", row.join(" "));
    }
    out
}

pub fn read_ky_matrix_cached(s: &str) -> Result<KyMatrixCached> {
    let mut t = Tokens::new(s);
    let k = t.next_u32()?;
    let l = t.next_u32()?;
    let hlen = t.next_usize()?;
    let mut h = Vec::with_capacity(hlen);
    for _ in 0..hlen {
        h.push(t.next_u32()?);
    }
    let n = t.next_usize()?;
    let k2 = t.next_u32()?;
    if k2 != k {
        return Err(Error::Parse("k in header does not match k in body".to_string()));
    }
    let mut dense = vec![vec![0usize; k as usize]; n];
    for row in dense.iter_mut() {
        for cell in row.iter_mut() {
            *cell = t.next_usize()?;
        }
    }
    let mut columns: Vec<Vec<usize>> = Vec::with_capacity(k as usize);
    for (j, &hj) in h.iter().enumerate() {
        let hj = hj as usize;
        let mut col = Vec::with_capacity(hj);
        for row in dense.iter().take(hj) {
            col.push(row[j]);
        }
        columns.push(col);
    }
    Ok(KyMatrixCached::from_parts(n, k, l, h, columns))
}

/// `n M\n` then `n M_0 … M_{n−1}\n`.
pub fn write_rejection_uniform(r: &RejectionUniform) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", r.n(), r.max_weight());
    write_array(&mut out, r.weights().iter());
    out
}

pub fn read_rejection_uniform(s: &str) -> Result<RejectionUniform> {
    let mut t = Tokens::new(s);
    let n = t.next_usize()?;
    let max_m = t.next_biguint()?;
    let len = t.next_usize()?;
    if len != n {
        return Err(Error::Parse("weight count does not match header n".to_string()));
    }
    let mut ms = Vec::with_capacity(len);
    for _ in 0..len {
        ms.push(t.next_biguint()?);
    }
    Ok(RejectionUniform::from_parts(ms, max_m))
}

/// `k Z\n` then `Z T_0 … T_{Z−1}\n`.
pub fn write_rejection_hash_table(r: &RejectionHashTable) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", r.k(), r.z());
    write_array(&mut out, r.table().iter());
    out
}

pub fn read_rejection_hash_table(s: &str) -> Result<RejectionHashTable> {
    let mut t = Tokens::new(s);
    let k = t.next_u32()?;
    let z = t.next_biguint()?;
    let len = t.next_usize()?;
    let mut table = Vec::with_capacity(len);
    for _ in 0..len {
        table.push(t.next_usize()?);
    }
    Ok(RejectionHashTable::from_parts(k, z, table))
}

/// `k Z\n` then `n+1 cdf_0 … cdf_n\n`. Shared by the binary-search rejection
/// sampler and the integer-CDF interval sampler.
pub fn write_rejection_binary_search(r: &RejectionBinarySearch) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", r.k(), r.z());
    write_array(&mut out, r.cdf().iter());
    out
}

pub fn read_rejection_binary_search(s: &str) -> Result<RejectionBinarySearch> {
    let mut t = Tokens::new(s);
    let k = t.next_u32()?;
    let _z = t.next_biguint()?;
    let len = t.next_usize()?;
    let mut cdf = Vec::with_capacity(len);
    for _ in 0..len {
        cdf.push(t.next_biguint()?);
    }
    Ok(RejectionBinarySearch::from_parts(k, cdf))
}

pub fn write_interval(interval: &IntervalIntegerCdf) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", interval.max_bits(), interval.z());
    write_array(&mut out, interval.cdf().iter());
    out
}

pub fn read_interval(s: &str) -> Result<IntervalIntegerCdf> {
    let mut t = Tokens::new(s);
    let max_bits = t.next_u32()?;
    let _z = t.next_biguint()?;
    let len = t.next_usize()?;
    let mut cdf = Vec::with_capacity(len);
    for _ in 0..len {
        cdf.push(t.next_biguint()?);
    }
    Ok(IntervalIntegerCdf::from_parts(max_bits, cdf))
}

/// `n\n` then three arrays in order: `qs`, `Ms`, `j`.
pub fn write_alias(alias: &Alias) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", alias.n());
    write_array(&mut out, alias.q().iter().map(format_rational));
    write_array(&mut out, alias.ms().iter());
    write_array(&mut out, alias.alias().iter());
    out
}

pub fn read_alias(s: &str) -> Result<Alias> {
    let mut t = Tokens::new(s);
    let n = t.next_usize()?;

    let qlen = t.next_usize()?;
    let mut q = Vec::with_capacity(qlen);
    for _ in 0..qlen {
        q.push(t.next_rational()?);
    }

    let mlen = t.next_usize()?;
    let mut ms = Vec::with_capacity(mlen);
    for _ in 0..mlen {
        ms.push(t.next_biguint()?);
    }

    let jlen = t.next_usize()?;
    let mut j = Vec::with_capacity(jlen);
    for _ in 0..jlen {
        j.push(t.next_usize()?);
    }

    if qlen != n || mlen != n || jlen != n {
        return Err(Error::Parse("array length does not match header n".to_string()));
    }
    Ok(Alias::from_parts(n, q, j, ms))
}

/// `Z\n`, `n M_0 … M_{n−1}\n`, `entropy\n`: a weight vector paired with its
/// own binary entropy, as `f64` text (entropy is reported, not reproduced
/// exactly, so no rational round-trip is needed here).
pub fn write_distribution_file(z: &BigUint, ms: &[BigUint]) -> Result<String> {
    let p: Vec<BigRational> = ms.iter().map(|m| BigRational::new(BigInt::from(m.clone()), BigInt::from(z.clone()))).collect();
    let entropy = compute_entropy(&p);
    let mut out = String::new();
    let _ = writeln!(out, "{z}");
    write_array(&mut out, ms.iter());
    let _ = writeln!(out, "{entropy}");
    Ok(out)
}

pub fn read_distribution_file(s: &str) -> Result<(BigUint, Vec<BigUint>, f64)> {
    let mut t = Tokens::new(s);
    let z = t.next_biguint()?;
    let len = t.next_usize()?;
    let mut ms = Vec::with_capacity(len);
    for _ in 0..len {
        ms.push(t.next_biguint()?);
    }
    let entropy: f64 = t.next_t("a floating-point entropy")?;
    Ok((z, ms, entropy))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratio_vec(weights: &[u32]) -> Vec<BigRational> {
        let z: u32 = weights.iter().sum();
        weights.iter().map(|&w| BigRational::new(w.into(), z.into())).collect()
    }

    #[test]
    fn ky_encoding_round_trips() {
        let p = ratio_vec(&[1, 2, 5]);
        let enc = KyEncoding::construct(&p).unwrap();
        let text = write_ky_encoding(&enc);
        let back = read_ky_encoding(&text).unwrap();
        assert_eq!(back.n(), enc.n());
        assert_eq!(back.k(), enc.k());
        assert_eq!(back.encoding().as_slice(), enc.encoding().as_slice());
    }

    #[test]
    fn ky_matrix_round_trips() {
        let p = ratio_vec(&[1, 3, 4]);
        let ky = KyMatrix::construct(&p).unwrap();
        let text = write_ky_matrix(ky.matrix(), ky.l());
        let (matrix, l) = read_ky_matrix(&text).unwrap();
        assert_eq!(l, ky.l());
        assert_eq!(matrix.n(), ky.matrix().n());
        assert_eq!(matrix.k(), ky.matrix().k());
        for i in 0..matrix.n() {
            assert_eq!(matrix.row(i), ky.matrix().row(i));
        }
    }

    #[test]
    fn ky_matrix_cached_round_trips() {
        let p = ratio_vec(&[1, 3, 4]);
        let cached = KyMatrix::construct(&p).unwrap().into_cached();
        let text = write_ky_matrix_cached(&cached);
        let back = read_ky_matrix_cached(&text).unwrap();
        assert_eq!(back.h(), cached.h());
        assert_eq!(back.t(), cached.t());
    }

    #[test]
    fn rejection_uniform_round_trips() {
        let p = ratio_vec(&[1, 2, 5]);
        let r = RejectionUniform::construct(&p).unwrap();
        let text = write_rejection_uniform(&r);
        let back = read_rejection_uniform(&text).unwrap();
        assert_eq!(back.weights(), r.weights());
        assert_eq!(back.max_weight(), r.max_weight());
    }

    #[test]
    fn rejection_hash_table_round_trips() {
        let p = ratio_vec(&[1, 2, 5]);
        let r = RejectionHashTable::construct(&p).unwrap();
        let text = write_rejection_hash_table(&r);
        let back = read_rejection_hash_table(&text).unwrap();
        assert_eq!(back.table(), r.table());
        assert_eq!(back.z(), r.z());
    }

    #[test]
    fn binary_search_and_interval_round_trip() {
        let p = ratio_vec(&[1, 2, 5]);
        let r = RejectionBinarySearch::construct(&p).unwrap();
        let text = write_rejection_binary_search(&r);
        let back = read_rejection_binary_search(&text).unwrap();
        assert_eq!(back.cdf(), r.cdf());

        let iv = IntervalIntegerCdf::construct_default(&p).unwrap();
        let text = write_interval(&iv);
        let back = read_interval(&text).unwrap();
        assert_eq!(back.cdf(), iv.cdf());
    }

    #[test]
    fn alias_round_trips() {
        let p = ratio_vec(&[1, 2, 3, 10]);
        let alias = Alias::construct(&p).unwrap();
        let text = write_alias(&alias);
        let back = read_alias(&text).unwrap();
        assert_eq!(back.q(), alias.q());
        assert_eq!(back.alias(), alias.alias());
        assert_eq!(back.ms(), alias.ms());
    }

    #[test]
    fn distribution_file_round_trips_weights() {
        let z = BigUint::from(8u32);
        let ms = vec![BigUint::from(1u32), BigUint::from(3u32), BigUint::from(4u32)];
        let text = write_distribution_file(&z, &ms).unwrap();
        let (z2, ms2, entropy) = read_distribution_file(&text).unwrap();
        assert_eq!(z2, z);
        assert_eq!(ms2, ms);
        assert!(entropy > 0.0);
    }
}
