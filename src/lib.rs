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

//! # discrete-sampling
//!
//! Exact and approximate samplers for finite discrete distributions over
//! rational probability vectors, built around the
//! [Knuth-Yao discrete distribution generator](https://dl.acm.org/doi/10.1145/76359.76371)
//! and its `k`-`l` mixed-radix number system, alongside a family of
//! rejection, interval, alias, and inversion samplers that share the same
//! exact rational substrate.
//!
//! Every sampler follows the same shape: a fallible `construct` from a
//! probability vector (or, for the approximate form, from floating-point
//! weights), and an infallible-except-for-[`error::Error::PrecisionExhausted`]
//! `sample` taking a [`bitstream::FairCoin`]. `rejection::Generator` is this
//! crate's direct continuation of the
//! [Fast Loaded Dice Roller](https://arxiv.org/pdf/2003.03830.pdf) `Generator`
//! this crate grew from: a Knuth-Yao tree built over weights padded to the
//! next power of two with a reject bucket.
//!
//! ### Citation
//!
//! The Knuth-Yao construction and the FLDR's rejection-augmented variant of
//! it are not original to this crate:
//! ```text
//! @inproceedings{saad2020fldr,
//!   title           = {The Fast Loaded Dice Roller: A Near-optimal Exact Sampler for Discrete Probability Distributions},
//!   author          = {Saad, Feras A. and Freer, Cameron E. and Rinard, Martin C. and Mansinghka, Vikash K.},
//!   booktitle       = {AISTATS 2020: Proceedings of the 23rd International Conference on Artificial Intelligence and Statistics},
//!   volume          = 108,
//!   series          = {Proceedings of Machine Learning Research},
//!   address         = {Palermo, Sicily, Italy},
//!   publisher       = {PMLR},
//!   year            = 2020,
//! }
//! ```

pub mod alias;
pub mod bitstream;
pub mod error;
pub mod interval;
pub mod inversion;
pub mod io;
pub mod ky;
pub mod matrix;
pub mod packing;
pub mod rational;
pub mod rejection;
pub mod tree;

#[cfg(feature = "rand")]
pub mod rand;

pub use alias::Alias;
pub use bitstream::{BitStream, FairCoin, RandomWord};
pub use error::{Error, Result};
pub use interval::{IntervalBitRefinement, IntervalIntegerCdf};
pub use inversion::{InversionLt, InversionLte};
pub use ky::{KyApprox, KyEncoding, KyMatrix, KyMatrixCached};
pub use matrix::DdgMatrix;
pub use packing::PackedEncoding;
pub use rejection::{Generator, RejectionBinarySearch, RejectionHashTable, RejectionKyAugmented, RejectionUniform};
pub use tree::DdgNode;
