//! Lazy, entropy-counting sources of unbiased random bits.
//!
//! `FairCoin` is the teacher crate's original abstraction: a single
//! independent, unbiased bit. Every sampler in this crate is written against
//! it, exactly as the teacher's `Generator::sample` was. `BitStream` is a
//! `FairCoin` that draws its bits in batches from an underlying
//! [`RandomWord`] source (a uniformly random `k`-bit word at a time) and
//! counts every bit actually delivered, which is what makes a sampler's
//! entropy consumption measurable.

/// Sampling requires a fair coin, i.e. a random variable that outputs `true`
/// or `false` with equal probability. This trait describes the interface for
/// a fair coin, but lets the caller choose the specifics of how to implement
/// it.
pub trait FairCoin {
    /// A coin flip takes no inputs and returns one of two values with equal
    /// probability.
    /// NOTE: The coin is taken as a mutable reference because implementations
    /// will likely need to update their internal state in order to sample
    /// new random numbers.
    fn flip(&mut self) -> bool;
}

/// A source of uniformly random words, used to refill a [`BitStream`]'s
/// internal cache. Kept dependency-free so the core crate has no required
/// external RNG dependency; see [`crate::rand`] for a `rand`-crate-backed
/// implementation.
pub trait RandomWord {
    /// Return a value drawn uniformly from `0..2^bits`. `bits` is at most 64.
    fn next_word(&mut self, bits: u32) -> u64;
}

/// Lazily draws `k`-bit words from an underlying [`RandomWord`] source and
/// hands out one bit at a time, counting every bit delivered.
///
/// Mirrors `BitStream(k, word, pos, calls, rng)` from spec.md §3: `word` is
/// the current cached `k`-bit value, `pos` is how many of its bits remain
/// unconsumed, and `calls` is the running count of bits ever delivered.
/// Not `Sync`/shareable across concurrent samples by design — each
/// concurrent sample needs its own `BitStream`.
pub struct BitStream<R: RandomWord> {
    word_bits: u32,
    word: u64,
    pos: u32,
    calls: u64,
    source: R,
}

impl<R: RandomWord> BitStream<R> {
    /// Create a new `BitStream` that refills in batches of `k` bits at a
    /// time (`k` clamped to `[1, 64]`: batching only affects the pattern of
    /// calls into `source`, never the bits delivered).
    pub fn new(k: u32, source: R) -> Self {
        Self {
            word_bits: k.clamp(1, 64),
            word: 0,
            pos: 0,
            calls: 0,
            source,
        }
    }

    /// Draw the next bit, refilling the internal word cache if needed.
    pub fn next_bit(&mut self) -> u8 {
        if self.pos == 0 {
            self.word = self.source.next_word(self.word_bits);
            self.pos = self.word_bits;
        }
        self.pos -= 1;
        self.calls += 1;
        ((self.word >> self.pos) & 1) as u8
    }

    /// Total number of bits delivered so far.
    pub fn calls_count(&self) -> u64 {
        self.calls
    }
}

impl<R: RandomWord> FairCoin for BitStream<R> {
    fn flip(&mut self) -> bool {
        self.next_bit() == 1
    }
}

/// Adapt any `FairCoin` into a bit iterator, for callers that prefer to draw
/// individual `0`/`1` bits rather than `bool` flips (the samplers in
/// `rational`/`ky`/`rejection` are written against raw `u8` bits to mirror
/// the original's `next(bitstream)` convention).
pub(crate) fn next_bit(coin: &mut impl FairCoin) -> u8 {
    u8::from(coin.flip())
}
