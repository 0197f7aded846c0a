//! `rand`-crate-backed coin and bit sources, gated behind the `rand`
//! feature — exactly as the teacher crate gates its own `RngCoin`.

use rand::{rngs::ThreadRng, Rng, RngCore};

use crate::bitstream::{BitStream, FairCoin, RandomWord};

/// Helper type for performing repeated coin flips.
/// Fetches random bits from a given RNG in blocks of 64 bits and returns
/// them one at a time.
pub struct RngCoin<R: Rng> {
    rng: R,
    random_bits: u64,
    bits_read: u32,
}

impl<R: Rng> RngCoin<R> {
    /// Create a new `RngCoin` instance with the given RNG and assign a
    /// random `u64` to `random_bits`.
    #[must_use]
    pub fn new(mut rng: R) -> Self {
        let random_bits = rng.next_u64();
        Self {
            rng,
            random_bits,
            bits_read: 0,
        }
    }
}

/// Create a new `RngCoin` and default to using the local `ThreadRng`
/// instance RNG.
impl Default for RngCoin<ThreadRng> {
    fn default() -> Self {
        RngCoin::new(ThreadRng::default())
    }
}

/// Implement `FairCoin` so this struct can be sampled by any sampler in the
/// crate.
impl<R: Rng> FairCoin for RngCoin<R> {
    fn flip(&mut self) -> bool {
        // If we have read the entire `u64` of random bits, generate a new block.
        if self.bits_read == u64::BITS {
            self.random_bits = self.rng.next_u64();
            self.bits_read = 0;
        }

        // Grab the right-most bit and increment the number of bits read.
        let b = self.random_bits & 1 > 0;
        self.bits_read += 1;

        // Shift the random bits to the right by one and return the result bit.
        self.random_bits >>= 1;
        b
    }
}

/// Adapts any `rand::RngCore` into a [`RandomWord`] source, so it can back a
/// [`BitStream`] (which additionally counts bits consumed, unlike `RngCoin`).
pub struct RngWordSource<R: RngCore>(pub R);

impl<R: RngCore> RandomWord for RngWordSource<R> {
    fn next_word(&mut self, bits: u32) -> u64 {
        if bits >= 64 {
            self.0.next_u64()
        } else {
            self.0.gen_range(0..(1u64 << bits))
        }
    }
}

/// A `BitStream` backed directly by a `rand::RngCore`.
pub type RandomBitStream<R> = BitStream<RngWordSource<R>>;

/// Construct a `k`-bit-batched `BitStream` over the thread-local RNG.
#[must_use]
pub fn thread_rng_bitstream(k: u32) -> RandomBitStream<ThreadRng> {
    BitStream::new(k, RngWordSource(rand::thread_rng()))
}
