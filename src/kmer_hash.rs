//! Hashing of k-mers for minimizer selection.
//!
//! A k-mer is 2-bit encoded (see [`bit_encoding`]) in both orientations, and
//! each encoding is passed through an invertible integer hash so that hash
//! order is unrelated to lexicographic order. The canonical hash of a k-mer is
//! the smaller of its forward and reverse complement hashes.

pub mod bit_encoding;
use crate::kmer_hash::bit_encoding::{encode_kmer, revcomp64_v2, MAX_K};

/// Invertible integer hash restricted to `mask` bits (Thomas Wang's 64-bit mix).
#[inline]
pub fn hash64(mut key: u64, mask: u64) -> u64 {
    key = (!key).wrapping_add(key << 21) & mask;
    key ^= key >> 24;
    key = (key.wrapping_add(key << 3)).wrapping_add(key << 8) & mask;
    key ^= key >> 14;
    key = (key.wrapping_add(key << 2)).wrapping_add(key << 4) & mask;
    key ^= key >> 28;
    key = key.wrapping_add(key << 31) & mask;
    key
}

/// Hashes k-mers of a fixed size.
#[derive(Debug, Clone, Copy)]
pub struct KmerHash {
    k: usize,
    mask: u64,
}

impl KmerHash {
    /// # Panics
    /// If `k` is zero or larger than [`MAX_K`].
    pub fn new(k: usize) -> Self {
        assert!(
            (1..=MAX_K).contains(&k),
            "k-mer size must be between 1 and {MAX_K}"
        );
        let mask = if k == MAX_K {
            u64::MAX
        } else {
            (1 << (2 * k)) - 1
        };
        Self { k, mask }
    }

    /// k-mer size
    pub fn kmer_len(&self) -> usize {
        self.k
    }

    /// Forward and reverse complement hashes of `seq`, which must have length k.
    pub fn kmerhash(&self, seq: &[u8]) -> (u64, u64) {
        assert_eq!(seq.len(), self.k, "Sequence length does not match k");
        let fwd = encode_kmer(seq);
        let rev = revcomp64_v2(fwd, self.k);
        (hash64(fwd, self.mask), hash64(rev, self.mask))
    }

    /// Minimum of the forward and reverse complement hashes, and whether the
    /// forward hash was the smaller (or equal) one.
    pub fn canonical(&self, seq: &[u8]) -> (u64, bool) {
        let (fwd, rev) = self.kmerhash(seq);
        (u64::min(fwd, rev), fwd <= rev)
    }
}

/// Number of `A` and `T` bases (either case) in a sequence, saturating at 255.
pub fn count_at(seq: &[u8]) -> u8 {
    let count = seq
        .iter()
        .filter(|b| matches!(b, b'A' | b'T' | b'a' | b't'))
        .count();
    u8::try_from(count).unwrap_or(u8::MAX)
}
