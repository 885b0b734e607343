//! 2-bit encoding of nucleotides.
//!
// Easy encoding from ASCII are the 3rd and 2nd bits
// This encodes as A: 00; C: 01; T: 10; G: 11
// EOR w/ 10          10     10     10     10
// gives rc           10     11     00     01

/// Bases in the order of their 2-bit code
const LETTER_CODE: [u8; 4] = [b'A', b'C', b'T', b'G'];

/// Largest k which fits in a [`u64`] at two bits per base
pub const MAX_K: usize = 32;

/// Convert an ASCII base (upper or lower case) to its 2-bit code
#[inline(always)]
pub fn encode_base(base: u8) -> u8 {
    (base >> 1) & 0x3
}

/// Convert a 2-bit code back to an upper case ASCII base
#[inline(always)]
pub fn decode_base(bitbase: u8) -> u8 {
    LETTER_CODE[bitbase as usize]
}

/// Pack a sequence of at most [`MAX_K`] bases into the low bits of a [`u64`],
/// first base in the highest used bits.
pub fn encode_kmer(seq: &[u8]) -> u64 {
    debug_assert!(seq.len() <= MAX_K);
    seq.iter()
        .fold(0u64, |kmer, base| (kmer << 2) | encode_base(*base) as u64)
}

/// Unpack `k` bases from an encoded k-mer
pub fn decode_kmer(kmer: u64, k: usize) -> String {
    (0..k)
        .rev()
        .map(|idx| decode_base(((kmer >> (2 * idx)) & 0x3) as u8) as char)
        .collect()
}

// https://www.biostars.org/p/113640/
/// Reverse complement of an encoded k-mer
#[inline(always)]
pub fn revcomp64_v2(mut res: u64, k_size: usize) -> u64 {
    res = (res >> 2 & 0x3333333333333333) | (res & 0x3333333333333333) << 2;
    res = (res >> 4 & 0x0F0F0F0F0F0F0F0F) | (res & 0x0F0F0F0F0F0F0F0F) << 4;
    res = (res >> 8 & 0x00FF00FF00FF00FF) | (res & 0x00FF00FF00FF00FF) << 8;
    res = (res >> 16 & 0x0000FFFF0000FFFF) | (res & 0x0000FFFF0000FFFF) << 16;
    res = (res >> 32 & 0x00000000FFFFFFFF) | (res & 0x00000000FFFFFFFF) << 32;
    res ^= 0xAAAAAAAAAAAAAAAA;

    res >> (2 * (32 - k_size))
}
