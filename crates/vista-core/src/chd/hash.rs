//! Key mixing functions for the perfect-hash table

use serde::{Deserialize, Serialize};

const FNV_OFFSET_BASIS: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;
const CRC32C_POLY: u32 = 0x82F6_3B78;
const SEED_MULTIPLIER: u64 = 0x2545_F491_4F6C_DD1D;

/// Byte-at-a-time hash used to bucket keys.
///
/// Keys are walked as UTF-16 code units, two bytes at a time, and the low
/// byte of each unit is mixed in. Results are identical on every platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashFunction {
    /// FNV-1a over each byte.
    #[default]
    Fnv,
    /// CRC32C, hardware accelerated where SSE4.2 is available.
    Crc32c,
    /// Larsson's multiplicative hash (`37 * h + b`).
    Larsson,
}

impl HashFunction {
    pub fn hash(self, key: &str) -> u32 {
        match self {
            HashFunction::Fnv => fold(key, fnv),
            HashFunction::Crc32c => crc32c(key),
            HashFunction::Larsson => fold(key, larsson),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            HashFunction::Fnv => "fnv",
            HashFunction::Crc32c => "crc32c",
            HashFunction::Larsson => "larsson",
        }
    }
}

impl std::fmt::Display for HashFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[inline]
fn fold(key: &str, step: fn(u32, u8) -> u32) -> u32 {
    key.encode_utf16()
        .fold(FNV_OFFSET_BASIS, |hash, unit| step(hash, low_byte(unit)))
}

#[inline]
fn low_byte(unit: u16) -> u8 {
    (unit & 0xFF) as u8
}

#[inline]
fn fnv(hash: u32, byte: u8) -> u32 {
    (u32::from(byte) ^ hash).wrapping_mul(FNV_PRIME)
}

#[inline]
fn larsson(hash: u32, byte: u8) -> u32 {
    hash.wrapping_mul(37).wrapping_add(u32::from(byte))
}

/// Software CRC32C step. Same result as the SSE4.2 `crc32` instruction:
/// reflected polynomial, no pre- or post-inversion.
#[inline]
pub(crate) fn crc32c_step(hash: u32, byte: u8) -> u32 {
    let mut crc = hash ^ u32::from(byte);
    for _ in 0..8 {
        crc = if crc & 1 != 0 {
            (crc >> 1) ^ CRC32C_POLY
        } else {
            crc >> 1
        };
    }
    crc
}

fn crc32c(key: &str) -> u32 {
    #[cfg(target_arch = "x86_64")]
    {
        if std::arch::is_x86_feature_detected!("sse4.2") {
            // SAFETY: the sse4.2 feature was detected at runtime.
            return unsafe { crc32c_sse42(key) };
        }
    }
    fold(key, crc32c_step)
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse4.2")]
unsafe fn crc32c_sse42(key: &str) -> u32 {
    use std::arch::x86_64::_mm_crc32_u8;

    let mut hash = FNV_OFFSET_BASIS;
    for unit in key.encode_utf16() {
        // SAFETY: only called once sse4.2 support has been detected.
        hash = unsafe { _mm_crc32_u8(hash, low_byte(unit)) };
    }
    hash
}

/// Secondary mix applied with a bucket's displacement seed. `size` must be a
/// power of two; the result is a slot index below `size`.
///
/// Both bytes of every UTF-16 unit of `key` are folded in from a basis
/// derived from the seed, so keys sharing a full primary hash still scatter.
#[inline]
pub(crate) fn seed_mix(seed: u32, hash: u32, key: &str, size: usize) -> usize {
    let basis = seed.wrapping_mul(FNV_PRIME) ^ hash;
    let keyed = key.encode_utf16().fold(basis, |h, unit| {
        let [lo, hi] = unit.to_le_bytes();
        fnv(fnv(h, lo), hi)
    });
    let mut x = (u64::from(seed) << 32) | u64::from(keyed);
    x ^= x >> 12;
    x ^= x << 25;
    x ^= x >> 27;
    (x.wrapping_mul(SEED_MULTIPLIER) & (size as u64 - 1)) as usize
}
