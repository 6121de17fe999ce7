//! Incremental CRC-32 (IEEE 802.3).
//!
//! The reflected polynomial `0xEDB88320` is applied bit by bit. The state
//! carried between [`Crc32::update`] calls is the raw register, so the
//! ones'-complement bracketing happens exactly once per stream: on
//! [`Crc32::new`] and on [`Crc32::finalize`]. Feeding a byte sequence in
//! any number of chunks yields the same checksum as feeding it at once.

/// Reflected IEEE 802.3 polynomial.
pub const POLYNOMIAL: u32 = 0xEDB8_8320;

/// Running CRC-32 accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc32 {
    register: u32,
}

impl Crc32 {
    /// Starts a new checksum (the inverted zero state).
    pub fn new() -> Self {
        Self { register: !0 }
    }

    /// Folds `chunk` into the accumulator.
    pub fn update(&mut self, chunk: &[u8]) {
        let mut crc = self.register;
        for &byte in chunk {
            crc ^= u32::from(byte);
            for _ in 0..8 {
                let mask = (crc & 1).wrapping_neg();
                crc = (crc >> 1) ^ (POLYNOMIAL & mask);
            }
        }
        self.register = crc;
    }

    /// By-value variant of [`update`](Self::update) for folding.
    #[must_use]
    pub fn chain(mut self, chunk: &[u8]) -> Self {
        self.update(chunk);
        self
    }

    /// Returns the checksum of every byte folded in so far.
    pub fn finalize(self) -> u32 {
        !self.register
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes the CRC-32 of `data` in one call.
pub fn checksum(data: &[u8]) -> u32 {
    Crc32::new().chain(data).finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(checksum(b""), 0);
        assert_eq!(Crc32::new().finalize(), 0);
    }

    #[test]
    fn check_value() {
        assert_eq!(checksum(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn hello_value() {
        assert_eq!(checksum(b"HELLO"), 0xC144_6436);
    }

    #[test]
    fn matches_crc32fast() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i * 31 % 251) as u8).collect();
        let mut reference = crc32fast::Hasher::new();
        reference.update(&data);
        assert_eq!(checksum(&data), reference.finalize());
    }

    #[test]
    fn two_chunks_equal_concatenation() {
        let c1 = b"The quick brown fox ";
        let c2 = b"jumps over the lazy dog";
        let chunked = Crc32::new().chain(c1).chain(c2).finalize();
        assert_eq!(chunked, checksum(b"The quick brown fox jumps over the lazy dog"));
        assert_eq!(chunked, 0x414F_A339);
    }

    #[test]
    fn every_split_point_agrees() {
        let data: Vec<u8> = (0..=255u8).collect();
        let whole = checksum(&data);
        for split in 0..=data.len() {
            let (a, b) = data.split_at(split);
            assert_eq!(Crc32::new().chain(a).chain(b).finalize(), whole, "split at {split}");
        }
    }

    #[test]
    fn uneven_partitions_agree() {
        let data: Vec<u8> = (0..5_000u32).map(|i| (i ^ (i >> 3)) as u8).collect();
        let whole = checksum(&data);

        for step in [1usize, 2, 3, 7, 64, 4095, 4096, 4097] {
            let mut crc = Crc32::new();
            for chunk in data.chunks(step) {
                crc.update(chunk);
            }
            assert_eq!(crc.finalize(), whole, "chunk size {step}");
        }

        // Irregular sizes, including empty chunks.
        let sizes = [0usize, 1, 0, 13, 500, 2, 1024, 0, 3000];
        let mut crc = Crc32::new();
        let mut offset = 0;
        for size in sizes {
            let end = (offset + size).min(data.len());
            crc.update(&data[offset..end]);
            offset = end;
        }
        crc.update(&data[offset..]);
        assert_eq!(crc.finalize(), whole);
    }

    #[test]
    fn empty_updates_are_neutral() {
        let base = Crc32::new().chain(b"abc");
        assert_eq!(base.chain(b"").finalize(), base.finalize());
    }
}
