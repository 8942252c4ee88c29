//! Bit addressing inside a CAN payload.
//!
//! Bits are numbered the DBC way: bit `n` is bit `n % 8` (0 = LSB) of byte `n / 8`.
//!
//! - Intel: the field occupies `[start, start + len - 1]` on that linear plane.
//! - Motorola: `start` is the MSB of the field and the field runs "sawtooth":
//!   towards bit 0 of the same byte, then on to bit 7 of the following byte.
//!   Mapping each bit to the MSB-first index `lin = (n & !7) + (7 - (n & 7))`
//!   turns the sawtooth into the contiguous run `[lin(start), lin(start) + len - 1]`.

use crate::types::errors::LayoutError;
use crate::types::signal::Endianness;

/// Largest payload handled by the model (CAN FD), in bytes.
pub const MAX_PAYLOAD_BYTES: usize = 64;

/// Widest raw value a signal may carry.
pub const MAX_SIGNAL_BITS: u16 = 64;

/// Maps a DBC bit number to its MSB-first linear index, and back (the map is an involution).
#[inline]
fn linearize(bit: usize) -> usize {
    (bit & !7) + (7 - (bit & 7))
}

/// Verify that (bit_start, bit_length) fits within a payload of `size` bytes.
/// Returns Ok(()) if the signal fits; Err(...) with the reason otherwise.
pub fn check_signal_fits(
    size: u8,
    bit_start: u16,
    bit_length: u16,
    endianness: Endianness,
) -> Result<(), LayoutError> {
    if bit_length == 0 {
        return Err(LayoutError::ZeroBitLength);
    }
    if bit_length > MAX_SIGNAL_BITS {
        return Err(LayoutError::TooLong { length: bit_length });
    }
    let total_bits: usize = (size as usize) * 8;

    match endianness {
        Endianness::Intel => {
            let start: usize = bit_start as usize;
            let end: usize = start + (bit_length as usize) - 1;
            if end < total_bits {
                Ok(())
            } else {
                Err(LayoutError::IntelOutOfBounds {
                    end,
                    total_bits,
                    size,
                })
            }
        }
        Endianness::Motorola => {
            let start: usize = bit_start as usize;
            if start >= total_bits {
                return Err(LayoutError::MotorolaStartOutOfBounds {
                    start,
                    total_bits,
                    size,
                });
            }
            let linearized_end: usize = linearize(start) + (bit_length as usize) - 1;
            if linearized_end >= total_bits {
                return Err(LayoutError::MotorolaEndOutOfBounds {
                    end: linearized_end,
                    total_bits,
                    size,
                });
            }
            Ok(())
        }
    }
}

/// Occupancy map of a 64-byte payload, one bit per payload bit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BitMask([u64; MAX_PAYLOAD_BYTES / 8]);

impl BitMask {
    /// Builds the mask of the bits covered by a signal.
    ///
    /// The layout must already have been checked with [`check_signal_fits`];
    /// bits that would fall outside the 64-byte plane are ignored.
    pub fn for_signal(bit_start: u16, bit_length: u16, endianness: Endianness) -> Self {
        let mut mask = BitMask::default();
        let length = bit_length as usize;
        match endianness {
            Endianness::Intel => {
                let start = bit_start as usize;
                for bit in start..start + length {
                    mask.set(bit);
                }
            }
            Endianness::Motorola => {
                let first = linearize(bit_start as usize);
                for lin in first..first + length {
                    mask.set(linearize(lin));
                }
            }
        }
        mask
    }

    #[inline]
    fn set(&mut self, bit: usize) {
        if let Some(word) = self.0.get_mut(bit / 64) {
            *word |= 1u64 << (bit % 64);
        }
    }

    /// Returns `true` if the given DBC bit number is occupied.
    #[inline]
    pub fn contains(&self, bit: u16) -> bool {
        let bit = bit as usize;
        self.0
            .get(bit / 64)
            .is_some_and(|word| word & (1u64 << (bit % 64)) != 0)
    }

    /// Number of occupied bits.
    pub fn count(&self) -> u32 {
        self.0.iter().map(|w| w.count_ones()).sum()
    }

    /// Lowest bit number occupied by both masks, if any.
    pub fn first_common(&self, other: &BitMask) -> Option<u16> {
        self.0
            .iter()
            .zip(other.0.iter())
            .enumerate()
            .find_map(|(i, (a, b))| {
                let both = a & b;
                (both != 0).then(|| (i * 64) as u16 + both.trailing_zeros() as u16)
            })
    }

    /// Adds every bit of `other` to this mask.
    pub fn merge(&mut self, other: &BitMask) {
        for (a, b) in self.0.iter_mut().zip(other.0.iter()) {
            *a |= b;
        }
    }
}
