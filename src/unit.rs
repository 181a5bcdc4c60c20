use std::mem;

use crate::block::Header;

/// Size in bytes of one allocation unit.
///
/// Every block in the arena, free or allocated, spans a whole number of
/// units, and every unit boundary satisfies the platform's maximum natural
/// alignment. The unit size equals the free-block header size, so the header
/// of any block occupies exactly its first unit.
pub const UNIT_SIZE: usize = mem::size_of::<Header>();

/// Rounds `$value` up to the next multiple of `$align`.
///
/// `$align` must be a power of two.
///
/// # Examples
///
/// ```rust
/// use varalloc::round_up;
///
/// assert_eq!(round_up!(13, 16), 16);
/// assert_eq!(round_up!(16, 16), 16);
/// assert_eq!(round_up!(17, 16), 32);
/// ```
#[macro_export]
macro_rules! round_up {
  ($value:expr, $align:expr) => {
    ($value + $align - 1) & !($align - 1)
  };
}

/// Number of whole units needed to hold `bytes` of payload.
///
/// Zero-byte requests still consume one payload unit so that every
/// allocation owns at least one addressable unit after its header.
pub const fn units_for(bytes: usize) -> usize {
  let bytes = if bytes == 0 { 1 } else { bytes };
  round_up!(bytes, UNIT_SIZE) / UNIT_SIZE
}

/// Bytes spanned by `units` whole units.
pub const fn units_to_bytes(units: usize) -> usize {
  units * UNIT_SIZE
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn round_up_covers_every_size_in_each_unit() {
    for i in 0..10 {
      let sizes = (UNIT_SIZE * i + 1)..=(UNIT_SIZE * (i + 1));
      let expected = UNIT_SIZE * (i + 1);

      for size in sizes {
        assert_eq!(expected, round_up!(size, UNIT_SIZE));
        assert_eq!(i + 1, units_for(size));
      }
    }
  }

  #[test]
  fn zero_bytes_still_needs_one_unit() {
    assert_eq!(units_for(0), 1);
  }

  #[test]
  fn units_to_bytes_inverts_whole_units() {
    for units in 1..8 {
      assert_eq!(units_for(units_to_bytes(units)), units);
    }
  }
}
