//! Wire-compact timestamps and their expansion back to full epoch time.
//!
//! Only the low 16 bits of Unix epoch milliseconds travel on the wire
//! (`time16`). [`expand_time16`] reconstructs a full [`DateTimeMs`] from one
//! of those values plus the decoder's own wall clock, per §4.1's expansion
//! rule — no teacher analog exists for this (the teacher carries a raw
//! 64-bit `hlc_timestamp` with no wire compression), so this follows the
//! specification's literal rule directly.

/// A fully-expanded Unix epoch timestamp, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DateTimeMs(pub u64);

impl DateTimeMs {
    /// The low 16 bits of this timestamp, as carried on the wire.
    #[must_use]
    pub fn to_time16(self) -> u16 {
        (self.0 & 0xffff) as u16
    }
}

/// One step below a `time16` wraparound period (2^16 ms, ~65.5 s); the
/// expansion rule assumes no update is older than this when first decoded.
pub const TIME16_PERIOD_MS: u64 = 1 << 16;

/// Reconstructs a full epoch timestamp from a wire `time16` and the
/// decoder's current wall-clock time.
///
/// Overwrites the low 16 bits of `now` with `time16`; if that lands in the
/// future relative to `now`, subtracts one `time16` period so the result
/// falls in the recent past instead.
#[must_use]
pub fn expand_time16(time16: u16, now_ms: u64) -> DateTimeMs {
    let candidate = (now_ms & !0xffff) | u64::from(time16);
    if candidate > now_ms {
        DateTimeMs(candidate.saturating_sub(TIME16_PERIOD_MS))
    } else {
        DateTimeMs(candidate)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn exact_low_bits_expand_unchanged() {
        let now = 1_700_000_123_456u64;
        let expanded = expand_time16((now & 0xffff) as u16, now);
        assert_eq!(expanded, DateTimeMs(now));
    }

    #[test]
    fn recent_past_expands_correctly() {
        let now = 1_700_000_123_456u64;
        let past = now - 5_000;
        let expanded = expand_time16((past & 0xffff) as u16, now);
        assert_eq!(expanded, DateTimeMs(past));
    }

    proptest! {
        #[test]
        fn within_one_period_round_trips_within_1ms(offset_ms in 0u64..TIME16_PERIOD_MS, now_ms in TIME16_PERIOD_MS..u64::MAX / 2) {
            let t = now_ms - offset_ms;
            let expanded = expand_time16((t & 0xffff) as u16, now_ms);
            prop_assert!(expanded.0.abs_diff(t) <= 1);
        }
    }
}
