//! IEEE-754 binary16 ("half float") bit conversions.
//!
//! The wire format stores `GSHalf` as a raw 16-bit pattern; this module only
//! has to move between that pattern and `f32` for callers to do arithmetic
//! on it. No half-float crate appears anywhere in the corpus this workspace
//! is grounded on, so the conversion is hand-rolled bit math in the same
//! spirit as `FrameHeader`'s manual `to_be_bytes`/`from_be_bytes` field
//! accessors — specifically the widely-used ILM/OpenEXR `half` conversion,
//! the reference algorithm most codecs with no half-float dependency reach
//! for.

/// Converts an `f32` to its nearest IEEE-754 binary16 bit pattern
/// (round-to-nearest, ties-to-even on the mantissa).
#[must_use]
#[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
pub fn f32_to_bits(value: f32) -> u16 {
    let f = value.to_bits() as i32;
    let sign = (f >> 16) & 0x0000_8000;
    let mut exponent = ((f >> 23) & 0xff) - (127 - 15);
    let mut mantissa = f & 0x007f_ffff;

    if exponent <= 0 {
        if exponent < -10 {
            // Underflows to zero even as a half subnormal.
            return sign as u16;
        }
        mantissa |= 0x0080_0000; // restore the implicit leading 1
        let shift = 14 - exponent;
        let round_up = (mantissa >> (shift - 1)) & 1;
        mantissa = (mantissa >> shift) + round_up;
        return (sign | mantissa) as u16;
    }

    if exponent == 0xff - (127 - 15) {
        if mantissa == 0 {
            return (sign | 0x7c00) as u16; // infinity
        }
        mantissa >>= 13;
        let nonzero = i32::from(mantissa == 0);
        return (sign | 0x7c00 | mantissa | nonzero) as u16; // NaN, kept non-zero
    }

    // Round mantissa to 10 bits (13 bits dropped), ties-to-even.
    mantissa += 0x0fff + ((mantissa >> 13) & 1);
    if mantissa & 0x0080_0000 != 0 {
        // Rounding carried out of the mantissa into the exponent.
        mantissa = 0;
        exponent += 1;
    }

    if exponent > 30 {
        return (sign | 0x7c00) as u16; // overflow to infinity
    }

    (sign | (exponent << 10) | (mantissa >> 13)) as u16
}

/// Converts an IEEE-754 binary16 bit pattern to `f32` (exact; every `f16`
/// value, including subnormals, is exactly representable as `f32`).
#[must_use]
pub fn bits_to_f32(bits: u16) -> f32 {
    let sign: u32 = u32::from(bits & 0x8000) << 16;
    let mut exponent: i32 = i32::from((bits >> 10) & 0x1f);
    let mut mantissa: u32 = u32::from(bits & 0x03ff);

    if exponent == 0 {
        if mantissa == 0 {
            return f32::from_bits(sign);
        }
        while mantissa & 0x0400 == 0 {
            mantissa <<= 1;
            exponent -= 1;
        }
        exponent += 1;
        mantissa &= !0x0400;
    } else if exponent == 0x1f {
        #[allow(clippy::cast_sign_loss)]
        return f32::from_bits(sign | 0x7f80_0000 | (mantissa << 13));
    }

    let biased_exponent = (exponent + (127 - 15)) as u32;
    f32::from_bits(sign | (biased_exponent << 23) | (mantissa << 13))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn ipd_test_vector() {
        // §8 scenario 3: IPD 3.140625 must encode to half-float bits 0x4248.
        assert_eq!(f32_to_bits(3.140625), 0x4248);
        assert_eq!(bits_to_f32(0x4248), 3.140625);
    }

    #[test]
    fn zero_round_trips() {
        assert_eq!(f32_to_bits(0.0), 0x0000);
        assert_eq!(f32_to_bits(-0.0), 0x8000);
        assert_eq!(bits_to_f32(0x0000), 0.0);
    }

    #[test]
    fn negative_round_trips() {
        let bits = f32_to_bits(-30.0);
        assert_eq!(bits_to_f32(bits), -30.0);
    }

    #[test]
    fn smallest_subnormal_round_trips() {
        assert_eq!(bits_to_f32(0x0001), 2f32.powi(-24));
        assert_eq!(f32_to_bits(2f32.powi(-24)), 0x0001);
    }

    #[test]
    fn overflow_saturates_to_infinity() {
        assert_eq!(f32_to_bits(1.0e9), 0x7c00);
        assert_eq!(f32_to_bits(-1.0e9), 0xfc00);
    }

    proptest! {
        #[test]
        fn round_trips_within_half_precision(value in -1000.0f32..1000.0f32) {
            let bits = f32_to_bits(value);
            let back = bits_to_f32(bits);
            // Half precision has ~3 significant decimal digits; allow generous
            // relative error rather than asserting exact equality.
            let scale = value.abs().max(1.0);
            prop_assert!((back - value).abs() <= scale * 0.01);
        }

        #[test]
        fn exact_half_values_round_trip_exactly(bits in any::<u16>()) {
            // Skip NaN patterns, which are not required to compare equal.
            let exp = (bits >> 10) & 0x1f;
            let mantissa = bits & 0x03ff;
            prop_assume!(!(exp == 0x1f && mantissa != 0));

            let value = bits_to_f32(bits);
            prop_assert_eq!(f32_to_bits(value), bits);
        }
    }
}
