use std::fmt::Debug;

use super::Sew;

/// An unsigned integer type holding one lane at a fixed element width.
///
/// Signed views are derived by sign-extending from `BITS`, so every
/// operation can be written once over `u64`/`i64`/`i128` arithmetic and
/// truncated back with `from_u64`.
pub trait Element: Copy + Default + Eq + Ord + Debug + 'static {
    const SEW: Sew;
    const BITS: u32;
    const BYTES: usize;

    /// Truncate to the element width
    fn from_u64(v: u64) -> Self;
    /// Zero-extend
    fn to_u64(self) -> u64;
    fn from_le_slice(b: &[u8]) -> Self;
    fn write_le(self, out: &mut [u8]);

    fn from_i64(v: i64) -> Self {
        Self::from_u64(v as u64)
    }

    /// Sign-extend
    fn to_i64(self) -> i64 {
        let sh = 64 - Self::BITS;
        ((self.to_u64() << sh) as i64) >> sh
    }

    fn umax() -> u64 {
        u64::MAX >> (64 - Self::BITS)
    }

    fn smax() -> i64 {
        (Self::umax() >> 1) as i64
    }

    fn smin() -> i64 {
        -Self::smax() - 1
    }
}

macro_rules! impl_element {
    ($t:ty, $sew:expr) => {
        impl Element for $t {
            const SEW: Sew = $sew;
            const BITS: u32 = <$t>::BITS;
            const BYTES: usize = std::mem::size_of::<$t>();

            #[inline]
            fn from_u64(v: u64) -> Self {
                v as $t
            }
            #[inline]
            fn to_u64(self) -> u64 {
                self as u64
            }
            #[inline]
            fn from_le_slice(b: &[u8]) -> Self {
                let mut buf = [0u8; std::mem::size_of::<$t>()];
                buf.copy_from_slice(&b[..std::mem::size_of::<$t>()]);
                <$t>::from_le_bytes(buf)
            }
            #[inline]
            fn write_le(self, out: &mut [u8]) {
                out[..std::mem::size_of::<$t>()].copy_from_slice(&self.to_le_bytes());
            }
        }
    };
}

impl_element!(u8, Sew::E8);
impl_element!(u16, Sew::E16);
impl_element!(u32, Sew::E32);
impl_element!(u64, Sew::E64);

/// Element types with a double-width partner, for widening and narrowing ops.
pub trait Widen: Element {
    type Wide: Element;

    fn zext(self) -> Self::Wide {
        Self::Wide::from_u64(self.to_u64())
    }

    fn sext(self) -> Self::Wide {
        Self::Wide::from_i64(self.to_i64())
    }

    fn narrow(w: Self::Wide) -> Self {
        Self::from_u64(w.to_u64())
    }
}

impl Widen for u8 {
    type Wide = u16;
}
impl Widen for u16 {
    type Wide = u32;
}
impl Widen for u32 {
    type Wide = u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_views() {
        assert_eq!(0x80u8.to_i64(), -128);
        assert_eq!(0xFFFFu16.to_i64(), -1);
        assert_eq!(0x7FFF_FFFFu32.to_i64(), i32::MAX as i64);
        assert_eq!(u64::MAX.to_i64(), -1);
        assert_eq!(u8::from_i64(-1), 0xFF);
    }

    #[test]
    fn limits() {
        assert_eq!(u8::umax(), 0xFF);
        assert_eq!(u16::smax(), i16::MAX as i64);
        assert_eq!(u32::smin(), i32::MIN as i64);
        assert_eq!(u64::smin(), i64::MIN);
        assert_eq!(u64::umax(), u64::MAX);
    }

    #[test]
    fn widen_extends() {
        assert_eq!(0x80u8.sext(), 0xFF80u16);
        assert_eq!(0x80u8.zext(), 0x0080u16);
        assert_eq!(u16::narrow(0x1234_5678), 0x5678);
    }

    #[test]
    fn le_codec() {
        let mut buf = [0u8; 4];
        0x1122_3344u32.write_le(&mut buf);
        assert_eq!(buf, [0x44, 0x33, 0x22, 0x11]);
        assert_eq!(u16::from_le_slice(&buf[1..]), 0x2233);
    }
}
