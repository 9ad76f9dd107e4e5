// RISC-V Vector Extension (V), per-lane execution semantics
//
// VLEN is configurable (CpuConfig), ELEN is 32 or 64.
// 32 vector registers, each VLEN bits wide.
//
// Every entry point takes already-decoded operands and a Desc, iterates
// lanes 0..vl in order and never touches lanes at or beyond vl except
// where a mask-producing instruction zero-fills its tail.

use std::fmt;

use thiserror::Error;

use crate::memory::MemFault;

pub use config::Vtype;
pub use desc::Desc;
pub use regfile::VectorRegFile;

/// Selected element width
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sew {
    E8,
    E16,
    E32,
    E64,
}

impl Sew {
    /// Decode the vsew field, log2(SEW/8)
    pub fn from_vsew(vsew: u64) -> Option<Self> {
        match vsew {
            0 => Some(Sew::E8),
            1 => Some(Sew::E16),
            2 => Some(Sew::E32),
            3 => Some(Sew::E64),
            _ => None,
        }
    }

    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(Sew::E8),
            16 => Some(Sew::E16),
            32 => Some(Sew::E32),
            64 => Some(Sew::E64),
            _ => None,
        }
    }

    pub const fn vsew(self) -> u64 {
        self as u64
    }

    pub const fn bits(self) -> u32 {
        8 << self as u32
    }

    pub const fn bytes(self) -> usize {
        1 << self as usize
    }

    pub fn double(self) -> Option<Self> {
        Self::from_vsew(self.vsew() + 1)
    }
}

impl fmt::Display for Sew {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.bits())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VectorError {
    #[error(transparent)]
    Fault(#[from] MemFault),
    #[error("vector unit is in the vill state")]
    IllegalConfig,
    #[error("element width {0} is not supported by this operation")]
    UnsupportedSew(Sew),
    #[error("reserved rounding mode {0} in frm")]
    ReservedRoundingMode(u64),
}

/// Second source operand: a vector register group, or a scalar splatted
/// to every lane (vx/vf forms, and vi forms with the immediate already
/// extended to 64 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Src {
    V(usize),
    X(u64),
}

/// Run `$body` with `$t` bound to the lane type for `$sew`.
macro_rules! for_sew {
    ($sew:expr, $t:ident => $body:expr) => {
        match $sew {
            $crate::cpu::vector::Sew::E8 => {
                type $t = u8;
                $body
            }
            $crate::cpu::vector::Sew::E16 => {
                type $t = u16;
                $body
            }
            $crate::cpu::vector::Sew::E32 => {
                type $t = u32;
                $body
            }
            $crate::cpu::vector::Sew::E64 => {
                type $t = u64;
                $body
            }
        }
    };
}

/// Like `for_sew!` for widening/narrowing ops; SEW=64 has no wide partner.
macro_rules! for_wsew {
    ($sew:expr, $t:ident => $body:expr) => {
        match $sew {
            $crate::cpu::vector::Sew::E8 => {
                type $t = u8;
                Ok($body)
            }
            $crate::cpu::vector::Sew::E16 => {
                type $t = u16;
                Ok($body)
            }
            $crate::cpu::vector::Sew::E32 => {
                type $t = u32;
                Ok($body)
            }
            sew => Err($crate::cpu::vector::VectorError::UnsupportedSew(sew)),
        }
    };
}

/// Bind `$f` to the IEEE format for `$sew`; SEW=8 has none.
macro_rules! for_fsew {
    ($sew:expr, $f:ident => $body:expr) => {
        match $sew {
            $crate::cpu::vector::Sew::E16 => {
                type $f = ::half::f16;
                Ok($body)
            }
            $crate::cpu::vector::Sew::E32 => {
                type $f = f32;
                Ok($body)
            }
            $crate::cpu::vector::Sew::E64 => {
                type $f = f64;
                Ok($body)
            }
            sew => Err($crate::cpu::vector::VectorError::UnsupportedSew(sew)),
        }
    };
}

/// Bind a narrow format `$f` and its double-width format `$w`.
macro_rules! for_fwsew {
    ($sew:expr, $f:ident, $w:ident => $body:expr) => {
        match $sew {
            $crate::cpu::vector::Sew::E16 => {
                type $f = ::half::f16;
                type $w = f32;
                Ok($body)
            }
            $crate::cpu::vector::Sew::E32 => {
                type $f = f32;
                type $w = f64;
                Ok($body)
            }
            sew => Err($crate::cpu::vector::VectorError::UnsupportedSew(sew)),
        }
    };
}

pub(crate) use {for_fsew, for_fwsew, for_sew, for_wsew};

pub mod amo;
pub mod config;
pub mod desc;
pub mod elem;
pub mod fixed;
pub mod float;
pub mod int;
pub mod ldst;
pub mod mask;
pub mod permute;
pub mod reduce;
pub mod regfile;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sew_encodings() {
        assert_eq!(Sew::from_vsew(2), Some(Sew::E32));
        assert_eq!(Sew::from_vsew(4), None);
        assert_eq!(Sew::E16.bits(), 16);
        assert_eq!(Sew::E64.bytes(), 8);
        assert_eq!(Sew::E32.double(), Some(Sew::E64));
        assert_eq!(Sew::E64.double(), None);
        assert_eq!(Sew::from_bits(8), Some(Sew::E8));
        assert_eq!(Sew::E8.to_string(), "e8");
    }

    #[test]
    fn dispatch_binds_lane_type() {
        fn width(sew: Sew) -> u32 {
            for_sew!(sew, T => T::BITS)
        }
        assert_eq!(width(Sew::E16), 16);
        let r: Result<u32, VectorError> = for_fsew!(Sew::E8, F => std::mem::size_of::<F>() as u32);
        assert_eq!(r, Err(VectorError::UnsupportedSew(Sew::E8)));
    }
}
