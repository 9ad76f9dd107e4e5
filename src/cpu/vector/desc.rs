//! Packed instruction descriptor.
//!
//! The decode layer builds one [`Desc`] per instruction; every lane routine
//! reads it and never changes it. The packed `u32` form is
//!
//! ```text
//!  31   21 20        16 15  12 11 10   7 6   4 3    1 0
//! | 0     | log2 bytes | 0    | WD|  NF  | SEW | LMUL | VM |
//! ```
//!
//! with LMUL a 3-bit two's complement exponent, SEW stored as log2(SEW/8)
//! and the register group size stored as log2 of its byte length.

use thiserror::Error;

use super::Sew;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DescError {
    #[error("reserved LMUL encoding {0:#b}")]
    ReservedLmul(u32),
    #[error("reserved SEW encoding {0:#b}")]
    ReservedSew(u32),
    #[error("NF {0} out of range 1..=8")]
    Nf(u32),
    #[error("EMUL 2^{0} outside 1/8..8")]
    Emul(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Desc {
    /// Unmasked: every lane below vl is active
    pub vm: bool,
    /// log2(LMUL), -3..=3
    pub lmul: i8,
    pub sew: Sew,
    /// Segment field count
    pub nf: u32,
    /// AMO write-back of the old memory value
    pub wd: bool,
    /// Bytes in one register group
    pub group_bytes: u32,
}

impl Desc {
    /// Unmasked descriptor with NF=1 for the given SEW/LMUL.
    pub fn new(sew: Sew, lmul: i8, vlenb: usize) -> Self {
        let group_bytes = if lmul >= 0 {
            vlenb << lmul
        } else {
            vlenb >> -lmul
        };
        Self {
            vm: true,
            lmul,
            sew,
            nf: 1,
            wd: false,
            group_bytes: group_bytes as u32,
        }
    }

    /// Predicate lanes by v0.
    pub fn masked(mut self) -> Self {
        self.vm = false;
        self
    }

    pub fn with_nf(mut self, nf: u32) -> Self {
        self.nf = nf;
        self
    }

    pub fn with_wd(mut self) -> Self {
        self.wd = true;
        self
    }

    /// Same element count, different element width (EMUL = EEW/SEW * LMUL).
    pub fn with_eew(self, eew: Sew) -> Result<Self, DescError> {
        let shift = eew.vsew() as i32 - self.sew.vsew() as i32;
        let emul = self.lmul as i32 + shift;
        if !(-3..=3).contains(&emul) {
            return Err(DescError::Emul(emul));
        }
        let group_bytes = if shift >= 0 {
            self.group_bytes << shift
        } else {
            self.group_bytes >> -shift
        };
        Ok(Self {
            sew: eew,
            lmul: emul as i8,
            group_bytes,
            ..self
        })
    }

    /// Maximum lanes in one register group
    pub fn vlmax(&self) -> usize {
        self.group_bytes as usize / self.sew.bytes()
    }

    pub fn encode(&self) -> u32 {
        (self.vm as u32)
            | ((self.lmul as u32) & 7) << 1
            | (self.sew.vsew() as u32) << 4
            | (self.nf & 0xF) << 7
            | (self.wd as u32) << 11
            | self.group_bytes.trailing_zeros() << 16
    }

    pub fn decode(raw: u32) -> Result<Self, DescError> {
        let lmul_bits = (raw >> 1) & 7;
        if lmul_bits == 4 {
            return Err(DescError::ReservedLmul(lmul_bits));
        }
        // sign-extend the 3-bit field
        let lmul = ((lmul_bits << 5) as u8 as i8) >> 5;
        let sew_bits = (raw >> 4) & 7;
        let sew = Sew::from_vsew(sew_bits as u64).ok_or(DescError::ReservedSew(sew_bits))?;
        let nf = (raw >> 7) & 0xF;
        if nf == 0 || nf > 8 {
            return Err(DescError::Nf(nf));
        }
        Ok(Self {
            vm: raw & 1 != 0,
            lmul,
            sew,
            nf,
            wd: raw & (1 << 11) != 0,
            group_bytes: 1 << ((raw >> 16) & 0x1F),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_bytes_follow_lmul() {
        assert_eq!(Desc::new(Sew::E32, 0, 16).group_bytes, 16);
        assert_eq!(Desc::new(Sew::E32, 3, 16).group_bytes, 128);
        assert_eq!(Desc::new(Sew::E8, -3, 16).group_bytes, 2);
        assert_eq!(Desc::new(Sew::E16, 1, 16).vlmax(), 16);
    }

    #[test]
    fn encode_decode() {
        let d = Desc::new(Sew::E16, -2, 64).masked().with_nf(3).with_wd();
        let raw = d.encode();
        assert_eq!(raw & 1, 0);
        assert_eq!(Desc::decode(raw), Ok(d));
        let d = Desc::new(Sew::E64, 3, 32);
        assert_eq!(Desc::decode(d.encode()), Ok(d));
    }

    #[test]
    fn decode_rejects_reserved() {
        assert_eq!(Desc::decode(4 << 1 | 1 << 7), Err(DescError::ReservedLmul(4)));
        assert_eq!(Desc::decode(5 << 4 | 1 << 7), Err(DescError::ReservedSew(5)));
        assert_eq!(Desc::decode(0), Err(DescError::Nf(0)));
        assert_eq!(Desc::decode(9 << 7), Err(DescError::Nf(9)));
    }

    #[test]
    fn eew_keeps_lane_count() {
        let d = Desc::new(Sew::E32, 1, 16);
        let e = d.with_eew(Sew::E8).unwrap();
        assert_eq!(e.vlmax(), d.vlmax());
        assert_eq!(e.lmul, -1);
        let w = d.with_eew(Sew::E64).unwrap();
        assert_eq!(w.lmul, 2);
        assert_eq!(w.vlmax(), 8);
    }

    #[test]
    fn eew_rejects_emul_out_of_range() {
        assert_eq!(
            Desc::new(Sew::E8, 3, 16).with_eew(Sew::E64),
            Err(DescError::Emul(6))
        );
        assert_eq!(
            Desc::new(Sew::E64, -1, 16).with_eew(Sew::E8),
            Err(DescError::Emul(-4))
        );
        let top = Desc::new(Sew::E8, 1, 16).with_eew(Sew::E32).unwrap();
        assert_eq!((top.lmul, top.vlmax()), (3, 32));
    }
}
