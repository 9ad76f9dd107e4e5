// Fixed-point rounding and saturation

use super::elem::{Element, Widen};
use super::int::{binary, narrowing, widening};
use super::{for_sew, for_wsew, Desc, Src, VectorError};
use crate::cpu::Cpu;

/// Fixed-point rounding mode (vxrm)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vxrm {
    /// round-to-nearest-up
    Rnu = 0,
    /// round-to-nearest-even
    Rne = 1,
    /// round-down (truncate)
    Rdn = 2,
    /// round-to-odd
    Rod = 3,
}

impl Vxrm {
    pub fn from_bits(bits: u64) -> Self {
        match bits & 3 {
            0 => Vxrm::Rnu,
            1 => Vxrm::Rne,
            2 => Vxrm::Rdn,
            _ => Vxrm::Rod,
        }
    }
}

/// Rounding mode and saturation flag for one instruction's lane loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedState {
    pub vxrm: Vxrm,
    /// Set when any lane saturated
    pub sat: bool,
}

impl FixedState {
    pub fn new(vxrm: Vxrm) -> Self {
        Self { vxrm, sat: false }
    }

    #[inline]
    fn round(&self, v: u128, shift: u32) -> u128 {
        get_round(self.vxrm, v, shift) as u128
    }
}

/// Rounding increment for `v >> shift` under `vxrm`.
pub fn get_round(vxrm: Vxrm, v: u128, shift: u32) -> u64 {
    if shift == 0 || shift > 127 {
        return 0;
    }
    let d = (v >> shift) & 1 != 0; // lsb of the result
    let d1 = (v >> (shift - 1)) & 1 != 0; // first bit shifted out
    let below = v & ((1u128 << (shift - 1)) - 1) != 0; // bits under d1
    match vxrm {
        Vxrm::Rnu => d1 as u64,
        Vxrm::Rne => (d1 && (below || d)) as u64,
        Vxrm::Rdn => 0,
        Vxrm::Rod => (!d && (d1 || below)) as u64,
    }
}

// ============================================================================
// Saturating arithmetic helpers
// ============================================================================

fn clamp_signed<T: Element>(st: &mut FixedState, v: i128) -> T {
    if v > T::smax() as i128 {
        st.sat = true;
        T::from_i64(T::smax())
    } else if v < T::smin() as i128 {
        st.sat = true;
        T::from_i64(T::smin())
    } else {
        T::from_i64(v as i64)
    }
}

fn clamp_unsigned<T: Element>(st: &mut FixedState, v: u128) -> T {
    if v > T::umax() as u128 {
        st.sat = true;
        T::from_u64(T::umax())
    } else {
        T::from_u64(v as u64)
    }
}

/// Saturating unsigned add
pub fn saddu<T: Element>(st: &mut FixedState, a: T, b: T) -> T {
    clamp_unsigned(st, a.to_u64() as u128 + b.to_u64() as u128)
}

/// Saturating signed add
pub fn sadd<T: Element>(st: &mut FixedState, a: T, b: T) -> T {
    clamp_signed(st, a.to_i64() as i128 + b.to_i64() as i128)
}

/// Saturating unsigned subtract
pub fn ssubu<T: Element>(st: &mut FixedState, a: T, b: T) -> T {
    if a < b {
        st.sat = true;
        T::from_u64(0)
    } else {
        T::from_u64(a.to_u64() - b.to_u64())
    }
}

/// Saturating signed subtract
pub fn ssub<T: Element>(st: &mut FixedState, a: T, b: T) -> T {
    clamp_signed(st, a.to_i64() as i128 - b.to_i64() as i128)
}

/// Halve an exact sum or difference with rounding.
fn average<T: Element>(st: &FixedState, res: i128) -> T {
    let r = (res >> 1) + st.round(res as u128, 1) as i128;
    T::from_u64(r as u64)
}

/// vsmul: clip(round(a * b >> (SEW-1)))
pub fn smul<T: Element>(st: &mut FixedState, a: T, b: T) -> T {
    let prod = a.to_i64() as i128 * b.to_i64() as i128;
    let shift = T::BITS - 1;
    let res = (prod >> shift) + st.round(prod as u128, shift) as i128;
    clamp_signed(st, res)
}

/// vssrl: round(a >> (b & (SEW-1))), logical
pub fn ssrl<T: Element>(st: &FixedState, a: T, b: T) -> T {
    let shift = (b.to_u64() & (T::BITS as u64 - 1)) as u32;
    let v = a.to_u64() as u128;
    T::from_u64(((v >> shift) + st.round(v, shift)) as u64)
}

/// vssra: round(a >> (b & (SEW-1))), arithmetic
pub fn ssra<T: Element>(st: &FixedState, a: T, b: T) -> T {
    let shift = (b.to_u64() & (T::BITS as u64 - 1)) as u32;
    let v = a.to_i64() as i128;
    T::from_u64(((v >> shift) + st.round(v as u128, shift) as i128) as u64)
}

/// vnclipu: clip(round(2*SEW a >> (b & (2*SEW-1)))), unsigned
pub fn nclipu<T: Widen>(st: &mut FixedState, a: T::Wide, b: T) -> T {
    let shift = (b.to_u64() & (2 * T::BITS as u64 - 1)) as u32;
    let v = a.to_u64() as u128;
    let res = (v >> shift) + st.round(v, shift);
    clamp_unsigned(st, res)
}

/// vnclip: clip(round(2*SEW a >> (b & (2*SEW-1)))), signed
pub fn nclip<T: Widen>(st: &mut FixedState, a: T::Wide, b: T) -> T {
    let shift = (b.to_u64() & (2 * T::BITS as u64 - 1)) as u32;
    let v = a.to_i64() as i128;
    let res = (v >> shift) + st.round(v as u128, shift) as i128;
    clamp_signed(st, res)
}

/// Same-width fixed-point operations, as op(vs2, vs1/rs1/imm)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedOp {
    Saddu,
    Sadd,
    Ssubu,
    Ssub,
    Aaddu,
    Aadd,
    Asubu,
    Asub,
    Smul,
    Ssrl,
    Ssra,
}

pub fn fixed_op<T: Element>(st: &mut FixedState, op: FixedOp, a: T, b: T) -> T {
    let (ua, ub) = (a.to_u64() as i128, b.to_u64() as i128);
    let (sa, sb) = (a.to_i64() as i128, b.to_i64() as i128);
    match op {
        FixedOp::Saddu => saddu(st, a, b),
        FixedOp::Sadd => sadd(st, a, b),
        FixedOp::Ssubu => ssubu(st, a, b),
        FixedOp::Ssub => ssub(st, a, b),
        FixedOp::Aaddu => average(st, ua + ub),
        FixedOp::Aadd => average(st, sa + sb),
        FixedOp::Asubu => average(st, ua - ub),
        FixedOp::Asub => average(st, sa - sb),
        FixedOp::Smul => smul(st, a, b),
        FixedOp::Ssrl => ssrl(st, a, b),
        FixedOp::Ssra => ssra(st, a, b),
    }
}

/// Widening saturating scaled multiply-add, 2*SEW vd = sat(vd ± round(vs1*vs2 >> SEW/2))
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WsMaccOp {
    Maccu,
    Macc,
    /// signed vs1, unsigned vs2
    Maccsu,
    /// unsigned rs1, signed vs2
    Maccus,
}

fn wsmacc<T: Widen>(st: &mut FixedState, op: WsMaccOp, a: T, b: T, c: T::Wide) -> T::Wide {
    let shift = T::BITS / 2;
    let prod: i128 = match op {
        WsMaccOp::Maccu => a.to_u64() as i128 * b.to_u64() as i128,
        WsMaccOp::Macc => a.to_i64() as i128 * b.to_i64() as i128,
        WsMaccOp::Maccsu => a.to_u64() as i128 * b.to_i64() as i128,
        WsMaccOp::Maccus => a.to_i64() as i128 * b.to_u64() as i128,
    };
    let res = (prod >> shift) + st.round(prod as u128, shift) as i128;
    let res = <T::Wide as Element>::from_u64(res as u64);
    match op {
        WsMaccOp::Maccu => saddu(st, c, res),
        WsMaccOp::Macc => sadd(st, c, res),
        WsMaccOp::Maccsu | WsMaccOp::Maccus => ssub(st, c, res),
    }
}

impl Cpu {
    /// vsaddu/vsadd/vssubu/vssub/vaaddu/vaadd/vasubu/vasub/vsmul/vssrl/vssra
    pub fn vfixed(&mut self, op: FixedOp, vd: usize, vs2: usize, src: Src, desc: &Desc) {
        let vl = self.vl();
        let mut st = self.fixed_state();
        for_sew!(desc.sew, T => binary::<T>(&mut self.vregs, vl, desc, vd, vs2, src, |a, b| {
            fixed_op(&mut st, op, a, b)
        }));
        self.commit_fixed(st);
    }

    /// vwsmaccu/vwsmacc/vwsmaccsu/vwsmaccus; `src` is vs1 or rs1
    pub fn vwsmacc(
        &mut self,
        op: WsMaccOp,
        vd: usize,
        vs2: usize,
        src: Src,
        desc: &Desc,
    ) -> Result<(), VectorError> {
        let vl = self.vl();
        let mut st = self.fixed_state();
        for_wsew!(desc.sew, T => widening::<T>(&mut self.vregs, vl, desc, vd, vs2, src, |s2, s1, d| {
            wsmacc(&mut st, op, s2, s1, d)
        }))?;
        self.commit_fixed(st);
        Ok(())
    }

    /// vnclipu/vnclip: SEW vd = clip(round(2*SEW vs2 >> src))
    pub fn vnclip(
        &mut self,
        signed: bool,
        vd: usize,
        vs2: usize,
        src: Src,
        desc: &Desc,
    ) -> Result<(), VectorError> {
        let vl = self.vl();
        let mut st = self.fixed_state();
        for_wsew!(desc.sew, T => narrowing::<T>(&mut self.vregs, vl, desc, vd, vs2, src, |a, b| {
            if signed {
                nclip::<T>(&mut st, a, b)
            } else {
                nclipu::<T>(&mut st, a, b)
            }
        }))?;
        self.commit_fixed(st);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::csr;

    fn st(vxrm: Vxrm) -> FixedState {
        FixedState::new(vxrm)
    }

    #[test]
    fn rounding_modes() {
        // 0b1011 >> 2: d=0, d1=1, below=1
        assert_eq!(get_round(Vxrm::Rnu, 0b1011, 2), 1);
        assert_eq!(get_round(Vxrm::Rne, 0b1011, 2), 1);
        assert_eq!(get_round(Vxrm::Rdn, 0b1011, 2), 0);
        assert_eq!(get_round(Vxrm::Rod, 0b1011, 2), 1);
        // exact ties 0b0110 >> 2 and 0b0010 >> 2 round to even
        assert_eq!(get_round(Vxrm::Rne, 0b0110, 2), 1);
        assert_eq!(get_round(Vxrm::Rne, 0b0010, 2), 0);
        // already odd: rod adds nothing
        assert_eq!(get_round(Vxrm::Rod, 0b0101, 2), 0);
        assert_eq!(get_round(Vxrm::Rnu, 0xFF, 0), 0);
    }

    #[test]
    fn saturating_add_sub() {
        let mut s = st(Vxrm::Rnu);
        assert_eq!(saddu(&mut s, 0xFFu8, 1), 0xFF);
        assert!(s.sat);
        let mut s = st(Vxrm::Rnu);
        assert_eq!(sadd(&mut s, 100u8, 100), 127);
        assert!(s.sat);
        let mut s = st(Vxrm::Rnu);
        assert_eq!(sadd(&mut s, 0x80u8, 0xFF), 0x80);
        assert!(s.sat);
        let mut s = st(Vxrm::Rnu);
        assert_eq!(ssubu(&mut s, 1u16, 2), 0);
        assert!(s.sat);
        let mut s = st(Vxrm::Rnu);
        assert_eq!(ssub(&mut s, i64::MIN as u64, 1), i64::MIN as u64);
        assert!(s.sat);
        let mut s = st(Vxrm::Rnu);
        assert_eq!(sadd(&mut s, 1u32, 2), 3);
        assert!(!s.sat);
    }

    #[test]
    fn averaging() {
        let mut s = st(Vxrm::Rnu);
        assert_eq!(fixed_op(&mut s, FixedOp::Aadd, 0x7Fu8, 0x7F), 0x7F);
        assert_eq!(fixed_op(&mut s, FixedOp::Aadd, 1u8, 2), 2);
        assert_eq!(fixed_op(&mut s, FixedOp::Aaddu, 0xFFu8, 0xFF), 0xFF);
        // -127.5 rounds up
        assert_eq!(fixed_op(&mut s, FixedOp::Asub, 0x80u8, 0x7F), 0x81);
        assert_eq!(fixed_op(&mut s, FixedOp::Aadd, i64::MAX as u64, i64::MAX as u64), i64::MAX as u64);
        let mut s = st(Vxrm::Rdn);
        assert_eq!(fixed_op(&mut s, FixedOp::Aadd, 1u8, 2), 1);
        assert_eq!(fixed_op(&mut s, FixedOp::Asubu, 0u8, 1), 0xFF);
        assert!(!s.sat);
    }

    #[test]
    fn fractional_multiply() {
        let mut s = st(Vxrm::Rnu);
        // -1.0 * -1.0 saturates
        assert_eq!(smul(&mut s, 0x80u8, 0x80), 0x7F);
        assert!(s.sat);
        let mut s = st(Vxrm::Rnu);
        // 0.5 * 0.5 = 0.25
        assert_eq!(smul(&mut s, 0x40u8, 0x40), 0x20);
        assert_eq!(smul(&mut s, i64::MIN as u64, i64::MIN as u64), i64::MAX as u64);
        assert!(s.sat);
    }

    #[test]
    fn scaling_shifts() {
        let s = st(Vxrm::Rnu);
        assert_eq!(ssrl(&s, 0xFFu8, 1), 0x80);
        assert_eq!(ssra(&s, 0xFFu8, 1), 0);
        assert_eq!(ssra(&s, 0xF0u8, 4 + 8), 0xFF);
        let s = st(Vxrm::Rdn);
        assert_eq!(ssra(&s, 0xFFu8, 1), 0xFF);
    }

    #[test]
    fn narrowing_clip() {
        let mut s = st(Vxrm::Rnu);
        assert_eq!(nclipu::<u8>(&mut s, 0x1FE, 1), 0xFF);
        assert!(!s.sat);
        assert_eq!(nclipu::<u8>(&mut s, 0x1FF, 0), 0xFF);
        assert!(s.sat);
        let mut s = st(Vxrm::Rnu);
        assert_eq!(nclip::<u8>(&mut s, (-300i16) as u16, 0), 0x80);
        assert!(s.sat);
        let mut s = st(Vxrm::Rnu);
        assert_eq!(nclip::<u8>(&mut s, (-3i16) as u16, 1), (-1i8) as u8);
        assert!(!s.sat);
    }

    #[test]
    fn widening_scaled_macc() {
        let mut s = st(Vxrm::Rnu);
        // 0xFF*0xFF = 0xFE01, >>4 = 0xFE0 (+0)
        assert_eq!(wsmacc::<u8>(&mut s, WsMaccOp::Maccu, 0xFF, 0xFF, 0x10), 0xFF0);
        assert_eq!(wsmacc::<u8>(&mut s, WsMaccOp::Maccu, 0xFF, 0xFF, 0xFFFF), 0xFFFF);
        assert!(s.sat);
        let mut s = st(Vxrm::Rnu);
        assert_eq!(wsmacc::<u8>(&mut s, WsMaccOp::Macc, 0xF0, 0x10, 0), (-16i16) as u16);
        assert_eq!(wsmacc::<u8>(&mut s, WsMaccOp::Maccsu, 0x10, 0x10, 100), 84);
        assert!(!s.sat);
    }

    #[test]
    fn vxsat_is_sticky() {
        let mut cpu = Cpu::new();
        cpu.vsetvl(2, 0);
        let desc = cpu.desc().unwrap();
        cpu.vregs.write::<u8>(2, 0, 0xFF);
        cpu.vfixed(FixedOp::Saddu, 1, 2, Src::X(1), &desc);
        assert_eq!(cpu.csrs.read(csr::VXSAT), 1);
        cpu.vregs.write::<u8>(2, 0, 1);
        cpu.vregs.write::<u8>(2, 1, 1);
        cpu.vfixed(FixedOp::Saddu, 1, 2, Src::X(1), &desc);
        assert_eq!(cpu.vregs.read::<u8>(1, 0), 2);
        assert_eq!(cpu.csrs.read(csr::VXSAT), 1);
    }

    #[test]
    fn vxrm_drives_vector_ops() {
        let mut cpu = Cpu::new();
        cpu.vsetvl(1, 0);
        let desc = cpu.desc().unwrap();
        cpu.vregs.write::<u8>(2, 0, 3);
        cpu.csrs.write(csr::VXRM, Vxrm::Rdn as u64);
        cpu.vfixed(FixedOp::Ssrl, 1, 2, Src::X(1), &desc);
        assert_eq!(cpu.vregs.read::<u8>(1, 0), 1);
        cpu.csrs.write(csr::VXRM, Vxrm::Rnu as u64);
        cpu.vfixed(FixedOp::Ssrl, 1, 2, Src::X(1), &desc);
        assert_eq!(cpu.vregs.read::<u8>(1, 0), 2);
    }
}
