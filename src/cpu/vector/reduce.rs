// Reductions: vd[0] = fold(vs1[0], active vs2[0..vl]) in lane order

use super::elem::{Element, Widen};
use super::int::{int_op, IntOp};
use super::{for_fsew, for_fwsew, for_sew, for_wsew, Desc, VectorError};
use crate::cpu::fpu::{self, Float};
use crate::cpu::Cpu;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedOp {
    Sum,
    And,
    Or,
    Xor,
    Min,
    Minu,
    Max,
    Maxu,
}

impl RedOp {
    fn int_op(self) -> IntOp {
        match self {
            RedOp::Sum => IntOp::Add,
            RedOp::And => IntOp::And,
            RedOp::Or => IntOp::Or,
            RedOp::Xor => IntOp::Xor,
            RedOp::Min => IntOp::Min,
            RedOp::Minu => IntOp::Minu,
            RedOp::Max => IntOp::Max,
            RedOp::Maxu => IntOp::Maxu,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FRedOp {
    /// Ordered sum
    Sum,
    Min,
    Max,
}

impl Cpu {
    /// vredsum/vredand/vredor/vredxor/vredmin(u)/vredmax(u).vs
    pub fn vred(&mut self, op: RedOp, vd: usize, vs2: usize, vs1: usize, desc: &Desc) {
        let vl = self.vl();
        let op = op.int_op();
        for_sew!(desc.sew, T => {
            let vr = &mut self.vregs;
            let mut acc: T = vr.read(vs1, 0);
            for i in 0..vl {
                if vr.active(desc.vm, i) {
                    acc = int_op(op, acc, vr.read::<T>(vs2, i));
                }
            }
            vr.write(vd, 0, acc);
        })
    }

    /// vwredsumu/vwredsum.vs: SEW elements extended into a 2*SEW sum
    pub fn vwredsum(
        &mut self,
        signed: bool,
        vd: usize,
        vs2: usize,
        vs1: usize,
        desc: &Desc,
    ) -> Result<(), VectorError> {
        let vl = self.vl();
        for_wsew!(desc.sew, T => {
            let vr = &mut self.vregs;
            let mut acc = vr.read::<<T as Widen>::Wide>(vs1, 0).to_u64();
            for i in 0..vl {
                if vr.active(desc.vm, i) {
                    let e: T = vr.read(vs2, i);
                    let w = if signed { e.sext() } else { e.zext() };
                    acc = acc.wrapping_add(w.to_u64());
                }
            }
            vr.write(vd, 0, <T as Widen>::Wide::from_u64(acc));
        })
    }

    /// vfredsum/vfredmin/vfredmax.vs
    pub fn vfred(
        &mut self,
        op: FRedOp,
        vd: usize,
        vs2: usize,
        vs1: usize,
        desc: &Desc,
    ) -> Result<(), VectorError> {
        let vl = self.vl();
        let mut st = self.fp_status()?;
        for_fsew!(desc.sew, F => {
            let vr = &mut self.vregs;
            let mut acc = vr.read::<<F as Float>::Bits>(vs1, 0).to_u64();
            for i in 0..vl {
                if !vr.active(desc.vm, i) {
                    continue;
                }
                let e = vr.read::<<F as Float>::Bits>(vs2, i).to_u64();
                acc = match op {
                    FRedOp::Sum => fpu::add::<F>(&mut st, acc, e),
                    FRedOp::Min => fpu::min::<F>(&mut st, acc, e),
                    FRedOp::Max => fpu::max::<F>(&mut st, acc, e),
                };
            }
            vr.write(vd, 0, <F as Float>::Bits::from_u64(acc));
        })?;
        self.commit_fp(st);
        Ok(())
    }

    /// vfwredsum.vs: SEW elements widened into a 2*SEW ordered sum
    pub fn vfwredsum(&mut self, vd: usize, vs2: usize, vs1: usize, desc: &Desc) -> Result<(), VectorError> {
        let vl = self.vl();
        let mut st = self.fp_status()?;
        for_fwsew!(desc.sew, F, W => {
            let vr = &mut self.vregs;
            let mut acc = vr.read::<<W as Float>::Bits>(vs1, 0).to_u64();
            for i in 0..vl {
                if !vr.active(desc.vm, i) {
                    continue;
                }
                let e = vr.read::<<F as Float>::Bits>(vs2, i).to_u64();
                let e = fpu::convert::<F, W>(&mut st, e);
                acc = fpu::add::<W>(&mut st, acc, e);
            }
            vr.write(vd, 0, <W as Float>::Bits::from_u64(acc));
        })?;
        self.commit_fp(st);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::vector::Sew;

    fn cpu_with(vsew: u64, avl: u64) -> (Cpu, Desc) {
        let mut cpu = Cpu::new();
        cpu.vsetvl(avl, vsew << 3);
        let desc = cpu.desc().unwrap();
        (cpu, desc)
    }

    #[test]
    fn integer_reductions() {
        let (mut cpu, desc) = cpu_with(0, 4);
        for (i, v) in [3u8, 0xFE, 7, 0x80].iter().enumerate() {
            cpu.vregs.write(2, i, *v);
        }
        cpu.vregs.write::<u8>(3, 0, 10);
        cpu.vregs.reg_mut(1).fill(0x55);
        cpu.vred(RedOp::Sum, 1, 2, 3, &desc);
        assert_eq!(cpu.vregs.read::<u8>(1, 0), (10u8 + 3 + 7).wrapping_add(0xFE).wrapping_add(0x80));
        // only lane 0 of vd is written
        assert_eq!(cpu.vregs.read::<u8>(1, 1), 0x55);
        cpu.vred(RedOp::Min, 1, 2, 3, &desc);
        assert_eq!(cpu.vregs.read::<u8>(1, 0), 0x80);
        cpu.vred(RedOp::Maxu, 1, 2, 3, &desc);
        assert_eq!(cpu.vregs.read::<u8>(1, 0), 0xFE);
        cpu.vred(RedOp::Xor, 1, 2, 3, &desc);
        assert_eq!(cpu.vregs.read::<u8>(1, 0), 10 ^ 3 ^ 0xFE ^ 7 ^ 0x80);
    }

    #[test]
    fn masked_reduction_skips_lanes() {
        let (mut cpu, desc) = cpu_with(2, 4);
        for i in 0..4 {
            cpu.vregs.write::<u32>(2, i, 1 << i);
        }
        cpu.vregs.reg_mut(0)[0] = 0b1010;
        cpu.vred(RedOp::Or, 1, 2, 3, &desc.masked());
        assert_eq!(cpu.vregs.read::<u32>(1, 0), 0b1010);
    }

    #[test]
    fn zero_vl_writes_initial_value() {
        let (mut cpu, desc) = cpu_with(0, 0);
        cpu.vregs.write::<u8>(3, 0, 42);
        cpu.vred(RedOp::Sum, 1, 2, 3, &desc);
        assert_eq!(cpu.vregs.read::<u8>(1, 0), 42);
    }

    #[test]
    fn widening_sum() {
        let (mut cpu, desc) = cpu_with(0, 3);
        for i in 0..3 {
            cpu.vregs.write::<u8>(2, i, 0xFF);
        }
        cpu.vregs.write::<u16>(3, 0, 1);
        cpu.vwredsum(false, 1, 2, 3, &desc).unwrap();
        assert_eq!(cpu.vregs.read::<u16>(1, 0), 1 + 3 * 255);
        cpu.vwredsum(true, 1, 2, 3, &desc).unwrap();
        assert_eq!(cpu.vregs.read::<u16>(1, 0), (1i16 - 3) as u16);
        assert_eq!(
            cpu.vwredsum(true, 1, 2, 3, &Desc::new(Sew::E64, 0, 16)),
            Err(VectorError::UnsupportedSew(Sew::E64))
        );
    }

    #[test]
    fn float_sum_is_ordered() {
        let (mut cpu, desc) = cpu_with(2, 3);
        // the first 1.0 is absorbed into 1e8
        for (i, v) in [1.0f32, -1e8, 1.0].iter().enumerate() {
            cpu.vregs.write::<u32>(2, i, v.to_bits());
        }
        cpu.vregs.write::<u32>(3, 0, 1e8f32.to_bits());
        cpu.vfred(FRedOp::Sum, 1, 2, 3, &desc).unwrap();
        assert_eq!(f32::from_bits(cpu.vregs.read::<u32>(1, 0)), 1.0);
        cpu.vfred(FRedOp::Min, 1, 2, 3, &desc).unwrap();
        assert_eq!(f32::from_bits(cpu.vregs.read::<u32>(1, 0)), -1e8);
        cpu.vfred(FRedOp::Max, 1, 2, 3, &desc).unwrap();
        assert_eq!(f32::from_bits(cpu.vregs.read::<u32>(1, 0)), 1e8);
    }

    #[test]
    fn float_widening_sum() {
        let (mut cpu, desc) = cpu_with(2, 2);
        cpu.vregs.write::<u32>(2, 0, 0.5f32.to_bits());
        cpu.vregs.write::<u32>(2, 1, 0.25f32.to_bits());
        cpu.vregs.write::<u64>(3, 0, 2.0f64.to_bits());
        cpu.vfwredsum(1, 2, 3, &desc).unwrap();
        assert_eq!(f64::from_bits(cpu.vregs.read::<u64>(1, 0)), 2.75);
    }
}
