// Floating-point vector operations
//
// Lanes are SEW-wide IEEE values (SEW 16/32/64). The scalar operand of the
// .vf forms is a 64-bit FP register image and is unboxed to SEW first.
// Flags raised by any lane accrue into fflags once the loop is done.

use super::elem::Element;
use super::int::mask_result;
use super::{for_fsew, for_fwsew, Desc, Src, VectorError, VectorRegFile};
use crate::cpu::fpu::{self, check_nanbox, Float, FpStatus, RoundingMode};
use crate::cpu::Cpu;

// ============================================================================
// Lane skeletons
// ============================================================================

#[inline]
fn lane<F: Float>(vr: &VectorRegFile, reg: usize, i: usize) -> u64 {
    vr.read::<F::Bits>(reg, i).to_u64()
}

#[inline]
fn set_lane<F: Float>(vr: &mut VectorRegFile, reg: usize, i: usize, bits: u64) {
    vr.write(reg, i, F::Bits::from_u64(bits));
}

/// Second operand at lane `i` as raw F bits.
#[inline]
fn foperand<F: Float>(vr: &VectorRegFile, src: Src, i: usize) -> u64 {
    match src {
        Src::V(r) => lane::<F>(vr, r, i),
        Src::X(f) => check_nanbox::<F>(f),
    }
}

fn fbinary<F: Float>(
    vr: &mut VectorRegFile,
    st: &mut FpStatus,
    vl: usize,
    desc: &Desc,
    vd: usize,
    vs2: usize,
    src: Src,
    mut op: impl FnMut(&mut FpStatus, u64, u64) -> u64,
) {
    for i in 0..vl {
        if !vr.active(desc.vm, i) {
            continue;
        }
        let a = lane::<F>(vr, vs2, i);
        let b = foperand::<F>(vr, src, i);
        let r = op(st, a, b);
        set_lane::<F>(vr, vd, i, r);
    }
}

fn fternary<F: Float>(
    vr: &mut VectorRegFile,
    st: &mut FpStatus,
    vl: usize,
    desc: &Desc,
    vd: usize,
    vs2: usize,
    src: Src,
    mut op: impl FnMut(&mut FpStatus, u64, u64, u64) -> u64,
) {
    for i in 0..vl {
        if !vr.active(desc.vm, i) {
            continue;
        }
        let a = lane::<F>(vr, vs2, i);
        let b = foperand::<F>(vr, src, i);
        let d = lane::<F>(vr, vd, i);
        let r = op(st, a, b, d);
        set_lane::<F>(vr, vd, i, r);
    }
}

/// Lane map from an `S`-wide source to a `D`-wide destination.
fn fmap<S: Element, D: Element>(
    vr: &mut VectorRegFile,
    st: &mut FpStatus,
    vl: usize,
    desc: &Desc,
    vd: usize,
    vs2: usize,
    mut op: impl FnMut(&mut FpStatus, u64) -> u64,
) {
    for i in 0..vl {
        if !vr.active(desc.vm, i) {
            continue;
        }
        let a = vr.read::<S>(vs2, i).to_u64();
        let r = op(st, a);
        vr.write(vd, i, D::from_u64(r));
    }
}

/// Widening skeleton: vs2 is F or already W (`wide_vs2`), src is F, vd is
/// W. F operands are converted to W before `op(vs2, src, vd)`.
fn fwiden<F: Float, W: Float>(
    vr: &mut VectorRegFile,
    st: &mut FpStatus,
    vl: usize,
    desc: &Desc,
    vd: usize,
    vs2: usize,
    src: Src,
    wide_vs2: bool,
    mut op: impl FnMut(&mut FpStatus, u64, u64, u64) -> u64,
) {
    for i in 0..vl {
        if !vr.active(desc.vm, i) {
            continue;
        }
        let a = if wide_vs2 {
            lane::<W>(vr, vs2, i)
        } else {
            fpu::convert::<F, W>(st, lane::<F>(vr, vs2, i))
        };
        let b = fpu::convert::<F, W>(st, foperand::<F>(vr, src, i));
        let d = lane::<W>(vr, vd, i);
        let r = op(st, a, b, d);
        set_lane::<W>(vr, vd, i, r);
    }
}

fn sext(v: u64, bits: u32) -> i128 {
    let shift = 64 - bits;
    (((v << shift) as i64) >> shift) as i128
}

// ============================================================================
// Per-lane operations
// ============================================================================

/// Two-operand FP operations, as op(vs2, vs1/rs1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FpOp {
    Add,
    Sub,
    /// rs1 - vs2
    Rsub,
    Mul,
    Div,
    /// rs1 / vs2
    Rdiv,
    Min,
    Max,
    Sgnj,
    Sgnjn,
    Sgnjx,
}

pub fn fp_op<F: Float>(st: &mut FpStatus, op: FpOp, a: u64, b: u64) -> u64 {
    match op {
        FpOp::Add => fpu::add::<F>(st, a, b),
        FpOp::Sub => fpu::sub::<F>(st, a, b),
        FpOp::Rsub => fpu::sub::<F>(st, b, a),
        FpOp::Mul => fpu::mul::<F>(st, a, b),
        FpOp::Div => fpu::div::<F>(st, a, b),
        FpOp::Rdiv => fpu::div::<F>(st, b, a),
        FpOp::Min => fpu::min::<F>(st, a, b),
        FpOp::Max => fpu::max::<F>(st, a, b),
        FpOp::Sgnj => fpu::sgnj::<F>(a, b),
        FpOp::Sgnjn => fpu::sgnjn::<F>(a, b),
        FpOp::Sgnjx => fpu::sgnjx::<F>(a, b),
    }
}

/// Fused multiply-add forms. The *acc/*sac forms overwrite the addend,
/// the *add/*sub forms overwrite a multiplicand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FmaOp {
    /// vd = +(vs1 * vs2) + vd
    Macc,
    /// vd = -(vs1 * vs2) - vd
    Nmacc,
    /// vd = +(vs1 * vs2) - vd
    Msac,
    /// vd = -(vs1 * vs2) + vd
    Nmsac,
    /// vd = +(vs1 * vd) + vs2
    Madd,
    /// vd = -(vs1 * vd) - vs2
    Nmadd,
    /// vd = +(vs1 * vd) - vs2
    Msub,
    /// vd = -(vs1 * vd) + vs2
    Nmsub,
}

impl FmaOp {
    /// (negate product, negate addend)
    fn signs(self) -> (bool, bool) {
        match self {
            FmaOp::Macc | FmaOp::Madd => (false, false),
            FmaOp::Nmacc | FmaOp::Nmadd => (true, true),
            FmaOp::Msac | FmaOp::Msub => (false, true),
            FmaOp::Nmsac | FmaOp::Nmsub => (true, false),
        }
    }

    fn overwrites_addend(self) -> bool {
        matches!(self, FmaOp::Macc | FmaOp::Nmacc | FmaOp::Msac | FmaOp::Nmsac)
    }
}

/// Apply an FMA form to (vs2, vs1, vd) in format F.
fn fma_form<F: Float>(st: &mut FpStatus, op: FmaOp, vs2: u64, vs1: u64, vd: u64) -> u64 {
    let (neg_prod, neg_add) = op.signs();
    let (m, c) = if op.overwrites_addend() { (vs2, vd) } else { (vd, vs2) };
    let m = if neg_prod { m ^ F::sign_mask() } else { m };
    let c = if neg_add { c ^ F::sign_mask() } else { c };
    fpu::fma::<F>(st, vs1, m, c)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FCmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    /// vs2 > rs1
    Gt,
    /// vs2 >= rs1
    Ge,
    /// neither operand is NaN
    Ord,
}

pub fn fp_cmp<F: Float>(st: &mut FpStatus, op: FCmpOp, a: u64, b: u64) -> bool {
    match op {
        FCmpOp::Eq => fpu::eq::<F>(st, a, b),
        FCmpOp::Ne => !fpu::eq::<F>(st, a, b),
        FCmpOp::Lt => fpu::lt::<F>(st, a, b),
        FCmpOp::Le => fpu::le::<F>(st, a, b),
        FCmpOp::Gt => fpu::lt::<F>(st, b, a),
        FCmpOp::Ge => fpu::le::<F>(st, b, a),
        FCmpOp::Ord => fpu::ordered::<F>(st, a, b),
    }
}

/// Integer/float conversion direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CvtOp {
    /// float to unsigned
    XuF,
    /// float to signed
    XF,
    /// unsigned to float
    FXu,
    /// signed to float
    FX,
    /// float to float (widening and narrowing forms only)
    FF,
}

/// Widening FMA forms, vd is 2*SEW
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FwMaccOp {
    Macc,
    Nmacc,
    Msac,
    Nmsac,
}

impl FwMaccOp {
    fn single(self) -> FmaOp {
        match self {
            FwMaccOp::Macc => FmaOp::Macc,
            FwMaccOp::Nmacc => FmaOp::Nmacc,
            FwMaccOp::Msac => FmaOp::Msac,
            FwMaccOp::Nmsac => FmaOp::Nmsac,
        }
    }
}

impl Cpu {
    /// vfadd/vfsub/vfrsub/vfmul/vfdiv/vfrdiv/vfmin/vfmax/vfsgnj*
    pub fn vfp(
        &mut self,
        op: FpOp,
        vd: usize,
        vs2: usize,
        src: Src,
        desc: &Desc,
    ) -> Result<(), VectorError> {
        let vl = self.vl();
        let mut st = self.fp_status()?;
        for_fsew!(desc.sew, F => fbinary::<F>(&mut self.vregs, &mut st, vl, desc, vd, vs2, src, |st, a, b| {
            fp_op::<F>(st, op, a, b)
        }))?;
        self.commit_fp(st);
        Ok(())
    }

    /// vfmacc/vfnmacc/vfmsac/vfnmsac/vfmadd/vfnmadd/vfmsub/vfnmsub
    pub fn vfma(
        &mut self,
        op: FmaOp,
        vd: usize,
        vs2: usize,
        src: Src,
        desc: &Desc,
    ) -> Result<(), VectorError> {
        let vl = self.vl();
        let mut st = self.fp_status()?;
        for_fsew!(desc.sew, F => fternary::<F>(&mut self.vregs, &mut st, vl, desc, vd, vs2, src, |st, a, b, d| {
            fma_form::<F>(st, op, a, b, d)
        }))?;
        self.commit_fp(st);
        Ok(())
    }

    pub fn vfsqrt(&mut self, vd: usize, vs2: usize, desc: &Desc) -> Result<(), VectorError> {
        let vl = self.vl();
        let mut st = self.fp_status()?;
        for_fsew!(desc.sew, F => fmap::<<F as Float>::Bits, <F as Float>::Bits>(&mut self.vregs, &mut st, vl, desc, vd, vs2, |st, a| {
            fpu::sqrt::<F>(st, a)
        }))?;
        self.commit_fp(st);
        Ok(())
    }

    /// vfclass.v: 10-bit one-hot class of each lane
    pub fn vfclass(&mut self, vd: usize, vs2: usize, desc: &Desc) -> Result<(), VectorError> {
        let vl = self.vl();
        // classify neither rounds nor raises flags, so frm is not consulted
        // and there is nothing to commit
        let mut st = FpStatus::new(RoundingMode::Rne);
        for_fsew!(desc.sew, F => fmap::<<F as Float>::Bits, <F as Float>::Bits>(&mut self.vregs, &mut st, vl, desc, vd, vs2, |_, a| {
            fpu::classify::<F>(a)
        }))
    }

    /// vmfeq/vmfne/vmflt/vmfle/vmfgt/vmfge/vmford. Inactive lanes and the
    /// tail are written 0.
    pub fn vmfcmp(
        &mut self,
        op: FCmpOp,
        vd: usize,
        vs2: usize,
        src: Src,
        desc: &Desc,
    ) -> Result<(), VectorError> {
        let vl = self.vl();
        let vlmax = desc.vlmax();
        let mut st = self.fp_status()?;
        for_fsew!(desc.sew, F => mask_result(&mut self.vregs, vl, vlmax, desc.vm, vd, |vr, i| {
            let a = lane::<F>(vr, vs2, i);
            let b = foperand::<F>(vr, src, i);
            fp_cmp::<F>(&mut st, op, a, b)
        }))?;
        self.commit_fp(st);
        Ok(())
    }

    /// vfmerge.vfm: vd[i] = v0[i] ? f[rs1] : vs2[i]
    pub fn vfmerge(&mut self, vd: usize, vs2: usize, freg: u64, desc: &Desc) -> Result<(), VectorError> {
        let val = for_fsew!(desc.sew, F => check_nanbox::<F>(freg))?;
        self.vmerge(vd, vs2, Src::X(val), desc);
        Ok(())
    }

    /// vfmv.v.f: splat f[rs1] into every lane below vl
    pub fn vfmv_v_f(&mut self, vd: usize, freg: u64, desc: &Desc) -> Result<(), VectorError> {
        let val = for_fsew!(desc.sew, F => check_nanbox::<F>(freg))?;
        self.vmv_v(vd, Src::X(val), desc);
        Ok(())
    }

    /// vfcvt.{xu.f,x.f,f.xu,f.x}.v at SEW
    pub fn vfcvt(&mut self, op: CvtOp, vd: usize, vs2: usize, desc: &Desc) -> Result<(), VectorError> {
        let vl = self.vl();
        let mut st = self.fp_status()?;
        let sew = desc.sew;
        for_fsew!(sew, F => fmap::<<F as Float>::Bits, <F as Float>::Bits>(&mut self.vregs, &mut st, vl, desc, vd, vs2, |st, a| {
            match op {
                CvtOp::XuF => fpu::to_int::<F>(st, a, F::BITS, false),
                CvtOp::XF => fpu::to_int::<F>(st, a, F::BITS, true),
                CvtOp::FXu => fpu::from_int::<F>(st, a as i128),
                CvtOp::FX => fpu::from_int::<F>(st, sext(a, F::BITS)),
                CvtOp::FF => a,
            }
        }))?;
        self.commit_fp(st);
        Ok(())
    }

    /// vfwcvt.{xu.f,x.f,f.xu,f.x,f.f}.v: SEW source, 2*SEW destination
    pub fn vfwcvt(&mut self, op: CvtOp, vd: usize, vs2: usize, desc: &Desc) -> Result<(), VectorError> {
        let vl = self.vl();
        let mut st = self.fp_status()?;
        for_fwsew!(desc.sew, F, W => fmap::<<F as Float>::Bits, <W as Float>::Bits>(&mut self.vregs, &mut st, vl, desc, vd, vs2, |st, a| {
            match op {
                CvtOp::XuF => fpu::to_int::<F>(st, a, W::BITS, false),
                CvtOp::XF => fpu::to_int::<F>(st, a, W::BITS, true),
                CvtOp::FXu => fpu::from_int::<W>(st, a as i128),
                CvtOp::FX => fpu::from_int::<W>(st, sext(a, F::BITS)),
                CvtOp::FF => fpu::convert::<F, W>(st, a),
            }
        }))?;
        self.commit_fp(st);
        Ok(())
    }

    /// vfncvt.{xu.f,x.f,f.xu,f.x,f.f}.w: 2*SEW source, SEW destination
    pub fn vfncvt(&mut self, op: CvtOp, vd: usize, vs2: usize, desc: &Desc) -> Result<(), VectorError> {
        let vl = self.vl();
        let mut st = self.fp_status()?;
        for_fwsew!(desc.sew, F, W => fmap::<<W as Float>::Bits, <F as Float>::Bits>(&mut self.vregs, &mut st, vl, desc, vd, vs2, |st, a| {
            match op {
                CvtOp::XuF => fpu::to_int::<W>(st, a, F::BITS, false),
                CvtOp::XF => fpu::to_int::<W>(st, a, F::BITS, true),
                CvtOp::FXu => fpu::from_int::<F>(st, a as i128),
                CvtOp::FX => fpu::from_int::<F>(st, sext(a, W::BITS)),
                CvtOp::FF => fpu::convert::<W, F>(st, a),
            }
        }))?;
        self.commit_fp(st);
        Ok(())
    }

    /// vfwadd/vfwsub/vfwmul (.vv/.vf), and with `wide_vs2` the .wv/.wf
    /// forms. Only Add, Sub and Mul are defined.
    pub fn vfwop(
        &mut self,
        op: FpOp,
        vd: usize,
        vs2: usize,
        src: Src,
        wide_vs2: bool,
        desc: &Desc,
    ) -> Result<(), VectorError> {
        let vl = self.vl();
        let mut st = self.fp_status()?;
        for_fwsew!(desc.sew, F, W => fwiden::<F, W>(&mut self.vregs, &mut st, vl, desc, vd, vs2, src, wide_vs2, |st, a, b, _| {
            fp_op::<W>(st, op, a, b)
        }))?;
        self.commit_fp(st);
        Ok(())
    }

    /// vfwmacc/vfwnmacc/vfwmsac/vfwnmsac: 2*SEW vd = ±(vs1 * vs2) ± vd
    pub fn vfwmacc(
        &mut self,
        op: FwMaccOp,
        vd: usize,
        vs2: usize,
        src: Src,
        desc: &Desc,
    ) -> Result<(), VectorError> {
        let vl = self.vl();
        let mut st = self.fp_status()?;
        let form = op.single();
        for_fwsew!(desc.sew, F, W => fwiden::<F, W>(&mut self.vregs, &mut st, vl, desc, vd, vs2, src, false, |st, a, b, d| {
            fma_form::<W>(st, form, a, b, d)
        }))?;
        self.commit_fp(st);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::csr;
    use crate::cpu::fpu::{nanbox, NV, NX};
    use crate::cpu::vector::Sew;
    use half::f16;

    fn cpu_with(vsew: u64, avl: u64) -> (Cpu, Desc) {
        let mut cpu = Cpu::new();
        cpu.vsetvl(avl, vsew << 3);
        let desc = cpu.desc().unwrap();
        (cpu, desc)
    }

    fn f32_lane(cpu: &Cpu, reg: usize, i: usize) -> f32 {
        f32::from_bits(cpu.vregs.read::<u32>(reg, i))
    }

    #[test]
    fn e8_is_rejected() {
        let (mut cpu, desc) = cpu_with(0, 4);
        assert_eq!(
            cpu.vfp(FpOp::Add, 1, 2, Src::V(3), &desc),
            Err(VectorError::UnsupportedSew(Sew::E8))
        );
    }

    #[test]
    fn add_vf_unboxes_scalar() {
        let (mut cpu, desc) = cpu_with(2, 2);
        cpu.vregs.write::<u32>(2, 0, 1.5f32.to_bits());
        cpu.vregs.write::<u32>(2, 1, (-4.0f32).to_bits());
        let rs1 = nanbox::<f32>(2.0f32.to_bits() as u64);
        cpu.vfp(FpOp::Add, 1, 2, Src::X(rs1), &desc).unwrap();
        assert_eq!(f32_lane(&cpu, 1, 0), 3.5);
        assert_eq!(f32_lane(&cpu, 1, 1), -2.0);
        // an improperly boxed scalar reads as the canonical NaN
        cpu.vfp(FpOp::Add, 1, 2, Src::X(2.0f32.to_bits() as u64), &desc).unwrap();
        assert_eq!(cpu.vregs.read::<u32>(1, 0), 0x7FC0_0000);
    }

    #[test]
    fn reversed_ops() {
        let (mut cpu, desc) = cpu_with(3, 1);
        cpu.vregs.write::<u64>(2, 0, 4.0f64.to_bits());
        cpu.vfp(FpOp::Rsub, 1, 2, Src::X(10.0f64.to_bits()), &desc).unwrap();
        assert_eq!(f64::from_bits(cpu.vregs.read::<u64>(1, 0)), 6.0);
        cpu.vfp(FpOp::Rdiv, 1, 2, Src::X(10.0f64.to_bits()), &desc).unwrap();
        assert_eq!(f64::from_bits(cpu.vregs.read::<u64>(1, 0)), 2.5);
    }

    #[test]
    fn flags_accrue_into_fflags() {
        let (mut cpu, desc) = cpu_with(2, 1);
        cpu.vregs.write::<u32>(2, 0, 1.0f32.to_bits());
        cpu.vregs.write::<u32>(3, 0, 3.0f32.to_bits());
        cpu.vfp(FpOp::Div, 1, 2, Src::V(3), &desc).unwrap();
        assert_eq!(cpu.csrs.read(csr::FFLAGS), NX);
        cpu.vregs.write::<u32>(3, 0, f32::INFINITY.to_bits());
        cpu.vregs.write::<u32>(2, 0, 0);
        cpu.vfp(FpOp::Mul, 1, 2, Src::V(3), &desc).unwrap();
        assert_eq!(cpu.csrs.read(csr::FFLAGS), NX | NV);
        assert_eq!(cpu.vregs.read::<u32>(1, 0), 0x7FC0_0000);
    }

    #[test]
    fn fma_forms() {
        let (mut cpu, desc) = cpu_with(2, 1);
        let set = |cpu: &mut Cpu| {
            cpu.vregs.write::<u32>(2, 0, 2.0f32.to_bits()); // vs2
            cpu.vregs.write::<u32>(3, 0, 3.0f32.to_bits()); // vs1
            cpu.vregs.write::<u32>(1, 0, 10.0f32.to_bits()); // vd
        };
        let cases = [
            (FmaOp::Macc, 16.0),
            (FmaOp::Nmacc, -16.0),
            (FmaOp::Msac, -4.0),
            (FmaOp::Nmsac, 4.0),
            (FmaOp::Madd, 32.0),
            (FmaOp::Nmadd, -32.0),
            (FmaOp::Msub, 28.0),
            (FmaOp::Nmsub, -28.0),
        ];
        for (op, want) in cases {
            set(&mut cpu);
            cpu.vfma(op, 1, 2, Src::V(3), &desc).unwrap();
            assert_eq!(f32_lane(&cpu, 1, 0), want, "{:?}", op);
        }
    }

    #[test]
    fn compares_write_mask() {
        let (mut cpu, desc) = cpu_with(2, 4);
        let vals = [1.0f32, f32::NAN, 3.0, -0.0];
        for (i, v) in vals.iter().enumerate() {
            cpu.vregs.write::<u32>(2, i, v.to_bits());
        }
        cpu.vregs.reg_mut(5).fill(0xFF);
        let rs1 = nanbox::<f32>(1.0f32.to_bits() as u64);
        cpu.vmfcmp(FCmpOp::Le, 5, 2, Src::X(rs1), &desc).unwrap();
        // vl == vlmax == 4, so bits 4..8 are not touched
        assert_eq!(cpu.vregs.reg(5)[0], 0xF0 | 0b1001);
        assert_eq!(cpu.csrs.read(csr::FFLAGS), NV);
        cpu.vmfcmp(FCmpOp::Gt, 5, 2, Src::X(rs1), &desc).unwrap();
        assert_eq!(cpu.vregs.reg(5)[0] & 0xF, 0b0100);
        cpu.vmfcmp(FCmpOp::Ord, 5, 2, Src::V(2), &desc).unwrap();
        assert_eq!(cpu.vregs.reg(5)[0] & 0xF, 0b1101);
        cpu.vmfcmp(FCmpOp::Ne, 5, 2, Src::V(2), &desc).unwrap();
        assert_eq!(cpu.vregs.reg(5)[0] & 0xF, 0b0010);
    }

    #[test]
    fn class_and_sqrt() {
        let (mut cpu, desc) = cpu_with(1, 2);
        cpu.vregs.write::<u16>(2, 0, f16::from_f32(4.0).to_bits());
        cpu.vregs.write::<u16>(2, 1, f16::NEG_INFINITY.to_bits());
        cpu.vfclass(1, 2, &desc).unwrap();
        assert_eq!(cpu.vregs.read::<u16>(1, 0), 1 << 6);
        assert_eq!(cpu.vregs.read::<u16>(1, 1), 1 << 0);
        cpu.vfsqrt(1, 2, &desc).unwrap();
        assert_eq!(cpu.vregs.read::<u16>(1, 0), f16::from_f32(2.0).to_bits());
        assert_eq!(cpu.vregs.read::<u16>(1, 1), 0x7E00);
    }

    #[test]
    fn class_ignores_frm_and_flags() {
        let (mut cpu, desc) = cpu_with(1, 1);
        cpu.csrs.write(csr::FRM, 7);
        // signaling NaN
        cpu.vregs.write::<u16>(2, 0, 0x7C01);
        cpu.vfclass(1, 2, &desc).unwrap();
        assert_eq!(cpu.vregs.read::<u16>(1, 0), 1 << 8);
        assert_eq!(cpu.csrs.read(csr::FFLAGS), 0);
    }

    #[test]
    fn merge_and_splat() {
        let (mut cpu, desc) = cpu_with(2, 4);
        let rs1 = nanbox::<f32>(7.0f32.to_bits() as u64);
        cpu.vregs.reg_mut(0)[0] = 0b0110;
        cpu.vfmerge(1, 2, rs1, &desc.masked()).unwrap();
        assert_eq!(cpu.vregs.read::<u32>(1, 0), 0);
        assert_eq!(f32_lane(&cpu, 1, 1), 7.0);
        cpu.vfmv_v_f(3, rs1, &desc).unwrap();
        assert!((0..4).all(|i| f32_lane(&cpu, 3, i) == 7.0));
    }

    #[test]
    fn same_width_conversions() {
        let (mut cpu, desc) = cpu_with(2, 3);
        for (i, v) in [2.5f32, -1.0, 1e10].iter().enumerate() {
            cpu.vregs.write::<u32>(2, i, v.to_bits());
        }
        cpu.vfcvt(CvtOp::XF, 1, 2, &desc).unwrap();
        assert_eq!(cpu.vregs.read::<u32>(1, 0), 2);
        assert_eq!(cpu.vregs.read::<u32>(1, 1), u32::MAX);
        assert_eq!(cpu.vregs.read::<u32>(1, 2), i32::MAX as u32);
        cpu.vfcvt(CvtOp::XuF, 1, 2, &desc).unwrap();
        assert_eq!(cpu.vregs.read::<u32>(1, 1), 0);
        cpu.vregs.write::<u32>(4, 0, (-3i32) as u32);
        cpu.vfcvt(CvtOp::FX, 5, 4, &desc).unwrap();
        assert_eq!(f32_lane(&cpu, 5, 0), -3.0);
        cpu.vfcvt(CvtOp::FXu, 5, 4, &desc).unwrap();
        assert_eq!(f32_lane(&cpu, 5, 0), 4294967296.0);
    }

    #[test]
    fn widening_and_narrowing_conversions() {
        let (mut cpu, desc) = cpu_with(2, 2);
        cpu.vregs.write::<u32>(2, 0, 1.25f32.to_bits());
        cpu.vregs.write::<u32>(2, 1, (-7.0f32).to_bits());
        cpu.vfwcvt(CvtOp::FF, 4, 2, &desc).unwrap();
        assert_eq!(f64::from_bits(cpu.vregs.read::<u64>(4, 0)), 1.25);
        cpu.vfwcvt(CvtOp::XF, 6, 2, &desc).unwrap();
        assert_eq!(cpu.vregs.read::<u64>(6, 1), (-7i64) as u64);
        cpu.vfncvt(CvtOp::FF, 8, 4, &desc).unwrap();
        assert_eq!(f32_lane(&cpu, 8, 0), 1.25);
        cpu.vfncvt(CvtOp::FX, 9, 6, &desc).unwrap();
        assert_eq!(f32_lane(&cpu, 9, 1), -7.0);
        assert_eq!(
            cpu.vfwcvt(CvtOp::FF, 4, 2, &Desc::new(Sew::E64, 0, 16)),
            Err(VectorError::UnsupportedSew(Sew::E64))
        );
    }

    #[test]
    fn widening_arithmetic() {
        let (mut cpu, desc) = cpu_with(1, 2);
        cpu.vregs.write::<u16>(2, 0, f16::from_f32(1.5).to_bits());
        cpu.vregs.write::<u16>(3, 0, f16::from_f32(2.0).to_bits());
        cpu.vfwop(FpOp::Mul, 4, 2, Src::V(3), false, &desc).unwrap();
        assert_eq!(f32_lane(&cpu, 4, 0), 3.0);
        // .wv: vs2 already f32
        cpu.vfwop(FpOp::Add, 6, 4, Src::V(3), true, &desc).unwrap();
        assert_eq!(f32_lane(&cpu, 6, 0), 5.0);
        cpu.vfwmacc(FwMaccOp::Nmsac, 6, 2, Src::V(3), &desc).unwrap();
        assert_eq!(f32_lane(&cpu, 6, 0), 2.0);
    }
}
