// Integer arithmetic, compares, merges and extensions

use super::elem::{Element, Widen};
use super::{for_sew, for_wsew, Desc, Src, VectorError, VectorRegFile};
use crate::cpu::Cpu;

// ============================================================================
// Lane skeletons
// ============================================================================

/// Second operand at lane `i`: vector element or splatted scalar.
#[inline]
pub(crate) fn operand<T: Element>(vr: &VectorRegFile, src: Src, i: usize) -> T {
    match src {
        Src::V(r) => vr.read(r, i),
        Src::X(x) => T::from_u64(x),
    }
}

/// vd[i] = op(vs2[i], src[i]) over the active lanes below vl.
pub(crate) fn binary<T: Element>(
    vr: &mut VectorRegFile,
    vl: usize,
    desc: &Desc,
    vd: usize,
    vs2: usize,
    src: Src,
    mut op: impl FnMut(T, T) -> T,
) {
    for i in 0..vl {
        if !vr.active(desc.vm, i) {
            continue;
        }
        let a: T = vr.read(vs2, i);
        let b = operand::<T>(vr, src, i);
        vr.write(vd, i, op(a, b));
    }
}

/// vd[i] = op(vs2[i], src[i], vd[i]) over the active lanes below vl.
pub(crate) fn ternary<T: Element>(
    vr: &mut VectorRegFile,
    vl: usize,
    desc: &Desc,
    vd: usize,
    vs2: usize,
    src: Src,
    mut op: impl FnMut(T, T, T) -> T,
) {
    for i in 0..vl {
        if !vr.active(desc.vm, i) {
            continue;
        }
        let a: T = vr.read(vs2, i);
        let b = operand::<T>(vr, src, i);
        let d: T = vr.read(vd, i);
        vr.write(vd, i, op(a, b, d));
    }
}

/// 2*SEW vd[i] = op(vs2[i], src[i], vd[i]) with SEW sources.
pub(crate) fn widening<T: Widen>(
    vr: &mut VectorRegFile,
    vl: usize,
    desc: &Desc,
    vd: usize,
    vs2: usize,
    src: Src,
    mut op: impl FnMut(T, T, T::Wide) -> T::Wide,
) {
    for i in 0..vl {
        if !vr.active(desc.vm, i) {
            continue;
        }
        let a: T = vr.read(vs2, i);
        let b = operand::<T>(vr, src, i);
        let d: T::Wide = vr.read(vd, i);
        vr.write(vd, i, op(a, b, d));
    }
}

/// 2*SEW vd[i] = op(2*SEW vs2[i], src[i]).
pub(crate) fn widening_wide<T: Widen>(
    vr: &mut VectorRegFile,
    vl: usize,
    desc: &Desc,
    vd: usize,
    vs2: usize,
    src: Src,
    mut op: impl FnMut(T::Wide, T) -> T::Wide,
) {
    for i in 0..vl {
        if !vr.active(desc.vm, i) {
            continue;
        }
        let a: T::Wide = vr.read(vs2, i);
        let b = operand::<T>(vr, src, i);
        vr.write(vd, i, op(a, b));
    }
}

/// SEW vd[i] = op(2*SEW vs2[i], src[i]).
pub(crate) fn narrowing<T: Widen>(
    vr: &mut VectorRegFile,
    vl: usize,
    desc: &Desc,
    vd: usize,
    vs2: usize,
    src: Src,
    mut op: impl FnMut(T::Wide, T) -> T,
) {
    for i in 0..vl {
        if !vr.active(desc.vm, i) {
            continue;
        }
        let a: T::Wide = vr.read(vs2, i);
        let b = operand::<T>(vr, src, i);
        vr.write(vd, i, op(a, b));
    }
}

/// Mask-producing skeleton: bit i of vd = op(i) for active lanes below vl,
/// inactive lanes and the tail up to `vlmax` are written 0.
pub(crate) fn mask_result(
    vr: &mut VectorRegFile,
    vl: usize,
    vlmax: usize,
    vm: bool,
    vd: usize,
    mut op: impl FnMut(&VectorRegFile, usize) -> bool,
) {
    for i in 0..vl {
        let bit = vr.active(vm, i) && op(vr, i);
        vr.set_mask_bit(vd, i, bit);
    }
    for i in vl..vlmax {
        vr.set_mask_bit(vd, i, false);
    }
}

// ============================================================================
// Per-lane operations
// ============================================================================

/// Single-width integer operations, as op(vs2, vs1/rs1/imm)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntOp {
    Add,
    Sub,
    Rsub,
    And,
    Or,
    Xor,
    Sll,
    Srl,
    Sra,
    Minu,
    Min,
    Maxu,
    Max,
    Mul,
    Mulh,
    Mulhu,
    Mulhsu,
    Divu,
    Div,
    Remu,
    Rem,
}

pub fn int_op<T: Element>(op: IntOp, a: T, b: T) -> T {
    let (ua, ub) = (a.to_u64(), b.to_u64());
    let (sa, sb) = (a.to_i64(), b.to_i64());
    let shamt = (ub & (T::BITS as u64 - 1)) as u32;
    match op {
        IntOp::Add => T::from_u64(ua.wrapping_add(ub)),
        IntOp::Sub => T::from_u64(ua.wrapping_sub(ub)),
        IntOp::Rsub => T::from_u64(ub.wrapping_sub(ua)),
        IntOp::And => T::from_u64(ua & ub),
        IntOp::Or => T::from_u64(ua | ub),
        IntOp::Xor => T::from_u64(ua ^ ub),
        IntOp::Sll => T::from_u64(ua << shamt),
        IntOp::Srl => T::from_u64(ua >> shamt),
        IntOp::Sra => T::from_i64(sa >> shamt),
        IntOp::Minu => a.min(b),
        IntOp::Maxu => a.max(b),
        IntOp::Min => if sa <= sb { a } else { b },
        IntOp::Max => if sa >= sb { a } else { b },
        IntOp::Mul => T::from_u64(ua.wrapping_mul(ub)),
        IntOp::Mulh => T::from_u64(((sa as i128 * sb as i128) >> T::BITS) as u64),
        IntOp::Mulhu => T::from_u64(((ua as u128 * ub as u128) >> T::BITS) as u64),
        IntOp::Mulhsu => T::from_u64(((sa as i128 * ub as i128) >> T::BITS) as u64),
        IntOp::Divu => divu(a, b),
        IntOp::Div => div(a, b),
        IntOp::Remu => remu(a, b),
        IntOp::Rem => rem(a, b),
    }
}

/// Unsigned divide; x / 0 is all ones
pub fn divu<T: Element>(a: T, b: T) -> T {
    match b.to_u64() {
        0 => T::from_u64(u64::MAX),
        d => T::from_u64(a.to_u64() / d),
    }
}

/// Signed divide; x / 0 is -1 and MIN / -1 is MIN
pub fn div<T: Element>(a: T, b: T) -> T {
    let (n, d) = (a.to_i64(), b.to_i64());
    if d == 0 {
        T::from_i64(-1)
    } else if n == T::smin() && d == -1 {
        a
    } else {
        T::from_i64(n / d)
    }
}

/// Unsigned remainder; x % 0 is x
pub fn remu<T: Element>(a: T, b: T) -> T {
    match b.to_u64() {
        0 => a,
        d => T::from_u64(a.to_u64() % d),
    }
}

/// Signed remainder; x % 0 is x and MIN % -1 is 0
pub fn rem<T: Element>(a: T, b: T) -> T {
    let (n, d) = (a.to_i64(), b.to_i64());
    if d == 0 {
        a
    } else if n == T::smin() && d == -1 {
        T::from_u64(0)
    } else {
        T::from_i64(n % d)
    }
}

/// Single-width multiply-add forms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaccOp {
    /// vd = vs1 * vs2 + vd
    Macc,
    /// vd = -(vs1 * vs2) + vd
    Nmsac,
    /// vd = vs1 * vd + vs2
    Madd,
    /// vd = -(vs1 * vd) + vs2
    Nmsub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Ltu,
    Lt,
    Leu,
    Le,
    Gtu,
    Gt,
}

pub fn int_cmp<T: Element>(op: CmpOp, a: T, b: T) -> bool {
    let (sa, sb) = (a.to_i64(), b.to_i64());
    match op {
        CmpOp::Eq => a == b,
        CmpOp::Ne => a != b,
        CmpOp::Ltu => a < b,
        CmpOp::Lt => sa < sb,
        CmpOp::Leu => a <= b,
        CmpOp::Le => sa <= sb,
        CmpOp::Gtu => a > b,
        CmpOp::Gt => sa > sb,
    }
}

/// Widening add/sub/mul: 2*SEW = SEW op SEW (or 2*SEW op SEW for .w forms)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WideOp {
    Addu,
    Add,
    Subu,
    Sub,
    Mulu,
    Mul,
    /// signed vs2 times unsigned vs1
    Mulsu,
}

impl WideOp {
    /// Signedness of (vs2, vs1) when promoted
    fn signedness(self) -> (bool, bool) {
        match self {
            WideOp::Addu | WideOp::Subu | WideOp::Mulu => (false, false),
            WideOp::Add | WideOp::Sub | WideOp::Mul => (true, true),
            WideOp::Mulsu => (true, false),
        }
    }

    fn apply<W: Element>(self, a: W, b: W) -> W {
        let (a, b) = (a.to_u64(), b.to_u64());
        W::from_u64(match self {
            WideOp::Addu | WideOp::Add => a.wrapping_add(b),
            WideOp::Subu | WideOp::Sub => a.wrapping_sub(b),
            WideOp::Mulu | WideOp::Mul | WideOp::Mulsu => a.wrapping_mul(b),
        })
    }
}

/// Widening multiply-accumulate: 2*SEW vd += vs1 * vs2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WMaccOp {
    Maccu,
    Macc,
    /// signed vs1, unsigned vs2
    Maccsu,
    /// unsigned rs1, signed vs2
    Maccus,
}

#[inline]
fn promote<T: Widen>(v: T, signed: bool) -> T::Wide {
    if signed { v.sext() } else { v.zext() }
}

// ============================================================================
// Entry points
// ============================================================================

impl Cpu {
    /// vadd/vsub/vrsub/vand/vor/vxor/vsll/vsrl/vsra/vmin(u)/vmax(u)/
    /// vmul/vmulh(u|su)/vdiv(u)/vrem(u)
    pub fn vint(&mut self, op: IntOp, vd: usize, vs2: usize, src: Src, desc: &Desc) {
        let vl = self.vl();
        for_sew!(desc.sew, T => binary::<T>(&mut self.vregs, vl, desc, vd, vs2, src, |a, b| int_op(op, a, b)))
    }

    /// vmacc/vnmsac/vmadd/vnmsub; `src` is vs1 or rs1
    pub fn vmacc(&mut self, op: MaccOp, vd: usize, vs2: usize, src: Src, desc: &Desc) {
        let vl = self.vl();
        for_sew!(desc.sew, T => ternary::<T>(&mut self.vregs, vl, desc, vd, vs2, src, |s2, s1, d| {
            let (s2, s1, d) = (s2.to_u64(), s1.to_u64(), d.to_u64());
            T::from_u64(match op {
                MaccOp::Macc => s1.wrapping_mul(s2).wrapping_add(d),
                MaccOp::Nmsac => d.wrapping_sub(s1.wrapping_mul(s2)),
                MaccOp::Madd => s1.wrapping_mul(d).wrapping_add(s2),
                MaccOp::Nmsub => s2.wrapping_sub(s1.wrapping_mul(d)),
            })
        }))
    }

    /// vadc.vvm/vxm/vim: vd = vs2 + src + v0 for every lane below vl
    pub fn vadc(&mut self, vd: usize, vs2: usize, src: Src, desc: &Desc) {
        self.carry_op(vd, vs2, src, desc, false);
    }

    /// vsbc.vvm/vxm: vd = vs2 - src - v0 for every lane below vl
    pub fn vsbc(&mut self, vd: usize, vs2: usize, src: Src, desc: &Desc) {
        self.carry_op(vd, vs2, src, desc, true);
    }

    fn carry_op(&mut self, vd: usize, vs2: usize, src: Src, desc: &Desc, sub: bool) {
        let vl = self.vl();
        for_sew!(desc.sew, T => {
            let vr = &mut self.vregs;
            for i in 0..vl {
                let a: T = vr.read(vs2, i);
                let b = operand::<T>(vr, src, i).to_u64();
                let c = vr.mask_bit(0, i) as u64;
                let r = if sub {
                    a.to_u64().wrapping_sub(b).wrapping_sub(c)
                } else {
                    a.to_u64().wrapping_add(b).wrapping_add(c)
                };
                vr.write(vd, i, T::from_u64(r));
            }
        })
    }

    /// vmadc: carry-out mask of vs2 + src (+ v0 when desc is masked)
    pub fn vmadc(&mut self, vd: usize, vs2: usize, src: Src, desc: &Desc) {
        self.carry_out(vd, vs2, src, desc, false);
    }

    /// vmsbc: borrow-out mask of vs2 - src (- v0 when desc is masked)
    pub fn vmsbc(&mut self, vd: usize, vs2: usize, src: Src, desc: &Desc) {
        self.carry_out(vd, vs2, src, desc, true);
    }

    fn carry_out(&mut self, vd: usize, vs2: usize, src: Src, desc: &Desc, sub: bool) {
        let vl = self.vl();
        let vlmax = desc.vlmax();
        let with_carry = !desc.vm;
        for_sew!(desc.sew, T => {
            // every lane below vl is computed; v0 is carry-in, not a predicate
            mask_result(&mut self.vregs, vl, vlmax, true, vd, |vr, i| {
                let n: T = vr.read(vs2, i);
                let m = operand::<T>(vr, src, i);
                let carry = with_carry && vr.mask_bit(0, i);
                let sum = T::from_u64(n.to_u64().wrapping_add(m.to_u64()));
                match (sub, carry) {
                    (false, true) => T::from_u64(sum.to_u64().wrapping_add(1)) <= n,
                    (false, false) => sum < n,
                    (true, true) => n <= m,
                    (true, false) => n < m,
                }
            })
        })
    }

    /// vmseq/vmsne/vmsltu/vmslt/vmsleu/vmsle/vmsgtu/vmsgt
    pub fn vcmp(&mut self, op: CmpOp, vd: usize, vs2: usize, src: Src, desc: &Desc) {
        let vl = self.vl();
        let vlmax = desc.vlmax();
        for_sew!(desc.sew, T => mask_result(&mut self.vregs, vl, vlmax, desc.vm, vd, |vr, i| {
            let a: T = vr.read(vs2, i);
            int_cmp(op, a, operand::<T>(vr, src, i))
        }))
    }

    /// vmerge.vvm/vxm/vim: vd = v0[i] ? src : vs2. An unmasked desc makes
    /// this vmv.v.v/vmv.v.x/vmv.v.i and vs2 is ignored.
    pub fn vmerge(&mut self, vd: usize, vs2: usize, src: Src, desc: &Desc) {
        let vl = self.vl();
        for_sew!(desc.sew, T => {
            let vr = &mut self.vregs;
            for i in 0..vl {
                let v: T = if vr.active(desc.vm, i) {
                    operand::<T>(vr, src, i)
                } else {
                    vr.read(vs2, i)
                };
                vr.write(vd, i, v);
            }
        })
    }

    /// vmv.v.v / vmv.v.x / vmv.v.i
    pub fn vmv_v(&mut self, vd: usize, src: Src, desc: &Desc) {
        let desc = Desc { vm: true, ..*desc };
        self.vmerge(vd, vd, src, &desc);
    }

    /// vzext.vf2/4/8 and vsext.vf2/4/8: SEW/factor source extended to SEW.
    pub fn vext(
        &mut self,
        vd: usize,
        vs2: usize,
        factor: u32,
        signed: bool,
        desc: &Desc,
    ) -> Result<(), VectorError> {
        let sew = desc.sew;
        let from = super::Sew::from_bits(sew.bits() / factor.max(1))
            .filter(|_| factor.is_power_of_two() && factor > 1)
            .ok_or(VectorError::UnsupportedSew(sew))?;
        let vl = self.vl();
        let vr = &mut self.vregs;
        let shift = 64 - from.bits();
        for i in 0..vl {
            if !vr.active(desc.vm, i) {
                continue;
            }
            let v = vr.read_elem(vs2, from, i);
            let v = if signed {
                (((v << shift) as i64) >> shift) as u64
            } else {
                v
            };
            vr.write_elem(vd, sew, i, v);
        }
        Ok(())
    }

    /// vwadd(u)/vwsub(u)/vwmul(u|su). With `wide_vs2` vs2 is already
    /// 2*SEW (the .wv/.wx forms).
    pub fn vwint(
        &mut self,
        op: WideOp,
        vd: usize,
        vs2: usize,
        src: Src,
        wide_vs2: bool,
        desc: &Desc,
    ) -> Result<(), VectorError> {
        let vl = self.vl();
        let (s2, s1) = op.signedness();
        for_wsew!(desc.sew, T => {
            if wide_vs2 {
                widening_wide::<T>(&mut self.vregs, vl, desc, vd, vs2, src, |a, b| {
                    op.apply(a, promote(b, s1))
                })
            } else {
                widening::<T>(&mut self.vregs, vl, desc, vd, vs2, src, |a, b, _| {
                    op.apply(promote(a, s2), promote(b, s1))
                })
            }
        })
    }

    /// vwmacc/vwmaccu/vwmaccsu/vwmaccus: 2*SEW vd += vs1 * vs2
    pub fn vwmacc(
        &mut self,
        op: WMaccOp,
        vd: usize,
        vs2: usize,
        src: Src,
        desc: &Desc,
    ) -> Result<(), VectorError> {
        let vl = self.vl();
        // (vs2 signed, vs1 signed)
        let (s2, s1) = match op {
            WMaccOp::Maccu => (false, false),
            WMaccOp::Macc => (true, true),
            WMaccOp::Maccsu => (false, true),
            WMaccOp::Maccus => (true, false),
        };
        for_wsew!(desc.sew, T => widening::<T>(&mut self.vregs, vl, desc, vd, vs2, src, |a, b, d| {
            let p = promote(a, s2).to_u64().wrapping_mul(promote(b, s1).to_u64());
            <T as Widen>::Wide::from_u64(p.wrapping_add(d.to_u64()))
        }))
    }

    /// vnsrl/vnsra: SEW vd = 2*SEW vs2 >> (src & (2*SEW-1))
    pub fn vnshift(
        &mut self,
        arith: bool,
        vd: usize,
        vs2: usize,
        src: Src,
        desc: &Desc,
    ) -> Result<(), VectorError> {
        let vl = self.vl();
        for_wsew!(desc.sew, T => narrowing::<T>(&mut self.vregs, vl, desc, vd, vs2, src, |a, b| {
            let sh = (b.to_u64() & (2 * T::BITS as u64 - 1)) as u32;
            if arith {
                T::from_i64(a.to_i64() >> sh)
            } else {
                T::from_u64(a.to_u64() >> sh)
            }
        }))
    }
}
