// Vector AMOs (vamo*ei.v)
//
// Each active lane reads memory at base + vs2[i], combines it with vs3[i]
// and writes the result back. The lanes are not atomic with respect to
// other harts; the caller serializes execution around these.

use super::{Desc, Sew, VectorError};
use crate::cpu::Cpu;
use crate::memory::{probe_pages, AccessType, GuestMemory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmoOp {
    Swap,
    Add,
    Xor,
    And,
    Or,
    Min,
    Max,
    Minu,
    Maxu,
}

/// Combine memory value `a` with register value `b`, both `width` bits
/// wide and zero-extended into u64.
pub fn amo_op(op: AmoOp, width: Sew, a: u64, b: u64) -> u64 {
    let bits = width.bits();
    let sx = |v: u64| -> i64 { ((v << (64 - bits)) as i64) >> (64 - bits) };
    let res = match op {
        AmoOp::Swap => b,
        AmoOp::Add => a.wrapping_add(b),
        AmoOp::Xor => a ^ b,
        AmoOp::And => a & b,
        AmoOp::Or => a | b,
        AmoOp::Min => if sx(a) <= sx(b) { a } else { b },
        AmoOp::Max => if sx(a) >= sx(b) { a } else { b },
        AmoOp::Minu => a.min(b),
        AmoOp::Maxu => a.max(b),
    };
    res & width_mask(bits)
}

fn width_mask(bits: u32) -> u64 {
    if bits == 64 { u64::MAX } else { (1 << bits) - 1 }
}

impl Cpu {
    /// Apply `op` at memory width `width` (E32 or E64) for every active
    /// lane. Offsets in vs2 and data in vs3 are SEW wide; with `desc.wd`
    /// the old memory value is written back to vs3, sign-extended.
    pub fn vamo<M: GuestMemory + ?Sized>(
        &mut self,
        mem: &mut M,
        op: AmoOp,
        width: Sew,
        vs3: usize,
        base: u64,
        vs2: usize,
        desc: &Desc,
    ) -> Result<(), VectorError> {
        if !matches!(width, Sew::E32 | Sew::E64) || width > desc.sew {
            return Err(VectorError::UnsupportedSew(width));
        }
        let msz = width.bytes();
        let sew = desc.sew;
        let vl = self.vl();
        let addr_of = |cpu: &Cpu, i: usize| -> u64 {
            let off = cpu.vregs.read_elem(vs2, sew, i);
            let bits = sew.bits();
            let off = (((off << (64 - bits)) as i64) >> (64 - bits)) as u64;
            base.wrapping_add(off)
        };

        for i in 0..vl {
            if !self.vregs.active(desc.vm, i) {
                continue;
            }
            let addr = addr_of(self, i);
            probe_pages(mem, addr, msz as u64, AccessType::Read)?;
            probe_pages(mem, addr, msz as u64, AccessType::Write)?;
        }

        let bits = width.bits();
        for i in 0..vl {
            if !self.vregs.active(desc.vm, i) {
                continue;
            }
            let addr = addr_of(self, i);
            let old = mem.load(addr, msz)?;
            let reg = self.vregs.read_elem(vs3, sew, i) & width_mask(bits);
            mem.store(addr, msz, amo_op(op, width, old, reg))?;
            if desc.wd {
                let old = (((old << (64 - bits)) as i64) >> (64 - bits)) as u64;
                self.vregs.write_elem(vs3, sew, i, old);
            }
        }
        Ok(())
    }
}
