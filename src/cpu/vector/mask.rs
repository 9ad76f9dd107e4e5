// Mask-register logical ops, population count, find-first, prefix masks,
// iota and vid
//
// Every mask register holds one bit per lane (bit i%8 of byte i/8),
// independent of SEW. v0 is the implicit predicate.

use super::elem::Element;
use super::{for_sew, Desc};
use crate::cpu::Cpu;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskOp {
    And,
    Nand,
    /// vs2 & !vs1
    AndNot,
    Or,
    Nor,
    /// vs2 | !vs1
    OrNot,
    Xor,
    Xnor,
}

impl MaskOp {
    fn apply(self, a: u8, b: u8) -> u8 {
        match self {
            MaskOp::And => a & b,
            MaskOp::Nand => !(a & b),
            MaskOp::AndNot => a & !b,
            MaskOp::Or => a | b,
            MaskOp::Nor => !(a | b),
            MaskOp::OrNot => a | !b,
            MaskOp::Xor => a ^ b,
            MaskOp::Xnor => !(a ^ b),
        }
    }
}

/// Which prefix mask vmsbf/vmsif/vmsof produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetFirst {
    /// 1s strictly before the first set bit
    BeforeFirst,
    /// 1s up to and including the first set bit
    IncludeFirst,
    /// a single 1 at the first set bit
    OnlyFirst,
}

impl Cpu {
    /// vmand/vmnand/vmandnot/vmor/vmnor/vmornot/vmxor/vmxnor over all VLEN bits
    pub fn vmlogic(&mut self, op: MaskOp, vd: usize, vs2: usize, vs1: usize) {
        let vlenb = self.vlenb();
        let vr = &mut self.vregs;
        for byte in 0..vlenb {
            let a: u8 = vr.read(vs2, byte);
            let b: u8 = vr.read(vs1, byte);
            vr.write(vd, byte, op.apply(a, b));
        }
    }

    /// vmpopc.m: number of active lanes below vl with the vs2 bit set
    pub fn vmpopc(&self, vs2: usize, desc: &Desc) -> u64 {
        let vr = &self.vregs;
        (0..self.vl())
            .filter(|&i| vr.active(desc.vm, i) && vr.mask_bit(vs2, i))
            .count() as u64
    }

    /// vcpop.m, the ratified name of vmpopc.m
    pub fn vcpop(&self, vs2: usize, desc: &Desc) -> u64 {
        self.vmpopc(vs2, desc)
    }

    /// vmfirst.m: index of the first active lane with the vs2 bit set, or -1
    pub fn vmfirst(&self, vs2: usize, desc: &Desc) -> i64 {
        let vr = &self.vregs;
        (0..self.vl())
            .find(|&i| vr.active(desc.vm, i) && vr.mask_bit(vs2, i))
            .map_or(-1, |i| i as i64)
    }

    /// vfirst.m, the ratified name of vmfirst.m
    pub fn vfirst(&self, vs2: usize, desc: &Desc) -> i64 {
        self.vmfirst(vs2, desc)
    }

    /// vmsbf.m/vmsif.m/vmsof.m. Inactive lanes are left alone; bits from vl
    /// to VLEN are cleared.
    pub fn vmset_first(&mut self, kind: SetFirst, vd: usize, vs2: usize, desc: &Desc) {
        let vl = self.vl();
        let vlen = self.vlen();
        let vr = &mut self.vregs;
        let mut found = false;
        for i in 0..vl {
            if !vr.active(desc.vm, i) {
                continue;
            }
            let bit = if found {
                false
            } else if vr.mask_bit(vs2, i) {
                found = true;
                kind != SetFirst::BeforeFirst
            } else {
                kind != SetFirst::OnlyFirst
            };
            vr.set_mask_bit(vd, i, bit);
        }
        for i in vl..vlen {
            vr.set_mask_bit(vd, i, false);
        }
    }

    pub fn vmsbf(&mut self, vd: usize, vs2: usize, desc: &Desc) {
        self.vmset_first(SetFirst::BeforeFirst, vd, vs2, desc);
    }

    pub fn vmsif(&mut self, vd: usize, vs2: usize, desc: &Desc) {
        self.vmset_first(SetFirst::IncludeFirst, vd, vs2, desc);
    }

    pub fn vmsof(&mut self, vd: usize, vs2: usize, desc: &Desc) {
        self.vmset_first(SetFirst::OnlyFirst, vd, vs2, desc);
    }

    /// viota.m: each active lane gets the count of set vs2 bits seen on
    /// earlier active lanes
    pub fn viota(&mut self, vd: usize, vs2: usize, desc: &Desc) {
        let vl = self.vl();
        for_sew!(desc.sew, T => {
            let vr = &mut self.vregs;
            let mut sum = 0u64;
            for i in 0..vl {
                if !vr.active(desc.vm, i) {
                    continue;
                }
                vr.write(vd, i, T::from_u64(sum));
                if vr.mask_bit(vs2, i) {
                    sum += 1;
                }
            }
        })
    }

    /// vid.v: vd[i] = i for each active lane
    pub fn vid(&mut self, vd: usize, desc: &Desc) {
        let vl = self.vl();
        for_sew!(desc.sew, T => {
            let vr = &mut self.vregs;
            for i in 0..vl {
                if vr.active(desc.vm, i) {
                    vr.write(vd, i, T::from_u64(i as u64));
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu_e8(avl: u64) -> (Cpu, Desc) {
        let mut cpu = Cpu::new();
        cpu.vsetvl(avl, 0);
        let desc = cpu.desc().unwrap();
        (cpu, desc)
    }

    #[test]
    fn logical_ops_cover_vlen() {
        let (mut cpu, _) = cpu_e8(3);
        cpu.vregs.reg_mut(2).fill(0b1100);
        cpu.vregs.reg_mut(1).fill(0b1010);
        cpu.vmlogic(MaskOp::AndNot, 3, 2, 1);
        assert!(cpu.vregs.reg(3).iter().all(|&b| b == 0b0100));
        cpu.vmlogic(MaskOp::Xnor, 3, 2, 1);
        assert_eq!(cpu.vregs.reg(3)[15], !0b0110u8);
        cpu.vmlogic(MaskOp::OrNot, 3, 2, 1);
        assert_eq!(cpu.vregs.reg(3)[0], 0b1100 | !0b1010u8);
    }

    #[test]
    fn logical_ops_ignore_registers_past_v31() {
        let (mut cpu, _) = cpu_e8(3);
        cpu.vregs.reg_mut(2).fill(0xF0);
        cpu.vmlogic(MaskOp::Or, 40, 2, 3);
        cpu.vmlogic(MaskOp::Or, 5, 2, 33);
        assert!(cpu.vregs.reg(5).iter().all(|&b| b == 0xF0));
    }

    #[test]
    fn popc_and_first() {
        let (mut cpu, desc) = cpu_e8(8);
        cpu.vregs.reg_mut(2)[0] = 0b1011_0100;
        cpu.vregs.reg_mut(2)[1] = 0xFF; // beyond vl
        assert_eq!(cpu.vmpopc(2, &desc), 4);
        assert_eq!(cpu.vmfirst(2, &desc), 2);
        cpu.vregs.reg_mut(0)[0] = 0b1000_0000;
        assert_eq!(cpu.vcpop(2, &desc.masked()), 1);
        assert_eq!(cpu.vfirst(2, &desc.masked()), 7);
        cpu.vregs.reg_mut(0)[0] = 0b0000_0011;
        assert_eq!(cpu.vmfirst(2, &desc.masked()), -1);
    }

    #[test]
    fn prefix_masks() {
        let (mut cpu, desc) = cpu_e8(8);
        cpu.vregs.reg_mut(2)[0] = 0b0001_0100;
        cpu.vregs.reg_mut(3).fill(0xFF);
        cpu.vmsbf(3, 2, &desc);
        assert_eq!(cpu.vregs.reg(3)[0], 0b0000_0011);
        assert_eq!(cpu.vregs.reg(3)[1], 0);
        cpu.vmsif(3, 2, &desc);
        assert_eq!(cpu.vregs.reg(3)[0], 0b0000_0111);
        cpu.vmsof(3, 2, &desc);
        assert_eq!(cpu.vregs.reg(3)[0], 0b0000_0100);
        // no set bit at all
        cpu.vregs.reg_mut(2)[0] = 0;
        cpu.vmsbf(3, 2, &desc);
        assert_eq!(cpu.vregs.reg(3)[0], 0xFF);
        cpu.vmsof(3, 2, &desc);
        assert_eq!(cpu.vregs.reg(3)[0], 0);
    }

    #[test]
    fn prefix_mask_skips_inactive() {
        let (mut cpu, desc) = cpu_e8(4);
        cpu.vregs.reg_mut(2)[0] = 0b0001;
        cpu.vregs.reg_mut(0)[0] = 0b1110;
        cpu.vregs.reg_mut(3)[0] = 0b0001;
        // lane 0 is inactive so its hit is not seen
        cpu.vmsbf(3, 2, &desc.masked());
        assert_eq!(cpu.vregs.reg(3)[0], 0b1111);
    }

    #[test]
    fn iota_and_id() {
        let (mut cpu, desc) = cpu_e8(8);
        cpu.vregs.reg_mut(2)[0] = 0b1001_0101;
        cpu.viota(4, 2, &desc);
        let lanes: Vec<u8> = (0..8).map(|i| cpu.vregs.read(4, i)).collect();
        assert_eq!(lanes, vec![0, 1, 1, 2, 2, 3, 3, 3]);
        cpu.vid(5, &desc);
        assert_eq!(cpu.vregs.read::<u8>(5, 6), 6);
        cpu.vregs.reg_mut(0)[0] = 0b1111_1110;
        cpu.vregs.reg_mut(4).fill(0xEE);
        cpu.viota(4, 2, &desc.masked());
        assert_eq!(cpu.vregs.read::<u8>(4, 0), 0xEE);
        assert_eq!(cpu.vregs.read::<u8>(4, 1), 0);
        assert_eq!(cpu.vregs.read::<u8>(4, 3), 1);
    }
}
