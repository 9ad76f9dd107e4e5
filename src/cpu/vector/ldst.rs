// Vector loads and stores
//
// Every form runs in two passes: probe the footprint of each active lane,
// then transfer. A fault during the probe pass leaves registers and memory
// untouched. Segment field k of lane i lives at element i + k*VLMAX of the
// register group.

use super::{Desc, Sew, VectorError};
use crate::cpu::Cpu;
use crate::memory::{probe_pages, AccessType, GuestMemory, MemFault};

/// Address generation for lane i
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stride {
    /// Segments packed back to back: lane i at base + i*NF*EEW
    Unit,
    /// Lane i at base + stride*i; zero and negative strides are honored
    Strided(i64),
    /// Lane i at base + vs2[i], offsets read at `eew` and sign-extended
    Indexed { vs2: usize, eew: Sew },
}

/// Progress of a fault-only-first probe pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FaultFirst {
    Probing,
    /// A lane past 0 would fault; vl shrinks to this many lanes
    Truncated(usize),
    Complete,
}

fn extend(v: u64, width: Sew, signed: bool) -> u64 {
    let bits = width.bits();
    if !signed || bits == 64 {
        return v;
    }
    let shift = 64 - bits;
    (((v << shift) as i64) >> shift) as u64
}

fn trace_fault(fault: MemFault) -> MemFault {
    log::trace!("vector memory access faulted: {}", fault);
    fault
}

impl Cpu {
    fn lane_base(&self, mode: Stride, base: u64, i: usize, seg_bytes: u64) -> u64 {
        match mode {
            Stride::Unit => base.wrapping_add(i as u64 * seg_bytes),
            Stride::Strided(stride) => base.wrapping_add((stride as u64).wrapping_mul(i as u64)),
            Stride::Indexed { vs2, eew } => {
                let off = extend(self.vregs.read_elem(vs2, eew, i), eew, true);
                base.wrapping_add(off)
            }
        }
    }

    fn probe_lanes<M: GuestMemory + ?Sized>(
        &self,
        mem: &mut M,
        base: u64,
        mode: Stride,
        desc: &Desc,
        access: AccessType,
    ) -> Result<(), MemFault> {
        let esz = desc.sew.bytes() as u64;
        let seg_bytes = desc.nf as u64 * esz;
        let vl = self.vl();
        if mode == Stride::Unit && desc.vm {
            return probe_pages(mem, base, vl as u64 * seg_bytes, access);
        }
        for i in 0..vl {
            if !self.vregs.active(desc.vm, i) {
                continue;
            }
            let addr = self.lane_base(mode, base, i, seg_bytes);
            probe_pages(mem, addr, seg_bytes, access)?;
        }
        Ok(())
    }

    /// vle/vlse/vlxei and their segment forms. `desc.sew` is the data EEW.
    pub fn vload<M: GuestMemory + ?Sized>(
        &mut self,
        mem: &mut M,
        vd: usize,
        base: u64,
        mode: Stride,
        desc: &Desc,
    ) -> Result<(), VectorError> {
        self.probe_lanes(mem, base, mode, desc, AccessType::Read)
            .map_err(trace_fault)?;
        let esz = desc.sew.bytes();
        let seg_bytes = (desc.nf as usize * esz) as u64;
        let vlmax = desc.vlmax();
        for i in 0..self.vl() {
            if !self.vregs.active(desc.vm, i) {
                continue;
            }
            let lane = self.lane_base(mode, base, i, seg_bytes);
            for k in 0..desc.nf as usize {
                let addr = lane.wrapping_add((k * esz) as u64);
                let val = mem.load(addr, esz).map_err(trace_fault)?;
                self.vregs.write_elem(vd, desc.sew, i + k * vlmax, val);
            }
        }
        Ok(())
    }

    /// vse/vsse/vsxei and their segment forms.
    pub fn vstore<M: GuestMemory + ?Sized>(
        &self,
        mem: &mut M,
        vs3: usize,
        base: u64,
        mode: Stride,
        desc: &Desc,
    ) -> Result<(), VectorError> {
        self.probe_lanes(mem, base, mode, desc, AccessType::Write)
            .map_err(trace_fault)?;
        let esz = desc.sew.bytes();
        let seg_bytes = (desc.nf as usize * esz) as u64;
        let vlmax = desc.vlmax();
        for i in 0..self.vl() {
            if !self.vregs.active(desc.vm, i) {
                continue;
            }
            let lane = self.lane_base(mode, base, i, seg_bytes);
            for k in 0..desc.nf as usize {
                let addr = lane.wrapping_add((k * esz) as u64);
                let val = self.vregs.read_elem(vs3, desc.sew, i + k * vlmax);
                mem.store(addr, esz, val).map_err(trace_fault)?;
            }
        }
        Ok(())
    }

    /// Unit-stride fault-only-first load.
    ///
    /// Memory holds `width`-sized values, sign- or zero-extended into SEW
    /// lanes (`width == desc.sew` for vleff). A fault on lane 0 is
    /// returned; a fault on a later lane shrinks vl to that lane instead
    /// and only the lanes before it are loaded.
    pub fn vleff<M: GuestMemory + ?Sized>(
        &mut self,
        mem: &mut M,
        vd: usize,
        base: u64,
        width: Sew,
        signed: bool,
        desc: &Desc,
    ) -> Result<(), VectorError> {
        let msz = width.bytes();
        let seg_bytes = (desc.nf as usize * msz) as u64;
        let vl = self.vl();

        let mut state = FaultFirst::Probing;
        let mut i = 0;
        while state == FaultFirst::Probing {
            if i == vl {
                state = FaultFirst::Complete;
                break;
            }
            if self.vregs.active(desc.vm, i) {
                let addr = base.wrapping_add(i as u64 * seg_bytes);
                match probe_pages(mem, addr, seg_bytes, AccessType::Read) {
                    Ok(()) => {}
                    Err(fault) if i == 0 => return Err(trace_fault(fault).into()),
                    Err(fault) => {
                        log::debug!("fault-only-first: {} at lane {}, vl {} -> {}", fault, i, vl, i);
                        state = FaultFirst::Truncated(i);
                    }
                }
            }
            i += 1;
        }

        let vl = match state {
            FaultFirst::Truncated(n) => {
                self.set_vl(n);
                n
            }
            _ => vl,
        };

        let vlmax = desc.vlmax();
        for i in 0..vl {
            if !self.vregs.active(desc.vm, i) {
                continue;
            }
            for k in 0..desc.nf as usize {
                let addr = base.wrapping_add(((i * desc.nf as usize + k) * msz) as u64);
                let val = mem.load(addr, msz).map_err(trace_fault)?;
                self.vregs
                    .write_elem(vd, desc.sew, i + k * vlmax, extend(val, width, signed));
            }
        }
        Ok(())
    }

    /// vl<nregs>re.v: load `nregs` whole registers, ignoring vl and v0.
    pub fn vl_whole<M: GuestMemory + ?Sized>(
        &mut self,
        mem: &mut M,
        vd: usize,
        base: u64,
        nregs: usize,
    ) -> Result<(), VectorError> {
        let len = nregs * self.vlenb();
        probe_pages(mem, base, len as u64, AccessType::Read).map_err(trace_fault)?;
        for (n, off) in (0..len).step_by(8).enumerate() {
            let val = mem.load(base.wrapping_add(off as u64), 8).map_err(trace_fault)?;
            self.vregs.write::<u64>(vd, n, val);
        }
        Ok(())
    }

    /// vs<nregs>r.v: store `nregs` whole registers, ignoring vl and v0.
    pub fn vs_whole<M: GuestMemory + ?Sized>(
        &self,
        mem: &mut M,
        vs3: usize,
        base: u64,
        nregs: usize,
    ) -> Result<(), VectorError> {
        let len = nregs * self.vlenb();
        probe_pages(mem, base, len as u64, AccessType::Write).map_err(trace_fault)?;
        for (n, off) in (0..len).step_by(8).enumerate() {
            let val = self.vregs.read::<u64>(vs3, n);
            mem.store(base.wrapping_add(off as u64), 8, val).map_err(trace_fault)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Ram, Watchpoint, DRAM_BASE, PAGE_SIZE};

    fn setup(vsew: u64, avl: u64) -> (Cpu, Desc, Ram) {
        let mut cpu = Cpu::new();
        cpu.vsetvl(avl, vsew << 3);
        let desc = cpu.desc().unwrap();
        let mut ram = Ram::new(DRAM_BASE, 4 * PAGE_SIZE);
        let pattern: Vec<u8> = (0..=255u8).collect();
        ram.load_bytes(DRAM_BASE, &pattern);
        (cpu, desc, ram)
    }

    #[test]
    fn unit_stride_load_store() {
        let (mut cpu, desc, mut ram) = setup(1, 8);
        cpu.vload(&mut ram, 4, DRAM_BASE + 2, Stride::Unit, &desc).unwrap();
        assert_eq!(cpu.vregs.read::<u16>(4, 0), 0x0302);
        assert_eq!(cpu.vregs.read::<u16>(4, 7), 0x1110);
        cpu.vstore(&mut ram, 4, DRAM_BASE + 0x100, Stride::Unit, &desc).unwrap();
        assert_eq!(ram.bytes(DRAM_BASE + 0x100, 16), ram.bytes(DRAM_BASE + 2, 16).to_vec());
    }

    #[test]
    fn masked_lanes_untouched() {
        let (mut cpu, desc, mut ram) = setup(0, 4);
        cpu.vregs.reg_mut(4).fill(0xAA);
        cpu.vregs.reg_mut(0)[0] = 0b0101;
        cpu.vload(&mut ram, 4, DRAM_BASE, Stride::Unit, &desc.masked()).unwrap();
        assert_eq!(&cpu.vregs.reg(4)[..5], &[0x00, 0xAA, 0x02, 0xAA, 0xAA]);
        // a store only writes active lanes
        cpu.vregs.reg_mut(5).fill(0x55);
        cpu.vstore(&mut ram, 5, DRAM_BASE, Stride::Unit, &desc.masked()).unwrap();
        assert_eq!(ram.bytes(DRAM_BASE, 4), &[0x55, 0x01, 0x55, 0x03]);
    }

    #[test]
    fn strided_negative_and_zero() {
        let (mut cpu, desc, mut ram) = setup(0, 4);
        cpu.vload(&mut ram, 4, DRAM_BASE + 10, Stride::Strided(-3), &desc).unwrap();
        assert_eq!(&cpu.vregs.reg(4)[..4], &[10, 7, 4, 1]);
        cpu.vload(&mut ram, 5, DRAM_BASE + 9, Stride::Strided(0), &desc).unwrap();
        assert_eq!(&cpu.vregs.reg(5)[..4], &[9, 9, 9, 9]);
    }

    #[test]
    fn indexed_offsets_are_signed() {
        let (mut cpu, desc, mut ram) = setup(0, 3);
        cpu.vregs.write::<u8>(8, 0, 4);
        cpu.vregs.write::<u8>(8, 1, 0xFF); // -1
        cpu.vregs.write::<u8>(8, 2, 0x20);
        let mode = Stride::Indexed { vs2: 8, eew: Sew::E8 };
        cpu.vload(&mut ram, 4, DRAM_BASE + 0x10, mode, &desc).unwrap();
        assert_eq!(&cpu.vregs.reg(4)[..3], &[0x14, 0x0F, 0x30]);
    }

    #[test]
    fn segment_fields_split_by_vlmax() {
        let (mut cpu, desc, mut ram) = setup(0, 3);
        let desc = desc.with_nf(2);
        cpu.vload(&mut ram, 4, DRAM_BASE, Stride::Unit, &desc).unwrap();
        // field 0 in v4, field 1 in v5 (vlmax = 16 at e8 m1)
        assert_eq!(&cpu.vregs.reg(4)[..3], &[0, 2, 4]);
        assert_eq!(&cpu.vregs.reg(5)[..3], &[1, 3, 5]);
        // strided segments: field k at lane base + k
        cpu.vload(&mut ram, 8, DRAM_BASE, Stride::Strided(16), &desc).unwrap();
        assert_eq!(&cpu.vregs.reg(8)[..3], &[0, 16, 32]);
        assert_eq!(&cpu.vregs.reg(9)[..3], &[1, 17, 33]);
    }

    #[test]
    fn store_fault_has_no_side_effects() {
        let (mut cpu, desc, mut ram) = setup(2, 4);
        cpu.vregs.reg_mut(4).fill(0xCC);
        let base = DRAM_BASE + PAGE_SIZE - 8;
        ram.unmap_page(DRAM_BASE + PAGE_SIZE);
        let err = cpu.vstore(&mut ram, 4, base, Stride::Unit, &desc).unwrap_err();
        assert_eq!(err, VectorError::Fault(MemFault::StorePageFault(DRAM_BASE + PAGE_SIZE)));
        assert_ne!(ram.bytes(base, 8), &[0xCC; 8]);
    }

    #[test]
    fn fault_only_first_truncates() {
        let (mut cpu, desc, mut ram) = setup(2, 4);
        cpu.vregs.reg_mut(4).fill(0xEE);
        // lanes 0 and 1 fit before the unmapped page
        let base = DRAM_BASE + PAGE_SIZE - 8;
        ram.unmap_page(DRAM_BASE + PAGE_SIZE);
        cpu.vleff(&mut ram, 4, base, Sew::E32, false, &desc).unwrap();
        assert_eq!(cpu.vl(), 2);
        assert_eq!(cpu.vregs.read::<u32>(4, 0), 0);
        assert_eq!(cpu.vregs.read::<u32>(4, 2), 0xEEEE_EEEE);
    }

    #[test]
    fn fault_only_first_lane0_faults() {
        let (mut cpu, desc, mut ram) = setup(2, 4);
        ram.unmap_page(DRAM_BASE);
        let err = cpu.vleff(&mut ram, 4, DRAM_BASE, Sew::E32, false, &desc).unwrap_err();
        assert_eq!(err, VectorError::Fault(MemFault::LoadPageFault(DRAM_BASE)));
        assert_eq!(cpu.vl(), 4);
    }

    #[test]
    fn fault_only_first_watchpoint_truncates() {
        let (mut cpu, desc, mut ram) = setup(0, 8);
        ram.add_watchpoint(Watchpoint {
            addr: DRAM_BASE + 5,
            len: 1,
            on_load: true,
            on_store: false,
        });
        cpu.vleff(&mut ram, 4, DRAM_BASE, Sew::E8, false, &desc).unwrap();
        assert_eq!(cpu.vl(), 5);
    }

    #[test]
    fn fault_only_first_extends_narrow() {
        let (mut cpu, desc, mut ram) = setup(1, 2);
        ram.load_bytes(DRAM_BASE, &[0x80, 0x7F]);
        cpu.vleff(&mut ram, 4, DRAM_BASE, Sew::E8, true, &desc).unwrap();
        assert_eq!(cpu.vregs.read::<u16>(4, 0), 0xFF80);
        assert_eq!(cpu.vregs.read::<u16>(4, 1), 0x007F);
        cpu.vleff(&mut ram, 4, DRAM_BASE, Sew::E8, false, &desc).unwrap();
        assert_eq!(cpu.vregs.read::<u16>(4, 0), 0x0080);
    }

    #[test]
    fn whole_register_transfer() {
        let (mut cpu, _, mut ram) = setup(0, 1);
        cpu.vl_whole(&mut ram, 8, DRAM_BASE, 2).unwrap();
        assert_eq!(cpu.vregs.reg(8)[0], 0);
        assert_eq!(cpu.vregs.reg(9)[15], 31);
        cpu.vs_whole(&mut ram, 8, DRAM_BASE + 0x200, 2).unwrap();
        assert_eq!(ram.bytes(DRAM_BASE + 0x200, 32), ram.bytes(DRAM_BASE, 32).to_vec());
    }
}
