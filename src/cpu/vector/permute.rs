// Slides, gathers, compress, scalar moves and whole-register moves

use super::elem::Element;
use super::int::operand;
use super::{for_fsew, for_sew, Desc, Src, VectorError};
use crate::cpu::fpu::{check_nanbox, nanbox};
use crate::cpu::Cpu;

impl Cpu {
    /// vslideup.vx/vi: vd[i] = vs2[i - offset] for offset <= i < vl.
    /// Lanes below the offset keep their value.
    pub fn vslideup(&mut self, vd: usize, vs2: usize, offset: u64, desc: &Desc) {
        let vl = self.vl();
        let start = offset.min(vl as u64) as usize;
        for_sew!(desc.sew, T => {
            let vr = &mut self.vregs;
            for i in start..vl {
                if vr.active(desc.vm, i) {
                    let v: T = vr.read(vs2, i - start);
                    vr.write(vd, i, v);
                }
            }
        })
    }

    /// vslidedown.vx/vi: vd[i] = vs2[i + offset], 0 past VLMAX.
    pub fn vslidedown(&mut self, vd: usize, vs2: usize, offset: u64, desc: &Desc) {
        let vl = self.vl();
        let vlmax = desc.vlmax() as u64;
        for_sew!(desc.sew, T => {
            let vr = &mut self.vregs;
            for i in 0..vl {
                if !vr.active(desc.vm, i) {
                    continue;
                }
                let j = (i as u64).saturating_add(offset);
                let v: T = if j >= vlmax { T::default() } else { vr.read(vs2, j as usize) };
                vr.write(vd, i, v);
            }
        })
    }

    /// vslide1up.vx: vd[0] = x, vd[i] = vs2[i - 1]
    pub fn vslide1up(&mut self, vd: usize, vs2: usize, x: u64, desc: &Desc) {
        let vl = self.vl();
        for_sew!(desc.sew, T => {
            let vr = &mut self.vregs;
            for i in 0..vl {
                if !vr.active(desc.vm, i) {
                    continue;
                }
                let v: T = if i == 0 { T::from_u64(x) } else { vr.read(vs2, i - 1) };
                vr.write(vd, i, v);
            }
        })
    }

    /// vslide1down.vx: vd[i] = vs2[i + 1], vd[vl - 1] = x
    pub fn vslide1down(&mut self, vd: usize, vs2: usize, x: u64, desc: &Desc) {
        let vl = self.vl();
        for_sew!(desc.sew, T => {
            let vr = &mut self.vregs;
            for i in 0..vl {
                if !vr.active(desc.vm, i) {
                    continue;
                }
                let v: T = if i == vl - 1 { T::from_u64(x) } else { vr.read(vs2, i + 1) };
                vr.write(vd, i, v);
            }
        })
    }

    /// vrgather.vv/vx/vi: vd[i] = index >= VLMAX ? 0 : vs2[index]
    pub fn vrgather(&mut self, vd: usize, vs2: usize, index: Src, desc: &Desc) {
        let vl = self.vl();
        let vlmax = desc.vlmax() as u64;
        for_sew!(desc.sew, T => {
            let vr = &mut self.vregs;
            for i in 0..vl {
                if !vr.active(desc.vm, i) {
                    continue;
                }
                let idx = match index {
                    Src::V(_) => operand::<T>(vr, index, i).to_u64(),
                    Src::X(x) => x,
                };
                let v: T = if idx >= vlmax { T::default() } else { vr.read(vs2, idx as usize) };
                vr.write(vd, i, v);
            }
        })
    }

    /// vrgatherei16.vv: like vrgather.vv with 16-bit indices in vs1
    pub fn vrgatherei16(&mut self, vd: usize, vs2: usize, vs1: usize, desc: &Desc) {
        let vl = self.vl();
        let vlmax = desc.vlmax();
        for_sew!(desc.sew, T => {
            let vr = &mut self.vregs;
            for i in 0..vl {
                if !vr.active(desc.vm, i) {
                    continue;
                }
                let idx = vr.read::<u16>(vs1, i) as usize;
                let v: T = if idx >= vlmax { T::default() } else { vr.read(vs2, idx) };
                vr.write(vd, i, v);
            }
        })
    }

    /// vcompress.vm: pack the vs2 lanes selected by mask vs1 to the front
    /// of vd. Lanes past the packed count keep their value.
    pub fn vcompress(&mut self, vd: usize, vs2: usize, vs1: usize, desc: &Desc) {
        let vl = self.vl();
        for_sew!(desc.sew, T => {
            let vr = &mut self.vregs;
            let mut num = 0;
            for i in 0..vl {
                if !vr.mask_bit(vs1, i) {
                    continue;
                }
                let v: T = vr.read(vs2, i);
                vr.write(vd, num, v);
                num += 1;
            }
        })
    }

    /// vmv.x.s: vs2[0] sign-extended to 64 bits
    pub fn vmv_x_s(&self, vs2: usize, desc: &Desc) -> u64 {
        for_sew!(desc.sew, T => self.vregs.read::<T>(vs2, 0).to_i64() as u64)
    }

    /// vmv.s.x: vd[0] = x when vl > 0
    pub fn vmv_s_x(&mut self, vd: usize, x: u64, desc: &Desc) {
        if self.vl() > 0 {
            self.vregs.write_elem(vd, desc.sew, 0, x);
        }
    }

    /// vext.x.v: element `idx` of the single register vs2, zero-extended,
    /// or 0 when `idx` is past the register
    pub fn vext_x_v(&self, vs2: usize, idx: u64, desc: &Desc) -> u64 {
        let vlmax = (self.vlenb() / desc.sew.bytes()) as u64;
        if idx >= vlmax {
            return 0;
        }
        self.vregs.read_elem(vs2, desc.sew, idx as usize)
    }

    /// vfmv.f.s: vs2[0] NaN-boxed into a 64-bit FP register image
    pub fn vfmv_f_s(&self, vs2: usize, desc: &Desc) -> Result<u64, VectorError> {
        let raw = self.vregs.read_elem(vs2, desc.sew, 0);
        for_fsew!(desc.sew, F => nanbox::<F>(raw))
    }

    /// vfmv.s.f: vd[0] = f[rs1] when vl > 0
    pub fn vfmv_s_f(&mut self, vd: usize, freg: u64, desc: &Desc) -> Result<(), VectorError> {
        let val = for_fsew!(desc.sew, F => check_nanbox::<F>(freg))?;
        if self.vl() > 0 {
            self.vregs.write_elem(vd, desc.sew, 0, val);
        }
        Ok(())
    }

    /// vmv<nregs>r.v: copy whole registers, ignoring vtype and vl
    pub fn vmv_whole(&mut self, vd: usize, vs2: usize, nregs: usize) {
        self.vregs.copy_regs(vd, vs2, nregs);
    }
}
