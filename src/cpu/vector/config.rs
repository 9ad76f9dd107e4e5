// vtype decoding and the vsetvl entry point

use super::Sew;
use crate::cpu::csr::{self, VTYPE_VILL};
use crate::cpu::Cpu;

/// Decoded vtype fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vtype {
    pub sew: Sew,
    /// log2(LMUL), -3..=3
    pub lmul: i8,
    pub vta: bool,
    pub vma: bool,
    pub vill: bool,
}

const VILL_TYPE: Vtype = Vtype {
    sew: Sew::E8,
    lmul: 0,
    vta: false,
    vma: false,
    vill: true,
};

/// Reserved bits between vediv and vill
const RESERVED_MASK: u64 = !(VTYPE_VILL | 0x3FF);

impl Vtype {
    /// Decode a raw vtype value against the implementation's ELEN.
    /// Any illegal combination decodes as vill.
    pub fn decode(raw: u64, elen: u32) -> Self {
        let vlmul = raw & 7;
        let vsew = (raw >> 3) & 7;
        let ediv = (raw >> 8) & 3;
        let Some(sew) = Sew::from_vsew(vsew) else {
            return VILL_TYPE;
        };
        let mut vill = raw & VTYPE_VILL != 0;
        if vlmul & 4 != 0 {
            // Fractional LMUL
            if vlmul == 4 || elen >> (8 - vlmul) < sew.bits() {
                vill = true;
            }
        }
        if sew.bits() > elen || vill || ediv != 0 || raw & RESERVED_MASK != 0 {
            return VILL_TYPE;
        }
        Self {
            sew,
            lmul: (((vlmul << 5) as u8 as i8) >> 5),
            vta: raw & (1 << 6) != 0,
            vma: raw & (1 << 7) != 0,
            vill: false,
        }
    }

    pub fn encode(&self) -> u64 {
        if self.vill {
            return VTYPE_VILL;
        }
        (self.lmul as u64 & 7)
            | self.sew.vsew() << 3
            | (self.vta as u64) << 6
            | (self.vma as u64) << 7
    }

    /// VLMAX = LMUL * VLEN / SEW
    pub fn vlmax(&self, vlen: usize) -> usize {
        if self.vill {
            return 0;
        }
        let shift = self.sew.vsew() as i32 + 3 - self.lmul as i32;
        vlen >> shift
    }
}

impl Cpu {
    /// vsetvl/vsetvli/vsetivli: grant min(avl, VLMAX) lanes for `vtype`.
    ///
    /// An illegal vtype does not fail: vtype becomes vill, vl becomes 0 and
    /// 0 is returned. vstart is cleared either way.
    pub fn vsetvl(&mut self, avl: u64, vtype: u64) -> u64 {
        let vt = Vtype::decode(vtype, self.config().elen);
        self.csrs.write(csr::VSTART, 0);
        if vt.vill {
            log::warn!("vsetvl: illegal vtype {:#x}, setting vill", vtype);
            self.csrs.write_raw(csr::VTYPE, VTYPE_VILL);
            self.csrs.write_raw(csr::VL, 0);
            return 0;
        }
        let vlmax = vt.vlmax(self.vlen()) as u64;
        let vl = avl.min(vlmax);
        log::debug!(
            "vsetvl: avl={} {} lmul=2^{} -> vl={} (vlmax={})",
            avl,
            vt.sew,
            vt.lmul,
            vl,
            vlmax
        );
        self.csrs.write_raw(csr::VTYPE, vtype);
        self.csrs.write_raw(csr::VL, vl);
        vl
    }
}
