// Floating-point CSRs
pub const FFLAGS: u16 = 0x001;
pub const FRM: u16 = 0x002;
pub const FCSR: u16 = 0x003;

// Vector extension CSRs
pub const VSTART: u16 = 0x008;
pub const VXSAT: u16 = 0x009;
pub const VXRM: u16 = 0x00A;
pub const VCSR: u16 = 0x00F;
pub const VL: u16 = 0xC20;
pub const VTYPE: u16 = 0xC21;
pub const VLENB: u16 = 0xC22;

/// vtype value with only the vill bit set
pub const VTYPE_VILL: u64 = 1u64 << 63;

/// CSR state touched by vector execution.
///
/// FFLAGS/FRM are views of FCSR and VXSAT/VXRM are views of VCSR, matching
/// the architectural aliasing. VL, VTYPE and VLENB are read-only to `write`;
/// the engine updates them through `write_raw`.
pub struct CsrFile {
    fcsr: u64,
    vstart: u64,
    vxsat: u64,
    vxrm: u64,
    vl: u64,
    vtype: u64,
    vlenb: u64,
}

impl CsrFile {
    pub fn new(vlenb: u64) -> Self {
        Self {
            fcsr: 0,
            vstart: 0,
            vxsat: 0,
            vxrm: 0,
            vl: 0,
            // vtype starts as vill (no configuration set yet)
            vtype: VTYPE_VILL,
            vlenb,
        }
    }

    pub fn read(&self, addr: u16) -> u64 {
        match addr {
            FFLAGS => self.fcsr & 0x1F,
            FRM => (self.fcsr >> 5) & 0x7,
            FCSR => self.fcsr & 0xFF,
            VSTART => self.vstart,
            VXSAT => self.vxsat & 1,
            VXRM => self.vxrm & 3,
            VCSR => (self.vxrm & 3) << 1 | (self.vxsat & 1),
            VL => self.vl,
            VTYPE => self.vtype,
            VLENB => self.vlenb,
            _ => {
                log::warn!("read of unimplemented CSR {:#x}", addr);
                0
            }
        }
    }

    pub fn write(&mut self, addr: u16, val: u64) {
        match addr {
            FFLAGS => self.fcsr = (self.fcsr & !0x1F) | (val & 0x1F),
            FRM => self.fcsr = (self.fcsr & !0xE0) | ((val & 0x7) << 5),
            FCSR => self.fcsr = val & 0xFF,
            VSTART => self.vstart = val,
            VXSAT => self.vxsat = val & 1,
            VXRM => self.vxrm = val & 3,
            VCSR => {
                self.vxsat = val & 1;
                self.vxrm = (val >> 1) & 3;
            }
            VL | VTYPE | VLENB => {} // read-only from CSR instructions
            _ => log::warn!("write of unimplemented CSR {:#x}", addr),
        }
    }

    /// Raw write, bypassing the read-only rule for VL/VTYPE.
    pub fn write_raw(&mut self, addr: u16, val: u64) {
        match addr {
            VL => self.vl = val,
            VTYPE => self.vtype = val,
            VLENB => self.vlenb = val,
            _ => self.write(addr, val),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fcsr_aliases() {
        let mut csrs = CsrFile::new(16);
        csrs.write(FRM, 0b011);
        csrs.write(FFLAGS, 0b10101);
        assert_eq!(csrs.read(FCSR), 0b011_10101);
        csrs.write(FCSR, 0xFFFF);
        assert_eq!(csrs.read(FRM), 7);
        assert_eq!(csrs.read(FFLAGS), 0x1F);
    }

    #[test]
    fn vcsr_aliases() {
        let mut csrs = CsrFile::new(16);
        csrs.write(VCSR, 0b101);
        assert_eq!(csrs.read(VXRM), 0b10);
        assert_eq!(csrs.read(VXSAT), 1);
        csrs.write(VXSAT, 0);
        assert_eq!(csrs.read(VCSR), 0b100);
    }

    #[test]
    fn vl_vtype_read_only() {
        let mut csrs = CsrFile::new(16);
        assert_eq!(csrs.read(VTYPE), VTYPE_VILL);
        csrs.write(VL, 5);
        assert_eq!(csrs.read(VL), 0);
        csrs.write_raw(VL, 5);
        assert_eq!(csrs.read(VL), 5);
        assert_eq!(csrs.read(VLENB), 16);
    }
}
