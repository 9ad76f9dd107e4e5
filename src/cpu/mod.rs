pub mod csr;
pub mod fpu;
pub mod vector;

use thiserror::Error;

use csr::CsrFile;
use fpu::{FpStatus, RoundingMode};
use vector::fixed::{FixedState, Vxrm};
use vector::{Desc, VectorError, VectorRegFile, Vtype};

/// Implementation parameters of the vector unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuConfig {
    /// VLEN in bits
    pub vlen: usize,
    /// Maximum element width in bits
    pub elen: u32,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self { vlen: 128, elen: 64 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("VLEN {0} must be a power of two between 64 and 65536")]
    Vlen(usize),
    #[error("ELEN {0} must be 32 or 64")]
    Elen(u32),
    #[error("VLEN {vlen} is smaller than ELEN {elen}")]
    VlenBelowElen { vlen: usize, elen: u32 },
}

impl CpuConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.vlen.is_power_of_two() || !(64..=65536).contains(&self.vlen) {
            return Err(ConfigError::Vlen(self.vlen));
        }
        if self.elen != 32 && self.elen != 64 {
            return Err(ConfigError::Elen(self.elen));
        }
        if self.vlen < self.elen as usize {
            return Err(ConfigError::VlenBelowElen {
                vlen: self.vlen,
                elen: self.elen,
            });
        }
        Ok(())
    }
}

/// Vector execution context of one hart
pub struct Cpu {
    /// Vector register file
    pub vregs: VectorRegFile,
    /// CSR file (vector and floating-point state)
    pub csrs: CsrFile,
    config: CpuConfig,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    pub fn new() -> Self {
        let config = CpuConfig::default();
        Self::build(config)
    }

    pub fn with_config(config: CpuConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: CpuConfig) -> Self {
        let vlenb = config.vlen / 8;
        log::debug!("vector unit: VLEN={} ELEN={}", config.vlen, config.elen);
        Self {
            vregs: VectorRegFile::new(vlenb),
            csrs: CsrFile::new(vlenb as u64),
            config,
        }
    }

    pub fn config(&self) -> &CpuConfig {
        &self.config
    }

    /// VLEN in bits
    pub fn vlen(&self) -> usize {
        self.config.vlen
    }

    /// VLEN in bytes
    pub fn vlenb(&self) -> usize {
        self.config.vlen / 8
    }

    pub fn vl(&self) -> usize {
        self.csrs.read(csr::VL) as usize
    }

    pub(crate) fn set_vl(&mut self, vl: usize) {
        self.csrs.write_raw(csr::VL, vl as u64);
    }

    pub fn vtype(&self) -> Vtype {
        Vtype::decode(self.csrs.read(csr::VTYPE), self.config.elen)
    }

    /// Unmasked descriptor for the current vtype, or IllegalConfig under vill.
    pub fn desc(&self) -> Result<Desc, VectorError> {
        let vt = self.vtype();
        if vt.vill {
            return Err(VectorError::IllegalConfig);
        }
        Ok(Desc::new(vt.sew, vt.lmul, self.vlenb()))
    }

    /// Snapshot of vxrm/vxsat for a fixed-point lane loop.
    pub(crate) fn fixed_state(&self) -> FixedState {
        FixedState::new(Vxrm::from_bits(self.csrs.read(csr::VXRM)))
    }

    /// Fold a finished fixed-point loop back into the sticky vxsat bit.
    pub(crate) fn commit_fixed(&mut self, st: FixedState) {
        if st.sat {
            self.csrs.write(csr::VXSAT, 1);
        }
    }

    /// Snapshot of frm for a floating-point lane loop. A reserved frm makes
    /// the instruction illegal.
    pub(crate) fn fp_status(&self) -> Result<FpStatus, VectorError> {
        let frm = self.csrs.read(csr::FRM);
        match RoundingMode::from_frm(frm) {
            Some(rm) => Ok(FpStatus::new(rm)),
            None => {
                log::warn!("reserved frm {}", frm);
                Err(VectorError::ReservedRoundingMode(frm))
            }
        }
    }

    /// Accrue the flags raised by a floating-point lane loop into fflags.
    pub(crate) fn commit_fp(&mut self, st: FpStatus) {
        if st.flags != 0 {
            let fflags = self.csrs.read(csr::FFLAGS);
            self.csrs.write(csr::FFLAGS, fflags | st.flags);
        }
    }
}
