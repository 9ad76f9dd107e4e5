//! Guest memory seen by the vector memory engine.
//!
//! The engine never touches guest memory directly. Every access goes through
//! [`GuestMemory`], which translates, permission-checks and performs the
//! transfer, reporting a precise [`MemFault`] when it cannot.

pub mod ram;

use thiserror::Error;

pub use ram::{PagePerm, Ram, Watchpoint};

/// Guest page size used to split probe footprints.
pub const PAGE_SIZE: u64 = 4096;
/// Default base address of [`Ram`].
pub const DRAM_BASE: u64 = 0x8000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessType {
    Read,
    Write,
}

/// A precise memory fault, delivered to the surrounding emulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemFault {
    #[error("load access fault at {0:#x}")]
    LoadAccess(u64),
    #[error("store access fault at {0:#x}")]
    StoreAccess(u64),
    #[error("load page fault at {0:#x}")]
    LoadPageFault(u64),
    #[error("store page fault at {0:#x}")]
    StorePageFault(u64),
    #[error("watchpoint hit at {0:#x}")]
    Watchpoint(u64),
}

impl MemFault {
    /// Faulting guest address (the trap value).
    pub fn addr(&self) -> u64 {
        match *self {
            MemFault::LoadAccess(a)
            | MemFault::StoreAccess(a)
            | MemFault::LoadPageFault(a)
            | MemFault::StorePageFault(a)
            | MemFault::Watchpoint(a) => a,
        }
    }

    /// RISC-V exception cause code.
    pub fn cause(&self) -> u64 {
        match self {
            MemFault::Watchpoint(_) => 3,
            MemFault::LoadAccess(_) => 5,
            MemFault::StoreAccess(_) => 7,
            MemFault::LoadPageFault(_) => 13,
            MemFault::StorePageFault(_) => 15,
        }
    }
}

/// Memory access primitives consumed by the vector engine.
///
/// `load`/`store` move 1, 2, 4 or 8 bytes in little-endian order.
/// `probe` validates an access of `len` bytes that does not cross a page
/// boundary, without transferring data.
pub trait GuestMemory {
    fn probe(&mut self, addr: u64, len: u64, access: AccessType) -> Result<(), MemFault>;
    fn load(&mut self, addr: u64, size: usize) -> Result<u64, MemFault>;
    fn store(&mut self, addr: u64, size: usize, val: u64) -> Result<(), MemFault>;
}

/// Probe `len` bytes starting at `addr`, one page at a time.
pub fn probe_pages<M: GuestMemory + ?Sized>(
    mem: &mut M,
    addr: u64,
    len: u64,
    access: AccessType,
) -> Result<(), MemFault> {
    let mut addr = addr;
    let mut remain = len;
    while remain > 0 {
        // bytes left in the current page
        let pagelen = PAGE_SIZE - (addr & (PAGE_SIZE - 1));
        let curlen = pagelen.min(remain);
        mem.probe(addr, curlen, access)?;
        addr = addr.wrapping_add(curlen);
        remain -= curlen;
    }
    Ok(())
}
