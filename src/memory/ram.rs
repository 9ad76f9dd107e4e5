use super::{AccessType, GuestMemory, MemFault, PAGE_SIZE};

/// Per-page mapping state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePerm {
    ReadWrite,
    ReadOnly,
    Unmapped,
}

/// Address-range watchpoint, checked by `probe`.
#[derive(Debug, Clone, Copy)]
pub struct Watchpoint {
    pub addr: u64,
    pub len: u64,
    pub on_load: bool,
    pub on_store: bool,
}

impl Watchpoint {
    fn matches(&self, addr: u64, len: u64, access: AccessType) -> bool {
        let hit_kind = match access {
            AccessType::Read => self.on_load,
            AccessType::Write => self.on_store,
        };
        hit_kind && addr < self.addr.wrapping_add(self.len) && self.addr < addr.wrapping_add(len)
    }
}

/// Simple RAM backed by a Vec<u8>, with page permissions and watchpoints.
pub struct Ram {
    base: u64,
    data: Vec<u8>,
    pages: Vec<PagePerm>,
    watchpoints: Vec<Watchpoint>,
}

impl Ram {
    pub fn new(base: u64, size: u64) -> Self {
        let npages = size.div_ceil(PAGE_SIZE) as usize;
        Self {
            base,
            data: vec![0; size as usize],
            pages: vec![PagePerm::ReadWrite; npages],
            watchpoints: Vec::new(),
        }
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Change the mapping of the page containing `addr`.
    pub fn set_page_perm(&mut self, addr: u64, perm: PagePerm) {
        if let Some(page) = self.page_index(addr) {
            self.pages[page] = perm;
        }
    }

    pub fn unmap_page(&mut self, addr: u64) {
        self.set_page_perm(addr, PagePerm::Unmapped);
    }

    pub fn add_watchpoint(&mut self, wp: Watchpoint) {
        self.watchpoints.push(wp);
    }

    /// Copy `data` into RAM at guest address `addr`, ignoring permissions.
    pub fn load_bytes(&mut self, addr: u64, data: &[u8]) {
        let Some(start) = self.offset(addr) else {
            return;
        };
        let end = (start + data.len()).min(self.data.len());
        self.data[start..end].copy_from_slice(&data[..end - start]);
    }

    /// Read raw bytes, ignoring permissions (test inspection).
    pub fn bytes(&self, addr: u64, len: usize) -> &[u8] {
        match self.offset(addr) {
            Some(start) => &self.data[start..(start + len).min(self.data.len())],
            None => &[],
        }
    }

    fn offset(&self, addr: u64) -> Option<usize> {
        let off = addr.checked_sub(self.base)?;
        if off < self.size() {
            Some(off as usize)
        } else {
            None
        }
    }

    fn page_index(&self, addr: u64) -> Option<usize> {
        self.offset(addr).map(|off| off / PAGE_SIZE as usize)
    }

    /// Translate and permission-check every byte of `[addr, addr+len)`.
    fn check(&self, addr: u64, len: u64, access: AccessType) -> Result<usize, MemFault> {
        let range_fault = match access {
            AccessType::Read => MemFault::LoadAccess(addr),
            AccessType::Write => MemFault::StoreAccess(addr),
        };
        let start = self.offset(addr).ok_or(range_fault)?;
        if len == 0 {
            return Ok(start);
        }
        let last = addr.checked_add(len - 1).ok_or(range_fault)?;
        self.offset(last).ok_or(range_fault)?;

        let first_page = start / PAGE_SIZE as usize;
        let last_page = (start + len as usize - 1) / PAGE_SIZE as usize;
        for page in first_page..=last_page {
            let fault_addr = addr.max(self.base + (page as u64) * PAGE_SIZE);
            match (self.pages[page], access) {
                (PagePerm::Unmapped, AccessType::Read) => {
                    return Err(MemFault::LoadPageFault(fault_addr));
                }
                (PagePerm::Unmapped, AccessType::Write) | (PagePerm::ReadOnly, AccessType::Write) => {
                    return Err(MemFault::StorePageFault(fault_addr));
                }
                _ => {}
            }
        }
        Ok(start)
    }
}

impl GuestMemory for Ram {
    fn probe(&mut self, addr: u64, len: u64, access: AccessType) -> Result<(), MemFault> {
        self.check(addr, len, access)?;
        if let Some(wp) = self.watchpoints.iter().find(|w| w.matches(addr, len, access)) {
            log::trace!("watchpoint {:#x}+{} hit by probe at {:#x}", wp.addr, wp.len, addr);
            return Err(MemFault::Watchpoint(addr.max(wp.addr)));
        }
        Ok(())
    }

    fn load(&mut self, addr: u64, size: usize) -> Result<u64, MemFault> {
        let idx = self.check(addr, size as u64, AccessType::Read)?;
        let mut buf = [0u8; 8];
        buf[..size].copy_from_slice(&self.data[idx..idx + size]);
        Ok(u64::from_le_bytes(buf))
    }

    fn store(&mut self, addr: u64, size: usize, val: u64) -> Result<(), MemFault> {
        let idx = self.check(addr, size as u64, AccessType::Write)?;
        self.data[idx..idx + size].copy_from_slice(&val.to_le_bytes()[..size]);
        Ok(())
    }
}
