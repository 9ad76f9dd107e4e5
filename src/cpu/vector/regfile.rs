use super::elem::Element;
use super::Sew;

/// Vector register file: 32 registers × VLENB bytes each.
///
/// Storage is the architectural little-endian byte image, so element `idx`
/// of a group starting at `reg` always lives at the bytes returned by
/// [`VectorRegFile::lane_range`] regardless of host byte order. Groups with
/// LMUL > 1 simply run on into the following registers.
#[derive(Clone)]
pub struct VectorRegFile {
    data: Vec<u8>,
    vlenb: usize,
}

impl VectorRegFile {
    pub fn new(vlenb: usize) -> Self {
        Self {
            data: vec![0u8; 32 * vlenb],
            vlenb,
        }
    }

    pub fn vlenb(&self) -> usize {
        self.vlenb
    }

    /// Byte range of element `idx` (of `esz` bytes) in the group at `reg`,
    /// or None when it falls past v31.
    #[inline]
    pub fn lane_range(&self, reg: usize, idx: usize, esz: usize) -> Option<std::ops::Range<usize>> {
        let start = reg * self.vlenb + idx * esz;
        let end = start + esz;
        (end <= self.data.len()).then_some(start..end)
    }

    #[inline]
    pub fn read<T: Element>(&self, reg: usize, idx: usize) -> T {
        match self.lane_range(reg, idx, T::BYTES) {
            Some(r) => T::from_le_slice(&self.data[r]),
            None => T::default(),
        }
    }

    #[inline]
    pub fn write<T: Element>(&mut self, reg: usize, idx: usize, val: T) {
        if let Some(r) = self.lane_range(reg, idx, T::BYTES) {
            val.write_le(&mut self.data[r]);
        }
    }

    /// Read element `idx` at a runtime-selected width, zero-extended.
    pub fn read_elem(&self, reg: usize, sew: Sew, idx: usize) -> u64 {
        match sew {
            Sew::E8 => self.read::<u8>(reg, idx) as u64,
            Sew::E16 => self.read::<u16>(reg, idx) as u64,
            Sew::E32 => self.read::<u32>(reg, idx) as u64,
            Sew::E64 => self.read::<u64>(reg, idx),
        }
    }

    /// Write element `idx` at a runtime-selected width, truncating `val`.
    pub fn write_elem(&mut self, reg: usize, sew: Sew, idx: usize, val: u64) {
        match sew {
            Sew::E8 => self.write(reg, idx, val as u8),
            Sew::E16 => self.write(reg, idx, val as u16),
            Sew::E32 => self.write(reg, idx, val as u32),
            Sew::E64 => self.write(reg, idx, val),
        }
    }

    /// Mask bit `idx` of register `reg`: bit idx%8 of byte idx/8.
    #[inline]
    pub fn mask_bit(&self, reg: usize, idx: usize) -> bool {
        match self.data.get(reg * self.vlenb + idx / 8) {
            Some(b) => (b >> (idx % 8)) & 1 != 0,
            None => false,
        }
    }

    #[inline]
    pub fn set_mask_bit(&mut self, reg: usize, idx: usize, val: bool) {
        if let Some(b) = self.data.get_mut(reg * self.vlenb + idx / 8) {
            if val {
                *b |= 1 << (idx % 8);
            } else {
                *b &= !(1 << (idx % 8));
            }
        }
    }

    /// Is lane `idx` enabled: unmasked, or v0 bit set.
    #[inline]
    pub fn active(&self, vm: bool, idx: usize) -> bool {
        vm || self.mask_bit(0, idx)
    }

    /// Bytes of register `reg`; empty past v31.
    pub fn reg(&self, reg: usize) -> &[u8] {
        self.data
            .get(reg * self.vlenb..(reg + 1) * self.vlenb)
            .unwrap_or_default()
    }

    pub fn reg_mut(&mut self, reg: usize) -> &mut [u8] {
        self.data
            .get_mut(reg * self.vlenb..(reg + 1) * self.vlenb)
            .unwrap_or_default()
    }

    /// Copy `nregs` whole registers from `src` to `dst`.
    pub fn copy_regs(&mut self, dst: usize, src: usize, nregs: usize) {
        let len = nregs * self.vlenb;
        let (s, d) = (src * self.vlenb, dst * self.vlenb);
        if s + len <= self.data.len() && d + len <= self.data.len() {
            self.data.copy_within(s..s + len, d);
        }
    }
}
