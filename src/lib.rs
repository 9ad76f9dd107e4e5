//! Per-lane execution semantics for the RISC-V vector extension.
//!
//! [`cpu::Cpu`] holds the vector register file and the CSRs the vector unit
//! reads and writes. Vector instructions are methods on it taking decoded
//! operands and a [`cpu::vector::Desc`]; memory instructions additionally
//! take a [`memory::GuestMemory`].

pub mod cpu;
pub mod memory;
