//! AArch64 instruction decoding and call site matching
pub mod disasm;
pub mod locator;
