//! Instruction-interpreter core for the Zilog Z8000 family: the segmented
//! Z8001 and the non-segmented Z8002.
//!
//! The crate models the register file with its byte/word/long/quad aliasing,
//! a flat first-word dispatch table over precomputed generator rows, the
//! per-instruction semantic routines with exact flag effects, the
//! trap/interrupt service sequence and the abstract memory and I/O buses an
//! embedder supplies. Everything host-facing goes through [`Z8000`].

/// Abstract memory and I/O bus contracts.
pub mod bus;
pub use bus::{IoBus, IoMode, MemoryBus};

/// FCW bit layout and condition-code predicates.
pub mod flags;
pub use flags::{
    cc_holds, cc_name, F_C, F_DA, F_EPA, F_H, F_NVIE, F_PV, F_S, F_SEG, F_S_N, F_VIE, F_Z,
};

/// The general-purpose register file and its overlapping views.
pub mod registers;
pub use registers::{RegisterFile, WORD_REGISTER_COUNT};

/// The CPU core and host-facing façade.
mod cpu;
pub use cpu::{CoreError, CpuModel, IrqLine, TraceSink, Z8000};

/// Cached operand-word stream.
mod decode;

/// Exception, trap and interrupt service.
mod exception;

/// Instruction semantics.
mod exec;

/// First-word dispatch table.
mod table;

/// Trace disassembler.
pub mod disasm;
pub use disasm::disassemble;

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
