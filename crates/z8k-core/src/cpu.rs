//! The Z8000 core: state, fetch/dispatch loops, bus plumbing and trace hooks.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use thiserror::Error;

use crate::bus::{IoBus, IoMode, MemoryBus};
use crate::exception::{IRQ_NVI, IRQ_RESET, IRQ_VI};
use crate::flags::{F_SEG, F_S_N};
use crate::registers::RegisterFile;
use crate::table;

/// Which of the two family members this core behaves as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum CpuModel {
    /// Non-segmented, 16-bit address space.
    Z8002,
    /// Segmented, 7-bit segment + 16-bit offset address space.
    Z8001,
}

impl CpuModel {
    /// Vector-table entry scale: Z8002 entries are 4 bytes, Z8001 entries 8.
    #[must_use]
    pub(crate) const fn vector_mult(self) -> u32 {
        match self {
            Self::Z8002 => 1,
            Self::Z8001 => 2,
        }
    }
}

/// Host-level failures. Architectural faults never appear here; they route
/// through the trap machinery instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("no program memory bus attached")]
    NoProgramMemory,
    #[error("no I/O bus attached")]
    NoIoBus,
}

/// Maskable interrupt request lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrqLine {
    /// Non-vectored interrupt, gated by FCW.NVIE.
    Nvi,
    /// Vectored interrupt, gated by FCW.VIE.
    Vi,
}

/// Memory spaces an access can target. On a core with only a program bus
/// attached, data and stack accesses fall back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MemSpace {
    Program,
    Data,
    Stack,
}

/// Receiver for the optional per-instruction trace hooks.
///
/// Sink failures must not perturb the core, so these methods return nothing;
/// implementations are expected to swallow their own I/O errors.
pub trait TraceSink {
    /// One disassembled instruction, before it executes. `words` holds the
    /// raw instruction words.
    fn instruction(&mut self, pc: u32, words: &[u16], text: &str);

    /// Register dump after an instruction retired.
    fn registers(&mut self, regs: &[u16; 16], fcw: u16, pc: u32);
}

/// Cycle budget used when `run` is called with a negative budget.
const DEFAULT_RUN_CYCLES: i64 = 1_000_000;

/// Cycles consumed per idle pass through the halted run loop.
const HALT_IDLE_CYCLES: i64 = 4;

/// The interpreter core for one Z8001 or Z8002.
pub struct Z8000 {
    pub(crate) model: CpuModel,
    pub(crate) regs: RegisterFile,
    /// Current program counter, `(seg << 16) | offset` when segmented.
    pub(crate) pc: u32,
    /// PC at which the executing instruction began.
    pub(crate) ppc: u32,
    pub(crate) fcw: u16,
    pub(crate) refresh: u16,
    pub(crate) psap_seg: u16,
    pub(crate) psap_off: u16,
    pub(crate) nsp_seg: u16,
    pub(crate) nsp_off: u16,
    /// Pending exception/interrupt bitmask, highest bit = highest priority.
    pub(crate) irq_req: u16,
    /// Last sampled vectored-interrupt vector byte.
    pub(crate) irq_vec: u16,
    pub(crate) halted: bool,
    pub(crate) icount: i64,
    pub(crate) total_cycles: u64,
    /// Cached operand words for the executing instruction.
    pub(crate) op: [u32; 4],
    pub(crate) op_valid: u8,

    // External line state, written by the embedder (possibly from a signal
    // handler) and sampled at the top of each dispatch cycle.
    nmi_line: AtomicBool,
    nvi_line: AtomicBool,
    vi_line: AtomicBool,
    vi_vector: AtomicU8,
    nmi_latch: bool,

    program: Option<Box<dyn MemoryBus>>,
    data: Option<Box<dyn MemoryBus>>,
    stack: Option<Box<dyn MemoryBus>>,
    io: Option<Box<dyn IoBus>>,

    trace: bool,
    reg_trace: bool,
    sink: Option<Box<dyn TraceSink>>,
}

/// Packs an internal `(seg << 16) | offset` address into the long in-memory
/// representation: high word `0x8000 | seg << 8`, low word the offset.
#[must_use]
pub(crate) fn make_segmented_addr(addr: u32) -> u32 {
    ((addr & 0x007F_0000) << 8) | 0x8000_0000 | (addr & 0xFFFF)
}

/// Unpacks the long in-memory/register address representation back into the
/// internal `(seg << 16) | offset` form.
#[must_use]
pub(crate) fn segmented_addr(value: u32) -> u32 {
    ((value >> 8) & 0x007F_0000) | (value & 0xFFFF)
}

impl Z8000 {
    /// Creates a core of the given model with cleared state and no buses.
    #[must_use]
    pub fn new(model: CpuModel) -> Self {
        Self {
            model,
            regs: RegisterFile::default(),
            pc: 0,
            ppc: 0,
            fcw: 0,
            refresh: 0,
            psap_seg: 0,
            psap_off: 0,
            nsp_seg: 0,
            nsp_off: 0,
            irq_req: 0,
            irq_vec: 0,
            halted: false,
            icount: 0,
            total_cycles: 0,
            op: [0; 4],
            op_valid: 0,
            nmi_line: AtomicBool::new(false),
            nvi_line: AtomicBool::new(false),
            vi_line: AtomicBool::new(false),
            vi_vector: AtomicU8::new(0),
            nmi_latch: false,
            program: None,
            data: None,
            stack: None,
            io: None,
            trace: false,
            reg_trace: false,
            sink: None,
        }
    }

    /// Convenience constructor for the non-segmented model.
    #[must_use]
    pub fn z8002() -> Self {
        Self::new(CpuModel::Z8002)
    }

    /// Convenience constructor for the segmented model.
    #[must_use]
    pub fn z8001() -> Self {
        Self::new(CpuModel::Z8001)
    }

    // ---- bus attachment -------------------------------------------------

    pub fn set_program_memory(&mut self, bus: Box<dyn MemoryBus>) {
        self.program = Some(bus);
    }

    pub fn set_data_memory(&mut self, bus: Box<dyn MemoryBus>) {
        self.data = Some(bus);
    }

    pub fn set_stack_memory(&mut self, bus: Box<dyn MemoryBus>) {
        self.stack = Some(bus);
    }

    pub fn set_io(&mut self, bus: Box<dyn IoBus>) {
        self.io = Some(bus);
    }

    // ---- lifecycle -------------------------------------------------------

    /// Requests a reset. State is cleared immediately; the reset vector is
    /// fetched on the next `run`/`step`.
    pub fn reset(&mut self) {
        self.clear_internal_state();
        self.irq_req |= IRQ_RESET;
        self.refresh &= 0x7FFF;
        self.halted = false;
    }

    fn clear_internal_state(&mut self) {
        self.regs.clear();
        self.op = [0; 4];
        self.op_valid = 0;
        self.pc = 0;
        self.ppc = 0;
        self.fcw = 0;
        self.refresh = 0;
        self.psap_seg = 0;
        self.psap_off = 0;
        self.nsp_seg = 0;
        self.nsp_off = 0;
        self.irq_req = 0;
        self.irq_vec = 0;
        self.halted = false;
        self.nmi_latch = false;
        self.total_cycles = 0;
    }

    /// Executes one instruction, or services one pending exception, and
    /// returns the cycles consumed. Returns 0 when halted with nothing
    /// pending.
    ///
    /// # Errors
    ///
    /// Fails when the program or I/O bus is missing.
    pub fn step(&mut self) -> Result<u64, CoreError> {
        self.ensure_buses()?;

        let before = self.total_cycles;
        self.sample_lines();
        if self.irq_req != 0 && self.service_pending() {
            return Ok(self.total_cycles - before);
        }

        if self.halted {
            return Ok(0);
        }

        self.ppc = self.pc;
        self.execute_one();
        Ok(self.total_cycles - before)
    }

    /// Runs until the cycle budget is exhausted or the core halts with no
    /// pending interrupt. A negative budget selects a large default. Returns
    /// the cycles consumed.
    ///
    /// # Errors
    ///
    /// Fails when the program or I/O bus is missing.
    pub fn run(&mut self, max_cycles: i64) -> Result<u64, CoreError> {
        self.ensure_buses()?;

        self.icount = if max_cycles < 0 { DEFAULT_RUN_CYCLES } else { max_cycles };
        let before = self.total_cycles;

        while self.icount > 0 {
            self.sample_lines();
            if self.irq_req != 0 {
                self.service_pending();
            }

            self.ppc = self.pc;
            if self.halted {
                // Idle: burn budget so timed interrupt arrival can be
                // simulated, but touch nothing except the cycle counters.
                let idle = self.icount.min(HALT_IDLE_CYCLES);
                self.cycles(idle as u32);
                if self.irq_req == 0
                    && !self.nmi_line.load(Ordering::Relaxed)
                    && !self.vi_line.load(Ordering::Relaxed)
                    && !self.nvi_line.load(Ordering::Relaxed)
                {
                    // Nothing can wake us from inside this call.
                    let rest = self.icount.max(0) as u64;
                    self.total_cycles += rest;
                    self.icount = 0;
                    break;
                }
            } else {
                self.execute_one();
            }
        }

        Ok(self.total_cycles - before)
    }

    fn execute_one(&mut self) {
        self.op[0] = u32::from(self.rdop());
        self.op_valid = 1;

        if self.trace {
            self.trace_instruction();
        }

        let entry = *table::dispatch().entry(self.op[0] as u16);
        self.cycles(u32::from(entry.cycles));
        (entry.exec)(self);
        self.op_valid = 0;

        if self.reg_trace {
            self.trace_registers();
        }
    }

    fn ensure_buses(&self) -> Result<(), CoreError> {
        if self.program.is_none() {
            return Err(CoreError::NoProgramMemory);
        }
        if self.io.is_none() {
            return Err(CoreError::NoIoBus);
        }
        Ok(())
    }

    // ---- external lines --------------------------------------------------

    /// Updates the NMI line. Edge-triggered: a low-to-high transition latches
    /// one pending NMI at the next dispatch cycle. Safe to call from a signal
    /// handler.
    pub fn set_nmi(&self, asserted: bool) {
        self.nmi_line.store(asserted, Ordering::Relaxed);
    }

    /// Updates a maskable interrupt line. Level-triggered: the request stays
    /// pending while the line is asserted. Safe to call from a signal
    /// handler.
    pub fn set_irq(&self, line: IrqLine, asserted: bool) {
        match line {
            IrqLine::Nvi => self.nvi_line.store(asserted, Ordering::Relaxed),
            IrqLine::Vi => self.vi_line.store(asserted, Ordering::Relaxed),
        }
    }

    /// Sets the vector byte presented with the next vectored interrupt.
    pub fn set_irq_vector(&self, vector: u8) {
        self.vi_vector.store(vector, Ordering::Relaxed);
    }

    fn sample_lines(&mut self) {
        let nmi = self.nmi_line.load(Ordering::Relaxed);
        if nmi && !self.nmi_latch {
            self.irq_req |= crate::exception::IRQ_NMI;
        }
        self.nmi_latch = nmi;

        if self.vi_line.load(Ordering::Relaxed) {
            self.irq_req |= IRQ_VI;
            self.irq_vec = u16::from(self.vi_vector.load(Ordering::Relaxed));
        } else {
            self.irq_req &= !IRQ_VI;
        }
        if self.nvi_line.load(Ordering::Relaxed) {
            self.irq_req |= IRQ_NVI;
        } else {
            self.irq_req &= !IRQ_NVI;
        }
    }

    /// True when an exception the current FCW would honor is pending. Block
    /// instructions poll this between elements.
    pub(crate) fn honored_request_pending(&mut self) -> bool {
        self.sample_lines();
        let req = self.irq_req;
        if req & !(IRQ_VI | IRQ_NVI) != 0 {
            return true;
        }
        (req & IRQ_VI != 0 && self.fcw & crate::flags::F_VIE != 0)
            || (req & IRQ_NVI != 0 && self.fcw & crate::flags::F_NVIE != 0)
    }

    // ---- observers ---------------------------------------------------------

    #[must_use]
    pub fn get_reg(&self, i: usize) -> u16 {
        self.regs.word(i)
    }

    /// Writes a word register; intended for test harnesses and monitors.
    pub fn set_reg(&mut self, i: usize, value: u16) {
        self.regs.set_word(i, value);
    }

    #[must_use]
    pub fn regs(&self) -> &RegisterFile {
        &self.regs
    }

    #[must_use]
    pub fn get_pc(&self) -> u32 {
        self.pc
    }

    #[must_use]
    pub fn get_ppc(&self) -> u32 {
        self.ppc
    }

    #[must_use]
    pub fn get_fcw(&self) -> u16 {
        self.fcw
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    #[must_use]
    pub fn get_cycles(&self) -> u64 {
        self.total_cycles
    }

    #[must_use]
    pub fn model(&self) -> CpuModel {
        self.model
    }

    // ---- tracing -----------------------------------------------------------

    pub fn set_trace(&mut self, enable: bool) {
        self.trace = enable;
    }

    pub fn set_reg_trace(&mut self, enable: bool) {
        self.reg_trace = enable;
    }

    /// Installs a trace sink. Without one, enabled traces go to stdout.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.sink = Some(sink);
    }

    fn trace_instruction(&mut self) {
        let segmented = self.segmented();
        let pc = self.ppc;
        let Some(program) = self.program.as_deref_mut() else {
            return;
        };

        let (text, words) = crate::disasm::disassemble(program, pc, segmented);
        let mut raw = [0u16; 4];
        let n = (words as usize).min(4);
        for (i, slot) in raw[..n].iter_mut().enumerate() {
            *slot = program.read_word(pc.wrapping_add(2 * i as u32));
        }

        if let Some(sink) = self.sink.as_deref_mut() {
            sink.instruction(pc, &raw[..n], &text);
        } else {
            use std::io::Write;
            let mut line = if segmented && pc >> 16 != 0 {
                format!("<<{:X}>>{:04X}:", (pc >> 16) & 0x7F, pc & 0xFFFF)
            } else {
                format!("PC={:04X}:", pc & 0xFFFF)
            };
            for w in &raw[..n] {
                line.push_str(&format!(" {w:04X}"));
            }
            for _ in n..3 {
                line.push_str("     ");
            }
            let _ = writeln!(std::io::stdout(), "{line}  {text}");
        }
    }

    fn trace_registers(&mut self) {
        let words = self.regs.words();
        let fcw = self.fcw;
        let pc = self.pc;
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.registers(&words, fcw, pc);
        } else {
            use std::io::Write;
            let out = std::io::stdout();
            let mut out = out.lock();
            let _ = writeln!(out, "PC={:04X}  FCW={fcw:04X}", pc & 0xFFFF);
            for row in 0..4 {
                let i = row * 4;
                let _ = writeln!(
                    out,
                    "R{i:<2}={:04X}  R{:<2}={:04X}  R{:<2}={:04X}  R{:<2}={:04X}",
                    words[i],
                    i + 1,
                    words[i + 1],
                    i + 2,
                    words[i + 2],
                    i + 3,
                    words[i + 3],
                );
            }
        }
    }

    // ---- register sugar ----------------------------------------------------

    #[inline]
    pub(crate) fn rw(&self, i: usize) -> u16 {
        self.regs.word(i)
    }

    #[inline]
    pub(crate) fn set_rw(&mut self, i: usize, v: u16) {
        self.regs.set_word(i, v);
    }

    #[inline]
    pub(crate) fn rb(&self, i: usize) -> u8 {
        self.regs.byte(i)
    }

    #[inline]
    pub(crate) fn set_rb(&mut self, i: usize, v: u8) {
        self.regs.set_byte(i, v);
    }

    #[inline]
    pub(crate) fn rl(&self, i: usize) -> u32 {
        self.regs.long(i)
    }

    #[inline]
    pub(crate) fn set_rl(&mut self, i: usize, v: u32) {
        self.regs.set_long(i, v);
    }

    #[inline]
    pub(crate) fn rq(&self, i: usize) -> u64 {
        self.regs.quad(i)
    }

    #[inline]
    pub(crate) fn set_rq(&mut self, i: usize, v: u64) {
        self.regs.set_quad(i, v);
    }

    // ---- mode and address helpers -------------------------------------------

    #[must_use]
    pub(crate) fn segmented(&self) -> bool {
        self.model == CpuModel::Z8001 && self.fcw & F_SEG != 0
    }

    /// Adds to an address, wrapping the 16-bit offset without disturbing the
    /// segment.
    #[must_use]
    pub(crate) fn addr_add(addr: u32, addend: u32) -> u32 {
        (addr & 0xFFFF_0000) | (addr.wrapping_add(addend) & 0xFFFF)
    }

    /// Subtracts from an address, wrapping the 16-bit offset.
    #[must_use]
    pub(crate) fn addr_sub(addr: u32, subtrahend: u32) -> u32 {
        (addr & 0xFFFF_0000) | (addr.wrapping_sub(subtrahend) & 0xFFFF)
    }

    /// Signed offset variant of [`Self::addr_add`].
    #[must_use]
    pub(crate) fn addr_offset(addr: u32, delta: i32) -> u32 {
        Self::addr_add(addr, delta as u32)
    }

    /// On a Z8001 running non-segmented, data addresses borrow the high
    /// segment bits of PC. Instruction fetches bypass this.
    fn adjust_nonseg(&self, addr: u32) -> u32 {
        if self.model == CpuModel::Z8001 && self.fcw & F_SEG == 0 {
            (addr & 0xFFFF) | (self.pc & 0x007F_0000)
        } else {
            addr
        }
    }

    fn mem(&mut self, space: MemSpace) -> &mut dyn MemoryBus {
        let slot = match space {
            MemSpace::Program => &mut self.program,
            MemSpace::Data if self.data.is_some() => &mut self.data,
            MemSpace::Stack if self.stack.is_some() => &mut self.stack,
            MemSpace::Data | MemSpace::Stack => &mut self.program,
        };
        slot.as_deref_mut()
            .expect("bus presence is checked before dispatch")
    }

    // ---- memory access (width, alignment and ordering rules) -----------------

    pub(crate) fn rdmem_b(&mut self, space: MemSpace, addr: u32) -> u8 {
        let a = self.adjust_nonseg(addr);
        self.mem(space).read_byte(a)
    }

    pub(crate) fn rdmem_w(&mut self, space: MemSpace, addr: u32) -> u16 {
        let a = self.adjust_nonseg(addr) & !1;
        self.mem(space).read_word(a)
    }

    pub(crate) fn rdmem_l(&mut self, space: MemSpace, addr: u32) -> u32 {
        let a = self.adjust_nonseg(addr) & !1;
        let hi = self.mem(space).read_word(a);
        let lo = self.mem(space).read_word(Self::addr_add(a, 2));
        (u32::from(hi) << 16) | u32::from(lo)
    }

    /// Byte write as a masked word write: the other byte of the addressed
    /// word is preserved by contract.
    pub(crate) fn wrmem_b(&mut self, space: MemSpace, addr: u32, value: u8) {
        let a = self.adjust_nonseg(addr);
        let doubled = u16::from(value) | (u16::from(value) << 8);
        let mask = if a & 1 != 0 { 0x00FF } else { 0xFF00 };
        self.mem(space).write_word_masked(a & !1, doubled, mask);
    }

    pub(crate) fn wrmem_w(&mut self, space: MemSpace, addr: u32, value: u16) {
        let a = self.adjust_nonseg(addr) & !1;
        self.mem(space).write_word(a, value);
    }

    pub(crate) fn wrmem_l(&mut self, space: MemSpace, addr: u32, value: u32) {
        let a = self.adjust_nonseg(addr) & !1;
        self.mem(space).write_word(a, (value >> 16) as u16);
        self.mem(space)
            .write_word(Self::addr_add(a, 2), value as u16);
    }

    // ---- I/O access -----------------------------------------------------------

    pub(crate) fn rdport_b(&mut self, mode: IoMode, port: u16) -> u8 {
        self.io
            .as_deref_mut()
            .expect("bus presence is checked before dispatch")
            .read_byte(port, mode)
    }

    pub(crate) fn rdport_w(&mut self, mode: IoMode, port: u16) -> u16 {
        self.io
            .as_deref_mut()
            .expect("bus presence is checked before dispatch")
            .read_word(port, mode)
    }

    pub(crate) fn wrport_b(&mut self, mode: IoMode, port: u16, value: u8) {
        self.io
            .as_deref_mut()
            .expect("bus presence is checked before dispatch")
            .write_byte(port, value, mode);
    }

    pub(crate) fn wrport_w(&mut self, mode: IoMode, port: u16, value: u16) {
        self.io
            .as_deref_mut()
            .expect("bus presence is checked before dispatch")
            .write_word(port, value, mode);
    }

    // ---- fetch and cycle accounting ---------------------------------------------

    /// Fetches the next instruction word and advances PC.
    pub(crate) fn rdop(&mut self) -> u16 {
        let word = {
            let a = self.pc & !1;
            self.mem(MemSpace::Program).read_word(a)
        };
        self.pc = Self::addr_add(self.pc, 2);
        word
    }

    /// Deducts from the running budget and retires cycles.
    pub(crate) fn cycles(&mut self, n: u32) {
        self.icount -= i64::from(n);
        self.total_cycles += u64::from(n);
    }

    // ---- FCW, stack and pointer helpers -------------------------------------------

    /// Replaces the FCW. When the system/normal bit flips, the active stack
    /// pointer pair and the normal-mode shadow swap atomically with it.
    pub(crate) fn change_fcw(&mut self, new_fcw: u16) {
        if (new_fcw ^ self.fcw) & F_S_N != 0 {
            let off = self.regs.word(15);
            self.regs.set_word(15, self.nsp_off);
            self.nsp_off = off;
            if self.model == CpuModel::Z8001 {
                let seg = self.regs.word(14);
                self.regs.set_word(14, self.nsp_seg);
                self.nsp_seg = seg;
            }
        }
        self.fcw = new_fcw;
    }

    /// Effective address held in a register used as a memory pointer: a word
    /// register when non-segmented, a long register when segmented.
    #[must_use]
    pub(crate) fn ea_ir(&self, reg: usize) -> u32 {
        if self.segmented() {
            segmented_addr(self.rl(reg & 14))
        } else {
            u32::from(self.rw(reg))
        }
    }

    /// Adjusts a pointer register by a signed amount, wrapping the 16-bit
    /// offset. In segmented mode only the offset word of the pair moves.
    pub(crate) fn ptr_adjust(&mut self, reg: usize, delta: i32) {
        let i = if self.segmented() { (reg & 14) | 1 } else { reg & 15 };
        let v = self.regs.word(i).wrapping_add(delta as u16);
        self.regs.set_word(i, v);
    }

    /// Stack pointer register: the R14:R15 pair segmented, R15 otherwise.
    #[must_use]
    pub(crate) fn sp_reg(&self) -> usize {
        if self.segmented() {
            14
        } else {
            15
        }
    }

    /// Decrement-then-write word push through an arbitrary pointer register.
    pub(crate) fn push_w_via(&mut self, reg: usize, value: u16) {
        self.ptr_adjust(reg, -2);
        let a = self.ea_ir(reg);
        self.wrmem_w(MemSpace::Stack, a, value);
    }

    /// Read-then-increment word pop through an arbitrary pointer register.
    pub(crate) fn pop_w_via(&mut self, reg: usize) -> u16 {
        let a = self.ea_ir(reg);
        let v = self.rdmem_w(MemSpace::Stack, a);
        self.ptr_adjust(reg, 2);
        v
    }

    pub(crate) fn push_l_via(&mut self, reg: usize, value: u32) {
        self.ptr_adjust(reg, -4);
        let a = self.ea_ir(reg);
        self.wrmem_l(MemSpace::Stack, a, value);
    }

    pub(crate) fn pop_l_via(&mut self, reg: usize) -> u32 {
        let a = self.ea_ir(reg);
        let v = self.rdmem_l(MemSpace::Stack, a);
        self.ptr_adjust(reg, 4);
        v
    }

    pub(crate) fn push_w(&mut self, value: u16) {
        self.push_w_via(self.sp_reg(), value);
    }

    pub(crate) fn pop_w(&mut self) -> u16 {
        self.pop_w_via(self.sp_reg())
    }

    pub(crate) fn push_l(&mut self, value: u32) {
        self.push_l_via(self.sp_reg(), value);
    }

    pub(crate) fn pop_l(&mut self) -> u32 {
        self.pop_l_via(self.sp_reg())
    }

    /// Pushes the return PC: a long in segmented mode, a word otherwise.
    pub(crate) fn push_pc(&mut self) {
        if self.segmented() {
            self.push_l(make_segmented_addr(self.pc));
        } else {
            self.push_w(self.pc as u16);
        }
    }

    /// Pops a return PC pushed by [`Self::push_pc`].
    pub(crate) fn pop_pc(&mut self) -> u32 {
        if self.segmented() {
            segmented_addr(self.pop_l())
        } else {
            u32::from(self.pop_w())
        }
    }

    /// In user mode, latches a privileged-instruction trap and reports the
    /// violation; handlers bail out when this returns false.
    pub(crate) fn privileged(&mut self) -> bool {
        if self.fcw & F_S_N != 0 {
            true
        } else {
            self.irq_req |= crate::exception::IRQ_TRAP;
            false
        }
    }
}

impl std::fmt::Debug for Z8000 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Z8000")
            .field("model", &self.model)
            .field("pc", &self.pc)
            .field("fcw", &self.fcw)
            .field("halted", &self.halted)
            .field("total_cycles", &self.total_cycles)
            .finish_non_exhaustive()
    }
}
