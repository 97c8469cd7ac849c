//! First-word opcode dispatch.
//!
//! The source of truth is a compact list of generator rows, each covering a
//! range of first-word values. Families that encode a sub-operation in the
//! low nibble go through 16-entry sub-op tables. At first use the rows are
//! expanded into a flat 65,536-entry index so the run loop resolves any
//! first word with two array lookups; every word no row claims resolves to
//! the reserved entry, which raises the extended-instruction trap.
//!
//! Each resolved entry carries the handler, the cycle cost charged at
//! dispatch, the instruction size in words (before segmented long-address
//! growth) and the operand-format string the disassembler renders.

use once_cell::sync::Lazy;

use crate::cpu::Z8000;
use crate::exec::{arith, bits, block, control, io, load, logic, shift};

pub(crate) type OpExec = fn(&mut Z8000);

#[derive(Clone, Copy)]
pub(crate) struct OpEntry {
    pub exec: OpExec,
    pub cycles: u16,
    pub size: u8,
    pub fmt: &'static str,
}

const fn op(exec: OpExec, cycles: u16, size: u8, fmt: &'static str) -> OpEntry {
    OpEntry { exec, cycles, size, fmt }
}

pub(crate) const RESERVED: OpEntry = op(control::reserved, 4, 1, "!res");

enum RowKind {
    One(OpEntry),
    Sub(&'static [OpEntry; 16]),
}

struct OpRange {
    beg: u16,
    end: u16,
    step: u16,
    kind: RowKind,
}

const fn one(beg: u16, end: u16, step: u16, entry: OpEntry) -> OpRange {
    OpRange { beg, end, step, kind: RowKind::One(entry) }
}

const fn sub(beg: u16, end: u16, table: &'static [OpEntry; 16]) -> OpRange {
    OpRange { beg, end, step: 1, kind: RowKind::Sub(table) }
}

// ---- sub-op tables (low-nibble secondary decode) -------------------------

/// Byte destination group, indirect-register mode (first byte 0x0C).
static GROUP_0C: [OpEntry; 16] = [
    op(logic::comb_ir, 12, 1, "comb %IR2"),
    op(arith::cpb_imm_ir, 11, 2, "cpb %IR2,%IMB"),
    op(arith::negb_ir, 12, 1, "negb %IR2"),
    RESERVED,
    op(logic::testb_ir, 8, 1, "testb %IR2"),
    op(load::ldb_imm_ir, 11, 2, "ldb %IR2,%IMB"),
    op(bits::tsetb_ir, 11, 1, "tsetb %IR2"),
    RESERVED,
    op(load::clrb_ir, 8, 1, "clrb %IR2"),
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
];

/// Word destination group, indirect-register mode (0x0D).
static GROUP_0D: [OpEntry; 16] = [
    op(logic::com_ir, 12, 1, "com %IR2"),
    op(arith::cp_imm_ir, 11, 2, "cp %IR2,%IMW"),
    op(arith::neg_ir, 12, 1, "neg %IR2"),
    RESERVED,
    op(logic::test_ir, 8, 1, "test %IR2"),
    op(load::ld_imm_ir, 11, 2, "ld %IR2,%IMW"),
    op(bits::tset_ir, 11, 1, "tset %IR2"),
    RESERVED,
    op(load::clr_ir, 8, 1, "clr %IR2"),
    op(load::push_im_ir, 12, 2, "push %IR2,%IMW"),
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
];

/// Byte destination group, direct/indexed mode (0x4C).
static GROUP_4C: [OpEntry; 16] = [
    op(logic::comb_da_x, 15, 2, "comb %ADR"),
    op(arith::cpb_imm_da_x, 14, 3, "cpb %ADR,%IMB2"),
    op(arith::negb_da_x, 15, 2, "negb %ADR"),
    RESERVED,
    op(logic::testb_da_x, 11, 2, "testb %ADR"),
    op(load::ldb_imm_da_x, 14, 3, "ldb %ADR,%IMB2"),
    op(bits::tsetb_da_x, 14, 2, "tsetb %ADR"),
    RESERVED,
    op(load::clrb_da_x, 11, 2, "clrb %ADR"),
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
];

/// Word destination group, direct/indexed mode (0x4D).
static GROUP_4D: [OpEntry; 16] = [
    op(logic::com_da_x, 15, 2, "com %ADR"),
    op(arith::cp_imm_da_x, 14, 3, "cp %ADR,%IMW2"),
    op(arith::neg_da_x, 15, 2, "neg %ADR"),
    RESERVED,
    op(logic::test_da_x, 11, 2, "test %ADR"),
    op(load::ld_imm_da_x, 14, 3, "ld %ADR,%IMW2"),
    op(bits::tset_da_x, 14, 2, "tset %ADR"),
    RESERVED,
    op(load::clr_da_x, 11, 2, "clr %ADR"),
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
];

/// Byte destination group, register mode (0x8C); also hosts LDCTLB.
static GROUP_8C: [OpEntry; 16] = [
    op(logic::comb_r, 7, 1, "comb %RB2"),
    op(control::ldctlb_from, 7, 1, "ldctlb %RB2,flags"),
    op(arith::negb_r, 7, 1, "negb %RB2"),
    RESERVED,
    op(logic::testb_r, 7, 1, "testb %RB2"),
    RESERVED,
    op(bits::tsetb_r, 7, 1, "tsetb %RB2"),
    RESERVED,
    op(load::clrb_r, 7, 1, "clrb %RB2"),
    op(control::ldctlb_to, 7, 1, "ldctlb flags,%RB2"),
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
];

/// Word destination group, register mode (0x8D); also hosts the flag ops
/// and NOP.
static GROUP_8D: [OpEntry; 16] = [
    op(logic::com_r, 7, 1, "com %RW2"),
    op(control::setflg, 7, 1, "setflg %FLG2"),
    op(arith::neg_r, 7, 1, "neg %RW2"),
    op(control::resflg, 7, 1, "resflg %FLG2"),
    op(logic::test_r, 7, 1, "test %RW2"),
    op(control::comflg, 7, 1, "comflg %FLG2"),
    op(bits::tset_r, 7, 1, "tset %RW2"),
    op(control::nop, 7, 1, "nop"),
    op(load::clr_r, 7, 1, "clr %RW2"),
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
];

/// Sign-extension group (0xB1).
static GROUP_B1: [OpEntry; 16] = [
    op(arith::extsb, 11, 1, "extsb %RW2"),
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    op(arith::extsl, 11, 1, "extsl %RQ2"),
    RESERVED,
    RESERVED,
    op(arith::exts, 11, 1, "exts %RL2"),
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
];

/// LDCTL group (0x7D): low three bits select the control register, bit 3
/// the direction.
static GROUP_7D: [OpEntry; 16] = [
    op(control::ldctl_from, 7, 1, "ldctl %RW2,%CTL3"),
    op(control::ldctl_from, 7, 1, "ldctl %RW2,%CTL3"),
    op(control::ldctl_from, 7, 1, "ldctl %RW2,%CTL3"),
    op(control::ldctl_from, 7, 1, "ldctl %RW2,%CTL3"),
    op(control::ldctl_from, 7, 1, "ldctl %RW2,%CTL3"),
    op(control::ldctl_from, 7, 1, "ldctl %RW2,%CTL3"),
    op(control::ldctl_from, 7, 1, "ldctl %RW2,%CTL3"),
    op(control::ldctl_from, 7, 1, "ldctl %RW2,%CTL3"),
    op(control::ldctl_to, 7, 1, "ldctl %CTL3,%RW2"),
    op(control::ldctl_to, 7, 1, "ldctl %CTL3,%RW2"),
    op(control::ldctl_to, 7, 1, "ldctl %CTL3,%RW2"),
    op(control::ldctl_to, 7, 1, "ldctl %CTL3,%RW2"),
    op(control::ldctl_to, 7, 1, "ldctl %CTL3,%RW2"),
    op(control::ldctl_to, 7, 1, "ldctl %CTL3,%RW2"),
    op(control::ldctl_to, 7, 1, "ldctl %CTL3,%RW2"),
    op(control::ldctl_to, 7, 1, "ldctl %CTL3,%RW2"),
];

/// Byte shift/rotate group (0xB2). Rotates encode their count in bit 1;
/// shifts take a count word or a count register.
static SHIFT_B: [OpEntry; 16] = [
    op(shift::rlb, 6, 1, "rlb %RB2,#%ROTN"),
    op(shift::sllb_srlb, 13, 2, "sllb %RB2,%SHC"),
    op(shift::rlb, 7, 1, "rlb %RB2,#%ROTN"),
    op(shift::sdlb, 15, 2, "sdlb %RB2,%SHR1"),
    op(shift::rrb, 6, 1, "rrb %RB2,#%ROTN"),
    RESERVED,
    op(shift::rrb, 7, 1, "rrb %RB2,#%ROTN"),
    RESERVED,
    op(shift::rlcb, 6, 1, "rlcb %RB2,#%ROTN"),
    op(shift::slab_srab, 13, 2, "slab %RB2,%SHC"),
    op(shift::rlcb, 7, 1, "rlcb %RB2,#%ROTN"),
    op(shift::sdab, 15, 2, "sdab %RB2,%SHR1"),
    op(shift::rrcb, 6, 1, "rrcb %RB2,#%ROTN"),
    RESERVED,
    op(shift::rrcb, 7, 1, "rrcb %RB2,#%ROTN"),
    RESERVED,
];

/// Word and long shift/rotate group (0xB3).
static SHIFT_W: [OpEntry; 16] = [
    op(shift::rl, 6, 1, "rl %RW2,#%ROTN"),
    op(shift::sll_srl, 13, 2, "sll %RW2,%SHC"),
    op(shift::rl, 7, 1, "rl %RW2,#%ROTN"),
    op(shift::sdl, 15, 2, "sdl %RW2,%SHR1"),
    op(shift::rr, 6, 1, "rr %RW2,#%ROTN"),
    op(shift::slll_srll, 13, 2, "slll %RL2,%SHC"),
    op(shift::rr, 7, 1, "rr %RW2,#%ROTN"),
    op(shift::sdll, 15, 2, "sdll %RL2,%SHR1"),
    op(shift::rlc, 6, 1, "rlc %RW2,#%ROTN"),
    op(shift::sla_sra, 13, 2, "sla %RW2,%SHC"),
    op(shift::rlc, 7, 1, "rlc %RW2,#%ROTN"),
    op(shift::sda, 15, 2, "sda %RW2,%SHR1"),
    op(shift::rrc, 6, 1, "rrc %RW2,#%ROTN"),
    op(shift::slal_sral, 13, 2, "slal %RL2,%SHC"),
    op(shift::rrc, 7, 1, "rrc %RW2,#%ROTN"),
    op(shift::sdal, 15, 2, "sdal %RL2,%SHR1"),
];

/// Byte translate group (0xB8).
static TRANS_B: [OpEntry; 16] = [
    op(block::trib, 25, 2, "!blk"),
    RESERVED,
    op(block::trtib, 25, 2, "!blk"),
    RESERVED,
    op(block::trirb, 25, 2, "!blk"),
    RESERVED,
    op(block::trtirb, 25, 2, "!blk"),
    RESERVED,
    op(block::trdb, 25, 2, "!blk"),
    RESERVED,
    op(block::trtdb, 25, 2, "!blk"),
    RESERVED,
    op(block::trdrb, 25, 2, "!blk"),
    RESERVED,
    op(block::trtdrb, 25, 2, "!blk"),
    RESERVED,
];

/// Byte block transfer/search group (0xBA).
static BLOCK_B: [OpEntry; 16] = [
    op(block::cpi_b, 11, 2, "!blk"),
    op(block::ldi_b, 11, 2, "!blk"),
    op(block::cpsi_b, 11, 2, "!blk"),
    RESERVED,
    op(block::cpir_b, 11, 2, "!blk"),
    RESERVED,
    op(block::cpsir_b, 11, 2, "!blk"),
    RESERVED,
    op(block::cpd_b, 11, 2, "!blk"),
    op(block::ldd_b, 11, 2, "!blk"),
    op(block::cpsd_b, 11, 2, "!blk"),
    RESERVED,
    op(block::cpdr_b, 11, 2, "!blk"),
    RESERVED,
    op(block::cpsdr_b, 11, 2, "!blk"),
    RESERVED,
];

/// Word block transfer/search group (0xBB).
static BLOCK_W: [OpEntry; 16] = [
    op(block::cpi_w, 11, 2, "!blk"),
    op(block::ldi_w, 11, 2, "!blk"),
    op(block::cpsi_w, 11, 2, "!blk"),
    RESERVED,
    op(block::cpir_w, 11, 2, "!blk"),
    RESERVED,
    op(block::cpsir_w, 11, 2, "!blk"),
    RESERVED,
    op(block::cpd_w, 11, 2, "!blk"),
    op(block::ldd_w, 11, 2, "!blk"),
    op(block::cpsd_w, 11, 2, "!blk"),
    RESERVED,
    op(block::cpdr_w, 11, 2, "!blk"),
    RESERVED,
    op(block::cpsdr_w, 11, 2, "!blk"),
    RESERVED,
];

/// Byte I/O group (0x3A): direct-port singles and the block forms.
static IO_B: [OpEntry; 16] = [
    op(io::ini_b, 11, 2, "!blk"),
    op(io::sini_b, 11, 2, "!blk"),
    op(io::oti_b, 11, 2, "!blk"),
    op(io::soti_b, 11, 2, "!blk"),
    op(io::inb_im, 12, 2, "inb %RB2,%PORT"),
    op(io::sinb_im, 12, 2, "sinb %RB2,%PORT"),
    op(io::outb_im, 12, 2, "outb %PORT,%RB2"),
    op(io::soutb_im, 12, 2, "soutb %PORT,%RB2"),
    op(io::ind_b, 11, 2, "!blk"),
    op(io::sind_b, 11, 2, "!blk"),
    op(io::otd_b, 11, 2, "!blk"),
    op(io::sotd_b, 11, 2, "!blk"),
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
];

/// Word I/O group (0x3B).
static IO_W: [OpEntry; 16] = [
    op(io::ini_w, 11, 2, "!blk"),
    op(io::sini_w, 11, 2, "!blk"),
    op(io::oti_w, 11, 2, "!blk"),
    op(io::soti_w, 11, 2, "!blk"),
    op(io::in_im, 12, 2, "in %RW2,%PORT"),
    op(io::sin_im, 12, 2, "sin %RW2,%PORT"),
    op(io::out_im, 12, 2, "out %PORT,%RW2"),
    op(io::sout_im, 12, 2, "sout %PORT,%RW2"),
    op(io::ind_w, 11, 2, "!blk"),
    op(io::sind_w, 11, 2, "!blk"),
    op(io::otd_w, 11, 2, "!blk"),
    op(io::sotd_w, 11, 2, "!blk"),
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
];

// ---- generator rows ------------------------------------------------------

#[rustfmt::skip]
static ROWS: &[OpRange] = &[
    // 0x00..0x0B: byte/word arithmetic and logic, immediate and
    // register-indirect modes. A zero source nibble selects the immediate.
    one(0x0000, 0x000F, 1, op(arith::addb_im, 7, 2, "addb %RB3,%IMB")),
    one(0x0010, 0x00FF, 1, op(arith::addb_ir, 7, 1, "addb %RB3,%IR2")),
    one(0x0100, 0x010F, 1, op(arith::add_im, 7, 2, "add %RW3,%IMW")),
    one(0x0110, 0x01FF, 1, op(arith::add_ir, 7, 1, "add %RW3,%IR2")),
    one(0x0200, 0x020F, 1, op(arith::subb_im, 7, 2, "subb %RB3,%IMB")),
    one(0x0210, 0x02FF, 1, op(arith::subb_ir, 7, 1, "subb %RB3,%IR2")),
    one(0x0300, 0x030F, 1, op(arith::sub_im, 7, 2, "sub %RW3,%IMW")),
    one(0x0310, 0x03FF, 1, op(arith::sub_ir, 7, 1, "sub %RW3,%IR2")),
    one(0x0400, 0x040F, 1, op(logic::orb_im, 7, 2, "orb %RB3,%IMB")),
    one(0x0410, 0x04FF, 1, op(logic::orb_ir, 7, 1, "orb %RB3,%IR2")),
    one(0x0500, 0x050F, 1, op(logic::or_im, 7, 2, "or %RW3,%IMW")),
    one(0x0510, 0x05FF, 1, op(logic::or_ir, 7, 1, "or %RW3,%IR2")),
    one(0x0600, 0x060F, 1, op(logic::andb_im, 7, 2, "andb %RB3,%IMB")),
    one(0x0610, 0x06FF, 1, op(logic::andb_ir, 7, 1, "andb %RB3,%IR2")),
    one(0x0700, 0x070F, 1, op(logic::and_im, 7, 2, "and %RW3,%IMW")),
    one(0x0710, 0x07FF, 1, op(logic::and_ir, 7, 1, "and %RW3,%IR2")),
    one(0x0800, 0x080F, 1, op(logic::xorb_im, 7, 2, "xorb %RB3,%IMB")),
    one(0x0810, 0x08FF, 1, op(logic::xorb_ir, 7, 1, "xorb %RB3,%IR2")),
    one(0x0900, 0x090F, 1, op(logic::xor_im, 7, 2, "xor %RW3,%IMW")),
    one(0x0910, 0x09FF, 1, op(logic::xor_ir, 7, 1, "xor %RW3,%IR2")),
    one(0x0A00, 0x0A0F, 1, op(arith::cpb_im, 7, 2, "cpb %RB3,%IMB")),
    one(0x0A10, 0x0AFF, 1, op(arith::cpb_ir, 7, 1, "cpb %RB3,%IR2")),
    one(0x0B00, 0x0B0F, 1, op(arith::cp_im, 7, 2, "cp %RW3,%IMW")),
    one(0x0B10, 0x0BFF, 1, op(arith::cp_ir, 7, 1, "cp %RW3,%IR2")),
    sub(0x0C00, 0x0CFF, &GROUP_0C),
    sub(0x0D00, 0x0DFF, &GROUP_0D),
    // 0x0E/0x0F: extended-instruction space, left to the reserved entry.

    // 0x10..0x1F: long arithmetic, stack memory forms, LDM, JP/CALL.
    one(0x1000, 0x100F, 1, op(arith::cpl_im, 14, 3, "cpl %RL3,%IML")),
    one(0x1010, 0x10FF, 1, op(arith::cpl_ir, 14, 1, "cpl %RL3,%IR2")),
    one(0x1110, 0x11FF, 1, op(load::pushl_ir_mem, 20, 1, "pushl %IR2,%IR3")),
    one(0x1200, 0x120F, 1, op(arith::subl_im, 14, 3, "subl %RL3,%IML")),
    one(0x1210, 0x12FF, 1, op(arith::subl_ir, 14, 1, "subl %RL3,%IR2")),
    one(0x1310, 0x13FF, 1, op(load::push_ir_mem, 13, 1, "push %IR2,%IR3")),
    one(0x1400, 0x140F, 1, op(load::ldl_im, 11, 3, "ldl %RL3,%IML")),
    one(0x1410, 0x14FF, 1, op(load::ldl_ir, 11, 1, "ldl %RL3,%IR2")),
    one(0x1510, 0x15FF, 1, op(load::popl_ir_mem, 19, 1, "popl %IR3,%IR2")),
    one(0x1600, 0x160F, 1, op(arith::addl_im, 14, 3, "addl %RL3,%IML")),
    one(0x1610, 0x16FF, 1, op(arith::addl_ir, 14, 1, "addl %RL3,%IR2")),
    one(0x1710, 0x17FF, 1, op(load::pop_ir_mem, 12, 1, "pop %IR3,%IR2")),
    one(0x1800, 0x180F, 1, op(arith::multl_im, 282, 3, "multl %RQ3,%IML")),
    one(0x1810, 0x18FF, 1, op(arith::multl_ir, 282, 1, "multl %RQ3,%IR2")),
    one(0x1900, 0x190F, 1, op(arith::mult_im, 70, 2, "mult %RL3,%IMW")),
    one(0x1910, 0x19FF, 1, op(arith::mult_ir, 70, 1, "mult %RL3,%IR2")),
    one(0x1A00, 0x1A0F, 1, op(arith::divl_im, 744, 3, "divl %RQ3,%IML")),
    one(0x1A10, 0x1AFF, 1, op(arith::divl_ir, 744, 1, "divl %RQ3,%IR2")),
    one(0x1B00, 0x1B0F, 1, op(arith::div_im, 107, 2, "div %RL3,%IMW")),
    one(0x1B10, 0x1BFF, 1, op(arith::div_ir, 107, 1, "div %RL3,%IR2")),
    one(0x1C01, 0x1CF1, 0x10, op(load::ldm_ir_load, 11, 2, "!ldm")),
    one(0x1C08, 0x1CF8, 0x10, op(logic::testl_ir, 13, 1, "testl %IR2")),
    one(0x1C09, 0x1CF9, 0x10, op(load::ldm_ir_store, 11, 2, "!ldm")),
    one(0x1D10, 0x1DFF, 1, op(load::ldl_ir_store, 11, 1, "ldl %IR2,%RL3")),
    one(0x1E10, 0x1EFF, 1, op(control::jp_ir, 10, 1, "jp %CC3,%IR2")),
    one(0x1F10, 0x1FF0, 0x10, op(control::call_ir, 10, 1, "call %IR2")),

    // 0x20..0x2F: LD, bit operations, INC/DEC, EX.
    one(0x2000, 0x200F, 1, op(load::ldb_im, 7, 2, "ldb %RB3,%IMB")),
    one(0x2010, 0x20FF, 1, op(load::ldb_ir, 7, 1, "ldb %RB3,%IR2")),
    one(0x2100, 0x210F, 1, op(load::ld_im, 7, 2, "ld %RW3,%IMW")),
    one(0x2110, 0x21FF, 1, op(load::ld_ir, 7, 1, "ld %RW3,%IR2")),
    one(0x2200, 0x220F, 1, op(bits::resb_r_dyn, 10, 2, "resb %RBW1,%RW3")),
    one(0x2210, 0x22FF, 1, op(bits::resb_ir, 11, 1, "resb %IR2,%N3")),
    one(0x2300, 0x230F, 1, op(bits::res_r_dyn, 10, 2, "res %RWW1,%RW3")),
    one(0x2310, 0x23FF, 1, op(bits::res_ir, 11, 1, "res %IR2,%N3")),
    one(0x2400, 0x240F, 1, op(bits::setb_r_dyn, 10, 2, "setb %RBW1,%RW3")),
    one(0x2410, 0x24FF, 1, op(bits::setb_ir, 11, 1, "setb %IR2,%N3")),
    one(0x2500, 0x250F, 1, op(bits::set_r_dyn, 10, 2, "set %RWW1,%RW3")),
    one(0x2510, 0x25FF, 1, op(bits::set_ir, 11, 1, "set %IR2,%N3")),
    one(0x2600, 0x260F, 1, op(bits::bitb_r_dyn, 10, 2, "bitb %RBW1,%RW3")),
    one(0x2610, 0x26FF, 1, op(bits::bitb_ir, 8, 1, "bitb %IR2,%N3")),
    one(0x2700, 0x270F, 1, op(bits::bit_r_dyn, 10, 2, "bit %RWW1,%RW3")),
    one(0x2710, 0x27FF, 1, op(bits::bit_ir, 8, 1, "bit %IR2,%N3")),
    one(0x2810, 0x28FF, 1, op(arith::incb_ir, 11, 1, "incb %IR2,%N3P")),
    one(0x2910, 0x29FF, 1, op(arith::inc_ir, 11, 1, "inc %IR2,%N3P")),
    one(0x2A10, 0x2AFF, 1, op(arith::decb_ir, 11, 1, "decb %IR2,%N3P")),
    one(0x2B10, 0x2BFF, 1, op(arith::dec_ir, 11, 1, "dec %IR2,%N3P")),
    one(0x2C10, 0x2CFF, 1, op(load::exb_ir, 12, 1, "exb %RB3,%IR2")),
    one(0x2D10, 0x2DFF, 1, op(load::ex_ir, 12, 1, "ex %RW3,%IR2")),
    one(0x2E10, 0x2EFF, 1, op(load::ldb_ir_store, 8, 1, "ldb %IR2,%RB3")),
    one(0x2F10, 0x2FFF, 1, op(load::ld_ir_store, 8, 1, "ld %IR2,%RW3")),

    // 0x30..0x3F: relative and based loads, LDA, LDPS, I/O.
    one(0x3000, 0x300F, 1, op(load::ldrb, 14, 2, "ldrb %RB3,%REL")),
    one(0x3010, 0x30FF, 1, op(load::ldb_ba, 14, 2, "ldb %RB3,%BA2")),
    one(0x3100, 0x310F, 1, op(load::ldr, 14, 2, "ldr %RW3,%REL")),
    one(0x3110, 0x31FF, 1, op(load::ld_ba, 14, 2, "ld %RW3,%BA2")),
    one(0x3200, 0x320F, 1, op(load::ldrb_store, 14, 2, "ldrb %REL,%RB3")),
    one(0x3210, 0x32FF, 1, op(load::ldb_ba_store, 14, 2, "ldb %BA2,%RB3")),
    one(0x3300, 0x330F, 1, op(load::ldr_store, 14, 2, "ldr %REL,%RW3")),
    one(0x3310, 0x33FF, 1, op(load::ld_ba_store, 14, 2, "ld %BA2,%RW3")),
    one(0x3400, 0x340F, 1, op(load::ldar, 15, 2, "ldar %RA3,%REL")),
    one(0x3410, 0x34FF, 1, op(load::lda_ba, 15, 2, "lda %RA3,%BA2")),
    one(0x3500, 0x350F, 1, op(load::ldrl, 17, 2, "ldrl %RL3,%REL")),
    one(0x3510, 0x35FF, 1, op(load::ldl_ba, 17, 2, "ldl %RL3,%BA2")),
    one(0x3700, 0x370F, 1, op(load::ldrl_store, 17, 2, "ldrl %REL,%RL3")),
    one(0x3710, 0x37FF, 1, op(load::ldl_ba_store, 17, 2, "ldl %BA2,%RL3")),
    one(0x3910, 0x39F0, 0x10, op(control::ldps_ir, 16, 1, "ldps %IR2")),
    sub(0x3A00, 0x3AFF, &IO_B),
    sub(0x3B00, 0x3BFF, &IO_W),
    one(0x3C10, 0x3CFF, 1, op(io::inb_ir, 10, 1, "inb %RB3,@%RW2")),
    one(0x3D10, 0x3DFF, 1, op(io::in_ir, 10, 1, "in %RW3,@%RW2")),
    one(0x3E10, 0x3EFF, 1, op(io::outb_ir, 10, 1, "outb @%RW2,%RB3")),
    one(0x3F10, 0x3FFF, 1, op(io::out_ir, 10, 1, "out @%RW2,%RW3")),

    // 0x40..0x4D: direct-address / indexed arithmetic and logic.
    one(0x4000, 0x40FF, 1, op(arith::addb_da_x, 9, 2, "addb %RB3,%ADR")),
    one(0x4100, 0x41FF, 1, op(arith::add_da_x, 9, 2, "add %RW3,%ADR")),
    one(0x4200, 0x42FF, 1, op(arith::subb_da_x, 9, 2, "subb %RB3,%ADR")),
    one(0x4300, 0x43FF, 1, op(arith::sub_da_x, 9, 2, "sub %RW3,%ADR")),
    one(0x4400, 0x44FF, 1, op(logic::orb_da_x, 9, 2, "orb %RB3,%ADR")),
    one(0x4500, 0x45FF, 1, op(logic::or_da_x, 9, 2, "or %RW3,%ADR")),
    one(0x4600, 0x46FF, 1, op(logic::andb_da_x, 9, 2, "andb %RB3,%ADR")),
    one(0x4700, 0x47FF, 1, op(logic::and_da_x, 9, 2, "and %RW3,%ADR")),
    one(0x4800, 0x48FF, 1, op(logic::xorb_da_x, 9, 2, "xorb %RB3,%ADR")),
    one(0x4900, 0x49FF, 1, op(logic::xor_da_x, 9, 2, "xor %RW3,%ADR")),
    one(0x4A00, 0x4AFF, 1, op(arith::cpb_da_x, 9, 2, "cpb %RB3,%ADR")),
    one(0x4B00, 0x4BFF, 1, op(arith::cp_da_x, 9, 2, "cp %RW3,%ADR")),
    sub(0x4C00, 0x4CFF, &GROUP_4C),
    sub(0x4D00, 0x4DFF, &GROUP_4D),
    // 0x4E/0x4F: extended-instruction space.

    // 0x50..0x5F: long and stack operations in direct/indexed mode.
    one(0x5000, 0x50FF, 1, op(arith::cpl_da_x, 15, 2, "cpl %RL3,%ADR")),
    one(0x5110, 0x51FF, 1, op(load::pushl_da_x, 21, 2, "pushl %IR2,%ADRX3")),
    one(0x5200, 0x52FF, 1, op(arith::subl_da_x, 15, 2, "subl %RL3,%ADR")),
    one(0x5310, 0x53FF, 1, op(load::push_da_x, 14, 2, "push %IR2,%ADRX3")),
    one(0x5400, 0x54FF, 1, op(load::ldl_da_x, 12, 2, "ldl %RL3,%ADR")),
    one(0x5510, 0x55FF, 1, op(load::popl_da_x, 23, 2, "popl %ADRX3,%IR2")),
    one(0x5600, 0x56FF, 1, op(arith::addl_da_x, 15, 2, "addl %RL3,%ADR")),
    one(0x5710, 0x57FF, 1, op(load::pop_da_x, 16, 2, "pop %ADRX3,%IR2")),
    one(0x5800, 0x58FF, 1, op(arith::multl_da_x, 284, 2, "multl %RQ3,%ADR")),
    one(0x5900, 0x59FF, 1, op(arith::mult_da_x, 72, 2, "mult %RL3,%ADR")),
    one(0x5A00, 0x5AFF, 1, op(arith::divl_da_x, 746, 2, "divl %RQ3,%ADR")),
    one(0x5B00, 0x5BFF, 1, op(arith::div_da_x, 109, 2, "div %RL3,%ADR")),
    one(0x5C01, 0x5CF1, 0x10, op(load::ldm_da_x_load, 14, 3, "!ldm")),
    one(0x5C08, 0x5CF8, 0x10, op(logic::testl_da_x, 16, 2, "testl %ADR")),
    one(0x5C09, 0x5CF9, 0x10, op(load::ldm_da_x_store, 14, 3, "!ldm")),
    one(0x5D00, 0x5DFF, 1, op(load::ldl_da_x_store, 14, 2, "ldl %ADR,%RL3")),
    one(0x5E00, 0x5EFF, 1, op(control::jp_da_x, 8, 2, "jp %CC3,%ADR")),
    one(0x5F00, 0x5FF0, 0x10, op(control::call_da_x, 12, 2, "call %ADR")),

    // 0x60..0x6F: LD and bit operations in direct/indexed mode.
    one(0x6000, 0x60FF, 1, op(load::ldb_da_x, 9, 2, "ldb %RB3,%ADR")),
    one(0x6100, 0x61FF, 1, op(load::ld_da_x, 9, 2, "ld %RW3,%ADR")),
    one(0x6200, 0x62FF, 1, op(bits::resb_da_x, 13, 2, "resb %ADR,%N3")),
    one(0x6300, 0x63FF, 1, op(bits::res_da_x, 13, 2, "res %ADR,%N3")),
    one(0x6400, 0x64FF, 1, op(bits::setb_da_x, 13, 2, "setb %ADR,%N3")),
    one(0x6500, 0x65FF, 1, op(bits::set_da_x, 13, 2, "set %ADR,%N3")),
    one(0x6600, 0x66FF, 1, op(bits::bitb_da_x, 10, 2, "bitb %ADR,%N3")),
    one(0x6700, 0x67FF, 1, op(bits::bit_da_x, 10, 2, "bit %ADR,%N3")),
    one(0x6800, 0x68FF, 1, op(arith::incb_da_x, 13, 2, "incb %ADR,%N3P")),
    one(0x6900, 0x69FF, 1, op(arith::inc_da_x, 13, 2, "inc %ADR,%N3P")),
    one(0x6A00, 0x6AFF, 1, op(arith::decb_da_x, 13, 2, "decb %ADR,%N3P")),
    one(0x6B00, 0x6BFF, 1, op(arith::dec_da_x, 13, 2, "dec %ADR,%N3P")),
    one(0x6C00, 0x6CFF, 1, op(load::exb_da_x, 15, 2, "exb %RB3,%ADR")),
    one(0x6D00, 0x6DFF, 1, op(load::ex_da_x, 15, 2, "ex %RW3,%ADR")),
    one(0x6E00, 0x6EFF, 1, op(load::ldb_da_x_store, 11, 2, "ldb %ADR,%RB3")),
    one(0x6F00, 0x6FFF, 1, op(load::ld_da_x_store, 11, 2, "ld %ADR,%RW3")),

    // 0x70..0x7F: base-indexed loads, LDA, HALT/IRET, interrupt control,
    // LDCTL, SC.
    one(0x7010, 0x70FF, 1, op(load::ldb_bx, 14, 2, "ldb %RB3,%BX2")),
    one(0x7110, 0x71FF, 1, op(load::ld_bx, 14, 2, "ld %RW3,%BX2")),
    one(0x7210, 0x72FF, 1, op(load::ldb_bx_store, 14, 2, "ldb %BX2,%RB3")),
    one(0x7310, 0x73FF, 1, op(load::ld_bx_store, 14, 2, "ld %BX2,%RW3")),
    one(0x7410, 0x74FF, 1, op(load::lda_bx, 15, 2, "lda %RA3,%BX2")),
    one(0x7510, 0x75FF, 1, op(load::ldl_bx, 17, 2, "ldl %RL3,%BX2")),
    one(0x7600, 0x76FF, 1, op(load::lda_da_x, 13, 2, "lda %RA3,%ADR")),
    one(0x7710, 0x77FF, 1, op(load::ldl_bx_store, 17, 2, "ldl %BX2,%RL3")),
    one(0x7900, 0x79F0, 0x10, op(control::ldps_da_x, 20, 2, "ldps %ADR")),
    one(0x7A00, 0x7A00, 1, op(control::halt, 8, 1, "halt")),
    one(0x7B00, 0x7B00, 1, op(control::iret, 13, 1, "iret")),
    one(0x7C00, 0x7C03, 1, op(control::di, 7, 1, "di %INT")),
    one(0x7C04, 0x7C07, 1, op(control::ei, 7, 1, "ei %INT")),
    sub(0x7D00, 0x7DFF, &GROUP_7D),
    one(0x7F00, 0x7FFF, 1, op(control::sc, 33, 1, "sc %I8")),

    // 0x80..0x8D: register-to-register arithmetic and logic.
    one(0x8000, 0x80FF, 1, op(arith::addb_r, 4, 1, "addb %RB3,%RB2")),
    one(0x8100, 0x81FF, 1, op(arith::add_r, 4, 1, "add %RW3,%RW2")),
    one(0x8200, 0x82FF, 1, op(arith::subb_r, 4, 1, "subb %RB3,%RB2")),
    one(0x8300, 0x83FF, 1, op(arith::sub_r, 4, 1, "sub %RW3,%RW2")),
    one(0x8400, 0x84FF, 1, op(logic::orb_r, 4, 1, "orb %RB3,%RB2")),
    one(0x8500, 0x85FF, 1, op(logic::or_r, 4, 1, "or %RW3,%RW2")),
    one(0x8600, 0x86FF, 1, op(logic::andb_r, 4, 1, "andb %RB3,%RB2")),
    one(0x8700, 0x87FF, 1, op(logic::and_r, 4, 1, "and %RW3,%RW2")),
    one(0x8800, 0x88FF, 1, op(logic::xorb_r, 4, 1, "xorb %RB3,%RB2")),
    one(0x8900, 0x89FF, 1, op(logic::xor_r, 4, 1, "xor %RW3,%RW2")),
    one(0x8A00, 0x8AFF, 1, op(arith::cpb_r, 4, 1, "cpb %RB3,%RB2")),
    one(0x8B00, 0x8BFF, 1, op(arith::cp_r, 4, 1, "cp %RW3,%RW2")),
    sub(0x8C00, 0x8CFF, &GROUP_8C),
    sub(0x8D00, 0x8DFF, &GROUP_8D),
    // 0x8E/0x8F: extended-instruction space.

    // 0x90..0x9E: long register ops, stack register forms, RET.
    one(0x9000, 0x90FF, 1, op(arith::cpl_r, 8, 1, "cpl %RL3,%RL2")),
    one(0x9110, 0x91FF, 1, op(load::pushl_r, 12, 1, "pushl %IR2,%RL3")),
    one(0x9200, 0x92FF, 1, op(arith::subl_r, 8, 1, "subl %RL3,%RL2")),
    one(0x9310, 0x93FF, 1, op(load::push_r, 9, 1, "push %IR2,%RW3")),
    one(0x9400, 0x94FF, 1, op(load::ldl_r, 5, 1, "ldl %RL3,%RL2")),
    one(0x9510, 0x95FF, 1, op(load::popl_r, 12, 1, "popl %RL3,%IR2")),
    one(0x9600, 0x96FF, 1, op(arith::addl_r, 8, 1, "addl %RL3,%RL2")),
    one(0x9710, 0x97FF, 1, op(load::pop_r, 8, 1, "pop %RW3,%IR2")),
    one(0x9800, 0x98FF, 1, op(arith::multl_r, 282, 1, "multl %RQ3,%RL2")),
    one(0x9900, 0x99FF, 1, op(arith::mult_r, 70, 1, "mult %RL3,%RW2")),
    one(0x9A00, 0x9AFF, 1, op(arith::divl_r, 744, 1, "divl %RQ3,%RL2")),
    one(0x9B00, 0x9BFF, 1, op(arith::div_r, 107, 1, "div %RL3,%RW2")),
    one(0x9C08, 0x9CF8, 0x10, op(logic::testl_r, 13, 1, "testl %RL2")),
    one(0x9E00, 0x9E0F, 1, op(control::ret, 10, 1, "ret %CC3")),

    // 0xA0..0xAF: register loads, static bit ops, INC/DEC, EX, TCC.
    one(0xA000, 0xA0FF, 1, op(load::ldb_r, 3, 1, "ldb %RB3,%RB2")),
    one(0xA100, 0xA1FF, 1, op(load::ld_r, 3, 1, "ld %RW3,%RW2")),
    one(0xA200, 0xA2FF, 1, op(bits::resb_r, 4, 1, "resb %RB2,%N3")),
    one(0xA300, 0xA3FF, 1, op(bits::res_r, 4, 1, "res %RW2,%N3")),
    one(0xA400, 0xA4FF, 1, op(bits::setb_r, 4, 1, "setb %RB2,%N3")),
    one(0xA500, 0xA5FF, 1, op(bits::set_r, 4, 1, "set %RW2,%N3")),
    one(0xA600, 0xA6FF, 1, op(bits::bitb_r, 4, 1, "bitb %RB2,%N3")),
    one(0xA700, 0xA7FF, 1, op(bits::bit_r, 4, 1, "bit %RW2,%N3")),
    one(0xA800, 0xA8FF, 1, op(arith::incb_r, 4, 1, "incb %RB2,%N3P")),
    one(0xA900, 0xA9FF, 1, op(arith::inc_r, 4, 1, "inc %RW2,%N3P")),
    one(0xAA00, 0xAAFF, 1, op(arith::decb_r, 4, 1, "decb %RB2,%N3P")),
    one(0xAB00, 0xABFF, 1, op(arith::dec_r, 4, 1, "dec %RW2,%N3P")),
    one(0xAC00, 0xACFF, 1, op(load::exb_r, 6, 1, "exb %RB3,%RB2")),
    one(0xAD00, 0xADFF, 1, op(load::ex_r, 6, 1, "ex %RW3,%RW2")),
    one(0xAE00, 0xAEFF, 1, op(logic::tccb, 5, 1, "tccb %CC3,%RB2")),
    one(0xAF00, 0xAFFF, 1, op(logic::tcc, 5, 1, "tcc %CC3,%RW2")),

    // 0xB0..0xBF: decimal adjust, sign extension, shifts, translate,
    // block, digit rotates, LDK.
    one(0xB000, 0xB0F0, 0x10, op(arith::dab, 5, 1, "dab %RB2")),
    sub(0xB100, 0xB1FF, &GROUP_B1),
    sub(0xB200, 0xB2FF, &SHIFT_B),
    sub(0xB300, 0xB3FF, &SHIFT_W),
    one(0xB400, 0xB4FF, 1, op(arith::adcb_r, 5, 1, "adcb %RB3,%RB2")),
    one(0xB500, 0xB5FF, 1, op(arith::adc_r, 5, 1, "adc %RW3,%RW2")),
    one(0xB600, 0xB6FF, 1, op(arith::sbcb_r, 5, 1, "sbcb %RB3,%RB2")),
    one(0xB700, 0xB7FF, 1, op(arith::sbc_r, 5, 1, "sbc %RW3,%RW2")),
    sub(0xB800, 0xB8FF, &TRANS_B),
    sub(0xBA00, 0xBAFF, &BLOCK_B),
    sub(0xBB00, 0xBBFF, &BLOCK_W),
    one(0xBC00, 0xBCFF, 1, op(shift::rrdb, 9, 1, "rrdb %RB3,%RB2")),
    one(0xBD00, 0xBDFF, 1, op(load::ldk, 5, 1, "ldk %RW2,%N3")),
    one(0xBE00, 0xBEFF, 1, op(shift::rldb, 9, 1, "rldb %RB3,%RB2")),

    // 0xC0..0xFF: the compact one-word formats.
    one(0xC000, 0xCFFF, 1, op(load::ldb_im_compact, 5, 1, "ldb %RB1,%I8")),
    one(0xD000, 0xDFFF, 1, op(control::calr, 10, 1, "calr %RL12")),
    one(0xE000, 0xEFFF, 1, op(control::jr, 6, 1, "jr %CC1,%RL8")),
    one(0xF000, 0xFFFF, 1, op(control::djnz, 11, 1, "!djnz")),
];

// ---- expansion -----------------------------------------------------------

pub(crate) struct DispatchTable {
    index: Box<[u16]>,
    entries: Vec<OpEntry>,
}

impl DispatchTable {
    /// Resolves a first word to its dispatch entry.
    #[inline]
    pub(crate) fn entry(&self, opword: u16) -> &OpEntry {
        &self.entries[usize::from(self.index[usize::from(opword)])]
    }

    fn build() -> Self {
        let mut entries = vec![RESERVED];
        let mut index = vec![0u16; 0x1_0000].into_boxed_slice();

        for row in ROWS {
            match &row.kind {
                RowKind::One(entry) => {
                    let idx = entries.len() as u16;
                    entries.push(*entry);
                    let mut value = usize::from(row.beg);
                    while value <= usize::from(row.end) {
                        index[value] = idx;
                        value += usize::from(row.step);
                    }
                }
                RowKind::Sub(table) => {
                    let base = entries.len() as u16;
                    entries.extend_from_slice(&table[..]);
                    for value in row.beg..=row.end {
                        index[usize::from(value)] = base + (value & 0x0F);
                    }
                }
            }
        }

        Self { index, entries }
    }
}

static DISPATCH: Lazy<DispatchTable> = Lazy::new(DispatchTable::build);

/// The process-wide dispatch table, built on first use.
pub(crate) fn dispatch() -> &'static DispatchTable {
    &DISPATCH
}

#[cfg(test)]
mod tests {
    use super::dispatch;

    fn is_reserved(opword: u16) -> bool {
        dispatch().entry(opword).fmt == "!res"
    }

    #[test]
    fn known_encodings_resolve_to_handlers() {
        // add r1, r2
        assert_eq!(dispatch().entry(0x8121).fmt, "add %RW3,%RW2");
        // ld r1, #imm
        assert_eq!(dispatch().entry(0x2101).fmt, "ld %RW3,%IMW");
        // halt / iret / nop
        assert_eq!(dispatch().entry(0x7A00).fmt, "halt");
        assert_eq!(dispatch().entry(0x7B00).fmt, "iret");
        assert_eq!(dispatch().entry(0x8D07).fmt, "nop");
    }

    #[test]
    fn sub_op_families_split_on_the_low_nibble() {
        assert_eq!(dispatch().entry(0x8D31).fmt, "setflg %FLG2");
        assert_eq!(dispatch().entry(0x8D33).fmt, "resflg %FLG2");
        assert_eq!(dispatch().entry(0x8D38).fmt, "clr %RW2");
        assert_eq!(dispatch().entry(0xB341).fmt, "sll %RW2,%SHC");
        assert_eq!(dispatch().entry(0xB349).fmt, "sla %RW2,%SHC");
    }

    #[test]
    fn extended_and_unassigned_ranges_stay_reserved() {
        assert!(is_reserved(0x0E00));
        assert!(is_reserved(0x0F42));
        assert!(is_reserved(0x4EAA));
        assert!(is_reserved(0x8E00));
        assert!(is_reserved(0x3800));
        assert!(is_reserved(0x7E55));
        assert!(is_reserved(0xB900));
        assert!(is_reserved(0xBF00));
    }

    #[test]
    fn every_first_word_resolves_without_panicking() {
        for opword in 0..=u16::MAX {
            let entry = dispatch().entry(opword);
            assert!(entry.size >= 1 && entry.size <= 3);
        }
    }
}
