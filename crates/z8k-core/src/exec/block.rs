//! Block transfer, block search, string compare and translate.
//!
//! Every family steps one element at a time: transfer or compare, bump the
//! pointer registers by the element width, decrement the count register.
//! Repeat forms loop in the handler but poll for honored interrupt requests
//! between elements; when one is pending, PC rewinds to the instruction so
//! the service sequence resumes the block exactly where it stopped.

use crate::cpu::{MemSpace, Z8000};
use crate::decode::src;
use crate::flags::{cc_holds, F_PV, F_Z};

/// Cycles charged per element beyond the table cost of the instruction.
const ELEMENT_CYCLES: u32 = 9;
/// Translate elements carry an extra table lookup.
const TRANSLATE_CYCLES: u32 = 14;

/// Second-word fields shared by the load/compare families: count register in
/// bits 11..8, the other pointer (or compare register) in bits 7..4, and the
/// termination condition or single-step flag in the low nibble.
struct BlockFields {
    count_reg: usize,
    other: usize,
    low: u16,
}

fn fields(cpu: &mut Z8000) -> BlockFields {
    let w1 = cpu.get_operand(1);
    BlockFields {
        count_reg: ((w1 >> 8) & 0x0F) as usize,
        other: ((w1 >> 4) & 0x0F) as usize,
        low: w1 & 0x0F,
    }
}

/// Decrements a count register, returning the new value.
fn dec_count(cpu: &mut Z8000, reg: usize) -> u16 {
    let n = cpu.rw(reg).wrapping_sub(1);
    cpu.set_rw(reg, n);
    n
}

/// Rewinds PC so the instruction re-enters after the interrupt is serviced.
fn rewind(cpu: &mut Z8000) {
    cpu.pc = cpu.ppc;
}

// ---- LDI/LDD/LDIR/LDDR ---------------------------------------------------

fn block_load(cpu: &mut Z8000, word: bool, delta: i32) {
    let f = fields(cpu);
    let s = src(cpu.op0());
    let d = f.other;
    let single = f.low & 8 != 0;

    loop {
        cpu.cycles(ELEMENT_CYCLES);
        let src_addr = cpu.ea_ir(s);
        let dst_addr = cpu.ea_ir(d);
        if word {
            let v = cpu.rdmem_w(MemSpace::Data, src_addr);
            cpu.wrmem_w(MemSpace::Data, dst_addr, v);
        } else {
            let v = cpu.rdmem_b(MemSpace::Data, src_addr);
            cpu.wrmem_b(MemSpace::Data, dst_addr, v);
        }
        cpu.ptr_adjust(s, delta);
        cpu.ptr_adjust(d, delta);
        let remaining = dec_count(cpu, f.count_reg);
        cpu.set_flag(F_Z, remaining == 0);

        if single || remaining == 0 {
            break;
        }
        if cpu.honored_request_pending() {
            rewind(cpu);
            break;
        }
    }
}

pub(crate) fn ldi_w(cpu: &mut Z8000) {
    block_load(cpu, true, 2);
}

pub(crate) fn ldd_w(cpu: &mut Z8000) {
    block_load(cpu, true, -2);
}

pub(crate) fn ldi_b(cpu: &mut Z8000) {
    block_load(cpu, false, 1);
}

pub(crate) fn ldd_b(cpu: &mut Z8000) {
    block_load(cpu, false, -1);
}

// ---- CPI/CPD/CPIR/CPDR ---------------------------------------------------

/// One compare element: register against memory. Returns whether the
/// encoded termination condition held.
fn compare_element(cpu: &mut Z8000, word: bool, compare_reg: usize, addr: u32, cc: u16) -> bool {
    if word {
        let m = cpu.rdmem_w(MemSpace::Data, addr);
        let a = cpu.rw(compare_reg);
        cpu.sub16(a, m, 0);
    } else {
        let m = cpu.rdmem_b(MemSpace::Data, addr);
        let a = cpu.rb(compare_reg);
        cpu.sub8(a, m, 0);
    }
    cc_holds(cc as u8, cpu.fcw)
}

fn block_compare(cpu: &mut Z8000, word: bool, delta: i32, repeat: bool) {
    let f = fields(cpu);
    let s = src(cpu.op0());

    loop {
        cpu.cycles(ELEMENT_CYCLES);
        let addr = cpu.ea_ir(s);
        let matched = compare_element(cpu, word, f.other, addr, f.low);
        cpu.ptr_adjust(s, delta);
        let remaining = dec_count(cpu, f.count_reg);
        cpu.set_flag(F_Z, matched);
        cpu.set_flag(F_PV, remaining == 0);

        if !repeat || matched || remaining == 0 {
            break;
        }
        if cpu.honored_request_pending() {
            rewind(cpu);
            break;
        }
    }
}

pub(crate) fn cpi_w(cpu: &mut Z8000) {
    block_compare(cpu, true, 2, false);
}

pub(crate) fn cpir_w(cpu: &mut Z8000) {
    block_compare(cpu, true, 2, true);
}

pub(crate) fn cpd_w(cpu: &mut Z8000) {
    block_compare(cpu, true, -2, false);
}

pub(crate) fn cpdr_w(cpu: &mut Z8000) {
    block_compare(cpu, true, -2, true);
}

pub(crate) fn cpi_b(cpu: &mut Z8000) {
    block_compare(cpu, false, 1, false);
}

pub(crate) fn cpir_b(cpu: &mut Z8000) {
    block_compare(cpu, false, 1, true);
}

pub(crate) fn cpd_b(cpu: &mut Z8000) {
    block_compare(cpu, false, -1, false);
}

pub(crate) fn cpdr_b(cpu: &mut Z8000) {
    block_compare(cpu, false, -1, true);
}

// ---- CPSI/CPSD/CPSIR/CPSDR: memory against memory ------------------------

fn block_string_compare(cpu: &mut Z8000, word: bool, delta: i32, repeat: bool) {
    let f = fields(cpu);
    let s = src(cpu.op0());
    let d = f.other;

    loop {
        cpu.cycles(ELEMENT_CYCLES);
        let src_addr = cpu.ea_ir(s);
        let dst_addr = cpu.ea_ir(d);
        let matched = if word {
            let a = cpu.rdmem_w(MemSpace::Data, dst_addr);
            let b = cpu.rdmem_w(MemSpace::Data, src_addr);
            cpu.sub16(a, b, 0);
            cc_holds(f.low as u8, cpu.fcw)
        } else {
            let a = cpu.rdmem_b(MemSpace::Data, dst_addr);
            let b = cpu.rdmem_b(MemSpace::Data, src_addr);
            cpu.sub8(a, b, 0);
            cc_holds(f.low as u8, cpu.fcw)
        };
        cpu.ptr_adjust(s, delta);
        cpu.ptr_adjust(d, delta);
        let remaining = dec_count(cpu, f.count_reg);
        cpu.set_flag(F_Z, matched);
        cpu.set_flag(F_PV, remaining == 0);

        if !repeat || matched || remaining == 0 {
            break;
        }
        if cpu.honored_request_pending() {
            rewind(cpu);
            break;
        }
    }
}

pub(crate) fn cpsi_w(cpu: &mut Z8000) {
    block_string_compare(cpu, true, 2, false);
}

pub(crate) fn cpsir_w(cpu: &mut Z8000) {
    block_string_compare(cpu, true, 2, true);
}

pub(crate) fn cpsd_w(cpu: &mut Z8000) {
    block_string_compare(cpu, true, -2, false);
}

pub(crate) fn cpsdr_w(cpu: &mut Z8000) {
    block_string_compare(cpu, true, -2, true);
}

pub(crate) fn cpsi_b(cpu: &mut Z8000) {
    block_string_compare(cpu, false, 1, false);
}

pub(crate) fn cpsir_b(cpu: &mut Z8000) {
    block_string_compare(cpu, false, 1, true);
}

pub(crate) fn cpsd_b(cpu: &mut Z8000) {
    block_string_compare(cpu, false, -1, false);
}

pub(crate) fn cpsdr_b(cpu: &mut Z8000) {
    block_string_compare(cpu, false, -1, true);
}

// ---- TRIB/TRDB and the translate-and-test variants (byte only) -----------

/// Second word: count register in bits 11..8, translation-table base
/// register in bits 7..4.
fn block_translate(cpu: &mut Z8000, delta: i32, repeat: bool, test_only: bool) {
    let f = fields(cpu);
    let d = src(cpu.op0());
    let table = f.other;

    loop {
        cpu.cycles(TRANSLATE_CYCLES);
        let dst_addr = cpu.ea_ir(d);
        let index = cpu.rdmem_b(MemSpace::Data, dst_addr);
        let entry_addr = Z8000::addr_add(cpu.ea_ir(table), u32::from(index));
        let translated = cpu.rdmem_b(MemSpace::Data, entry_addr);

        if test_only {
            // The translated byte lands in RH1 and drives Z.
            cpu.set_rb(1, translated);
            cpu.set_flag(F_Z, translated == 0);
        } else {
            cpu.wrmem_b(MemSpace::Data, dst_addr, translated);
        }
        cpu.ptr_adjust(d, delta);
        let remaining = dec_count(cpu, f.count_reg);
        cpu.set_flag(F_PV, remaining == 0);

        let matched = test_only && translated == 0;
        if !repeat || matched || remaining == 0 {
            break;
        }
        if cpu.honored_request_pending() {
            rewind(cpu);
            break;
        }
    }
}

pub(crate) fn trib(cpu: &mut Z8000) {
    block_translate(cpu, 1, false, false);
}

pub(crate) fn trirb(cpu: &mut Z8000) {
    block_translate(cpu, 1, true, false);
}

pub(crate) fn trdb(cpu: &mut Z8000) {
    block_translate(cpu, -1, false, false);
}

pub(crate) fn trdrb(cpu: &mut Z8000) {
    block_translate(cpu, -1, true, false);
}

pub(crate) fn trtib(cpu: &mut Z8000) {
    block_translate(cpu, 1, false, true);
}

pub(crate) fn trtirb(cpu: &mut Z8000) {
    block_translate(cpu, 1, true, true);
}

pub(crate) fn trtdb(cpu: &mut Z8000) {
    block_translate(cpu, -1, false, true);
}

pub(crate) fn trtdrb(cpu: &mut Z8000) {
    block_translate(cpu, -1, true, true);
}
