//! Trap and interrupt entry sequences, privilege enforcement, IRET and
//! reserved FCW bit behavior.

mod common;

use common::{boot, boot_with_fcw, run_to_halt, CODE_BASE};
use proptest as _;
use rstest as _;
use z8k_core::{IrqLine, F_NVIE, F_S_N, F_VIE};

/// Trap/interrupt vector byte offsets on the Z8002, FCW word first.
const VEC_EPU: u32 = 0x08;
const VEC_TRAP: u32 = 0x0C;
const VEC_SYSCALL: u32 = 0x10;
const VEC_NMI: u32 = 0x18;
const VEC_NVI: u32 = 0x1C;
const VEC_VI: u32 = 0x20;

#[test]
fn privileged_instruction_in_user_mode_traps() {
    let (mut cpu, ram, _io) = boot(&[
        0x2101, 0x0F00, // ld r1, #0x0f00
        0x7D1F, //         ldctl nspoff, r1   (normal-mode stack)
        0x210F, 0x1E00, // ld r15, #0x1e00    (system stack)
        0x2102, 0x0000, // ld r2, #0
        0x7D2A, //         ldctl fcw, r2      (drop to normal mode)
        0x7A00, //         halt               (privileged -> trap)
    ]);
    ram.write_words(VEC_TRAP, &[0x4000, 0x0300]);
    ram.write_words(0x0300, &[0x7A00]); // handler halts in system mode
    run_to_halt(&mut cpu);

    assert!(cpu.get_fcw() & F_S_N != 0, "trap entered system mode");
    assert_eq!(cpu.get_ppc(), 0x0300, "vectored to the trap handler");
    // Frame on the system stack: PC, old FCW, then the instruction word.
    assert_eq!(cpu.get_reg(15), 0x1E00 - 6);
    assert_eq!(ram.word_at(0x1DFE), (CODE_BASE + 18) as u16, "resume PC");
    assert_eq!(ram.word_at(0x1DFC), 0x0000, "user-mode FCW");
    assert_eq!(ram.word_at(0x1DFA), 0x7A00, "offending instruction word");
}

#[test]
fn system_call_takes_the_syscall_vector_with_the_immediate() {
    let (mut cpu, ram, _io) = boot(&[
        0x210F, 0x1E00, // ld r15, #0x1e00
        0x7F42, //         sc #0x42
        0x7A00,
    ]);
    ram.write_words(VEC_SYSCALL, &[0x4000, 0x0300]);
    ram.write_words(0x0300, &[0x7A00]);
    run_to_halt(&mut cpu);

    assert_eq!(cpu.get_ppc(), 0x0300);
    assert_eq!(ram.word_at(0x1DFA), 0x7F42, "identifier carries the immediate");
}

#[test]
fn divide_by_zero_takes_the_extended_vector_and_keeps_the_dividend() {
    let (mut cpu, ram, _io) = boot(&[
        0x210F, 0x1E00, // ld r15, #0x1e00
        0x2102, 0x0001, // ld r2, #1       (dividend high)
        0x2103, 0x5678, // ld r3, #0x5678  (dividend low)
        0x2105, 0x0000, // ld r5, #0
        0x9B52, //         div rr2, r5
        0x7A00,
    ]);
    ram.write_words(VEC_EPU, &[0x4000, 0x0300]);
    ram.write_words(0x0300, &[0x7A00]);
    run_to_halt(&mut cpu);

    assert_eq!(cpu.get_ppc(), 0x0300, "divide fault uses the extended vector");
    assert_eq!(cpu.get_reg(2), 0x0001, "dividend untouched");
    assert_eq!(cpu.get_reg(3), 0x5678);
}

#[test]
fn quotient_overflow_faults_like_divide_by_zero() {
    let (mut cpu, ram, _io) = boot(&[
        0x210F, 0x1E00, // ld r15, #0x1e00
        0x2102, 0x0100, // ld r2, #0x0100  (dividend = 0x0100_0000)
        0x2103, 0x0000,
        0x2105, 0x0002, // ld r5, #2
        0x9B52, //         div rr2, r5
        0x7A00,
    ]);
    ram.write_words(VEC_EPU, &[0x4000, 0x0300]);
    ram.write_words(0x0300, &[0x7A00]);
    run_to_halt(&mut cpu);

    assert_eq!(cpu.get_ppc(), 0x0300);
    assert_eq!(cpu.get_reg(2), 0x0100);
    assert_eq!(cpu.get_reg(3), 0x0000);
}

#[test]
fn reserved_opcode_takes_the_extended_vector() {
    let (mut cpu, ram, _io) = boot(&[
        0x210F, 0x1E00, // ld r15, #0x1e00
        0x0E42, //         reserved encoding
        0x7A00,
    ]);
    ram.write_words(VEC_EPU, &[0x4000, 0x0300]);
    ram.write_words(0x0300, &[0x7A00]);
    run_to_halt(&mut cpu);

    assert_eq!(cpu.get_ppc(), 0x0300);
    assert_eq!(ram.word_at(0x1DFA), 0x0E42, "identifier is the first word");
}

#[test]
fn nmi_wakes_a_halted_core() {
    let (mut cpu, ram, _io) = boot(&[
        0x210F, 0x1E00, // ld r15, #0x1e00
        0x7A00, //         halt
    ]);
    ram.write_words(VEC_NMI, &[0x4000, 0x0300]);
    ram.write_words(0x0300, &[0x2107, 0x00AB, 0x7A00]); // ld r7, #0xab; halt
    run_to_halt(&mut cpu);
    assert!(cpu.is_halted());
    assert_eq!(cpu.get_reg(7), 0);

    cpu.set_nmi(true);
    run_to_halt(&mut cpu);
    assert_eq!(cpu.get_reg(7), 0x00AB, "handler ran after the wakeup");
    // Resume point is the instruction after the halt.
    assert_eq!(ram.word_at(0x1DFE), (CODE_BASE + 6) as u16);
}

#[test]
fn nvi_is_gated_by_the_enable_bit_and_iret_returns() {
    let (mut cpu, ram, _io) = boot_with_fcw(
        &[
            0x210F, 0x1E00, // ld r15, #0x1e00
            0x8D07, //         nop
            0x2101, 0x0001, // ld r1, #1
            0x7A00,
        ],
        0x4000 | F_NVIE,
    );
    ram.write_words(VEC_NVI, &[0x4000, 0x0300]);
    ram.write_words(0x0300, &[
        0x2106, 0x0099, // ld r6, #0x99
        0x7B00, //         iret
    ]);

    // Service the reset, then raise the line and take the interrupt.
    cpu.step().unwrap();
    cpu.step().unwrap(); // ld r15
    cpu.set_irq(IrqLine::Nvi, true);
    let cost = cpu.step().unwrap();
    assert!(cost > 0, "interrupt entry consumed cycles");
    cpu.set_irq(IrqLine::Nvi, false);
    assert_eq!(cpu.get_pc(), 0x0300);

    run_to_halt(&mut cpu);
    assert_eq!(cpu.get_reg(6), 0x0099, "handler body ran");
    assert_eq!(cpu.get_reg(1), 0x0001, "main line resumed after iret");
    assert_eq!(cpu.get_reg(15), 0x1E00, "iret unwound the frame");
}

#[test]
fn vectored_interrupt_indexes_the_pc_table() {
    let (mut cpu, ram, _io) = boot_with_fcw(
        &[
            0x210F, 0x1E00, // ld r15, #0x1e00
            0x8D07, //         nop
            0x7A00,
        ],
        0x4000 | F_VIE,
    );
    // Shared FCW at the table base; PC entries follow.
    ram.write_words(VEC_VI, &[0x4000]);
    ram.write_words(VEC_VI + 2 + 2 * 3, &[0x0400]); // vector 3
    ram.write_words(0x0400, &[0x2105, 0x0077, 0x7B00]); // ld r5; iret

    cpu.step().unwrap(); // reset
    cpu.step().unwrap(); // ld r15
    cpu.set_irq_vector(3);
    cpu.set_irq(IrqLine::Vi, true);
    cpu.step().unwrap(); // entry
    cpu.set_irq(IrqLine::Vi, false);
    assert_eq!(cpu.get_pc(), 0x0400);
    assert_eq!(ram.word_at(0x1DFA), 0x0003, "vector byte in the frame");

    run_to_halt(&mut cpu);
    assert_eq!(cpu.get_reg(5), 0x0077);
}

#[test]
fn internal_trap_outranks_a_masked_interrupt_line() {
    let (mut cpu, ram, _io) = boot(&[
        0x210F, 0x1E00, // ld r15, #0x1e00
        0x7F01, //         sc #1
        0x7A00,
    ]);
    ram.write_words(VEC_SYSCALL, &[0x4000, 0x0300]);
    ram.write_words(VEC_NVI, &[0x4000, 0x0400]);
    ram.write_words(0x0300, &[0x2106, 0x0001, 0x7B00]); // ld r6, #1; iret
    ram.write_words(0x0400, &[0x2107, 0x0001, 0x7B00]); // ld r7, #1; iret

    // NVIE stays clear the whole way, so the asserted line is never honored
    // while the syscall trap is.
    cpu.set_irq(IrqLine::Nvi, true);
    run_to_halt(&mut cpu);

    assert_eq!(cpu.get_reg(6), 1, "syscall handler ran");
    assert_eq!(cpu.get_reg(7), 0, "masked interrupt never serviced");
}

#[test]
fn reserved_fcw_bits_survive_loads_and_execution() {
    let (mut cpu, _ram, _io) = boot(&[
        0x2101, 0x4703, // ld r1, #0x4703   (reserved bits 10..8, 1..0 set)
        0x7D1A, //         ldctl fcw, r1
        0x2102, 0x1111, // ld r2, #0x1111
        0x0102, 0x2222, // add r2, #0x2222
        0x7A00,
    ]);
    run_to_halt(&mut cpu);

    assert_eq!(cpu.get_fcw() & 0x0703, 0x0703, "reserved bits read back as written");
    assert_eq!(cpu.get_reg(2), 0x3333);
}

#[test]
fn halted_core_burns_cycles_but_touches_nothing() {
    let (mut cpu, ram, _io) = boot(&[
        0x2101, 0x1234, // ld r1, #0x1234
        0x7A00,
    ]);
    run_to_halt(&mut cpu);
    let regs_before: Vec<u16> = (0..16).map(|i| cpu.get_reg(i)).collect();
    let mem_before = ram.word_at(0x1000);
    let cycles_before = cpu.get_cycles();

    cpu.run(500).unwrap();

    assert!(cpu.is_halted());
    assert!(cpu.get_cycles() > cycles_before, "cycles advanced while halted");
    let regs_after: Vec<u16> = (0..16).map(|i| cpu.get_reg(i)).collect();
    assert_eq!(regs_before, regs_after);
    assert_eq!(ram.word_at(0x1000), mem_before);
}
