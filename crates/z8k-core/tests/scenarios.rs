//! End-to-end reset-and-run scenarios driving the full core.

mod common;

use common::{boot, run_to_halt, CODE_BASE};
use z8k_core::{F_C, F_PV, F_S, F_Z};

#[test]
fn reset_and_execute_adds_registers() {
    let (mut cpu, _ram, _io) = boot(&[
        0x2101, 0x1234, // ld r1, #0x1234
        0x2102, 0x5678, // ld r2, #0x5678
        0x8121, //         add r1, r2
        0x7A00, //         halt
    ]);
    run_to_halt(&mut cpu);

    assert_eq!(cpu.get_reg(1), 0x68AC);
    assert_eq!(cpu.get_reg(2), 0x5678);
    let fcw = cpu.get_fcw();
    assert_eq!(fcw & (F_Z | F_S | F_C | F_PV), 0);
    assert!(cpu.is_halted());
}

#[test]
fn unsigned_overflow_wraps_and_carries() {
    let (mut cpu, _ram, _io) = boot(&[
        0x2103, 0xFFFF, // ld r3, #0xffff
        0x0103, 0x0001, // add r3, #1
        0x7A00,
    ]);
    run_to_halt(&mut cpu);

    assert_eq!(cpu.get_reg(3), 0x0000);
    let fcw = cpu.get_fcw();
    assert!(fcw & F_Z != 0);
    assert!(fcw & F_C != 0);
    assert!(fcw & F_S == 0);
    assert!(fcw & F_PV == 0);
}

#[test]
fn signed_overflow_sets_overflow_not_carry() {
    let (mut cpu, _ram, _io) = boot(&[
        0x2103, 0x7FFF, // ld r3, #0x7fff
        0x0103, 0x0001, // add r3, #1
        0x7A00,
    ]);
    run_to_halt(&mut cpu);

    assert_eq!(cpu.get_reg(3), 0x8000);
    let fcw = cpu.get_fcw();
    assert!(fcw & F_S != 0);
    assert!(fcw & F_PV != 0);
    assert!(fcw & F_C == 0);
}

#[test]
fn block_move_copies_three_words() {
    let (mut cpu, ram, _io) = boot(&[
        0x2102, 0x1000, // ld r2, #0x1000   (source pointer)
        0x2103, 0x2000, // ld r3, #0x2000   (destination pointer)
        0x2104, 0x0003, // ld r4, #3        (count)
        0xBB21, 0x0430, // ldir @r3, @r2, r4
        0x7A00,
    ]);
    ram.write_words(0x1000, &[0x1111, 0x2222, 0x3333]);
    run_to_halt(&mut cpu);

    assert_eq!(ram.word_at(0x2000), 0x1111);
    assert_eq!(ram.word_at(0x2002), 0x2222);
    assert_eq!(ram.word_at(0x2004), 0x3333);
    assert_eq!(cpu.get_reg(2), 0x1006);
    assert_eq!(cpu.get_reg(3), 0x2006);
    assert_eq!(cpu.get_reg(4), 0);
}

#[test]
fn block_search_stops_at_the_match() {
    let (mut cpu, ram, _io) = boot(&[
        0x2101, 0x3333, // ld r1, #0x3333   (comparand)
        0x2102, 0x1000, // ld r2, #0x1000   (source pointer)
        0x2104, 0x0005, // ld r4, #5        (count)
        0xBB24, 0x0416, // cpir r1, @r2, r4, eq
        0x7A00,
    ]);
    ram.write_words(0x1000, &[0x1111, 0x2222, 0x3333, 0x4444, 0x5555]);
    run_to_halt(&mut cpu);

    assert!(cpu.get_fcw() & F_Z != 0, "early termination on the match");
    assert_eq!(cpu.get_reg(4), 2, "two elements left unexamined");
    assert_eq!(cpu.get_reg(2), 0x1006, "pointer advanced past the match");
}

#[test]
fn call_and_return_round_trip() {
    let (mut cpu, ram, _io) = boot(&[
        0x210F, 0x1E00, // ld r15, #0x1e00
        0x5F00, 0x0200, // call 0x0200
        0x7A00, //         halt (return lands here)
    ]);
    ram.write_words(0x0200, &[
        0x2106, 0x1234, // ld r6, #0x1234
        0x9E08, //         ret
    ]);
    run_to_halt(&mut cpu);

    assert_eq!(cpu.get_reg(6), 0x1234);
    assert_eq!(cpu.get_reg(15), 0x1E00, "stack pointer restored");
    // Halted after the instruction following the call.
    assert_eq!(cpu.get_ppc(), CODE_BASE + 8);
}
