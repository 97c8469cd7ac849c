//! Condition codes, jumps, calls, loops and PC bookkeeping.

mod common;

use common::{boot, run_to_halt, CODE_BASE};
use proptest as _;
use rstest::rstest;
use z8k_core::{cc_holds, F_C, F_PV, F_S, F_Z};

#[rstest]
#[case(0x0, 0, false)] // f never holds
#[case(0x8, 0, true)] // t always holds
#[case(0x6, F_Z, true)] // z
#[case(0x6, 0, false)]
#[case(0xE, F_Z, false)] // nz
#[case(0x7, F_C, true)] // c
#[case(0xF, F_C, false)] // nc
#[case(0x5, F_S, true)] // mi
#[case(0xD, F_S, false)] // pl
#[case(0x4, F_PV, true)] // ov
#[case(0xC, F_PV, false)] // nov
#[case(0x1, F_S, true)] // lt: s xor pv
#[case(0x1, F_S | F_PV, false)]
#[case(0x9, F_S | F_PV, true)] // ge
#[case(0x2, F_Z, true)] // le
#[case(0xA, 0, true)] // gt
#[case(0xA, F_Z, false)]
#[case(0x3, F_C, true)] // ule
#[case(0xB, 0, true)] // ugt
#[case(0xB, F_Z, false)]
fn condition_codes_match_the_predicate_table(
    #[case] cc: u8,
    #[case] fcw: u16,
    #[case] expected: bool,
) {
    assert_eq!(cc_holds(cc, fcw), expected);
}

#[test]
fn jr_taken_and_not_taken() {
    // cp r1, #0 sets z; jr nz skips the ld, jr z takes it.
    let (mut cpu, _ram, _io) = boot(&[
        0x2101, 0x0000, // ld r1, #0
        0x0B01, 0x0000, // cp r1, #0          (z set)
        0xEE02, //         jr nz, +2 words    (not taken)
        0xE602, //         jr z, +2 words     (taken, skips the ld)
        0x2102, 0xDEAD, // ld r2, #0xdead     (skipped)
        0x7A00, //         halt
    ]);
    run_to_halt(&mut cpu);

    assert_eq!(cpu.get_reg(2), 0, "skipped load must not execute");
}

#[test]
fn jp_conditional_direct_address() {
    let (mut cpu, ram, _io) = boot(&[
        0x2101, 0x0001, // ld r1, #1
        0x0B01, 0x0000, // cp r1, #0          (nz)
        0x5E0E, 0x0200, // jp nz, 0x0200
        0x7A00, //         halt (skipped)
    ]);
    ram.write_words(0x0200, &[
        0x2103, 0x00AA, // ld r3, #0xaa
        0x7A00,
    ]);
    run_to_halt(&mut cpu);

    assert_eq!(cpu.get_reg(3), 0x00AA);
}

#[test]
fn djnz_loops_the_register_down_without_flags() {
    let (mut cpu, _ram, _io) = boot(&[
        0x2102, 0x0005, // ld r2, #5
        0x2103, 0x0000, // ld r3, #0
        0xA930, //         inc r3, #1        <- loop target
        0xF282, //         djnz r2, back one word
        0x7A00,
    ]);
    // Record flags before the loop: inc sets them, djnz must not.
    run_to_halt(&mut cpu);

    assert_eq!(cpu.get_reg(2), 0);
    assert_eq!(cpu.get_reg(3), 5, "body ran once per count");
}

#[test]
fn calr_pushes_and_jumps_backward() {
    let (mut cpu, ram, _io) = boot(&[
        0x210F, 0x1E00, // ld r15, #0x1e00
        0x8D07, //         nop
        0xD000, //         calr: displacement patched in below
        0x7A00,
    ]);
    // disp12 = (pc_after - target) / 2, taken modulo 2^12.
    let disp = ((0x108i32 - 0x200) / 2) & 0x0FFF;
    ram.write_words(CODE_BASE + 6, &[0xD000 | disp as u16]);
    ram.write_words(0x0200, &[
        0x2105, 0x0042, // ld r5, #0x42
        0x9E08, //         ret
    ]);
    run_to_halt(&mut cpu);

    assert_eq!(cpu.get_reg(5), 0x0042);
    assert_eq!(cpu.get_reg(15), 0x1E00);
}

#[test]
fn ret_not_taken_falls_through() {
    let (mut cpu, ram, _io) = boot(&[
        0x210F, 0x1E00, // ld r15, #0x1e00
        0x5F00, 0x0200, // call 0x0200
        0x7A00,
    ]);
    ram.write_words(0x0200, &[
        0x2101, 0x0001, // ld r1, #1
        0x0B01, 0x0000, // cp r1, #0         (nz)
        0x9E06, //         ret z             (not taken)
        0x2106, 0x0055, // ld r6, #0x55
        0x9E08, //         ret
    ]);
    run_to_halt(&mut cpu);

    assert_eq!(cpu.get_reg(6), 0x0055, "fall-through path executed");
}

#[test]
fn ppc_tracks_instruction_start_and_pc_advances_by_size() {
    let (mut cpu, _ram, _io) = boot(&[
        0x2101, 0x1234, // two words
        0x8D07, //         one word
        0x7A00,
    ]);
    // Service reset first.
    cpu.step().unwrap();

    cpu.step().unwrap();
    assert_eq!(cpu.get_ppc(), CODE_BASE);
    assert_eq!(cpu.get_pc(), CODE_BASE + 4);

    cpu.step().unwrap();
    assert_eq!(cpu.get_ppc(), CODE_BASE + 4);
    assert_eq!(cpu.get_pc(), CODE_BASE + 6);
}

#[test]
fn step_cycle_accounting_is_monotonic_and_exact() {
    let (mut cpu, _ram, _io) = boot(&[
        0x8D07, // nop
        0x8D07, // nop
        0x7A00,
    ]);
    cpu.step().unwrap();

    let before = cpu.get_cycles();
    let consumed = cpu.step().unwrap();
    assert_eq!(cpu.get_cycles() - before, consumed);
    assert_eq!(consumed, 7, "nop costs its table entry");
}
