//! Shared test fixtures: a 64 KiB shared RAM, a recording I/O stub and a
//! reset-and-load helper.

// Each test binary compiles this module separately and uses a subset of it.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use z8k_core::{IoBus, IoMode, MemoryBus, Z8000};

/// Big-endian RAM the test keeps a handle to after attaching it to the core.
#[derive(Clone)]
pub struct TestRam(Rc<RefCell<Vec<u8>>>);

impl TestRam {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(vec![0; 0x1_0000])))
    }

    pub fn write_words(&self, addr: u32, words: &[u16]) {
        let mut data = self.0.borrow_mut();
        for (i, w) in words.iter().enumerate() {
            let at = (addr as usize + 2 * i) & 0xFFFF;
            let [hi, lo] = w.to_be_bytes();
            data[at] = hi;
            data[at + 1] = lo;
        }
    }

    pub fn word_at(&self, addr: u32) -> u16 {
        let data = self.0.borrow();
        let at = addr as usize & 0xFFFE;
        u16::from_be_bytes([data[at], data[at + 1]])
    }

    pub fn byte_at(&self, addr: u32) -> u8 {
        self.0.borrow()[addr as usize & 0xFFFF]
    }
}

impl MemoryBus for TestRam {
    fn read_byte(&mut self, addr: u32) -> u8 {
        self.0.borrow()[addr as usize & 0xFFFF]
    }

    fn read_word(&mut self, addr: u32) -> u16 {
        self.word_at(addr)
    }

    fn write_byte(&mut self, addr: u32, value: u8) {
        self.0.borrow_mut()[addr as usize & 0xFFFF] = value;
    }

    fn write_word(&mut self, addr: u32, value: u16) {
        self.write_words(addr, &[value]);
    }
}

/// I/O stub: remembers writes per (port, space) and plays them back on
/// reads; unwritten ports read as 0xFFFF.
#[derive(Clone, Default)]
pub struct TestIo {
    ports: Rc<RefCell<HashMap<(u16, bool), u16>>>,
}

impl TestIo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn port(&self, port: u16, mode: IoMode) -> Option<u16> {
        self.ports
            .borrow()
            .get(&(port & 0xFFFE, mode == IoMode::Special))
            .copied()
    }

    pub fn preset(&self, port: u16, mode: IoMode, value: u16) {
        self.ports
            .borrow_mut()
            .insert((port & 0xFFFE, mode == IoMode::Special), value);
    }
}

impl IoBus for TestIo {
    fn read_byte(&mut self, port: u16, mode: IoMode) -> u8 {
        let word = self.port(port, mode).unwrap_or(0xFFFF);
        if port & 1 != 0 {
            word as u8
        } else {
            (word >> 8) as u8
        }
    }

    fn read_word(&mut self, port: u16, mode: IoMode) -> u16 {
        self.port(port, mode).unwrap_or(0xFFFF)
    }

    fn write_byte(&mut self, port: u16, value: u8, mode: IoMode) {
        let existing = self.port(port, mode).unwrap_or(0);
        let merged = if port & 1 != 0 {
            (existing & 0xFF00) | u16::from(value)
        } else {
            (existing & 0x00FF) | (u16::from(value) << 8)
        };
        self.preset(port, mode, merged);
    }

    fn write_word(&mut self, port: u16, value: u16, mode: IoMode) {
        self.preset(port, mode, value);
    }
}

pub const CODE_BASE: u32 = 0x0100;

/// Builds a Z8002 with a reset vector pointing at `code` loaded at
/// [`CODE_BASE`], system mode, and the shared RAM/IO attached. The reset is
/// requested but not yet serviced.
pub fn boot(code: &[u16]) -> (Z8000, TestRam, TestIo) {
    boot_with_fcw(code, 0x4000)
}

pub fn boot_with_fcw(code: &[u16], fcw: u16) -> (Z8000, TestRam, TestIo) {
    let ram = TestRam::new();
    ram.write_words(2, &[fcw, CODE_BASE as u16]);
    ram.write_words(CODE_BASE, code);

    let io = TestIo::new();
    let mut cpu = Z8000::z8002();
    cpu.set_program_memory(Box::new(ram.clone()));
    cpu.set_io(Box::new(io.clone()));
    cpu.reset();
    (cpu, ram, io)
}

/// Runs until HALT with a generous budget and returns consumed cycles.
pub fn run_to_halt(cpu: &mut Z8000) -> u64 {
    let consumed = cpu.run(200_000).expect("buses attached");
    assert!(cpu.is_halted(), "program should reach halt");
    consumed
}
