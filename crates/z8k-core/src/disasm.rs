//! Table-driven disassembler used by the instruction trace hook.
//!
//! Renders the operand-format strings carried by the dispatch entries.
//! Tokens are `%`-prefixed; tokens that consume instruction-stream words
//! advance a shared cursor, so a format lists its operands in stream order.
//! Formats starting with `!` are rendered by dedicated routines (reserved
//! words, DJNZ, LDM and the block families).

use std::fmt::Write as _;

use crate::bus::MemoryBus;
use crate::flags::cc_name;
use crate::table;

struct Renderer<'a> {
    mem: &'a mut dyn MemoryBus,
    pc: u32,
    segmented: bool,
    /// Next instruction-stream word index to consume.
    cursor: u32,
}

impl Renderer<'_> {
    fn word(&mut self, index: u32) -> u16 {
        self.mem.read_word((self.pc & !1).wrapping_add(2 * index))
    }

    fn next_word(&mut self) -> u16 {
        let w = self.word(self.cursor);
        self.cursor += 1;
        w
    }

    /// Address operand in the current mode; returns the rendered form.
    fn addr_operand(&mut self) -> String {
        if self.segmented {
            let first = self.next_word();
            let seg = (first >> 8) & 0x7F;
            if first & 0x8000 != 0 {
                let off = self.next_word();
                format!("<<{seg:#04x}>>{off:#06x}")
            } else {
                format!("<<{seg:#04x}>>{:#04x}", first & 0xFF)
            }
        } else {
            format!("{:#06x}", self.next_word())
        }
    }
}

fn word_reg(i: usize) -> String {
    format!("r{}", i & 15)
}

fn byte_reg(i: usize) -> String {
    let i = i & 15;
    if i < 8 {
        format!("rh{i}")
    } else {
        format!("rl{}", i - 8)
    }
}

fn long_reg(i: usize) -> String {
    format!("rr{}", i & 14)
}

fn quad_reg(i: usize) -> String {
    format!("rq{}", i & 12)
}

fn indirect_reg(i: usize, segmented: bool) -> String {
    if segmented {
        format!("@{}", long_reg(i))
    } else {
        format!("@{}", word_reg(i))
    }
}

fn flag_letters(nibble: u16) -> String {
    let mut out = String::new();
    for (bit, name) in [(8, "c"), (4, "z"), (2, "s"), (1, "p")] {
        if nibble & bit != 0 {
            if !out.is_empty() {
                out.push(',');
            }
            out.push_str(name);
        }
    }
    out
}

fn ctl_name(code: u16) -> &'static str {
    match code & 7 {
        2 => "fcw",
        3 => "refresh",
        4 => "psapseg",
        5 => "psapoff",
        6 => "nspseg",
        7 => "nspoff",
        _ => "ctl?",
    }
}

/// Disassembles one instruction. Returns the text and the instruction size
/// in words.
pub fn disassemble(mem: &mut dyn MemoryBus, pc: u32, segmented: bool) -> (String, u32) {
    let opword = mem.read_word(pc & !1);
    let entry = table::dispatch().entry(opword);

    let mut r = Renderer { mem, pc, segmented, cursor: 1 };

    if let Some(special) = entry.fmt.strip_prefix('!') {
        let text = render_special(special, opword, &mut r);
        let size = r.cursor.max(u32::from(entry.size));
        return (text, size);
    }

    let mut out = String::new();
    let mut chars = entry.fmt.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let mut token = String::new();
        while let Some(&n) = chars.peek() {
            if n.is_ascii_uppercase() || n.is_ascii_digit() {
                token.push(n);
                chars.next();
            } else {
                break;
            }
        }
        render_token(&token, opword, &mut r, &mut out);
    }

    let size = r.cursor.max(u32::from(entry.size));
    // An always-true condition renders as nothing; drop its separator.
    (out.replace(" ,", " "), size)
}

fn nib(op: u16, n: u32) -> usize {
    usize::from((op >> (4 * (3 - n))) & 0x0F)
}

#[allow(clippy::too_many_lines)]
fn render_token(token: &str, op: u16, r: &mut Renderer<'_>, out: &mut String) {
    match token {
        "RB2" => out.push_str(&byte_reg(nib(op, 2))),
        "RB3" => out.push_str(&byte_reg(nib(op, 3))),
        "RB1" => out.push_str(&byte_reg(nib(op, 1))),
        "RW1" => out.push_str(&word_reg(nib(op, 1))),
        "RW2" => out.push_str(&word_reg(nib(op, 2))),
        "RW3" => out.push_str(&word_reg(nib(op, 3))),
        "RL2" => out.push_str(&long_reg(nib(op, 2))),
        "RL3" => out.push_str(&long_reg(nib(op, 3))),
        "RQ2" => out.push_str(&quad_reg(nib(op, 2))),
        "RQ3" => out.push_str(&quad_reg(nib(op, 3))),
        "RA3" => {
            if r.segmented {
                out.push_str(&long_reg(nib(op, 3)));
            } else {
                out.push_str(&word_reg(nib(op, 3)));
            }
        }
        "IR2" => out.push_str(&indirect_reg(nib(op, 2), r.segmented)),
        "IR3" => out.push_str(&indirect_reg(nib(op, 3), r.segmented)),
        "CC1" => out.push_str(cc_name(nib(op, 1) as u8)),
        "CC3" => out.push_str(cc_name(nib(op, 3) as u8)),
        "IMB" | "IMB2" => {
            let v = r.next_word() & 0xFF;
            let _ = write!(out, "#{v:#04x}");
        }
        "IMW" | "IMW2" => {
            let v = r.next_word();
            let _ = write!(out, "#{v:#06x}");
        }
        "IML" => {
            let hi = r.next_word();
            let lo = r.next_word();
            let _ = write!(out, "#{:#010x}", (u32::from(hi) << 16) | u32::from(lo));
        }
        "PORT" => {
            let v = r.next_word();
            let _ = write!(out, "{v:#06x}");
        }
        "ADR" | "ADRX3" => {
            let index = if token == "ADR" { nib(op, 2) } else { nib(op, 3) };
            let text = r.addr_operand();
            out.push_str(&text);
            if index != 0 {
                let _ = write!(out, "({})", word_reg(index));
            }
        }
        "BA2" => {
            let disp = r.next_word();
            let base = if r.segmented {
                long_reg(nib(op, 2))
            } else {
                word_reg(nib(op, 2))
            };
            let _ = write!(out, "{base}(#{disp:#06x})");
        }
        "BX2" => {
            let index = usize::from((r.next_word() >> 8) & 0x0F);
            let base = if r.segmented {
                long_reg(nib(op, 2))
            } else {
                word_reg(nib(op, 2))
            };
            let _ = write!(out, "{base}({})", word_reg(index));
        }
        "REL" => {
            let disp = i32::from(r.next_word() as i16);
            let base = (r.pc & !1).wrapping_add(2 * r.cursor);
            let target = (r.pc & 0xFFFF_0000) | (base.wrapping_add(disp as u32) & 0xFFFF);
            let _ = write!(out, "{target:#06x}");
        }
        "RL8" => {
            let disp = i32::from(op as u8 as i8);
            let base = (r.pc & !1).wrapping_add(2);
            let target = (r.pc & 0xFFFF_0000) | (base.wrapping_add((2 * disp) as u32) & 0xFFFF);
            let _ = write!(out, "{target:#06x}");
        }
        "RL12" => {
            let disp = (i32::from((op & 0x0FFF) as i16) << 20) >> 20;
            let base = (r.pc & !1).wrapping_add(2);
            let target = (r.pc & 0xFFFF_0000) | (base.wrapping_sub((2 * disp) as u32) & 0xFFFF);
            let _ = write!(out, "{target:#06x}");
        }
        "N3" => {
            let _ = write!(out, "{}", nib(op, 3));
        }
        "N3P" => {
            let _ = write!(out, "{}", nib(op, 3) + 1);
        }
        "ROTN" => {
            let _ = write!(out, "{}", ((op >> 1) & 1) + 1);
        }
        "I8" => {
            let _ = write!(out, "#{:#04x}", op & 0xFF);
        }
        "SHC" => {
            let v = r.next_word() as i16;
            let _ = write!(out, "#{v}");
        }
        "SHR1" => {
            let reg = usize::from((r.next_word() >> 8) & 0x0F);
            out.push_str(&word_reg(reg));
        }
        "RBW1" => {
            let reg = usize::from((r.next_word() >> 8) & 0x0F);
            out.push_str(&byte_reg(reg));
        }
        "RWW1" => {
            let reg = usize::from((r.next_word() >> 8) & 0x0F);
            out.push_str(&word_reg(reg));
        }
        "FLG2" => out.push_str(&flag_letters((op >> 4) & 0x0F)),
        "CTL3" => out.push_str(ctl_name(op)),
        "INT" => {
            let mut parts = Vec::new();
            if op & 2 == 0 {
                parts.push("vi");
            }
            if op & 1 == 0 {
                parts.push("nvi");
            }
            out.push_str(&parts.join(","));
        }
        _ => {
            let _ = write!(out, "%{token}");
        }
    }
}

fn render_special(kind: &str, op: u16, r: &mut Renderer<'_>) -> String {
    match kind {
        "res" => format!(".word {op:#06x}"),
        "djnz" => {
            let reg = nib(op, 1);
            let disp = u32::from(op & 0x7F);
            let base = (r.pc & !1).wrapping_add(2);
            let target = (r.pc & 0xFFFF_0000) | (base.wrapping_sub(2 * disp) & 0xFFFF);
            if op & 0x80 != 0 {
                format!("djnz {},{target:#06x}", word_reg(reg))
            } else {
                format!("dbjnz {},{target:#06x}", byte_reg(reg))
            }
        }
        "ldm" => {
            let descr = r.next_word();
            let start = usize::from((descr >> 8) & 0x0F);
            let count = usize::from(descr & 0x0F);
            let list = format!("{}-{}", word_reg(start), word_reg((start + count) & 15));
            let store = op & 0x0F == 9;
            // 0x1C is the indirect form, 0x5C the direct/indexed form with
            // the address following the descriptor word.
            let place = if op >> 8 == 0x1C {
                indirect_reg(nib(op, 2), r.segmented)
            } else {
                let text = r.addr_operand();
                let index = nib(op, 2);
                if index != 0 {
                    format!("{text}({})", word_reg(index))
                } else {
                    text
                }
            };
            if store {
                format!("ldm {place},{list}")
            } else {
                format!("ldm {list},{place}")
            }
        }
        "blk" => render_block(op, r),
        _ => format!(".word {op:#06x}"),
    }
}

fn render_block(op: u16, r: &mut Renderer<'_>) -> String {
    let family = op >> 8;
    let sub = op & 0x0F;
    let w1 = r.next_word();
    let count = word_reg(usize::from((w1 >> 8) & 0x0F));
    let other = usize::from((w1 >> 4) & 0x0F);
    let first = nib(op, 2);
    let single = w1 & 8 != 0;
    let seg = r.segmented;

    match family {
        0xBA | 0xBB => {
            let b = if family == 0xBA { "b" } else { "" };
            match sub {
                0x1 | 0x9 => {
                    let dir = if sub == 0x1 { "i" } else { "d" };
                    let rep = if single { "" } else { "r" };
                    format!(
                        "ld{dir}{rep}{b} {},{},{count}",
                        indirect_reg(other, seg),
                        indirect_reg(first, seg),
                    )
                }
                0x0 | 0x4 | 0x8 | 0xC => {
                    let name = match sub {
                        0x0 => "cpi",
                        0x4 => "cpir",
                        0x8 => "cpd",
                        _ => "cpdr",
                    };
                    let cmp = if family == 0xBA {
                        byte_reg(other)
                    } else {
                        word_reg(other)
                    };
                    format!(
                        "{name}{b} {cmp},{},{count},{}",
                        indirect_reg(first, seg),
                        cc_name((w1 & 0x0F) as u8),
                    )
                }
                0x2 | 0x6 | 0xA | 0xE => {
                    let name = match sub {
                        0x2 => "cpsi",
                        0x6 => "cpsir",
                        0xA => "cpsd",
                        _ => "cpsdr",
                    };
                    format!(
                        "{name}{b} {},{},{count},{}",
                        indirect_reg(other, seg),
                        indirect_reg(first, seg),
                        cc_name((w1 & 0x0F) as u8),
                    )
                }
                _ => format!(".word {op:#06x}"),
            }
        }
        0xB8 => {
            let name = match sub {
                0x0 => "trib",
                0x2 => "trtib",
                0x4 => "trirb",
                0x6 => "trtirb",
                0x8 => "trdb",
                0xA => "trtdb",
                0xC => "trdrb",
                _ => "trtdrb",
            };
            format!(
                "{name} {},{},{count}",
                indirect_reg(first, seg),
                indirect_reg(other, seg),
            )
        }
        0x3A | 0x3B => {
            let b = if family == 0x3A { "b" } else { "" };
            let rep = if single { "" } else { "r" };
            let name = match sub {
                0x0 => "ini",
                0x1 => "sini",
                0x2 => "oti",
                0x3 => "soti",
                0x8 => "ind",
                0x9 => "sind",
                0xA => "otd",
                _ => "sotd",
            };
            let input = matches!(sub, 0x0 | 0x1 | 0x8 | 0x9);
            let (mem_reg, port_reg) = if input { (other, first) } else { (first, other) };
            format!(
                "{name}{rep}{b} {},@{},{count}",
                indirect_reg(mem_reg, seg),
                word_reg(port_reg),
            )
        }
        _ => format!(".word {op:#06x}"),
    }
}
