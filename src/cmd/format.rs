use std::fmt::Write;

use crate::x86::{
    cpu::{Registers, FLAG_MNEMONICS},
    desc::{Descriptor, SegmentType},
    Address, AssemblyLine, Breakpoint,
};

const BYTES_PER_LINE: usize = 16;
const NON_ASCII_CHAR: char = '.';

pub fn registers(r: &Registers) -> Vec<String> {
    let set = r.flag_bits();
    let flags = FLAG_MNEMONICS
        .iter()
        .filter(|(flag, _)| set.contains(*flag))
        .fold(String::new(), |a, (_, c)| format!("{a} {c}"));

    vec![
        format!("EAX {:08X} ESI {:08X} DS {:04X} ES {:04X}", r.eax, r.esi, r.ds, r.es),
        format!("EBX {:08X} EDI {:08X} FS {:04X} GS {:04X}", r.ebx, r.edi, r.fs, r.gs),
        format!("ECX {:08X} EBP {:08X}", r.ecx, r.ebp),
        format!("EDX {:08X} ESP {:08X} SS {:04X}", r.edx, r.esp, r.ss),
        format!("CS {:04X} EIP {:08X}{flags}", r.cs, r.eip),
    ]
}

/// Hex dump, 16 bytes a row, with an ASCII column.
pub fn memory(addr: Address, bytes: &[u8]) -> Vec<String> {
    bytes
        .chunks(BYTES_PER_LINE)
        .enumerate()
        .map(|(y, row)| {
            let offset = addr
                .offset()
                .wrapping_add((y * BYTES_PER_LINE) as u32);

            let mut line = format!("{}", Address::new(addr.selector(), offset));
            line.push(' ');

            let mut hex = String::with_capacity(BYTES_PER_LINE * 3);
            for (i, b) in row.iter().enumerate() {
                let _ = write!(hex, "{b:02X}{}", if i % 2 == 0 { '-' } else { ' ' });
            }

            let _ = write!(line, "{hex:<width$} ", width = BYTES_PER_LINE * 3);
            line.extend(row.iter().map(|&b| {
                if matches!(b, 0x20..=0x7E) {
                    char::from(b)
                } else {
                    NON_ASCII_CHAR
                }
            }));

            line
        })
        .collect()
}

pub fn disassembly(lines: &[AssemblyLine]) -> Vec<String> {
    lines
        .iter()
        .map(|l| format!("{} {}", l.address, l.text))
        .collect()
}

pub fn breakpoints(bps: &[Breakpoint]) -> Vec<String> {
    bps.iter()
        .map(|bp| format!("{} {} {:02X} {:02X}", bp.address, bp.kind, bp.ah, bp.al))
        .collect()
}

/// One line per used slot. Segment slots show the selector that would load them.
pub fn descriptors(descs: &[Descriptor], ldt: bool) -> Vec<String> {
    let size = |big: bool| if big { "32-bit" } else { "16-bit" };

    descs
        .iter()
        .enumerate()
        .filter(|(_, d)| d.kind() != SegmentType::SysInvalid)
        .map(|(index, d)| match d {
            Descriptor::Gate(g) => format!(
                "{} {:04X}:{:08X} {} DPL {}",
                g.kind,
                g.selector,
                g.offset,
                size(g.big),
                g.dpl
            ),
            Descriptor::Segment(s) => {
                let selector = (index << 3) | s.dpl as usize | if ldt { 4 } else { 0 };

                format!(
                    "{:04X} {} base {:08X} limit {:08X} {} DPL {}",
                    selector as u16,
                    s.kind,
                    s.base,
                    s.limit,
                    size(s.big),
                    s.dpl
                )
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::x86::{
        desc::{GateDescriptor, SegmentDescriptor},
        BreakpointType,
    };

    fn segment(kind: SegmentType, dpl: u8) -> Descriptor {
        Descriptor::Segment(SegmentDescriptor {
            kind,
            base: 0x0001_0000,
            limit: 0xFFFF,
            big: true,
            dpl,
        })
    }

    #[test]
    fn register_block() {
        let regs = Registers {
            flags: 0x0001 | 0x0040 | 0x0200 | 0x0800,
            eax: 0xDEADBEEF,
            eip: 0x100,
            cs: 0x08,
            ss: 0x10,
            ..Default::default()
        };

        assert_eq!(
            registers(&regs),
            [
                "EAX DEADBEEF ESI 00000000 DS 0000 ES 0000",
                "EBX 00000000 EDI 00000000 FS 0000 GS 0000",
                "ECX 00000000 EBP 00000000",
                "EDX 00000000 ESP 00000000 SS 0010",
                "CS 0008 EIP 00000100 C Z O I",
            ]
        );
    }

    #[test]
    fn register_block_without_flags() {
        let lines = registers(&Registers::default());
        assert_eq!(lines[4], "CS 0000 EIP 00000000");
    }

    #[test]
    fn full_row() {
        let bytes: Vec<u8> = (0x40..0x50).collect();
        let lines = memory(Address::new(0x10, 0x100), &bytes);

        assert_eq!(
            lines,
            ["0010:00000100 40-41 42-43 44-45 46-47 48-49 4A-4B 4C-4D 4E-4F  @ABCDEFGHIJKLMNO"]
        );
    }

    #[test]
    fn partial_row_keeps_sidebar() {
        let mut bytes = vec![0u8; 16];
        bytes.push(b'Z');
        let lines = memory(Address::new(0x10, 0xFFFF_FFF8), &bytes);

        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(&".".repeat(16)));
        assert!(lines[1].starts_with("0010:00000008 5A-"));
        assert!(lines[1].ends_with(" Z"));
        assert_eq!(lines[0].len(), lines[1].len() + 15);
    }

    #[test]
    fn empty_dump() {
        assert!(memory(Address::default(), &[]).is_empty());
    }

    #[test]
    fn asm_lines() {
        let lines = disassembly(&[AssemblyLine {
            address: Address::new(0x08, 0x100),
            text: "mov ax,0021".into(),
        }]);

        assert_eq!(lines, ["0008:00000100 mov ax,0021"]);
    }

    #[test]
    fn breakpoint_lines() {
        let lines = breakpoints(&[Breakpoint {
            address: Address::new(0xF000, 0x21),
            kind: BreakpointType::InterruptWithAX,
            ah: 0x4C,
            al: 0x0,
        }]);

        assert_eq!(lines, ["F000:00000021 InterruptWithAX 4C 00"]);
    }

    #[test]
    fn invalid_slots_are_skipped() {
        let descs = [
            segment(SegmentType::SysInvalid, 0),
            segment(SegmentType::CodeExecuteRead, 0),
            segment(SegmentType::DataReadWrite, 0),
            segment(SegmentType::SysInvalid, 0),
            segment(SegmentType::DataReadWrite, 3),
        ];

        let lines = descriptors(&descs, false);

        assert_eq!(
            lines,
            [
                "0008 CodeExecuteRead base 00010000 limit 0000FFFF 32-bit DPL 0",
                "0010 DataReadWrite base 00010000 limit 0000FFFF 32-bit DPL 0",
                "0023 DataReadWrite base 00010000 limit 0000FFFF 32-bit DPL 3",
            ]
        );
        assert!(!lines.iter().any(|l| l.starts_with("0018")));
    }

    #[test]
    fn local_selectors_set_table_bit() {
        let descs = [segment(SegmentType::SysInvalid, 0), segment(SegmentType::DataReadWrite, 0)];

        let global = descriptors(&descs, false);
        let local = descriptors(&descs, true);

        assert!(global[0].starts_with("0008 "));
        assert!(local[0].starts_with("000C "));
    }

    #[test]
    fn gates_show_target() {
        let descs = [Descriptor::Gate(GateDescriptor {
            kind: SegmentType::Sys386CallGate,
            selector: 0x08,
            offset: 0x1000,
            big: true,
            dpl: 3,
        })];

        assert_eq!(
            descriptors(&descs, false),
            ["Sys386CallGate 0008:00001000 32-bit DPL 3"]
        );
    }
}
