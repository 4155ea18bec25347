use iced_x86::{Code, Decoder, DecoderOptions, Instruction};

use super::{desc::Descriptor, Address};
use crate::{error::Result, host::Host};

const DECODER_OPTIONS: u32 = DecoderOptions::NONE;
const MAX_INSTR_LEN: usize = 15; // maximal instruction length (don't load less than that)

/// Instructions that return to the next one eventually and are worth running over rather than
/// tracing into.
pub fn is_step_over(ins: &Instruction) -> bool {
    ins.is_call_near()
        || ins.is_call_far()
        || ins.is_call_near_indirect()
        || ins.is_call_far_indirect()
        || ins.is_loop()
        || ins.is_loopcc()
        || ins.has_rep_prefix()
        || ins.has_repne_prefix()
        || matches!(ins.code(), Code::Int_imm8 | Code::Int3 | Code::Into)
}

/// Decodes the instruction at `addr` and, when it should be stepped over, returns the address
/// execution resumes at afterwards.
pub fn step_over_target(code: &[u8], addr: Address, bitness: u32) -> Option<Address> {
    let mut dec = Decoder::with_ip(bitness, code, addr.offset().into(), DECODER_OPTIONS);
    let ins = dec.decode();

    if ins.is_invalid() || !is_step_over(&ins) {
        return None;
    }

    let next = if bitness == 16 {
        ins.next_ip16().into()
    } else {
        ins.next_ip32()
    };

    Some(Address::new(addr.selector(), next))
}

/// Code size of the segment `cs` selects. Falls back to `fallback` when the selector does not
/// name a code descriptor, which is the case in real and V86 mode.
pub fn code_bitness(host: &dyn Host, cs: u16, fallback: u32) -> Result<u32> {
    let table = if cs & 4 != 0 { host.ldt()? } else { host.gdt()? };

    Ok(match table.get(usize::from(cs >> 3)) {
        Some(Descriptor::Segment(seg)) if seg.kind.is_code() => {
            if seg.big {
                32
            } else {
                16
            }
        }
        _ => fallback,
    })
}

/// Fetches enough bytes at `addr` from the host to decode one instruction.
pub fn fetch_step_over_target(host: &dyn Host, addr: Address, bitness: u32) -> Result<Option<Address>> {
    let code = host.memory(addr, MAX_INSTR_LEN as i32)?;

    Ok(step_over_target(&code, addr, bitness))
}
