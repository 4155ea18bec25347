//! Operand parsing: numbers, segment:offset addresses, register and breakpoint-type names.
//!
//! Address operands may name a register or a symbol instead of a number, in which case the
//! current register snapshot (or the symbol table) of the session supplies the value.

use crate::{
    error::{Error, Result},
    session::Session,
    x86::{Address, BreakpointType, Register},
};

/// `0x1F` and `01F` are hex, anything else is decimal.
///
/// A lone `0` is zero.
pub fn parse_integer(token: &str) -> Result<i32> {
    let bad = || Error::format(format!("Invalid number \"{token}\""));

    if let Some(hex) = token.strip_prefix("0x") {
        return parse_hex(hex).ok_or_else(bad);
    }

    if token == "0" {
        return Ok(0);
    }

    if let Some(hex) = token.strip_prefix('0') {
        return parse_hex(hex).ok_or_else(bad);
    }

    token.parse::<i32>().map_err(|_| bad())
}

/// Like [`parse_integer`] but rejects negative values.
pub fn parse_count(token: &str) -> Result<i32> {
    match parse_integer(token)? {
        n if n < 0 => Err(Error::format(format!("Expected a non-negative number, got \"{token}\""))),
        n => Ok(n),
    }
}

pub fn parse_byte(token: &str) -> Result<u8> {
    let value = parse_integer(token)?;

    u8::try_from(value).map_err(|_| Error::format(format!("Value \"{token}\" does not fit in a byte")))
}

fn parse_hex(digits: &str) -> Option<i32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    u32::from_str_radix(digits, 16).ok().map(|v| v as i32)
}

fn parse_bare_hex<T: TryFrom<u32>>(token: &str) -> Option<T> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    u32::from_str_radix(token, 16).ok().and_then(|v| T::try_from(v).ok())
}

/// Resolves an offset operand. Registers also suggest the segment they usually pair with.
pub fn resolve_offset(token: &str, session: &Session) -> Result<(u32, Option<u16>)> {
    if let Some(offset) = parse_bare_hex::<u32>(token) {
        return Ok((offset, None));
    }

    let regs = session.regs();
    let paired = match token.to_ascii_uppercase().as_str() {
        "EAX" => Some((regs.eax, regs.ds)),
        "EBX" => Some((regs.ebx, regs.ds)),
        "ECX" => Some((regs.ecx, regs.ds)),
        "EDX" => Some((regs.edx, regs.ds)),
        "ESI" => Some((regs.esi, regs.ds)),
        "EDI" => Some((regs.edi, regs.ds)),
        "EBP" => Some((regs.ebp, regs.ss)),
        "ESP" => Some((regs.esp, regs.ss)),
        "EIP" => Some((regs.eip, regs.cs)),
        _ => None,
    };

    if let Some((offset, segment)) = paired {
        return Ok((offset, Some(segment)));
    }

    if token.is_empty() {
        return Err(Error::format("Expected an address"));
    }

    session
        .find_symbol(token)
        .map(|offset| (offset, None))
        .ok_or_else(|| Error::format(format!("Unresolved symbol \"{token}\"")))
}

fn resolve_segment(token: &str, session: &Session) -> Result<u16> {
    if let Some(segment) = parse_bare_hex::<u16>(token) {
        return Ok(segment);
    }

    let regs = session.regs();
    match token.to_ascii_uppercase().as_str() {
        "CS" => Ok(regs.cs),
        "DS" => Ok(regs.ds),
        "ES" => Ok(regs.es),
        "FS" => Ok(regs.fs),
        "GS" => Ok(regs.gs),
        "SS" => Ok(regs.ss),
        _ => Err(Error::format(format!("Unexpected segment \"{token}\""))),
    }
}

/// Parses `segment:offset`, or a lone offset whose segment comes from the register it names
/// or, failing that, from CS (`code`) or DS.
pub fn parse_address(token: &str, session: &Session, code: bool) -> Result<Address> {
    if let Some((segment, offset)) = token.split_once(':') {
        let segment = resolve_segment(segment, session)?;
        let (offset, _) = resolve_offset(offset, session)?;

        return Ok(Address::new(segment, offset));
    }

    let (offset, hint) = resolve_offset(token, session)?;
    let segment = hint.unwrap_or_else(|| {
        let regs = session.regs();
        if code {
            regs.cs
        } else {
            regs.ds
        }
    });

    Ok(Address::new(segment, offset))
}

pub fn parse_register(token: &str) -> Result<Register> {
    let reg = match token.to_ascii_uppercase().as_str() {
        "FLAGS" | "EFLAGS" => Register::Flags,
        "EAX" => Register::Eax,
        "EBX" => Register::Ebx,
        "ECX" => Register::Ecx,
        "EDX" => Register::Edx,
        "ESI" => Register::Esi,
        "EDI" => Register::Edi,
        "EBP" => Register::Ebp,
        "ESP" => Register::Esp,
        "EIP" => Register::Eip,
        "ES" => Register::Es,
        "CS" => Register::Cs,
        "SS" => Register::Ss,
        "DS" => Register::Ds,
        "FS" => Register::Fs,
        "GS" => Register::Gs,
        _ => return Err(Error::format(format!("Unexpected register \"{token}\""))),
    };

    Ok(reg)
}

pub fn parse_breakpoint_type(token: &str) -> Result<BreakpointType> {
    let kind = match token.to_ascii_uppercase().as_str() {
        "NORMAL" | "N" | "X" => BreakpointType::Normal,
        "READ" | "R" => BreakpointType::Read,
        "WRITE" | "W" => BreakpointType::Write,
        "INTERRUPT" | "INT" => BreakpointType::Interrupt,
        "INTERRUPTWITHAH" | "INTAH" => BreakpointType::InterruptWithAH,
        "INTERRUPTWITHAX" | "INTAX" | "INTAL" => BreakpointType::InterruptWithAX,
        "EPHEMERAL" | "ONCE" => BreakpointType::Ephemeral,
        _ => {
            return Err(Error::format(format!(
                "Unexpected breakpoint type \"{token}\""
            )))
        }
    };

    Ok(kind)
}
