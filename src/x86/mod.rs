use serde::{Deserialize, Serialize};
use std::fmt;
use zbus::zvariant::{Signature, Type};

pub mod cpu;
pub mod dec;
pub mod desc;

/// Segment:offset pair as it travels over the bus.
///
/// The host uses signed fields for values that are really unsigned, so both parts keep the raw
/// bit pattern and are re-widened whenever they are displayed.
#[derive(Copy, Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize, Type)]
pub struct Address {
	pub segment: i16,
	pub offset: i32,
}

impl Address {
	pub fn new(segment: u16, offset: u32) -> Self {
		Self {
			segment: segment as i16,
			offset: offset as i32,
		}
	}

	pub fn selector(&self) -> u16 {
		self.segment as u16
	}

	pub fn offset(&self) -> u32 {
		self.offset as u32
	}
}

impl fmt::Display for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:04X}:{:08X}", self.selector(), self.offset())
	}
}

#[derive(Copy, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Register {
	Flags,
	Eax,
	Ebx,
	Ecx,
	Edx,
	Esi,
	Edi,
	Ebp,
	Esp,
	Eip,
	Es,
	Cs,
	Ss,
	Ds,
	Fs,
	Gs,
}

impl Register {
	pub const ALL: [Register; 16] = [
		Register::Flags,
		Register::Eax,
		Register::Ebx,
		Register::Ecx,
		Register::Edx,
		Register::Esi,
		Register::Edi,
		Register::Ebp,
		Register::Esp,
		Register::Eip,
		Register::Es,
		Register::Cs,
		Register::Ss,
		Register::Ds,
		Register::Fs,
		Register::Gs,
	];

	pub fn name(self) -> &'static str {
		match self {
			Register::Flags => "FLAGS",
			Register::Eax => "EAX",
			Register::Ebx => "EBX",
			Register::Ecx => "ECX",
			Register::Edx => "EDX",
			Register::Esi => "ESI",
			Register::Edi => "EDI",
			Register::Ebp => "EBP",
			Register::Esp => "ESP",
			Register::Eip => "EIP",
			Register::Es => "ES",
			Register::Cs => "CS",
			Register::Ss => "SS",
			Register::Ds => "DS",
			Register::Fs => "FS",
			Register::Gs => "GS",
		}
	}

	pub fn is_segment(self) -> bool {
		matches!(
			self,
			Register::Es | Register::Cs | Register::Ss | Register::Ds | Register::Fs | Register::Gs
		)
	}
}

impl From<Register> for u8 {
	fn from(reg: Register) -> Self {
		reg as u8
	}
}

impl TryFrom<u8> for Register {
	type Error = String;

	fn try_from(tag: u8) -> Result<Self, Self::Error> {
		Register::ALL
			.get(tag as usize)
			.copied()
			.ok_or_else(|| format!("invalid register tag {tag}"))
	}
}

impl Type for Register {
	fn signature() -> Signature<'static> {
		u8::signature()
	}
}

impl fmt::Display for Register {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

#[derive(Copy, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(into = "u8", from = "u8")]
pub enum BreakpointType {
	Normal,
	Read,
	Write,
	Interrupt,
	InterruptWithAH,
	InterruptWithAX,
	Ephemeral,
	Unknown,
}

impl BreakpointType {
	pub fn name(self) -> &'static str {
		match self {
			BreakpointType::Normal => "Normal",
			BreakpointType::Read => "Read",
			BreakpointType::Write => "Write",
			BreakpointType::Interrupt => "Interrupt",
			BreakpointType::InterruptWithAH => "InterruptWithAH",
			BreakpointType::InterruptWithAX => "InterruptWithAX",
			BreakpointType::Ephemeral => "Ephemeral",
			BreakpointType::Unknown => "Unknown",
		}
	}
}

impl From<BreakpointType> for u8 {
	fn from(kind: BreakpointType) -> Self {
		match kind {
			BreakpointType::Unknown => 0xFF,
			other => other as u8,
		}
	}
}

impl From<u8> for BreakpointType {
	fn from(tag: u8) -> Self {
		match tag {
			0 => BreakpointType::Normal,
			1 => BreakpointType::Read,
			2 => BreakpointType::Write,
			3 => BreakpointType::Interrupt,
			4 => BreakpointType::InterruptWithAH,
			5 => BreakpointType::InterruptWithAX,
			6 => BreakpointType::Ephemeral,
			_ => BreakpointType::Unknown,
		}
	}
}

impl Type for BreakpointType {
	fn signature() -> Signature<'static> {
		u8::signature()
	}
}

impl fmt::Display for BreakpointType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// A breakpoint as owned by the host. `ah`/`al` only qualify the interrupt kinds.
#[derive(Copy, Clone, Debug, Deserialize, Eq, PartialEq, Serialize, Type)]
pub struct Breakpoint {
	pub address: Address,
	pub kind: BreakpointType,
	pub ah: u8,
	pub al: u8,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Type)]
pub struct AssemblyLine {
	pub address: Address,
	pub text: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn address_displays_unsigned() {
		let addr = Address::new(0xF000, 0xFFFF_FFF0);

		assert_eq!(addr.segment, -4096);
		assert_eq!(addr.offset, -16);
		assert_eq!(addr.to_string(), "F000:FFFFFFF0");
	}

	#[test]
	fn register_tags_follow_declaration_order() {
		for (i, reg) in Register::ALL.iter().enumerate() {
			assert_eq!(u8::from(*reg) as usize, i);
			assert_eq!(Register::try_from(i as u8), Ok(*reg));
		}

		assert!(Register::try_from(16).is_err());
	}

	#[test]
	fn unknown_breakpoint_tags_are_tolerated() {
		assert_eq!(BreakpointType::from(0x42), BreakpointType::Unknown);
		assert_eq!(u8::from(BreakpointType::Unknown), 0xFF);
		assert_eq!(BreakpointType::from(4), BreakpointType::InterruptWithAH);
	}
}
