use serde::Deserialize;
use std::fmt;
use zbus::zvariant::{Signature, Type};

/// The 5-bit descriptor type (S bit plus the 4-bit type field).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SegmentType {
	SysInvalid,
	Sys286TssAvailable,
	SysLdt,
	Sys286TssBusy,
	Sys286CallGate,
	SysTaskGate,
	Sys286IntGate,
	Sys286TrapGate,
	Sys386TssAvailable,
	Sys386TssBusy,
	Sys386CallGate,
	Sys386IntGate,
	Sys386TrapGate,
	DataReadOnly,
	DataReadOnlyAccessed,
	DataReadWrite,
	DataReadWriteAccessed,
	DataReadOnlyExpandDown,
	DataReadOnlyExpandDownAccessed,
	DataReadWriteExpandDown,
	DataReadWriteExpandDownAccessed,
	CodeExecute,
	CodeExecuteAccessed,
	CodeExecuteRead,
	CodeExecuteReadAccessed,
	CodeConformingExecute,
	CodeConformingExecuteAccessed,
	CodeConformingExecuteRead,
	CodeConformingExecuteReadAccessed,
}

impl SegmentType {
	pub fn is_gate(self) -> bool {
		matches!(
			self,
			SegmentType::Sys286CallGate
				| SegmentType::SysTaskGate
				| SegmentType::Sys286IntGate
				| SegmentType::Sys286TrapGate
				| SegmentType::Sys386CallGate
				| SegmentType::Sys386IntGate
				| SegmentType::Sys386TrapGate
		)
	}

	pub fn is_code(self) -> bool {
		matches!(
			self,
			SegmentType::CodeExecute
				| SegmentType::CodeExecuteAccessed
				| SegmentType::CodeExecuteRead
				| SegmentType::CodeExecuteReadAccessed
				| SegmentType::CodeConformingExecute
				| SegmentType::CodeConformingExecuteAccessed
				| SegmentType::CodeConformingExecuteRead
				| SegmentType::CodeConformingExecuteReadAccessed
		)
	}
}

impl From<u8> for SegmentType {
	fn from(tag: u8) -> Self {
		use SegmentType::*;

		match tag & 0x1F {
			0x01 => Sys286TssAvailable,
			0x02 => SysLdt,
			0x03 => Sys286TssBusy,
			0x04 => Sys286CallGate,
			0x05 => SysTaskGate,
			0x06 => Sys286IntGate,
			0x07 => Sys286TrapGate,
			0x09 => Sys386TssAvailable,
			0x0B => Sys386TssBusy,
			0x0C => Sys386CallGate,
			0x0E => Sys386IntGate,
			0x0F => Sys386TrapGate,
			0x10 => DataReadOnly,
			0x11 => DataReadOnlyAccessed,
			0x12 => DataReadWrite,
			0x13 => DataReadWriteAccessed,
			0x14 => DataReadOnlyExpandDown,
			0x15 => DataReadOnlyExpandDownAccessed,
			0x16 => DataReadWriteExpandDown,
			0x17 => DataReadWriteExpandDownAccessed,
			0x18 => CodeExecute,
			0x19 => CodeExecuteAccessed,
			0x1A => CodeExecuteRead,
			0x1B => CodeExecuteReadAccessed,
			0x1C => CodeConformingExecute,
			0x1D => CodeConformingExecuteAccessed,
			0x1E => CodeConformingExecuteRead,
			0x1F => CodeConformingExecuteReadAccessed,
			// 0x00 and the reserved system encodings 0x08, 0x0A, 0x0D
			_ => SysInvalid,
		}
	}
}

impl fmt::Display for SegmentType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(self, f)
	}
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SegmentDescriptor {
	pub kind: SegmentType,
	pub base: u32,
	pub limit: u32,
	pub big: bool,
	pub dpl: u8,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct GateDescriptor {
	pub kind: SegmentType,
	pub selector: u16,
	pub offset: u32,
	pub big: bool,
	pub dpl: u8,
}

/// One GDT/LDT slot. Which variant a slot decodes to depends only on its type tag.
#[derive(Copy, Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(from = "DescriptorRecord")]
pub enum Descriptor {
	Segment(SegmentDescriptor),
	Gate(GateDescriptor),
}

impl Descriptor {
	pub fn kind(&self) -> SegmentType {
		match self {
			Descriptor::Segment(s) => s.kind,
			Descriptor::Gate(g) => g.kind,
		}
	}
}

/// Flat wire form of a descriptor; D-Bus has no tagged unions.
#[derive(Copy, Clone, Debug, Default, Deserialize, Type)]
pub struct DescriptorRecord {
	pub kind: u8,
	pub base: u32,
	pub limit: u32,
	pub selector: u16,
	pub offset: u32,
	pub big: bool,
	pub dpl: u8,
}

impl From<DescriptorRecord> for Descriptor {
	fn from(r: DescriptorRecord) -> Self {
		let kind = SegmentType::from(r.kind);

		if kind.is_gate() {
			Descriptor::Gate(GateDescriptor {
				kind,
				selector: r.selector,
				offset: r.offset,
				big: r.big,
				dpl: r.dpl & 3,
			})
		} else {
			Descriptor::Segment(SegmentDescriptor {
				kind,
				base: r.base,
				limit: r.limit,
				big: r.big,
				dpl: r.dpl & 3,
			})
		}
	}
}

impl Type for Descriptor {
	fn signature() -> Signature<'static> {
		DescriptorRecord::signature()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn gate_types_decode_as_gates() {
		for tag in [0x04, 0x05, 0x06, 0x07, 0x0C, 0x0E, 0x0F] {
			let desc = Descriptor::from(DescriptorRecord {
				kind: tag,
				selector: 0x08,
				offset: 0x1234,
				..Default::default()
			});

			assert!(matches!(desc, Descriptor::Gate(g) if g.selector == 0x08 && g.offset == 0x1234));
		}
	}

	#[test]
	fn data_segments_are_not_gates() {
		// 0x14 has the gate bit of the system encoding set
		let desc = Descriptor::from(DescriptorRecord {
			kind: 0x14,
			base: 0x1000,
			limit: 0xFFFF,
			dpl: 3,
			..Default::default()
		});

		assert_eq!(
			desc,
			Descriptor::Segment(SegmentDescriptor {
				kind: SegmentType::DataReadOnlyExpandDown,
				base: 0x1000,
				limit: 0xFFFF,
				big: false,
				dpl: 3,
			})
		);
	}

	#[test]
	fn reserved_system_types_are_invalid() {
		for tag in [0x00, 0x08, 0x0A, 0x0D] {
			assert_eq!(SegmentType::from(tag), SegmentType::SysInvalid);
		}
	}
}
