use bitflags::bitflags;
use serde::Deserialize;
use zbus::zvariant::Type;

use super::{Address, Register};

bitflags! {
	#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
	pub struct Flags: u32 {
		const CF = 0x0001;
		const PF = 0x0004;
		const AF = 0x0010;
		const ZF = 0x0040;
		const SF = 0x0080;
		const TF = 0x0100;
		const IF = 0x0200;
		const DF = 0x0400;
		const OF = 0x0800;
	}
}

/// Flags in the order they are listed on the register dump.
pub const FLAG_MNEMONICS: [(Flags, char); 9] = [
	(Flags::CF, 'C'),
	(Flags::ZF, 'Z'),
	(Flags::SF, 'S'),
	(Flags::OF, 'O'),
	(Flags::AF, 'A'),
	(Flags::PF, 'P'),
	(Flags::DF, 'D'),
	(Flags::IF, 'I'),
	(Flags::TF, 'T'),
];

#[derive(Copy, Clone, Debug, Default, Deserialize, Eq, PartialEq, Type)]
pub struct Registers {
	pub stopped: bool,
	pub flags: u32,
	pub eax: u32,
	pub ebx: u32,
	pub ecx: u32,
	pub edx: u32,
	pub esi: u32,
	pub edi: u32,
	pub ebp: u32,
	pub esp: u32,
	pub eip: u32,
	pub cs: u16,
	pub ds: u16,
	pub es: u16,
	pub ss: u16,
	pub fs: u16,
	pub gs: u16,
}

impl Registers {
	pub fn get(&self, reg: Register) -> u32 {
		match reg {
			Register::Flags => self.flags,
			Register::Eax => self.eax,
			Register::Ebx => self.ebx,
			Register::Ecx => self.ecx,
			Register::Edx => self.edx,
			Register::Esi => self.esi,
			Register::Edi => self.edi,
			Register::Ebp => self.ebp,
			Register::Esp => self.esp,
			Register::Eip => self.eip,
			Register::Es => self.es.into(),
			Register::Cs => self.cs.into(),
			Register::Ss => self.ss.into(),
			Register::Ds => self.ds.into(),
			Register::Fs => self.fs.into(),
			Register::Gs => self.gs.into(),
		}
	}

	pub fn flag_bits(&self) -> Flags {
		Flags::from_bits_truncate(self.flags)
	}

	pub fn ip(&self) -> Address {
		Address::new(self.cs, self.eip)
	}
}
