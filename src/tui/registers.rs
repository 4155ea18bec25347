use zi::prelude::*;

use crate::x86::{
	cpu::{Registers as Regs, FLAG_MNEMONICS},
	Register,
};

#[derive(Clone, PartialEq)]
pub struct Properties {
	pub regs: Regs,
	pub prev: Regs,
}

pub struct Registers {
	props: Properties,
	frame: Rect,
}

impl Registers {
	fn style(&self, reg: Register) -> Style {
		if self.props.regs.get(reg) != self.props.prev.get(reg) {
			super::ST_CHANGED
		} else {
			super::ST_NORMAL
		}
	}
}

impl Component for Registers {
	type Message = ();
	type Properties = Properties;

	fn create(props: Self::Properties, frame: Rect, _: ComponentLink<Self>) -> Self {
		Self { props, frame }
	}

	fn change(&mut self, props: Self::Properties) -> ShouldRender {
		if self.props != props {
			self.props = props;

			true
		} else {
			false
		}
		.into()
	}

	fn view(&self) -> Layout {
		use Register::*;

		let cols = [
			[Eax, Ebx, Ecx, Edx],
			[Esi, Edi, Ebp, Esp],
			[Cs, Ds, Es, Ss],
			[Fs, Gs, Eip, Flags],
		];

		let mut canvas = Canvas::new(self.frame.size);
		canvas.clear(super::ST_NORMAL);

		let col_width = self.frame.size.width / cols.len();

		for (x, col) in cols.iter().enumerate() {
			for (y, &reg) in col.iter().enumerate() {
				let value = self.props.regs.get(reg);

				canvas.draw_str(
					x * col_width,
					y,
					self.style(reg),
					&if reg.is_segment() {
						format!("{reg}={value:04X}")
					} else {
						format!("{reg}={value:08X}")
					},
				);
			}
		}

		let flags = self.props.regs.flag_bits();
		let prev = self.props.prev.flag_bits();

		for (i, (flag, mnemonic)) in FLAG_MNEMONICS.iter().enumerate() {
			let style = if flags.contains(*flag) != prev.contains(*flag) {
				super::ST_CHANGED
			} else {
				super::ST_CAPTION
			};
			let state = if flags.contains(*flag) { '1' } else { '0' };

			canvas.draw_str(i * 4, cols[0].len(), style, &format!("{mnemonic}={state}"));
		}

		canvas.into()
	}
}
