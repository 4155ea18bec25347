use std::{mem, sync::Arc};
use zi::{
	components::border::{Border, BorderProperties, BorderStroke},
	prelude::*,
	AnyCharacter,
};

use crate::{
	bus::{self, DebugHostProxyBlocking},
	cmd::{Console, Flow},
	history::{LogHistory, Tracer},
	host::Host,
	tui::{
		console::{Log, LogProperties, Prompt},
		registers::{Properties as RegistersProperties, Registers},
		status_bar::{Status, StatusBar},
	},
	x86::cpu::Registers as Regs,
};

const BORDER_STYLE: Style = Style::normal(super::BG_DARK, super::FG_GRAY);
const BORDER_STROKE: BorderStroke = BorderStroke::heavy();

pub struct Properties {
	pub console: Console<DebugHostProxyBlocking<'static>>,
	pub proxy: DebugHostProxyBlocking<'static>,
	pub history: Arc<LogHistory>,
}

pub enum Message {
	Insert(char),
	Backspace,
	Execute,
	Stopped(Regs),
}

pub struct DebugBox {
	frame: Rect,
	link: ComponentLink<Self>,
	console: Console<DebugHostProxyBlocking<'static>>,
	history: Arc<LogHistory>,
	input: String,
	status: Status,
}

impl Component for DebugBox {
	type Message = Message;
	type Properties = Properties;

	fn create(props: Self::Properties, frame: Rect, link: ComponentLink<Self>) -> Self {
		let mut status = match Host::state(&props.proxy) {
			Ok(r) => Status::Stopped(r.ip().to_string()),
			Err(e) => Status::Detached(e.to_string()),
		};

		let stopped = link.clone();
		if let Err(e) = bus::listen_stopped(props.proxy, move |regs| stopped.send(Message::Stopped(regs))) {
			status = Status::Detached(e.to_string());
		}

		Self {
			frame,
			link,
			console: props.console,
			history: props.history,
			input: String::new(),
			status,
		}
	}

	fn update(&mut self, message: Self::Message) -> ShouldRender {
		match message {
			Message::Insert(c) => self.input.push(c),
			Message::Backspace => {
				self.input.pop();
			}
			Message::Execute => {
				let line = mem::take(&mut self.input);
				self.history.debug(&format!("> {line}"));

				if self.console.execute(&line) == Flow::Exit {
					self.link.exit();
				}
			}
			Message::Stopped(regs) => {
				self.console.on_stopped(&regs);
				self.status = Status::Stopped(regs.ip().to_string());
			}
		}

		true.into()
	}

	fn bindings(&self, bindings: &mut Bindings<Self>) {
		if !bindings.is_empty() {
			return;
		}

		bindings.set_focus(true);

		bindings.add("type", AnyCharacter, |keys: &[Key]| match keys {
			&[Key::Char('\n')] => Some(Message::Execute),
			&[Key::Char(c)] if c != '\t' => Some(Message::Insert(c)),
			_ => None,
		});
		bindings.command("backspace", || Message::Backspace).with([Key::Backspace]);

		bindings
			.command("exit", |this: &Self| this.link.exit())
			.with([Key::Ctrl('c')]);
	}

	fn view(&self) -> Layout {
		const REGISTERS_WIDTH: usize = 64;

		let history = self.history.clone();
		let log = move || {
			Log::with(LogProperties {
				revision: history.revision(),
				history: history.clone(),
			})
		};

		let session = self.console.session();
		let regs = RegistersProperties {
			regs: *session.regs(),
			prev: *session.prev_regs(),
		};

		Layout::column([
			Item::auto(Layout::row([
				Item::auto(create_pane("console", log)),
				Item::fixed(REGISTERS_WIDTH)(create_pane("regs", move || {
					Registers::with(regs.clone())
				})),
			])),
			Item::fixed(1)(Prompt::with(self.input.clone())),
			Item::fixed(1)(StatusBar::with(self.status.clone())),
		])
	}
}

fn create_pane(title: &str, component: impl Fn() -> Layout + 'static) -> Layout {
	let bp: BorderProperties = BorderProperties::new(component)
		.stroke(BORDER_STROKE)
		.title(Some((title, BORDER_STYLE)));

	Border::with_key(title, bp.style(BORDER_STYLE))
}
