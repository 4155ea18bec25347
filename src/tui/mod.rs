use anyhow::Result;
use std::sync::Arc;
use zi::{prelude::*, Colour, Style};

use crate::{
	bus::DebugHostProxyBlocking,
	cmd::{CommandTable, Console},
	history::{LogHistory, Severity},
	session::Session,
};

pub mod console;
pub mod debugbox;
pub mod registers;
pub mod status_bar;

const BG_GRAY: Colour = Colour::rgb(33, 34, 44);
const BG_DARK: Colour = Colour::rgb(14, 20, 25);
const FG_GRAY: Colour = Colour::rgb(224, 224, 224);

const ST_NORMAL: Style = Style::normal(BG_DARK, FG_GRAY);
const ST_CAPTION: Style = Style::normal(BG_DARK, Colour::rgb(127, 109, 92));
const ST_CHANGED: Style = Style::normal(BG_DARK, Colour::rgb(170, 170, 255));
const ST_WARN: Style = Style::normal(BG_DARK, Colour::rgb(241, 250, 140));
const ST_ERROR: Style = Style::normal(BG_DARK, Colour::rgb(255, 0, 127));

fn severity_style(severity: Severity) -> Style {
	match severity {
		Severity::Debug => ST_CAPTION,
		Severity::Info => ST_NORMAL,
		Severity::Warn => ST_WARN,
		Severity::Error => ST_ERROR,
	}
}

pub fn run(
	proxy: DebugHostProxyBlocking<'static>,
	session: Session,
	commands: CommandTable,
	history: usize,
) -> Result<()> {
	let history = Arc::new(LogHistory::new(history));
	let console = Console::new(proxy.clone(), session, history.clone(), commands);

	let app = debugbox::DebugBox::with(debugbox::Properties {
		console,
		proxy,
		history,
	});

	zi_term::incremental()?.run_event_loop(app)?;

	Ok(())
}
