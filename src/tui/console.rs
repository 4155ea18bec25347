use std::sync::Arc;
use zi::prelude::*;

use crate::history::LogHistory;

pub struct LogProperties {
	pub history: Arc<LogHistory>,
	pub revision: u64,
}

impl PartialEq for LogProperties {
	fn eq(&self, other: &LogProperties) -> bool {
		Arc::ptr_eq(&self.history, &other.history) && self.revision == other.revision
	}
}

/// Tail of the console output, newest line at the bottom.
pub struct Log {
	props: LogProperties,
	frame: Rect,
}

impl Component for Log {
	type Message = ();
	type Properties = LogProperties;

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
		let mut canvas = Canvas::new(self.frame.size);
		canvas.clear(super::ST_NORMAL);

		let height = self.frame.size.height;

		self.props.history.access(|entries| {
			let skip = entries.len().saturating_sub(height);

			for (y, entry) in entries.iter().skip(skip).enumerate() {
				canvas.draw_str(0, y, super::severity_style(entry.severity), &entry.line);
			}
		});

		canvas.into()
	}
}

/// The line being typed.
pub struct Prompt {
	input: String,
	frame: Rect,
}

impl Component for Prompt {
	type Message = ();
	type Properties = String;

	fn create(input: Self::Properties, frame: Rect, _: ComponentLink<Self>) -> Self {
		Self { input, frame }
	}

	fn change(&mut self, input: Self::Properties) -> ShouldRender {
		if self.input != input {
			self.input = input;

			true
		} else {
			false
		}
		.into()
	}

	fn view(&self) -> Layout {
		let mut canvas = Canvas::new(self.frame.size);
		canvas.clear(super::ST_NORMAL);

		canvas.draw_str(0, 0, super::ST_CAPTION, ">");
		canvas.draw_str(2, 0, super::ST_NORMAL, &self.input);

		canvas.into()
	}
}
