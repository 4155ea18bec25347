use std::{
    borrow::Cow,
    io::{self, BufRead, BufReader, ErrorKind, Write},
    sync::{
        mpsc::{Receiver, Sender},
        Mutex,
    },
    thread,
};
use tracing::{debug, warn};

use crate::{
    cmd::{Console, Flow},
    history::{Severity, Tracer},
    host::Host,
    x86::cpu::Registers,
};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub enum Event {
    Line(String),
    Stopped(Registers),
    Eof,
}

/// Line-mode output: errors go to `err`, everything else to `out`.
pub struct Terminal<O, E> {
    out: Mutex<O>,
    err: Mutex<E>,
}

impl Terminal<io::Stdout, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> Terminal<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self {
            out: Mutex::new(out),
            err: Mutex::new(err),
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> (O, E) {
        (
            self.out.into_inner().unwrap_or_else(|e| e.into_inner()),
            self.err.into_inner().unwrap_or_else(|e| e.into_inner()),
        )
    }
}

impl<O: Write + Send, E: Write + Send> Tracer for Terminal<O, E> {
    fn add(&self, severity: Severity, line: &str) {
        let _ = if severity == Severity::Error {
            let mut err = self.err.lock().unwrap_or_else(|e| e.into_inner());
            writeln!(err, "{line}")
        } else {
            let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
            writeln!(out, "{line}")
        };
    }

    fn clear(&self) {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        let _ = write!(out, "{CLEAR_SCREEN}").and_then(|_| out.flush());
    }
}

pub fn read_stdin(tx: Sender<Event>) {
    read_lines(BufReader::new(io::stdin()), tx);
}

/// Feeds lines from `input` into `tx` until input ends. Bytes that are not UTF-8 are replaced
/// rather than ending the stream.
pub fn read_lines<R: BufRead + Send + 'static>(mut input: R, tx: Sender<Event>) {
    thread::spawn(move || {
        let mut buf = Vec::new();

        loop {
            buf.clear();

            match input.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    if let Cow::Owned(_) = line {
                        warn!("input line is not valid UTF-8");
                    }

                    let line = line.trim_end_matches(['\n', '\r']).to_owned();
                    if tx.send(Event::Line(line)).is_err() {
                        return;
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("reading input failed: {e}");
                    break;
                }
            }
        }

        let _ = tx.send(Event::Eof);
    });
}

/// Handles one event at a time: command lines and host notifications never overlap.
pub fn run<H: Host>(console: &mut Console<H>, events: Receiver<Event>) {
    for event in events {
        match event {
            Event::Line(line) => {
                if console.execute(line.trim_end_matches('\r')) == Flow::Exit {
                    break;
                }
            }
            Event::Stopped(regs) => console.on_stopped(&regs),
            Event::Eof => break,
        }
    }

    debug!("console closed");
}

#[cfg(test)]
mod tests {
    use std::{
        io::Cursor,
        sync::{mpsc, Arc},
    };

    use super::*;
    use crate::{cmd::builtin, history::LogHistory, host::fake::FakeHost, session::Session};

    fn console(out: Arc<LogHistory>) -> Console<FakeHost> {
        let host = FakeHost::with_regs(Registers {
            cs: 0x08,
            eip: 0x10,
            ..Default::default()
        });

        Console::new(host, Session::default(), out, builtin::table().unwrap())
    }

    #[test]
    fn events_are_handled_in_order_until_exit() {
        let out = Arc::new(LogHistory::capture());
        let mut console = console(out.clone());
        let (tx, rx) = mpsc::channel();

        tx.send(Event::Line("nope\r".into())).unwrap();
        tx.send(Event::Stopped(Registers {
            cs: 0x08,
            eip: 0x20,
            ..Default::default()
        }))
        .unwrap();
        tx.send(Event::Line("exit".into())).unwrap();
        tx.send(Event::Line("r".into())).unwrap();

        run(&mut console, rx);

        assert_eq!(
            out.lines(),
            ["Unknown command \"nope\"", "-> Stopped at 0008:00000020"]
        );
    }

    #[test]
    fn undecodable_line_is_reported_and_reading_goes_on() {
        let out = Arc::new(LogHistory::capture());
        let mut console = console(out.clone());
        let (tx, rx) = mpsc::channel();

        read_lines(Cursor::new(b"\xFF\r\nr\n".to_vec()), tx);
        run(&mut console, rx);

        assert_eq!(out.errors(), ["Unknown command \"\u{FFFD}\""]);
        assert_eq!(out.lines().len(), 1 + 5);
        assert_eq!(console.session().regs().eip, 0x10);
    }

    #[test]
    fn terminal_sends_errors_to_stderr_and_clears_stdout() {
        let term = Terminal::new(Vec::new(), Vec::new());

        term.info("ok");
        term.error("bad");
        term.clear();
        term.warn("hmm");

        let (out, err) = term.into_inner();
        assert_eq!(String::from_utf8(out).unwrap(), "ok\n\x1b[2J\x1b[Hhmm\n");
        assert_eq!(String::from_utf8(err).unwrap(), "bad\n");
    }
}
