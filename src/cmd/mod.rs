use std::{collections::HashMap, sync::Arc};
use thiserror::Error as ThisError;
use tracing::{debug, warn};

use crate::{
    error::{Error, Result},
    history::Tracer,
    host::Host,
    session::Session,
    x86::cpu::Registers,
};

pub mod builtin;
pub mod format;
pub mod parse;

/// Pull cursor over the arguments of one command line. Reading past the end yields `""`, which
/// handlers take as "argument omitted".
pub struct Args<'a> {
    tokens: std::slice::Iter<'a, &'a str>,
}

impl<'a> Args<'a> {
    pub fn new(tokens: &'a [&'a str]) -> Self {
        Self {
            tokens: tokens.iter(),
        }
    }

    pub fn next_arg(&mut self) -> &'a str {
        self.tokens.next().copied().unwrap_or("")
    }

    pub fn rest(&mut self) -> Vec<&'a str> {
        self.tokens.by_ref().copied().collect()
    }
}

/// Everything a handler may touch while it runs.
pub struct Context<'a> {
    pub host: &'a dyn Host,
    pub session: &'a mut Session,
    pub out: &'a dyn Tracer,
    pub commands: &'a CommandTable,
    pub exit: bool,
}

impl Context<'_> {
    pub fn print(&self, lines: impl IntoIterator<Item = String>) {
        for line in lines {
            self.out.info(&line);
        }
    }

    /// Prints a register snapshot and makes it the session's current one.
    pub fn show_registers(&mut self, regs: Registers) {
        self.session.update(regs);
        self.print(format::registers(&regs));
    }
}

pub type Handler = fn(&mut Args<'_>, &mut Context<'_>) -> Result<()>;

pub struct Command {
    pub names: &'static [&'static str],
    pub description: &'static str,
    pub handler: Handler,
}

impl Command {
    pub fn name(&self) -> &'static str {
        self.names[0]
    }
}

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum BuildError {
    #[error("command \"{0}\" has no names")]
    NoNames(&'static str),
    #[error("invalid command name \"{0}\"")]
    BadName(&'static str),
    #[error("command name \"{0}\" registered twice")]
    Duplicate(&'static str),
}

#[derive(Default)]
pub struct TableBuilder {
    commands: Vec<Command>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command(
        mut self,
        names: &'static [&'static str],
        description: &'static str,
        handler: Handler,
    ) -> Self {
        self.commands.push(Command {
            names,
            description,
            handler,
        });
        self
    }

    pub fn build(self) -> std::result::Result<CommandTable, BuildError> {
        let mut aliases = HashMap::new();

        for (i, cmd) in self.commands.iter().enumerate() {
            if cmd.names.is_empty() {
                return Err(BuildError::NoNames(cmd.description));
            }

            for &name in cmd.names {
                if name.is_empty() || name.contains(char::is_whitespace) {
                    return Err(BuildError::BadName(name));
                }

                if aliases.insert(name.to_ascii_uppercase(), i).is_some() {
                    return Err(BuildError::Duplicate(name));
                }
            }
        }

        Ok(CommandTable {
            commands: self.commands,
            aliases,
        })
    }
}

/// Immutable alias → command lookup, built once at startup.
pub struct CommandTable {
    commands: Vec<Command>,
    aliases: HashMap<String, usize>,
}

impl CommandTable {
    pub fn find(&self, name: &str) -> Option<&Command> {
        self.aliases
            .get(&name.to_ascii_uppercase())
            .map(|&i| &self.commands[i])
    }

    /// One line per command, ordered by first alias, descriptions aligned.
    pub fn help(&self) -> Vec<String> {
        let mut commands: Vec<&Command> = self.commands.iter().collect();
        commands.sort_by_key(|c| c.name().to_ascii_lowercase());

        let names: Vec<String> = commands.iter().map(|c| c.names.join(" ")).collect();
        let width = names.iter().map(String::len).max().unwrap_or(0);

        commands
            .iter()
            .zip(names)
            .map(|(cmd, names)| format!("{names:<width$}: {}", cmd.description))
            .collect()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Reads command lines and runs them against the host, one at a time.
pub struct Console<H> {
    host: H,
    session: Session,
    out: Arc<dyn Tracer>,
    commands: CommandTable,
}

impl<H: Host> Console<H> {
    pub fn new(host: H, session: Session, out: Arc<dyn Tracer>, commands: CommandTable) -> Self {
        Self {
            host,
            session,
            out,
            commands,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn execute(&mut self, line: &str) -> Flow {
        if line.trim().is_empty() {
            return Flow::Continue;
        }

        let tokens: Vec<&str> = line.split(' ').filter(|t| !t.is_empty()).collect();
        let Some((name, rest)) = tokens.split_first() else {
            return Flow::Continue;
        };

        let Some(command) = self.commands.find(name) else {
            self.out.error(&format!("Unknown command \"{name}\""));
            return Flow::Continue;
        };

        debug!(command = command.name(), args = rest.len(), "dispatching");

        let mut args = Args::new(rest);
        let mut ctx = Context {
            host: &self.host,
            session: &mut self.session,
            out: self.out.as_ref(),
            commands: &self.commands,
            exit: false,
        };

        if let Err(e) = (command.handler)(&mut args, &mut ctx) {
            warn!(command = command.name(), "command failed: {e}");

            match e {
                Error::Format(msg) => self.out.error(&format!("Parse error: {msg}")),
                Error::Remote(e) => self.out.error(&format!("Host error: {e}")),
            }
        }

        if ctx.exit {
            Flow::Exit
        } else {
            Flow::Continue
        }
    }

    /// Reports a `Stopped` notification. The register snapshot is left alone.
    pub fn on_stopped(&self, regs: &Registers) {
        self.out.info(&format!("-> Stopped at {}", regs.ip()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{history::LogHistory, host::fake::FakeHost};

    fn nop(_: &mut Args<'_>, _: &mut Context<'_>) -> Result<()> {
        Ok(())
    }

    fn console(host: FakeHost) -> (Console<FakeHost>, Arc<LogHistory>) {
        let out = Arc::new(LogHistory::capture());
        let console = Console::new(host, Session::default(), out.clone(), builtin::table().unwrap());
        (console, out)
    }

    #[test]
    fn args_yield_empty_when_exhausted() {
        let tokens = ["a", "b"];
        let mut args = Args::new(&tokens);

        assert_eq!(args.next_arg(), "a");
        assert_eq!(args.next_arg(), "b");
        assert_eq!(args.next_arg(), "");
        assert_eq!(args.next_arg(), "");
    }

    #[test]
    fn builder_rejects_bad_tables() {
        let err = TableBuilder::new().command(&[], "nothing", nop).build().err();
        assert_eq!(err, Some(BuildError::NoNames("nothing")));

        let err = TableBuilder::new().command(&["a b"], "x", nop).build().err();
        assert_eq!(err, Some(BuildError::BadName("a b")));

        let err = TableBuilder::new().command(&[""], "x", nop).build().err();
        assert_eq!(err, Some(BuildError::BadName("")));

        let err = TableBuilder::new()
            .command(&["go", "g"], "x", nop)
            .command(&["G"], "y", nop)
            .build()
            .err();
        assert_eq!(err, Some(BuildError::Duplicate("G")));
    }

    #[test]
    fn lookup_ignores_case() {
        let table = builtin::table().unwrap();

        assert_eq!(table.find("getstate").map(Command::name), Some("GetState"));
        assert_eq!(table.find("R").map(Command::name), Some("GetState"));
        assert!(table.find("nope").is_none());
    }

    #[test]
    fn help_lists_each_command_once() {
        let table = TableBuilder::new()
            .command(&["zap", "z"], "last", nop)
            .command(&["help", "?"], "Show help", nop)
            .command(&["Alpha"], "first", nop)
            .build()
            .unwrap();

        assert_eq!(
            table.help(),
            ["Alpha : first", "help ?: Show help", "zap z : last"]
        );
    }

    #[test]
    fn builtin_help_has_no_duplicates() {
        let table = builtin::table().unwrap();
        let help = table.help();

        assert_eq!(help.len(), table.commands.len());
        assert_eq!(help.iter().filter(|l| l.starts_with("help ?")).count(), 1);
    }

    #[test]
    fn blank_and_unknown_lines() {
        let (mut console, out) = console(FakeHost::default());
        console.session.update(Registers {
            eax: 7,
            ..Default::default()
        });
        let before = *console.session().regs();

        assert_eq!(console.execute(""), Flow::Continue);
        assert_eq!(console.execute("   \t "), Flow::Continue);
        assert!(out.lines().is_empty());

        assert_eq!(console.execute("frobnicate 1 2"), Flow::Continue);
        assert_eq!(out.errors(), ["Unknown command \"frobnicate\""]);
        assert_eq!(*console.session().regs(), before);
        assert!(console.host.calls().is_empty());
    }

    #[test]
    fn extra_spaces_between_tokens() {
        let (mut console, _) = console(FakeHost::default());

        console.execute("  gn    05  ");

        assert_eq!(console.host.calls(), ["StepMultiple(5)"]);
    }

    #[test]
    fn parse_errors_are_reported() {
        let (mut console, out) = console(FakeHost::default());

        assert_eq!(console.execute("reg xyz 1"), Flow::Continue);
        assert_eq!(out.errors(), ["Parse error: Unexpected register \"xyz\""]);
        assert!(console.host.calls().is_empty());
    }

    #[test]
    fn host_errors_are_reported() {
        let (mut console, out) = console(FakeHost {
            offline: true,
            ..Default::default()
        });

        assert_eq!(console.execute("r"), Flow::Continue);
        assert_eq!(out.errors().len(), 1);
        assert!(out.errors()[0].starts_with("Host error: "));

        // still usable
        console.execute("bogus");
        assert_eq!(out.errors().len(), 2);
    }

    #[test]
    fn exit_ends_session() {
        let (mut console, _) = console(FakeHost::default());

        assert_eq!(console.execute("EXIT"), Flow::Exit);
        assert_eq!(console.execute("quit"), Flow::Exit);
    }

    #[test]
    fn stopped_notifications_are_only_logged() {
        let (console, out) = console(FakeHost::default());

        console.on_stopped(&Registers {
            cs: 0x08,
            eip: 0x1234,
            ..Default::default()
        });

        assert_eq!(out.lines(), ["-> Stopped at 0008:00001234"]);
        assert_eq!(*console.session().regs(), Registers::default());
    }
}
