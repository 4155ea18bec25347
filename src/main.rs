use anyhow::{Context, Result};
use std::{
    fs::File,
    io::{self, IsTerminal},
    sync::{mpsc, Arc, Mutex},
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use zbus::blocking::Connection;

mod bus;
mod cmd;
mod config;
mod error;
mod history;
mod host;
mod repl;
mod session;
#[cfg(feature = "tui")]
mod tui;
mod x86;

use crate::{
    cmd::Console,
    config::{Bus, Config},
    repl::Event,
    session::{Session, SymbolTable},
};

fn main() -> Result<()> {
    let config = Config::from_env()?;
    let tui = cfg!(feature = "tui") && io::stdin().is_terminal();

    init_tracing(&config, tui)?;

    let conn = match config.bus {
        Bus::Session => Connection::session(),
        Bus::System => Connection::system(),
    }
    .context("connecting to D-Bus")?;
    let proxy = bus::proxy(&conn, &config.service)
        .with_context(|| format!("creating proxy for {}", config.service))?;
    info!(service = %config.service, "bus connected");

    let symbols = match &config.symbols {
        Some(path) => SymbolTable::load(path)?,
        None => SymbolTable::default(),
    };
    info!(count = symbols.len(), "symbols loaded");

    let session = Session::new(Box::new(symbols), config.bitness);
    let commands = cmd::builtin::table()?;

    #[cfg(feature = "tui")]
    if tui {
        return tui::run(proxy, session, commands, config.history);
    }

    let (tx, rx) = mpsc::channel();
    let stopped = tx.clone();
    bus::listen_stopped(proxy.clone(), move |regs| {
        let _ = stopped.send(Event::Stopped(regs));
    })?;
    repl::read_stdin(tx);

    let mut console = Console::new(proxy, session, Arc::new(repl::Terminal::stdio()), commands);
    repl::run(&mut console, rx);

    Ok(())
}

fn init_tracing(config: &Config, tui: bool) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env());

    match &config.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;

            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        // the terminal belongs to the UI
        None if tui => {}
        None => builder.with_writer(io::stderr).init(),
    }

    Ok(())
}
