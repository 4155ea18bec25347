use anyhow::{bail, Context, Result};
use std::path::PathBuf;

const DEFAULT_SERVICE: &str = "com.dosbox";
const DEFAULT_HISTORY: usize = 1000;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Bus {
    #[default]
    Session,
    System,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub bus: Bus,
    pub service: String,
    pub symbols: Option<PathBuf>,
    pub history: usize,
    pub bitness: u32,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bus: Bus::default(),
            service: DEFAULT_SERVICE.to_string(),
            symbols: None,
            history: DEFAULT_HISTORY,
            bitness: 16,
            log_file: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(bus) = lookup("DEBUGBOX_BUS") {
            config.bus = match bus.to_ascii_lowercase().as_str() {
                "session" => Bus::Session,
                "system" => Bus::System,
                _ => bail!("DEBUGBOX_BUS: expected `session` or `system`, got \"{bus}\""),
            };
        }

        if let Some(service) = lookup("DEBUGBOX_SERVICE") {
            config.service = service;
        }

        config.symbols = lookup("DEBUGBOX_SYMBOLS").map(PathBuf::from);
        config.log_file = lookup("DEBUGBOX_LOG").map(PathBuf::from);

        if let Some(history) = lookup("DEBUGBOX_HISTORY") {
            config.history = history
                .parse()
                .with_context(|| format!("DEBUGBOX_HISTORY: bad line count \"{history}\""))?;

            if config.history == 0 {
                bail!("DEBUGBOX_HISTORY: must be at least 1");
            }
        }

        if let Some(bitness) = lookup("DEBUGBOX_BITNESS") {
            config.bitness = match bitness.as_str() {
                "16" => 16,
                "32" => 32,
                _ => bail!("DEBUGBOX_BITNESS: expected 16 or 32, got \"{bitness}\""),
            };
        }

        Ok(config)
    }
}
