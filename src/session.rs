use anyhow::{bail, Context};
use std::{collections::HashMap, fs, path::Path};

use crate::x86::cpu::Registers;

/// Resolves symbol names typed by the operator to offsets.
pub trait SymbolResolver {
    fn find(&self, name: &str) -> Option<u32>;
}

impl<F> SymbolResolver for F
where
    F: Fn(&str) -> Option<u32>,
{
    fn find(&self, name: &str) -> Option<u32> {
        self(name)
    }
}

#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, u32>,
}

impl SymbolTable {
    /// Reads `name offset` lines; offsets are hex, `#` starts a comment.
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let mut symbols = HashMap::new();

        for (n, line) in text.lines().enumerate() {
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }

            let mut parts = line.split_whitespace();
            let (Some(name), Some(offset), None) = (parts.next(), parts.next(), parts.next())
            else {
                bail!("line {}: expected `name offset`", n + 1);
            };

            let digits = offset.strip_prefix("0x").unwrap_or(offset);
            let offset = u32::from_str_radix(digits, 16)
                .with_context(|| format!("line {}: bad offset \"{offset}\"", n + 1))?;

            symbols.insert(name.to_string(), offset);
        }

        Ok(Self { symbols })
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading symbols from {}", path.display()))?;

        Self::parse(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }
}

impl SymbolResolver for SymbolTable {
    fn find(&self, name: &str) -> Option<u32> {
        self.symbols.get(name).copied()
    }
}

/// What the console knows about the debuggee between commands.
pub struct Session {
    regs: Registers,
    prev: Registers,
    synced: bool,
    symbols: Box<dyn SymbolResolver>,
    bitness: u32,
}

impl Session {
    pub fn new(symbols: Box<dyn SymbolResolver>, bitness: u32) -> Self {
        Self {
            regs: Registers::default(),
            prev: Registers::default(),
            synced: false,
            symbols,
            bitness,
        }
    }

    pub fn regs(&self) -> &Registers {
        &self.regs
    }

    pub fn prev_regs(&self) -> &Registers {
        &self.prev
    }

    pub fn update(&mut self, regs: Registers) {
        self.prev = std::mem::replace(&mut self.regs, regs);
        self.synced = true;
    }

    /// Whether any snapshot has been received from the host yet.
    pub fn has_state(&self) -> bool {
        self.synced
    }

    pub fn find_symbol(&self, name: &str) -> Option<u32> {
        self.symbols.find(name)
    }

    pub fn bitness(&self) -> u32 {
        self.bitness
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Box::new(SymbolTable::default()), 16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_keeps_previous_snapshot() {
        let mut session = Session::default();
        assert!(!session.has_state());

        session.update(Registers {
            eax: 1,
            ..Default::default()
        });
        session.update(Registers {
            eax: 2,
            ..Default::default()
        });

        assert_eq!(session.regs().eax, 2);
        assert_eq!(session.prev_regs().eax, 1);
        assert!(session.has_state());
    }

    #[test]
    fn symbol_file() {
        let table = SymbolTable::parse(
            "# map\n\
             main 0x0100\n\
             \n\
             int21_handler 1F3A  # dos\n",
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.find("main"), Some(0x100));
        assert_eq!(table.find("int21_handler"), Some(0x1F3A));
        assert_eq!(table.find("MAIN"), None);
    }

    #[test]
    fn symbol_file_errors_name_the_line() {
        let err = SymbolTable::parse("main 100\nbroken\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));

        let err = SymbolTable::parse("main xyz\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn closures_resolve_symbols() {
        let session = Session::new(
            Box::new(|name: &str| (name == "entry").then_some(0x42u32)),
            16,
        );

        assert_eq!(session.find_symbol("entry"), Some(0x42));
        assert_eq!(session.find_symbol("other"), None);
    }
}
