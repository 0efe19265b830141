use std::collections::BTreeMap;

use crate::Error;

/// Variables visible in the selected frame, by name.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    symbols: BTreeMap<String, u64>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, address: u64) {
        if let Some(previous) = self.symbols.insert(name.to_owned(), address) {
            log::warn!(
                "Symbol '{}' redefined from {:#x} to {:#x}",
                name,
                previous,
                address
            );
        }
    }

    pub fn lookup(&self, name: &str) -> Option<u64> {
        self.symbols.get(name).copied()
    }
}

/// Parses `0x`-prefixed hexadecimal or plain decimal addresses.
pub fn parse_address(text: &str) -> crate::Result<u64> {
    let trimmed = text.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => trimmed.parse(),
    };
    parsed.map_err(|_| Error::InvalidAddress(text.to_owned()))
}

/// Parses `NAME=ADDRESS`.
pub fn parse_symbol_definition(text: &str) -> crate::Result<(String, u64)> {
    let (name, address) = text
        .split_once('=')
        .ok_or_else(|| Error::InvalidSymbolDefinition(text.to_owned()))?;
    let name = name.trim();
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(Error::InvalidSymbolDefinition(text.to_owned()));
    }
    Ok((name.to_owned(), parse_address(address)?))
}
