//! Symbol table for the Hack assembler
//!
//! Predefined symbols never change, so they live in a compile-time `phf`
//! map; labels and variables go into a `HashMap` as the two passes
//! discover them. The table owns the variable-allocation cursor: the
//! first reference to an unbound symbol in pass 2 claims the next RAM
//! address, starting at 16.

use phf::phf_map;
use std::collections::HashMap;

/// First RAM address handed out to user variables.
const FIRST_VARIABLE_ADDRESS: u16 = 16;

static PREDEFINED_SYMBOLS: phf::Map<&'static str, u16> = phf_map! {
    "R0" => 0,
    "R1" => 1,
    "R2" => 2,
    "R3" => 3,
    "R4" => 4,
    "R5" => 5,
    "R6" => 6,
    "R7" => 7,
    "R8" => 8,
    "R9" => 9,
    "R10" => 10,
    "R11" => 11,
    "R12" => 12,
    "R13" => 13,
    "R14" => 14,
    "R15" => 15,

    "SP" => 0,
    "LCL" => 1,
    "ARG" => 2,
    "THIS" => 3,
    "THAT" => 4,

    "SCREEN" => 16384,
    "KBD" => 24576,
};

/// Maps symbols to 16-bit addresses.
///
/// # Example
/// ```
/// use hack_assembler::SymbolTable;
///
/// let mut table = SymbolTable::new();
/// assert_eq!(table.address_of("SP"), Some(0));
///
/// table.bind("LOOP", 100);
/// assert_eq!(table.address_of("LOOP"), Some(100));
///
/// // First reference to an unknown symbol allocates a variable slot.
/// assert_eq!(table.resolve("i"), 16);
/// assert_eq!(table.resolve("sum"), 17);
/// assert_eq!(table.resolve("i"), 16);
/// ```
#[derive(Debug)]
pub struct SymbolTable {
    user_symbols: HashMap<String, u16>,
    next_variable: u16,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            user_symbols: HashMap::with_capacity(32),
            next_variable: FIRST_VARIABLE_ADDRESS,
        }
    }

    /// Binds a label to an instruction address (pass 1).
    ///
    /// Predefined symbols and already-bound labels keep their first
    /// binding.
    pub fn bind(&mut self, symbol: &str, address: u16) {
        if PREDEFINED_SYMBOLS.contains_key(symbol) {
            return;
        }
        self.user_symbols
            .entry(symbol.to_string())
            .or_insert(address);
    }

    #[must_use]
    pub fn contains(&self, symbol: &str) -> bool {
        PREDEFINED_SYMBOLS.contains_key(symbol) || self.user_symbols.contains_key(symbol)
    }

    /// The address bound to `symbol`, if any.
    #[must_use]
    pub fn address_of(&self, symbol: &str) -> Option<u16> {
        PREDEFINED_SYMBOLS
            .get(symbol)
            .or_else(|| self.user_symbols.get(symbol))
            .copied()
    }

    /// Resolves a symbol during pass 2, allocating a variable slot on the
    /// first reference to a name no label or predefined symbol claimed.
    pub fn resolve(&mut self, symbol: &str) -> u16 {
        if let Some(&address) = PREDEFINED_SYMBOLS.get(symbol) {
            return address;
        }

        use std::collections::hash_map::Entry;
        match self.user_symbols.entry(symbol.to_string()) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(e) => {
                let address = self.next_variable;
                self.next_variable += 1;
                *e.insert(address)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predefined_symbols() {
        let table = SymbolTable::new();

        assert_eq!(table.address_of("SP"), Some(0));
        assert_eq!(table.address_of("LCL"), Some(1));
        assert_eq!(table.address_of("ARG"), Some(2));
        assert_eq!(table.address_of("THIS"), Some(3));
        assert_eq!(table.address_of("THAT"), Some(4));
        assert_eq!(table.address_of("SCREEN"), Some(16384));
        assert_eq!(table.address_of("KBD"), Some(24576));

        for i in 0..=15 {
            assert_eq!(table.address_of(&format!("R{i}")), Some(i));
        }
    }

    #[test]
    fn labels_bind_once() {
        let mut table = SymbolTable::new();

        table.bind("LOOP", 100);
        assert_eq!(table.address_of("LOOP"), Some(100));

        table.bind("LOOP", 200);
        assert_eq!(table.address_of("LOOP"), Some(100));
    }

    #[test]
    fn predefined_symbols_cannot_be_rebound() {
        let mut table = SymbolTable::new();

        table.bind("SP", 99);
        assert_eq!(table.address_of("SP"), Some(0));

        assert_eq!(table.resolve("SP"), 0);
        assert_eq!(table.resolve("first"), 16); // cursor untouched
    }

    #[test]
    fn variables_allocate_from_sixteen() {
        let mut table = SymbolTable::new();

        assert_eq!(table.resolve("i"), 16);
        assert_eq!(table.resolve("sum"), 17);
        assert_eq!(table.resolve("i"), 16);
        assert_eq!(table.resolve("j"), 18);
    }

    #[test]
    fn labels_win_over_variable_allocation() {
        let mut table = SymbolTable::new();

        table.bind("END", 42);
        assert_eq!(table.resolve("END"), 42);
        assert_eq!(table.resolve("var"), 16);
    }

    #[test]
    fn unknown_symbols_are_absent_until_resolved() {
        let mut table = SymbolTable::new();

        assert!(!table.contains("x"));
        assert_eq!(table.address_of("x"), None);

        table.resolve("x");
        assert!(table.contains("x"));
    }
}
