/// Stock locate <-> symbol directory.
///
/// Locates are small dense integers assigned per session, so the
/// forward direction is a plain vector grown to the highest locate
/// observed. The reverse direction is a hash map keyed by the 8-byte
/// symbol. Entries are append-only for the life of a session.

use rustc_hash::FxHashMap;

use crate::types::{StockLocate, Symbol};

#[derive(Debug, Clone, Copy)]
pub struct SymbolInfo {
    pub symbol: Symbol,
    pub market_category: u8,
    pub financial_status: u8,
    pub active: bool,
}

impl Default for SymbolInfo {
    fn default() -> Self {
        SymbolInfo {
            symbol: Symbol::default(),
            market_category: b' ',
            financial_status: b' ',
            active: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct SymbolDirectory {
    symbols: Vec<SymbolInfo>,
    locate_by_symbol: FxHashMap<Symbol, StockLocate>,
}

impl SymbolDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        locate: StockLocate,
        symbol: Symbol,
        market_category: u8,
        financial_status: u8,
    ) {
        let idx = locate as usize;
        if idx >= self.symbols.len() {
            self.symbols.resize_with(idx + 1, SymbolInfo::default);
        }
        self.symbols[idx] = SymbolInfo {
            symbol,
            market_category,
            financial_status,
            active: true,
        };
        self.locate_by_symbol.insert(symbol, locate);
    }

    pub fn info(&self, locate: StockLocate) -> Option<&SymbolInfo> {
        self.symbols
            .get(locate as usize)
            .filter(|info| info.active)
    }

    pub fn symbol(&self, locate: StockLocate) -> Option<Symbol> {
        self.info(locate).map(|info| info.symbol)
    }

    pub fn locate(&self, symbol: &Symbol) -> Option<StockLocate> {
        self.locate_by_symbol.get(symbol).copied()
    }

    /// Number of registered symbols.
    pub fn len(&self) -> usize {
        self.locate_by_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locate_by_symbol.is_empty()
    }
}
