//! Market catalog: the static allow-list of markets the adapter serves.
//!
//! Loaded once at construction and never mutated. Every symbol-bearing
//! operation resolves through here first; anything not listed is
//! `NotSupported` before a backend is touched.

use crate::error::{AdapterError, AdapterResult, NotSupportedCause};
use crate::shared::{NativeId, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One allow-listed market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Canonical symbol, e.g. `BTC/USD`.
    pub symbol: Symbol,
    /// Reya market symbol, e.g. `BTCRUSDPERP`.
    pub native_id: NativeId,
    /// Reya numeric market id, used in signed order actions.
    pub market_id: u32,
    /// Pair on the fallback spot exchange, e.g. `BTCUSDT`.
    pub fallback_id: Option<NativeId>,
}

impl CatalogEntry {
    pub fn new(
        symbol: impl Into<Symbol>,
        native_id: impl Into<NativeId>,
        market_id: u32,
        fallback_id: Option<&str>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            native_id: native_id.into(),
            market_id,
            fallback_id: fallback_id.map(NativeId::from),
        }
    }
}

lazy_static::lazy_static! {
    /// Markets enabled out of the box.
    pub static ref DEFAULT_ENTRIES: Vec<CatalogEntry> = vec![
        CatalogEntry::new("BTC/USD", "BTCRUSDPERP", 1, Some("BTCUSDT")),
        CatalogEntry::new("ETH/USD", "ETHRUSDPERP", 2, Some("ETHUSDT")),
    ];
}

/// Bidirectional symbol ↔ native-id lookup over the allow-list.
#[derive(Debug, Clone)]
pub struct MarketCatalog {
    entries: Vec<CatalogEntry>,
    by_symbol: HashMap<Symbol, usize>,
    by_native: HashMap<NativeId, usize>,
}

impl MarketCatalog {
    /// Build a catalog. Later duplicates of a symbol or native id are ignored.
    pub fn new(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut catalog = Self {
            entries: Vec::new(),
            by_symbol: HashMap::new(),
            by_native: HashMap::new(),
        };
        for entry in entries {
            if catalog.by_symbol.contains_key(&entry.symbol)
                || catalog.by_native.contains_key(&entry.native_id)
            {
                tracing::warn!(symbol = %entry.symbol, "Duplicate catalog entry ignored");
                continue;
            }
            let idx = catalog.entries.len();
            catalog.by_symbol.insert(entry.symbol.clone(), idx);
            catalog.by_native.insert(entry.native_id.clone(), idx);
            catalog.entries.push(entry);
        }
        catalog
    }

    /// Resolve a canonical symbol, or `NotSupported` if it is not allow-listed.
    pub fn resolve(&self, symbol: &Symbol) -> AdapterResult<&CatalogEntry> {
        self.by_symbol
            .get(symbol)
            .map(|&idx| &self.entries[idx])
            .ok_or_else(|| AdapterError::NotSupported {
                subject: symbol.to_string(),
                cause: NotSupportedCause::AdapterNotExtended,
                detail: format!("enabled markets: {}", self.symbol_list()),
            })
    }

    /// Reverse lookup from a Reya market symbol.
    pub fn symbol_for(&self, native_id: &NativeId) -> AdapterResult<&CatalogEntry> {
        self.lookup_native(native_id)
            .ok_or_else(|| AdapterError::NotSupported {
                subject: native_id.to_string(),
                cause: NotSupportedCause::AdapterNotExtended,
                detail: "native id has no canonical symbol".to_string(),
            })
    }

    pub fn lookup_native(&self, native_id: &NativeId) -> Option<&CatalogEntry> {
        self.by_native.get(native_id).map(|&idx| &self.entries[idx])
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.by_symbol.contains_key(symbol)
    }

    /// Entries in construction order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.entries.iter().map(|e| &e.symbol)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn symbol_list(&self) -> String {
        self.symbols()
            .map(Symbol::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for MarketCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_ENTRIES.iter().cloned())
    }
}
