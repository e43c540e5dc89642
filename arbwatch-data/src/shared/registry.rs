use std::collections::HashMap;

use crate::error::RegistryError;

use super::subscription_models::{CanonicalSymbol, ExchangeId};

/*----- */
// Symbol registry
/*----- */
/// Bidirectional mapping between each exchange's native instrument identifier
/// and the canonical symbol shared across exchanges. Built once at startup and
/// read-only afterwards.
#[derive(Debug, Default, Clone)]
pub struct SymbolRegistry {
    to_canonical: HashMap<(ExchangeId, String), CanonicalSymbol>,
    to_native: HashMap<(ExchangeId, CanonicalSymbol), String>,
}

impl SymbolRegistry {
    pub fn builder() -> SymbolRegistryBuilder {
        SymbolRegistryBuilder::default()
    }

    pub fn resolve(&self, exchange: ExchangeId, native_id: &str) -> Option<&CanonicalSymbol> {
        self.to_canonical.get(&(exchange, native_id.to_owned()))
    }

    pub fn native_id_for(&self, exchange: ExchangeId, symbol: &CanonicalSymbol) -> Option<&str> {
        self.to_native
            .get(&(exchange, symbol.clone()))
            .map(String::as_str)
    }

    /// All (native id, canonical symbol) pairs tracked on `exchange`, ordered by
    /// canonical symbol so subscription order is deterministic.
    pub fn markets(&self, exchange: ExchangeId) -> Vec<(&str, &CanonicalSymbol)> {
        let mut markets = self
            .to_native
            .iter()
            .filter(|((market_exchange, _), _)| *market_exchange == exchange)
            .map(|((_, symbol), native_id)| (native_id.as_str(), symbol))
            .collect::<Vec<_>>();
        markets.sort_by(|a, b| a.1.cmp(b.1));
        markets
    }

    pub fn is_empty(&self) -> bool {
        self.to_native.is_empty()
    }
}

/*----- */
// Symbol registry builder
/*----- */
#[derive(Debug, Default)]
pub struct SymbolRegistryBuilder {
    registry: SymbolRegistry,
}

impl SymbolRegistryBuilder {
    /// Register `native_id` on `exchange` as `symbol`. A native id may only ever
    /// map to one canonical symbol, and a canonical symbol to one native id per
    /// exchange. Re-registering the identical mapping is a no-op.
    pub fn add<S>(
        mut self,
        exchange: ExchangeId,
        native_id: S,
        symbol: CanonicalSymbol,
    ) -> Result<Self, RegistryError>
    where
        S: Into<String>,
    {
        self.insert(exchange, native_id, symbol)?;
        Ok(self)
    }

    /// Same as [`Self::add`] but leaves the builder untouched on error.
    pub fn insert<S>(
        &mut self,
        exchange: ExchangeId,
        native_id: S,
        symbol: CanonicalSymbol,
    ) -> Result<(), RegistryError>
    where
        S: Into<String>,
    {
        let native_id = native_id.into();
        self.check(exchange, &native_id, &symbol)?;

        self.registry
            .to_canonical
            .insert((exchange, native_id.clone()), symbol.clone());
        self.registry.to_native.insert((exchange, symbol), native_id);

        Ok(())
    }

    /// Would registering this mapping keep the registry injective?
    pub fn check(
        &self,
        exchange: ExchangeId,
        native_id: &str,
        symbol: &CanonicalSymbol,
    ) -> Result<(), RegistryError> {
        if let Some(existing) = self
            .registry
            .to_canonical
            .get(&(exchange, native_id.to_owned()))
        {
            if existing != symbol {
                return Err(RegistryError::DuplicateNativeId {
                    exchange,
                    native_id: native_id.to_owned(),
                    existing: existing.clone(),
                    requested: symbol.clone(),
                });
            }
        }

        if let Some(existing) = self.registry.to_native.get(&(exchange, symbol.clone())) {
            if existing != native_id {
                return Err(RegistryError::DuplicateSymbol {
                    exchange,
                    symbol: symbol.clone(),
                    existing: existing.clone(),
                    requested: native_id.to_owned(),
                });
            }
        }

        Ok(())
    }

    pub fn build(self) -> SymbolRegistry {
        self.registry
    }
}

/*----- */
// Test
/*----- */
