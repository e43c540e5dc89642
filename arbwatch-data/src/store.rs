use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::{collections::HashMap, sync::Arc};

use crate::{
    model::quote::Quote,
    shared::subscription_models::{CanonicalSymbol, ExchangeId},
};

type SlotKey = (ExchangeId, CanonicalSymbol);

/*----- */
// Quote store
/*----- */
/// Latest bid/ask per (exchange, canonical symbol). Slots are materialised on
/// first update and never removed. Each slot has its own lock so a read always
/// sees one complete write; there is no lock spanning several slots.
#[derive(Debug, Default)]
pub struct QuoteStore {
    slots: RwLock<HashMap<SlotKey, Arc<Mutex<Quote>>>>,
}

impl QuoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the sides present in the call and stamp `at`. Returns the
    /// quote as it was left by this write.
    pub fn update(
        &self,
        exchange: ExchangeId,
        symbol: &CanonicalSymbol,
        bid: Option<f64>,
        ask: Option<f64>,
        at: DateTime<Utc>,
    ) -> Quote {
        let slot = self.slot(exchange, symbol, at);
        let mut quote = slot.lock();
        quote.apply(bid, ask, at);
        *quote
    }

    /// Copy of the current quote, or None if the slot was never written.
    pub fn read(&self, exchange: ExchangeId, symbol: &CanonicalSymbol) -> Option<Quote> {
        let slot = self
            .slots
            .read()
            .get(&(exchange, symbol.clone()))
            .cloned()?;
        let quote = *slot.lock();
        Some(quote)
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    fn slot(
        &self,
        exchange: ExchangeId,
        symbol: &CanonicalSymbol,
        at: DateTime<Utc>,
    ) -> Arc<Mutex<Quote>> {
        let key = (exchange, symbol.clone());

        if let Some(slot) = self.slots.read().get(&key) {
            return Arc::clone(slot);
        }

        Arc::clone(
            self.slots
                .write()
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(Quote::new(None, None, at)))),
        )
    }
}

/*----- */
// Test
/*----- */
#[cfg(test)]
mod test {
    use chrono::TimeZone;
    use std::thread;

    use super::*;

    fn time(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn btc() -> CanonicalSymbol {
        CanonicalSymbol::from("BTC/USD")
    }

    #[test]
    fn test_absent_slot() {
        let store = QuoteStore::new();
        assert!(store.read(ExchangeId::Coinbase, &btc()).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_partial_updates_keep_other_side() {
        let store = QuoteStore::new();

        store.update(ExchangeId::Kraken, &btc(), Some(50_000.0), None, time(0));
        let quote = store.read(ExchangeId::Kraken, &btc()).unwrap();
        assert_eq!(quote.bid, Some(50_000.0));
        assert_eq!(quote.ask, None);
        assert!(!quote.is_complete());

        store.update(ExchangeId::Kraken, &btc(), None, Some(50_010.0), time(1));
        let quote = store.read(ExchangeId::Kraken, &btc()).unwrap();
        assert!(quote.is_complete());

        store.update(ExchangeId::Kraken, &btc(), Some(50_001.0), None, time(2));
        let quote = store.read(ExchangeId::Kraken, &btc()).unwrap();
        assert_eq!(
            (quote.bid, quote.ask, quote.updated_at),
            (Some(50_001.0), Some(50_010.0), time(2))
        );
        assert!(quote.is_complete());
    }

    #[test]
    fn test_slots_are_per_exchange() {
        let store = QuoteStore::new();
        store.update(ExchangeId::Coinbase, &btc(), Some(1.0), Some(2.0), time(0));

        assert!(store.read(ExchangeId::Kraken, &btc()).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_read_is_a_snapshot() {
        let store = QuoteStore::new();
        store.update(ExchangeId::Coinbase, &btc(), Some(1.0), Some(2.0), time(0));

        let snapshot = store.read(ExchangeId::Coinbase, &btc()).unwrap();
        store.update(ExchangeId::Coinbase, &btc(), Some(3.0), Some(4.0), time(1));

        assert_eq!(snapshot, Quote::new(Some(1.0), Some(2.0), time(0)));
    }

    #[test]
    fn test_concurrent_updates_never_tear() {
        let store = Arc::new(QuoteStore::new());
        let writes: i64 = 20_000;

        // Every write is {bid: i, ask: i, updated_at: i} so any mix of two writes
        // would be visible as bid != ask or a timestamp that does not match.
        let writers = (0..2)
            .map(|writer| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..writes {
                        let value = (i * 2 + writer) as f64;
                        store.update(
                            ExchangeId::Coinbase,
                            &btc(),
                            Some(value),
                            Some(value),
                            time(i * 2 + writer),
                        );
                    }
                })
            })
            .collect::<Vec<_>>();

        let reader = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut reads = 0;
                while reads < writes {
                    if let Some(quote) = store.read(ExchangeId::Coinbase, &btc()) {
                        if let (Some(bid), Some(ask)) = (quote.bid, quote.ask) {
                            assert_eq!(bid, ask);
                            assert_eq!(quote.updated_at, time(bid as i64));
                        }
                        reads += 1;
                    }
                }
            })
        };

        writers.into_iter().for_each(|w| w.join().unwrap());
        reader.join().unwrap();

        let last = store.read(ExchangeId::Coinbase, &btc()).unwrap();
        assert!(last.is_complete());
        assert_eq!(last.updated_at, time(last.bid.unwrap() as i64));
    }
}
