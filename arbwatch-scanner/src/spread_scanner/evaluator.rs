use arbwatch_data::{
    model::market_event::QuoteUpdated,
    shared::subscription_models::{CanonicalSymbol, ExchangeId},
    store::QuoteStore,
};
use chrono::{DateTime, Utc};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{
    sync::mpsc::{UnboundedReceiver, UnboundedSender},
    time::{interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::core_types::{net_spread, ConsolidatedQuote, Direction, Opportunity, ScannerEvent};
use crate::config::{EvaluatorConfig, PairConfig};

/*----- */
// Pair evaluation
/*----- */
#[derive(Debug, Clone, PartialEq)]
pub struct PairEvaluation {
    pub snapshot: ConsolidatedQuote,
    pub opportunities: Vec<Opportunity>,
}

/*----- */
// Spread evaluator
/*----- */
/// Re-evaluates a pair every time one of its quotes changes. Only ever reads
/// the quote store.
#[derive(Debug)]
pub struct SpreadEvaluator {
    pairs: HashMap<CanonicalSymbol, PairConfig>,
    store: Arc<QuoteStore>,
    max_quote_age: Option<chrono::Duration>,
    heartbeat_interval: Duration,
    update_rx: UnboundedReceiver<QuoteUpdated>,
    event_tx: UnboundedSender<ScannerEvent>,
    evaluations: u64,
    opportunities: u64,
}

impl SpreadEvaluator {
    pub fn new(
        pairs: &[PairConfig],
        store: Arc<QuoteStore>,
        config: &EvaluatorConfig,
        update_rx: UnboundedReceiver<QuoteUpdated>,
        event_tx: UnboundedSender<ScannerEvent>,
    ) -> Self {
        Self {
            pairs: pairs
                .iter()
                .map(|pair| (pair.symbol.clone(), pair.clone()))
                .collect(),
            store,
            max_quote_age: config.max_quote_age(),
            heartbeat_interval: config.heartbeat_interval(),
            update_rx,
            event_tx,
            evaluations: 0,
            opportunities: 0,
        }
    }

    /// None when either exchange has no usable quote for the pair yet.
    pub fn evaluate(&self, pair: &PairConfig, now: DateTime<Utc>) -> Option<PairEvaluation> {
        let coinbase = self.store.read(ExchangeId::Coinbase, &pair.symbol)?;
        let kraken = self.store.read(ExchangeId::Kraken, &pair.symbol)?;

        let (coinbase_bid, coinbase_ask) = coinbase.usable_bba(now, self.max_quote_age)?;
        let (kraken_bid, kraken_ask) = kraken.usable_bba(now, self.max_quote_age)?;

        let opportunities = Direction::ALL
            .iter()
            .filter_map(|direction| {
                let (buy_price, sell_price) = match direction {
                    Direction::CoinbaseToKraken => (coinbase_ask, kraken_bid),
                    Direction::KrakenToCoinbase => (kraken_ask, coinbase_bid),
                };

                let net_spread = net_spread(
                    buy_price,
                    sell_price,
                    pair.fee(direction.buy_exchange()),
                    pair.fee(direction.sell_exchange()),
                );

                (net_spread > pair.min_spread).then(|| Opportunity {
                    pair: pair.symbol.clone(),
                    direction: *direction,
                    buy_price,
                    sell_price,
                    net_spread,
                    time: now,
                })
            })
            .collect::<Vec<_>>();

        Some(PairEvaluation {
            snapshot: ConsolidatedQuote::new(pair.symbol.clone(), coinbase, kraken, now),
            opportunities,
        })
    }

    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(pairs = self.pairs.len(), "starting spread evaluator");

        let mut heartbeat = interval(self.heartbeat_interval);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        heartbeat.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                update = self.update_rx.recv() => match update {
                    Some(update) => self.process_update(update),
                    None => {
                        warn!(
                            action = "stopping spread evaluator",
                            "quote update channel has disconnected"
                        );
                        break;
                    }
                },
                _ = heartbeat.tick() => self.heartbeat(),
            }
        }

        info!("spread evaluator stopped");
    }

    fn process_update(&mut self, update: QuoteUpdated) {
        let Some(pair) = self.pairs.get(&update.symbol) else {
            debug!(symbol = %update.symbol, "update for untracked symbol");
            return;
        };

        let Some(evaluation) = self.evaluate(pair, Utc::now()) else {
            debug!(
                exchange = %update.exchange,
                symbol = %update.symbol,
                "skipped evaluation, quotes incomplete"
            );
            return;
        };

        self.evaluations += 1;
        self.opportunities += evaluation.opportunities.len() as u64;

        std::iter::once(ScannerEvent::Snapshot(evaluation.snapshot))
            .chain(evaluation.opportunities.into_iter().map(ScannerEvent::Opportunity))
            .for_each(|event| {
                if let Err(error) = self.event_tx.send(event) {
                    debug!(
                        payload = ?error.0,
                        why = "receiver dropped",
                        "failed to send ScannerEvent to sink"
                    );
                }
            });
    }

    fn heartbeat(&mut self) {
        if self.opportunities == 0 {
            info!(
                evaluations = self.evaluations,
                interval_secs = self.heartbeat_interval.as_secs(),
                "heartbeat: no opportunities found"
            );
        }

        self.evaluations = 0;
        self.opportunities = 0;
    }
}

/*----- */
// Test
/*----- */
