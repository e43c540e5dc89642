use arbwatch_data::{
    model::market_event::{ConnectionState, ConnectionStatus},
    shared::subscription_models::{CanonicalSymbol, ExchangeId},
};
use itertools::Itertools;
use ordered_float::OrderedFloat;
use prettytable::{format::consts::FORMAT_NO_LINESEP_WITH_TITLE, Cell, Row, Table};
use std::{
    cmp::Reverse,
    collections::{BTreeMap, HashMap},
    io::Write,
};
use tokio::{
    sync::mpsc::UnboundedReceiver,
    time::{interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{
    format::{decimals_for, format_price},
    trend::{Trend, TrendRing},
};
use crate::{
    config::DisplayConfig,
    spread_scanner::core_types::{ConsolidatedQuote, Opportunity, ScannerEvent},
};

/*----- */
// Table row
/*----- */
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub snapshot: ConsolidatedQuote,
    pub coinbase_trend: Trend,
    pub kraken_trend: Trend,
}

impl TableRow {
    /// Which way the mid prices point, e.g. "Buy CB -> Sell KR (12.50)".
    pub fn arbitrage(&self) -> String {
        let (Some(coinbase), Some(kraken)) = (
            self.snapshot.coinbase.midprice(),
            self.snapshot.kraken.midprice(),
        ) else {
            return String::from("N/A");
        };

        let diff = (kraken - coinbase).abs();
        let diff = format!("{:.*}", decimals_for(diff), diff);

        if kraken > coinbase {
            format!("Buy CB -> Sell KR ({})", diff)
        } else {
            format!("Buy KR -> Sell CB ({})", diff)
        }
    }

    fn to_row(&self) -> Row {
        let coinbase = format!(
            "{}{}",
            self.coinbase_trend.marker(),
            format_price(self.snapshot.coinbase.midprice())
        );
        let kraken = format!(
            "{}{}",
            self.kraken_trend.marker(),
            format_price(self.snapshot.kraken.midprice())
        );

        Row::new(vec![
            Cell::new(self.snapshot.symbol.as_str()),
            Cell::new(&coinbase),
            Cell::new(&kraken),
            Cell::new(&self.arbitrage()),
            Cell::new(&format!("{:.3}%", self.snapshot.variation_pct)),
            Cell::new(&self.snapshot.time.format("%H:%M:%S").to_string()),
        ])
    }
}

/*----- */
// Opportunity sink
/*----- */
/// Logs opportunities and connection changes, and keeps the per symbol state
/// behind the console table.
#[derive(Debug)]
pub struct OpportunitySink {
    config: DisplayConfig,
    rows: HashMap<CanonicalSymbol, TableRow>,
    trends: HashMap<(ExchangeId, CanonicalSymbol), TrendRing>,
    connections: BTreeMap<ExchangeId, ConnectionState>,
    dirty: bool,
    event_rx: UnboundedReceiver<ScannerEvent>,
    status_rx: UnboundedReceiver<ConnectionStatus>,
}

impl OpportunitySink {
    pub fn new(
        config: DisplayConfig,
        event_rx: UnboundedReceiver<ScannerEvent>,
        status_rx: UnboundedReceiver<ConnectionStatus>,
    ) -> Self {
        Self {
            config,
            rows: HashMap::new(),
            trends: HashMap::new(),
            connections: BTreeMap::new(),
            dirty: false,
            event_rx,
            status_rx,
        }
    }

    pub async fn run(mut self, shutdown: CancellationToken) {
        let mut refresh = interval(self.config.refresh_interval());
        refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut events_open = true;
        let mut status_open = true;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                event = self.event_rx.recv(), if events_open => match event {
                    Some(event) => self.process_event(event),
                    None => events_open = false,
                },
                status = self.status_rx.recv(), if status_open => match status {
                    Some(status) => self.process_status(status),
                    None => status_open = false,
                },
                _ = refresh.tick(), if self.config.enabled => self.print_table(),
            }
        }

        info!("opportunity sink stopped");
    }

    pub fn process_event(&mut self, event: ScannerEvent) {
        match event {
            ScannerEvent::Opportunity(opportunity) => self.process_opportunity(&opportunity),
            ScannerEvent::Snapshot(snapshot) => self.process_snapshot(snapshot),
        }
    }

    fn process_opportunity(&self, opportunity: &Opportunity) {
        info!(
            symbol = %opportunity.pair,
            direction = %opportunity.direction,
            buy_exchange = %opportunity.direction.buy_exchange(),
            sell_exchange = %opportunity.direction.sell_exchange(),
            buy_price = opportunity.buy_price,
            sell_price = opportunity.sell_price,
            net_spread = opportunity.net_spread,
            time = %opportunity.time,
            "arbitrage opportunity"
        );
    }

    fn process_snapshot(&mut self, snapshot: ConsolidatedQuote) {
        let coinbase_trend = self.push_trend(ExchangeId::Coinbase, &snapshot);
        let kraken_trend = self.push_trend(ExchangeId::Kraken, &snapshot);

        self.rows.insert(
            snapshot.symbol.clone(),
            TableRow {
                snapshot,
                coinbase_trend,
                kraken_trend,
            },
        );
        self.dirty = true;
    }

    fn push_trend(&mut self, exchange: ExchangeId, snapshot: &ConsolidatedQuote) -> Trend {
        match snapshot.quote(exchange).midprice() {
            Some(mid) => self
                .trends
                .entry((exchange, snapshot.symbol.clone()))
                .or_default()
                .push(mid),
            None => Trend::Unknown,
        }
    }

    pub fn process_status(&mut self, status: ConnectionStatus) {
        match status.state {
            ConnectionState::Disconnected => warn!(
                exchange = %status.exchange,
                state = %status.state,
                "lost connection to exchange, reconnecting"
            ),
            _ => info!(
                exchange = %status.exchange,
                state = %status.state,
                "exchange connection status"
            ),
        }

        self.connections.insert(status.exchange, status.state);
        self.dirty = true;
    }

    /// Rows ordered by variation, largest first, capped at `max_rows`.
    pub fn sorted_rows(&self) -> Vec<&TableRow> {
        self.rows
            .values()
            .sorted_by_key(|row| {
                (
                    Reverse(OrderedFloat(row.snapshot.variation_pct)),
                    row.snapshot.symbol.clone(),
                )
            })
            .take(self.config.max_rows)
            .collect()
    }

    pub fn render(&self) -> Table {
        let mut table = Table::new();
        table.set_format(*FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(Row::new(
            ["Pair", "Coinbase", "Kraken", "Arbitrage", "Var%", "Time"]
                .iter()
                .map(|title| Cell::new(title))
                .collect(),
        ));

        self.sorted_rows()
            .into_iter()
            .for_each(|row| {
                table.add_row(row.to_row());
            });

        table
    }

    pub fn status_line(&self) -> String {
        self.connections
            .iter()
            .map(|(exchange, state)| format!("{}: {}", exchange, state))
            .join(" | ")
    }

    fn print_table(&mut self) {
        if !self.dirty {
            return;
        }
        self.dirty = false;

        let mut stdout = std::io::stdout().lock();
        let result = self
            .render()
            .print(&mut stdout)
            .and_then(|_| writeln!(stdout, "{}", self.status_line()))
            .and_then(|_| stdout.flush());

        if let Err(error) = result {
            warn!(%error, "failed to print quote table");
        }
    }
}

/*----- */
// Test
/*----- */
