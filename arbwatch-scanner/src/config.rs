use arbwatch_data::{
    error::RegistryError,
    shared::{
        registry::{SymbolRegistry, SymbolRegistryBuilder},
        subscription_models::{CanonicalSymbol, ExchangeId},
    },
    streams::consumer::{DEFAULT_IDLE_TIMEOUT, DEFAULT_RECONNECTION_BACKOFF},
};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use tracing::{error, info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const CONFIG_PATH_ENV: &str = "ARBWATCH_CONFIG";

const DEFAULT_FEE: f64 = 0.005;

/*----- */
// Config errors
/*----- */
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid pair {symbol}: {reason}")]
    InvalidPair {
        symbol: CanonicalSymbol,
        reason: String,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/*----- */
// Pair config
/*----- */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairConfig {
    pub symbol: CanonicalSymbol,
    pub coinbase: String,
    pub kraken: String,
    #[serde(default = "default_min_spread")]
    pub min_spread: f64,
    #[serde(default = "default_fee")]
    pub fee_coinbase: f64,
    #[serde(default = "default_fee")]
    pub fee_kraken: f64,
}

fn default_min_spread() -> f64 {
    1.0
}

fn default_fee() -> f64 {
    DEFAULT_FEE
}

impl PairConfig {
    pub fn new<S>(symbol: S, coinbase: S, kraken: S, min_spread: f64, fees: (f64, f64)) -> Self
    where
        S: Into<String>,
    {
        Self {
            symbol: CanonicalSymbol::new(symbol),
            coinbase: coinbase.into(),
            kraken: kraken.into(),
            min_spread,
            fee_coinbase: fees.0,
            fee_kraken: fees.1,
        }
    }

    pub fn native_id(&self, exchange: ExchangeId) -> &str {
        match exchange {
            ExchangeId::Coinbase => &self.coinbase,
            ExchangeId::Kraken => &self.kraken,
        }
    }

    pub fn fee(&self, exchange: ExchangeId) -> f64 {
        match exchange {
            ExchangeId::Coinbase => self.fee_coinbase,
            ExchangeId::Kraken => self.fee_kraken,
        }
    }

    fn check(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidPair {
            symbol: self.symbol.clone(),
            reason: reason.to_owned(),
        };

        if self.symbol.as_str().trim().is_empty() {
            return Err(invalid("empty canonical symbol"));
        }
        if self.coinbase.trim().is_empty() || self.kraken.trim().is_empty() {
            return Err(invalid("empty native id"));
        }
        if !self.min_spread.is_finite() || self.min_spread < 0.0 {
            return Err(invalid("min_spread must be a finite, non-negative number"));
        }
        if [self.fee_coinbase, self.fee_kraken]
            .iter()
            .any(|fee| !fee.is_finite() || *fee < 0.0)
        {
            return Err(invalid("fees must be finite, non-negative fractions"));
        }

        Ok(())
    }
}

/*----- */
// Section configs
/*----- */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    pub reconnect_delay_ms: u64,
    pub kraken_ping_interval_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: DEFAULT_RECONNECTION_BACKOFF.as_millis() as u64,
            kraken_ping_interval_secs: 30,
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT.as_secs(),
        }
    }
}

impl ConnectorConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn kraken_ping_interval(&self) -> Duration {
        Duration::from_secs(self.kraken_ping_interval_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    pub heartbeat_interval_secs: u64,
    pub max_quote_age_secs: Option<u64>,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: 30,
            max_quote_age_secs: None,
        }
    }
}

impl EvaluatorConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn max_quote_age(&self) -> Option<chrono::Duration> {
        self.max_quote_age_secs
            .and_then(|secs| chrono::Duration::try_seconds(secs as i64))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub enabled: bool,
    pub refresh_ms: u64,
    pub max_rows: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            refresh_ms: 1000,
            max_rows: 50,
        }
    }
}

impl DisplayConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }
}

/*----- */
// Config
/*----- */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pairs: Vec<PairConfig>,
    pub connector: ConnectorConfig,
    pub evaluator: EvaluatorConfig,
    pub display: DisplayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pairs: Self::default_pairs(),
            connector: ConnectorConfig::default(),
            evaluator: EvaluatorConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Config {
    pub fn default_pairs() -> Vec<PairConfig> {
        vec![
            PairConfig::new("BTC/USD", "BTC-USD", "XBT/USD", 1.0, (DEFAULT_FEE, DEFAULT_FEE)),
            PairConfig::new("ETH/USD", "ETH-USD", "ETH/USD", 0.75, (DEFAULT_FEE, DEFAULT_FEE)),
        ]
    }

    /// First CLI argument, then `ARBWATCH_CONFIG`, then `config.json`.
    pub fn path_from_env() -> PathBuf {
        std::env::args()
            .nth(1)
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn read<P>(path: P) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(serde_json::from_str::<Self>(&contents)?)
    }

    /// Never fails: a missing or broken file yields the built-in defaults.
    pub fn load<P>(path: P) -> Self
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();

        if !path.exists() {
            info!(path = %path.display(), "config file not found, using defaults");
            return Self::default();
        }

        match Self::read(path) {
            Ok(config) => {
                info!(path = %path.display(), pairs = config.pairs.len(), "loaded config file");
                config
            }
            Err(error) => {
                warn!(
                    path = %path.display(),
                    %error,
                    action = "using default config",
                    "failed to load config file"
                );
                Self::default()
            }
        }
    }

    /// Load the config, writing the defaults out as a template when the file
    /// does not exist yet.
    pub fn load_or_init<P>(path: P) -> Self
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let config = Self::load(path);

        if !path.exists() {
            match config.save(path) {
                Ok(()) => info!(path = %path.display(), "wrote default config template"),
                Err(error) => warn!(%error, "failed to write default config template"),
            }
        }

        config
    }

    pub fn save<P>(&self, path: P) -> Result<(), ConfigError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Drop every pair that is invalid or would break the one-to-one symbol
    /// mapping, and return the registry built from the pairs that remain. If no
    /// pair survives the built-in defaults are used instead.
    pub fn validate(&mut self) -> SymbolRegistry {
        self.sanitise_intervals();

        let (pairs, builder) = register_pairs(std::mem::take(&mut self.pairs));
        if !pairs.is_empty() {
            self.pairs = pairs;
            return builder.build();
        }

        warn!(action = "using default pairs", "no valid pair in config");
        let (pairs, builder) = register_pairs(Self::default_pairs());
        self.pairs = pairs;
        builder.build()
    }

    fn sanitise_intervals(&mut self) {
        let defaults = Self::default();

        if self.evaluator.heartbeat_interval_secs == 0 {
            warn!("heartbeat_interval_secs must be positive, using default");
            self.evaluator.heartbeat_interval_secs = defaults.evaluator.heartbeat_interval_secs;
        }
        if self.display.refresh_ms == 0 {
            warn!("refresh_ms must be positive, using default");
            self.display.refresh_ms = defaults.display.refresh_ms;
        }
        if self.connector.kraken_ping_interval_secs == 0 {
            warn!("kraken_ping_interval_secs must be positive, using default");
            self.connector.kraken_ping_interval_secs = defaults.connector.kraken_ping_interval_secs;
        }
        if self.connector.idle_timeout_secs == 0 {
            warn!("idle_timeout_secs must be positive, using default");
            self.connector.idle_timeout_secs = defaults.connector.idle_timeout_secs;
        }
    }
}

fn register_pairs(candidates: Vec<PairConfig>) -> (Vec<PairConfig>, SymbolRegistryBuilder) {
    let mut builder = SymbolRegistry::builder();
    let mut symbols = HashSet::new();
    let mut pairs = Vec::with_capacity(candidates.len());

    for pair in candidates {
        match register_pair(&mut builder, &mut symbols, &pair) {
            Ok(()) => pairs.push(pair),
            Err(error) => error!(
                symbol = %pair.symbol,
                %error,
                action = "skipping pair",
                "rejected pair config"
            ),
        }
    }

    (pairs, builder)
}

fn register_pair(
    builder: &mut SymbolRegistryBuilder,
    symbols: &mut HashSet<CanonicalSymbol>,
    pair: &PairConfig,
) -> Result<(), ConfigError> {
    pair.check()?;

    if symbols.contains(&pair.symbol) {
        return Err(ConfigError::InvalidPair {
            symbol: pair.symbol.clone(),
            reason: String::from("duplicated canonical symbol"),
        });
    }

    // Both mappings are checked before either is inserted
    for exchange in [ExchangeId::Coinbase, ExchangeId::Kraken] {
        builder.check(exchange, pair.native_id(exchange), &pair.symbol)?;
    }
    for exchange in [ExchangeId::Coinbase, ExchangeId::Kraken] {
        builder.insert(exchange, pair.native_id(exchange), pair.symbol.clone())?;
    }

    symbols.insert(pair.symbol.clone());
    Ok(())
}

/*----- */
// Test
/*----- */
#[cfg(test)]
mod test {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "arbwatch-config-{}-{}.json",
            std::process::id(),
            name
        ))
    }

    #[test]
    fn test_default_pairs() {
        let config = Config::default();
        assert_eq!(config.pairs.len(), 2);

        let btc = &config.pairs[0];
        assert_eq!(btc.symbol, CanonicalSymbol::from("BTC/USD"));
        assert_eq!(btc.native_id(ExchangeId::Coinbase), "BTC-USD");
        assert_eq!(btc.native_id(ExchangeId::Kraken), "XBT/USD");
        assert_eq!(btc.min_spread, 1.0);
        assert_eq!(btc.fee(ExchangeId::Kraken), 0.005);

        assert_eq!(config.pairs[1].min_spread, 0.75);
        assert_eq!(config.connector.reconnect_delay(), Duration::from_secs(5));
        assert_eq!(config.connector.idle_timeout(), Duration::from_secs(30));
        assert_eq!(config.evaluator.max_quote_age(), None);
    }

    #[test]
    fn test_partial_file_uses_field_defaults() {
        let input = r#"{
            "pairs": [{"symbol": "SOL/USD", "coinbase": "SOL-USD", "kraken": "SOL/USD"}],
            "evaluator": {"max_quote_age_secs": 10}
        }"#;

        let config = serde_json::from_str::<Config>(input).unwrap();
        assert_eq!(
            config.pairs,
            vec![PairConfig::new("SOL/USD", "SOL-USD", "SOL/USD", 1.0, (0.005, 0.005))]
        );
        assert_eq!(config.evaluator.heartbeat_interval_secs, 30);
        assert_eq!(
            config.evaluator.max_quote_age(),
            Some(chrono::Duration::seconds(10))
        );
        assert_eq!(config.display, DisplayConfig::default());
        assert_eq!(config.connector, ConnectorConfig::default());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let path = temp_path("missing");
        let _ = std::fs::remove_file(&path);

        assert_eq!(Config::load(&path), Config::default());
        assert!(matches!(Config::read(&path), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_invalid_json_yields_defaults() {
        let path = temp_path("invalid");
        std::fs::write(&path, "{\"pairs\": [").unwrap();

        assert!(matches!(Config::read(&path), Err(ConfigError::Json(_))));
        assert_eq!(Config::load(&path), Config::default());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_or_init_writes_template() {
        let path = temp_path("template");
        let _ = std::fs::remove_file(&path);

        let config = Config::load_or_init(&path);
        assert!(path.exists());
        assert_eq!(Config::read(&path).unwrap(), config);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_pairs() {
        let mut config = Config {
            pairs: vec![
                PairConfig::new("BTC/USD", "BTC-USD", "XBT/USD", 1.0, (0.001, 0.002)),
                // Negative fee
                PairConfig::new("ETH/USD", "ETH-USD", "ETH/USD", 1.0, (-0.1, 0.002)),
                // Empty native id
                PairConfig::new("SOL/USD", "", "SOL/USD", 1.0, (0.001, 0.002)),
                // Duplicated canonical symbol
                PairConfig::new("BTC/USD", "BTC-USD", "XBT/USD", 2.0, (0.001, 0.002)),
                // Kraken native id already used by BTC/USD
                PairConfig::new("XBT/USD", "XBT-USD", "XBT/USD", 1.0, (0.001, 0.002)),
                PairConfig::new("ADA/USD", "ADA-USD", "ADA/USD", f64::NAN, (0.001, 0.002)),
                PairConfig::new("DOT/USD", "DOT-USD", "DOT/USD", 0.1, (0.0, 0.0)),
            ],
            ..Config::default()
        };

        let registry = config.validate();

        let symbols = config
            .pairs
            .iter()
            .map(|pair| pair.symbol.as_str())
            .collect::<Vec<_>>();
        assert_eq!(symbols, vec!["BTC/USD", "DOT/USD"]);

        assert_eq!(
            registry.resolve(ExchangeId::Kraken, "XBT/USD"),
            Some(&CanonicalSymbol::from("BTC/USD"))
        );
        // The rejected pair left no half registered mapping behind
        assert_eq!(registry.resolve(ExchangeId::Coinbase, "XBT-USD"), None);
        assert_eq!(registry.markets(ExchangeId::Coinbase).len(), 2);
    }

    #[test]
    fn test_validate_falls_back_to_default_pairs() {
        let mut config = Config {
            pairs: vec![PairConfig::new("BTC/USD", "", "", 1.0, (0.0, 0.0))],
            ..Config::default()
        };

        let registry = config.validate();
        assert_eq!(config.pairs, Config::default_pairs());
        assert_eq!(
            registry.resolve(ExchangeId::Coinbase, "ETH-USD"),
            Some(&CanonicalSymbol::from("ETH/USD"))
        );
    }

    #[test]
    fn test_validate_replaces_zero_intervals() {
        let mut config = Config::default();
        config.evaluator.heartbeat_interval_secs = 0;
        config.display.refresh_ms = 0;
        config.connector.idle_timeout_secs = 0;

        config.validate();
        assert_eq!(config.evaluator.heartbeat_interval(), Duration::from_secs(30));
        assert_eq!(config.display.refresh_interval(), Duration::from_millis(1000));
        assert_eq!(config.connector.idle_timeout(), Duration::from_secs(30));
    }
}
