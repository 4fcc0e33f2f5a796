//! Name-addressed catalog of handlers.
//!
//! Every entry pairs a serde config type with a constructor. Configs are
//! deserialized and validated by [`Catalog::create`], so an invalid
//! parameter fails there and never reaches a series pass.

use barwise_core::{BarHandler, Handler, IndicatorError, OutputHandler, PriceSource, SeriesHandler};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::momentum::{Cmo, LaguerreRsi, Macd, RankNormalizer, Rsi, StochasticK};
use crate::moving_average::{
    CascadeMa, Ema, Frama, Kama, MaMethod, MovingAverage, MovingMedian, Sma, Smma, Vidya,
    VolatilityAdaptiveMa, VolatilityMeasure, WeightedMa,
};
use crate::smoothers::{KalmanSmoother, LaguerreFilter, PoleFilter};
use crate::volatility::{Atr, BollingerBands, ChannelLine, DonchianChannel, StdDev, TrueRange};

/// A single period on one price source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PeriodConfig {
    pub period: usize,
    pub source: PriceSource,
}

impl Default for PeriodConfig {
    fn default() -> Self {
        Self {
            period: 14,
            source: PriceSource::Close,
        }
    }
}

/// A period over whole bars.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BarPeriodConfig {
    pub period: usize,
}

impl Default for BarPeriodConfig {
    fn default() -> Self {
        Self { period: 14 }
    }
}

/// No parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmptyConfig {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MaConfig {
    pub period: usize,
    /// Name (`"ema"`) or legacy mode code (`1`)
    pub method: MaMethod,
    pub source: PriceSource,
}

impl Default for MaConfig {
    fn default() -> Self {
        Self {
            period: 14,
            method: MaMethod::Sma,
            source: PriceSource::Close,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NemaConfig {
    pub period: usize,
    pub depth: u32,
    pub source: PriceSource,
}

impl Default for NemaConfig {
    fn default() -> Self {
        Self {
            period: 14,
            depth: 4,
            source: PriceSource::Close,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KamaConfig {
    pub period: usize,
    pub fast: usize,
    pub slow: usize,
    pub source: PriceSource,
}

impl Default for KamaConfig {
    fn default() -> Self {
        Self {
            period: 10,
            fast: 2,
            slow: 30,
            source: PriceSource::Close,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VidyaConfig {
    pub period: usize,
    pub cmo_length: usize,
    pub source: PriceSource,
}

impl Default for VidyaConfig {
    fn default() -> Self {
        Self {
            period: 14,
            cmo_length: 9,
            source: PriceSource::Close,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VamaConfig {
    pub period: usize,
    pub short: usize,
    pub long: usize,
    pub measure: VolatilityMeasure,
    pub source: PriceSource,
}

impl Default for VamaConfig {
    fn default() -> Self {
        Self {
            period: 14,
            short: 10,
            long: 50,
            measure: VolatilityMeasure::StdDev,
            source: PriceSource::Close,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FramaConfig {
    /// Must be even
    pub period: usize,
    pub source: PriceSource,
}

impl Default for FramaConfig {
    fn default() -> Self {
        Self {
            period: 16,
            source: PriceSource::Median,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GammaConfig {
    pub gamma: f64,
    pub source: PriceSource,
}

impl Default for GammaConfig {
    fn default() -> Self {
        Self {
            gamma: 0.5,
            source: PriceSource::Close,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KalmanConfig {
    pub process_noise: f64,
    pub measurement_noise: f64,
    pub source: PriceSource,
}

impl Default for KalmanConfig {
    fn default() -> Self {
        Self {
            process_noise: 0.01,
            measurement_noise: 1.0,
            source: PriceSource::Close,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RankConfig {
    pub period: usize,
    /// Bars of history required before ranking
    pub min_history: usize,
    /// Report `[0, 100]` instead of `[0, 1]`
    pub percent: bool,
    pub source: PriceSource,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            period: 20,
            min_history: 1,
            percent: false,
            source: PriceSource::Close,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MacdConfig {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
    pub source: PriceSource,
    /// `macd`, `signal` or `histogram`
    pub output: String,
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
            source: PriceSource::Close,
            output: "macd".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BollingerConfig {
    pub period: usize,
    pub multiplier: f64,
    pub source: PriceSource,
    /// `upper`, `middle`, `lower`, `percent_b` or `bandwidth`
    pub output: String,
}

impl Default for BollingerConfig {
    fn default() -> Self {
        Self {
            period: 20,
            multiplier: 2.0,
            source: PriceSource::Close,
            output: "middle".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DonchianConfig {
    pub period: usize,
    pub output: ChannelLine,
}

impl Default for DonchianConfig {
    fn default() -> Self {
        Self {
            period: 20,
            output: ChannelLine::Middle,
        }
    }
}

/// Information about a registered handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerInfo {
    /// Catalog name
    pub name: String,
    /// One-line description
    pub description: String,
    /// Default configuration as JSON
    pub default_config: serde_json::Value,
}

/// Registry of available handlers.
pub struct Catalog {
    handlers: BTreeMap<String, HandlerInfo>,
}

fn parse<C: DeserializeOwned>(config: serde_json::Value) -> Result<C, IndicatorError> {
    let config = if config.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        config
    };
    serde_json::from_value(config).map_err(|e| IndicatorError::InvalidConfig(e.to_string()))
}

fn on_source<I>(indicator: I, source: PriceSource) -> Box<dyn Handler>
where
    I: barwise_core::Indicator + 'static,
{
    Box::new(SeriesHandler::new(indicator, source))
}

fn on_bars<I>(indicator: I) -> Box<dyn Handler>
where
    I: barwise_core::BarIndicator + 'static,
{
    Box::new(BarHandler::new(indicator))
}

impl Catalog {
    /// Create a catalog with every built-in handler.
    pub fn new() -> Self {
        let mut catalog = Self {
            handlers: BTreeMap::new(),
        };

        catalog.register::<PeriodConfig>("sma", "Simple moving average");
        catalog.register::<PeriodConfig>("ema", "Exponential moving average");
        catalog.register::<PeriodConfig>("smma", "Smoothed (Wilder) moving average");
        catalog.register::<PeriodConfig>("lwma", "Linearly weighted moving average");
        catalog.register::<PeriodConfig>("sinewma", "Sine-weighted moving average");
        catalog.register::<PeriodConfig>("trima", "Triangular moving average");
        catalog.register::<PeriodConfig>("median", "Moving median");
        catalog.register::<MaConfig>("ma", "Moving average with selectable method");
        catalog.register::<PeriodConfig>("dema", "Double exponential moving average");
        catalog.register::<PeriodConfig>("tema", "Triple exponential moving average");
        catalog.register::<NemaConfig>("nema", "N-fold exponential moving average");
        catalog.register::<KamaConfig>("kama", "Kaufman adaptive moving average");
        catalog.register::<VidyaConfig>("vidya", "Variable index dynamic average");
        catalog.register::<VamaConfig>("vama", "Volatility-adjusted moving average");
        catalog.register::<FramaConfig>("frama", "Fractal adaptive moving average");
        catalog.register::<PeriodConfig>("supersmoother", "Ehlers two-pole super smoother");
        catalog.register::<PeriodConfig>("butterworth2", "Two-pole Butterworth filter");
        catalog.register::<PeriodConfig>("butterworth3", "Three-pole Butterworth filter");
        catalog.register::<GammaConfig>("laguerre", "Laguerre filter");
        catalog.register::<KalmanConfig>("kalman", "Kalman level filter");
        catalog.register::<PeriodConfig>("rsi", "Relative strength index");
        catalog.register::<GammaConfig>("lrsi", "Laguerre RSI");
        catalog.register::<PeriodConfig>("cmo", "Chande momentum oscillator");
        catalog.register::<BarPeriodConfig>("stochk", "Stochastic %K");
        catalog.register::<RankConfig>("rank", "Position within the trailing range");
        catalog.register::<MacdConfig>("macd", "Moving average convergence divergence");
        catalog.register::<EmptyConfig>("tr", "True range");
        catalog.register::<BarPeriodConfig>("atr", "Average true range");
        catalog.register::<PeriodConfig>("stddev", "Standard deviation");
        catalog.register::<BollingerConfig>("bollinger", "Bollinger bands");
        catalog.register::<DonchianConfig>("donchian", "Donchian channel");

        debug!(handlers = catalog.handlers.len(), "Catalog initialised");
        catalog
    }

    fn register<C: Serialize + Default>(&mut self, name: &str, description: &str) {
        self.handlers.insert(
            name.to_string(),
            HandlerInfo {
                name: name.to_string(),
                description: description.to_string(),
                default_config: serde_json::to_value(C::default()).unwrap_or_default(),
            },
        );
    }

    /// List all handlers, sorted by name.
    pub fn list(&self) -> Vec<&HandlerInfo> {
        self.handlers.values().collect()
    }

    /// Get handler info by name.
    pub fn get(&self, name: &str) -> Option<&HandlerInfo> {
        self.handlers.get(name)
    }

    /// Check if a handler exists.
    pub fn exists(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Build a handler from its JSON configuration. Missing fields take
    /// their defaults; unknown fields are rejected.
    pub fn create(
        &self,
        name: &str,
        config: serde_json::Value,
    ) -> Result<Box<dyn Handler>, IndicatorError> {
        debug!(indicator = name, config = %config, "Building handler");

        let handler: Box<dyn Handler> = match name {
            "sma" => {
                let c: PeriodConfig = parse(config)?;
                on_source(Sma::new(c.period)?, c.source)
            }
            "ema" => {
                let c: PeriodConfig = parse(config)?;
                on_source(Ema::new(c.period)?, c.source)
            }
            "smma" => {
                let c: PeriodConfig = parse(config)?;
                on_source(Smma::new(c.period)?, c.source)
            }
            "lwma" => {
                let c: PeriodConfig = parse(config)?;
                on_source(WeightedMa::lwma(c.period)?, c.source)
            }
            "sinewma" => {
                let c: PeriodConfig = parse(config)?;
                on_source(WeightedMa::sine(c.period)?, c.source)
            }
            "trima" => {
                let c: PeriodConfig = parse(config)?;
                on_source(WeightedMa::triangular(c.period)?, c.source)
            }
            "median" => {
                let c: PeriodConfig = parse(config)?;
                on_source(MovingMedian::new(c.period)?, c.source)
            }
            "ma" => {
                let c: MaConfig = parse(config)?;
                on_source(MovingAverage::new(c.method, c.period)?, c.source)
            }
            "dema" => {
                let c: PeriodConfig = parse(config)?;
                on_source(CascadeMa::dema(c.period)?, c.source)
            }
            "tema" => {
                let c: PeriodConfig = parse(config)?;
                on_source(CascadeMa::tema(c.period)?, c.source)
            }
            "nema" => {
                let c: NemaConfig = parse(config)?;
                on_source(CascadeMa::nema(c.period, c.depth)?, c.source)
            }
            "kama" => {
                let c: KamaConfig = parse(config)?;
                on_source(Kama::new(c.period, c.fast, c.slow)?, c.source)
            }
            "vidya" => {
                let c: VidyaConfig = parse(config)?;
                on_source(Vidya::new(c.period, c.cmo_length)?, c.source)
            }
            "vama" => {
                let c: VamaConfig = parse(config)?;
                on_bars(VolatilityAdaptiveMa::new(
                    c.period, c.short, c.long, c.measure, c.source,
                )?)
            }
            "frama" => {
                let c: FramaConfig = parse(config)?;
                on_bars(Frama::new(c.period, c.source)?)
            }
            "supersmoother" => {
                let c: PeriodConfig = parse(config)?;
                on_source(PoleFilter::super_smoother(c.period)?, c.source)
            }
            "butterworth2" => {
                let c: PeriodConfig = parse(config)?;
                on_source(PoleFilter::butterworth2(c.period)?, c.source)
            }
            "butterworth3" => {
                let c: PeriodConfig = parse(config)?;
                on_source(PoleFilter::butterworth3(c.period)?, c.source)
            }
            "laguerre" => {
                let c: GammaConfig = parse(config)?;
                on_source(LaguerreFilter::new(c.gamma)?, c.source)
            }
            "kalman" => {
                let c: KalmanConfig = parse(config)?;
                on_source(
                    KalmanSmoother::new(c.process_noise, c.measurement_noise)?,
                    c.source,
                )
            }
            "rsi" => {
                let c: PeriodConfig = parse(config)?;
                on_source(Rsi::new(c.period)?, c.source)
            }
            "lrsi" => {
                let c: GammaConfig = parse(config)?;
                on_source(LaguerreRsi::new(c.gamma)?, c.source)
            }
            "cmo" => {
                let c: PeriodConfig = parse(config)?;
                on_source(Cmo::new(c.period)?, c.source)
            }
            "stochk" => {
                let c: BarPeriodConfig = parse(config)?;
                on_bars(StochasticK::new(c.period)?)
            }
            "rank" => {
                let c: RankConfig = parse(config)?;
                on_source(
                    RankNormalizer::new(c.period, c.min_history, c.percent)?,
                    c.source,
                )
            }
            "macd" => {
                let c: MacdConfig = parse(config)?;
                let macd = Macd::new(c.fast, c.slow, c.signal)?;
                Box::new(OutputHandler::new(macd, c.source, &c.output)?)
            }
            "tr" => {
                let _: EmptyConfig = parse(config)?;
                on_bars(TrueRange)
            }
            "atr" => {
                let c: BarPeriodConfig = parse(config)?;
                on_bars(Atr::new(c.period)?)
            }
            "stddev" => {
                let c: PeriodConfig = parse(config)?;
                on_source(StdDev::new(c.period)?, c.source)
            }
            "bollinger" => {
                let c: BollingerConfig = parse(config)?;
                let bands = BollingerBands::new(c.period, c.multiplier)?;
                Box::new(OutputHandler::new(bands, c.source, &c.output)?)
            }
            "donchian" => {
                let c: DonchianConfig = parse(config)?;
                on_bars(DonchianChannel::new(c.period, c.output)?)
            }
            _ => return Err(IndicatorError::UnknownIndicator(name.to_string())),
        };

        Ok(handler)
    }

    /// Create a handler with its default configuration.
    pub fn create_default(&self, name: &str) -> Result<Box<dyn Handler>, IndicatorError> {
        let info = self
            .get(name)
            .ok_or_else(|| IndicatorError::UnknownIndicator(name.to_string()))?;
        self.create(name, info.default_config.clone())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoCache;
    use barwise_core::{Bar, Bars, NoCache};

    fn bars(n: usize) -> Bars {
        (0..n)
            .map(|i| {
                let c = 100.0 + (i as f64 * 0.25).sin() * 5.0 + i as f64 * 0.1;
                Bar::new(i as i64 * 60, c - 0.2, c + 1.0, c - 1.0, c, 1000.0 + i as f64)
            })
            .collect()
    }

    #[test]
    fn test_catalog_list() {
        let catalog = Catalog::new();
        let names: Vec<&str> = catalog.list().iter().map(|h| h.name.as_str()).collect();

        assert_eq!(names.len(), 31);
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(catalog.exists("kama"));
        assert!(catalog.get("unknown").is_none());
    }

    #[test]
    fn test_every_default_handler_preserves_length() {
        let catalog = Catalog::new();
        let bars = bars(120);
        let mut cache = MemoCache::new();

        for info in catalog.list() {
            let handler = catalog.create_default(&info.name).unwrap();
            let out = handler.execute(&bars, &mut cache);
            assert_eq!(out.len(), bars.len(), "{} changed the length", info.name);

            let again = handler.execute(&bars, &mut NoCache);
            assert_eq!(out, again, "{} differs between cache hit and miss", info.name);
        }
    }

    #[test]
    fn test_create_with_config() {
        let catalog = Catalog::new();
        let config = serde_json::json!({ "period": 5, "method": 1 });
        let handler = catalog.create("ma", config).unwrap();
        assert_eq!(handler.name(), "MA");

        let config = serde_json::json!({ "period": 3 });
        let handler = catalog.create("sma", config).unwrap();
        let closes: Bars = (1..=10)
            .map(|i| Bar::new(i, i as f64, i as f64, i as f64, i as f64, 0.0))
            .collect();
        let out = handler.execute(&closes, &mut NoCache);
        assert_eq!(out.values(), &[1.0, 1.5, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_configuration_errors() {
        let catalog = Catalog::new();

        let err = catalog.create("sma", serde_json::json!({ "period": 0 }));
        assert!(matches!(err, Err(IndicatorError::InvalidPeriod { .. })));

        let err = catalog.create("sma", serde_json::json!({ "peroid": 5 }));
        assert!(matches!(err, Err(IndicatorError::InvalidConfig(_))));

        let err = catalog.create("macd", serde_json::json!({ "output": "nope" }));
        assert!(matches!(err, Err(IndicatorError::InvalidParameter(_))));

        let err = catalog.create("frama", serde_json::json!({ "period": 15 }));
        assert!(err.is_err());

        let err = catalog.create_default("unknown");
        assert!(matches!(err, Err(IndicatorError::UnknownIndicator(_))));
    }

    #[test]
    fn test_null_config_uses_defaults() {
        let catalog = Catalog::new();
        assert!(catalog.create("rsi", serde_json::Value::Null).is_ok());
    }

    #[test]
    fn test_shared_ema_across_handlers() {
        let catalog = Catalog::new();
        let bars = bars(60);
        let mut cache = MemoCache::new();

        let ema = catalog.create("ema", serde_json::json!({ "period": 12 })).unwrap();
        let macd = catalog.create_default("macd").unwrap();

        ema.execute(&bars, &mut cache);
        let misses = cache.stats().misses;
        macd.execute(&bars, &mut cache);

        // EMA(12) and the close series are hits; MACD, EMA(26) and the
        // signal EMA are the only new computations
        assert_eq!(cache.stats().misses, misses + 3);
    }
}
