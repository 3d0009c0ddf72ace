//! Market entities as supplied by the host's data layer.
//!
//! The engine never fetches or mutates these. A fresh list arrives on every
//! data refresh and is mapped onto particles by [`crate::mapper`].
//!
//! Numeric fields are deliberately lenient: a `null` or missing number in
//! JSON becomes `NaN`, and the mapper replaces it with a neutral default
//! instead of dropping the coin.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SwarmError;

fn missing() -> f64 {
    f64::NAN
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// One coin or token as seen by the dashboard.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MarketEntity {
    pub id: String,
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Single-point 24h price change in percent.
    #[serde(default = "missing", deserialize_with = "lenient_f64")]
    pub price_change_pct: f64,
    #[serde(default)]
    pub price_change_pct_1h: Option<f64>,
    #[serde(default)]
    pub price_change_pct_7d: Option<f64>,
    #[serde(default = "missing", deserialize_with = "lenient_f64")]
    pub volume: f64,
    #[serde(default = "missing", deserialize_with = "lenient_f64")]
    pub market_cap: f64,
    /// Hourly prices, oldest first.
    #[serde(default)]
    pub sparkline: Option<Vec<f64>>,
    /// Key into the icon registry.
    #[serde(default)]
    pub icon: Option<String>,
}

impl MarketEntity {
    /// Create an entity with no market data. Chain the `with_*` setters to fill it in.
    pub fn new(id: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            name: None,
            price_change_pct: f64::NAN,
            price_change_pct_1h: None,
            price_change_pct_7d: None,
            volume: f64::NAN,
            market_cap: f64::NAN,
            sparkline: None,
            icon: None,
        }
    }

    pub fn with_change(mut self, pct: f64) -> Self {
        self.price_change_pct = pct;
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_market_cap(mut self, market_cap: f64) -> Self {
        self.market_cap = market_cap;
        self
    }

    pub fn with_sparkline(mut self, prices: Vec<f64>) -> Self {
        self.sparkline = Some(prices);
        self
    }

    pub fn with_icon(mut self, key: impl Into<String>) -> Self {
        self.icon = Some(key.into());
        self
    }

    /// Percent change over `timeframe`.
    ///
    /// Prefers the sparkline when it holds enough history, then the explicit
    /// per-timeframe field, then the flat 24h value. Always finite.
    pub fn change_pct(&self, timeframe: Timeframe) -> f64 {
        let from_history = self
            .sparkline
            .as_deref()
            .and_then(|series| timeframe.change_from_series(series));

        let explicit = match timeframe {
            Timeframe::Hour => self.price_change_pct_1h,
            Timeframe::Day => Some(self.price_change_pct),
            Timeframe::Week => self.price_change_pct_7d,
        };

        from_history
            .or(explicit.filter(|v| v.is_finite()))
            .or(Some(self.price_change_pct).filter(|v| v.is_finite()))
            .unwrap_or(0.0)
    }

    /// Trading volume, with non-finite or negative values replaced by zero.
    pub fn sanitized_volume(&self) -> f64 {
        non_negative(self.volume)
    }

    /// Market capitalization, with non-finite or negative values replaced by zero.
    pub fn sanitized_market_cap(&self) -> f64 {
        non_negative(self.market_cap)
    }
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

/// Lookback window for the percent-change metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Timeframe {
    Hour,
    #[default]
    Day,
    Week,
}

impl Timeframe {
    /// Change in percent between the last sample and the sample this window
    /// looks back to. `None` when the series is too short or the reference is unusable.
    fn change_from_series(self, series: &[f64]) -> Option<f64> {
        let last = *series.last()?;
        let reference = match self {
            Timeframe::Hour => series.len().checked_sub(2).map(|i| series[i]),
            Timeframe::Day => series.len().checked_sub(25).map(|i| series[i]),
            Timeframe::Week if series.len() >= 2 => Some(series[0]),
            Timeframe::Week => None,
        }?;

        if !last.is_finite() || !reference.is_finite() || reference <= 0.0 {
            return None;
        }
        let pct = (last - reference) / reference * 100.0;
        pct.is_finite().then_some(pct)
    }
}

impl FromStr for Timeframe {
    type Err = SwarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1h" | "hour" | "recent" => Ok(Timeframe::Hour),
            "24h" | "day" | "short" => Ok(Timeframe::Day),
            "7d" | "week" | "long" => Ok(Timeframe::Week),
            _ => Err(SwarmError::UnknownTimeframe(s.to_string())),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Timeframe::Hour => "1h",
            Timeframe::Day => "24h",
            Timeframe::Week => "7d",
        })
    }
}

/// What drives particle size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SizingMode {
    /// Size by absolute move weighted by log volume.
    #[default]
    Performance,
    /// Size by market capitalization.
    Capitalization,
}

impl FromStr for SizingMode {
    type Err = SwarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "performance" | "perf" => Ok(SizingMode::Performance),
            "capitalization" | "cap" | "market_cap" => Ok(SizingMode::Capitalization),
            _ => Err(SwarmError::UnknownSizingMode(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_numbers_become_nan() {
        let json = r#"{ "id": "btc", "symbol": "BTC", "volume": null }"#;
        let entity: MarketEntity = serde_json::from_str(json).unwrap();
        assert!(entity.volume.is_nan());
        assert!(entity.market_cap.is_nan());
        assert_eq!(entity.sanitized_volume(), 0.0);
        assert_eq!(entity.change_pct(Timeframe::Day), 0.0);
    }

    #[test]
    fn test_change_prefers_history() {
        let mut series = vec![100.0; 30];
        *series.last_mut().unwrap() = 110.0;
        let entity = MarketEntity::new("a", "A").with_change(-3.0).with_sparkline(series);

        assert!((entity.change_pct(Timeframe::Hour) - 10.0).abs() < 1e-9);
        assert!((entity.change_pct(Timeframe::Day) - 10.0).abs() < 1e-9);
        assert!((entity.change_pct(Timeframe::Week) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_history_falls_back_to_flat_value() {
        let entity = MarketEntity::new("a", "A")
            .with_change(4.5)
            .with_sparkline(vec![1.0, 1.1, 1.2]);

        // 3 points cover the hour and week lookbacks but not a day.
        assert!((entity.change_pct(Timeframe::Day) - 4.5).abs() < 1e-9);
        assert!((entity.change_pct(Timeframe::Week) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_reference_price_is_ignored() {
        let entity = MarketEntity::new("a", "A")
            .with_change(2.0)
            .with_sparkline(vec![0.0, 5.0]);
        assert_eq!(entity.change_pct(Timeframe::Week), 2.0);
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("7d".parse::<Timeframe>().unwrap(), Timeframe::Week);
        assert_eq!("Cap".parse::<SizingMode>().unwrap(), SizingMode::Capitalization);
        assert!(matches!(
            "fortnight".parse::<Timeframe>(),
            Err(SwarmError::UnknownTimeframe(_))
        ));
    }
}
