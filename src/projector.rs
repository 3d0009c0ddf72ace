//! Map-mode metric projection.
//!
//! In map mode every particle drifts toward an anchor on a two-metric scatter
//! plot. This module turns entity metrics into normalized plot coordinates,
//! converts them back for axis labels, and lays the plot out on the surface.
//!
//! ```ignore
//! let projection = Projection::from_entities(&entities, MetricPair::default(), Timeframe::Day);
//! let layout = PlotLayout::for_surface(DVec2::new(1280.0, 720.0));
//! let anchor = layout.to_screen(projection.project(&entities[0]));
//! ```

use glam::DVec2;
use std::fmt;
use std::str::FromStr;

use crate::entity::{MarketEntity, Timeframe};
use crate::error::SwarmError;
use crate::physics::Bounds;

/// Values below this are clamped before `log10` on log axes.
pub const LOG_FLOOR: f64 = 1.0;

/// Plot margins in pixels: left, right, top, bottom.
pub const PLOT_MARGINS: [f64; 4] = [64.0, 24.0, 24.0, 48.0];

/// A plottable entity metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    PercentChange,
    Volume,
    MarketCap,
}

impl Metric {
    /// Read this metric from an entity. Always finite.
    pub fn value(self, entity: &MarketEntity, timeframe: Timeframe) -> f64 {
        match self {
            Metric::PercentChange => entity.change_pct(timeframe),
            Metric::Volume => entity.sanitized_volume(),
            Metric::MarketCap => entity.sanitized_market_cap(),
        }
    }

    /// Axis title.
    pub fn title(self) -> &'static str {
        match self {
            Metric::PercentChange => "CHANGE %",
            Metric::Volume => "VOLUME",
            Metric::MarketCap => "MARKET CAP",
        }
    }

    /// Compact label for an axis tick.
    pub fn format(self, value: f64) -> String {
        match self {
            Metric::PercentChange => {
                if value.abs() < 10.0 && value.fract().abs() > 1e-9 {
                    format!("{:+.1}%", value)
                } else {
                    format!("{:+.0}%", value)
                }
            }
            Metric::Volume | Metric::MarketCap => format!("${}", compact(value)),
        }
    }
}

fn compact(value: f64) -> String {
    const UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];
    for (scale, suffix) in UNITS {
        if value.abs() >= scale {
            let scaled = value / scale;
            return if scaled.fract().abs() < 1e-9 {
                format!("{:.0}{}", scaled, suffix)
            } else {
                format!("{:.1}{}", scaled, suffix)
            };
        }
    }
    format!("{:.0}", value)
}

impl FromStr for Metric {
    type Err = SwarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "change" | "percent_change" | "pct" => Ok(Metric::PercentChange),
            "volume" | "vol" => Ok(Metric::Volume),
            "market_cap" | "marketcap" | "cap" => Ok(Metric::MarketCap),
            _ => Err(SwarmError::UnknownMetric(s.to_string())),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Metric::PercentChange => "change",
            Metric::Volume => "volume",
            Metric::MarketCap => "market_cap",
        })
    }
}

/// Axis scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AxisScale {
    #[default]
    Linear,
    Log,
}

/// One plot axis: which metric, on which scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AxisSpec {
    pub metric: Metric,
    pub scale: AxisScale,
}

impl AxisSpec {
    pub fn new(metric: Metric, scale: AxisScale) -> Self {
        Self { metric, scale }
    }

    pub fn linear(metric: Metric) -> Self {
        Self::new(metric, AxisScale::Linear)
    }

    pub fn log(metric: Metric) -> Self {
        Self::new(metric, AxisScale::Log)
    }
}

/// The two axes of the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetricPair {
    pub x: AxisSpec,
    pub y: AxisSpec,
}

impl Default for MetricPair {
    fn default() -> Self {
        Self {
            x: AxisSpec::log(Metric::MarketCap),
            y: AxisSpec::linear(Metric::PercentChange),
        }
    }
}

/// Value range of one axis over the current entity set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisDomain {
    pub scale: AxisScale,
    pub min: f64,
    pub max: f64,
    /// `log10` of the clamped bounds. Equal to `min`/`max` on linear axes.
    pub log_min: f64,
    pub log_max: f64,
}

impl AxisDomain {
    /// Domain covering every finite value in `values`. Empty input gives a
    /// degenerate domain at zero (or [`LOG_FLOOR`] on log axes).
    pub fn from_values(values: impl IntoIterator<Item = f64>, scale: AxisScale) -> Self {
        let (mut min, mut max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if min > max {
            min = 0.0;
            max = 0.0;
        }

        match scale {
            AxisScale::Linear => Self { scale, min, max, log_min: min, log_max: max },
            AxisScale::Log => {
                let min = min.max(LOG_FLOOR);
                let max = max.max(LOG_FLOOR);
                Self {
                    scale,
                    min,
                    max,
                    log_min: min.log10(),
                    log_max: max.log10(),
                }
            }
        }
    }

    /// True when every value in the set was the same.
    pub fn is_degenerate(&self) -> bool {
        (self.log_max - self.log_min).abs() <= f64::EPSILON * self.log_max.abs().max(1.0)
    }

    /// Normalized position of `value` on this axis, in `[0, 1]`.
    ///
    /// Degenerate domains and non-finite values map to 0, the lower bound.
    pub fn project(&self, value: f64) -> f64 {
        if self.is_degenerate() || !value.is_finite() {
            return 0.0;
        }
        let v = match self.scale {
            AxisScale::Linear => value,
            AxisScale::Log => value.max(LOG_FLOOR).log10(),
        };
        ((v - self.log_min) / (self.log_max - self.log_min)).clamp(0.0, 1.0)
    }

    /// Inverse of [`project`](Self::project) for `u` in `[0, 1]`.
    pub fn unproject(&self, u: f64) -> f64 {
        let v = self.log_min + u * (self.log_max - self.log_min);
        match self.scale {
            AxisScale::Linear => v,
            AxisScale::Log => 10f64.powf(v),
        }
    }

    /// Tick values inside the domain, at most roughly `count` of them.
    ///
    /// Linear axes use 1/2/5 steps, log axes use powers of ten.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        if self.is_degenerate() {
            return vec![self.unproject(0.0)];
        }
        match self.scale {
            AxisScale::Linear => {
                let step = nice_step((self.max - self.min) / count.max(1) as f64);
                let first = (self.min / step).ceil() as i64;
                let last = (self.max / step).floor() as i64;
                (first..=last).map(|i| i as f64 * step).collect()
            }
            AxisScale::Log => {
                let first = self.log_min.ceil() as i32;
                let last = self.log_max.floor() as i32;
                let mut ticks: Vec<f64> = (first..=last).map(|e| 10f64.powi(e)).collect();
                let stride = ticks.len().div_ceil(count.max(1)).max(1);
                if stride > 1 {
                    ticks = ticks.into_iter().step_by(stride).collect();
                }
                ticks
            }
        }
    }
}

fn nice_step(raw: f64) -> f64 {
    if !(raw.is_finite() && raw > 0.0) {
        return 1.0;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    let residual = raw / magnitude;
    let nice = if residual <= 1.0 {
        1.0
    } else if residual <= 2.0 {
        2.0
    } else if residual <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Both axis domains for the current entity set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub pair: MetricPair,
    pub timeframe: Timeframe,
    pub x: AxisDomain,
    pub y: AxisDomain,
}

impl Projection {
    /// Compute both domains over `entities`.
    pub fn from_entities<'a>(
        entities: impl IntoIterator<Item = &'a MarketEntity> + Clone,
        pair: MetricPair,
        timeframe: Timeframe,
    ) -> Self {
        let x = AxisDomain::from_values(
            entities.clone().into_iter().map(|e| pair.x.metric.value(e, timeframe)),
            pair.x.scale,
        );
        let y = AxisDomain::from_values(
            entities.into_iter().map(|e| pair.y.metric.value(e, timeframe)),
            pair.y.scale,
        );
        Self { pair, timeframe, x, y }
    }

    /// Normalized plot position of one entity.
    pub fn project(&self, entity: &MarketEntity) -> DVec2 {
        DVec2::new(
            self.x.project(self.pair.x.metric.value(entity, self.timeframe)),
            self.y.project(self.pair.y.metric.value(entity, self.timeframe)),
        )
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::from_entities(std::iter::empty::<&MarketEntity>(), MetricPair::default(), Timeframe::Day)
    }
}

/// Placement of the plot rectangle on a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotLayout {
    pub plot: Bounds,
}

impl PlotLayout {
    /// Plot area for a surface of `size` pixels, inset by [`PLOT_MARGINS`].
    pub fn for_surface(size: DVec2) -> Self {
        let [left, right, top, bottom] = PLOT_MARGINS;
        let min = DVec2::new(left, top);
        let max = DVec2::new((size.x - right).max(left), (size.y - bottom).max(top));
        Self { plot: Bounds::new(min, max) }
    }

    /// Map normalized coordinates into the plot. `u.y = 1` is the top edge.
    pub fn to_screen(&self, u: DVec2) -> DVec2 {
        DVec2::new(
            self.plot.min.x + u.x * self.plot.width(),
            self.plot.max.y - u.y * self.plot.height(),
        )
    }

    /// Inverse of [`to_screen`](Self::to_screen), unclamped.
    pub fn to_normalized(&self, p: DVec2) -> DVec2 {
        let w = self.plot.width().max(f64::EPSILON);
        let h = self.plot.height().max(f64::EPSILON);
        DVec2::new((p.x - self.plot.min.x) / w, (self.plot.max.y - p.y) / h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_projection() {
        let d = AxisDomain::from_values([-10.0, 0.0, 30.0], AxisScale::Linear);
        assert_eq!(d.project(-10.0), 0.0);
        assert_eq!(d.project(30.0), 1.0);
        assert!((d.project(0.0) - 0.25).abs() < 1e-12);
        assert!((d.unproject(0.25) - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_log_projection_clamps_small_values() {
        let d = AxisDomain::from_values([0.0, 10.0, 1000.0], AxisScale::Log);
        assert_eq!(d.min, LOG_FLOOR);
        assert_eq!(d.project(0.5), 0.0);
        assert!((d.project(10.0) - 1.0 / 3.0).abs() < 1e-12);
        assert!((d.unproject(2.0 / 3.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_domain_maps_to_lower_bound() {
        let d = AxisDomain::from_values([5.0, 5.0, 5.0], AxisScale::Linear);
        assert!(d.is_degenerate());
        assert_eq!(d.project(5.0), 0.0);
        assert_eq!(d.ticks(5), vec![5.0]);

        let empty = AxisDomain::from_values(std::iter::empty(), AxisScale::Log);
        assert_eq!(empty.project(100.0), 0.0);
    }

    #[test]
    fn test_nonfinite_values_are_ignored() {
        let d = AxisDomain::from_values([f64::NAN, 1.0, 3.0, f64::INFINITY], AxisScale::Linear);
        assert_eq!((d.min, d.max), (1.0, 3.0));
        assert_eq!(d.project(f64::NAN), 0.0);
    }

    #[test]
    fn test_linear_ticks_are_nice() {
        let d = AxisDomain::from_values([-7.0, 13.0], AxisScale::Linear);
        assert_eq!(d.ticks(4), vec![-5.0, 0.0, 5.0, 10.0]);
    }

    #[test]
    fn test_log_ticks_are_powers_of_ten() {
        let d = AxisDomain::from_values([50.0, 2.0e6], AxisScale::Log);
        assert_eq!(d.ticks(10), vec![100.0, 1e3, 1e4, 1e5, 1e6]);
    }

    #[test]
    fn test_plot_layout_y_grows_up() {
        let layout = PlotLayout::for_surface(DVec2::new(800.0, 600.0));
        let bottom_left = layout.to_screen(DVec2::ZERO);
        let top_right = layout.to_screen(DVec2::ONE);

        assert_eq!(bottom_left, DVec2::new(64.0, 552.0));
        assert_eq!(top_right, DVec2::new(776.0, 24.0));
        assert!((layout.to_normalized(top_right) - DVec2::ONE).length() < 1e-12);
    }

    #[test]
    fn test_metric_labels() {
        assert_eq!(Metric::PercentChange.format(5.0), "+5%");
        assert_eq!(Metric::PercentChange.format(-2.5), "-2.5%");
        assert_eq!(Metric::MarketCap.format(1.0e9), "$1B");
        assert_eq!(Metric::Volume.format(2.5e6), "$2.5M");
        assert_eq!("market_cap".parse::<Metric>().unwrap(), Metric::MarketCap);
    }

    #[test]
    fn test_projection_from_entities() {
        let entities = vec![
            MarketEntity::new("a", "A").with_change(-4.0).with_market_cap(10.0),
            MarketEntity::new("b", "B").with_change(6.0).with_market_cap(1000.0),
        ];
        let p = Projection::from_entities(&entities, MetricPair::default(), Timeframe::Day);
        assert_eq!(p.project(&entities[0]), DVec2::new(0.0, 0.0));
        assert_eq!(p.project(&entities[1]), DVec2::new(1.0, 1.0));
    }
}
