//! Entity-to-particle mapping.
//!
//! Turns a raw entity list into the particle set the engine simulates:
//!
//! 1. Each entity gets a non-negative *radius basis* (what drives its size)
//!    and a signed metric (its percent change, which drives color).
//! 2. Entities are ranked by basis and truncated to the entity limit.
//! 3. Bases are min-max normalized and placed inside a [`RadiusBand`] sized so
//!    the discs of the whole set cover a fixed share of the surface.
//!
//! Bad numbers never drop an entity. They map to a zero basis, which puts the
//! entity at the bottom of the band.

use glam::DVec2;

use crate::entity::{MarketEntity, SizingMode, Timeframe};

/// Exponent applied to market cap in [`SizingMode::Capitalization`].
pub const CAP_EXPONENT: f64 = 0.85;

/// No particle is ever targeted smaller than this, in pixels.
pub const MIN_RADIUS_FLOOR: f64 = 2.0;

/// One entity after mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappedEntity {
    /// Index into the input slice.
    pub index: usize,
    /// Sanitized sizing value, always finite and `>= 0`.
    pub basis: f64,
    /// Signed percent change for the active timeframe, always finite.
    pub change_pct: f64,
    /// Normalized position of `basis` inside the selected set, in `[0, 1]`.
    pub t: f64,
}

/// Size driver for a single entity. Always finite and non-negative.
pub fn radius_basis(entity: &MarketEntity, timeframe: Timeframe, sizing: SizingMode) -> f64 {
    let raw = match sizing {
        SizingMode::Performance => {
            let pct = entity.change_pct(timeframe).abs();
            pct * (entity.sanitized_volume() + 1.0).log10()
        }
        SizingMode::Capitalization => entity.sanitized_market_cap().powf(CAP_EXPONENT),
    };
    if raw.is_finite() && raw > 0.0 {
        raw
    } else {
        0.0
    }
}

/// Rank, truncate and normalize `entities`.
///
/// The result is in rank order (largest basis first). Ties keep input order,
/// so the same input always selects the same entities.
pub fn map_entities(
    entities: &[MarketEntity],
    timeframe: Timeframe,
    sizing: SizingMode,
    limit: usize,
) -> Vec<MappedEntity> {
    let mut mapped: Vec<MappedEntity> = entities
        .iter()
        .enumerate()
        .map(|(index, entity)| MappedEntity {
            index,
            basis: radius_basis(entity, timeframe, sizing),
            change_pct: entity.change_pct(timeframe),
            t: 0.5,
        })
        .collect();

    // sort_by is stable
    mapped.sort_by(|a, b| b.basis.total_cmp(&a.basis));
    mapped.truncate(limit);

    let (lo, hi) = mapped
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), m| {
            (lo.min(m.basis), hi.max(m.basis))
        });
    let span = hi - lo;
    for m in &mut mapped {
        m.t = if span > f64::EPSILON {
            ((m.basis - lo) / span).clamp(0.0, 1.0)
        } else {
            0.5
        };
    }

    mapped
}

/// Radius range that particles are mapped into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusBand {
    pub min: f64,
    pub max: f64,
}

impl RadiusBand {
    /// Size the band for a set of normalized bases `ts` on a surface of
    /// `size` pixels.
    ///
    /// With `min = min_ratio * max`, every radius is a multiple of `max`, so
    /// `max` is solved directly from `sum(pi * r_i^2) = fill_fraction * W * H`.
    /// It is then capped to a quarter of the shorter side, and `min` is
    /// floored at [`MIN_RADIUS_FLOOR`].
    pub fn compute(
        size: DVec2,
        ts: impl IntoIterator<Item = f64>,
        fill_fraction: f64,
        min_ratio: f64,
    ) -> Self {
        let width = size.x.max(0.0);
        let height = size.y.max(0.0);
        let rho = min_ratio.clamp(0.0, 1.0);

        // sum of (r_i / max)^2
        let shape: f64 = ts
            .into_iter()
            .map(|t| {
                let k = rho + (1.0 - rho) * t.clamp(0.0, 1.0);
                k * k
            })
            .sum();
        let ideal = (fill_fraction * width * height / (std::f64::consts::PI * shape)).sqrt();
        let cap = width.min(height) / 4.0;

        let mut max = if ideal.is_finite() { ideal.min(cap) } else { cap };
        let min = (rho * max).max(MIN_RADIUS_FLOOR);
        max = max.max(min);

        Self { min, max }
    }

    /// Band for the `t` values of a mapped set.
    pub fn for_mapped(size: DVec2, mapped: &[MappedEntity], fill_fraction: f64, min_ratio: f64) -> Self {
        Self::compute(size, mapped.iter().map(|m| m.t), fill_fraction, min_ratio)
    }

    /// Covered share of a `size` surface if every `t` sat at its target radius.
    pub fn coverage(&self, size: DVec2, ts: impl IntoIterator<Item = f64>) -> f64 {
        let area: f64 = ts
            .into_iter()
            .map(|t| std::f64::consts::PI * self.radius(t).powi(2))
            .sum();
        area / (size.x * size.y).max(f64::EPSILON)
    }

    /// Radius for a normalized basis `t`.
    pub fn radius(&self, t: f64) -> f64 {
        self.min + t.clamp(0.0, 1.0) * (self.max - self.min)
    }
}

impl Default for RadiusBand {
    fn default() -> Self {
        Self::compute(DVec2::new(800.0, 600.0), (0..50).map(|i| i as f64 / 49.0), 0.875, 0.3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(id: &str, change: f64, volume: f64) -> MarketEntity {
        MarketEntity::new(id, id.to_uppercase())
            .with_change(change)
            .with_volume(volume)
            .with_market_cap(volume * 10.0)
    }

    #[test]
    fn test_performance_basis() {
        let e = coin("a", -5.0, 999.0);
        let basis = radius_basis(&e, Timeframe::Day, SizingMode::Performance);
        assert!((basis - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_capitalization_basis() {
        let e = coin("a", 1.0, 100.0);
        let basis = radius_basis(&e, Timeframe::Day, SizingMode::Capitalization);
        assert!((basis - 1000f64.powf(CAP_EXPONENT)).abs() < 1e-9);
    }

    #[test]
    fn test_malformed_entity_gets_neutral_values() {
        let bad = MarketEntity::new("bad", "BAD").with_volume(f64::NAN);
        let good = coin("good", 3.0, 1000.0);
        let mapped = map_entities(&[bad, good], Timeframe::Day, SizingMode::Performance, 10);

        assert_eq!(mapped.len(), 2);
        let bad = mapped.iter().find(|m| m.index == 0).unwrap();
        assert_eq!(bad.basis, 0.0);
        assert_eq!(bad.change_pct, 0.0);
        assert_eq!(bad.t, 0.0);
    }

    #[test]
    fn test_truncation_is_stable() {
        let entities: Vec<_> = (0..8).map(|i| coin(&format!("c{i}"), 2.0, 1000.0)).collect();
        let first = map_entities(&entities, Timeframe::Day, SizingMode::Performance, 5);
        let second = map_entities(&entities, Timeframe::Day, SizingMode::Performance, 5);

        let order: Vec<usize> = first.iter().map(|m| m.index).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_rank_order_and_normalization() {
        let entities = vec![coin("s", 1.0, 9.0), coin("l", 10.0, 9.0), coin("m", 5.0, 9.0)];
        let mapped = map_entities(&entities, Timeframe::Day, SizingMode::Performance, 3);

        let order: Vec<usize> = mapped.iter().map(|m| m.index).collect();
        assert_eq!(order, vec![1, 2, 0]);
        assert_eq!(mapped[0].t, 1.0);
        assert_eq!(mapped[2].t, 0.0);
        assert!((mapped[1].t - 4.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_set_maps_to_middle() {
        let entities = vec![coin("a", 2.0, 99.0), coin("b", 2.0, 99.0)];
        let mapped = map_entities(&entities, Timeframe::Day, SizingMode::Performance, 10);
        assert!(mapped.iter().all(|m| m.t == 0.5));
    }

    #[test]
    fn test_band_fills_surface() {
        let size = DVec2::new(1200.0, 800.0);
        let ts: Vec<f64> = (0..50).map(|i| i as f64 / 49.0).collect();
        let band = RadiusBand::compute(size, ts.iter().copied(), 0.875, 0.3);

        assert!((band.min - 0.3 * band.max).abs() < 1e-9);
        assert!((band.coverage(size, ts.iter().copied()) - 0.875).abs() < 1e-9);
    }

    #[test]
    fn test_band_follows_skewed_sets() {
        // Most of the set near the bottom, a few giants.
        let size = DVec2::new(800.0, 600.0);
        let ts: Vec<f64> = (1..=80).map(|i| (i as f64).powf(-1.3)).collect();
        let band = RadiusBand::compute(size, ts.iter().copied(), 0.875, 0.3);

        assert!(band.max < 150.0);
        let coverage = band.coverage(size, ts.iter().copied());
        assert!((0.85..=0.90).contains(&coverage), "coverage {coverage}");

        let uniform = RadiusBand::compute(size, (0..80).map(|i| i as f64 / 79.0), 0.875, 0.3);
        assert!(band.max > uniform.max);
    }

    #[test]
    fn test_band_caps_and_floors() {
        let few = RadiusBand::compute(DVec2::new(400.0, 300.0), [1.0], 0.875, 0.3);
        assert_eq!(few.max, 75.0);

        let tiny = RadiusBand::compute(DVec2::new(10.0, 10.0), vec![0.5; 500], 0.875, 0.3);
        assert_eq!(tiny.min, MIN_RADIUS_FLOOR);
        assert!(tiny.max >= tiny.min);

        let empty = RadiusBand::compute(DVec2::ZERO, std::iter::empty(), 0.875, 0.3);
        assert!(empty.min <= empty.max);
    }
}
