//! Demo host.
//!
//! ```text
//! coinswarm [SNAPSHOT.json] [CONFIG.json]
//! ```
//!
//! `SNAPSHOT.json` is a JSON array of market entities. Without one, a
//! synthetic market is generated.

use std::path::Path;

use coinswarm::{MarketEntity, Spawner, Swarm, SwarmConfig, SwarmError};

const SYNTHETIC_COUNT: usize = 40;

fn load_snapshot(path: &Path) -> Result<Vec<MarketEntity>, SwarmError> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// A plausible-looking market: caps spread over five decades, changes around zero.
fn synthetic_market(spawner: &mut Spawner, count: usize) -> Vec<MarketEntity> {
    (0..count)
        .map(|i| {
            let cap = 10f64.powf(spawner.random_range(7.0, 12.0));
            let change = spawner.random_range(-12.0, 12.0);
            let history: Vec<f64> = (0..168)
                .scan(100.0, |price, _| {
                    *price *= 1.0 + spawner.random_range(-0.01, 0.01);
                    Some(*price)
                })
                .collect();
            MarketEntity::new(format!("coin-{i}"), format!("C{i}"))
                .with_change(change)
                .with_market_cap(cap)
                .with_volume(cap * spawner.random_range(0.01, 0.2))
                .with_sparkline(history)
        })
        .collect()
}

fn run() -> Result<(), SwarmError> {
    let mut args = std::env::args().skip(1);
    let snapshot = args.next();
    let config = match args.next() {
        Some(path) => SwarmConfig::load(path)?,
        None => SwarmConfig::default(),
    };

    let entities = match snapshot {
        Some(path) => {
            let entities = load_snapshot(Path::new(&path))?;
            log::info!("loaded {} entities from {}", entities.len(), path);
            entities
        }
        None => synthetic_market(&mut Spawner::new(config.seed), SYNTHETIC_COUNT),
    };

    let mut swarm = Swarm::new(config)?;
    swarm.on_select(|id| log::info!("selected {}", id));
    swarm.on_hover_change(|id| log::debug!("hover {:?}", id));
    swarm.set_entities(entities);

    coinswarm::window::run(swarm)
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
