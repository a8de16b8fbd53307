use std::path::PathBuf;
use std::sync::Arc;

use bot::{CarSpec, Driver, DriverConfig};
use clap::Parser;
use racing::{DEFAULT_TICK_HZ, RaceLimits, RaceManager, TrackFile, VehicleParams};
use tracing::info;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Track file, or the name of a built-in track ("oval", "kink").
    #[arg(long, default_value = "oval")]
    track: String,

    #[arg(long, default_value_t = 1)]
    cars: usize,

    #[arg(long, default_value_t = 3)]
    laps: u32,

    /// Stop the race after this many simulated seconds.
    #[arg(long, default_value_t = 300.0)]
    max_time: f64,

    #[arg(long)]
    driver_config: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_TICK_HZ)]
    tick_hz: u32,

    /// Offer each car a pit stop every this many laps.
    #[arg(long)]
    pit_every: Option<u32>,
}

fn load_track(name: &str) -> Result<TrackFile, Box<dyn std::error::Error>> {
    match TrackFile::builtin(name) {
        Some(file) => Ok(file?),
        None => Ok(TrackFile::load(&PathBuf::from(name))?),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "racing=info,bot=info".into()),
        )
        .init();

    let cli = Cli::parse();
    if cli.tick_hz == 0 {
        return Err("--tick-hz must be positive".into());
    }

    let track = Arc::new(load_track(&cli.track)?.to_track()?);
    info!(
        track = track.name(),
        segments = track.len(),
        length = track.length(),
        "track loaded"
    );

    let mut config = match &cli.driver_config {
        Some(path) => DriverConfig::load(path)?,
        None => DriverConfig::default(),
    };
    config.tick_period = 1.0 / cli.tick_hz as f32;

    let mut race = RaceManager::new(
        track,
        CarSpec::default(),
        VehicleParams::default(),
        cli.tick_hz,
    );
    for slot in 0..cli.cars {
        let driver = Driver::new(slot, format!("Car {}", slot + 1), config.clone());
        race.add_car(Box::new(driver));
    }
    race.start()?;

    let limits = RaceLimits {
        laps: cli.laps,
        max_time: cli.max_time,
        pit_every: cli.pit_every,
    };
    for summary in race.run(&limits) {
        let best = summary
            .best_lap
            .map_or_else(|| "-".to_string(), |lap| format!("{lap:.2}s"));
        println!(
            "#{} {:<10} laps {:>3}  best {:>9}  distance {:>8.1} m  reversing {:>5} ticks",
            summary.id, summary.name, summary.laps, best, summary.distance, summary.reverse_ticks
        );
    }
    Ok(())
}
