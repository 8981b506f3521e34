//! Stepviz Demo
//!
//! Run the relaxation solver and play its events back in real time.

use std::env;

use stepviz_demo::{Error, Player, PlayerConfig};
use stepviz_core::LogConfig;
use tracing_subscriber::EnvFilter;

fn parse_arg<T: std::str::FromStr>(args: &[String], index: usize, name: &'static str, default: T) -> Result<T, Error> {
    match args.get(index) {
        Some(value) => value.parse().map_err(|_| Error::InvalidArgument {
            name,
            value: value.clone(),
        }),
        None => Ok(default),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Parse command line args
    let args: Vec<String> = env::args().collect();
    let ticks: u64 = parse_arg(&args, 1, "ticks", 500)?;
    let capacity: usize = parse_arg(&args, 2, "capacity", 1000)?;

    let config = PlayerConfig {
        ticks,
        log: LogConfig::new(capacity),
        ..PlayerConfig::default()
    };

    println!("Stepviz Playback Demo");
    println!("=====================");
    println!();
    println!("Playing {} ticks of {}ms (log capacity {})", ticks, config.playback.period, config.log.capacity);
    println!();

    let report = Player::new(config)?.run().await?;

    println!();
    println!("Playback complete:");
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
