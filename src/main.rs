use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use fleet_probe::{
    config::{Args, ProbeConfig},
    report, Dispatcher, Inventory, JsonInventory, Result,
};

#[tokio::main]
async fn main() -> ExitCode {
    let log_level = Env::default().default_filter_or("warn");
    env_logger::Builder::from_env(log_level).init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = ProbeConfig::from_args(args)?;
    let spec = config.request_spec()?;

    let targets = JsonInventory::new(&config.inventory).members(&config.fleet, &config.region)?;
    info!(
        "probing {} members of {} in {}",
        targets.len(),
        config.fleet,
        config.region
    );

    let mut dispatcher = Dispatcher::new()?;
    if let Some(limit) = config.max_in_flight {
        dispatcher = dispatcher.with_max_in_flight(limit);
    }
    let outcomes = dispatcher.dispatch(&targets, &spec).await;

    let mut stdout = std::io::stdout().lock();
    report::render(&mut stdout, &outcomes).map_err(|err| {
        fleet_probe::Error::Opaque(format!("failed to write report, reason: {}", err).into())
    })
}
