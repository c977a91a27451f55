use anyhow::Result;

use rulelab_cli::args::{cli, parse_log_level, RunConfig};
use rulelab_cli::runner::run_experiment;

fn main() -> Result<()> {
    let matches = cli().get_matches();

    let log_level = matches
        .get_one::<String>("log_level")
        .map(String::as_str)
        .unwrap_or("info");
    let level_filter = match parse_log_level(log_level) {
        Ok(level_filter) => level_filter,
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(1)
        }
    };

    env_logger::Builder::default()
        .filter_level(level_filter)
        .parse_env(env_logger::Env::default().filter_or("RULELAB_LOG", level_filter.as_str()))
        .init();

    let config = match RunConfig::from_arguments(&matches) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid arguments: {:#}", e);
            std::process::exit(1)
        }
    };

    log::info!("Running experiment on data set \"{}\"", config.dataset);

    match run_experiment(&config) {
        Ok(outcomes) => {
            let cached = outcomes.iter().filter(|o| o.from_cache).count();
            log::info!(
                "Successfully finished {} fold(s), {} loaded from cache",
                outcomes.len(),
                cached
            );
            Ok(())
        }
        Err(e) => {
            log::error!("Experiment failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
