use clap::Parser;
use fxbot::cli::{Cli, Commands};
use fxbot::config::Config;
use fxbot::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!(
            "Warning: failed to load {} ({}), using example config",
            cli.config, e
        );
        toml::from_str(include_str!("../config.toml.example"))
            .expect("example config must parse")
    });

    init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => args.execute(config).await,
        Commands::Instruments(args) => args.execute(&config),
        Commands::Config => {
            println!("venue.base_url        = {}", config.venue.base_url);
            println!("venue.timeout_secs    = {}", config.venue.timeout_secs);
            println!("venue.retry_attempts  = {}", config.venue.retry_attempts);
            println!("feed.ws_url           = {}", config.feed.ws_url);
            println!("feed.granularity      = {}", config.feed.granularity);
            println!("feed.poll_interval    = {}s", config.feed.poll_interval_secs);
            println!("data.dir              = {}", config.data.dir.display());
            println!("risk.trade_risk       = {}", config.risk.trade_risk);
            let mut symbols: Vec<_> = config.instruments.keys().collect();
            symbols.sort();
            for symbol in symbols {
                let s = &config.instruments[symbol];
                println!(
                    "instruments.{symbol}: ma={} std={} rsi={} max_spread={} rr={}",
                    s.ma_period, s.std_mult, s.momentum_period, s.max_spread, s.risk_reward
                );
            }
            Ok(())
        }
    }
}
