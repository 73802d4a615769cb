//! Instruments command implementation

use crate::config::Config;
use crate::instrument::InstrumentRegistry;
use clap::Args;

#[derive(Args, Debug)]
pub struct InstrumentsArgs {
    /// Override the instrument registry file (defaults to
    /// <data.dir>/instruments.json)
    #[arg(long)]
    pub file: Option<String>,
}

impl InstrumentsArgs {
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let path = self
            .file
            .as_ref()
            .map(std::path::PathBuf::from)
            .unwrap_or_else(|| config.data.dir.join("instruments.json"));
        let registry = InstrumentRegistry::load(&path)?;

        let mut instruments: Vec<_> = registry.iter().collect();
        instruments.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        println!(
            "{:<10} {:>9} {:>12} {:>10} {:>10} {:>12}",
            "SYMBOL", "PRECISION", "PIP", "STEP", "MIN", "MAX"
        );
        for instrument in instruments {
            println!(
                "{:<10} {:>9} {:>12} {:>10} {:>10} {:>12}",
                instrument.symbol,
                instrument.display_precision,
                instrument.pip_location,
                instrument.size_step,
                instrument.min_size,
                instrument.max_size,
            );
        }

        Ok(())
    }
}
