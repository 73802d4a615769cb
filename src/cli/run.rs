//! Run command implementation

use crate::config::Config;
use crate::engine::Engine;
use crate::feed::VenueStream;
use crate::instrument::InstrumentRegistry;
use crate::venue::RestVenue;
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Override the instrument registry file (defaults to
    /// <data.dir>/instruments.json)
    #[arg(long)]
    pub instruments: Option<String>,
}

impl RunArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let registry_path = self
            .instruments
            .as_ref()
            .map(std::path::PathBuf::from)
            .unwrap_or_else(|| config.data.dir.join("instruments.json"));
        let registry = Arc::new(InstrumentRegistry::load(&registry_path)?);

        tracing::info!(
            venue = %config.venue.base_url,
            feed = %config.feed.ws_url,
            instruments = registry.len(),
            "Starting trading engine"
        );

        let venue = Arc::new(RestVenue::new(&config.venue)?);
        let feed = Arc::new(VenueStream::new(&config.feed));

        let engine = Engine::new(config, registry, venue, feed);
        engine.run().await
    }
}
