//! Migration pipeline
//!
//! Bootstrap the storage root once, then discover assets in the remote
//! repository and export the ones the root does not hold yet.

pub mod dispatcher;
pub mod exporter;
pub mod stats;

pub use dispatcher::{Dispatcher, ExportOutcome};
pub use exporter::ObjectExporter;
pub use stats::{RunStats, RunSummary};

use crate::config::MigrateConfig;
use crate::core::error::Result;
use crate::remote::{RepositoryClient, SearchQuery, SearchResults};
use crate::storage::bootstrap::{bootstrap, HttpSpecSource, SpecSource};
use indicatif::ProgressBar;
use std::sync::Arc;
use tracing::info;

/// One end-to-end run against a storage root
pub struct Migration {
    client: Arc<dyn RepositoryClient>,
    config: MigrateConfig,
    spec_source: Option<Box<dyn SpecSource>>,
    progress: ProgressBar,
}

impl Migration {
    pub fn new(client: Arc<dyn RepositoryClient>, config: MigrateConfig) -> Self {
        let spec_source: Option<Box<dyn SpecSource>> = if config.spec_copy {
            Some(Box::new(HttpSpecSource::default()))
        } else {
            None
        };
        Self {
            client,
            config,
            spec_source,
            progress: ProgressBar::hidden(),
        }
    }

    /// Replace where the specification copy comes from
    pub fn with_spec_source(mut self, source: Option<Box<dyn SpecSource>>) -> Self {
        self.spec_source = source;
        self
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &MigrateConfig {
        &self.config
    }

    /// Bootstrap, discover and export. Returns once every submitted export
    /// has finished.
    pub fn run(&self) -> Result<RunSummary> {
        let storage = Arc::new(self.config.storage());
        bootstrap(&storage, self.spec_source.as_deref())?;

        match &self.config.collection {
            Some(reference) => {
                let folder = self.client.folder(reference)?;
                info!(
                    collection = %folder.reference,
                    title = %folder.title,
                    "populating storage root from collection"
                );
            }
            None => info!("populating storage root from all collections"),
        }

        let exporter = ObjectExporter::new(
            Arc::clone(&self.client),
            Arc::clone(&storage),
            self.config.include_parent_hierarchy,
        )
        .with_message(self.config.message.clone());

        let dispatcher = Dispatcher::new(Arc::new(exporter), storage, self.config.workers)
            .with_progress(self.progress.clone());

        let query = SearchQuery::assets(self.config.collection.as_deref());
        dispatcher.run(SearchResults::new(self.client.as_ref(), query))
    }
}
