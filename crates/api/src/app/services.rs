use std::sync::Arc;

use axum::response::Response;

use petclinic_infra::config::{AppConfig, StorageConfig};
use petclinic_infra::demo_data::demo_data;
use petclinic_infra::{
    InMemoryStore, OwnerRepository, PetRepository, PostgresStore, VetRepository, VisitRepository,
};

use crate::app::view::{self, JsonViewRenderer, Outcome, ViewRenderer};

/// Everything a handler needs, injected explicitly.
#[derive(Clone)]
pub struct AppServices {
    pub owners: Arc<dyn OwnerRepository>,
    pub pets: Arc<dyn PetRepository>,
    pub visits: Arc<dyn VisitRepository>,
    pub vets: Arc<dyn VetRepository>,
    pub renderer: Arc<dyn ViewRenderer>,
}

impl AppServices {
    pub fn new(
        owners: Arc<dyn OwnerRepository>,
        pets: Arc<dyn PetRepository>,
        visits: Arc<dyn VisitRepository>,
        vets: Arc<dyn VetRepository>,
        renderer: Arc<dyn ViewRenderer>,
    ) -> Self {
        Self {
            owners,
            pets,
            visits,
            vets,
            renderer,
        }
    }

    /// Wire every repository to one store, rendering views as JSON.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: OwnerRepository + PetRepository + VisitRepository + VetRepository + 'static,
    {
        Self::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            Arc::new(JsonViewRenderer),
        )
    }

    /// In-memory store loaded with the demo dataset.
    pub fn with_demo_data() -> anyhow::Result<Self> {
        let store = InMemoryStore::with_data(demo_data())?;
        Ok(Self::from_store(Arc::new(store)))
    }

    pub fn respond(&self, outcome: Outcome) -> Response {
        match outcome {
            Outcome::View(v) => self.renderer.render(v),
            Outcome::Redirect(location) => view::redirect(&location),
        }
    }
}

/// Select and prepare the storage backend named by `config`.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    match &config.storage {
        StorageConfig::Postgres {
            url,
            max_connections,
        } => {
            let store = PostgresStore::connect(url, *max_connections).await?;
            store.migrate().await?;
            if config.seed_demo_data {
                let seeded = store.seed(&demo_data()).await?;
                tracing::info!(seeded, "demo data checked");
            }
            tracing::info!(backend = "postgres", "storage ready");
            Ok(AppServices::from_store(Arc::new(store)))
        }
        StorageConfig::InMemory => {
            let services = if config.seed_demo_data {
                AppServices::with_demo_data()?
            } else {
                AppServices::from_store(Arc::new(InMemoryStore::new()))
            };
            tracing::info!(backend = "in-memory", seeded = config.seed_demo_data, "storage ready");
            Ok(services)
        }
    }
}
