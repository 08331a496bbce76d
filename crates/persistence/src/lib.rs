//! Record stores for leads and lead activities
//!
//! Provides:
//! - `LeadStore` / `ActivityStore` traits consumed by intake and scoring
//! - In-memory stores (default, and for tests)
//! - ScyllaDB stores for durable multi-instance deployments

pub mod activities;
pub mod client;
pub mod error;
pub mod leads;
pub mod memory;
pub mod schema;
pub mod store;

pub use activities::ScyllaActivityStore;
pub use client::{ScyllaClient, ScyllaConfig};
pub use error::PersistenceError;
pub use leads::ScyllaLeadStore;
pub use memory::{InMemoryActivityStore, InMemoryLeadStore};
pub use store::{ActivityStore, LeadStore};

/// Connect to ScyllaDB, ensure the schema, and build the stores
pub async fn init(config: ScyllaConfig) -> Result<PersistenceLayer, PersistenceError> {
    let client = ScyllaClient::connect(config).await?;
    client.ensure_schema().await?;

    Ok(PersistenceLayer {
        leads: ScyllaLeadStore::new(client.clone()),
        activities: ScyllaActivityStore::new(client),
    })
}

/// ScyllaDB-backed stores sharing one session
pub struct PersistenceLayer {
    pub leads: ScyllaLeadStore,
    pub activities: ScyllaActivityStore,
}
