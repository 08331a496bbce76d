//! ScyllaDB schema creation
//!
//! Leads are stored once per tenant (`leads_by_tenant`, JSON payload) and
//! indexed by identity (`leads_by_identity`) for the trailing-window reads
//! done on every submission. Timestamps are epoch milliseconds.

use crate::error::PersistenceError;
use scylla::Session;

/// Create the keyspace if it doesn't exist
pub async fn create_keyspace(
    session: &Session,
    keyspace: &str,
    replication_factor: u8,
) -> Result<(), PersistenceError> {
    let query = format!(
        "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = {{'class': 'SimpleStrategy', 'replication_factor': {}}}",
        keyspace, replication_factor
    );

    session
        .query_unpaged(query, &[])
        .await
        .map_err(|e| PersistenceError::SchemaError(format!("Failed to create keyspace: {}", e)))?;

    Ok(())
}

/// Create all required tables
pub async fn create_tables(session: &Session, keyspace: &str) -> Result<(), PersistenceError> {
    let leads_by_tenant = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.leads_by_tenant (
            tenant_id TEXT,
            lead_id UUID,
            email TEXT,
            status TEXT,
            score INT,
            created_at BIGINT,
            updated_at BIGINT,
            payload TEXT,
            PRIMARY KEY ((tenant_id), lead_id)
        )
    "#,
        keyspace
    );

    session
        .query_unpaged(leads_by_tenant, &[])
        .await
        .map_err(|e| {
            PersistenceError::SchemaError(format!("Failed to create leads_by_tenant table: {}", e))
        })?;

    let leads_by_identity = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.leads_by_identity (
            tenant_id TEXT,
            email TEXT,
            created_at BIGINT,
            lead_id UUID,
            PRIMARY KEY ((tenant_id, email), created_at, lead_id)
        ) WITH CLUSTERING ORDER BY (created_at DESC, lead_id ASC)
    "#,
        keyspace
    );

    session
        .query_unpaged(leads_by_identity, &[])
        .await
        .map_err(|e| {
            PersistenceError::SchemaError(format!(
                "Failed to create leads_by_identity table: {}",
                e
            ))
        })?;

    let lead_activities = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.lead_activities (
            tenant_id TEXT,
            lead_id UUID,
            occurred_at BIGINT,
            activity_id UUID,
            activity_type TEXT,
            payload TEXT,
            PRIMARY KEY ((tenant_id, lead_id), occurred_at, activity_id)
        ) WITH CLUSTERING ORDER BY (occurred_at DESC, activity_id ASC)
    "#,
        keyspace
    );

    session
        .query_unpaged(lead_activities, &[])
        .await
        .map_err(|e| {
            PersistenceError::SchemaError(format!("Failed to create lead_activities table: {}", e))
        })?;

    tracing::info!("All tables created successfully");
    Ok(())
}
