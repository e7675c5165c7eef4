//! Instance inventory backed by the RDS control-plane API

use super::{async_trait, FetchError, InventoryFetcher, Result};
use crate::models::InstanceRecord;
use aws_sdk_rds::error::DisplayErrorContext;
use aws_sdk_rds::types::DbInstance;
use tracing::{debug, warn};

pub struct RdsInventoryFetcher {
    client: aws_sdk_rds::Client,
}

impl RdsInventoryFetcher {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_rds::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl InventoryFetcher for RdsInventoryFetcher {
    async fn list_instances(&self) -> Result<Vec<InstanceRecord>> {
        let mut pages = self
            .client
            .describe_db_instances()
            .into_paginator()
            .items()
            .send();

        let mut instances = Vec::new();
        while let Some(item) = pages.next().await {
            let db_instance = item
                .map_err(|e| FetchError::Inventory(DisplayErrorContext(e).to_string()))?;

            if let Some(record) = to_record(&db_instance) {
                instances.push(record);
            }
        }

        debug!(count = instances.len(), "Described DB instances");
        Ok(instances)
    }
}

fn to_record(db_instance: &DbInstance) -> Option<InstanceRecord> {
    let Some(identifier) = db_instance.db_instance_identifier() else {
        warn!("Skipping DB instance without an identifier");
        return None;
    };

    Some(InstanceRecord::new(
        identifier,
        db_instance.allocated_storage().unwrap_or_default(),
        db_instance.max_allocated_storage(),
    ))
}
