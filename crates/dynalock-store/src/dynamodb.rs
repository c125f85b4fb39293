//! DynamoDB lock store
//!
//! Maps the capability contract onto DynamoDB: `PutItem` with a condition
//! expression for lock writes, `DescribeTable`/`CreateTable` for the schema and
//! `DescribeTimeToLive`/`UpdateTimeToLive` for the TTL sweep.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, BillingMode, KeySchemaElement, KeyType,
    ScalarAttributeType, TableStatus as DynamoTableStatus, TimeToLiveSpecification,
    TimeToLiveStatus,
};
use aws_smithy_types::timeout::TimeoutConfig;
use tracing::{debug, info};

use dynalock_common::{
    ATTR_EXPIRATION_TIME, ATTR_HOLDER_IDENTIFIER, ATTR_LOCK_NAME, DynalockError, Result,
};

use crate::condition::{BoundValue, WriteCondition};
use crate::model::{
    LockItem, PutOutcome, TableDescription, TableSpec, TableStatus, TtlDescription, TtlStatus,
};
use crate::traits::LockStore;

/// Client overrides applied on top of the shared SDK configuration
#[derive(Debug, Clone, Default)]
pub struct DynamoDbStoreConfig {
    /// AWS region (uses SDK default if not specified)
    pub region: Option<String>,
    /// Endpoint override (e.g. LocalStack or DynamoDB Local)
    pub endpoint: Option<String>,
    /// Operation timeout in milliseconds
    pub timeout_ms: Option<u64>,
}

#[derive(Clone)]
pub struct DynamoDbLockStore {
    client: Client,
}

impl std::fmt::Debug for DynamoDbLockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoDbLockStore").finish_non_exhaustive()
    }
}

impl DynamoDbLockStore {
    /// Build a store from a loaded SDK configuration plus overrides
    pub fn new(sdk_config: &aws_config::SdkConfig, config: DynamoDbStoreConfig) -> Self {
        let mut builder = aws_sdk_dynamodb::config::Builder::from(sdk_config);

        if let Some(region) = config.region {
            builder = builder.region(aws_sdk_dynamodb::config::Region::new(region));
        }

        if let Some(endpoint) = config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        if let Some(timeout_ms) = config.timeout_ms {
            let timeout_config = TimeoutConfig::builder()
                .operation_timeout(Duration::from_millis(timeout_ms))
                .build();
            builder = builder.timeout_config(timeout_config);
        }

        Self {
            client: Client::from_conf(builder.build()),
        }
    }

    /// Build a store from the default AWS credential and region chain
    pub async fn from_env(config: DynamoDbStoreConfig) -> Self {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(&sdk_config, config)
    }

    /// Wrap a pre-built client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn to_attribute_value(value: BoundValue) -> AttributeValue {
    match value {
        BoundValue::S(s) => AttributeValue::S(s),
        BoundValue::N(n) => AttributeValue::N(n.to_string()),
    }
}

fn store_error(operation: &str, err: impl std::error::Error) -> DynalockError {
    DynalockError::store(format!(
        "DynamoDB {operation} failed: {}",
        DisplayErrorContext(err)
    ))
}

#[async_trait]
impl LockStore for DynamoDbLockStore {
    async fn put_conditional(
        &self,
        table: &str,
        item: &LockItem,
        condition: &WriteCondition,
    ) -> Result<PutOutcome> {
        let expression = condition.to_expression();

        let mut request = self
            .client
            .put_item()
            .table_name(table)
            .item(ATTR_LOCK_NAME, AttributeValue::S(item.lock_name.clone()))
            .item(
                ATTR_HOLDER_IDENTIFIER,
                AttributeValue::S(item.holder_identifier.clone()),
            )
            .item(
                ATTR_EXPIRATION_TIME,
                AttributeValue::N(item.expiration_epoch.to_string()),
            )
            .condition_expression(expression.expression);

        for (placeholder, attribute) in expression.names {
            request = request.expression_attribute_names(placeholder, attribute);
        }
        for (placeholder, value) in expression.values {
            request = request.expression_attribute_values(placeholder, to_attribute_value(value));
        }

        match request.send().await {
            Ok(_) => Ok(PutOutcome::Written),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception()) =>
            {
                debug!(table = %table, key = %item.lock_name, "DynamoDB conditional check failed");
                Ok(PutOutcome::ConditionFailed)
            }
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_resource_not_found_exception()) =>
            {
                Err(DynalockError::TableNotFound(table.to_string()))
            }
            Err(e) => Err(store_error("PutItem", e)),
        }
    }

    async fn describe_table(&self, table: &str) -> Result<Option<TableDescription>> {
        let response = match self.client.describe_table().table_name(table).send().await {
            Ok(response) => response,
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_resource_not_found_exception()) =>
            {
                return Ok(None);
            }
            Err(e) => return Err(store_error("DescribeTable", e)),
        };

        let Some(description) = response.table() else {
            return Ok(None);
        };

        let partition_key = description
            .key_schema()
            .iter()
            .find(|element| *element.key_type() == KeyType::Hash)
            .map(|element| element.attribute_name().to_string());

        let status = match description.table_status() {
            Some(DynamoTableStatus::Active) => TableStatus::Active,
            Some(DynamoTableStatus::Creating) => TableStatus::Creating,
            Some(DynamoTableStatus::Updating) => TableStatus::Updating,
            Some(DynamoTableStatus::Deleting) => TableStatus::Deleting,
            _ => TableStatus::Unknown,
        };

        Ok(Some(TableDescription {
            table_name: description.table_name().unwrap_or(table).to_string(),
            partition_key,
            status,
        }))
    }

    async fn create_table(&self, spec: &TableSpec) -> Result<()> {
        let attribute = AttributeDefinition::builder()
            .attribute_name(&spec.partition_key)
            .attribute_type(ScalarAttributeType::S)
            .build()
            .context("build attribute definition")
            .map_err(|e| DynalockError::InvalidArgument(format!("{e:#}")))?;
        let key = KeySchemaElement::builder()
            .attribute_name(&spec.partition_key)
            .key_type(KeyType::Hash)
            .build()
            .context("build key schema")
            .map_err(|e| DynalockError::InvalidArgument(format!("{e:#}")))?;

        let result = self
            .client
            .create_table()
            .table_name(&spec.table_name)
            .attribute_definitions(attribute)
            .key_schema(key)
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await;

        match result {
            Ok(_) => {
                info!(table = %spec.table_name, "Created DynamoDB lock table");
                Ok(())
            }
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_resource_in_use_exception()) =>
            {
                // Another caller created it first
                debug!(table = %spec.table_name, "DynamoDB lock table already exists");
                Ok(())
            }
            Err(e) => Err(store_error("CreateTable", e)),
        }
    }

    async fn describe_ttl(&self, table: &str) -> Result<TtlDescription> {
        let response = match self
            .client
            .describe_time_to_live()
            .table_name(table)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_resource_not_found_exception()) =>
            {
                return Err(DynalockError::TableNotFound(table.to_string()));
            }
            Err(e) => return Err(store_error("DescribeTimeToLive", e)),
        };

        let Some(description) = response.time_to_live_description() else {
            return Ok(TtlDescription::disabled());
        };

        let status = match description.time_to_live_status() {
            Some(TimeToLiveStatus::Enabled) => TtlStatus::Enabled,
            Some(TimeToLiveStatus::Enabling) => TtlStatus::Enabling,
            Some(TimeToLiveStatus::Disabling) => TtlStatus::Disabling,
            _ => TtlStatus::Disabled,
        };

        Ok(TtlDescription {
            status,
            attribute_name: description.attribute_name().map(str::to_string),
        })
    }

    async fn update_ttl(&self, table: &str, attribute: &str, enabled: bool) -> Result<()> {
        let specification = TimeToLiveSpecification::builder()
            .attribute_name(attribute)
            .enabled(enabled)
            .build()
            .context("build time to live specification")
            .map_err(|e| DynalockError::InvalidArgument(format!("{e:#}")))?;

        self.client
            .update_time_to_live()
            .table_name(table)
            .time_to_live_specification(specification)
            .send()
            .await
            .map_err(|e| store_error("UpdateTimeToLive", e))?;

        info!(table = %table, attribute = %attribute, enabled, "Updated DynamoDB TTL");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "dynamodb"
    }
}
