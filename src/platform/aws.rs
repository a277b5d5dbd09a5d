// ABOUTME: AWS-backed platform: Lambda for functions and event sources, EventBridge for schedules.
// ABOUTME: Retries and per-operation timeouts come from the SDK's standard retry mode.

use super::context::{Credentials, RegionContext};
use super::error::{
    ConnectError, InvalidProxySnafu, MissingCredentialsSnafu, Operation, PlatformError,
};
use super::traits::{Connector, EventSourceOps, FunctionOps, ScheduleOps, sealed::Sealed};
use crate::config::VpcConfig;
use crate::deploy::DeploymentDescriptor;
use crate::desired::{DEFAULT_BATCH_SIZE, EventSourceBinding, ScheduleBinding};
use crate::types::{FunctionArn, FunctionName, MappingId, Region, RuleArn};
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_eventbridge::types::{RuleState, Target};
use aws_sdk_lambda::config::{ProvideCredentials, SharedHttpClient};
use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{
    DeadLetterConfig, Environment, EventSourcePosition, FunctionCode, LastUpdateStatus, Runtime,
    TracingConfig, TracingMode as SdkTracingMode, VpcConfig as SdkVpcConfig,
};
use aws_smithy_http_client::proxy::ProxyConfig;
use aws_smithy_http_client::tls::{self, rustls_provider::CryptoMode};
use aws_smithy_http_client::{Builder as HttpClientBuilder, Connector as HttpConnector};
use std::time::{Duration, Instant};

const PROVIDER_NAME: &str = "lambdeploy";
const UPDATE_POLL_INTERVAL: Duration = Duration::from_secs(1);

fn api_error(operation: Operation, err: impl std::error::Error) -> PlatformError {
    PlatformError::api(operation, DisplayErrorContext(err).to_string())
}

fn incomplete(operation: Operation, field: &'static str) -> PlatformError {
    PlatformError::IncompleteResponse { operation, field }
}

/// Builds one Lambda and one EventBridge client per region.
#[derive(Debug, Clone, Default)]
pub struct AwsConnector;

impl AwsConnector {
    pub fn new() -> Self {
        Self
    }

    async fn load_config(context: &RegionContext) -> Result<SdkConfig, ConnectError> {
        let settings = context.settings();
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(context.region().to_string()))
            .retry_config(RetryConfig::standard().with_max_attempts(settings.max_attempts))
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(settings.operation_timeout)
                    .build(),
            );

        if let Some(proxy) = &settings.proxy {
            tracing::debug!(region = %context.region(), "Routing requests through {}", proxy);
            loader = loader.http_client(proxied_http_client(context.region(), proxy)?);
        }

        match context.credentials() {
            Credentials::Default => {}
            Credentials::Profile(name) => {
                loader = loader.profile_name(name);
            }
            Credentials::Static {
                access_key_id,
                secret_access_key,
                session_token,
            } => {
                loader = loader.credentials_provider(aws_sdk_lambda::config::Credentials::new(
                    access_key_id,
                    secret_access_key,
                    session_token.clone(),
                    None,
                    PROVIDER_NAME,
                ));
            }
        }

        Ok(loader.load().await)
    }
}

/// HTTPS client sending every request through `proxy`.
fn proxied_http_client(region: &Region, proxy: &str) -> Result<SharedHttpClient, ConnectError> {
    let proxy_config = ProxyConfig::all(proxy).map_err(|e| {
        InvalidProxySnafu {
            region: region.clone(),
            proxy,
            message: e.to_string(),
        }
        .build()
    })?;

    Ok(
        HttpClientBuilder::new().build_with_connector_fn(move |settings, components| {
            let mut connector = HttpConnector::builder().proxy_config(proxy_config.clone());
            connector.set_connector_settings(settings.cloned());
            if let Some(components) = components {
                connector.set_sleep_impl(components.sleep_impl());
            }
            connector
                .tls_provider(tls::Provider::Rustls(CryptoMode::AwsLc))
                .build()
        }),
    )
}

#[async_trait]
impl Connector for AwsConnector {
    type Platform = AwsPlatform;

    /// Credentials are resolved here so a region without any fails before
    /// its first platform call.
    async fn connect(&self, context: &RegionContext) -> Result<Self::Platform, ConnectError> {
        let config = Self::load_config(context).await?;

        let Some(provider) = config.credentials_provider() else {
            return MissingCredentialsSnafu {
                region: context.region().clone(),
                message: "no credentials provider configured",
            }
            .fail();
        };
        if let Err(e) = provider.provide_credentials().await {
            return MissingCredentialsSnafu {
                region: context.region().clone(),
                message: DisplayErrorContext(e).to_string(),
            }
            .fail();
        }

        tracing::debug!(region = %context.region(), "Platform clients ready");
        Ok(AwsPlatform {
            lambda: aws_sdk_lambda::Client::new(&config),
            events: aws_sdk_eventbridge::Client::new(&config),
            update_timeout: context.settings().operation_timeout,
        })
    }
}

/// Platform client bound to one region.
#[derive(Debug, Clone)]
pub struct AwsPlatform {
    lambda: aws_sdk_lambda::Client,
    events: aws_sdk_eventbridge::Client,
    update_timeout: Duration,
}

impl Sealed for AwsPlatform {}

impl AwsPlatform {
    /// Block until a code update has settled; the platform rejects a
    /// configuration update while one is in progress.
    async fn wait_until_updated(&self, name: &str) -> Result<(), PlatformError> {
        let started = Instant::now();
        loop {
            let config = self
                .lambda
                .get_function_configuration()
                .function_name(name)
                .send()
                .await
                .map_err(|e| api_error(Operation::UpdateFunctionCode, e))?;

            match config.last_update_status() {
                Some(LastUpdateStatus::InProgress) => {}
                Some(LastUpdateStatus::Failed) => {
                    return Err(PlatformError::api(
                        Operation::UpdateFunctionCode,
                        config
                            .last_update_status_reason()
                            .unwrap_or("code update failed")
                            .to_string(),
                    ));
                }
                _ => return Ok(()),
            }

            if started.elapsed() >= self.update_timeout {
                return Err(PlatformError::api(
                    Operation::UpdateFunctionCode,
                    format!("{name} still updating after {:?}", self.update_timeout),
                ));
            }
            tokio::time::sleep(UPDATE_POLL_INTERVAL).await;
        }
    }
}

fn environment(descriptor: &DeploymentDescriptor) -> Environment {
    Environment::builder()
        .set_variables(Some(descriptor.environment.clone().into_iter().collect()))
        .build()
}

fn vpc_config(vpc: &VpcConfig) -> SdkVpcConfig {
    SdkVpcConfig::builder()
        .set_subnet_ids(Some(vpc.subnets.clone()))
        .set_security_group_ids(Some(vpc.security_groups.clone()))
        .build()
}

fn dead_letter_config(target: &str) -> DeadLetterConfig {
    DeadLetterConfig::builder().target_arn(target).build()
}

fn tracing_config(descriptor: &DeploymentDescriptor) -> Option<TracingConfig> {
    descriptor.tracing.map(|mode| {
        TracingConfig::builder()
            .mode(SdkTracingMode::from(mode.as_str()))
            .build()
    })
}

fn artifact_blob(descriptor: &DeploymentDescriptor) -> Blob {
    Blob::new(descriptor.artifact.to_vec())
}

#[async_trait]
impl FunctionOps for AwsPlatform {
    async fn get_function(
        &self,
        name: &FunctionName,
    ) -> Result<Option<FunctionArn>, PlatformError> {
        let response = self
            .lambda
            .get_function()
            .function_name(name.as_str())
            .send()
            .await;

        match response {
            Ok(output) => {
                let arn = output
                    .configuration()
                    .and_then(|c| c.function_arn())
                    .ok_or_else(|| incomplete(Operation::GetFunction, "function_arn"))?;
                Ok(Some(FunctionArn::new(arn)))
            }
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception()) =>
            {
                Ok(None)
            }
            Err(err) => Err(api_error(Operation::GetFunction, err)),
        }
    }

    async fn create_function(
        &self,
        descriptor: &DeploymentDescriptor,
    ) -> Result<FunctionArn, PlatformError> {
        let code = FunctionCode::builder()
            .zip_file(artifact_blob(descriptor))
            .build();

        let output = self
            .lambda
            .create_function()
            .function_name(descriptor.function_name.as_str())
            .runtime(Runtime::from(descriptor.runtime.as_str()))
            .handler(&descriptor.handler)
            .role(&descriptor.role)
            .memory_size(descriptor.memory_size as i32)
            .timeout(descriptor.timeout_secs as i32)
            .description(&descriptor.description)
            .publish(descriptor.publish)
            .code(code)
            .environment(environment(descriptor))
            .set_vpc_config(descriptor.vpc.as_ref().map(vpc_config))
            .set_dead_letter_config(descriptor.dead_letter_target.as_deref().map(dead_letter_config))
            .set_tracing_config(tracing_config(descriptor))
            .send()
            .await
            .map_err(|e| api_error(Operation::CreateFunction, e))?;

        let arn = output
            .function_arn()
            .ok_or_else(|| incomplete(Operation::CreateFunction, "function_arn"))?;
        Ok(FunctionArn::new(arn))
    }

    async fn update_function_code(
        &self,
        descriptor: &DeploymentDescriptor,
    ) -> Result<(), PlatformError> {
        let name = descriptor.function_name.as_str();
        self.lambda
            .update_function_code()
            .function_name(name)
            .zip_file(artifact_blob(descriptor))
            .publish(descriptor.publish)
            .send()
            .await
            .map_err(|e| api_error(Operation::UpdateFunctionCode, e))?;

        self.wait_until_updated(name).await
    }

    async fn update_function_configuration(
        &self,
        descriptor: &DeploymentDescriptor,
    ) -> Result<(), PlatformError> {
        self.lambda
            .update_function_configuration()
            .function_name(descriptor.function_name.as_str())
            .runtime(Runtime::from(descriptor.runtime.as_str()))
            .handler(&descriptor.handler)
            .role(&descriptor.role)
            .memory_size(descriptor.memory_size as i32)
            .timeout(descriptor.timeout_secs as i32)
            .description(&descriptor.description)
            .environment(environment(descriptor))
            .set_vpc_config(descriptor.vpc.as_ref().map(vpc_config))
            .set_dead_letter_config(descriptor.dead_letter_target.as_deref().map(dead_letter_config))
            .set_tracing_config(tracing_config(descriptor))
            .send()
            .await
            .map_err(|e| api_error(Operation::UpdateFunctionConfiguration, e))?;
        Ok(())
    }
}

/// Queues do not take a starting position.
fn is_queue(source_arn: &str) -> bool {
    source_arn.split(':').nth(2) == Some("sqs")
}

fn starting_position(binding: &EventSourceBinding) -> Option<EventSourcePosition> {
    if is_queue(&binding.source_arn) {
        return None;
    }
    binding
        .starting_position
        .map(|p| EventSourcePosition::from(p.as_str()))
}

#[async_trait]
impl EventSourceOps for AwsPlatform {
    async fn list_event_sources(
        &self,
        function: &FunctionName,
    ) -> Result<Vec<EventSourceBinding>, PlatformError> {
        let mut bindings = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let page = self
                .lambda
                .list_event_source_mappings()
                .function_name(function.as_str())
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| api_error(Operation::ListEventSources, e))?;

            for mapping in page.event_source_mappings() {
                let (Some(id), Some(source_arn)) = (mapping.uuid(), mapping.event_source_arn())
                else {
                    tracing::debug!("Skipping event source mapping without id or source");
                    continue;
                };

                bindings.push(EventSourceBinding {
                    source_arn: source_arn.to_string(),
                    enabled: matches!(mapping.state(), Some("Enabled" | "Enabling" | "Creating")),
                    batch_size: mapping
                        .batch_size()
                        .and_then(|n| u32::try_from(n).ok())
                        .unwrap_or(DEFAULT_BATCH_SIZE),
                    starting_position: mapping
                        .starting_position()
                        .and_then(|p| p.as_str().parse().ok()),
                    remote_id: Some(MappingId::new(id)),
                });
            }

            match page.next_marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(bindings)
    }

    async fn create_event_source(
        &self,
        function: &FunctionName,
        binding: &EventSourceBinding,
    ) -> Result<MappingId, PlatformError> {
        tracing::debug!("Creating event source {}", binding.source_arn);
        let output = self
            .lambda
            .create_event_source_mapping()
            .function_name(function.as_str())
            .event_source_arn(&binding.source_arn)
            .enabled(binding.enabled)
            .batch_size(binding.batch_size as i32)
            .set_starting_position(starting_position(binding))
            .send()
            .await
            .map_err(|e| api_error(Operation::CreateEventSource, e))?;

        let id = output
            .uuid()
            .ok_or_else(|| incomplete(Operation::CreateEventSource, "uuid"))?;
        Ok(MappingId::new(id))
    }

    async fn update_event_source(
        &self,
        function: &FunctionName,
        binding: &EventSourceBinding,
        id: &MappingId,
    ) -> Result<(), PlatformError> {
        tracing::debug!("Updating event source {} ({})", binding.source_arn, id);
        self.lambda
            .update_event_source_mapping()
            .uuid(id.as_str())
            .function_name(function.as_str())
            .enabled(binding.enabled)
            .batch_size(binding.batch_size as i32)
            .send()
            .await
            .map_err(|e| api_error(Operation::UpdateEventSource, e))?;
        Ok(())
    }

    async fn delete_event_source(&self, id: &MappingId) -> Result<(), PlatformError> {
        tracing::debug!("Deleting event source mapping {}", id);
        self.lambda
            .delete_event_source_mapping()
            .uuid(id.as_str())
            .send()
            .await
            .map_err(|e| api_error(Operation::DeleteEventSource, e))?;
        Ok(())
    }
}

/// Permission statement ids only allow letters, digits, '-' and '_'.
fn statement_id(rule_name: &str) -> String {
    let sanitized: String = rule_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '-' })
        .collect();
    format!("{PROVIDER_NAME}-{sanitized}")
}

#[async_trait]
impl ScheduleOps for AwsPlatform {
    async fn upsert_schedule(
        &self,
        function: &FunctionArn,
        schedule: &ScheduleBinding,
    ) -> Result<RuleArn, PlatformError> {
        let state = if schedule.enabled {
            RuleState::Enabled
        } else {
            RuleState::Disabled
        };

        let rule = self
            .events
            .put_rule()
            .name(&schedule.rule_name)
            .schedule_expression(&schedule.schedule_expression)
            .state(state)
            .set_description(schedule.description.clone())
            .send()
            .await
            .map_err(|e| api_error(Operation::UpsertSchedule, e))?;
        let rule_arn = rule
            .rule_arn()
            .ok_or_else(|| incomplete(Operation::UpsertSchedule, "rule_arn"))?;

        let permission = self
            .lambda
            .add_permission()
            .function_name(function.as_str())
            .statement_id(statement_id(&schedule.rule_name))
            .action("lambda:InvokeFunction")
            .principal("events.amazonaws.com")
            .source_arn(rule_arn)
            .send()
            .await;
        match permission {
            Ok(_) => {}
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_conflict_exception()) =>
            {
                tracing::debug!("Invoke permission for {} already present", schedule.rule_name);
            }
            Err(err) => return Err(api_error(Operation::UpsertSchedule, err)),
        }

        let target = Target::builder()
            .id(PROVIDER_NAME)
            .arn(function.as_str())
            .set_input(schedule.target_input.clone())
            .build()
            .map_err(|e| PlatformError::InvalidRequest {
                operation: Operation::UpsertSchedule,
                message: e.to_string(),
            })?;

        let targets = self
            .events
            .put_targets()
            .rule(&schedule.rule_name)
            .targets(target)
            .send()
            .await
            .map_err(|e| api_error(Operation::UpsertSchedule, e))?;

        if let Some(failed) = targets.failed_entries().first() {
            return Err(PlatformError::api(
                Operation::UpsertSchedule,
                failed
                    .error_message()
                    .unwrap_or("target was rejected")
                    .to_string(),
            ));
        }

        Ok(RuleArn::new(rule_arn))
    }
}
