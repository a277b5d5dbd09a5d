// ABOUTME: Deterministic in-process platform used by tests and dry runs.
// ABOUTME: Records every call and fails chosen operations on request.

use super::context::RegionContext;
use super::error::{ConnectError, Operation, PlatformError, UnreachableSnafu};
use super::traits::{Connector, EventSourceOps, FunctionOps, ScheduleOps, sealed::Sealed};
use crate::deploy::DeploymentDescriptor;
use crate::desired::{EventSourceBinding, ScheduleBinding};
use crate::types::{FunctionArn, FunctionName, MappingId, Region, RuleArn};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

const ACCOUNT_ID: &str = "000000000000";

/// A recorded remote call: the operation and the name, ARN or id it addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub operation: Operation,
    pub key: String,
}

/// Function as stored by the in-memory platform.
#[derive(Debug, Clone)]
pub struct StoredFunction {
    pub arn: FunctionArn,
    pub code_size: usize,
    pub memory_size: u32,
    pub timeout_secs: u32,
    pub environment: BTreeMap<String, String>,
    pub code_updates: u32,
    pub configuration_updates: u32,
}

#[derive(Debug, Clone)]
struct StoredMapping {
    function: String,
    binding: EventSourceBinding,
}

#[derive(Debug, Clone)]
struct StoredRule {
    arn: RuleArn,
    binding: ScheduleBinding,
    target: FunctionArn,
}

#[derive(Debug, Default)]
struct RemoteState {
    functions: BTreeMap<String, StoredFunction>,
    mappings: Vec<(MappingId, StoredMapping)>,
    rules: Vec<StoredRule>,
    failures: HashSet<(Operation, Option<String>)>,
    calls: Vec<Call>,
    next_id: u64,
}

impl RemoteState {
    fn record(&mut self, operation: Operation, key: &str) -> Result<(), PlatformError> {
        self.calls.push(Call {
            operation,
            key: key.to_string(),
        });

        let fails = self.failures.contains(&(operation, None))
            || self.failures.contains(&(operation, Some(key.to_string())));
        if fails {
            return Err(PlatformError::api(operation, format!("injected failure for {key}")));
        }
        Ok(())
    }

    fn next_mapping_id(&mut self) -> MappingId {
        self.next_id += 1;
        MappingId::new(format!("mapping-{}", self.next_id))
    }
}

/// One region of the platform, held entirely in memory.
///
/// Clones share state, so a test can keep a handle while the reconciler
/// drives another.
#[derive(Debug, Clone)]
pub struct InMemoryPlatform {
    region: Region,
    state: Arc<Mutex<RemoteState>>,
}

impl InMemoryPlatform {
    pub fn new(region: Region) -> Self {
        Self {
            region,
            state: Arc::new(Mutex::new(RemoteState::default())),
        }
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Fail every call to `operation`.
    pub fn fail_on(&self, operation: Operation) {
        self.state.lock().failures.insert((operation, None));
    }

    /// Fail calls to `operation` addressing `key` (function name, source ARN,
    /// mapping id or rule name).
    pub fn fail_on_key(&self, operation: Operation, key: impl Into<String>) {
        self.state
            .lock()
            .failures
            .insert((operation, Some(key.into())));
    }

    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    /// Keys addressed by calls to `operation`, in order.
    pub fn calls_for(&self, operation: Operation) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .map(|c| c.key.clone())
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Register an existing function without recording a call.
    pub fn seed_function(&self, name: &FunctionName) -> FunctionArn {
        let arn = self.function_arn(name);
        self.state.lock().functions.insert(
            name.to_string(),
            StoredFunction {
                arn: arn.clone(),
                code_size: 0,
                memory_size: 128,
                timeout_secs: 3,
                environment: BTreeMap::new(),
                code_updates: 0,
                configuration_updates: 0,
            },
        );
        arn
    }

    /// Attach an existing binding with a chosen id without recording a call.
    pub fn seed_event_source(
        &self,
        function: &FunctionName,
        binding: EventSourceBinding,
        id: impl Into<String>,
    ) -> MappingId {
        let id = MappingId::new(id);
        self.state.lock().mappings.push((
            id.clone(),
            StoredMapping {
                function: function.to_string(),
                binding: binding.with_remote_id(id.clone()),
            },
        ));
        id
    }

    pub fn function(&self, name: &FunctionName) -> Option<StoredFunction> {
        self.state.lock().functions.get(name.as_str()).cloned()
    }

    /// Bindings currently attached to `function`, in attachment order.
    pub fn event_sources(&self, function: &FunctionName) -> Vec<EventSourceBinding> {
        self.state
            .lock()
            .mappings
            .iter()
            .filter(|(_, m)| m.function == function.as_str())
            .map(|(_, m)| m.binding.clone())
            .collect()
    }

    /// Rule names in creation order.
    pub fn schedule_names(&self) -> Vec<String> {
        self.state
            .lock()
            .rules
            .iter()
            .map(|r| r.binding.rule_name.clone())
            .collect()
    }

    /// Rule with its target function, if present.
    pub fn schedule(&self, rule_name: &str) -> Option<(ScheduleBinding, FunctionArn)> {
        self.state
            .lock()
            .rules
            .iter()
            .find(|r| r.binding.rule_name == rule_name)
            .map(|r| (r.binding.clone(), r.target.clone()))
    }

    fn function_arn(&self, name: &FunctionName) -> FunctionArn {
        FunctionArn::new(format!(
            "arn:aws:lambda:{}:{ACCOUNT_ID}:function:{name}",
            self.region
        ))
    }

    fn rule_arn(&self, rule_name: &str) -> RuleArn {
        RuleArn::new(format!(
            "arn:aws:events:{}:{ACCOUNT_ID}:rule/{rule_name}",
            self.region
        ))
    }
}

impl Sealed for InMemoryPlatform {}

#[async_trait]
impl FunctionOps for InMemoryPlatform {
    async fn get_function(
        &self,
        name: &FunctionName,
    ) -> Result<Option<FunctionArn>, PlatformError> {
        let mut state = self.state.lock();
        state.record(Operation::GetFunction, name.as_str())?;
        Ok(state.functions.get(name.as_str()).map(|f| f.arn.clone()))
    }

    async fn create_function(
        &self,
        descriptor: &DeploymentDescriptor,
    ) -> Result<FunctionArn, PlatformError> {
        let name = &descriptor.function_name;
        let arn = self.function_arn(name);
        let mut state = self.state.lock();
        state.record(Operation::CreateFunction, name.as_str())?;

        if state.functions.contains_key(name.as_str()) {
            return Err(PlatformError::InvalidRequest {
                operation: Operation::CreateFunction,
                message: format!("function {name} already exists"),
            });
        }

        state.functions.insert(
            name.to_string(),
            StoredFunction {
                arn: arn.clone(),
                code_size: descriptor.artifact.len(),
                memory_size: descriptor.memory_size,
                timeout_secs: descriptor.timeout_secs,
                environment: descriptor.environment.clone(),
                code_updates: 0,
                configuration_updates: 0,
            },
        );
        Ok(arn)
    }

    async fn update_function_code(
        &self,
        descriptor: &DeploymentDescriptor,
    ) -> Result<(), PlatformError> {
        let name = descriptor.function_name.as_str();
        let mut state = self.state.lock();
        state.record(Operation::UpdateFunctionCode, name)?;

        let function = state.functions.get_mut(name).ok_or_else(|| {
            PlatformError::api(Operation::UpdateFunctionCode, format!("{name} not found"))
        })?;
        function.code_size = descriptor.artifact.len();
        function.code_updates += 1;
        Ok(())
    }

    async fn update_function_configuration(
        &self,
        descriptor: &DeploymentDescriptor,
    ) -> Result<(), PlatformError> {
        let name = descriptor.function_name.as_str();
        let mut state = self.state.lock();
        state.record(Operation::UpdateFunctionConfiguration, name)?;

        let function = state.functions.get_mut(name).ok_or_else(|| {
            PlatformError::api(
                Operation::UpdateFunctionConfiguration,
                format!("{name} not found"),
            )
        })?;
        function.memory_size = descriptor.memory_size;
        function.timeout_secs = descriptor.timeout_secs;
        function.environment = descriptor.environment.clone();
        function.configuration_updates += 1;
        Ok(())
    }
}

#[async_trait]
impl EventSourceOps for InMemoryPlatform {
    async fn list_event_sources(
        &self,
        function: &FunctionName,
    ) -> Result<Vec<EventSourceBinding>, PlatformError> {
        let mut state = self.state.lock();
        state.record(Operation::ListEventSources, function.as_str())?;

        Ok(state
            .mappings
            .iter()
            .filter(|(_, m)| m.function == function.as_str())
            .map(|(_, m)| m.binding.clone())
            .collect())
    }

    async fn create_event_source(
        &self,
        function: &FunctionName,
        binding: &EventSourceBinding,
    ) -> Result<MappingId, PlatformError> {
        let mut state = self.state.lock();
        state.record(Operation::CreateEventSource, &binding.source_arn)?;

        let duplicate = state
            .mappings
            .iter()
            .any(|(_, m)| m.function == function.as_str() && m.binding.source_arn == binding.source_arn);
        if duplicate {
            return Err(PlatformError::InvalidRequest {
                operation: Operation::CreateEventSource,
                message: format!("{} is already mapped to {function}", binding.source_arn),
            });
        }

        let id = state.next_mapping_id();
        state.mappings.push((
            id.clone(),
            StoredMapping {
                function: function.to_string(),
                binding: binding.clone().with_remote_id(id.clone()),
            },
        ));
        Ok(id)
    }

    async fn update_event_source(
        &self,
        function: &FunctionName,
        binding: &EventSourceBinding,
        id: &MappingId,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        state.record(Operation::UpdateEventSource, &binding.source_arn)?;

        let (_, mapping) = state
            .mappings
            .iter_mut()
            .find(|(existing, _)| existing == id)
            .ok_or_else(|| {
                PlatformError::api(Operation::UpdateEventSource, format!("mapping {id} not found"))
            })?;

        mapping.function = function.to_string();
        mapping.binding = EventSourceBinding {
            // The starting position cannot change once a mapping exists.
            starting_position: mapping.binding.starting_position,
            ..binding.clone().with_remote_id(id.clone())
        };
        Ok(())
    }

    async fn delete_event_source(&self, id: &MappingId) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        state.record(Operation::DeleteEventSource, id.as_str())?;

        let before = state.mappings.len();
        state.mappings.retain(|(existing, _)| existing != id);
        if state.mappings.len() == before {
            return Err(PlatformError::api(
                Operation::DeleteEventSource,
                format!("mapping {id} not found"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ScheduleOps for InMemoryPlatform {
    async fn upsert_schedule(
        &self,
        function: &FunctionArn,
        schedule: &ScheduleBinding,
    ) -> Result<RuleArn, PlatformError> {
        let arn = self.rule_arn(&schedule.rule_name);
        let mut state = self.state.lock();
        state.record(Operation::UpsertSchedule, &schedule.rule_name)?;

        let rule = StoredRule {
            arn: arn.clone(),
            binding: schedule.clone(),
            target: function.clone(),
        };
        match state
            .rules
            .iter_mut()
            .find(|r| r.binding.rule_name == schedule.rule_name)
        {
            Some(existing) => *existing = rule,
            None => state.rules.push(rule),
        }
        Ok(arn)
    }
}

/// Hands out one shared [`InMemoryPlatform`] per region.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConnector {
    platforms: Arc<Mutex<HashMap<Region, InMemoryPlatform>>>,
    unreachable: Arc<Mutex<HashSet<Region>>>,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The platform for `region`, created empty on first use.
    pub fn platform(&self, region: &Region) -> InMemoryPlatform {
        self.platforms
            .lock()
            .entry(region.clone())
            .or_insert_with(|| InMemoryPlatform::new(region.clone()))
            .clone()
    }

    /// Make `connect` fail for `region`.
    pub fn set_unreachable(&self, region: &Region) {
        self.unreachable.lock().insert(region.clone());
    }
}

#[async_trait]
impl Connector for InMemoryConnector {
    type Platform = InMemoryPlatform;

    async fn connect(&self, context: &RegionContext) -> Result<Self::Platform, ConnectError> {
        let region = context.region();
        if self.unreachable.lock().contains(region) {
            return UnreachableSnafu {
                region: region.clone(),
                message: "region marked unreachable",
            }
            .fail();
        }
        Ok(self.platform(region))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{ClientSettings, Credentials};

    fn region() -> Region {
        Region::new("us-east-1").unwrap()
    }

    fn name() -> FunctionName {
        FunctionName::new("api").unwrap()
    }

    #[tokio::test]
    async fn seeded_function_is_found() {
        let platform = InMemoryPlatform::new(region());
        let arn = platform.seed_function(&name());

        assert_eq!(platform.get_function(&name()).await.unwrap(), Some(arn));
        assert_eq!(platform.calls_for(Operation::GetFunction), ["api"]);
    }

    #[tokio::test]
    async fn injected_failure_targets_one_key() {
        let platform = InMemoryPlatform::new(region());
        platform.fail_on_key(Operation::CreateEventSource, "arn:b");

        let ok = platform
            .create_event_source(&name(), &EventSourceBinding::new("arn:a"))
            .await;
        let failed = platform
            .create_event_source(&name(), &EventSourceBinding::new("arn:b"))
            .await;

        assert!(ok.is_ok());
        assert!(failed.is_err());
        assert_eq!(platform.event_sources(&name()).len(), 1);
    }

    #[tokio::test]
    async fn upsert_replaces_rule_with_same_name() {
        let platform = InMemoryPlatform::new(region());
        let function = platform.seed_function(&name());

        platform
            .upsert_schedule(&function, &ScheduleBinding::new("nightly", "rate(1 day)"))
            .await
            .unwrap();
        platform
            .upsert_schedule(&function, &ScheduleBinding::new("nightly", "rate(2 days)"))
            .await
            .unwrap();

        assert_eq!(platform.schedule_names(), ["nightly"]);
        let (rule, target) = platform.schedule("nightly").unwrap();
        assert_eq!(rule.schedule_expression, "rate(2 days)");
        assert_eq!(target, function);
    }

    #[tokio::test]
    async fn connector_shares_platform_per_region() {
        let connector = InMemoryConnector::new();
        let context = RegionContext::new(region(), Credentials::Default, ClientSettings::default());

        let connected = connector.connect(&context).await.unwrap();
        connected.seed_function(&name());

        assert!(connector.platform(&region()).function(&name()).is_some());
    }

    #[tokio::test]
    async fn unreachable_region_fails_to_connect() {
        let connector = InMemoryConnector::new();
        connector.set_unreachable(&region());
        let context = RegionContext::new(region(), Credentials::Default, ClientSettings::default());

        let err = connector.connect(&context).await.unwrap_err();
        assert_eq!(err.region(), &region());
    }
}
