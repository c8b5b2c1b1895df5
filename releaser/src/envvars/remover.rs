//! Environment variable filter and remover
//!
//! Finds the definitions of one variable whose value passes a [`ValueFilter`]
//! and deletes them. All lookups and checks finish before the first delete.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use fleet_api_client::models::{Device, EnvironmentVariable};

use crate::backend::FleetBackend;
use crate::envvars::scope::{EnvVarOwner, EnvVarScope};
use crate::errors::ReleaserError;
use crate::release::outcome::RolloutResult;
use crate::utils::short_uuid;

/// Value predicate: a variable matches when `(value ∈ values) == inclusive`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueFilter {
    pub values: BTreeSet<String>,
    pub inclusive: bool,
}

impl ValueFilter {
    pub fn new<I, S>(values: I, inclusive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            inclusive,
        }
    }

    /// Parse a comma separated value list
    pub fn from_list(list: &str, inclusive: bool) -> Self {
        Self::new(
            list.split(',').map(str::trim).filter(|v| !v.is_empty()),
            inclusive,
        )
    }

    pub fn matches(&self, value: &str) -> bool {
        self.values.contains(value) == self.inclusive
    }
}

/// Definitions selected for removal
#[derive(Debug, Clone, PartialEq)]
pub enum Matches {
    /// The single fleet-wide definition
    Fleet(EnvironmentVariable),

    /// One definition per matching device
    Devices(Vec<(Device, EnvironmentVariable)>),
}

/// Outcome of removing a fleet-wide definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FleetRemoval {
    Success,
    Failed(String),
}

impl fmt::Display for FleetRemoval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FleetRemoval::Success => f.write_str("Success"),
            FleetRemoval::Failed(cause) => write!(f, "Failed: {}", cause),
        }
    }
}

/// Outcome of a removal, by scope level
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    Fleet(FleetRemoval),
    Devices(RolloutResult),
}

impl fmt::Display for RemovalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemovalOutcome::Fleet(removal) => fmt::Display::fmt(removal, f),
            RemovalOutcome::Devices(result) => fmt::Display::fmt(result, f),
        }
    }
}

/// Environment variable remover for one application
pub struct EnvVarRemover {
    backend: Arc<dyn FleetBackend>,
    app_id: u64,
}

impl EnvVarRemover {
    pub fn new(backend: Arc<dyn FleetBackend>, app_id: u64) -> Self {
        Self { backend, app_id }
    }

    /// Locate the definitions of `name` in `scope` whose value passes `filter`
    pub async fn find_matching(
        &self,
        scope: &EnvVarScope,
        name: &str,
        filter: &ValueFilter,
    ) -> Result<Matches, ReleaserError> {
        let service_id = match scope.service() {
            Some(service) => Some(self.resolve_service(service).await?),
            None => None,
        };

        match scope {
            EnvVarScope::Application | EnvVarScope::Service { .. } => {
                let owner = match service_id {
                    Some(service_id) => EnvVarOwner::Service { service_id },
                    None => EnvVarOwner::Application {
                        app_id: self.app_id,
                    },
                };
                let var = self
                    .backend
                    .get_env_vars(owner)
                    .await?
                    .into_iter()
                    .find(|var| var.name == name)
                    .ok_or_else(|| ReleaserError::VariableNotFound {
                        name: name.to_string(),
                        owner: match scope.service() {
                            Some(service) => format!("service {}", service),
                            None => "the fleet".to_string(),
                        },
                    })?;

                if !filter.matches(&var.value) {
                    return Err(ReleaserError::NoMatch(name.to_string()));
                }
                Ok(Matches::Fleet(var))
            }
            EnvVarScope::Device | EnvVarScope::DeviceService { .. } => {
                let devices = self.backend.get_all_devices(self.app_id).await?;
                let mut exists = false;
                let mut matched = Vec::new();

                for device in devices {
                    let owner = match service_id {
                        Some(service_id) => EnvVarOwner::DeviceService {
                            device_id: device.id,
                            service_id,
                        },
                        None => EnvVarOwner::Device {
                            device_id: device.id,
                        },
                    };
                    let var = self
                        .backend
                        .get_env_vars(owner)
                        .await?
                        .into_iter()
                        .find(|var| var.name == name);

                    if let Some(var) = var {
                        exists = true;
                        if filter.matches(&var.value) {
                            matched.push((device, var));
                        }
                    }
                }

                if !exists {
                    return Err(ReleaserError::VariableNotFound {
                        name: name.to_string(),
                        owner: match scope.service() {
                            Some(service) => format!("any of the devices for service {}", service),
                            None => "any of the devices".to_string(),
                        },
                    });
                }
                if matched.is_empty() {
                    return Err(ReleaserError::NoMatch(name.to_string()));
                }
                Ok(Matches::Devices(matched))
            }
        }
    }

    /// Remove every definition of `name` in `scope` whose value passes `filter`
    ///
    /// Per-device removals are independent: a failure is counted and the
    /// remaining devices are still processed.
    pub async fn remove_matching(
        &self,
        scope: &EnvVarScope,
        name: &str,
        filter: &ValueFilter,
    ) -> Result<RemovalOutcome, ReleaserError> {
        let kind = scope.kind();

        match self.find_matching(scope, name, filter).await? {
            Matches::Fleet(var) => {
                info!("Removing {} from {}", name, scope);
                let removal = match self.backend.remove_env_var(kind, var.id).await {
                    Ok(()) => FleetRemoval::Success,
                    Err(e) => {
                        warn!("Failed to remove {} from {}: {}", name, scope, e);
                        FleetRemoval::Failed(e.to_string())
                    }
                };
                Ok(RemovalOutcome::Fleet(removal))
            }
            Matches::Devices(matched) => {
                info!("Removing {} from {} devices ({})", name, matched.len(), scope);
                let mut result = RolloutResult::default();
                for (device, var) in matched {
                    match self.backend.remove_env_var(kind, var.id).await {
                        Ok(()) => result.record_success(),
                        Err(e) => {
                            warn!(
                                "Failed to remove {} from device {}: {}",
                                name,
                                short_uuid(&device.uuid),
                                e
                            );
                            result.record_failure(device.id);
                        }
                    }
                }
                Ok(RemovalOutcome::Devices(result))
            }
        }
    }

    async fn resolve_service(&self, service: &str) -> Result<u64, ReleaserError> {
        self.backend
            .get_services(self.app_id)
            .await?
            .into_iter()
            .find(|s| s.service_name == service)
            .map(|s| s.id)
            .ok_or_else(|| ReleaserError::ResourceNotFound(format!("service {}", service)))
    }
}
