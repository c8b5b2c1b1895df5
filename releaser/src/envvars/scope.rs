//! Environment variable scopes

use std::fmt;
use std::str::FromStr;

use crate::errors::ReleaserError;

/// Where an environment variable lives
///
/// Service scoped variants always carry the service they are bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EnvVarScope {
    /// Fleet wide, one value per name
    Application,

    /// Fleet wide, bound to one service
    Service { service: String },

    /// Per device
    Device,

    /// Per device, bound to one service
    DeviceService { service: String },
}

impl EnvVarScope {
    /// Build a scope from its command line name and an optional service
    pub fn from_parts(scope: &str, service: Option<&str>) -> Result<Self, ReleaserError> {
        let service = service.map(str::trim).filter(|s| !s.is_empty());
        match (EnvVarKind::from_str(scope)?, service) {
            (EnvVarKind::Application, _) => Ok(EnvVarScope::Application),
            (EnvVarKind::Device, _) => Ok(EnvVarScope::Device),
            (EnvVarKind::Service, Some(service)) => Ok(EnvVarScope::Service {
                service: service.to_string(),
            }),
            (EnvVarKind::DeviceService, Some(service)) => Ok(EnvVarScope::DeviceService {
                service: service.to_string(),
            }),
            (kind, None) => Err(ReleaserError::MissingServiceName(kind.to_string())),
        }
    }

    pub fn kind(&self) -> EnvVarKind {
        match self {
            EnvVarScope::Application => EnvVarKind::Application,
            EnvVarScope::Service { .. } => EnvVarKind::Service,
            EnvVarScope::Device => EnvVarKind::Device,
            EnvVarScope::DeviceService { .. } => EnvVarKind::DeviceService,
        }
    }

    pub fn service(&self) -> Option<&str> {
        match self {
            EnvVarScope::Service { service } | EnvVarScope::DeviceService { service } => {
                Some(service)
            }
            _ => None,
        }
    }
}

impl fmt::Display for EnvVarScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.service() {
            Some(service) => write!(f, "{}:{}", self.kind(), service),
            None => write!(f, "{}", self.kind()),
        }
    }
}

/// Remote resource backing each scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvVarKind {
    Application,
    Service,
    Device,
    DeviceService,
}

impl EnvVarKind {
    /// Pine resource name
    pub fn resource(&self) -> &'static str {
        match self {
            EnvVarKind::Application => "application_environment_variable",
            EnvVarKind::Service => "service_environment_variable",
            EnvVarKind::Device => "device_environment_variable",
            EnvVarKind::DeviceService => "device_service_environment_variable",
        }
    }

    fn cli_name(&self) -> &'static str {
        match self {
            EnvVarKind::Application => "app",
            EnvVarKind::Service => "service",
            EnvVarKind::Device => "device",
            EnvVarKind::DeviceService => "device_service",
        }
    }
}

impl fmt::Display for EnvVarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cli_name())
    }
}

impl FromStr for EnvVarKind {
    type Err = ReleaserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "app" => Ok(EnvVarKind::Application),
            "service" => Ok(EnvVarKind::Service),
            "device" => Ok(EnvVarKind::Device),
            "device_service" => Ok(EnvVarKind::DeviceService),
            other => Err(ReleaserError::InvalidScope(other.to_string())),
        }
    }
}

/// Owner whose variables are listed in one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvVarOwner {
    Application { app_id: u64 },
    Service { service_id: u64 },
    Device { device_id: u64 },
    DeviceService { device_id: u64, service_id: u64 },
}

impl EnvVarOwner {
    pub fn kind(&self) -> EnvVarKind {
        match self {
            EnvVarOwner::Application { .. } => EnvVarKind::Application,
            EnvVarOwner::Service { .. } => EnvVarKind::Service,
            EnvVarOwner::Device { .. } => EnvVarKind::Device,
            EnvVarOwner::DeviceService { .. } => EnvVarKind::DeviceService,
        }
    }
}

/// A variable name inside a scope, as given on the command line
///
/// Format: `<scope>:[<service>:]<name>`, e.g. `app:LOG_LEVEL` or
/// `device_service:main:LOG_LEVEL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVarTarget {
    pub scope: EnvVarScope,
    pub name: String,
}

impl FromStr for EnvVarTarget {
    type Err = ReleaserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let (scope, service, name) = match parts.as_slice() {
            [scope, name] => (*scope, None, *name),
            [scope, service, name] => (*scope, Some(*service), *name),
            _ => return Err(ReleaserError::InvalidScope(s.to_string())),
        };

        let scope = EnvVarScope::from_parts(scope, service)?;
        if service.is_some() && scope.service().is_none() {
            return Err(ReleaserError::InvalidScope(s.to_string()));
        }

        let name = name.trim();
        if name.is_empty() {
            return Err(ReleaserError::InvalidScope(s.to_string()));
        }

        Ok(Self {
            scope,
            name: name.to_string(),
        })
    }
}
