//! Application configuration options

use std::time::Duration;

use secrecy::SecretString;

use crate::cli::{Cli, GroupingArg};
use crate::http::client::HttpClientOptions;
use crate::logs::LogOptions;
use crate::release::groups::GroupingStrategy;
use crate::storage::settings::Settings;

/// Options for one invocation of the release tool
#[derive(Debug)]
pub struct ReleaserOptions {
    /// balenaCloud auth token
    pub token: SecretString,

    /// Application the commands act on
    pub app_id: u64,

    /// Backend client configuration
    pub http: HttpClientOptions,

    /// Device grouping used by every command
    pub strategy: GroupingStrategy,

    /// Logging configuration
    pub logs: LogOptions,
}

impl ReleaserOptions {
    /// Merge command line flags over the settings file
    pub fn resolve(cli: &Cli, settings: &Settings) -> Self {
        let http = HttpClientOptions {
            base_url: cli
                .api_url
                .clone()
                .unwrap_or_else(|| settings.backend.api_url.clone()),
            timeout: Duration::from_secs(settings.backend.timeout_secs),
            get_attempts: settings.backend.get_attempts,
            ..Default::default()
        };

        // A strategy picked on the command line keeps the tag key configured
        // for that same strategy, if any.
        let strategy = match (cli.grouping, &settings.grouping) {
            (None, configured) => configured.clone(),
            (Some(GroupingArg::ReleaseGroups), configured @ GroupingStrategy::ReleaseGroups { .. })
            | (Some(GroupingArg::Canary), configured @ GroupingStrategy::Canary { .. }) => {
                configured.clone()
            }
            (Some(GroupingArg::ReleaseGroups), _) => GroupingStrategy::release_groups(),
            (Some(GroupingArg::Canary), _) => GroupingStrategy::canary(),
        };

        Self {
            token: SecretString::from(cli.token.clone()),
            app_id: cli.app,
            http,
            strategy,
            logs: LogOptions {
                log_level: cli.log_level.unwrap_or(settings.log_level),
                json_format: cli.log_json || settings.log_json,
            },
        }
    }
}
