//! Command line definition

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::logs::LogLevel;

/// Staged release-group rollouts for balena fleets
///
/// The app and token can be set as environment variables, using RESIN_APP
/// and RESIN_TOKEN.
#[derive(Debug, Parser)]
#[command(name = "resin-release-tool")]
#[command(version)]
pub struct Cli {
    /// balenaCloud auth token
    #[arg(long, env = "RESIN_TOKEN", value_name = "TOKEN", hide_env_values = true)]
    pub token: String,

    /// balenaCloud app ID
    #[arg(long, env = "RESIN_APP", value_name = "APP_ID")]
    pub app: u64,

    /// Base URL of the fleet API
    #[arg(long, env = "RESIN_API_URL")]
    pub api_url: Option<String>,

    /// JSON settings file
    #[arg(long, env = "RESIN_RELEASER_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// How devices are grouped, overriding the settings file
    #[arg(long, value_enum)]
    pub grouping: Option<GroupingArg>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<LogLevel>,

    /// Emit JSON logs
    #[arg(long)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Grouping strategy selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GroupingArg {
    /// One group per `release_group` tag value
    ReleaseGroups,
    /// canaries, old_canaries and rest
    Canary,
}

/// Available commands
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Information of the application
    Info,

    /// Enables rolling releases in the application
    EnableRolling,

    /// Disables rolling releases in the application
    DisableRolling,

    /// Show the status of the devices in the application
    ShowDevicesStatus,

    /// Show the commit each device of each group is pinned to
    ShowGroupVersions,

    /// Sets the release commit of a release group and/or the whole fleet
    Release {
        /// Release group to pin; `None` addresses untagged devices
        #[arg(long)]
        group: Option<String>,

        /// Also set the fleet-wide release
        #[arg(long = "app")]
        app_wide: bool,

        /// Target commit; an empty value unpins
        #[arg(long)]
        commit: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Do not print the application info and device status
        #[arg(long)]
        silent: bool,
    },

    /// Unpins the version of one or more release groups
    Unpin {
        /// Release groups to unpin
        #[arg(required = true)]
        groups: Vec<String>,

        /// Skip the confirmation prompt
        #[arg(long)]
        nocheck: bool,
    },

    /// Show successful releases of the application
    Releases {
        /// How many
        #[arg(long, default_value_t = 10)]
        count: usize,
    },

    /// Removes an environment variable where its value passes a filter
    FilterAndRemoveEnvVar {
        /// `<scope>:[<service>:]<name>`, scope one of app, service, device,
        /// device_service
        target: String,

        /// Comma separated values
        values: String,

        /// Remove definitions whose value is in the list, instead of the
        /// ones whose value is not
        #[arg(long)]
        inclusive: bool,
    },

    /// Resets old canaries, pins canaries and moves the fleet release
    CanaryRelease {
        /// Commit the whole fleet moves to
        #[arg(long)]
        release: String,

        /// Commit the canaries are pinned to; omitted unpins them
        #[arg(long)]
        canary: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}
