//! Command dispatch

use std::io::{self, Write};
use std::sync::Arc;

use tracing::info;

use crate::app::options::ReleaserOptions;
use crate::app::prompt::{Confirmer, TerminalConfirmer};
use crate::backend::FleetBackend;
use crate::cli::Command;
use crate::envvars::remover::{EnvVarRemover, ValueFilter};
use crate::envvars::scope::EnvVarTarget;
use crate::errors::ReleaserError;
use crate::http::client::HttpClient;
use crate::output;
use crate::release::engine::RolloutEngine;
use crate::release::groups::{GroupKey, GroupingStrategy};

/// Everything a command needs, bound to one application
pub struct Releaser {
    pub engine: RolloutEngine,
    pub remover: EnvVarRemover,
}

impl Releaser {
    pub fn new(backend: Arc<dyn FleetBackend>, app_id: u64, strategy: GroupingStrategy) -> Self {
        Self {
            engine: RolloutEngine::new(backend.clone(), app_id, strategy),
            remover: EnvVarRemover::new(backend, app_id),
        }
    }
}

/// Run one command against the live fleet API
pub async fn run(options: ReleaserOptions, command: Command) -> Result<(), ReleaserError> {
    let client = HttpClient::new(&options.http, options.token)?;
    info!(
        "Using {} for app {} ({} grouping)",
        client.base_url(),
        options.app_id,
        options.strategy.name()
    );

    let backend: Arc<dyn FleetBackend> = Arc::new(client);
    let releaser = Releaser::new(backend, options.app_id, options.strategy);
    execute(&releaser, command, &TerminalConfirmer, &mut io::stdout()).await
}

/// Execute one command, writing its output to `out`
///
/// Inputs are validated before the operator is asked for confirmation, and
/// confirmation is obtained before the first mutation.
pub async fn execute<W: Write + ?Sized>(
    releaser: &Releaser,
    command: Command,
    confirmer: &dyn Confirmer,
    out: &mut W,
) -> Result<(), ReleaserError> {
    let engine = &releaser.engine;

    match command {
        Command::Info => {
            output::print_lines(out, &engine.info().await?)?;
        }
        Command::EnableRolling => {
            engine.enable_rolling().await?;
            output::print_success(out, "Enabled rolling")?;
        }
        Command::DisableRolling => {
            engine.disable_rolling().await?;
            output::print_success(out, "Disabled rolling")?;
        }
        Command::ShowDevicesStatus => {
            output::print_devices_status(out, &engine.classify().await?)?;
        }
        Command::ShowGroupVersions => {
            output::print_group_versions(out, &engine.group_versions().await?)?;
        }
        Command::Release {
            group,
            app_wide,
            commit,
            yes,
            silent,
        } => {
            let commit =
                commit.ok_or_else(|| ReleaserError::MissingFlag("--commit".to_string()))?;
            if group.is_none() && !app_wide {
                return Err(ReleaserError::MissingFlag("--group or --app".to_string()));
            }
            let group: Option<GroupKey> = group.map(|name| parse_group(&name));

            let target = engine.validate_commit(Some(commit.as_str())).await?;
            if let Some(group) = &group {
                engine.validate_groups(std::slice::from_ref(group)).await?;
            }

            if !silent {
                output::print_lines(out, &engine.info().await?)?;
                writeln!(out, "Devices:")?;
                output::print_devices_status(out, &engine.classify().await?)?;
                writeln!(out)?;
            }

            let shown = target.as_deref().unwrap_or("None");
            let question = match &group {
                Some(group) => format!(
                    "Are you sure you want to set release group \"{}\" to \"{}\"?",
                    group, shown
                ),
                None => format!(
                    "Are you sure you want to set the fleet release to \"{}\"?",
                    shown
                ),
            };
            ask(confirmer, yes, &question)?;

            let report = engine
                .set_release(Some(commit.as_str()), group.as_ref(), app_wide)
                .await?;
            if let Some(outcome) = &report.group {
                output::print_group_outcome(out, outcome)?;
            }
            if let Some(release) = &report.app_release {
                let message = format!(
                    "Fleet release set to {}",
                    release.as_deref().unwrap_or("None")
                );
                output::print_success(out, &message)?;
            }
        }
        Command::Unpin { groups, nocheck } => {
            let groups: Vec<GroupKey> = groups.iter().map(|name| parse_group(name)).collect();
            engine.validate_groups(&groups).await?;

            let names: Vec<String> = groups.iter().map(|g| format!("\"{}\"", g)).collect();
            let question = format!(
                "Are you sure you want to unpin release groups {}?",
                names.join(", ")
            );
            ask(confirmer, nocheck, &question)?;

            for outcome in engine.unpin(&groups).await? {
                output::print_group_outcome(out, &outcome)?;
            }
        }
        Command::Releases { count } => {
            let releases = engine.latest_releases(count).await?;
            output::print_releases(out, count, &releases)?;
        }
        Command::FilterAndRemoveEnvVar {
            target,
            values,
            inclusive,
        } => {
            let target: EnvVarTarget = target.parse()?;
            let filter = ValueFilter::from_list(&values, inclusive);
            let outcome = releaser
                .remover
                .remove_matching(&target.scope, &target.name, &filter)
                .await?;
            writeln!(out, "{} ({}): {}", target.name, target.scope, outcome)?;
        }
        Command::CanaryRelease {
            release,
            canary,
            yes,
        } => {
            engine.require_canary_strategy()?;
            let release = engine
                .validate_commit(Some(release.as_str()))
                .await?
                .ok_or_else(|| ReleaserError::InvalidCommit(release.clone()))?;
            let canary = engine.validate_commit(canary.as_deref()).await?;

            output::print_devices_status(out, &engine.classify().await?)?;
            let question = format!(
                "Are you sure you want to release \"{}\" with canaries on \"{}\"?",
                release,
                canary.as_deref().unwrap_or("None")
            );
            ask(confirmer, yes, &question)?;

            let report = engine.canary_rollout(&release, canary.as_deref()).await?;
            output::print_result(out, "Old canaries reset", &report.reset)?;
            output::print_result(out, "Canaries set", &report.promoted)?;
            output::print_success(out, &format!("Fleet release set to {}", release))?;
        }
    }

    Ok(())
}

fn parse_group(name: &str) -> GroupKey {
    match name.parse() {
        Ok(key) => key,
        Err(never) => match never {},
    }
}

/// Ask unless the operator already agreed on the command line
fn ask(confirmer: &dyn Confirmer, skip: bool, question: &str) -> Result<(), ReleaserError> {
    if skip || confirmer.confirm(question)? {
        Ok(())
    } else {
        Err(ReleaserError::Cancelled)
    }
}
