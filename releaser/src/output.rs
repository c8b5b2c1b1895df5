//! Output formatting for command results
//!
//! Everything here writes to the given sink, stdout in the binary. Logs never
//! go through these helpers.

use std::io::{self, Write};

use colored::*;

use fleet_api_client::models::Release;

use crate::release::engine::GroupVersions;
use crate::release::groups::Classification;
use crate::release::outcome::{GroupOutcome, RolloutResult};
use crate::utils::short_uuid;

pub fn print_lines<W: Write + ?Sized>(out: &mut W, lines: &[String]) -> io::Result<()> {
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

/// One line per group: `<group>: <uuid6>, <uuid6>`
pub fn print_devices_status<W: Write + ?Sized>(
    out: &mut W,
    classification: &Classification,
) -> io::Result<()> {
    for (group, devices) in classification.iter() {
        let uuids: Vec<&str> = devices
            .iter()
            .map(|device| short_uuid(&device.uuid))
            .collect();
        writeln!(out, "{}: {}", group, uuids.join(", "))?;
    }
    Ok(())
}

pub fn print_group_versions<W: Write + ?Sized>(
    out: &mut W,
    groups: &[GroupVersions],
) -> io::Result<()> {
    for group in groups {
        writeln!(out, "{}", group.group.to_string().bold())?;
        if group.devices.is_empty() {
            writeln!(out, "  {}", "no devices".dimmed())?;
        }
        for device in &group.devices {
            writeln!(
                out,
                "  {} {} {}",
                short_uuid(&device.uuid),
                device.device_name,
                device.commit.as_deref().unwrap_or("None")
            )?;
        }
    }
    Ok(())
}

/// `Latest <n> releases:` then `<end timestamp> <commit>` per release
pub fn print_releases<W: Write + ?Sized>(
    out: &mut W,
    count: usize,
    releases: &[Release],
) -> io::Result<()> {
    writeln!(out, "Latest {} releases:", count)?;
    for release in releases {
        let timestamp = release
            .end_timestamp
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_else(|| "None".to_string());
        writeln!(out, "{} {}", timestamp, release.commit)?;
    }
    Ok(())
}

pub fn print_group_outcome<W: Write + ?Sized>(
    out: &mut W,
    outcome: &GroupOutcome,
) -> io::Result<()> {
    print_result(out, &format!("Release group {}", outcome.group), &outcome.result)
}

pub fn print_result<W: Write + ?Sized>(
    out: &mut W,
    label: &str,
    result: &RolloutResult,
) -> io::Result<()> {
    let marker = if result.is_clean() {
        "✓".green()
    } else {
        "✗".red()
    };
    writeln!(out, "{} {}: {}", marker, label, result)
}

pub fn print_success<W: Write + ?Sized>(out: &mut W, message: &str) -> io::Result<()> {
    writeln!(out, "{} {}", "✓".green(), message)
}
