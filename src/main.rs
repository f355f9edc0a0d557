//! guildmirror - replay update records into a mirror.
//!
//! Usage: `guildmirror <updates.jsonl> [<member_id> <channel_id>]`
//!
//! Each non-empty line of the input is one JSON update record. With a member
//! and channel given, the effective permissions are printed as JSON.

use std::env;
use std::fs;

use anyhow::{Context, bail};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use guildmirror::{Mirror, MirrorConfig, Snowflake, Update};

fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("guildmirror=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (path, query) = match args.as_slice() {
        [path] => (path, None),
        [path, member, channel] => {
            let member: Snowflake = member.parse().context("member id must be an integer")?;
            let channel: Snowflake = channel.parse().context("channel id must be an integer")?;
            (path, Some((member, channel)))
        }
        _ => bail!("usage: guildmirror <updates.jsonl> [<member_id> <channel_id>]"),
    };

    let config = MirrorConfig::from_env().context("failed to load configuration")?;
    info!("Configuration loaded successfully");

    let mirror = Mirror::new(config);
    let input = fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;

    let (mut applied, mut failed) = (0usize, 0usize);
    for (lineno, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let update: Update = match serde_json::from_str(line) {
            Ok(update) => update,
            Err(e) => {
                warn!("Line {}: not an update record: {}", lineno + 1, e);
                failed += 1;
                continue;
            }
        };

        match mirror.apply(&update) {
            Ok(_) => applied += 1,
            Err(e) => {
                warn!("Line {}: {} failed: {}", lineno + 1, update.op(), e);
                failed += 1;
            }
        }
    }

    info!(
        "Replayed {} records ({} failed): {} guilds, {} channels, {} threads, {} users",
        applied,
        failed,
        mirror.guilds.len(),
        mirror.channels.len(),
        mirror.threads.len(),
        mirror.users.len()
    );

    if let Some((member, channel)) = query {
        let perms = mirror
            .permissions_of(member, channel)
            .with_context(|| format!("cannot resolve member {member} in channel {channel}"))?;
        println!("{}", serde_json::to_string_pretty(&perms.to_named_map())?);
    }

    Ok(())
}
