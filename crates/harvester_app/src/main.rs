mod cli;
mod config;
mod logging;
mod output;

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use engine_logging::{engine_debug, engine_error, engine_info};
use harvester_engine::{DocumentSession, FeedHarvester, HarvestSettings, SnapshotSession};

use crate::cli::{Cli, Command, HarvestArgs};
use crate::config::AppConfig;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::initialize(cli.log, engine_logging::level_from_verbosity(cli.verbose));

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            engine_error!("{err:#}");
            eprintln!("feed_harvest: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    let settings = config.harvest_settings()?;

    match cli.command {
        Command::Replay {
            dir,
            no_wait,
            harvest,
        } => replay(&dir, no_wait, settings, &harvest),
        #[cfg(feature = "chrome")]
        Command::Live {
            email,
            password,
            profile,
            headed,
            harvest,
        } => live(
            harvester_engine::Credentials { email, password },
            harvester_engine::ChromeSettings {
                profile_dir: profile,
                headless: !headed,
                ..harvester_engine::ChromeSettings::default()
            },
            settings,
            &harvest,
        ),
    }
}

fn replay(
    dir: &std::path::Path,
    no_wait: bool,
    mut settings: HarvestSettings,
    args: &HarvestArgs,
) -> Result<()> {
    if no_wait {
        settings.retry = settings.retry.without_waits();
    }
    let session = SnapshotSession::load_dir(dir)
        .with_context(|| format!("loading snapshots from {}", dir.display()))?;
    let mut harvester = FeedHarvester::new(session, settings);
    harvest_to_stdout(&mut harvester, args)
}

#[cfg(feature = "chrome")]
fn live(
    credentials: harvester_engine::Credentials,
    chrome: harvester_engine::ChromeSettings,
    settings: HarvestSettings,
    args: &HarvestArgs,
) -> Result<()> {
    let mut session =
        harvester_engine::ChromeSession::launch(chrome).context("launching browser")?;
    session
        .ensure_authenticated(&credentials)
        .context("signing in")?;
    session.go_to_feed().context("opening the home feed")?;

    let mut harvester = FeedHarvester::new(session, settings);
    let outcome = harvest_to_stdout(&mut harvester, args);
    harvester
        .into_session()
        .close()
        .context("closing browser")?;
    outcome
}

fn harvest_to_stdout<S: DocumentSession>(
    harvester: &mut FeedHarvester<S>,
    args: &HarvestArgs,
) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut written = 0usize;
    let limit = args.limit.unwrap_or(usize::MAX);
    for record in harvester.browse(&args.fields).take(limit) {
        let record = record.context("harvest aborted")?;
        if record.is_empty() {
            engine_debug!("Item {} has none of the requested fields", record.position());
        }
        output::write_line(&mut out, &output::record_json(&record))?;
        written += 1;
    }
    engine_info!("Wrote {written} records");

    if args.ads {
        let ads = harvester.current_ads().context("reading sidebar ads")?;
        engine_info!("Found {} sidebar ads", ads.len());
        for ad in &ads {
            output::write_line(&mut out, &output::ad_json(ad))?;
        }
    }
    out.flush()?;
    Ok(())
}
