//! dupemgr - find duplicate files and remove the extra copies.
//!
//! A protected root directory is the baseline. Either the root is searched
//! against itself, or extra files and directories are checked against it
//! and their duplicates optionally removed under user control. Protected
//! files are never deleted.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod format;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;

use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};

use crate::actions::{BatchDeleteResult, Confirmer, RemovalWorkflow, TerminalConfirmer};
use crate::cli::{Cli, Commands, CommonArgs, OutputFormat};
use crate::config::Config;
use crate::duplicates::{DupeFinder, SearchRequest, SearchSession};
use crate::error::ExitCode;
use crate::output::{removal_line, JsonOutput, ScriptOutput, TextOutput};
use crate::progress::Progress;

/// Run the application for parsed arguments. The report goes to stdout,
/// removal prompts to stderr.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded, a path cannot be
/// resolved, output cannot be written, or removal stops on a fatal error.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let mut confirmer = TerminalConfirmer::stdio();
    run_with(cli, &mut confirmer, &mut io::stdout())
}

/// Run the application with an explicit confirmer and report writer.
///
/// # Errors
///
/// See [`run_app`].
pub fn run_with<C, W>(cli: Cli, confirmer: &mut C, out: &mut W) -> Result<ExitCode>
where
    C: Confirmer + ?Sized,
    W: Write,
{
    logging::init_logging(cli.verbose, cli.quiet, cli.no_color);
    if cli.no_color || !io::stdout().is_terminal() {
        yansi::disable();
    }

    let mut config =
        Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Search(args) => {
            apply_overrides(&mut config, &args.common);
            let format = args.common.output;
            let request = SearchRequest::new(args.root)
                .with_extras(args.extras)
                .with_exclusions(args.common.exclusions);

            let session = search(&config, &request, format, cli.quiet)?;
            let code = exit_code(&session, None);
            match format {
                OutputFormat::Text if !cli.quiet => TextOutput::new(&session)
                    .write_to(out)
                    .context("Failed to write report")?,
                OutputFormat::Text => {}
                OutputFormat::Json => JsonOutput::new(&session, code)
                    .write_to(out, true)
                    .context("Failed to write JSON output")?,
            }
            Ok(code)
        }
        Commands::Remove(args) => {
            apply_overrides(&mut config, &args.common);
            if args.trash {
                config.use_trash = true;
            }
            let format = args.common.output;
            let request = SearchRequest::new(args.root)
                .with_extras(args.extras)
                .with_exclusions(args.common.exclusions)
                .with_removal(true);

            let session = search(&config, &request, format, cli.quiet)?;
            if let Some(path) = &args.rmlog {
                write_rmlog(&session, path)?;
            }
            if format == OutputFormat::Text && !cli.quiet {
                TextOutput::new(&session)
                    .write_to(out)
                    .context("Failed to write report")?;
            }

            let mut workflow = RemovalWorkflow::new(config.delete_config(), session.extras.clone());
            if args.yes {
                workflow = workflow.forced();
            }
            let started = Instant::now();
            let removal = workflow
                .run(&session.queue, confirmer)
                .context("Removal stopped")?;

            let code = exit_code(&session, Some(&removal));
            match format {
                OutputFormat::Text if !cli.quiet && !session.queue.is_empty() => {
                    writeln!(out, "{}", removal_line(removal.success_count(), started.elapsed()))
                        .context("Failed to write report")?;
                }
                OutputFormat::Text => {}
                OutputFormat::Json => JsonOutput::new(&session, code)
                    .with_removal(&removal)
                    .write_to(out, true)
                    .context("Failed to write JSON output")?,
            }
            Ok(code)
        }
    }
}

/// CLI flags win over every configuration layer.
fn apply_overrides(config: &mut Config, common: &CommonArgs) {
    if let Some(algorithm) = common.algorithm {
        config.algorithm = algorithm;
    }
    if let Some(block_size) = common.block_size {
        config.block_size = usize::try_from(block_size).unwrap_or(usize::MAX);
    }
    if common.skip_hidden {
        config.skip_hidden = true;
    }
}

fn search(
    config: &Config,
    request: &SearchRequest,
    format: OutputFormat,
    quiet: bool,
) -> Result<SearchSession> {
    let mut finder_config = config.finder_config();
    if format == OutputFormat::Text && !quiet {
        finder_config = finder_config.with_progress_callback(Arc::new(Progress::new(false)));
    }
    let finder = DupeFinder::new(finder_config, config.hasher());
    finder
        .search(request)
        .with_context(|| format!("Search of {} failed", request.root.display()))
}

fn write_rmlog(session: &SearchSession, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    ScriptOutput::new(session)
        .write_to(&mut writer)
        .and_then(|()| writer.flush())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Wrote removal script to {}", path.display());
    Ok(())
}

fn exit_code(session: &SearchSession, removal: Option<&BatchDeleteResult>) -> ExitCode {
    if removal.is_some_and(|r| r.failure_count() > 0) {
        ExitCode::PartialSuccess
    } else if session.has_duplicates() {
        ExitCode::Success
    } else {
        ExitCode::NoDuplicates
    }
}
