use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{info, warn, Level};

use monosize_core::config::ConfigCache;
use monosize_core::local_report::collect_local_report;
use monosize_core::reporter::{render_cli_table, render_markdown, ReportOptions};
use monosize_core::storage::storage_from_config;
use monosize_core::types::DeltaFormat;
use monosize_core::{compare_with_remote, get_changed_entries_in_report, parse_threshold};

#[derive(Parser, Debug)]
#[command(
    name = "monosize",
    version,
    about = "Bundle size tracking for monorepo fixtures"
)]
struct Cli {
    /// Suppress informational output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file; discovered upward from the root when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Monorepo root holding the per-package reports (defaults to cwd)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compares local results with the stored report of a branch
    CompareReports {
        #[arg(short, long, default_value = "main")]
        branch: String,

        #[arg(short, long, value_enum, default_value = "cli")]
        output: OutputFormat,

        #[arg(long, value_enum, alias = "deltaFormat", default_value = "delta")]
        delta_format: DeltaFormatArg,

        /// Overrides the configured threshold, e.g. "10%" or "1.5 kB"
        #[arg(long)]
        threshold: Option<String>,

        #[arg(long)]
        show_unchanged: bool,

        #[arg(long, default_value = "dist")]
        out: PathBuf,
    },

    /// Uploads local results as the report of a branch (CI only)
    UploadReport {
        #[arg(long)]
        branch: String,

        #[arg(long)]
        commit_sha: String,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Cli,
    Markdown,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum DeltaFormatArg {
    Delta,
    Percent,
}

impl From<DeltaFormatArg> for DeltaFormat {
    fn from(arg: DeltaFormatArg) -> Self {
        match arg {
            DeltaFormatArg::Delta => DeltaFormat::Delta,
            DeltaFormatArg::Percent => DeltaFormat::Percent,
        }
    }
}

struct Style {
    bold: &'static str,
    dim: &'static str,
    red: &'static str,
    green: &'static str,
    reset: &'static str,
}

const COLOR: Style = Style {
    bold: "\x1b[1m",
    dim: "\x1b[2m",
    red: "\x1b[31m",
    green: "\x1b[32m",
    reset: "\x1b[0m",
};

const PLAIN: Style = Style {
    bold: "",
    dim: "",
    red: "",
    green: "",
    reset: "",
};

fn style() -> &'static Style {
    if std::env::var_os("NO_COLOR").is_some() {
        &PLAIN
    } else {
        &COLOR
    }
}

fn log_level(quiet: bool, verbose: u8) -> Level {
    if quiet {
        return Level::Warn;
    }
    match verbose {
        0 => Level::Info,
        1 => Level::Debug,
        _ => Level::Trace,
    }
}

fn is_ci() -> bool {
    match std::env::var("CI") {
        Ok(v) => !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false"),
        Err(_) => false,
    }
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        Env::default().default_filter_or(log_level(cli.quiet, cli.verbose).as_str()),
    )
    .format_timestamp(None)
    .init();

    let mut cache = ConfigCache::new();

    let res = resolve_root(cli.root.as_deref()).and_then(|root| match cli.cmd {
        Commands::CompareReports {
            branch,
            output,
            delta_format,
            threshold,
            show_unchanged,
            out,
        } => run_compare(
            &mut cache,
            cli.config.as_deref(),
            &root,
            CompareArgs {
                branch,
                output,
                delta_format: delta_format.into(),
                threshold,
                show_unchanged,
                out,
            },
        ),
        Commands::UploadReport { branch, commit_sha } => run_upload(
            &mut cache,
            cli.config.as_deref(),
            &root,
            &branch,
            &commit_sha,
        ),
    });

    match res {
        Ok(code) => code,
        Err(e) => {
            let s = style();
            eprintln!(
                "{}{red}error:{reset} {:#}",
                s.bold,
                e,
                red = s.red,
                reset = s.reset
            );
            std::process::ExitCode::from(1)
        }
    }
}

fn resolve_root(root: Option<&Path>) -> anyhow::Result<PathBuf> {
    match root {
        Some(p) => Ok(p.to_path_buf()),
        None => std::env::current_dir().context("resolve working directory"),
    }
}

/// Relative output directories live under the monorepo root.
fn resolve_out_dir(root: &Path, out: &Path) -> PathBuf {
    if out.is_absolute() {
        out.to_path_buf()
    } else {
        root.join(out)
    }
}

struct CompareArgs {
    branch: String,
    output: OutputFormat,
    delta_format: DeltaFormat,
    threshold: Option<String>,
    show_unchanged: bool,
    out: PathBuf,
}

fn run_compare(
    cache: &mut ConfigCache,
    config_path: Option<&Path>,
    root: &Path,
    args: CompareArgs,
) -> anyhow::Result<std::process::ExitCode> {
    let s = style();
    let started = Instant::now();

    let config = cache.get_or_load(config_path, root)?;
    let (threshold, threshold_text) = match &args.threshold {
        Some(t) => (parse_threshold(t)?, t.as_str()),
        None => (config.threshold_value()?, config.threshold.as_str()),
    };

    let local_started = Instant::now();
    let local = collect_local_report(root)?;
    info!(
        "local report prepared in {:.2}s ({} entries)",
        local_started.elapsed().as_secs_f64(),
        local.len()
    );

    let storage = storage_from_config(&config.resolved_storage());
    let comparison = compare_with_remote(&local, storage.as_ref(), &args.branch, &threshold)?;

    let opts = ReportOptions {
        commit_sha: comparison.commit_sha.clone(),
        repository: config.repository.clone(),
        show_unchanged: args.show_unchanged,
        delta_format: args.delta_format,
    };

    match args.output {
        OutputFormat::Cli => print!("{}", render_cli_table(&comparison.report, &opts)),
        OutputFormat::Markdown => {
            let out_dir = resolve_out_dir(root, &args.out);
            std::fs::create_dir_all(&out_dir)
                .with_context(|| format!("create out dir {}", out_dir.display()))?;
            let md_path = out_dir.join("monosize.md");
            std::fs::write(&md_path, render_markdown(&comparison.report, &opts))
                .with_context(|| format!("write {}", md_path.display()))?;
            info!("a report file was written to {}", md_path.display());
        }
    }

    let violations = comparison
        .report
        .iter()
        .filter(|e| e.diff.exceeds_threshold())
        .count();
    let entries = get_changed_entries_in_report(comparison.report);

    // Machine-parseable line on stdout
    println!(
        "changed={} unchanged={} violations={}",
        entries.changed_entries.len(),
        entries.unchanged_entries.len(),
        violations
    );

    info!("completed in {:.2}s", started.elapsed().as_secs_f64());

    if violations > 0 {
        eprintln!(
            "  {red}{bold}THRESHOLD EXCEEDED{reset}  {dim}({violations} fixture(s) over {}){reset}",
            threshold_text.trim(),
            red = s.red,
            bold = s.bold,
            dim = s.dim,
            reset = s.reset,
        );
        return Ok(std::process::ExitCode::from(1));
    }

    eprintln!(
        "  {green}{bold}PASS{reset}",
        green = s.green,
        bold = s.bold,
        reset = s.reset
    );
    Ok(std::process::ExitCode::from(0))
}

fn run_upload(
    cache: &mut ConfigCache,
    config_path: Option<&Path>,
    root: &Path,
    branch: &str,
    commit_sha: &str,
) -> anyhow::Result<std::process::ExitCode> {
    if !is_ci() {
        anyhow::bail!("this command can be executed only in CI (the CI environment variable is not set)");
    }

    let s = style();
    let config = cache.get_or_load(config_path, root)?;

    let local = collect_local_report(root)?;
    if local.is_empty() {
        warn!("no fixtures found under {}", root.display());
    }

    let storage = storage_from_config(&config.resolved_storage());
    storage
        .upload_report_to_remote(branch, commit_sha, &local)
        .with_context(|| format!("failed to upload report for branch {branch}"))?;

    eprintln!(
        "  {green}{bold}UPLOADED{reset}  {dim}{} fixture(s) as {branch}@{commit_sha}{reset}",
        local.len(),
        green = s.green,
        bold = s.bold,
        dim = s.dim,
        reset = s.reset,
    );
    Ok(std::process::ExitCode::from(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn log_level_follows_flags() {
        assert_eq!(log_level(true, 3), Level::Warn);
        assert_eq!(log_level(false, 0), Level::Info);
        assert_eq!(log_level(false, 1), Level::Debug);
        assert_eq!(log_level(false, 2), Level::Trace);
    }

    #[test]
    fn relative_out_dir_is_joined_to_root() {
        let root = Path::new("/repo");
        assert_eq!(resolve_out_dir(root, Path::new("dist")), root.join("dist"));
        assert_eq!(
            resolve_out_dir(root, Path::new("/tmp/report")),
            PathBuf::from("/tmp/report")
        );
    }

    #[test]
    fn delta_format_arg_converts() {
        assert_eq!(DeltaFormat::from(DeltaFormatArg::Delta), DeltaFormat::Delta);
        assert_eq!(
            DeltaFormat::from(DeltaFormatArg::Percent),
            DeltaFormat::Percent
        );
    }

    #[test]
    fn cli_accepts_camel_case_delta_format() {
        let cli = Cli::try_parse_from(["monosize", "compare-reports", "--deltaFormat", "percent"])
            .unwrap();
        match cli.cmd {
            Commands::CompareReports { delta_format, .. } => {
                assert!(matches!(delta_format, DeltaFormatArg::Percent))
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    #[serial]
    fn style_respects_no_color() {
        std::env::set_var("NO_COLOR", "1");
        assert_eq!(style().bold, "");
        std::env::remove_var("NO_COLOR");
        assert_ne!(style().bold, "");
    }

    #[test]
    #[serial]
    fn is_ci_reads_environment() {
        std::env::set_var("CI", "true");
        assert!(is_ci());
        std::env::set_var("CI", "false");
        assert!(!is_ci());
        std::env::remove_var("CI");
        assert!(!is_ci());
    }
}
