//! DOI Check CLI Application
//!
//! Lists every DOI registered under a Crossref prefix and checks that each one
//! resolves through doi.org. This CLI is a thin front end over doi-check-lib.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use doi_check_lib::{load_env_config, parse_doi_list, parse_duration_string, validate_prefix};
use doi_check_lib::{CancellationToken, ConfigManager, FileConfig, RunObserver};
use doi_check_lib::{
    CheckConfig, Doi, DoiCheckError, DoiChecker, ReportTable, ResolutionResult, SummaryCounts,
    DEFAULT_REPORT_FILE,
};
use serde::Serialize;
use std::process;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for doi-check
#[derive(Parser, Debug)]
#[command(name = "doi-check")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Check that every DOI under a Crossref prefix resolves")]
#[command(
    long_about = "List every DOI registered under a Crossref prefix and check that each one resolves through doi.org.\n\nChecks run concurrently with retries on network errors. Results stream as they complete and can be saved as CSV or printed as JSON."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// DOI prefix to check, e.g. 10.12345
    #[arg(value_name = "PREFIX", help_heading = "DOI Selection")]
    pub prefix: Option<String>,

    /// Check DOIs from a file instead (one per line, # comments)
    #[arg(
        short = 'f',
        long = "file",
        value_name = "FILE",
        help_heading = "DOI Selection"
    )]
    pub file: Option<String>,

    /// List the DOIs that would be checked without resolving them
    #[arg(long = "dry-run", help_heading = "DOI Selection")]
    pub dry_run: bool,

    /// Save the CSV report to FILE (default: resolved_urls_crossref.csv)
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = DEFAULT_REPORT_FILE,
        help_heading = "Output Format"
    )]
    pub output: Option<String>,

    /// Print the report as JSON on stdout
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Print the report as CSV on stdout
    #[arg(long = "csv", help_heading = "Output Format")]
    pub csv: bool,

    /// Colored, aligned result lines with a header
    #[arg(short = 'p', long = "pretty", help_heading = "Output Format")]
    pub pretty: bool,

    /// Only show DOIs that do not resolve
    #[arg(long = "failures-only", help_heading = "Output Format")]
    pub failures_only: bool,

    /// Max concurrent resolution checks (default: 10, max: 100)
    #[arg(short = 'c', long = "concurrency", help_heading = "Performance")]
    pub concurrency: Option<usize>,

    /// Per-attempt timeout, e.g. 10s or 500ms (default: 10s)
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Performance")]
    pub timeout: Option<String>,

    /// Retries after a network error (default: 3)
    #[arg(long = "retries", value_name = "N", help_heading = "Performance")]
    pub retries: Option<u32>,

    /// Contact address sent to Crossref for the polite pool
    #[arg(long = "mailto", value_name = "EMAIL", help_heading = "Configuration")]
    pub mailto: Option<String>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Show detailed debug information and error messages
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// Output choices that do not live in `CheckConfig`.
#[derive(Debug, Clone, Default, PartialEq)]
struct OutputSettings {
    file: Option<String>,
    pretty: bool,
    failures_only: bool,
}

/// Fully merged settings for one run.
#[derive(Debug, Clone, Default)]
struct Settings {
    check: CheckConfig,
    output: OutputSettings,
}

/// JSON report printed with `--json`.
#[derive(Serialize)]
struct JsonReport<'a> {
    source: &'a str,
    cancelled: bool,
    summary: SummaryCounts,
    results: Vec<&'a ResolutionResult>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Validate arguments
    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    init_logging(&args);
    info!(version = env!("CARGO_PKG_VERSION"), "doi-check starting");

    if let Err(e) = run_doi_check(args).await {
        eprintln!("Error: {}", e);
        if let Some(hint) = e.downcast_ref::<DoiCheckError>().and_then(registry_hint) {
            eprintln!("Hint: {}", hint);
        }
        process::exit(1);
    }
}

/// Extra guidance for registry failures, keyed on the HTTP status.
fn registry_hint(error: &DoiCheckError) -> Option<&'static str> {
    match error.status_code()? {
        404 => Some("Crossref does not know this prefix; check that it is registered with Crossref"),
        429 => Some("Crossref is rate limiting requests; wait a little and pass --mailto to use the polite pool"),
        500..=599 => Some("Crossref is having trouble; try again later"),
        _ => None,
    }
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--debug` and `--verbose` pick the level.
fn init_logging(args: &Args) {
    let level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,doi_check={0},doi_check_lib={0}", level))
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(args.debug)
        .try_init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    // Must have either a prefix or a file
    match (&args.prefix, &args.file) {
        (None, None) => {
            return Err("You must specify a DOI prefix or a file with --file".to_string());
        }
        (Some(_), Some(_)) => {
            return Err("Cannot specify both a prefix and --file".to_string());
        }
        _ => {}
    }

    if let Some(prefix) = &args.prefix {
        validate_prefix(prefix).map_err(|e| e.to_string())?;
    }

    // Can't have multiple output formats
    if args.json && args.csv {
        return Err("Cannot specify multiple output formats (--json, --csv)".to_string());
    }

    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > 100 {
            return Err("Concurrency must be between 1 and 100".to_string());
        }
    }

    if let Some(timeout) = &args.timeout {
        match parse_duration_string(timeout) {
            Some(d) if !d.is_zero() => {}
            _ => {
                return Err(format!(
                    "Invalid timeout '{}'. Use a format like '10s', '500ms' or '1m'",
                    timeout
                ));
            }
        }
    }

    if matches!(&args.output, Some(path) if path.trim().is_empty()) {
        return Err("Output file name cannot be empty".to_string());
    }

    Ok(())
}

/// Main checking logic
async fn run_doi_check(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let settings = build_config(&args)?;
    let structured = args.json || args.csv;
    let checker = DoiChecker::with_config(settings.check.clone())?;

    // Collect the DOIs to check
    let (source, dois) = if let Some(path) = &args.file {
        (path.clone(), read_dois_from_file(path).await?)
    } else {
        let raw = args.prefix.as_deref().unwrap_or_default();
        let prefix = validate_prefix(raw)?;
        let spinner = if structured {
            None
        } else {
            ui::Spinner::start(format!("Fetching DOIs for prefix {}...", prefix))
        };
        let fetched = checker.fetch_dois(prefix).await;
        if let Some(s) = spinner {
            s.stop().await;
        }
        let dois = fetched?;

        if dois.is_empty() {
            if structured {
                eprintln!("No DOIs found for this prefix.");
            } else {
                println!("No DOIs found for this prefix.");
            }
            return Ok(());
        }
        (format!("prefix {}", prefix), dois)
    };

    // Dry-run: print DOIs and exit without resolving
    if args.dry_run {
        if args.json {
            println!("{}", serde_json::to_string_pretty(&dois)?);
        } else {
            for doi in &dois {
                println!("{}", doi);
            }
        }
        eprintln!("{} DOIs would be checked", dois.len());
        return Ok(());
    }

    if settings.output.pretty && !structured {
        ui::print_header(&source, dois.len(), checker.config());
    }

    // Ctrl-C stops new checks; whatever finished is still reported
    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, stopping after in-flight checks are dropped");
                cancel.cancel();
            }
        })
    };

    let start_time = std::time::Instant::now();
    let mut observer = ProgressPrinter {
        show: !structured,
        pretty: settings.output.pretty,
        failures_only: settings.output.failures_only,
        debug: args.debug,
    };
    let table = checker
        .check_dois_with_cancel(&dois, &cancel, &mut observer)
        .await;
    let duration = start_time.elapsed();
    ctrl_c.abort();

    let cancelled = cancel.is_cancelled();
    if cancelled {
        eprintln!(
            "Interrupted: {} of {} DOIs checked",
            table.len(),
            dois.len()
        );
    }

    display_results(&table, &source, &settings.output, &args, duration, cancelled)?;

    if let Some(path) = &settings.output.file {
        save_report(&table, path).await?;
        if structured {
            eprintln!("Results saved to {}", path);
        } else {
            println!("Results saved to {}", path);
        }
    }

    Ok(())
}

/// Prints one line per completed DOI.
struct ProgressPrinter {
    show: bool,
    pretty: bool,
    failures_only: bool,
    debug: bool,
}

impl RunObserver for ProgressPrinter {
    fn on_result(&mut self, completed: usize, total: usize, result: &ResolutionResult) {
        if !self.show || (self.failures_only && result.resolved) {
            return;
        }
        let counter = Some((completed, total));
        if self.pretty {
            ui::print_result(result, self.debug, counter);
        } else {
            ui::print_result_default(result, self.debug, counter);
        }
    }
}

/// Build run settings from CLI arguments with config file integration.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments (explicit user input)
/// 2. Environment variables (DC_*)
/// 3. Local config file (./.doi-check.toml)
/// 4. Global config file (~/.doi-check.toml)
/// 5. XDG config file (~/.config/doi-check/config.toml)
/// 6. Built-in defaults
fn build_config(args: &Args) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = Settings::default();
    let config_manager = ConfigManager::new(args.verbose);
    let env_config = load_env_config();

    // Step 1: An explicit file replaces discovery
    let explicit = args
        .config
        .as_deref()
        .map(|path| (path, "CLI --config"))
        .or_else(|| env_config.config.as_deref().map(|path| (path, "DC_CONFIG")));

    if let Some((path, origin)) = explicit {
        info!(path, origin, "using explicit config file");
        let file_config = config_manager
            .load_file(path)
            .map_err(|e| format!("Failed to load config file '{}': {}", path, e))?;
        settings = merge_file_config(settings, file_config);
    } else {
        match config_manager.discover_and_load() {
            Ok(file_config) => settings = merge_file_config(settings, file_config),
            Err(e) => warn!(error = %e, "config discovery failed, using defaults"),
        }
    }

    // Step 2: Environment variables
    settings = apply_environment_config(settings, &env_config);

    // Step 3: CLI arguments (highest precedence)
    settings = apply_cli_args_to_config(settings, args)?;

    debug!(?settings, "resolved settings");
    Ok(settings)
}

/// Merge FileConfig into the run settings.
fn merge_file_config(mut settings: Settings, file_config: FileConfig) -> Settings {
    if let Some(defaults) = file_config.defaults {
        if let Some(concurrency) = defaults.concurrency {
            settings.check = settings.check.with_concurrency(concurrency);
        }
        if let Some(timeout) = defaults.timeout.as_deref().and_then(parse_duration_string) {
            settings.check.timeout = timeout;
        }
        if let Some(retries) = defaults.retries {
            settings.check.max_retries = retries;
        }
        if let Some(delay) = defaults
            .retry_delay
            .as_deref()
            .and_then(parse_duration_string)
        {
            settings.check.retry_delay = delay;
        }
        if let Some(page_size) = defaults.page_size {
            settings.check = settings.check.with_page_size(page_size);
        }
        if let Some(delay) = defaults
            .page_delay
            .as_deref()
            .and_then(parse_duration_string)
        {
            settings.check.page_delay = delay;
        }
    }

    if let Some(endpoints) = file_config.endpoints {
        if let Some(url) = endpoints.registry_url {
            settings.check.registry_url = url;
        }
        if let Some(url) = endpoints.resolver_url {
            settings.check.resolver_url = url;
        }
        if endpoints.mailto.is_some() {
            settings.check.mailto = endpoints.mailto;
        }
    }

    if let Some(output) = file_config.output {
        if output.file.is_some() {
            settings.output.file = output.file;
        }
        if let Some(pretty) = output.pretty {
            settings.output.pretty = pretty;
        }
        if let Some(failures_only) = output.failures_only {
            settings.output.failures_only = failures_only;
        }
    }

    settings
}

/// Apply `DC_*` environment values over file settings.
fn apply_environment_config(
    mut settings: Settings,
    env_config: &doi_check_lib::EnvConfig,
) -> Settings {
    if let Some(concurrency) = env_config.concurrency {
        settings.check = settings.check.with_concurrency(concurrency);
    }
    if let Some(timeout) = env_config.timeout {
        settings.check.timeout = timeout;
    }
    if let Some(retries) = env_config.retries {
        settings.check.max_retries = retries;
    }
    if let Some(delay) = env_config.retry_delay {
        settings.check.retry_delay = delay;
    }
    if let Some(url) = &env_config.registry_url {
        settings.check.registry_url = url.clone();
    }
    if let Some(url) = &env_config.resolver_url {
        settings.check.resolver_url = url.clone();
    }
    if env_config.mailto.is_some() {
        settings.check.mailto = env_config.mailto.clone();
    }
    if env_config.output.is_some() {
        settings.output.file = env_config.output.clone();
    }

    settings
}

/// Apply CLI arguments to settings (highest precedence).
///
/// Only flags the user actually passed override lower layers.
fn apply_cli_args_to_config(
    mut settings: Settings,
    args: &Args,
) -> Result<Settings, Box<dyn std::error::Error>> {
    if let Some(concurrency) = args.concurrency {
        settings.check = settings.check.with_concurrency(concurrency);
    }
    if let Some(timeout) = &args.timeout {
        settings.check.timeout = parse_duration_string(timeout)
            .ok_or_else(|| format!("Invalid timeout '{}'", timeout))?;
    }
    if let Some(retries) = args.retries {
        settings.check.max_retries = retries;
    }
    if let Some(mailto) = &args.mailto {
        settings.check.mailto = Some(mailto.clone());
    }
    if args.output.is_some() {
        settings.output.file = args.output.clone();
    }

    // Boolean flags only ever switch a mode on
    if args.pretty {
        settings.output.pretty = true;
    }
    if args.failures_only {
        settings.output.failures_only = true;
    }

    Ok(settings)
}

/// Read DOIs from a file, reporting lines that are not DOIs.
async fn read_dois_from_file(file_path: &str) -> Result<Vec<Doi>, Box<dyn std::error::Error>> {
    let content = tokio::fs::read_to_string(file_path)
        .await
        .map_err(|e| format!("Cannot read '{}': {}", file_path, e))?;

    let (dois, invalid) = parse_doi_list(&content);

    if !invalid.is_empty() {
        eprintln!("Found {} invalid entries in the file:", invalid.len());
        for error in invalid.iter().take(5) {
            eprintln!("  {}", error);
        }
        if invalid.len() > 5 {
            eprintln!("  ... and {} more invalid entries", invalid.len() - 5);
        }
        eprintln!();
    }

    if dois.is_empty() {
        return Err("No valid DOIs found in the file.".into());
    }

    Ok(dois)
}

/// Write the full CSV report to `path`.
async fn save_report(table: &ReportTable, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    tokio::fs::write(path, table.to_csv())
        .await
        .map_err(|e| format!("Failed to write report '{}': {}", path, e))?;
    info!(path, rows = table.len(), "report saved");
    Ok(())
}

fn display_results(
    table: &ReportTable,
    source: &str,
    output: &OutputSettings,
    args: &Args,
    duration: std::time::Duration,
    cancelled: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if args.json {
        display_json_results(table, source, output.failures_only, cancelled)?;
    } else if args.csv {
        display_csv_results(table, output.failures_only)?;
    } else {
        display_text_results(table, duration, cancelled);
    }

    Ok(())
}

/// Display results in JSON format
fn display_json_results(
    table: &ReportTable,
    source: &str,
    failures_only: bool,
    cancelled: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = JsonReport {
        source,
        cancelled,
        summary: table.summarize(),
        results: select_rows(table, failures_only),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Display results in CSV format
fn display_csv_results(
    table: &ReportTable,
    failures_only: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    use std::io::Write;

    let csv = if failures_only {
        table.failures().cloned().collect::<ReportTable>().to_csv()
    } else {
        table.to_csv()
    };

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    handle.write_all(&csv)?;
    handle.flush()?;
    Ok(())
}

/// Summary and failure list after the streamed progress lines.
fn display_text_results(table: &ReportTable, duration: std::time::Duration, cancelled: bool) {
    println!();
    ui::print_summary(&table.summarize(), duration, cancelled);
    if table.failures().next().is_some() {
        println!();
        ui::print_failures(table.failures());
    }
}

fn select_rows(table: &ReportTable, failures_only: bool) -> Vec<&ResolutionResult> {
    if failures_only {
        table.failures().collect()
    } else {
        table.iter().collect()
    }
}

// doi-check/src/main.rs tests module

#[cfg(test)]
mod tests {
    use super::*;
    use doi_check_lib::{DefaultsConfig, EndpointsConfig, EnvConfig, OutputConfig};
    use std::time::Duration;

    // Helper function with all required fields
    fn create_test_args() -> Args {
        Args {
            prefix: Some("10.1234".to_string()),
            file: None,
            dry_run: false,
            output: None,
            json: false,
            csv: false,
            pretty: false,
            failures_only: false,
            concurrency: None,
            timeout: None,
            retries: None,
            mailto: None,
            config: None,
            debug: false,
            verbose: false,
        }
    }

    fn table() -> ReportTable {
        vec![
            ResolutionResult::from_response(Doi::new("10.1234/a"), "https://x.org/a", 200, 1),
            ResolutionResult::from_response(Doi::new("10.1234/b"), "https://doi.org/10.1234/b", 404, 1),
            ResolutionResult::unreachable(Doi::new("10.1234/c"), 4),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_validate_args_requires_source() {
        let mut args = create_test_args();
        args.prefix = None;
        let result = validate_args(&args);
        assert!(result.unwrap_err().contains("prefix or a file"));
    }

    #[test]
    fn test_validate_args_prefix_and_file_conflict() {
        let mut args = create_test_args();
        args.file = Some("dois.txt".to_string());
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_file_only() {
        let mut args = create_test_args();
        args.prefix = None;
        args.file = Some("dois.txt".to_string());
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_validate_args_bad_prefix() {
        let mut args = create_test_args();
        args.prefix = Some("11.1234".to_string());
        assert!(validate_args(&args).is_err());

        args.prefix = Some("10.1234/abc".to_string());
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_json_and_csv_conflict() {
        let mut args = create_test_args();
        args.json = true;
        args.csv = true;
        let result = validate_args(&args);
        assert!(result.unwrap_err().contains("multiple output formats"));
    }

    #[test]
    fn test_validate_args_concurrency_bounds() {
        let mut args = create_test_args();
        args.concurrency = Some(0);
        assert!(validate_args(&args).is_err());
        args.concurrency = Some(101);
        assert!(validate_args(&args).is_err());
        args.concurrency = Some(100);
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_validate_args_timeout_format() {
        let mut args = create_test_args();
        args.timeout = Some("soon".to_string());
        assert!(validate_args(&args).is_err());
        args.timeout = Some("0s".to_string());
        assert!(validate_args(&args).is_err());
        args.timeout = Some("750ms".to_string());
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_output_flag_default_file_name() {
        let args = Args::try_parse_from(["doi-check", "10.1234", "-o"]).unwrap();
        assert_eq!(args.output.as_deref(), Some(DEFAULT_REPORT_FILE));

        let args = Args::try_parse_from(["doi-check", "10.1234", "-o", "out.csv"]).unwrap();
        assert_eq!(args.output.as_deref(), Some("out.csv"));

        let args = Args::try_parse_from(["doi-check", "10.1234"]).unwrap();
        assert_eq!(args.output, None);
    }

    #[test]
    fn test_file_config_merge() {
        let file_config = FileConfig {
            defaults: Some(DefaultsConfig {
                concurrency: Some(25),
                timeout: Some("5s".to_string()),
                retries: Some(1),
                retry_delay: Some("500ms".to_string()),
                page_size: Some(200),
                page_delay: None,
            }),
            endpoints: Some(EndpointsConfig {
                registry_url: None,
                resolver_url: Some("https://resolver.example".to_string()),
                mailto: Some("ops@example.org".to_string()),
            }),
            output: Some(OutputConfig {
                file: Some("report.csv".to_string()),
                pretty: Some(true),
                failures_only: None,
            }),
        };

        let settings = merge_file_config(Settings::default(), file_config);

        assert_eq!(settings.check.concurrency, 25);
        assert_eq!(settings.check.timeout, Duration::from_secs(5));
        assert_eq!(settings.check.max_retries, 1);
        assert_eq!(settings.check.retry_delay, Duration::from_millis(500));
        assert_eq!(settings.check.page_size, 200);
        assert_eq!(settings.check.page_delay, Duration::from_secs(1));
        assert_eq!(settings.check.registry_url, "https://api.crossref.org");
        assert_eq!(settings.check.resolver_url, "https://resolver.example");
        assert_eq!(settings.check.mailto.as_deref(), Some("ops@example.org"));
        assert_eq!(settings.output.file.as_deref(), Some("report.csv"));
        assert!(settings.output.pretty);
        assert!(!settings.output.failures_only);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut settings = Settings::default();
        settings.check.concurrency = 25;
        settings.output.file = Some("from-file.csv".to_string());

        let env_config = EnvConfig {
            concurrency: Some(40),
            retries: Some(0),
            output: Some("from-env.csv".to_string()),
            ..EnvConfig::default()
        };

        let settings = apply_environment_config(settings, &env_config);
        assert_eq!(settings.check.concurrency, 40);
        assert_eq!(settings.check.max_retries, 0);
        assert_eq!(settings.output.file.as_deref(), Some("from-env.csv"));
    }

    #[test]
    fn test_cli_overrides_env_only_when_given() {
        let mut settings = Settings::default();
        settings.check.concurrency = 40;
        settings.check.max_retries = 0;
        settings.output.pretty = true;

        // Nothing passed: lower layers survive
        let args = create_test_args();
        let kept = apply_cli_args_to_config(settings.clone(), &args).unwrap();
        assert_eq!(kept.check.concurrency, 40);
        assert_eq!(kept.check.max_retries, 0);
        assert!(kept.output.pretty);

        let mut args = create_test_args();
        args.concurrency = Some(5);
        args.retries = Some(2);
        args.timeout = Some("3s".to_string());
        args.output = Some("cli.csv".to_string());
        args.failures_only = true;
        let overridden = apply_cli_args_to_config(settings, &args).unwrap();
        assert_eq!(overridden.check.concurrency, 5);
        assert_eq!(overridden.check.max_retries, 2);
        assert_eq!(overridden.check.timeout, Duration::from_secs(3));
        assert_eq!(overridden.output.file.as_deref(), Some("cli.csv"));
        assert!(overridden.output.failures_only);
        assert!(overridden.output.pretty);
    }

    #[test]
    fn test_registry_hint_uses_status_code() {
        let not_found = DoiCheckError::registry("10.1234", 404);
        assert!(registry_hint(&not_found).unwrap().contains("registered"));

        let busy = DoiCheckError::registry("10.1234", 503);
        assert!(registry_hint(&busy).unwrap().contains("try again"));

        let throttled = DoiCheckError::registry("10.1234", 429);
        assert!(registry_hint(&throttled).unwrap().contains("--mailto"));

        assert_eq!(registry_hint(&DoiCheckError::registry("10.1234", 400)), None);
        assert_eq!(registry_hint(&DoiCheckError::network("connection reset")), None);
    }

    #[test]
    fn test_select_rows_failures_only() {
        let table = table();
        assert_eq!(select_rows(&table, false).len(), 3);

        let failures = select_rows(&table, true);
        let dois: Vec<&str> = failures.iter().map(|r| r.doi.as_str()).collect();
        assert_eq!(dois, vec!["10.1234/b", "10.1234/c"]);
    }

    #[test]
    fn test_json_report_shape() {
        let table = table();
        let report = JsonReport {
            source: "prefix 10.1234",
            cancelled: false,
            summary: table.summarize(),
            results: select_rows(&table, false),
        };
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["summary"]["resolved"], 1);
        assert_eq!(value["summary"]["unresolved"], 2);
        assert_eq!(value["results"][0]["status"], 200);
        assert_eq!(value["results"][2]["status"], "Timeout/Error");
    }

    #[tokio::test]
    async fn test_read_dois_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dois.txt");
        std::fs::write(
            &path,
            "# header\n10.1234/abc\nhttps://doi.org/10.1234/def\n\nnot-a-doi\n",
        )
        .unwrap();

        let dois = read_dois_from_file(path.to_str().unwrap()).await.unwrap();
        assert_eq!(dois, vec![Doi::new("10.1234/abc"), Doi::new("10.1234/def")]);
    }

    #[tokio::test]
    async fn test_read_dois_from_missing_file() {
        let err = tokio_test::assert_err!(read_dois_from_file("/definitely/not/here.txt").await);
        assert!(err.to_string().contains("Cannot read"));
    }

    #[tokio::test]
    async fn test_save_report_writes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        save_report(&table(), path.to_str().unwrap()).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("DOI,Resolved URL,Resolves,HTTP Status Code\r\n"));
        assert_eq!(written.lines().count(), 4);
    }
}
