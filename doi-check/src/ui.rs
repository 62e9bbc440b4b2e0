//! Terminal display logic for the doi-check CLI.
//!
//! Handles the fetch spinner, per-result progress lines, the header, the
//! summary with its proportional bar, and the failed-DOI listing. Uses only
//! the `console` crate.

use console::{pad_str, style, Alignment, Term};
use doi_check_lib::{CheckConfig, ResolutionResult, SummaryCounts};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ── Spinner ──────────────────────────────────────────────────────────────────

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Width of the summary bar in cells.
const BAR_WIDTH: usize = 40;

/// Width of the DOI column in progress lines.
const DOI_WIDTH: usize = 40;

/// An async braille-dot spinner that writes to stderr so stdout stays clean.
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    /// Start a spinner with the given message.
    ///
    /// Returns `None` when stderr is not a terminal.
    pub fn start(message: String) -> Option<Self> {
        if !Term::stderr().is_term() {
            return None;
        }

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = tokio::spawn(async move {
            let term = Term::stderr();
            let mut idx = 0usize;
            while running_clone.load(Ordering::Relaxed) {
                let frame = SPINNER_FRAMES[idx % SPINNER_FRAMES.len()];
                let _ = term.clear_line();
                let _ = term.write_str(&format!("{} {}", style(frame).cyan(), message));
                idx += 1;
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            let _ = term.clear_line();
        });

        Some(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Stop the spinner and clear the line.
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a styled header before the first result.
pub fn print_header(source: &str, doi_count: usize, config: &CheckConfig) {
    println!(
        "{} {} {}",
        style("doi-check").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!(
            "Checking {} DOI{} from {}",
            doi_count,
            plural(doi_count),
            source
        ))
        .dim(),
    );
    println!(
        "{}",
        style(format!(
            "Concurrency: {} | Timeout: {}s | Retries: {}",
            config.concurrency,
            config.timeout.as_secs(),
            config.max_retries
        ))
        .dim()
    );
    println!();
}

// ── Single result line ───────────────────────────────────────────────────────

/// Format and print a single result with colors and alignment.
///
/// If `counter` is Some((current, total)), a progress prefix like `[3/8]` is shown.
pub fn print_result(result: &ResolutionResult, debug: bool, counter: Option<(usize, usize)>) {
    let padded_doi = pad_str(result.doi.as_str(), DOI_WIDTH, Alignment::Left, Some(".."));

    let status = if result.resolved {
        style(format!("RESOLVES  {}", result.status)).green().bold()
    } else if result.status.code().is_some() {
        style(format!("BROKEN    {}", result.status)).red().bold()
    } else {
        style(format!("ERROR     {}", result.status)).yellow().bold()
    };

    println!(
        "  {}{}  {}  {}",
        counter_prefix(counter),
        style(&padded_doi).white(),
        status,
        style(&result.resolved_url).dim(),
    );

    if debug {
        println!(
            "    {} {} attempt{}",
            style("└─").dim(),
            result.attempts,
            plural(result.attempts as usize),
        );
    }
}

/// Plain progress line, one per result, in the form
/// `[n/total] DOI -> URL (status)`.
pub fn print_result_default(
    result: &ResolutionResult,
    debug: bool,
    counter: Option<(usize, usize)>,
) {
    println!("{}", format_result_line(result, counter));
    if debug {
        println!("  attempts: {}", result.attempts);
    }
}

fn format_result_line(result: &ResolutionResult, counter: Option<(usize, usize)>) -> String {
    let prefix = match counter {
        Some((cur, total)) => format!("[{}/{}] ", cur, total),
        None => String::new(),
    };
    format!(
        "{}{} -> {} ({})",
        prefix, result.doi, result.resolved_url, result.status
    )
}

fn counter_prefix(counter: Option<(usize, usize)>) -> String {
    match counter {
        Some((cur, total)) => format!("{} ", style(format!("[{}/{}]", cur, total)).dim()),
        None => String::new(),
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the final counts with a proportional resolved/unresolved bar.
pub fn print_summary(summary: &SummaryCounts, duration: Duration, cancelled: bool) {
    let total = summary.total();
    println!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );
    println!(
        "  {} DOI{} in {:.1}s  {}  {}  {}  {}{}",
        style(total).bold(),
        plural(total),
        duration.as_secs_f64(),
        style("|").dim(),
        style(format!("{} resolve", summary.resolved)).green(),
        style("|").dim(),
        style(format!("{} do not resolve", summary.unresolved)).red(),
        if cancelled {
            format!("  {}", style("(interrupted)").yellow())
        } else {
            String::new()
        },
    );

    if total > 0 {
        let (good, bad) = bar_cells(summary, BAR_WIDTH);
        println!(
            "  {}{}  {:.1}% resolve",
            style("█".repeat(good)).green(),
            style("█".repeat(bad)).red(),
            percent(summary.resolved, total),
        );
    }
}

/// Split `width` cells between resolved and unresolved counts.
///
/// Any non-zero share gets at least one cell.
fn bar_cells(summary: &SummaryCounts, width: usize) -> (usize, usize) {
    let total = summary.total();
    if total == 0 {
        return (0, 0);
    }

    let mut good = (summary.resolved * width + total / 2) / total;
    if summary.resolved > 0 && good == 0 {
        good = 1;
    }
    if summary.unresolved > 0 && good == width {
        good = width - 1;
    }
    (good, width - good)
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

// ── Failures ─────────────────────────────────────────────────────────────────

/// List every DOI that did not resolve, with its status.
pub fn print_failures<'a, I>(failures: I)
where
    I: IntoIterator<Item = &'a ResolutionResult>,
{
    let failures: Vec<&ResolutionResult> = failures.into_iter().collect();
    if failures.is_empty() {
        return;
    }

    println!(
        "  {}",
        style(format!("DOIs that do not resolve ({}):", failures.len())).yellow()
    );
    for result in failures {
        println!(
            "  {} {}  {}",
            style("•").dim(),
            result.doi,
            style(format!("({})", result.status)).dim(),
        );
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
