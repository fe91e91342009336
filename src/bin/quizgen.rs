//! CLI binary for edgequake-quizgen.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `QuizConfig` and prints the generated questions.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_quizgen::config::{
    DEFAULT_PRIMARY_MODEL, DEFAULT_PRIMARY_PROVIDER, DEFAULT_SECONDARY_URL, PRIMARY_MODEL_ENV,
    PRIMARY_PROVIDER_ENV, SECONDARY_KEY_ENV, SECONDARY_URL_ENV,
};
use edgequake_quizgen::{
    generate_from_input, write_questions, AnswerCheck, ChunkError, GenerationOutput,
    GenerationProgressCallback, ProgressCallback, QuestionRecord, QuizConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live progress bar with one log line per chunk and per diagnostic.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} chunks  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("Generating");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_generation_start(&self, total_chunks: usize) {
        self.bar.set_length(total_chunks as u64);
        self.bar.reset_eta();
    }

    fn on_diagnostic(&self, message: &str) {
        self.bar.println(format!("  {} {}", yellow("⚠"), dim(message)));
    }

    fn on_chunk_complete(&self, chunk_index: usize, provider: &str, question_count: usize) {
        self.bar.println(format!(
            "  {} Chunk {:>3}  {:<12} {}",
            green("✓"),
            chunk_index + 1,
            provider,
            dim(&format!("{question_count} questions")),
        ));
    }

    fn on_chunk_error(&self, chunk_index: usize, error: &ChunkError) {
        self.bar.println(format!(
            "  {} Chunk {:>3}  {}",
            red("✗"),
            chunk_index + 1,
            red(&error.to_string()),
        ));
    }

    fn on_progress(&self, completed: usize, _total: usize) {
        self.bar.set_position(completed as u64);
    }

    fn on_generation_complete(&self, total_chunks: usize, succeeded: usize, questions: usize) {
        self.bar.finish_and_clear();
        let failed = total_chunks.saturating_sub(succeeded);
        let mark = if failed == 0 { green("✔") } else { yellow("⚠") };
        eprintln!(
            "{} {} questions from {}/{} chunks",
            mark,
            bold(&questions.to_string()),
            succeeded,
            total_chunks
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract text first, then generate
  pdftotext lecture.pdf lecture.txt
  quizgen lecture.txt

  # Pipe extracted text in
  pdftotext lecture.pdf - | quizgen -

  # Save every question as JSON, show the first 10
  quizgen lecture.txt -o quiz.json --preview 10

  # Drop questions whose answer is not one of the options
  quizgen --answer-check strict lecture.txt

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY             Primary provider key (required)
  HF_API_KEY                 Fallback endpoint key (optional)
  QUIZGEN_PRIMARY_PROVIDER   Primary provider name (default: gemini)
  QUIZGEN_PRIMARY_MODEL      Primary model (default: gemini-1.5-flash)
  QUIZGEN_SECONDARY_URL      Fallback inference endpoint URL
  RUST_LOG                   Override log filtering
"#;

/// Generate multiple-choice quiz questions from extracted document text.
#[derive(Parser, Debug)]
#[command(
    name = "quizgen",
    version,
    about = "Generate multiple-choice quiz questions from extracted document text",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Extracted text file, HTTP/HTTPS URL, or `-` for stdin.
    input: String,

    /// Write all questions as JSON to this file.
    #[arg(short, long, env = "QUIZGEN_OUTPUT")]
    output: Option<PathBuf>,

    /// Fallback endpoint key; without it failed chunks are skipped.
    #[arg(long, env = SECONDARY_KEY_ENV, hide_env_values = true)]
    hf_api_key: Option<String>,

    /// Primary LLM provider.
    #[arg(long, env = PRIMARY_PROVIDER_ENV, default_value = DEFAULT_PRIMARY_PROVIDER)]
    provider: String,

    /// Primary model ID.
    #[arg(long, env = PRIMARY_MODEL_ENV, default_value = DEFAULT_PRIMARY_MODEL)]
    model: String,

    /// Fallback inference endpoint.
    #[arg(long, env = SECONDARY_URL_ENV, default_value = DEFAULT_SECONDARY_URL)]
    secondary_url: String,

    /// Characters per chunk.
    #[arg(long, env = "QUIZGEN_CHUNK_SIZE", default_value_t = 3000)]
    chunk_size: usize,

    /// Reject input shorter than this many characters.
    #[arg(long, env = "QUIZGEN_MIN_CHARS", default_value_t = 500)]
    min_chars: usize,

    /// Questions requested per chunk.
    #[arg(long, env = "QUIZGEN_QUESTIONS", default_value_t = 3)]
    questions: usize,

    /// Chunks processed at once (1 = sequential).
    #[arg(short, long, env = "QUIZGEN_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// What to do when an answer is not among the options.
    #[arg(long, env = "QUIZGEN_ANSWER_CHECK", value_enum, default_value = "warn")]
    answer_check: AnswerCheckArg,

    /// Number of questions to print.
    #[arg(long, env = "QUIZGEN_PREVIEW", default_value_t = 5)]
    preview: usize,

    /// Print the full GenerationOutput as JSON instead of a preview.
    #[arg(long, env = "QUIZGEN_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "QUIZGEN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "QUIZGEN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "QUIZGEN_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "QUIZGEN_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Primary call timeout in seconds.
    #[arg(long, env = "QUIZGEN_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Fallback call timeout in seconds.
    #[arg(long, env = "QUIZGEN_SECONDARY_TIMEOUT", default_value_t = 60)]
    secondary_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum AnswerCheckArg {
    Off,
    Warn,
    Strict,
}

impl From<AnswerCheckArg> for AnswerCheck {
    fn from(v: AnswerCheckArg) -> Self {
        match v {
            AnswerCheckArg::Off => AnswerCheck::Off,
            AnswerCheckArg::Warn => AnswerCheck::Warn,
            AnswerCheckArg::Strict => AnswerCheck::Strict,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar already reports per-chunk outcomes.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn GenerationProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run generation ───────────────────────────────────────────────────
    let output = generate_from_input(&cli.input, &config)
        .await
        .context("Question generation failed")?;

    if let Some(ref path) = cli.output {
        write_questions(&output, path)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        print_preview(&output, cli.preview).context("Failed to write to stdout")?;
        print_summary(&output, cli.output.as_ref(), show_progress);
    }

    Ok(())
}

/// Map CLI args to `QuizConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<QuizConfig> {
    // The primary key is only read from the environment, where the provider
    // factory also looks for it.
    let mut builder = QuizConfig::builder()
        .with_env()
        .chunk_size(cli.chunk_size)
        .min_text_chars(cli.min_chars)
        .questions_per_chunk(cli.questions)
        .primary_provider(&cli.provider)
        .primary_model(&cli.model)
        .secondary_url(&cli.secondary_url)
        .concurrency(cli.concurrency)
        .answer_check(cli.answer_check.into())
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout)
        .secondary_timeout_secs(cli.secondary_timeout);

    if let Some(ref key) = cli.hf_api_key {
        builder = builder.secondary_api_key(key);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_preview(output: &GenerationOutput, n: usize) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let preview = output.preview(n);
    if preview.is_empty() {
        writeln!(out, "No questions were generated.")?;
        return Ok(());
    }
    for (i, q) in preview.iter().enumerate() {
        write_question(&mut out, i + 1, q)?;
    }
    if output.questions.len() > preview.len() {
        writeln!(
            out,
            "{}",
            dim(&format!(
                "… and {} more",
                output.questions.len() - preview.len()
            ))
        )?;
    }
    Ok(())
}

fn write_question(out: &mut impl Write, number: usize, q: &QuestionRecord) -> io::Result<()> {
    writeln!(out, "{}", bold(&format!("Q{number}: {}", q.question)))?;
    for option in &q.options {
        writeln!(out, "  - {option}")?;
    }
    if !q.correct_answer.is_empty() {
        writeln!(out, "  Correct: {}", green(&q.correct_answer))?;
    }
    writeln!(out)
}

fn print_summary(output: &GenerationOutput, path: Option<&PathBuf>, show_progress: bool) {
    let stats = &output.stats;
    // The progress callback already printed the totals line.
    if !show_progress {
        eprintln!(
            "Generated {} questions from {}/{} chunks in {}ms",
            stats.total_questions, stats.succeeded_chunks, stats.total_chunks, stats.total_duration_ms
        );
    }
    if stats.fallback_chunks > 0 {
        eprintln!("   {} chunks answered by the fallback provider", stats.fallback_chunks);
    }
    if stats.failed_chunks > 0 {
        eprintln!("   {}", red(&format!("{} chunks produced no questions", stats.failed_chunks)));
    }
    if stats.rejected_questions > 0 {
        eprintln!("   {} questions rejected by answer check", stats.rejected_questions);
    }
    if let Some(path) = path {
        eprintln!("   →  {}", bold(&path.display().to_string()));
    }
}
