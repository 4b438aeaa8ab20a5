mod runner;
mod tap;

use std::io::Read;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use confetti_core::{Document, Event, ParseError, ParseOptions};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Confetti configuration language toolchain.
#[derive(Parser)]
#[command(
    name = "confetti",
    version,
    about = "Confetti configuration language toolchain"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log debug events to stderr (otherwise RUST_LOG decides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Recognize `//` and `/* */` comments
    #[arg(long, global = true)]
    c_style_comments: bool,

    /// Recognize parenthesized expression arguments
    #[arg(long, global = true)]
    expression_arguments: bool,

    /// Declare a punctuator argument such as `:` or `:=` (repeatable)
    #[arg(long = "punctuator", value_name = "P", global = true)]
    punctuators: Vec<String>,

    /// Maximum nesting of blocks and expressions
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn parse_options(&self) -> ParseOptions {
        let mut options =
            ParseOptions::default().with_punctuators(self.punctuators.iter().cloned());
        options.c_style_comments = self.c_style_comments;
        options.expression_arguments = self.expression_arguments;
        if let Some(depth) = self.max_depth {
            options.max_depth = depth;
        }
        options
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a file and print its directive tree
    Parse {
        /// Path to the Confetti file (`-` for stdin)
        file: PathBuf,
        /// Print the compact outline instead of the canonical rendering
        #[arg(long)]
        outline: bool,
    },

    /// Check a file for lexical and syntax errors
    Check {
        /// Path to the Confetti file (`-` for stdin)
        file: PathBuf,
    },

    /// List the traversal events of a parsed file
    Walk {
        /// Path to the Confetti file (`-` for stdin)
        file: PathBuf,
    },

    /// Run a conformance suite (grammar flags come from each test's markers)
    Conformance {
        /// Path to the conformance suite directory
        #[arg(default_value = "conformance")]
        suite_dir: PathBuf,
        /// Skip tests that need grammar extensions
        #[arg(long)]
        skip_extensions: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = cli.parse_options();
    match &cli.command {
        Commands::Parse { file, outline } => {
            cmd_parse(file, *outline, &options, cli.output, cli.quiet);
        }
        Commands::Check { file } => {
            cmd_check(file, &options, cli.output, cli.quiet);
        }
        Commands::Walk { file } => {
            cmd_walk(file, &options, cli.output, cli.quiet);
        }
        Commands::Conformance {
            suite_dir,
            skip_extensions,
        } => {
            cmd_conformance(suite_dir, *skip_extensions);
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// ── Input ────────────────────────────────────────────────────────────

fn display_name(file: &Path) -> String {
    if file == Path::new("-") {
        "<stdin>".to_string()
    } else {
        file.display().to_string()
    }
}

fn read_source(file: &Path) -> Result<String, String> {
    if file == Path::new("-") {
        let mut src = String::new();
        std::io::stdin()
            .read_to_string(&mut src)
            .map_err(|e| format!("error reading stdin: {}", e))?;
        return Ok(src);
    }
    std::fs::read_to_string(file)
        .map_err(|e| format!("error reading file '{}': {e}", file.display()))
}

/// Read and parse `file`, reporting any failure and exiting with status 1.
fn load(file: &Path, options: &ParseOptions, output: OutputFormat, quiet: bool) -> Document {
    let src = match read_source(file) {
        Ok(s) => s,
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    debug!(file = %display_name(file), bytes = src.len(), "read input");

    match confetti_core::parse_with(&src, options) {
        Ok(doc) => {
            debug!(
                directives = doc.len(),
                comments = doc.comments.len(),
                "parsed"
            );
            doc
        }
        Err(e) => {
            report_parse_error(file, &e, output, quiet);
            process::exit(1);
        }
    }
}

// ── Commands ─────────────────────────────────────────────────────────

fn cmd_parse(
    file: &Path,
    outline: bool,
    options: &ParseOptions,
    output: OutputFormat,
    quiet: bool,
) {
    let doc = load(file, options, output, quiet);
    match output {
        OutputFormat::Json => {
            let pretty = serde_json::to_string_pretty(&doc)
                .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
            println!("{}", pretty);
        }
        OutputFormat::Text if outline => {
            if !doc.is_empty() {
                println!("{}", doc.outline());
            }
        }
        OutputFormat::Text => print!("{}", doc),
    }
}

fn cmd_check(file: &Path, options: &ParseOptions, output: OutputFormat, quiet: bool) {
    let doc = load(file, options, output, quiet);
    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => {
            let result = serde_json::json!({
                "file": display_name(file),
                "ok": true,
                "directives": doc.len(),
                "comments": doc.comments.len(),
            });
            println!("{}", result);
        }
        OutputFormat::Text => {
            println!(
                "{}: ok ({} top-level directive(s), {} comment(s))",
                display_name(file),
                doc.len(),
                doc.comments.len()
            );
        }
    }
}

fn cmd_walk(file: &Path, options: &ParseOptions, output: OutputFormat, quiet: bool) {
    let doc = load(file, options, output, quiet);

    let mut events = Vec::new();
    let mut depth = 0usize;
    let _ = doc.walk(|event| {
        if let Event::LeaveBlock(_) = event {
            depth = depth.saturating_sub(1);
        }
        events.push(describe_event(&event, depth));
        if let Event::EnterBlock(_) = event {
            depth += 1;
        }
        ControlFlow::Continue(())
    });

    match output {
        OutputFormat::Json => {
            let pretty = serde_json::to_string_pretty(&events)
                .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
            println!("{}", pretty);
        }
        OutputFormat::Text => {
            for e in &events {
                let indent = "  ".repeat(e["depth"].as_u64().unwrap_or(0) as usize);
                println!(
                    "{}:{}\t{}{}",
                    e["line"],
                    e["column"],
                    indent,
                    e["text"].as_str().unwrap_or_default()
                );
            }
        }
    }
}

fn describe_event(event: &Event<'_>, depth: usize) -> serde_json::Value {
    let (kind, position, text) = match event {
        Event::Comment(c) => ("comment", c.position, format!("#{}", c.text)),
        Event::Directive(d) => {
            let mut text = d.name.to_string();
            for arg in &d.arguments {
                text.push(' ');
                text.push_str(&arg.to_string());
            }
            ("directive", d.position(), text)
        }
        Event::EnterBlock(d) => match &d.block {
            Some(block) => ("enter_block", block.open, "{".to_string()),
            None => ("enter_block", d.position(), "{".to_string()),
        },
        Event::LeaveBlock(d) => match &d.block {
            Some(block) => ("leave_block", block.close, "}".to_string()),
            None => ("leave_block", d.position(), "}".to_string()),
        },
    };
    serde_json::json!({
        "event": kind,
        "line": position.line,
        "column": position.column,
        "depth": depth,
        "text": text,
    })
}

fn cmd_conformance(suite_dir: &Path, skip_extensions: bool) {
    if !suite_dir.is_dir() {
        eprintln!(
            "error: conformance suite directory not found: {}",
            suite_dir.display()
        );
        process::exit(1);
    }

    // TAP output is the primary output; --quiet and --output do not apply.
    let tap = runner::run_suite(suite_dir, skip_extensions);
    print!("{}", tap.render());
    if tap.failures() > 0 {
        process::exit(1);
    }
}

// ── Error reporting ──────────────────────────────────────────────────

fn report_parse_error(file: &Path, e: &ParseError, output: OutputFormat, quiet: bool) {
    match output {
        OutputFormat::Json => {
            let mut value = e.to_json_value();
            if let Some(obj) = value.as_object_mut() {
                obj.insert("file".to_string(), display_name(file).into());
            }
            let err_json = serde_json::to_string_pretty(&value)
                .unwrap_or_else(|_| format!("{{\"error\": \"{:?}\"}}", e));
            eprintln!("{}", err_json);
        }
        OutputFormat::Text => {
            if !quiet {
                eprintln!(
                    "{}:{}:{}: {} error: {}",
                    display_name(file),
                    e.line,
                    e.column,
                    e.category(),
                    e.message
                );
            }
        }
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
