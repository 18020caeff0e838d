mod collaborator;
mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing::info;
use tracing_subscriber::EnvFilter;

use plan_session::{RewriteOutcome, Session, SessionConfig, Timestamp};

use crate::collaborator::ProcessCollaborator;

#[derive(Parser)]
#[command(name = "planmd", version, about = "Business-plan Markdown tools")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log debug events to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Session settings (TOML): lock window, export file name, section catalog
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the block structure of a Markdown file
    Parse(ParseArgs),

    /// Print a Markdown file in normalized form
    Normalize(FileArgs),

    /// List section titles and suggest the next section to write
    Sections(FileArgs),

    /// Rewrite a document through an external collaborator program
    Rewrite(RewriteArgs),

    /// Run .test.md scenario files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct FileArgs {
    /// Markdown source file
    file: String,
}

#[derive(clap::Args)]
struct ParseArgs {
    /// Markdown source file
    file: String,

    /// Print blocks as JSON instead of Rust debug output
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
struct RewriteArgs {
    /// Markdown source file
    file: String,

    /// What the collaborator should do with the document
    #[arg(short, long)]
    instruction: String,

    /// Section titles to lock before rewriting. Repeatable.
    #[arg(short, long)]
    lock: Vec<String>,

    /// Directory to write the exported document to
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Collaborator program and its arguments (after --)
    #[arg(last = true, required = true)]
    command: Vec<String>,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.md file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let exit_code = match cli.command {
        Command::Parse(args) => do_parse(args),
        Command::Normalize(args) => {
            let source = read_source(&args.file);
            println!("{}", planmd::serialize(&planmd::parse(&source)));
            0
        }
        Command::Sections(args) => {
            do_sections(args, &load_config(cli.config.as_deref()), color_choice)
        }
        Command::Rewrite(args) => do_rewrite(args, &load_config(cli.config.as_deref())),
        Command::Test(args) => {
            let path = Path::new(&args.path);
            if args.list_categories {
                test_runner::list_categories(path);
                0
            } else {
                test_runner::run_tests(path, cli.no_color, &args.category)
            }
        }
    };
    process::exit(exit_code);
}

/// Filter used when `RUST_LOG` is not set.
fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "planmd=debug,plan_session=debug"
    } else {
        "planmd=info,plan_session=info"
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn read_source(file: &str) -> String {
    match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", file, e);
            process::exit(1);
        }
    }
}

fn load_config(path: Option<&Path>) -> SessionConfig {
    let Some(path) = path else {
        return SessionConfig::default();
    };
    match SessionConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

/// A session holding `source` as it was on disk. File content predates the
/// session, so its sections count as never edited and none start locked.
fn session_for(source: &str, config: &SessionConfig) -> Session {
    let mut session = Session::new(config);
    session.load_external(source, Timestamp::ZERO);
    session
}

fn do_parse(args: ParseArgs) -> i32 {
    let source = read_source(&args.file);
    let blocks = planmd::parse(&source);

    if !args.json {
        println!("{:#?}", blocks);
        return 0;
    }
    match serde_json::to_string_pretty(&blocks) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("error: cannot encode blocks: {}", e);
            1
        }
    }
}

fn do_sections(args: FileArgs, config: &SessionConfig, color_choice: ColorChoice) -> i32 {
    let source = read_source(&args.file);

    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());

    let writer = StandardStream::stderr(color_choice);
    let term_config = term::Config::default();
    for warning in planmd::section::duplicate_sections(&source, file_id) {
        let _ = term::emit_to_write_style(
            &mut writer.lock(),
            &term_config,
            &files,
            &warning.to_diagnostic(),
        );
    }

    for heading in planmd::section::headings(&source) {
        println!("{:>5}  {}", heading.line, heading.title);
    }

    let session = session_for(&source, config);
    match session.next_suggested_section() {
        Some(title) => println!("next: {}", title),
        None => println!("next: (all catalog sections present)"),
    }
    0
}

fn do_rewrite(args: RewriteArgs, config: &SessionConfig) -> i32 {
    let source = read_source(&args.file);
    let Some(collaborator) = ProcessCollaborator::from_command(&args.command) else {
        eprintln!("error: no collaborator command given");
        return 1;
    };

    let mut session = session_for(&source, config);
    for title in &args.lock {
        if !session.set_locked(title, true) {
            eprintln!("warning: no section titled '{}' to lock", title);
        }
    }

    let outcome = session.request_rewrite(&collaborator, &args.instruction, Timestamp::now());
    match outcome {
        RewriteOutcome::Failed { status } => {
            eprintln!("error: {}", status);
            return 1;
        }
        RewriteOutcome::Applied { touched_locked, .. } => {
            for title in touched_locked {
                eprintln!("warning: locked section '{}' was changed by the rewrite", title);
            }
        }
    }

    if let Some(status) = session.status() {
        println!("{}", status);
    }
    for finding in session.findings() {
        println!("[{:?}] {}", finding.kind, finding.text);
    }
    if let Some(question) = session.next_question() {
        println!("next question: {}", question);
    }

    match session.export().write_to(&args.out) {
        Ok(path) => {
            info!(path = %path.display(), "rewrite exported");
            println!("wrote {}", path.display());
            0
        }
        Err(e) => {
            eprintln!("error: {}", e);
            1
        }
    }
}
