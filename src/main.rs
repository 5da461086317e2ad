use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use miette::{Context, IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use sieve_core::{CommentBatch, Env, OutputFormat, SieveConfig};
use sieve_review::event::PullRequestContext;
use sieve_review::github::GitHubClient;
use sieve_review::host::{DryRunHost, ReviewHost};
use sieve_review::llm::LlmClient;
use sieve_review::pipeline::{ReviewPipeline, RunReport};
use sieve_review::source::{DiffSource, GitDiffSource, PatchDiffSource};

#[derive(Parser)]
#[command(
    name = "sieve",
    version,
    about = "Turns LLM code-review replies into pull request comments",
    long_about = "Sieve asks a language model to review each changed file of a pull request,\n\
                   interprets the free-form reply, and publishes the findings as line comments\n\
                   plus one summary block that is updated in place on every run.\n\n\
                   Examples:\n  \
                     sieve review                          Review the PR of the current GitHub Actions run\n  \
                     sieve review --pr owner/repo#12       Review a pull request by reference\n  \
                     sieve review --base main --head HEAD --dry-run  Print what would be posted locally\n  \
                     sieve parse --max-line 120 < reply.txt  Show how a saved reply is interpreted\n  \
                     sieve init                            Create a .sieve.toml config file"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: .sieve.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable summary (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable debug logging (overridden by SIEVE_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Review a change set and publish the findings
    #[command(long_about = "Review a change set and publish the findings.\n\n\
        The pull request comes from --pr or from the GitHub Actions event payload.\n\
        The change set comes from --diff-file, from --base/--head in the local\n\
        repository, or from the pull request diff on GitHub, in that order.\n\
        Outside a pull request, only --dry-run does anything.\n\n\
        Examples:\n  sieve review\n  sieve review --pr owner/repo#12 --dry-run\n  sieve review --base origin/main --head HEAD --dry-run")]
    Review {
        /// GitHub PR to review (format: owner/repo#123)
        #[arg(
            long,
            long_help = "GitHub PR to review.\n\nFormat: owner/repo#123\nRequires GITHUB_TOKEN or GH_TOKEN env var."
        )]
        pr: Option<String>,
        /// Base revision of the change set
        #[arg(long, requires = "head")]
        base: Option<String>,
        /// Head revision of the change set
        #[arg(long, requires = "base")]
        head: Option<String>,
        /// Read the change set from a unified diff file
        #[arg(long, conflicts_with_all = ["base", "head"])]
        diff_file: Option<PathBuf>,
        /// Repository root used to read full file contents
        #[arg(long, default_value = ".")]
        repo: PathBuf,
        /// Log what would be posted instead of posting it
        #[arg(long)]
        dry_run: bool,
    },
    /// Interpret a saved model reply without posting anything
    #[command(long_about = "Interpret a saved model reply without posting anything.\n\n\
        Reads the reply from --file or stdin and prints the comments it yields.\n\
        Line numbers above --max-line become unanchored.\n\n\
        Examples:\n  sieve parse --max-line 200 < reply.txt\n  sieve parse --file reply.txt --max-line 80 --format json")]
    Parse {
        /// Read the reply from a file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
        /// Number of lines in the reviewed file
        #[arg(long)]
        max_line: u32,
    },
    /// Create a default .sieve.toml configuration file
    #[command(long_about = "Create a default .sieve.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .sieve.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

const DEFAULT_CONFIG: &str = r#"# Sieve Configuration

[llm]
# provider = "openai"          # or "ollama"
# model = "gpt-4o-mini"
# api_key = "..."              # prefer SIEVE_API_KEY or OPENAI_API_KEY
# base_url = "https://api.openai.com/v1"
# timeout_secs = 120

[review]
# target_extensions = ["py", "rs", "ts"]   # empty reviews every file
# skip_patterns = ["vendor/**", "*.min.js"]
# snippet_context_lines = 2
# drop_speculative = false
# post_no_issues = true
# extra_instructions = "Prefer parameterized SQL."
# max_file_chars = 60000

[summary]
# enabled = true
# marker = "<!-- sieve:summary -->"
# heading = "AI Review Summary"
# target = "description"       # or "comment"

[github]
# token = "..."                # prefer GITHUB_TOKEN
# api_base = "https://api.github.com"
"#;

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("SIEVE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<SieveConfig> {
    let config = match path {
        Some(path) => SieveConfig::from_file(path)
            .wrap_err_with(|| format!("reading {}", path.display()))?,
        None => {
            let default_path = Path::new(".sieve.toml");
            if default_path.exists() {
                SieveConfig::from_file(default_path)?
            } else {
                SieveConfig::default()
            }
        }
    };
    Ok(config.with_env(&Env::real()))
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err(format!("reading {}", path.display())),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .into_diagnostic()
                .wrap_err("reading stdin")?;
            Ok(input)
        }
    }
}

/// Options of `sieve review`.
struct ReviewArgs {
    pr: Option<String>,
    base: Option<String>,
    head: Option<String>,
    diff_file: Option<PathBuf>,
    repo: PathBuf,
    dry_run: bool,
}

async fn resolve_context(
    pr: Option<&str>,
    config: &SieveConfig,
) -> Result<Option<(PullRequestContext, GitHubClient)>> {
    let ctx = match pr {
        Some(reference) => {
            // head and base are filled in from the API below
            PullRequestContext::from_reference(reference, "", "")?
        }
        None => match PullRequestContext::from_actions_env(&Env::real())? {
            Some(ctx) => ctx,
            None => return Ok(None),
        },
    };

    let Some(token) = config.github.token.as_deref() else {
        miette::bail!(miette::miette!(
            help = "Set GITHUB_TOKEN or GH_TOKEN, or [github].token in .sieve.toml",
            "reviewing {} needs a GitHub token",
            ctx.reference()
        ));
    };
    let client = GitHubClient::new(
        token,
        config.github.api_base.as_deref(),
        &ctx.owner,
        &ctx.repo,
        ctx.number,
    )?;

    let ctx = if ctx.head_sha.is_empty() {
        let pr = client.get_pull_request().await?;
        PullRequestContext {
            base_ref: pr.base_ref,
            head_sha: pr.head_sha,
            ..ctx
        }
    } else {
        ctx
    };
    Ok(Some((ctx, client)))
}

async fn run_review(args: ReviewArgs, config: &SieveConfig, format: OutputFormat) -> Result<()> {
    // Everything that can fail on configuration fails here, before any write.
    if args.dry_run {
        config.validate_for_model()?;
    } else {
        config.validate_for_posting()?;
    }

    let resolved = resolve_context(args.pr.as_deref(), config).await?;
    if resolved.is_none() && !args.dry_run {
        tracing::info!("not running for a pull request, nothing to do");
        return Ok(());
    }

    let diff_text = match (&args.diff_file, &args.base, &resolved) {
        (Some(path), _, _) => Some(read_input(Some(path.as_path()))?),
        (None, Some(_), _) => None,
        (None, None, Some((ctx, client))) => {
            tracing::info!(pr = %ctx.reference(), "fetching pull request diff");
            Some(client.get_pr_diff().await?)
        }
        (None, None, None) => miette::bail!(miette::miette!(
            help = "Pass --diff-file, or --base and --head",
            "no change set to review"
        )),
    };

    let requests = match (diff_text, &args.base, &args.head) {
        (Some(text), _, _) => PatchDiffSource::new(&args.repo, text).changed_files()?,
        (None, Some(base), Some(head)) => {
            GitDiffSource::new(&args.repo, base, head).changed_files()?
        }
        (None, _, _) => miette::bail!("--base and --head must be given together"),
    };
    tracing::info!(files = requests.len(), "change set loaded");

    let (commit_id, host): (String, Box<dyn ReviewHost>) = match resolved {
        Some((ctx, client)) => {
            let host: Box<dyn ReviewHost> = if args.dry_run {
                Box::new(DryRunHost::new(Some(Box::new(client))))
            } else {
                Box::new(client)
            };
            (ctx.head_sha, host)
        }
        None => (
            args.head.clone().unwrap_or_else(|| "HEAD".to_string()),
            Box::new(DryRunHost::new(None)),
        ),
    };

    let model = LlmClient::new(&config.llm)?;
    tracing::debug!(model = model.model(), endpoint = %model.endpoint(), "using model");

    let spinner = if std::io::stderr().is_terminal() {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
                .into_diagnostic()?,
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(120));
        Some(pb)
    } else {
        None
    };

    let progress = spinner.clone();
    let report = ReviewPipeline::new(config, &model, host.as_ref(), commit_id)
        .on_file(move |path| {
            if let Some(pb) = &progress {
                pb.set_message(format!("Reviewing {path}"));
            }
        })
        .run(requests)
        .await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    print_report(&report, format)
}

fn print_report(report: &RunReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{report}"),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report).into_diagnostic()?);
        }
        OutputFormat::Markdown => print!("{}", report.to_markdown()),
    }
    Ok(())
}

fn print_batch(batch: &CommentBatch, clean: bool, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(batch).into_diagnostic()?);
        }
        OutputFormat::Text => {
            if clean {
                println!("No issues reported.");
            }
            for c in batch {
                let line = if c.is_anchored() {
                    c.line.to_string()
                } else {
                    "-".to_string()
                };
                println!("{line:>5}  {}", c.body.replace('\n', "\n       "));
            }
        }
        OutputFormat::Markdown => {
            if clean {
                println!("_No issues reported._");
            }
            for c in batch {
                if c.is_anchored() {
                    println!("- **Line {}**: {}", c.line, c.body);
                } else {
                    println!("- {}", c.body);
                }
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Review {
            pr,
            base,
            head,
            diff_file,
            repo,
            dry_run,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let args = ReviewArgs {
                pr,
                base,
                head,
                diff_file,
                repo,
                dry_run,
            };
            run_review(args, &config, cli.format).await?;
        }
        Command::Parse { file, max_line } => {
            let raw = read_input(file.as_deref())?;
            let clean = sieve_review::sentinel::is_sentinel(Some(raw.as_str()));
            let batch = if clean {
                CommentBatch::new()
            } else {
                sieve_review::parser::parse(Some(raw.as_str()), max_line)
            };
            print_batch(&batch, clean, cli.format)?;
        }
        Command::Init => {
            let path = Path::new(".sieve.toml");
            if path.exists() {
                miette::bail!(".sieve.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .sieve.toml with default configuration");
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "sieve", &mut std::io::stdout());
        }
    }

    Ok(())
}
