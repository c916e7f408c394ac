//! releasecast - CLI entry point.

use anyhow::{Context, Result, bail};
use clap::Parser;
use dialoguer::Input;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use releasecast::{
    ClaudeGenerator, DryRunMailer, GitHubApi, PipelineOutcome, RevisionComparator, RevisionRequest,
    Settings, default_pipeline,
};

/// Generate a release log between two revisions and email it.
#[derive(Parser, Debug)]
#[command(name = "releasecast")]
#[command(about = "Generate a release log between two revisions and email it")]
#[command(version)]
struct Cli {
    /// Repository (owner/name, https URL, or host:owner/name.git)
    #[arg(short = 'r', long)]
    repository: Option<String>,

    /// Start revision (SHA, tag, or branch)
    #[arg(short = 'f', long = "from")]
    from_revision: Option<String>,

    /// End revision (SHA, tag, or branch)
    #[arg(short = 't', long = "to")]
    to_revision: Option<String>,

    /// Recipient email address
    #[arg(short = 'e', long)]
    email: Option<String>,

    /// Extra instructions for the release log; {{stage_name}} placeholders are filled in
    #[arg(long)]
    instructions: Option<String>,

    /// Print the email instead of sending it
    #[arg(long)]
    dry_run: bool,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,

    /// Prompt for missing fields
    #[arg(short = 'i', long)]
    interactive: bool,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let request = build_request(&cli)?;

    let settings = Settings::from_env();
    for issue in settings.validate() {
        warn!("{}", issue);
    }

    let api = GitHubApi::new(
        settings.github_token.as_ref().map(|t| t.value.as_str()),
        settings.github_api_url.as_deref(),
    )
    .context("Failed to create GitHub client")?;
    let comparator = RevisionComparator::new(api);
    let generator = ClaudeGenerator::cli(settings.claude_timeout);

    let pipeline = if cli.dry_run {
        let mailer = settings
            .from_email
            .clone()
            .map(DryRunMailer::new)
            .unwrap_or_default();
        default_pipeline(comparator, generator, mailer, cli.instructions.clone())
    } else {
        let mailer = settings
            .http_mailer()
            .context("Email delivery is not configured (use --dry-run to skip sending)")?;
        default_pipeline(comparator, generator, mailer, cli.instructions.clone())
    };

    let outcome = pipeline.run(&request).await;
    report(&outcome, cli.json)?;

    std::process::exit(outcome.exit_code());
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "releasecast=debug"
    } else {
        "releasecast=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Collect the four request fields from flags, prompting when interactive.
fn build_request(cli: &Cli) -> Result<RevisionRequest> {
    let repository = field(&cli.repository, "Repository (owner/name or URL)", cli.interactive)?;
    let from = field(&cli.from_revision, "From revision", cli.interactive)?;
    let to = field(&cli.to_revision, "To revision", cli.interactive)?;
    let email = field(&cli.email, "Recipient email", cli.interactive)?;

    RevisionRequest::new(&repository, &from, &to, &email).context("Invalid release request")
}

fn field(value: &Option<String>, prompt: &str, interactive: bool) -> Result<String> {
    match value {
        Some(v) => Ok(v.clone()),
        None if interactive => Input::<String>::new()
            .with_prompt(prompt)
            .interact_text()
            .context("Failed to read input"),
        None => bail!("Missing required value: {} (or use --interactive)", prompt),
    }
}

fn report(outcome: &PipelineOutcome, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(outcome).context("Failed to serialize outcome")?
        );
        return Ok(());
    }

    match outcome {
        PipelineOutcome::Success { result, .. } => {
            println!("✓ Release log for {} processed", outcome.repository());
            println!(
                "{}",
                serde_json::to_string_pretty(result).context("Failed to serialize result")?
            );
        }
        PipelineOutcome::Failure { error, .. } => {
            eprintln!("✗ Release run for {} failed: {}", outcome.repository(), error);
        }
    }

    Ok(())
}
