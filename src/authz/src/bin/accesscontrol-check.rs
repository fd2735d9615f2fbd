//! # Access check CLI
//!
//! Evaluates a specifier list for one user and action against group pages
//! stored as text files, and prints the decision as JSON. Search checks
//! also report whether a result snippet may be shown.
//!
//! ```text
//! accesscontrol-check --pages ./groups --user Alice --action edit Editors "(ro)Reviewers"
//! ```
//!
//! Group page `Title` is read from `<pages>/<Title_with_underscores>.txt`.
//! Exit status is 0 when allowed and 1 when denied.

use accesscontrol_authz::{
    group::DirectoryPageSource, AccessControlConfig, AccessDecision, Action, GroupResolver,
    PermissionEvaluator, User,
};
use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

/// Page access check
#[derive(Parser)]
#[command(name = "accesscontrol-check")]
#[command(about = "Evaluate page access declarations against group pages")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "ACCESSCONTROL_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding group pages
    #[arg(short, long, default_value = ".")]
    pages: PathBuf,

    /// Username of the requesting user
    #[arg(short, long, conflicts_with = "anonymous")]
    user: Option<String>,

    /// Evaluate as a logged-out visitor
    #[arg(long)]
    anonymous: bool,

    /// Group memberships of the user
    #[arg(short, long = "group")]
    groups: Vec<String>,

    /// Action to check (view, read, search, edit, ...)
    #[arg(short, long, default_value = "view")]
    action: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Specifiers attached to the page
    specifiers: Vec<String>,
}

/// JSON written to stdout
#[derive(Serialize)]
struct CheckOutput<'a> {
    #[serde(flatten)]
    decision: &'a AccessDecision,

    /// Search actions only
    #[serde(skip_serializing_if = "Option::is_none")]
    snippet_visible: Option<bool>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},accesscontrol_authz={}", log_level, log_level).into()),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => AccessControlConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AccessControlConfig::default(),
    };

    let user = match (&cli.user, cli.anonymous) {
        (Some(name), false) => User::named(name),
        (None, true) => User::anonymous(),
        _ => anyhow::bail!("Pass either --user <NAME> or --anonymous"),
    };
    let user = cli
        .groups
        .iter()
        .fold(user, |user, group| user.with_group(group.clone()));

    let source = Arc::new(DirectoryPageSource::new(&cli.pages));
    let resolver = Arc::new(GroupResolver::with_ttl(source, config.group_ttl()));
    let evaluator = PermissionEvaluator::new(resolver, config.evaluator());

    info!("Checking {} specifiers from {}", cli.specifiers.len(), cli.pages.display());

    let action = Action::new(cli.action);
    let decision = evaluator
        .evaluate(&user, Some(cli.specifiers.as_slice()), &action)
        .await;

    let output = CheckOutput {
        snippet_visible: action
            .is_search()
            .then(|| decision.snippet_visible(config.allow_search_snippet_for_all)),
        decision: &decision,
    };
    let rendered = serde_json::to_string_pretty(&output).context("Failed to encode decision")?;
    println!("{}", rendered);

    Ok(if decision.allowed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
