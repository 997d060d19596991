use std::io;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use lnr_core::auth::{resolve_api_key, ApiCredentials, CredentialStore};
use lnr_core::cycle::{CycleCache, CycleRecord, FileCacheStore};
use lnr_core::filter::IssueFilterBuilder;
use lnr_core::graphql::{IssueDetail, IssueSummary, LinearClient, Viewer};
use lnr_core::rank::{rank_issues, SortKey};
use lnr_core::services::cycles::CycleService;
use lnr_core::services::issues::{IssueQueryOptions, IssueService};
use pulldown_cmark::{Event, Options, Parser as MarkdownParser, Tag, TagEnd};
use textwrap::wrap;

const DEFAULT_PROFILE: &str = "default";

#[derive(Parser, Debug)]
#[command(version, about = "Terminal client for Linear issues, cycles, and users")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Authentication related commands
    #[command(subcommand)]
    Auth(AuthCommand),
    /// User account details
    #[command(subcommand)]
    User(UserCommand),
    /// Issue operations
    #[command(subcommand)]
    Issue(IssueCommand),
    /// Cycle metadata
    #[command(subcommand)]
    Cycle(CycleCommand),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Store a personal API key
    Login(LoginArgs),
    /// Forget stored credentials for a profile
    Logout(LogoutArgs),
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Show the current authenticated user (viewer)
    Me(MeArgs),
}

#[derive(Subcommand, Debug)]
enum IssueCommand {
    /// List issues, filtered and sorted
    List(IssueListArgs),
    /// View a single issue by key (e.g. ENG-123)
    View(IssueViewArgs),
}

#[derive(Subcommand, Debug)]
enum CycleCommand {
    /// List cycles with their relative positions
    List(CycleListArgs),
}

#[derive(Args, Debug)]
struct LoginArgs {
    /// Personal API key to store
    #[arg(long = "api-key")]
    api_key: String,
    /// Profile name for stored credentials
    #[arg(long, default_value = DEFAULT_PROFILE)]
    profile: String,
}

#[derive(Args, Debug)]
struct LogoutArgs {
    /// Profile name for stored credentials
    #[arg(long, default_value = DEFAULT_PROFILE)]
    profile: String,
}

#[derive(Args, Debug)]
struct MeArgs {
    /// Profile name for stored credentials
    #[arg(long, default_value = DEFAULT_PROFILE)]
    profile: String,
    /// Output raw JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct IssueListArgs {
    /// Profile name for stored credentials
    #[arg(long, default_value = DEFAULT_PROFILE)]
    profile: String,
    /// Maximum number of issues to return
    #[arg(long, default_value_t = 20)]
    limit: usize,
    /// Workflow states to show: comma-separated, '!' negates, 'all' disables
    #[arg(long)]
    status: Option<String>,
    /// Label filter: comma for OR, '+' for AND (e.g. bug+frontend,devex)
    #[arg(long)]
    label: Option<String>,
    /// Cycle scope: a number, 'current', 'next', 'previous', or 'all'
    #[arg(long)]
    cycle: Option<String>,
    /// Sort key: status, priority, identifier, or title
    #[arg(long, default_value = "status")]
    sort: String,
    /// Only issues assigned to this user ('all' disables)
    #[arg(long)]
    user: Option<String>,
    /// Skip the local cycle cache
    #[arg(long = "no-cache")]
    no_cache: bool,
    /// Output raw JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct IssueViewArgs {
    /// Issue key (e.g. ENG-123)
    key: String,
    /// Profile name for stored credentials
    #[arg(long, default_value = DEFAULT_PROFILE)]
    profile: String,
    /// Output raw JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct CycleListArgs {
    /// Profile name for stored credentials
    #[arg(long, default_value = DEFAULT_PROFILE)]
    profile: String,
    /// Skip the local cycle cache
    #[arg(long = "no-cache")]
    no_cache: bool,
    /// Output raw JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct CompletionsArgs {
    /// Shell to generate a completion script for
    #[arg(value_enum)]
    shell: Shell,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Auth(cmd) => match cmd {
            AuthCommand::Login(args) => auth_login(args).await?,
            AuthCommand::Logout(args) => auth_logout(args)?,
        },
        Commands::User(cmd) => match cmd {
            UserCommand::Me(args) => user_me(args).await?,
        },
        Commands::Issue(cmd) => match cmd {
            IssueCommand::List(args) => issue_list(args).await?,
            IssueCommand::View(args) => issue_view(args).await?,
        },
        Commands::Cycle(cmd) => match cmd {
            CycleCommand::List(args) => cycle_list(args).await?,
        },
        Commands::Completions(args) => {
            let mut command = Cli::command();
            clap_complete::generate(args.shell, &mut command, "lnr", &mut io::stdout());
        }
    }
    Ok(())
}

async fn auth_login(args: LoginArgs) -> Result<()> {
    let store = CredentialStore::with_default_locator()
        .context("unable to initialise credential store")?;
    let credentials = ApiCredentials {
        api_key: args.api_key.trim().to_owned(),
    };
    if credentials.api_key.is_empty() {
        return Err(anyhow!("--api-key must not be empty"));
    }
    store
        .save(&args.profile, &credentials)
        .context("failed to store API key")?;
    println!("Personal API key stored for profile '{}'.", args.profile);

    match LinearClient::from_api_key(&credentials.api_key) {
        Ok(client) => match client.viewer().await {
            Ok(viewer) => println!("Logged in as {}", viewer_identity(&viewer)),
            Err(err) => eprintln!("Key stored but viewer query failed: {err}"),
        },
        Err(err) => eprintln!("Key stored but failed to build GraphQL client: {err}"),
    }
    Ok(())
}

fn auth_logout(args: LogoutArgs) -> Result<()> {
    let store = CredentialStore::with_default_locator()
        .context("unable to initialise credential store")?;
    store
        .delete(&args.profile)
        .context("failed to remove stored credentials")?;
    println!("Deleted credentials for profile '{}'.", args.profile);
    Ok(())
}

async fn user_me(args: MeArgs) -> Result<()> {
    let client = build_client(&args.profile)?;
    let viewer = client.viewer().await.context("GraphQL request failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&viewer)?);
    } else {
        render_viewer(&viewer);
    }
    Ok(())
}

async fn issue_list(args: IssueListArgs) -> Result<()> {
    let client = build_client(&args.profile)?;
    let cycle_service = CycleService::new(client.clone());
    let issue_service = IssueService::new(client);
    let cache = if args.no_cache { None } else { open_cycle_cache() };

    let builder = IssueFilterBuilder::new(&cycle_service, cache.as_ref());
    let built = builder
        .build(
            args.status.as_deref().unwrap_or(""),
            args.label.as_deref().unwrap_or(""),
            args.user.as_deref(),
            args.cycle.as_deref(),
            Utc::now(),
        )
        .await
        .context("failed to build issue filter")?;

    let mut issues = issue_service
        .list(IssueQueryOptions {
            limit: args.limit,
            filter: built.filter,
        })
        .await
        .context("GraphQL request failed")?;
    rank_issues(&mut issues, SortKey::parse(&args.sort));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&issues)?);
    } else {
        if let Some(header) = &built.cycle_header {
            println!("{header}");
            println!();
        }
        render_issue_list(&issues);
    }
    Ok(())
}

async fn issue_view(args: IssueViewArgs) -> Result<()> {
    let client = build_client(&args.profile)?;
    let service = IssueService::new(client);
    let issue = service
        .get_by_key(&args.key)
        .await
        .context("GraphQL request failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&issue)?);
    } else {
        render_issue_detail(&issue);
    }
    Ok(())
}

async fn cycle_list(args: CycleListArgs) -> Result<()> {
    let client = build_client(&args.profile)?;
    let service = CycleService::new(client);
    let cache = if args.no_cache { None } else { open_cycle_cache() };
    let cycles = service
        .list(cache.as_ref(), Utc::now())
        .await
        .context("failed to load cycle list")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&cycles)?);
    } else {
        render_cycle_list(&cycles);
    }
    Ok(())
}

fn build_client(profile: &str) -> Result<LinearClient> {
    let store = CredentialStore::with_default_locator()
        .context("unable to initialise credential store")?;
    let credentials = resolve_api_key(&store, profile)?.ok_or_else(|| {
        anyhow!(
            "no credentials stored for profile '{}'; run `lnr auth login --api-key <KEY>`",
            profile
        )
    })?;
    LinearClient::from_api_key(&credentials.api_key).context("failed to build GraphQL client")
}

fn open_cycle_cache() -> Option<CycleCache> {
    match FileCacheStore::with_default_locator() {
        Ok(store) => Some(CycleCache::new(Box::new(store))),
        Err(err) => {
            eprintln!("warning: cycle cache unavailable: {err}");
            None
        }
    }
}

fn viewer_identity(viewer: &Viewer) -> String {
    viewer
        .email
        .clone()
        .or_else(|| viewer.display_name.clone())
        .or_else(|| viewer.name.clone())
        .unwrap_or_else(|| viewer.id.clone())
}

fn render_viewer(viewer: &Viewer) {
    println!("Viewer ID: {}", viewer.id);
    if let Some(name) = &viewer.name {
        println!("Name      : {}", name);
    }
    if let Some(display) = &viewer.display_name {
        println!("Display   : {}", display);
    }
    if let Some(email) = &viewer.email {
        println!("Email     : {}", email);
    }
    println!("Created   : {}", viewer.created_at.to_rfc3339());
}

fn render_issue_list(issues: &[IssueSummary]) {
    println!(
        "{:<12} {:<40} {:<16} {:<8} {:<11} {}",
        "IDENTIFIER", "TITLE", "STATE", "PRIOR", "UPDATED", "LABELS"
    );
    println!("{}", "-".repeat(110));
    for issue in issues {
        let state = issue.state.as_ref().map(|s| s.name.as_str()).unwrap_or("-");
        let labels = issue.label_names().join(", ");
        println!(
            "{:<12} {:<40} {:<16} {:<8} {:<11} {}",
            issue.identifier,
            truncate(&issue.title, 40),
            truncate(state, 16),
            priority_label(issue.priority),
            issue.updated_at.format("%Y-%m-%d"),
            truncate(&labels, 30)
        );
    }
}

fn render_issue_detail(issue: &IssueDetail) {
    println!("{}  {}", issue.identifier, issue.title);
    if let Some(url) = &issue.url {
        println!("URL       : {}", url);
    }
    if let Some(state) = &issue.state {
        println!("State     : {}", state.name);
    }
    if let Some(assignee) = &issue.assignee {
        let name = assignee
            .display_name
            .as_ref()
            .or(assignee.name.as_ref())
            .cloned()
            .unwrap_or_else(|| "Unassigned".into());
        println!("Assignee  : {}", name);
    }
    println!("Priority  : {}", priority_label(issue.priority));
    let labels = issue
        .labels
        .as_ref()
        .map(|c| c.nodes.iter().map(|l| l.name.as_str()).collect::<Vec<_>>())
        .unwrap_or_default();
    if !labels.is_empty() {
        println!("Labels    : {}", labels.join(", "));
    }
    println!("Created   : {}", issue.created_at.to_rfc3339());
    println!("Updated   : {}", issue.updated_at.to_rfc3339());

    if let Some(description) = &issue.description {
        let trimmed = description.trim();
        if !trimmed.is_empty() {
            println!();
            let plain = markdown_to_text(trimmed);
            for line in wrap(plain.trim(), 80) {
                println!("{}", line);
            }
            println!();
        }
    }
}

fn render_cycle_list(cycles: &[CycleRecord]) {
    println!(
        "{:<8} {:<24} {:<12} {:<12} {}",
        "NUMBER", "NAME", "STARTS", "ENDS", "WHEN"
    );
    println!("{}", "-".repeat(70));
    for cycle in cycles {
        let when = if cycle.is_active {
            "current"
        } else if cycle.is_next {
            "next"
        } else if cycle.is_previous {
            "previous"
        } else {
            ""
        };
        println!(
            "{:<8} {:<24} {:<12} {:<12} {}",
            cycle.number,
            truncate(cycle.name.as_deref().unwrap_or("-"), 24),
            cycle.starts_at.format("%Y-%m-%d"),
            cycle.ends_at.format("%Y-%m-%d"),
            when
        );
    }
}

fn priority_label(priority: Option<i32>) -> String {
    match priority {
        Some(1) => "Urgent".into(),
        Some(2) => "High".into(),
        Some(3) => "Medium".into(),
        Some(4) => "Low".into(),
        Some(value) if value > 4 => value.to_string(),
        _ => "None".into(),
    }
}

fn truncate(value: &str, max_len: usize) -> String {
    let mut chars = value.chars();
    let mut collected = String::new();
    for _ in 0..max_len.saturating_sub(1) {
        match chars.next() {
            Some(ch) => collected.push(ch),
            None => return value.to_owned(),
        }
    }
    if chars.next().is_some() {
        collected.push('…');
        collected
    } else {
        value.to_owned()
    }
}

fn markdown_to_text(input: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = MarkdownParser::new_ext(input, options);
    let mut out = String::new();
    let mut need_space = false;
    for event in parser {
        match event {
            Event::Text(text) | Event::Code(text) => {
                if need_space && !out.ends_with([' ', '\n']) {
                    out.push(' ');
                }
                out.push_str(&text);
                need_space = true;
            }
            Event::SoftBreak => {
                out.push(' ');
                need_space = false;
            }
            Event::HardBreak => {
                out.push('\n');
                need_space = false;
            }
            Event::Start(Tag::Paragraph) | Event::Start(Tag::List(_)) => {
                if !out.ends_with('\n') && !out.is_empty() {
                    out.push('\n');
                }
                need_space = false;
            }
            Event::End(TagEnd::Paragraph) | Event::End(TagEnd::Item) => {
                if !out.ends_with('\n') {
                    out.push('\n');
                }
                need_space = false;
            }
            Event::Start(Tag::Item) => {
                if !out.ends_with('\n') && !out.is_empty() {
                    out.push('\n');
                }
                out.push_str("- ");
                need_space = false;
            }
            _ => {}
        }
    }
    out.trim().to_string()
}
