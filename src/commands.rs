//! Command line subcommands and their handlers.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use color_eyre::{eyre::eyre, Result};
use tracing::{info, warn};

use zube::auth::{Credentials, TokenIssuer};
use zube::cache::{CacheStorage, FileStorage, NoopStorage};
use zube::config::{self, ClientConfig, Profile};
use zube::query::{Direction, Query};
use zube::zube::helpers;
use zube::zube::types::{Card, Comment, NewCard, NewGithubIssue};
use zube::zube::ZubeClient;

type Client = ZubeClient<Box<dyn CacheStorage>>;

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Manage the local profile
  #[command(subcommand)]
  Config(ConfigCommand),
  /// Fetch a fresh access token and save it to the profile
  Login,
  /// Show the user the access token belongs to
  Whoami,
  /// Work with cards
  #[command(subcommand)]
  Card(CardCommand),
  /// Work with projects
  #[command(subcommand)]
  Project(ListCommand),
  /// Work with workspaces
  #[command(subcommand)]
  Workspace(ListCommand),
  /// Work with epics
  #[command(subcommand)]
  Epic(ProjectListCommand),
  /// Work with labels
  #[command(subcommand)]
  Label(ProjectListCommand),
  /// Work with sprints
  #[command(subcommand)]
  Sprint(WorkspaceListCommand),
  /// Work with connected GitHub sources
  #[command(subcommand)]
  Source(ListCommand),
  /// Manage the local response cache
  #[command(subcommand)]
  Cache(CacheCommand),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
  /// Create the profile with your Zube client ID
  Init {
    #[arg(long)]
    client_id: String,
  },
}

#[derive(Subcommand, Debug)]
pub enum ListCommand {
  /// List all
  Ls,
}

#[derive(Subcommand, Debug)]
pub enum ProjectListCommand {
  /// List all in a project
  Ls {
    #[arg(long)]
    project_id: u64,
  },
}

#[derive(Subcommand, Debug)]
pub enum WorkspaceListCommand {
  /// List all in a workspace
  Ls {
    #[arg(long)]
    workspace_id: u64,
  },
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
  /// Delete every cached response
  Purge,
}

#[derive(Subcommand, Debug)]
pub enum CardCommand {
  /// List cards with given filters
  Ls(CardFilters),
  /// Show a card and its comments
  View { number: u64 },
  /// Full text search over cards
  Search { text: String },
  /// Create a new card
  Create(CreateCardArgs),
}

#[derive(Args, Debug, Default)]
pub struct CardFilters {
  /// Filter by card internal ID
  #[arg(long)]
  pub id: Option<u64>,
  /// Filter by category name
  #[arg(long)]
  pub category: Option<String>,
  #[arg(long)]
  pub epic_id: Option<u64>,
  #[arg(long)]
  pub number: Option<u64>,
  #[arg(long)]
  pub priority: Option<u8>,
  #[arg(long)]
  pub project_id: Option<u64>,
  #[arg(long)]
  pub sprint_id: Option<u64>,
  #[arg(long)]
  pub workspace_id: Option<u64>,
  #[arg(long)]
  pub assignee_id: Option<String>,
  #[arg(long)]
  pub state: Option<String>,
  #[arg(long)]
  pub status: Option<String>,
}

impl CardFilters {
  /// Columns requested for card listings
  const SELECT: [&'static str; 4] = ["number", "title", "status", "category_name"];

  pub fn to_query(&self) -> Query {
    let mut query = Query::new().select(Self::SELECT);

    if let Some(id) = self.id {
      query = query.filter("id", id);
    }
    if let Some(category) = &self.category {
      query = query.filter("category_name", category.as_str());
    }
    if let Some(epic_id) = self.epic_id {
      query = query.filter("epic_id", epic_id);
    }
    if let Some(number) = self.number {
      query = query.filter("number", number);
    }
    if let Some(priority) = self.priority {
      query = query.filter("priority", u32::from(priority));
    }
    if let Some(project_id) = self.project_id {
      query = query.filter("project_id", project_id);
    }
    if let Some(sprint_id) = self.sprint_id {
      query = query.filter("sprint_id", sprint_id);
    }
    if let Some(workspace_id) = self.workspace_id {
      query = query.filter("workspace_id", workspace_id);
    }
    if let Some(assignee_id) = &self.assignee_id {
      query = query.filter("assignee_ids", vec![assignee_id.clone()]);
    }
    if let Some(state) = &self.state {
      query = query.filter("state", state.as_str());
    }
    if let Some(status) = &self.status {
      query = query.filter("status", status.as_str());
    }

    query
  }
}

#[derive(Args, Debug)]
pub struct CreateCardArgs {
  #[arg(long, required_unless_present = "project", conflicts_with = "project")]
  pub project_id: Option<u64>,
  /// Project name, looked up when no --project-id is given
  #[arg(long)]
  pub project: Option<String>,
  #[arg(long, conflicts_with = "workspace")]
  pub workspace_id: Option<u64>,
  /// Workspace name
  #[arg(long)]
  pub workspace: Option<String>,
  #[arg(long)]
  pub title: String,
  #[arg(long, default_value = "")]
  pub body: String,
  /// Label ID, may be repeated
  #[arg(long = "label")]
  pub labels: Vec<u64>,
  /// Member name, may be repeated
  #[arg(long = "assignee")]
  pub assignees: Vec<String>,
  /// Epic title
  #[arg(long)]
  pub epic: Option<String>,
  /// GitHub source name
  #[arg(long)]
  pub source: Option<String>,
  /// 1-5, or None
  #[arg(long, default_value = "None")]
  pub priority: String,
}

/// Settings shared by every command.
pub struct Context {
  pub profile_path: PathBuf,
  pub no_cache: bool,
  pub client: ClientConfig,
}

pub async fn run(command: Command, ctx: &Context) -> Result<()> {
  match command {
    Command::Config(ConfigCommand::Init { client_id }) => config_init(ctx, client_id),
    Command::Login => login(ctx).await,
    Command::Cache(CacheCommand::Purge) => {
      println!("Purging cache...");
      FileStorage::open()?.purge()?;
      Ok(())
    }
    Command::Whoami => {
      let client = connect(ctx).await?;
      let me = client.fetch_current_person().await?;
      println!("{} ({})", me.person.name, me.person.username);
      Ok(())
    }
    Command::Card(card) => run_card(card, ctx).await,
    Command::Project(ListCommand::Ls) => {
      let client = connect(ctx).await?;
      for project in client.fetch_projects(&Query::new()).await? {
        println!("{:<8} {:<30} {}", project.id, project.name, project.description);
      }
      Ok(())
    }
    Command::Workspace(ListCommand::Ls) => {
      let client = connect(ctx).await?;
      for workspace in client.fetch_workspaces(&Query::new()).await? {
        println!(
          "{:<8} {:<30} {}",
          workspace.id, workspace.name, workspace.description
        );
      }
      Ok(())
    }
    Command::Epic(ProjectListCommand::Ls { project_id }) => {
      let client = connect(ctx).await?;
      for epic in client.fetch_epics(project_id).await? {
        println!("{:<8} {:<40} {}", epic.id, epic.title, epic.status);
      }
      Ok(())
    }
    Command::Label(ProjectListCommand::Ls { project_id }) => {
      let client = connect(ctx).await?;
      for label in client.fetch_labels(project_id).await? {
        println!("{:<8} {:<30} #{}", label.id, label.name, label.color);
      }
      Ok(())
    }
    Command::Sprint(WorkspaceListCommand::Ls { workspace_id }) => {
      let client = connect(ctx).await?;
      for sprint in client.fetch_sprints(workspace_id).await? {
        println!("{:<8} {:<40} {}", sprint.id, sprint.title, sprint.state);
      }
      Ok(())
    }
    Command::Source(ListCommand::Ls) => {
      let client = connect(ctx).await?;
      for source in client.fetch_sources().await? {
        println!("{:<8} {}", source.id, source.name);
      }
      Ok(())
    }
  }
}

async fn run_card(command: CardCommand, ctx: &Context) -> Result<()> {
  let client = connect(ctx).await?;

  match command {
    CardCommand::Ls(filters) => {
      let query = filters.to_query();
      let cards = match filters.project_id {
        Some(project_id) => {
          let query = query.order_by("milestone").direction(Direction::Desc);
          client.fetch_project_cards(project_id, &query).await?
        }
        None => client.fetch_cards(&query).await?,
      };
      print_cards(&cards);
    }
    CardCommand::View { number } => {
      let cards = client
        .fetch_cards(&Query::new().filter("number", number))
        .await?;
      let [card] = cards.as_slice() else {
        return Err(eyre!("Card #{} not found", number));
      };
      let comments = client.fetch_card_comments(card.id).await?;
      print_card(card);
      print_comments(&comments);
      if let Some(link) = card_link(&client, card).await? {
        println!("\nView this card on Zube: {}", link);
      }
    }
    CardCommand::Search { text } => {
      print_cards(&client.search_cards(&text).await?);
    }
    CardCommand::Create(args) => create_card(&client, args).await?,
  }

  Ok(())
}

async fn create_card(client: &Client, args: CreateCardArgs) -> Result<()> {
  let project_id = resolve_project_id(client, args.project_id, args.project.as_deref()).await?;
  let workspace_id =
    resolve_workspace_id(client, args.workspace_id, args.workspace.as_deref()).await?;

  let epic_id = match &args.epic {
    Some(title) => {
      let epics = client.fetch_epics(project_id).await?;
      let epic = helpers::epic_by_title(title, &epics)
        .ok_or_else(|| eyre!("No epic titled {:?} in project {}", title, project_id))?;
      Some(epic.id)
    }
    None => None,
  };

  let assignee_ids = if args.assignees.is_empty() {
    Vec::new()
  } else {
    let members = client.fetch_project_members(project_id).await?;
    let found = helpers::members_by_names(&args.assignees, &members);
    if found.len() != args.assignees.len() {
      warn!("Some assignees were not found among project members");
    }
    found.iter().map(|m| m.person_id()).collect()
  };

  let github_issue = match &args.source {
    Some(name) => {
      let sources = client.fetch_sources().await?;
      let source = helpers::source_by_name(name, &sources)
        .ok_or_else(|| eyre!("No GitHub source named {:?}", name))?;
      Some(NewGithubIssue {
        source_id: source.id,
      })
    }
    None => None,
  };

  let new_card = NewCard {
    project_id,
    workspace_id,
    epic_id,
    title: args.title,
    body: args.body,
    priority: helpers::parse_priority(&args.priority),
    label_ids: args.labels,
    assignee_ids,
    github_issue,
  };

  let mut card = client.create_card(&new_card).await?;
  info!(number = card.number, "Created card");
  if card.project_id == 0 {
    card.project_id = project_id;
  }

  match card_link(client, &card).await? {
    Some(link) => println!("\nView card on Zube: {}", link),
    None => println!("\nCreated card #{}", card.number),
  }

  Ok(())
}

async fn resolve_project_id(client: &Client, id: Option<u64>, name: Option<&str>) -> Result<u64> {
  if let Some(id) = id {
    return Ok(id);
  }

  let name = name.ok_or_else(|| eyre!("Either --project-id or --project is required"))?;
  let projects = client.fetch_projects(&Query::new()).await?;
  helpers::project_by_name(name, &projects)
    .map(|p| p.id)
    .ok_or_else(|| eyre!("No project named {:?}", name))
}

async fn resolve_workspace_id(
  client: &Client,
  id: Option<u64>,
  name: Option<&str>,
) -> Result<Option<u64>> {
  match (id, name) {
    (Some(id), _) => Ok(Some(id)),
    (None, Some(name)) => {
      let workspaces = client.fetch_workspaces(&Query::new()).await?;
      helpers::workspace_by_name(name, &workspaces)
        .map(|w| Some(w.id))
        .ok_or_else(|| eyre!("No workspace named {:?}", name))
    }
    (None, None) => Ok(None),
  }
}

/// Web link to `card`, or `None` when its project or account is not visible.
async fn card_link(client: &Client, card: &Card) -> Result<Option<String>> {
  let projects = client
    .fetch_projects(&Query::new().filter("id", card.project_id))
    .await?;
  let Some(project) = projects.first() else {
    return Ok(None);
  };

  let accounts = client
    .fetch_accounts(&Query::new().filter("id", project.account_id))
    .await?;

  Ok(accounts.first().map(|a| helpers::card_url(a, project, card)))
}

fn config_init(ctx: &Context, client_id: String) -> Result<()> {
  if client_id.trim().is_empty() {
    return Err(eyre!("Client ID cannot be blank!"));
  }

  Profile {
    client_id,
    access_token: String::new(),
  }
  .save(&ctx.profile_path)?;

  println!("Config initialized successfully!");
  println!(
    "Don't forget to place your Zube private key at {}",
    config::private_key_path()?.display()
  );
  Ok(())
}

async fn login(ctx: &Context) -> Result<()> {
  let mut profile = Profile::load(Some(&ctx.profile_path))?;
  let mut credentials = Credentials::from_profile(&profile, config::private_key_path()?);
  let issuer = TokenIssuer::new(&ctx.client)?;

  credentials.refresh(&issuer).await?;
  credentials.store_in(&mut profile);
  profile.save(&ctx.profile_path)?;

  println!("Access token saved to {}", ctx.profile_path.display());
  Ok(())
}

/// Load the profile, refresh the token if needed and build a client.
async fn connect(ctx: &Context) -> Result<Client> {
  let mut profile = Profile::load(Some(&ctx.profile_path))?;
  let mut credentials = Credentials::from_profile(&profile, config::private_key_path()?);
  let issuer = TokenIssuer::new(&ctx.client)?;

  if credentials.ensure_valid(&issuer).await? {
    credentials.store_in(&mut profile);
    profile.save(&ctx.profile_path)?;
    info!("Saved refreshed access token");
  }

  let storage: Box<dyn CacheStorage> = if ctx.no_cache {
    Box::new(NoopStorage)
  } else {
    match FileStorage::open() {
      Ok(storage) => Box::new(storage),
      Err(e) => {
        warn!("Response cache unavailable: {}", e);
        Box::new(NoopStorage)
      }
    }
  };

  Ok(ZubeClient::new(&credentials, &ctx.client, storage)?)
}

const MAX_TITLE_LEN: usize = 60;

fn truncate(s: &str, max_chars: usize) -> String {
  if s.chars().count() > max_chars {
    let mut out: String = s.chars().take(max_chars).collect();
    out.push_str("...");
    out
  } else {
    s.to_string()
  }
}

/// `in_progress` -> `In Progress`
fn snake_to_title(s: &str) -> String {
  s.split('_')
    .filter(|w| !w.is_empty())
    .map(|w| {
      let mut chars = w.chars();
      match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
      }
    })
    .collect::<Vec<_>>()
    .join(" ")
}

fn print_cards(cards: &[Card]) {
  println!("{:<6} {:<66} Status", "Number", "Title");
  for card in cards {
    println!(
      "{:<6} {:<66} {}",
      card.number,
      truncate(&card.title, MAX_TITLE_LEN),
      snake_to_title(&card.status)
    );
  }
}

fn print_card(card: &Card) {
  let labels: Vec<&str> = card.labels.iter().map(|l| l.name.as_str()).collect();
  let assignees: Vec<&str> = card.assignees.iter().map(|a| a.username.as_str()).collect();

  println!("{} #{}", card.title, card.number);
  println!("{}", snake_to_title(&card.status));
  println!("Assignees: {}", assignees.join(" "));
  println!("Labels: {}", labels.join(" "));
  if let Some(priority) = card.priority {
    println!("Priority: P{}", priority);
  }
  if let Some(issue) = card.github_issue.as_ref().filter(|i| i.id != 0) {
    println!("Github: {}#{}", issue.source.name, issue.number);
  }
  println!();
  println!("{}", card.body);
}

fn print_comments(comments: &[Comment]) {
  println!("------\n\nComments\n");
  for comment in comments {
    println!("{}\n{}\n", comment.creator.name, comment.timestamps.created_at);
    println!("{}", comment.body);
  }
}
