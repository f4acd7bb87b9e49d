//! Taskdeck CLI - Command-line interface for Taskdeck
//!
//! Sign in against the identity endpoint and browse workspaces, spaces,
//! lists, and tasks from the task service.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use taskdeck_api::{AuthenticatedClient, OrderBy, ResourceApi, TaskQuery};
use taskdeck_auth::{
    capabilities_for, CredentialStore, Navigator, RegistrationForm, Route, RouteState,
    SessionService, SessionState,
};
use taskdeck_core::{
    config_error, init_logging, log_operation_error, log_operation_start, log_operation_success,
    not_found_error, ErrorContext, List, LogFormat, LoggingConfig, Member, Role, Space, Task,
    TaskdeckConfig, TaskdeckError, TaskdeckResult,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

#[derive(Parser)]
#[command(name = "taskdeck")]
#[command(about = "Browse workspaces, spaces, lists, and tasks from the command line")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print raw JSON instead of a summary
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session token
    Login {
        email: String,

        /// Password; prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Create an account and sign in
    Register {
        email: String,

        #[arg(short, long)]
        password: String,

        #[arg(long)]
        confirm_password: String,

        /// ADMIN, EDITOR, or VIEWER
        #[arg(long, default_value = "VIEWER")]
        role: Role,
    },

    /// End the session
    Logout,

    /// Show the signed-in account and what it may do
    Whoami,

    /// List workspaces
    Workspaces,

    /// List members of a workspace
    Members { workspace: String },

    /// List spaces in a workspace
    Spaces {
        workspace: String,

        #[arg(long)]
        archived: Option<bool>,
    },

    /// Show one space
    Space { id: String },

    /// List lists in a space
    Lists {
        space: String,

        #[arg(long)]
        archived: Option<bool>,
    },

    /// Show one list
    List { id: String },

    /// List tasks in a list
    Tasks {
        list: String,

        #[arg(long)]
        archived: Option<bool>,

        #[arg(long)]
        page: Option<u32>,

        /// created, updated, or due_date
        #[arg(long)]
        order_by: Option<OrderBy>,

        #[arg(long)]
        reverse: Option<bool>,

        #[arg(long)]
        subtasks: Option<bool>,

        #[arg(long)]
        include_closed: Option<bool>,
    },

    /// Show one task
    Task { id: String },

    /// Resolve an application path to its breadcrumb trail
    Route { path: String },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Initialize default configuration
        #[arg(long)]
        init: bool,

        /// Set a configuration value (key=value format)
        #[arg(long)]
        set: Option<String>,

        /// Get a configuration value
        #[arg(long)]
        get: Option<String>,

        /// Validate current configuration
        #[arg(long)]
        validate: bool,
    },
}

impl Commands {
    /// Page the command corresponds to, used as the starting navigation path
    fn route(&self) -> Route {
        match self {
            Commands::Login { .. } | Commands::Logout => Route::Login,
            Commands::Register { .. } => Route::Register,
            Commands::Spaces { workspace, .. } | Commands::Members { workspace } => {
                Route::Spaces {
                    workspace_id: workspace.clone(),
                }
            }
            _ => Route::Workspaces,
        }
    }
}

/// Everything a command needs, wired once at startup
struct App {
    config: TaskdeckConfig,
    session: Arc<SessionService>,
    navigator: Arc<RouteState>,
    api: ResourceApi,
    json: bool,
}

impl App {
    fn new(config: TaskdeckConfig, start: Route, json: bool) -> TaskdeckResult<Self> {
        let credentials = Arc::new(CredentialStore::file(&config.session.token_file));
        let session = Arc::new(SessionService::new(&config, credentials)?);
        let navigator = Arc::new(RouteState::new(start.to_string()));
        let client = AuthenticatedClient::new(&config, session.clone(), navigator.clone())?;

        Ok(Self {
            api: ResourceApi::new(Arc::new(client)),
            config,
            session,
            navigator,
            json,
        })
    }

    fn print_json<T: Serialize>(&self, value: &T) -> TaskdeckResult<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> TaskdeckResult<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?.with_env_overrides();

    let logging_config = if cli.verbose {
        LoggingConfig::verbose()
    } else {
        config.logging.clone()
    };

    init_logging(&logging_config).map_err(|e| TaskdeckError::Config {
        message: format!("Failed to initialize logging: {}", e),
        source: Some(e),
        context: ErrorContext::new("cli")
            .with_operation("init_logging")
            .with_suggestion("Check the [logging] section of the configuration"),
    })?;

    info!("Starting Taskdeck CLI v{}", env!("CARGO_PKG_VERSION"));

    if let Commands::Config {
        show,
        init,
        set,
        get,
        validate,
    } = &cli.command
    {
        return handle_config(
            cli.config.as_ref(),
            *show,
            *init,
            set.clone(),
            get.clone(),
            *validate,
        )
        .await;
    }

    if let Commands::Route { path } = &cli.command {
        return handle_route(path);
    }

    config.validate()?;
    let app = App::new(config, cli.command.route(), cli.json)?;

    let result = match cli.command {
        Commands::Login { email, password } => handle_login(&app, email, password).await,
        Commands::Register {
            email,
            password,
            confirm_password,
            role,
        } => {
            let form = RegistrationForm::new(email, password, confirm_password).with_role(role);
            handle_register(&app, form).await
        }
        Commands::Logout => handle_logout(&app).await,
        Commands::Whoami => handle_whoami(&app).await,
        Commands::Workspaces => handle_workspaces(&app).await,
        Commands::Members { workspace } => handle_members(&app, &workspace).await,
        Commands::Spaces {
            workspace,
            archived,
        } => handle_spaces(&app, &workspace, archived).await,
        Commands::Space { id } => handle_space(&app, &id).await,
        Commands::Lists { space, archived } => handle_lists(&app, &space, archived).await,
        Commands::List { id } => handle_list(&app, &id).await,
        Commands::Tasks {
            list,
            archived,
            page,
            order_by,
            reverse,
            subtasks,
            include_closed,
        } => {
            let query = TaskQuery {
                archived,
                page,
                order_by,
                reverse,
                subtasks,
                include_closed,
            };
            handle_tasks(&app, &list, &query).await
        }
        Commands::Task { id } => handle_task(&app, &id).await,
        Commands::Route { .. } | Commands::Config { .. } => Ok(()),
    };

    if let Err(e) = result {
        report_failure(&app, &e);
        std::process::exit(1);
    }

    Ok(())
}

fn load_config(config_path: Option<&PathBuf>) -> TaskdeckResult<TaskdeckConfig> {
    if let Some(path) = config_path {
        info!("Loading configuration from {:?}", path);
        return TaskdeckConfig::from_file(path);
    }

    let default_paths = [
        dirs::config_dir().map(|d| d.join("taskdeck").join("config.toml")),
        dirs::home_dir().map(|d| d.join(".taskdeck").join("config.toml")),
        Some(PathBuf::from("taskdeck.toml")),
    ];

    for path in default_paths.iter().flatten() {
        if path.exists() {
            info!("Loading configuration from {:?}", path);
            return TaskdeckConfig::from_file(path);
        }
    }

    info!("No configuration file found, using defaults");
    Ok(TaskdeckConfig::default())
}

/// Print what went wrong and what the user can do about it
fn report_failure(app: &App, error: &TaskdeckError) {
    error.log();

    if error.is_session_ending() {
        println!("🔒 Your session has ended.");
        println!(
            "   Sign in again with `taskdeck login <email>` (now at {})",
            app.navigator.current_path()
        );
        return;
    }

    match error {
        TaskdeckError::Validation { .. } | TaskdeckError::Authentication { .. } => {
            eprintln!("❌ {}", error);
        }
        TaskdeckError::OperationDisabled { .. } => {
            eprintln!("🚫 {}", error);
        }
        _ if error.is_recoverable() => {
            eprintln!("⚠️  Failed to load data: {}", error);
            eprintln!("   Retry the command in a moment.");
        }
        _ => {
            eprintln!("❌ {}", error);
            if let Some(context) = error.context() {
                for suggestion in &context.recovery_suggestions {
                    eprintln!("   💡 {}", suggestion);
                }
            }
        }
    }
}

async fn prompt_password() -> TaskdeckResult<String> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"Password: ").await?;
    stdout.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;

    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn handle_login(app: &App, email: String, password: Option<String>) -> TaskdeckResult<()> {
    log_operation_start!("login");

    let password = match password {
        Some(password) => password,
        None => prompt_password().await?,
    };

    match app.session.login(&email, &password).await {
        Ok(user) => {
            log_operation_success!("login");
            app.navigator.navigate(&Route::Workspaces.to_string());
            println!("✅ Signed in as {} ({})", user.email, user.role);
            Ok(())
        }
        Err(e) => {
            log_operation_error!("login", e);
            Err(e)
        }
    }
}

async fn handle_register(app: &App, form: RegistrationForm) -> TaskdeckResult<()> {
    log_operation_start!("register");

    match app.session.register(&form).await {
        Ok(user) => {
            log_operation_success!("register");
            app.navigator.navigate(&Route::Workspaces.to_string());
            println!("✅ Account created for {} ({})", user.email, user.role);
            Ok(())
        }
        Err(e) => {
            log_operation_error!("register", e);
            Err(e)
        }
    }
}

async fn handle_logout(app: &App) -> TaskdeckResult<()> {
    app.session.logout().await;
    app.navigator.navigate(&app.config.session.login_path);
    println!("👋 Signed out");
    Ok(())
}

async fn handle_whoami(app: &App) -> TaskdeckResult<()> {
    let state = app.session.restore().await;

    if state == SessionState::Expired {
        app.navigator.navigate(&app.config.session.login_path);
    }

    if app.json {
        let user = app.session.current_user().await;
        return app.print_json(&user);
    }

    let (authenticated, profile) = match &state {
        SessionState::Anonymous => {
            println!("Not signed in. Use `taskdeck login <email>`.");
            return Ok(());
        }
        SessionState::Expired => {
            return Err(TaskdeckError::authorization_expired("cli", "whoami"));
        }
        SessionState::Provisional => {
            println!("Signed in (profile unavailable, retry later for role details)");
            (true, None)
        }
        SessionState::Authenticated(user) => {
            println!("👤 {} ({})", user.email, user.role);
            println!("   id: {}", user.id);
            (true, Some(user))
        }
    };

    let capabilities = capabilities_for(authenticated, profile);
    let names: Vec<String> = capabilities.iter().map(|c| c.to_string()).collect();
    println!("   can: {}", names.join(", "));

    Ok(())
}

async fn handle_workspaces(app: &App) -> TaskdeckResult<()> {
    let workspaces = app.api.get_workspaces().await?;

    if app.json {
        return app.print_json(&workspaces);
    }

    if workspaces.teams.is_empty() {
        println!("No workspaces found");
        return Ok(());
    }

    println!("📁 Workspaces:");
    for workspace in &workspaces.teams {
        println!(
            "  {}  {} ({} members)",
            workspace.id,
            workspace.name,
            workspace.members.len()
        );
    }
    Ok(())
}

fn member_line(member: &Member) -> String {
    let name = member
        .username
        .clone()
        .or_else(|| member.email.clone())
        .unwrap_or_else(|| member.id.to_string());

    match &member.email {
        Some(email) if member.username.is_some() => format!("{} <{}>", name, email),
        _ => name,
    }
}

async fn handle_members(app: &App, workspace: &str) -> TaskdeckResult<()> {
    let members = app.api.get_workspace_members(workspace).await?;

    if app.json {
        return app.print_json(&members);
    }

    println!("👥 Members of {}:", workspace);
    for member in &members.members {
        println!("  {}  {}", member.id, member_line(member));
    }
    Ok(())
}

fn space_line(space: &Space) -> String {
    let mut line = format!("{}  {}", space.id, space.name);
    if space.private {
        line.push_str(" [private]");
    }
    if space.archived {
        line.push_str(" [archived]");
    }
    line
}

async fn handle_spaces(app: &App, workspace: &str, archived: Option<bool>) -> TaskdeckResult<()> {
    let spaces = app.api.get_spaces(workspace, archived).await?;

    if app.json {
        return app.print_json(&spaces);
    }

    println!("🗂  Spaces in {}:", workspace);
    for space in &spaces.spaces {
        println!("  {}", space_line(space));
    }
    Ok(())
}

async fn handle_space(app: &App, id: &str) -> TaskdeckResult<()> {
    let space = app.api.get_space(id).await?;

    if app.json {
        return app.print_json(&space);
    }

    println!("{}", space_line(&space));
    let statuses: Vec<&str> = space.statuses.iter().map(|s| s.status.as_str()).collect();
    if !statuses.is_empty() {
        println!("  statuses: {}", statuses.join(", "));
    }
    Ok(())
}

fn list_line(list: &List) -> String {
    let mut line = format!("{}  {}", list.id, list.name);
    if let Some(count) = list.task_count {
        line.push_str(&format!(" ({} tasks)", count));
    }
    if let Some(priority) = &list.priority {
        line.push_str(&format!(" [{}]", priority.priority));
    }
    if list.archived {
        line.push_str(" [archived]");
    }
    line
}

async fn handle_lists(app: &App, space: &str, archived: Option<bool>) -> TaskdeckResult<()> {
    let lists = app.api.get_lists(space, archived).await?;

    if app.json {
        return app.print_json(&lists);
    }

    println!("📋 Lists in {}:", space);
    for list in &lists.lists {
        println!("  {}", list_line(list));
    }
    Ok(())
}

async fn handle_list(app: &App, id: &str) -> TaskdeckResult<()> {
    let list = app.api.get_list(id).await?;

    if app.json {
        return app.print_json(&list);
    }

    println!("{}", list_line(&list));
    if let Some(assignee) = &list.assignee {
        println!("  assignee: {}", assignee.display_name());
    }
    if let Some(status) = &list.status {
        println!("  status: {}", status);
    }
    Ok(())
}

fn task_line(task: &Task) -> String {
    let mut line = format!("{}  {} [{}]", task.id, task.name, task.status.status);
    if let Some(priority) = &task.priority {
        line.push_str(&format!(" ({})", priority.priority));
    }
    if !task.assignees.is_empty() {
        let names: Vec<String> = task.assignees.iter().map(|a| a.display_name()).collect();
        line.push_str(&format!(" -> {}", names.join(", ")));
    }
    line
}

async fn handle_tasks(app: &App, list: &str, query: &TaskQuery) -> TaskdeckResult<()> {
    let tasks = app.api.get_tasks(list, query).await?;

    if app.json {
        return app.print_json(&tasks);
    }

    if tasks.tasks.is_empty() {
        println!("No tasks in {}", list);
        return Ok(());
    }

    println!("✔️  Tasks in {}:", list);
    for task in &tasks.tasks {
        println!("  {}", task_line(task));
    }
    Ok(())
}

async fn handle_task(app: &App, id: &str) -> TaskdeckResult<()> {
    let task = app.api.get_task(id).await?;

    if app.json {
        return app.print_json(&task);
    }

    println!("{}", task_line(&task));
    if let Some(description) = task.description.as_deref().filter(|d| !d.is_empty()) {
        println!();
        println!("{}", description);
        println!();
    }
    if let Some(creator) = &task.creator {
        println!("  creator: {}", creator.display_name());
    }
    if let Some(due) = &task.due_date {
        println!("  due: {}", due);
    }
    if !task.tags.is_empty() {
        let tags: Vec<&str> = task.tags.iter().map(|t| t.name.as_str()).collect();
        println!("  tags: {}", tags.join(", "));
    }
    if let Some(url) = &task.url {
        println!("  url: {}", url);
    }
    Ok(())
}

fn handle_route(path: &str) -> TaskdeckResult<()> {
    let route = Route::parse(path).ok_or_else(|| not_found_error!(path, "router"))?;

    let trail: Vec<&str> = route.breadcrumbs().iter().map(|b| b.name).collect();
    println!("{}", route);
    if !trail.is_empty() {
        println!("  {}", trail.join(" > "));
    }
    if let Some(parent) = route.parent() {
        println!("  back: {}", parent);
    }
    if !route.is_public() {
        println!("  requires sign-in");
    }
    Ok(())
}

async fn handle_config(
    config_path: Option<&PathBuf>,
    show: bool,
    init: bool,
    set: Option<String>,
    get: Option<String>,
    validate: bool,
) -> TaskdeckResult<()> {
    let path = match config_path {
        Some(path) => path.clone(),
        None => get_config_path()?,
    };

    if init {
        let config = TaskdeckConfig::default();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        config.save_to_file(&path)?;
        println!("✅ Configuration initialized at: {:?}", path);
    }

    if show {
        let config = load_config(config_path)?.with_env_overrides();
        let rendered = toml::to_string_pretty(&config).map_err(|e| TaskdeckError::Config {
            message: format!("Failed to render configuration: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config_show"),
        })?;
        println!("📋 Current configuration:");
        println!("{}", rendered);
    }

    if validate {
        let config = load_config(config_path)?.with_env_overrides();
        match config.validate() {
            Ok(()) => println!("✅ Configuration is valid"),
            Err(e) => {
                println!("❌ Configuration validation failed: {}", e);
                return Err(e);
            }
        }
    }

    if let Some(key_value) = set {
        let Some((key, value)) = key_value.split_once('=') else {
            return Err(TaskdeckError::Config {
                message: "Invalid format. Use key=value format".to_string(),
                source: None,
                context: ErrorContext::new("config_set")
                    .with_suggestion("Example: --set api.base_url=https://tasks.example.com"),
            });
        };

        let mut config = if path.exists() {
            TaskdeckConfig::from_file(&path)?
        } else {
            TaskdeckConfig::default()
        };
        set_config_value(&mut config, key, value)?;
        config.validate()?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        config.save_to_file(&path)?;
        println!("✅ Set {} = {}", key, value);
    }

    if let Some(key) = get {
        let config = load_config(config_path)?.with_env_overrides();
        println!("{} = {}", key, get_config_value(&config, &key)?);
    }

    Ok(())
}

fn get_config_path() -> TaskdeckResult<PathBuf> {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|d| d.join(".config")))
        .map(|d| d.join("taskdeck").join("config.toml"))
        .ok_or_else(|| config_error!("Could not determine a configuration directory", "cli"))
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> TaskdeckResult<T> {
    value.parse().map_err(|_| TaskdeckError::Config {
        message: format!("Invalid value for {}: {}", key, value),
        source: None,
        context: ErrorContext::new("config_set"),
    })
}

fn parse_log_format(value: &str) -> TaskdeckResult<LogFormat> {
    match value.to_lowercase().as_str() {
        "json" => Ok(LogFormat::Json),
        "pretty" => Ok(LogFormat::Pretty),
        "compact" => Ok(LogFormat::Compact),
        _ => Err(TaskdeckError::Config {
            message: format!("Invalid log format: {}", value),
            source: None,
            context: ErrorContext::new("config_set")
                .with_suggestion("Use one of: json, pretty, compact"),
        }),
    }
}

fn unknown_key(key: &str, component: &str) -> TaskdeckError {
    TaskdeckError::Config {
        message: format!("Unknown configuration key: {}", key),
        source: None,
        context: ErrorContext::new(component)
            .with_suggestion("Use --show to see available configuration keys"),
    }
}

fn set_config_value(config: &mut TaskdeckConfig, key: &str, value: &str) -> TaskdeckResult<()> {
    let parts: Vec<&str> = key.split('.').collect();
    match parts.as_slice() {
        ["api", "base_url"] => config.api.base_url = value.to_string(),
        ["api", "timeout_seconds"] => config.api.timeout_seconds = parse_value(key, value)?,
        ["api", "user_agent"] => config.api.user_agent = value.to_string(),
        ["session", "token_file"] => config.session.token_file = PathBuf::from(value),
        ["session", "login_path"] => config.session.login_path = value.to_string(),
        ["session", "min_password_length"] => {
            config.session.min_password_length = parse_value(key, value)?
        }
        ["logging", "level"] => config.logging.level = value.to_string(),
        ["logging", "format"] => config.logging.format = parse_log_format(value)?,
        ["logging", "log_to_file"] => config.logging.log_to_file = parse_value(key, value)?,
        ["logging", "log_file_path"] => config.logging.log_file_path = Some(value.to_string()),
        _ => return Err(unknown_key(key, "config_set")),
    }
    Ok(())
}

fn get_config_value(config: &TaskdeckConfig, key: &str) -> TaskdeckResult<String> {
    let parts: Vec<&str> = key.split('.').collect();
    let value = match parts.as_slice() {
        ["api", "base_url"] => config.api.base_url.clone(),
        ["api", "timeout_seconds"] => config.api.timeout_seconds.to_string(),
        ["api", "user_agent"] => config.api.user_agent.clone(),
        ["session", "token_file"] => config.session.token_file.display().to_string(),
        ["session", "login_path"] => config.session.login_path.clone(),
        ["session", "min_password_length"] => config.session.min_password_length.to_string(),
        ["logging", "level"] => config.logging.level.clone(),
        ["logging", "format"] => format!("{:?}", config.logging.format).to_lowercase(),
        ["logging", "log_to_file"] => config.logging.log_to_file.to_string(),
        ["logging", "log_file_path"] => config.logging.log_file_path.clone().unwrap_or_default(),
        _ => return Err(unknown_key(key, "config_get")),
    };
    Ok(value)
}
