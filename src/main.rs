// src/main.rs

use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::{bail, eyre, Result};
use comfy_table::{presets::UTF8_FULL, Table};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use vanguard_console::api::AuthApi;
use vanguard_console::core::error::extract_error_message;
use vanguard_console::core::models::{CreateScanRequest, LoginRequest, LoginResponse, Role, Scan, ScanStatusSnapshot};
use vanguard_console::core::options::{self, OptionOverride};
use vanguard_console::core::registry::{self, OptionField};
use vanguard_console::orchestrator::admin::DEFAULT_PAGE_SIZE;
use vanguard_console::preferences::{Preferences, Theme};
use vanguard_console::storage::{FileStorage, Storage};
use vanguard_console::{logging, AdminOrchestrator, ApiClient, Config, ScanOrchestrator, SessionStore};

#[derive(Debug, Parser)]
#[command(author, version, about = "Operator console for the Vanguard scanning service")]
struct Cli {
    /// Override the API base URL (default: $VANGUARD_API_URL or http://localhost:8000/api/v1)
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the available scanning tools, or show the options of one tool
    Tools {
        /// Tool identifier (e.g. nmap)
        id: Option<String>,
    },
    /// Create, inspect and delete scans
    #[command(subcommand)]
    Scans(ScanCommand),
    /// Administer user accounts
    #[command(subcommand)]
    Users(UserCommand),
    /// Log in and remember the session
    Login {
        #[arg(long)]
        email: String,
        /// Password (falls back to $VANGUARD_PASSWORD)
        #[arg(long, env = "VANGUARD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Show or change UI preferences
    Prefs {
        #[arg(long)]
        theme: Option<Theme>,
        #[arg(long)]
        sidebar_collapsed: Option<bool>,
    },
}

#[derive(Debug, Subcommand)]
enum ScanCommand {
    /// List scans, newest first
    List,
    /// Show one scan
    Show { id: String },
    /// Submit a new scan
    Create {
        /// Host name, IP address or URL to scan
        target: String,
        /// Tool to run. Repeat for multiple tools.
        #[arg(long = "tool", required = true, action = ArgAction::Append)]
        tools: Vec<String>,
        /// Override an option (format: tool.field=value). Repeat for multiple overrides.
        #[arg(long = "set", value_name = "TOOL.FIELD=VALUE", value_parser = parse_override, action = ArgAction::Append)]
        overrides: Vec<OptionOverride>,
        /// Confirm options that need the backend to run with root privileges
        #[arg(long)]
        allow_root: bool,
    },
    /// Show the current status of a scan
    Status { id: String },
    /// Poll a scan's status until it completes or fails
    Watch {
        id: String,
        /// Seconds between polls
        #[arg(long, default_value_t = 5)]
        interval: u64,
    },
    /// Delete a scan
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
enum UserCommand {
    /// List user accounts
    List {
        #[arg(long, default_value_t = 0)]
        skip: u32,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: u32,
    },
    /// Change a user's role
    Role { id: String, role: Role },
    /// Re-enable a user account
    Activate { id: String },
    /// Disable a user account
    Deactivate { id: String },
    /// Delete a user together with their scans and findings
    Delete { id: String },
}

fn parse_override(raw: &str) -> Result<OptionOverride, String> {
    options::parse_override(raw).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url)?;
    }
    let log_path = logging::initialize_logging(&config.data_dir)?;
    info!(api = %config.api_base_url, log = %log_path.display(), "Starting console.");

    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(&config.data_dir));
    let session = SessionStore::new(storage.clone());
    session.load_from_storage();

    let client = ApiClient::new(&config)?;
    client.set_session_id(session.session_id()).await;

    match cli.command {
        Command::Tools { id } => show_tools(id.as_deref())?,
        Command::Scans(command) => run_scan_command(ScanOrchestrator::new(Arc::new(client)), command).await?,
        Command::Users(command) => run_user_command(AdminOrchestrator::new(Arc::new(client)), command).await?,
        Command::Login { email, password } => {
            let body = client
                .login(&LoginRequest { email, password })
                .await
                .map_err(|e| eyre!(extract_error_message(&e, "Login failed")))?;
            let response: LoginResponse = serde_json::from_value(body)?;
            session.start(response.session_id.as_deref(), response.user)?;
            print_whoami(&session);
        }
        Command::Logout => {
            if let Err(e) = client.logout().await {
                // The local session is cleared regardless.
                eprintln!("warning: {}", extract_error_message(&e, "server logout failed"));
            }
            session.logout();
            println!("Logged out.");
        }
        Command::Whoami => print_whoami(&session),
        Command::Prefs {
            theme,
            sidebar_collapsed,
        } => {
            let mut prefs = Preferences::load(storage.as_ref());
            if let Some(theme) = theme {
                prefs.theme = theme;
            }
            if let Some(collapsed) = sidebar_collapsed {
                prefs.sidebar_collapsed = collapsed;
            }
            prefs.save(storage.as_ref())?;
            println!("theme: {}\nsidebar collapsed: {}", prefs.theme, prefs.sidebar_collapsed);
        }
    }

    Ok(())
}

fn print_whoami(session: &SessionStore) {
    match session.snapshot().user {
        Some(user) => println!("{} <{}> ({})", user.full_name, user.email, user.role),
        None => println!("Not logged in."),
    }
}

fn show_tools(id: Option<&str>) -> Result<()> {
    let Some(id) = id else {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["ID", "Name", "Configurable", "Description"]);
        for tool in registry::tools() {
            table.add_row(vec![
                tool.id.to_string(),
                tool.label.to_string(),
                if tool.configurable { "yes" } else { "no" }.to_string(),
                tool.description.to_string(),
            ]);
        }
        println!("{table}");
        return Ok(());
    };

    let tool = registry::get_tool(id).ok_or_else(|| eyre!("unknown tool '{}'", id))?;
    println!("{} ({})\n{}\n", tool.label, tool.id, tool.description);
    if !registry::is_configurable(id) {
        println!("This tool has no configurable options.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Option", "Type", "Default", "Values"]);
    for field in tool.fields {
        let (kind, values) = match field {
            OptionField::Choice { choices, .. } => (
                "choice",
                choices
                    .iter()
                    .map(|c| {
                        let root = if c.requires.is_some() { " [root]" } else { "" };
                        format!("{} - {} ({}){}", c.value, c.label, c.time, root)
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            OptionField::Boolean { description, .. } => ("boolean", description.to_string()),
            OptionField::Numeric { min, max, description, .. } => ("integer", format!("{}..={}  {}", min, max, description)),
        };
        table.add_row(vec![
            format!("{}.{}", tool.id, field.key()),
            kind.to_string(),
            field.default_value().to_string(),
            values,
        ]);
    }
    println!("{table}");
    Ok(())
}

fn print_scans(scans: &[Scan]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["ID", "Target", "Status", "Tools", "Findings", "Started"]);
    for scan in scans {
        table.add_row(vec![
            scan.id.clone(),
            scan.target.clone(),
            scan.status.to_string(),
            scan.tools_used.join(", "),
            scan.findings_count.to_string(),
            scan.started_at
                .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    println!("{table}");
}

async fn run_scan_command(scans: ScanOrchestrator, command: ScanCommand) -> Result<()> {
    match command {
        ScanCommand::List => {
            scans.list().await;
            let state = scans.snapshot();
            if let Some(error) = state.error {
                bail!(error);
            }
            print_scans(&state.scans);
        }
        ScanCommand::Show { id } => {
            scans.get(&id).await;
            let state = scans.snapshot();
            match (state.selected_scan, state.error) {
                (_, Some(error)) => bail!(error),
                (Some(scan), None) => {
                    print_scans(std::slice::from_ref(&scan));
                    if let Some(message) = scan.error_message {
                        println!("error: {}", message);
                    }
                }
                (None, None) => bail!("scan '{}' not found", id),
            }
        }
        ScanCommand::Create {
            target,
            tools,
            overrides,
            allow_root,
        } => {
            let target = options::normalize_target(&target)?;
            let scan_options = options::build_scan_options(&tools, &overrides)?;

            println!("Target: {}", target);
            for line in options::summarize_selection(&scan_options) {
                let time = if line.time.is_empty() { String::new() } else { format!(" {}", line.time) };
                let root = if line.requires_root { " [requires root]" } else { "" };
                println!("  {} / {}: {}{}{}", line.tool, line.field_label, line.value_label, time, root);
            }
            if options::requires_elevation(&scan_options) && !allow_root {
                bail!("the selected options need root privileges on the scanner; re-run with --allow-root to confirm");
            }

            let request = CreateScanRequest {
                target,
                tools,
                options: scan_options,
            };
            match scans.create(request).await {
                Some(scan) => println!("Created scan {} ({}).", scan.id, scan.status),
                None => bail!(scans.snapshot().error.unwrap_or_else(|| "Failed to create scan".to_string())),
            }
        }
        ScanCommand::Status { id } => {
            let snapshot = scans.get_status(&id).await.map_err(|e| eyre!(e))?;
            println!("{}", describe_status(&snapshot));
        }
        ScanCommand::Watch { id, interval } => {
            watch_status(&scans, &id, Duration::from_secs(interval.max(1))).await?;
        }
        ScanCommand::Delete { id } => {
            if !scans.delete(&id).await {
                bail!(scans.snapshot().error.unwrap_or_else(|| "Failed to delete scan".to_string()));
            }
            println!("Deleted scan {}.", id);
        }
    }
    Ok(())
}

fn describe_status(snapshot: &ScanStatusSnapshot) -> String {
    let mut line = snapshot.status.to_string();
    if let Some(progress) = snapshot.progress {
        line.push_str(&format!(" {:.0}%", progress));
    }
    if let Some(findings) = snapshot.findings_count {
        line.push_str(&format!(", {} findings", findings));
    }
    if let Some(message) = &snapshot.message {
        line.push_str(&format!(" - {}", message));
    }
    line
}

/// Polls until the scan reaches a terminal status or the user presses Ctrl-C.
/// Transient poll failures are reported and retried on the next tick.
async fn watch_status(scans: &ScanOrchestrator, id: &str, every: Duration) -> Result<()> {
    let mut ticker = tokio::time::interval(every);
    let mut last = String::new();
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                println!("Stopped watching scan {}.", id);
                return Ok(());
            }
        }

        match scans.get_status(id).await {
            Ok(snapshot) => {
                let line = describe_status(&snapshot);
                if line != last {
                    println!("{}", line);
                    last = line;
                }
                if snapshot.status.is_terminal() {
                    return Ok(());
                }
            }
            Err(error) => eprintln!("warning: {}", error),
        }
    }
}

async fn run_user_command(users: AdminOrchestrator, command: UserCommand) -> Result<()> {
    let outcome = match command {
        UserCommand::List { skip, limit } => {
            users.list(skip, limit).await;
            let state = users.snapshot();
            if let Some(error) = state.error {
                bail!(error);
            }
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["ID", "Email", "Name", "Role", "Active", "Verified", "Last login"]);
            for user in &state.users {
                table.add_row(vec![
                    user.id.clone(),
                    user.email.clone(),
                    user.full_name.clone(),
                    user.role.to_string(),
                    user.is_active.to_string(),
                    user.is_verified.to_string(),
                    user.last_login
                        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "never".to_string()),
                ]);
            }
            println!("{table}");
            return Ok(());
        }
        UserCommand::Role { id, role } => users.update_role(&id, role).await,
        UserCommand::Activate { id } => users.update_status(&id, true).await,
        UserCommand::Deactivate { id } => users.update_status(&id, false).await,
        UserCommand::Delete { id } => users.delete(&id).await,
    };

    match outcome {
        Ok(()) => {
            println!("Done.");
            Ok(())
        }
        Err(message) => Err(eyre!(message)),
    }
}
