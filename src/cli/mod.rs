//! CLI module for the Asmoun command-line interface.
//!
//! Subcommands talk to the booking API through [`AsmounClient`]:
//! - `activities list|show` - Browse the catalogue
//! - `reservations mine|all|show|create|update|validate|cancel` - Manage bookings
//! - `profile` - Show the logged-in account
//! - `register` - Create an account
//! - `config check` - Validate configuration file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::client::AsmounClient;
use crate::config::Config;
use crate::error::ApiError;
use crate::models::{AccountType, Activity, RegisterRequest, Reservation};

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "asmoun")]
#[command(author, version, about = "Browse and book activities on Asmoun Gadir", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "asmoun.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// API base URL, including the /api prefix (overrides the config file)
    #[arg(long, env = "ASMOUN_API_URL")]
    pub api_url: Option<String>,

    /// Account email (can also be set via ASMOUN_EMAIL env var)
    #[arg(long, env = "ASMOUN_EMAIL")]
    pub email: Option<String>,

    /// Account password (can also be set via ASMOUN_PASSWORD env var)
    #[arg(long, env = "ASMOUN_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Activity catalogue
    #[command(subcommand)]
    Activities(ActivitiesCommands),

    /// Reservation management (requires login)
    #[command(subcommand)]
    Reservations(ReservationsCommands),

    /// Show the logged-in user's profile
    Profile,

    /// Create an account with --email and --password
    Register {
        /// Display name
        #[arg(long)]
        name: String,
        /// Account type: tourist or accommodation
        #[arg(long, default_value = "tourist")]
        role: AccountType,
    },

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Activities subcommands
#[derive(Subcommand, Debug)]
pub enum ActivitiesCommands {
    /// List activities open for booking
    List {
        /// Only show activities whose title, category or description match
        #[arg(short, long)]
        search: Option<String>,
        /// Include drafts and cancelled activities
        #[arg(long)]
        all: bool,
    },
    /// Show details for one activity
    Show {
        /// Activity ID
        id: i64,
    },
}

/// Reservations subcommands
#[derive(Subcommand, Debug)]
pub enum ReservationsCommands {
    /// List your reservations
    Mine,
    /// List every reservation (accommodation and admin accounts)
    All,
    /// Show one reservation
    Show {
        /// Reservation ID
        id: i64,
    },
    /// Book places on an activity
    Create {
        /// Activity ID
        activity_id: i64,
        /// Number of places
        places: u32,
    },
    /// Change the number of places of a reservation
    Update {
        /// Reservation ID
        id: i64,
        /// New number of places
        places: u32,
    },
    /// Confirm a pending reservation
    Validate {
        /// Reservation ID
        id: i64,
    },
    /// Cancel a reservation
    Cancel {
        /// Reservation ID
        id: i64,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

// ============================================================================
// CLI Command Handlers
// ============================================================================

/// Run a CLI command
pub async fn run_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Activities(ActivitiesCommands::List { search, all }) => {
            cmd_activities_list(cli, search.as_deref(), *all).await
        }
        Commands::Activities(ActivitiesCommands::Show { id }) => cmd_activities_show(cli, *id).await,
        Commands::Reservations(cmd) => cmd_reservations(cli, cmd).await,
        Commands::Profile => cmd_profile(cli).await,
        Commands::Register { name, role } => cmd_register(cli, name, *role).await,
        Commands::Config(ConfigCommands::Check) => cmd_config_check(cli),
    }
}

/// Build a client from the config file and flags, logging in when asked.
async fn connect(cli: &Cli, login: bool) -> Result<AsmounClient> {
    let mut config = Config::load(&cli.config)?;
    if let Some(url) = &cli.api_url {
        config = config.with_base_url(url.clone());
        config.validate()?;
    }
    let client = AsmounClient::new(&config).context("Failed to create API client")?;

    if login {
        let (email, password) = credentials(cli)?;
        client
            .login(email, password)
            .await
            .map_err(|e| explain(e, "Login failed"))?;
    }
    Ok(client)
}

fn credentials(cli: &Cli) -> Result<(&str, &str)> {
    match (cli.email.as_deref(), cli.password.as_deref()) {
        (Some(email), Some(password)) => Ok((email, password)),
        _ => anyhow::bail!(
            "Authentication required. Use --email and --password or set ASMOUN_EMAIL and ASMOUN_PASSWORD."
        ),
    }
}

/// Attach a hint to errors the user can act on.
fn explain(err: ApiError, action: &str) -> anyhow::Error {
    if err.is_unauthorized() {
        anyhow::anyhow!("{}: {} (check your email and password)", action, err.message())
    } else if err.status() == Some(403) {
        anyhow::anyhow!("{}: {} (your account cannot do this)", action, err.message())
    } else {
        anyhow::Error::new(err).context(action.to_string())
    }
}

/// List activities
async fn cmd_activities_list(cli: &Cli, search: Option<&str>, all: bool) -> Result<()> {
    let client = connect(cli, false).await?;
    let activities = client
        .activities()
        .await
        .map_err(|e| explain(e, "Failed to fetch activities"))?;

    let shown: Vec<&Activity> = activities
        .iter()
        .filter(|a| all || a.is_listed())
        .filter(|a| search.map_or(true, |q| a.matches_search(q)))
        .collect();

    if shown.is_empty() {
        println!("No activities found.");
        return Ok(());
    }

    println!();
    println!(
        "{:<6}  {:<30}  {:<12}  {:<16}  {:<9}  {:<7}  {:>9}  {:<10}",
        "ID", "TITLE", "CATEGORY", "DATE", "DURATION", "PLACES", "PRICE", "STATUS"
    );
    println!("{}", "-".repeat(112));

    for activity in shown {
        println!(
            "{:<6}  {:<30}  {:<12}  {:<16}  {:<9}  {:<7}  {:>9.2}  {:<10}",
            activity.id,
            truncate(&activity.title, 30),
            truncate(&activity.category, 12),
            format_date(activity),
            activity.duration_label(),
            format!("{}/{}", activity.available_places, activity.total_places),
            activity.price,
            activity.status
        );
    }

    println!();
    Ok(())
}

/// Show details for one activity
async fn cmd_activities_show(cli: &Cli, id: i64) -> Result<()> {
    let client = connect(cli, false).await?;
    let activity = client
        .activity(id)
        .await
        .map_err(|e| explain(e, "Failed to fetch activity"))?;

    println!();
    println!("=== Activity: {} ===", activity.title);
    println!();
    println!("ID:            {}", activity.id);
    println!("Category:      {} ({:?})", activity.category, activity.category_kind());
    println!("Date:          {}", format_date(&activity));
    println!("Duration:      {}", activity.duration_label());
    println!("Meeting point: {}", or_dash(&activity.meeting_point));
    println!(
        "Places:        {} of {} available{}",
        activity.available_places,
        activity.total_places,
        if activity.is_full() { " [FULL]" } else { "" }
    );
    println!("Price:         {:.2} MAD per person", activity.price);
    println!("Status:        {}", activity.status);
    if !activity.description.is_empty() {
        println!();
        println!("{}", activity.description);
    }
    println!();

    Ok(())
}

async fn cmd_reservations(cli: &Cli, cmd: &ReservationsCommands) -> Result<()> {
    let client = connect(cli, true).await?;

    match cmd {
        ReservationsCommands::Mine => {
            let reservations = client
                .my_reservations()
                .await
                .map_err(|e| explain(e, "Failed to fetch reservations"))?;
            print_reservations(&reservations);
        }
        ReservationsCommands::All => {
            let reservations = client
                .all_reservations()
                .await
                .map_err(|e| explain(e, "Failed to fetch reservations"))?;
            print_reservations(&reservations);
        }
        ReservationsCommands::Show { id } => {
            let reservation = client
                .reservation(*id)
                .await
                .map_err(|e| explain(e, "Failed to fetch reservation"))?;
            print_reservation(&reservation);
        }
        ReservationsCommands::Create { activity_id, places } => {
            let activity = client
                .activity(*activity_id)
                .await
                .map_err(|e| explain(e, "Failed to fetch activity"))?;
            if activity.is_full() {
                anyhow::bail!("'{}' is fully booked", activity.title);
            }
            if *places == 0 || *places > activity.available_places {
                anyhow::bail!(
                    "Choose between 1 and {} place(s) for '{}'",
                    activity.available_places,
                    activity.title
                );
            }

            println!(
                "Booking {} place(s) on '{}' (estimated {:.2} MAD)...",
                places,
                activity.title,
                activity.preview_total(*places)
            );
            let reservation = client
                .create_reservation(*activity_id, *places)
                .await
                .map_err(|e| explain(e, "Failed to create reservation"))?;

            println!();
            println!("[OK] Reservation created!");
            print_reservation(&reservation);
        }
        ReservationsCommands::Update { id, places } => {
            let reservation = client
                .update_reservation(*id, *places)
                .await
                .map_err(|e| explain(e, "Failed to update reservation"))?;
            println!();
            println!("[OK] Reservation updated!");
            print_reservation(&reservation);
        }
        ReservationsCommands::Validate { id } => {
            let reservation = client
                .validate_reservation(*id)
                .await
                .map_err(|e| explain(e, "Failed to validate reservation"))?;
            println!();
            println!("[OK] Reservation confirmed!");
            print_reservation(&reservation);
        }
        ReservationsCommands::Cancel { id } => {
            client
                .cancel_reservation(*id)
                .await
                .map_err(|e| explain(e, "Failed to cancel reservation"))?;
            println!("[OK] Reservation {} cancelled.", id);
        }
    }

    Ok(())
}

fn print_reservations(reservations: &[Reservation]) {
    if reservations.is_empty() {
        println!("No reservations found.");
        return;
    }

    println!();
    println!(
        "{:<6}  {:<30}  {:<6}  {:>10}  {:<10}  {:<16}",
        "ID", "ACTIVITY", "PLACES", "TOTAL", "STATUS", "BOOKED"
    );
    println!("{}", "-".repeat(88));

    for reservation in reservations {
        println!(
            "{:<6}  {:<30}  {:<6}  {:>10.2}  {:<10}  {:<16}",
            reservation.id,
            truncate(&activity_title(reservation), 30),
            reservation.number_of_places,
            reservation.total_price,
            reservation.status,
            reservation
                .created_at
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }

    println!();
}

fn print_reservation(reservation: &Reservation) {
    println!();
    println!("=== Reservation #{} ===", reservation.id);
    println!();
    println!("Activity:    {}", activity_title(reservation));
    println!("Places:      {}", reservation.number_of_places);
    println!("Total:       {:.2} MAD", reservation.total_price);
    println!("Status:      {}", reservation.status);
    if let Some(created) = reservation.created_at {
        println!("Booked:      {}", created.format("%Y-%m-%d %H:%M"));
    }
    println!();
}

fn activity_title(reservation: &Reservation) -> String {
    match (&reservation.activity, reservation.booked_activity_id()) {
        (Some(activity), _) if !activity.title.is_empty() => activity.title.clone(),
        (_, Some(id)) => format!("Activity #{}", id),
        _ => "-".to_string(),
    }
}

/// Show the logged-in user's profile
async fn cmd_profile(cli: &Cli) -> Result<()> {
    let client = connect(cli, true).await?;
    let profile = client
        .profile()
        .await
        .map_err(|e| explain(e, "Failed to fetch profile"))?;

    let Some(user) = profile else {
        println!("The server returned no profile.");
        return Ok(());
    };

    println!();
    println!("=== Profile ===");
    println!();
    println!("ID:     {}", user.id);
    println!("Name:   {}", or_dash(&user.name));
    println!("Email:  {}", or_dash(&user.email));
    println!(
        "Role:   {}",
        user.role
            .as_ref()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!();

    Ok(())
}

/// Create an account
async fn cmd_register(cli: &Cli, name: &str, role: AccountType) -> Result<()> {
    let (email, password) = credentials(cli)?;
    let client = connect(cli, false).await?;

    let request = RegisterRequest {
        email: email.to_string(),
        password: password.to_string(),
        name: name.to_string(),
        role,
    };
    let user = client
        .register(&request)
        .await
        .map_err(|e| explain(e, "Registration failed"))?;

    println!("[OK] Account created for {}.", email);
    if let Some(user) = user {
        println!("User ID: {}", user.id);
    }
    println!("You can now log in with --email and --password.");
    Ok(())
}

fn cmd_config_check(cli: &Cli) -> Result<()> {
    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!(
            "[!!] Configuration file not found: {}",
            config_path.display()
        );
        println!();
        println!("Defaults will be used (API at http://localhost:5000/api).");
        return Ok(());
    }

    match Config::load(config_path) {
        Ok(config) => {
            println!("[OK] Configuration file is valid!");
            println!();
            println!("=== Configuration Summary ===");
            println!();
            println!("API:");
            println!("  Base URL:     {}", config.api.base_url);
            println!("  Timeout:      {}s", config.api.timeout_secs);
            println!("  User Agent:   {}", config.api.user_agent);
            println!();
            println!("Logging:");
            println!("  Level:        {}", config.logging.level);
            println!();

            if is_remote_plain_http(&config.api.base_url) {
                println!("Warnings:");
                println!("  [!] Plain HTTP to a remote host sends the bearer token unencrypted");
                println!();
            }

            Ok(())
        }
        Err(e) => {
            println!("[!!] Configuration file is invalid!");
            println!();
            println!("Error: {:#}", e);
            println!();
            println!("Please check the configuration file syntax and try again.");
            anyhow::bail!("Invalid configuration file");
        }
    }
}

fn is_remote_plain_http(url: &str) -> bool {
    let Some(rest) = url.trim().strip_prefix("http://") else {
        return false;
    };
    let host = rest.split(['/', ':']).next().unwrap_or_default();
    !matches!(host, "localhost" | "127.0.0.1")
}

fn format_date(activity: &Activity) -> String {
    activity
        .date_start
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

/// Truncate a string to max length (in characters) with ellipsis
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
