use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use geoguessr_daily_tracker::config::{self, Settings, StoredConfig, mask_secret};
use geoguessr_daily_tracker::error::{Result, TrackerError};
use geoguessr_daily_tracker::tracker::Tracker;

#[derive(Debug, Parser)]
#[command(name = "geoguessr-tracker", version, about = "GeoGuessr Daily Challenge Tracker")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Track today's daily challenge (default)
    Track,
    /// Fill previous dates from the links CSV file
    Fill,
    /// Show or update the saved configuration
    Configure(ConfigureArgs),
}

#[derive(Debug, Args)]
struct ConfigureArgs {
    /// Show the current configuration
    #[arg(long)]
    show: bool,
    /// GeoGuessr _ncfa cookie
    #[arg(long)]
    cookie: Option<String>,
    /// Write results to Google Sheets
    #[arg(long)]
    use_sheets: Option<bool>,
    /// Google Sheet ID
    #[arg(long)]
    sheet_id: Option<String>,
    /// Path to Google service account credentials
    #[arg(long)]
    credentials: Option<String>,
    /// Write results to the CSV file
    #[arg(long)]
    use_csv: Option<bool>,
    /// Directory holding the CSV files
    #[arg(long)]
    data_dir: Option<String>,
    /// IANA timezone deciding which day "today" is
    #[arg(long)]
    timezone: Option<String>,
}

impl ConfigureArgs {
    fn updates(&self) -> StoredConfig {
        StoredConfig {
            ncfa_cookie: self.cookie.clone(),
            use_gsheets: self.use_sheets.map(|b| b.to_string()),
            gsheet_id: self.sheet_id.clone(),
            gsheet_credentials: self.credentials.clone(),
            data_dir: self.data_dir.clone(),
            tracker_timezone: self.timezone.clone(),
            use_csv: self.use_csv.map(|b| b.to_string()),
        }
    }
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let cli = Cli::parse();
    match run(cli.command.unwrap_or(Command::Track)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Configure(args) => configure(&args),
        Command::Track => {
            let settings = Settings::resolve()?;
            let tracker = Tracker::from_settings(&settings)?;
            let report = tracker.track_today(settings.today())?;
            println!("{}", report);
            println!("Successfully saved challenge results for {}", report.date);
            Ok(())
        }
        Command::Fill => {
            let settings = Settings::resolve()?;
            let tracker = Tracker::from_settings(&settings)?;
            let summary = tracker.fill_from_data_dir(&settings)?;
            println!("{}", summary);
            Ok(())
        }
    }
}

fn configure(args: &ConfigureArgs) -> Result<()> {
    if args.show {
        println!("Current configuration:");
        for (key, value) in config::load_merged()?.display_entries() {
            println!("  {}: {}", key, value);
        }
        return Ok(());
    }

    let path = config::config_path();
    let stored = config::load_file(&path);
    let updates = args.updates();
    let updated = if updates == StoredConfig::default() {
        prompt_all(stored)?
    } else {
        stored.overlay(updates)
    };

    config::save(&path, &updated)?;
    println!("Configuration saved successfully");
    Ok(())
}

fn prompt_all(mut config: StoredConfig) -> Result<StoredConfig> {
    println!("GeoGuessr Tracker Configuration");
    println!("==============================");
    println!("Press Enter to keep current value");

    let shown_cookie = config.ncfa_cookie.as_deref().map(mask_secret);
    if let Some(cookie) = prompt("GeoGuessr _ncfa cookie", shown_cookie.as_deref())? {
        config.ncfa_cookie = Some(cookie);
    }
    if let Some(use_sheets) = prompt("Use Google Sheets? (true/false)", config.use_gsheets.as_deref())? {
        config.use_gsheets = Some(use_sheets.to_ascii_lowercase());
    }
    if config.use_gsheets.as_deref() == Some("true") {
        if let Some(id) = prompt("Google Sheet ID", config.gsheet_id.as_deref())? {
            config.gsheet_id = Some(id);
        }
        if let Some(creds) = prompt("Path to Google service account credentials", config.gsheet_credentials.as_deref())? {
            config.gsheet_credentials = Some(creds);
        }
    }
    Ok(config)
}

/// Ask for one value. `None` keeps the current one.
fn prompt(label: &str, current: Option<&str>) -> Result<Option<String>> {
    let io_err = |e: io::Error| TrackerError::config(format!("Failed to read input: {}", e));
    print!("{} [{}]: ", label, current.unwrap_or("not set"));
    io::stdout().flush().map_err(io_err)?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).map_err(io_err)?;
    let value = line.trim();
    Ok(if value.is_empty() { None } else { Some(value.to_string()) })
}
