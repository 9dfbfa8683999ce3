use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use goog_auth::ContextOptions;
use goog_calendar::{CalendarClient, EventQuery};
use goog_core::{ConfigureOptions, Settings};
use goog_drive::{DriveClient, WalkOptions, WriteOptions, WriteSource};
use goog_gmail::{GmailClient, Outgoing, SearchQuery};
use goog_sheets::SheetsClient;

#[derive(Parser)]
#[command(name = "goog", version, about = "Calendar, Gmail, Drive and Sheets from the shell")]
struct Cli {
    /// Config file (defaults to <config_dir>/goog/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Account to impersonate
    #[arg(long, global = true, env = "GOOG_ACCOUNT")]
    account: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Drive files addressed as Root/folder/file
    #[command(subcommand)]
    Drive(DriveCommand),
    #[command(subcommand)]
    Mail(MailCommand),
    #[command(subcommand)]
    Calendar(CalendarCommand),
    #[command(subcommand)]
    Sheets(SheetsCommand),
}

#[derive(Subcommand)]
enum DriveCommand {
    /// List files under a folder
    Ls {
        folder: String,
        #[arg(short, long)]
        recursive: bool,
        /// Include download links
        #[arg(long)]
        links: bool,
        /// Only files modified since this RFC 3339 instant
        #[arg(long)]
        since: Option<DateTime<Utc>>,
    },
    /// Print the Drive ID of a path
    Id { path: String },
    Exists { path: String },
    /// Download a file into a directory
    Get {
        path: String,
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Write file contents to stdout
    Cat { path: String },
    /// Upload a local file into a folder
    Put {
        local: PathBuf,
        folder: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        mime_type: Option<String>,
        #[arg(long)]
        no_overwrite: bool,
    },
    Mv { path: String, to_folder: String },
    Rm { path: String },
}

#[derive(Subcommand)]
enum MailCommand {
    Send {
        #[arg(long, required = true)]
        to: Vec<String>,
        #[arg(long)]
        subject: String,
        #[arg(long, default_value = "")]
        body: String,
        #[arg(long)]
        attach: Vec<PathBuf>,
        #[arg(long)]
        from: Option<String>,
    },
    /// Search with a Gmail query string
    Search { query: String },
    Profile,
}

#[derive(Subcommand)]
enum CalendarCommand {
    Calendars,
    /// Upcoming events
    Events {
        #[arg(long, default_value = "primary")]
        calendar: String,
        #[arg(long, default_value_t = 7)]
        days: i64,
        #[arg(short, long)]
        query: Option<String>,
    },
}

#[derive(Subcommand)]
enum SheetsCommand {
    /// Print worksheet rows as JSON lines keyed by the header row
    Dump {
        path: String,
        #[arg(long, default_value_t = 1)]
        header: u32,
        #[arg(long)]
        skip: Option<u32>,
        #[arg(long)]
        sheet: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    goog_core::init()?;

    let cli = Cli::parse();
    load_settings(cli.config.as_deref())?;

    let opts = ContextOptions {
        account: cli.account.clone(),
        ..Default::default()
    };

    match cli.command {
        Command::Drive(cmd) => run_drive(cmd, opts).await,
        Command::Mail(cmd) => run_mail(cmd, opts).await,
        Command::Calendar(cmd) => run_calendar(cmd, opts).await,
        Command::Sheets(cmd) => run_sheets(cmd, opts).await,
    }
}

/// Apply the config file (when present) to the process-wide settings.
fn load_settings(path: Option<&std::path::Path>) -> Result<()> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let default = Settings::default_path()?;
            if !default.exists() {
                tracing::debug!("No config file at {}", default.display());
                goog_core::configure(ConfigureOptions::from_env(|key| std::env::var(key).ok()));
                return Ok(());
            }
            default
        }
    };

    let (settings, _) = Settings::load_validated(&path)?;
    goog_core::configure(settings.into());
    tracing::info!("Loaded config from {}", path.display());
    Ok(())
}

async fn run_drive(cmd: DriveCommand, opts: ContextOptions) -> Result<()> {
    let drive = DriveClient::new(opts)?;

    match cmd {
        DriveCommand::Ls {
            folder,
            recursive,
            links,
            since,
        } => {
            let walk = WalkOptions {
                recursive,
                links,
                mtime: true,
                since,
                ..Default::default()
            };
            for entry in drive.walk(&folder, &walk).await? {
                match entry.web_content_link {
                    Some(link) => println!("{}\t{}\t{}", entry.id, entry.path, link),
                    None => println!("{}\t{}", entry.id, entry.path),
                }
            }
        }
        DriveCommand::Id { path } => println!("{}", drive.id(&path).await?),
        DriveCommand::Exists { path } => println!("{}", drive.exists(&path).await?),
        DriveCommand::Get { path, dir } => {
            let target = drive.download(&path, dir.as_deref()).await?;
            println!("{}", target.display());
        }
        DriveCommand::Cat { path } => {
            use std::io::Write;
            let data = drive.read(&path).await?;
            std::io::stdout()
                .write_all(&data)
                .context("Failed to write to stdout")?;
        }
        DriveCommand::Put {
            local,
            folder,
            name,
            mime_type,
            no_overwrite,
        } => {
            let name = match name {
                Some(n) => n,
                None => local
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .context("Local path has no file name; pass --name")?,
            };
            let write = WriteOptions {
                mime_type,
                overwrite: !no_overwrite,
            };
            let file = drive
                .write(WriteSource::from(local), &name, &folder, &write)
                .await?;
            println!("{}", file.id);
        }
        DriveCommand::Mv { path, to_folder } => {
            let file = drive.move_file(&path, &to_folder).await?;
            println!("{}", file.id);
        }
        DriveCommand::Rm { path } => drive.delete(&path).await?,
    }
    Ok(())
}

async fn run_mail(cmd: MailCommand, opts: ContextOptions) -> Result<()> {
    let gmail = GmailClient::new(opts)?;

    match cmd {
        MailCommand::Send {
            to,
            subject,
            body,
            attach,
            from,
        } => {
            let mail = Outgoing {
                sender: from,
                to,
                subject,
                body,
                attachments: attach,
            };
            let sent = gmail.send_mail(&mail).await?;
            println!("{}", sent.id);
        }
        MailCommand::Search { query } => {
            for email in gmail.get_emails(&SearchQuery::raw(query)).await? {
                println!("{}\t{}\t{}", email.id, email.sender(), email.subject());
            }
        }
        MailCommand::Profile => {
            let profile = gmail.get_profile().await?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
    }
    Ok(())
}

async fn run_calendar(cmd: CalendarCommand, opts: ContextOptions) -> Result<()> {
    let calendar = CalendarClient::new(opts)?;

    match cmd {
        CalendarCommand::Calendars => {
            for entry in calendar.list_calendar().await? {
                let marker = if entry.is_primary { "*" } else { " " };
                println!("{} {}\t{}", marker, entry.id, entry.summary);
            }
        }
        CalendarCommand::Events {
            calendar: calendar_id,
            days,
            query,
        } => {
            let (from, until) = event_window(Utc::now(), days)?;
            let mut filter = EventQuery::between(from, until);
            filter.q = query;

            for event in calendar.list_events(&calendar_id, &filter).await?.events {
                println!(
                    "{}\t{}\t{}",
                    event.start.as_datetime().to_rfc3339(),
                    event.id,
                    event.summary
                );
            }
        }
    }
    Ok(())
}

/// `[now, now + days)`, rejecting spans chrono cannot represent.
fn event_window(now: DateTime<Utc>, days: i64) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let until = Duration::try_days(days)
        .and_then(|span| now.checked_add_signed(span))
        .with_context(|| format!("--days {} is out of range", days))?;
    Ok((now, until))
}

async fn run_sheets(cmd: SheetsCommand, opts: ContextOptions) -> Result<()> {
    let sheets = SheetsClient::new(opts)?;

    match cmd {
        SheetsCommand::Dump {
            path,
            header,
            skip,
            sheet,
        } => {
            for record in sheets
                .get_iterdict(&path, header, skip, sheet.as_deref())
                .await?
            {
                println!("{}", serde_json::to_string(&record)?);
            }
        }
    }
    Ok(())
}
