mod config;
mod db;
mod display;
mod filter;
mod forms;
mod models;
mod next_action;
mod state;
mod tui;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use config::{Config, ViewerZone};
use db::Database;
use display::{ApplicationView, PLACEHOLDER, location_line, or_placeholder, priority_badge};
use filter::FilterCriteria;
use forms::{NewApplicationForm, QuickEditForm};
use models::{ApplicationRecord, ApplicationStatus};

#[derive(Parser)]
#[command(name = "apptrack")]
#[command(about = "Job application tracker - statuses, follow-ups, and next actions")]
struct Cli {
    /// Database file (defaults to the platform data directory)
    #[arg(long, global = true, env = "APPTRACK_DB")]
    db: Option<PathBuf>,

    /// IANA time zone used to decide what "today" is (defaults to system local)
    #[arg(long, global = true, env = "APPTRACK_TZ")]
    tz: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct FilterArgs {
    /// Substring of company or role
    #[arg(short = 'q', long)]
    search: Option<String>,

    /// Status, or 'all'
    #[arg(short, long)]
    status: Option<String>,

    /// Priority 1-5, or 'all'
    #[arg(short, long)]
    priority: Option<String>,

    /// Work mode (remote, hybrid, onsite), or 'all'
    #[arg(short, long)]
    work_mode: Option<String>,
}

impl FilterArgs {
    fn criteria(&self) -> Result<FilterCriteria> {
        FilterCriteria::from_args(
            self.search.as_deref(),
            self.status.as_deref(),
            self.priority.as_deref(),
            self.work_mode.as_deref(),
        )
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Add an application
    Add {
        /// Company name
        company: String,

        /// Role title
        role: String,

        /// Status (draft, applied, screen, interview, offer, rejected, withdrawn, ghosted)
        #[arg(short, long, default_value = "applied")]
        status: String,

        /// Priority, 1 (highest) to 5
        #[arg(short, long, default_value = "3")]
        priority: i64,

        /// Date applied (YYYY-MM-DD)
        #[arg(long)]
        applied: Option<String>,

        /// When the next action is due (YYYY-MM-DDTHH:MM, local time, or RFC 3339)
        #[arg(long)]
        next_at: Option<String>,

        /// What the next action is
        #[arg(long)]
        next_label: Option<String>,

        /// Location
        #[arg(short, long)]
        location: Option<String>,

        /// Work mode (remote, hybrid, onsite)
        #[arg(short, long)]
        work_mode: Option<String>,

        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List applications
    List {
        #[command(flatten)]
        filters: FilterArgs,

        /// Print JSON (records plus labels and tones) instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show application details
    Show {
        /// Application ID (a unique prefix is enough)
        id: String,
    },

    /// Quick edit an application. Pass an empty string to clear a field.
    Edit {
        /// Application ID (a unique prefix is enough)
        id: String,

        #[arg(long)]
        company: Option<String>,

        #[arg(long)]
        role: Option<String>,

        #[arg(short, long)]
        status: Option<String>,

        /// Out-of-range values are clamped to 1-5
        #[arg(short, long, allow_negative_numbers = true)]
        priority: Option<i64>,

        #[arg(long)]
        applied: Option<String>,

        #[arg(long)]
        next_at: Option<String>,

        #[arg(long)]
        next_label: Option<String>,

        #[arg(short, long)]
        location: Option<String>,

        #[arg(short, long)]
        work_mode: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,

        /// Record a touch point now
        #[arg(long)]
        touch: bool,
    },

    /// Load applications from a JSON array, upserting by id
    Seed {
        /// Path to JSON file
        file: PathBuf,
    },

    /// Print all applications as JSON
    Export,

    /// Browse applications interactively
    Browse {
        #[command(flatten)]
        filters: FilterArgs,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("APPTRACK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn parse_status(value: &str) -> Result<ApplicationStatus> {
    ApplicationStatus::parse(value).ok_or_else(|| {
        let known: Vec<&str> = ApplicationStatus::ALL.iter().map(|s| s.as_str()).collect();
        anyhow!("Unknown status '{}' (expected one of: {})", value, known.join(", "))
    })
}

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = Config::resolve(cli.db, cli.tz)?;
    let db = Database::open(&config.db_path)?;
    let zone = config.zone;

    match cli.command {
        Commands::Init => {
            db.init()?;
            println!("Database initialized at {}", db.path().display());
        }

        Commands::Add {
            company,
            role,
            status,
            priority,
            applied,
            next_at,
            next_label,
            location,
            work_mode,
            notes,
        } => {
            db.ensure_initialized()?;
            let form = NewApplicationForm {
                company_name: company,
                role_title: role,
                status: parse_status(&status)?,
                priority,
                applied_at: applied.unwrap_or_default(),
                next_action_at: next_at.unwrap_or_default(),
                next_action_label: next_label.unwrap_or_default(),
                location: location.unwrap_or_default(),
                work_mode: work_mode.unwrap_or_default(),
                notes: notes.unwrap_or_default(),
            };
            let new = form
                .build()
                .ok_or_else(|| anyhow!("Company and role must not be blank"))?;
            let id = db.create_application(&new)?;
            println!("Added application {} ({} at {})", id, new.role_title, new.company_name);
        }

        Commands::List { filters, json } => {
            db.ensure_initialized()?;
            let criteria = filters.criteria()?;
            let all = db.list_applications()?;
            let rows = filter::apply(&all, &criteria);

            if json {
                let now = Utc::now();
                let views: Vec<ApplicationView> = rows
                    .iter()
                    .map(|r| {
                        ApplicationView::new(r, zone.next_action(r.next_action_at.as_deref(), now))
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&views)?);
            } else if all.is_empty() {
                println!("No applications yet. Add one with 'apptrack add <company> <role>'.");
            } else if rows.is_empty() {
                println!("No applications match your filters.");
            } else {
                print_table(&rows, zone);
            }
        }

        Commands::Show { id } => {
            db.ensure_initialized()?;
            let id = resolve_id(&db, &id)?;
            match db.get_application(&id)? {
                Some(record) => print_detail(&record, zone),
                None => println!("Application {} not found.", id),
            }
        }

        Commands::Edit {
            id,
            company,
            role,
            status,
            priority,
            applied,
            next_at,
            next_label,
            location,
            work_mode,
            notes,
            touch,
        } => {
            db.ensure_initialized()?;
            let id = resolve_id(&db, &id)?;
            let record = db
                .get_application(&id)?
                .ok_or_else(|| anyhow!("Application {} not found", id))?;

            let mut form = QuickEditForm::open(&record);
            let draft = &mut form.draft;
            if let Some(v) = company {
                draft.company_name = v;
            }
            if let Some(v) = role {
                draft.role_title = v;
            }
            if let Some(v) = status {
                draft.status = parse_status(&v)?;
            }
            if let Some(v) = priority {
                draft.priority = v;
            }
            for (field, value) in [
                (&mut draft.applied_at, applied),
                (&mut draft.next_action_at, next_at),
                (&mut draft.next_action_label, next_label),
                (&mut draft.location, location),
                (&mut draft.work_mode, work_mode),
                (&mut draft.notes, notes),
            ] {
                if let Some(v) = value {
                    *field = Some(v);
                }
            }
            if touch {
                form.touch(Utc::now());
            }

            if !form.is_dirty() {
                println!("No changes.");
            } else if !form.can_save() {
                return Err(anyhow!("Company and role must not be blank"));
            } else {
                let patch = form.diff();
                db.update_application(&id, &patch)?;
                let mut updated = record;
                patch.apply_to(&mut updated);
                println!("Updated application {}", id);
                print_detail(&updated, zone);
            }
        }

        Commands::Seed { file } => {
            db.init()?;
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let records: Vec<ApplicationRecord> = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse {}", file.display()))?;
            if records.is_empty() {
                return Err(anyhow!("{} contains no applications", file.display()));
            }

            println!("Seeding {} applications...", records.len());
            let stats = db.seed_applications(&records)?;
            println!(
                "Seeded/updated {} applications in {} batch(es).",
                stats.written, stats.batches
            );
            if stats.skipped > 0 {
                println!("Skipped {} row(s) without an id.", stats.skipped);
            }
        }

        Commands::Export => {
            db.ensure_initialized()?;
            let all = db.list_applications()?;
            println!("{}", serde_json::to_string_pretty(&all)?);
        }

        Commands::Browse { filters } => {
            db.ensure_initialized()?;
            tui::run_browse(&db, filters.criteria()?, zone)?;
        }
    }

    Ok(())
}

/// Accept a full id or an unambiguous prefix of one.
fn resolve_id(db: &Database, input: &str) -> Result<String> {
    let input = input.trim();
    let all = db.list_applications()?;
    if all.iter().any(|r| r.id == input) {
        return Ok(input.to_string());
    }
    let matches: Vec<&ApplicationRecord> = all.iter().filter(|r| r.id.starts_with(input)).collect();
    match matches.as_slice() {
        [only] => Ok(only.id.clone()),
        [] => Err(anyhow!("Application {} not found", input)),
        _ => Err(anyhow!("Id prefix '{}' matches {} applications", input, matches.len())),
    }
}

fn print_table(rows: &[&ApplicationRecord], zone: ViewerZone) {
    let now = Utc::now();
    println!(
        "{:<8} {:<18} {:<24} {:<10} {:<14} {:<18} {:<8} {:<8} {}",
        "ID",
        "COMPANY",
        "ROLE",
        "STATUS",
        "PRIORITY",
        "NEXT ACTION",
        "TOUCHED",
        "APPLIED",
        "LOCATION"
    );
    println!("{}", "-".repeat(124));
    for row in rows {
        let next = zone.next_action(row.next_action_at.as_deref(), now);
        println!(
            "{:<8} {:<18} {:<24} {:<10} {:<14} {:<18} {:<8} {:<8} {}",
            truncate(&row.id, 8),
            truncate(&row.company_name, 18),
            truncate(&row.role_title, 24),
            row.status.label(),
            priority_badge(row.priority),
            next.label,
            zone.short_date(row.last_touch_at.as_deref()),
            zone.short_date(row.applied_at.as_deref()),
            location_line(row.location.as_deref(), row.work_mode.as_deref()),
        );
    }
}

fn print_detail(record: &ApplicationRecord, zone: ViewerZone) {
    let next = zone.next_action(record.next_action_at.as_deref(), Utc::now());

    println!("{}", record.company_name);
    println!("{}", record.role_title);
    println!("ID: {}", record.id);
    println!("Status: {}", record.status.label());
    println!("Priority: {}", priority_badge(record.priority));
    match record.next_action_label.as_deref().map(str::trim) {
        Some(label) if !label.is_empty() => println!("Next action: {} [{}]", label, next.label),
        _ => println!("Next action: No next action set [{}]", next.label),
    }
    println!("Last touch: {}", zone.short_date(record.last_touch_at.as_deref()));
    println!("Applied: {}", zone.date(record.applied_at.as_deref()));
    println!(
        "Location / Mode: {}",
        location_line(record.location.as_deref(), record.work_mode.as_deref())
    );

    let notes = or_placeholder(record.notes.as_deref());
    if notes == PLACEHOLDER {
        println!("\n--- Notes ---\nNo notes yet. Add key details after screens/interviews.");
    } else {
        println!("\n--- Notes ---\n{}", notes);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
