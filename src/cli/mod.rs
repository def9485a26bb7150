// Command-line front-end
// Each subcommand loads the board, performs one action and prints the result

pub mod render;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use task_calendar::models::task::{NewTask, Priority};
use task_calendar::services::auth::FileCredentialStore;
use task_calendar::services::scheduling::{DropOutcome, Scheduler, SlotKey};
use task_calendar::services::settings::SettingsService;
use task_calendar::services::todoist::SyncClient;
use task_calendar::utils::date::{month_of, week_of, TimeSlot};

#[derive(Parser)]
#[command(name = "task-calendar", version, about = "Schedule to-do items onto a calendar")]
pub struct Cli {
    /// Settings file to use instead of the platform default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store an API token
    Login { token: String },
    /// Forget the stored API token
    Logout,
    /// Show the week containing a date (default: today)
    Week {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show the month containing a date (default: today)
    Month {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List unscheduled tasks
    Unplaced {
        #[arg(long)]
        project: Option<String>,
    },
    /// Schedule a task; without a time the least busy slot of the day is used
    Schedule {
        id: String,
        date: NaiveDate,
        time: Option<String>,
    },
    /// Move a task back to the unscheduled list
    Unschedule { id: String },
    /// Create a task
    Add {
        title: String,
        #[arg(long, default_value = "p4")]
        priority: String,
        #[arg(long = "label")]
        labels: Vec<String>,
        #[arg(long)]
        project: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Delete a task
    Delete { id: String },
    /// Create a project
    NewProject { name: String },
    /// Create a label
    NewLabel { name: String },
}

pub async fn run(cli: Cli) -> Result<()> {
    let settings_service = match &cli.config {
        Some(path) => SettingsService::new(path),
        None => SettingsService::default_location()?,
    };
    let settings = settings_service.get()?;
    let credentials = FileCredentialStore::default_location()?;
    let mut client = SyncClient::new(&settings, Box::new(credentials))?;

    match &cli.command {
        Commands::Login { token } => {
            client.sign_in(token)?;
            println!("Signed in.");
            return Ok(());
        }
        Commands::Logout => {
            client.sign_out()?;
            println!("Signed out.");
            return Ok(());
        }
        _ => {}
    }

    if !client.is_authenticated() {
        return Err(anyhow!("Not signed in. Run `task-calendar login <token>` first."));
    }

    let mut scheduler = Scheduler::new(client, &settings)?;
    let result = execute(&mut scheduler, &cli.command).await;
    print!("{}", render::notices(&scheduler.drain_notices()));
    result
}

async fn execute(scheduler: &mut Scheduler<SyncClient>, command: &Commands) -> Result<()> {
    scheduler.load().await.context("Failed to load tasks")?;
    let today = scheduler.zone().today();

    match command {
        Commands::Week { date } => {
            let days = week_of(date.unwrap_or(today), today);
            print!("{}", render::week(scheduler.board().placements(), &days));
        }
        Commands::Month { date } => {
            let reference = date.unwrap_or(today);
            let days = month_of(reference, today);
            print!(
                "{}",
                render::month(scheduler.board().placements(), &days, reference)
            );
        }
        Commands::Unplaced { project } => {
            let tasks = match project {
                Some(project_id) => scheduler.unplaced_in_project(project_id),
                None => scheduler.board().unplaced().iter().collect(),
            };
            print!("{}", render::unplaced(&tasks));
        }
        Commands::Schedule { id, date, time } => {
            let outcome = match time {
                Some(label) => {
                    let time = TimeSlot::parse(label)?;
                    scheduler.schedule(id, SlotKey::new(*date, time)).await?
                }
                None => scheduler.schedule_on_day(id, *date).await?,
            };
            if let DropOutcome::Scheduled(key) = outcome {
                println!("Scheduled [{}] at {}", id, key);
            }
        }
        Commands::Unschedule { id } => {
            scheduler.unschedule(id).await?;
            println!("Unscheduled [{}]", id);
        }
        Commands::Add {
            title,
            priority,
            labels,
            project,
            description,
        } => {
            let priority = Priority::parse(priority)
                .ok_or_else(|| anyhow!("Unknown priority '{}', expected p1..p4", priority))?;
            let mut draft = NewTask::new(title.as_str())
                .priority(priority)
                .description(description.as_str());
            for label in labels {
                draft = draft.label(label.as_str());
            }
            if let Some(project_id) = project {
                draft = draft.project(project_id.as_str());
            }
            let task = scheduler.create_task(draft).await?;
            println!("{}", render::task_line(&task));
        }
        Commands::Delete { id } => {
            let task = scheduler.delete_task(id).await?;
            println!("Deleted {}", render::task_line(&task));
        }
        Commands::NewProject { name } => {
            let project = scheduler.create_project(name).await?;
            println!("Created project [{}] {}", project.id, project.name);
        }
        Commands::NewLabel { name } => {
            let label = scheduler.create_label(name).await?;
            println!("Created label [{}] {}", label.id, label.name);
        }
        Commands::Login { .. } | Commands::Logout => {}
    }

    Ok(())
}
