//! CLI surface definitions (clap derive), mirroring the Management API
//! operations of §6.4 plus a `serve` command that runs the Poller loop.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "scheduler")]
#[command(author, version, about = "AI Task Scheduler", long_about = None)]
pub struct Cli {
    /// Enable debug-level logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (TOML/YAML/JSON, auto-detected by extension).
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the Poller tick loop until interrupted (Ctrl-C).
    Serve,

    /// Manage tasks through the Management API (§6.4).
    Task {
        #[command(subcommand)]
        action: TaskCommands,
    },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// `CreateReminder{user_id, text, time, channel}`.
    CreateReminder {
        #[arg(long)]
        user_id: Uuid,
        #[arg(long)]
        text: String,
        /// Natural-language time, e.g. "tomorrow at 9:00" or "in 2 hours".
        #[arg(long)]
        time: String,
        #[arg(long, value_enum)]
        channel: ChannelArg,
    },

    /// `CreateTask{...}`. `--schedule-json` takes a serialized `ScheduleConfig` (§6.4).
    Create {
        #[arg(long)]
        user_id: Uuid,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_enum)]
        task_type: TaskTypeArg,
        #[arg(long)]
        schedule_json: String,
        #[arg(long, value_enum, required = true)]
        channel: Vec<ChannelArg>,
        #[arg(long)]
        ai_context: Option<String>,
        #[arg(long)]
        max_retries: Option<u32>,
    },

    /// `ListTasks{user_id, status?, task_type?, limit?}`.
    List {
        #[arg(long)]
        user_id: Uuid,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        #[arg(long, value_enum)]
        task_type: Option<TaskTypeArg>,
        #[arg(long)]
        limit: Option<u32>,
    },

    /// `UpdateTask{user_id, id, patch}`. `--patch-json` takes a serialized `TaskPatch`.
    Update {
        #[arg(long)]
        user_id: Uuid,
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        patch_json: String,
    },

    /// `DeleteTask{user_id, id}`.
    Delete {
        #[arg(long)]
        user_id: Uuid,
        #[arg(long)]
        id: Uuid,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ChannelArg {
    Sms,
    Email,
    Push,
    InApp,
}

impl From<ChannelArg> for scheduler_kernel::task::NotificationChannel {
    fn from(value: ChannelArg) -> Self {
        match value {
            ChannelArg::Sms => Self::Sms,
            ChannelArg::Email => Self::Email,
            ChannelArg::Push => Self::Push,
            ChannelArg::InApp => Self::InApp,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum TaskTypeArg {
    Reminder,
    PeriodicTask,
    AutomatedTask,
    Custom,
}

impl From<TaskTypeArg> for scheduler_kernel::task::TaskType {
    fn from(value: TaskTypeArg) -> Self {
        match value {
            TaskTypeArg::Reminder => Self::Reminder,
            TaskTypeArg::PeriodicTask => Self::PeriodicTask,
            TaskTypeArg::AutomatedTask => Self::AutomatedTask,
            TaskTypeArg::Custom => Self::Custom,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Active,
    Processing,
    Completed,
    Failed,
    Paused,
    Cancelled,
}

impl From<StatusArg> for scheduler_kernel::task::TaskStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Active => Self::Active,
            StatusArg::Processing => Self::Processing,
            StatusArg::Completed => Self::Completed,
            StatusArg::Failed => Self::Failed,
            StatusArg::Paused => Self::Paused,
            StatusArg::Cancelled => Self::Cancelled,
        }
    }
}
