//! Handlers for the `task` subcommands. Each mirrors one Management API
//! operation (§6.4) and prints its result as JSON on success.

use scheduler_kernel::schedule::ScheduleConfig;
use scheduler_kernel::task::{TaskFilter, TaskPatch};
use scheduler_runtime::TaskManager;

use crate::cli::TaskCommands;
use crate::error::{CliError, CliResult};

pub async fn run(manager: &TaskManager, action: TaskCommands) -> CliResult<()> {
    match action {
        TaskCommands::CreateReminder {
            user_id,
            text,
            time,
            channel,
        } => {
            let task = manager.create_reminder(user_id, text, &time, channel.into()).await?;
            print_json(&task);
        }

        TaskCommands::Create {
            user_id,
            title,
            description,
            task_type,
            schedule_json,
            channel,
            ai_context,
            max_retries,
        } => {
            let schedule: ScheduleConfig = serde_json::from_str(&schedule_json)
                .map_err(|err| CliError::InvalidArgument(format!("invalid --schedule-json: {err}")))?;
            let channels = channel.into_iter().map(Into::into).collect();
            let task = manager
                .create_task(user_id, title, description, task_type.into(), schedule, channels, ai_context, max_retries)
                .await?;
            print_json(&task);
        }

        TaskCommands::List {
            user_id,
            status,
            task_type,
            limit,
        } => {
            let filter = TaskFilter {
                status: status.map(Into::into),
                task_type: task_type.map(Into::into),
                limit,
            };
            let tasks = manager.list(user_id, filter).await?;
            print_json(&tasks);
        }

        TaskCommands::Update { user_id, id, patch_json } => {
            let patch: TaskPatch = serde_json::from_str(&patch_json)
                .map_err(|err| CliError::InvalidArgument(format!("invalid --patch-json: {err}")))?;
            let task = manager.update(user_id, id, patch).await?;
            print_json(&task);
        }

        TaskCommands::Delete { user_id, id } => {
            manager.delete(user_id, id).await?;
            print_json(&serde_json::json!({ "ok": true }));
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(rendered) => println!("{rendered}"),
        Err(err) => eprintln!("failed to serialize output: {err}"),
    }
}
