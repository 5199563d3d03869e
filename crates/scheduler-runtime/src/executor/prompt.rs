//! Deterministic four-section prompt assembly (§4.8.2).
//!
//! `assemble` is a pure function of `(task, context)` — no clock reads, no
//! global state — so executor behavior is reproducible under test.

use scheduler_kernel::task::{NotificationChannel, Task, TaskType};

use chrono::{DateTime, Utc};

/// Everything the prompt needs beyond what's already on `Task` itself.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub current_time: DateTime<Utc>,
}

/// Assembles the four fixed-order sections described in §4.8.2.
pub fn assemble(task: &Task, context: &ExecutionContext) -> String {
    let mut sections = Vec::with_capacity(4);
    sections.push(section_a(context));
    sections.push(section_b(task, context));
    sections.push(section_c(task));
    sections.push(section_d());
    sections.join("\n\n")
}

fn section_a(context: &ExecutionContext) -> String {
    format!(
        "You are the task execution agent for an AI task scheduler.\nCurrent time: {}",
        context.current_time.to_rfc3339()
    )
}

fn section_b(task: &Task, context: &ExecutionContext) -> String {
    let last_run = task
        .last_run_at
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());
    let channels = channels_to_string(&task.notification_channels);
    let description = task.description.clone().unwrap_or_else(|| "(none)".to_string());
    let ai_context = task.ai_context.clone().unwrap_or_else(|| "(none)".to_string());

    format!(
        "Task context:\n\
         - id: {id}\n\
         - type: {task_type}\n\
         - user_id: {user_id}\n\
         - title: {title}\n\
         - description: {description}\n\
         - ai_context: {ai_context}\n\
         - schedule: {schedule}\n\
         - last_run_at: {last_run}\n\
         - notification_channels: {channels}\n\
         - created_at: {created_at}",
        id = task.id,
        task_type = task.task_type,
        user_id = task.user_id,
        title = task.title,
        schedule = task.schedule.kind.type_name(),
        created_at = task.created_at.to_rfc3339(),
    ) + &format!("\n(as of {})", context.current_time.to_rfc3339())
}

fn section_c(task: &Task) -> String {
    let template = match task.task_type {
        TaskType::Reminder => {
            "This is a reminder. Acknowledge the reminder to the user, restate what they asked \
             to be reminded about, and offer one concrete next step if relevant."
        }
        TaskType::PeriodicTask => {
            "This is a recurring periodic task. Summarize what happened since the last run, \
             acknowledge completion, and provide a short actionable recommendation for the \
             next occurrence."
        }
        TaskType::AutomatedTask => {
            "This is a system-triggered housekeeping task with no direct end-user authoring. \
             Produce a concise status digest suitable for an automated log: what was checked, \
             what changed, and whether anything needs human attention."
        }
        TaskType::Custom => {
            "Use the task's title, description, and ai_context to determine the appropriate \
             response. Acknowledge the request and provide a clear, actionable result."
        }
    };
    format!("Instructions for this task type:\n{template}")
}

fn section_d() -> String {
    "Professional guidelines:\n\
     - Never refer to internal tool or system names.\n\
     - Be concise.\n\
     - Explicitly acknowledge the user's request.\n\
     - Provide actionable next steps where relevant."
        .to_string()
}

fn channels_to_string(channels: &[NotificationChannel]) -> String {
    if channels.is_empty() {
        return "(none)".to_string();
    }
    channels
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scheduler_kernel::schedule::ScheduleConfig;
    use scheduler_kernel::task::TaskStatus;
    use uuid::Uuid;

    fn task(task_type: TaskType) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Call the dentist".into(),
            description: Some("Reschedule the cleaning appointment".into()),
            task_type,
            schedule: ScheduleConfig::once(now),
            next_run_at: Some(now),
            last_run_at: None,
            status: TaskStatus::Active,
            notification_channels: vec![NotificationChannel::Sms, NotificationChannel::Email],
            ai_context: None,
            last_result: None,
            retry_count: 0,
            max_retries: 3,
            created_at: now,
            updated_at: now,
            quality: None,
            delivery_warnings: Vec::new(),
            occurrence_count: 0,
        }
    }

    #[test]
    fn contains_all_four_sections_in_order() {
        let t = task(TaskType::Reminder);
        let ctx = ExecutionContext { current_time: Utc::now() };
        let prompt = assemble(&t, &ctx);

        let a = prompt.find("You are the task execution agent").unwrap();
        let b = prompt.find("Task context:").unwrap();
        let c = prompt.find("Instructions for this task type:").unwrap();
        let d = prompt.find("Professional guidelines:").unwrap();
        assert!(a < b && b < c && c < d);
    }

    #[test]
    fn is_pure_given_same_inputs() {
        let t = task(TaskType::PeriodicTask);
        let ctx = ExecutionContext { current_time: Utc::now() };
        assert_eq!(assemble(&t, &ctx), assemble(&t, &ctx));
    }

    #[test]
    fn automated_task_gets_its_own_template() {
        let t = task(TaskType::AutomatedTask);
        let ctx = ExecutionContext { current_time: Utc::now() };
        let prompt = assemble(&t, &ctx);
        assert!(prompt.contains("housekeeping task"));
    }

    #[test]
    fn custom_falls_back_to_generic_template() {
        let t = task(TaskType::Custom);
        let ctx = ExecutionContext { current_time: Utc::now() };
        let prompt = assemble(&t, &ctx);
        assert!(prompt.contains("Use the task's title, description, and ai_context"));
    }

    #[test]
    fn ai_context_value_reaches_the_prompt() {
        let mut t = task(TaskType::Custom);
        t.ai_context = Some("user prefers metric units".into());
        let ctx = ExecutionContext { current_time: Utc::now() };
        let prompt = assemble(&t, &ctx);
        assert!(prompt.contains("user prefers metric units"));
    }

    #[test]
    fn includes_task_id_and_title() {
        let t = task(TaskType::Reminder);
        let ctx = ExecutionContext { current_time: Utc::now() };
        let prompt = assemble(&t, &ctx);
        assert!(prompt.contains(&t.id.to_string()));
        assert!(prompt.contains("Call the dentist"));
    }
}
