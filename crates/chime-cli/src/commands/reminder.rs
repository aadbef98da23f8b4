use chrono::Utc;
use clap::Subcommand;
use chime_core::{Database, Reminder, ReminderStore};

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Add a reminder
    Add {
        /// What to be reminded of
        text: String,
        /// When: "YYYY-MM-DD HH:MM[:SS]" (local time) or RFC 3339
        #[arg(long)]
        at: String,
    },
    /// List stored reminders in insertion order
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove every reminder with exactly this text and datetime
    Remove {
        text: String,
        #[arg(long)]
        at: String,
    },
    /// Remove all reminders
    Clear,
}

pub fn run(action: ReminderAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = ReminderStore::new(Database::open()?);

    match action {
        ReminderAction::Add { text, at } => {
            let reminder = Reminder::new(text, at);
            let due = reminder.validate(Utc::now())?;
            store.append(reminder.clone())?;
            println!(
                "Reminder added: {} at {}",
                reminder.text,
                due.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S")
            );
        }
        ReminderAction::List { json } => {
            let reminders = store.try_read_all()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&reminders)?);
            } else if reminders.is_empty() {
                println!("No reminders.");
            } else {
                let now = Utc::now();
                for reminder in &reminders {
                    let status = match reminder.due_at() {
                        Some(at) if at <= now => "past",
                        Some(_) => "pending",
                        None => "invalid",
                    };
                    println!("{:<8} {:<26} {}", status, reminder.datetime, reminder.text);
                }
            }
        }
        ReminderAction::Remove { text, at } => {
            let removed = store.remove(&text, &at)?;
            if removed == 0 {
                return Err(format!("no reminder matches '{text}' at {at}").into());
            }
            println!("Removed {removed} reminder(s).");
        }
        ReminderAction::Clear => {
            store.clear()?;
            println!("All reminders cleared.");
        }
    }
    Ok(())
}
