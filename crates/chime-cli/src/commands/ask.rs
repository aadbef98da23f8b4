use chrono::Utc;
use chime_core::{Config, Database, IntentClient, ReminderStore};

pub fn run(text: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let client = IntentClient::new(&config.intent)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let reply = runtime.block_on(client.ask(text))?;

    if let Some(answer) = &reply.answer {
        println!("{answer}");
    }

    if let Some(reminder) = reply.reminder() {
        // The backend does not know our clock; reject what would never fire.
        reminder.validate(Utc::now())?;
        let mut store = ReminderStore::new(Database::open()?);
        store.append(reminder.clone())?;
        println!("Saved reminder: {} at {}", reminder.text, reminder.datetime);
    }

    if let Some(url) = &reply.redirect_url {
        println!("Open: {url}");
    }
    Ok(())
}
