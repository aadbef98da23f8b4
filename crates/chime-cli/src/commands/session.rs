use clap::Subcommand;
use chime_core::{Database, SessionStore};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Print the client session id, generating one on first use
    Id,
    /// Mute a bot
    Mute { bot: String },
    /// Unmute a bot
    Unmute { bot: String },
    /// Flip a bot's mute flag
    Toggle { bot: String },
    /// Print the mute map as JSON
    Mutes,
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = SessionStore::new(Database::open()?);

    match action {
        SessionAction::Id => println!("{}", session.session_id()?),
        SessionAction::Mute { bot } => {
            session.set_muted(&bot, true)?;
            println!("{bot}: muted");
        }
        SessionAction::Unmute { bot } => {
            session.set_muted(&bot, false)?;
            println!("{bot}: unmuted");
        }
        SessionAction::Toggle { bot } => {
            let muted = session.toggle_muted(&bot)?;
            println!("{bot}: {}", if muted { "muted" } else { "unmuted" });
        }
        SessionAction::Mutes => {
            println!("{}", serde_json::to_string_pretty(&session.mute_map())?);
        }
    }
    Ok(())
}
