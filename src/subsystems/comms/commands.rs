//! Command surface — maps each bot command to a [`LexiconService`] call and
//! the reply text the user sees. Every command yields a reply.

use teloxide::utils::command::BotCommands;
use tracing::{error, warn};

use crate::store::ChatIdentity;
use crate::subsystems::lexicon::{LexiconService, ON_DEMAND_HEADING};
use crate::words::ResolveError;

pub const SUBSCRIBED_REPLY: &str = "✅ Subscribed to Word of the Day!";
pub const UNSUBSCRIBED_REPLY: &str = "❌ Unsubscribed successfully.";
pub const NO_WORD_REPLY: &str = "⚠️ Couldn't generate a new word. Try again.";
pub const INTERNAL_ERROR_REPLY: &str = "⚠️ Something went wrong. Please try again later.";

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Word of the Day bot. Commands:")]
pub enum Command {
    #[command(description = "introduce the bot.")]
    Start,
    #[command(description = "show this help.")]
    Help,
    #[command(description = "get a new word every day.")]
    Subscribe,
    #[command(description = "stop the daily word.")]
    Unsubscribe,
    #[command(description = "already know today's word? get another one now.")]
    Iknow,
}

pub fn help_text() -> String {
    Command::descriptions().to_string()
}

/// Run `cmd` on behalf of `chat_id` and return the reply.
pub async fn execute(service: &LexiconService, chat_id: ChatIdentity, cmd: Command) -> String {
    match cmd {
        Command::Start => format!("👋 Hi! I send one advanced English word a day.\n\n{}", help_text()),
        Command::Help => help_text(),
        Command::Subscribe => match service.subscribe(chat_id).await {
            Ok(()) => SUBSCRIBED_REPLY.to_string(),
            Err(e) => {
                error!(chat_id, error = %e, "subscribe failed");
                INTERNAL_ERROR_REPLY.to_string()
            }
        },
        Command::Unsubscribe => match service.unsubscribe(chat_id).await {
            Ok(()) => UNSUBSCRIBED_REPLY.to_string(),
            Err(e) => {
                error!(chat_id, error = %e, "unsubscribe failed");
                INTERNAL_ERROR_REPLY.to_string()
            }
        },
        Command::Iknow => match service.new_word().await {
            Ok(entry) => entry.to_message(ON_DEMAND_HEADING),
            Err(ResolveError::Exhausted { attempts }) => {
                warn!(chat_id, attempts, "no new word for on-demand request");
                NO_WORD_REPLY.to_string()
            }
            Err(e) => {
                error!(chat_id, error = %e, "on-demand word failed");
                NO_WORD_REPLY.to_string()
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("/subscribe", "lexicon_bot").unwrap(), Command::Subscribe);
        assert_eq!(Command::parse("/unsubscribe", "lexicon_bot").unwrap(), Command::Unsubscribe);
        assert_eq!(Command::parse("/iknow@lexicon_bot", "lexicon_bot").unwrap(), Command::Iknow);
        assert!(Command::parse("/shout", "lexicon_bot").is_err());
    }

    #[test]
    fn help_lists_every_command() {
        let help = help_text();
        for cmd in ["/start", "/help", "/subscribe", "/unsubscribe", "/iknow"] {
            assert!(help.contains(cmd), "help lacks {cmd}");
        }
    }
}
