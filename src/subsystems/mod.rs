//! Long-running parts of the bot and the service they share.

pub mod comms;
pub mod cron;
pub mod lexicon;
pub mod runtime;
