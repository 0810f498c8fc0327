pub mod advisory;
pub mod agent;
pub mod circuit;
pub mod command;
pub mod compound;
pub mod handle_session;
pub mod race;
pub mod standings;
