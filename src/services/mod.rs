pub mod action;
pub mod game_service;
pub mod messages;
pub mod resolve;
pub mod scheduler;
pub mod setup;
pub mod wincheck;
