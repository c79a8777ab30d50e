use once_cell::sync::Lazy;
use std::env;

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);

pub struct Config {
    pub bind_addr: String,
    pub allowed_origin: String,
    /// Smallest playable roster.
    pub min_players: usize,
}

impl Config {
    fn from_env() -> Self {
        let bind_addr =
            env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let allowed_origin =
            env::var("ALLOWED_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let min_players = env::var("MIN_PLAYERS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(4);
        Self {
            bind_addr,
            allowed_origin,
            min_players,
        }
    }
}
