use dotenvy::dotenv;
use std::sync::Once;

static INIT: Once = Once::new();

pub fn setup_test_env() {
    INIT.call_once(|| {
        dotenv().ok();
        if std::env::var("BIND_ADDR").is_err() {
            std::env::set_var("BIND_ADDR", "127.0.0.1:0");
        }
        if std::env::var("ALLOWED_ORIGIN").is_err() {
            std::env::set_var("ALLOWED_ORIGIN", "http://localhost:3000");
        }
    });
}
