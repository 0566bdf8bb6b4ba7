//! storebot binary. Configuration comes from the environment (and `.env`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use storebot::config::BotConfig;

#[tokio::main]
async fn main() {
    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            // Tracing isn't installed yet; this is the only place we print.
            #[allow(clippy::print_stderr)]
            {
                eprintln!("storebot: {e}");
            }
            std::process::exit(1);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let sentry_guard = storebot::init_sentry(&config);
    storebot::init_tracing();

    if let Err(e) = storebot::run(config).await {
        tracing::error!(error = %e, "storebot failed");
        // Flush pending Sentry events; exit skips destructors.
        drop(sentry_guard);
        std::process::exit(1);
    }
}
