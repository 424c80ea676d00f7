//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `clientstore_core` linkage and database bootstrap from a shell.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `clientstore_cli [DB_PATH]`; without a path an in-memory database
//! is used. Setting `CLIENTSTORE_LOG_DIR` to an absolute directory enables
//! file logging at the build-mode default level.

use clientstore_core::db::{open_db, open_db_in_memory};
use clientstore_core::{ClientStore, SqliteClientStore};
use log::error;
use std::process::ExitCode;

const LOG_DIR_ENV: &str = "CLIENTSTORE_LOG_DIR";

fn main() -> ExitCode {
    if let Ok(log_dir) = std::env::var(LOG_DIR_ENV) {
        if let Err(message) =
            clientstore_core::init_logging(clientstore_core::default_log_level(), &log_dir)
        {
            eprintln!("warning: logging disabled: {message}");
        }
    }

    match run(std::env::args().nth(1)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_run module=cli status=error error={message}");
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(db_path: Option<String>) -> Result<(), String> {
    println!("clientstore_core version={}", clientstore_core::core_version());

    let conn = match db_path.as_deref() {
        Some(path) => open_db(path),
        None => open_db_in_memory(),
    }
    .map_err(|err| err.to_string())?;

    let store = SqliteClientStore::try_new(&conn).map_err(|err| err.to_string())?;
    let count = store.count().map_err(|err| err.to_string())?;
    println!("clients count={count}");
    Ok(())
}
