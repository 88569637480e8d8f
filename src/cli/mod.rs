mod commands;
mod init;
mod user;

pub use commands::AdminCommands;
pub use init::run_init;
pub use user::{NewUserArgs, run_create_user};

use crate::store::SqliteStore;

/// Initialize store from data directory, checking it exists
pub fn init_store(data_dir: &str) -> anyhow::Result<SqliteStore> {
    let data_path: std::path::PathBuf = data_dir.into();
    let db_path = data_path.join("studyhall.db");

    if !db_path.exists() {
        anyhow::bail!(
            "Database not found at {}. Run 'studyhall admin init' first.",
            db_path.display()
        );
    }

    SqliteStore::new(&db_path).map_err(Into::into)
}
