use std::fs;
use std::path::PathBuf;

use inquire::Confirm;

use crate::config::CONFIG_FILE_NAME;
use crate::store::{SqliteStore, Store};

use super::user::{NewUserArgs, create_user};

pub fn run_init(data_dir: String, non_interactive: bool) -> anyhow::Result<()> {
    let data_path: PathBuf = data_dir.into();
    fs::create_dir_all(&data_path)?;

    let db_path = data_path.join("studyhall.db");
    if db_path.exists() {
        anyhow::bail!("Server already initialized. Database exists at: {}", db_path.display());
    }

    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;

    println!("Database created at {}", db_path.display());
    println!(
        "Optional settings can go in {}",
        data_path.join(CONFIG_FILE_NAME).display()
    );

    if !non_interactive {
        let create_staff = Confirm::new("Would you like to create a staff user?")
            .with_default(false)
            .prompt()?;

        if create_staff {
            create_user(
                &store,
                NewUserArgs {
                    staff: true,
                    ..NewUserArgs::default()
                },
                false,
            )?;
        }
    }

    Ok(())
}
