use inquire::{Password, Text};

use crate::server::account::create_account;
use crate::server::validation::{validate_email, validate_username};
use crate::store::SqliteStore;

use super::init_store;

/// Fields for a new account, as given on the command line.
#[derive(Debug, Default)]
pub struct NewUserArgs {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub staff: bool,
}

pub fn run_create_user(
    data_dir: String,
    args: NewUserArgs,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    create_user(&store, args, non_interactive)
}

/// Creates the account, prompting for whatever `args` leaves out.
pub fn create_user(
    store: &SqliteStore,
    args: NewUserArgs,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let username = match args.username {
        Some(name) => name,
        None if non_interactive => {
            anyhow::bail!("--username is required in non-interactive mode")
        }
        None => Text::new("Username:")
            .with_validator(|input: &str| {
                Ok(validate_username(input)
                    .map(|()| inquire::validator::Validation::Valid)
                    .unwrap_or_else(|e| inquire::validator::Validation::Invalid(e.message.into())))
            })
            .prompt()?,
    };

    let email = match args.email {
        Some(email) => email,
        None if non_interactive => anyhow::bail!("--email is required in non-interactive mode"),
        None => Text::new("Email:")
            .with_validator(|input: &str| {
                Ok(validate_email(input)
                    .map(|()| inquire::validator::Validation::Valid)
                    .unwrap_or_else(|e| inquire::validator::Validation::Invalid(e.message.into())))
            })
            .prompt()?,
    };

    let password = match args.password {
        Some(password) => password,
        None if non_interactive => {
            anyhow::bail!("--password is required in non-interactive mode")
        }
        None => Password::new("Password:").prompt()?,
    };

    let (identity, profile) = create_account(store, &username, &email, &password, args.staff)
        .map_err(|e| anyhow::anyhow!(e.message))?;

    let role = if identity.is_staff { "staff user" } else { "user" };
    println!(
        "Created {role} '{}' (id {}, profile {})",
        identity.username, identity.id, profile.id
    );

    Ok(())
}
