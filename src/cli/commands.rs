use clap::Subcommand;

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Initialize the server (create the database, optionally a staff user)
    Init {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,
    },

    /// Create a user account and its profile
    CreateUser {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Username for the new user
        #[arg(long)]
        username: Option<String>,

        /// Email address for the new user
        #[arg(long)]
        email: Option<String>,

        /// Password for the new user. Prompted for when omitted.
        #[arg(long)]
        password: Option<String>,

        /// Grant staff rights
        #[arg(long)]
        staff: bool,

        /// Skip interactive prompts (requires --username, --email and --password)
        #[arg(long)]
        non_interactive: bool,
    },
}
