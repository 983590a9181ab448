use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use noisegate_db::Database;

#[derive(Parser)]
#[command(name = "noisegate-admin", about = "Manage noisegate user accounts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all users
    List,
    /// Create a user; the password is prompted, never an argument
    Create {
        username: String,
        #[arg(long, default_value = "user")]
        role: String,
    },
    /// Rename a user
    SetUsername { id: i64, username: String },
    /// Set a user's password (prompted)
    SetPassword { id: i64 },
    /// Set a user's role
    SetRole { id: i64, role: String },
    /// Delete a user
    Delete { id: i64 },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let db_path = std::env::var("NOISEGATE_DB_PATH").unwrap_or_default();
    if db_path.is_empty() {
        bail!("NOISEGATE_DB_PATH is not set");
    }
    let db = Database::open(Path::new(&db_path))?;

    match cli.command {
        Command::List => {
            for user in db.list_users()? {
                println!("{} {} {}", user.id, user.username, user.role);
            }
        }
        Command::Create { username, role } => {
            let password = prompt_password()?;
            let user = db.create_user(&username, &password, &role)?;
            println!("Created user '{}' with id {}", user.username, user.id);
        }
        Command::SetUsername { id, username } => {
            db.set_username(id, &username)?;
            println!("User {id} renamed to '{username}'");
        }
        Command::SetPassword { id } => {
            let password = prompt_password()?;
            db.set_password(id, &password)?;
            println!("User {id} password updated");
        }
        Command::SetRole { id, role } => {
            db.set_role(id, &role)?;
            println!("User {id} role set to '{role}'");
        }
        Command::Delete { id } => {
            db.delete_user(id)?;
            println!("User {id} deleted");
        }
    }

    Ok(())
}

fn prompt_password() -> Result<String> {
    rpassword::prompt_password("Password: ").context("failed to read password")
}
