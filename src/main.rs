//! staffdir - command-line client for the Employee-Directory API.
//!
//! Thin front end over the library: it builds the session manager once,
//! rehydrates it from disk, and dispatches one subcommand per invocation.

use std::io;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use staffdir::models::NewEmployee;
use staffdir::store::FileStore;
use staffdir::{AuthClient, Config, Directory, SessionManager};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn usage() -> ! {
    eprintln!(
        "Usage: staffdir <command>\n\
         \n\
         Commands:\n\
         \x20 register <username> <password>   create an account and log in\n\
         \x20 login <username> <password>      authenticate and store the session\n\
         \x20 logout                           revoke the stored session\n\
         \x20 status                           show session and service state\n\
         \x20 list [search]                    list employees, optionally filtered\n\
         \x20 add <name> <department>          create an employee record"
    );
    std::process::exit(2);
}

/// Gate for protected commands: the CLI counterpart of redirecting an
/// unauthenticated visitor back to the login view.
fn require_session(session: &SessionManager) {
    if !session.is_authenticated() {
        eprintln!("Not logged in. Run `staffdir login <username> <password>` first.");
        std::process::exit(1);
    }
}

async fn do_login(session: &SessionManager, config: &mut Config, username: &str, password: &str) {
    if session.login(username, password).await {
        config.last_username = Some(username.to_string());
        if let Err(e) = config.save() {
            tracing::warn!(error = %e, "failed to save config");
        }
        println!("Logged in as {}.", username);
    } else {
        eprintln!("Invalid credentials");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let mut config = Config::load()?;
    let store = Arc::new(FileStore::new(config.session_dir()?));
    let client = AuthClient::new(&config.api_base_url)?;
    let session = SessionManager::new(client.clone(), store);
    session.initialize();
    info!(api = %config.api_base_url, "staffdir starting");

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("register") => {
            let (username, password) = match (args.get(2), args.get(3)) {
                (Some(u), Some(p)) => (u.as_str(), p.as_str()),
                _ => usage(),
            };
            if !session.register(username, password).await {
                eprintln!("Registration failed (user may already exist)");
                std::process::exit(1);
            }
            // Chain straight into a login, like the registration form does.
            do_login(&session, &mut config, username, password).await;
        }
        Some("login") => {
            let (username, password) = match (args.get(2), args.get(3)) {
                (Some(u), Some(p)) => (u.as_str(), p.as_str()),
                _ => usage(),
            };
            do_login(&session, &mut config, username, password).await;
        }
        Some("logout") => {
            session.logout();
            println!("Logged out.");
        }
        Some("status") => {
            match &config.last_username {
                Some(username) if session.is_authenticated() => {
                    println!("Logged in (last login: {})", username)
                }
                _ if session.is_authenticated() => println!("Logged in"),
                _ => println!("Logged out"),
            }
            match client.health().await {
                Ok(true) => println!("Service: ok"),
                Ok(false) => println!("Service: degraded"),
                Err(e) => println!("Service: unreachable ({})", e),
            }
        }
        Some("list") => {
            require_session(&session);
            let directory = Directory::new(session);
            let employees = directory.list(args.get(2).map(String::as_str)).await?;
            if employees.is_empty() {
                println!("No employees found.");
            } else {
                for e in &employees {
                    println!("{:>5}  {:<30} {}", e.id, e.name, e.department);
                }
            }
        }
        Some("add") => {
            require_session(&session);
            let (name, department) = match (args.get(2), args.get(3)) {
                (Some(n), Some(d)) => (n.clone(), d.clone()),
                _ => usage(),
            };
            let directory = Directory::new(session);
            let created = directory.add(&NewEmployee { name, department }).await?;
            println!("Added employee #{}: {}", created.id, created.name);
        }
        _ => usage(),
    }

    Ok(())
}
