use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use genie_auth::{AuthError, AuthResult, IdentityProvider, UserCredential, UserHandle};
use genie_config::load as load_config;
use genie_runtime::{telemetry, ClientServices};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[derive(Parser)]
#[command(name = "genie")]
#[command(about = "Genie identity client (console by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and sign it in
    SignUp { email: String, password: String },
    /// Sign in with email and password
    SignIn { email: String, password: String },
    /// Sign in as the demo identity of the alternate provider
    DemoSignIn,
    /// End the current session
    SignOut,
    /// Show the signed-in user
    Whoami,
    /// Change the display name of the signed-in user
    Rename { name: String },
    /// Print the API base URL and the Authorization header for calls to it
    Token,
    /// Request a password reset email
    ResetPassword { email: String },
    /// Start interactive console (default)
    Console,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    telemetry::init_tracing().context("failed to initialise tracing")?;

    let config = load_config().context("failed to load configuration")?;
    let services = ClientServices::initialise(&config)
        .await
        .context("failed to initialise client services")?;
    let identity = services.identity;
    let api_base_url = services.api_base_url;

    match cli.command.unwrap_or(Commands::Console) {
        Commands::SignUp { email, password } => {
            let credential = checked(identity.sign_up(&email, &password).await)?;
            print_signed_in(&credential);
        }
        Commands::SignIn { email, password } => {
            let credential = checked(identity.sign_in(&email, &password).await)?;
            print_signed_in(&credential);
        }
        Commands::DemoSignIn => {
            let credential = checked(identity.sign_in_with_alternate_provider().await)?;
            print_signed_in(&credential);
        }
        Commands::SignOut => {
            checked(identity.sign_out().await)?;
            println!("Signed out");
        }
        Commands::Whoami => print_current(identity.as_ref()).await?,
        Commands::Rename { name } => {
            let user = checked(identity.update_display_name(&name).await)?;
            println!("Display name is now {}", user.display_name());
        }
        Commands::Token => {
            let user = checked(identity.current_user().await)?
                .context("not signed in")?;
            println!("API: {api_base_url}");
            println!("Authorization: {}", checked(user.authorization_header().await)?);
        }
        Commands::ResetPassword { email } => {
            checked(identity.send_password_reset_email(&email).await)?;
            println!("Password reset requested for {email}");
        }
        Commands::Console => run_console(identity).await?,
    }

    Ok(())
}

/// Credential failures are shown the way the sign-in form shows them.
fn checked<T>(result: AuthResult<T>) -> anyhow::Result<T> {
    result.map_err(|error: AuthError| {
        if error.is_credential_error() {
            anyhow::anyhow!(error.user_message())
        } else {
            anyhow::Error::new(error)
        }
    })
}

fn print_signed_in(credential: &UserCredential) {
    println!(
        "Signed in as {} <{}> (uid {})",
        credential.user.display_name(),
        credential.user.email(),
        credential.user.uid()
    );
}

async fn print_current(identity: &dyn IdentityProvider) -> anyhow::Result<()> {
    match checked(identity.current_user().await)? {
        Some(user) => println!(
            "{} <{}> (uid {})",
            user.display_name(),
            user.email(),
            user.uid()
        ),
        None => println!("Not signed in"),
    }
    Ok(())
}

async fn run_console(identity: Arc<dyn IdentityProvider>) -> anyhow::Result<()> {
    info!(mode = identity.mode(), "starting interactive console");

    identity
        .on_auth_state_changed(Arc::new(|user: Option<UserHandle>| match user {
            Some(user) => println!("[auth] signed in as {}", user.email()),
            None => println!("[auth] signed out"),
        }))
        .await
        .context("failed to observe auth state")?;

    println!("Genie Interactive Console");
    println!("Type '/help' for commands, '/quit' to exit");
    println!("---");

    let stdin = tokio::io::stdin();
    let mut reader = BufReader::new(stdin);
    let mut line = String::new();

    loop {
        print!("> ");
        std::io::Write::flush(&mut std::io::stdout())?;

        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break; // EOF
        }

        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let args: Vec<&str> = words.collect();

        let outcome = match (command, args.as_slice()) {
            ("/quit" | "/exit" | "/q", _) => {
                println!("Goodbye!");
                break;
            }
            ("/help" | "/h", _) => {
                println!("Available commands:");
                println!("  /signup <email> <password>  - Create an account");
                println!("  /signin <email> <password>  - Sign in");
                println!("  /demo                       - Sign in as the demo identity");
                println!("  /signout                    - Sign out");
                println!("  /whoami                     - Show the signed-in user");
                println!("  /rename <name>              - Change display name");
                println!("  /token                      - Print the Authorization header");
                println!("  /quit, /exit, /q            - Exit console");
                Ok(())
            }
            ("/signup", [email, password]) => identity
                .sign_up(email, password)
                .await
                .map(|credential| print_signed_in(&credential)),
            ("/signin", [email, password]) => identity
                .sign_in(email, password)
                .await
                .map(|credential| print_signed_in(&credential)),
            ("/demo", []) => identity
                .sign_in_with_alternate_provider()
                .await
                .map(|credential| print_signed_in(&credential)),
            ("/signout", []) => identity.sign_out().await,
            ("/whoami", []) => {
                print_current(identity.as_ref()).await?;
                Ok(())
            }
            ("/rename", name) if !name.is_empty() => identity
                .update_display_name(&name.join(" "))
                .await
                .map(|user| println!("Display name is now {}", user.display_name())),
            ("/token", []) => match identity.current_user().await {
                Ok(Some(user)) => user
                    .authorization_header()
                    .await
                    .map(|header| println!("{header}")),
                Ok(None) => {
                    println!("Not signed in");
                    Ok(())
                }
                Err(error) => Err(error),
            },
            _ => {
                println!("Unknown command or wrong arguments: {}", line.trim());
                println!("Type '/help' for available commands");
                Ok(())
            }
        };

        if let Err(error) = outcome {
            println!("Error: {}", error.user_message());
        }
    }

    Ok(())
}
