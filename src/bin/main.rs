use anyhow::Result;
use auth_gate::{JwtConfig, auth::hash_password, config::DEFAULT_EXPIRE_SECONDS, create_state};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "auth-gate")]
#[command(about = "Email/password login gate that issues signed tokens")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Server {
        /// Bind address, e.g. 0.0.0.0:8080
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: String,
        /// Path to members.json (falls back to AUTH_GATE_MEMBERS, then ./members.json)
        #[arg(long)]
        members: Option<PathBuf>,
        /// Secret used to sign HS256 tokens
        #[arg(long, env = "AUTH_GATE_JWT_SECRET", hide_env_values = true)]
        jwt_secret: String,
        /// Token validity in seconds
        #[arg(long, env = "AUTH_GATE_JWT_EXPIRE_SECONDS", default_value_t = DEFAULT_EXPIRE_SECONDS)]
        jwt_expire_seconds: u64,
    },
    /// Print an Argon2id hash for a members.json entry
    HashPassword { password: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("auth_gate=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Server {
            bind,
            members,
            jwt_secret,
            jwt_expire_seconds,
        } => {
            let jwt = JwtConfig {
                secret: jwt_secret,
                expire_seconds: jwt_expire_seconds,
            };
            info!("Tokens valid for {} seconds", jwt.expire_seconds);

            let state = create_state(members.as_deref(), &jwt)?;
            auth_gate::serve(state, &bind).await?;
        }
        Commands::HashPassword { password } => {
            println!("{}", hash_password(&password)?);
        }
    }

    Ok(())
}
