//! aula-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the academic records API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `bootstrap_admin.password_hash`:
//!
//! ```
//! cargo run -p aula-server -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use aula_api::{AppState, password::hash_password};
use aula_server::{ServerConfig, app, ensure_admin, seed};
use aula_store_sqlite::SqliteStore;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Aula academic records server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// Load the demo data set before serving.
  #[arg(long)]
  seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = read_password()?;
    let hash = hash_password(&password).context("failed to hash password")?;
    println!("{hash}");
    return Ok(());
  }

  // Nested keys use a double underscore: AULA_BOOTSTRAP_ADMIN__USERNAME.
  let settings = config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8000)?
    .set_default("store_path", "aula.db")?
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("AULA")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let state = AppState::new(Arc::new(store));

  if let Some(admin) = &server_cfg.bootstrap_admin {
    ensure_admin(state.store.as_ref(), admin)
      .await
      .context("failed to create bootstrap administrator")?;
  }
  if cli.seed {
    seed::load_demo(state.store.as_ref(), state.password_params)
      .await
      .context("failed to load demo data")?;
  }

  let router = app(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, router).await.context("server error")?;

  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  let password = line.trim_end_matches(['\n', '\r']).to_owned();
  if password.is_empty() {
    anyhow::bail!("password must not be empty");
  }
  Ok(password)
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
