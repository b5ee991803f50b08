use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{eyre, Result};
use schemashare_core::RecordStore;
use schemashare_server::{Server, ServerOptions, Store, StoreConfig};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "127.0.0.1:8080";

#[derive(Parser, Debug)]
#[command(name = "schemashare", version, about = "Share JSON Schema validations by short id")]
struct Cli {
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[arg(long, global = true)]
    config: Option<String>,
    #[command(flatten)]
    storage: StorageArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct StorageArgs {
    /// Storage provider: "embedded" (default) or "managed".
    #[arg(long, global = true)]
    provider: Option<String>,
    /// Store image file for the embedded provider.
    #[arg(long, global = true, value_name = "FILE")]
    path: Option<PathBuf>,
    /// Table name for the managed provider.
    #[arg(long, global = true)]
    table: Option<String>,
    #[arg(long, global = true)]
    region: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Serve(ServeArgs),
    Save(SaveArgs),
    Get(GetArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long)]
    addr: Option<String>,
}

#[derive(Args, Debug)]
struct SaveArgs {
    #[arg(long, value_name = "FILE")]
    schema: PathBuf,
    #[arg(long, value_name = "FILE")]
    json: PathBuf,
}

#[derive(Args, Debug)]
struct GetArgs {
    id: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct AppConfig {
    #[serde(default)]
    storage: Option<StoreConfig>,
    #[serde(default)]
    serve: Option<ServeConfig>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct ServeConfig {
    addr: Option<String>,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(&cli.log_level);
    let cfg = load_config(cli.config.as_deref())?;
    let store_cfg = resolve_store_config(&cli.storage, &cfg);
    let store = Store::open(&store_cfg)
        .await
        .map_err(|e| eyre!("failed to open record store: {}", e))?;
    match cli.command {
        Commands::Serve(args) => serve(args, &cfg, store).await?,
        Commands::Save(args) => save_cmd(args, &store).await?,
        Commands::Get(args) => get_cmd(args, &store).await?,
    }
    Ok(())
}

async fn serve(args: ServeArgs, cfg: &AppConfig, store: Store) -> Result<()> {
    let addr = args
        .addr
        .or_else(|| cfg.serve.as_ref().and_then(|s| s.addr.clone()))
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());
    let options = ServerOptions {
        provider: store.provider().as_str().to_string(),
        ..ServerOptions::default()
    };
    info!(provider = %options.provider, %addr, "starting server");
    let server = Server::new_with_options(store, options);
    if let Err(e) = server.run_http(&addr).await {
        tracing::error!(error = %e, "http server exited with error");
        return Err(eyre!("http server failed: {}", e));
    }
    info!("server stopped");
    Ok(())
}

async fn save_cmd(args: SaveArgs, store: &Store) -> Result<()> {
    let schema = fs::read_to_string(&args.schema)
        .map_err(|e| eyre!("reading {}: {}", args.schema.display(), e))?;
    let json = fs::read_to_string(&args.json)
        .map_err(|e| eyre!("reading {}: {}", args.json.display(), e))?;
    schemashare_core::validate_payload(&schema, &json, schemashare_core::MAX_PAYLOAD_BYTES)
        .map_err(|e| eyre!("{}", e))?;
    let id = store.save(&schema, &json).await?;
    println!("{id}");
    Ok(())
}

async fn get_cmd(args: GetArgs, store: &Store) -> Result<()> {
    match store.get(&args.id).await? {
        Some(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        None => Err(eyre!("record {} not found or expired", args.id)),
    }
}

fn resolve_store_config(args: &StorageArgs, cfg: &AppConfig) -> StoreConfig {
    let mut store = cfg.storage.clone().unwrap_or_default();
    if let Some(provider) = &args.provider {
        store.provider = Some(provider.clone());
    }
    if let Some(path) = &args.path {
        store.path = path.clone();
    }
    if let Some(table) = &args.table {
        store.table = Some(table.clone());
    }
    if let Some(region) = &args.region {
        store.region = Some(region.clone());
    }
    store
}

fn load_config(path: Option<&str>) -> Result<AppConfig> {
    let mut builder = config::Config::builder();
    if let Some(raw) = path {
        let expanded = expand_path(raw);
        if !expanded.exists() {
            tracing::warn!(
                path = expanded.display().to_string(),
                "config file not found; continuing with defaults and env overrides"
            );
        }
        builder = builder.add_source(config::File::from(expanded).required(false));
    }
    builder = builder.add_source(config::Environment::with_prefix("SCHEMASHARE").separator("__"));

    let cfg = builder
        .build()
        .map_err(|e| eyre!("config load error: {}", e))?;
    cfg.try_deserialize()
        .map_err(|e| eyre!("config parse error: {}", e))
}

fn expand_path(input: &str) -> PathBuf {
    if input == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from(input));
    }
    if let Some(rest) = input.strip_prefix("~/") {
        return home_dir()
            .map(|mut base| {
                base.push(rest);
                base
            })
            .unwrap_or_else(|| PathBuf::from(rest));
    }
    PathBuf::from(input)
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("USERPROFILE").map(PathBuf::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_file_values() {
        let cfg = AppConfig {
            storage: Some(StoreConfig {
                provider: Some("managed".into()),
                table: Some("from-file".into()),
                ..StoreConfig::default()
            }),
            serve: None,
        };
        let args = StorageArgs {
            table: Some("from-flag".into()),
            path: Some(PathBuf::from("/tmp/x.json")),
            ..StorageArgs::default()
        };
        let resolved = resolve_store_config(&args, &cfg);
        assert_eq!(resolved.provider.as_deref(), Some("managed"));
        assert_eq!(resolved.table.as_deref(), Some("from-flag"));
        assert_eq!(resolved.path, PathBuf::from("/tmp/x.json"));
    }

    #[test]
    fn empty_config_uses_embedded_defaults() {
        let resolved = resolve_store_config(&StorageArgs::default(), &AppConfig::default());
        assert_eq!(resolved, StoreConfig::default());
    }

    #[test]
    fn expands_home_prefix() {
        if let Some(home) = home_dir() {
            assert_eq!(expand_path("~/cfg.toml"), home.join("cfg.toml"));
        }
        assert_eq!(expand_path("/etc/cfg.toml"), PathBuf::from("/etc/cfg.toml"));
    }
}
