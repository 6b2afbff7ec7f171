use ai_client::{AssistantClient, AssistantClientConfig};
use backend_api::{run_server, AppState, AwesomeApiRateProvider, FilePlannerRepository};
use std::sync::Arc;
use std::{env, path::PathBuf};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Settings file first, environment variables override it
    let settings = settings_loader::load_settings_with_fallback(None)?.unwrap_or_default();

    let host = env::var("HOST").unwrap_or(settings.server.host);
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(settings.server.port);
    let database_raw =
        env::var("DATABASE_PATH").unwrap_or_else(|_| "database/database.json".to_string());

    // Resolve the database path: absolute paths are kept, relative paths are
    // tried against the workspace root first, then the current directory.
    let crate_root = env::current_dir()?;
    let workspace_root = find_workspace_root().unwrap_or_else(|| crate_root.clone());
    let database_path = resolve_with_fallback(&database_raw, &[&workspace_root, &crate_root]);

    let assistant_config = AssistantClientConfig {
        base_url: env::var("ASSISTANT_BASE_URL").unwrap_or(settings.assistant.base_url),
        model: env::var("ASSISTANT_MODEL").unwrap_or(settings.assistant.model),
    };
    let assistant = AssistantClient::new(assistant_config)?;

    let exchange_endpoint =
        env::var("EXCHANGE_ENDPOINT").unwrap_or(settings.exchange.endpoint);

    println!("Trip Planner API Server");
    println!("=======================");
    println!("Database path (resolved): {}", database_path.display());
    println!("Exchange endpoint: {}", exchange_endpoint);
    println!("Listening on: {}:{}", host, port);
    println!();

    if !database_path.exists() {
        eprintln!(
            "[WARN] database.json not found at: {}",
            database_path.display()
        );
        eprintln!("       Continuing; an empty database will be created on first write.");
    }

    let state = Arc::new(AppState {
        repo: Arc::new(FilePlannerRepository::new(database_path)),
        rates: Arc::new(AwesomeApiRateProvider::new(exchange_endpoint)),
        assistant,
        participants: settings.participants,
    });

    run_server(state, &host, port).await?;

    Ok(())
}

/// Find the Cargo workspace root by traversing up until a Cargo.toml that contains a [workspace] section.
fn find_workspace_root() -> Option<PathBuf> {
    let mut dir = env::current_dir().ok()?;
    for _ in 0..10 {
        // safety limit
        let candidate = dir.join("Cargo.toml");
        if candidate.exists() {
            if let Ok(content) = std::fs::read_to_string(&candidate) {
                if content.contains("[workspace]") {
                    return Some(dir.clone());
                }
            }
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Resolve a raw path string against a list of base directories, returning the first existing match, or the first constructed path.
fn resolve_with_fallback(raw: &str, bases: &[&PathBuf]) -> PathBuf {
    let input = PathBuf::from(raw);
    if input.is_absolute() {
        return input;
    }
    for base in bases {
        let candidate = base.join(&input);
        if candidate.exists() {
            return candidate;
        }
    }
    // If none exist yet (maybe will be created later), just use the first base.
    match bases.first() {
        Some(base) => base.join(input),
        None => input,
    }
}
