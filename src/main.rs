use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use moodle_forum_mirror::auth::{self, LoginOutcome};
use moodle_forum_mirror::config::Config;
use moodle_forum_mirror::constants::DEFAULT_CONFIG_PATH;
use moodle_forum_mirror::{cookies, fs_utils, get_forum, Session};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    let config_path = std::env::var("CONFIG_PATH")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;
    config.validate().context("Invalid configuration")?;

    info!(
        forum_id = config.forum_id,
        portal = %config.portal_url,
        output = %config.output_directory.display(),
        "Configuration loaded"
    );

    let session = Session::new(&config.portal_url).context("Failed to create HTTP session")?;

    let loaded_cookies = if config.save_cookies {
        cookies::load_cookies(session.jar(), &config.cookies_file)
            .await
            .context("Failed to load cookies")?
    } else {
        Vec::new()
    };

    let outcome = auth::login(&session, &config.username, &config.password)
        .await
        .context("Login failed")?;

    if config.save_cookies {
        let mut hosts = vec![session.base_url().clone()];
        if let LoginOutcome::LoggedIn { provider } = outcome {
            hosts.push(provider);
        }
        cookies::save_cookies(session.jar(), &hosts, &loaded_cookies, &config.cookies_file)
            .await
            .context("Failed to save cookies")?;
    }

    let forum = get_forum(&session, config.forum_id)
        .await
        .context("Failed to fetch forum")?;
    if !forum.accessible {
        warn!(forum_id = config.forum_id, "Forum is not accessible with this account");
    }
    info!(%forum, "Forum fetched");

    fs_utils::clear_dir(&config.output_directory)
        .await
        .context("Failed to clear output directory")?;
    forum
        .save(&config.output_directory)
        .await
        .context("Failed to save forum")?;

    println!("Done");
    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,moodle_forum_mirror=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}
