use clap::Parser;
use comic_wall::config::DEFAULT_API_VERSION;
use comic_wall::{Config, Pipeline};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "comic-wall",
    about = "Post a random xkcd comic to a VK community wall",
    version
)]
struct Cli {
    /// VK community (group) id, without the leading '-'
    #[arg(long, env = "VK_GROUP_ID")]
    group_id: u64,

    /// VK access token with photos and wall rights
    #[arg(long, env = "VK_ACCESS_TOKEN", hide_env_values = true)]
    access_token: String,

    /// VK API version
    #[arg(long, env = "VK_API_VERSION", default_value = DEFAULT_API_VERSION)]
    api_version: String,

    /// VK method endpoint base
    #[arg(long, env = "VK_API_BASE", default_value = "https://api.vk.com/method")]
    api_base: String,

    /// Webcomic JSON API base URL
    #[arg(long, env = "COMIC_BASE_URL", default_value = "https://xkcd.com")]
    comic_base_url: String,

    /// Directory the image is downloaded into for the duration of the run
    #[arg(long, env = "COMIC_SCRATCH_DIR", default_value = "images")]
    scratch_dir: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, env = "COMIC_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Log debug output (RUST_LOG takes precedence)
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Config {
        let mut config = Config::new(self.group_id, self.access_token);
        config.vk.api_version = self.api_version;
        config.vk.api_base = self.api_base;
        config.comic.base_url = self.comic_base_url;
        config.scratch_dir = self.scratch_dir;
        config.request_timeout = Duration::from_secs(self.timeout_secs);
        config
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Variables from .env become visible to clap's env fallbacks
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let result = match Pipeline::new(cli.into_config()) {
        Ok(pipeline) => pipeline.run().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            match e.stage() {
                Some(stage) => tracing::error!(%stage, error = %e, "run failed"),
                None => tracing::error!(error = %e, "run failed"),
            }
            ExitCode::from(e.exit_code())
        }
    }
}
