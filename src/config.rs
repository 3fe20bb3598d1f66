use std::path::{Path, PathBuf};

use clap::Parser;

use crate::api::ApiConfig;
use crate::domain::Naming;

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_DOWNLOAD_DIRECTORY: &str = "~/Media/Music/Unorganized";

#[derive(Parser, Debug)]
#[command(name = "radio-dl")]
#[command(version, about = "Search the radio catalog and download selected tracks", long_about = None)]
pub struct Cli {
    /// Search query; words are joined with spaces
    #[arg(value_name = "QUERY", required = true, num_args = 1..)]
    pub query: Vec<String>,

    #[arg(short = 'j', long, value_name = "N", help = "Number of parallel downloads")]
    pub jobs: Option<usize>,

    #[arg(short = 'o', long, value_name = "DIR", help = "Base download directory")]
    pub output: Option<PathBuf>,

    #[arg(
        long,
        env = "RADIO_DL_API_KEY",
        hide_env_values = true,
        help = "API key sent as the basic-auth password"
    )]
    pub api_key: Option<String>,

    #[arg(long, value_name = "URL", help = "API host, e.g. https://radio.animebits.moe")]
    pub host: Option<String>,

    #[arg(long, help = "Keep the filename sent by the server")]
    pub keep_server_names: bool,

    #[arg(long, help = "Do not create per-album folders")]
    pub flat: bool,
}

impl Cli {
    pub fn search_query(&self) -> String {
        self.query.join(" ")
    }

    /// Compiled-in defaults with command-line overrides applied.
    pub fn to_config(&self) -> Config {
        let mut config = Config::default();

        if let Some(host) = &self.host {
            config.api.base_url = host.trim_end_matches('/').to_string();
        }
        if let Some(key) = &self.api_key {
            config.api.api_key = key.clone();
        }
        if let Some(jobs) = self.jobs {
            config.download.workers = jobs.max(1);
        }
        if let Some(output) = &self.output {
            config.download.base_dir = expand_home(output);
        }
        if self.keep_server_names {
            config.download.file_naming = Naming::Disabled;
        }
        if self.flat {
            config.download.folder_naming = Naming::Disabled;
        }

        config
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub api: ApiConfig,
    pub download: DownloadConfig,
}

#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Concurrent downloads; always at least 1.
    pub workers: usize,
    pub base_dir: PathBuf,
    /// `Disabled` keeps the server's filename.
    pub file_naming: Naming,
    /// `Disabled` writes straight into `base_dir`.
    pub folder_naming: Naming,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            base_dir: expand_home(Path::new(DEFAULT_DOWNLOAD_DIRECTORY)),
            file_naming: Naming::custom(|r| format!("{} - {}", r.artist, r.title)),
            folder_naming: Naming::custom(|r| r.album.clone()),
        }
    }
}

/// Expands a leading `~` to the user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match directories::BaseDirs::new() {
        Some(dirs) => dirs.home_dir().join(rest),
        None => path.to_path_buf(),
    }
}
