use serde::Deserialize;

/// Main configuration structure for Medusa
///
/// Every section is optional in the file; missing values fall back to the
/// defaults below. The server root usually comes from the command line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub hedgedoc: HedgedocConfig,
    #[serde(default)]
    pub vault: VaultConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

impl Config {
    /// Default configuration mirroring the server at `root`
    pub fn for_root(root: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.hedgedoc.root = root.into();
        config.normalize();
        config
    }

    /// Brings user supplied values into canonical form
    ///
    /// The root loses trailing slashes and the start pad loses a leading one,
    /// so `{root}/{start}` is always a well formed pad URL.
    pub fn normalize(&mut self) {
        self.hedgedoc.root = self.hedgedoc.root.trim().trim_end_matches('/').to_string();
        self.hedgedoc.start = self.hedgedoc.start.trim().trim_start_matches('/').to_string();
    }
}

/// The HedgeDoc server being mirrored
#[derive(Debug, Clone, Deserialize)]
pub struct HedgedocConfig {
    /// Server origin, e.g. `https://md.example.com`
    #[serde(default)]
    pub root: String,

    /// Identity of the pad the crawl starts from
    #[serde(default = "default_start")]
    pub start: String,

    /// HedgeDoc `history.json` export whose pads seed the crawl as well
    #[serde(default)]
    pub history: Option<String>,
}

impl Default for HedgedocConfig {
    fn default() -> Self {
        Self {
            root: String::new(),
            start: default_start(),
            history: None,
        }
    }
}

/// Output directory configuration
#[derive(Debug, Clone, Deserialize)]
pub struct VaultConfig {
    /// Directory the pads are written into
    #[serde(default = "default_vault_path")]
    pub path: String,

    /// Rename files to their resolved titles after conversion
    #[serde(default = "default_rename")]
    pub rename: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            path: default_vault_path(),
            rename: default_rename(),
        }
    }
}

/// HTTP fetch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Number of pads downloaded concurrently
    #[serde(
        rename = "max-concurrent-fetches",
        default = "default_max_concurrent_fetches"
    )]
    pub max_concurrent_fetches: usize,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Ignore raw downloads cached by earlier runs
    #[serde(default)]
    pub refresh: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            user_agent: default_user_agent(),
            refresh: false,
        }
    }
}

fn default_start() -> String {
    "navigation".to_string()
}

fn default_vault_path() -> String {
    "./vault".to_string()
}

fn default_rename() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_concurrent_fetches() -> usize {
    4
}

fn default_user_agent() -> String {
    format!("Medusa/{}", env!("CARGO_PKG_VERSION"))
}
