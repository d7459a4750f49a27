use crate::error::{SslcError, SslcResult};
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100_000;
pub const DEFAULT_MAX_TRIE_NODES: usize = 4_000_000;

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    #[command(flatten)]
    pub search: SearchParams,
    #[command(flatten)]
    pub extract: ExtractOptions,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// Wall-clock budget for the permutation search of each struct, in seconds
    #[arg(short = 't', long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Number of evaluated orderings between progress reports
    #[arg(long, default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    pub progress_interval: u64,

    /// Node budget of the per-struct duplicate filter (about 12 bytes each); 0 disables it
    #[arg(long, default_value_t = DEFAULT_MAX_TRIE_NODES)]
    pub max_trie_nodes: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT_SECS,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            max_trie_nodes: DEFAULT_MAX_TRIE_NODES,
        }
    }
}

impl SearchParams {
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExtractOptions {
    /// Only analyze structs of the last contract in each file
    #[arg(long, default_value_t = false)]
    pub only_last: bool,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> SslcResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SslcError::Config(format!("failed to read '{}': {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SslcResult<()> {
        if self.search.progress_interval == 0 {
            return Err(SslcError::Config(
                "progress_interval must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Overwrites file-provided values with the ones given explicitly on the command line.
    pub fn merge_from_cli(&mut self, cli: &Config, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($section:ident . $field:ident, $arg_name:expr) => {
                if matches.value_source($arg_name) == Some(ValueSource::CommandLine) {
                    self.$section.$field = cli.$section.$field.clone();
                }
            };
        }

        update_if_present!(search.timeout, "timeout");
        update_if_present!(search.progress_interval, "progress_interval");
        update_if_present!(search.max_trie_nodes, "max_trie_nodes");
        update_if_present!(extract.only_last, "only_last");
    }
}
