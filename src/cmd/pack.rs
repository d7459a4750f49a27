use crate::reports;
use clap::Args;
use sslc::api;
use sslc::config::Config;
use sslc::error::{SslcError, SslcResult};
use sslc::layout::SLOT_CAPACITY;
use sslc::optimizer::{NoProgress, Optimizer, SearchOptions};

#[derive(Args, Debug, Clone)]
pub struct PackArgs {
    /// Field sizes in bytes, in declaration order (space or comma separated)
    #[arg(required = true, num_args = 1.., value_delimiter = ',')]
    pub sizes: Vec<u32>,

    #[command(flatten)]
    pub config: Config,
}

fn to_byte_sizes(sizes: &[u32]) -> SslcResult<Vec<u8>> {
    sizes
        .iter()
        .map(|&s| {
            if s == 0 || s > SLOT_CAPACITY {
                Err(SslcError::InvalidSize(s))
            } else {
                Ok(s as u8)
            }
        })
        .collect()
}

pub fn run(args: PackArgs, config: &Config) -> SslcResult<i32> {
    let sizes = to_byte_sizes(&args.sizes)?;
    let optimizer = Optimizer::new(SearchOptions::from(config));
    let analysis = api::analyze_sizes(&sizes, &optimizer, &NoProgress)?;

    reports::print_pack_result(&sizes, &analysis);
    Ok(0)
}
