use lixi_cui::LaunchOptions;
use lixi_data::{default_assets_dir, default_store_path};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let seed = std::env::args()
        .skip(1)
        .skip_while(|arg| arg != "--seed")
        .nth(1)
        .and_then(|value| value.parse::<u64>().ok());
    lixi_cui::run(LaunchOptions {
        assets_dir: default_assets_dir(),
        store_path: default_store_path().unwrap_or_else(|| PathBuf::from("lixi_store.json")),
        seed,
    })
}
