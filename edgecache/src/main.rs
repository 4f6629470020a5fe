use edgecache_config::EdgeConfig;
use edgecache_core::Master;
use tracing::warn;
use utils::init_tracing;

const CONFIG_FILE: &str = "edgecache.conf";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cfg = match EdgeConfig::from_file(CONFIG_FILE) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error reading {CONFIG_FILE}: {e}");
            eprintln!("Continuing with default configuration...");
            EdgeConfig::default()
        }
    };

    let report = cfg.validate();
    for warning in report.warnings() {
        warn!(target: "edgecache::config", "{warning}");
    }
    if report.has_errors() {
        eprintln!("{}", report.format());
        anyhow::bail!("configuration is invalid");
    }

    Master::new(cfg)?.run().await
}
