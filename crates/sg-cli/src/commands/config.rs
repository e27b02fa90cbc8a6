//! `sg config` — inspect the resolved configuration, grounded on the
//! teacher's `commands/config.rs` show/get/path split.

use crate::cli::ConfigAction;
use anyhow::{anyhow, Result};
use sg_core::Config;

pub fn run(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let text = serde_json::to_string_pretty(config)?;
            println!("{text}");
        }
        ConfigAction::Get { key } => {
            let value = serde_json::to_value(config)?;
            match value.get(&key) {
                Some(v) => println!("{v}"),
                None => return Err(anyhow!("unknown configuration key '{key}'")),
            }
        }
        ConfigAction::Path => {
            match dirs::config_dir() {
                Some(dir) => println!("{}", dir.join("sg-mcp/config.toml").display()),
                None => println!("(no configuration directory available on this platform)"),
            }
        }
    }
    Ok(())
}
