//! Check-Key Command
//!
//! Validate the configured credentials with a minimal request per model.

use std::time::Duration;

use tokio::runtime::Runtime;

use crate::ai::{AiGateway, validate_credentials};
use crate::cli::ui::Output;
use crate::cli::util::{AiOverrides, build_target};
use crate::config::ConfigLoader;
use crate::types::{Result, SeoError};

pub fn run(overrides: &AiOverrides, quiet: bool) -> Result<()> {
    let out = Output::quiet(quiet);

    let mut config = ConfigLoader::load()?;
    overrides.apply(&mut config.ai);
    let target = build_target(&config.ai, |name| std::env::var(name).ok())?;
    let gateway = AiGateway::http(Duration::from_secs(config.ai.timeout_secs))?;

    out.info(&format!("Checking {} credentials...", target.backend));

    let rt = Runtime::new()?;
    let check = rt.block_on(validate_credentials(&gateway, &target));

    if check.valid {
        out.success("API key is valid.");
        Ok(())
    } else {
        Err(SeoError::Config(check.message.unwrap_or_else(|| {
            "An unknown validation error occurred.".to_string()
        })))
    }
}
