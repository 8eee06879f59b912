//! Start/stop command handlers

use anyhow::Result;

use recdash_core::{Config, UserConfig};

use crate::output::Output;

pub async fn start(config: &Config, platform: String, id: String, output: &Output) -> Result<()> {
    let mut controller = super::controller(config)?;
    let user = UserConfig::new(platform, id, "");

    let ok = controller.start_recording(&user).await;
    super::report(controller.state(), ok, output)
}

pub async fn stop(config: &Config, platform: String, id: String, output: &Output) -> Result<()> {
    let mut controller = super::controller(config)?;
    let user = UserConfig::new(platform, id, "");

    let ok = controller.stop_recording(&user).await;
    super::report(controller.state(), ok, output)
}
