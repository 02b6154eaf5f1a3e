use std::path::Path;

use anyhow::Context;
use tabrelay_core::format::parse_tabs;
use tabrelay_core::{Config, DriverOptions, Platform, Tab};
use tabrelay_devices::restore::RESTORE_PACING;
use tabrelay_devices::{restore_tabs, with_device, DriverFactory, SystemDrivers};

pub async fn run(platform: Platform, file: &Path, options: DriverOptions) -> anyhow::Result<()> {
    let tabs = load_tabs_file(file)?;
    println!("Restoring {} tabs to {} device...", tabs.len(), platform.display_name());

    let drivers = SystemDrivers::new(Config::from_env());
    let opened = reopen_tabs(&drivers, platform, &options, tabs.clone()).await?;
    println!(
        "Successfully restored {} of {} tabs to {} device",
        opened,
        tabs.len(),
        platform.display_name()
    );
    Ok(())
}

/// Read a tab list written by `copy`, in either output format.
pub fn load_tabs_file(path: &Path) -> anyhow::Result<Vec<Tab>> {
    let document = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tabs file {}", path.display()))?;
    parse_tabs(&document).with_context(|| format!("Failed to parse tabs file {}", path.display()))
}

async fn reopen_tabs(
    drivers: &dyn DriverFactory,
    platform: Platform,
    options: &DriverOptions,
    tabs: Vec<Tab>,
) -> tabrelay_core::Result<usize> {
    let budget = options.operation_budget() + RESTORE_PACING * tabs.len() as u32;
    let driver = drivers.driver(platform, options);
    with_device(driver, budget, |source| async move {
        restore_tabs(source.as_ref(), &tabs).await
    })
    .await
}
