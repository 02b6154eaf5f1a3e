use tabrelay_core::{Config, DriverOptions, OutputFormat, Platform, Result, Tab};
use tabrelay_devices::{with_device, DriverFactory, SystemDrivers};
use tracing::info;

pub async fn run(
    platform: Platform,
    options: DriverOptions,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let drivers = SystemDrivers::new(Config::from_env());

    eprintln!("Starting {} tab copy...", platform.display_name());
    let tabs = copy_tabs(&drivers, platform, &options).await?;
    eprintln!(
        "Successfully copied {} tabs from {} device:\n",
        tabs.len(),
        platform.display_name()
    );

    // The document alone goes to stdout so it can be redirected into a file.
    println!("{}", format.render_tabs(&tabs)?);
    Ok(())
}

pub async fn copy_tabs(
    drivers: &dyn DriverFactory,
    platform: Platform,
    options: &DriverOptions,
) -> Result<Vec<Tab>> {
    let driver = drivers.driver(platform, options);
    let tabs = with_device(driver, options.operation_budget(), |source| async move {
        source.list().await
    })
    .await?;
    info!(%platform, count = tabs.len(), "Copied tabs");
    Ok(tabs)
}
