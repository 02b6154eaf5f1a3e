use tabrelay_core::Config;
use tabrelay_devices::probe::{diagnose, PlatformFilter};

/// Print the environment report; exits non-zero when a required tool is
/// missing. Device problems alone are reported but do not fail the check.
pub async fn run(platform: Option<String>) -> anyhow::Result<()> {
    let filter: PlatformFilter = platform.as_deref().unwrap_or("all").parse()?;

    println!("Checking system dependencies...");
    println!("Platform: {}\n", filter.name());

    let report = diagnose(&Config::from_env(), filter).await;
    println!("{}", report.render());

    if report.has_missing_tools() {
        std::process::exit(1);
    }
    Ok(())
}
