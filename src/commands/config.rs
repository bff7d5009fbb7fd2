use anyhow::Result;
use caldir_scheduling::SchedulingConfig;
use owo_colors::OwoColorize;

pub fn init(force: bool) -> Result<()> {
    let path = SchedulingConfig::config_path()?;

    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {}\nUse --force to overwrite it.",
            path.display()
        );
    }

    SchedulingConfig::create_default_config(&path)?;
    println!("Created {}", path.display());

    Ok(())
}

pub fn show() -> Result<()> {
    let path = SchedulingConfig::config_path()?;
    let config = SchedulingConfig::load()?;

    println!("{}", "Paths".bold());
    println!("  Config:  {}", path.display());
    println!();
    println!("{}", "Scheduling".bold());
    println!("  max_concurrent_sends:  {}", config.max_concurrent_sends);
    println!("  send_timeout_secs:     {}", config.send_timeout_secs);
    println!("  failure_status:        {}", config.failure_status);

    Ok(())
}
