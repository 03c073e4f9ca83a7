//! Interactive configuration wizard for creating a config file.

use anyhow::Context;
use dbcleaner_core::{CleanerConfig, Config, DatabaseConfig, Driver};
use dialoguer::{Confirm, Input, Password, Select};
use std::path::Path;

/// Runs the interactive setup and writes the resulting configuration file.
///
/// # Errors
/// Returns an error if a prompt is cancelled, validation fails, or the
/// file cannot be written.
pub(crate) fn run_wizard(output: &Path, force: bool) -> anyhow::Result<()> {
    println!();
    println!("dbcleaner configuration");
    println!("=======================");
    println!();

    if output.exists() && !force {
        let overwrite = Confirm::new()
            .with_prompt(format!("{} already exists. Overwrite?", output.display()))
            .default(false)
            .interact()?;
        if !overwrite {
            println!("Keeping existing {}.", output.display());
            return Ok(());
        }
    }

    let drivers = [Driver::Postgres, Driver::MySql];
    let driver_idx = Select::new()
        .with_prompt("Database engine")
        .items(&["PostgreSQL", "MySQL"])
        .default(0)
        .interact()?;
    let driver = drivers[driver_idx];

    let host: String = Input::new()
        .with_prompt("Host")
        .default("localhost".to_string())
        .interact_text()?;
    let port: u16 = Input::new()
        .with_prompt("Port")
        .default(driver.default_port())
        .interact_text()?;
    let user: String = Input::new().with_prompt("Username").interact_text()?;
    let password = Password::new().with_prompt("Password").interact()?;
    let dbname: String = Input::new().with_prompt("Database name").interact_text()?;

    let sslmode_choices = ["disable", "prefer", "require"];
    let sslmode_idx = Select::new()
        .with_prompt("SSL mode")
        .items(&sslmode_choices)
        .default(0)
        .interact()?;
    // "disable" is already the engine default; only record a deviation.
    let sslmode =
        (sslmode_idx != 0).then(|| sslmode_choices[sslmode_idx].to_string());

    let truncate_only = Confirm::new()
        .with_prompt("Default to truncating instead of dropping tables?")
        .default(false)
        .interact()?;

    let config = Config {
        database: DatabaseConfig {
            driver: driver.name().to_string(),
            host,
            port,
            user,
            password,
            dbname,
            sslmode,
        },
        cleaner: CleanerConfig {
            truncate_only,
            ..Default::default()
        },
    };

    config
        .validate()
        .context("configuration failed validation")?;
    config
        .save(output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!();
    println!("Configuration saved to {}", output.display());
    Ok(())
}
