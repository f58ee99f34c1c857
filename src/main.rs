use std::process::ExitCode;

use anyhow::Result;

use schemacheck::config::Config;
use schemacheck::runner::{self, Outcome};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse configuration from command line and config files
    let config = Config::from_args_and_env()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();

    if let Some(path) = &config.project_config_path {
        log::info!("Using project config {}", path.display());
    }

    println!("Validating {}...", config.path.display());

    let reports = runner::run(&config).await?;
    let mut failed = 0usize;

    for report in &reports {
        match &report.outcome {
            Outcome::Valid => log::debug!("{} is valid", report.path.display()),
            Outcome::Invalid(errors) => {
                failed += 1;
                for error in errors {
                    println!("{}", error);
                }
            }
            Outcome::Failed(message) => {
                failed += 1;
                println!("\nError checking {}: {}", report.path.display(), message);
            }
        }
    }

    if failed > 0 {
        println!("\nValidation failed for {} of {} file(s)!", failed, reports.len());
        return Ok(ExitCode::FAILURE);
    }

    println!("Validation success! {} file(s) checked.", reports.len());
    Ok(ExitCode::SUCCESS)
}
