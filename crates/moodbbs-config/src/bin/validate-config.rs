//! Config validation CLI tool
//!
//! Validates a moodbbs configuration file and reports any errors.

use moodbbs_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a moodbbs configuration file.");
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match moodbbs_config::load_config(&config_path) {
        Ok(settings) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", moodbbs_config::CURRENT_CONFIG_VERSION);
            println!("  Max active quests: {}", settings.engine.max_active_quests);
            println!(
                "  Mood thresholds: {} / {} / {} / {}",
                settings.thresholds.very_happy,
                settings.thresholds.happy,
                settings.thresholds.neutral,
                settings.thresholds.unhappy
            );
            println!("  Seeded traits: {}", settings.traits.len());
            println!("  Custom modifiers: {}", settings.modifiers.len());
            println!("  Templates: {}", settings.templates.len());

            if !settings.templates.is_empty() {
                println!();
                println!("Templates:");
                for template in &settings.templates {
                    let renewal = template
                        .renewal_policy
                        .as_ref()
                        .map_or("one-off", |p| p.renewal_type.as_str());
                    println!(
                        "  - {} [{}, {}, {} XP]: {}",
                        template.id, template.category, renewal, template.base_xp, template.title
                    );
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                moodbbs_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                moodbbs_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                moodbbs_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                moodbbs_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        moodbbs_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
