use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Directory for saved forms
    #[arg(short, long, default_value = "forms")]
    pub data_dir: String,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing FormSync...".bright_blue().bold());

    let config = Config {
        data_dir: args.data_dir,
        ..Config::default()
    };

    for dir in [config.data_dir(cwd), config.fallback_dir(cwd)] {
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            println!("  {} Created {}/", "✓".green(), dir.strip_prefix(cwd).unwrap_or(&dir).display());
        }
    }

    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Ready!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Write an edit script (see `formsync replay --help`)");
    println!("  2. Run: formsync replay script.json --form-id my-form");

    Ok(())
}
