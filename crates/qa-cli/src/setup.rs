use anyhow::{Context, Result};
use std::path::Path;

use crate::config::Config;

const CONFIG_TEMPLATE: &str = r##"# qa configuration
#
# Credentials are read from environment variables when not set here:
#   WOLFRAM_APP_ID, CLOUDINARY_CLOUD_NAME, CLOUDINARY_UPLOAD_PRESET

[wolfram]
# app_id = "XXXXXX-XXXXXXXXXX"
# base_url = "https://api.wolframalpha.com"

[cloudinary]
# cloud_name = "demo"
# upload_preset = "unsigned-preset"   # must be an unsigned preset

[assembler]
# rehost_timeout_secs = 15
# accent_color = "#F58120"
# web_base_url = "http://www.wolframalpha.com/input/?i="
"##;

pub fn run() -> Result<()> {
    let config_dir = Config::config_dir()?;
    let config_path = config_dir.join("config.toml");

    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create config directory: {}", config_dir.display()))?;

    if config_path.exists() {
        print!("{} already exists. Overwrite? (A backup is kept) [y/N] ", config_path.display());

        // Flush stdout so the prompt appears before reading
        use std::io::Write;
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Setup cancelled.");
            return Ok(());
        }

        backup_file(&config_path)?;
    }

    std::fs::write(&config_path, CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("Created {}", config_path.display());

    println!("\nNext steps:");
    println!("  1. Set your app id:   export WOLFRAM_APP_ID=\"XXXXXX-XXXXXXXXXX\"");
    println!("  2. Convert a unit:    qa 5 km");
    println!("  3. Ask a question:    qa --full \"integrate x^2 sin x\"");

    Ok(())
}

/// Back up a file to <name>.bak, appending a timestamp if .bak already exists.
fn backup_file(path: &Path) -> Result<()> {
    let mut backup = path.with_extension("toml.bak");

    if backup.exists() {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        backup = path.with_extension(format!("toml.bak.{}", timestamp));
    }

    std::fs::rename(path, &backup)
        .with_context(|| format!("Failed to back up {} to {}", path.display(), backup.display()))?;
    println!("  Backed up to {}", backup.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parses() {
        let config: Config = toml::from_str(CONFIG_TEMPLATE).unwrap();
        assert!(config.wolfram.app_id.is_none());
        assert!(config.assembler.rehost_timeout_secs.is_none());
    }
}
