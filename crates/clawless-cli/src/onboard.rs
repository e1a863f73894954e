//! `clawless onboard` — initialize the config root, path roots and templates.
//!
//! - Creates `<config_root>/config.json` with defaults, placing the internal
//!   and shared roots inside the config root
//! - Creates the three roots, `internal/skills` and `shared/logs`
//! - Drops a sample `HEARTBEAT.md` and an example skill

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use clawless_core::config::{get_config_path, load_config, save_config, Config};
use clawless_core::utils::get_config_root;

/// Run the onboard command.
pub fn run() -> Result<()> {
    println!();
    println!("{}", "Clawless — Setup".cyan().bold());
    println!();

    let root = get_config_root();
    onboard_at(&root)?;

    println!();
    println!(
        "{}",
        "  Setup complete! Set llm.connectionString and llm.apiKey, then run `clawless chat`.".green()
    );
    println!();
    Ok(())
}

/// Create everything under `root`. Existing files are left untouched.
pub fn onboard_at(root: &Path) -> Result<Config> {
    let config_path = get_config_path(Some(root));

    // 1. Config file
    if config_path.exists() {
        println!("  {} config already exists at {}", "✓".green(), config_path.display());
    } else {
        let mut config = Config::default();
        config.paths.config_root = root.to_string_lossy().to_string();
        config.paths.internal_root = root.join("internal").to_string_lossy().to_string();
        config.paths.shared_root = root.join("shared").to_string_lossy().to_string();
        save_config(&config, Some(root))
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        println!("  {} created config at {}", "✓".green(), config_path.display());
    }

    // 2. Roots, resolved the same way every other command sees them
    let config = load_config(Some(root));
    config.paths.ensure().context("failed to create path roots")?;
    println!("  {} internal root at {}", "✓".green(), config.paths.internal_root().display());
    println!("  {} shared root at {}", "✓".green(), config.paths.shared_root().display());

    // 3. Templates
    let shared = config.paths.shared_root();
    create_template(&shared.join(&config.heartbeat.checklist_path), HEARTBEAT_TEMPLATE)?;

    let skill_dir = config.paths.internal_root().join("skills").join("echo");
    std::fs::create_dir_all(&skill_dir)?;
    create_template(&skill_dir.join("skill.json"), ECHO_SKILL_TEMPLATE)?;

    Ok(config)
}

/// Create a template file if it doesn't exist.
fn create_template(path: &Path, content: &str) -> Result<()> {
    let name = path.file_name().unwrap_or_default().to_string_lossy();
    if path.exists() {
        println!("  {} {} already exists", "✓".green(), name);
    } else {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        println!("  {} created {}", "✓".green(), name);
    }
    Ok(())
}

// ─────────────────────────────────────────────
// Templates
// ─────────────────────────────────────────────

const HEARTBEAT_TEMPLATE: &str = r#"# Heartbeat Checklist

This file is appended to the heartbeat prompt on every tick.
List what the agent should look at. If nothing needs attention it
replies HEARTBEAT_OK and stays quiet.

## Checks

- Anything overdue in shared/notes?
"#;

const ECHO_SKILL_TEMPLATE: &str = r#"{
  "name": "echo",
  "description": "Return the given args unchanged.",
  "entrypoint": "builtin:echo"
}
"#;

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_template_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/TEST.md");
        create_template(&path, "hello").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn create_template_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("TEST.md");
        std::fs::write(&path, "original").unwrap();
        create_template(&path, "new content").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");
    }

    #[test]
    fn onboard_creates_layout_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        let config = onboard_at(dir.path()).unwrap();

        assert!(dir.path().join("config.json").is_file());
        assert_eq!(config.paths.shared_root(), dir.path().join("shared"));
        assert!(dir.path().join("shared/HEARTBEAT.md").is_file());
        assert!(dir.path().join("shared/logs").is_dir());
        assert!(dir.path().join("internal/skills/echo/skill.json").is_file());

        // Second run keeps what is there.
        std::fs::write(dir.path().join("shared/HEARTBEAT.md"), "custom").unwrap();
        onboard_at(dir.path()).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("shared/HEARTBEAT.md")).unwrap(),
            "custom"
        );
    }

    #[test]
    fn echo_template_is_valid_manifest() {
        let value: serde_json::Value = serde_json::from_str(ECHO_SKILL_TEMPLATE).unwrap();
        assert_eq!(value["entrypoint"], "builtin:echo");
    }
}
