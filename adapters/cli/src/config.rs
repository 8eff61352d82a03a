//! Session configuration files.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tank_defence_core::{SessionConfig, TowerKind};

const SUPPORTED_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    version: u32,
    #[serde(default)]
    session: SessionConfig,
}

/// Reads and validates the session configuration stored at `path`.
pub(crate) fn load(path: &Path) -> Result<SessionConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read session config at {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid session config {}", path.display()))
}

fn parse(contents: &str) -> Result<SessionConfig> {
    let file: ConfigFile =
        toml::from_str(contents).context("failed to parse session config toml contents")?;
    if file.version != SUPPORTED_CONFIG_VERSION {
        bail!(
            "unsupported session config version {}; expected {}",
            file.version,
            SUPPORTED_CONFIG_VERSION
        );
    }
    validate(&file.session)?;
    Ok(file.session)
}

/// Rejects settings the simulation cannot run with.
pub(crate) fn validate(config: &SessionConfig) -> Result<()> {
    if !(config.width.is_finite() && config.width > 0.0) {
        bail!("playfield width must be positive, got {}", config.width);
    }
    // The placement band is 50 units from each edge.
    if !(config.height.is_finite() && config.height > 100.0) {
        bail!("playfield height must exceed 100, got {}", config.height);
    }
    if config.total_waves == 0 {
        bail!("a campaign needs at least one wave");
    }
    if config.starting_lives == 0 {
        bail!("starting lives must be at least one");
    }
    for kind in TowerKind::ALL {
        let spec = config.catalog.spec(kind);
        if spec.fire_rate_ms == 0 {
            bail!("{kind:?} fire rate must be at least one millisecond");
        }
        if !(spec.damage.is_finite() && spec.range.is_finite()) || spec.range <= 0.0 {
            bail!("{kind:?} needs finite damage and a positive range");
        }
        if spec.unlock_wave == Some(0) {
            bail!("{kind:?} unlock wave must be at least one");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_only_file_yields_defaults() {
        let parsed = parse("version = 1").expect("config should parse");
        assert_eq!(parsed, SessionConfig::default());
    }

    #[test]
    fn partial_overrides_keep_remaining_defaults() {
        let contents = r#"
            version = 1

            [session]
            starting_cash = 250
            total_waves = 5

            [session.catalog.bomber]
            cost = 120
            damage = 2.0
            range = 150.0
            fire_rate_ms = 2000
            upgrade_base = 180
        "#;

        let parsed = parse(contents).expect("config should parse");
        assert_eq!(parsed.starting_cash, 250);
        assert_eq!(parsed.total_waves, 5);
        assert_eq!(parsed.starting_lives, 10);
        assert_eq!(parsed.catalog.bomber.cost, 120);
        assert_eq!(parsed.catalog.bomber.unlock_wave, None);
        assert_eq!(parsed.catalog.ice, SessionConfig::default().catalog.ice);
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let error = parse("version = 2").expect_err("version 2 is unknown");
        assert!(error.to_string().contains("unsupported session config version"));
    }

    #[test]
    fn unknown_top_level_keys_are_rejected() {
        assert!(parse("version = 1\nmode = \"hard\"").is_err());
    }

    #[test]
    fn degenerate_settings_fail_validation() {
        assert!(parse("version = 1\n[session]\ntotal_waves = 0").is_err());
        assert!(parse("version = 1\n[session]\nheight = 80.0").is_err());
        assert!(parse("version = 1\n[session]\nstarting_lives = 0").is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let error = load(Path::new("does/not/exist.toml")).expect_err("file is missing");
        assert!(format!("{error:#}").contains("does/not/exist.toml"));
    }
}
