use gg_domain::config::{Config, ConfigSeverity};

/// Parse and validate the config, printing any issues.
///
/// Returns `false` when at least one error was found; warnings alone pass.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let issues = config.validate();

    if issues.is_empty() {
        println!("Config OK ({config_path})");
        return true;
    }

    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();

    for issue in &issues {
        println!("{issue}");
    }
    println!(
        "\n{error_count} error(s), {} warning(s) in {config_path}",
        issues.len() - error_count,
    );

    error_count == 0
}

/// Render the resolved config (all defaults filled in) as TOML, with any
/// plaintext API key masked.
pub fn render(config: &Config) -> anyhow::Result<String> {
    let mut shown = config.clone();
    if shown.llm.provider.auth.key.is_some() {
        shown.llm.provider.auth.key = Some("[REDACTED]".into());
    }
    toml::to_string_pretty(&shown).map_err(|e| anyhow::anyhow!("serializing config: {e}"))
}

/// Print [`render`] to stdout.
pub fn show(config: &Config) -> anyhow::Result<()> {
    print!("{}", render(config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(validate(&Config::default(), "config.toml"));
    }

    #[test]
    fn errors_fail_validation_but_warnings_do_not() {
        let mut config = Config::default();
        config.llm.provider.auth.key = Some("AIza-test".into());
        assert!(validate(&config, "config.toml"));

        config.llm.chat_model.clear();
        assert!(!validate(&config, "config.toml"));
    }

    #[test]
    fn render_masks_plaintext_key() {
        let mut config = Config::default();
        config.llm.provider.auth.key = Some("AIza-very-secret".into());
        let out = render(&config).unwrap();
        assert!(!out.contains("AIza-very-secret"));
        assert!(out.contains("[REDACTED]"));
        assert!(out.contains("[server]"));
    }
}
