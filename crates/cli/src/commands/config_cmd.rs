//! `strata config`: Configuration helpers.

use clap::Subcommand;
use std::path::Path;
use strata_config::AppConfig;

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print a starter config with every default filled in
    Init,
    /// Print the effective configuration (file + environment), secrets redacted
    Show,
    /// Print the config file path
    Path,
}

pub async fn run(
    action: Option<ConfigAction>,
    explicit: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    match action.unwrap_or(ConfigAction::Init) {
        ConfigAction::Init => print!("{}", AppConfig::default_toml()),
        ConfigAction::Show => {
            let mut config = super::load_config(explicit)
                .map_err(|e| format!("Failed to load config: {e}"))?;
            redact(&mut config);
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => println!("{}", super::config_path(explicit).display()),
    }
    Ok(())
}

fn redact(config: &mut AppConfig) {
    for provider in config.providers.values_mut() {
        if provider.api_key.is_some() {
            provider.api_key = Some("***".into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_is_valid() {
        let path = super::super::config_path(None);
        assert!(path.to_str().unwrap().ends_with("config.toml"));
        assert_eq!(
            super::super::config_path(Some(Path::new("/tmp/strata.toml"))),
            Path::new("/tmp/strata.toml")
        );
    }

    #[test]
    fn redaction_hides_keys() {
        let mut config = AppConfig::default();
        if let Some(provider) = config.providers.get_mut("openai") {
            provider.api_key = Some("sk-secret".into());
        }
        redact(&mut config);
        let rendered = toml::to_string_pretty(&config).unwrap();
        assert!(!rendered.contains("sk-secret"));
    }
}
