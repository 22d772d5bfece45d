use super::Host;
use super::config::Config;
use crate::Result;
use camino::Utf8PathBuf;
use clap::Parser;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the configuration file
    #[arg(long, short = 'c', value_name = "PATH", default_value = "config.json")]
    pub config: Utf8PathBuf,
}

/// Check that a configuration file loads, listing what it would collect.
pub fn validate_config<H: Host>(host: &mut H, args: &ValidateArgs) -> Result<()> {
    match Config::load(&args.config) {
        Ok(config) => {
            let _ = writeln!(host.output(), "Configuration file '{}' is valid", args.config);
            for entry in &config.repos {
                let packages: Vec<String> = entry
                    .packages
                    .iter()
                    .flat_map(|(source, names)| names.iter().map(move |name| format!("{source}:{name}")))
                    .collect();

                if packages.is_empty() {
                    let _ = writeln!(host.output(), "  {}", entry.repo);
                } else {
                    let _ = writeln!(host.output(), "  {} ({})", entry.repo, packages.join(", "));
                }
            }
            Ok(())
        }
        Err(e) => {
            let _ = writeln!(host.error(), "❌ Configuration validation failed: {e}");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::host::TestHost;
    use tempfile::TempDir;

    fn config_file(dir: &TempDir, text: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::from_path_buf(dir.path().join("config.json")).unwrap();
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_valid_config_lists_repositories() {
        let dir = TempDir::new().unwrap();
        let config = config_file(
            &dir,
            r#"{"repos": ["octo/widgets", {"repo": "octo/gadgets", "packages": {"npm": ["gadgets"]}}]}"#,
        );

        let mut host = TestHost::default();
        validate_config(&mut host, &ValidateArgs { config: config.clone() }).unwrap();

        assert_eq!(
            host.output_text(),
            format!("Configuration file '{config}' is valid\n  octo/widgets\n  octo/gadgets (npm:gadgets)\n")
        );
        assert!(host.error_text().is_empty());
    }

    #[test]
    fn test_invalid_config_reports_error() {
        let dir = TempDir::new().unwrap();
        let config = config_file(&dir, r#"{"repos": [{"repo": "octo/widgets", "packages": {"cargo": ["w"]}}]}"#);

        let mut host = TestHost::default();
        let _ = validate_config(&mut host, &ValidateArgs { config }).unwrap_err();

        assert!(host.output_text().is_empty());
        assert!(host.error_text().contains("unknown package registry 'cargo'"), "{}", host.error_text());
    }
}
