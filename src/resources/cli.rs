use bevy::prelude::*;
use std::path::PathBuf;

use super::config::NavigationConfig;

/// Command-line arguments parsed at startup.
#[derive(Debug, Default, PartialEq)]
pub struct CliArgs {
    /// JSON file with `NavigationConfig` overrides.
    /// Usage: `cargo run -- --config tuning.json`
    pub config: Option<PathBuf>,

    /// Start with the navmesh wireframe overlay visible.
    pub show_navmesh: bool,
}

impl CliArgs {
    /// Parse command-line arguments.
    /// Supports:
    /// - `--config <path>`: Load navigation config from a JSON file
    /// - `--show-navmesh`: Draw the navmesh overlay from the first frame
    pub fn parse() -> Self {
        Self::parse_from(std::env::args().skip(1))
    }

    pub fn parse_from(args: impl IntoIterator<Item = String>) -> Self {
        let args: Vec<String> = args.into_iter().collect();
        let mut cli = CliArgs::default();

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--config" => {
                    if i + 1 < args.len() {
                        cli.config = Some(PathBuf::from(&args[i + 1]));
                        info!("CLI: Will load config from '{}'", args[i + 1]);
                        i += 2;
                    } else {
                        warn!("CLI: --config requires a file path argument");
                        i += 1;
                    }
                }
                "--show-navmesh" => {
                    cli.show_navmesh = true;
                    i += 1;
                }
                arg => {
                    if arg.starts_with('-') {
                        warn!("CLI: Unknown argument '{}'", arg);
                    }
                    i += 1;
                }
            }
        }

        cli
    }

    /// Navigation config to start with: the `--config` file (or defaults),
    /// with the overlay forced on by `--show-navmesh`.
    pub fn navigation_config(&self) -> NavigationConfig {
        let mut config = self
            .config
            .as_deref()
            .map(NavigationConfig::load)
            .unwrap_or_default();
        config.show_navmesh |= self.show_navmesh;
        config
    }
}
