//! Startup configuration from command-line flags and the environment.

use argh::FromArgs;
use std::env;

/// Environment variable holding the log filter, e.g. `TINYSH_LOG=debug`.
pub const LOG_ENV: &str = "TINYSH_LOG";

#[derive(FromArgs, Debug, Default)]
/// A minimal interactive shell.
pub struct Args {
    #[argh(switch)]
    /// read plain lines instead of switching the terminal to raw mode.
    pub line_mode: bool,

    #[argh(switch, short = 'd')]
    /// log at debug level unless TINYSH_LOG or RUST_LOG says otherwise.
    pub debug: bool,
}

/// Resolved settings for one shell session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Skip raw mode even when standard input is a terminal.
    pub line_mode: bool,
    /// `tracing_subscriber::EnvFilter` directives.
    pub log_filter: String,
}

impl Config {
    pub fn from_args(args: Args) -> Self {
        Self::resolve(args, |key| env::var(key).ok())
    }

    fn resolve(args: Args, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let log_filter = lookup(LOG_ENV)
            .or_else(|| lookup("RUST_LOG"))
            .filter(|filter| !filter.trim().is_empty())
            .unwrap_or_else(|| if args.debug { "debug" } else { "warn" }.to_string());
        Self {
            line_mode: args.line_mode,
            log_filter,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::resolve(Args::default(), |_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve(args: Args, vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::resolve(args, |key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.line_mode);
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn test_debug_flag_raises_level() {
        let args = Args {
            debug: true,
            ..Default::default()
        };
        assert_eq!(resolve(args, &[]).log_filter, "debug");
    }

    #[test]
    fn test_env_overrides_flag() {
        let args = Args {
            debug: true,
            line_mode: true,
        };
        let config = resolve(args, &[("RUST_LOG", "info"), (LOG_ENV, "tinysh=trace")]);
        assert_eq!(config.log_filter, "tinysh=trace");
        assert!(config.line_mode);

        let config = resolve(Args::default(), &[("RUST_LOG", "info")]);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let config = resolve(Args::default(), &[(LOG_ENV, "  ")]);
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::from_args(&["tinysh"], &["--line-mode", "-d"]).unwrap();
        assert!(args.line_mode);
        assert!(args.debug);
    }
}
