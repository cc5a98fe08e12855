//! Status line shown before each input line: `user@host dir > `.

use nix::unistd::{User, geteuid};
use std::env;
use std::path::Path;

/// Composes the prompt from the effective user, the short hostname and the
/// last segment of the working directory.
///
/// Lookups go through the OS on every render; call it while the terminal is
/// in canonical mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptRenderer;

impl PromptRenderer {
    pub fn render(&self, working_dir: &Path) -> String {
        compose(&effective_user(), &short_hostname(), working_dir)
    }
}

/// Formats the prompt from already resolved parts.
pub fn compose(user: &str, host: &str, working_dir: &Path) -> String {
    format!("{}@{} {} > ", user, host, dir_label(working_dir))
}

/// Last path segment of `dir`; the root has none and is shown as `~`.
fn dir_label(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "~".to_string())
}

fn effective_user() -> String {
    match User::from_uid(geteuid()) {
        Ok(Some(user)) => user.name,
        _ => env::var("USER").unwrap_or_else(|_| "?".to_string()),
    }
}

/// Hostname without its domain suffix.
fn short_hostname() -> String {
    let full = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "localhost".to_string());
    strip_domain(&full).to_string()
}

fn strip_domain(host: &str) -> &str {
    host.split('.').next().unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_uses_last_segment() {
        let prompt = compose("alice", "box", Path::new("/home/alice/projects"));
        assert_eq!(prompt, "alice@box projects > ");
    }

    #[test]
    fn test_root_is_rendered_as_tilde() {
        assert_eq!(compose("root", "box", Path::new("/")), "root@box ~ > ");
    }

    #[test]
    fn test_hostname_domain_is_dropped() {
        assert_eq!(strip_domain("build01.example.com"), "build01");
        assert_eq!(strip_domain("plain"), "plain");
        assert_eq!(strip_domain(""), "");
    }

    #[test]
    fn test_render_has_expected_shape() {
        let prompt = PromptRenderer.render(Path::new("/usr/bin"));
        assert!(prompt.contains('@'));
        assert!(prompt.ends_with(" bin > "));
        let host = prompt
            .split('@')
            .nth(1)
            .and_then(|rest| rest.split(' ').next())
            .unwrap();
        assert!(!host.contains('.'));
    }
}
