//! Small helpers shared across modules.

use std::path::Path;

/// Replace the home directory prefix with `~` for display.
pub fn private_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        return format!("~/{}", stripped.display());
    }
    path.display().to_string()
}

/// Quote a value so it is passed to `sh -c` as a single word.
pub fn shell_quote(value: &str) -> String {
    if !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=+,@%".contains(c))
    {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_shell_quote_plain_word() {
        assert_eq!(shell_quote("Adwaita-dark"), "Adwaita-dark");
        assert_eq!(shell_quote("/usr/share/bg/stars.png"), "/usr/share/bg/stars.png");
    }

    #[test]
    fn test_shell_quote_spaces_and_quotes() {
        assert_eq!(shell_quote("Night Sky"), "'Night Sky'");
        assert_eq!(shell_quote("it's"), "'it'\\''s'");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_private_path_outside_home() {
        let path = PathBuf::from("/etc/nightswitch/nightswitch.toml");
        assert_eq!(private_path(&path), "/etc/nightswitch/nightswitch.toml");
    }
}
