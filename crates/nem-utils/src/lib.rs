// Copyright 2024 Nemos Contributors.
// This file is part of nemos.

// nemos is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// nemos is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with nemos.  If not, see <http://www.gnu.org/licenses/>.

//! Path and filesystem helpers kept deliberately small: the keystore
//! format and TLS termination are external collaborators, but operator
//! paths still need `~` expansion the way the original node did.

use std::path::Path;

fn home_dir() -> String {
    std::env::var("HOME").unwrap_or_default()
}

/// Expands a leading `~/` or `~\` into `$HOME`. Anything else, including
/// paths that merely contain `@` or `:`, passes through untouched.
pub fn expand_path(p: &str) -> String {
    if let Some(rest) = p.strip_prefix("~/") {
        return format!("{}/{}", home_dir(), rest);
    }
    if let Some(rest) = p.strip_prefix("~\\") {
        return format!("{}\\{}", home_dir(), rest);
    }
    p.to_string()
}

/// Recursively removes a directory, erroring if it does not exist.
pub fn remove_dir(path: impl AsRef<Path>) -> std::io::Result<()> {
    std::fs::remove_dir_all(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_plain_paths() {
        assert_eq!(expand_path("path:to:something"), "path:to:something");
        assert_eq!(expand_path("user@example.com"), "user@example.com");
        assert_eq!(expand_path("path/to/something"), "path/to/something");
    }

    #[test]
    fn expands_tilde_slash() {
        std::env::set_var("HOME", "/home/nemos");
        assert_eq!(
            expand_path("~/path/to/something"),
            "/home/nemos/path/to/something"
        );
    }

    #[test]
    fn expands_tilde_backslash() {
        std::env::set_var("HOME", "/home/nemos");
        assert_eq!(
            expand_path("~\\path\\to\\something"),
            "/home/nemos\\path\\to\\something"
        );
    }

    #[test]
    fn remove_dir_errors_when_missing() {
        assert!(remove_dir("definitely-not-a-real-nemos-dir").is_err());
    }

    #[test]
    fn remove_dir_succeeds_when_present() {
        let dir = std::env::temp_dir().join("nemos-utils-test-remove-dir");
        std::fs::create_dir_all(&dir).unwrap();
        assert!(remove_dir(&dir).is_ok());
    }
}
