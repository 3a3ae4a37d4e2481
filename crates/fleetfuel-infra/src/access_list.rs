//! Access list for the credential gate (email + access code)

use std::fs;
use std::path::Path;

use fleetfuel_types::{ConfigError, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One allowed user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEntry {
    pub email: String,
    pub code: String,
}

/// Allowed users, loaded from TOML:
///
/// ```toml
/// [[users]]
/// email = "operador@empresa.com"
/// code = "1234"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessList {
    #[serde(default)]
    pub users: Vec<AccessEntry>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AccessList {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// Check credentials; returns the normalized email on success
    pub fn authenticate(&self, email: &str, code: &str) -> Result<String> {
        let email = normalize_email(email);
        let code = code.trim();

        let granted = self
            .users
            .iter()
            .any(|u| normalize_email(&u.email) == email && u.code.trim() == code);

        if granted {
            Ok(email)
        } else {
            warn!(email = %email, "access denied");
            Err(Error::AccessDenied(email))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
[[users]]
email = "Operador@Empresa.com"
code = "1234"

[[users]]
email = "auditor@empresa.com"
code = "abcd"
"#;

    #[test]
    fn test_authenticate() {
        let list = AccessList::from_toml_str(SAMPLE).unwrap();
        assert_eq!(list.users.len(), 2);

        assert_eq!(
            list.authenticate(" operador@empresa.com ", "1234").unwrap(),
            "operador@empresa.com"
        );
        assert!(matches!(
            list.authenticate("operador@empresa.com", "abcd"),
            Err(Error::AccessDenied(_))
        ));
        assert!(list.authenticate("nadie@empresa.com", "1234").is_err());
    }

    #[test]
    fn test_empty_list_denies_everyone() {
        let list = AccessList::from_toml_str("").unwrap();
        assert!(list.authenticate("operador@empresa.com", "1234").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("access.toml");
        fs::write(&path, SAMPLE).unwrap();
        assert_eq!(AccessList::load(&path).unwrap().users.len(), 2);

        assert!(matches!(
            AccessList::load(&dir.path().join("missing.toml")),
            Err(Error::FileNotFound(_))
        ));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            AccessList::from_toml_str("[[users]]\nemail = 5"),
            Err(Error::Config(ConfigError::ParseError(_)))
        ));
    }
}
