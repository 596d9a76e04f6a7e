//! Vault tables and the referential operations on them.

use crate::VaultError;

/// One secret row: positional references into the site and user tables
/// plus the secret text itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretEntry {
    pub site: usize,
    pub user: usize,
    pub secret: String,
}

/// The three-table vault.
///
/// Invariant: every secret row's `site`/`user` index addresses an existing
/// row. Deleting a site or user cascades: dependent secret rows are
/// dropped and higher references shift down to stay contiguous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vault {
    pub sites: Vec<String>,
    pub users: Vec<String>,
    pub secrets: Vec<SecretEntry>,
}

impl Vault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_site(&mut self, label: impl Into<String>) -> Result<usize, VaultError> {
        let label = label.into();
        if label.is_empty() {
            return Err(VaultError::EmptyLabel { table: "site" });
        }
        self.sites.push(label);
        Ok(self.sites.len() - 1)
    }

    pub fn add_user(&mut self, label: impl Into<String>) -> Result<usize, VaultError> {
        let label = label.into();
        if label.is_empty() {
            return Err(VaultError::EmptyLabel { table: "user" });
        }
        self.users.push(label);
        Ok(self.users.len() - 1)
    }

    pub fn add_secret(
        &mut self,
        site: usize,
        user: usize,
        secret: impl Into<String>,
    ) -> Result<(), VaultError> {
        if site >= self.sites.len() {
            return Err(VaultError::DanglingReference {
                row: self.secrets.len(),
                table: "site",
                index: site,
            });
        }
        if user >= self.users.len() {
            return Err(VaultError::DanglingReference {
                row: self.secrets.len(),
                table: "user",
                index: user,
            });
        }
        self.secrets.push(SecretEntry {
            site,
            user,
            secret: secret.into(),
        });
        Ok(())
    }

    /// Remove site `k`: drop every secret referencing it, shift higher
    /// references down by one.
    pub fn remove_site(&mut self, k: usize) {
        if k >= self.sites.len() {
            return;
        }
        self.sites.remove(k);
        self.secrets.retain(|s| s.site != k);
        for entry in &mut self.secrets {
            if entry.site > k {
                entry.site -= 1;
            }
        }
        tracing::debug!(index = k, remaining = self.secrets.len(), "site removed");
    }

    /// Remove user `k`: same cascade as [`Vault::remove_site`] on the user
    /// column.
    pub fn remove_user(&mut self, k: usize) {
        if k >= self.users.len() {
            return;
        }
        self.users.remove(k);
        self.secrets.retain(|s| s.user != k);
        for entry in &mut self.secrets {
            if entry.user > k {
                entry.user -= 1;
            }
        }
        tracing::debug!(index = k, remaining = self.secrets.len(), "user removed");
    }

    /// Check the label and referential invariants across all tables.
    pub fn validate(&self) -> Result<(), VaultError> {
        if self.sites.iter().any(String::is_empty) {
            return Err(VaultError::EmptyLabel { table: "site" });
        }
        if self.users.iter().any(String::is_empty) {
            return Err(VaultError::EmptyLabel { table: "user" });
        }
        for (row, entry) in self.secrets.iter().enumerate() {
            if entry.site >= self.sites.len() {
                return Err(VaultError::DanglingReference {
                    row,
                    table: "site",
                    index: entry.site,
                });
            }
            if entry.user >= self.users.len() {
                return Err(VaultError::DanglingReference {
                    row,
                    table: "user",
                    index: entry.user,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_vault() -> Vault {
        let mut vault = Vault::new();
        vault.add_site("a").unwrap();
        vault.add_site("b").unwrap();
        vault.add_site("c").unwrap();
        vault.add_user("root").unwrap();
        vault.add_secret(0, 0, "p1").unwrap();
        vault.add_secret(1, 0, "p2").unwrap();
        vault.add_secret(2, 0, "p3").unwrap();
        vault
    }

    #[test]
    fn test_remove_site_cascades_and_shifts() {
        let mut vault = sample_vault();
        vault.remove_site(1);

        assert_eq!(vault.sites, vec!["a", "c"]);
        assert_eq!(
            vault.secrets,
            vec![
                SecretEntry { site: 0, user: 0, secret: "p1".into() },
                SecretEntry { site: 1, user: 0, secret: "p3".into() },
            ]
        );
        vault.validate().unwrap();
    }

    #[test]
    fn test_remove_user_cascades_and_shifts() {
        let mut vault = Vault::new();
        vault.add_site("s").unwrap();
        vault.add_user("u0").unwrap();
        vault.add_user("u1").unwrap();
        vault.add_user("u2").unwrap();
        vault.add_secret(0, 0, "a").unwrap();
        vault.add_secret(0, 1, "b").unwrap();
        vault.add_secret(0, 2, "c").unwrap();

        vault.remove_user(0);

        assert_eq!(vault.users, vec!["u1", "u2"]);
        assert_eq!(
            vault.secrets,
            vec![
                SecretEntry { site: 0, user: 0, secret: "b".into() },
                SecretEntry { site: 0, user: 1, secret: "c".into() },
            ]
        );
        vault.validate().unwrap();
    }

    #[test]
    fn test_remove_out_of_range_is_noop() {
        let mut vault = sample_vault();
        let before = vault.clone();
        vault.remove_site(99);
        vault.remove_user(99);
        assert_eq!(vault, before);
    }

    #[test]
    fn test_add_secret_rejects_dangling_reference() {
        let mut vault = Vault::new();
        vault.add_site("s").unwrap();
        assert!(vault.add_secret(0, 0, "x").is_err(), "no users yet");
        vault.add_user("u").unwrap();
        assert!(vault.add_secret(1, 0, "x").is_err(), "site 1 missing");
        vault.add_secret(0, 0, "x").unwrap();
    }

    #[test]
    fn test_empty_labels_are_rejected() {
        let mut vault = Vault::new();
        assert!(matches!(
            vault.add_site(""),
            Err(VaultError::EmptyLabel { table: "site" })
        ));
        assert!(matches!(
            vault.add_user(""),
            Err(VaultError::EmptyLabel { table: "user" })
        ));

        // A vault assembled around the constructor is caught by validate
        let vault = Vault {
            sites: vec![String::new()],
            users: vec!["u".into()],
            secrets: Vec::new(),
        };
        assert!(matches!(
            vault.validate(),
            Err(VaultError::EmptyLabel { table: "site" })
        ));
    }

    #[test]
    fn test_validate_detects_corruption() {
        let mut vault = sample_vault();
        vault.secrets[0].site = 42;
        assert!(matches!(
            vault.validate(),
            Err(VaultError::DanglingReference { table: "site", index: 42, .. })
        ));
    }
}
