//! Flat-text codec: one vault ⇆ one text blob.
//!
//! Layout: `sites ␝ users ␝ secrets`, records split by ␞, fields by ␟.
//! Separator bytes inside field content are replaced with a space before
//! encoding — intentionally lossy for exactly those bytes.

use crate::model::{SecretEntry, Vault};
use crate::{VaultError, FIELD_SEP, RECORD_SEP, TABLE_SEP};

/// Replace any separator byte in field content with a space.
fn sanitize(field: &str) -> String {
    field.replace([TABLE_SEP, RECORD_SEP, FIELD_SEP], " ")
}

/// Encode a vault into one flat text blob.
pub fn encode(vault: &Vault) -> String {
    let sites = vault
        .sites
        .iter()
        .map(|s| sanitize(s))
        .collect::<Vec<_>>()
        .join(&RECORD_SEP.to_string());

    let users = vault
        .users
        .iter()
        .map(|u| sanitize(u))
        .collect::<Vec<_>>()
        .join(&RECORD_SEP.to_string());

    let secrets = vault
        .secrets
        .iter()
        .map(|entry| {
            [
                entry.site.to_string(),
                entry.user.to_string(),
                sanitize(&entry.secret),
            ]
            .join(&FIELD_SEP.to_string())
        })
        .collect::<Vec<_>>()
        .join(&RECORD_SEP.to_string());

    [sites, users, secrets].join(&TABLE_SEP.to_string())
}

/// Decode a blob produced by [`encode`].
///
/// Tolerant of missing trailing tables and fields — they decode as empty.
/// Secret index fields must parse as integers and address existing rows,
/// and every site/user label must be non-empty.
pub fn decode(blob: &str) -> Result<Vault, VaultError> {
    let mut tables = blob.split(TABLE_SEP);

    let sites = split_records(tables.next().unwrap_or(""));
    let users = split_records(tables.next().unwrap_or(""));

    let mut secrets = Vec::new();
    for (row, record) in split_records(tables.next().unwrap_or("")).iter().enumerate() {
        let mut fields = record.split(FIELD_SEP);
        let site = parse_index(row, fields.next().unwrap_or(""))?;
        let user = parse_index(row, fields.next().unwrap_or(""))?;
        let secret = fields.next().unwrap_or("").to_string();
        secrets.push(SecretEntry { site, user, secret });
    }

    let vault = Vault { sites, users, secrets };
    vault.validate()?;
    Ok(vault)
}

fn split_records(table: &str) -> Vec<String> {
    if table.is_empty() {
        return Vec::new();
    }
    table.split(RECORD_SEP).map(str::to_string).collect()
}

fn parse_index(row: usize, field: &str) -> Result<usize, VaultError> {
    field.trim().parse().map_err(|_| VaultError::BadIndex {
        row,
        field: field.to_string(),
    })
}
