//! vlk-vault: the three-table password vault and its flat-text codec
//!
//! A vault is three relational tables — sites, users, secrets — where each
//! secret row references a site and a user by position. The codec flattens
//! the whole vault into one text blob (the unit the envelope crypto seals),
//! nesting three mutually exclusive separator bytes for table / record /
//! field.

pub mod codec;
pub mod display;
pub mod model;

pub use codec::{decode, encode};
pub use display::display_labels;
pub use model::{SecretEntry, Vault};

use thiserror::Error;

/// Table separator (ASCII GS)
pub const TABLE_SEP: char = '\u{1d}';
/// Record separator (ASCII RS)
pub const RECORD_SEP: char = '\u{1e}';
/// Field separator (ASCII US)
pub const FIELD_SEP: char = '\u{1f}';

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("secret row {row} has a malformed index: {field:?}")]
    BadIndex { row: usize, field: String },

    /// An empty label is indistinguishable from an absent record in the
    /// flat-text form, so it is invalid vault content.
    #[error("{table} label must not be empty")]
    EmptyLabel { table: &'static str },

    #[error("secret row {row} references missing {table} index {index}")]
    DanglingReference {
        row: usize,
        table: &'static str,
        index: usize,
    },
}
