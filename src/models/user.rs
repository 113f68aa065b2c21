//! User derivations from Bugzilla profiles.

use sha1::{Digest, Sha1};

/// Placeholder for missing name parts; Redmine requires both.
const EMPTY_NAME: &str = "empty";

/// First and last name split from a Bugzilla `realname`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName {
    pub firstname: String,
    pub lastname: String,
}

impl PersonName {
    /// Splits on runs of spaces and commas; the first two tokens are kept.
    ///
    /// A leading separator yields an empty first token, which then becomes
    /// the placeholder like any other missing part.
    pub fn from_realname(realname: Option<&str>) -> Self {
        let Some(realname) = realname else {
            return Self::placeholder();
        };

        let is_sep = |c: char| c == ' ' || c == ',';
        let first = realname.split(is_sep).next().unwrap_or_default();
        let rest = realname[first.len()..].trim_start_matches(is_sep);
        let second = rest.split(is_sep).next().unwrap_or_default();

        Self {
            firstname: or_placeholder(first),
            lastname: or_placeholder(second),
        }
    }

    fn placeholder() -> Self {
        Self {
            firstname: EMPTY_NAME.to_string(),
            lastname: EMPTY_NAME.to_string(),
        }
    }
}

fn or_placeholder(part: &str) -> String {
    if part.trim().is_empty() {
        EMPTY_NAME.to_string()
    } else {
        part.to_string()
    }
}

/// Redmine user status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum UserStatus {
    Active = 1,
    Locked = 3,
}

impl UserStatus {
    /// Any non-blank `disabledtext` locks the account.
    pub fn from_disabled_text(text: Option<&str>) -> Self {
        match text {
            Some(t) if !t.trim().is_empty() => UserStatus::Locked,
            _ => UserStatus::Active,
        }
    }

    pub fn id(self) -> i64 {
        self as i64
    }
}

fn sha1_hex(input: &str) -> String {
    hex::encode(Sha1::digest(input.as_bytes()))
}

/// Redmine's stored password form: `sha1(salt + sha1(clear))`.
pub fn hash_password(salt: &str, clear: &str) -> String {
    sha1_hex(&format!("{}{}", salt, sha1_hex(clear)))
}
