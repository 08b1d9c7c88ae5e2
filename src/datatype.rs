// used for persistence
use rusqlite::types::{ToSql, ToSqlOutput};

// used to validate email addresses
use regex::Regex;
// so the email expression is compiled once
use lazy_static::lazy_static;

// used to print out readable forms of a value
use std::fmt;
// used to indicate that values need to be hashable
use std::hash::Hash;

use crate::error::{KeystoneError, Result};

/// A validated, immutable wrapper around one primitive value.
///
/// Implementors keep their inner value private and expose a single
/// validating constructor, so an instance always satisfies `check`.
pub trait ValueObject: fmt::Display + fmt::Debug + Clone + Eq + Hash + Send + Sync {
    // static stuff which needs to be implemented downstream
    type Raw: ?Sized + PartialEq + fmt::Display;
    const FIELD: &'static str;
    const RULE: &'static str;
    fn check(raw: &Self::Raw) -> bool;
    fn value(&self) -> &Self::Raw;
    // instance callable with pre-made implementation
    fn field(&self) -> &'static str {
        Self::FIELD
    }
    fn same_as(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

// Generates a string backed value object whose only way in is `new`.
// No `FromSql`: rows come back through `new` and are validated again.
macro_rules! string_value {
    ($(#[$meta:meta])* $name:ident, field = $field:literal, rule = $rule:literal, check = $check:expr) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Result<Self> {
                let raw = raw.into();
                if <Self as ValueObject>::check(&raw) {
                    Ok(Self(raw))
                } else {
                    Err(KeystoneError::validation($field, raw, $rule))
                }
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
            pub fn into_inner(self) -> String {
                self.0
            }
        }
        impl ValueObject for $name {
            type Raw = str;
            const FIELD: &'static str = $field;
            const RULE: &'static str = $rule;
            fn check(raw: &str) -> bool {
                let check: fn(&str) -> bool = $check;
                check(raw)
            }
            fn value(&self) -> &str {
                &self.0
            }
        }
        impl TryFrom<String> for $name {
            type Error = KeystoneError;
            fn try_from(raw: String) -> Result<Self> {
                Self::new(raw)
            }
        }
        impl TryFrom<&str> for $name {
            type Error = KeystoneError;
            fn try_from(raw: &str) -> Result<Self> {
                Self::new(raw)
            }
        }
        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.0.as_str()))
            }
        }
    };
}

pub const MAX_LENGTH: usize = 255;

lazy_static! {
    static ref EMAIL: Regex = Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$"
    ).unwrap();
}

// ------------- Values --------------
string_value!(
    /// A display name. Stored exactly as given, but it must contain something
    /// other than whitespace.
    Name,
    field = "name",
    rule = "1 to 255 characters, not blank, no control characters",
    check = |raw| {
        !raw.trim().is_empty()
            && raw.chars().count() <= MAX_LENGTH
            && !raw.chars().any(char::is_control)
    }
);

string_value!(
    /// An email address of the form `local@domain.tld`.
    Email,
    field = "email",
    rule = "a valid email address of at most 255 characters",
    check = |raw| raw.len() <= MAX_LENGTH && EMAIL.is_match(raw)
);

impl Email {
    /// The part after the `@`.
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map(|(_, domain)| domain).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_regex_rejects_missing_tld() {
        assert!(!Email::check("user@localhost"));
        assert!(Email::check("user@mail.example.co.jp"));
    }

    #[test]
    fn name_counts_characters_not_bytes() {
        let kanji = "太".repeat(MAX_LENGTH);
        assert!(Name::check(&kanji));
        assert!(!Name::check(&format!("{kanji}x")));
    }

    #[test]
    fn email_domain() {
        let email = Email::new("taro@example.com").unwrap();
        assert_eq!(email.domain(), "example.com");
    }
}
