//! Deprecation descriptors and the builder that composes their messages.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::notice::DeprecationNotice;
use crate::{DkeyError, Result};

/// Category a deprecation notice is emitted under.
///
/// The two built-in categories are recognised by name (`"developer"` and
/// `"end user"`). Any other name is kept verbatim as a custom tag and left to
/// the sink to interpret. A `Custom` tag spelling a built-in name is the
/// same category as that built-in: equality, hashing and filtering all go
/// by [`as_str`](Severity::as_str).
#[derive(Debug, Clone, Default)]
pub enum Severity {
    /// Aimed at developers; hidden from end users by default.
    #[default]
    Developer,
    /// Shown to end users by default.
    EndUser,
    /// Caller-supplied category.
    Custom(String),
}

impl Severity {
    /// Name of the category as it appears on the diagnostic channel.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Developer => "developer",
            Self::EndUser => "end user",
            Self::Custom(tag) => tag,
        }
    }

    /// Check if this is one of the two built-in categories.
    pub fn is_builtin(&self) -> bool {
        !matches!(self.clone().normalized(), Self::Custom(_))
    }

    /// Fold a custom tag that spells a built-in name into that built-in.
    pub fn normalized(self) -> Self {
        match self {
            Self::Custom(tag) => Self::from(tag),
            builtin => builtin,
        }
    }
}

impl PartialEq for Severity {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Severity {}

impl Hash for Severity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Severity {
    fn from(name: &str) -> Self {
        match name {
            "developer" => Self::Developer,
            "end user" => Self::EndUser,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for Severity {
    fn from(name: String) -> Self {
        match name.as_str() {
            "developer" => Self::Developer,
            "end user" => Self::EndUser,
            _ => Self::Custom(name),
        }
    }
}

impl Serialize for Severity {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// Describes how one key is being phased out.
///
/// A descriptor is either a removal (`old_key == new_key`) or a rename
/// (`new_key` is the replacement). Instances are immutable; build them with
/// [`dkey`], [`KeyDeprecation::removed`] or [`KeyDeprecation::renamed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyDeprecation<K> {
    old_key: K,
    new_key: K,
    message: String,
    severity: Severity,
}

impl<K> KeyDeprecation<K> {
    /// Start a descriptor for a key that is going away without replacement.
    pub fn removed(key: K) -> DeprecationBuilder<K> {
        DeprecationBuilder::new(vec![key])
    }

    /// Start a descriptor for a key that has been renamed to `new_key`.
    pub fn renamed(old_key: K, new_key: K) -> DeprecationBuilder<K> {
        DeprecationBuilder::new(vec![old_key, new_key])
    }

    /// The key that should no longer be used.
    pub fn old_key(&self) -> &K {
        &self.old_key
    }

    /// The key to use instead. Equal to [`old_key`](Self::old_key) for removals.
    pub fn new_key(&self) -> &K {
        &self.new_key
    }

    /// Fully composed warning text.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> &Severity {
        &self.severity
    }

    /// Check if this descriptor points the old key at a replacement.
    pub fn is_rename(&self) -> bool
    where
        K: PartialEq,
    {
        self.old_key != self.new_key
    }

    /// The notice emitted when the old key is touched.
    pub fn notice(&self) -> DeprecationNotice
    where
        K: fmt::Display,
    {
        DeprecationNotice::new(
            self.old_key.to_string(),
            self.message.clone(),
            self.severity.clone(),
        )
    }
}

/// Builder for [`KeyDeprecation`].
///
/// Collects one or two keys plus optional metadata. Arity is only checked
/// by [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct DeprecationBuilder<K> {
    keys: Vec<K>,
    deprecated_in: Option<String>,
    removed_in: Option<String>,
    details: Option<String>,
    severity: Severity,
}

/// Start building a deprecation from one key (removal) or two keys (rename).
///
/// ```
/// use dkey::dkey;
///
/// let deprecation = dkey(["colour", "color"]).deprecated_in("1.4").build().unwrap();
/// assert_eq!(
///     deprecation.message(),
///     "Key `colour` is deprecated since version 1.4. Use `color` from now on."
/// );
/// ```
pub fn dkey<K, I>(keys: I) -> DeprecationBuilder<K>
where
    I: IntoIterator<Item = K>,
{
    DeprecationBuilder::new(keys.into_iter().collect())
}

impl<K> DeprecationBuilder<K> {
    fn new(keys: Vec<K>) -> Self {
        Self {
            keys,
            deprecated_in: None,
            removed_in: None,
            details: None,
            severity: Severity::default(),
        }
    }

    /// Version the key was deprecated in.
    pub fn deprecated_in(mut self, version: impl Into<String>) -> Self {
        self.deprecated_in = Some(version.into());
        self
    }

    /// Version the key will stop working in.
    pub fn removed_in(mut self, version: impl Into<String>) -> Self {
        self.removed_in = Some(version.into());
        self
    }

    /// Replace the generated closing sentence with free text.
    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn severity(mut self, severity: impl Into<Severity>) -> Self {
        self.severity = severity.into();
        self
    }

    /// Validate the keys and compose the message.
    ///
    /// Fails with [`DkeyError::InvalidArity`] unless exactly one or two keys
    /// were given.
    pub fn build(self) -> Result<KeyDeprecation<K>>
    where
        K: Clone + fmt::Display,
    {
        let count = self.keys.len();
        let mut keys = self.keys.into_iter();
        let (old_key, new_key, replace) = match (keys.next(), keys.next(), keys.next()) {
            (Some(old_key), None, _) => (old_key.clone(), old_key, false),
            (Some(old_key), Some(new_key), None) => (old_key, new_key, true),
            _ => return Err(DkeyError::InvalidArity { count }),
        };

        let message = format_deprecation_message(
            &old_key,
            &new_key,
            replace,
            self.deprecated_in.as_deref(),
            self.removed_in.as_deref(),
            self.details.as_deref(),
        );

        Ok(KeyDeprecation {
            old_key,
            new_key,
            message,
            severity: self.severity,
        })
    }
}

fn format_deprecation_message<K: fmt::Display>(
    old_key: &K,
    new_key: &K,
    replace: bool,
    deprecated_in: Option<&str>,
    removed_in: Option<&str>,
    details: Option<&str>,
) -> String {
    let mut msg = format!("Key `{}` is deprecated", old_key);

    if let Some(version) = deprecated_in.filter(|v| !v.is_empty()) {
        msg.push_str(&format!(" since version {}", version));
    }
    msg.push('.');

    if let Some(version) = removed_in.filter(|v| !v.is_empty()) {
        msg.push_str(&format!(" It will be removed in version {}.", version));
    }

    msg.push(' ');
    match details {
        Some(details) => msg.push_str(details),
        None if replace => msg.push_str(&format!("Use `{}` from now on.", new_key)),
        None => msg.push_str("It shouldn't be used anymore."),
    }

    msg
}
