use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{EelError, EelResult};

/// Segment that allows every method at its level.
pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WhitelistEntry {
    Flag(bool),
    Nested(Whitelist),
}

/// Tree of allowed method names and property paths of a protected context.
///
/// In JSON form: `{"String": {"*": true}, "format": true}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Whitelist {
    entries: IndexMap<String, WhitelistEntry>,
}

impl Whitelist {
    pub fn new() -> Whitelist {
        Whitelist::default()
    }

    /// Allows every method at the top level.
    pub fn everything() -> Whitelist {
        Whitelist::new().with(WILDCARD)
    }

    pub fn from_json(value: serde_json::Value) -> EelResult<Whitelist> {
        serde_json::from_value(value).map_err(|err| EelError::Config(err.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, segment: &str) -> Option<&WhitelistEntry> {
        self.entries.get(segment)
    }

    pub fn with(mut self, path: &str) -> Whitelist {
        self.allow(path);
        self
    }

    /// Allows a dotted path such as `String.format`. Intermediate segments become nested
    /// trees, the last one becomes `true` unless it already holds a tree.
    pub fn allow(&mut self, path: &str) {
        let mut segments = path.split('.').peekable();
        let mut node = self;

        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                node.entries
                    .entry(segment.to_owned())
                    .and_modify(|e| {
                        if let WhitelistEntry::Flag(f) = e {
                            *f = true;
                        }
                    })
                    .or_insert(WhitelistEntry::Flag(true));
                return;
            }

            let entry = node
                .entries
                .entry(segment.to_owned())
                .or_insert_with(|| WhitelistEntry::Nested(Whitelist::new()));

            if let WhitelistEntry::Flag(_) = entry {
                *entry = WhitelistEntry::Nested(Whitelist::new());
            }

            node = match entry {
                WhitelistEntry::Nested(nested) => nested,
                WhitelistEntry::Flag(_) => return,
            };
        }
    }

    /// True if `method` may be called at this level, by name or through the wildcard.
    pub fn allows(&self, method: &str) -> bool {
        let allowed = |entry: Option<&WhitelistEntry>| {
            matches!(
                entry,
                Some(WhitelistEntry::Flag(true)) | Some(WhitelistEntry::Nested(_))
            )
        };

        allowed(self.entries.get(method)) || allowed(self.entries.get(WILDCARD))
    }

    /// Whitelist for the child reached through `segment`. Never wider than the nested tree
    /// defined for it, empty when there is none.
    pub fn narrow(&self, segment: &str) -> Whitelist {
        match self.entries.get(segment) {
            Some(WhitelistEntry::Nested(nested)) => nested.clone(),
            _ => Whitelist::new(),
        }
    }
}

impl TryFrom<serde_json::Value> for Whitelist {
    type Error = EelError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        Whitelist::from_json(value)
    }
}
