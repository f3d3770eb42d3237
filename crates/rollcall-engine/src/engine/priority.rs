//! Reaction priority resolution.
//!
//! Each reaction kind (an emoji name) maps to a colour and a priority; the
//! lowest priority number wins. When a user holds several reactions on a roll
//! call, the effective colour is recomputed from the full set of reactions they
//! still hold. Nothing here caches per-user state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::colour::FALLBACK_COLOUR;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown reaction kind `{0}`")]
pub struct UnknownReactionKind(pub String);

/// Colour and precedence for one reaction kind. Lower priority wins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionColour {
    pub colour: String,
    pub priority: i64,
}

impl ReactionColour {
    pub fn new(colour: impl Into<String>, priority: i64) -> Self {
        ReactionColour {
            colour: colour.into(),
            priority,
        }
    }
}

/// Reaction kind -> colour/priority table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriorityTable(BTreeMap<String, ReactionColour>);

impl PriorityTable {
    pub fn new() -> Self {
        PriorityTable(BTreeMap::new())
    }

    pub fn insert(&mut self, kind: impl Into<String>, entry: ReactionColour) -> Option<ReactionColour> {
        self.0.insert(kind.into(), entry)
    }

    pub fn get(&self, kind: &str) -> Option<&ReactionColour> {
        self.0.get(kind)
    }

    pub fn lookup(&self, kind: &str) -> Result<&ReactionColour, UnknownReactionKind> {
        self.0
            .get(kind)
            .ok_or_else(|| UnknownReactionKind(kind.to_string()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ReactionColour)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entries ordered by priority, then by kind for equal priorities.
    pub fn by_priority(&self) -> Vec<(&str, &ReactionColour)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| a.1.priority.cmp(&b.1.priority).then(a.0.cmp(b.0)));
        entries
    }
}

impl Default for PriorityTable {
    /// ✅ green, ❔ yellow, ❌ red.
    fn default() -> Self {
        let mut table = PriorityTable::new();
        table.insert("✅", ReactionColour::new("00ff00", 1));
        table.insert("❔", ReactionColour::new("ffff00", 2));
        table.insert("❌", ReactionColour::new("ff0000", 3));
        table
    }
}

impl FromIterator<(String, ReactionColour)> for PriorityTable {
    fn from_iter<T: IntoIterator<Item = (String, ReactionColour)>>(iter: T) -> Self {
        PriorityTable(iter.into_iter().collect())
    }
}

/// Result of [`resolve_effective_colour`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EffectiveColour<'a> {
    /// The winning reaction kind, `None` when the fallback applies.
    pub kind: Option<&'a str>,
    pub colour: &'a str,
}

impl EffectiveColour<'_> {
    pub fn is_fallback(&self) -> bool {
        self.kind.is_none()
    }
}

/// Pick the colour for a user holding `active` reactions (in message order).
///
/// Unknown kinds are logged and skipped. Equal priorities resolve to the
/// first one seen. With nothing recognised the result is [`FALLBACK_COLOUR`].
pub fn resolve_effective_colour<'a, I, S>(active: I, table: &'a PriorityTable) -> EffectiveColour<'a>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut best: Option<(&'a str, &'a ReactionColour)> = None;

    for kind in active {
        let kind = kind.as_ref();
        let Some((key, entry)) = table.0.get_key_value(kind) else {
            tracing::warn!(kind, "unknown reaction kind, ignoring");
            continue;
        };
        if best.is_none_or(|(_, current)| entry.priority < current.priority) {
            best = Some((key.as_str(), entry));
        }
    }

    match best {
        Some((kind, entry)) => EffectiveColour {
            kind: Some(kind),
            colour: &entry.colour,
        },
        None => EffectiveColour {
            kind: None,
            colour: FALLBACK_COLOUR,
        },
    }
}
