//! Interned string identifiers.
//!
//! Two flavors are provided: [`Name`], which hashes a case-folded copy of the
//! text (so `Name::new("Rock")` and `Name::new("rock")` compare equal), and
//! [`StringId`], which hashes the text as given. Both round-trip to their
//! original text through a process-wide registry; value `0` is reserved to
//! mean "no name" and is never produced by a successful [`Name::new`]/
//! [`StringId::new`] call.

use std::fmt;
use std::hash::{Hash, Hasher};

use dashmap::DashMap;
use once_cell::sync::Lazy;

/// The process-wide `hash -> original text` table shared by [`Name`] and
/// [`StringId`].
///
/// A single table is fine for both: the two types hash different
/// projections of the input (case-folded vs. verbatim), so their hash spaces
/// don't collide in practice, and neither type's `Display` needs to know
/// which of the two created the entry.
static INTERN_TABLE: Lazy<DashMap<u64, Box<str>>> = Lazy::new(DashMap::new);

fn fnv1a(bytes: &[u8]) -> u64 {
    // FNV-1a. Deterministic across process restarts, unlike `RandomState`,
    // which matters because these hashes are meant to be stable identifiers.
    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Error returned when interning a string would collide with a different
/// string already registered under the same hash.
///
/// This is vanishingly unlikely with a 64-bit hash, but the contract in
/// spec §3 is explicit that such a collision must abort creation rather than
/// silently alias the two strings.
#[derive(Debug, Clone, thiserror::Error)]
#[error("hash collision interning {new:?}: hash already belongs to {existing:?}")]
pub struct InternCollision {
    /// The string that could not be interned.
    pub new: String,
    /// The string already occupying that hash.
    pub existing: String,
}

fn intern(hash: u64, text: &str) -> Result<(), InternCollision> {
    if hash == 0 {
        // Only reachable if FNV-1a of some input is literally zero; treat it
        // the same as any other collision against the reserved "empty" slot.
        return Err(InternCollision {
            new: text.to_owned(),
            existing: String::new(),
        });
    }
    match INTERN_TABLE.entry(hash) {
        dashmap::mapref::entry::Entry::Occupied(existing) => {
            if existing.get().as_ref() != text {
                return Err(InternCollision {
                    new: text.to_owned(),
                    existing: existing.get().to_string(),
                });
            }
            Ok(())
        }
        dashmap::mapref::entry::Entry::Vacant(slot) => {
            slot.insert(text.into());
            Ok(())
        }
    }
}

/// Look up the original text for any hash created by [`Name::new`] or
/// [`StringId::new`].
fn resolve(hash: u64) -> Option<String> {
    if hash == 0 {
        return None;
    }
    INTERN_TABLE.get(&hash).map(|s| s.to_string())
}

/// A case-insensitive interned string: `Name::new("Rock")` and
/// `Name::new("ROCK")` produce the same value. Used for asset and package
/// names throughout the pipeline.
#[derive(Clone, Copy, Eq, PartialOrd, Ord, Default)]
pub struct Name(u64);

impl Name {
    /// The empty name, equal to the zero hash.
    pub const NONE: Name = Name(0);

    /// Intern `text`, case-folded, returning its stable hash.
    ///
    /// # Panics
    ///
    /// Panics on a genuine hash collision with different original text
    /// (registered case-folded) under the same hash; see spec §3 — creation
    /// must abort, and a 64-bit hash collision is exceptional enough that an
    /// unrecoverable panic, rather than a `Result` every caller must plumb
    /// through, matches how `bname_create` treats it in the original engine.
    pub fn new(text: &str) -> Self {
        if text.is_empty() {
            return Self::NONE;
        }
        let folded = text.to_lowercase();
        let hash = fnv1a(folded.as_bytes());
        intern(hash, &folded).unwrap_or_else(|e| panic!("{e}"));
        Name(hash)
    }

    /// The raw 64-bit hash.
    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Whether this is the empty/"no name" value.
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Recover the case-folded text this name was created from.
    pub fn text(self) -> Option<String> {
        resolve(self.0)
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}
impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text() {
            Some(t) => write!(f, "Name({t:?})"),
            None => write!(f, "Name(<none>)"),
        }
    }
}
impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text().unwrap_or_default())
    }
}
impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Name::new(s)
    }
}
impl From<String> for Name {
    fn from(s: String) -> Self {
        Name::new(&s)
    }
}

/// A case-sensitive interned string, used where exact casing is part of
/// identity (e.g. tag literals read back from a BSON file verbatim).
#[derive(Clone, Copy, Eq, PartialOrd, Ord, Default)]
pub struct StringId(u64);

impl StringId {
    /// The empty string-id, equal to the zero hash.
    pub const NONE: StringId = StringId(0);

    /// Intern `text` verbatim, returning its stable hash.
    ///
    /// # Panics
    ///
    /// See [`Name::new`]: a genuine collision against different text panics.
    pub fn new(text: &str) -> Self {
        if text.is_empty() {
            return Self::NONE;
        }
        let hash = fnv1a(text.as_bytes());
        intern(hash, text).unwrap_or_else(|e| panic!("{e}"));
        StringId(hash)
    }

    /// The raw 64-bit hash.
    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Whether this is the empty value.
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Recover the exact text this string-id was created from.
    pub fn text(self) -> Option<String> {
        resolve(self.0)
    }
}

impl PartialEq for StringId {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Hash for StringId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}
impl fmt::Debug for StringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text() {
            Some(t) => write!(f, "StringId({t:?})"),
            None => write!(f, "StringId(<none>)"),
        }
    }
}
impl fmt::Display for StringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text().unwrap_or_default())
    }
}
impl From<&str> for StringId {
    fn from(s: &str) -> Self {
        StringId::new(s)
    }
}

/// Split a fully-qualified `"Package.Type.Name"` asset reference into its
/// three parts.
///
/// Grounded on `basset_util_parse_name` in the original engine
/// (`bismuth.core/src/assets/basset_utils.c`), which has a bug: it writes the
/// loop index (`c + i`) into the part buffer instead of the actual character
/// bytes. This implementation writes the real bytes, per spec §9.
///
/// Only the first two `.` characters are treated as separators; any further
/// `.` in the name portion is kept verbatim, so `"Pkg.Type.a.b"` yields
/// `("Pkg", "Type", "a.b")`.
pub fn parse_fully_qualified_name(text: &str) -> Option<(String, String, String)> {
    if text.is_empty() {
        return None;
    }
    let mut parts: [String; 3] = Default::default();
    let mut part_index = 0usize;
    for ch in text.chars() {
        if part_index < 2 && ch == '.' {
            part_index += 1;
            continue;
        }
        parts[part_index].push(ch);
    }
    let [package, ty, name] = parts;
    Some((package, ty, name))
}
