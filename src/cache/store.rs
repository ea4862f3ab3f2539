//! Per-slot compiled-output store with generation-guarded writes.

use serde::{Deserialize, Serialize};

use super::fingerprint::ContentHash;
use crate::language::{EditorId, Language};

// ============================================================================
// EditorCache
// ============================================================================

/// A slot's content unit plus its last successful compiled output.
///
/// Entries are built fully and swapped in whole; a partially written entry
/// never exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorCache {
    #[serde(default = "default_language")]
    pub language: Language,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
    #[serde(default)]
    pub compiled: String,
    /// Set when the content has unsaved edits relative to a shared snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

impl Default for EditorCache {
    fn default() -> Self {
        Self {
            language: default_language(),
            content: String::new(),
            content_url: None,
            compiled: String::new(),
            modified: None,
        }
    }
}

fn default_language() -> Language {
    Language::from("html")
}

// ============================================================================
// CacheStore
// ============================================================================

#[derive(Debug, Clone)]
struct SlotEntry {
    cache: EditorCache,
    fingerprint: ContentHash,
    /// Generation that produced this entry; stale writes are rejected.
    generation: u64,
}

/// Content-addressed store of the last compiled output per slot, plus the
/// last assembled result.
#[derive(Debug, Default)]
pub struct CacheStore {
    slots: [Option<SlotEntry>; 3],
    /// Per-slot fingerprints at the last committed assembly.
    assembled: Option<[ContentHash; 3]>,
    result: String,
    style_only_update: bool,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache hit: the stored entry for `slot` whose fingerprint matches.
    pub fn get(&self, slot: EditorId, fingerprint: &ContentHash) -> Option<&EditorCache> {
        self.slots[slot.index()]
            .as_ref()
            .filter(|entry| entry.fingerprint == *fingerprint)
            .map(|entry| &entry.cache)
    }

    /// Store a freshly compiled entry. Returns false (and drops the entry)
    /// when `generation` is older than the one already stored — a stale
    /// in-flight result must not overwrite a newer one.
    pub fn set(
        &mut self,
        slot: EditorId,
        generation: u64,
        fingerprint: ContentHash,
        cache: EditorCache,
    ) -> bool {
        let current = &mut self.slots[slot.index()];
        if let Some(existing) = current
            && generation < existing.generation
        {
            crate::debug!("cache"; "discarding stale {slot} result (gen {generation} < {})",
                existing.generation);
            return false;
        }
        *current = Some(SlotEntry {
            cache,
            fingerprint,
            generation,
        });
        true
    }

    /// Drop a slot's entry (language or content changed out from under it).
    pub fn invalidate(&mut self, slot: EditorId) {
        self.slots[slot.index()] = None;
    }

    /// The last successfully compiled entry for a slot, fingerprint match or
    /// not. Assembly uses this so a hung or failed compile never blanks the
    /// preview.
    pub fn last_good(&self, slot: EditorId) -> Option<&EditorCache> {
        self.slots[slot.index()].as_ref().map(|entry| &entry.cache)
    }

    /// Record a committed assembly and compute the style-only flag: true iff
    /// a previous assembly exists and the style slot is the only one whose
    /// fingerprint changed since.
    pub fn commit_assembly(&mut self, result: String) {
        let current = [
            self.slot_fingerprint(EditorId::Markup),
            self.slot_fingerprint(EditorId::Style),
            self.slot_fingerprint(EditorId::Script),
        ];
        self.style_only_update = match &self.assembled {
            Some(previous) => {
                previous[EditorId::Markup.index()] == current[EditorId::Markup.index()]
                    && previous[EditorId::Script.index()] == current[EditorId::Script.index()]
                    && previous[EditorId::Style.index()] != current[EditorId::Style.index()]
            }
            None => false,
        };
        self.assembled = Some(current);
        self.result = result;
    }

    pub fn result(&self) -> &str {
        &self.result
    }

    pub fn style_only_update(&self) -> bool {
        self.style_only_update
    }

    /// Restore a slot from a deserialized snapshot.
    pub fn restore_slot(&mut self, slot: EditorId, cache: EditorCache, fingerprint: ContentHash) {
        self.slots[slot.index()] = Some(SlotEntry {
            cache,
            fingerprint,
            generation: 0,
        });
    }

    pub(super) fn restore_result(&mut self, result: String, style_only_update: bool) {
        let current = [
            self.slot_fingerprint(EditorId::Markup),
            self.slot_fingerprint(EditorId::Style),
            self.slot_fingerprint(EditorId::Script),
        ];
        self.assembled = Some(current);
        self.result = result;
        self.style_only_update = style_only_update;
    }

    fn slot_fingerprint(&self, slot: EditorId) -> ContentHash {
        self.slots[slot.index()]
            .as_ref()
            .map_or_else(ContentHash::empty, |entry| entry.fingerprint)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(byte: u8) -> ContentHash {
        ContentHash::new([byte; 32])
    }

    fn entry(compiled: &str) -> EditorCache {
        EditorCache {
            language: Language::from("css"),
            content: compiled.to_string(),
            compiled: compiled.to_string(),
            ..EditorCache::default()
        }
    }

    #[test]
    fn get_requires_matching_fingerprint() {
        let mut store = CacheStore::new();
        store.set(EditorId::Style, 1, hash(1), entry("a{}"));

        assert!(store.get(EditorId::Style, &hash(1)).is_some());
        assert!(store.get(EditorId::Style, &hash(2)).is_none());
        assert!(store.get(EditorId::Markup, &hash(1)).is_none());
    }

    #[test]
    fn stale_generation_does_not_overwrite() {
        let mut store = CacheStore::new();
        assert!(store.set(EditorId::Script, 5, hash(5), entry("new")));
        // A compile started at generation 4 resolves late
        assert!(!store.set(EditorId::Script, 4, hash(4), entry("old")));

        let kept = store.last_good(EditorId::Script).unwrap();
        assert_eq!(kept.compiled, "new");
    }

    #[test]
    fn equal_generation_overwrites() {
        let mut store = CacheStore::new();
        assert!(store.set(EditorId::Script, 3, hash(1), entry("first")));
        assert!(store.set(EditorId::Script, 3, hash(2), entry("second")));
        assert_eq!(store.last_good(EditorId::Script).unwrap().compiled, "second");
    }

    #[test]
    fn invalidate_drops_entry() {
        let mut store = CacheStore::new();
        store.set(EditorId::Markup, 1, hash(1), entry("<p>"));
        store.invalidate(EditorId::Markup);
        assert!(store.last_good(EditorId::Markup).is_none());
    }

    #[test]
    fn first_assembly_is_never_style_only() {
        let mut store = CacheStore::new();
        store.set(EditorId::Style, 1, hash(1), entry("a{}"));
        store.commit_assembly("<html/>".into());
        assert!(!store.style_only_update());
    }

    #[test]
    fn style_only_change_sets_flag() {
        let mut store = CacheStore::new();
        store.set(EditorId::Markup, 1, hash(10), entry("<p>"));
        store.set(EditorId::Style, 1, hash(20), entry("a{}"));
        store.set(EditorId::Script, 1, hash(30), entry(";"));
        store.commit_assembly("v1".into());

        store.set(EditorId::Style, 2, hash(21), entry("b{}"));
        store.commit_assembly("v2".into());
        assert!(store.style_only_update());

        // A markup change on the next cycle clears it
        store.set(EditorId::Markup, 2, hash(11), entry("<q>"));
        store.commit_assembly("v3".into());
        assert!(!store.style_only_update());
    }
}
