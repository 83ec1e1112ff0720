use crate::scene::SceneSnapshot;

/// Linear undo/redo history of whole-scene snapshots.
///
/// The history is a sequence of snapshots plus a cursor pointing at the
/// snapshot that matches the live scene. Pushing while the cursor is not at
/// the tail discards everything after the cursor, so the history never
/// branches. When the configured limit is exceeded the oldest snapshot is
/// dropped and the cursor follows.
#[derive(Debug, Clone)]
pub struct SnapshotHistory {
    entries: Vec<SceneSnapshot>,
    cursor: usize,
    limit: usize,
}

impl SnapshotHistory {
    /// Creates an empty history keeping at most `limit` snapshots
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            limit: limit.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the snapshot matching the live scene, `None` while empty
    pub fn cursor(&self) -> Option<usize> {
        (!self.entries.is_empty()).then_some(self.cursor)
    }

    pub fn entries(&self) -> &[SceneSnapshot] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&SceneSnapshot> {
        self.entries.get(index)
    }

    pub fn current(&self) -> Option<&SceneSnapshot> {
        self.cursor().and_then(|cursor| self.entries.get(cursor))
    }

    /// Appends a snapshot after the cursor, dropping the redo branch
    pub fn push(&mut self, snapshot: SceneSnapshot) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(snapshot);
        if self.entries.len() > self.limit {
            let overflow = self.entries.len() - self.limit;
            self.entries.drain(..overflow);
        }
        self.cursor = self.entries.len() - 1;
        log::debug!("History saved: {} entries, cursor {}", self.entries.len(), self.cursor);
    }

    /// Index undo would restore
    pub fn previous(&self) -> Option<usize> {
        self.cursor().filter(|cursor| *cursor > 0).map(|cursor| cursor - 1)
    }

    /// Index redo would restore
    pub fn next(&self) -> Option<usize> {
        self.cursor()
            .filter(|cursor| cursor + 1 < self.entries.len())
            .map(|cursor| cursor + 1)
    }

    pub fn can_undo(&self) -> bool {
        self.previous().is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.next().is_some()
    }

    /// Moves the cursor. Out-of-range indices are ignored.
    pub fn set_cursor(&mut self, index: usize) {
        if index < self.entries.len() {
            self.cursor = index;
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}
