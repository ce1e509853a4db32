//! Temporary-identifier allocation for one compile session.
//!
//! Each semantic kind gets its own monotone counter, so no two temporaries
//! spliced into a single generated function body can collide, and the reader
//! can still tell a dict cursor from a loop count at a glance. Counters are
//! never reused within a session; a fresh session starts from zero.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempKind {
    /// Container cursors for dict/array blocks (`d0`, `d1`, ...).
    Dict,
    /// Scalar/value slots (`v0`, ...).
    Value,
    /// Map keys (`k0`, ...).
    Key,
    /// Union/enum tags (`tag0`, ...).
    TypeTag,
    /// Loop and block counts (`n0`, ...).
    Index,
}

impl TempKind {
    fn prefix(self) -> &'static str {
        match self {
            TempKind::Dict => "d",
            TempKind::Value => "v",
            TempKind::Key => "k",
            TempKind::TypeTag => "tag",
            TempKind::Index => "n",
        }
    }

    fn slot(self) -> usize {
        match self {
            TempKind::Dict => 0,
            TempKind::Value => 1,
            TempKind::Key => 2,
            TempKind::TypeTag => 3,
            TempKind::Index => 4,
        }
    }
}

#[derive(Debug, Default)]
pub struct NameAllocator {
    counters: [u32; 5],
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, kind: TempKind) -> String {
        let n = self.counters[kind.slot()];
        self.counters[kind.slot()] += 1;
        format!("{}{}", kind.prefix(), n)
    }
}
