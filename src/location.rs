//! Value locations during code generation.
//!
//! A `Location` is a rooted path of named accessors identifying where, inside
//! the in-memory value, the data for the schema node currently being compiled
//! lives. Path construction is kept separate from its textual rendering, so
//! the synthesizer never concatenates `value["a"]["b"]` strings by hand.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    root: String,
    path: Vec<String>,
}

impl Location {
    /// A bare root identifier (a function parameter or a loop-local).
    pub fn root(name: impl Into<String>) -> Location {
        Location { root: name.into(), path: Vec::new() }
    }

    /// Extend the path with a record-field accessor.
    pub fn field(&self, name: &str) -> Location {
        let mut path = self.path.clone();
        path.push(name.to_string());
        Location { root: self.root.clone(), path }
    }

    /// Render as a borrowed expression, for passing to the primitive
    /// writers (`&Value`). A bare root is assumed to already be a reference.
    pub fn render_ref(&self) -> String {
        if self.path.is_empty() {
            self.root.clone()
        } else {
            format!("&{}", self.render_place())
        }
    }

    /// Render as an assignable place expression, for the read path.
    pub fn render_place(&self) -> String {
        let mut out = self.root.clone();
        for seg in &self.path {
            out.push_str(&format!("[{seg:?}]"));
        }
        out
    }
}
