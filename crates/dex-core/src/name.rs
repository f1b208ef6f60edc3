//! Unique names and the fresh-name supply.

use std::collections::HashMap;

/// A possibly-renamed identifier.
///
/// Names written in source carry id `0`; the front end rejects `.` inside
/// identifiers, so a renamed `x.3` can never collide with source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name {
    stem: String,
    id: u32,
}

impl Name {
    pub fn source(stem: impl Into<String>) -> Name {
        Name {
            stem: stem.into(),
            id: 0,
        }
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn is_source(&self) -> bool {
        self.id == 0
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.id == 0 {
            write!(f, "{}", self.stem)
        } else {
            write!(f, "{}.{}", self.stem, self.id)
        }
    }
}

/// Monotonic per-stem source of names unique within one pure-pass run.
///
/// A scope is owned by the pass that receives it; the pipeline hands each
/// pass a fresh seed rather than threading a shared supply across stages.
/// A pass whose input may already contain renamed or introduced names must
/// `reserve` every name it sees before requesting fresh ones, so that its
/// fresh names cannot alias anything that survives from an earlier pass
/// or an earlier block.
#[derive(Debug, Clone, Default)]
pub struct FreshScope {
    next: HashMap<String, u32>,
}

impl FreshScope {
    pub fn new() -> FreshScope {
        FreshScope::default()
    }

    /// Mark `name` as taken: later `fresh` calls with its stem skip it.
    pub fn reserve(&mut self, name: &Name) {
        let next = self.next.entry(name.stem.clone()).or_insert(1);
        *next = (*next).max(name.id + 1);
    }

    pub fn fresh(&mut self, stem: &str) -> Name {
        let next = self.next.entry(stem.to_string()).or_insert(1);
        let id = *next;
        *next += 1;
        Name {
            stem: stem.to_string(),
            id,
        }
    }

    /// A variant of `fresh` reusing an existing name's stem.
    pub fn rename(&mut self, name: &Name) -> Name {
        self.fresh(name.stem())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_names_are_distinct() {
        let mut scope = FreshScope::new();
        let a = scope.fresh("x");
        let b = scope.fresh("x");
        assert_ne!(a, b);
        assert_ne!(a, Name::source("x"));
    }

    #[test]
    fn display_hides_zero_id() {
        let mut scope = FreshScope::new();
        assert_eq!(Name::source("x").to_string(), "x");
        assert_eq!(scope.fresh("x").to_string(), "x.1");
    }

    #[test]
    fn reserved_names_are_never_reissued() {
        let mut earlier = FreshScope::new();
        let taken = earlier.fresh("tmp");
        let mut scope = FreshScope::new();
        scope.reserve(&taken);
        scope.reserve(&Name::source("tmp"));
        assert_eq!(scope.fresh("tmp").to_string(), "tmp.2");
    }
}
