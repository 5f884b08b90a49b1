//! Two-level symbol table for the Jack compiler.
//!
//! A class-level table (STATIC/FIELD) persists across a whole class; a
//! subroutine-level table (ARG/VAR) is reset at the start of each
//! subroutine. Each level is a pair of kind-partitioned maps rather than
//! four lists scanned linearly, so `kind_of`/`type_of`/`index_of` are
//! O(1) instead of a scan over every symbol ever defined.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Static,
    Field,
    Arg,
    Var,
}

impl SymbolKind {
    /// The VM memory segment a variable of this kind lives in.
    #[must_use]
    pub fn segment(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Field => "this",
            Self::Arg => "argument",
            Self::Var => "local",
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    var_type: String,
    kind: SymbolKind,
    index: u16,
}

/// A single scope level (class or subroutine), holding one map per kind
/// partition.
#[derive(Debug, Default)]
struct Scope {
    by_name: HashMap<String, Entry>,
    counts: [u16; 2],
}

impl Scope {
    fn slot(kinds: (SymbolKind, SymbolKind), kind: SymbolKind) -> usize {
        usize::from(kind != kinds.0)
    }
}

/// Class-level symbol table: STATIC and FIELD variables.
#[derive(Debug, Default)]
pub struct ClassSymbolTable {
    scope: Scope,
}

/// Subroutine-level symbol table: ARG and VAR variables, reset per
/// subroutine.
#[derive(Debug, Default)]
pub struct SubroutineSymbolTable {
    scope: Scope,
}

/// Combines both scopes the way the compilation engine needs them:
/// subroutine-scope lookups shadow class-scope ones.
#[derive(Debug, Default)]
pub struct SymbolTable {
    class: ClassSymbolTable,
    subroutine: SubroutineSymbolTable,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the subroutine scope; the class scope is untouched.
    pub fn reset_subroutine_scope(&mut self) {
        self.subroutine = SubroutineSymbolTable::default();
    }

    /// Defines a new variable in the class or subroutine scope,
    /// depending on `kind`.
    pub fn define(&mut self, name: &str, var_type: &str, kind: SymbolKind) {
        let (kinds, scope) = match kind {
            SymbolKind::Static | SymbolKind::Field => {
                ((SymbolKind::Static, SymbolKind::Field), &mut self.class.scope)
            }
            SymbolKind::Arg | SymbolKind::Var => {
                ((SymbolKind::Arg, SymbolKind::Var), &mut self.subroutine.scope)
            }
        };
        let slot = Scope::slot(kinds, kind);
        let index = scope.counts[slot];
        scope.counts[slot] += 1;
        scope.by_name.insert(
            name.to_string(),
            Entry {
                var_type: var_type.to_string(),
                kind,
                index,
            },
        );
    }

    #[must_use]
    pub fn var_count(&self, kind: SymbolKind) -> u16 {
        match kind {
            SymbolKind::Static => self.class.scope.counts[0],
            SymbolKind::Field => self.class.scope.counts[1],
            SymbolKind::Arg => self.subroutine.scope.counts[0],
            SymbolKind::Var => self.subroutine.scope.counts[1],
        }
    }

    fn lookup(&self, name: &str) -> Option<&Entry> {
        self.subroutine
            .scope
            .by_name
            .get(name)
            .or_else(|| self.class.scope.by_name.get(name))
    }

    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<SymbolKind> {
        self.lookup(name).map(|e| e.kind)
    }

    #[must_use]
    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.lookup(name).map(|e| e.var_type.as_str())
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.lookup(name).map(|e| e.index)
    }
}
