//! Identifier bookkeeping for the Jack compiler
//!
//! Two scopes: class (static/field, reset per class) and subroutine
//! (arg/var, reset per subroutine). Lookup consults the subroutine scope
//! first; a miss in both scopes means the name is a class name, not an
//! undefined variable.

use std::collections::HashMap;

use crate::vm_writer::Segment;

/// What a defined identifier is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Static,
    Field,
    Arg,
    Var,
}

impl Kind {
    /// The VM segment holding identifiers of this kind.
    pub fn segment(self) -> Segment {
        match self {
            Kind::Static => Segment::Static,
            Kind::Field => Segment::This,
            Kind::Arg => Segment::Argument,
            Kind::Var => Segment::Local,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SymbolRecord {
    pub kind: Kind,
    pub type_name: String,
    pub index: u16,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    class_scope: HashMap<String, SymbolRecord>,
    subroutine_scope: HashMap<String, SymbolRecord>,
    static_count: u16,
    field_count: u16,
    arg_count: u16,
    var_count: u16,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Clears the subroutine scope and its counters.
    pub fn start_subroutine(&mut self) {
        self.subroutine_scope.clear();
        self.arg_count = 0;
        self.var_count = 0;
    }

    /// Defines a new identifier and assigns it the next running index for
    /// its kind. Returns `None` when the name is already defined in the
    /// target scope.
    pub fn define(&mut self, name: &str, type_name: &str, kind: Kind) -> Option<u16> {
        let counter = match kind {
            Kind::Static => &mut self.static_count,
            Kind::Field => &mut self.field_count,
            Kind::Arg => &mut self.arg_count,
            Kind::Var => &mut self.var_count,
        };
        let index = *counter;

        let scope = match kind {
            Kind::Static | Kind::Field => &mut self.class_scope,
            Kind::Arg | Kind::Var => &mut self.subroutine_scope,
        };
        if scope.contains_key(name) {
            return None;
        }

        scope.insert(
            name.to_string(),
            SymbolRecord {
                kind,
                type_name: type_name.to_string(),
                index,
            },
        );
        *counter += 1;
        Some(index)
    }

    /// Number of identifiers of `kind` defined so far in its scope.
    pub fn var_count(&self, kind: Kind) -> u16 {
        match kind {
            Kind::Static => self.static_count,
            Kind::Field => self.field_count,
            Kind::Arg => self.arg_count,
            Kind::Var => self.var_count,
        }
    }

    /// Looks a name up, subroutine scope first. `None` means the name is
    /// not a variable (so in call position it is a class name).
    pub fn lookup(&self, name: &str) -> Option<&SymbolRecord> {
        self.subroutine_scope
            .get(name)
            .or_else(|| self.class_scope.get(name))
    }

    pub fn kind_of(&self, name: &str) -> Option<Kind> {
        self.lookup(name).map(|record| record.kind)
    }

    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.lookup(name).map(|record| record.type_name.as_str())
    }

    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.lookup(name).map(|record| record.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_run_per_kind() {
        let mut table = SymbolTable::new();
        assert_eq!(table.define("a", "int", Kind::Field), Some(0));
        assert_eq!(table.define("b", "int", Kind::Field), Some(1));
        assert_eq!(table.define("c", "int", Kind::Static), Some(0));
        assert_eq!(table.define("x", "int", Kind::Arg), Some(0));
        assert_eq!(table.define("y", "int", Kind::Var), Some(0));
        assert_eq!(table.define("z", "int", Kind::Var), Some(1));

        assert_eq!(table.var_count(Kind::Field), 2);
        assert_eq!(table.var_count(Kind::Static), 1);
        assert_eq!(table.var_count(Kind::Arg), 1);
        assert_eq!(table.var_count(Kind::Var), 2);
    }

    #[test]
    fn subroutine_scope_shadows_class_scope() {
        let mut table = SymbolTable::new();
        table.define("value", "int", Kind::Field);
        table.define("value", "boolean", Kind::Var);

        let record = table.lookup("value").unwrap();
        assert_eq!(record.kind, Kind::Var);
        assert_eq!(record.type_name, "boolean");

        table.start_subroutine();
        let record = table.lookup("value").unwrap();
        assert_eq!(record.kind, Kind::Field);
    }

    #[test]
    fn start_subroutine_resets_arg_and_var_only() {
        let mut table = SymbolTable::new();
        table.define("f", "int", Kind::Field);
        table.define("a", "int", Kind::Arg);
        table.define("v", "int", Kind::Var);

        table.start_subroutine();
        assert_eq!(table.var_count(Kind::Arg), 0);
        assert_eq!(table.var_count(Kind::Var), 0);
        assert_eq!(table.var_count(Kind::Field), 1);
        assert!(table.lookup("a").is_none());
        assert!(table.lookup("f").is_some());
    }

    #[test]
    fn duplicates_are_rejected_per_scope() {
        let mut table = SymbolTable::new();
        assert!(table.define("x", "int", Kind::Var).is_some());
        assert!(table.define("x", "int", Kind::Var).is_none());
        assert!(table.define("x", "char", Kind::Arg).is_none()); // same scope
        assert!(table.define("x", "int", Kind::Field).is_some()); // other scope
    }

    #[test]
    fn lookup_miss_means_class_name() {
        let table = SymbolTable::new();
        assert!(table.lookup("Math").is_none());
        assert!(table.kind_of("Math").is_none());
        assert!(table.type_of("Math").is_none());
        assert!(table.index_of("Math").is_none());
    }

    #[test]
    fn kind_maps_to_segment() {
        assert_eq!(Kind::Static.segment(), Segment::Static);
        assert_eq!(Kind::Field.segment(), Segment::This);
        assert_eq!(Kind::Arg.segment(), Segment::Argument);
        assert_eq!(Kind::Var.segment(), Segment::Local);
    }
}
