/*!
Nested symbol tables for the whole program.

Scopes and entries both live in arenas owned by [`ScopeTree`] and refer to
each other by index, so relocating an `impl` table into its struct is an
index rewrite rather than a memory move. A scope keeps its entries in
insertion order; that order is load-bearing (it is source order, which the
layout pass turns into frame offsets and the checker uses to walk overload
sets and inherit lists deterministically).

Name lookup is case-insensitive; kind matching is exact. Lookups never
descend into function bodies from outside.
*/

use std::fmt;

use crate::compiler::semantics::types::SemType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Struct,
    Func,
    Impl,
    Var,
    Param,
    TempVar,
    Inherit,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Struct => f.write_str("struct"),
            EntryKind::Func => f.write_str("func"),
            EntryKind::Impl => f.write_str("impl"),
            EntryKind::Var => f.write_str("var"),
            EntryKind::Param => f.write_str("param"),
            EntryKind::TempVar => f.write_str("tempvar"),
            EntryKind::Inherit => f.write_str("inherit"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => f.write_str("public"),
            Visibility::Private => f.write_str("private"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Struct,
    Function,
    Impl,
}

#[derive(Debug)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
    pub ty: SemType,
    pub link: Option<ScopeId>,
    pub visibility: Option<Visibility>,
    pub size: i32,
    pub offset: i32,
}

impl Entry {
    pub fn new(name: &str, kind: EntryKind, ty: SemType, link: Option<ScopeId>) -> Entry {
        Entry {
            name: name.to_string(),
            kind,
            ty,
            link,
            visibility: None,
            size: 0,
            offset: 0,
        }
    }
}

#[derive(Debug)]
pub struct Scope {
    pub name: String,
    pub kind: ScopeKind,
    pub level: u32,
    pub upper: Option<ScopeId>,
    pub entries: Vec<EntryId>,
    pub size: i32,
    pub offset: i32,
}

#[derive(Debug, Default)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    entries: Vec<Entry>,
}

impl ScopeTree {
    pub fn new() -> ScopeTree {
        ScopeTree {
            scopes: Vec::new(),
            entries: Vec::new(),
        }
    }

    pub fn add_scope(&mut self, name: &str, kind: ScopeKind, upper: Option<ScopeId>) -> ScopeId {
        let level = upper.map(|u| self.scope(u).level + 1).unwrap_or(0);
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            name: name.to_string(),
            kind,
            level,
            upper,
            entries: Vec::new(),
            size: 0,
            offset: 0,
        });
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0]
    }

    pub fn entry(&self, id: EntryId) -> &Entry {
        &self.entries[id.0]
    }

    pub fn entry_mut(&mut self, id: EntryId) -> &mut Entry {
        &mut self.entries[id.0]
    }

    /// Append `entry` to `scope` in source order.
    pub fn insert(&mut self, scope: ScopeId, entry: Entry) -> EntryId {
        let id = EntryId(self.entries.len());
        self.entries.push(entry);
        self.scopes[scope.0].entries.push(id);
        id
    }

    /// Detach an entry from a scope without destroying it. Used only when
    /// relocating an `impl` table into its struct.
    pub fn remove(&mut self, scope: ScopeId, entry: EntryId) {
        self.scopes[scope.0].entries.retain(|e| *e != entry);
    }

    /// Re-attach a detached entry at the end of another scope.
    pub fn append(&mut self, scope: ScopeId, entry: EntryId) {
        self.scopes[scope.0].entries.push(entry);
    }

    pub fn lookup(&self, scope: ScopeId, name: &str, kind: EntryKind) -> Option<EntryId> {
        self.scopes[scope.0]
            .entries
            .iter()
            .copied()
            .find(|id| {
                let e = self.entry(*id);
                e.kind == kind && e.name.eq_ignore_ascii_case(name)
            })
    }

    pub fn lookup_all(&self, scope: ScopeId, name: &str, kind: EntryKind) -> Vec<EntryId> {
        self.scopes[scope.0]
            .entries
            .iter()
            .copied()
            .filter(|id| {
                let e = self.entry(*id);
                e.kind == kind && e.name.eq_ignore_ascii_case(name)
            })
            .collect()
    }

    pub fn lookup_all_of_kind(&self, scope: ScopeId, kind: EntryKind) -> Vec<EntryId> {
        self.scopes[scope.0]
            .entries
            .iter()
            .copied()
            .filter(|id| self.entry(*id).kind == kind)
            .collect()
    }

    pub fn lookup_names_of_kind(&self, scope: ScopeId, kind: EntryKind) -> Vec<String> {
        self.lookup_all_of_kind(scope, kind)
            .into_iter()
            .map(|id| self.entry(id).name.clone())
            .collect()
    }

    pub fn global_of(&self, scope: ScopeId) -> ScopeId {
        let mut cursor = scope;
        while let Some(upper) = self.scope(cursor).upper {
            cursor = upper;
        }
        cursor
    }

    /// The struct a method's scope belongs to, if any. Covers both scopes
    /// created directly under a struct (declared member functions) and
    /// scopes living inside a relocated `impl` table.
    pub fn owning_struct(&self, scope: ScopeId) -> Option<ScopeId> {
        let mut cursor = self.scope(scope).upper;
        while let Some(up) = cursor {
            match self.scope(up).kind {
                ScopeKind::Struct => return Some(up),
                ScopeKind::Impl => cursor = self.scope(up).upper,
                _ => return None,
            }
        }
        None
    }

    /// Ordered search for an r-value name used inside a function body:
    /// locals, then parameters, then (for methods) the owning struct's
    /// members and each inherited struct in declaration order.
    pub fn resolve_var_in_function_scope(&self, scope: ScopeId, name: &str) -> Option<EntryId> {
        if let Some(found) = self.lookup(scope, name, EntryKind::Var) {
            return Some(found);
        }
        if let Some(found) = self.lookup(scope, name, EntryKind::Param) {
            return Some(found);
        }
        if let Some(owner) = self.owning_struct(scope) {
            return self.resolve_member_in_struct(owner, name);
        }
        None
    }

    /// Member lookup: this struct's variables first, then the inherited
    /// structs breadth-first in declaration order, so a direct parent always
    /// wins over a grandparent.
    pub fn resolve_member_in_struct(&self, scope: ScopeId, name: &str) -> Option<EntryId> {
        let mut queue = vec![scope];
        let mut seen = vec![scope];
        let mut at = 0;
        while at < queue.len() {
            let current = queue[at];
            at += 1;
            if let Some(found) = self.lookup(current, name, EntryKind::Var) {
                return Some(found);
            }
            for parent in self.inherited_scopes(current) {
                if !seen.contains(&parent) {
                    seen.push(parent);
                    queue.push(parent);
                }
            }
        }
        None
    }

    /// Every `func` entry visible on a struct under the given name: its own
    /// declarations first, then inherited ones, breadth-first in declaration
    /// order.
    pub fn resolve_funcs_in_struct(&self, scope: ScopeId, name: &str) -> Vec<EntryId> {
        let mut queue = vec![scope];
        let mut seen = vec![scope];
        let mut found = Vec::new();
        let mut at = 0;
        while at < queue.len() {
            let current = queue[at];
            at += 1;
            found.extend(self.lookup_all(current, name, EntryKind::Func));
            for parent in self.inherited_scopes(current) {
                if !seen.contains(&parent) {
                    seen.push(parent);
                    queue.push(parent);
                }
            }
        }
        found
    }

    /// Scopes of the structs named by this struct's inherit entries, in
    /// declaration order. Unknown parents are skipped; the relocation pass
    /// has already reported them.
    pub fn inherited_scopes(&self, scope: ScopeId) -> Vec<ScopeId> {
        let global = self.global_of(scope);
        self.lookup_names_of_kind(scope, EntryKind::Inherit)
            .iter()
            .filter_map(|name| {
                self.lookup(global, name, EntryKind::Struct)
                    .and_then(|e| self.entry(e).link)
            })
            .collect()
    }

    /// Parameter types of a function entry, in declaration order.
    pub fn func_param_types(&self, func: EntryId) -> Vec<SemType> {
        match self.entry(func).link {
            Some(scope) => self
                .lookup_all_of_kind(scope, EntryKind::Param)
                .into_iter()
                .map(|p| self.entry(p).ty.clone())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Every scope id, in creation order.
    pub fn scope_ids(&self) -> Vec<ScopeId> {
        (0..self.scopes.len()).map(ScopeId).collect()
    }

    /// The entry whose subordinate table is the given scope.
    pub fn owner_entry(&self, scope: ScopeId) -> Option<EntryId> {
        (0..self.entries.len())
            .map(EntryId)
            .find(|id| self.entry(*id).link == Some(scope))
    }

    /// The scope whose entry list holds the given entry.
    pub fn containing_scope(&self, entry: EntryId) -> Option<ScopeId> {
        self.scope_ids()
            .into_iter()
            .find(|s| self.scope(*s).entries.contains(&entry))
    }

    /// Qualified path for diagnostics: `global::STRUCT::method`.
    pub fn path(&self, scope: ScopeId) -> String {
        let mut parts = Vec::new();
        let mut cursor = Some(scope);
        while let Some(id) = cursor {
            parts.push(self.scope(id).name.clone());
            cursor = self.scope(id).upper;
        }
        parts.reverse();
        parts.join("::")
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_struct() -> (ScopeTree, ScopeId, ScopeId) {
        let mut tree = ScopeTree::new();
        let global = tree.add_scope("global", ScopeKind::Global, None);
        let s = tree.add_scope("POINT", ScopeKind::Struct, Some(global));
        tree.insert(
            global,
            Entry::new("POINT", EntryKind::Struct, SemType::Struct("POINT".into()), Some(s)),
        );
        (tree, global, s)
    }

    #[test]
    fn lookup_is_case_insensitive_on_names_and_exact_on_kinds() {
        let (mut tree, global, _) = tree_with_struct();
        tree.insert(global, Entry::new("main", EntryKind::Func, SemType::Void, None));

        assert!(tree.lookup(global, "MAIN", EntryKind::Func).is_some());
        assert!(tree.lookup(global, "main", EntryKind::Var).is_none());
        assert!(tree.lookup(global, "point", EntryKind::Struct).is_some());
    }

    #[test]
    fn entries_keep_insertion_order() {
        let (mut tree, global, _) = tree_with_struct();
        tree.insert(global, Entry::new("f", EntryKind::Func, SemType::Void, None));
        tree.insert(global, Entry::new("f", EntryKind::Func, SemType::Integer, None));

        let all = tree.lookup_all(global, "f", EntryKind::Func);
        assert_eq!(all.len(), 2);
        assert_eq!(tree.entry(all[0]).ty, SemType::Void);
        assert_eq!(tree.entry(all[1]).ty, SemType::Integer);
    }

    #[test]
    fn member_resolution_prefers_own_members_over_inherited() {
        let (mut tree, global, child) = tree_with_struct();
        let parent = tree.add_scope("BASE", ScopeKind::Struct, Some(global));
        tree.insert(
            global,
            Entry::new("BASE", EntryKind::Struct, SemType::Struct("BASE".into()), Some(parent)),
        );
        tree.insert(parent, Entry::new("x", EntryKind::Var, SemType::Float, None));
        tree.insert(
            child,
            Entry::new("BASE", EntryKind::Inherit, SemType::Struct("BASE".into()), None),
        );
        tree.insert(child, Entry::new("x", EntryKind::Var, SemType::Integer, None));

        let found = tree.resolve_member_in_struct(child, "x").unwrap();
        assert_eq!(tree.entry(found).ty, SemType::Integer);

        let inherited = tree.resolve_member_in_struct(child, "x");
        assert!(inherited.is_some());
    }

    #[test]
    fn function_scope_resolution_reaches_inherited_members() {
        let (mut tree, global, child) = tree_with_struct();
        let parent = tree.add_scope("BASE", ScopeKind::Struct, Some(global));
        tree.insert(
            global,
            Entry::new("BASE", EntryKind::Struct, SemType::Struct("BASE".into()), Some(parent)),
        );
        tree.insert(parent, Entry::new("depth", EntryKind::Var, SemType::Integer, None));
        tree.insert(
            child,
            Entry::new("BASE", EntryKind::Inherit, SemType::Struct("BASE".into()), None),
        );

        let impl_scope = tree.add_scope("POINT", ScopeKind::Impl, Some(child));
        let method = tree.add_scope("get", ScopeKind::Function, Some(impl_scope));
        tree.insert(method, Entry::new("local", EntryKind::Var, SemType::Float, None));

        assert!(tree.resolve_var_in_function_scope(method, "local").is_some());
        assert!(tree.resolve_var_in_function_scope(method, "depth").is_some());
        assert!(tree.resolve_var_in_function_scope(method, "missing").is_none());
    }

    #[test]
    fn relocation_is_an_index_rewrite() {
        let (mut tree, global, s) = tree_with_struct();
        let impl_scope = tree.add_scope("POINT", ScopeKind::Impl, Some(global));
        let impl_entry = tree.insert(
            global,
            Entry::new("POINT", EntryKind::Impl, SemType::Struct("POINT".into()), Some(impl_scope)),
        );

        tree.remove(global, impl_entry);
        tree.append(s, impl_entry);
        tree.scope_mut(impl_scope).upper = Some(s);

        assert!(tree.lookup(global, "POINT", EntryKind::Impl).is_none());
        assert!(tree.lookup(s, "POINT", EntryKind::Impl).is_some());
        assert_eq!(tree.path(impl_scope), "global::POINT::POINT");
        // relocation moves entries between scopes without creating any
        assert_eq!(tree.scope_count(), 3);
        assert_eq!(tree.entry_count(), 2);
    }
}
