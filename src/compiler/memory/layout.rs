use log::debug;

use crate::compiler::ast::{Ast, NodeId, NodeKind};
use crate::compiler::semantics::symbol_table::{
    Entry, EntryKind, ScopeId, ScopeKind, ScopeTree,
};
use crate::compiler::semantics::types::SemType;

pub const INT_SIZE: i32 = 4;
pub const FLOAT_SIZE: i32 = 8;

/// How many bytes a value of this type occupies. Struct sizes are memoized
/// on the struct's scope; an array is its element size times the product of
/// its dimensions. `void` reserves one word for the return-value slot.
pub fn sizeof_type(ty: &SemType, tree: &mut ScopeTree, global: ScopeId) -> i32 {
    match ty {
        SemType::Void => 4,
        SemType::Integer => INT_SIZE,
        SemType::Float => FLOAT_SIZE,
        SemType::Struct(name) => tree
            .lookup(global, name, EntryKind::Struct)
            .and_then(|e| tree.entry(e).link)
            .map(|scope| sizeof_struct_scope(scope, tree, global))
            .unwrap_or(0),
        SemType::Array { elem, dims } => {
            let cells: u32 = dims.iter().product();
            sizeof_type(elem, tree, global) * cells as i32
        }
        SemType::Error => 0,
    }
}

/// Sum of all member variables plus, recursively, every inherited struct's
/// storage. The result is cached in the scope's size field.
pub fn sizeof_struct_scope(scope: ScopeId, tree: &mut ScopeTree, global: ScopeId) -> i32 {
    if tree.scope(scope).size > 0 {
        return tree.scope(scope).size;
    }

    let mut total = 0;
    for member in tree.lookup_all_of_kind(scope, EntryKind::Var) {
        let ty = tree.entry(member).ty.clone();
        total += sizeof_type(&ty, tree, global);
    }
    for parent in tree.lookup_names_of_kind(scope, EntryKind::Inherit) {
        if let Some(parent_scope) = tree
            .lookup(global, &parent, EntryKind::Struct)
            .and_then(|e| tree.entry(e).link)
        {
            total += sizeof_struct_scope(parent_scope, tree, global);
        }
    }
    tree.scope_mut(scope).size = total;
    total
}

/// Read-only sizing for use after the layout pass has run: struct sizes are
/// taken from the memoized scope totals.
pub fn sizeof_resolved(ty: &SemType, tree: &ScopeTree, global: ScopeId) -> i32 {
    match ty {
        SemType::Void => 4,
        SemType::Integer => INT_SIZE,
        SemType::Float => FLOAT_SIZE,
        SemType::Struct(name) => tree
            .lookup(global, name, EntryKind::Struct)
            .and_then(|e| tree.entry(e).link)
            .map(|scope| tree.scope(scope).size)
            .unwrap_or(0),
        SemType::Array { elem, dims } => {
            let cells: u32 = dims.iter().product();
            sizeof_resolved(elem, tree, global) * cells as i32
        }
        SemType::Error => 0,
    }
}

/// The memory layout pass: creates a temporary for every intermediate
/// expression result, sizes every entry, and assigns frame offsets. Offsets
/// descend below the frame pointer; `main` lays out from zero while every
/// other function first reserves its return value, return address, and
/// saved frame pointer.
pub struct LayoutPass<'a> {
    ast: &'a mut Ast,
    tree: &'a mut ScopeTree,
    global: ScopeId,
    temp_counter: usize,
}

pub fn compute_layout(ast: &mut Ast, root: NodeId, tree: &mut ScopeTree, global: ScopeId) {
    debug!("computing sizes, offsets, and temporaries");
    let mut pass = LayoutPass {
        ast,
        tree,
        global,
        temp_counter: 0,
    };
    pass.create_temporaries(root);
    pass.size_entries();
    pass.assign_offsets();
}

impl<'a> LayoutPass<'a> {
    fn next_temp_name(&mut self) -> String {
        let name = format!("t{}", self.temp_counter);
        self.temp_counter += 1;
        name
    }

    /// Literals, operators, and calls each reserve a temporary in the
    /// enclosing function's frame. Nodes sitting in struct scope (array
    /// dimensions of member declarations) reserve nothing. Re-running the
    /// pass reuses the temporaries created the first time.
    fn create_temporaries(&mut self, node: NodeId) {
        for child in self.ast.children(node) {
            self.create_temporaries(child);
        }

        if !matches!(
            self.ast.kind(node),
            NodeKind::IntLit
                | NodeKind::FloatLit
                | NodeKind::AddOp
                | NodeKind::MultOp
                | NodeKind::RelExpr
                | NodeKind::FunctionCall
        ) {
            return;
        }
        if self.ast.node(node).temp.is_some() {
            return;
        }
        let scope = match self.ast.node(node).scope {
            Some(s) if self.tree.scope(s).kind == ScopeKind::Function => s,
            _ => return,
        };

        let ty = match self.ast.node(node).sem_type.clone() {
            Some(ty) if !ty.is_error() => ty.trim(),
            Some(_) => return,
            // array dimension literals are shape, not values
            None => match self.ast.kind(node) {
                NodeKind::IntLit => SemType::Integer,
                NodeKind::FloatLit => SemType::Float,
                _ => return,
            },
        };

        let size = sizeof_type(&ty, self.tree, self.global);
        let name = self.next_temp_name();
        let mut entry = Entry::new(&name, EntryKind::TempVar, ty, None);
        entry.size = size;
        let id = self.tree.insert(scope, entry);
        self.ast.node_mut(node).temp = Some(id);
    }

    fn size_entries(&mut self) {
        for scope in self.tree.scope_ids() {
            for entry in self.tree.scope(scope).entries.clone() {
                let kind = self.tree.entry(entry).kind;
                if matches!(kind, EntryKind::Var | EntryKind::Param | EntryKind::TempVar) {
                    let ty = self.tree.entry(entry).ty.clone();
                    let size = sizeof_type(&ty, self.tree, self.global);
                    self.tree.entry_mut(entry).size = size;
                }
            }
        }
    }

    fn assign_offsets(&mut self) {
        for scope in self.tree.scope_ids() {
            match self.tree.scope(scope).kind {
                ScopeKind::Struct => {
                    sizeof_struct_scope(scope, self.tree, self.global);
                    self.offsets_from(scope, 0);
                }
                ScopeKind::Function => self.function_frame(scope),
                ScopeKind::Global | ScopeKind::Impl => {}
            }
        }
    }

    fn function_frame(&mut self, scope: ScopeId) {
        let is_main = self.tree.scope(scope).name.eq_ignore_ascii_case("main")
            && self.tree.scope(scope).upper == Some(self.global);

        if is_main {
            let total = self.offsets_from(scope, 0);
            self.tree.scope_mut(scope).size = -total;
            return;
        }

        // below the frame pointer: return value, return address, saved FP,
        // then parameters, locals, and temporaries in declaration order
        let ret = self
            .tree
            .owner_entry(scope)
            .map(|e| self.tree.entry(e).ty.clone())
            .unwrap_or(SemType::Void);
        let mut running = -sizeof_type(&ret, self.tree, self.global);
        running -= 4;
        running -= 4;
        let total = self.offsets_from(scope, running);
        self.tree.scope_mut(scope).size = total;
    }

    /// Walk the entries in insertion order, each landing immediately below
    /// its predecessor. Returns the final running total.
    fn offsets_from(&mut self, scope: ScopeId, start: i32) -> i32 {
        let mut running = start;
        for entry in self.tree.scope(scope).entries.clone() {
            let size = self.tree.entry(entry).size;
            running -= size;
            self.tree.entry_mut(entry).offset = running;
        }
        running
    }
}
