use log::debug;

use crate::compiler::ast::{Ast, NodeId, NodeKind};
use crate::compiler::semantics::symbol_table::{
    Entry, EntryKind, ScopeId, ScopeKind, ScopeTree, Visibility,
};
use crate::compiler::semantics::types::SemType;
use crate::diagnostics::{Code, Reporter};

/// Depth-first walk over the AST that builds the scope tree: every
/// declaration node creates a subordinate scope and a heading entry in its
/// parent scope, and every node is stamped with the innermost scope
/// enclosing it. Duplicates are checked before each insertion; a finding is
/// reported but the entry is still inserted so the later passes can keep
/// going.
pub struct ScopeBuilder<'a> {
    ast: &'a mut Ast,
    tree: ScopeTree,
    reporter: &'a mut Reporter,
    pub accept: bool,
}

impl<'a> ScopeBuilder<'a> {
    pub fn build(ast: &'a mut Ast, root: NodeId, reporter: &'a mut Reporter) -> (ScopeTree, ScopeId, bool) {
        debug!("building symbol tables");
        let mut builder = ScopeBuilder {
            ast,
            tree: ScopeTree::new(),
            reporter,
            accept: true,
        };
        let global = builder.tree.add_scope("global", ScopeKind::Global, None);
        builder.ast.node_mut(root).scope = Some(global);
        for child in builder.ast.children(root) {
            builder.visit(child, global);
        }
        let accept = builder.accept;
        (builder.tree, global, accept)
    }

    fn visit(&mut self, node: NodeId, scope: ScopeId) {
        self.ast.node_mut(node).scope = Some(scope);
        match self.ast.kind(node) {
            NodeKind::StructDecl => self.struct_decl(node, scope),
            NodeKind::ImplDef => self.impl_def(node, scope),
            NodeKind::FuncDef => self.func_def(node, scope),
            NodeKind::FuncDecl => self.func_decl(node, scope),
            NodeKind::InheritList => self.inherit_list(node, scope),
            NodeKind::Member => self.member(node, scope),
            NodeKind::FParam => self.f_param(node, scope),
            NodeKind::VarDecl => self.var_decl(node, scope),
            _ => self.visit_children(node, scope),
        }
    }

    fn visit_children(&mut self, node: NodeId, scope: ScopeId) {
        for child in self.ast.children(node) {
            self.visit(child, scope);
        }
    }

    fn struct_decl(&mut self, node: NodeId, scope: ScopeId) {
        let name = self.ast.value(self.ast.child(node, 0)).to_string();
        if self.tree.lookup(scope, &name, EntryKind::Struct).is_some() {
            self.error(
                Code::DuplicateStruct,
                format!(
                    "multiply declared struct \"{}\" in {} (line {})",
                    name,
                    self.tree.path(scope),
                    self.ast.line(node)
                ),
            );
        }

        let struct_scope = self.tree.add_scope(&name, ScopeKind::Struct, Some(scope));
        let entry = self.tree.insert(
            scope,
            Entry::new(
                &name,
                EntryKind::Struct,
                SemType::Struct(name.clone()),
                Some(struct_scope),
            ),
        );
        self.ast.node_mut(node).entry = Some(entry);
        self.visit_children(node, struct_scope);
    }

    fn impl_def(&mut self, node: NodeId, scope: ScopeId) {
        let name = self.ast.value(self.ast.child(node, 0)).to_string();
        let impl_scope = self.tree.add_scope(&name, ScopeKind::Impl, Some(scope));
        let entry = self.tree.insert(
            scope,
            Entry::new(
                &name,
                EntryKind::Impl,
                SemType::Struct(name.clone()),
                Some(impl_scope),
            ),
        );
        self.ast.node_mut(node).entry = Some(entry);
        self.visit_children(node, impl_scope);
    }

    fn inherit_list(&mut self, node: NodeId, scope: ScopeId) {
        for child in self.ast.children(node) {
            self.ast.node_mut(child).scope = Some(scope);
            let name = self.ast.value(child).to_string();
            self.tree.insert(
                scope,
                Entry::new(&name, EntryKind::Inherit, SemType::Struct(name.clone()), None),
            );
        }
    }

    fn member(&mut self, node: NodeId, scope: ScopeId) {
        self.visit_children(node, scope);

        let visibility = match self.ast.value(self.ast.child(node, 0)) {
            "private" => Visibility::Private,
            _ => Visibility::Public,
        };
        let decl = self.ast.child(node, 1);
        if let Some(entry) = self.ast.node(decl).entry {
            self.tree.entry_mut(entry).visibility = Some(visibility);
        }
    }

    fn func_decl(&mut self, node: NodeId, scope: ScopeId) {
        let name = self.ast.value(self.ast.child(node, 0)).to_string();
        let ret = SemType::scalar(self.ast.value(self.ast.child(node, 2)));
        let params = self.param_types_from_ast(self.ast.child(node, 1));

        let overloads = self.tree.lookup_all(scope, &name, EntryKind::Func);
        if !overloads.is_empty() {
            let identical = overloads.iter().any(|f| {
                self.tree.entry(*f).ty == ret && self.tree.func_param_types(*f) == params
            });
            if identical {
                self.error(
                    Code::DuplicateMember,
                    format!(
                        "multiply declared member function \"{}\" in {} (line {})",
                        name,
                        self.tree.path(scope),
                        self.ast.line(node)
                    ),
                );
            } else {
                self.reporter.report(
                    Code::OverloadedMember,
                    format!(
                        "overloaded member function \"{}\" in {} (line {})",
                        name,
                        self.tree.path(scope),
                        self.ast.line(node)
                    ),
                );
            }
        }

        self.insert_func(node, scope, &name, ret);
    }

    fn func_def(&mut self, node: NodeId, scope: ScopeId) {
        let name = self.ast.value(self.ast.child(node, 0)).to_string();
        let ret = SemType::scalar(self.ast.value(self.ast.child(node, 2)));

        if self.tree.scope(scope).kind == ScopeKind::Global {
            let params = self.param_types_from_ast(self.ast.child(node, 1));
            let overloads = self.tree.lookup_all(scope, &name, EntryKind::Func);
            if !overloads.is_empty() {
                let identical = overloads.iter().any(|f| {
                    self.tree.entry(*f).ty == ret && self.tree.func_param_types(*f) == params
                });
                if identical {
                    self.error(
                        Code::DuplicateFreeFunction,
                        format!(
                            "multiply declared free function \"{}\" in {} (line {})",
                            name,
                            self.tree.path(scope),
                            self.ast.line(node)
                        ),
                    );
                } else {
                    self.reporter.report(
                        Code::OverloadedFreeFunction,
                        format!(
                            "overloaded free function \"{}\" in {} (line {})",
                            name,
                            self.tree.path(scope),
                            self.ast.line(node)
                        ),
                    );
                }
            }
        }

        self.insert_func(node, scope, &name, ret);
    }

    fn insert_func(&mut self, node: NodeId, scope: ScopeId, name: &str, ret: SemType) {
        let func_scope = self.tree.add_scope(name, ScopeKind::Function, Some(scope));
        let entry = self.tree.insert(
            scope,
            Entry::new(name, EntryKind::Func, ret, Some(func_scope)),
        );
        self.ast.node_mut(node).entry = Some(entry);
        self.visit_children(node, func_scope);
    }

    fn f_param(&mut self, node: NodeId, scope: ScopeId) {
        let name = self.ast.value(self.ast.child(node, 0)).to_string();
        if self.tree.lookup(scope, &name, EntryKind::Param).is_some() {
            self.error(
                Code::DuplicateLocal,
                format!(
                    "multiply declared parameter \"{}\" in {} (line {})",
                    name,
                    self.tree.path(scope),
                    self.ast.line(node)
                ),
            );
        }

        let ty = self.declared_type(node);
        let entry = self.tree.insert(scope, Entry::new(&name, EntryKind::Param, ty, None));
        self.ast.node_mut(node).entry = Some(entry);
        self.visit_children(node, scope);
    }

    fn var_decl(&mut self, node: NodeId, scope: ScopeId) {
        let name = self.ast.value(self.ast.child(node, 0)).to_string();
        let line = self.ast.line(node);
        match self.tree.scope(scope).kind {
            ScopeKind::Struct => {
                if self.tree.lookup(scope, &name, EntryKind::Var).is_some() {
                    self.error(
                        Code::DuplicateMember,
                        format!(
                            "multiply declared member variable \"{}\" in {} (line {})",
                            name,
                            self.tree.path(scope),
                            line
                        ),
                    );
                }
            }
            _ => {
                if self.tree.lookup(scope, &name, EntryKind::Var).is_some()
                    || self.tree.lookup(scope, &name, EntryKind::Param).is_some()
                {
                    self.error(
                        Code::DuplicateLocal,
                        format!(
                            "multiply declared local variable \"{}\" in {} (line {})",
                            name,
                            self.tree.path(scope),
                            line
                        ),
                    );
                }
            }
        }

        let ty = self.declared_type(node);
        let entry = self.tree.insert(scope, Entry::new(&name, EntryKind::Var, ty, None));
        self.ast.node_mut(node).entry = Some(entry);
        self.visit_children(node, scope);
    }

    /// Declared type of a `VarDecl` or `FParam`: the type word plus the
    /// bracketed dimensions, in source order.
    fn declared_type(&self, node: NodeId) -> SemType {
        let word = self.ast.value(self.ast.child(node, 1)).to_string();
        let dims: Vec<u32> = self
            .ast
            .children(self.ast.child(node, 2))
            .iter()
            .map(|lit| self.ast.value(*lit).parse().unwrap_or(0))
            .collect();
        SemType::declared(&word, &dims)
    }

    fn param_types_from_ast(&self, fparam_list: NodeId) -> Vec<SemType> {
        self.ast
            .children(fparam_list)
            .iter()
            .map(|p| self.declared_type(*p))
            .collect()
    }

    fn error(&mut self, code: Code, message: String) {
        self.reporter.report(code, message);
        self.accept = false;
    }
}
