use log::debug;

use crate::compiler::ast::{Ast, NodeId, NodeKind};
use crate::compiler::semantics::symbol_table::{EntryId, EntryKind, ScopeId, ScopeKind, ScopeTree};
use crate::compiler::semantics::types::SemType;
use crate::diagnostics::{Code, Reporter};

/// Depth-first semantic analysis: propagates a type onto every expression
/// node, resolves names through lexical, struct, and inherited scopes,
/// overload-resolves calls, and enforces array dimensionality. Every finding
/// is reported and the walk continues; a child that already failed carries
/// `errortype`, which ancestors inherit without further noise.
pub struct SemanticChecker<'a> {
    ast: &'a mut Ast,
    tree: &'a ScopeTree,
    reporter: &'a mut Reporter,
    pub accept: bool,
}

pub fn check(ast: &mut Ast, root: NodeId, tree: &ScopeTree, reporter: &mut Reporter) -> bool {
    debug!("running semantic checks");
    let mut checker = SemanticChecker {
        ast,
        tree,
        reporter,
        accept: true,
    };
    checker.visit(root);
    checker.accept
}

impl<'a> SemanticChecker<'a> {
    fn visit(&mut self, node: NodeId) {
        match self.ast.kind(node) {
            NodeKind::StructDecl => self.struct_decl(node),
            NodeKind::VarDecl => self.var_decl(node),
            NodeKind::IntLit => self.set_type(node, SemType::Integer),
            NodeKind::FloatLit => self.set_type(node, SemType::Float),
            NodeKind::Variable => self.variable(node),
            NodeKind::Dot => self.dot(node),
            NodeKind::FunctionCall => self.function_call(node, None),
            NodeKind::AddOp | NodeKind::MultOp => self.binary_op(node),
            NodeKind::RelExpr => self.rel_expr(node),
            NodeKind::Not | NodeKind::Sign => self.unary_op(node),
            NodeKind::AssignStat => self.assign_stat(node),
            NodeKind::ReturnStat => self.return_stat(node),
            _ => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: NodeId) {
        for child in self.ast.children(node) {
            self.visit(child);
        }
    }

    fn set_type(&mut self, node: NodeId, ty: SemType) {
        self.ast.node_mut(node).sem_type = Some(ty);
    }

    fn error(&mut self, code: Code, message: String) {
        self.reporter.report(code, message);
        self.accept = false;
    }

    fn warn(&mut self, code: Code, message: String) {
        self.reporter.report(code, message);
    }

    fn scope_of(&self, node: NodeId) -> ScopeId {
        self.ast.node(node).scope.expect("scope set by the builder")
    }

    // ------------------------------------------------------------------
    // declarations

    fn struct_decl(&mut self, node: NodeId) {
        self.visit_children(node);

        let entry = match self.ast.node(node).entry {
            Some(e) => e,
            None => return,
        };
        let scope = match self.tree.entry(entry).link {
            Some(s) => s,
            None => return,
        };
        let global = self.tree.global_of(scope);
        let line = self.ast.line(node);

        // inherited names must be declared structs
        for parent in self.tree.lookup_names_of_kind(scope, EntryKind::Inherit) {
            if self.tree.lookup(global, &parent, EntryKind::Struct).is_none() {
                self.error(
                    Code::UnknownStructName,
                    format!(
                        "unknown struct name \"{}\" inherited by {} (line {})",
                        parent,
                        self.tree.path(scope),
                        line
                    ),
                );
            }
        }

        let parents = self.tree.inherited_scopes(scope);

        // a member that hides a member of some inherited struct
        for member in self.tree.lookup_all_of_kind(scope, EntryKind::Var) {
            let name = self.tree.entry(member).name.clone();
            for parent in &parents {
                if self.tree.resolve_member_in_struct(*parent, &name).is_some() {
                    self.warn(
                        Code::MemberShadowsInherited,
                        format!(
                            "member \"{}\" in {} shadows an inherited member of {}",
                            name,
                            self.tree.path(scope),
                            self.tree.path(*parent)
                        ),
                    );
                    break;
                }
            }
        }

        // declared methods: overridden inherited signatures, and missing bodies
        let impl_scope = self
            .tree
            .lookup(scope, &self.tree.scope(scope).name.clone(), EntryKind::Impl)
            .and_then(|e| self.tree.entry(e).link);

        for declared in self.tree.lookup_all_of_kind(scope, EntryKind::Func) {
            let name = self.tree.entry(declared).name.clone();
            let ret = self.tree.entry(declared).ty.clone();
            let params = self.tree.func_param_types(declared);

            for parent in &parents {
                let inherited = self
                    .tree
                    .resolve_funcs_in_struct(*parent, &name)
                    .into_iter()
                    .find(|f| {
                        self.tree.entry(*f).ty == ret && self.tree.func_param_types(*f) == params
                    });
                if inherited.is_some() {
                    self.warn(
                        Code::OverriddenInheritedMethod,
                        format!(
                            "method \"{}\" in {} overrides an inherited method of {}",
                            name,
                            self.tree.path(scope),
                            self.tree.path(*parent)
                        ),
                    );
                    break;
                }
            }

            let defined = impl_scope
                .map(|is| {
                    self.tree
                        .lookup_all(is, &name, EntryKind::Func)
                        .into_iter()
                        .any(|f| {
                            self.tree.entry(f).ty == ret
                                && self.tree.func_param_types(f) == params
                        })
                })
                .unwrap_or(false);
            if !defined {
                self.error(
                    Code::DeclaredUndefinedMethod,
                    format!(
                        "declared member function \"{}\" in {} has no implementation",
                        name,
                        self.tree.path(scope)
                    ),
                );
            }
        }
    }

    fn var_decl(&mut self, node: NodeId) {
        self.visit_children(node);

        let scope = self.scope_of(node);
        let entry = match self.ast.node(node).entry {
            Some(e) => e,
            None => return,
        };
        let name = self.tree.entry(entry).name.clone();
        let line = self.ast.line(node);

        if let SemType::Struct(type_name) = self.tree.entry(entry).ty.trim() {
            let global = self.tree.global_of(scope);
            if self.tree.lookup(global, &type_name, EntryKind::Struct).is_none() {
                self.error(
                    Code::UnknownStructName,
                    format!(
                        "unknown struct name \"{}\" declaring \"{}\" in {} (line {})",
                        type_name,
                        name,
                        self.tree.path(scope),
                        line
                    ),
                );
            }
        }

        // a local hiding a member visible from this method
        if self.tree.scope(scope).kind == ScopeKind::Function {
            if let Some(owner) = self.tree.owning_struct(scope) {
                if self.tree.resolve_member_in_struct(owner, &name).is_some() {
                    self.warn(
                        Code::LocalShadowsMember,
                        format!(
                            "local variable \"{}\" in {} shadows a member of {}",
                            name,
                            self.tree.path(scope),
                            self.tree.path(owner)
                        ),
                    );
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // expressions

    fn variable(&mut self, node: NodeId) {
        let scope = self.scope_of(node);
        let name = self.ast.value(self.ast.child(node, 0)).to_string();
        let indices = self.ast.children(self.ast.child(node, 1));
        for ix in &indices {
            self.visit(*ix);
        }

        if name == "self" {
            match self.tree.owning_struct(scope) {
                Some(owner) => {
                    let owner_name = self.tree.scope(owner).name.clone();
                    self.set_type(node, SemType::Struct(owner_name));
                }
                None => {
                    self.error(
                        Code::UndeclaredVariable,
                        format!(
                            "\"self\" used outside a member function in {} (line {})",
                            self.tree.path(scope),
                            self.ast.line(node)
                        ),
                    );
                    self.set_type(node, SemType::Error);
                }
            }
            return;
        }

        let entry = self.tree.resolve_var_in_function_scope(scope, &name);
        self.resolve_access(node, entry, &name, &indices, scope);
    }

    /// Shared tail of bare and dotted variable accesses: checks the index
    /// expressions against the declared shape and sets the node's type and
    /// entry.
    fn resolve_access(
        &mut self,
        node: NodeId,
        entry: Option<EntryId>,
        name: &str,
        indices: &[NodeId],
        scope: ScopeId,
    ) {
        let entry = match entry {
            Some(e) => e,
            None => {
                self.error(
                    Code::UndeclaredVariable,
                    format!(
                        "undeclared variable \"{}\" in {} (line {})",
                        name,
                        self.tree.path(scope),
                        self.ast.line(node)
                    ),
                );
                self.set_type(node, SemType::Error);
                return;
            }
        };
        self.ast.node_mut(node).entry = Some(entry);

        for ix in indices {
            let ty = self.ast.sem_type(*ix);
            if !ty.is_error() && ty != SemType::Integer {
                self.error(
                    Code::NonIntegerIndex,
                    format!(
                        "array index of type \"{}\" for \"{}\" in {} (line {})",
                        ty,
                        name,
                        self.tree.path(scope),
                        self.ast.line(node)
                    ),
                );
            }
        }

        let declared = self.tree.entry(entry).ty.clone();
        let used = indices.len();
        if used == 0 || used == declared.dims() {
            let ty = if used == 0 { declared } else { declared.trim() };
            self.set_type(node, ty);
            return;
        }

        let code = if self.tree.entry(entry).kind == EntryKind::Param {
            Code::ArrayParamDimensionMismatch
        } else {
            Code::ArrayDimensionMismatch
        };
        self.error(
            code,
            format!(
                "array dimension mismatch for \"{}\" in {} (line {}): {} of {} dimensions indexed",
                self.render_access(name, indices),
                self.tree.path(scope),
                self.ast.line(node),
                used,
                declared.dims()
            ),
        );
        self.set_type(node, SemType::Error);
    }

    fn render_access(&self, name: &str, indices: &[NodeId]) -> String {
        let mut out = name.to_string();
        for ix in indices {
            let text = match self.ast.kind(*ix) {
                NodeKind::IntLit | NodeKind::FloatLit => self.ast.value(*ix).to_string(),
                NodeKind::Variable => self.ast.value(self.ast.child(*ix, 0)).to_string(),
                _ => "expr".to_string(),
            };
            out.push('[');
            out.push_str(&text);
            out.push(']');
        }
        out
    }

    fn dot(&mut self, node: NodeId) {
        let left = self.ast.child(node, 0);
        let right = self.ast.child(node, 1);
        self.visit(left);

        let left_ty = self.ast.sem_type(left);
        let scope = self.scope_of(node);
        let struct_scope = match &left_ty {
            SemType::Error => {
                self.visit_dot_right_silently(right);
                self.set_type(node, SemType::Error);
                return;
            }
            SemType::Struct(name) => {
                let global = self.tree.global_of(scope);
                self.tree
                    .lookup(global, name, EntryKind::Struct)
                    .and_then(|e| self.tree.entry(e).link)
            }
            _ => None,
        };

        let struct_scope = match struct_scope {
            Some(s) => s,
            None => {
                self.error(
                    Code::DotOnNonStruct,
                    format!(
                        "\".\" applied to non-struct type \"{}\" in {} (line {})",
                        left_ty,
                        self.tree.path(scope),
                        self.ast.line(node)
                    ),
                );
                self.visit_dot_right_silently(right);
                self.set_type(node, SemType::Error);
                return;
            }
        };

        match self.ast.kind(right) {
            NodeKind::Variable => {
                let name = self.ast.value(self.ast.child(right, 0)).to_string();
                let indices = self.ast.children(self.ast.child(right, 1));
                for ix in &indices {
                    self.visit(*ix);
                }
                let entry = self.tree.resolve_member_in_struct(struct_scope, &name);
                self.resolve_access(right, entry, &name, &indices, scope);
            }
            NodeKind::FunctionCall => {
                self.function_call(right, Some(struct_scope));
            }
            _ => {}
        }
        let ty = self.ast.sem_type(right);
        self.set_type(node, ty);
    }

    /// The right side of a failed dot still gets its argument and index
    /// expressions typed, but no resolution diagnostics.
    fn visit_dot_right_silently(&mut self, right: NodeId) {
        for list in self.ast.children(right) {
            if matches!(
                self.ast.kind(list),
                NodeKind::IndiceList | NodeKind::AParamsList
            ) {
                self.visit_children(list);
            }
        }
        self.set_type(right, SemType::Error);
    }

    fn function_call(&mut self, node: NodeId, member_of: Option<ScopeId>) {
        let scope = self.scope_of(node);
        let name = self.ast.value(self.ast.child(node, 0)).to_string();
        let args = self.ast.children(self.ast.child(node, 1));
        for arg in &args {
            self.visit(*arg);
        }
        let arg_types: Vec<SemType> = args.iter().map(|a| self.ast.sem_type(*a)).collect();
        if arg_types.iter().any(|t| t.is_error()) {
            self.set_type(node, SemType::Error);
            return;
        }

        let candidates = match member_of {
            Some(struct_scope) => self.tree.resolve_funcs_in_struct(struct_scope, &name),
            None => {
                let global = self.tree.global_of(scope);
                self.tree.lookup_all(global, &name, EntryKind::Func)
            }
        };

        if candidates.is_empty() {
            let (code, what) = match member_of {
                Some(_) => (Code::UndeclaredMemberFunction, "member function"),
                None => (Code::UndeclaredFreeFunction, "free function"),
            };
            self.error(
                code,
                format!(
                    "undeclared {} \"{}\" called in {} (line {})",
                    what,
                    name,
                    self.tree.path(scope),
                    self.ast.line(node)
                ),
            );
            self.set_type(node, SemType::Error);
            return;
        }

        let selected = candidates.iter().copied().find(|f| {
            let params = self.tree.func_param_types(*f);
            params.len() == arg_types.len()
                && params.iter().zip(&arg_types).all(|(p, a)| {
                    p.trim() == a.trim() && p.dims() == a.dims()
                })
        });

        if let Some(func) = selected {
            self.ast.node_mut(node).entry = Some(func);
            let ret = self.tree.entry(func).ty.clone();
            self.set_type(node, ret);
            return;
        }

        let arg_list = arg_types
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        let arity_matches = candidates
            .iter()
            .any(|f| self.tree.func_param_types(*f).len() == arg_types.len());
        if !arity_matches {
            self.error(
                Code::WrongArgumentCount,
                format!(
                    "wrong number of arguments in call to \"{}\" in {} (line {}): {}",
                    name,
                    self.tree.path(scope),
                    self.ast.line(node),
                    arg_list
                ),
            );
        } else {
            // arity fits some candidate; decide between a flat type
            // mismatch and an array dimensionality mismatch
            let dims_only = candidates.iter().any(|f| {
                let params = self.tree.func_param_types(*f);
                params.len() == arg_types.len()
                    && params
                        .iter()
                        .zip(&arg_types)
                        .all(|(p, a)| p.trim() == a.trim())
            });
            let code = if dims_only {
                Code::ArrayParamDimensionMismatch
            } else {
                Code::WrongArgumentTypes
            };
            self.error(
                code,
                format!(
                    "wrong argument types in call to \"{}\" in {} (line {}): {}",
                    name,
                    self.tree.path(scope),
                    self.ast.line(node),
                    arg_list
                ),
            );
        }
        self.set_type(node, SemType::Error);
    }

    fn binary_op(&mut self, node: NodeId) {
        self.visit_children(node);
        let left = self.ast.sem_type(self.ast.child(node, 0));
        let right = self.ast.sem_type(self.ast.child(node, 1));

        if left.is_error() || right.is_error() {
            self.set_type(node, SemType::Error);
            return;
        }
        if left == right && left.is_arithmetic() {
            self.set_type(node, left);
            return;
        }

        let scope = self.scope_of(node);
        self.error(
            Code::OperandTypeMismatch,
            format!(
                "operator \"{}\" applied to \"{}\" and \"{}\" in {} (line {})",
                self.ast.value(node),
                left,
                right,
                self.tree.path(scope),
                self.ast.line(node)
            ),
        );
        self.set_type(node, SemType::Error);
    }

    fn rel_expr(&mut self, node: NodeId) {
        let left = self.ast.child(node, 0);
        let right = self.ast.child(node, 2);
        self.visit(left);
        self.visit(right);
        let lty = self.ast.sem_type(left);
        let rty = self.ast.sem_type(right);

        if lty.is_error() || rty.is_error() {
            self.set_type(node, SemType::Error);
            return;
        }
        if lty == rty && lty.is_arithmetic() {
            // comparisons yield boolean-as-integer
            self.set_type(node, SemType::Integer);
            return;
        }

        let scope = self.scope_of(node);
        self.error(
            Code::OperandTypeMismatch,
            format!(
                "operator \"{}\" applied to \"{}\" and \"{}\" in {} (line {})",
                self.ast.value(self.ast.child(node, 1)),
                lty,
                rty,
                self.tree.path(scope),
                self.ast.line(node)
            ),
        );
        self.set_type(node, SemType::Error);
    }

    fn unary_op(&mut self, node: NodeId) {
        self.visit_children(node);
        let operand = self.ast.sem_type(self.ast.child(node, 0));
        if operand.is_error() {
            self.set_type(node, SemType::Error);
            return;
        }
        if operand.is_arithmetic() {
            self.set_type(node, operand);
            return;
        }
        let scope = self.scope_of(node);
        self.error(
            Code::OperandTypeMismatch,
            format!(
                "operator \"{}\" applied to \"{}\" in {} (line {})",
                self.ast.value(node),
                operand,
                self.tree.path(scope),
                self.ast.line(node)
            ),
        );
        self.set_type(node, SemType::Error);
    }

    // ------------------------------------------------------------------
    // statements

    fn assign_stat(&mut self, node: NodeId) {
        self.visit_children(node);
        let lhs = self.ast.sem_type(self.ast.child(node, 0));
        let rhs = self.ast.sem_type(self.ast.child(node, 1));
        if lhs.is_error() || rhs.is_error() {
            return;
        }
        if lhs != rhs {
            let scope = self.scope_of(node);
            self.error(
                Code::AssignTypeMismatch,
                format!(
                    "cannot assign \"{}\" to \"{}\" in {} (line {})",
                    rhs,
                    lhs,
                    self.tree.path(scope),
                    self.ast.line(node)
                ),
            );
        }
    }

    fn return_stat(&mut self, node: NodeId) {
        self.visit_children(node);
        let value = self.ast.sem_type(self.ast.child(node, 0));
        if value.is_error() {
            return;
        }

        let func = match self.ast.ancestor_of_kind(node, NodeKind::FuncDef) {
            Some(f) => f,
            None => return,
        };
        let declared = match self.ast.node(func).entry {
            Some(e) => self.tree.entry(e).ty.clone(),
            None => return,
        };
        if value != declared {
            let scope = self.scope_of(node);
            self.error(
                Code::ReturnTypeMismatch,
                format!(
                    "return of \"{}\" from function returning \"{}\" in {} (line {})",
                    value,
                    declared,
                    self.tree.path(scope),
                    self.ast.line(node)
                ),
            );
        }
    }
}
