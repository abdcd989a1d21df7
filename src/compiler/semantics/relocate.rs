use log::debug;

use crate::compiler::semantics::cycles::StructGraph;
use crate::compiler::semantics::symbol_table::{EntryKind, ScopeId, ScopeTree};
use crate::compiler::semantics::types::SemType;
use crate::diagnostics::{Code, Reporter};

/// Output of the relocation pass: the two struct graphs the cycle detector
/// walks, plus the pass's accept flag.
pub struct Relocation {
    pub inheritance: StructGraph,
    pub dependency: StructGraph,
    pub accept: bool,
}

/// Moves every `impl` table from the global scope into the struct of the
/// same name (an index rewrite), verifies each defined method against the
/// struct's declarations, and assembles the inheritance and storage
/// dependency graphs in declaration order.
pub fn relocate_impls(tree: &mut ScopeTree, global: ScopeId, reporter: &mut Reporter) -> Relocation {
    debug!("relocating impl tables into their structs");
    let mut accept = true;

    for impl_entry in tree.lookup_all_of_kind(global, EntryKind::Impl) {
        let name = tree.entry(impl_entry).name.clone();
        let struct_entry = match tree.lookup(global, &name, EntryKind::Struct) {
            Some(found) => found,
            None => {
                reporter.report(
                    Code::ImplForUnknownStruct,
                    format!("impl block for unknown struct \"{}\" in global", name),
                );
                accept = false;
                continue;
            }
        };
        let struct_scope = tree.entry(struct_entry).link.expect("struct entry has a scope");
        let impl_scope = tree.entry(impl_entry).link.expect("impl entry has a scope");

        tree.remove(global, impl_entry);
        tree.append(struct_scope, impl_entry);
        tree.scope_mut(impl_scope).upper = Some(struct_scope);

        // every defined method needs a declaration in the struct
        for defined in tree.lookup_all_of_kind(impl_scope, EntryKind::Func) {
            let method = tree.entry(defined).name.clone();
            let ret = tree.entry(defined).ty.clone();
            let params = tree.func_param_types(defined);
            let declared = tree
                .lookup_all(struct_scope, &method, EntryKind::Func)
                .into_iter()
                .any(|d| tree.entry(d).ty == ret && tree.func_param_types(d) == params);
            if !declared {
                reporter.report(
                    Code::DefinedUndeclaredMethod,
                    format!(
                        "definition of undeclared member function \"{}\" in {}",
                        method,
                        tree.path(impl_scope)
                    ),
                );
                accept = false;
            }
        }
    }

    let (inheritance, dependency) = build_graphs(tree, global);
    Relocation {
        inheritance,
        dependency,
        accept,
    }
}

/// The inheritance graph has an edge from each struct to every declared
/// parent; the dependency graph has an edge to the element type of every
/// struct-typed member, arrays included, since arrayness does not break a
/// storage dependency.
fn build_graphs(tree: &ScopeTree, global: ScopeId) -> (StructGraph, StructGraph) {
    let mut inheritance = StructGraph::new();
    let mut dependency = StructGraph::new();

    for struct_entry in tree.lookup_all_of_kind(global, EntryKind::Struct) {
        let name = tree.entry(struct_entry).name.clone();
        inheritance.add_node(&name);
        dependency.add_node(&name);
        let scope = match tree.entry(struct_entry).link {
            Some(scope) => scope,
            None => continue,
        };

        for parent in tree.lookup_names_of_kind(scope, EntryKind::Inherit) {
            inheritance.add_edge(&name, &parent);
        }

        for member in tree.lookup_all_of_kind(scope, EntryKind::Var) {
            if let SemType::Struct(target) = tree.entry(member).ty.trim() {
                dependency.add_edge(&name, &target);
            }
        }
    }

    (inheritance, dependency)
}
