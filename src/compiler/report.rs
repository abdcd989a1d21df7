use crate::compiler::semantics::symbol_table::{EntryKind, ScopeId, ScopeTree};

const BOX_WIDTH: usize = 81;

/// Render the whole scope tree as nested ASCII boxes: one box per table,
/// nested five columns deeper per level, each entry line showing kind,
/// name, type, and visibility. Struct heading entries show kind and name
/// only; their tables render inline underneath.
pub fn render_symbol_tables(tree: &ScopeTree, global: ScopeId) -> String {
    let mut out = String::new();
    render_scope(tree, global, 0, &mut out);
    out
}

fn render_scope(tree: &ScopeTree, scope: ScopeId, indent: usize, out: &mut String) {
    let indent_str = "|    ".repeat(indent / 5);
    let inner_indent = format!("{}|    ", indent_str);
    let border = format!("{}| {} |", indent_str, "=".repeat(BOX_WIDTH - 2 - indent));

    out.push_str(&border);
    out.push('\n');
    out.push_str(&format!(
        "{}| table: {:<width$}  |\n",
        indent_str,
        tree.scope(scope).name,
        width = BOX_WIDTH - 10 - indent
    ));
    out.push_str(&border);
    out.push('\n');

    for entry_id in &tree.scope(scope).entries {
        let entry = tree.entry(*entry_id);
        if entry.kind == EntryKind::Struct {
            out.push_str(&format!(
                "{}{:<11}{:<width$}    |\n",
                inner_indent,
                entry.kind.to_string(),
                entry.name,
                width = BOX_WIDTH - 19 - indent
            ));
        } else {
            let visibility = entry
                .visibility
                .map(|v| v.to_string())
                .unwrap_or_default();
            let tail = if visibility.is_empty() {
                "   |".to_string()
            } else {
                format!("| {} |", visibility)
            };
            out.push_str(&format!(
                "{}{:<11}{:<20}| {:<width$}{}\n",
                inner_indent,
                entry.kind.to_string(),
                entry.name,
                entry.ty.to_string(),
                tail,
                width = BOX_WIDTH - 40 - indent - visibility.len()
            ));
        }

        if let Some(link) = entry.link {
            render_scope(tree, link, indent + 5, out);
        }
    }

    out.push_str(&border);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::semantics::symbol_table::{Entry, ScopeKind, Visibility};
    use crate::compiler::semantics::types::SemType;

    #[test]
    fn global_box_has_fixed_width() {
        let mut tree = ScopeTree::new();
        let global = tree.add_scope("global", ScopeKind::Global, None);
        let text = render_symbol_tables(&tree, global);
        let mut lines = text.lines();
        let border = lines.next().unwrap();
        assert_eq!(border.len(), BOX_WIDTH);
        assert!(border.starts_with("| ="));
        assert!(text.contains("| table: global"));
    }

    #[test]
    fn entries_show_kind_name_type_and_visibility() {
        let mut tree = ScopeTree::new();
        let global = tree.add_scope("global", ScopeKind::Global, None);
        let s = tree.add_scope("POINT", ScopeKind::Struct, Some(global));
        tree.insert(
            global,
            Entry::new("POINT", EntryKind::Struct, SemType::Struct("POINT".into()), Some(s)),
        );
        let mut member = Entry::new("x", EntryKind::Var, SemType::Integer, None);
        member.visibility = Some(Visibility::Private);
        tree.insert(s, member);

        let text = render_symbol_tables(&tree, global);
        assert!(text.contains("struct     POINT"));
        assert!(text.contains("var        x"));
        assert!(text.contains("| private |"));
        // nested boxes indent five columns per level
        assert!(text.contains("|    | table: POINT"));
    }
}
