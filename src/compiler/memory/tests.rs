#[cfg(test)]
mod tests {
    use crate::compiler::memory::layout::compute_layout;
    use crate::compiler::semantics::symbol_table::{EntryId, EntryKind, ScopeId};
    use crate::compiler::{compile, Compilation};

    fn run(source: &str) -> Compilation {
        let c = compile(source).expect("test source must scan and parse");
        assert!(c.accept, "{}", c.reporter.render());
        c
    }

    fn func_scope(c: &Compilation, name: &str) -> ScopeId {
        let entry = c
            .tree
            .lookup(c.global, name, EntryKind::Func)
            .expect("function is declared");
        c.tree.entry(entry).link.unwrap()
    }

    fn entry(c: &Compilation, scope: ScopeId, name: &str, kind: EntryKind) -> EntryId {
        c.tree.lookup(scope, name, kind).expect("entry exists")
    }

    #[test]
    fn frame_offsets_descend_in_declaration_order() {
        let c = run(
            "func add(a: integer, b: integer): integer { let c: integer; c = a + b; return (c); }\n\
             func main(): void { let x: integer; x = add(1, 2); write(x); }",
        );
        let add = func_scope(&c, "add");

        // return value (4), return address (4), saved FP (4) come first
        assert_eq!(c.tree.entry(entry(&c, add, "a", EntryKind::Param)).offset, -16);
        assert_eq!(c.tree.entry(entry(&c, add, "b", EntryKind::Param)).offset, -20);
        assert_eq!(c.tree.entry(entry(&c, add, "c", EntryKind::Var)).offset, -24);
        assert_eq!(c.tree.entry(entry(&c, add, "t0", EntryKind::TempVar)).offset, -28);
        assert_eq!(c.tree.scope(add).size, -28);
    }

    #[test]
    fn main_lays_out_from_zero() {
        let c = run(
            "func add(a: integer, b: integer): integer { return (a + b); }\n\
             func main(): void { let x: integer; x = add(1, 2); write(x); }",
        );
        let main = func_scope(&c, "main");

        assert_eq!(c.tree.entry(entry(&c, main, "x", EntryKind::Var)).offset, -4);
        assert_eq!(c.tree.entry(entry(&c, main, "t1", EntryKind::TempVar)).offset, -8);
        assert_eq!(c.tree.entry(entry(&c, main, "t2", EntryKind::TempVar)).offset, -12);
        assert_eq!(c.tree.entry(entry(&c, main, "t3", EntryKind::TempVar)).offset, -16);
        let total: i32 = c
            .tree
            .scope(main)
            .entries
            .iter()
            .map(|e| c.tree.entry(*e).size)
            .sum();
        assert_eq!(c.tree.scope(main).size, total);
    }

    #[test]
    fn non_main_frames_account_for_the_reserved_header() {
        let c = run(
            "func scale(v: integer): integer { return (v * 2); }\n\
             func main(): void { write(scale(3)); }",
        );
        let scale = func_scope(&c, "scale");
        let entries: i32 = c
            .tree
            .scope(scale)
            .entries
            .iter()
            .map(|e| c.tree.entry(*e).size)
            .sum();
        // header: 4 return value + 4 return address + 4 saved FP
        assert_eq!(-c.tree.scope(scale).size, entries + 12);
    }

    #[test]
    fn offsets_chain_each_entry_below_its_predecessor() {
        let c = run(
            "func main(): void { let a: integer; let b: float; let m: integer[3]; write(a); }",
        );
        let main = func_scope(&c, "main");
        let mut previous = 0;
        for id in &c.tree.scope(main).entries {
            let e = c.tree.entry(*id);
            assert_eq!(e.offset + e.size, previous);
            previous = e.offset;
        }
    }

    #[test]
    fn struct_sizes_include_inherited_storage() {
        let c = run(
            "struct POINT { public let x: integer; public let y: integer; };\n\
             struct LINE inherits POINT { public let len: float; };\n\
             func main(): void { let l: LINE; write(1); }",
        );
        let point = c
            .tree
            .entry(c.tree.lookup(c.global, "POINT", EntryKind::Struct).unwrap())
            .link
            .unwrap();
        let line = c
            .tree
            .entry(c.tree.lookup(c.global, "LINE", EntryKind::Struct).unwrap())
            .link
            .unwrap();
        assert_eq!(c.tree.scope(point).size, 8);
        assert_eq!(c.tree.scope(line).size, 16);

        let main = func_scope(&c, "main");
        let l = entry(&c, main, "l", EntryKind::Var);
        assert_eq!(c.tree.entry(l).size, 16);
    }

    #[test]
    fn array_entries_multiply_element_storage() {
        let c = run("func main(): void { let grid: integer[4][4]; write(1); }");
        let main = func_scope(&c, "main");
        let grid = entry(&c, main, "grid", EntryKind::Var);
        assert_eq!(c.tree.entry(grid).size, 64);
    }

    #[test]
    fn member_literals_in_struct_scope_reserve_no_temporaries() {
        let c = run(
            "struct BOX { public let cells: integer[8]; };\n\
             func main(): void { write(1); }",
        );
        let box_scope = c
            .tree
            .entry(c.tree.lookup(c.global, "BOX", EntryKind::Struct).unwrap())
            .link
            .unwrap();
        assert!(c
            .tree
            .lookup_all_of_kind(box_scope, EntryKind::TempVar)
            .is_empty());
    }

    #[test]
    fn every_temporary_belongs_to_one_function_and_one_node() {
        let c = run("func main(): void { let x: integer; x = 1 + 2 * 3; write(x); }");
        let main = func_scope(&c, "main");
        let temps = c.tree.lookup_all_of_kind(main, EntryKind::TempVar);
        // literals 1, 2, 3 plus the two operator results
        assert_eq!(temps.len(), 5);

        let mut referenced = Vec::new();
        for i in 0..c.ast.len() {
            if let Some(t) = c.ast.node(crate::compiler::ast::NodeId(i)).temp {
                assert!(!referenced.contains(&t), "temporary shared between nodes");
                referenced.push(t);
            }
        }
        assert_eq!(referenced.len(), temps.len());
    }

    #[test]
    fn layout_is_idempotent() {
        let mut c = run(
            "struct P { public let x: integer; };\n\
             func id(v: integer): integer { return (v); }\n\
             func main(): void { let p: P; let n: integer; n = id(7); write(n); }",
        );
        let snapshot = |c: &Compilation| -> Vec<(i32, i32)> {
            c.tree
                .scope_ids()
                .into_iter()
                .flat_map(|s| {
                    let scope = c.tree.scope(s);
                    let mut rows = vec![(scope.size, scope.offset)];
                    rows.extend(
                        scope
                            .entries
                            .iter()
                            .map(|e| (c.tree.entry(*e).size, c.tree.entry(*e).offset)),
                    );
                    rows
                })
                .collect()
        };
        let before = snapshot(&c);
        compute_layout(&mut c.ast, c.root, &mut c.tree, c.global);
        assert_eq!(before, snapshot(&c));
    }
}
