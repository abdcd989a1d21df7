#[cfg(test)]
mod tests {
    use crate::compiler::semantics::symbol_table::EntryKind;
    use crate::compiler::{compile, Compilation};
    use crate::diagnostics::Code;

    fn run(source: &str) -> Compilation {
        compile(source).expect("test source must scan and parse")
    }

    fn errors_of(c: &Compilation, code: Code) -> usize {
        c.reporter
            .diagnostics()
            .iter()
            .filter(|d| d.code == code)
            .count()
    }

    #[test]
    fn empty_program_has_global_scope_and_no_diagnostics() {
        let c = run("");
        assert!(c.accept);
        assert!(c.reporter.diagnostics().is_empty());
        assert!(c.symbol_report.contains("| table: global"));
        assert_eq!(c.tree.scope(c.global).entries.len(), 0);
        // the emitter declines to produce a runnable program
        let asm = c.assembly.expect("skeleton still rendered");
        assert!(!asm.contains("entry"));
        assert!(asm.contains("buf"));
    }

    #[test]
    fn hello_integer_accepts_with_expected_symbols() {
        let c = run("func main(): void { let a: integer; a = 1; write(a); }");
        assert!(c.accept);
        assert!(c.reporter.diagnostics().is_empty());

        let main_entry = c
            .tree
            .lookup(c.global, "main", EntryKind::Func)
            .expect("main is declared");
        let main_scope = c.tree.entry(main_entry).link.unwrap();

        let a = c.tree.lookup(main_scope, "a", EntryKind::Var).unwrap();
        assert_eq!(c.tree.entry(a).size, 4);
        assert_eq!(c.tree.entry(a).offset, -4);
        assert_eq!(c.tree.entry(a).ty.to_string(), "integer");

        let t0 = c.tree.lookup(main_scope, "t0", EntryKind::TempVar).unwrap();
        assert_eq!(c.tree.entry(t0).ty.to_string(), "integer");
    }

    #[test]
    fn cyclic_inheritance_reports_the_cycle_path() {
        let c = run("struct A inherits B { };\nstruct B inherits A { };");
        assert!(!c.accept);
        assert_eq!(errors_of(&c, Code::CyclicDependency), 1);
        assert!(c.reporter.render().contains("A -> B -> A"));
        assert!(c.assembly.is_none());
    }

    #[test]
    fn cyclic_storage_dependency_is_distinct_from_inheritance() {
        let c = run(
            "struct NODE { public let next: NODE; };\nfunc main(): void { }",
        );
        assert!(!c.accept);
        assert!(c.reporter.render().contains("cyclic struct dependency"));
        assert!(c.assembly.is_none());
    }

    #[test]
    fn array_members_still_create_storage_dependencies() {
        let c = run(
            "struct RING { public let spokes: RING[4]; };\nfunc main(): void { }",
        );
        assert!(c.reporter.has_code(Code::CyclicDependency));
    }

    #[test]
    fn wrong_arity_call_names_function_and_argument_types() {
        let c = run(
            "func f(a: integer): integer { return (a); }\n\
             func main(): void { f(1, 2); }",
        );
        assert!(!c.accept);
        assert_eq!(errors_of(&c, Code::WrongArgumentCount), 1);
        assert_eq!(errors_of(&c, Code::WrongArgumentTypes), 0);
        let rendered = c.reporter.render();
        assert!(rendered.contains("\"f\""));
        assert!(rendered.contains("integer integer"));
        assert!(c.assembly.is_none());
    }

    #[test]
    fn override_of_inherited_method_warns_with_both_paths() {
        let c = run(
            "struct A { public func get(): integer; };\n\
             impl A { func get(): integer { return (1); } }\n\
             struct B inherits A { public func get(): integer; };\n\
             impl B { func get(): integer { return (2); } }\n\
             func main(): void { }",
        );
        assert!(c.accept, "an override is a warning, not an error");
        assert_eq!(errors_of(&c, Code::OverriddenInheritedMethod), 1);
        let rendered = c.reporter.render();
        assert!(rendered.contains("global::B"));
        assert!(rendered.contains("global::A"));
    }

    #[test]
    fn partial_array_indexing_is_a_dimension_mismatch() {
        let c = run("func main(): void { let a: integer[4][4]; a[1] = 2; }");
        assert!(!c.accept);
        assert_eq!(errors_of(&c, Code::ArrayDimensionMismatch), 1);
        assert_eq!(errors_of(&c, Code::AssignTypeMismatch), 0);
        assert!(c.reporter.render().contains("\"a[1]\""));
        assert!(c.assembly.is_none());
    }

    #[test]
    fn duplicate_declarations_are_reported_per_kind() {
        let c = run(
            "struct A { };\nstruct A { };\n\
             func f(): void { }\nfunc f(): void { }\n\
             func main(): void { let x: integer; let x: float; }",
        );
        assert_eq!(errors_of(&c, Code::DuplicateStruct), 1);
        assert_eq!(errors_of(&c, Code::DuplicateFreeFunction), 1);
        assert_eq!(errors_of(&c, Code::DuplicateLocal), 1);
        assert!(!c.accept);
    }

    #[test]
    fn duplicate_member_and_parameter() {
        let c = run(
            "struct A { public let m: integer; private let m: float; };\n\
             func g(p: integer, p: float): void { }\n\
             func main(): void { }",
        );
        assert_eq!(errors_of(&c, Code::DuplicateMember), 1);
        assert_eq!(errors_of(&c, Code::DuplicateLocal), 1);
    }

    #[test]
    fn overloads_warn_but_are_accepted() {
        let c = run(
            "func f(a: integer): integer { return (a); }\n\
             func f(a: float): float { return (a); }\n\
             func main(): void { let x: integer; x = f(3); write(x); }",
        );
        assert!(c.accept);
        assert_eq!(errors_of(&c, Code::OverloadedFreeFunction), 1);
        assert!(c.assembly.is_some());
    }

    #[test]
    fn member_shadowing_inherited_member_warns() {
        let c = run(
            "struct A { public let x: integer; };\n\
             struct B inherits A { public let x: float; };\n\
             func main(): void { }",
        );
        assert!(c.accept);
        assert_eq!(errors_of(&c, Code::MemberShadowsInherited), 1);
    }

    #[test]
    fn local_shadowing_member_warns_without_failing() {
        let c = run(
            "struct A { public let x: integer; public func get(): integer; };\n\
             impl A { func get(): integer { let x: integer; x = 1; return (x); } }\n\
             func main(): void { }",
        );
        assert!(c.accept, "a shadowing local never fails acceptance");
        assert_eq!(errors_of(&c, Code::LocalShadowsMember), 1);
    }

    #[test]
    fn undeclared_names_get_distinct_codes() {
        let c = run(
            "struct A { };\n\
             func main(): void { let a: A; x = 1; g(); a.foo(); }",
        );
        assert_eq!(errors_of(&c, Code::UndeclaredVariable), 1);
        assert_eq!(errors_of(&c, Code::UndeclaredFreeFunction), 1);
        assert_eq!(errors_of(&c, Code::UndeclaredMemberFunction), 1);
    }

    #[test]
    fn unknown_struct_in_declaration() {
        let c = run("func main(): void { let p: POINT; }");
        assert_eq!(errors_of(&c, Code::UnknownStructName), 1);
    }

    #[test]
    fn operand_mismatch_suppresses_the_dependent_assignment() {
        let c = run(
            "func main(): void { let a: integer; let b: float; a = a + b; }",
        );
        assert_eq!(errors_of(&c, Code::OperandTypeMismatch), 1);
        assert_eq!(errors_of(&c, Code::AssignTypeMismatch), 0);
    }

    #[test]
    fn assignment_type_mismatch() {
        let c = run("func main(): void { let a: integer; a = 1.5; }");
        assert_eq!(errors_of(&c, Code::AssignTypeMismatch), 1);
    }

    #[test]
    fn return_type_mismatch() {
        let c = run("func f(): integer { return (1.5); }\nfunc main(): void { }");
        assert_eq!(errors_of(&c, Code::ReturnTypeMismatch), 1);
    }

    #[test]
    fn return_inside_main_is_checked_against_void() {
        let c = run("func main(): void { return (1); }");
        assert_eq!(errors_of(&c, Code::ReturnTypeMismatch), 1);
    }

    #[test]
    fn dot_on_scalar_is_rejected() {
        let c = run("func main(): void { let i: integer; i.x = 1; }");
        assert_eq!(errors_of(&c, Code::DotOnNonStruct), 1);
    }

    #[test]
    fn non_integer_index_is_rejected() {
        let c = run(
            "func main(): void { let a: integer[3]; let f: float; a[f] = 1; }",
        );
        assert_eq!(errors_of(&c, Code::NonIntegerIndex), 1);
    }

    #[test]
    fn array_argument_dimension_mismatch() {
        let c = run(
            "func sum(v: integer[4]): integer { return (v[1]); }\n\
             func main(): void { let a: integer[4][4]; sum(a); }",
        );
        assert_eq!(errors_of(&c, Code::ArrayParamDimensionMismatch), 1);
    }

    #[test]
    fn wrong_argument_types_are_distinct_from_arity() {
        let c = run(
            "func f(a: integer): integer { return (a); }\n\
             func main(): void { f(1.5); }",
        );
        assert_eq!(errors_of(&c, Code::WrongArgumentTypes), 1);
        assert_eq!(errors_of(&c, Code::WrongArgumentCount), 0);
    }

    #[test]
    fn impl_for_unknown_struct() {
        let c = run("impl C { func g(): void { } }\nfunc main(): void { }");
        assert_eq!(errors_of(&c, Code::ImplForUnknownStruct), 1);
        assert!(!c.accept);
    }

    #[test]
    fn defined_but_undeclared_method() {
        let c = run(
            "struct A { public func f(): void; };\n\
             impl A { func f(): void { } func g(): void { } }\n\
             func main(): void { }",
        );
        assert_eq!(errors_of(&c, Code::DefinedUndeclaredMethod), 1);
        assert_eq!(errors_of(&c, Code::DeclaredUndefinedMethod), 0);
    }

    #[test]
    fn declared_but_undefined_method() {
        let c = run(
            "struct A { public func h(): integer; };\nfunc main(): void { }",
        );
        assert_eq!(errors_of(&c, Code::DeclaredUndefinedMethod), 1);
    }

    #[test]
    fn method_bodies_reach_members_and_inherited_members() {
        let c = run(
            "struct A { public let depth: integer; };\n\
             struct B inherits A { public let width: integer; public func area(): integer; };\n\
             impl B { func area(): integer { return (width * depth); } }\n\
             func main(): void { }",
        );
        assert!(c.accept, "{}", c.reporter.render());
    }

    #[test]
    fn self_resolves_to_the_owning_struct() {
        let c = run(
            "struct A { public let v: integer; public func get(): integer; };\n\
             impl A { func get(): integer { return (self.v); } }\n\
             func main(): void { }",
        );
        assert!(c.accept, "{}", c.reporter.render());
    }

    #[test]
    fn semantic_types_are_stable_across_a_second_pass() {
        let mut c = run(
            "func f(a: integer): integer { return (a + 1); }\n\
             func main(): void { let x: integer; x = f(2) * 3; write(x); }",
        );
        assert!(c.accept);
        let before: Vec<Option<String>> = (0..c.ast.len())
            .map(|i| {
                c.ast
                    .node(crate::compiler::ast::NodeId(i))
                    .sem_type
                    .clone()
                    .map(|t| t.to_string())
            })
            .collect();

        let mut reporter = crate::diagnostics::Reporter::new();
        let accept =
            crate::compiler::semantics::checker::check(&mut c.ast, c.root, &c.tree, &mut reporter);
        assert!(accept);

        let after: Vec<Option<String>> = (0..c.ast.len())
            .map(|i| {
                c.ast
                    .node(crate::compiler::ast::NodeId(i))
                    .sem_type
                    .clone()
                    .map(|t| t.to_string())
            })
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn diagnostics_render_code_severity_then_message() {
        let c = run("func main(): void { x = 1; }");
        let rendered = c.reporter.render();
        let first = rendered.lines().next().unwrap();
        assert!(first.starts_with("11.2 [error] "));
        assert!(first.contains("global::main"));
    }

    #[test]
    fn identical_input_produces_identical_output() {
        let source = "struct A inherits B { };\nstruct B inherits A { };";
        let first = run(source);
        let second = run(source);
        assert_eq!(first.reporter.render(), second.reporter.render());
        assert_eq!(first.symbol_report, second.symbol_report);
    }
}
