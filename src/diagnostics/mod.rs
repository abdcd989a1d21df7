/*!
Classified diagnostics for the semantic passes.

Every finding carries a stable classification code, a severity, and a
human-readable message naming the offending identifier and the scope it was
found in. The passes never abort on a finding; they append to a [`Reporter`]
and keep walking so one run surfaces as many independent problems as
possible.
*/

pub mod config;

use std::fmt;

/// Stable classification for every finding the passes can produce. The
/// `Display` form is the numeric prefix each diagnostic line starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    DefinedUndeclaredMethod,
    DeclaredUndefinedMethod,
    ImplForUnknownStruct,
    DuplicateStruct,
    DuplicateFreeFunction,
    DuplicateMember,
    DuplicateLocal,
    MemberShadowsInherited,
    LocalShadowsMember,
    OverloadedFreeFunction,
    OverloadedMember,
    OverriddenInheritedMethod,
    OperandTypeMismatch,
    AssignTypeMismatch,
    ReturnTypeMismatch,
    UndeclaredVariable,
    UndeclaredMemberFunction,
    UndeclaredFreeFunction,
    UnknownStructName,
    WrongArgumentCount,
    WrongArgumentTypes,
    ArrayDimensionMismatch,
    NonIntegerIndex,
    ArrayParamDimensionMismatch,
    CyclicDependency,
    DotOnNonStruct,
}

impl Code {
    pub fn severity(self) -> Severity {
        match self {
            Code::MemberShadowsInherited
            | Code::LocalShadowsMember
            | Code::OverloadedFreeFunction
            | Code::OverloadedMember
            | Code::OverriddenInheritedMethod => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self {
            Code::DefinedUndeclaredMethod => "6.1",
            Code::DeclaredUndefinedMethod => "6.2",
            Code::ImplForUnknownStruct => "6.3",
            Code::DuplicateStruct => "8.1",
            Code::DuplicateFreeFunction => "8.2",
            Code::DuplicateMember => "8.3",
            Code::DuplicateLocal => "8.4",
            Code::MemberShadowsInherited => "8.5",
            Code::LocalShadowsMember => "8.6",
            Code::OverloadedFreeFunction => "9.1",
            Code::OverloadedMember => "9.2",
            Code::OverriddenInheritedMethod => "9.3",
            Code::OperandTypeMismatch => "10.1",
            Code::AssignTypeMismatch => "10.2",
            Code::ReturnTypeMismatch => "10.3",
            Code::UndeclaredVariable => "11.2",
            Code::UndeclaredMemberFunction => "11.3",
            Code::UndeclaredFreeFunction => "11.4",
            Code::UnknownStructName => "11.5",
            Code::WrongArgumentCount => "12.1",
            Code::WrongArgumentTypes => "12.2",
            Code::ArrayDimensionMismatch => "13.1",
            Code::NonIntegerIndex => "13.2",
            Code::ArrayParamDimensionMismatch => "13.3",
            Code::CyclicDependency => "14.1",
            Code::DotOnNonStruct => "15.1",
        };
        f.write_str(prefix)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("[error]"),
            Severity::Warning => f.write_str("[warning]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub code: Code,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.code, self.severity, self.message)
    }
}

/// Append-only sink shared by every pass. Order of arrival is the order of
/// the rendered stream.
#[derive(Debug, Default)]
pub struct Reporter {
    diagnostics: Vec<Diagnostic>,
}

impl Reporter {
    pub fn new() -> Reporter {
        Reporter {
            diagnostics: Vec::new(),
        }
    }

    pub fn report(&mut self, code: Code, message: String) {
        self.diagnostics.push(Diagnostic {
            code,
            severity: code.severity(),
            message,
        });
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn has_code(&self, code: Code) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }

    /// Render the stream, one diagnostic per line, each line newline
    /// terminated.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for d in &self.diagnostics {
            out.push_str(&d.to_string());
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_render_as_stable_prefixes() {
        assert_eq!(Code::DuplicateStruct.to_string(), "8.1");
        assert_eq!(Code::CyclicDependency.to_string(), "14.1");
        assert_eq!(Code::DotOnNonStruct.to_string(), "15.1");
    }

    #[test]
    fn shadowing_and_overloads_are_warnings() {
        assert_eq!(Code::LocalShadowsMember.severity(), Severity::Warning);
        assert_eq!(Code::OverloadedMember.severity(), Severity::Warning);
        assert_eq!(Code::DuplicateLocal.severity(), Severity::Error);
    }

    #[test]
    fn rendered_lines_are_newline_terminated() {
        let mut reporter = Reporter::new();
        reporter.report(
            Code::UndeclaredVariable,
            "undeclared variable \"x\" in global::main".into(),
        );
        let text = reporter.render();
        assert_eq!(
            text,
            "11.2 [error] undeclared variable \"x\" in global::main\n"
        );
        assert!(reporter.has_errors());
    }
}
