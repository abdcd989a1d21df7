/*!
The types a Moon-language value can have.

Declared types are either a scalar word (`integer`, `float`, `void`, or a
struct name) or an array of one of those with a fixed shape known at
declaration time. [`SemType::Error`] is the sentinel the checker propagates
through an expression once a child has already been reported, so ancestors
stay quiet.

The `Display` form is the classic bracketed string (`integer[4][4]`), which
is what the symbol-table report and the diagnostics print.
*/

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum SemType {
    Integer,
    Float,
    Void,
    Struct(String),
    Array { elem: Box<SemType>, dims: Vec<u32> },
    Error,
}

impl SemType {
    /// Type of a declaration: the scalar named by `word` wrapped in the
    /// declared array shape, if any.
    pub fn declared(word: &str, dims: &[u32]) -> SemType {
        let scalar = SemType::scalar(word);
        if dims.is_empty() {
            scalar
        } else {
            SemType::Array {
                elem: Box::new(scalar),
                dims: dims.to_vec(),
            }
        }
    }

    pub fn scalar(word: &str) -> SemType {
        match word {
            "integer" => SemType::Integer,
            "float" => SemType::Float,
            "void" => SemType::Void,
            _ => SemType::Struct(word.to_string()),
        }
    }

    /// Strips every array suffix, yielding the element type.
    pub fn trim(&self) -> SemType {
        match self {
            SemType::Array { elem, .. } => (**elem).clone(),
            other => other.clone(),
        }
    }

    /// Number of declared dimensions; zero for scalars.
    pub fn dims(&self) -> usize {
        match self {
            SemType::Array { dims, .. } => dims.len(),
            _ => 0,
        }
    }

    /// Product of the declared dimensions; one for scalars.
    pub fn cells(&self) -> u32 {
        match self {
            SemType::Array { dims, .. } => dims.iter().product(),
            _ => 1,
        }
    }

    pub fn shape(&self) -> &[u32] {
        match self {
            SemType::Array { dims, .. } => dims,
            _ => &[],
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SemType::Error)
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(self, SemType::Integer | SemType::Float)
    }

    pub fn struct_name(&self) -> Option<&str> {
        match self {
            SemType::Struct(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for SemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemType::Integer => f.write_str("integer"),
            SemType::Float => f.write_str("float"),
            SemType::Void => f.write_str("void"),
            SemType::Struct(name) => f.write_str(name),
            SemType::Array { elem, dims } => {
                write!(f, "{}", elem)?;
                for d in dims {
                    write!(f, "[{}]", d)?;
                }
                Ok(())
            }
            SemType::Error => f.write_str("errortype"),
        }
    }
}
