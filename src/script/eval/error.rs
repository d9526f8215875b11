use std::fmt;

/// Identifies what is being evaluated. Threaded through evaluation so
/// diagnostics and traces can tell a top-level script apart from the body of
/// a function or a stored expression being reduced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Script,
    Function(String),
    Stored(String),
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Caller::Script => f.write_str("script"),
            Caller::Function(name) => write!(f, "function {}", name),
            Caller::Stored(name) => write!(f, "stored expression {}", name),
        }
    }
}

// Messages shared by several evaluation rules

pub(crate) fn not_found(name: &str) -> String {
    format!("{} not found", name)
}

pub(crate) fn depth_limit(max_depth: u32) -> String {
    format!("maximum depth of {} reached", max_depth)
}

pub(crate) fn out_of_bounds(index: i64, len: usize) -> String {
    format!("index {} is out of bounds: array length is {}", index, len)
}

pub(crate) fn not_a_member(name: &str, kind: &str) -> String {
    format!("{} is not a member of {}", name, kind)
}

pub(crate) fn argument_count(name: &str, expected: usize, got: usize) -> String {
    format!("{} expects {} arguments but got {}", name, expected, got)
}

pub(crate) fn not_callable(kind: &str) -> String {
    format!("{} is not callable", kind)
}

pub(crate) fn range_too_large(range: &impl fmt::Display) -> String {
    format!("range {} has too many values to count", range)
}
