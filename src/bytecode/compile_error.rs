#[derive(Debug, Clone, PartialEq)]
pub enum CodegenError {
    /// An identifier reached the translator without an assigned memory slot.
    UnknownVariable { name: String },
}

impl std::fmt::Display for CodegenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodegenError::UnknownVariable { name } => {
                write!(f, "codegen error: no address for variable `{}`", name)
            }
        }
    }
}
