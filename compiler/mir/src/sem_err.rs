use thiserror::Error;

/// Semantic faults diagnosed while lowering the AST to TACKY. The first fault
/// aborts the compilation; there is no recovery.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum SemErr {
    #[error("'break' outside of a loop")]
    BreakOutsideLoop,
    #[error("'continue' outside of a loop")]
    ContinueOutsideLoop,
    #[error("use of undeclared variable '{0}'")]
    UndeclaredVariable(String),
    #[error("call to undeclared function '{0}'")]
    UndeclaredFunction(String),
    #[error("redefinition of function '{0}'")]
    FunctionRedefinition(String),
    #[error("redefinition of variable '{0}'")]
    VariableRedefinition(String),
    #[error("wrong number of arguments in call to '{name}': expected {expected}, found {found}")]
    WrongArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("initializer for '{0}' is not a constant expression")]
    NonConstantInitializer(String),
}

pub type SemanticResult<T> = Result<T, SemErr>;
