// ABOUTME: Error types for the reader, evaluator, matcher, and emitter subsystems

use thiserror::Error;

/// A 1-based source position, shared by every subsystem that reports user-visible
/// failures in the `[Error] file(line, col): message` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourcePos {
    pub line: u32,
    pub col: u32,
}

impl SourcePos {
    pub const fn new(line: u32, col: u32) -> Self {
        SourcePos { line, col }
    }
}

/// Parser ("L0 reader") failure kinds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("unexpected end of file")]
    UnexpectedEof,

    #[error("invalid syntax: {0}")]
    InvalidSyntax(String),

    #[error("out of memory")]
    Memory,

    #[error("runtime error: {0}")]
    Runtime(String),
}

/// Evaluator failure kinds.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("unbound symbol: {0}")]
    UnboundSymbol(String),

    #[error("value is not applicable: {0}")]
    NotApplicable(String),

    #[error("{function}: expected {expected} argument{}, got {actual}", if *.expected == 1 { "" } else { "s" })]
    ArityMismatch {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("{function}: expected {expected}, got {actual} at argument {position}")]
    TypeError {
        function: String,
        expected: String,
        actual: String,
        position: usize,
    },

    #[error("{0}")]
    Custom(String),
}

impl EvalError {
    pub fn type_error(
        function: &str,
        expected: &str,
        actual: impl Into<String>,
        position: usize,
    ) -> Self {
        EvalError::TypeError {
            function: function.to_string(),
            expected: expected.to_string(),
            actual: actual.into(),
            position,
        }
    }

    pub fn arity_mismatch(function: &str, expected: usize, actual: usize) -> Self {
        EvalError::ArityMismatch {
            function: function.to_string(),
            expected,
            actual,
        }
    }
}

/// Overload-resolution ("sigmatch") failure kinds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchErrorKind {
    #[error("invalid match")]
    InvalidMatch,
    #[error("type variable already bound to a different type")]
    InvalidRematch,
    #[error("constraint not satisfied")]
    ConstraintMismatch,
    #[error("formal type is not at the end of the parameter list")]
    FormalTypeNotAtEnd,
    #[error("formal parameter lists do not match")]
    FormalParamsMismatch,
    #[error("calling convention mismatch")]
    CallConvMismatch,
    #[error("subtype coercion unavailable in a mutable context")]
    UnavailableSubtypeRelation,
    #[error("concept solving is not implemented")]
    NotImplementedConcept,
    #[error("implicit conversion requires a mutable parameter")]
    ImplicitConversionNotMutable,
    #[error("unhandled formal type")]
    UnhandledType,
    #[error("argument does not match formal type")]
    Mismatch,
    #[error("missing explicit generic parameter")]
    MissingExplicitGenericParameter,
    #[error("extra generic parameter")]
    ExtraGenericParameter,
    #[error("routine is not generic")]
    RoutineIsNotGeneric,
    #[error("could not infer type variable")]
    CouldNotInferTypeVar,
    #[error("too many arguments")]
    TooManyArguments,
    #[error("too few arguments")]
    TooFewArguments,
}

/// The first-error record retained by a `MatchState`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchError {
    pub kind: MatchErrorKind,
    /// 1-based argument position, 0 when not applicable (e.g. a type-variable error).
    pub position: usize,
    pub expected: String,
    pub got: String,
    pub offending_typevar: Option<String>,
}

impl MatchError {
    pub fn new(
        kind: MatchErrorKind,
        position: usize,
        expected: impl Into<String>,
        got: impl Into<String>,
    ) -> Self {
        MatchError {
            kind,
            position,
            expected: expected.into(),
            got: got.into(),
            offending_typevar: None,
        }
    }

    pub fn with_typevar(mut self, tv: impl Into<String>) -> Self {
        self.offending_typevar = Some(tv.into());
        self
    }
}

impl std::fmt::Display for MatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at argument {}", self.kind, self.position)?;
        if let Some(tv) = &self.offending_typevar {
            write!(f, " (type variable {tv})")?;
        }
        Ok(())
    }
}

impl std::error::Error for MatchError {}

/// Emitter failure: any grammar violation is fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{rule}: {message}")]
pub struct EmitError {
    pub rule: String,
    pub message: String,
    pub pos: SourcePos,
}

impl EmitError {
    pub fn new(rule: &str, message: impl Into<String>, pos: SourcePos) -> Self {
        EmitError {
            rule: rule.to_string(),
            message: message.into(),
            pos,
        }
    }
}

/// Composed crate-level error, used by the CLI collaborator to print the single-line
/// `[Error] file(line, col): message` diagnostic regardless of which subsystem failed.
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    #[error("{0}")]
    Read(ReadError, SourcePos),
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error(transparent)]
    Match(#[from] MatchError),
    #[error(transparent)]
    Emit(#[from] EmitError),
}

impl CoreError {
    /// The reader reports its own line/col directly since `ReadError` carries none.
    pub fn read(kind: ReadError, pos: SourcePos) -> Self {
        CoreError::Read(kind, pos)
    }

    /// The position to report for this error, when known; the reader and emitter carry
    /// real positions, the evaluator and matcher report position 0 (no file/line
    /// tracking at that layer).
    pub fn pos(&self) -> SourcePos {
        match self {
            CoreError::Read(_, pos) => *pos,
            CoreError::Emit(e) => e.pos,
            _ => SourcePos::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_mismatch_pluralizes() {
        let e = EvalError::arity_mismatch("f", 1, 2);
        assert_eq!(e.to_string(), "f: expected 1 argument, got 2");
        let e = EvalError::arity_mismatch("f", 2, 1);
        assert_eq!(e.to_string(), "f: expected 2 arguments, got 1");
    }

    #[test]
    fn match_error_display_includes_typevar() {
        let e =
            MatchError::new(MatchErrorKind::ConstraintMismatch, 2, "int", "string").with_typevar("T");
        assert_eq!(
            e.to_string(),
            "constraint not satisfied at argument 2 (type variable T)"
        );
    }

    #[test]
    fn core_error_reports_position_only_for_read_and_emit() {
        let read = CoreError::read(ReadError::UnexpectedEof, SourcePos::new(3, 1));
        assert_eq!(read.pos(), SourcePos::new(3, 1));

        let eval: CoreError = EvalError::UnboundSymbol("x".to_string()).into();
        assert_eq!(eval.pos(), SourcePos::default());

        let matched: CoreError =
            MatchError::new(MatchErrorKind::TooFewArguments, 0, "", "").into();
        assert_eq!(matched.pos(), SourcePos::default());

        let emit: CoreError = EmitError::new("operand", "bad register", SourcePos::new(9, 4)).into();
        assert_eq!(emit.pos(), SourcePos::new(9, 4));
    }
}
