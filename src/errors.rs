use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum AsmError {
    #[error("Syntax Error: {0}")]
    SyntaxError(#[from] pest::error::Error<crate::parser::Rule>),

    #[error("Parse Error on line {line}: {reason}")]
    ParseError { line: usize, reason: String },

    #[error("Symbol Error on line {line}: {reason}")]
    SymbolError { line: usize, reason: String },

    #[error("Range Error on line {line}: {reason}")]
    RangeError { line: usize, reason: String },

    #[error("Directive Error on line {line}: {reason}")]
    DirectiveError { line: usize, reason: String },

    #[error("Encoding Error on line {line}: {reason}")]
    EncodeError { line: usize, reason: String },

    #[error("Symbol Error: {reason}")]
    SymbolErrorNoLine { reason: String },
}
