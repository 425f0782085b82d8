use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid codeword length: expected {expected} bytes, got {got}")]
    InvalidCodewordLength { expected: usize, got: usize },

    #[error("uncorrectable codeword: {found} error locations exceed capacity")]
    TooManyErrors { found: usize },

    #[error("uncorrectable codeword: nonzero syndromes but no error locations")]
    NoErrorLocations,

    #[error("uncorrectable codeword: locator degree {degree} but {roots} roots found")]
    LocatorMismatch { degree: usize, roots: usize },

    #[error("uncorrectable codeword: zero locator derivative at an error position")]
    ForneyDivisionByZero,

    #[error("uncorrectable codeword: syndromes nonzero after correction")]
    CorrectionFailed,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Whether the error describes a codeword the decoder could not repair,
    /// as opposed to input that was malformed to begin with.
    pub fn is_uncorrectable(&self) -> bool {
        matches!(
            self,
            Error::TooManyErrors { .. }
                | Error::NoErrorLocations
                | Error::LocatorMismatch { .. }
                | Error::ForneyDivisionByZero
                | Error::CorrectionFailed
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
