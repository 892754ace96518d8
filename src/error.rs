use draco_protocol::ConfigError;
use thiserror::Error;

/// Input errors. All of these are raised before any search begins;
/// running out of attempts is reported through `Outcome::NotFound` instead.
#[derive(Debug, Error)]
pub enum DracoError {
    #[error("Invalid target nucleotide '{symbol}' at position {position}")]
    InvalidTarget { position: usize, symbol: char },
    #[error("The target profile has no residues to encode")]
    EmptyTarget,
    #[error("No codons for residue '{0}' in the codon usage table")]
    MissingCodons(char),
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
    #[error("Bad codon usage table: {0}")]
    CodonTable(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}
