use codon_usage::CodonUsage;
use lazy_static::lazy_static;

pub mod about;
pub mod amino_acids;
pub mod codon_pool;
pub mod codon_usage;
pub mod composition;
pub mod error;
pub mod iupac_code;
pub mod optimizer;
pub mod output;
pub mod repeats;
pub mod report;
pub mod tale;
pub mod target;

pub use draco_protocol::{DesignReport, OptimizationConfig};
pub use error::DracoError;
pub use optimizer::{Design, Draco, NoProgress, Outcome, Progress};
pub use target::TargetProfile;

lazy_static! {
    // Codon usage of Drosophila melanogaster, the default table
    pub static ref DMEL_CODON_USAGE: CodonUsage = CodonUsage::drosophila_melanogaster();
}
