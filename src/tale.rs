//! TAL effector repeat arrays.
//!
//! Every nucleotide of the DNA target is bound by one 34 residue repeat that
//! differs from its neighbours only in the repeat variable diresidue (RVD).
//! The last repeat is a truncated half repeat.

use crate::{error::DracoError, iupac_code::IupacCode, target::TargetProfile};
use std::fmt;

const REPEAT_HEAD: &str = "LTPDQVVAIAS";
const REPEAT_TAIL: &str = "GGKQALETVQRLLPVLCQDHG";
const LAST_REPEAT_TAIL: &str = "GGKQALE";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rvd {
    NN,
    NI,
    NG,
    HD,
    NS,
}

impl Rvd {
    pub fn for_nucleotide(nucleotide: u8) -> Option<Self> {
        let code = IupacCode::from_letter(nucleotide);
        match code {
            IupacCode::G | IupacCode::R => Some(Rvd::NN),
            IupacCode::A => Some(Rvd::NI),
            IupacCode::T => Some(Rvd::NG),
            IupacCode::C => Some(Rvd::HD),
            _ if code.degeneracy() > 1 => Some(Rvd::NS),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rvd::NN => "NN",
            Rvd::NI => "NI",
            Rvd::NG => "NG",
            Rvd::HD => "HD",
            Rvd::NS => "NS",
        }
    }
}

impl fmt::Display for Rvd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TalRepeat {
    rvd: Rvd,
    last: bool,
}

impl TalRepeat {
    pub fn new(rvd: Rvd, last: bool) -> Self {
        Self { rvd, last }
    }

    #[inline(always)]
    pub fn rvd(&self) -> Rvd {
        self.rvd
    }

    #[inline(always)]
    pub fn is_last(&self) -> bool {
        self.last
    }

    pub fn sequence(&self) -> String {
        format!("{REPEAT_HEAD}{}{}", self.rvd, self.tail())
    }

    /// The repeat with its RVD masked as `XX`.
    pub fn template(&self) -> String {
        format!("{REPEAT_HEAD}XX{}", self.tail())
    }

    fn tail(&self) -> &'static str {
        if self.last {
            LAST_REPEAT_TAIL
        } else {
            REPEAT_TAIL
        }
    }
}

#[derive(Clone, Debug)]
pub struct Tale {
    target: String,
    repeats: Vec<TalRepeat>,
    upstream: Option<String>,
    downstream: Option<String>,
}

impl Tale {
    pub fn new(
        target: &str,
        upstream: Option<&str>,
        downstream: Option<&str>,
    ) -> Result<Self, DracoError> {
        let target = target.trim();
        if target.is_empty() {
            return Err(DracoError::EmptyTarget);
        }
        let repeats = target
            .bytes()
            .enumerate()
            .map(|(position, nucleotide)| {
                Rvd::for_nucleotide(nucleotide)
                    .map(|rvd| TalRepeat::new(rvd, position + 1 == target.len()))
                    .ok_or(DracoError::InvalidTarget {
                        position,
                        symbol: nucleotide as char,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            target: target.to_string(),
            repeats,
            upstream: upstream.map(|s| s.to_string()),
            downstream: downstream.map(|s| s.to_string()),
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn repeats(&self) -> &[TalRepeat] {
        &self.repeats
    }

    pub fn n_repeats(&self) -> usize {
        self.repeats.len()
    }

    /// Template of the first repeat.
    pub fn template(&self) -> Option<String> {
        self.repeats.first().map(|r| r.template())
    }

    pub fn profile(&self) -> TargetProfile {
        TargetProfile {
            upstream: self.upstream.clone(),
            units: self.repeats.iter().map(|r| r.sequence()).collect(),
            downstream: self.downstream.clone(),
        }
    }

    pub fn protein(&self) -> String {
        self.profile().protein()
    }
}

impl fmt::Display for Tale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.protein())
    }
}
