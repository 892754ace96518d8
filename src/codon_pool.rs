//! Per-attempt codon budget and weighted codon sampling.

use crate::{amino_acids, codon_usage::CodonUsage, error::DracoError};
use rand::Rng;
use std::collections::BTreeMap;

/// How many more times one codon may be used.
#[derive(Clone, Debug, PartialEq)]
pub struct CodonAllowance {
    pub triplet: String,
    pub remaining: usize,
}

/// Codon budget of one optimization attempt.
///
/// For every residue it tracks how many instances are still to be encoded
/// and, per codon in table order, how many uses are left. A codon starts
/// with `round(fraction * residue count) + handicap` uses.
#[derive(Clone, Debug, PartialEq)]
pub struct CodonPool {
    handicap: usize,
    residues: BTreeMap<char, usize>,
    max_usage: BTreeMap<char, Vec<CodonAllowance>>,
}

impl CodonPool {
    pub fn new(
        residue_counts: &BTreeMap<char, usize>,
        codons: &CodonUsage,
        handicap: usize,
    ) -> Result<Self, DracoError> {
        let mut max_usage = BTreeMap::new();
        for (&residue, &count) in residue_counts {
            let variants = codons.codons_for(residue);
            if variants.is_empty() {
                return Err(DracoError::MissingCodons(residue));
            }
            let allowances = variants
                .iter()
                .map(|codon| CodonAllowance {
                    triplet: codon.triplet.clone(),
                    remaining: (codon.fraction * count as f64).round() as usize + handicap,
                })
                .collect();
            max_usage.insert(residue, allowances);
        }
        Ok(Self {
            handicap,
            residues: residue_counts.clone(),
            max_usage,
        })
    }

    /// The same budget with every codon allowance raised by `handicap`.
    pub fn with_handicap(&self, handicap: usize) -> Self {
        let mut ret = self.clone();
        let extra = handicap.saturating_sub(self.handicap);
        ret.max_usage
            .values_mut()
            .flat_map(|v| v.iter_mut())
            .for_each(|a| a.remaining += extra);
        ret.handicap = self.handicap.max(handicap);
        ret
    }

    #[inline(always)]
    pub fn handicap(&self) -> usize {
        self.handicap
    }

    /// Instances of a residue still to be encoded.
    pub fn remaining(&self, residue: char) -> usize {
        self.residues.get(&residue).copied().unwrap_or(0)
    }

    pub fn residues(&self) -> &BTreeMap<char, usize> {
        &self.residues
    }

    pub fn allowances(&self, residue: char) -> &[CodonAllowance] {
        self.max_usage
            .get(&residue)
            .map(|v| v.as_slice())
            .unwrap_or_default()
    }

    /// Running totals of the codon allowances of a residue, in table order.
    pub fn thresholds(&self, residue: char) -> Vec<usize> {
        self.allowances(residue)
            .iter()
            .scan(0, |total, a| {
                *total += a.remaining;
                Some(*total)
            })
            .collect()
    }

    /// A copy of the budget to go back to if a fragment is rejected.
    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    pub fn restore(&mut self, snapshot: Self) {
        *self = snapshot;
    }

    /// Draws a codon for `residue` and takes it out of the budget.
    ///
    /// The draw is uniform over `0..=remaining(residue)`; the first codon
    /// whose running total reaches the draw wins. Codons with no uses left
    /// are never picked unless nothing else is left. If the draw is beyond
    /// every total, which rounding of the allowances can cause, the last
    /// codon with uses left is taken.
    pub fn sample<R: Rng>(&mut self, residue: char, rng: &mut R) -> Option<String> {
        let remaining = self.remaining(residue);
        let allowances = self.max_usage.get_mut(&residue)?;
        let toss = rng.gen_range(0..=remaining);

        let mut total = 0;
        let mut chosen = None;
        for (i, allowance) in allowances.iter().enumerate() {
            if allowance.remaining == 0 {
                continue;
            }
            total += allowance.remaining;
            if toss <= total {
                chosen = Some(i);
                break;
            }
        }
        let chosen = chosen
            .or_else(|| allowances.iter().rposition(|a| a.remaining > 0))
            .unwrap_or(allowances.len().checked_sub(1)?);

        let allowance = &mut allowances[chosen];
        allowance.remaining = allowance.remaining.saturating_sub(1);
        if let Some(count) = self.residues.get_mut(&residue) {
            *count = count.saturating_sub(1);
        }
        Some(allowance.triplet.clone())
    }

    /// Encodes a protein fragment codon by codon. Symbols that are not
    /// amino acids are skipped.
    pub fn generate_fragment<R: Rng>(
        &mut self,
        fragment: &str,
        rng: &mut R,
    ) -> Result<Vec<u8>, DracoError> {
        let mut dna = Vec::with_capacity(fragment.len() * 3);
        for residue in fragment.chars().filter(|c| amino_acids::is_protein_letter(*c)) {
            let codon = self
                .sample(residue, rng)
                .ok_or(DracoError::MissingCodons(residue))?;
            dna.extend_from_slice(codon.as_bytes());
        }
        Ok(dna)
    }
}
