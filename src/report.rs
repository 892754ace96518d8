//! Inspection of finished coding sequences.

use crate::{
    codon_usage::CodonUsage,
    composition,
    optimizer::Design,
    repeats::{RepeatScanner, Repeats},
};
use draco_protocol::{CodonUsageSummary, DesignReport, MotifHit, OptimizationConfig, RepeatHit};
use std::collections::BTreeMap;

/// Scans a whole coding sequence for everything the optimizer checks
/// fragment by fragment, and compares its codon usage with the table.
pub fn inspect(sequence: &[u8], config: &OptimizationConfig, codons: &CodonUsage) -> DesignReport {
    let max_window = composition::max_gc_window(sequence, config.gc_window, f64::INFINITY);
    let motifs = config.normalized_motifs();
    DesignReport {
        sequence: String::from_utf8_lossy(sequence).into_owned(),
        protein: codons.translate(sequence).unwrap_or_default(),
        length: sequence.len(),
        gc_percent: composition::gc_percent(sequence),
        max_window_gc_percent: max_window.gc(),
        longest_homopolymer: composition::longest_homopolymer(sequence),
        direct_repeats: repeat_hits(RepeatScanner::direct(config.repeat_lengths()).scan(sequence)),
        inverted_repeats: repeat_hits(
            RepeatScanner::inverted(config.inverted_repeat_lengths()).scan(sequence),
        ),
        forbidden_motifs: composition::find_all_motifs(sequence, &motifs)
            .into_iter()
            .map(|(position, motif)| MotifHit {
                motif: String::from_utf8_lossy(motif).into_owned(),
                position,
            })
            .collect(),
        codon_usage: codon_usage_summary(sequence, codons),
        ..Default::default()
    }
}

/// Report for an optimizer result, with the search statistics filled in.
pub fn design_report(
    design: &Design,
    seed: Option<u64>,
    config: &OptimizationConfig,
    codons: &CodonUsage,
) -> DesignReport {
    DesignReport {
        seed,
        attempts: design.attempts,
        handicap: design.handicap,
        fragment_retries: design.fragment_retries,
        ..inspect(&design.sequence_bytes(), config, codons)
    }
}

fn repeat_hits(repeats: Repeats) -> Vec<RepeatHit> {
    repeats
        .into_iter()
        .map(|(positions, word)| RepeatHit {
            word: String::from_utf8_lossy(&word).into_owned(),
            positions,
        })
        .collect()
}

/// Use of every codon of the residues present, in table order. Incomplete
/// trailing codons and codons missing from the table are not counted.
pub fn codon_usage_summary(sequence: &[u8], codons: &CodonUsage) -> Vec<CodonUsageSummary> {
    let mut per_codon: BTreeMap<&[u8], usize> = BTreeMap::new();
    for codon in sequence.chunks_exact(3) {
        *per_codon.entry(codon).or_insert(0) += 1;
    }
    let mut per_residue: BTreeMap<char, usize> = BTreeMap::new();
    for record in codons.codons() {
        let count = per_codon
            .get(record.triplet.as_bytes())
            .copied()
            .unwrap_or(0);
        *per_residue.entry(record.residue).or_insert(0) += count;
    }

    codons
        .codons()
        .iter()
        .filter(|record| per_residue.get(&record.residue).copied().unwrap_or(0) > 0)
        .map(|record| {
            let count = per_codon
                .get(record.triplet.as_bytes())
                .copied()
                .unwrap_or(0);
            let total = per_residue.get(&record.residue).copied().unwrap_or(0);
            CodonUsageSummary {
                codon: record.triplet.clone(),
                residue: record.residue,
                count,
                observed_fraction: count as f64 / total as f64,
                table_fraction: record.fraction,
            }
        })
        .collect()
}
