use serde::{Deserialize, Serialize};

/// A repeated word and every position it was found at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatHit {
    pub word: String,
    pub positions: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotifHit {
    pub motif: String,
    pub position: usize,
}

/// Observed use of one codon in a design compared to the usage table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodonUsageSummary {
    pub codon: String,
    pub residue: char,
    pub count: usize,
    pub observed_fraction: f64,
    pub table_fraction: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignReport {
    pub seed: Option<u64>,
    pub sequence: String,
    pub protein: String,
    pub length: usize,
    pub attempts: usize,
    pub handicap: usize,
    pub fragment_retries: usize,
    pub gc_percent: f64,
    pub max_window_gc_percent: f64,
    pub longest_homopolymer: usize,
    pub direct_repeats: Vec<RepeatHit>,
    pub inverted_repeats: Vec<RepeatHit>,
    pub forbidden_motifs: Vec<MotifHit>,
    pub codon_usage: Vec<CodonUsageSummary>,
}

impl DesignReport {
    /// True if the inspection found nothing the design should have avoided.
    pub fn is_clean(&self) -> bool {
        self.direct_repeats.is_empty()
            && self.inverted_repeats.is_empty()
            && self.forbidden_motifs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_json() {
        let report = DesignReport {
            sequence: "ATGAAA".to_string(),
            protein: "MK".to_string(),
            length: 6,
            direct_repeats: vec![RepeatHit {
                word: "ATG".to_string(),
                positions: vec![0, 9],
            }],
            ..Default::default()
        };
        assert!(!report.is_clean());
        let text = serde_json::to_string(&report).unwrap();
        let back: DesignReport = serde_json::from_str(&text).unwrap();
        assert_eq!(back.direct_repeats[0].positions, vec![0, 9]);
        assert_eq!(back.protein, "MK");
    }
}
