//! Randomized backtracking codon assignment.
//!
//! One attempt encodes the target profile fragment by fragment. Every
//! fragment after the first is generated, checked against the sequence
//! assembled so far and either kept or rolled back and generated again.
//! An attempt that cannot place a fragment is thrown away, and after a
//! number of failed attempts the codon allowances are widened by raising
//! the handicap.

use crate::{
    codon_pool::CodonPool,
    codon_usage::CodonUsage,
    composition,
    error::DracoError,
    repeats::{RepeatScanner, Repeats},
    target::TargetProfile,
};
use draco_protocol::OptimizationConfig;
use rand::{Rng, SeedableRng, rngs::StdRng};
use rayon::prelude::*;
use std::{fmt, ops::Range};

/// Why a fragment was rolled back.
#[derive(Clone, Debug, PartialEq)]
pub enum Rejection {
    DirectRepeat(Repeats),
    InvertedRepeat(Repeats),
    Stretch { from: usize, length: usize },
    Gc { from: usize, gc: f64 },
    ForbiddenMotif { position: usize, motif: String },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::DirectRepeat(repeats) => write!(f, "{} direct repeat(s)", repeats.len()),
            Rejection::InvertedRepeat(repeats) => {
                write!(f, "{} inverted repeat(s)", repeats.len())
            }
            Rejection::Stretch { from, length } => {
                write!(f, "homopolymer of {length} at {from}")
            }
            Rejection::Gc { from, gc } => write!(f, "GC {gc:.1}% in window at {from}"),
            Rejection::ForbiddenMotif { position, motif } => {
                write!(f, "motif {motif} at {position}")
            }
        }
    }
}

/// A coding sequence, kept as one piece per target fragment.
#[derive(Clone, Debug, PartialEq)]
pub struct DesignFragment {
    pub label: String,
    pub protein: String,
    pub dna: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Design {
    pub fragments: Vec<DesignFragment>,
    /// Attempts used, the successful one included
    pub attempts: usize,
    pub handicap: usize,
    /// Fragments rolled back during the successful attempt
    pub fragment_retries: usize,
}

impl Design {
    pub fn sequence_bytes(&self) -> Vec<u8> {
        self.fragments
            .iter()
            .flat_map(|f| f.dna.iter().copied())
            .collect()
    }

    pub fn sequence(&self) -> String {
        String::from_utf8_lossy(&self.sequence_bytes()).into_owned()
    }

    /// The coding sequence as RNA.
    pub fn rna(&self) -> String {
        self.sequence().replace('T', "U")
    }

    pub fn len(&self) -> usize {
        self.fragments.iter().map(|f| f.dna.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of every fragment in the coding sequence.
    pub fn fragment_ranges(&self) -> Vec<Range<usize>> {
        let mut start = 0;
        self.fragments
            .iter()
            .map(|f| {
                let range = start..start + f.dna.len();
                start = range.end;
                range
            })
            .collect()
    }

    /// Translates the design back with the codon table it was built from.
    pub fn protein(&self, codons: &CodonUsage) -> Option<String> {
        codons.translate(&self.sequence_bytes())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Found(Design),
    NotFound { attempts: usize, handicap: usize },
}

impl Outcome {
    pub fn design(&self) -> Option<&Design> {
        match self {
            Outcome::Found(design) => Some(design),
            Outcome::NotFound { .. } => None,
        }
    }

    pub fn attempts(&self) -> usize {
        match self {
            Outcome::Found(design) => design.attempts,
            Outcome::NotFound { attempts, .. } => *attempts,
        }
    }
}

/// Receives progress notifications from a running optimization.
pub trait Progress {
    fn attempt_started(&mut self, _attempt: usize, _handicap: usize) {}
    fn fragment_accepted(&mut self, _fragment: usize, _total: usize) {}
    fn finished(&mut self, _outcome: &Outcome) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}

/// Codon optimizer for one target profile.
#[derive(Clone, Debug)]
pub struct Draco<'a> {
    profile: &'a TargetProfile,
    codons: &'a CodonUsage,
    config: OptimizationConfig,
    motifs: Vec<Vec<u8>>,
    direct: RepeatScanner,
    inverted: RepeatScanner,
    base_pool: CodonPool,
}

impl<'a> Draco<'a> {
    /// Checks all inputs. Nothing is searched yet.
    pub fn new(
        profile: &'a TargetProfile,
        codons: &'a CodonUsage,
        config: &OptimizationConfig,
    ) -> Result<Self, DracoError> {
        config.validate()?;
        let residues = profile.residue_counts();
        if residues.is_empty() {
            return Err(DracoError::EmptyTarget);
        }
        let base_pool = CodonPool::new(&residues, codons, 0)?;
        Ok(Self {
            profile,
            codons,
            config: config.to_owned(),
            motifs: config.normalized_motifs(),
            direct: RepeatScanner::direct(config.repeat_lengths()),
            inverted: RepeatScanner::inverted(config.inverted_repeat_lengths()),
            base_pool,
        })
    }

    #[inline(always)]
    pub fn config(&self) -> &OptimizationConfig {
        &self.config
    }

    #[inline(always)]
    pub fn profile(&self) -> &TargetProfile {
        self.profile
    }

    #[inline(always)]
    pub fn codons(&self) -> &CodonUsage {
        self.codons
    }

    pub fn optimize<R: Rng>(&self, rng: &mut R) -> Result<Outcome, DracoError> {
        self.optimize_with_progress(rng, &mut NoProgress)
    }

    pub fn optimize_with_progress<R: Rng, P: Progress>(
        &self,
        rng: &mut R,
        progress: &mut P,
    ) -> Result<Outcome, DracoError> {
        let max_attempts = self.config.max_sequence_attempts;
        let max_handicap = self.config.max_handicap;
        let interval = (max_attempts / (max_handicap + 1)).max(1);
        let mut handicap = 0;
        let mut failed = 0;

        loop {
            let attempt = failed + 1;
            tracing::debug!("Attempt {attempt}/{max_attempts}, handicap {handicap}");
            progress.attempt_started(attempt, handicap);

            let mut pool = self.base_pool.with_handicap(handicap);
            if let Some((fragments, fragment_retries)) =
                self.run_attempt(&mut pool, rng, progress)?
            {
                let design = Design {
                    fragments,
                    attempts: attempt,
                    handicap,
                    fragment_retries,
                };
                tracing::info!(
                    "Found a design of {} bp after {attempt} attempt(s), handicap {handicap}",
                    design.len()
                );
                let outcome = Outcome::Found(design);
                progress.finished(&outcome);
                return Ok(outcome);
            }

            failed += 1;
            if failed >= max_attempts {
                tracing::warn!("No design found in {failed} attempts (handicap {handicap})");
                let outcome = Outcome::NotFound {
                    attempts: failed,
                    handicap,
                };
                progress.finished(&outcome);
                return Ok(outcome);
            }
            if max_handicap > 0 && failed % interval == 0 && handicap < max_handicap {
                handicap += 1;
                tracing::info!("Raising handicap to {handicap} after {failed} failed attempts");
            }
        }
    }

    /// Independent designs, one per seed, computed in parallel.
    pub fn optimize_seeds(&self, seeds: &[u64]) -> Result<Vec<(u64, Outcome)>, DracoError> {
        seeds
            .par_iter()
            .map(|&seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                self.optimize(&mut rng).map(|outcome| (seed, outcome))
            })
            .collect()
    }

    /// Encodes every fragment in turn. Returns the fragments and the number
    /// of rollbacks, or `None` once a fragment runs out of retries.
    fn run_attempt<R: Rng, P: Progress>(
        &self,
        pool: &mut CodonPool,
        rng: &mut R,
        progress: &mut P,
    ) -> Result<Option<(Vec<DesignFragment>, usize)>, DracoError> {
        let labeled = self.profile.labeled_fragments();
        let total = labeled.len();
        let mut fragments: Vec<DesignFragment> = Vec::with_capacity(total);
        let mut sequence: Vec<u8> = vec![];
        let mut retries = 0;

        for (index, (label, protein)) in labeled.into_iter().enumerate() {
            let dna = if index == 0 {
                pool.generate_fragment(protein, rng)?
            } else {
                let previous_len = fragments.last().map(|f| f.dna.len()).unwrap_or(0);
                let mut accepted = None;
                for _ in 0..self.config.max_repeat_attempts {
                    let checkpoint = pool.snapshot();
                    let dna = pool.generate_fragment(protein, rng)?;
                    match self.check_fragment(&sequence, previous_len, &dna) {
                        Ok(()) => {
                            accepted = Some(dna);
                            break;
                        }
                        Err(rejection) => {
                            tracing::trace!("Fragment {label} rejected: {rejection}");
                            retries += 1;
                            pool.restore(checkpoint);
                        }
                    }
                }
                match accepted {
                    Some(dna) => dna,
                    None => {
                        tracing::debug!(
                            "Fragment {label} failed {} times, giving up this attempt",
                            self.config.max_repeat_attempts
                        );
                        return Ok(None);
                    }
                }
            };
            sequence.extend_from_slice(&dna);
            fragments.push(DesignFragment {
                label,
                protein: protein.to_string(),
                dna,
            });
            progress.fragment_accepted(index + 1, total);
        }
        Ok(Some((fragments, retries)))
    }

    /// Checks a new fragment against the sequence assembled so far.
    ///
    /// `previous_len` is the length of the last accepted fragment; stretches
    /// are looked for in that fragment and the new one only.
    pub fn check_fragment(
        &self,
        assembled: &[u8],
        previous_len: usize,
        fragment: &[u8],
    ) -> Result<(), Rejection> {
        let boundary = assembled.len();
        let mut sequence = Vec::with_capacity(boundary + fragment.len());
        sequence.extend_from_slice(assembled);
        sequence.extend_from_slice(fragment);

        if self.config.check_stretch {
            let region_start = boundary.saturating_sub(previous_len);
            if let Some(stretch) =
                composition::find_stretch(&sequence[region_start..], self.config.max_stretch)
            {
                return Err(Rejection::Stretch {
                    from: region_start + stretch.from,
                    length: stretch.length,
                });
            }
        }

        if let Some((position, motif)) = composition::find_motif(&sequence, &self.motifs) {
            return Err(Rejection::ForbiddenMotif {
                position,
                motif: String::from_utf8_lossy(motif).into_owned(),
            });
        }

        if self.config.check_gc {
            let window =
                composition::max_gc_window(&sequence, self.config.gc_window, self.config.max_gc);
            if window.gc() >= self.config.max_gc {
                return Err(Rejection::Gc {
                    from: window.from(),
                    gc: window.gc(),
                });
            }
        }

        if self.config.check_repeats {
            let repeats = self.direct.scan_boundary(&sequence, boundary);
            if !repeats.is_empty() {
                return Err(Rejection::DirectRepeat(repeats));
            }
        }

        if self.config.check_inverted_repeats {
            let repeats = self.inverted.scan_boundary(&sequence, boundary);
            if !repeats.is_empty() {
                return Err(Rejection::InvertedRepeat(repeats));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tale::Tale;

    fn only_stretch_check() -> OptimizationConfig {
        OptimizationConfig {
            check_repeats: false,
            check_inverted_repeats: false,
            check_gc: false,
            check_stretch: true,
            max_stretch: 3,
            max_repeat_attempts: 5,
            max_sequence_attempts: 6,
            max_handicap: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_single_codon_table() {
        let codons = CodonUsage::parse("GCU A 1.00 10.0 (100)\n").unwrap();
        let profile = TargetProfile::new(vec![]).with_upstream("AAAA");
        let draco = Draco::new(&profile, &codons, &OptimizationConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let design = match draco.optimize(&mut rng).unwrap() {
            Outcome::Found(design) => design,
            other => panic!("Unexpected outcome: {other:?}"),
        };
        assert_eq!(design.sequence(), "GCTGCTGCTGCT");
        assert_eq!(design.rna(), "GCUGCUGCUGCU");
        assert_eq!(design.attempts, 1);
        assert_eq!(design.handicap, 0);
    }

    #[test]
    fn test_stretch_forces_other_codon() {
        // AAA makes a run of three on its own, so only AAG can be kept. AAG
        // has 2 + handicap uses, which covers four lysines from handicap 2 on.
        // Attempts 1 to 4 run at handicap 0 and 1.
        let codons = CodonUsage::parse("UGC C 1.00 5.0  AAG K 0.50 5.0  AAA K 0.50 5.0\n").unwrap();
        let profile = TargetProfile::new(vec!["K".to_string(); 4]).with_upstream("C");
        let draco = Draco::new(&profile, &codons, &only_stretch_check()).unwrap();
        let mut rng = StdRng::seed_from_u64(17);
        let design = match draco.optimize(&mut rng).unwrap() {
            Outcome::Found(design) => design,
            other => panic!("Unexpected outcome: {other:?}"),
        };
        assert_eq!(design.sequence(), "TGCAAGAAGAAGAAG");
        assert!(!design.sequence().contains("AAA"));
        assert_eq!(design.attempts, 5);
        assert_eq!(design.handicap, 2);
        assert_eq!(design.fragment_retries, 0);
        assert_eq!(design.fragment_ranges()[1], 3..6);
    }

    #[test]
    fn test_impossible_gc_gives_up_after_one_attempt() {
        let codons = CodonUsage::drosophila_melanogaster();
        let profile = TargetProfile::new(vec!["MK".to_string(), "KL".to_string()]);
        let config = OptimizationConfig {
            max_gc: 0.0,
            max_sequence_attempts: 1,
            max_repeat_attempts: 3,
            ..Default::default()
        };
        let draco = Draco::new(&profile, &codons, &config).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            draco.optimize(&mut rng).unwrap(),
            Outcome::NotFound {
                attempts: 1,
                handicap: 0
            }
        );
    }

    #[test]
    fn test_no_escalation_without_handicap() {
        let codons = CodonUsage::parse("UGC C 1.00 5.0  AAG K 0.50 5.0  AAA K 0.50 5.0\n").unwrap();
        let profile = TargetProfile::new(vec!["K".to_string(); 4]).with_upstream("C");
        let config = OptimizationConfig {
            max_handicap: 0,
            ..only_stretch_check()
        };
        let draco = Draco::new(&profile, &codons, &config).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(
            draco.optimize(&mut rng).unwrap(),
            Outcome::NotFound {
                attempts: 6,
                handicap: 0
            }
        );
    }

    #[test]
    fn test_tale_design_decodes_to_profile() {
        let codons = CodonUsage::drosophila_melanogaster();
        let tale = Tale::new("TGAC", Some("MDPIR"), Some("SGRPLD")).unwrap();
        let profile = tale.profile();
        let config = OptimizationConfig {
            max_gc: 75.0,
            ..Default::default()
        };
        let draco = Draco::new(&profile, &codons, &config).unwrap();
        let mut rng = StdRng::seed_from_u64(2024);
        let design = match draco.optimize(&mut rng).unwrap() {
            Outcome::Found(design) => design,
            other => panic!("Unexpected outcome: {other:?}"),
        };
        assert_eq!(design.fragments.len(), profile.fragments().len());
        for (fragment, expected) in design.fragments.iter().zip(profile.fragments()) {
            assert_eq!(codons.translate(&fragment.dna).as_deref(), Some(expected));
        }
        assert_eq!(design.protein(&codons), Some(tale.protein()));
        assert_eq!(design.len(), tale.protein().len() * 3);
    }

    #[test]
    fn test_successful_attempt_uses_up_every_residue() {
        let codons = CodonUsage::drosophila_melanogaster();
        let profile = TargetProfile::new(vec!["MKLW".to_string(), "QQRST".to_string()]);
        let config = OptimizationConfig {
            check_repeats: false,
            check_inverted_repeats: false,
            check_gc: false,
            check_stretch: false,
            ..Default::default()
        };
        let draco = Draco::new(&profile, &codons, &config).unwrap();
        let mut pool = draco.base_pool.with_handicap(0);
        let mut rng = StdRng::seed_from_u64(8);
        let (fragments, retries) = draco
            .run_attempt(&mut pool, &mut rng, &mut NoProgress)
            .unwrap()
            .unwrap();
        assert_eq!(retries, 0);
        assert_eq!(fragments[1].label, "unit 2");
        assert!(pool.residues().values().all(|count| *count == 0));
    }

    #[test]
    fn test_attempt_propagates_missing_codon() {
        let codons = CodonUsage::drosophila_melanogaster();
        let profile = TargetProfile::new(vec!["MK".to_string()]);
        let draco = Draco::new(&profile, &codons, &only_stretch_check()).unwrap();
        // A budget without methionine cannot encode the profile
        let counts = [('K', 1)].into_iter().collect();
        let mut pool = CodonPool::new(&counts, &codons, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        assert!(matches!(
            draco.run_attempt(&mut pool, &mut rng, &mut NoProgress),
            Err(DracoError::MissingCodons('M'))
        ));
    }

    #[test]
    fn test_check_fragment() {
        let codons = CodonUsage::drosophila_melanogaster();
        let profile = TargetProfile::new(vec!["K".to_string()]);
        let config = OptimizationConfig {
            forbidden_motifs: vec!["gaattc".to_string()],
            ..only_stretch_check()
        };
        let draco = Draco::new(&profile, &codons, &config).unwrap();
        assert_eq!(draco.check_fragment(b"TGCAAG", 3, b"AAG"), Ok(()));
        assert_eq!(
            draco.check_fragment(b"TGCAAG", 3, b"AAA"),
            Err(Rejection::Stretch { from: 6, length: 3 })
        );
        // Runs further back than the previous fragment are not looked at
        assert_eq!(draco.check_fragment(b"TTTTGCAAG", 3, b"CAG"), Ok(()));
        assert_eq!(
            draco.check_fragment(b"TGCGAA", 3, b"TTC"),
            Err(Rejection::ForbiddenMotif {
                position: 3,
                motif: "GAATTC".to_string()
            })
        );
    }

    #[test]
    fn test_check_fragment_repeats() {
        let codons = CodonUsage::drosophila_melanogaster();
        let profile = TargetProfile::new(vec!["K".to_string()]);
        let config = OptimizationConfig {
            check_stretch: false,
            check_gc: false,
            min_repeat_len: 6,
            max_repeat_len: 6,
            check_inverted_repeats: false,
            ..Default::default()
        };
        let draco = Draco::new(&profile, &codons, &config).unwrap();
        match draco.check_fragment(b"ACGTTGCA", 8, b"ACGTTGTT") {
            Err(Rejection::DirectRepeat(repeats)) => {
                assert_eq!(repeats.keys().next(), Some(&vec![0, 8]));
            }
            other => panic!("Unexpected result: {other:?}"),
        }
        assert_eq!(draco.check_fragment(b"ACGTTGCA", 8, b"CCCAAATG"), Ok(()));
    }

    #[test]
    fn test_check_fragment_inverted_repeat() {
        let codons = CodonUsage::drosophila_melanogaster();
        let profile = TargetProfile::new(vec!["K".to_string()]);
        let config = OptimizationConfig {
            check_repeats: false,
            check_stretch: false,
            check_gc: false,
            min_inv_rep_len: 6,
            max_inv_rep_len: 6,
            ..Default::default()
        };
        let draco = Draco::new(&profile, &codons, &config).unwrap();
        // GACCGT is the reverse complement of ACGGTC across the boundary
        match draco.check_fragment(b"ACGGTCTT", 8, b"GACCGTTA") {
            Err(Rejection::InvertedRepeat(repeats)) => {
                assert_eq!(repeats.len(), 1);
                assert_eq!(repeats.get(&vec![0, 8]).map(Vec::as_slice), Some(&b"ACGGTC"[..]));
            }
            other => panic!("Unexpected result: {other:?}"),
        }
        assert_eq!(draco.check_fragment(b"ACGGTCTT", 8, b"CAACCGTA"), Ok(()));
    }

    #[test]
    fn test_check_fragment_gc_in_last_window() {
        let codons = CodonUsage::drosophila_melanogaster();
        let profile = TargetProfile::new(vec!["K".to_string()]);
        let config = OptimizationConfig {
            check_repeats: false,
            check_inverted_repeats: false,
            check_stretch: false,
            gc_window: 4,
            max_gc: 75.0,
            ..Default::default()
        };
        let draco = Draco::new(&profile, &codons, &config).unwrap();
        // Only the window AGGC at the very end reaches the limit
        assert_eq!(
            draco.check_fragment(b"ATATATAT", 8, b"TTAGGC"),
            Err(Rejection::Gc { from: 10, gc: 75.0 })
        );
        assert_eq!(draco.check_fragment(b"ATATATAT", 8, b"TTAGGA"), Ok(()));
    }

    #[test]
    fn test_invalid_inputs() {
        let codons = CodonUsage::parse("GCU A 1.00 10.0\n").unwrap();
        let config = OptimizationConfig::default();

        let profile = TargetProfile::new(vec!["AW".to_string()]);
        assert!(matches!(
            Draco::new(&profile, &codons, &config),
            Err(DracoError::MissingCodons('W'))
        ));

        let profile = TargetProfile::new(vec!["--".to_string()]);
        assert!(matches!(
            Draco::new(&profile, &codons, &config),
            Err(DracoError::EmptyTarget)
        ));

        let profile = TargetProfile::new(vec!["A".to_string()]);
        let config = OptimizationConfig {
            gc_window: 0,
            ..Default::default()
        };
        assert!(matches!(
            Draco::new(&profile, &codons, &config),
            Err(DracoError::InvalidConfig(_))
        ));
    }

    #[derive(Default)]
    struct Counter {
        attempts: usize,
        accepted: usize,
        finished: bool,
    }

    impl Progress for Counter {
        fn attempt_started(&mut self, _attempt: usize, _handicap: usize) {
            self.attempts += 1;
        }
        fn fragment_accepted(&mut self, _fragment: usize, _total: usize) {
            self.accepted += 1;
        }
        fn finished(&mut self, _outcome: &Outcome) {
            self.finished = true;
        }
    }

    #[test]
    fn test_progress_and_seeds() {
        let codons = CodonUsage::parse("UGC C 1.00 5.0  AAG K 0.50 5.0  AAA K 0.50 5.0\n").unwrap();
        let profile = TargetProfile::new(vec!["K".to_string(); 4]).with_upstream("C");
        let draco = Draco::new(&profile, &codons, &only_stretch_check()).unwrap();

        let mut counter = Counter::default();
        let mut rng = StdRng::seed_from_u64(5);
        let outcome = draco
            .optimize_with_progress(&mut rng, &mut counter)
            .unwrap();
        assert_eq!(outcome.attempts(), 5);
        assert_eq!(counter.attempts, outcome.attempts());
        assert!(counter.accepted >= 5);
        assert!(counter.finished);

        let results = draco.optimize_seeds(&[1, 2, 1]).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0, 1);
        assert_eq!(results[0].1, results[2].1);
        for (_, outcome) in &results {
            let design = outcome.design().unwrap();
            assert_eq!(design.sequence(), "TGCAAGAAGAAGAAG");
            assert_eq!(design.handicap, 2);
        }
    }
}
