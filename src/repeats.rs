//! Direct and inverted repeat detection.
//!
//! Both kinds share one scan. Candidate words are cut from the sequence,
//! longest length first, and looked up in the whole sequence; inverted
//! repeats look up the reverse complement of each word instead of the word
//! itself. A candidate counts as a repeat if it is found at two or more
//! positions, and the tuple of those positions is its signature.

use bio::alphabets::dna::revcomp;
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    ops::RangeInclusive,
};

/// Match positions of a repeat, ascending.
pub type Signature = Vec<usize>;

/// Repeats found by a scan, keyed by signature.
pub type Repeats = BTreeMap<Signature, Vec<u8>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepeatKind {
    Direct,
    Inverted,
}

impl RepeatKind {
    fn transform(&self, word: &[u8]) -> Vec<u8> {
        match self {
            RepeatKind::Direct => word.to_vec(),
            RepeatKind::Inverted => revcomp(word),
        }
    }
}

/// A word cut from the sequence at `origin`, already transformed.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub origin: usize,
    pub word: Vec<u8>,
}

/// Signatures seen so far during one scan.
///
/// A signature is new only if neither it nor its one-base neighbour has
/// been seen. This drops the one-base extensions of a repeat that has
/// already been counted, so a long repeat found with a short word length is
/// reported once, not once per offset. For direct repeats the neighbour is
/// every position one base earlier. The two copies of an inverted repeat
/// move in opposite directions, so there the first position moves one way
/// and the others the other way.
#[derive(Clone, Debug)]
pub struct RepeatSignatures {
    kind: RepeatKind,
    seen: HashSet<Signature>,
}

impl RepeatSignatures {
    pub fn new(kind: RepeatKind) -> Self {
        Self {
            kind,
            seen: HashSet::new(),
        }
    }

    /// Records a signature and returns whether it is a new repeat.
    pub fn record(&mut self, signature: &[usize]) -> bool {
        let known = self.seen.contains(signature)
            || match self.kind {
                RepeatKind::Direct => self.seen_shifted(signature, -1, -1),
                RepeatKind::Inverted => {
                    self.seen_shifted(signature, -1, 1) || self.seen_shifted(signature, 1, -1)
                }
            };
        self.seen.insert(signature.to_vec());
        !known
    }

    /// Whether the signature moved by `first` (first position) and `rest`
    /// (all other positions) has been seen.
    fn seen_shifted(&self, signature: &[usize], first: isize, rest: isize) -> bool {
        let shifted: Option<Signature> = signature
            .iter()
            .enumerate()
            .map(|(i, p)| p.checked_add_signed(if i == 0 { first } else { rest }))
            .collect();
        shifted.is_some_and(|shifted| self.seen.contains(&shifted))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RepeatScanner {
    kind: RepeatKind,
    min_len: usize,
    max_len: usize,
}

impl RepeatScanner {
    pub fn new(kind: RepeatKind, lengths: RangeInclusive<usize>) -> Self {
        Self {
            kind,
            min_len: (*lengths.start()).max(1),
            max_len: *lengths.end(),
        }
    }

    pub fn direct(lengths: RangeInclusive<usize>) -> Self {
        Self::new(RepeatKind::Direct, lengths)
    }

    pub fn inverted(lengths: RangeInclusive<usize>) -> Self {
        Self::new(RepeatKind::Inverted, lengths)
    }

    #[inline(always)]
    pub fn kind(&self) -> RepeatKind {
        self.kind
    }

    /// Word lengths, longest first.
    fn lengths(&self) -> impl Iterator<Item = usize> {
        (self.min_len..=self.max_len).rev()
    }

    /// Words that overlap the part of `sequence` after `boundary`, i.e. the
    /// words a newly appended fragment could have created.
    pub fn candidates(&self, sequence: &[u8], boundary: usize) -> Vec<Candidate> {
        let mut ret = vec![];
        for length in self.lengths() {
            if sequence.len() < length {
                continue;
            }
            let start = boundary.saturating_sub(length);
            for origin in start..=sequence.len() - length {
                ret.push(Candidate {
                    origin,
                    word: self.kind.transform(&sequence[origin..origin + length]),
                });
            }
        }
        ret
    }

    /// Looks up each candidate in the whole sequence and returns the new repeats.
    ///
    /// For inverted repeats the position the word was cut from is part of
    /// the signature, so a single reverse-complement match already counts.
    pub fn find_repeats(&self, sequence: &[u8], candidates: &[Candidate]) -> Repeats {
        let mut repeats = Repeats::new();
        let mut signatures = RepeatSignatures::new(self.kind);
        let mut indices: HashMap<usize, HashMap<&[u8], Vec<usize>>> = HashMap::new();
        for candidate in candidates {
            let length = candidate.word.len();
            let index = indices
                .entry(length)
                .or_insert_with(|| word_index(sequence, length));
            let mut signature: Signature = index
                .get(candidate.word.as_slice())
                .cloned()
                .unwrap_or_default();
            if self.kind == RepeatKind::Inverted && !signature.contains(&candidate.origin) {
                signature.push(candidate.origin);
                signature.sort_unstable();
            }
            if signature.len() < 2 {
                continue;
            }
            if signatures.record(&signature) {
                repeats.insert(signature, candidate.word.clone());
            }
        }
        repeats
    }

    /// Repeats created by the part of `sequence` after `boundary`.
    pub fn scan_boundary(&self, sequence: &[u8], boundary: usize) -> Repeats {
        let candidates = self.candidates(sequence, boundary);
        self.find_repeats(sequence, &candidates)
    }

    /// Every repeat in the sequence.
    pub fn scan(&self, sequence: &[u8]) -> Repeats {
        self.scan_boundary(sequence, 0)
    }
}

/// Start positions of every word of the given length, overlapping included.
fn word_index(sequence: &[u8], length: usize) -> HashMap<&[u8], Vec<usize>> {
    let mut ret: HashMap<&[u8], Vec<usize>> = HashMap::new();
    for (pos, word) in sequence.windows(length).enumerate() {
        ret.entry(word).or_default().push(pos);
    }
    ret
}
