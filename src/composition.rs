//! Sequence composition checks: GC content, homopolymer stretches and
//! forbidden motifs.

use itertools::Itertools;

/// The window with the highest GC content seen by a scan.
#[derive(Clone, Debug, PartialEq)]
pub struct GcWindow {
    from: usize,
    to: usize,
    gc: f64,
}

impl GcWindow {
    #[inline(always)]
    pub fn from(&self) -> usize {
        self.from
    }

    #[inline(always)]
    pub fn to(&self) -> usize {
        self.to
    }

    /// GC content in percent
    #[inline(always)]
    pub fn gc(&self) -> f64 {
        self.gc
    }
}

/// A run of one repeated base.
#[derive(Clone, Debug, PartialEq)]
pub struct Stretch {
    pub from: usize,
    pub length: usize,
    pub base: u8,
}

#[inline(always)]
fn is_gc(c: u8) -> bool {
    matches!(c.to_ascii_uppercase(), b'G' | b'C' | b'S')
}

/// GC content of a sequence in percent; 0 for an empty sequence.
pub fn gc_percent(sequence: &[u8]) -> f64 {
    if sequence.is_empty() {
        return 0.0;
    }
    let gc = sequence.iter().filter(|c| is_gc(**c)).count() as f64;
    gc * 100.0 / sequence.len() as f64
}

/// Slides a window of `window` bases over the sequence and returns the one
/// with the highest GC content. A sequence shorter than the window is
/// treated as a single window. The scan stops at the first window whose GC
/// content reaches `limit`.
pub fn max_gc_window(sequence: &[u8], window: usize, limit: f64) -> GcWindow {
    let window = window.max(1);
    if sequence.len() <= window {
        return GcWindow {
            from: 0,
            to: sequence.len(),
            gc: gc_percent(sequence),
        };
    }

    let mut count = sequence[..window].iter().filter(|c| is_gc(**c)).count();
    let mut best = GcWindow {
        from: 0,
        to: window,
        gc: count as f64 * 100.0 / window as f64,
    };
    for start in 1..=sequence.len() - window {
        if best.gc >= limit {
            break;
        }
        if is_gc(sequence[start - 1]) {
            count -= 1;
        }
        if is_gc(sequence[start + window - 1]) {
            count += 1;
        }
        let gc = count as f64 * 100.0 / window as f64;
        if gc > best.gc {
            best = GcWindow {
                from: start,
                to: start + window,
                gc,
            };
        }
    }
    best
}

pub fn longest_homopolymer(sequence: &[u8]) -> usize {
    sequence
        .iter()
        .dedup_with_count()
        .map(|(count, _)| count)
        .max()
        .unwrap_or(0)
}

/// First run of at least `max_stretch` identical bases.
pub fn find_stretch(sequence: &[u8], max_stretch: usize) -> Option<Stretch> {
    let mut from = 0;
    for (length, base) in sequence.iter().dedup_with_count() {
        if length >= max_stretch {
            return Some(Stretch {
                from,
                length,
                base: *base,
            });
        }
        from += length;
    }
    None
}

/// First forbidden motif found in the sequence, with its position.
pub fn find_motif<'a>(sequence: &[u8], motifs: &'a [Vec<u8>]) -> Option<(usize, &'a [u8])> {
    motifs.iter().filter(|m| !m.is_empty()).find_map(|motif| {
        sequence
            .windows(motif.len())
            .position(|w| w == motif.as_slice())
            .map(|pos| (pos, motif.as_slice()))
    })
}

/// Every occurrence of every motif, sorted by position.
pub fn find_all_motifs<'a>(sequence: &[u8], motifs: &'a [Vec<u8>]) -> Vec<(usize, &'a [u8])> {
    motifs
        .iter()
        .filter(|m| !m.is_empty())
        .flat_map(|motif| {
            sequence
                .windows(motif.len())
                .enumerate()
                .filter(move |(_, w)| *w == motif.as_slice())
                .map(move |(pos, _)| (pos, motif.as_slice()))
        })
        .sorted()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gc_percent() {
        assert_eq!(gc_percent(b"GCGCGCCG"), 100.0);
        assert_eq!(gc_percent(b"ATATTTAA"), 0.0);
        assert_eq!(gc_percent(b"AAAGGGTTTCCC"), 50.0);
        assert_eq!(gc_percent(b"acgt"), 50.0);
        assert_eq!(gc_percent(b""), 0.0);
    }

    #[test]
    fn test_short_sequence_is_one_window() {
        let w = max_gc_window(b"AAGG", 200, 100.0);
        assert_eq!((w.from(), w.to(), w.gc()), (0, 4, 50.0));
    }

    #[test]
    fn test_max_gc_window() {
        let seq = b"AAAAAAGGGGAAAA";
        let w = max_gc_window(seq, 4, 101.0);
        assert_eq!((w.from(), w.to(), w.gc()), (6, 10, 100.0));
        let w = max_gc_window(seq, 5, 101.0);
        assert_eq!(w.gc(), 80.0);
        assert_eq!(w.from(), 5);
    }

    #[test]
    fn test_max_gc_window_stops_at_limit() {
        let seq = b"GGAAAAGGGG";
        let w = max_gc_window(seq, 2, 100.0);
        assert_eq!((w.from(), w.gc()), (0, 100.0));
        let w = max_gc_window(seq, 2, 0.0);
        assert_eq!(w.from(), 0);
    }

    #[test]
    fn test_max_gc_window_includes_last_window() {
        let w = max_gc_window(b"AAAAAAGG", 2, 101.0);
        assert_eq!((w.from(), w.to(), w.gc()), (6, 8, 100.0));
    }

    #[test]
    fn test_homopolymers() {
        assert_eq!(longest_homopolymer(b"ACGTTTTAC"), 4);
        assert_eq!(longest_homopolymer(b""), 0);
        assert_eq!(
            find_stretch(b"ACGTTTTAC", 4),
            Some(Stretch {
                from: 3,
                length: 4,
                base: b'T'
            })
        );
        assert_eq!(find_stretch(b"ACGTTTTAC", 5), None);
        assert_eq!(find_stretch(b"AAGAAG", 3), None);
        assert!(find_stretch(b"AAGAAA", 3).is_some());
    }

    #[test]
    fn test_motifs() {
        let motifs = vec![b"GAATTC".to_vec(), b"GGTCTC".to_vec()];
        assert_eq!(find_motif(b"AAAAGGTCTCAA", &motifs), Some((4, &b"GGTCTC"[..])));
        assert_eq!(find_motif(b"AAAAAAAA", &motifs), None);
        assert_eq!(find_motif(b"GAATTC", &[]), None);
        let all = find_all_motifs(b"GAATTCGGTCTCGAATTC", &motifs);
        let positions: Vec<usize> = all.iter().map(|(p, _)| *p).collect();
        assert_eq!(positions, vec![0, 6, 12]);
    }
}
