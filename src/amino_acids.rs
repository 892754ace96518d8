use std::collections::BTreeMap;

/// The twenty standard amino acids, one-letter code.
pub const PROTEIN_LETTERS: &str = "ACDEFGHIKLMNPQRSTVWY";

#[inline(always)]
pub fn is_protein_letter(residue: char) -> bool {
    PROTEIN_LETTERS.contains(residue)
}

/// Counts every encodable residue of a protein sequence; other symbols are ignored.
pub fn residue_counts<'a>(proteins: impl IntoIterator<Item = &'a str>) -> BTreeMap<char, usize> {
    let mut ret = BTreeMap::new();
    for residue in proteins
        .into_iter()
        .flat_map(|p| p.chars())
        .filter(|c| is_protein_letter(*c))
    {
        *ret.entry(residue).or_insert(0) += 1;
    }
    ret
}
