//! Codon usage tables.
//!
//! Tables are read from the block layout used by the Kazusa codon usage
//! database (`UUU F 0.38 13.2 (289916)`, four codons per line) or from CSV.
//! Codons are kept as upper-case DNA, in the order the source lists them;
//! the sampler relies on that order.

use crate::error::DracoError;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    fs::File,
    io::Read,
};

const DMEL_CODON_USAGE_TEXT: &str = include_str!("../assets/dmel_codon_usage.txt");

lazy_static! {
    static ref CODON_ENTRY: Regex = Regex::new(
        r"([A-Za-z]{3})\s+(\S)\s+([0-9]*\.?[0-9]+)\s+([0-9]*\.?[0-9]+)(?:\s*\(\s*([0-9]+)\s*\))?"
    )
    .expect("Invalid codon entry regex");
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CodonRecord {
    pub triplet: String,
    pub residue: char,
    pub fraction: f64,
    /// Per thousand codons
    pub frequency: f64,
    #[serde(default)]
    pub count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct CsvCodonRow {
    codon: String,
    residue: String,
    fraction: f64,
    frequency: f64,
    #[serde(default)]
    count: Option<u64>,
}

#[derive(Clone, Debug, Default)]
pub struct CodonUsage {
    codons: Vec<CodonRecord>,
    by_triplet: HashMap<String, usize>,
    by_residue: BTreeMap<char, Vec<CodonRecord>>,
}

impl CodonUsage {
    pub fn drosophila_melanogaster() -> Self {
        Self::parse(DMEL_CODON_USAGE_TEXT).expect("Built-in D. melanogaster table is valid")
    }

    pub fn parse(text: &str) -> Result<Self, DracoError> {
        let mut ret = Self::default();
        for (line_num, line) in text.lines().enumerate() {
            let mut last = 0;
            for caps in CODON_ENTRY.captures_iter(line) {
                let Some(whole) = caps.get(0) else {
                    continue;
                };
                Self::check_unparsed(&line[last..whole.start()], line_num)?;
                last = whole.end();
                let count = match caps.get(5) {
                    Some(m) => Some(m.as_str().parse::<u64>().map_err(|e| {
                        DracoError::CodonTable(format!("line {}: bad count: {e}", line_num + 1))
                    })?),
                    None => None,
                };
                let record = Self::make_record(
                    &caps[1],
                    &caps[2],
                    Self::parse_number(&caps[3], line_num)?,
                    Self::parse_number(&caps[4], line_num)?,
                    count,
                )?;
                ret.push(record)?;
            }
            Self::check_unparsed(&line[last..], line_num)?;
        }
        ret.ensure_not_empty()?;
        Ok(ret)
    }

    pub fn from_csv_path(path: &str) -> Result<Self, DracoError> {
        let file = File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Reads a CSV table with the header `codon,residue,fraction,frequency[,count]`.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DracoError> {
        let mut ret = Self::default();
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        for row in rdr.deserialize::<CsvCodonRow>() {
            let row = row?;
            let record = Self::make_record(
                &row.codon,
                &row.residue,
                row.fraction,
                row.frequency,
                row.count,
            )?;
            ret.push(record)?;
        }
        ret.ensure_not_empty()?;
        Ok(ret)
    }

    #[inline(always)]
    pub fn codons(&self) -> &[CodonRecord] {
        &self.codons
    }

    /// Codons for a residue, in table order.
    #[inline(always)]
    pub fn codons_for(&self, residue: char) -> &[CodonRecord] {
        self.by_residue
            .get(&residue)
            .map(|v| v.as_slice())
            .unwrap_or_default()
    }

    pub fn get(&self, triplet: &str) -> Option<&CodonRecord> {
        let key = Self::normalize_triplet(triplet);
        self.by_triplet.get(&key).map(|i| &self.codons[*i])
    }

    pub fn residues(&self) -> impl Iterator<Item = char> + '_ {
        self.by_residue.keys().copied()
    }

    /// Translates a coding sequence with the codons of this table.
    ///
    /// Returns `None` if the length is not a multiple of three or a codon is
    /// not in the table.
    pub fn translate(&self, dna: &[u8]) -> Option<String> {
        if dna.len() % 3 != 0 {
            return None;
        }
        dna.chunks(3)
            .map(|codon| {
                let codon = std::str::from_utf8(codon).ok()?;
                self.get(codon).map(|r| r.residue)
            })
            .collect()
    }

    fn push(&mut self, record: CodonRecord) -> Result<(), DracoError> {
        if self.by_triplet.contains_key(&record.triplet) {
            return Err(DracoError::CodonTable(format!(
                "codon {} is listed twice",
                record.triplet
            )));
        }
        self.by_triplet
            .insert(record.triplet.clone(), self.codons.len());
        self.by_residue
            .entry(record.residue)
            .or_default()
            .push(record.clone());
        self.codons.push(record);
        Ok(())
    }

    fn make_record(
        triplet: &str,
        residue: &str,
        fraction: f64,
        frequency: f64,
        count: Option<u64>,
    ) -> Result<CodonRecord, DracoError> {
        let triplet = Self::normalize_triplet(triplet);
        if triplet.len() != 3 || !triplet.bytes().all(|c| b"ACGT".contains(&c)) {
            return Err(DracoError::CodonTable(format!(
                "'{triplet}' is not a codon"
            )));
        }
        let mut chars = residue.trim().chars();
        let residue = match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() || c == '*' => c.to_ascii_uppercase(),
            _ => {
                return Err(DracoError::CodonTable(format!(
                    "'{residue}' is not a residue for codon {triplet}"
                )));
            }
        };
        if !(0.0..=1.0).contains(&fraction) {
            return Err(DracoError::CodonTable(format!(
                "fraction {fraction} of codon {triplet} is outside 0..1"
            )));
        }
        if frequency < 0.0 {
            return Err(DracoError::CodonTable(format!(
                "frequency {frequency} of codon {triplet} is negative"
            )));
        }
        Ok(CodonRecord {
            triplet,
            residue,
            fraction,
            frequency,
            count,
        })
    }

    fn normalize_triplet(triplet: &str) -> String {
        triplet
            .trim()
            .chars()
            .map(|c| match c.to_ascii_uppercase() {
                'U' => 'T',
                c => c,
            })
            .collect()
    }

    fn parse_number(text: &str, line_num: usize) -> Result<f64, DracoError> {
        text.parse::<f64>().map_err(|e| {
            DracoError::CodonTable(format!("line {}: bad number '{text}': {e}", line_num + 1))
        })
    }

    fn check_unparsed(rest: &str, line_num: usize) -> Result<(), DracoError> {
        let rest = rest.trim();
        if rest.is_empty() {
            Ok(())
        } else {
            Err(DracoError::CodonTable(format!(
                "line {}: cannot parse '{rest}'",
                line_num + 1
            )))
        }
    }

    fn ensure_not_empty(&self) -> Result<(), DracoError> {
        if self.codons.is_empty() {
            return Err(DracoError::CodonTable("no codons found".to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for CodonUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (num, codon) in self.codons.iter().enumerate() {
            if num > 0 {
                let separator = if num % 4 == 0 { "\n" } else { "  " };
                write!(f, "{separator}")?;
            }
            write!(
                f,
                "{}({}):{:>6.2}",
                codon.triplet, codon.residue, codon.fraction
            )?;
        }
        Ok(())
    }
}
