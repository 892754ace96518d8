//! Writers for finished designs: plain text, FASTA, GenBank and JSON.

use crate::{codon_usage::CodonUsage, optimizer::Design};
use bio::io::fasta;
use draco_protocol::DesignReport;
use gb_io::seq::{Feature, Location, Seq, Topology};
use std::io::Write;

/// A design with the name it is written under.
#[derive(Clone, Debug)]
pub struct NamedDesign<'a> {
    pub name: String,
    pub seed: Option<u64>,
    pub design: &'a Design,
}

impl<'a> NamedDesign<'a> {
    pub fn new(name: &str, seed: Option<u64>, design: &'a Design) -> Self {
        Self {
            name: name.to_string(),
            seed,
            design,
        }
    }

    fn description(&self) -> String {
        let seed = self
            .seed
            .map(|s| format!("seed={s} "))
            .unwrap_or_default();
        format!(
            "{seed}attempts={} handicap={} length={}",
            self.design.attempts,
            self.design.handicap,
            self.design.len()
        )
    }

    fn sequence(&self, rna: bool) -> String {
        if rna {
            self.design.rna()
        } else {
            self.design.sequence()
        }
    }
}

pub fn write_text<W: Write>(
    mut w: W,
    designs: &[NamedDesign],
    codons: &CodonUsage,
    rna: bool,
) -> std::io::Result<()> {
    for design in designs {
        writeln!(w, "{} ({})", design.name, design.description())?;
        let protein = design.design.protein(codons).unwrap_or_default();
        writeln!(w, "Protein:  {protein}")?;
        writeln!(w, "Sequence: {}", design.sequence(rna))?;
        writeln!(w)?;
    }
    Ok(())
}

pub fn write_fasta<W: Write>(w: W, designs: &[NamedDesign], rna: bool) -> std::io::Result<()> {
    let mut writer = fasta::Writer::new(w);
    for design in designs {
        writer.write(
            &design.name,
            Some(design.description().as_str()),
            design.sequence(rna).as_bytes(),
        )?;
    }
    writer.flush()
}

/// GenBank record with one CDS over the whole design and one feature per fragment.
pub fn genbank_record(design: &NamedDesign, codons: &CodonUsage) -> Seq {
    let dna = design.design.sequence_bytes();
    let translation = design
        .design
        .protein(codons)
        .map(|p| p.trim_end_matches('*').to_string())
        .unwrap_or_default();

    let mut features = vec![Feature {
        kind: "CDS".into(),
        location: Location::simple_range(0, dna.len() as i64),
        qualifiers: vec![
            ("label".into(), Some(design.name.clone())),
            ("codon_start".into(), Some("1".to_string())),
            ("translation".into(), Some(translation)),
        ],
    }];
    for (fragment, range) in design
        .design
        .fragments
        .iter()
        .zip(design.design.fragment_ranges())
    {
        features.push(Feature {
            kind: "misc_feature".into(),
            location: Location::simple_range(range.start as i64, range.end as i64),
            qualifiers: vec![
                ("label".into(), Some(fragment.label.clone())),
                ("note".into(), Some(fragment.protein.clone())),
            ],
        });
    }

    Seq {
        name: Some(design.name.clone()),
        topology: Topology::Linear,
        date: None,
        len: Some(dna.len()),
        molecule_type: Some("DNA".to_string()),
        division: "SYN".to_string(),
        definition: Some(format!("Codon optimized design, {}", design.description())),
        accession: None,
        version: None,
        source: None,
        dblink: None,
        keywords: None,
        references: vec![],
        comments: vec![],
        seq: dna,
        contig: None,
        features,
    }
}

pub fn write_genbank<W: Write>(
    mut w: W,
    designs: &[NamedDesign],
    codons: &CodonUsage,
) -> std::io::Result<()> {
    for design in designs {
        gb_io::writer::write(&mut w, &genbank_record(design, codons))?;
    }
    Ok(())
}

pub fn write_json<W: Write>(w: W, reports: &[DesignReport]) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(w, reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::DesignFragment;

    fn design() -> Design {
        Design {
            fragments: vec![
                DesignFragment {
                    label: "upstream".to_string(),
                    protein: "K".to_string(),
                    dna: b"AAG".to_vec(),
                },
                DesignFragment {
                    label: "unit 1".to_string(),
                    protein: "W".to_string(),
                    dna: b"TGG".to_vec(),
                },
            ],
            attempts: 3,
            handicap: 1,
            fragment_retries: 4,
        }
    }

    fn table() -> CodonUsage {
        CodonUsage::parse("AAG K 1.00 1.0  TGG W 1.00 1.0\n").unwrap()
    }

    #[test]
    fn test_fasta() {
        let design = design();
        let mut out = vec![];
        write_fasta(&mut out, &[NamedDesign::new("draco_1", Some(7), &design)], true).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            ">draco_1 seed=7 attempts=3 handicap=1 length=6\nAAGUGG\n"
        );
    }

    #[test]
    fn test_text() {
        let design = design();
        let mut out = vec![];
        write_text(
            &mut out,
            &[NamedDesign::new("draco_1", None, &design)],
            &table(),
            false,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("draco_1 (attempts=3 handicap=1 length=6)\n"));
        assert!(text.contains("Protein:  KW\n"));
        assert!(text.contains("Sequence: AAGTGG\n"));
    }

    #[test]
    fn test_genbank_record() {
        let design = design();
        let named = NamedDesign::new("draco_1", Some(7), &design);
        let record = genbank_record(&named, &table());
        assert_eq!(record.seq, b"AAGTGG".to_vec());
        assert_eq!(record.features.len(), 3);
        assert_eq!(record.features[2].location, Location::simple_range(3, 6));

        let mut out = vec![];
        write_genbank(&mut out, &[named], &table()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("LOCUS"));
        assert!(text.contains("misc_feature"));
        assert!(text.contains("KW"));
    }

    #[test]
    fn test_json() {
        let report = DesignReport {
            sequence: "AAGTGG".to_string(),
            length: 6,
            ..Default::default()
        };
        let mut out = vec![];
        write_json(&mut out, &[report]).unwrap();
        let back: Vec<DesignReport> = serde_json::from_slice(&out).unwrap();
        assert_eq!(back[0].length, 6);
    }
}
