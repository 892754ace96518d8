use crate::amino_acids;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The protein to encode, split into the fragments the optimizer works on:
/// an optional upstream flank, one fragment per repeat unit and an optional
/// downstream flank.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetProfile {
    pub upstream: Option<String>,
    pub units: Vec<String>,
    pub downstream: Option<String>,
}

impl TargetProfile {
    pub fn new(units: Vec<String>) -> Self {
        Self {
            units,
            ..Default::default()
        }
    }

    pub fn with_upstream(mut self, upstream: &str) -> Self {
        self.upstream = Some(upstream.to_string());
        self
    }

    pub fn with_downstream(mut self, downstream: &str) -> Self {
        self.downstream = Some(downstream.to_string());
        self
    }

    /// Fragments in processing order; absent or empty flanks are skipped.
    pub fn fragments(&self) -> Vec<&str> {
        let upstream = self.upstream.as_deref().filter(|s| !s.is_empty());
        let downstream = self.downstream.as_deref().filter(|s| !s.is_empty());
        upstream
            .into_iter()
            .chain(self.units.iter().map(|u| u.as_str()))
            .chain(downstream)
            .collect()
    }

    /// Fragments with a name each: `upstream`, `unit 1`.. and `downstream`.
    pub fn labeled_fragments(&self) -> Vec<(String, &str)> {
        let mut ret = vec![];
        if let Some(upstream) = self.upstream.as_deref().filter(|s| !s.is_empty()) {
            ret.push(("upstream".to_string(), upstream));
        }
        for (num, unit) in self.units.iter().enumerate() {
            ret.push((format!("unit {}", num + 1), unit.as_str()));
        }
        if let Some(downstream) = self.downstream.as_deref().filter(|s| !s.is_empty()) {
            ret.push(("downstream".to_string(), downstream));
        }
        ret
    }

    pub fn protein(&self) -> String {
        self.fragments().concat()
    }

    /// How often each encodable residue occurs across all fragments.
    pub fn residue_counts(&self) -> BTreeMap<char, usize> {
        amino_acids::residue_counts(self.fragments())
    }
}
