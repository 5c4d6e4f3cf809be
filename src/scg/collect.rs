use crate::scg::hits::GenomeHits;
use crate::utils::{write_fasta, Result};
use std::collections::HashMap;
use std::io::Write as ioWrite;

/// The unaligned sequence set of one profile across all genomes, keyed by
/// genome id in first-seen order. Input to the external profile aligner.
#[derive(Debug, Clone)]
pub struct ProfileSequences {
    pub profile: String,
    pub ids: Vec<String>,
    pub seqs: HashMap<String, String>,
}

/// Fans in the extracted spans of one profile across all genomes. Genomes
/// without a span for the profile are absent from the result; the hit
/// selector guarantees at most one span per genome.
pub fn collect(profile: &str, genome_hits: &[GenomeHits]) -> ProfileSequences {
    let mut ids = Vec::new();
    let mut seqs = HashMap::new();
    for genome in genome_hits {
        if let Some(span) = genome.span_for(profile) {
            ids.push(genome.genome.clone());
            seqs.insert(genome.genome.clone(), span.residues.clone());
        }
    }
    ProfileSequences {
        profile: profile.to_string(),
        ids,
        seqs,
    }
}

impl ProfileSequences {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// One FASTA record per genome with a hit, in first-seen order.
    pub fn write_fasta<W: ioWrite>(&self, writer: W) -> Result<()> {
        let records: Vec<(&str, &str)> = self
            .ids
            .iter()
            .map(|id| (id.as_str(), self.seqs[id].as_str()))
            .collect();
        write_fasta(writer, &records)
            .map_err(|e| format!("profile '{}': {}", self.profile, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scg::hits::{DomainHit, ExtractedSpan};

    fn genome(id: &str, profiles: &[(&str, &str)]) -> GenomeHits {
        GenomeHits {
            genome: id.to_string(),
            spans: profiles
                .iter()
                .map(|(profile, residues)| ExtractedSpan {
                    hit: DomainHit {
                        profile: profile.to_string(),
                        protein: format!("{}_gene", id),
                        score: 1.0,
                        start: 0,
                        end: residues.len(),
                    },
                    residues: residues.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_collect_preserves_genome_order() {
        let genomes = vec![
            genome("g1", &[("PF1", "MKV")]),
            genome("g2", &[("PF2", "AR")]),
            genome("g3", &[("PF1", "MLV")]),
        ];
        let set = collect("PF1", &genomes);
        assert_eq!(set.ids, vec!["g1", "g3"]);
        assert_eq!(set.seqs["g3"], "MLV");
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_collect_no_hits() {
        let genomes = vec![genome("g1", &[("PF1", "MKV")])];
        assert!(collect("PF9", &genomes).is_empty());
    }

    #[test]
    fn test_write_fasta() {
        let genomes = vec![genome("g1", &[("PF1", "MKV")]), genome("g2", &[("PF1", "AR")])];
        let set = collect("PF1", &genomes);
        let mut buf = Vec::new();
        set.write_fasta(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), ">g1\nMKV\n>g2\nAR\n");
    }
}
