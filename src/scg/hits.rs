use crate::utils::Result;
use std::collections::HashMap;
use std::io::BufRead;

// Whitespace-delimited fields of a per-domain search report record.
const FIELD_PROTEIN: usize = 0;
const FIELD_PROFILE_NAME: usize = 3;
const FIELD_PROFILE_ACC: usize = 4;
const FIELD_SCORE: usize = 13;
const FIELD_ALI_FROM: usize = 17;
const FIELD_ALI_TO: usize = 18;
const MIN_FIELD_COUNT: usize = 19;

/// One scored match of a genome's protein against a marker profile.
/// The residue span is 0-based and half-open.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainHit {
    pub profile: String,
    pub protein: String,
    pub score: f64,
    pub start: usize,
    pub end: usize,
}

impl DomainHit {
    /// Parses one record of the tabular per-domain report. The profile is
    /// identified by its accession; records without one fall back to the
    /// profile name, mirroring how the profile library picks identifiers.
    fn parse(line: &str, line_number: usize) -> Result<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < MIN_FIELD_COUNT {
            return Err(format!(
                "malformed domain-search record at line {}: expected at least {} fields, found {}",
                line_number,
                MIN_FIELD_COUNT,
                fields.len()
            ));
        }

        let malformed = |what: &str, value: &str| {
            format!(
                "malformed domain-search record at line {}: invalid {} '{}'",
                line_number, what, value
            )
        };

        let score = fields[FIELD_SCORE]
            .parse::<f64>()
            .map_err(|_| malformed("score", fields[FIELD_SCORE]))?;
        let ali_from = fields[FIELD_ALI_FROM]
            .parse::<usize>()
            .map_err(|_| malformed("alignment start", fields[FIELD_ALI_FROM]))?;
        let ali_to = fields[FIELD_ALI_TO]
            .parse::<usize>()
            .map_err(|_| malformed("alignment end", fields[FIELD_ALI_TO]))?;
        if ali_from < 1 || ali_to < ali_from {
            return Err(format!(
                "malformed domain-search record at line {}: invalid residue range {}..{}",
                line_number, ali_from, ali_to
            ));
        }

        let profile = match fields[FIELD_PROFILE_ACC] {
            "-" => fields[FIELD_PROFILE_NAME],
            acc => acc,
        };

        Ok(DomainHit {
            profile: profile.to_string(),
            protein: fields[FIELD_PROTEIN].to_string(),
            score,
            // 1-based inclusive coordinates to a 0-based half-open span
            start: ali_from - 1,
            end: ali_to,
        })
    }
}

/// Selects the best-scoring hit per profile from a per-domain report.
///
/// The report is expected to list records for one profile in a contiguous
/// run, as the external search tool emits them. Within a run, a strictly
/// greater score replaces the retained candidate, so ties keep the record
/// seen first. If a profile reappears after a gap, each of its runs yields
/// its own best hit and the last one wins downstream; the report order is
/// not validated here.
pub fn select_best_hits<R: BufRead>(reader: R) -> Result<Vec<DomainHit>> {
    let mut selected: Vec<DomainHit> = Vec::new();
    let mut current: Option<DomainHit> = None;

    for (line_index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format!("Error reading line {}: {}", line_index + 1, e))?;
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let hit = DomainHit::parse(&line, line_index + 1)?;

        current = match current.take() {
            None => Some(hit),
            Some(best) if best.profile == hit.profile => {
                if hit.score > best.score {
                    Some(hit)
                } else {
                    Some(best)
                }
            }
            Some(best) => {
                selected.push(best);
                Some(hit)
            }
        };
    }
    if let Some(best) = current {
        selected.push(best);
    }

    Ok(selected)
}

/// A selected hit together with the residues it matched.
#[derive(Debug, Clone)]
pub struct ExtractedSpan {
    pub hit: DomainHit,
    pub residues: String,
}

/// All marker evidence retained for one genome: at most one span per profile.
#[derive(Debug, Clone)]
pub struct GenomeHits {
    pub genome: String,
    pub spans: Vec<ExtractedSpan>,
}

impl GenomeHits {
    pub fn span_for(&self, profile: &str) -> Option<&ExtractedSpan> {
        self.spans.iter().find(|s| s.hit.profile == profile)
    }
}

/// Resolves selected hits against the genome's protein set. Span bounds are
/// clamped to the protein length; a hit naming an unknown protein fails the
/// genome.
pub fn extract_spans(
    genome: &str,
    proteins: &HashMap<String, String>,
    hits: Vec<DomainHit>,
) -> Result<GenomeHits> {
    let mut spans = Vec::with_capacity(hits.len());
    for hit in hits {
        let seq = proteins.get(&hit.protein).ok_or_else(|| {
            format!(
                "genome '{}': protein '{}' from the domain-search report is missing from the protein set",
                genome, hit.protein
            )
        })?;
        let end = hit.end.min(seq.len());
        let start = hit.start.min(end);
        let residues = seq[start..end].to_string();
        spans.push(ExtractedSpan { hit, residues });
    }
    Ok(GenomeHits {
        genome: genome.to_string(),
        spans,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(protein: &str, profile: &str, score: f64, from: usize, to: usize) -> String {
        // Fields not read by the parser are placeholders.
        format!(
            "{} - 120 {} {} 95 1e-30 80.0 0.1 1 1 1e-30 1e-28 {} 0.1 1 90 {} {} 10 100 0.95 -",
            protein,
            format!("{}_name", profile),
            profile,
            score,
            from,
            to
        )
    }

    fn select(lines: &[String]) -> Vec<DomainHit> {
        let text = lines.join("\n");
        select_best_hits(std::io::Cursor::new(text)).unwrap()
    }

    #[test]
    fn test_parse_fields() {
        let line = record("p1", "PF1", 55.5, 3, 9);
        let hit = DomainHit::parse(&line, 1).unwrap();
        assert_eq!(hit.protein, "p1");
        assert_eq!(hit.profile, "PF1");
        assert_eq!(hit.score, 55.5);
        assert_eq!(hit.start, 2);
        assert_eq!(hit.end, 9);
    }

    #[test]
    fn test_parse_accession_fallback() {
        let line = "p1 - 120 PF1_name - 95 1e-30 80.0 0.1 1 1 1e-30 1e-28 50 0.1 1 90 3 9 10 100 0.95 -";
        let hit = DomainHit::parse(line, 1).unwrap();
        assert_eq!(hit.profile, "PF1_name");
    }

    #[test]
    fn test_parse_malformed_record() {
        let err = DomainHit::parse("p1 PF1 50", 7).unwrap_err();
        assert!(err.contains("malformed domain-search record at line 7"));

        let bad_score = record("p1", "PF1", 55.5, 3, 9).replace("55.5", "high");
        assert!(DomainHit::parse(&bad_score, 1).is_err());
    }

    #[test]
    fn test_parse_invalid_range() {
        let line = record("p1", "PF1", 55.5, 9, 3);
        assert!(DomainHit::parse(&line, 1).unwrap_err().contains("range"));
    }

    #[test]
    fn test_best_hit_per_run() {
        let selected = select(&[
            record("p1", "PF1", 10.0, 1, 5),
            record("p2", "PF1", 30.0, 1, 5),
            record("p3", "PF1", 20.0, 1, 5),
            record("p4", "PF2", 15.0, 2, 8),
        ]);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].protein, "p2");
        assert_eq!(selected[0].profile, "PF1");
        assert_eq!(selected[0].score, 30.0);
        assert_eq!(selected[1].protein, "p4");
    }

    #[test]
    fn test_tie_keeps_first_seen() {
        let selected = select(&[
            record("first", "PF1", 25.0, 1, 5),
            record("second", "PF1", 25.0, 1, 5),
        ]);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].protein, "first");
    }

    #[test]
    fn test_profile_change_flushes_candidate() {
        let selected = select(&[
            record("p1", "PF1", 10.0, 1, 5),
            record("p2", "PF2", 5.0, 1, 5),
            record("p3", "PF2", 6.0, 1, 5),
        ]);
        let profiles: Vec<&str> = selected.iter().map(|h| h.profile.as_str()).collect();
        assert_eq!(profiles, vec!["PF1", "PF2"]);
        assert_eq!(selected[1].protein, "p3");
    }

    #[test]
    fn test_comment_lines_skipped() {
        let text = format!(
            "# target name ...\n#\n{}\n# trailer\n",
            record("p1", "PF1", 10.0, 1, 5)
        );
        let selected = select_best_hits(std::io::Cursor::new(text)).unwrap();
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn test_empty_report() {
        let selected = select_best_hits(std::io::Cursor::new("# only comments\n")).unwrap();
        assert!(selected.is_empty());
    }

    #[test]
    fn test_extract_spans() {
        let mut proteins = HashMap::new();
        proteins.insert("p1".to_string(), "MKVLLTAR".to_string());
        let hits = vec![DomainHit {
            profile: "PF1".to_string(),
            protein: "p1".to_string(),
            score: 10.0,
            start: 2,
            end: 6,
        }];
        let genome_hits = extract_spans("g1", &proteins, hits).unwrap();
        assert_eq!(genome_hits.genome, "g1");
        assert_eq!(genome_hits.span_for("PF1").unwrap().residues, "VLLT");
    }

    #[test]
    fn test_extract_spans_clamps_to_protein_length() {
        let mut proteins = HashMap::new();
        proteins.insert("p1".to_string(), "MKV".to_string());
        let hits = vec![DomainHit {
            profile: "PF1".to_string(),
            protein: "p1".to_string(),
            score: 10.0,
            start: 1,
            end: 10,
        }];
        let genome_hits = extract_spans("g1", &proteins, hits).unwrap();
        assert_eq!(genome_hits.spans[0].residues, "KV");
    }

    #[test]
    fn test_extract_spans_missing_protein() {
        let proteins = HashMap::new();
        let hits = vec![DomainHit {
            profile: "PF1".to_string(),
            protein: "ghost".to_string(),
            score: 10.0,
            start: 0,
            end: 3,
        }];
        let err = extract_spans("g1", &proteins, hits).unwrap_err();
        assert!(err.contains("g1"));
        assert!(err.contains("ghost"));
        assert!(err.contains("missing from the protein set"));
    }
}
