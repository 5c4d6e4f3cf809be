use crate::scg::collect::ProfileSequences;
use crate::scg::library::Profile;
use crate::scg::tools;
use crate::utils::{write_fasta, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufWriter};
use std::path::Path;

/// One profile's aligned sequences: one fixed-width residue/gap string per
/// genome that had a hit, in first-seen order.
#[derive(Debug, Clone)]
pub struct AlignedFragment {
    pub profile: String,
    pub ids: Vec<String>,
    pub seqs: HashMap<String, String>,
    pub width: usize,
}

impl AlignedFragment {
    /// Establishes the equal-width invariant the concatenator relies on.
    pub fn from_parts(
        profile: &str,
        ids: Vec<String>,
        seqs: HashMap<String, String>,
    ) -> Result<Self> {
        let width = ids.first().map_or(0, |id| seqs[id].len());
        for id in &ids {
            if seqs[id].len() != width {
                return Err(format!(
                    "inconsistent fragment width for profile '{}': '{}' has {} columns, expected {}",
                    profile,
                    id,
                    seqs[id].len(),
                    width
                ));
            }
        }
        Ok(AlignedFragment {
            profile: profile.to_string(),
            ids,
            seqs,
            width,
        })
    }

    pub fn row(&self, genome: &str) -> Option<&str> {
        self.seqs.get(genome).map(|s| s.as_str())
    }
}

/// Normalizes the external aligner's output, which may wrap each sequence
/// over several identifier-prefixed blocks, into one contiguous string per
/// genome. First-seen genome order is preserved.
pub fn normalize_alignment<R: BufRead>(profile: &str, reader: R) -> Result<AlignedFragment> {
    let mut ids: Vec<String> = Vec::new();
    let mut seqs: HashMap<String, String> = HashMap::new();

    for (line_number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format!("Error reading line {}: {}", line_number + 1, e))?;
        let mut fields = line.split_whitespace();
        let id = match fields.next() {
            Some(id) => id,
            None => continue,
        };
        let residues = fields.next().ok_or_else(|| {
            format!(
                "profile '{}': unexpected aligner output at line {}: {}",
                profile,
                line_number + 1,
                line
            )
        })?;

        match seqs.get_mut(id) {
            Some(seq) => seq.push_str(residues),
            None => {
                ids.push(id.to_string());
                seqs.insert(id.to_string(), residues.to_string());
            }
        }
    }

    AlignedFragment::from_parts(profile, ids, seqs)
}

/// Runs the external profile aligner for one profile and normalizes its
/// output. Writes, under `work_dir`: the unaligned input FASTA, the profile's
/// model file, and the normalized aligned FASTA. All file names are scoped to
/// the profile, so concurrent per-profile units never collide.
pub fn align_profile(
    profile: &Profile,
    seqs: &ProfileSequences,
    work_dir: &Path,
    hmmalign_exe: &str,
) -> Result<AlignedFragment> {
    let seq_path = work_dir.join(format!("{}.fasta", profile.id));
    let model_path = work_dir.join(format!("{}.hmm", profile.id));
    let aligned_path = work_dir.join(format!("{}_aligned.fasta", profile.id));

    let out = File::create(&seq_path)
        .map_err(|e| format!("Failed to create {}: {}", seq_path.display(), e))?;
    seqs.write_fasta(BufWriter::new(out))?;
    std::fs::write(&model_path, &profile.model)
        .map_err(|e| format!("Failed to write {}: {}", model_path.display(), e))?;

    let stdout = tools::run_hmmalign(hmmalign_exe, &model_path, &seq_path)
        .map_err(|e| format!("profile '{}': {}", profile.id, e))?;
    let fragment = normalize_alignment(&profile.id, stdout.as_slice())?;

    let records: Vec<(&str, &str)> = fragment
        .ids
        .iter()
        .map(|id| (id.as_str(), fragment.seqs[id].as_str()))
        .collect();
    let out = File::create(&aligned_path)
        .map_err(|e| format!("Failed to create {}: {}", aligned_path.display(), e))?;
    write_fasta(BufWriter::new(out), &records)?;

    Ok(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_wrapped_blocks() {
        let text = "\
g1  MKV
g2  ML-

g1  AR
g2  -R
";
        let fragment = normalize_alignment("PF1", std::io::Cursor::new(text)).unwrap();
        assert_eq!(fragment.ids, vec!["g1", "g2"]);
        assert_eq!(fragment.seqs["g1"], "MKVAR");
        assert_eq!(fragment.seqs["g2"], "ML--R");
        assert_eq!(fragment.width, 5);
    }

    #[test]
    fn test_normalize_single_block() {
        let text = "g1 MKV\ng2 ML-\n";
        let fragment = normalize_alignment("PF1", std::io::Cursor::new(text)).unwrap();
        assert_eq!(fragment.width, 3);
        assert_eq!(fragment.row("g2"), Some("ML-"));
        assert_eq!(fragment.row("g3"), None);
    }

    #[test]
    fn test_normalize_rejects_width_mismatch() {
        let text = "g1 MKVA\ng2 ML-\n";
        let err = normalize_alignment("PF1", std::io::Cursor::new(text)).unwrap_err();
        assert!(err.contains("inconsistent fragment width for profile 'PF1'"));
        assert!(err.contains("g2"));
    }

    #[test]
    fn test_normalize_rejects_bare_identifier() {
        let text = "g1 MKV\ng2\n";
        assert!(normalize_alignment("PF1", std::io::Cursor::new(text)).is_err());
    }

    #[test]
    fn test_normalize_empty_output() {
        let fragment = normalize_alignment("PF1", std::io::Cursor::new("")).unwrap();
        assert!(fragment.ids.is_empty());
        assert_eq!(fragment.width, 0);
    }
}
