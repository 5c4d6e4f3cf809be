use crate::utils::Result;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One marker profile from the combined HMM flatfile.
///
/// The identifier is the record's accession when present, otherwise its name;
/// domain-search reports key their hits the same way. The raw record text is
/// kept so that per-profile model files can be materialized for the external
/// aligner.
#[derive(Debug, Clone)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub model: String,
}

/// The ordered, immutable set of marker profiles, loaded once at startup.
/// Profile rank (concatenation order) is the flatfile record order.
#[derive(Debug, Default)]
pub struct ProfileLibrary {
    profiles: Vec<Profile>,
    index: HashMap<String, usize>,
}

impl ProfileLibrary {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| format!("File {}: {}", path.display(), e))?;
        Self::from_reader(BufReader::new(file))
            .map_err(|e| format!("Profile library {}: {}", path.display(), e))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut library = ProfileLibrary::default();
        let mut block = String::new();
        let mut name: Option<String> = None;
        let mut accession: Option<String> = None;

        for (line_number, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| format!("Error reading line {}: {}", line_number + 1, e))?;
            block.push_str(&line);
            block.push('\n');

            let mut fields = line.split_whitespace();
            match fields.next() {
                Some("NAME") => name = fields.next().map(|s| s.to_string()),
                Some("ACC") => accession = fields.next().map(|s| s.to_string()),
                Some("//") => {
                    let name = name.take().ok_or_else(|| {
                        format!("profile record ending at line {} has no NAME", line_number + 1)
                    })?;
                    let id = accession.take().unwrap_or_else(|| name.clone());
                    library.push(Profile {
                        id,
                        name,
                        model: std::mem::take(&mut block),
                    })?;
                }
                _ => {}
            }
        }

        if library.is_empty() {
            return Err("no profile records found".to_string());
        }
        Ok(library)
    }

    fn push(&mut self, profile: Profile) -> Result<()> {
        if self.index.contains_key(&profile.id) {
            return Err(format!("duplicate profile identifier '{}'", profile.id));
        }
        self.index.insert(profile.id.clone(), self.profiles.len());
        self.profiles.push(profile);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Profiles in rank order.
    pub fn iter(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Profile> {
        self.index.get(id).map(|&i| &self.profiles[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_PROFILES: &str = "\
HMMER3/f [3.1b2 | February 2015]
NAME  MarkerA
ACC   PF00001.1
LENG  4
HMM          A        C
//
HMMER3/f [3.1b2 | February 2015]
NAME  MarkerB
LENG  2
HMM          A        C
//
";

    #[test]
    fn test_parse_order_and_ids() {
        let library = ProfileLibrary::from_reader(std::io::Cursor::new(TWO_PROFILES)).unwrap();
        assert_eq!(library.len(), 2);
        let ids: Vec<&str> = library.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["PF00001.1", "MarkerB"]);
        assert_eq!(library.get("PF00001.1").unwrap().name, "MarkerA");
        assert!(library.get("MarkerA").is_none());
    }

    #[test]
    fn test_model_block_round_trip() {
        let library = ProfileLibrary::from_reader(std::io::Cursor::new(TWO_PROFILES)).unwrap();
        let model = &library.get("MarkerB").unwrap().model;
        assert!(model.starts_with("HMMER3/f"));
        assert!(model.contains("NAME  MarkerB"));
        assert!(model.trim_end().ends_with("//"));
        assert!(!model.contains("MarkerA"));
    }

    #[test]
    fn test_duplicate_identifier_rejected() {
        let data = "NAME  M1\n//\nNAME  M1\n//\n";
        let result = ProfileLibrary::from_reader(std::io::Cursor::new(data));
        assert!(result.unwrap_err().contains("duplicate"));
    }

    #[test]
    fn test_record_without_name_rejected() {
        let data = "LENG  4\n//\n";
        assert!(ProfileLibrary::from_reader(std::io::Cursor::new(data)).is_err());
    }

    #[test]
    fn test_empty_library_rejected() {
        let result = ProfileLibrary::from_reader(std::io::Cursor::new(""));
        assert!(result.unwrap_err().contains("no profile records"));
    }
}
