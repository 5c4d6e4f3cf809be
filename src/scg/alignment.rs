use crate::utils::{open_fasta_reader, read_fasta, write_fasta, Result};
use std::fs::File;
use std::io::{BufRead, BufWriter, Write as ioWrite};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentRecord {
    pub id: String,
    pub seq: String,
}

/// A rectangular multiple alignment: ordered rows of equal length.
/// Used for both the concatenated supermatrix and its filtered form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alignment {
    pub records: Vec<AlignmentRecord>,
}

impl Alignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: &str, seq: String) {
        self.records.push(AlignmentRecord {
            id: id.to_string(),
            seq,
        });
    }

    /// Number of rows (genomes).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.records.first().map_or(0, |r| r.seq.len())
    }

    /// Bytes of one column, top to bottom (0-based index).
    pub fn column(&self, index: usize) -> impl Iterator<Item = u8> + '_ {
        self.records.iter().map(move |r| r.seq.as_bytes()[index])
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let (ids, seqs) = read_fasta(reader)?;
        let mut alignment = Alignment::new();
        for id in ids {
            let seq = seqs[&id].clone();
            if !alignment.is_empty() && seq.len() != alignment.width() {
                return Err(format!(
                    "alignment row '{}' has {} columns, expected {}",
                    id,
                    seq.len(),
                    alignment.width()
                ));
            }
            alignment.push(&id, seq);
        }
        Ok(alignment)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let reader = open_fasta_reader(path)?;
        Self::from_reader(reader).map_err(|e| format!("File {}: {}", path.display(), e))
    }

    pub fn write<W: ioWrite>(&self, writer: W) -> Result<()> {
        let records: Vec<(&str, &str)> = self
            .records
            .iter()
            .map(|r| (r.id.as_str(), r.seq.as_str()))
            .collect();
        write_fasta(writer, &records)
    }

    pub fn write_to_path(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .map_err(|e| format!("Failed to create {}: {}", path.display(), e))?;
        self.write(BufWriter::new(file))
            .map_err(|e| format!("File {}: {}", path.display(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_reader() {
        let data = ">g1\nAAA\n>g2\nAA-\n";
        let alignment = Alignment::from_reader(std::io::Cursor::new(data)).unwrap();
        assert_eq!(alignment.len(), 2);
        assert_eq!(alignment.width(), 3);
        let col: Vec<u8> = alignment.column(2).collect();
        assert_eq!(col, vec![b'A', b'-']);
    }

    #[test]
    fn test_from_reader_rejects_ragged_rows() {
        let data = ">g1\nAAA\n>g2\nAA\n";
        assert!(Alignment::from_reader(std::io::Cursor::new(data)).is_err());
    }

    #[test]
    fn test_write_round_trip() {
        let mut alignment = Alignment::new();
        alignment.push("g1", "AC-".to_string());
        alignment.push("g2", "A-G".to_string());
        let mut buf = Vec::new();
        alignment.write(&mut buf).unwrap();
        let back = Alignment::from_reader(std::io::Cursor::new(buf)).unwrap();
        assert_eq!(back, alignment);
    }
}
