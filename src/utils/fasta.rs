use super::{open_fasta_reader, Result};
use bio::io::fasta;
use std::collections::HashMap;
use std::io::{BufRead, Write as ioWrite};
use std::path::Path;

/// Reads FASTA records into an id list (input order) and an id-to-residues map.
pub fn read_fasta<R: BufRead>(reader: R) -> Result<(Vec<String>, HashMap<String, String>)> {
    let mut ids = Vec::new();
    let mut seqs = HashMap::new();
    for result in fasta::Reader::from_bufread(reader).records() {
        let record = result.map_err(|e| format!("Invalid FASTA record: {}", e))?;
        let seq = String::from_utf8(record.seq().to_vec())
            .map_err(|e| format!("Non-UTF8 residues in record '{}': {}", record.id(), e))?;
        if !seqs.contains_key(record.id()) {
            ids.push(record.id().to_string());
        }
        seqs.insert(record.id().to_string(), seq);
    }
    Ok((ids, seqs))
}

pub fn read_fasta_file(path: &Path) -> Result<(Vec<String>, HashMap<String, String>)> {
    let reader = open_fasta_reader(path)?;
    read_fasta(reader).map_err(|e| format!("File {}: {}", path.display(), e))
}

pub fn write_fasta<W: ioWrite>(writer: W, records: &[(&str, &str)]) -> Result<()> {
    let mut out = fasta::Writer::new(writer);
    for (id, seq) in records {
        out.write(id, None, seq.as_bytes())
            .map_err(|e| format!("Failed to write FASTA record '{}': {}", id, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_fasta_order_and_content() {
        let data = ">g2\nMKV\nLLT\n>g1\nARN\n";
        let (ids, seqs) = read_fasta(std::io::Cursor::new(data)).unwrap();
        assert_eq!(ids, vec!["g2", "g1"]);
        assert_eq!(seqs["g2"], "MKVLLT");
        assert_eq!(seqs["g1"], "ARN");
    }

    #[test]
    fn test_read_fasta_empty() {
        let (ids, seqs) = read_fasta(std::io::Cursor::new("")).unwrap();
        assert!(ids.is_empty());
        assert!(seqs.is_empty());
    }

    #[test]
    fn test_write_fasta_single_line_per_record() {
        let mut buf = Vec::new();
        write_fasta(&mut buf, &[("a", "MKV"), ("b", "AR-")]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, ">a\nMKV\n>b\nAR-\n");
    }
}
