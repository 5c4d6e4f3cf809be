use crate::scg::alignment::Alignment;
use crate::scg::fragments::AlignedFragment;
use crate::scg::library::ProfileLibrary;
use crate::scg::GAP;
use std::collections::HashMap;

/// Joins the per-profile fragments end to end, in library rank order, into
/// one supermatrix row per genome. A genome without a hit for a profile gets
/// a gap run of that profile's width; a profile with no fragment at all
/// contributes no columns. Genomes with zero hits anywhere come out as
/// all-gap rows; excluding them is the caller's policy, not handled here.
pub fn concatenate(
    library: &ProfileLibrary,
    fragments: &HashMap<String, AlignedFragment>,
    genomes: &[String],
) -> Alignment {
    let mut rows: Vec<String> = vec![String::new(); genomes.len()];

    for profile in library.iter() {
        let fragment = match fragments.get(&profile.id) {
            Some(fragment) => fragment,
            None => continue,
        };
        for (row, genome) in rows.iter_mut().zip(genomes) {
            match fragment.row(genome) {
                Some(seq) => row.push_str(seq),
                None => row.extend(std::iter::repeat(GAP).take(fragment.width)),
            }
        }
    }

    let mut alignment = Alignment::new();
    for (genome, row) in genomes.iter().zip(rows) {
        alignment.push(genome, row);
    }
    alignment
}
