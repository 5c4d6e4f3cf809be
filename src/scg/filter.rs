use crate::scg::alignment::Alignment;
use crate::scg::GAP;
use crate::utils::Result;
use itertools::Itertools;
use std::collections::HashSet;

/// Removes uninformative supermatrix columns in two sequential passes:
/// first columns whose gap percentage exceeds `min_coverage`, then, on the
/// survivor, columns whose most abundant character falls below
/// `min_consensus`. Percentages are real-valued; equality with either cutoff
/// keeps the column.
pub fn filter_columns(
    alignment: &Alignment,
    min_coverage: f64,
    min_consensus: f64,
) -> Result<Alignment> {
    if alignment.is_empty() || alignment.width() == 0 {
        return Err(format!(
            "empty alignment: {} rows, {} columns",
            alignment.len(),
            alignment.width()
        ));
    }

    let low_coverage = low_coverage_columns(alignment, min_coverage);
    let covered = remove_columns(alignment, &low_coverage)?;

    let low_consensus = low_consensus_columns(&covered, min_consensus);
    remove_columns(&covered, &low_consensus)
}

/// 1-based indices of columns whose gap share strictly exceeds the cutoff.
fn low_coverage_columns(alignment: &Alignment, min_coverage: f64) -> Vec<usize> {
    let rows = alignment.len() as f64;
    (0..alignment.width())
        .filter(|&index| {
            let gaps = alignment.column(index).filter(|&c| c == GAP as u8).count();
            (gaps as f64 / rows) * 100.0 > min_coverage
        })
        .map(|index| index + 1)
        .collect()
}

/// 1-based indices of columns whose most abundant character (gap included)
/// holds a share strictly below the cutoff.
fn low_consensus_columns(alignment: &Alignment, min_consensus: f64) -> Vec<usize> {
    let rows = alignment.len() as f64;
    (0..alignment.width())
        .filter(|&index| {
            let top = alignment
                .column(index)
                .counts()
                .into_values()
                .max()
                .unwrap_or(0);
            (top as f64 / rows) * 100.0 < min_consensus
        })
        .map(|index| index + 1)
        .collect()
}

/// Removes the given 1-based columns, rebuilding each row from the maximal
/// contiguous runs of kept columns rather than character by character. The
/// result is byte-identical to naive per-column filtering.
pub fn remove_columns(alignment: &Alignment, columns: &[usize]) -> Result<Alignment> {
    let removed: HashSet<usize> = columns.iter().copied().collect();
    let kept: Vec<usize> = (0..alignment.width())
        .filter(|index| !removed.contains(&(index + 1)))
        .collect();
    if kept.is_empty() {
        return Err(format!(
            "all {} alignment columns removed by filtering",
            alignment.width()
        ));
    }

    let segments = to_segments(&kept);
    let mut filtered = Alignment::new();
    for record in &alignment.records {
        let mut row = String::with_capacity(kept.len());
        for &(start, end) in &segments {
            row.push_str(&record.seq[start..=end]);
        }
        filtered.push(&record.id, row);
    }
    Ok(filtered)
}

/// Partitions a sorted index list into maximal runs of consecutive values,
/// returned as inclusive (start, end) pairs.
fn to_segments(indices: &[usize]) -> Vec<(usize, usize)> {
    let mut segments = Vec::new();
    let mut current: Option<(usize, usize)> = None;

    for &index in indices {
        current = match current {
            None => Some((index, index)),
            Some((start, end)) if index == end + 1 => Some((start, index)),
            Some(segment) => {
                segments.push(segment);
                Some((index, index))
            }
        };
    }
    if let Some(segment) = current {
        segments.push(segment);
    }

    segments
}
