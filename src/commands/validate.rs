use crate::cli::ValidateArgs;
use crate::commands::tree::find_genomes;
use crate::scg::library::ProfileLibrary;
use crate::utils::{read_fasta_file, Result};

pub fn validate(args: ValidateArgs) -> Result<()> {
    let library = ProfileLibrary::from_path(&args.markers_path)?;
    log::info!("Profile library OK: {} profiles", library.len());

    let genomes = find_genomes(&args.protein_dir, &args.extension)?;
    if genomes.is_empty() {
        return Err(format!(
            "No genomes with extension '.{}' in {}",
            args.extension,
            args.protein_dir.display()
        ));
    }

    let mut error_count = 0;
    let mut success_count = 0;
    let mut protein_counts = Vec::new();

    for (genome, path) in &genomes {
        match read_fasta_file(path) {
            Ok((ids, _)) => {
                if ids.is_empty() {
                    log::error!("genome '{}': no protein records in {}", genome, path.display());
                    error_count += 1;
                } else {
                    protein_counts.push(ids.len());
                    success_count += 1;
                }
            }
            Err(e) => {
                log::error!("genome '{}': {}", genome, e);
                error_count += 1;
            }
        }
    }

    if !protein_counts.is_empty() {
        let stats = calculate_stats(&protein_counts);
        log::info!(
            "Proteins per genome - Range: [{},{}], Median: {:.2}, Mean: {:.2}",
            stats.min,
            stats.max,
            stats.median,
            stats.mean
        );
    }

    match error_count {
        0 => log::info!("Validation successful. Genomes pass={}", success_count),
        _ => log::info!(
            "Validation failed. Genomes pass={}, fail={}",
            success_count,
            error_count
        ),
    }

    Ok(())
}

fn calculate_stats(data: &[usize]) -> Stats {
    let mut sorted = data.to_vec();
    sorted.sort_unstable();
    let len = sorted.len();
    let median = if len % 2 == 0 {
        (sorted[len / 2 - 1] + sorted[len / 2]) as f64 / 2.0
    } else {
        sorted[len / 2] as f64
    };
    let sum: usize = sorted.iter().sum();
    let mean = sum as f64 / len as f64;
    Stats {
        min: *sorted.first().unwrap_or(&0),
        max: *sorted.last().unwrap_or(&0),
        mean,
        median,
    }
}

struct Stats {
    min: usize,
    max: usize,
    mean: f64,
    median: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_stats() {
        let stats = calculate_stats(&[4, 1, 3, 2]);
        assert_eq!(stats.min, 1);
        assert_eq!(stats.max, 4);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.median, 2.5);

        let stats = calculate_stats(&[5, 1, 3]);
        assert_eq!(stats.median, 3.0);
    }
}
