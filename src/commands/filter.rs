use crate::cli::FilterArgs;
use crate::scg::alignment::Alignment;
use crate::scg::filter::filter_columns;
use crate::utils::Result;
use std::path::Path;

pub fn filter(args: FilterArgs) -> Result<()> {
    let alignment = Alignment::from_path(&args.alignment_path)?;
    log::info!(
        "Read alignment: {} genomes x {} columns",
        alignment.len(),
        alignment.width()
    );

    let filtered = filter_columns(&alignment, args.min_coverage, args.min_consensus)?;
    log::info!(
        "Column filtering kept {} of {} columns (max {}% gaps, min {}% consensus)",
        filtered.width(),
        alignment.width(),
        args.min_coverage,
        args.min_consensus
    );

    filtered.write_to_path(Path::new(&args.output_path))?;
    log::info!("Filtered alignment exported to: {}", args.output_path);
    Ok(())
}
