use crate::cli::TreeArgs;
use crate::scg::collect::{collect, ProfileSequences};
use crate::scg::concat::concatenate;
use crate::scg::filter::filter_columns;
use crate::scg::fragments::{align_profile, AlignedFragment};
use crate::scg::hits::{self, GenomeHits};
use crate::scg::library::{Profile, ProfileLibrary};
use crate::scg::tools;
use crate::utils::{read_fasta_file, Result};
use crossbeam_channel::{bounded, Sender};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use rayon::ThreadPoolBuilder;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write as ioWrite};
use std::path::{Path, PathBuf};
use std::thread;

const CHANNEL_BUFFER_SIZE: usize = 2048;

/// One line of the per-hit report streamed to the writer thread.
struct HitRow {
    genome: String,
    profile: String,
    protein: String,
    score: f64,
    start: usize,
    end: usize,
}

pub fn tree(args: TreeArgs) -> Result<()> {
    let library = ProfileLibrary::from_path(&args.markers_path)?;
    log::info!("Loaded {} marker profiles", library.len());

    let genomes = find_genomes(&args.protein_dir, &args.extension)?;
    if genomes.is_empty() {
        return Err(format!(
            "No genomes with extension '.{}' in {}",
            args.extension,
            args.protein_dir.display()
        ));
    }
    log::info!("Found {} input genomes", genomes.len());

    let search_dir = args.out_dir.join("search");
    let align_dir = args.out_dir.join("alignments");
    for dir in [&args.out_dir, &search_dir, &align_dir] {
        fs::create_dir_all(dir)
            .map_err(|e| format!("Failed to create {}: {}", dir.display(), e))?;
    }

    let pool = initialize_thread_pool(args.num_threads)?;

    // Per-hit rows stream to a dedicated writer while the search phase runs.
    let (sender_row, receiver_row) = bounded::<HitRow>(CHANNEL_BUFFER_SIZE);
    let report_path = args.out_dir.join("marker_hits.tsv");
    let writer_thread = thread::spawn(move || -> Result<()> {
        let file = File::create(&report_path)
            .map_err(|e| format!("Failed to create {}: {}", report_path.display(), e))?;
        let mut out = BufWriter::new(file);
        let write = |out: &mut BufWriter<File>, line: String| {
            writeln!(out, "{}", line).map_err(|e| format!("Failed to write hit report: {}", e))
        };
        write(&mut out, "genome\tprofile\tprotein\tscore\tstart\tend".to_string())?;
        for row in &receiver_row {
            write(
                &mut out,
                format!(
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    row.genome, row.profile, row.protein, row.score, row.start, row.end
                ),
            )?;
        }
        Ok(())
    });

    // Search phase: one independent unit per genome. The collect is the
    // barrier; no profile work starts until every genome has finished.
    log::info!(
        "Searching {} genomes against the profile library with {} threads",
        genomes.len(),
        args.num_threads
    );
    let search_results: Vec<(String, Result<GenomeHits>)> = pool.install(|| {
        genomes
            .par_iter()
            .map_with(sender_row, |sender, (genome, path)| {
                (
                    genome.clone(),
                    process_genome(genome, path, &args, &search_dir, sender),
                )
            })
            .collect()
    });
    writer_thread
        .join()
        .map_err(|_| "Hit report writer thread panicked".to_string())??;

    let genome_hits: Vec<GenomeHits> = report_failures("genome", search_results)
        .into_iter()
        .map(|(_, hits)| hits)
        .collect();
    if genome_hits.is_empty() {
        return Err("Domain search failed for every genome".to_string());
    }

    // Alignment phase: one independent unit per profile with at least one
    // hit, joined before concatenation.
    let profile_sets: Vec<(&Profile, ProfileSequences)> = library
        .iter()
        .map(|profile| (profile, collect(&profile.id, &genome_hits)))
        .filter(|(_, seqs)| !seqs.is_empty())
        .collect();
    log::info!(
        "{} of {} profiles matched at least one genome",
        profile_sets.len(),
        library.len()
    );
    if profile_sets.is_empty() {
        return Err("No marker profile matched any genome".to_string());
    }

    let align_results: Vec<(String, Result<AlignedFragment>)> = pool.install(|| {
        profile_sets
            .par_iter()
            .map(|(profile, seqs)| {
                (
                    profile.id.clone(),
                    align_profile(profile, seqs, &align_dir, &args.hmmalign_exe),
                )
            })
            .collect()
    });
    let fragments: HashMap<String, AlignedFragment> =
        report_failures("profile", align_results).into_iter().collect();
    if fragments.is_empty() {
        return Err("Profile alignment failed for every profile".to_string());
    }

    let genome_ids: Vec<String> = genome_hits.iter().map(|g| g.genome.clone()).collect();
    let supermatrix = concatenate(&library, &fragments, &genome_ids);
    log::info!(
        "Concatenated alignment: {} genomes x {} columns",
        supermatrix.len(),
        supermatrix.width()
    );
    supermatrix.write_to_path(&args.out_dir.join("supermatrix.aln"))?;

    let filtered = filter_columns(&supermatrix, args.min_coverage, args.min_consensus)?;
    log::info!(
        "Column filtering kept {} of {} columns (max {}% gaps, min {}% consensus)",
        filtered.width(),
        supermatrix.width(),
        args.min_coverage,
        args.min_consensus
    );
    let filtered_path = args.out_dir.join(format!(
        "supermatrix_cov{}_css{}.aln",
        args.min_coverage, args.min_consensus
    ));
    filtered.write_to_path(&filtered_path)?;

    if args.skip_tree {
        log::info!(
            "Tree inference skipped, filtered alignment at: {}",
            filtered_path.display()
        );
        return Ok(());
    }

    let tree_path = args.out_dir.join("tree.newick");
    tools::run_fasttree(&args.fasttree_exe, &filtered_path, &tree_path)?;
    log::info!("Species tree exported to: {}", tree_path.display());

    Ok(())
}

/// Runs one genome through domain search, hit selection, and span
/// extraction. Every path this unit touches is scoped to the genome id.
fn process_genome(
    genome: &str,
    proteins_path: &Path,
    args: &TreeArgs,
    search_dir: &Path,
    sender: &Sender<HitRow>,
) -> Result<GenomeHits> {
    let table_path = search_dir.join(format!("{}_domtbl.txt", genome));
    tools::run_hmmsearch(
        &args.hmmsearch_exe,
        &args.markers_path,
        proteins_path,
        &table_path,
    )
    .map_err(|e| format!("genome '{}': {}", genome, e))?;

    let table = File::open(&table_path)
        .map_err(|e| format!("File {}: {}", table_path.display(), e))?;
    let selected = hits::select_best_hits(BufReader::new(table))
        .map_err(|e| format!("genome '{}': {}", genome, e))?;

    let (_, proteins) = read_fasta_file(proteins_path)?;
    let genome_hits = hits::extract_spans(genome, &proteins, selected)?;

    for span in &genome_hits.spans {
        let row = HitRow {
            genome: genome.to_string(),
            profile: span.hit.profile.clone(),
            protein: span.hit.protein.clone(),
            score: span.hit.score,
            start: span.hit.start + 1,
            end: span.hit.end,
        };
        if let Err(e) = sender.send(row) {
            log::error!("Failed to send hit row to writer thread: {}", e);
        }
    }

    Ok(genome_hits)
}

/// Splits per-unit results at a phase barrier: failures are logged and
/// summarized without aborting the survivors.
fn report_failures<T>(unit: &str, results: Vec<(String, Result<T>)>) -> Vec<(String, T)> {
    let mut ok = Vec::new();
    let mut failed = Vec::new();
    for (id, result) in results {
        match result {
            Ok(value) => ok.push((id, value)),
            Err(e) => {
                log::error!("{}", e);
                failed.push(id);
            }
        }
    }
    if !failed.is_empty() {
        log::warn!(
            "{} {} unit(s) failed and were excluded: {}",
            failed.len(),
            unit,
            failed.join(", ")
        );
    }
    ok
}

/// Lists `<genome>.<extension>` files under `dir`, sorted by genome id.
pub(crate) fn find_genomes(dir: &Path, extension: &str) -> Result<Vec<(String, PathBuf)>> {
    let suffix = format!(".{}", extension);
    let mut genomes = Vec::new();
    let entries =
        fs::read_dir(dir).map_err(|e| format!("Directory {}: {}", dir.display(), e))?;
    for entry in entries {
        let entry = entry.map_err(|e| format!("Directory {}: {}", dir.display(), e))?;
        let name = entry.file_name().to_string_lossy().to_string();
        if let Some(stem) = name.strip_suffix(&suffix) {
            if !stem.is_empty() {
                genomes.push((stem.to_string(), entry.path()));
            }
        }
    }
    genomes.sort();
    Ok(genomes)
}

fn initialize_thread_pool(num_threads: usize) -> Result<rayon::ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("scgtree-{}", i))
        .build()
        .map_err(|e| format!("Failed to initialize thread pool: {}", e))
}
