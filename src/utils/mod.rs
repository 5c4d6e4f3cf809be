mod fasta;
mod readers;

pub use fasta::{read_fasta, read_fasta_file, write_fasta};
pub use readers::open_fasta_reader;

pub type Result<T> = std::result::Result<T, String>;

pub fn handle_error_and_exit(err: String) -> ! {
    log::error!("{}", err);
    std::process::exit(1);
}
