use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "bam-mergeref",
    about = "Merge two name-sorted BAM files of the same reads aligned against different references",
    version
)]
pub struct Args {
    /// Input BAM aligned against the first reference (sorted by name)
    pub in_bam1: PathBuf,

    /// Input BAM aligned against the second reference (sorted by name)
    pub in_bam2: PathBuf,

    /// Output BAM path
    pub out_bam: PathBuf,

    /// Name of the first reference, used to build synthetic contig names
    #[arg(short = 'a', long = "refname1", value_name = "NAME")]
    pub ref1_name: String,

    /// Name of the second reference, used to build synthetic contig names
    #[arg(short = 'b', long = "refname2", value_name = "NAME")]
    pub ref2_name: String,

    /// File collecting unmapped and other undesirable alignments
    #[arg(short = 't', long = "trashfile", value_name = "BAM")]
    pub trash_bam: Option<PathBuf>,

    /// Collect unmapped and other undesirable alignments in <OUT_BAM>.trash
    #[arg(short = 'T', long = "trash")]
    pub auto_trash: bool,

    /// Write log messages to this file instead of stderr
    #[arg(short = 'l', long = "logfile", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set logging level to WARN
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Seed for breaking ties between identical alignments (default: wall-clock time)
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,
}

impl Args {
    /// Trash destination: the explicit path, else `<out_bam>.trash` when `-T` is set.
    pub fn trash_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.trash_bam {
            return Some(path.clone());
        }
        if self.auto_trash {
            let mut path = self.out_bam.clone().into_os_string();
            path.push(".trash");
            return Some(PathBuf::from(path));
        }
        None
    }
}
