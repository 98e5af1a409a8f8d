// args.rs - Command line arguments definition

use argh::FromArgs;

#[derive(FromArgs)]
/// timesweep - Windowed selective-sweep scan of time-series genomic samples
pub struct Args {
    /// call table (.tsv): CHROM, POS, optional MT, one column per sampled chromosome
    #[argh(option, short = 'i')]
    pub input: Option<String>,

    /// comma-separated individuals sampled per timepoint, earliest first (e.g. 10,10,10)
    #[argh(option, short = 's')]
    pub sample_sizes: Option<String>,

    /// chromosomes per individual (default: 2)
    #[argh(option, default = "2")]
    pub ploidy: usize,

    /// window width in sites, must be odd and match the trained models (default: 51)
    #[argh(option, short = 'w', default = "51")]
    pub window_size: usize,

    /// windows sent to a model per invocation (default: 256)
    #[argh(option, default = "256")]
    pub batch_size: usize,

    /// output directory (default: directory of the input file)
    #[argh(option, short = 'o')]
    pub output_dir: Option<String>,

    /// command running the allele-frequency classifier (JSON on stdin/stdout)
    #[argh(option)]
    pub afs_model: Option<String>,

    /// command running the haplotype-frequency classifier (JSON on stdin/stdout)
    #[argh(option)]
    pub hfs_model: Option<String>,

    /// command running the frequency-increment test (JSON on stdin/stdout)
    #[argh(option)]
    pub fit_command: Option<String>,

    /// generation of the first timepoint (default: 10060)
    #[argh(option, default = "10060")]
    pub gen_start: u64,

    /// generations between consecutive timepoints (default: 10)
    #[argh(option, default = "10")]
    pub gen_step: u64,

    /// comma-separated generation of every timepoint (overrides --gen-start/--gen-step)
    #[argh(option)]
    pub generations: Option<String>,

    /// only scan sites in CHROM or CHROM:START-END
    #[argh(option)]
    pub region: Option<String>,

    /// include only chromosomes matching regex pattern
    #[argh(option)]
    pub include_chroms: Option<String>,

    /// number of threads (default: auto-detect)
    #[argh(option)]
    pub threads: Option<usize>,

    /// also write every window tensor as JSON lines
    #[argh(switch)]
    pub export_windows: bool,

    /// hide progress bars
    #[argh(switch)]
    pub no_progress: bool,

    /// show call matrix statistics only, then exit
    #[argh(switch)]
    pub stats_only: bool,

    /// validate inputs without computation (dry run)
    #[argh(switch)]
    pub dry_run: bool,

    /// path to TOML configuration file
    #[argh(option)]
    pub config: Option<String>,

    /// generate sample configuration file and exit
    #[argh(switch)]
    pub generate_config: bool,
}
