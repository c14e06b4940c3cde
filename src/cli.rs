use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "packzip")]
#[command(version)]
#[command(about = "Pack files into a reproducible, uncompressed ZIP archive", long_about = None)]
#[command(after_help = "Examples:\n  \
  packzip bundle.zip report.pdf report.csv   pack two files into bundle.zip\n  \
  packzip -j -o out/bundle.zip /tmp/a.pdf     store a.pdf without its directory, replace out/bundle.zip\n  \
  packzip -v bundle.zip                       list bundle.zip verbosely\n  \
  packzip -T bundle.zip                       check every entry's CRC-32")]
pub struct Cli {
    /// ZIP archive to create or inspect
    #[arg(value_name = "ARCHIVE")]
    pub archive: String,

    /// Files to pack, stored in the order given
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// List archive contents (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List archive contents verbosely
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Test archive integrity
    #[arg(short = 'T')]
    pub test: bool,

    /// Overwrite an existing archive WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Junk paths (store only the file name)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    /// Whether the archive is read rather than created
    pub fn is_inspect(&self) -> bool {
        self.list || self.verbose || self.test
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Default log filter when `RUST_LOG` is unset
    pub fn log_level(&self) -> &'static str {
        if self.is_very_quiet() {
            "off"
        } else if self.is_quiet() {
            "error"
        } else {
            "warn"
        }
    }
}
