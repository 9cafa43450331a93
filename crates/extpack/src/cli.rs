use clap::{Args, Parser, Subcommand};
use extpack::archive::ListingSource;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "extpack",
    version,
    about = "Canonicalize extension JSON and validate built packages against an allow-list"
)]
pub(crate) struct Cli {
    /// Project root (default: $EXTPACK_PROJECT_ROOT or .)
    #[arg(long, global = true)]
    pub(crate) project_root: Option<PathBuf>,
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Rewrite every project JSON file into canonical form.
    Format {
        /// List files that would change and exit 1 instead of writing.
        #[arg(long)]
        check: bool,
    },
    /// Check a built package against the archive schema.
    Validate(ValidateArgs),
    /// Compare the manifest version with the published one.
    Version {
        /// Skip the published-version lookup.
        #[arg(long)]
        offline: bool,
    },
    /// Run version, format and validate steps in order.
    Check {
        #[command(flatten)]
        archive: ArchiveArgs,
        /// Schema document, relative to the project root (default: [archive].schema_path)
        #[arg(long)]
        schema: Option<PathBuf>,
        #[arg(long)]
        offline: bool,
    },
}

#[derive(Args, Debug)]
pub(crate) struct ValidateArgs {
    #[command(flatten)]
    pub(crate) archive: ArchiveArgs,
    /// Schema document, relative to the project root (default: [archive].schema_path)
    #[arg(long)]
    pub(crate) schema: Option<PathBuf>,
}

#[derive(Args, Debug)]
#[group(multiple = false)]
pub(crate) struct ArchiveArgs {
    /// Built package (.zip)
    #[arg(long)]
    pub(crate) archive: Option<PathBuf>,
    /// Text listing, one entry per line (`-` or omitted: stdin)
    #[arg(long)]
    pub(crate) listing: Option<PathBuf>,
}

impl ArchiveArgs {
    pub(crate) fn source(&self) -> ListingSource {
        match (&self.archive, &self.listing) {
            (Some(zip), _) => ListingSource::Zip(zip.clone()),
            (None, Some(text)) => ListingSource::Text(text.clone()),
            (None, None) => ListingSource::Text(PathBuf::from("-")),
        }
    }
}
