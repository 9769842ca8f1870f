use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "humidor")]
#[command(version, about = "Cigar collection and tasting log")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new humidor project in the current directory
    Init,

    /// Manage the cigar inventory
    Cigar(CigarCommand),

    /// Record and browse tastings
    Tasting(TastingCommand),

    /// Show dashboard statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP server
    Serve {
        /// Address to bind, overrides config.yaml and HUMIDOR_BIND
        #[arg(long)]
        bind: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct CigarCommand {
    #[command(subcommand)]
    pub action: CigarAction,
}

#[derive(Subcommand, Debug)]
pub enum CigarAction {
    /// Add a cigar to the inventory
    Add {
        /// Cigar name
        name: String,

        /// Ring gauge / vitola
        #[arg(long)]
        gauge: Option<String>,

        /// Country of origin
        #[arg(long)]
        country: Option<String>,

        /// Price paid
        #[arg(long)]
        price: Option<f64>,

        /// Acquisition date (YYYY-MM-DD)
        #[arg(long)]
        acquired: Option<String>,

        /// Quantity in stock
        #[arg(long, default_value_t = 1)]
        stock: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List all cigars
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a single cigar
    Get {
        id: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search by name, country or gauge
    Search {
        query: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct TastingCommand {
    #[command(subcommand)]
    pub action: TastingAction,
}

#[derive(Subcommand, Debug)]
pub enum TastingAction {
    /// Start a tasting (phase 1, while smoking)
    Start {
        /// Cigar id
        cigar_id: String,

        /// Tasting date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,

        /// Social context, e.g. alone or with company
        #[arg(long)]
        moment: Option<String>,

        /// Cut style
        #[arg(long)]
        cut: Option<String>,

        /// Draw quality
        #[arg(long)]
        draw: Option<String>,

        /// Band leaf note
        #[arg(long)]
        band_leaf: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Finalize a tasting (phase 2, after smoking)
    Finalize {
        id: i64,

        #[command(flatten)]
        fields: PhaseTwoArgs,

        /// Flavor noticed, e.g. "cafe" (repeatable; unlisted flavors are cleared)
        #[arg(long = "flavor", short = 'f')]
        flavors: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change individual fields of a tasting
    Update {
        id: i64,

        /// Tasting date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        moment: Option<String>,

        #[arg(long)]
        cut: Option<String>,

        #[arg(long)]
        draw: Option<String>,

        #[arg(long)]
        band_leaf: Option<String>,

        #[command(flatten)]
        fields: PhaseTwoArgs,

        /// Mark a flavor as present (repeatable)
        #[arg(long = "flavor", short = 'f')]
        add_flavors: Vec<String>,

        /// Mark a flavor as absent (repeatable)
        #[arg(long = "no-flavor")]
        remove_flavors: Vec<String>,

        /// New status (in_progress, finalized)
        #[arg(long)]
        status: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a tasting and its photo
    Delete {
        id: i64,

        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// List tastings
    List {
        /// Only tastings with this status (in_progress, finalized)
        #[arg(long)]
        status: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a single tasting
    Get {
        id: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Phase-2 fields shared by finalize and update.
#[derive(Args, Debug, Default)]
pub struct PhaseTwoArgs {
    /// Duration in minutes ("" clears)
    #[arg(long)]
    pub duration: Option<String>,

    /// Rating, 1-10 ("" clears)
    #[arg(long)]
    pub rating: Option<String>,

    /// Burn / construction notes
    #[arg(long)]
    pub burn: Option<String>,

    /// Would buy again (yes / no / depends on price)
    #[arg(long)]
    pub buy_again: Option<String>,

    /// Free-form notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Note about the band
    #[arg(long)]
    pub band_note: Option<String>,

    /// Photo of the band
    #[arg(long)]
    pub photo: Option<PathBuf>,
}
