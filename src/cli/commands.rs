use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::model::category::CategoryFilter;

#[derive(Parser)]
#[command(
    name = "bless",
    about = concat!("bless v", env!("CARGO_PKG_VERSION"), " - a blessing for every wish"),
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different data directory
    #[arg(short = 'D', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Seed the random source for reproducible picks
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Make a wish and receive a blessing
    Wish(WishArgs),
    /// Show a random blessing without logging it
    Random(RandomArgs),
    /// Show today's blessing
    Daily(DailyArgs),
    /// List past wishes, newest first
    History(HistoryArgs),
    /// List favorite blessings
    Favorites(FavoritesArgs),
    /// Add or remove a blessing from favorites
    Fav(FavArgs),
    /// List categories and how many blessings each holds
    Categories,
    /// Clear history, favorites and daily blessings
    Reset,
}

#[derive(Args)]
pub struct WishArgs {
    /// What you are wishing for
    pub text: String,
    /// Category to draw from (all, love, wisdom, health, success, peace, gratitude)
    #[arg(short, long, default_value = "all")]
    pub category: CategoryFilter,
    /// Answer immediately instead of waiting for the processing delay
    #[arg(long)]
    pub no_delay: bool,
}

#[derive(Args)]
pub struct RandomArgs {
    /// Category to draw from
    #[arg(short, long, default_value = "all")]
    pub category: CategoryFilter,
}

#[derive(Args)]
pub struct DailyArgs {
    /// Date to show (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub date: Option<NaiveDate>,
    /// Replace the day's blessing with a different one
    #[arg(long)]
    pub regenerate: bool,
}

#[derive(Args)]
pub struct HistoryArgs {
    /// Case-insensitive text matched against wish and blessing text
    #[arg(short, long)]
    pub search: Option<String>,
    /// Treat the search text as a regular expression
    #[arg(long)]
    pub regex: bool,
    /// Only show blessings from this category
    #[arg(short, long, default_value = "all")]
    pub category: CategoryFilter,
    /// Show at most this many entries
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct FavoritesArgs {
    /// Case-insensitive text matched against blessing text
    #[arg(short, long)]
    pub search: Option<String>,
    /// Treat the search text as a regular expression
    #[arg(long)]
    pub regex: bool,
    /// Only show blessings from this category
    #[arg(short, long, default_value = "all")]
    pub category: CategoryFilter,
}

#[derive(Args)]
pub struct FavArgs {
    /// Blessing ID (e.g. love-2)
    pub id: String,
}
