use std::time::Duration;

use chrono::{Local, NaiveDate};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::backend::{Backend, DirBackend, MemoryBackend};
use crate::io::config_io::{self, ConfigError};
use crate::io::store::Store;
use crate::model::category::CategoryFilter;
use crate::model::config::Config;
use crate::ops::daily::TimeOfDay;
use crate::ops::search::{self, Query};
use crate::ops::select::SeededRandom;
use crate::session::Session;

type CliResult = Result<(), Box<dyn std::error::Error>>;
type CliSession = Session<Box<dyn Backend>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CliResult {
    let json = cli.json;
    let session = open_session(&cli)?;

    let result = match cli.command {
        Commands::Wish(args) => cmd_wish(&session, args, json),
        Commands::Random(args) => cmd_random(&session, args, json),
        Commands::Daily(args) => cmd_daily(&session, args, json),
        Commands::History(args) => cmd_history(&session, args, json),
        Commands::Favorites(args) => cmd_favorites(&session, args, json),
        Commands::Fav(args) => cmd_fav(&session, args, json),
        Commands::Categories => cmd_categories(&session, json),
        Commands::Reset => cmd_reset(&session, json),
    };

    // Persistence problems never fail a command
    for warning in session.take_warnings() {
        eprintln!("warning: {}", warning);
    }
    result
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_session(cli: &Cli) -> Result<CliSession, Box<dyn std::error::Error>> {
    let dir = config_io::data_dir(cli.data_dir.as_deref());
    let config = match config_io::read_config(&dir) {
        Ok(config) => config,
        Err(e @ ConfigError::ReadError { .. }) => {
            eprintln!("warning: {}; using default settings", e);
            Config::default()
        }
        Err(e) => return Err(e.into()),
    };
    let catalog = config_io::load_catalog(&config, &dir)?;

    // Without a usable data directory the session still runs, it just
    // forgets everything on exit
    let backend: Box<dyn Backend> = match DirBackend::open(&dir) {
        Ok(backend) => Box::new(backend),
        Err(e) => {
            eprintln!("warning: {}; nothing will be saved", e);
            Box::new(MemoryBackend::new())
        }
    };

    let delay = match &cli.command {
        Commands::Wish(args) if args.no_delay => Duration::ZERO,
        _ => Duration::from_millis(config.wish.delay_ms),
    };
    let mut session = Session::new(catalog, Store::load(backend)).with_delay(delay);
    if let Some(seed) = cli.seed {
        session = session.with_rng(Box::new(SeededRandom::new(seed)));
    }
    Ok(session)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn search_query(
    term: Option<&str>,
    category: CategoryFilter,
    regex: bool,
) -> Result<Query, regex::Error> {
    if regex {
        Query::with_regex(term, category)
    } else {
        Query::new(term, category)
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_wish(session: &CliSession, args: WishArgs, json: bool) -> CliResult {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let Some(item) = runtime.block_on(session.submit_wish(&args.text, args.category))? else {
        eprintln!("nothing to wish for: the wish is empty");
        return Ok(());
    };

    let favorited = session.is_favorited(&item.blessing);
    if json {
        return print_json(&WishJson {
            id: &item.id,
            wish: &item.wish,
            timestamp: item.timestamp.to_rfc3339(),
            blessing: BlessingJson {
                blessing: &item.blessing,
                favorited,
            },
        });
    }
    print!("{}", format_blessing(&item.blessing, favorited));
    Ok(())
}

fn cmd_random(session: &CliSession, args: RandomArgs, json: bool) -> CliResult {
    let blessing = session.random(args.category)?;
    let favorited = session.is_favorited(&blessing);
    if json {
        return print_json(&BlessingJson {
            blessing: &blessing,
            favorited,
        });
    }
    print!("{}", format_blessing(&blessing, favorited));
    Ok(())
}

fn cmd_daily(session: &CliSession, args: DailyArgs, json: bool) -> CliResult {
    let date = args.date.unwrap_or_else(today);
    let blessing = if args.regenerate {
        session.regenerate_daily(date)?
    } else {
        session.daily(date)?
    };
    let time_of_day = TimeOfDay::from_time(Local::now());
    let favorited = session.is_favorited(&blessing);

    if json {
        return print_json(&DailyJson {
            date,
            time_of_day,
            greeting: time_of_day.greeting(),
            blessing: BlessingJson {
                blessing: &blessing,
                favorited,
            },
        });
    }
    print!(
        "{}",
        format_daily(date, time_of_day.greeting(), &blessing, favorited)
    );
    Ok(())
}

fn cmd_history(session: &CliSession, args: HistoryArgs, json: bool) -> CliResult {
    let query = search_query(args.search.as_deref(), args.category, args.regex)?;
    let history = session.history();
    let mut hits = search::filter_history(&history, &query);
    if let Some(n) = args.limit {
        hits.truncate(n);
    }

    if json {
        return print_json(&HistoryJson {
            total: history.len(),
            items: hits,
        });
    }
    if hits.is_empty() {
        println!("no wishes found");
        return Ok(());
    }
    for item in hits {
        println!(
            "{}",
            format_history_line(item, session.is_favorited(&item.blessing))
        );
    }
    Ok(())
}

fn cmd_favorites(session: &CliSession, args: FavoritesArgs, json: bool) -> CliResult {
    let query = search_query(args.search.as_deref(), args.category, args.regex)?;
    let favorites = session.favorites();
    let hits = search::filter_favorites(&favorites, &query);

    if json {
        let out: Vec<BlessingJson> = hits
            .into_iter()
            .map(|b| BlessingJson {
                blessing: b,
                favorited: true,
            })
            .collect();
        return print_json(&out);
    }
    if hits.is_empty() {
        println!("no favorites found");
        return Ok(());
    }
    let cards: Vec<String> = hits.iter().map(|b| format_blessing(b, true)).collect();
    print!("{}", cards.join("\n"));
    Ok(())
}

fn cmd_fav(session: &CliSession, args: FavArgs, json: bool) -> CliResult {
    let blessing = session
        .find_blessing(&args.id)
        .ok_or_else(|| format!("no blessing with id '{}'", args.id))?;
    let favorited = session.toggle_favorite(&blessing);

    if json {
        return print_json(&FavToggleJson {
            id: &blessing.id,
            favorited,
            favorites: session.stats().favorites,
        });
    }
    if favorited {
        println!("added {} to favorites", blessing.id);
    } else {
        println!("removed {} from favorites", blessing.id);
    }
    Ok(())
}

fn cmd_categories(session: &CliSession, json: bool) -> CliResult {
    if json {
        return print_json(&categories_json(session.catalog()));
    }
    print!("{}", format_categories(session.catalog()));
    println!("{}", format_stats(session.stats()));
    Ok(())
}

fn cmd_reset(session: &CliSession, json: bool) -> CliResult {
    session.reset();
    if json {
        return print_json(&session.stats());
    }
    println!("cleared history, favorites and daily blessings");
    Ok(())
}
