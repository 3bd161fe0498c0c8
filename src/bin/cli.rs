//! rmstore CLI
//!
//! Command-line interface for inspecting and editing record stores on disk.

use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use rmstore::{Config, RecordId, RecordStore, RecordView, RmsError, StoreTable};
use tracing_subscriber::{fmt, EnvFilter};

/// rmstore CLI
#[derive(Parser, Debug)]
#[command(name = "rmstore-cli")]
#[command(about = "CLI for rmstore record stores")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./rms_data")]
    data_dir: String,

    /// Per-store capacity in KB
    #[arg(short, long, default_value = "1024")]
    capacity_kb: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List all record stores
    List,

    /// Create an empty record store
    Create {
        /// Store name
        store: String,
    },

    /// Append a record
    Add {
        /// Store name
        store: String,

        /// Record contents
        value: String,
    },

    /// Print a record
    Get {
        /// Store name
        store: String,

        /// Record id
        id: RecordId,
    },

    /// Replace a record
    Set {
        /// Store name
        store: String,

        /// Record id
        id: RecordId,

        /// New record contents
        value: String,
    },

    /// Delete a record
    Remove {
        /// Store name
        store: String,

        /// Record id
        id: RecordId,
    },

    /// Delete a record store
    Drop {
        /// Store name
        store: String,
    },

    /// Print records through a filtered, sorted view
    Dump {
        /// Store name
        store: String,

        /// Only records starting with this prefix
        #[arg(long)]
        prefix: Option<String>,

        /// Sort key
        #[arg(long, value_enum, default_value = "id")]
        sort: SortKey,

        /// Walk the view backwards
        #[arg(long)]
        reverse: bool,
    },

    /// Print store accounting
    Stat {
        /// Store name
        store: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SortKey {
    /// Record id (store order)
    Id,
    /// Record length
    Len,
    /// Record bytes, lexicographically
    Bytes,
}

fn main() {
    // Initialize tracing/logging (stderr, so stdout stays parseable)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,rmstore=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::debug!("rmstore CLI v{}", rmstore::VERSION);

    let result = capacity_bytes(args.capacity_kb).and_then(|capacity| {
        let config = Config::builder()
            .data_dir(&args.data_dir)
            .store_capacity(capacity)
            .build();
        run(config, args.command)
    });

    if let Err(e) = result {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

/// Convert `--capacity-kb` to bytes
fn capacity_bytes(kb: usize) -> rmstore::Result<usize> {
    kb.checked_mul(1024)
        .ok_or_else(|| RmsError::Config(format!("Capacity of {} KB is too large", kb)))
}

fn run(config: Config, command: Commands) -> rmstore::Result<()> {
    let table = StoreTable::open_dir(config)?;

    match command {
        Commands::List => {
            for name in table.list_stores()? {
                println!("{}", name);
            }
        }
        Commands::Create { store } => {
            table.open_store(&store, true)?.close_store()?;
            println!("OK");
        }
        Commands::Add { store, value } => {
            let id = with_store(&table, &store, |s| s.add_record(value.as_bytes()))?;
            println!("{}", id);
        }
        Commands::Get { store, id } => {
            let data = with_store(&table, &store, |s| s.get_record(id))?;
            println!("{}", String::from_utf8_lossy(&data));
        }
        Commands::Set { store, id, value } => {
            with_store(&table, &store, |s| s.set_record(id, value.as_bytes()))?;
            println!("OK");
        }
        Commands::Remove { store, id } => {
            with_store(&table, &store, |s| s.delete_record(id))?;
            println!("OK");
        }
        Commands::Drop { store } => {
            table.delete_store(&store)?;
            println!("OK");
        }
        Commands::Dump {
            store,
            prefix,
            sort,
            reverse,
        } => {
            with_store(&table, &store, |s| dump(s, prefix, sort, reverse))?;
        }
        Commands::Stat { store } => {
            with_store(&table, &store, |s| {
                println!("name:           {}", s.name());
                println!("records:        {}", s.num_records()?);
                println!("size:           {}", s.size()?);
                println!("available:      {}", s.size_available()?);
                println!("next id:        {}", s.next_record_id()?);
                println!("version:        {}", s.version()?);
                println!("last modified:  {}", s.last_modified()?);
                Ok(())
            })?;
        }
    }

    Ok(())
}

/// Open an existing store, run `f`, and close the handle either way
fn with_store<T>(
    table: &StoreTable,
    name: &str,
    f: impl FnOnce(&RecordStore) -> rmstore::Result<T>,
) -> rmstore::Result<T> {
    let store = table.open_store(name, false)?;
    let result = f(&store);
    store.close_store()?;
    result
}

fn dump(
    store: &RecordStore,
    prefix: Option<String>,
    sort: SortKey,
    reverse: bool,
) -> rmstore::Result<()> {
    let mut builder = RecordView::builder(store);

    if let Some(prefix) = prefix {
        let prefix = prefix.into_bytes();
        builder = builder.filter(move |data: &[u8]| data.starts_with(&prefix));
    }

    builder = match sort {
        SortKey::Id => builder,
        SortKey::Len => builder.comparator(|a: &[u8], b: &[u8]| a.len().cmp(&b.len())),
        SortKey::Bytes => builder.comparator(|a: &[u8], b: &[u8]| a.cmp(b)),
    };

    let mut view = builder.build()?;

    if reverse {
        while view.has_next()? {
            view.next_id()?;
        }
        while view.has_previous()? {
            let id = view.previous_id()?;
            print_record(id, &store.get_record(id)?);
        }
    } else {
        while view.has_next()? {
            let id = view.next_id()?;
            print_record(id, &store.get_record(id)?);
        }
    }

    println!("({} records)", view.count()?);
    view.destroy()
}

fn print_record(id: RecordId, data: &[u8]) {
    println!("{:>6}  {}", id, String::from_utf8_lossy(data));
}
