use clap::Parser;
use clap::ValueEnum;
use fish_table::BuildIdHasher;
use fish_table::FishTable;
use fish_table::IdPair;
use tracing::Level;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Keys {
    /// Sequential u64 keys through the default hasher
    Sequential,
    /// IdPair keys through the pass-through id hasher
    IdPairs,
}

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "target_capacity", default_value_t = 1000)]
    target_capacity: usize,

    /// Entries to insert, defaults to the table's capacity
    #[arg(short = 'n', long = "entries")]
    entries: Option<usize>,

    #[arg(short = 'k', long = "keys", value_enum, default_value_t = Keys::Sequential)]
    keys: Keys,

    /// Log table growth
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    FmtSubscriber::builder().with_max_level(level).init();

    info!(target_capacity = args.target_capacity, keys = ?args.keys, "creating table");

    match args.keys {
        Keys::Sequential => {
            let mut table: FishTable<u64, u64> = FishTable::with_capacity(args.target_capacity);
            let entries = args.entries.unwrap_or(table.capacity());
            for i in 0..entries as u64 {
                *table.get_or_insert_with(i, || 0) += i;
            }
            report(&table);
        }
        Keys::IdPairs => {
            let mut table: FishTable<IdPair, u64, BuildIdHasher> =
                FishTable::with_capacity_and_hasher(args.target_capacity, BuildIdHasher::default());
            let entries = args.entries.unwrap_or(table.capacity());
            for i in 0..entries {
                let pair = IdPair::new((i >> 16) as u16, i as u16);
                *table.get_or_insert_with(pair, || 0) += 1;
            }
            report(&table);
        }
    }
}

fn report<K, V, S>(table: &FishTable<K, V, S>) {
    info!(
        len = table.len(),
        capacity = table.capacity(),
        "filled table"
    );
    println!(
        "Final load factor: {:.2}%",
        (table.len() as f64 / table.capacity() as f64) * 100.0
    );

    table.print_chain_histogram();
    table.debug_stats().print();
}
