use clap::{App, Arg, SubCommand};
use gallows::catalog::WordCatalog;

fn main() {
    let matches = App::new("catalog-manager")
        .version("1.0")
        .about("Manage the phrase catalog for the guessing game")
        .subcommand(SubCommand::with_name("list").about("List all pools and their phrases"))
        .subcommand(
            SubCommand::with_name("add")
                .about("Add a phrase to a pool")
                .arg(Arg::with_name("pool").help("Pool name").required(true).index(1))
                .arg(
                    Arg::with_name("phrase")
                        .help("Word or phrase (stored uppercase)")
                        .required(true)
                        .index(2),
                ),
        )
        .subcommand(SubCommand::with_name("stats").about("Show catalog statistics"))
        .subcommand(SubCommand::with_name("validate").about("Check catalog integrity"))
        .subcommand(
            SubCommand::with_name("export").about("Export the catalog to a file").arg(
                Arg::with_name("file")
                    .help("Output file path")
                    .required(true)
                    .index(1),
            ),
        )
        .get_matches();

    if let Err(e) = gallows::config::Config::init() {
        eprintln!("configuration init failed: {}", e);
        return;
    }

    let mut catalog = WordCatalog::new();

    match matches.subcommand() {
        Some(("list", _)) => {
            println!("catalog pools:");
            for pool in catalog.pools() {
                let count = catalog.pool_phrase_count(pool);
                println!("  {}: {} phrases", pool, count);

                if let Some(phrases) = catalog.pool_phrases(pool) {
                    for phrase in phrases {
                        println!("    {}", phrase);
                    }
                }
            }
        }
        Some(("add", args)) => {
            let pool = args.value_of("pool").unwrap();
            let phrase = args.value_of("phrase").unwrap();

            catalog.add_phrase(pool, phrase);

            let file_path = &gallows::config::Config::get().catalog.file_path;
            if let Err(e) = catalog.save_to_file(file_path) {
                eprintln!("saving catalog failed: {}", e);
            } else {
                println!("added to {}: {}", pool, phrase.to_uppercase());
            }
        }
        Some(("stats", _)) => {
            let stats = catalog.stats();
            println!("catalog statistics:");
            println!("  total phrases: {}", stats.total_phrases);
            println!("  total pools: {}", stats.total_pools);
            println!("  per pool:");
            for (pool, count) in &stats.pool_stats {
                println!("    {}: {}", pool, count);
            }
        }
        Some(("validate", _)) => {
            let errors = catalog.validate();
            if errors.is_empty() {
                println!("catalog is clean");
            } else {
                println!("catalog has {} problems:", errors.len());
                for error in errors {
                    println!("  - {}", error);
                }
            }
        }
        Some(("export", args)) => {
            let file_path = args.value_of("file").unwrap();
            if let Err(e) = catalog.save_to_file(file_path) {
                eprintln!("export failed: {}", e);
            } else {
                println!("catalog exported to {}", file_path);
            }
        }
        _ => {
            println!("use --help to see available commands");
        }
    }
}
