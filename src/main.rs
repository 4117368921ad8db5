use std::env;
use std::path::PathBuf;
use std::process;

use spellpack::{LocaleTag, ResourceRef, SpellingManager, StorageRoots, WordListCompiler};

const DEFAULT_DATA_DIR: &str = "./spellpack-data";

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} [--data-dir <dir>] <command> [args]", program);
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  sources                          List selectable import sources");
    eprintln!("  import <source-id> <archive>     Import a dictionary archive");
    eprintln!("  import-raw <aff> <dic> <locale>  Import a raw affix/word-list pair");
    eprintln!("  list                             List installed dictionaries");
    eprintln!("  suggest <locale> <word>          Query suggestions for a word");
    process::exit(1);
}

fn main() {
    let mut args: Vec<String> = env::args().collect();
    let program = args.remove(0);

    // Parse --data-dir flag
    let mut data_dir = PathBuf::from(DEFAULT_DATA_DIR);
    if let Some(flag_idx) = args.iter().position(|arg| arg == "--data-dir") {
        if flag_idx + 1 >= args.len() {
            eprintln!("ERROR: --data-dir flag requires an argument.");
            process::exit(1);
        }
        data_dir = PathBuf::from(args.remove(flag_idx + 1));
        args.remove(flag_idx);
    }

    if args.is_empty() {
        usage(&program);
    }

    let roots = StorageRoots::under(&data_dir);
    let manager = SpellingManager::new(roots, Box::new(WordListCompiler::default()));
    manager.reindex();

    match args[0].as_str() {
        "sources" => {
            let (labels, urls) = SpellingManager::listed_import_sources();
            println!("Import sources:");
            for (i, (label, url)) in labels.iter().zip(urls.iter()).enumerate() {
                match url {
                    Some(url) => println!("  {}. {} ({})", i, label, url),
                    None => println!("  {}. {}", i, label),
                }
            }
        }
        "import" if args.len() >= 3 => {
            let source = ResourceRef::external(&args[2]);
            match manager
                .prepare_import(&args[1], &source)
                .and_then(|package| manager.finalize_import(package))
            {
                Ok(target) => println!("Installed dictionary package at {}", target),
                Err(err) => {
                    eprintln!("ERROR: import failed: {}", err);
                    process::exit(1);
                }
            }
        }
        "import-raw" if args.len() >= 4 => {
            let aff = ResourceRef::external(&args[1]);
            let dic = ResourceRef::external(&args[2]);
            match manager
                .prepare_import_raw(&aff, &dic, &args[3])
                .and_then(|package| manager.finalize_import(package))
            {
                Ok(target) => println!("Installed dictionary package at {}", target),
                Err(err) => {
                    eprintln!("ERROR: import failed: {}", err);
                    process::exit(1);
                }
            }
        }
        "list" => {
            let installed = manager.installed_dictionaries();
            if installed.is_empty() {
                println!("No dictionaries installed under {}", data_dir.display());
                return;
            }
            println!("Installed dictionaries:");
            for (locator, meta) in installed {
                println!(
                    "  {:<10} {:<28} {}",
                    meta.locale.to_string(),
                    meta.title.as_deref().unwrap_or("(untitled)"),
                    locator
                );
            }
        }
        "suggest" if args.len() >= 3 => {
            let locale = LocaleTag::parse(&args[1]);
            match manager.resolve(&locale) {
                Some(handle) => {
                    let suggestions = handle.suggest(&args[2]);
                    if suggestions.is_empty() {
                        println!("No suggestions for {:?}", args[2]);
                    } else {
                        println!("Suggestions for {:?}:", args[2]);
                        for (i, suggestion) in suggestions.iter().enumerate() {
                            println!("  {}. {}", i + 1, suggestion);
                        }
                    }
                }
                None => println!("No dictionary available for locale {}", locale),
            }
        }
        _ => usage(&program),
    }
}
