use books_catalog_etl::infra::config::{self, StoreBackend};
use books_catalog_etl::infra::logging;
use books_catalog_etl::{parse_catalog, storage, CatalogSource, HttpCatalogFetcher};

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight\n\
         \n\
         Reads env vars (or .env):\n\
           STORE_BACKEND (postgres|memory), DATABASE_URL, CATALOG_URL, FETCH_TIMEOUT_SECS\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }

    // Force-read config (nice error messages if malformed)
    let backend = config::store_backend()?;
    let catalog_url = config::catalog_url();
    let timeout = config::fetch_timeout()?;
    let interval = config::etl_interval()?;
    let retries = config::write_retries()?;

    println!("> Preflight:");
    println!("  STORE_BACKEND={:?}", backend);
    println!("  CATALOG_URL={}", catalog_url);
    println!("  FETCH_TIMEOUT_SECS={}", timeout.as_secs());
    println!(
        "  ETL_INTERVAL_SECS={}",
        interval.map(|d| d.as_secs().to_string()).unwrap_or_else(|| "off".into())
    );
    println!("  ETL_WRITE_RETRIES={}", retries);

    let mut ok = true;

    // Store connectivity
    if backend == StoreBackend::Postgres && config::database_url().is_err() {
        eprintln!("  DATABASE_URL is not set.");
        ok = false;
    } else {
        match storage::from_env().await {
            Ok(store) => match store.ping().await {
                Ok(()) => match store.list().await {
                    Ok(books) => println!("  Store reachable: {} books stored.", books.len()),
                    Err(e) => {
                        eprintln!("  Store reachable but listing failed: {}", e);
                        ok = false;
                    }
                },
                Err(e) => {
                    eprintln!("  Store ping failed: {}", e);
                    ok = false;
                }
            },
            Err(e) => {
                eprintln!("  Could not open store: {:#}", e);
                ok = false;
            }
        }
    }

    // Catalog reachability + selector drift
    let fetcher = HttpCatalogFetcher::new(catalog_url, timeout)?;
    match fetcher.fetch().await {
        Ok(markup) => {
            let books = parse_catalog(&markup);
            if books.is_empty() {
                eprintln!("  Catalog fetched but no entries matched the selectors (layout changed?).");
                ok = false;
            } else {
                let untitled = books.iter().filter(|b| b.title.is_empty()).count();
                println!("  Catalog reachable: {} entries ({} without title).", books.len(), untitled);
            }
        }
        Err(e) => {
            eprintln!("  Catalog fetch failed: {}", e);
            ok = false;
        }
    }

    if !ok {
        eprintln!("> Preflight failed.");
        std::process::exit(1);
    }
    println!("> Preflight OK.");
    Ok(())
}
