use std::{
    env,
    fs::OpenOptions,
    net::SocketAddr,
    path::{Path, PathBuf},
    process::exit,
    sync::Arc,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::{Handle, tls_rustls::RustlsConfig};
use clap::{Parser, ValueEnum};
use tower_http::trace::TraceLayer;

#[cfg(debug_assertions)]
use tower_livereload::LiveReloadLayer;

use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use pocket_ledger::{
    AppState, Error, RateEntry, RateTable, build_router, get_local_offset, graceful_shutdown,
    logging_middleware,
    stores::{JsonStore, LedgerStore, SQLiteStore, UserStore},
};

/// Where users and transactions are kept.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Backend {
    /// `users.json` and `ledger.json` in the data directory.
    Json,
    /// `pocket_ledger.db` in the data directory.
    Sqlite,
}

/// The web server for Pocket Ledger.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory for the application's data files.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// How the data is stored.
    #[arg(long, value_enum, default_value_t = Backend::Json)]
    backend: Backend,

    /// The port to serve the app from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// The canonical timezone used to decide what "today" is, e.g. "Asia/Kolkata".
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,

    /// Override an exchange rate as units per US dollar, e.g. "INR=83.5".
    #[arg(long = "rate", value_name = "CODE=RATE")]
    rates: Vec<RateEntry>,

    /// File path for the debug log.
    #[arg(long, default_value = "debug.log")]
    log_path: PathBuf,

    /// Directory holding a TLS certificate `cert.pem` and key `key.pem`.
    ///
    /// Without it the server speaks plain HTTP and cookies are not marked secure.
    #[arg(long)]
    cert_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    setup_logging(&args.log_path);

    let secret = env::var("SECRET").expect("The environment variable 'SECRET' must be set");

    if get_local_offset(&args.timezone).is_none() {
        tracing::error!("Invalid timezone {}", args.timezone);
        eprintln!(
            "\"{}\" is not a valid, canonical timezone name, e.g. \"Asia/Kolkata\".",
            args.timezone
        );
        exit(1);
    }

    let rates = RateTable::new(args.rates).unwrap_or_else(|error| {
        eprintln!("Could not set exchange rates: {error}");
        exit(1);
    });

    let (user_store, ledger_store) =
        open_stores(args.backend, &args.data_dir).unwrap_or_else(|error| {
            eprintln!(
                "Could not open the {:?} store in {}: {error}",
                args.backend,
                args.data_dir.display()
            );
            exit(1);
        });

    let tls_config = match &args.cert_path {
        Some(cert_path) => Some(
            RustlsConfig::from_pem_file(cert_path.join("cert.pem"), cert_path.join("key.pem"))
                .await
                .unwrap_or_else(|error| {
                    eprintln!(
                        "Could not open TLS certificates in {}: {error}",
                        cert_path.display()
                    );
                    exit(1);
                }),
        ),
        None => None,
    };

    let mut app_state = AppState::new(&secret, &args.timezone, rates, user_store, ledger_store);
    app_state.secure_cookies = tls_config.is_some();
    tracing::debug!("Starting with {app_state:?}");

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = build_router(app_state).layer(middleware::from_fn(logging_middleware));
    let router = add_tracing_layer(router);

    #[cfg(debug_assertions)]
    let router = router.layer(LiveReloadLayer::new());

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    match tls_config {
        Some(tls_config) => {
            tracing::info!("HTTPS server listening on {}", addr);
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(router.into_make_service())
                .await
                .unwrap();
        }
        None => {
            tracing::warn!("No TLS certificates given, serving plain HTTP on {}", addr);
            axum_server::bind(addr)
                .handle(handle)
                .serve(router.into_make_service())
                .await
                .unwrap();
        }
    }
}

type Stores = (Arc<dyn UserStore>, Arc<dyn LedgerStore>);

fn open_stores(backend: Backend, data_dir: &Path) -> Result<Stores, Error> {
    match backend {
        Backend::Json => {
            let store = Arc::new(JsonStore::open(data_dir)?);
            let user_store: Arc<dyn UserStore> = store.clone();
            let ledger_store: Arc<dyn LedgerStore> = store;

            Ok((user_store, ledger_store))
        }
        Backend::Sqlite => {
            std::fs::create_dir_all(data_dir)
                .map_err(|error| Error::StoreIoError(error.to_string()))?;
            let store = Arc::new(SQLiteStore::open(&data_dir.join("pocket_ledger.db"))?);
            let user_store: Arc<dyn UserStore> = store.clone();
            let ledger_store: Arc<dyn LedgerStore> = store;

            Ok((user_store, ledger_store))
        }
    }
}

fn setup_logging(log_path: &Path) {
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_ansi(false)
        .with_writer(Arc::new(log_file))
        .with_filter(filter::LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(debug_log)
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
