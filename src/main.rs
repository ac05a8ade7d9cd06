use echo::config::Config;
use echo::db::Database;
use echo::import::{ImportNotification, ImportService, NotificationFilter, SymphoniaExtractor};
use echo::library::{LibraryManager, SharedLibraryManager};
use echo::settings::SettingsStore;
use echo::watch::{FolderWatcher, RegistryError, WatchedFolders};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Use RUST_LOG env var if set, otherwise default to info level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    std::fs::create_dir_all(&config.library_path)?;

    let database = Database::new(&config.database_path().to_string_lossy()).await?;
    let library_manager = SharedLibraryManager::new(LibraryManager::new(
        database,
        Arc::new(SymphoniaExtractor::new()),
    ));
    info!(
        "Library has {} song(s)",
        library_manager.get().song_count().await?
    );

    let import_handle = ImportService::start(
        tokio::runtime::Handle::current(),
        Arc::new(library_manager.clone()),
        config.import.clone(),
    );

    let mut notifications = import_handle.subscribe(NotificationFilter::All);
    tokio::spawn(async move {
        while let Some(notification) = notifications.recv().await {
            log_notification(&notification);
        }
    });

    let mut folders = WatchedFolders::new(
        FolderWatcher::new(import_handle.clone()),
        SettingsStore::new(config.settings_path()),
        import_handle.clone(),
    );

    folders.restore().await?;

    for arg in std::env::args().skip(1) {
        let path = PathBuf::from(arg);
        match folders.add(&path).await {
            Ok(stats) => info!(
                "Watching {}: {} added, {} duplicate(s), {} error(s)",
                path.display(),
                stats.added,
                stats.duplicates,
                stats.errors
            ),
            Err(RegistryError::AlreadyWatched(path)) => {
                info!("Already watching {}", path.display())
            }
            Err(e) => warn!("Cannot watch {}: {}", path.display(), e),
        }
    }

    info!("Watching {} folder(s), Ctrl-C to quit", folders.list().len());
    tokio::signal::ctrl_c().await?;

    info!("Shutting down");
    import_handle.shutdown();
    Ok(())
}

fn log_notification(notification: &ImportNotification) {
    match notification {
        ImportNotification::BatchStarted {
            total,
            is_initial_scan,
        } => info!(
            "Importing {} file(s){}",
            total,
            if *is_initial_scan { " (initial scan)" } else { "" }
        ),
        ImportNotification::BatchProgress {
            processed, total, ..
        } => info!("Imported {}/{}", processed, total),
        ImportNotification::BatchComplete {
            added,
            duplicates,
            errors,
            total,
        } => info!(
            "Import finished: {} added, {} duplicate(s), {} error(s) of {}",
            added, duplicates, errors, total
        ),
        ImportNotification::SingleFileAdded { display_name, .. } => {
            info!("Song added: {}", display_name)
        }
        ImportNotification::SongsBatchAdded { paths } => {
            info!("{} new song(s) from watched folders", paths.len())
        }
    }
}
