use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;
use uuid::Uuid;

use promisetasks::backend::google::GoogleTasksBackend;
use promisetasks::config::Config;
use promisetasks::constants::{ERROR_NO_CLIENT_CREDENTIALS, ERROR_NO_LINKED_ACCOUNTS};
use promisetasks::credentials::OAuthCredentialProvider;
use promisetasks::logger;
use promisetasks::storage::LocalStorage;
use promisetasks::sync::{SyncService, SyncWorker};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    logger::init(&config.logging)?;

    let oauth = match config.google.oauth_config() {
        Ok(oauth) => oauth,
        Err(e) => {
            eprintln!("{}: {:#}", ERROR_NO_CLIENT_CREDENTIALS, e);
            eprintln!("\n💡 To use this app:");
            eprintln!("1. Create an OAuth client in the Google Cloud console");
            eprintln!(
                "2. Export it: export {}=... {}=...",
                config.google.client_id_env, config.google.client_secret_env
            );
            eprintln!("3. Run the app again");
            return Ok(());
        }
    };

    let storage = LocalStorage::new(&config.database.resolved_url()?).await?;
    let backend = GoogleTasksBackend::new(config.google.api_base_url.clone(), config.google.request_timeout())?;
    let credentials = OAuthCredentialProvider::new(oauth, storage.clone(), config.google.request_timeout())?;
    let service = SyncService::new(storage, Arc::new(backend), Arc::new(credentials));

    // A single account id syncs just that account.
    if let Some(arg) = std::env::args().nth(1) {
        let account_id = Uuid::parse_str(&arg).with_context(|| format!("Invalid account id '{}'", arg))?;
        let report = service.sync_account(&account_id).await;
        println!("{}", report.summary());
        return Ok(());
    }

    match config.sync.auto_sync_interval() {
        None => {
            let reports = service.sync_all().await?;
            if reports.is_empty() {
                println!("{}", ERROR_NO_LINKED_ACCOUNTS);
            }
            for report in reports {
                println!("{}: {}", report.account_id, report.summary());
            }
        }
        Some(interval) => {
            let (handle, worker) = SyncWorker::spawn(service.clone(), Some(interval));
            for account in promisetasks::repositories::AccountRepository::get_linked(&service.storage().conn).await? {
                handle.enqueue(account.id).await?;
            }
            tokio::signal::ctrl_c().await.context("Failed to listen for shutdown signal")?;
            info!("Shutting down");
            drop(handle);
            worker.abort();
        }
    }

    Ok(())
}
