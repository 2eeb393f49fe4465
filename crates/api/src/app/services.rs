use std::sync::Arc;

use vaultbank_infra::PostgresBankStore;
use vaultbank_ledger::{AdminDesk, BankStore, InMemoryBankStore, Ledger};

/// Ledger wiring shared by all handlers via an `Extension`.
///
/// The store behind the ledger is chosen once at startup and injected;
/// there is no ambient global state.
pub struct AppServices {
    pub ledger: Ledger,
    pub admin: AdminDesk,
}

pub async fn build_services() -> AppServices {
    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    let store: Arc<dyn BankStore> = if use_persistent {
        let database_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set when USE_PERSISTENT_STORES=true");
        let store = PostgresBankStore::connect(&database_url)
            .await
            .expect("failed to connect to Postgres");
        store.migrate().await.expect("failed to create schema");
        Arc::new(store)
    } else {
        // In-memory wiring (dev/test): state lives and dies with the process.
        Arc::new(InMemoryBankStore::new())
    };

    let ledger = Ledger::new(store);

    let admin_username = std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
    let admin = AdminDesk::new(ledger.clone(), admin_username);

    AppServices { ledger, admin }
}
