//! Process-scoped services, built once and shared with every handler.

use std::sync::Arc;

use axum::response::Response;
use tracing::info;

use laundry_infra::{
    Directory, DocumentStore, Documents, EmployeeRequestWorkflow, InMemoryAlertSink,
    InMemoryDocumentStore, LeaveWorkflow, PostgresDocumentStore, ReorderWorkflow, StockLedger,
    WorkflowError,
};

use crate::app::errors;
use crate::config::ApiConfig;

#[derive(Debug, Clone)]
pub struct AppServices {
    pub ledger: StockLedger,
    pub requests: EmployeeRequestWorkflow,
    pub reorders: ReorderWorkflow,
    pub leave: LeaveWorkflow,
    pub directory: Directory,
    pub alerts: Arc<InMemoryAlertSink>,
    expose_internal_errors: bool,
}

impl AppServices {
    /// Wire services over an already-open store.
    pub fn new(store: Arc<dyn DocumentStore>, config: &ApiConfig) -> Self {
        let attempts = config.commit_attempts;
        let docs = Documents::new(store);
        let alerts = Arc::new(InMemoryAlertSink::default());
        let ledger = StockLedger::new(docs.clone(), alerts.clone(), attempts);

        Self {
            requests: EmployeeRequestWorkflow::new(docs.clone(), ledger.clone(), attempts),
            reorders: ReorderWorkflow::new(docs.clone(), ledger.clone(), attempts),
            leave: LeaveWorkflow::new(docs.clone(), attempts),
            directory: Directory::new(docs, attempts),
            ledger,
            alerts,
            expose_internal_errors: config.expose_internal_errors(),
        }
    }

    pub fn fail(&self, err: WorkflowError) -> Response {
        errors::workflow_error_to_response(err, self.expose_internal_errors)
    }
}

/// Open the configured store: Postgres when `DATABASE_URL` is set, memory otherwise.
pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let store: Arc<dyn DocumentStore> = match &config.database_url {
        Some(url) => {
            let store = PostgresDocumentStore::connect(url).await?;
            info!("using postgres document store");
            Arc::new(store)
        }
        None => {
            info!("DATABASE_URL not set; using in-memory document store");
            Arc::new(InMemoryDocumentStore::new())
        }
    };

    Ok(AppServices::new(store, config))
}
