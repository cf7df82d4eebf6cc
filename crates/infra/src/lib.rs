//! Infrastructure layer: document storage, the stock ledger and workflows.

pub mod directory;
pub mod error;
pub mod ledger;
pub mod notify;
pub mod repository;
pub mod retry;
pub mod store;
pub mod workflows;


pub use directory::Directory;
pub use error::{WorkflowError, WorkflowResult};
pub use ledger::{StockChange, StockLedger};
pub use notify::{InMemoryAlertSink, StockAlert, StockAlertSink, TracingAlertSink};
pub use repository::{Batch, Documents};
pub use store::{DocumentStore, InMemoryDocumentStore, PostgresDocumentStore, StoreError};
pub use workflows::{EmployeeRequestWorkflow, LeaveWorkflow, ReorderFulfillment, ReorderWorkflow};
