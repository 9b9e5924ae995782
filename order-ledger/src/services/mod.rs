//! External collaborators of the ledger

pub mod catalog;
pub mod file_store;
pub mod invoice;

pub use catalog::{CatalogError, CatalogLookup, InMemoryCatalog};
pub use file_store::{FileStore, LocalFileStore, StoredFileRef, UploadError};
pub use invoice::{InvoiceRenderer, RenderError, TextInvoiceRenderer};
