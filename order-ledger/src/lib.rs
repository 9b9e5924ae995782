//! Pharmacy order ledger
//!
//! # Overview
//!
//! Keeps customer orders for a pharmacy: catalog-priced line items, GST,
//! discount and delivery, the order/payment status machine, proof and
//! invoice attachments, and per-day sequential order numbers.
//!
//! - **Pricing** (`order_money`): exact decimal totals, rounded to 2 places
//! - **Orders** (`orders`): manager, actions and redb storage
//! - **Services** (`services`): catalog, file store and invoice renderer
//! - **Utils** (`utils`): logging, business time, input validation
//!
//! # Module layout
//!
//! ```text
//! order-ledger/src/
//! ├── core/          # configuration
//! ├── order_money/   # pricing calculator
//! ├── orders/        # manager, actions, storage
//! ├── services/      # external collaborators
//! └── utils/         # logger, time, validation
//! ```

pub mod core;
pub mod order_money;
pub mod orders;
pub mod services;
pub mod utils;

use anyhow::Context;

// Re-export public types
pub use core::LedgerConfig;
pub use order_money::DiscountBase;
pub use orders::{GeneratedInvoice, ManagerError, ManagerResult, OrderStorage, OrdersManager};
pub use services::{
    CatalogLookup, FileStore, InMemoryCatalog, InvoiceRenderer, LocalFileStore,
    TextInvoiceRenderer,
};
pub use utils::{AppError, AppResult, ErrorCode, ErrorKind};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// Prepare the process environment
///
/// 1. Load `.env` (if present)
/// 2. Read [`LedgerConfig`] from the environment
/// 3. Create the work, uploads and logs directories
/// 4. Install the tracing subscriber (`LOG_JSON=true` for JSON lines)
pub fn setup_environment() -> anyhow::Result<LedgerConfig> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let config = LedgerConfig::from_env();

    for dir in [
        std::path::PathBuf::from(&config.work_dir),
        config.uploads_dir(),
        config.logs_dir(),
    ] {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
    }

    let json = std::env::var("LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok());
    init_logger_with_file(Some(&config.log_level), json, Some(&config.logs_dir()));

    tracing::info!(
        work_dir = %config.work_dir,
        dotenv = dotenv_loaded,
        "Environment ready"
    );
    Ok(config)
}
