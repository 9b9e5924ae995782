use crate::order_money::DiscountBase;
use chrono_tz::Tz;
use std::path::PathBuf;

/// Ledger configuration
///
/// # Environment variables
///
/// Every field can be overridden from the environment (a `.env` file in
/// the working directory is loaded first by [`crate::setup_environment`]):
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./data | root for the database, uploads and logs |
/// | LEDGER_DB_FILE | orders.redb | database file name under WORK_DIR |
/// | BUSINESS_TIMEZONE | Asia/Kolkata | timezone of order-number dates |
/// | ORDER_NUMBER_PREFIX | ORD | order number prefix |
/// | ORDER_TYPE_CODE | O1 | order type code |
/// | DISCOUNT_BASE | subtotal_with_gst | base the discount percentage applies to |
/// | DEFAULT_GST_PERCENTAGE | 18 | GST rate applied by reorder |
/// | UPLOAD_TIMEOUT_MS | 15000 | upload timeout (milliseconds) |
/// | STRICT_STATUS_TRANSITIONS | false | enforce the status transition table |
/// | LOG_LEVEL | info | tracing level |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/srv/pharmacy BUSINESS_TIMEZONE=Asia/Kolkata cargo run
/// ```
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub work_dir: String,
    pub db_file: String,
    /// Business timezone; decides which calendar day an order belongs to
    pub timezone: Tz,
    pub order_number_prefix: String,
    pub order_type_code: String,
    pub discount_base: DiscountBase,
    pub default_gst_percentage: f64,
    pub upload_timeout_ms: u64,
    /// Reject transitions out of terminal states
    pub strict_status_transitions: bool,
    pub log_level: String,
}

impl LedgerConfig {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable variables fall back to their defaults.
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            db_file: std::env::var("LEDGER_DB_FILE").unwrap_or_else(|_| "orders.redb".into()),
            timezone: std::env::var("BUSINESS_TIMEZONE")
                .ok()
                .and_then(|tz| {
                    tz.parse::<Tz>()
                        .map_err(|e| {
                            tracing::warn!(timezone = %tz, error = %e, "Invalid BUSINESS_TIMEZONE, using default");
                        })
                        .ok()
                })
                .unwrap_or(chrono_tz::Asia::Kolkata),
            order_number_prefix: std::env::var("ORDER_NUMBER_PREFIX")
                .unwrap_or_else(|_| "ORD".into()),
            order_type_code: std::env::var("ORDER_TYPE_CODE").unwrap_or_else(|_| "O1".into()),
            discount_base: std::env::var("DISCOUNT_BASE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            default_gst_percentage: std::env::var("DEFAULT_GST_PERCENTAGE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &f64| v.is_finite() && (0.0..=100.0).contains(v))
                .unwrap_or(18.0),
            upload_timeout_ms: std::env::var("UPLOAD_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15_000),
            strict_status_transitions: std::env::var("STRICT_STATUS_TRANSITIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
        }
    }

    /// Override the work directory, keeping everything else from the environment
    ///
    /// Mostly used by tests.
    pub fn with_work_dir(work_dir: impl Into<String>) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config
    }

    /// Full path of the redb database file
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join(&self.db_file)
    }

    /// Directory for locally stored uploads
    pub fn uploads_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("uploads")
    }

    /// Directory for rolling log files
    pub fn logs_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    pub fn upload_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.upload_timeout_ms)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            work_dir: "./data".into(),
            db_file: "orders.redb".into(),
            timezone: chrono_tz::Asia::Kolkata,
            order_number_prefix: "ORD".into(),
            order_type_code: "O1".into(),
            discount_base: DiscountBase::default(),
            default_gst_percentage: 18.0,
            upload_timeout_ms: 15_000,
            strict_status_transitions: false,
            log_level: "info".into(),
        }
    }
}
