// Single source of truth for all default values.

// --- Store ---
pub const DEFAULT_DB_FILENAME: &str = "lore.db";
pub const DEFAULT_WAL_MODE: bool = true;
pub const DEFAULT_MMAP_SIZE: u64 = 268_435_456; // 256 MB
pub const DEFAULT_CACHE_SIZE: i64 = -64_000; // 64 MB (negative = KB)
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;
pub const DEFAULT_READ_POOL_SIZE: usize = 4;
pub const DEFAULT_STABLE_AFTER_SESSIONS: u64 = 8;
pub const DEFAULT_IMMUTABLE_AFTER_SESSIONS: u64 = 32;

// --- Retrieval ---
pub const DEFAULT_TOKEN_BUDGET: usize = 2_000;
pub const DEFAULT_TIME_BUDGET_MS: u64 = 500;
pub const DEFAULT_SIGNAL_TOP_K: usize = 50;
pub const DEFAULT_SIGNAL_TIMEOUT_MS: u64 = 150;
pub const DEFAULT_MAX_PACKS: usize = 12;
pub const DEFAULT_BUDGET_SLACK: f64 = 0.1;
pub const DEFAULT_PROXIMITY_DECAY: f64 = 0.5;
pub const DEFAULT_PROXIMITY_MAX_HOPS: usize = 3;

// --- Synthesis ---
pub const DEFAULT_SYNTHESIS_MAX_TOKENS: usize = 1_024;
pub const DEFAULT_SYNTHESIS_WALL_CLOCK_MS: u64 = 30_000;
pub const DEFAULT_SYNTHESIS_CACHE_SIZE: u64 = 10_000;
pub const DEFAULT_PROMPT_VERSION: &str = "v1";
pub const DEFAULT_RETRY_QUARANTINED: bool = true;

// --- Ledger ---
pub const DEFAULT_MAX_EVENT_BATCH: usize = 5_000;
pub const DEFAULT_CALIBRATION_MIN_SAMPLES: usize = 30;
pub const DEFAULT_CALIBRATION_BINS: usize = 10;
pub const DEFAULT_OUTCOME_HALF_LIFE_DAYS: f64 = 30.0;
pub const DEFAULT_STALENESS_THRESHOLD_DAYS: f64 = 45.0;
pub const DEFAULT_STALENESS_HALF_LIFE_DAYS: f64 = 90.0;
pub const DEFAULT_STALE_EVIDENCE_CAP: f64 = 0.5;
pub const DEFAULT_FAILED_OUTCOME_CAP: f64 = 0.4;

// --- Scheduler ---
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_MAINTENANCE_BATCH: usize = 256;
pub const DEFAULT_QUEUE_THRESHOLD: usize = 1_000;
pub const DEFAULT_PACK_CACHE_SIZE: u64 = 1_000;
pub const DEFAULT_PACK_CACHE_TTL_SECS: u64 = 300;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_JSON_LOGS: bool = false;
