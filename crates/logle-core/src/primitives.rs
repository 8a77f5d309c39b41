//! # Fixed Primitives
//!
//! Hardcoded constants shared by the dispatcher, the analyzers and the
//! exporters.
//!
//! Logle starts with zero data but fixed logic.
//! These values are compiled into the binary and are immutable at runtime.

// =============================================================================
// ANALYZER SELECTORS
// =============================================================================

/// Selector for the stream dependency analyzer.
pub const CURIO_ANALYZER: &str = "curio";

/// Selector for the account access analyzer.
pub const MAIL_ANALYZER: &str = "mail";

/// Selector for the event timeline analyzer.
pub const PLASO_ANALYZER: &str = "plaso";

/// Error message for an absent or unknown analyzer selector.
pub const INVALID_ANALYZER_MESSAGE: &str =
    "Invalid analysis. The analysis must be one of 'curio', 'mail', or 'plaso'.";

// =============================================================================
// INPUT LIMITS
// =============================================================================

/// Maximum number of malformed records an analyzer tolerates.
///
/// Reaching this count aborts the build with `INVALID_ARGUMENT`.
pub const MAX_MALFORMED_RECORDS: usize = 1_000_000;

// =============================================================================
// SHARED GRAPH TAGS
// =============================================================================

/// Tag of file nodes: `tuple(list(directory), filename)`.
pub const FILE_TAG: &str = "File";

/// Tag of IP address nodes.
pub const IP_ADDRESS_TAG: &str = "IPAddress";

/// Tag of URL nodes.
pub const URL_TAG: &str = "URL";

/// Tag of temporal ordering edges.
pub const PRECEDES_TAG: &str = "Precedes";

/// Tag of edges between an event and a resource it used.
pub const USES_TAG: &str = "Uses";

// =============================================================================
// CURIO (STREAM DEPENDENCIES)
// =============================================================================

/// The clock stream. Every stream depends on it, so it is never graphed.
pub const CLOCK_STREAM_ID: &str = "[:clock]";

// =============================================================================
// ACCESS (ACCOUNT ACCESS CSV)
// =============================================================================

/// Column holding the account that performed the access.
pub const ACCESS_ACTOR_FIELD: &str = "fromx";

/// Column holding the accessed account.
pub const ACCESS_USER_FIELD: &str = "tox";

/// Column holding the number of accesses.
pub const ACCESS_COUNT_FIELD: &str = "attr_count";

/// Column holding the actor's title.
pub const ACCESS_ACTOR_TITLE_FIELD: &str = "attr_actor_title";

/// Optional column holding the actor's manager.
pub const ACCESS_ACTOR_MANAGER_FIELD: &str = "attr_actor_manager";

/// Columns that must appear in the CSV header.
pub const ACCESS_REQUIRED_FIELDS: [&str; 4] = [
    ACCESS_ACTOR_FIELD,
    ACCESS_USER_FIELD,
    ACCESS_COUNT_FIELD,
    ACCESS_ACTOR_TITLE_FIELD,
];

// =============================================================================
// PLASO (EVENT TIMELINE)
// =============================================================================

/// Canonical descriptor of the event data format.
pub const PLASO_DATA_TYPE_FIELD: &str = "data_type";

/// File from which the event was reconstructed.
pub const PLASO_SOURCE_FILE_FIELD: &str = "display_name";

/// Event time, microseconds since the Unix epoch or RFC 3339.
pub const PLASO_TIMESTAMP_FIELD: &str = "timestamp";

/// Human-readable description of the event.
pub const PLASO_DESCRIPTION_FIELD: &str = "timestamp_desc";

/// Fields every event object must carry.
pub const PLASO_REQUIRED_FIELDS: [&str; 4] = [
    PLASO_DATA_TYPE_FIELD,
    PLASO_SOURCE_FILE_FIELD,
    PLASO_TIMESTAMP_FIELD,
    PLASO_DESCRIPTION_FIELD,
];
