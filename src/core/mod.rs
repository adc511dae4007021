/// Login, sessions and password hashing
pub mod auth;

/// Change tracking, diffing and the autosave countdown
pub mod autosave;

/// Client operations
pub mod client;

/// Free-text search over listed records
pub mod filter;

/// Timestamp-based record identifiers
pub mod ids;

/// Invoice operations
pub mod invoice;

/// Status badges and currency formatting
pub mod labels;

/// Permission checks and section visibility
pub mod permissions;

/// Dashboard and reports
pub mod report;

/// Revenue calculator, expenses, analytics, projections and comparison
pub mod revenue;

/// Subscription operations
pub mod subscription;

/// User management
pub mod users;

/// Per-owner workbenches and the autosave task
pub mod workbench;
