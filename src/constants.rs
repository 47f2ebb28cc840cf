//! Constants used throughout the application
//!
//! This module centralizes endpoints, file names and user-facing messages.

/// Application name, used for config and data directories
pub const APP_NAME: &str = "promisetasks";

// Remote endpoints
pub const DEFAULT_API_BASE_URL: &str = "https://tasks.googleapis.com/tasks/v1";
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// Timeout applied to every remote call, in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// Environment variables holding the OAuth client credentials
pub const DEFAULT_CLIENT_ID_ENV: &str = "GOOGLE_CLIENT_ID";
pub const DEFAULT_CLIENT_SECRET_ENV: &str = "GOOGLE_CLIENT_SECRET";

// Files
pub const CONFIG_FILE_NAME: &str = "promisetasks.toml";
pub const XDG_CONFIG_FILE_NAME: &str = "config.toml";
pub const DATABASE_FILE_NAME: &str = "promisetasks.db";
pub const LOG_FILE_NAME: &str = "promisetasks.log";

/// Upper bound for the auto-sync interval (24 hours)
pub const MAX_AUTO_SYNC_INTERVAL_MINUTES: u64 = 1440;

// Messages
pub const CONFIG_GENERATED: &str = "✅ Generated default configuration file";
pub const ERROR_NO_CLIENT_CREDENTIALS: &str = "❌ Error: Google OAuth client credentials not set";
pub const ERROR_NO_LINKED_ACCOUNTS: &str = "⚠️ No linked accounts to sync";
