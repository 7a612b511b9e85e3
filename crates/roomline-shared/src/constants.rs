/// Minimum nickname length (characters, after trimming)
pub const MIN_NICKNAME_LEN: usize = 3;

/// Maximum nickname length accepted by the room server (characters)
pub const MAX_NICKNAME_LEN: usize = 32;

/// Minimum password length (characters)
pub const MIN_PASSWORD_LEN: usize = 6;

/// Maximum message text length (characters, after trimming)
pub const MAX_TEXT_LEN: usize = 700;

/// Maximum number of attachments staged or sent with one message
pub const MAX_ATTACHMENTS: usize = 6;

/// Maximum decoded attachment size in bytes (2 MiB)
pub const MAX_ATTACHMENT_SIZE: usize = 2 * 1024 * 1024;

/// Maximum decoded avatar size in bytes (1 MiB)
pub const MAX_AVATAR_SIZE: usize = 1024 * 1024;

/// Default delay between two room state fetches in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_600;

/// Distance from the bottom under which the timeline counts as anchored
pub const DEFAULT_NEAR_BOTTOM_THRESHOLD: f64 = 84.0;

/// Error value the room server uses to signal an invalid or expired session
pub const UNAUTHORIZED_ERROR: &str = "unauthorized";

/// Key of the single durable entry holding the session token
pub const SESSION_TOKEN_KEY: &str = "session_token";

/// Image MIME types the room server accepts in data URLs
pub const ACCEPTED_IMAGE_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/webp", "image/gif"];

/// Default room server base URL (local development)
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";
