/// Application name
pub const APP_NAME: &str = "KampusSepeti";

/// Maximum message length in characters, measured after trimming
pub const MAX_MESSAGE_CHARS: usize = 1000;

/// Default number of messages returned for a conversation thread
pub const DEFAULT_THREAD_LIMIT: u32 = 50;

/// Upper bound on a requested thread size
pub const MAX_THREAD_LIMIT: u32 = 200;

/// Rating bounds (stars)
pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Maximum rating comment length
pub const MAX_RATING_COMMENT_CHARS: usize = 500;

/// Maximum report reason length
pub const MAX_REPORT_REASON_CHARS: usize = 500;

/// Maximum admin note length on a report
pub const MAX_ADMIN_NOTE_CHARS: usize = 1000;

/// Account field limits
pub const MAX_NAME_CHARS: usize = 50;
pub const MAX_BIO_CHARS: usize = 300;
pub const MAX_PHONE_CHARS: usize = 15;

/// Upper bound for short free-text fields (titles, university, department)
pub const MAX_SHORT_TEXT_CHARS: usize = 200;

/// Maximum listing description length
pub const MAX_DESCRIPTION_CHARS: usize = 2000;

/// Earliest accepted publication year for a listing
pub const MIN_PUBLISH_YEAR: i32 = 1900;

/// Maximum number of images attached to a listing
pub const MAX_PRODUCT_IMAGES: usize = 5;

/// Default page sizes
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_PRODUCT_PAGE_SIZE: u32 = 12;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Window used by the admin dashboard for "recent" activity, in days
pub const RECENT_ACTIVITY_DAYS: i64 = 30;

/// Default HTTP API port
pub const DEFAULT_HTTP_PORT: u16 = 5000;
