//! # Fixed Limits
//!
//! Compiled-in bounds for everything Sprout accepts from the outside.
//!
//! These are size bounds, not form rules: they keep a single request or a
//! single content file from exhausting memory or storage.

/// Name of the stage column in the guidance content table.
pub const STAGE_COLUMN: &str = "Age/Timeframe";

/// Suffix marking an illustration column paired with a category column.
///
/// Category `Motor` pairs with column `Motor Images`.
pub const IMAGE_COLUMN_SUFFIX: &str = " Images";

/// Cell values that mean "no content" in the guidance table.
pub const EMPTY_CELL_MARKERS: &[&str] = &["-", "N/A"];

/// Delimiters considered when sniffing the content table format.
pub const CONTENT_DELIMITERS: &[u8] = b",\t|;";

/// Maximum size of a guidance content file (10 MB).
pub const MAX_CONTENT_FILE_SIZE: u64 = 10 * 1024 * 1024;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length of a child's or user's display name, in bytes.
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum length of a milestone or activity title, in bytes.
pub const MAX_TITLE_LENGTH: usize = 100;

/// Maximum length of a free-text description, in bytes.
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Maximum length of a URL-like reference (photo, image, avatar), in bytes.
pub const MAX_REFERENCE_LENGTH: usize = 2048;

/// Maximum length of a phone number, in bytes.
pub const MAX_PHONE_LENGTH: usize = 32;

/// Maximum number of photos attached to one milestone.
pub const MAX_PHOTOS: usize = 20;

/// Activity duration bounds in minutes (one day at most).
pub const MIN_DURATION_MINUTES: u32 = 1;
pub const MAX_DURATION_MINUTES: u32 = 1440;

/// Maximum number of children created in one onboarding submission.
pub const MAX_ONBOARDING_CHILDREN: usize = 10;
