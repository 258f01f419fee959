//! Shared constants for end-to-end tests
//!
//! All fixture identity and timestamp values live here; when test data
//! changes, update only this file.

// ============================================================================
// Song / Artist Fixtures
// ============================================================================

pub const SONG_1_ID: &str = "SOAAA001";
pub const SONG_1_TITLE: &str = "Song A";
pub const SONG_1_DURATION: f64 = 210.5;

pub const SONG_2_ID: &str = "SOBBB002";
pub const SONG_2_TITLE: &str = "Song B";
pub const SONG_2_DURATION: f64 = 180.0;

pub const ARTIST_1_ID: &str = "ARAAA001";
pub const ARTIST_1_NAME: &str = "Artist A";

pub const ARTIST_2_ID: &str = "ARBBB002";
pub const ARTIST_2_NAME: &str = "Artist B";

// ============================================================================
// Users
// ============================================================================

pub const USER_1_ID: i64 = 7;
pub const USER_2_ID: i64 = 8;

// ============================================================================
// Event Timestamps (epoch milliseconds)
// ============================================================================

/// 2018-11-02T10:45:34.796Z
pub const TS_NOVEMBER_1: i64 = 1_541_155_534_796;

/// 2018-11-15T12:30:00Z
pub const TS_NOVEMBER_2: i64 = 1_542_285_000_000;

/// 2018-12-01T00:00:00Z, a different output partition than the November plays
pub const TS_DECEMBER: i64 = 1_543_622_400_000;
