//! Package metadata baked in by `build.rs`.
//!
//! Provides `APP_METADATA_NAME`, `APP_METADATA_VERSION`, `APP_METADATA_OWNER`
//! and `APP_METADATA_REPO`.

include!(concat!(env!("OUT_DIR"), "/app_metadata.rs"));

/// `User-Agent` sent with every catalog and download request.
pub fn user_agent() -> String {
    format!("Ferry-Launcher/{}", APP_METADATA_VERSION)
}
