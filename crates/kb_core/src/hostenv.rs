//! Creation-time defaults derived from the host environment: the authoring
//! identity and the OS tag.

/// Collapse OS spellings onto the closed tag set.
/// Anything unrecognized maps to `other`.
pub fn normalize_os_name(value: &str) -> String {
    match value.trim().to_lowercase().as_str() {
        "macos" | "darwin" | "mac" => "macos".to_string(),
        "linux" => "linux".to_string(),
        "windows" | "win32" | "win" => "windows".to_string(),
        _ => "other".to_string(),
    }
}

/// The OS tag for new notes: `KB_CREATED_OS` override first, then the
/// compile-time platform, both alias-normalized.
pub fn detect_created_os() -> String {
    if let Ok(value) = std::env::var("KB_CREATED_OS") {
        if !value.trim().is_empty() {
            return normalize_os_name(&value);
        }
    }
    normalize_os_name(std::env::consts::OS)
}

/// The authoring identity for new notes: `KB_CREATED_BY` override, then the
/// hostname, then the login user, then the literal `unknown`.
pub fn detect_created_by() -> String {
    for key in ["KB_CREATED_BY", "HOSTNAME"] {
        if let Ok(value) = std::env::var(key) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }
    for key in ["USER", "USERNAME"] {
        if let Ok(value) = std::env::var(key) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }
    "unknown".to_string()
}
