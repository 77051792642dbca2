use anyhow::{Context, Result};
use std::path::Path;

/// Ensure directory exists
pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {:?}", path))?;
    }
    Ok(())
}

/// Format duration as human-readable string
pub fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else if secs < 3600.0 {
        format!("{:.1}m", secs / 60.0)
    } else {
        format!("{:.1}h", secs / 3600.0)
    }
}

/// Text cleanup helpers shared by catalog ingestion and report rendering.
pub mod text {
    /// Lowercased, trimmed form used for case-insensitive matching.
    pub fn normalize(value: &str) -> String {
        value.trim().to_lowercase()
    }

    /// The value itself, or a placeholder when missing or blank.
    pub fn or_placeholder(value: Option<&str>, placeholder: &str) -> String {
        match value {
            Some(v) if !v.trim().is_empty() => v.to_string(),
            _ => placeholder.to_string(),
        }
    }
}

/// Validation utilities
pub mod validation {
    use anyhow::{bail, Result};

    /// Validate that value is in range
    pub fn in_range<T: PartialOrd + std::fmt::Display>(
        value: T,
        min: T,
        max: T,
        name: &str,
    ) -> Result<()> {
        if value < min || value > max {
            bail!("{} must be between {} and {}, got {}", name, min, max, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30.0), "30.0s");
        assert_eq!(format_duration(90.0), "1.5m");
        assert_eq!(format_duration(3600.0), "1.0h");
    }

    #[test]
    fn test_text_normalize() {
        assert_eq!(text::normalize("  Marfan Syndrome "), "marfan syndrome");
    }

    #[test]
    fn test_or_placeholder() {
        assert_eq!(text::or_placeholder(Some("Losartan"), "none"), "Losartan");
        assert_eq!(text::or_placeholder(Some("   "), "none"), "none");
        assert_eq!(text::or_placeholder(None, "none"), "none");
    }

    #[test]
    fn test_validation() {
        assert!(validation::in_range(0.5, 0.0, 1.0, "value").is_ok());
        assert!(validation::in_range(1.5, 0.0, 1.0, "value").is_err());
    }
}
