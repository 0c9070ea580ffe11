//! `[css]` and `[images]` section configuration.
//!
//! ```toml
//! [css]
//! browsers = ["defaults"]   # browserslist queries used for prefixing
//!
//! [images]
//! jpeg_quality = 80         # 1..=100, JPEG re-encode quality
//! ```

use serde::{Deserialize, Serialize};

/// Stylesheet output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CssConfig {
    /// Browserslist queries; vendor prefixes are added for these targets.
    pub browsers: Vec<String>,
}

impl Default for CssConfig {
    fn default() -> Self {
        Self {
            browsers: vec!["defaults".into()],
        }
    }
}

/// Raster image settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    pub jpeg_quality: u8,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self { jpeg_quality: 80 }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_css_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.css.browsers, vec!["defaults".to_string()]);
        assert_eq!(config.images.jpeg_quality, 80);
    }

    #[test]
    fn test_css_browsers() {
        let config = test_parse_config("[css]\nbrowsers = [\"last 2 versions\", \"not dead\"]");
        assert_eq!(config.css.browsers.len(), 2);
        assert_eq!(config.css.browsers[0], "last 2 versions");
    }

    #[test]
    fn test_images_quality() {
        let config = test_parse_config("[images]\njpeg_quality = 65");
        assert_eq!(config.images.jpeg_quality, 65);
    }
}
