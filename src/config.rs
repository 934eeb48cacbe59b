use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Medscan";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// OCR language loaded into the engine.
pub const DEFAULT_OCR_LANGUAGE: &str = "eng";

/// Characters the engine is allowed to emit. Covers report prose, lab values,
/// units and dosage notation.
pub const DEFAULT_CHAR_WHITELIST: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789.,;:!?()[]{}/-+%<>=*#&'\" ";

const ENV_OCR_LANG: &str = "MEDSCAN_OCR_LANG";
const ENV_TESSDATA_DIR: &str = "MEDSCAN_TESSDATA_DIR";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "info,medscan_lib=debug"
}

/// Application data directory: ~/Medscan/.
/// Returns None when the home directory cannot be determined.
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_NAME))
}

/// Bundled tessdata location under the application data directory.
pub fn bundled_tessdata_dir() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join("tessdata"))
}

/// Engine configuration applied once per engine initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrSettings {
    pub language: String,
    pub char_whitelist: String,
    pub preserve_interword_spaces: bool,
    /// None lets the backend use its compiled-in tessdata path.
    pub tessdata_dir: Option<PathBuf>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: DEFAULT_OCR_LANGUAGE.to_string(),
            char_whitelist: DEFAULT_CHAR_WHITELIST.to_string(),
            preserve_interword_spaces: true,
            tessdata_dir: None,
        }
    }
}

impl OcrSettings {
    /// Defaults, overridden by `MEDSCAN_OCR_LANG` and `MEDSCAN_TESSDATA_DIR`.
    /// Falls back to ~/Medscan/tessdata when it exists.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();

        if let Some(lang) = lookup(ENV_OCR_LANG).filter(|l| !l.trim().is_empty()) {
            settings.language = lang.trim().to_string();
        }

        settings.tessdata_dir = match lookup(ENV_TESSDATA_DIR) {
            Some(dir) if !dir.trim().is_empty() => Some(PathBuf::from(dir.trim())),
            _ => bundled_tessdata_dir().filter(|dir| dir.exists()),
        };

        settings
    }

    /// Engine parameters as (name, value) pairs.
    pub fn engine_parameters(&self) -> Vec<(&'static str, String)> {
        vec![
            ("tessedit_char_whitelist", self.char_whitelist.clone()),
            (
                "preserve_interword_spaces",
                if self.preserve_interword_spaces { "1" } else { "0" }.to_string(),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir().unwrap();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("Medscan"));
    }

    #[test]
    fn default_settings_use_english_and_keep_spaces() {
        let settings = OcrSettings::default();
        assert_eq!(settings.language, "eng");
        assert!(settings.preserve_interword_spaces);
        assert!(settings.char_whitelist.contains('%'));
        assert!(settings.tessdata_dir.is_none());
    }

    #[test]
    fn env_overrides_language_and_tessdata() {
        let settings = OcrSettings::from_lookup(|key| match key {
            "MEDSCAN_OCR_LANG" => Some("eng+fra".into()),
            "MEDSCAN_TESSDATA_DIR" => Some("/opt/tessdata".into()),
            _ => None,
        });
        assert_eq!(settings.language, "eng+fra");
        assert_eq!(settings.tessdata_dir, Some(PathBuf::from("/opt/tessdata")));
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let settings = OcrSettings::from_lookup(|key| match key {
            "MEDSCAN_OCR_LANG" => Some("   ".into()),
            _ => None,
        });
        assert_eq!(settings.language, "eng");
    }

    #[test]
    fn engine_parameters_include_whitelist_and_spacing() {
        let mut settings = OcrSettings::default();
        settings.preserve_interword_spaces = false;
        let params = settings.engine_parameters();
        assert_eq!(params[0].0, "tessedit_char_whitelist");
        assert_eq!(params[0].1, DEFAULT_CHAR_WHITELIST);
        assert_eq!(params[1], ("preserve_interword_spaces", "0".to_string()));
    }
}
