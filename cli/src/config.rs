use std::path::Path;

use serde::Deserialize;

use fmxml::DecompileOptions;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "fm-cp.toml";

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub decompile: DecompileSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DecompileSettings {
    /// Spaces per nesting level in decompiled text.
    pub indent: usize,
}

impl Default for DecompileSettings {
    fn default() -> Self {
        DecompileSettings { indent: 4 }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSettings {
    /// `false` behaves like `--no-color`.
    pub color: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        OutputSettings { color: true }
    }
}

impl Settings {
    pub fn decompile_options(&self) -> DecompileOptions {
        DecompileOptions {
            indent: self.decompile.indent,
        }
    }
}

/// Load settings from `path`, or from `fm-cp.toml` if it exists, or defaults.
pub fn load(path: Option<&Path>) -> Result<Settings, String> {
    match path {
        Some(path) => read(path),
        None => {
            let fallback = Path::new(DEFAULT_CONFIG_FILE);
            if fallback.is_file() {
                read(fallback)
            } else {
                Ok(Settings::default())
            }
        }
    }
}

fn read(path: &Path) -> Result<Settings, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read config '{}': {}", path.display(), e))?;
    parse(&text).map_err(|e| format!("invalid config '{}': {}", path.display(), e))
}

fn parse(text: &str) -> Result<Settings, toml::de::Error> {
    toml::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_is_defaults() {
        assert_eq!(parse("").unwrap(), Settings::default());
        assert_eq!(Settings::default().decompile_options(), DecompileOptions::default());
    }

    #[test]
    fn partial_sections() {
        let settings = parse("[decompile]\nindent = 2\n").unwrap();
        assert_eq!(settings.decompile.indent, 2);
        assert!(settings.output.color);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse("[output]\ncolour = false\n").is_err());
        assert!(parse("[render]\nindent = 2\n").is_err());
    }

    #[test]
    fn loads_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\ncolor = false").unwrap();
        let settings = load(Some(file.path())).unwrap();
        assert!(!settings.output.color);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.starts_with("cannot read config"));
    }
}
