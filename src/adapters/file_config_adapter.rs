//! INI file configuration adapter.

use crate::domain::error::TurtleError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TurtleError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| TurtleError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, TurtleError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| TurtleError::ConfigParse {
                file: "<inline>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_sections() {
        let content = r#"
[turtle]
strat1_breakout = 20
stop_multiplier = 2.0

[universe]
symbols = ES,NQ,CL
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("universe", "symbols"),
            Some("ES,NQ,CL".to_string())
        );
        assert_eq!(
            adapter.get_string("turtle", "strat1_breakout"),
            Some("20".to_string())
        );
    }

    #[test]
    fn keys_are_case_insensitive() {
        let adapter = FileConfigAdapter::from_string("[multipliers]\nES = 50\n").unwrap();
        assert_eq!(adapter.get_string("multipliers", "ES"), Some("50".to_string()));
        assert_eq!(adapter.get_string("multipliers", "es"), Some("50".to_string()));
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[turtle]\natr_period = 20\n").unwrap();
        assert_eq!(adapter.get_string("turtle", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn malformed_values_are_returned_verbatim() {
        let adapter =
            FileConfigAdapter::from_string("[turtle]\natr_period = abc\nsimulate_fills = maybe\n")
                .unwrap();
        assert_eq!(adapter.get_string("turtle", "atr_period"), Some("abc".to_string()));
        assert_eq!(adapter.get_string("turtle", "simulate_fills"), Some("maybe".to_string()));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[turtle]\nsimulate_fills = false\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("turtle", "simulate_fills"),
            Some("false".to_string())
        );
    }

    #[test]
    fn from_file_missing_is_parse_error() {
        let err = FileConfigAdapter::from_file("/nonexistent/path/turtle.ini").unwrap_err();
        assert!(matches!(err, TurtleError::ConfigParse { file, .. } if file.contains("turtle.ini")));
    }
}
