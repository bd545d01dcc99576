use crossterm::tty::IsTty;

use crate::core::config::Settings;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub pretty: bool,
    pub use_color: bool,
    pub verbose: bool,
}

impl OutputOptions {
    /// Combine command-line flags with the `[settings]` section.
    /// Flags win over the config file.
    pub fn resolve(
        settings: &Settings,
        format_flag: Option<&str>,
        json_flag: bool,
        pretty: bool,
        no_color: bool,
        verbose: bool,
    ) -> Self {
        let format = if json_flag {
            OutputFormat::Json
        } else {
            format_flag
                .or(Some(settings.default_format.as_str()))
                .and_then(OutputFormat::from_id)
                .unwrap_or(OutputFormat::Text)
        };
        let use_color = match (no_color, settings.color.as_str()) {
            (true, _) | (false, "never") => false,
            (false, "always") => true,
            _ => detect_color(),
        };
        Self {
            format,
            pretty,
            use_color,
            verbose,
        }
    }

    pub fn to_json<T: serde::Serialize>(&self, value: &T) -> serde_json::Result<String> {
        if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
    }
}

pub fn detect_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    std::io::stdout().is_tty()
}
