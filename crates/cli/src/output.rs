// Output formatting for the run summary
//
// The text report is always printed by the reporter. JSON and YAML are
// emitted afterwards for scripting.

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Render `value` in this format; text yields None
    pub fn render<T: Serialize>(&self, value: &T) -> Result<Option<String>> {
        let rendered = match self {
            OutputFormat::Json => Some(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Some(serde_yaml::to_string(value)?),
            OutputFormat::Text => None,
        };
        Ok(rendered)
    }

    pub fn print_value<T: Serialize>(&self, value: &T) -> Result<()> {
        if let Some(rendered) = self.render(value)? {
            println!("{}", rendered);
        }
        Ok(())
    }
}
