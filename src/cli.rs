use clap::{ArgGroup, Parser};
use std::path::PathBuf;

use crate::config::Overrides;

/// Machine-translate untranslated units of an XLIFF 1.2 file with Azure Translator
#[derive(Debug, Parser)]
#[command(name = "xliff-localizer", version)]
#[command(group(ArgGroup::new("mode").required(true).args(["file", "display_info"])))]
pub struct Cli {
    /// XLIFF file whose `new` targets are translated in place
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Serialized display info (JSON) whose name is translated into every --to language
    #[arg(long = "localizeDisplayInfo", value_name = "JSON")]
    pub display_info: Option<String>,

    /// Azure Translator subscription key
    #[arg(long = "apikey")]
    pub api_key: Option<String>,

    /// Azure Translator resource region
    #[arg(long)]
    pub region: Option<String>,

    /// Source language code
    #[arg(long)]
    pub from: Option<String>,

    /// Target language code(s), comma separated or repeated
    #[arg(long, value_delimiter = ',')]
    pub to: Vec<String>,

    /// YAML or JSON settings file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Translator base URL
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            endpoint: self.endpoint.clone(),
            api_key: self.api_key.clone(),
            region: self.region.clone(),
            from: self.from.clone(),
            to: self.to.clone(),
        }
    }
}
