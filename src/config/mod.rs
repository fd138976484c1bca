pub mod actions;
pub mod key;
pub mod keybindings;
pub mod loader;
pub mod resolver;
mod timing;

pub use actions::*;
use keybindings::KeybindingsConfig;
pub use loader::load;
pub use resolver::KeyResolver;
use serde::{Deserialize, Serialize};
pub use timing::TimingConfig;

use crate::document::ZLayer;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    pub name: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            name: "Catppuccin Mocha".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Page loaded when no URL is given on the command line.
    pub base_url: Option<String>,
    /// Layer of dialogs that do not declare `data-layer`.
    pub default_layer: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            default_layer: ZLayer::DEFAULT.to_string(),
        }
    }
}

impl PageConfig {
    pub fn layer(&self) -> ZLayer {
        ZLayer::parse(&self.default_layer).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub keybindings: KeybindingsConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub page: PageConfig,
}
