//! Service configuration from environment variables

use crate::practice::DEFAULT_QUESTION_TTL;
use crate::state_machine::state::DEFAULT_MAX_QUERY_CHARS;
use crate::state_machine::DialogContext;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
    /// Catalog JSON imported at startup, if set
    pub catalog_seed: Option<PathBuf>,
    pub dialog: DialogContext,
    pub practice_ttl: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let db_path = var("HANZI_DB_PATH").map_or_else(
            || {
                let home = var("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(format!("{home}/.hanzi-helper/hanzi.db"))
            },
            PathBuf::from,
        );

        let port = var("HANZI_PORT")
            .or_else(|| var("PORT"))
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let defaults = DialogContext::default();
        let dialog = DialogContext {
            worksheet_url: var("HANZI_WORKSHEET_URL").unwrap_or(defaults.worksheet_url),
            tablet_practice_url: var("HANZI_TABLET_URL").unwrap_or(defaults.tablet_practice_url),
            max_query_chars: var("HANZI_MAX_QUERY_CHARS")
                .and_then(|n| n.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_MAX_QUERY_CHARS),
        };

        let practice_ttl = var("HANZI_PRACTICE_TTL_SECS")
            .and_then(|s| s.parse().ok())
            .map_or(DEFAULT_QUESTION_TTL, Duration::from_secs);

        Self {
            db_path,
            port,
            catalog_seed: var("HANZI_CATALOG_SEED").map(PathBuf::from),
            dialog,
            practice_ttl,
        }
    }
}
