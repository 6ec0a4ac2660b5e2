//! Named dialect modes applied when a connection is set up.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::{ConnectionDetails, HistoryOptions};
use crate::error::{StrataError, StrataResult};
use crate::history::{HistoryDialect, MODE_NAME};
use crate::traits::Dialect;

/// Turns a dialect into the dialect a connection actually uses.
///
/// A mode reads its options from the details and removes the ones it consumed.
pub type ModeFn = Arc<
    dyn Fn(Arc<dyn Dialect>, &mut ConnectionDetails) -> StrataResult<Arc<dyn Dialect>>
        + Send
        + Sync,
>;

/// Modes available to connections, by name.
#[derive(Clone)]
pub struct ModeRegistry {
    modes: HashMap<String, ModeFn>,
}

impl ModeRegistry {
    /// Registry holding only the identity modes `""` and `"default"`.
    pub fn new() -> Self {
        let mut registry = Self {
            modes: HashMap::new(),
        };
        registry.register("", |dialect, _| Ok(dialect));
        registry.register("default", |dialect, _| Ok(dialect));
        registry
    }

    /// Identity modes plus `"history"` stamped with wall-clock time.
    pub fn builtin() -> Self {
        Self::new().with(MODE_NAME, history_mode(Arc::new(SystemClock)))
    }

    /// Register `mode` under `name`, replacing any previous registration.
    pub fn register<F>(&mut self, name: impl Into<String>, mode: F)
    where
        F: Fn(Arc<dyn Dialect>, &mut ConnectionDetails) -> StrataResult<Arc<dyn Dialect>>
            + Send
            + Sync
            + 'static,
    {
        self.modes.insert(name.into(), Arc::new(mode));
    }

    /// Builder-style [`ModeRegistry::register`].
    pub fn with<F>(mut self, name: impl Into<String>, mode: F) -> Self
    where
        F: Fn(Arc<dyn Dialect>, &mut ConnectionDetails) -> StrataResult<Arc<dyn Dialect>>
            + Send
            + Sync
            + 'static,
    {
        self.register(name, mode);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modes.contains_key(name)
    }

    /// Registered mode names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Wrap `dialect` in the mode named by `details.mode`.
    pub fn apply(
        &self,
        dialect: Arc<dyn Dialect>,
        details: &mut ConnectionDetails,
    ) -> StrataResult<Arc<dyn Dialect>> {
        let mode = self.modes.get(&details.mode).ok_or_else(|| {
            StrataError::Configuration(format!(
                "unknown mode '{}' (registered: {})",
                details.mode,
                self.names().join(", ")
            ))
        })?;

        info!(mode = %details.mode, dialect = dialect.name(), "Applying dialect mode");
        mode(dialect, details)
    }
}

impl Default for ModeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for ModeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeRegistry")
            .field("modes", &self.names())
            .finish()
    }
}

/// The history mode, stamping history rows with `clock`.
///
/// Consumes the `suffix` option.
pub fn history_mode(
    clock: Arc<dyn Clock>,
) -> impl Fn(Arc<dyn Dialect>, &mut ConnectionDetails) -> StrataResult<Arc<dyn Dialect>>
       + Send
       + Sync
       + 'static {
    move |dialect, details| {
        let options = HistoryOptions::from_details(details);
        let wrapped: Arc<dyn Dialect> = Arc::new(HistoryDialect::with_clock(
            dialect,
            options.suffix,
            Arc::clone(&clock),
        ));
        Ok(wrapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::query::tests::NumberedDialect;

    fn base() -> Arc<dyn Dialect> {
        Arc::new(NumberedDialect)
    }

    #[test]
    fn test_identity_modes() {
        let registry = ModeRegistry::new();
        let mut details = ConnectionDetails::default();
        let dialect = registry.apply(base(), &mut details).unwrap();
        assert!(dialect.time_travel().is_none());

        details.mode = "default".to_string();
        assert!(registry.apply(base(), &mut details).is_ok());
        assert!(!registry.contains(MODE_NAME));
    }

    #[test]
    fn test_history_mode_wraps_and_consumes_suffix() {
        let registry = ModeRegistry::builtin();
        let mut details = ConnectionDetails::builder()
            .mode("history")
            .option("suffix", "_audit")
            .build();

        let dialect = registry.apply(base(), &mut details).unwrap();
        assert!(dialect.time_travel().is_some());
        assert_eq!(dialect.name(), "numbered");
        assert!(details.option("suffix").is_none());

        let err = dialect
            .schema_translator()
            .drop_table(crate::schema::Table::new("users_audit"))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::SchHistoricalTarget);
    }

    #[test]
    fn test_unknown_mode() {
        let mut details = ConnectionDetails::builder().mode("audit").build();
        let err = ModeRegistry::builtin()
            .apply(base(), &mut details)
            .err()
            .unwrap();
        assert!(matches!(err, StrataError::Configuration(_)));
        assert!(err.to_string().contains("audit"));
        assert!(err.to_string().contains("history"));
    }

    #[test]
    fn test_custom_mode() {
        let registry = ModeRegistry::new().with("tagged", |dialect, details| {
            details.take_option("tag");
            Ok(dialect)
        });
        let mut details = ConnectionDetails::builder()
            .mode("tagged")
            .option("tag", "x")
            .build();

        registry.apply(base(), &mut details).unwrap();
        assert!(details.options.is_empty());
        assert_eq!(registry.names(), vec!["", "default", "tagged"]);
    }
}
