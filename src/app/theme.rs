use std::str::FromStr;

use crate::config::ThemeMode;
use crate::storage::{PersistenceAdapter, THEME_KEY};

/// Class list of the document root. The first class is the active mode
/// marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRoot {
    classes: Vec<String>,
}

impl DocumentRoot {
    pub fn new(initial: ThemeMode) -> Self {
        Self {
            classes: vec![initial.marker().to_string()],
        }
    }

    pub fn with_classes<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Mode named by the leading class, if it is a known marker.
    pub fn marker(&self) -> Option<ThemeMode> {
        self.classes
            .first()
            .and_then(|class| ThemeMode::from_str(class).ok())
    }

    /// Swaps `from` for `to` in place. Returns false when `from` is absent.
    pub fn replace(&mut self, from: ThemeMode, to: ThemeMode) -> bool {
        match self.classes.iter_mut().find(|class| *class == from.marker()) {
            Some(class) => {
                *class = to.marker().to_string();
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ThemeState {
    root: DocumentRoot,
}

impl ThemeState {
    pub fn new(root: DocumentRoot) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &DocumentRoot {
        &self.root
    }

    pub fn mode(&self) -> Option<ThemeMode> {
        self.root.marker()
    }

    /// Flips the applied mode and persists the new one. A root without a
    /// recognised marker is left untouched.
    pub fn toggle(&mut self, adapter: &PersistenceAdapter) -> Option<ThemeMode> {
        let current = self.root.marker()?;
        let next = current.flipped();
        match encode_theme(next) {
            Ok(json) => adapter.set(THEME_KEY, &json),
            Err(err) => tracing::warn!(?err, "failed to serialise theme"),
        }
        self.root.replace(current, next);
        tracing::debug!(theme = %next, "theme toggled");
        Some(next)
    }

    /// Applies the persisted mode once. Never writes.
    pub fn apply_on_load(&mut self, adapter: &PersistenceAdapter) -> Option<ThemeMode> {
        let mode = decode_theme(&adapter.get(THEME_KEY)?)?;
        self.root.replace(mode.flipped(), mode);
        Some(mode)
    }
}

/// One-element JSON array naming the marker, e.g. `["dark-theme"]`.
pub fn encode_theme(mode: ThemeMode) -> serde_json::Result<String> {
    serde_json::to_string(&[mode.marker()])
}

pub fn decode_theme(raw: &str) -> Option<ThemeMode> {
    let markers: Vec<String> = match serde_json::from_str::<Option<Vec<String>>>(raw) {
        Ok(markers) => markers.unwrap_or_default(),
        Err(err) => {
            tracing::warn!(?err, "persisted theme is malformed, ignoring");
            return None;
        }
    };
    markers
        .first()
        .and_then(|marker| ThemeMode::from_str(marker).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn toggle_persists_and_swaps_marker() {
        let memory = MemoryStore::new();
        let adapter = PersistenceAdapter::new(memory.clone());
        let mut theme = ThemeState::new(DocumentRoot::new(ThemeMode::Light));

        assert_eq!(theme.toggle(&adapter), Some(ThemeMode::Dark));
        assert_eq!(memory.raw(THEME_KEY).as_deref(), Some(r#"["dark-theme"]"#));
        assert_eq!(theme.mode(), Some(ThemeMode::Dark));

        assert_eq!(theme.toggle(&adapter), Some(ThemeMode::Light));
        assert_eq!(memory.raw(THEME_KEY).as_deref(), Some(r#"["light-theme"]"#));
    }

    #[test]
    fn reload_applies_without_writing() {
        let memory = MemoryStore::new();
        let adapter = PersistenceAdapter::new(memory.clone());
        ThemeState::new(DocumentRoot::new(ThemeMode::Light)).toggle(&adapter);
        let writes = memory.writes();

        let mut reloaded = ThemeState::new(DocumentRoot::new(ThemeMode::Light));
        assert_eq!(reloaded.apply_on_load(&adapter), Some(ThemeMode::Dark));
        assert_eq!(reloaded.mode(), Some(ThemeMode::Dark));
        assert_eq!(memory.writes(), writes);
    }

    #[test]
    fn apply_on_load_without_persisted_value_is_noop() {
        let adapter = PersistenceAdapter::new(MemoryStore::new());
        let mut theme = ThemeState::new(DocumentRoot::new(ThemeMode::Dark));
        assert_eq!(theme.apply_on_load(&adapter), None);
        assert_eq!(theme.mode(), Some(ThemeMode::Dark));
    }

    #[test]
    fn toggle_without_marker_does_nothing() {
        let memory = MemoryStore::new();
        let adapter = PersistenceAdapter::new(memory.clone());
        let mut theme = ThemeState::new(DocumentRoot::with_classes(["typography"]));
        assert_eq!(theme.toggle(&adapter), None);
        assert_eq!(memory.writes(), 0);
        assert_eq!(theme.root().classes(), ["typography".to_string()]);
    }

    #[test]
    fn encoded_marker_is_a_one_element_json_array() -> serde_json::Result<()> {
        let json = encode_theme(ThemeMode::Light)?;
        assert_eq!(json, r#"["light-theme"]"#);
        let parsed: Vec<String> = serde_json::from_str(&json)?;
        assert_eq!(parsed, vec![ThemeMode::Light.marker().to_string()]);
        Ok(())
    }

    #[test]
    fn decode_rejects_unknown_shapes() {
        assert_eq!(decode_theme(r#"["dark-theme"]"#), Some(ThemeMode::Dark));
        assert_eq!(decode_theme("null"), None);
        assert_eq!(decode_theme("[]"), None);
        assert_eq!(decode_theme(r#"["sepia-theme"]"#), None);
        assert_eq!(decode_theme("dark-theme"), None);
    }
}
