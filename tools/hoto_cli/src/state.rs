use hoto_core::drughoto::{Duty, HotoMode};
use hoto_core::error::CoreResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Form fields remembered between runs. The pasted handover itself is never
/// stored; it changes every shift.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormState {
    #[serde(default)]
    pub mode: Option<HotoMode>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub duty: Option<Duty>,
    #[serde(default)]
    pub call_sign: Option<String>,
    #[serde(default)]
    pub drugs_used: Option<String>,
}

pub struct FormStore {
    path: PathBuf,
}

impl FormStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty form, not an error.
    pub fn load(&self) -> CoreResult<FormState> {
        if !self.path.exists() {
            return Ok(FormState::default());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(FormState::default());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, state: &FormState) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Forget the remembered drugs, keep everything else.
    pub fn clear_drugs(&self) -> CoreResult<FormState> {
        let mut state = self.load()?;
        state.drugs_used = None;
        self.save(&state)?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_empty_form() {
        let dir = tempfile::tempdir().unwrap();
        let store = FormStore::new(dir.path().join("nested/form.json"));
        assert_eq!(store.load().unwrap(), FormState::default());
    }

    #[test]
    fn save_then_load_keeps_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = FormStore::new(dir.path().join("nested/form.json"));
        let state = FormState {
            mode: Some(HotoMode::Update),
            date: Some("2025-02-11".to_string()),
            duty: Some(Duty::ND),
            call_sign: Some("A441D".to_string()),
            drugs_used: Some("Morphine x2".to_string()),
        };
        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), state);
    }

    #[test]
    fn clear_drugs_keeps_call_sign() {
        let dir = tempfile::tempdir().unwrap();
        let store = FormStore::new(dir.path().join("form.json"));
        store
            .save(&FormState {
                call_sign: Some("B12".to_string()),
                drugs_used: Some("Ketamine x1".to_string()),
                ..FormState::default()
            })
            .unwrap();
        let cleared = store.clear_drugs().unwrap();
        assert_eq!(cleared.call_sign.as_deref(), Some("B12"));
        assert!(cleared.drugs_used.is_none());
        assert_eq!(store.load().unwrap(), cleared);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("form.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(FormStore::new(&path).load().is_err());
    }
}
