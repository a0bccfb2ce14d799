use std::collections::HashMap;
use std::sync::RwLock;

use crate::links::SenderId;
use crate::prompt::Language;

/// In-memory language preference per sender.
///
/// Lives for the process lifetime and is never persisted. Each sender has at
/// most one entry; the latest selection wins.
#[derive(Debug, Default)]
pub struct PreferenceStore {
    languages: RwLock<HashMap<SenderId, Language>>,
}

impl PreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Language chosen by `sender`, or the default when none was chosen.
    pub fn language(&self, sender: SenderId) -> Language {
        let map = self.languages.read().unwrap_or_else(|e| e.into_inner());
        map.get(&sender).copied().unwrap_or_default()
    }

    pub fn set_language(&self, sender: SenderId, language: Language) {
        let mut map = self.languages.write().unwrap_or_else(|e| e.into_inner());
        map.insert(sender, language);
    }

    pub fn len(&self) -> usize {
        self.languages.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
