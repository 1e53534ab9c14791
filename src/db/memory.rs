use super::traits::FragmentStore;
use crate::types::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Process-local fragment store, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryFragmentStore {
    sources: RwLock<HashMap<String, Vec<String>>>,
}

impl MemoryFragmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FragmentStore for MemoryFragmentStore {
    async fn has_fragments(&self, source_id: &str) -> Result<bool> {
        Ok(self
            .sources
            .read()
            .get(source_id)
            .is_some_and(|fragments| !fragments.is_empty()))
    }

    async fn get_fragments(&self, source_id: &str) -> Result<Vec<String>> {
        Ok(self
            .sources
            .read()
            .get(source_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn put_fragments(&self, source_id: &str, fragments: &[String]) -> Result<bool> {
        if fragments.is_empty() {
            return Ok(false);
        }
        let mut sources = self.sources.write();
        if sources.contains_key(source_id) {
            return Ok(false);
        }
        sources.insert(source_id.to_string(), fragments.to_vec());
        Ok(true)
    }

    async fn sources(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.sources.read().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
