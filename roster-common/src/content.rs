//! Page content store
//!
//! Marketing page copy lives in one JSON document per page under the
//! content directory: `{ "<section>": { "<field>": "<text>", ... }, ... }`.
//! Section writes merge into the existing document and replace the file
//! atomically.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::info;

use crate::{Error, Result};

/// Field name → text for one page section
pub type SectionContent = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageContent {
    pub sections: BTreeMap<String, SectionContent>,
}

impl PageContent {
    pub fn section(&self, key: &str) -> Option<&SectionContent> {
        self.sections.get(key)
    }
}

fn validate_key(key: &str, what: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::Validation(format!("Invalid {} key: '{}'", what, key)))
    }
}

#[derive(Debug)]
pub struct ContentStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl ContentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn page_path(&self, page: &str) -> PathBuf {
        self.dir.join(format!("{}.json", page))
    }

    /// Page keys with a stored document, sorted
    pub async fn list_pages(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut pages = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_key(stem, "page").is_ok() {
                    pages.push(stem.to_string());
                }
            }
        }
        pages.sort();
        Ok(pages)
    }

    /// Stored document for `page`; an absent page reads as empty
    pub async fn read_page(&self, page: &str) -> Result<PageContent> {
        validate_key(page, "page")?;
        match tokio::fs::read(self.page_path(page)).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PageContent::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Merge `fields` into `section` of `page` and persist the document
    pub async fn write_section(
        &self,
        page: &str,
        section: &str,
        fields: SectionContent,
    ) -> Result<PageContent> {
        validate_key(page, "page")?;
        validate_key(section, "section")?;

        let _guard = self.write_lock.lock().await;
        let mut content = self.read_page(page).await?;
        content
            .sections
            .entry(section.to_string())
            .or_default()
            .extend(fields);

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.page_path(page);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(&content)?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        info!("Updated content {}/{}", page, section);

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> SectionContent {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_missing_page_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path());
        assert_eq!(store.read_page("home").await.unwrap(), PageContent::default());
        assert!(store.list_pages().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_section_merges_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path());

        store
            .write_section("home", "hero", fields(&[("title", "Plan ahead"), ("cta", "Book")]))
            .await
            .unwrap();
        store
            .write_section("home", "hero", fields(&[("title", "Plan with us")]))
            .await
            .unwrap();
        store
            .write_section("home", "values", fields(&[("heading", "Our values")]))
            .await
            .unwrap();

        let page = store.read_page("home").await.unwrap();
        let hero = page.section("hero").unwrap();
        assert_eq!(hero["title"], "Plan with us");
        assert_eq!(hero["cta"], "Book");
        assert_eq!(page.section("values").unwrap()["heading"], "Our values");
        assert_eq!(store.list_pages().await.unwrap(), vec!["home"]);
    }

    #[tokio::test]
    async fn test_rejects_bad_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path());
        assert!(matches!(
            store.read_page("../etc").await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            store.write_section("home", "Hero Title", SectionContent::new()).await,
            Err(Error::Validation(_))
        ));
    }
}
