//! The entry library: creation from analysis results, search, deletion.

use crate::ai::{analyze_or_fallback, AnalysisService};
use crate::error::StoreError;
use crate::models::{AnalysisResult, Category, KnowledgeEntry};
use crate::store::{self, KeyValueStore};
use chrono::Utc;
use rand::Rng;

/// A short random hex id.
pub fn new_entry_id() -> String {
    use sha2::Digest;
    let mut hasher = sha2::Sha256::new();
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    hasher.update(nanos.to_le_bytes());
    hasher.update(rand::thread_rng().gen::<u64>().to_le_bytes());
    let result = hasher.finalize();
    result[..8].iter().map(|b| format!("{:02x}", b)).collect()
}

/// Turn an analysis of `text` and `images` into a new entry.
pub fn build_entry(text: &str, images: Vec<String>, analysis: AnalysisResult) -> KnowledgeEntry {
    let category = analysis
        .suggested_category
        .parse::<Category>()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "mapping unrecognized category to General");
            Category::General
        });

    let raw_content = if text.trim().is_empty() {
        analysis.extracted_content
    } else {
        text.to_string()
    };

    let title = match analysis.title_suggestion.trim() {
        "" => "New Entry".to_string(),
        t => t.to_string(),
    };

    let mermaid_chart = Some(analysis.mermaid_chart).filter(|c| !c.trim().is_empty());

    let mut tags: Vec<String> = Vec::new();
    for tag in analysis.suggested_tags {
        let tag = tag.trim();
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }

    KnowledgeEntry {
        id: new_entry_id(),
        title,
        summary: analysis.summary,
        raw_content,
        category,
        steps: analysis.steps,
        code_snippets: analysis.code_snippets,
        mermaid_chart,
        tags,
        image_urls: images,
        created_at: Utc::now(),
    }
}

/// Entries whose title or a tag contains `query` (case-insensitive), limited
/// to `category` when given.
pub fn filter_entries<'a>(
    entries: &'a [KnowledgeEntry],
    query: &str,
    category: Option<Category>,
) -> Vec<&'a KnowledgeEntry> {
    let query = query.trim().to_lowercase();
    entries
        .iter()
        .filter(|e| category.map_or(true, |c| e.category == c))
        .filter(|e| {
            query.is_empty()
                || e.title.to_lowercase().contains(&query)
                || e.tags.iter().any(|t| t.to_lowercase().contains(&query))
        })
        .collect()
}

pub fn find_entry(store: &dyn KeyValueStore, id: &str) -> Result<Option<KnowledgeEntry>, StoreError> {
    Ok(store::load_entries(store)?.into_iter().find(|e| e.id == id))
}

/// Store `entry` at the front of the list.
pub fn add_entry(store: &dyn KeyValueStore, entry: KnowledgeEntry) -> Result<(), StoreError> {
    let mut entries = store::load_entries(store)?;
    entries.insert(0, entry);
    store::save_entries(store, &entries)
}

/// Analyze the input and save the resulting entry. Analysis failures fall
/// back to a generic entry; only store failures are errors. Returns `None`
/// when there is nothing to analyze.
pub async fn create_entry<S>(
    store: &dyn KeyValueStore,
    analyzer: &S,
    text: &str,
    images: Vec<String>,
) -> Result<Option<KnowledgeEntry>, StoreError>
where
    S: AnalysisService + ?Sized,
{
    if text.trim().is_empty() && images.is_empty() {
        return Ok(None);
    }

    let analysis = analyze_or_fallback(analyzer, text, &images).await;
    let entry = build_entry(text, images, analysis);
    add_entry(store, entry.clone())?;
    tracing::info!(id = %entry.id, title = %entry.title, "created entry");
    Ok(Some(entry))
}

/// Remove an entry and its saved highlight term. Returns whether it existed.
pub fn delete_entry(store: &dyn KeyValueStore, id: &str) -> Result<bool, StoreError> {
    let mut entries = store::load_entries(store)?;
    let before = entries.len();
    entries.retain(|e| e.id != id);
    if entries.len() == before {
        return Ok(false);
    }
    store::save_entries(store, &entries)?;
    store::save_term(store, id, None)?;
    tracing::info!(id, "deleted entry");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AiError;
    use crate::models::CodeSnippet;
    use crate::store::MemoryStore;
    use async_trait::async_trait;

    struct FixedAnalyzer(Option<AnalysisResult>);

    #[async_trait]
    impl AnalysisService for FixedAnalyzer {
        async fn analyze(&self, _text: &str, _images: &[String]) -> Result<AnalysisResult, AiError> {
            self.0.clone().ok_or(AiError::EmptyResponse)
        }
    }

    fn analysis() -> AnalysisResult {
        AnalysisResult {
            summary: "Rebase onto main.".to_string(),
            steps: vec!["git fetch".to_string(), "git rebase origin/main".to_string()],
            code_snippets: vec![CodeSnippet {
                language: "bash".to_string(),
                code: "git rebase origin/main".to_string(),
                description: String::new(),
            }],
            mermaid_chart: "  ".to_string(),
            suggested_tags: vec!["git".to_string(), " git ".to_string(), "rebase".to_string()],
            suggested_category: "Procedimiento".to_string(),
            title_suggestion: "Rebasing a branch".to_string(),
            extracted_content: String::new(),
        }
    }

    fn entries() -> Vec<KnowledgeEntry> {
        let mut docker = build_entry("docker", Vec::new(), analysis());
        docker.title = "Docker networking".to_string();
        docker.tags = vec!["containers".to_string()];
        docker.category = Category::Definition;
        let git = build_entry("git", Vec::new(), analysis());
        vec![docker, git]
    }

    #[test]
    fn test_build_entry() {
        let entry = build_entry("notes", vec!["data:image/png;base64,AA==".to_string()], analysis());
        assert_eq!(entry.category, Category::Procedure);
        assert_eq!(entry.mermaid_chart, None);
        assert_eq!(entry.tags, vec!["git".to_string(), "rebase".to_string()]);
        assert_eq!(entry.raw_content, "notes");
        assert_eq!(entry.image_urls.len(), 1);
        assert_eq!(entry.id.len(), 16);
    }

    #[test]
    fn test_unknown_category_maps_to_general() {
        let mut result = analysis();
        result.suggested_category = "Recipe".to_string();
        assert_eq!(build_entry("x", Vec::new(), result).category, Category::General);
    }

    #[test]
    fn test_image_only_entry_uses_extracted_text() {
        let mut result = analysis();
        result.extracted_content = "text read from the screenshot".to_string();
        let entry = build_entry("", vec!["img".to_string()], result);
        assert_eq!(entry.raw_content, "text read from the screenshot");
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(new_entry_id(), new_entry_id());
    }

    #[test]
    fn test_filter_by_title_tag_and_category() {
        let entries = entries();
        assert_eq!(filter_entries(&entries, "", None).len(), 2);
        assert_eq!(filter_entries(&entries, "DOCKER", None)[0].title, "Docker networking");
        assert_eq!(filter_entries(&entries, "contain", None).len(), 1);
        assert_eq!(filter_entries(&entries, "rebase", None).len(), 1);
        assert_eq!(filter_entries(&entries, "", Some(Category::Procedure)).len(), 1);
        assert!(filter_entries(&entries, "docker", Some(Category::Procedure)).is_empty());
        // Summary text is not searched.
        assert!(filter_entries(&entries, "onto main", None).is_empty());
    }

    #[tokio::test]
    async fn test_create_and_delete() {
        let store = MemoryStore::new();
        store::save_entries(&store, &[]).unwrap();

        let analyzer = FixedAnalyzer(Some(analysis()));
        let entry = create_entry(&store, &analyzer, "notes", Vec::new())
            .await
            .unwrap()
            .unwrap();
        let second = create_entry(&store, &analyzer, "more notes", Vec::new())
            .await
            .unwrap()
            .unwrap();

        let stored = store::load_entries(&store).unwrap();
        assert_eq!(stored[0].id, second.id);
        assert_eq!(find_entry(&store, &entry.id).unwrap(), Some(entry.clone()));

        store::save_term(&store, &entry.id, Some("rebase")).unwrap();
        assert!(delete_entry(&store, &entry.id).unwrap());
        assert!(!delete_entry(&store, &entry.id).unwrap());
        assert_eq!(find_entry(&store, &entry.id).unwrap(), None);
        assert_eq!(store::load_term(&store, &entry.id).unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_analysis_still_saves() {
        let store = MemoryStore::new();
        store::save_entries(&store, &[]).unwrap();
        let entry = create_entry(&store, &FixedAnalyzer(None), "raw notes", Vec::new())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.title, "New Entry");
        assert_eq!(entry.category, Category::General);
        assert_eq!(entry.tags, vec!["Uncategorized".to_string()]);
        assert_eq!(store::load_entries(&store).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_input_creates_nothing() {
        let store = MemoryStore::new();
        let created = create_entry(&store, &FixedAnalyzer(Some(analysis())), "  ", Vec::new())
            .await
            .unwrap();
        assert!(created.is_none());
        assert!(store.get(store::ENTRIES_KEY).unwrap().is_none());
    }
}
