//! Tests for WikiData over a local index
//!
//! These tests verify:
//! - End-to-end title → page lookups with case fallback
//! - Location rewriting and shard_root joining
//! - Error kinds surfaced by get_page
//! - Lifecycle (open failures, close, concurrent readers)

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use tempfile::TempDir;
use wikirace::index::IndexBuilder;
use wikirace::{PathTransformer, StoreConfig, WikiData, WikiError};

// =============================================================================
// Helper Functions
// =============================================================================

/// Lay out `root/index` and `root/<shard files>`
fn setup_corpus(mapping: &[(&str, &str)], shards: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = temp.path().to_path_buf();

    let mut sorted = mapping.to_vec();
    sorted.sort();
    let mut builder = IndexBuilder::new(&root.join("index")).unwrap();
    for (title, location) in sorted {
        builder.add(title.as_bytes(), location.as_bytes()).unwrap();
    }
    builder.finish().unwrap();

    for (name, body) in shards {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, body).unwrap();
    }

    (temp, root)
}

fn open_store(root: &Path) -> WikiData {
    let config = StoreConfig::builder()
        .index_path(root.join("index").to_string_lossy())
        .shard_root(root)
        .build();
    WikiData::open(config).unwrap()
}

const PYTHON: &str = r#"{"title": "Python", "text": "Python is a language.", "url": "https://en.wikipedia.org/wiki/Python", "links": ["Machine Learning"]}"#;
const ML: &str = r#"{"title": "Machine Learning", "text": "ML.", "url": "https://en.wikipedia.org/wiki/Machine_Learning", "links": ["Python", "Statistics#History"]}"#;

// =============================================================================
// Lookups
// =============================================================================

#[test]
fn test_get_page_with_case_fallback() {
    let (_temp, root) = setup_corpus(&[("Python", "shardA")], &[("shardA", PYTHON)]);
    let store = open_store(&root);

    let page = store.get_page("python").unwrap();

    assert_eq!(page.title, "Python");
    assert_eq!(page.links, vec!["Machine Learning"]);
    assert_eq!(page.url, "https://en.wikipedia.org/wiki/Python");
    assert_eq!(page.content, "Python is a language.");
}

#[test]
fn test_locate_returns_stored_location() {
    let (_temp, root) = setup_corpus(&[("Python", "../shards/a.jsonl")], &[]);
    let config = StoreConfig::builder()
        .index_path(root.join("index").to_string_lossy())
        .path_transformer(PathTransformer::collapse_parent_dirs())
        .build();
    let store = WikiData::open(config).unwrap();

    // The transformer applies to reads, not to locate()
    let resolution = store.locate("PYTHON").unwrap();
    assert_eq!(resolution.location, "../shards/a.jsonl");
    assert_eq!(resolution.matched_title, "Python");
}

#[test]
fn test_shared_shard_holds_many_articles() {
    let shard = format!("{}\n{}\n", PYTHON, ML);
    let (_temp, root) = setup_corpus(
        &[("Python", "shards/s0.jsonl"), ("Machine Learning", "shards/s0.jsonl")],
        &[("shards/s0.jsonl", shard.as_str())],
    );
    let store = open_store(&root);

    assert_eq!(store.get_page("Python").unwrap().title, "Python");
    let ml = store.get_page("machine learning").unwrap();
    assert_eq!(ml.title, "Machine Learning");
    assert_eq!(ml.links, vec!["Python", "Statistics"]);
}

#[test]
fn test_path_transformer_collapses_parent_dirs() {
    let (_temp, root) = setup_corpus(
        &[("Python", "../shards/a.jsonl")],
        &[("shards/a.jsonl", PYTHON)],
    );
    let config = StoreConfig::builder()
        .index_path(root.join("index").to_string_lossy())
        .shard_root(&root)
        .path_transformer(PathTransformer::collapse_parent_dirs())
        .build();
    let store = WikiData::open(config).unwrap();

    assert_eq!(store.get_page("Python").unwrap().title, "Python");
}

#[test]
fn test_custom_transformer() {
    let (_temp, root) = setup_corpus(&[("Python", "A")], &[("shards/A.jsonl", PYTHON)]);
    let config = StoreConfig::builder()
        .index_path(root.join("index").to_string_lossy())
        .shard_root(&root)
        .path_transformer(PathTransformer::from_fn(|loc| format!("shards/{}.jsonl", loc)))
        .build();
    let store = WikiData::open(config).unwrap();

    assert_eq!(store.get_page("Python").unwrap().title, "Python");
}

#[test]
fn test_absolute_location_ignores_shard_root() {
    let shard_dir = TempDir::new().unwrap();
    let shard_path = shard_dir.path().join("abs.jsonl");
    fs::write(&shard_path, PYTHON).unwrap();

    let (_temp, root) = setup_corpus(&[("Python", shard_path.to_str().unwrap())], &[]);
    let store = open_store(&root);

    assert_eq!(store.get_page("Python").unwrap().title, "Python");
}

// =============================================================================
// Error Kinds
// =============================================================================

#[test]
fn test_unknown_title_not_found() {
    let (_temp, root) = setup_corpus(&[("Python", "shardA")], &[("shardA", PYTHON)]);
    let store = open_store(&root);

    let err = store.get_page("Haskell").unwrap_err();
    assert!(matches!(err, WikiError::ArticleNotFound(_)));
    assert!(err.is_retryable());
}

#[test]
fn test_empty_title_not_found() {
    let (_temp, root) = setup_corpus(&[("Python", "shardA")], &[("shardA", PYTHON)]);
    let store = open_store(&root);

    assert!(store.get_page("").unwrap_err().is_not_found());
}

#[test]
fn test_indexed_but_missing_from_shard() {
    let (_temp, root) = setup_corpus(&[("Rust", "shardA")], &[("shardA", PYTHON)]);
    let store = open_store(&root);

    assert!(matches!(
        store.get_page("Rust"),
        Err(WikiError::ArticleNotFound(_))
    ));
}

#[test]
fn test_malformed_shard_is_parse_error() {
    let (_temp, root) = setup_corpus(&[("Python", "shardA")], &[("shardA", "{oops")]);
    let store = open_store(&root);

    let err = store.get_page("Python").unwrap_err();
    assert!(matches!(err, WikiError::Parse(_)));
    assert!(!err.is_not_found());
}

#[test]
fn test_missing_field_is_not_defaulted() {
    let record = r#"{"title": "Python", "text": "t", "links": []}"#;
    let (_temp, root) = setup_corpus(&[("Python", "shardA")], &[("shardA", record)]);
    let store = open_store(&root);

    let err = store.get_page("Python").unwrap_err();
    assert!(matches!(err, WikiError::MalformedRecord(_)));
    assert!(!err.is_not_found());
}

#[test]
fn test_missing_shard_file_is_runtime_error() {
    let (_temp, root) = setup_corpus(&[("Python", "nowhere.jsonl")], &[]);
    let store = open_store(&root);

    assert!(matches!(store.get_page("Python"), Err(WikiError::Runtime(_))));
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_open_missing_index() {
    let temp = TempDir::new().unwrap();

    let result = WikiData::open_path(temp.path().join("nope"));
    assert!(matches!(result, Err(WikiError::StoreOpen(_))));
}

#[test]
fn test_local_store_accessors() {
    let (_temp, root) = setup_corpus(&[("A", "x"), ("B", "y")], &[]);
    let store = WikiData::open_path(root.join("index")).unwrap();

    assert!(!store.is_remote());
    assert!(store.cache_dir().is_none());
    assert_eq!(store.entry_count(), 2);
    store.close().unwrap();

    // Closing does not touch a local index
    assert!(root.join("index").join("data.idx").exists());
}

#[test]
fn test_local_path_with_provider_ignores_provider() {
    let (_temp, root) = setup_corpus(&[("Python", "shardA")], &[("shardA", PYTHON)]);
    let config = StoreConfig::builder()
        .index_path(root.join("index").to_string_lossy())
        .shard_root(&root)
        .build();

    let store =
        WikiData::open_with_provider(config, Arc::new(wikirace::remote::StaticProvider::new()))
            .unwrap();
    assert!(!store.is_remote());
    assert_eq!(store.get_page("Python").unwrap().title, "Python");
}

#[test]
fn test_concurrent_get_page() {
    let shard = format!("{}\n{}\n", PYTHON, ML);
    let (_temp, root) = setup_corpus(
        &[("Python", "s.jsonl"), ("Machine Learning", "s.jsonl")],
        &[("s.jsonl", shard.as_str())],
    );
    let store = Arc::new(open_store(&root));

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let title = if i % 2 == 0 { "python" } else { "machine learning" };
                for _ in 0..20 {
                    store.get_page(title).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
