//! Tests for the game runner
//!
//! These tests verify:
//! - Paths include the start and (when reached) the goal
//! - The ctrl_f shortcut skips the chooser
//! - Step budget and lookup failures

use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use wikirace::game::next_article;
use wikirace::index::IndexBuilder;
use wikirace::{run_game, GameOptions, LinkChooser, Page, WikiData, WikiError};

// =============================================================================
// Helper Functions
// =============================================================================

/// A → B → C → D, plus A links to D directly
fn setup_store() -> (TempDir, WikiData) {
    let temp = TempDir::new().unwrap();
    let root: PathBuf = temp.path().to_path_buf();

    let records = [
        r#"{"title": "A", "text": "a", "url": "/wiki/A", "links": ["B", "D"]}"#,
        r#"{"title": "B", "text": "b", "url": "/wiki/B", "links": ["C"]}"#,
        r#"{"title": "C", "text": "c", "url": "/wiki/C", "links": ["D"]}"#,
        r#"{"title": "D", "text": "d", "url": "/wiki/D", "links": ["A"]}"#,
    ];
    let shard = root.join("shard.jsonl");
    fs::write(&shard, records.join("\n")).unwrap();

    let mut builder = IndexBuilder::new(&root.join("index")).unwrap();
    for title in ["A", "B", "C", "D"] {
        builder
            .add(title.as_bytes(), shard.to_string_lossy().as_bytes())
            .unwrap();
    }
    builder.finish().unwrap();

    let store = WikiData::open_path(root.join("index")).unwrap();
    (temp, store)
}

/// Replays a fixed list of choices and counts calls
struct Scripted {
    choices: VecDeque<&'static str>,
    calls: usize,
}

impl Scripted {
    fn new(choices: &[&'static str]) -> Self {
        Self {
            choices: choices.iter().copied().collect(),
            calls: 0,
        }
    }
}

impl LinkChooser for Scripted {
    fn choose(&mut self, _page: &Page, _goal: &str) -> wikirace::Result<String> {
        self.calls += 1;
        Ok(self.choices.pop_front().unwrap_or("").to_string())
    }
}

// =============================================================================
// run_game
// =============================================================================

#[test]
fn test_reaches_goal() {
    let (_temp, store) = setup_store();
    let mut chooser = Scripted::new(&["B", "C", "D"]);

    let outcome = run_game("A", "D", &mut chooser, &store, GameOptions::default()).unwrap();

    assert!(outcome.reached);
    assert_eq!(outcome.titles(), vec!["A", "B", "C", "D"]);
    assert_eq!(outcome.steps(), 3);
    assert_eq!(chooser.calls, 3);
}

#[test]
fn test_ctrl_f_jumps_to_goal() {
    let (_temp, store) = setup_store();
    let mut chooser = Scripted::new(&["B"]);
    let options = GameOptions {
        ctrl_f: true,
        ..GameOptions::default()
    };

    let outcome = run_game("A", "D", &mut chooser, &store, options).unwrap();

    assert!(outcome.reached);
    assert_eq!(outcome.titles(), vec!["A", "D"]);
    assert_eq!(chooser.calls, 0);
}

#[test]
fn test_step_budget_exhausted() {
    let (_temp, store) = setup_store();
    let mut chooser = Scripted::new(&["B", "C", "D"]);
    let options = GameOptions {
        max_steps: 2,
        ctrl_f: false,
    };

    let outcome = run_game("A", "D", &mut chooser, &store, options).unwrap();

    assert!(!outcome.reached);
    assert_eq!(outcome.titles(), vec!["A", "B", "C"]);
}

#[test]
fn test_goal_on_last_allowed_step_counts() {
    let (_temp, store) = setup_store();
    let mut chooser = Scripted::new(&["B", "C", "D"]);
    let options = GameOptions {
        max_steps: 3,
        ctrl_f: false,
    };

    let outcome = run_game("A", "D", &mut chooser, &store, options).unwrap();

    assert!(outcome.reached);
    assert_eq!(outcome.path.last().map(|p| p.title.as_str()), Some("D"));
    assert_eq!(outcome.steps(), 3);
}

#[test]
fn test_start_is_goal() {
    let (_temp, store) = setup_store();
    let mut chooser = Scripted::new(&[]);

    let outcome = run_game("A", "A", &mut chooser, &store, GameOptions::default()).unwrap();

    assert!(outcome.reached);
    assert_eq!(outcome.titles(), vec!["A"]);
    assert_eq!(chooser.calls, 0);
}

#[test]
fn test_closure_chooser_with_fallback_casing() {
    let (_temp, store) = setup_store();
    // Always pick the first link, lower-cased; resolution restores the casing
    let mut chooser = |page: &Page, _goal: &str| -> wikirace::Result<String> {
        Ok(page.links[0].to_lowercase())
    };

    let outcome = run_game("a", "D", &mut chooser, &store, GameOptions::default()).unwrap();

    assert!(outcome.reached);
    assert_eq!(outcome.titles(), vec!["A", "B", "C", "D"]);
}

#[test]
fn test_unknown_start_fails() {
    let (_temp, store) = setup_store();
    let mut chooser = Scripted::new(&[]);

    let result = run_game("Z", "D", &mut chooser, &store, GameOptions::default());
    assert!(matches!(result, Err(WikiError::ArticleNotFound(_))));
}

#[test]
fn test_chooser_error_ends_round() {
    let (_temp, store) = setup_store();
    let mut chooser = |_: &Page, _: &str| -> wikirace::Result<String> {
        Err(WikiError::Runtime("model unavailable".into()))
    };

    let result = run_game("A", "D", &mut chooser, &store, GameOptions::default());
    assert!(matches!(result, Err(WikiError::Runtime(_))));
}

// =============================================================================
// next_article
// =============================================================================

#[test]
fn test_blank_choice_is_not_found() {
    let (_temp, store) = setup_store();
    let start = store.get_page("A").unwrap();

    for blank in ["", "   ", "\n"] {
        let mut chooser = |_: &Page, _: &str| -> wikirace::Result<String> { Ok(blank.to_string()) };
        let result = next_article(&start, "D", &mut chooser, &store, false);
        assert!(matches!(result, Err(WikiError::ArticleNotFound(_))));
    }
}

#[test]
fn test_unknown_choice_is_not_found() {
    let (_temp, store) = setup_store();
    let start = store.get_page("A").unwrap();
    let mut chooser = Scripted::new(&["Nowhere"]);

    let err = next_article(&start, "D", &mut chooser, &store, false).unwrap_err();
    assert!(err.is_retryable());
}

#[test]
fn test_ctrl_f_ignored_when_goal_not_linked() {
    let (_temp, store) = setup_store();
    let b = store.get_page("B").unwrap();
    let mut chooser = Scripted::new(&["C"]);

    let next = next_article(&b, "D", &mut chooser, &store, true).unwrap();

    assert_eq!(next.title, "C");
    assert_eq!(chooser.calls, 1);
}

#[test]
fn test_dyn_chooser() {
    let (_temp, store) = setup_store();
    let start = store.get_page("A").unwrap();
    let mut scripted = Scripted::new(&["B"]);
    let chooser: &mut dyn LinkChooser = &mut scripted;

    let next = next_article(&start, "D", chooser, &store, false).unwrap();
    assert_eq!(next.title, "B");
}
