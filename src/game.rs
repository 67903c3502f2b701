//! Game Runner
//!
//! Plays one round of the Wikipedia game: starting from one article, follow
//! links chosen by a [`LinkChooser`] until the goal article is reached or the
//! step budget runs out.

use tracing::{debug, info};

use crate::error::{Result, WikiError};
use crate::page::Page;
use crate::store::WikiData;

/// Picks the next link to follow from the current page.
pub trait LinkChooser {
    fn choose(&mut self, page: &Page, goal: &str) -> Result<String>;
}

impl<F> LinkChooser for F
where
    F: FnMut(&Page, &str) -> Result<String>,
{
    fn choose(&mut self, page: &Page, goal: &str) -> Result<String> {
        self(page, goal)
    }
}

/// Round settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOptions {
    /// Links followed before giving up
    pub max_steps: usize,
    /// Jump straight to the goal when it is linked from the current page
    pub ctrl_f: bool,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            max_steps: 10,
            ctrl_f: false,
        }
    }
}

/// Result of one round
///
/// `path` is the full route, not just the history before the last move:
/// the goal page is its final element whenever `reached` is true. A round
/// whose start already matches the goal takes no steps and consults no
/// chooser, so its path is the start page alone.
#[derive(Debug, Clone)]
pub struct GameOutcome {
    pub path: Vec<Page>,
    pub reached: bool,
}

impl GameOutcome {
    /// Links followed
    pub fn steps(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    pub fn titles(&self) -> Vec<&str> {
        self.path.iter().map(|page| page.title.as_str()).collect()
    }
}

/// Move one link forward from `current`.
///
/// A blank choice is treated as a missing article.
pub fn next_article<C>(
    current: &Page,
    goal: &str,
    chooser: &mut C,
    store: &WikiData,
    ctrl_f: bool,
) -> Result<Page>
where
    C: LinkChooser + ?Sized,
{
    if ctrl_f && current.links_to(goal) {
        debug!(from = %current.title, goal, "Goal linked from current page");
        return store.get_page(goal);
    }

    let choice = chooser.choose(current, goal)?;
    if choice.trim().is_empty() {
        return Err(WikiError::ArticleNotFound(format!(
            "empty link chosen on {:?}",
            current.title
        )));
    }
    store.get_page(&choice)
}

/// Play from `start` toward `goal`.
///
/// Lookup failures end the round with an error; running out of steps does
/// not (the outcome reports `reached = false`).
pub fn run_game<C>(
    start: &str,
    goal: &str,
    chooser: &mut C,
    store: &WikiData,
    options: GameOptions,
) -> Result<GameOutcome>
where
    C: LinkChooser + ?Sized,
{
    let mut current = store.get_page(start)?;
    let mut path = Vec::with_capacity(options.max_steps + 1);
    let mut reached = current.title == goal;
    path.push(current.clone());

    for step in 1..=options.max_steps {
        if reached {
            break;
        }
        current = next_article(&current, goal, chooser, store, options.ctrl_f)?;
        info!(step, title = %current.title, "Visited article");
        reached = current.title == goal;
        path.push(current.clone());
    }

    if reached {
        info!(start, goal, steps = path.len() - 1, "Reached goal");
    } else {
        info!(start, goal, max_steps = options.max_steps, "Step budget exhausted");
    }
    Ok(GameOutcome { path, reached })
}
