//! Interactive selection of series and episodes
//!
//! Selection is abstracted behind the [`Selector`] trait. The resolver hands
//! over display labels and gets indices back, so the URL behind a label never
//! has to be parsed out of the label text.

use dialoguer::theme::ColorfulTheme;
use dialoguer::{MultiSelect, Select};
use thiserror::Error;
use tracing::warn;

/// Default number of rows shown per page.
pub const DEFAULT_PAGE_SIZE: usize = 8;

/// Longest label shown in full; longer labels are cut with an ellipsis.
const MAX_LABEL_CHARS: usize = 110;

/// Errors that can occur while asking the user to choose
#[derive(Debug, Error)]
pub enum SelectionError {
    /// The terminal interaction failed
    #[error("Terminal interaction failed: {0}")]
    Terminal(#[from] dialoguer::Error),
}

/// Presents labelled choices and returns what the user picked.
pub trait Selector {
    /// Single choice; `None` when the user cancels.
    fn select(&mut self, prompt: &str, labels: &[String]) -> Result<Option<usize>, SelectionError>;

    /// Multiple choice of at least `min_count` items; empty when the user cancels.
    fn select_multiple(
        &mut self,
        prompt: &str,
        labels: &[String],
        min_count: usize,
    ) -> Result<Vec<usize>, SelectionError>;
}

/// Display-only cleanup of a label.
///
/// Underscores become spaces, runs of whitespace collapse to one space and
/// overly long labels are shortened.
pub fn prettify(label: &str) -> String {
    let flat = label
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if flat.chars().count() <= MAX_LABEL_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(MAX_LABEL_CHARS - 1).collect();
    format!("{}…", cut.trim_end())
}

/// [`Selector`] that renders paginated menus in the terminal.
pub struct DialoguerSelector {
    theme: ColorfulTheme,
    page_size: usize,
}

impl DialoguerSelector {
    pub fn new(page_size: usize) -> Self {
        Self {
            theme: ColorfulTheme::default(),
            page_size: page_size.max(1),
        }
    }
}

impl Default for DialoguerSelector {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Selector for DialoguerSelector {
    fn select(&mut self, prompt: &str, labels: &[String]) -> Result<Option<usize>, SelectionError> {
        if labels.is_empty() {
            return Ok(None);
        }
        let items: Vec<String> = labels.iter().map(|l| prettify(l)).collect();

        let choice = Select::with_theme(&self.theme)
            .with_prompt(format!("{} (Esc to cancel)", prompt))
            .items(&items)
            .default(0)
            .max_length(self.page_size)
            .interact_opt()?;
        Ok(choice)
    }

    fn select_multiple(
        &mut self,
        prompt: &str,
        labels: &[String],
        min_count: usize,
    ) -> Result<Vec<usize>, SelectionError> {
        if labels.is_empty() {
            return Ok(Vec::new());
        }
        let items: Vec<String> = labels.iter().map(|l| prettify(l)).collect();

        let mut too_few = false;
        loop {
            let chosen = MultiSelect::with_theme(&self.theme)
                .with_prompt(multi_select_prompt(prompt, min_count, too_few))
                .items(&items)
                .max_length(self.page_size)
                .interact_opt()?;

            match chosen {
                None => return Ok(Vec::new()),
                Some(chosen) if chosen.len() >= min_count => return Ok(chosen),
                Some(chosen) => {
                    warn!(chosen = chosen.len(), min_count, "too few items selected, asking again");
                    too_few = true;
                }
            }
        }
    }
}

/// Prompt for a multi-select; after a too-short selection it names the minimum.
fn multi_select_prompt(prompt: &str, min_count: usize, too_few: bool) -> String {
    let help = "Space to toggle, Enter to confirm, Esc to cancel";
    if too_few {
        format!("{} (select at least {}; {})", prompt, min_count, help)
    } else {
        format!("{} ({})", prompt, help)
    }
}
