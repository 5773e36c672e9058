use super::{Outcome, ProgressEvent, ResolveError, Resolver, RunContext, Stage};
use crate::catalog::{Episode, FinalEntry, final_episode_list};
use tracing::{info, warn};

impl Resolver<'_> {
    /// Sorts the episodes, asks which to download and dispatches them in the
    /// order they were chosen.
    ///
    /// A single episode is dispatched without asking.
    pub(super) fn final_selection_stage(
        &mut self,
        series: &str,
        episodes: Vec<Episode>,
        context: &RunContext,
    ) -> Result<Outcome, ResolveError> {
        if episodes.is_empty() {
            let reason = format!("no episodes found for {}", series);
            self.emit(ProgressEvent::NoValidData {
                stage: Stage::FinalSelection,
                reason: reason.clone(),
            });
            return Ok(Outcome::Aborted {
                stage: Stage::FinalSelection,
                reason,
            });
        }

        let entries = final_episode_list(series, &episodes);
        self.emit(ProgressEvent::EpisodesCollected {
            series: series.to_string(),
            count: entries.len(),
        });

        let chosen: Vec<&FinalEntry> = if entries.len() == 1 {
            info!(series, "single episode, skipping selection");
            entries.iter().collect()
        } else {
            let labels: Vec<String> = entries.iter().map(|e| e.label.clone()).collect();
            let picked = self
                .selector
                .select_multiple("Select episodes to download", &labels, 1)?;
            picked.iter().filter_map(|&i| entries.get(i)).collect()
        };

        if chosen.is_empty() {
            self.emit(ProgressEvent::NothingSelected);
            return Ok(Outcome::Cancelled);
        }

        let mut urls = Vec::with_capacity(chosen.len());
        for entry in chosen {
            match &entry.url {
                Some(url) => urls.push(url.clone()),
                None => {
                    warn!(label = %entry.label, "no URL resolved, skipping");
                    self.emit(ProgressEvent::MissingUrl {
                        label: entry.label.clone(),
                    });
                }
            }
        }

        Ok(self.dispatch(&urls, context))
    }
}
