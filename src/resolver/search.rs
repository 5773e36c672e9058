use super::{Outcome, ProgressEvent, ResolveError, Resolver, RunContext, Stage, report_skip};
use crate::services::ExpansionTarget;
use tracing::{debug, info};

impl Resolver<'_> {
    /// Searches the service and lets the user pick one of the series found.
    pub(super) fn search_stage(
        &mut self,
        query: &str,
        context: &RunContext,
    ) -> Result<Outcome, ResolveError> {
        self.emit(ProgressEvent::Searching {
            service: self.service.name().to_string(),
            query: query.to_string(),
        });

        let searched = self.service.search(
            query,
            &mut self.catalog,
            &mut report_skip(&mut *self.progress),
        );
        if let Err(e) = searched {
            return Ok(self.abort(Stage::Search, e));
        }

        if self.catalog.is_empty() {
            info!(query, "search returned no usable records");
            self.emit(ProgressEvent::NoMatches {
                query: query.to_string(),
            });
            return Ok(Outcome::NoMatches);
        }

        let names: Vec<String> = self
            .catalog
            .series_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        debug!(query, series = names.len(), "series collected");
        self.emit(ProgressEvent::SeriesFound { count: names.len() });

        let Some(choice) = self.selector.select("Select a series", &names)? else {
            self.emit(ProgressEvent::NothingSelected);
            return Ok(Outcome::Cancelled);
        };
        let Some(name) = names.get(choice) else {
            self.emit(ProgressEvent::NothingSelected);
            return Ok(Outcome::Cancelled);
        };

        info!(series = %name, "series selected");
        self.expansion_stage(&ExpansionTarget::from_choice(name), context)
    }
}
