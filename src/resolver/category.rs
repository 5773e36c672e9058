use super::{
    Mode, Outcome, ProgressEvent, ResolveError, ResolveRequest, Resolver, RunContext, Stage,
    greedy_search_term, report_skip,
};
use crate::catalog::ContentKind;
use crate::services::StageError;
use tracing::info;
use url::Url;

impl Resolver<'_> {
    /// Browses a category listing and follows the picked item.
    ///
    /// Movies are downloaded directly, sport clips are dispatched as they are
    /// and shows are searched for by their series slug.
    pub(super) fn category_stage(
        &mut self,
        listing: &Url,
        category: Option<&str>,
        context: &RunContext,
    ) -> Result<Outcome, ResolveError> {
        info!(listing = %listing, category, "browsing category");

        let browsed = self
            .service
            .browse(listing, &mut report_skip(&mut *self.progress));
        let items = match browsed {
            Ok(items) if items.is_empty() => {
                let error = StageError::Parse(format!("nothing playable listed at {}", listing));
                return Ok(self.abort(Stage::Category, error));
            }
            Ok(items) => items,
            Err(e) => return Ok(self.abort(Stage::Category, e)),
        };

        let labels: Vec<String> = items
            .iter()
            .map(|item| format!("{} - {}", item.title, item.synopsis))
            .collect();
        let prompt = match category {
            Some(name) => format!("Select from {}", name),
            None => "Select an item".to_string(),
        };

        let Some(item) = self
            .selector
            .select(&prompt, &labels)?
            .and_then(|choice| items.get(choice))
        else {
            self.emit(ProgressEvent::NothingSelected);
            return Ok(Outcome::Cancelled);
        };

        match item.kind {
            ContentKind::Movie => {
                let request = ResolveRequest::new(Mode::Direct, item.url.as_str());
                self.resolve_inner(&request, context)
            }
            ContentKind::SportVideo => Ok(self.dispatch(&[item.url.clone()], context)),
            _ => match greedy_search_term(&item.url) {
                Some(query) => {
                    let request = ResolveRequest::new(Mode::Keyword, query);
                    self.resolve_inner(&request, context)
                }
                None => {
                    let error = StageError::Parse(format!("no series in URL {}", item.url));
                    Ok(self.abort(Stage::Category, error))
                }
            },
        }
    }
}
