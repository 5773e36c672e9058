use super::{Outcome, ResolveError, Resolver, RunContext, Stage, report_skip};
use crate::services::{Expansion, ExpansionTarget};
use tracing::info;

impl Resolver<'_> {
    /// Lists the episodes of the chosen series and moves on to final selection.
    pub(super) fn expansion_stage(
        &mut self,
        target: &ExpansionTarget,
        context: &RunContext,
    ) -> Result<Outcome, ResolveError> {
        let expanded = self.service.expand(
            target,
            &mut self.catalog,
            &mut report_skip(&mut *self.progress),
        );

        match expanded {
            Err(e) => Ok(self.abort(Stage::Expansion, e)),
            Ok(Expansion::Direct(url)) => {
                info!(url = %url, "single title, downloading directly");
                Ok(self.dispatch(&[url], context))
            }
            Ok(Expansion::Catalogued(series)) => {
                let episodes = self.catalog.episodes(&series).to_vec();
                self.final_selection_stage(&series, episodes, context)
            }
            Ok(Expansion::Listed { series, episodes }) => {
                self.final_selection_stage(&series, episodes, context)
            }
        }
    }
}
