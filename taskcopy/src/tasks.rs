//! Fetching the resolved tasks that are candidates for copying.

use taskcopy_proto::form::{FormValue, Params};
use taskcopy_proto::records::{Phid, SearchPage, Task};

use crate::conduit::{ConduitClient, ConduitError, MANIPHEST_SEARCH};
use crate::transport::Transport;

/// Status keyword of the tasks that get copied.
pub const RESOLVED: &str = "resolved";

impl<T: Transport> ConduitClient<T> {
    /// All resolved tasks tagged with both `source` and `tag`, in the order
    /// the API returns them. Only the first result page is read.
    ///
    /// # Errors
    ///
    /// Returns [`ConduitError`] if the search call fails.
    pub async fn fetch_tasks(&self, source: &Phid, tag: &Phid) -> Result<Vec<Task>, ConduitError> {
        let params = Params::new()
            .with(
                "constraints",
                FormValue::map([
                    (
                        "projects",
                        FormValue::list([source.as_str(), tag.as_str()]),
                    ),
                    ("statuses", FormValue::list([RESOLVED])),
                ]),
            )
            .with("attachments", FormValue::map([("projects", "1")]));

        let page: SearchPage<Task> = self.call(MANIPHEST_SEARCH, &params).await?;
        tracing::info!(%source, %tag, count = page.data.len(), "fetched resolved tasks");
        Ok(page.data)
    }
}
