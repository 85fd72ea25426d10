//! Paginated enumeration of servers known to the discovery server.
//!
//! # Notes on usage
//!
//! The query does not spawn any internal tasks, it is driven entirely by a
//! `Stream` that needs to be consumed to make progress. Each page is fetched
//! with a single `QueryServers` call; the continuation state, the record id
//! to start the next page at and the last observed index reset time, lives
//! on the client side.
//!
//! The stream is forward-only and finite: it ends the first time the server
//! returns an empty page. It is not restartable; to enumerate again, build a
//! new query. Stopping early is fine and requires no cleanup, the server
//! keeps no state between pages.
//!
//! Entries are only meaningful within the index epoch they were read in. If
//! the server rebuilds its index while an enumeration is running, record ids
//! already handed out no longer line up with the server's, and continuing
//! could silently skip or duplicate servers. The stream detects this from
//! the reset time the server reports with every page and fails with
//! [`GdsError::EnumerationInvalidated`] instead.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use futures::Stream;

use opcua_types::{TryFromVariant, Variant, VariantScalarTypeId};

use crate::{client::output_arg, ids, GdsClient, GdsError};

pub use opcua_types::ServerOnNetwork;

/// Continuation state of one enumeration in progress. Never shared: record
/// ids advance monotonically per enumeration and are invalidated by a reset.
#[derive(Debug, Clone, Default)]
struct QueryCursor {
    last_reset_time: Option<DateTime<Utc>>,
    starting_record_id: u32,
}

impl QueryCursor {
    /// Fold one returned page into the cursor, enforcing the reset-time
    /// invariant. `reset_time` is the epoch timestamp the server reported
    /// with the page.
    fn apply_page(
        &mut self,
        reset_time: opcua_types::DateTime,
        entries: &[ServerOnNetwork],
    ) -> Result<(), GdsError> {
        let observed = (reset_time != opcua_types::DateTime::null())
            .then(|| reset_time.as_chrono());
        if let (Some(previous), Some(observed)) = (self.last_reset_time, observed) {
            if observed > previous {
                return Err(GdsError::EnumerationInvalidated { previous, observed });
            }
        }
        // Establish the baseline on the first page as well.
        if observed.is_some() {
            self.last_reset_time = observed;
        }
        if let Some(last) = entries.last() {
            self.starting_record_id = last.record_id + 1;
        }
        Ok(())
    }
}

/// A query for servers on the network, built with
/// [`GdsClient::query_servers`].
///
/// All filters are optional; an unset filter matches everything. Capability
/// filters are conjunctive: a server must carry every listed capability.
pub struct ServerQuery<'a> {
    client: &'a GdsClient,
    max_records_per_page: u32,
    application_name: String,
    application_uri: String,
    product_uri: String,
    server_capabilities: Vec<String>,
}

impl<'a> ServerQuery<'a> {
    pub(crate) fn new(client: &'a GdsClient) -> Self {
        Self {
            client,
            max_records_per_page: client.config.query_page_size,
            application_name: String::new(),
            application_uri: String::new(),
            product_uri: String::new(),
            server_capabilities: Vec::new(),
        }
    }

    /// Override the configured page size for this query.
    pub fn max_records_per_page(mut self, max_records_per_page: u32) -> Self {
        self.max_records_per_page = max_records_per_page;
        self
    }

    /// Only return servers whose application name matches the pattern.
    pub fn application_name(mut self, application_name: impl Into<String>) -> Self {
        self.application_name = application_name.into();
        self
    }

    /// Only return servers whose application URI matches the pattern.
    pub fn application_uri(mut self, application_uri: impl Into<String>) -> Self {
        self.application_uri = application_uri.into();
        self
    }

    /// Only return servers whose product URI matches the pattern.
    pub fn product_uri(mut self, product_uri: impl Into<String>) -> Self {
        self.product_uri = product_uri.into();
        self
    }

    /// Require a server capability identifier, e.g. "LDS" or "DA". May be
    /// called repeatedly to require several.
    pub fn server_capability(mut self, capability: impl Into<String>) -> Self {
        self.server_capabilities.push(capability.into());
        self
    }

    /// Start the query, returning a stream of matching servers in record id
    /// order. To stop enumerating you can simply stop polling the stream.
    pub fn run(self) -> impl Stream<Item = Result<ServerOnNetwork, GdsError>> + 'a {
        let state = QueryExecution {
            query: self,
            cursor: QueryCursor::default(),
            buffered: VecDeque::new(),
            finished: false,
        };
        futures::stream::try_unfold(state, |mut s| async move {
            loop {
                if let Some(entry) = s.buffered.pop_front() {
                    return Ok(Some((entry, s)));
                }
                if s.finished {
                    return Ok(None);
                }
                let page = s.query.fetch_page(&mut s.cursor).await?;
                if page.is_empty() {
                    s.finished = true;
                } else {
                    s.buffered.extend(page);
                }
            }
        })
    }

    /// Run the query to completion, collecting every matching server.
    pub async fn run_into_result(self) -> Result<Vec<ServerOnNetwork>, GdsError> {
        use futures::TryStreamExt;
        self.run().try_collect().await
    }

    /// Fetch the next page and advance the cursor past it.
    async fn fetch_page(&self, cursor: &mut QueryCursor) -> Result<Vec<ServerOnNetwork>, GdsError> {
        const METHOD: &str = "QueryServers";
        let capabilities: Vec<Variant> = self
            .server_capabilities
            .iter()
            .map(|c| c.as_str().into())
            .collect();
        let outputs = self
            .client
            .call_directory(
                ids::methods::DIRECTORY_QUERY_SERVERS,
                vec![
                    cursor.starting_record_id.into(),
                    self.max_records_per_page.into(),
                    self.application_name.as_str().into(),
                    self.application_uri.as_str().into(),
                    self.product_uri.as_str().into(),
                    Variant::from((VariantScalarTypeId::String, capabilities)),
                ],
            )
            .await?;
        let mut outputs = outputs.into_iter();
        let reset_time: opcua_types::DateTime = output_arg(&mut outputs, METHOD)?;
        let entries = match outputs.next() {
            None => Vec::new(),
            Some(variant) => Option::<Vec<ServerOnNetwork>>::try_from_variant(variant)
                .map(Option::unwrap_or_default)
                .map_err(|e| GdsError::unexpected(METHOD, e))?,
        };
        cursor.apply_page(reset_time, &entries)?;
        Ok(entries)
    }
}

struct QueryExecution<'a> {
    query: ServerQuery<'a>,
    cursor: QueryCursor,
    buffered: VecDeque<ServerOnNetwork>,
    finished: bool,
}
