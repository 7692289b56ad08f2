//! Incremental retrieval of remote collections.
//!
//! A [`DataFactory`] owns the buffer of one list view (agents, rules,
//! decoders, CDB files...). Each fetch asks the remote API for one page using
//! the active filters and sort, stores the page at its offset and pads the
//! buffer with placeholders (`None`) up to the total the server reported, so
//! pagination math over the buffer is correct before every page is loaded.
//!
//! ## Request generations
//!
//! Fetches are asynchronous and may complete out of order. Every fetch from
//! offset zero starts a new generation and clears the buffer immediately; a
//! completed page is applied only if it belongs to the current generation.
//! Pages of an older query are dropped silently, so a slow response can never
//! overwrite the results of the query that replaced it.
//!
//! ```rust,no_run
//! # async fn run(transport: &dyn wz_table::transport::Transport) -> Result<(), wz_table::error::FetchError> {
//! use wz_table::fetcher::{DataFactory, FetchOptions};
//!
//! let mut agents = DataFactory::agents();
//! agents.add_filter("status", Some("Active"));
//! agents.add_sorting("name");
//!
//! let first = agents.fetch(transport, FetchOptions::first_page(100)).await?;
//! println!("{} rows ({} loaded) in {:?}", first.items.len(), agents.loaded(), first.elapsed);
//! # Ok(())
//! # }
//! ```
//!
//! Inside a bubbletea program use [`DataFactory::fetch_cmd`] and forward
//! messages to [`DataFactory::update`] instead.

mod filters;

pub use filters::{Filter, FilterSet, Sort};

use crate::error::FetchError;
use crate::transport::{ApiEnvelope, ListData, QueryParams, Transport};
use bubbletea_rs::{Cmd, Msg};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Page size used when the caller does not give one.
pub const DEFAULT_LIMIT: usize = 500;

/// Id of the manager's own pseudo-agent record.
pub const MANAGER_AGENT_ID: &str = "000";

static LAST_ID: AtomicU64 = AtomicU64::new(0);

fn next_id() -> u64 {
    LAST_ID.fetch_add(1, Ordering::SeqCst) + 1
}

/// Predicate removing records from the assembled buffer.
pub type Exclusion<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// True for the manager pseudo-agent, which the agents view hides.
pub fn is_manager_agent(record: &Value) -> bool {
    record.get("id").and_then(Value::as_str) == Some(MANAGER_AGENT_ID)
}

/// Where a fetch starts and how many records it asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetchOptions {
    /// First record to fetch. Zero starts a new query.
    pub offset: usize,
    /// Page size; [`DEFAULT_LIMIT`] when `None`.
    pub limit: Option<usize>,
}

impl FetchOptions {
    /// A new query returning the first `limit` records.
    pub fn first_page(limit: usize) -> Self {
        Self {
            offset: 0,
            limit: Some(limit),
        }
    }

    /// The page of `limit` records starting at `offset`.
    pub fn page(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            limit: Some(limit),
        }
    }
}

/// A fetch that has been issued but not yet sent.
///
/// It holds no reference to its [`DataFactory`], so it can be sent from a
/// spawned task while the factory keeps handling events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Id of the issuing factory.
    pub fetcher_id: u64,
    /// Generation the request belongs to.
    pub generation: u64,
    /// Collection path.
    pub path: String,
    /// First record requested.
    pub offset: usize,
    /// Page size.
    pub limit: usize,
    /// Full query: limit, offset, sort, filters.
    pub params: QueryParams,
}

/// A page returned by the remote API, tagged with the request that asked for it.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage<T> {
    /// Id of the issuing factory.
    pub fetcher_id: u64,
    /// Generation of the request.
    pub generation: u64,
    /// Offset of the first record.
    pub offset: usize,
    /// Records in server order.
    pub items: Vec<T>,
    /// Size of the collection for the request's filters.
    pub total_items: usize,
    /// Wall-clock duration of the round trip.
    pub elapsed: Duration,
}

impl FetchRequest {
    /// Performs the request.
    pub async fn send<T: DeserializeOwned>(
        self,
        transport: &dyn Transport,
    ) -> Result<FetchedPage<T>, FetchError> {
        let start = Instant::now();
        let list = fetch_page::<T>(transport, &self.path, &self.params).await?;
        Ok(FetchedPage {
            fetcher_id: self.fetcher_id,
            generation: self.generation,
            offset: self.offset,
            items: list.items,
            total_items: list.total_items,
            elapsed: start.elapsed(),
        })
    }
}

/// GETs one page of `path` and decodes it.
pub async fn fetch_page<T: DeserializeOwned>(
    transport: &dyn Transport,
    path: &str,
    params: &[(String, String)],
) -> Result<ListData<T>, FetchError> {
    let body = transport.get(path, params).await?;
    let envelope = ApiEnvelope::parse(body)?;
    if envelope.error != 0 {
        warn!(
            event = "fetch_remote_error",
            path,
            code = envelope.error,
            message = envelope.message.as_deref().unwrap_or_default()
        );
    }
    envelope.check()?.into_list()
}

/// Message carrying a completed fetch back into a bubbletea program.
pub struct FetchedMsg<T> {
    /// Id of the issuing factory.
    pub fetcher_id: u64,
    /// Generation of the request.
    pub generation: u64,
    /// The page, or why it could not be fetched.
    pub result: Result<FetchedPage<T>, FetchError>,
}

/// Result of an applied fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome<T> {
    /// The whole buffer after the fetch; `None` marks rows not fetched yet.
    pub items: Vec<Option<T>>,
    /// Duration of the fetch, for diagnostics only.
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq)]
enum Slot<T> {
    Pending,
    Loaded(T),
    Excluded,
}

/// Paged, filtered, sorted view of a remote collection.
pub struct DataFactory<T> {
    id: u64,
    path: String,
    filters: FilterSet,
    sort: Sort,
    slots: Vec<Slot<T>>,
    generation: u64,
    exclusion: Option<Exclusion<T>>,
    last_elapsed: Duration,
}

impl<T> fmt::Debug for DataFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataFactory")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("filters", &self.filters)
            .field("sort", &self.sort)
            .field("len", &self.slots.len())
            .field("generation", &self.generation)
            .finish()
    }
}

impl DataFactory<Value> {
    /// The agents collection, without the manager pseudo-agent.
    pub fn agents() -> Self {
        Self::new("/agents").with_exclusion(is_manager_agent)
    }
}

impl<T> DataFactory<T> {
    /// Creates a factory for the collection at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            id: next_id(),
            path: path.into(),
            filters: FilterSet::default(),
            sort: Sort::default(),
            slots: Vec::new(),
            generation: 0,
            exclusion: None,
            last_elapsed: Duration::ZERO,
        }
    }

    /// Sets filters that survive [`remove_filters`](Self::remove_filters) (builder pattern).
    pub fn with_implicit_filters(mut self, implicit: Vec<Filter>) -> Self {
        self.filters = FilterSet::new(implicit);
        self
    }

    /// Hides records matching `exclude` from the buffer (builder pattern).
    pub fn with_exclusion(mut self, exclude: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.exclusion = Some(Arc::new(exclude));
        self
    }

    /// Unique id of this factory, carried by its messages.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Collection path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Current request generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Active filters.
    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Mutable access to the filters, e.g. to restore persisted ones.
    pub fn filters_mut(&mut self) -> &mut FilterSet {
        &mut self.filters
    }

    /// Active sort.
    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    /// Duration of the last applied fetch.
    pub fn last_elapsed(&self) -> Duration {
        self.last_elapsed
    }

    /// Sets or removes (`None`) a filter. Takes effect on the next fetch.
    pub fn add_filter(&mut self, name: &str, value: Option<&str>) {
        self.filters.add(name, value);
    }

    /// Clears user filters, keeping implicit ones. Takes effect on the next fetch.
    pub fn remove_filters(&mut self) {
        self.filters.clear();
    }

    /// Sorts by `field`, flipping direction when already sorted by it.
    /// Takes effect on the next fetch.
    pub fn add_sorting(&mut self, field: &str) {
        self.sort.toggle(field);
    }

    /// Drops the buffer, user filters and sort, and invalidates in-flight fetches.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.filters.clear();
        self.sort = Sort::default();
        self.generation += 1;
    }

    /// Rows as shown: loaded records and placeholders, excluded records removed.
    pub fn items(&self) -> Vec<Option<&T>> {
        self.slots
            .iter()
            .filter_map(|slot| match slot {
                Slot::Pending => Some(None),
                Slot::Loaded(item) => Some(Some(item)),
                Slot::Excluded => None,
            })
            .collect()
    }

    /// Number of rows shown, placeholders included.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| !matches!(slot, Slot::Excluded))
            .count()
    }

    /// True before the first page of the current query has arrived.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of rows actually fetched.
    pub fn loaded(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Loaded(_)))
            .count()
    }

    /// True once every row of the collection has been fetched.
    pub fn is_complete(&self) -> bool {
        !self.slots.iter().any(|slot| matches!(slot, Slot::Pending))
    }

    /// Server offset of the first row still missing, if any.
    pub fn next_offset(&self) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| matches!(slot, Slot::Pending))
    }

    /// Query parameters for a page: limit, offset, sort and filters.
    pub fn query_params(&self, offset: usize, limit: usize) -> QueryParams {
        let mut params = vec![
            ("limit".to_string(), limit.to_string()),
            ("offset".to_string(), offset.to_string()),
        ];
        if let Some(sort) = self.sort.param() {
            params.push(("sort".to_string(), sort));
        }
        self.filters.serialize_into(&mut params);
        params
    }

    /// Issues a fetch. An offset of zero clears the buffer and starts a new
    /// generation, so pages of earlier queries still in flight are ignored.
    pub fn begin(&mut self, options: FetchOptions) -> Result<FetchRequest, FetchError> {
        let limit = options.limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 {
            return Err(FetchError::InvalidLimit);
        }
        if options.offset == 0 {
            self.generation += 1;
            self.slots.clear();
        }
        let request = FetchRequest {
            fetcher_id: self.id,
            generation: self.generation,
            path: self.path.clone(),
            offset: options.offset,
            limit,
            params: self.query_params(options.offset, limit),
        };
        debug!(
            event = "fetch_issued",
            path = %request.path,
            generation = request.generation,
            offset = request.offset,
            limit
        );
        Ok(request)
    }

    /// Stores a fetched page. Returns `None`, leaving the buffer untouched,
    /// when the page belongs to another factory or an older generation.
    pub fn apply(&mut self, page: FetchedPage<T>) -> Option<FetchOutcome<T>>
    where
        T: Clone,
    {
        if !self.accepts(page.fetcher_id, page.generation) {
            return None;
        }

        let FetchedPage {
            offset,
            items,
            total_items,
            elapsed,
            ..
        } = page;
        let fetched = items.len();
        let needed = total_items.max(offset + fetched);
        if self.slots.len() > needed {
            self.slots.truncate(needed);
        } else {
            self.slots.resize_with(needed, || Slot::Pending);
        }
        for (slot, item) in self.slots[offset..offset + fetched].iter_mut().zip(items) {
            let excluded = self.exclusion.as_ref().is_some_and(|exclude| exclude(&item));
            *slot = if excluded {
                Slot::Excluded
            } else {
                Slot::Loaded(item)
            };
        }
        self.last_elapsed = elapsed;

        info!(
            event = "fetch_completed",
            path = %self.path,
            generation = self.generation,
            offset,
            fetched,
            total_items,
            elapsed_ms = elapsed.as_millis() as u64
        );
        Some(self.outcome())
    }

    fn accepts(&self, fetcher_id: u64, generation: u64) -> bool {
        if fetcher_id != self.id {
            return false;
        }
        if generation != self.generation {
            debug!(
                event = "fetch_stale_discarded",
                path = %self.path,
                generation,
                current = self.generation
            );
            return false;
        }
        true
    }

    fn outcome(&self) -> FetchOutcome<T>
    where
        T: Clone,
    {
        FetchOutcome {
            items: self.items().into_iter().map(|item| item.cloned()).collect(),
            elapsed: self.last_elapsed,
        }
    }
}

impl<T> DataFactory<T>
where
    T: DeserializeOwned + Clone + Send + 'static,
{
    /// Fetches a page and applies it.
    ///
    /// # Errors
    ///
    /// [`FetchError`] when the limit is zero, the transport fails, the remote
    /// reports an error or the payload is malformed. The buffer is left as it
    /// was after [`begin`](Self::begin) in that case.
    pub async fn fetch(
        &mut self,
        transport: &dyn Transport,
        options: FetchOptions,
    ) -> Result<FetchOutcome<T>, FetchError> {
        let request = self.begin(options)?;
        let page = request.send::<T>(transport).await?;
        // The factory is borrowed for the whole call, so the page is current.
        Ok(self.apply(page).unwrap_or_else(|| self.outcome()))
    }

    /// Issues a fetch as a bubbletea command resolving to a [`FetchedMsg`].
    pub fn fetch_cmd(
        &mut self,
        transport: Arc<dyn Transport>,
        options: FetchOptions,
    ) -> Result<Cmd, FetchError> {
        let request = self.begin(options)?;
        let fetcher_id = request.fetcher_id;
        let generation = request.generation;
        Ok(Box::pin(async move {
            let result = request.send::<T>(transport.as_ref()).await;
            Some(Box::new(FetchedMsg {
                fetcher_id,
                generation,
                result,
            }) as Msg)
        }))
    }

    /// Handles a [`FetchedMsg`] produced by this factory.
    ///
    /// Returns `None` for unrelated messages and for stale pages. Errors of
    /// stale requests are dropped as well.
    pub fn update(&mut self, msg: Msg) -> Option<Result<FetchOutcome<T>, FetchError>> {
        let fetched = msg.downcast::<FetchedMsg<T>>().ok()?;
        let FetchedMsg {
            fetcher_id,
            generation,
            result,
        } = *fetched;
        if !self.accepts(fetcher_id, generation) {
            return None;
        }
        match result {
            Ok(page) => self.apply(page).map(Ok),
            Err(err) => Some(Err(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fake::MemoryTransport;
    use serde_json::json;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn loaded(items: &[Option<Value>]) -> usize {
        items.iter().filter(|i| i.is_some()).count()
    }

    #[tokio::test]
    async fn test_twelve_items_two_pages() {
        init_tracing();
        let transport = MemoryTransport::agents(12);
        let mut factory: DataFactory<Value> = DataFactory::new("/agents");

        let first = factory
            .fetch(&transport, FetchOptions::first_page(10))
            .await
            .unwrap();
        assert_eq!(first.items.len(), 12);
        assert_eq!(loaded(&first.items), 10);
        assert!(first.items[10].is_none() && first.items[11].is_none());
        assert_eq!(factory.next_offset(), Some(10));

        let second = factory
            .fetch(&transport, FetchOptions::page(10, 10))
            .await
            .unwrap();
        assert_eq!(second.items.len(), 12);
        assert_eq!(loaded(&second.items), 12);
        assert!(factory.is_complete());
        assert_eq!(second.items[11].as_ref().unwrap()["id"], "012");
    }

    #[tokio::test]
    async fn test_offset_zero_twice_is_idempotent() {
        let transport = MemoryTransport::agents(25);
        let mut factory: DataFactory<Value> = DataFactory::new("/agents");
        factory.add_filter("status", Some("Active"));

        let a = factory
            .fetch(&transport, FetchOptions::first_page(5))
            .await
            .unwrap();
        let b = factory
            .fetch(&transport, FetchOptions::first_page(5))
            .await
            .unwrap();
        assert_eq!(a.items, b.items);
        assert_eq!(a.items.len(), 12);
    }

    #[tokio::test]
    async fn test_buffer_grows_monotonically() {
        let transport = MemoryTransport::agents(23);
        let mut factory: DataFactory<Value> = DataFactory::new("/agents");
        let mut previous_loaded = 0;
        for offset in (0..23).step_by(5) {
            let outcome = factory
                .fetch(&transport, FetchOptions::page(offset, 5))
                .await
                .unwrap();
            assert!(outcome.items.len() <= 23);
            let now_loaded = loaded(&outcome.items);
            assert!(now_loaded >= previous_loaded);
            previous_loaded = now_loaded;
        }
        assert_eq!(previous_loaded, 23);
    }

    #[tokio::test]
    async fn test_default_limit_and_params() {
        let transport = MemoryTransport::agents(3);
        let mut factory: DataFactory<Value> = DataFactory::new("/agents")
            .with_implicit_filters(vec![Filter::new("group", "default")]);
        factory.add_filter("status", Some("Active"));
        factory.add_sorting("name");
        factory.add_sorting("name");
        factory
            .fetch(&transport, FetchOptions::default())
            .await
            .unwrap();

        let (path, params) = transport.requests().pop().unwrap();
        assert_eq!(path, "/agents");
        let expected: QueryParams = [
            ("limit", "500"),
            ("offset", "0"),
            ("sort", "-name"),
            ("group", "default"),
            ("status", "Active"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(params, expected);
    }

    #[tokio::test]
    async fn test_filter_changes_do_not_fetch() {
        let transport = MemoryTransport::agents(3);
        let mut factory: DataFactory<Value> = DataFactory::new("/agents");
        factory.add_filter("status", Some("Active"));
        factory.add_sorting("name");
        factory.remove_filters();
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_manager_agent_excluded() {
        let mut records = vec![json!({ "id": "000", "name": "manager" })];
        records.extend((1..=4).map(|i| json!({ "id": format!("{i:03}") })));
        let transport = MemoryTransport::new(records);
        let mut agents = DataFactory::agents();

        let outcome = agents
            .fetch(&transport, FetchOptions::first_page(3))
            .await
            .unwrap();
        assert_eq!(outcome.items.len(), 4);
        assert_eq!(loaded(&outcome.items), 2);
        assert!(outcome
            .items
            .iter()
            .flatten()
            .all(|agent| !is_manager_agent(agent)));
        assert_eq!(agents.next_offset(), Some(3));

        let outcome = agents
            .fetch(&transport, FetchOptions::page(3, 3))
            .await
            .unwrap();
        assert_eq!(outcome.items.len(), 4);
        assert!(agents.is_complete());
    }

    #[tokio::test]
    async fn test_remote_error_is_surfaced() {
        let transport = MemoryTransport::agents(3);
        transport.fail_next(json!({ "error": 1000, "message": "Wazuh-db error" }));
        let mut factory: DataFactory<Value> = DataFactory::new("/agents");
        let err = factory
            .fetch(&transport, FetchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Remote { code: 1000, .. }));
        assert!(factory.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        let transport = MemoryTransport::agents(3);
        transport.fail_next(json!({ "error": 0, "data": { "affected_items": [] } }));
        let mut factory: DataFactory<Value> = DataFactory::new("/agents");
        let err = factory
            .fetch(&transport, FetchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let mut factory: DataFactory<Value> = DataFactory::new("/rules");
        assert!(matches!(
            factory.begin(FetchOptions::first_page(0)),
            Err(FetchError::InvalidLimit)
        ));
        assert_eq!(factory.generation(), 0);
    }

    #[tokio::test]
    async fn test_stale_generation_discarded() {
        let transport = MemoryTransport::agents(30);
        let mut factory: DataFactory<Value> = DataFactory::new("/agents");

        let old_first = factory.begin(FetchOptions::first_page(10)).unwrap();
        let old_second = factory.begin(FetchOptions::page(10, 10)).unwrap();
        factory.add_filter("status", Some("Active"));
        let fresh = factory.begin(FetchOptions::first_page(10)).unwrap();

        let fresh_page = fresh.send::<Value>(&transport).await.unwrap();
        let old_second_page = old_second.send::<Value>(&transport).await.unwrap();
        let old_first_page = old_first.send::<Value>(&transport).await.unwrap();

        let outcome = factory.apply(fresh_page).unwrap();
        assert_eq!(outcome.items.len(), 15);

        assert!(factory.apply(old_second_page).is_none());
        assert!(factory.apply(old_first_page).is_none());
        let items = factory.items();
        assert_eq!(items.len(), 15);
        assert!(items
            .iter()
            .flatten()
            .all(|agent| agent["status"] == "Active"));
    }

    #[tokio::test]
    async fn test_out_of_order_pages_same_generation() {
        let transport = MemoryTransport::agents(20);
        let mut factory: DataFactory<Value> = DataFactory::new("/agents");

        let first = factory.begin(FetchOptions::first_page(10)).unwrap();
        let second = factory.begin(FetchOptions::page(10, 10)).unwrap();
        let second_page = second.send::<Value>(&transport).await.unwrap();
        let first_page = first.send::<Value>(&transport).await.unwrap();

        factory.apply(second_page).unwrap();
        assert_eq!(factory.loaded(), 10);
        assert_eq!(factory.next_offset(), Some(0));
        factory.apply(first_page).unwrap();
        assert!(factory.is_complete());
        let ids: Vec<&str> = factory
            .items()
            .into_iter()
            .flatten()
            .filter_map(|a| a["id"].as_str())
            .collect();
        assert_eq!(ids.first(), Some(&"001"));
        assert_eq!(ids.last(), Some(&"020"));
    }

    #[tokio::test]
    async fn test_fetch_cmd_round_trip() {
        let transport: Arc<dyn Transport> = Arc::new(MemoryTransport::agents(4));
        let mut factory: DataFactory<Value> = DataFactory::new("/agents");

        let stale_cmd = factory
            .fetch_cmd(transport.clone(), FetchOptions::first_page(2))
            .unwrap();
        let cmd = factory
            .fetch_cmd(transport.clone(), FetchOptions::first_page(2))
            .unwrap();

        let stale_msg = stale_cmd.await.unwrap();
        assert!(factory.update(stale_msg).is_none());

        let msg = cmd.await.unwrap();
        let outcome = factory.update(msg).unwrap().unwrap();
        assert_eq!(outcome.items.len(), 4);
        assert_eq!(factory.loaded(), 2);
    }

    #[tokio::test]
    async fn test_messages_of_other_factories_ignored() {
        let transport: Arc<dyn Transport> = Arc::new(MemoryTransport::agents(4));
        let mut rules: DataFactory<Value> = DataFactory::new("/rules");
        let mut agents: DataFactory<Value> = DataFactory::new("/agents");

        let cmd = rules
            .fetch_cmd(transport.clone(), FetchOptions::default())
            .unwrap();
        agents.begin(FetchOptions::default()).unwrap();
        let msg = cmd.await.unwrap();
        assert!(agents.update(msg).is_none());
        assert!(agents.update(Box::new("unrelated") as Msg).is_none());
    }

    #[test]
    fn test_reset_invalidates_generation() {
        let mut factory: DataFactory<Value> =
            DataFactory::new("/agents").with_implicit_filters(vec![Filter::new("group", "web")]);
        factory.add_filter("status", Some("Active"));
        factory.add_sorting("name");
        let generation = factory.generation();
        factory.reset();
        assert_eq!(factory.generation(), generation + 1);
        assert_eq!(factory.sort(), &Sort::default());
        assert_eq!(factory.filters().active(), &[Filter::new("group", "web")]);
    }
}
