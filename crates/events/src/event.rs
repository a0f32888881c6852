use serde::Serialize;

/// A catalog integration event payload.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - **partitioned** by the aggregate they describe
/// - **self-contained** (referenced aggregates are copied in, not linked)
pub trait Event: Clone + core::fmt::Debug + Serialize + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "catalog.product.created").
    fn event_type(&self) -> &'static str;

    /// Transport ordering key: the id of the aggregate the event is about.
    fn partition_key(&self) -> String;
}
