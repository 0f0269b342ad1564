pub type ServiceId = i64;

/// The catalog service a contract is sold against. Drives the allocator's
/// weekly cadence and the aggregate's session totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub id: ServiceId,
    pub sessions_per_week: u32,
    pub total_sessions: u32,
}
