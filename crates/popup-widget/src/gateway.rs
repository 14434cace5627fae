#![forbid(unsafe_code)]

//! Side-effect gateway for the process-wide modal marker.

/// Collaborator that toggles the process-wide "a modal is open" marker
/// (classically, a CSS class on the document body).
///
/// Both operations must be idempotent: the coordinator calls them once per
/// `open()`/`close()` invocation, which includes redundant opens and the
/// unconditional close at teardown. Multiple widget instances may race on
/// the marker; last writer wins.
pub trait ModalGateway {
    fn mark_open(&self);
    fn mark_closed(&self);

    /// One-time layout nudge after the layer has been positioned, for hosts
    /// whose rendering engine needs it. Portable hosts ignore it.
    fn force_reflow(&self) {}
}

/// Gateway that does nothing; for hosts without a shared marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopGateway;

impl ModalGateway for NoopGateway {
    fn mark_open(&self) {}
    fn mark_closed(&self) {}
}
