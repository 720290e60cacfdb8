use mirra_shared::{Domain, ManagerError, ReconcileReport};

/// Something that happened on the authority thread since the last `receive`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServerEvent {
    /// A reconciliation pass completed
    Reconciled {
        domain: Domain,
        report: ReconcileReport,
    },
    /// A pass was requested while another one was still in flight
    ReconcileSkipped { domain: Domain },
    /// The foreign runtime could not be reached; mirrored state is unchanged
    ReconcileFailed(ManagerError),
}
