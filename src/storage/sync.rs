use tracing::debug;

use crate::ledger::Ledger;

/// Resolves two snapshots of the same ledger by keeping the one written most
/// recently. Ties, and snapshots without a stamp, keep `local`.
pub fn last_write_wins(local: Ledger, remote: Ledger) -> Ledger {
    let remote_newer = match (local.updated_at, remote.updated_at) {
        (Some(local_at), Some(remote_at)) => remote_at > local_at,
        (None, Some(_)) => true,
        _ => false,
    };
    debug!(remote_newer, "resolved ledger snapshots");
    if remote_newer {
        remote
    } else {
        local
    }
}
