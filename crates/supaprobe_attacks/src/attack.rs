//! The attack trait and the guarded execution every attack runs under.

use std::pin::Pin;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::debug;

use crate::error::AttackError;
use crate::meta::AttackMeta;
use crate::result::{AttackResult, Verdict};
use crate::session::Session;

/// A pinned, boxed, `Send` future used as the return type for async probes.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Default time budget for a single attack, across all of its requests.
pub const DEFAULT_ATTACK_TIMEOUT: Duration = Duration::from_secs(30);

/// Summary used when an attack needs a service-role key that was not supplied.
pub const SKIPPED_NO_SERVICE_KEY: &str = "skipped: no service-role key supplied";

/// A single, self-contained attack vector.
///
/// Implementors only decide a [`Verdict`]; timing, cancellation, timeouts and
/// error capture are handled by [`Attack::execute`].
pub trait Attack: Send + Sync {
    /// Static descriptor of this attack.
    fn meta(&self) -> &AttackMeta;

    /// Performs the attack's requests and evaluates the responses.
    fn probe<'a>(&'a self, session: &'a Session) -> BoxFuture<'a, Result<Verdict, AttackError>>;

    /// Runs the probe under `budget` and the session's cancellation token.
    ///
    /// Never fails: errors become a result with status `error`.
    fn execute<'a>(&'a self, session: &'a Session, budget: Duration) -> BoxFuture<'a, AttackResult> {
        Box::pin(run_guarded(self, session, budget))
    }
}

async fn run_guarded<A: Attack + ?Sized>(attack: &A, session: &Session, budget: Duration) -> AttackResult {
    let meta = attack.meta();
    let timestamp = Utc::now();
    let started = Instant::now();

    if meta.requires_service_key && !session.has_service_key() {
        return AttackResult::from_verdict(meta.id, Verdict::secure(SKIPPED_NO_SERVICE_KEY), timestamp, started.elapsed());
    }

    let cancel = &session.context().cancel;
    let outcome = if cancel.is_cancelled() {
        Err(AttackError::Cancelled)
    } else {
        tokio::select! {
            () = cancel.cancelled() => Err(AttackError::Cancelled),
            res = tokio::time::timeout(budget, attack.probe(session)) => {
                res.unwrap_or_else(|_elapsed| Err(AttackError::Timeout(budget)))
            }
        }
    };

    let duration = started.elapsed();
    let result = match outcome {
        Ok(verdict) => AttackResult::from_verdict(meta.id, verdict, timestamp, duration),
        Err(e) => AttackResult::from_error(meta.id, &e, timestamp, duration),
    };

    debug!(
        attack = meta.id,
        status = %result.status,
        elapsed_ms = duration.as_millis(),
        "attack finished"
    );

    result
}
