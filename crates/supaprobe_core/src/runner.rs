use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use futures::stream;
use supaprobe_attacks::{Attack, AttackContext, DEFAULT_ATTACK_TIMEOUT, Session};
#[cfg(feature = "tracing")]
use tracing::{debug, info};

use crate::config::Config;
use crate::error::RunError;
use crate::report::{ReportEntry, ScanReport};

/// Executes a list of attacks against one session.
///
/// Attacks run one at a time by default. With a concurrency above one, up to
/// that many run at once, but results are still yielded in the order the
/// attacks were given.
#[derive(Debug, Clone)]
pub struct Runner {
    session: Session,
    attack_timeout: Duration,
    concurrency: usize,
}

impl Runner {
    /// Creates a sequential runner with the default per-attack timeout.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self {
            session,
            attack_timeout: DEFAULT_ATTACK_TIMEOUT,
            concurrency: 1,
        }
    }

    /// Builds a runner from a fully merged configuration.
    ///
    /// Blank URLs and keys count as missing.
    pub fn from_config(config: &Config) -> Result<Self, RunError> {
        let url = present(config.target_url.as_deref()).ok_or(RunError::MissingTarget)?;
        let anon_key = present(config.anon_key.as_deref()).ok_or(RunError::MissingAnonKey)?;
        let service_key = present(config.service_key.as_deref()).map(str::to_string);

        let context = AttackContext::new(url, anon_key)?.with_service_key(service_key);
        let session = Session::new(context, config.request_timeout())?;

        Ok(Self::new(session)
            .with_attack_timeout(config.attack_timeout())
            .with_concurrency(config.concurrency()))
    }

    /// Sets the time budget of each attack.
    #[must_use]
    pub const fn with_attack_timeout(mut self, attack_timeout: Duration) -> Self {
        self.attack_timeout = attack_timeout;
        self
    }

    /// Sets how many attacks may be in flight at once. Zero is treated as one.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// The session every attack runs against.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Runs `attacks`, calling `on_result` as each result becomes available.
    pub async fn run<F>(&self, attacks: &[&'static dyn Attack], mut on_result: F) -> Vec<ReportEntry>
    where
        F: FnMut(&ReportEntry),
    {
        #[cfg(feature = "tracing")]
        info!(
            target_url = %self.session.context().target_url,
            attacks = attacks.len(),
            concurrency = self.concurrency,
            "starting run"
        );

        let budget = self.attack_timeout;
        let mut results = stream::iter(attacks.iter().copied())
            .map(|attack| {
                let pending = attack.execute(&self.session, budget);
                async move { ReportEntry::new(attack.meta(), pending.await) }
            })
            .buffered(self.concurrency);

        let mut entries = Vec::with_capacity(attacks.len());
        while let Some(entry) = results.next().await {
            #[cfg(feature = "tracing")]
            debug!(
                attack = %entry.result.attack_id,
                status = %entry.result.status,
                elapsed_ms = entry.result.duration.as_millis(),
                "result"
            );

            on_result(&entry);
            entries.push(entry);
        }

        entries
    }

    /// Runs `attacks` and aggregates the results into a report.
    pub async fn scan<F>(&self, attacks: &[&'static dyn Attack], on_result: F) -> ScanReport
    where
        F: FnMut(&ReportEntry),
    {
        let started_at = Utc::now();
        let entries = self.run(attacks, on_result).await;
        let finished_at = Utc::now();

        let report = ScanReport::new(
            self.session.context().target_url.as_str(),
            started_at,
            finished_at,
            entries,
        );

        #[cfg(feature = "tracing")]
        info!(
            total = report.summary.total,
            breached = report.summary.breached,
            errors = report.summary.errors,
            duration_ms = report.duration_ms,
            "run finished"
        );

        report
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
