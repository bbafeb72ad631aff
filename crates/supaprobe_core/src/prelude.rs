//! Convenience re-exports of the most commonly used types.

pub use supaprobe_attacks::{
    Attack, AttackContext, AttackMeta, AttackRegistry, AttackResult, AttackStatus, Category, Severity, Session,
};

pub use crate::benchmark::{Scenario, ScenarioPlan};
pub use crate::config::{Config, ConfigError};
pub use crate::error::{RunError, ReportError, SelectionError};
pub use crate::report::{BenchmarkReport, ReportEntry, ScanReport, Tally};
pub use crate::runner::Runner;
pub use crate::selection::Selection;
