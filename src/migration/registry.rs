use std::borrow::Cow;
use std::collections::BTreeMap;

use once_cell::sync::OnceCell;

use super::context::StepContext;
use super::statement::Statement;
use crate::error::CpMigrateError;

/// Function type for steps that compute their statements at run time
/// (catalog introspection, data rewrites, state store edits).
pub type StepFn = fn(&mut StepContext<'_>) -> Result<Vec<Statement>, CpMigrateError>;

/// Sentinel returned by [`Registry::next_revision_after`] when nothing is pending.
/// Real revisions start at 1.
pub const NO_REVISION: u32 = 0;

/// How a step produces its statements.
#[derive(Debug, Clone, Copy)]
pub enum StepBody {
    /// Fixed SQL, run in order.
    Sql(&'static [&'static str]),
    /// Rust code producing statements. May return none.
    Code(StepFn),
    /// Kept so the revision history stays intact; runs nothing.
    Noop,
}

/// One database update.
#[derive(Debug, Clone, Copy)]
pub struct Step {
    pub revision: u32,
    /// One-line description shown to administrators.
    pub summary: &'static str,
    pub body: StepBody,
}

impl Step {
    pub const fn sql_only(revision: u32, summary: &'static str, sql: &'static [&'static str]) -> Self {
        Self {
            revision,
            summary,
            body: StepBody::Sql(sql),
        }
    }

    pub const fn code(revision: u32, summary: &'static str, produce: StepFn) -> Self {
        Self {
            revision,
            summary,
            body: StepBody::Code(produce),
        }
    }

    pub const fn noop(revision: u32, summary: &'static str) -> Self {
        Self {
            revision,
            summary,
            body: StepBody::Noop,
        }
    }

    pub fn produce(&self, ctx: &mut StepContext<'_>) -> Result<Vec<Statement>, CpMigrateError> {
        match self.body {
            StepBody::Sql(sql) => Ok(sql.iter().map(|s| Statement::sql(*s)).collect()),
            StepBody::Code(produce) => produce(ctx),
            StepBody::Noop => Ok(Vec::new()),
        }
    }
}

/// Result of looking a revision up in the registry.
#[derive(Debug, Clone, Copy)]
pub enum Lookup<'a> {
    Found(&'a Step),
    /// No step carries this revision: a gap in the numbering or a removed step.
    NotFound,
}

/// True if revisions are non-zero and strictly increasing, which also makes
/// them unique. Usable in const context to check the built-in list at compile time.
pub const fn revisions_strictly_ascending(steps: &[Step]) -> bool {
    let mut i = 0;
    while i < steps.len() {
        if steps[i].revision == NO_REVISION {
            return false;
        }
        if i > 0 && steps[i - 1].revision >= steps[i].revision {
            return false;
        }
        i += 1;
    }
    true
}

/// Ordered set of known updates.
pub struct Registry {
    steps: Cow<'static, [Step]>,
    highest: OnceCell<u32>,
}

impl Registry {
    /// The updates shipped with this binary.
    pub fn builtin() -> Self {
        Self {
            steps: Cow::Borrowed(crate::steps::STEPS),
            highest: OnceCell::new(),
        }
    }

    pub fn new(steps: Vec<Step>) -> Result<Self, CpMigrateError> {
        if !revisions_strictly_ascending(&steps) {
            let revisions: Vec<u32> = steps.iter().map(|s| s.revision).collect();
            return Err(CpMigrateError::InvalidRegistry(format!(
                "revisions must be non-zero and strictly ascending, got {:?}",
                revisions
            )));
        }

        Ok(Self {
            steps: Cow::Owned(steps),
            highest: OnceCell::new(),
        })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn first_revision(&self) -> Option<u32> {
        self.steps.first().map(|s| s.revision)
    }

    /// Highest defined revision, 0 for an empty registry. Computed once.
    pub fn highest_known_revision(&self) -> u32 {
        *self
            .highest
            .get_or_init(|| self.steps.iter().map(|s| s.revision).max().unwrap_or(NO_REVISION))
    }

    /// The revision to run after `last_applied`, or [`NO_REVISION`] when caught up.
    ///
    /// The answer is the next integer even when no step carries it; such gaps
    /// are run as no-ops.
    pub fn next_revision_after(&self, last_applied: u32) -> u32 {
        if last_applied < self.highest_known_revision() {
            last_applied + 1
        } else {
            NO_REVISION
        }
    }

    pub fn lookup(&self, revision: u32) -> Lookup<'_> {
        match self.steps.binary_search_by_key(&revision, |s| s.revision) {
            Ok(index) => Lookup::Found(&self.steps[index]),
            Err(_) => Lookup::NotFound,
        }
    }

    /// Summaries of every defined step at or above `lower_bound`, keyed by revision.
    /// Steps without a summary are left out.
    pub fn details_from(&self, lower_bound: u32) -> BTreeMap<u32, String> {
        self.steps
            .iter()
            .filter(|s| s.revision >= lower_bound)
            .filter_map(|s| {
                let line = s.summary.lines().next().unwrap_or("").trim();
                (!line.is_empty()).then(|| (s.revision, line.to_owned()))
            })
            .collect()
    }
}
