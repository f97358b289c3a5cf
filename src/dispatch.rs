//! Action dispatch for grade writes.
//!
//! A `Controller` resolves an action name against an injected
//! `ActionRegistry` at construction and executes the bound action exactly
//! once. Only one action exists today (`save_grade`), but the registry
//! keeps the name-to-action binding explicit and testable.

use crate::db;
use rusqlite::Connection;
use std::collections::HashMap;
use thiserror::Error;

pub const SAVE_GRADE: &str = "save_grade";

pub const GRADE_MIN: i64 = 0;
pub const GRADE_MAX: i64 = 10;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The requested action name is not in the registry. Raised at
    /// `Controller::new`; a dispatcher is never constructed for it.
    #[error("unknown action: {0}")]
    UnknownAction(String),
    /// The bound action does not answer to the requested name. Unreachable
    /// under a correctly built registry.
    #[error("action '{found}' bound for request '{expected}'")]
    ActionMismatch {
        expected: String,
        found: &'static str,
    },
    #[error("grade {0} outside allowed range 0..=10")]
    GradeOutOfRange(i64),
    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
}

impl DispatchError {
    /// Wire-level error code for the IPC boundary.
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::UnknownAction(_) => "unknown_action",
            DispatchError::ActionMismatch { .. } => "invalid_action",
            DispatchError::GradeOutOfRange(_) => "bad_params",
            DispatchError::Storage(_) => "db_write_failed",
        }
    }
}

/// Explicit parameters for a grade submission. Either field may be absent;
/// a partial submission is a no-op, not an error.
#[derive(Debug, Default, Clone, Copy)]
pub struct SaveGradeParams {
    pub userid: Option<i64>,
    pub grade: Option<i64>,
}

impl SaveGradeParams {
    /// Reads `userid`/`grade` from a params object. Form posts arrive as
    /// integer strings, so numeric strings are coerced too.
    pub fn from_value(params: &serde_json::Value) -> Self {
        Self {
            userid: int_field(params, "userid"),
            grade: int_field(params, "grade"),
        }
    }
}

fn int_field(params: &serde_json::Value, key: &str) -> Option<i64> {
    let v = params.get(key)?;
    v.as_i64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

/// One named unit of work. `execute` returns `Ok(true)` when the action
/// applied, `Ok(false)` when the request did not apply to it.
pub trait Action {
    fn name(&self) -> &'static str;
    fn execute(&self, conn: &Connection, params: &SaveGradeParams)
        -> Result<bool, DispatchError>;
}

pub struct SaveGradeAction;

impl Action for SaveGradeAction {
    fn name(&self) -> &'static str {
        SAVE_GRADE
    }

    fn execute(
        &self,
        conn: &Connection,
        params: &SaveGradeParams,
    ) -> Result<bool, DispatchError> {
        let (Some(userid), Some(grade)) = (params.userid, params.grade) else {
            // Partial form data: nothing to do.
            return Ok(false);
        };
        if !(GRADE_MIN..=GRADE_MAX).contains(&grade) {
            return Err(DispatchError::GradeOutOfRange(grade));
        }
        db::grade_upsert(conn, userid, grade)?;
        Ok(true)
    }
}

type ActionFactory = fn() -> Box<dyn Action>;

/// Name -> action factory mapping, passed into `Controller::new` by the
/// caller rather than looked up through any global.
pub struct ActionRegistry {
    actions: HashMap<&'static str, ActionFactory>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }

    /// Registry with every built-in action bound.
    pub fn with_builtin() -> Self {
        let mut reg = Self::new();
        reg.register(SAVE_GRADE, || Box::new(SaveGradeAction));
        reg
    }

    pub fn register(&mut self, name: &'static str, factory: ActionFactory) {
        self.actions.insert(name, factory);
    }

    fn resolve(&self, name: &str) -> Option<Box<dyn Action>> {
        self.actions.get(name).map(|factory| factory())
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

/// Resolves an action name once and executes it once. Not reused across
/// requests.
pub struct Controller {
    requested: String,
    action: Box<dyn Action>,
}

impl Controller {
    pub fn new(registry: &ActionRegistry, name: &str) -> Result<Self, DispatchError> {
        let action = registry
            .resolve(name)
            .ok_or_else(|| DispatchError::UnknownAction(name.to_string()))?;
        Ok(Self {
            requested: name.to_string(),
            action,
        })
    }

    pub fn execute(
        &self,
        conn: &Connection,
        params: &SaveGradeParams,
    ) -> Result<bool, DispatchError> {
        if self.action.name() != self.requested {
            return Err(DispatchError::ActionMismatch {
                expected: self.requested.clone(),
                found: self.action.name(),
            });
        }
        self.action.execute(conn, params)
    }
}
