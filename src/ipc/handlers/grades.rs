use crate::db;
use crate::dispatch::{ActionRegistry, Controller, SaveGradeParams, SAVE_GRADE};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_grades_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let params = SaveGradeParams::from_value(&req.params);

    // Existence is read only to report created-vs-updated; the write itself
    // is a single atomic upsert and does not depend on this.
    let existed = match params.userid {
        Some(userid) => match db::grade_exists(conn, userid) {
            Ok(v) => v,
            Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
        },
        None => false,
    };

    let registry = ActionRegistry::with_builtin();
    let controller = match Controller::new(&registry, SAVE_GRADE) {
        Ok(c) => c,
        Err(e) => return err(&req.id, e.code(), e.to_string(), None),
    };

    match controller.execute(conn, &params) {
        Ok(true) => ok(&req.id, json!({ "applied": true, "created": !existed })),
        Ok(false) => ok(&req.id, json!({ "applied": false })),
        Err(e) => err(&req.id, e.code(), e.to_string(), None),
    }
}

fn handle_grades_all(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    match db::grades_all(conn) {
        Ok(grades) => {
            let map: serde_json::Map<String, serde_json::Value> = grades
                .iter()
                .map(|(userid, grade)| (userid.to_string(), json!(grade)))
                .collect();
            ok(&req.id, json!({ "grades": map }))
        }
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.save" => Some(handle_grades_save(state, req)),
        "grades.all" => Some(handle_grades_all(state, req)),
        _ => None,
    }
}
