use crate::dispatch::{ActionRegistry, Controller, SaveGradeParams, SAVE_GRADE};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::listing;
use serde_json::json;

/// Renders the user/grade table fragment. A pending grade submission in
/// the params is applied first, so the returned listing already reflects
/// it (the original block saves, then rebuilds the table, in one page
/// load).
fn handle_listing_render(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let params = SaveGradeParams::from_value(&req.params);

    let registry = ActionRegistry::with_builtin();
    let controller = match Controller::new(&registry, SAVE_GRADE) {
        Ok(c) => c,
        Err(e) => return err(&req.id, e.code(), e.to_string(), None),
    };
    let applied = match controller.execute(conn, &params) {
        Ok(v) => v,
        Err(e) => return err(&req.id, e.code(), e.to_string(), None),
    };

    let model = match listing::load(conn) {
        Ok(m) => m,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    ok(
        &req.id,
        json!({
            "html": listing::render(&model),
            "users": model.users.len(),
            "graded": model.graded(),
            "applied": applied,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "listing.render" => Some(handle_listing_render(state, req)),
        _ => None,
    }
}
