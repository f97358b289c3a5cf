use crate::db::{self, UserRow};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

/// The host owns the user roster; `users.import` mirrors it into the
/// workspace so the listing can be rendered without a host round-trip.
fn handle_users_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(entries) = req.params.get("users").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "missing users[]", None);
    };

    let mut users: Vec<UserRow> = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let Some(obj) = entry.as_object() else {
            return err(
                &req.id,
                "bad_params",
                format!("user at index {} must be an object", i),
                None,
            );
        };
        let Some(id) = obj.get("id").and_then(|v| v.as_i64()) else {
            return err(
                &req.id,
                "bad_params",
                format!("user at index {} missing/invalid id", i),
                None,
            );
        };
        let field = |key: &str| {
            obj.get(key)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        users.push(UserRow {
            id,
            first_name: field("firstName"),
            last_name: field("lastName"),
            email: field("email"),
        });
    }

    match db::users_upsert_all(conn, &users) {
        Ok(imported) => ok(&req.id, json!({ "imported": imported })),
        Err(e) => err(&req.id, "db_insert_failed", e.to_string(), None),
    }
}

fn handle_users_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    match db::users_all(conn) {
        Ok(users) => {
            let rows: Vec<serde_json::Value> = users
                .iter()
                .map(|u| {
                    json!({
                        "id": u.id,
                        "firstName": u.first_name,
                        "lastName": u.last_name,
                        "email": u.email,
                    })
                })
                .collect();
            ok(&req.id, json!({ "users": rows }))
        }
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "users.import" => Some(handle_users_import(state, req)),
        "users.list" => Some(handle_users_list(state, req)),
        _ => None,
    }
}
