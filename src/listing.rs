//! Renders the embedded user/grade listing fragment.
//!
//! The host page posts the form back on every save, so the fragment is a
//! single `<form>` around the whole table. Each user occupies a 3-row
//! group: name row with the grade stepper, email row, separator row.

use crate::db::{self, UserRow};
use rusqlite::Connection;
use std::collections::HashMap;
use std::fmt::Write;

pub struct ListingModel {
    pub users: Vec<UserRow>,
    pub grades: HashMap<i64, i64>,
}

impl ListingModel {
    /// Count of listed users that have a stored grade.
    pub fn graded(&self) -> usize {
        self.users
            .iter()
            .filter(|u| self.grades.contains_key(&u.id))
            .count()
    }
}

/// Two independent reads: full roster (last name ascending), then the full
/// grade map. No transaction spans them; a grade written in between shows
/// up only in the grade read.
pub fn load(conn: &Connection) -> rusqlite::Result<ListingModel> {
    let users = db::users_all(conn)?;
    let grades = db::grades_all(conn)?;
    Ok(ListingModel { users, grades })
}

pub fn render(model: &ListingModel) -> String {
    let mut table = String::new();
    table.push_str("<form method=\"POST\">");
    table.push_str("<table class=\"block_listuser_table\">");
    table.push_str("<tr><th colspan=\"2\">Name and Email</th><th>Grade</th></tr>");

    for user in &model.users {
        let value = model
            .grades
            .get(&user.id)
            .map(|g| g.to_string())
            .unwrap_or_default();

        let _ = write!(
            table,
            "<tr><td>{}</td><td>{}</td><td rowspan=\"2\">",
            escape(&user.first_name),
            escape(&user.last_name)
        );
        let _ = write!(
            table,
            "<input type=\"hidden\" name=\"userid\" value=\"{}\">",
            user.id
        );

        table.push_str("<div class=\"number\">");
        table.push_str(
            "<button class=\"number-minus\" type=\"button\" \
             onclick=\"this.nextElementSibling.stepDown(); this.nextElementSibling.onchange();\">-</button>",
        );
        let _ = write!(
            table,
            "<input type=\"number\" name=\"grade\" min=\"0\" max=\"10\" value=\"{}\" readonly>",
            value
        );
        table.push_str(
            "<button class=\"number-plus\" type=\"button\" \
             onclick=\"this.previousElementSibling.stepUp(); this.previousElementSibling.onchange();\">+</button>",
        );
        table.push_str("</div>");

        table.push_str("<div class=\"text-center\">");
        table.push_str("<button type=\"submit\" class=\"btn btn-primary\">Save</button>");
        table.push_str("</div>");

        table.push_str("</td></tr>");
        let _ = write!(
            table,
            "<tr><td colspan=\"2\">{}</td></tr>",
            escape(&user.email)
        );
        table.push_str("<tr><td colspan=\"3\" class=\"separator\"></td></tr>");
    }

    table.push_str("</table></form>");
    table
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
