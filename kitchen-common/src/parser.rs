//! Recipe ingredient block parsing
//!
//! Turns a pasted multi-line ingredient list into structured rows:
//!
//! ```text
//! Chicken thigh…300g
//! Onion...1
//! = Sauce =
//! Soy sauce,2 tbsp,low sodium
//! Salt
//! ```
//!
//! - Lines starting with `=` or `＝` are group headers; the stripped
//!   remainder labels every following line until the next header.
//! - Ingredient lines are split on the first delimiter found, in priority
//!   order: `…`, then `...`, then `,`. Comma lines may carry a third
//!   `details` field. A line with no delimiter is a bare name.
//! - Blank lines are skipped.
//!
//! [`resolve_block`] then binds each name to a catalog id by exact match on
//! `name` or `kana`; any unmatched name rejects the whole block.

use crate::db::models::RecipeIngredientRow;
use crate::{Error, Result};
use sqlx::SqliteConnection;
use tracing::debug;

const FULL_WIDTH_ELLIPSIS: &str = "…";
const ASCII_ELLIPSIS: &str = "...";
const COMMA: &str = ",";

/// Characters stripped from both ends of a group header
const HEADER_TRIM: &[char] = &['=', '＝', ' ', '\t', '　'];

/// One ingredient line before catalog resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub name: String,
    pub amount: String,
    pub group_name: String,
    pub details: String,
}

fn is_group_header(line: &str) -> bool {
    line.starts_with('=') || line.starts_with('＝')
}

/// Split an ingredient line into (name, amount, details)
fn split_line(line: &str) -> (String, String, String) {
    for delimiter in [FULL_WIDTH_ELLIPSIS, ASCII_ELLIPSIS] {
        if let Some((name, amount)) = line.split_once(delimiter) {
            return (name.trim().to_string(), amount.trim().to_string(), String::new());
        }
    }

    if line.contains(COMMA) {
        let mut fields = line.split(COMMA).map(str::trim);
        let name = fields.next().unwrap_or_default().to_string();
        let amount = fields.next().unwrap_or_default().to_string();
        let details = fields.next().unwrap_or_default().to_string();
        return (name, amount, details);
    }

    (line.to_string(), String::new(), String::new())
}

/// Tokenize an ingredient block without touching the catalog
pub fn parse_block(text: &str) -> Vec<ParsedLine> {
    let mut lines = Vec::new();
    let mut current_group = String::new();

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if is_group_header(line) {
            current_group = line.trim_matches(HEADER_TRIM).to_string();
            continue;
        }

        let (name, amount, details) = split_line(line);
        if name.is_empty() {
            continue;
        }

        lines.push(ParsedLine {
            name,
            amount,
            group_name: current_group.clone(),
            details,
        });
    }

    lines
}

/// Look up a catalog id by exact name, falling back to kana
async fn lookup_catalog_id(conn: &mut SqliteConnection, name: &str) -> Result<Option<i64>> {
    let id: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT id FROM item_catalog
        WHERE name = ?1 OR kana = ?1
        ORDER BY (name = ?1) DESC, id ASC
        LIMIT 1
        "#,
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(id)
}

/// Parse `text` and resolve every line against the catalog.
///
/// Returns [`Error::MissingIngredients`] listing each unresolved name once,
/// in first-seen order, if any line fails to resolve.
pub async fn resolve_block(
    conn: &mut SqliteConnection,
    text: &str,
) -> Result<Vec<RecipeIngredientRow>> {
    let mut rows = Vec::new();
    let mut unknown: Vec<String> = Vec::new();

    for line in parse_block(text) {
        match lookup_catalog_id(conn, &line.name).await? {
            Some(catalog_id) => rows.push(RecipeIngredientRow {
                catalog_id,
                amount: line.amount,
                group_name: line.group_name,
                details: line.details,
            }),
            None => {
                if !unknown.contains(&line.name) {
                    unknown.push(line.name);
                }
            }
        }
    }

    if !unknown.is_empty() {
        debug!("Unresolved ingredient names: {:?}", unknown);
        return Err(Error::MissingIngredients(unknown));
    }

    Ok(rows)
}
