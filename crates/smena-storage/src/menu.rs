//! Menu collection: fully replaced on every sync, with availability and
//! photo carried forward by the merge planner.

use anyhow::{Context, Result};
use smena_core::{Availability, MenuItemDraft, MenuSection};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

#[derive(Debug, Clone, PartialEq)]
pub struct MenuItemRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub composition: Option<String>,
    pub weight_volume: Option<String>,
    pub price: f64,
    pub category: String,
    pub subcategory: Option<String>,
    pub section: MenuSection,
    pub availability: Availability,
    pub photo: Option<String>,
    pub calories: Option<i64>,
    pub proteins: Option<f64>,
    pub fats: Option<f64>,
    pub carbs: Option<f64>,
    pub branch: String,
}

fn from_row(row: &SqliteRow) -> Result<MenuItemRow> {
    let section_text: String = row.try_get("section")?;
    let availability_text: String = row.try_get("availability")?;
    Ok(MenuItemRow {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        composition: row.try_get("composition")?,
        weight_volume: row.try_get("weight_volume")?,
        price: row.try_get("price")?,
        category: row.try_get("category")?,
        subcategory: row.try_get("subcategory")?,
        section: MenuSection::parse(&section_text)
            .with_context(|| format!("unknown section '{section_text}' in menu_items"))?,
        availability: Availability::parse(&availability_text).with_context(|| {
            format!("unknown availability '{availability_text}' in menu_items")
        })?,
        photo: row.try_get("photo")?,
        calories: row.try_get("calories")?,
        proteins: row.try_get("proteins")?,
        fats: row.try_get("fats")?,
        carbs: row.try_get("carbs")?,
        branch: row.try_get("branch")?,
    })
}

pub async fn all_for_branch(conn: &mut SqliteConnection, branch: &str) -> Result<Vec<MenuItemRow>> {
    let rows = sqlx::query(
        "SELECT id, name, description, composition, weight_volume, price, category,
                subcategory, section, availability, photo, calories, proteins, fats,
                carbs, branch
           FROM menu_items
          WHERE branch = ?
          ORDER BY category, subcategory, name",
    )
    .bind(branch)
    .fetch_all(conn)
    .await
    .context("loading menu items for branch")?;
    rows.iter().map(from_row).collect()
}

pub async fn delete_branch(conn: &mut SqliteConnection, branch: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM menu_items WHERE branch = ?")
        .bind(branch)
        .execute(conn)
        .await
        .context("deleting menu items for branch")?;
    Ok(result.rows_affected())
}

pub async fn insert(conn: &mut SqliteConnection, draft: &MenuItemDraft) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO menu_items (name, description, composition, weight_volume, price,
                                 category, subcategory, section, availability, photo,
                                 calories, proteins, fats, carbs, branch)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&draft.name)
    .bind(&draft.description)
    .bind(&draft.composition)
    .bind(&draft.weight_volume)
    .bind(draft.price)
    .bind(&draft.category)
    .bind(&draft.subcategory)
    .bind(draft.section.as_str())
    .bind(draft.availability.as_str())
    .bind(&draft.photo)
    .bind(draft.calories)
    .bind(draft.proteins)
    .bind(draft.fats)
    .bind(draft.carbs)
    .bind(&draft.branch)
    .execute(conn)
    .await
    .context("inserting menu item")?;
    Ok(result.last_insert_rowid())
}

/// Operator mutation of the locally-owned availability flag.
pub async fn set_availability(
    conn: &mut SqliteConnection,
    id: i64,
    availability: Availability,
) -> Result<()> {
    sqlx::query("UPDATE menu_items SET availability = ? WHERE id = ?")
        .bind(availability.as_str())
        .bind(id)
        .execute(conn)
        .await
        .context("setting menu availability")?;
    Ok(())
}

/// Operator mutation of the locally-owned photo reference.
pub async fn set_photo(conn: &mut SqliteConnection, id: i64, photo: Option<&str>) -> Result<()> {
    sqlx::query("UPDATE menu_items SET photo = ? WHERE id = ?")
        .bind(photo)
        .bind(id)
        .execute(conn)
        .await
        .context("setting menu photo")?;
    Ok(())
}
