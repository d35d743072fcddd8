//! Worksheet-name → domain mapping.
//!
//! The authored spreadsheet has a fixed set of worksheets per deployment;
//! the defaults below carry the original pilot's names and a YAML file can
//! remap them without recompiling.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use smena_core::{MenuSection, StaffRole};

/// One menu worksheet plus the section/category it lands in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuSheet {
    pub sheet: String,
    pub section: MenuSection,
    pub category: String,
}

/// A worksheet whose rows all belong to one role (training, checklists).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleSheet {
    pub sheet: String,
    pub role: StaffRole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetCatalog {
    pub staff: String,
    pub menu: Vec<MenuSheet>,
    pub training: Vec<RoleSheet>,
    pub checklists: Vec<RoleSheet>,
    pub assessments: String,
    pub motivation: String,
}

impl SheetCatalog {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }
}

impl Default for SheetCatalog {
    fn default() -> Self {
        let menu_sheet = |sheet: &str, section: MenuSection, category: &str| MenuSheet {
            sheet: sheet.to_string(),
            section,
            category: category.to_string(),
        };
        let role_sheet = |sheet: &str, role: StaffRole| RoleSheet {
            sheet: sheet.to_string(),
            role,
        };
        Self {
            staff: "Доступ".to_string(),
            menu: vec![
                menu_sheet("Завтраки", MenuSection::Kitchen, "Завтраки"),
                menu_sheet("Основное меню", MenuSection::Kitchen, "Основное меню"),
                menu_sheet("Сезонное меню", MenuSection::Kitchen, "Сезонное меню"),
                menu_sheet(
                    "Выпечка и десерты",
                    MenuSection::Kitchen,
                    "Меню выпечки и десертов",
                ),
                menu_sheet(
                    "Безалкогольные напитки",
                    MenuSection::Bar,
                    "Безалкогольные напитки",
                ),
                menu_sheet(
                    "Алкогольные напитки",
                    MenuSection::Bar,
                    "Алкогольные напитки",
                ),
            ],
            training: vec![
                role_sheet("Обучение: хостес", StaffRole::Hostess),
                role_sheet("Обучение: официанты", StaffRole::Waiter),
                role_sheet("Обучение: бармены", StaffRole::Bartender),
                role_sheet("Обучение: менеджеры", StaffRole::Manager),
            ],
            checklists: vec![
                role_sheet("Чек-лист: официанты", StaffRole::Waiter),
                role_sheet("Чек-лист: менеджеры", StaffRole::Manager),
            ],
            assessments: "Аттестация".to_string(),
            motivation: "Мотивация".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_covers_all_domains() {
        let catalog = SheetCatalog::default();
        assert_eq!(catalog.menu.len(), 6);
        assert_eq!(catalog.training.len(), 4);
        assert_eq!(catalog.checklists.len(), 2);
        assert!(!catalog.staff.is_empty());
        assert!(!catalog.assessments.is_empty());
        assert!(!catalog.motivation.is_empty());
    }

    #[test]
    fn catalog_round_trips_through_yaml() {
        let catalog = SheetCatalog::default();
        let yaml = serde_yaml::to_string(&catalog).unwrap();
        let parsed: SheetCatalog = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, catalog);
    }
}
