//! Merge planning: carry locally-owned field values from stored records
//! onto freshly-normalized drafts before the replace.
//!
//! Matching is deliberately a case-folded string comparison on the
//! natural key (name, title): the source has no surrogate ids, so a map
//! from normalized key to current record is the documented strategy —
//! no id-based matching is attempted.

use std::collections::HashMap;

use smena_core::MenuItemDraft;
use smena_storage::menu::MenuItemRow;
use smena_storage::training::TrainingRow;

/// Normalized natural key for human-authored names and titles.
pub fn fold_key(value: &str) -> String {
    value.trim().to_lowercase()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MenuCarryover {
    pub status: usize,
    pub photos: usize,
}

/// Copy availability and photo from stored menu rows onto matching fresh
/// drafts. Misses keep the parser defaults (normal, no photo).
pub fn carry_menu_state(fresh: &mut [MenuItemDraft], existing: &[MenuItemRow]) -> MenuCarryover {
    let by_name: HashMap<String, &MenuItemRow> = existing
        .iter()
        .map(|row| (fold_key(&row.name), row))
        .collect();

    let mut carried = MenuCarryover::default();
    for draft in fresh {
        let Some(row) = by_name.get(&fold_key(&draft.name)) else {
            continue;
        };
        if row.availability != draft.availability {
            carried.status += 1;
        }
        draft.availability = row.availability;
        if let Some(photo) = &row.photo {
            draft.photo = Some(photo.clone());
            carried.photos += 1;
        }
    }
    carried
}

/// Title-keyed map of previously attached training files, used both as
/// carry-forward value and as download-failure fallback.
pub fn previous_training_files(existing: &[TrainingRow]) -> HashMap<String, String> {
    existing
        .iter()
        .filter_map(|row| {
            row.file_path
                .as_ref()
                .map(|path| (fold_key(&row.title), path.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use smena_core::{Availability, MenuSection, StaffRole};

    fn draft(name: &str) -> MenuItemDraft {
        MenuItemDraft {
            name: name.to_string(),
            description: None,
            composition: None,
            weight_volume: None,
            price: 100.0,
            category: "Завтраки".into(),
            subcategory: None,
            section: MenuSection::Kitchen,
            availability: Availability::Normal,
            photo: None,
            calories: None,
            proteins: None,
            fats: None,
            carbs: None,
            branch: "branch".into(),
        }
    }

    fn stored(name: &str, availability: Availability, photo: Option<&str>) -> MenuItemRow {
        MenuItemRow {
            id: 1,
            name: name.to_string(),
            description: None,
            composition: None,
            weight_volume: None,
            price: 90.0,
            category: "Завтраки".into(),
            subcategory: None,
            section: MenuSection::Kitchen,
            availability,
            photo: photo.map(ToString::to_string),
            calories: None,
            proteins: None,
            fats: None,
            carbs: None,
            branch: "branch".into(),
        }
    }

    #[test]
    fn matching_is_case_insensitive() {
        let mut fresh = vec![draft("Цезарь с курицей")];
        let existing = vec![stored("цезарь с курицей", Availability::Stop, Some("caesar.jpg"))];
        let carried = carry_menu_state(&mut fresh, &existing);
        assert_eq!(fresh[0].availability, Availability::Stop);
        assert_eq!(fresh[0].photo.as_deref(), Some("caesar.jpg"));
        assert_eq!(carried.status, 1);
        assert_eq!(carried.photos, 1);
    }

    #[test]
    fn new_items_keep_defaults() {
        let mut fresh = vec![draft("Новое блюдо")];
        let existing = vec![stored("Другое блюдо", Availability::Stop, None)];
        let carried = carry_menu_state(&mut fresh, &existing);
        assert_eq!(fresh[0].availability, Availability::Normal);
        assert_eq!(fresh[0].photo, None);
        assert_eq!(carried, MenuCarryover::default());
    }

    #[test]
    fn training_file_map_keys_fold_case() {
        let rows = vec![TrainingRow {
            id: 1,
            title: "Винная Карта".into(),
            description: None,
            body: "text".into(),
            topic: None,
            file_path: Some("/files/wine.pdf".into()),
            role: StaffRole::Waiter,
            position: 1,
            branch: "branch".into(),
        }];
        let map = previous_training_files(&rows);
        assert_eq!(map.get("винная карта").map(String::as_str), Some("/files/wine.pdf"));
    }
}
