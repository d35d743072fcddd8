//! Per-domain row normalizers.
//!
//! Each function turns raw header→cell maps into typed drafts. Invalid
//! rows are skipped with a warning, never fatal: a sheet with one bad row
//! still reconciles the rest.

use smena_core::{
    AnswerDraft, ChecklistDraft, EmployeeDraft, MenuItemDraft, QuestionDraft, QuizDraft,
    StaffRole, TrainingDraft,
};
use std::collections::HashMap;
use tracing::warn;

use crate::catalog::MenuSheet;
use crate::client::RawRow;

fn cell<'a>(row: &'a RawRow, key: &str) -> &'a str {
    row.get(key).map(|s| s.trim()).unwrap_or("")
}

fn opt_text(row: &RawRow, key: &str) -> Option<String> {
    let value = cell(row, key);
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Lenient float parse accepting decimal commas ("320,50").
fn parse_float(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(',', ".");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Integers arrive as "70", "70,0" or "70.0" depending on cell format.
fn parse_int(raw: &str) -> Option<i64> {
    parse_float(raw).map(|v| v as i64)
}

/// A contact cell with at least seven digits is a phone number; anything
/// else is treated as a chat handle.
pub fn looks_like_phone(contact: &str) -> bool {
    contact.chars().filter(|c| c.is_ascii_digit()).count() >= 7
}

/// Digits only; a leading 8 on an eleven-digit number becomes 7, a bare
/// ten-digit number is prefixed with 7. Must agree with the chat-side
/// lookup so source rows and bound accounts match.
pub fn normalize_phone(raw: &str) -> String {
    let mut digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 11 && digits.starts_with('8') {
        digits.replace_range(0..1, "7");
    }
    if digits.len() == 10 {
        digits.insert(0, '7');
    }
    digits
}

pub fn normalize_handle(raw: &str) -> String {
    raw.trim().trim_start_matches('@').to_lowercase()
}

fn parse_active_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "" | "да" | "yes" | "true" | "1" | "активен"
    )
}

/// Staff directory sheet: requires a name and a contact; the role must be
/// in the fixed vocabulary. Blank branch cells fall back to the default.
pub fn employee_rows(rows: &[RawRow], default_branch: &str) -> Vec<EmployeeDraft> {
    let mut out = Vec::new();
    for row in rows {
        let full_name = cell(row, "ФИО");
        let contact = cell(row, "Телефон");
        if full_name.is_empty() || contact.is_empty() {
            continue;
        }
        let role_label = cell(row, "Должность");
        let Some(role) = StaffRole::parse(role_label) else {
            warn!(role = role_label, employee = full_name, "unknown role, row skipped");
            continue;
        };
        let branch = match cell(row, "Филиал") {
            "" => default_branch.to_string(),
            other => other.to_string(),
        };
        let (phone, handle) = if looks_like_phone(contact) {
            (Some(normalize_phone(contact)), None)
        } else {
            (None, Some(normalize_handle(contact)))
        };
        out.push(EmployeeDraft {
            full_name: full_name.to_string(),
            phone,
            handle,
            role,
            branch,
            is_active: parse_active_flag(cell(row, "Активен")),
        });
    }
    out
}

/// Menu sheet: a row needs a dish name and a parseable price; optional
/// numeric cells are best-effort and become `None` when unparsable.
pub fn menu_rows(rows: &[RawRow], sheet: &MenuSheet, branch: &str) -> Vec<MenuItemDraft> {
    let mut out = Vec::new();
    for row in rows {
        let name = cell(row, "Название блюда");
        if name.is_empty() {
            continue;
        }
        let Some(price) = parse_float(cell(row, "Цена (руб.)")) else {
            warn!(dish = name, sheet = sheet.sheet.as_str(), "missing price, row skipped");
            continue;
        };
        out.push(MenuItemDraft {
            name: name.to_string(),
            description: opt_text(row, "Краткое описание"),
            composition: opt_text(row, "Состав"),
            weight_volume: opt_text(row, "Вес/Объём"),
            price,
            category: sheet.category.clone(),
            subcategory: opt_text(row, "Подкатегория"),
            section: sheet.section,
            availability: smena_core::Availability::Normal,
            photo: None,
            calories: parse_int(cell(row, "Калории")),
            proteins: parse_float(cell(row, "Белки (г)")),
            fats: parse_float(cell(row, "Жиры (г)")),
            carbs: parse_float(cell(row, "Углеводы (г)")),
            branch: branch.to_string(),
        });
    }
    out
}

/// Training sheet for one role: title and body text are required; the
/// file link column has two historical spellings.
pub fn training_rows(rows: &[RawRow], role: StaffRole, branch: &str) -> Vec<TrainingDraft> {
    let mut out = Vec::new();
    let mut position = 0i64;
    for row in rows {
        let title = cell(row, "Название материала");
        let body = cell(row, "Текст материала");
        if title.is_empty() || body.is_empty() {
            continue;
        }
        position += 1;
        let file_url = opt_text(row, "Файл PDF").or_else(|| opt_text(row, "Ссылка на файл"));
        out.push(TrainingDraft {
            title: title.to_string(),
            description: opt_text(row, "Краткое описание"),
            body: body.to_string(),
            topic: opt_text(row, "Тема"),
            role,
            position,
            branch: branch.to_string(),
            file_url,
            file_path: None,
        });
    }
    out
}

pub fn checklist_rows(rows: &[RawRow], role: StaffRole, branch: &str) -> Vec<ChecklistDraft> {
    let mut out = Vec::new();
    let mut position = 0i64;
    for row in rows {
        let task = cell(row, "Задача");
        if task.is_empty() {
            continue;
        }
        position += 1;
        out.push(ChecklistDraft {
            role,
            category: opt_text(row, "Категория"),
            task: task.to_string(),
            position,
            branch: branch.to_string(),
        });
    }
    out
}

/// Assessment sheet: one row per question. The first row naming a
/// (title, role) pair defines the test header; answer options 1–4 are
/// included when non-empty and marked correct iff their index equals the
/// row's stated correct number. Questions without any answers are
/// dropped.
pub fn quiz_rows(rows: &[RawRow], branch: &str) -> Vec<QuizDraft> {
    let mut quizzes: Vec<QuizDraft> = Vec::new();
    let mut index: HashMap<(String, StaffRole), usize> = HashMap::new();

    for row in rows {
        let title = cell(row, "Название теста");
        let question_text = cell(row, "Вопрос");
        if title.is_empty() || question_text.is_empty() {
            continue;
        }
        let Some(role) = StaffRole::parse(cell(row, "Должность")) else {
            continue;
        };

        let key = (title.to_lowercase(), role);
        let quiz_idx = *index.entry(key).or_insert_with(|| {
            quizzes.push(QuizDraft {
                title: title.to_string(),
                role,
                passing_score: parse_int(cell(row, "Проходной балл (%)")).unwrap_or(70),
                max_attempts: parse_int(cell(row, "Количество попыток")).unwrap_or(3),
                seconds_per_question: parse_int(cell(row, "Секунд на вопрос")).unwrap_or(30),
                branch: branch.to_string(),
                questions: Vec::new(),
            });
            quizzes.len() - 1
        });

        let correct = parse_int(cell(row, "Правильный ответ (номер)"));
        let mut answers = Vec::new();
        for option in 1..=4i64 {
            let text = cell(row, &format!("Ответ {option}"));
            if text.is_empty() {
                continue;
            }
            answers.push(AnswerDraft {
                text: text.to_string(),
                is_correct: Some(option) == correct,
            });
        }
        if answers.is_empty() {
            warn!(test = title, question = question_text, "question has no answers, skipped");
            continue;
        }

        let quiz = &mut quizzes[quiz_idx];
        quiz.questions.push(QuestionDraft {
            text: question_text.to_string(),
            position: quiz.questions.len() as i64 + 1,
            answers,
        });
    }

    quizzes
}

pub fn motivation_rows(rows: &[RawRow]) -> Vec<String> {
    rows.iter()
        .filter_map(|row| opt_text(row, "Текст сообщения"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use smena_core::MenuSection;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn breakfast_sheet() -> MenuSheet {
        MenuSheet {
            sheet: "Завтраки".into(),
            section: MenuSection::Kitchen,
            category: "Завтраки".into(),
        }
    }

    #[test]
    fn menu_row_without_price_is_skipped() {
        let rows = vec![
            row(&[("Название блюда", "Сырники"), ("Цена (руб.)", "320")]),
            row(&[("Название блюда", "Борщ"), ("Цена (руб.)", "по запросу")]),
            row(&[("Название блюда", ""), ("Цена (руб.)", "100")]),
        ];
        let items = menu_rows(&rows, &breakfast_sheet(), "branch");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Сырники");
        assert_eq!(items[0].price, 320.0);
    }

    #[test]
    fn menu_optional_numerics_are_best_effort() {
        let rows = vec![row(&[
            ("Название блюда", "Каша"),
            ("Цена (руб.)", "190,50"),
            ("Калории", "210"),
            ("Белки (г)", "n/a"),
            ("Жиры (г)", "6,2"),
        ])];
        let items = menu_rows(&rows, &breakfast_sheet(), "branch");
        assert_eq!(items[0].price, 190.5);
        assert_eq!(items[0].calories, Some(210));
        assert_eq!(items[0].proteins, None);
        assert_eq!(items[0].fats, Some(6.2));
        assert_eq!(items[0].carbs, None);
    }

    #[test]
    fn contact_cell_is_classified_as_phone_or_handle() {
        let rows = vec![
            row(&[
                ("ФИО", "Иванова Анна"),
                ("Телефон", "+7 999 123-45-67"),
                ("Должность", "официант"),
            ]),
            row(&[
                ("ФИО", "Петров Илья"),
                ("Телефон", "@Petrov_I"),
                ("Должность", "бармен"),
            ]),
        ];
        let employees = employee_rows(&rows, "default");
        assert_eq!(employees[0].phone.as_deref(), Some("79991234567"));
        assert_eq!(employees[0].handle, None);
        assert_eq!(employees[1].phone, None);
        assert_eq!(employees[1].handle.as_deref(), Some("petrov_i"));
        assert_eq!(employees[1].branch, "default");
    }

    #[test]
    fn unknown_role_skips_the_employee_row() {
        let rows = vec![row(&[
            ("ФИО", "Сидоров Пётр"),
            ("Телефон", "79990000000"),
            ("Должность", "повар"),
        ])];
        assert!(employee_rows(&rows, "default").is_empty());
    }

    #[test]
    fn phone_normalization_matches_chat_side_rules() {
        assert_eq!(normalize_phone("8 (999) 123-45-67"), "79991234567");
        assert_eq!(normalize_phone("9991234567"), "79991234567");
        assert_eq!(normalize_phone("+7 999 123 45 67"), "79991234567");
    }

    #[test]
    fn quiz_rows_group_by_title_and_role() {
        let rows = vec![
            row(&[
                ("Название теста", "Basics"),
                ("Должность", "официант"),
                ("Проходной балл (%)", "80"),
                ("Вопрос", "Q1"),
                ("Ответ 1", "A"),
                ("Ответ 2", "B"),
                ("Ответ 3", "C"),
                ("Правильный ответ (номер)", "2"),
            ]),
            row(&[
                ("Название теста", "basics"),
                ("Должность", "Официант"),
                ("Вопрос", "Q2"),
                ("Ответ 1", "D"),
                ("Ответ 2", "E"),
                ("Ответ 3", "F"),
                ("Правильный ответ (номер)", "1"),
            ]),
        ];
        let quizzes = quiz_rows(&rows, "branch");
        assert_eq!(quizzes.len(), 1);
        let quiz = &quizzes[0];
        assert_eq!(quiz.title, "Basics");
        assert_eq!(quiz.passing_score, 80);
        assert_eq!(quiz.questions.len(), 2);
        assert_eq!(quiz.questions[0].answers.len(), 3);
        assert!(quiz.questions[0].answers[1].is_correct);
        assert_eq!(
            quiz.questions[1]
                .answers
                .iter()
                .filter(|a| a.is_correct)
                .count(),
            1
        );
    }

    #[test]
    fn quiz_row_without_answers_is_dropped() {
        let rows = vec![row(&[
            ("Название теста", "Basics"),
            ("Должность", "официант"),
            ("Вопрос", "Q1"),
            ("Правильный ответ (номер)", "1"),
        ])];
        let quizzes = quiz_rows(&rows, "branch");
        assert_eq!(quizzes.len(), 1);
        assert!(quizzes[0].questions.is_empty());
    }

    #[test]
    fn checklist_rows_keep_sheet_order() {
        let rows = vec![
            row(&[("Категория", "Открытие"), ("Задача", "Проверить зал")]),
            row(&[("Задача", "")]),
            row(&[("Задача", "Включить кофемашину")]),
        ];
        let items = checklist_rows(&rows, StaffRole::Waiter, "branch");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].position, 1);
        assert_eq!(items[1].position, 2);
        assert_eq!(items[1].category, None);
    }
}
