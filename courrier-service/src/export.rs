//! CSV export of a courrier list view

use courrier_core::{Courrier, Entity};
use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::error::{ServiceError, ServiceResult};

const HEADER: [&str; 9] = [
    "Référence",
    "Sujet",
    "Type",
    "Catégorie",
    "État",
    "Priorité",
    "Destination",
    "Date",
    "Créé par",
];

/// Label shown for a destination entity
pub fn entity_label<'a>(entities: &'a [Entity], id: &str) -> &'a str {
    if id.is_empty() {
        return "Non assigné";
    }
    entities
        .iter()
        .find(|e| e.id == id)
        .map(|e| e.label.as_str())
        .unwrap_or("Inconnu")
}

/// Render courriers as CSV, every field quoted, rows joined by `\n`
pub fn to_csv(courriers: &[&Courrier], entities: &[Entity]) -> ServiceResult<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(HEADER)
        .map_err(|e| ServiceError::Internal(format!("Failed to write CSV header: {e}")))?;

    for c in courriers {
        let date = c.created_at.format("%d/%m/%Y").to_string();
        writer
            .write_record([
                c.reference.as_str(),
                c.subject.as_str(),
                c.courier_type.as_str(),
                c.category.as_str(),
                c.state.as_str(),
                c.priority.as_str(),
                entity_label(entities, &c.to_entity),
                date.as_str(),
                c.created_by.as_str(),
            ])
            .map_err(|e| ServiceError::Internal(format!("Failed to write CSV row: {e}")))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ServiceError::Internal(format!("Failed to get CSV output: {e}")))?;
    let mut output = String::from_utf8(bytes)
        .map_err(|e| ServiceError::Internal(format!("CSV output is not UTF-8: {e}")))?;

    // No terminator after the last row
    if output.ends_with('\n') {
        output.pop();
    }
    Ok(output)
}

/// Default export file name, e.g. `courriers_2024-03-05.csv`
pub fn export_file_name(today: chrono::NaiveDate) -> String {
    format!("courriers_{}.csv", today.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use courrier_core::{CourrierState, Priority};

    use super::*;

    fn entity() -> Entity {
        Entity {
            id: "1".into(),
            label: "Informatique".into(),
            description: String::new(),
            parent_entity_id: None,
            chef_id: None,
            email: None,
            phone: None,
            code: None,
            created_at: Utc::now(),
        }
    }

    fn courrier(subject: &str, to_entity: &str) -> Courrier {
        Courrier {
            id: "c1".into(),
            reference: "ESTSB-202403-AB12C".into(),
            from_entity: None,
            to_entity: to_entity.into(),
            courier_type: "1".into(),
            category: "3".into(),
            state: CourrierState::InProgress,
            subject: subject.into(),
            description: String::new(),
            priority: Priority::VeryUrgent,
            created_by: "3".into(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap(),
            attachments: Vec::new(),
            assigned_to: None,
            history: Vec::new(),
        }
    }

    #[test]
    fn test_header_only_for_empty_view() {
        let csv = to_csv(&[], &[]).unwrap();
        assert_eq!(
            csv,
            concat!(
                r#""Référence","Sujet","Type","Catégorie","État","#,
                r#""Priorité","Destination","Date","Créé par""#,
            )
        );
    }

    #[test]
    fn test_row_format() {
        let c = courrier("Demande de salle", "1");
        let csv = to_csv(&[&c], &[entity()]).unwrap();
        assert_eq!(csv.lines().count(), 2);
        assert!(!csv.ends_with('\n'));
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(
            row,
            concat!(
                r#""ESTSB-202403-AB12C","Demande de salle","1","3","in_progress","#,
                r#""very_urgent","Informatique","05/03/2024","3""#,
            )
        );
    }

    #[test]
    fn test_quotes_doubled_and_unknown_entity() {
        let c = courrier("Objet \"urgent\", svp", "99");
        let csv = to_csv(&[&c], &[entity()]).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert!(row.contains("\"Objet \"\"urgent\"\", svp\""));
        assert!(row.contains("\"Inconnu\""));
    }

    #[test]
    fn test_unassigned_label() {
        assert_eq!(entity_label(&[entity()], ""), "Non assigné");
    }

    #[test]
    fn test_file_name() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(export_file_name(day), "courriers_2024-03-05.csv");
    }
}
