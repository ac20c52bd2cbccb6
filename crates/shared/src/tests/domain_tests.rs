use super::*;

fn sample_dossier() -> Dossier {
    Dossier {
        id: DossierId::from("d-1"),
        alternant_id: AlternantId::from("a-1"),
        entreprise_id: EntrepriseId::from("e-1"),
        tuteur_id: TuteurId::from("t-1"),
        alternant: Some(AlternantSummary {
            id: AlternantId::from("a-1"),
            nom: "Durand".to_string(),
            prenom: "Lucie".to_string(),
        }),
        entreprise: None,
        tuteur: None,
        status: Status::Created,
        date_debut: NaiveDate::from_ymd_opt(2024, 9, 2).expect("date"),
        date_fin: NaiveDate::from_ymd_opt(2026, 8, 31).expect("date"),
        commentaires: String::new(),
        created_at: DateTime::parse_from_rfc3339("2024-06-01T08:30:00Z")
            .expect("timestamp")
            .with_timezone(&Utc),
    }
}

#[test]
fn parses_every_known_status() {
    for status in Status::ALL {
        assert_eq!(status.as_str().parse::<Status>(), Ok(status));
    }
}

#[test]
fn rejects_unknown_status_strings() {
    let err = "UNKNOWN".parse::<Status>().expect_err("must reject");
    assert_eq!(err, InvalidStatus("UNKNOWN".to_string()));
    assert!(Status::try_from("request").is_err());
    assert!(Status::try_from("").is_err());
}

#[test]
fn status_text_and_json_reject_the_same_padded_name() {
    assert_eq!(
        " REQUEST ".parse::<Status>(),
        Err(InvalidStatus(" REQUEST ".to_string()))
    );
    assert!(serde_json::from_str::<Status>("\" REQUEST \"").is_err());
}

#[test]
fn status_serializes_as_upper_case_name() {
    let json = serde_json::to_string(&Status::Verification).expect("json");
    assert_eq!(json, "\"VERIFICATION\"");
    let decoded: Status = serde_json::from_str("\"PROCESSING\"").expect("decode");
    assert_eq!(decoded, Status::Processing);
    assert!(serde_json::from_str::<Status>("\"ARCHIVED\"").is_err());
}

#[test]
fn column_indices_follow_board_order() {
    let indices: Vec<usize> = Status::ALL.iter().map(|s| s.column_index()).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
}

#[test]
fn dossier_json_uses_plain_dates_and_skips_missing_summaries() {
    let dossier = sample_dossier();
    let value = serde_json::to_value(&dossier).expect("json");
    assert_eq!(value["id"], "d-1");
    assert_eq!(value["status"], "CREATED");
    assert_eq!(value["date_debut"], "2024-09-02");
    assert_eq!(value["alternant"]["prenom"], "Lucie");
    assert!(value.get("entreprise").is_none());

    let decoded: Dossier = serde_json::from_value(value).expect("decode");
    assert_eq!(decoded, dossier);
}

#[test]
fn dossier_with_unknown_status_fails_to_decode() {
    let mut value = serde_json::to_value(sample_dossier()).expect("json");
    value["status"] = serde_json::json!("UNKNOWN");
    assert!(serde_json::from_value::<Dossier>(value).is_err());
}

#[test]
fn new_dossier_defaults_to_request() {
    let new: NewDossier = serde_json::from_value(serde_json::json!({
        "alternant_id": "a-1",
        "entreprise_id": "e-1",
        "tuteur_id": "t-1",
        "date_debut": "2024-09-02",
        "date_fin": "2025-09-01"
    }))
    .expect("decode");
    assert_eq!(new.status, Status::Request);
    assert!(new.commentaires.is_empty());
}

#[test]
fn reports_incoherent_dates_without_rejecting() {
    let mut dossier = sample_dossier();
    assert!(dossier.has_coherent_dates());
    dossier.date_fin = NaiveDate::from_ymd_opt(2023, 1, 1).expect("date");
    assert!(!dossier.has_coherent_dates());
}

#[test]
fn generated_ids_are_unique() {
    assert_ne!(DossierId::generate(), DossierId::generate());
}
