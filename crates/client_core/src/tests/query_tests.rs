use super::*;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use shared::domain::{AlternantSummary, DossierId, EntrepriseSummary};

fn dossier(
    id: &str,
    name: Option<(&str, &str)>,
    entreprise: &str,
    status: Status,
    day: u32,
) -> Dossier {
    Dossier {
        id: DossierId::from(id),
        alternant_id: "alt".into(),
        entreprise_id: "ent".into(),
        tuteur_id: "tut".into(),
        alternant: name.map(|(nom, prenom)| AlternantSummary {
            id: "alt".into(),
            nom: nom.to_string(),
            prenom: prenom.to_string(),
        }),
        entreprise: Some(EntrepriseSummary {
            id: "ent".into(),
            nom: entreprise.to_string(),
        }),
        tuteur: None,
        status,
        date_debut: NaiveDate::from_ymd_opt(2025, 9, 1).expect("date"),
        date_fin: NaiveDate::from_ymd_opt(2026, 8, 31).expect("date"),
        commentaires: String::new(),
        created_at: Utc
            .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
            .single()
            .expect("ts")
            + Duration::days(i64::from(day)),
    }
}

fn sample() -> Vec<Dossier> {
    vec![
        dossier("d-1", Some(("Martin", "Jules")), "Entreprise A", Status::Request, 3),
        dossier("d-2", Some(("Dubois", "Chloé")), "Entreprise B", Status::Created, 1),
        dossier("d-3", None, "Entreprise C", Status::Request, 2),
        dossier("d-4", Some(("Martin", "Alice")), "Entreprise B", Status::Processing, 4),
    ]
}

fn ids(dossiers: &[Dossier]) -> Vec<&str> {
    dossiers.iter().map(|d| d.id.as_str()).collect()
}

#[test]
fn empty_filter_keeps_everything_newest_first() {
    let result = apply(&sample(), &DossierFilter::default(), SortOrder::default());
    assert_eq!(ids(&result), vec!["d-4", "d-1", "d-3", "d-2"]);
}

#[test]
fn oldest_first_sorts_by_creation() {
    let result = apply(&sample(), &DossierFilter::default(), SortOrder::OldestFirst);
    assert_eq!(ids(&result), vec!["d-2", "d-3", "d-1", "d-4"]);
}

#[test]
fn search_is_case_insensitive_over_names_entreprise_and_id() {
    let search = |needle: &str| DossierFilter {
        search: Some(needle.to_string()),
        status: None,
    };
    let data = sample();

    let found = |needle: &str| {
        apply(&data, &search(needle), SortOrder::OldestFirst)
            .into_iter()
            .map(|d| d.id.0)
            .collect::<Vec<_>>()
    };

    assert_eq!(found("martin"), vec!["d-1", "d-4"]);
    assert_eq!(found("CHLO"), vec!["d-2"]);
    assert_eq!(found("entreprise b"), vec!["d-2", "d-4"]);
    assert_eq!(found("D-3"), vec!["d-3"]);
    assert!(found("zzz").is_empty());
    assert_eq!(found("   ").len(), 4);
}

#[test]
fn status_filter_combines_with_search() {
    let filter = DossierFilter {
        search: Some("entreprise".to_string()),
        status: Some(Status::Request),
    };
    let result = apply(&sample(), &filter, SortOrder::OldestFirst);
    assert_eq!(ids(&result), vec!["d-3", "d-1"]);
}

#[test]
fn name_sorts_put_missing_alternant_last() {
    let data = sample();
    assert_eq!(
        ids(&apply(&data, &DossierFilter::default(), SortOrder::AlternantAz)),
        vec!["d-2", "d-4", "d-1", "d-3"]
    );
    assert_eq!(
        ids(&apply(&data, &DossierFilter::default(), SortOrder::AlternantZa)),
        vec!["d-1", "d-4", "d-2", "d-3"]
    );
}

#[test]
fn sort_order_parses_cli_names() {
    assert_eq!("newest".parse(), Ok(SortOrder::NewestFirst));
    assert_eq!("Oldest".parse(), Ok(SortOrder::OldestFirst));
    assert_eq!("name-asc".parse(), Ok(SortOrder::AlternantAz));
    assert_eq!("za".parse(), Ok(SortOrder::AlternantZa));
    assert!("sideways".parse::<SortOrder>().is_err());
    for order in [
        SortOrder::NewestFirst,
        SortOrder::OldestFirst,
        SortOrder::AlternantAz,
        SortOrder::AlternantZa,
    ] {
        assert_eq!(order.to_string().parse(), Ok(order));
    }
}
