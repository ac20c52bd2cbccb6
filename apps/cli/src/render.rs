use anyhow::Result;
use client_core::Pipeline;
use serde::Serialize;
use shared::domain::{Alternant, Dossier, Entreprise, Tuteur};

pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn board(pipeline: &Pipeline) {
    for column in pipeline.columns() {
        println!(
            "== {} [{}] ({}) ==",
            column.title(),
            column.status,
            column.len()
        );
        if column.is_empty() {
            println!("   (vide)");
        }
        for dossier in &column.dossiers {
            println!("   {}", dossier_line(dossier));
        }
    }
    println!("total: {}", pipeline.total());
}

pub fn dossier_list(dossiers: &[Dossier]) {
    if dossiers.is_empty() {
        println!("aucun dossier");
        return;
    }
    for dossier in dossiers {
        println!("{:<13} {}", dossier.status.label(), dossier_line(dossier));
    }
}

fn dossier_line(dossier: &Dossier) -> String {
    let alternant = dossier
        .alternant
        .as_ref()
        .map(|a| format!("{} {}", a.prenom, a.nom))
        .unwrap_or_else(|| format!("alternant {}", dossier.alternant_id));
    let entreprise = dossier
        .entreprise
        .as_ref()
        .map(|e| e.nom.clone())
        .unwrap_or_else(|| format!("entreprise {}", dossier.entreprise_id));
    let dates_flag = if dossier.has_coherent_dates() { "" } else { " (!)" };
    format!(
        "{}  {alternant} @ {entreprise}  {} -> {}{dates_flag}",
        dossier.id, dossier.date_debut, dossier.date_fin
    )
}

pub fn alternants(alternants: &[Alternant]) {
    for a in alternants {
        println!(
            "{}  {} {}  <{}>  {}",
            a.id,
            a.prenom,
            a.nom,
            a.email,
            a.formation.as_deref().unwrap_or("-")
        );
    }
}

pub fn entreprises(entreprises: &[Entreprise]) {
    for e in entreprises {
        println!(
            "{}  {}  siret={}  {}",
            e.id,
            e.nom,
            e.siret.as_deref().unwrap_or("-"),
            e.ville.as_deref().unwrap_or("-")
        );
    }
}

pub fn tuteurs(tuteurs: &[Tuteur]) {
    for t in tuteurs {
        println!("{}  {} {}  <{}>", t.id, t.prenom, t.nom, t.email);
    }
}
