use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

use shared::domain::{
    Alternant, AlternantId, AlternantSummary, Dossier, DossierId, Entreprise, EntrepriseId,
    EntrepriseSummary, NewAlternant, NewDossier, NewEntreprise, NewTuteur, Status, Tuteur,
    TuteurId, TuteurSummary,
};

const DOSSIER_SELECT: &str = "SELECT d.id, d.alternant_id, d.entreprise_id, d.tuteur_id, d.status,
        d.date_debut, d.date_fin, d.commentaires, d.created_at,
        a.nom AS alternant_nom, a.prenom AS alternant_prenom,
        e.nom AS entreprise_nom,
        t.nom AS tuteur_nom, t.prenom AS tuteur_prenom
 FROM dossiers d
 LEFT JOIN alternants a ON a.id = d.alternant_id
 LEFT JOIN entreprises e ON e.id = d.entreprise_id
 LEFT JOIN tuteurs t ON t.id = d.tuteur_id";

/// SQLite-backed case store: parties and dossiers.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn create_alternant(&self, new: &NewAlternant) -> Result<Alternant> {
        let alternant = Alternant {
            id: AlternantId::generate(),
            created_at: Utc::now(),
            nom: new.nom.trim().to_string(),
            prenom: new.prenom.trim().to_string(),
            email: new.email.trim().to_string(),
            telephone: new.telephone.clone(),
            date_naissance: new.date_naissance,
            adresse: new.adresse.clone(),
            code_postal: new.code_postal.clone(),
            ville: new.ville.clone(),
            formation: new.formation.clone(),
        };
        sqlx::query(
            "INSERT INTO alternants (id, created_at, nom, prenom, email, telephone, date_naissance, adresse, code_postal, ville, formation)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(alternant.id.as_str())
        .bind(alternant.created_at)
        .bind(&alternant.nom)
        .bind(&alternant.prenom)
        .bind(&alternant.email)
        .bind(alternant.telephone.as_deref())
        .bind(alternant.date_naissance)
        .bind(alternant.adresse.as_deref())
        .bind(alternant.code_postal.as_deref())
        .bind(alternant.ville.as_deref())
        .bind(alternant.formation.as_deref())
        .execute(&self.pool)
        .await
        .context("failed to insert alternant")?;
        debug!(alternant_id = %alternant.id, "store: alternant inserted");
        Ok(alternant)
    }

    pub async fn list_alternants(&self) -> Result<Vec<Alternant>> {
        let rows = sqlx::query(
            "SELECT id, created_at, nom, prenom, email, telephone, date_naissance, adresse, code_postal, ville, formation
             FROM alternants
             ORDER BY lower(nom) ASC, lower(prenom) ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(Alternant {
                    id: AlternantId(r.try_get("id")?),
                    created_at: r.try_get("created_at")?,
                    nom: r.try_get("nom")?,
                    prenom: r.try_get("prenom")?,
                    email: r.try_get("email")?,
                    telephone: r.try_get("telephone")?,
                    date_naissance: r.try_get("date_naissance")?,
                    adresse: r.try_get("adresse")?,
                    code_postal: r.try_get("code_postal")?,
                    ville: r.try_get("ville")?,
                    formation: r.try_get("formation")?,
                })
            })
            .collect()
    }

    pub async fn alternant_exists(&self, alternant_id: &AlternantId) -> Result<bool> {
        self.row_exists("SELECT 1 FROM alternants WHERE id = ?", alternant_id.as_str())
            .await
    }

    pub async fn create_entreprise(&self, new: &NewEntreprise) -> Result<Entreprise> {
        let entreprise = Entreprise {
            id: EntrepriseId::generate(),
            created_at: Utc::now(),
            nom: new.nom.trim().to_string(),
            siret: new
                .siret
                .as_deref()
                .map(str::trim)
                .filter(|siret| !siret.is_empty())
                .map(str::to_string),
            adresse: new.adresse.clone(),
            code_postal: new.code_postal.clone(),
            ville: new.ville.clone(),
            telephone: new.telephone.clone(),
            email: new.email.clone(),
        };
        sqlx::query(
            "INSERT INTO entreprises (id, created_at, nom, siret, adresse, code_postal, ville, telephone, email)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entreprise.id.as_str())
        .bind(entreprise.created_at)
        .bind(&entreprise.nom)
        .bind(entreprise.siret.as_deref())
        .bind(entreprise.adresse.as_deref())
        .bind(entreprise.code_postal.as_deref())
        .bind(entreprise.ville.as_deref())
        .bind(entreprise.telephone.as_deref())
        .bind(entreprise.email.as_deref())
        .execute(&self.pool)
        .await
        .context("failed to insert entreprise")?;
        debug!(entreprise_id = %entreprise.id, "store: entreprise inserted");
        Ok(entreprise)
    }

    pub async fn list_entreprises(&self) -> Result<Vec<Entreprise>> {
        let rows = sqlx::query(
            "SELECT id, created_at, nom, siret, adresse, code_postal, ville, telephone, email
             FROM entreprises
             ORDER BY lower(nom) ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(Entreprise {
                    id: EntrepriseId(r.try_get("id")?),
                    created_at: r.try_get("created_at")?,
                    nom: r.try_get("nom")?,
                    siret: r.try_get("siret")?,
                    adresse: r.try_get("adresse")?,
                    code_postal: r.try_get("code_postal")?,
                    ville: r.try_get("ville")?,
                    telephone: r.try_get("telephone")?,
                    email: r.try_get("email")?,
                })
            })
            .collect()
    }

    pub async fn entreprise_exists(&self, entreprise_id: &EntrepriseId) -> Result<bool> {
        self.row_exists("SELECT 1 FROM entreprises WHERE id = ?", entreprise_id.as_str())
            .await
    }

    pub async fn create_tuteur(&self, new: &NewTuteur) -> Result<Tuteur> {
        let tuteur = Tuteur {
            id: TuteurId::generate(),
            created_at: Utc::now(),
            nom: new.nom.trim().to_string(),
            prenom: new.prenom.trim().to_string(),
            email: new.email.trim().to_string(),
            telephone: new.telephone.clone(),
        };
        sqlx::query(
            "INSERT INTO tuteurs (id, created_at, nom, prenom, email, telephone) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(tuteur.id.as_str())
        .bind(tuteur.created_at)
        .bind(&tuteur.nom)
        .bind(&tuteur.prenom)
        .bind(&tuteur.email)
        .bind(tuteur.telephone.as_deref())
        .execute(&self.pool)
        .await
        .context("failed to insert tuteur")?;
        debug!(tuteur_id = %tuteur.id, "store: tuteur inserted");
        Ok(tuteur)
    }

    pub async fn list_tuteurs(&self) -> Result<Vec<Tuteur>> {
        let rows = sqlx::query(
            "SELECT id, created_at, nom, prenom, email, telephone
             FROM tuteurs
             ORDER BY lower(nom) ASC, lower(prenom) ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(Tuteur {
                    id: TuteurId(r.try_get("id")?),
                    created_at: r.try_get("created_at")?,
                    nom: r.try_get("nom")?,
                    prenom: r.try_get("prenom")?,
                    email: r.try_get("email")?,
                    telephone: r.try_get("telephone")?,
                })
            })
            .collect()
    }

    pub async fn tuteur_exists(&self, tuteur_id: &TuteurId) -> Result<bool> {
        self.row_exists("SELECT 1 FROM tuteurs WHERE id = ?", tuteur_id.as_str())
            .await
    }

    /// Inserts a dossier and returns it with its resolved party summaries.
    pub async fn insert_dossier(&self, new: &NewDossier) -> Result<Dossier> {
        let dossier_id = DossierId::generate();
        let created_at: DateTime<Utc> = Utc::now();
        sqlx::query(
            "INSERT INTO dossiers (id, created_at, alternant_id, entreprise_id, tuteur_id, status, date_debut, date_fin, commentaires)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(dossier_id.as_str())
        .bind(created_at)
        .bind(new.alternant_id.as_str())
        .bind(new.entreprise_id.as_str())
        .bind(new.tuteur_id.as_str())
        .bind(new.status.as_str())
        .bind(new.date_debut)
        .bind(new.date_fin)
        .bind(&new.commentaires)
        .execute(&self.pool)
        .await
        .context("failed to insert dossier")?;
        debug!(dossier_id = %dossier_id, status = %new.status, "store: dossier inserted");

        self.load_dossier(&dossier_id)
            .await?
            .ok_or_else(|| anyhow!("dossier {dossier_id} vanished right after insert"))
    }

    /// All dossiers in creation order.
    pub async fn list_dossiers(&self) -> Result<Vec<Dossier>> {
        let rows = sqlx::query(&format!(
            "{DOSSIER_SELECT} ORDER BY d.created_at ASC, d.rowid ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(dossier_from_row).collect()
    }

    pub async fn load_dossier(&self, dossier_id: &DossierId) -> Result<Option<Dossier>> {
        let row = sqlx::query(&format!("{DOSSIER_SELECT} WHERE d.id = ?"))
            .bind(dossier_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(dossier_from_row).transpose()
    }

    /// Returns `None` when no dossier carries `dossier_id`.
    pub async fn update_dossier_status(
        &self,
        dossier_id: &DossierId,
        status: Status,
    ) -> Result<Option<Dossier>> {
        let updated = sqlx::query("UPDATE dossiers SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(dossier_id.as_str())
            .execute(&self.pool)
            .await
            .context("failed to update dossier status")?
            .rows_affected();
        if updated == 0 {
            return Ok(None);
        }
        debug!(dossier_id = %dossier_id, %status, "store: dossier status updated");
        self.load_dossier(dossier_id).await
    }

    /// Returns `false` when no dossier carries `dossier_id`.
    pub async fn delete_dossier(&self, dossier_id: &DossierId) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM dossiers WHERE id = ?")
            .bind(dossier_id.as_str())
            .execute(&self.pool)
            .await
            .context("failed to delete dossier")?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn row_exists(&self, query: &str, id: &str) -> Result<bool> {
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}

/// True when `err` was caused by a UNIQUE constraint.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<sqlx::Error>()
            .and_then(|sqlx_err| sqlx_err.as_database_error())
            .is_some_and(|db_err| db_err.is_unique_violation())
    })
}

fn dossier_from_row(r: &SqliteRow) -> Result<Dossier> {
    let raw_status: String = r.try_get("status")?;
    let status = raw_status
        .parse::<Status>()
        .with_context(|| format!("dossier row carries an invalid status '{raw_status}'"))?;

    let alternant_id = AlternantId(r.try_get("alternant_id")?);
    let entreprise_id = EntrepriseId(r.try_get("entreprise_id")?);
    let tuteur_id = TuteurId(r.try_get("tuteur_id")?);

    let alternant = match (
        r.try_get::<Option<String>, _>("alternant_nom")?,
        r.try_get::<Option<String>, _>("alternant_prenom")?,
    ) {
        (Some(nom), Some(prenom)) => Some(AlternantSummary {
            id: alternant_id.clone(),
            nom,
            prenom,
        }),
        _ => None,
    };
    let entreprise = r
        .try_get::<Option<String>, _>("entreprise_nom")?
        .map(|nom| EntrepriseSummary {
            id: entreprise_id.clone(),
            nom,
        });
    let tuteur = match (
        r.try_get::<Option<String>, _>("tuteur_nom")?,
        r.try_get::<Option<String>, _>("tuteur_prenom")?,
    ) {
        (Some(nom), Some(prenom)) => Some(TuteurSummary {
            id: tuteur_id.clone(),
            nom,
            prenom,
        }),
        _ => None,
    };

    Ok(Dossier {
        id: DossierId(r.try_get("id")?),
        alternant_id,
        entreprise_id,
        tuteur_id,
        alternant,
        entreprise,
        tuteur,
        status,
        date_debut: r.try_get::<NaiveDate, _>("date_debut")?,
        date_fin: r.try_get::<NaiveDate, _>("date_fin")?,
        commentaires: r.try_get("commentaires")?,
        created_at: r.try_get("created_at")?,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
