use shared::{
    domain::{
        Alternant, Dossier, DossierId, Entreprise, NewAlternant, NewDossier, NewEntreprise,
        NewTuteur, Status, Tuteur,
    },
    error::{ApiError, ErrorCode},
};
use storage::{is_unique_violation, Storage};
use tracing::{info, warn};

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

pub async fn list_dossiers(ctx: &ApiContext) -> Result<Vec<Dossier>, ApiError> {
    ctx.storage.list_dossiers().await.map_err(internal)
}

pub async fn get_dossier(ctx: &ApiContext, dossier_id: &DossierId) -> Result<Dossier, ApiError> {
    ctx.storage
        .load_dossier(dossier_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| dossier_not_found(dossier_id))
}

pub async fn create_dossier(ctx: &ApiContext, new: &NewDossier) -> Result<Dossier, ApiError> {
    if !ctx
        .storage
        .alternant_exists(&new.alternant_id)
        .await
        .map_err(internal)?
    {
        return Err(ApiError::validation(format!(
            "unknown alternant {}",
            new.alternant_id
        )));
    }
    if !ctx
        .storage
        .entreprise_exists(&new.entreprise_id)
        .await
        .map_err(internal)?
    {
        return Err(ApiError::validation(format!(
            "unknown entreprise {}",
            new.entreprise_id
        )));
    }
    if !ctx
        .storage
        .tuteur_exists(&new.tuteur_id)
        .await
        .map_err(internal)?
    {
        return Err(ApiError::validation(format!(
            "unknown tuteur {}",
            new.tuteur_id
        )));
    }
    if new.date_debut > new.date_fin {
        warn!(
            date_debut = %new.date_debut,
            date_fin = %new.date_fin,
            "cases: dossier accepted with date_debut after date_fin"
        );
    }

    let dossier = ctx.storage.insert_dossier(new).await.map_err(internal)?;
    info!(dossier_id = %dossier.id, status = %dossier.status, "cases: dossier created");
    Ok(dossier)
}

pub async fn update_dossier_status(
    ctx: &ApiContext,
    dossier_id: &DossierId,
    status: Status,
) -> Result<Dossier, ApiError> {
    let dossier = ctx
        .storage
        .update_dossier_status(dossier_id, status)
        .await
        .map_err(internal)?
        .ok_or_else(|| dossier_not_found(dossier_id))?;
    info!(dossier_id = %dossier_id, %status, "cases: dossier status updated");
    Ok(dossier)
}

pub async fn delete_dossier(ctx: &ApiContext, dossier_id: &DossierId) -> Result<(), ApiError> {
    if !ctx
        .storage
        .delete_dossier(dossier_id)
        .await
        .map_err(internal)?
    {
        return Err(dossier_not_found(dossier_id));
    }
    info!(dossier_id = %dossier_id, "cases: dossier deleted");
    Ok(())
}

pub async fn list_alternants(ctx: &ApiContext) -> Result<Vec<Alternant>, ApiError> {
    ctx.storage.list_alternants().await.map_err(internal)
}

pub async fn create_alternant(
    ctx: &ApiContext,
    new: &NewAlternant,
) -> Result<Alternant, ApiError> {
    require_field("nom", &new.nom)?;
    require_field("prenom", &new.prenom)?;
    require_field("email", &new.email)?;
    ctx.storage
        .create_alternant(new)
        .await
        .map_err(|err| conflict_or_internal(err, "an alternant with this email already exists"))
}

pub async fn list_entreprises(ctx: &ApiContext) -> Result<Vec<Entreprise>, ApiError> {
    ctx.storage.list_entreprises().await.map_err(internal)
}

pub async fn create_entreprise(
    ctx: &ApiContext,
    new: &NewEntreprise,
) -> Result<Entreprise, ApiError> {
    require_field("nom", &new.nom)?;
    ctx.storage
        .create_entreprise(new)
        .await
        .map_err(|err| conflict_or_internal(err, "an entreprise with this siret already exists"))
}

pub async fn list_tuteurs(ctx: &ApiContext) -> Result<Vec<Tuteur>, ApiError> {
    ctx.storage.list_tuteurs().await.map_err(internal)
}

pub async fn create_tuteur(ctx: &ApiContext, new: &NewTuteur) -> Result<Tuteur, ApiError> {
    require_field("nom", &new.nom)?;
    require_field("prenom", &new.prenom)?;
    require_field("email", &new.email)?;
    ctx.storage
        .create_tuteur(new)
        .await
        .map_err(|err| conflict_or_internal(err, "a tuteur with this email already exists"))
}

fn require_field(name: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{name} is required")));
    }
    Ok(())
}

fn dossier_not_found(dossier_id: &DossierId) -> ApiError {
    ApiError::not_found(format!("dossier {dossier_id} not found"))
}

fn conflict_or_internal(err: anyhow::Error, message: &str) -> ApiError {
    if is_unique_violation(&err) {
        ApiError::new(ErrorCode::Conflict, message)
    } else {
        internal(err)
    }
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, format!("{err:#}"))
}
