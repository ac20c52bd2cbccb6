use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use client_core::{
    query, Board, DossierFilter, DragGesture, DropOutcome, DropTarget, HttpCaseStore, SortOrder,
    SyncConfig, SyncController,
};
use shared::domain::{DossierId, NewAlternant, NewDossier, NewEntreprise, NewTuteur, Status};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser, Debug)]
#[command(
    name = "altermanager",
    about = "Operator console for apprenticeship dossiers"
)]
struct Cli {
    #[arg(long, env = "ALTERMANAGER_SERVER_URL", default_value = "http://127.0.0.1:8080")]
    server_url: String,
    /// Upper bound on every call to the case store.
    #[arg(long, env = "ALTERMANAGER_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,
    /// Print JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Shows the pipeline board, one column per status.
    Board,
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        status: Option<Status>,
        /// newest, oldest, name-asc or name-desc
        #[arg(long, default_value_t = SortOrder::NewestFirst)]
        sort: SortOrder,
    },
    /// Moves a dossier to another status (REQUEST, CREATED, VERIFICATION or
    /// PROCESSING).
    Move { id: String, status: String },
    /// Replays a drop on the board: `target` is a column id such as
    /// `droppable-VERIFICATION` or the id of another dossier.
    Drag { id: String, target: String },
    Create {
        #[arg(long)]
        alternant_id: String,
        #[arg(long)]
        entreprise_id: String,
        #[arg(long)]
        tuteur_id: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date_debut: NaiveDate,
        /// YYYY-MM-DD
        #[arg(long)]
        date_fin: NaiveDate,
        #[arg(long, default_value_t = Status::Request)]
        status: Status,
        #[arg(long, default_value = "")]
        commentaires: String,
    },
    Delete { id: String },
    Alternants {
        #[command(subcommand)]
        action: AlternantAction,
    },
    Entreprises {
        #[command(subcommand)]
        action: EntrepriseAction,
    },
    Tuteurs {
        #[command(subcommand)]
        action: TuteurAction,
    },
}

#[derive(Subcommand, Debug)]
enum AlternantAction {
    List,
    Add {
        nom: String,
        prenom: String,
        email: String,
        #[arg(long)]
        telephone: Option<String>,
        #[arg(long)]
        date_naissance: Option<NaiveDate>,
        #[arg(long)]
        adresse: Option<String>,
        #[arg(long)]
        code_postal: Option<String>,
        #[arg(long)]
        ville: Option<String>,
        #[arg(long)]
        formation: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum EntrepriseAction {
    List,
    Add {
        nom: String,
        #[arg(long)]
        siret: Option<String>,
        #[arg(long)]
        adresse: Option<String>,
        #[arg(long)]
        code_postal: Option<String>,
        #[arg(long)]
        ville: Option<String>,
        #[arg(long)]
        telephone: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum TuteurAction {
    List,
    Add {
        nom: String,
        prenom: String,
        email: String,
        #[arg(long)]
        telephone: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let timeout = Duration::from_secs(cli.timeout_secs);
    let http = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build HTTP client")?;
    let store = Arc::new(
        HttpCaseStore::with_client(http, &cli.server_url)
            .with_context(|| format!("invalid server url {}", cli.server_url))?,
    );
    let controller = SyncController::with_config(
        store.clone(),
        SyncConfig {
            remote_timeout: timeout,
        },
    );

    match cli.command {
        Command::Board => {
            controller.load().await?;
            if cli.json {
                render::json(&controller.snapshot().await)?;
            } else {
                render::board(&controller.pipeline().await);
            }
        }
        Command::List {
            search,
            status,
            sort,
        } => {
            controller.load().await?;
            let filter = DossierFilter { search, status };
            let dossiers = query::apply(&controller.snapshot().await, &filter, sort);
            if cli.json {
                render::json(&dossiers)?;
            } else {
                render::dossier_list(&dossiers);
            }
        }
        Command::Move { id, status } => {
            controller.load().await?;
            let pending = controller
                .request_transition_named(&DossierId::from(id), &status)
                .await?;
            let (from, to) = (pending.from_status(), pending.to_status());
            let noop = pending.is_noop();
            let dossier = pending.settled().await?;
            if noop {
                println!("dossier {} already in {to}", dossier.id);
            } else {
                println!("moved dossier {}: {from} -> {to}", dossier.id);
            }
        }
        Command::Drag { id, target } => {
            controller.load().await?;
            let card = DossierId::from(id);
            let Some(current) = controller.get(&card).await else {
                bail!("dossier {card} is not on the board");
            };
            let board = Board::new(controller.clone());
            let gesture = DragGesture {
                card,
                source: current.status,
                target: Some(DropTarget::parse(&target)),
            };
            match board.on_drag_end(gesture).await? {
                DropOutcome::Ignored => println!("drop ignored; nothing to do"),
                DropOutcome::Requested(pending) => {
                    let from = pending.from_status();
                    let dossier = pending.settled().await?;
                    println!("moved dossier {}: {from} -> {}", dossier.id, dossier.status);
                }
            }
        }
        Command::Create {
            alternant_id,
            entreprise_id,
            tuteur_id,
            date_debut,
            date_fin,
            status,
            commentaires,
        } => {
            if date_debut > date_fin {
                warn!(%date_debut, %date_fin, "cli: start date is after end date");
            }
            controller.load().await?;
            let created = controller
                .create_dossier(&NewDossier {
                    alternant_id: alternant_id.into(),
                    entreprise_id: entreprise_id.into(),
                    tuteur_id: tuteur_id.into(),
                    status,
                    date_debut,
                    date_fin,
                    commentaires,
                })
                .await?;
            println!("created dossier_id={} status={}", created.id, created.status);
        }
        Command::Delete { id } => {
            controller.load().await?;
            let dossier_id = DossierId::from(id);
            controller.delete_dossier(&dossier_id).await?;
            println!("deleted dossier {dossier_id}");
        }
        Command::Alternants { action } => match action {
            AlternantAction::List => {
                let alternants = store.list_alternants().await?;
                if cli.json {
                    render::json(&alternants)?;
                } else {
                    render::alternants(&alternants);
                }
            }
            AlternantAction::Add {
                nom,
                prenom,
                email,
                telephone,
                date_naissance,
                adresse,
                code_postal,
                ville,
                formation,
            } => {
                let alternant = store
                    .create_alternant(&NewAlternant {
                        nom,
                        prenom,
                        email,
                        telephone,
                        date_naissance,
                        adresse,
                        code_postal,
                        ville,
                        formation,
                    })
                    .await?;
                println!("created alternant_id={}", alternant.id);
            }
        },
        Command::Entreprises { action } => match action {
            EntrepriseAction::List => {
                let entreprises = store.list_entreprises().await?;
                if cli.json {
                    render::json(&entreprises)?;
                } else {
                    render::entreprises(&entreprises);
                }
            }
            EntrepriseAction::Add {
                nom,
                siret,
                adresse,
                code_postal,
                ville,
                telephone,
                email,
            } => {
                let entreprise = store
                    .create_entreprise(&NewEntreprise {
                        nom,
                        siret,
                        adresse,
                        code_postal,
                        ville,
                        telephone,
                        email,
                    })
                    .await?;
                println!("created entreprise_id={}", entreprise.id);
            }
        },
        Command::Tuteurs { action } => match action {
            TuteurAction::List => {
                let tuteurs = store.list_tuteurs().await?;
                if cli.json {
                    render::json(&tuteurs)?;
                } else {
                    render::tuteurs(&tuteurs);
                }
            }
            TuteurAction::Add {
                nom,
                prenom,
                email,
                telephone,
            } => {
                let tuteur = store
                    .create_tuteur(&NewTuteur {
                        nom,
                        prenom,
                        email,
                        telephone,
                    })
                    .await?;
                println!("created tuteur_id={}", tuteur.id);
            }
        },
    }

    Ok(())
}
