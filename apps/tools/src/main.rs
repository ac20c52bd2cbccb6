use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use shared::domain::{NewAlternant, NewEntreprise, NewTuteur};
use storage::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEMO_ENTREPRISES: [&str; 3] = ["Entreprise A", "Entreprise B", "Entreprise C"];
const DEMO_TUTEURS: [(&str, &str, &str); 3] = [
    ("Leroy", "Michel", "michel.leroy@example.org"),
    ("Petit", "Sophie", "sophie.petit@example.org"),
    ("Moreau", "Philippe", "philippe.moreau@example.org"),
];

#[derive(Parser, Debug)]
#[command(
    name = "altermanager-tools",
    about = "Maintenance tasks on the case store database"
)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://altermanager.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Inserts the demo entreprises and tuteurs that are not already present.
    SeedDemo,
    AddAlternant {
        nom: String,
        prenom: String,
        email: String,
        #[arg(long)]
        telephone: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        date_naissance: Option<NaiveDate>,
        #[arg(long)]
        ville: Option<String>,
        #[arg(long)]
        formation: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url)
        .await
        .with_context(|| format!("failed to open {}", cli.database_url))?;

    match cli.command {
        Command::SeedDemo => seed_demo(&storage).await?,
        Command::AddAlternant {
            nom,
            prenom,
            email,
            telephone,
            date_naissance,
            ville,
            formation,
        } => {
            let alternant = storage
                .create_alternant(&NewAlternant {
                    nom,
                    prenom,
                    email,
                    telephone,
                    date_naissance,
                    ville,
                    formation,
                    ..NewAlternant::default()
                })
                .await
                .context("failed to add alternant")?;
            println!("created alternant_id={}", alternant.id);
        }
    }

    Ok(())
}

async fn seed_demo(storage: &Storage) -> Result<()> {
    let entreprises = storage.list_entreprises().await?;
    for nom in DEMO_ENTREPRISES {
        if entreprises.iter().any(|e| e.nom == nom) {
            continue;
        }
        let entreprise = storage
            .create_entreprise(&NewEntreprise {
                nom: nom.to_string(),
                ..NewEntreprise::default()
            })
            .await?;
        println!("created entreprise_id={} nom={nom}", entreprise.id);
    }

    let tuteurs = storage.list_tuteurs().await?;
    for (nom, prenom, email) in DEMO_TUTEURS {
        if tuteurs.iter().any(|t| t.email == email) {
            continue;
        }
        let tuteur = storage
            .create_tuteur(&NewTuteur {
                nom: nom.to_string(),
                prenom: prenom.to_string(),
                email: email.to_string(),
                telephone: None,
            })
            .await?;
        println!("created tuteur_id={} {prenom} {nom}", tuteur.id);
    }

    info!("tools: demo data seeded");
    Ok(())
}
