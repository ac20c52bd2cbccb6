use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Fresh random identifier, as assigned by the case store on insert.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

id_newtype!(DossierId);
id_newtype!(AlternantId);
id_newtype!(EntrepriseId);
id_newtype!(TuteurId);

/// Pipeline stage of a dossier.
///
/// The set is closed: anything else is rejected when parsing or
/// deserializing, so code past the boundary never sees an unknown stage.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Request,
    Created,
    Verification,
    Processing,
}

impl Status {
    /// All stages in board column order.
    pub const ALL: [Status; 4] = [
        Status::Request,
        Status::Created,
        Status::Verification,
        Status::Processing,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Request => "REQUEST",
            Status::Created => "CREATED",
            Status::Verification => "VERIFICATION",
            Status::Processing => "PROCESSING",
        }
    }

    /// Operator-facing column title.
    pub fn label(self) -> &'static str {
        match self {
            Status::Request => "Demande",
            Status::Created => "Créé",
            Status::Verification => "Vérification",
            Status::Processing => "En traitement",
        }
    }

    /// Position of the stage's column on the board.
    pub fn column_index(self) -> usize {
        match self {
            Status::Request => 0,
            Status::Created => 1,
            Status::Verification => 2,
            Status::Processing => 3,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown dossier status '{0}' (expected REQUEST, CREATED, VERIFICATION or PROCESSING)")]
pub struct InvalidStatus(pub String);

impl FromStr for Status {
    type Err = InvalidStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "REQUEST" => Ok(Status::Request),
            "CREATED" => Ok(Status::Created),
            "VERIFICATION" => Ok(Status::Verification),
            "PROCESSING" => Ok(Status::Processing),
            other => Err(InvalidStatus(other.to_string())),
        }
    }
}

impl TryFrom<&str> for Status {
    type Error = InvalidStatus;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternantSummary {
    pub id: AlternantId,
    pub nom: String,
    pub prenom: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrepriseSummary {
    pub id: EntrepriseId,
    pub nom: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuteurSummary {
    pub id: TuteurId,
    pub nom: String,
    pub prenom: String,
}

/// A case file tracking one apprenticeship placement.
///
/// The dossier references its alternant, entreprise and tuteur; it does not
/// own them. The summaries are resolved by the case store on `list()` and
/// are absent when a reference no longer resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dossier {
    pub id: DossierId,
    pub alternant_id: AlternantId,
    pub entreprise_id: EntrepriseId,
    pub tuteur_id: TuteurId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternant: Option<AlternantSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entreprise: Option<EntrepriseSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuteur: Option<TuteurSummary>,
    pub status: Status,
    pub date_debut: NaiveDate,
    pub date_fin: NaiveDate,
    #[serde(default)]
    pub commentaires: String,
    pub created_at: DateTime<Utc>,
}

impl Dossier {
    /// `date_debut <= date_fin`. Reported, never enforced.
    pub fn has_coherent_dates(&self) -> bool {
        self.date_debut <= self.date_fin
    }
}

/// Fields supplied by the create flow; id and timestamp come from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDossier {
    pub alternant_id: AlternantId,
    pub entreprise_id: EntrepriseId,
    pub tuteur_id: TuteurId,
    #[serde(default)]
    pub status: Status,
    pub date_debut: NaiveDate,
    pub date_fin: NaiveDate,
    #[serde(default)]
    pub commentaires: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternant {
    pub id: AlternantId,
    pub created_at: DateTime<Utc>,
    pub nom: String,
    pub prenom: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_naissance: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adresse: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_postal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ville: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAlternant {
    pub nom: String,
    pub prenom: String,
    pub email: String,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub date_naissance: Option<NaiveDate>,
    #[serde(default)]
    pub adresse: Option<String>,
    #[serde(default)]
    pub code_postal: Option<String>,
    #[serde(default)]
    pub ville: Option<String>,
    #[serde(default)]
    pub formation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entreprise {
    pub id: EntrepriseId,
    pub created_at: DateTime<Utc>,
    pub nom: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub siret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adresse: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_postal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ville: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntreprise {
    pub nom: String,
    #[serde(default)]
    pub siret: Option<String>,
    #[serde(default)]
    pub adresse: Option<String>,
    #[serde(default)]
    pub code_postal: Option<String>,
    #[serde(default)]
    pub ville: Option<String>,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tuteur {
    pub id: TuteurId,
    pub created_at: DateTime<Utc>,
    pub nom: String,
    pub prenom: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTuteur {
    pub nom: String,
    pub prenom: String,
    pub email: String,
    #[serde(default)]
    pub telephone: Option<String>,
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
