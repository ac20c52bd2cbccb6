//! Search, status filter and sort for the dossier list view.

use std::{cmp::Ordering, fmt, str::FromStr};

use shared::domain::{Dossier, Status};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DossierFilter {
    /// Case-insensitive needle over alternant name, entreprise name and id.
    pub search: Option<String>,
    pub status: Option<Status>,
}

impl DossierFilter {
    pub fn matches(&self, dossier: &Dossier) -> bool {
        if let Some(status) = self.status {
            if dossier.status != status {
                return false;
            }
        }

        let needle = match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => needle.to_lowercase(),
            _ => return true,
        };

        let alternant = dossier.alternant.as_ref();
        let haystacks = [
            alternant.map(|a| a.nom.as_str()),
            alternant.map(|a| a.prenom.as_str()),
            dossier.entreprise.as_ref().map(|e| e.nom.as_str()),
            Some(dossier.id.as_str()),
        ];
        haystacks
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
    AlternantAz,
    AlternantZa,
}

impl SortOrder {
    fn compare(self, a: &Dossier, b: &Dossier) -> Ordering {
        match self {
            SortOrder::NewestFirst => b.created_at.cmp(&a.created_at),
            SortOrder::OldestFirst => a.created_at.cmp(&b.created_at),
            SortOrder::AlternantAz => compare_names(a, b, false),
            SortOrder::AlternantZa => compare_names(a, b, true),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::NewestFirst => "newest",
            SortOrder::OldestFirst => "oldest",
            SortOrder::AlternantAz => "name-asc",
            SortOrder::AlternantZa => "name-desc",
        })
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(SortOrder::NewestFirst),
            "oldest" => Ok(SortOrder::OldestFirst),
            "name-asc" | "az" => Ok(SortOrder::AlternantAz),
            "name-desc" | "za" => Ok(SortOrder::AlternantZa),
            other => Err(format!(
                "unknown sort order '{other}' (expected newest, oldest, name-asc or name-desc)"
            )),
        }
    }
}

// Dossiers without a resolved alternant sort after every named one, in
// either direction.
fn compare_names(a: &Dossier, b: &Dossier, descending: bool) -> Ordering {
    let key = |d: &Dossier| {
        d.alternant
            .as_ref()
            .map(|alt| (alt.nom.to_lowercase(), alt.prenom.to_lowercase()))
    };
    match (key(a), key(b)) {
        (Some(ka), Some(kb)) if descending => kb.cmp(&ka),
        (Some(ka), Some(kb)) => ka.cmp(&kb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Filtered, sorted copy of `dossiers`. The sort is stable.
pub fn apply(dossiers: &[Dossier], filter: &DossierFilter, order: SortOrder) -> Vec<Dossier> {
    let mut selected: Vec<Dossier> = dossiers
        .iter()
        .filter(|d| filter.matches(d))
        .cloned()
        .collect();
    selected.sort_by(|a, b| order.compare(a, b));
    selected
}

#[cfg(test)]
#[path = "tests/query_tests.rs"]
mod tests;
