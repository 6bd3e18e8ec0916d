//! Profession templates used to seed starting ledgers.

use serde::{Deserialize, Serialize};

/// Starting economics for one profession.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profession {
    pub id: String,
    pub name: String,
    pub salary_cents: i64,
    pub starting_cash_cents: i64,
    pub base_expenses_cents: i64,
}

impl Profession {
    fn new(
        id: &str,
        name: &str,
        salary_cents: i64,
        starting_cash_cents: i64,
        base_expenses_cents: i64,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            salary_cents,
            starting_cash_cents,
            base_expenses_cents,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
struct ProfessionsFile {
    professions: Vec<Profession>,
}

/// Ordered list of available professions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProfessionsList(pub Vec<Profession>);

impl ProfessionsList {
    #[must_use]
    pub const fn empty() -> Self {
        Self(vec![])
    }

    /// Load professions from a JSON document of the shape
    /// `{"professions": [...]}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into profession data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let file: ProfessionsFile = serde_json::from_str(json)?;
        Ok(Self(file.professions))
    }

    /// Built-in profession set used when no data source is supplied.
    #[must_use]
    pub fn default_list() -> Self {
        Self(vec![
            Profession::new("engineer", "Engineer", 500_000, 1_000_000, 250_000),
            Profession::new("teacher", "Teacher", 400_000, 800_000, 200_000),
            Profession::new("doctor", "Doctor", 800_000, 1_500_000, 400_000),
            Profession::new("lawyer", "Lawyer", 700_000, 1_200_000, 350_000),
            Profession::new("manager", "Manager", 600_000, 1_100_000, 300_000),
            Profession::new("nurse", "Nurse", 350_000, 700_000, 180_000),
        ])
    }

    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<&Profession> {
        self.0.iter().find(|p| p.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Profession> {
        self.0.iter()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a ProfessionsList {
    type Item = &'a Profession;
    type IntoIter = std::slice::Iter<'a, Profession>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Requested identity for one seat at the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSetup {
    pub name: String,
    pub profession_id: String,
}

impl PlayerSetup {
    #[must_use]
    pub fn new(name: &str, profession_id: &str) -> Self {
        Self {
            name: name.to_string(),
            profession_id: profession_id.to_string(),
        }
    }
}
