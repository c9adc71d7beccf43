use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Capability class of a user. Closed set; route access is decided by
/// matching on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Patient,
    Doctor,
    Admin,
    Caretaker,
    LabReporter,
    Nurse,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Patient,
        Role::Doctor,
        Role::Admin,
        Role::Caretaker,
        Role::LabReporter,
        Role::Nurse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
            Role::Admin => "admin",
            Role::Caretaker => "caretaker",
            Role::LabReporter => "lab_reporter",
            Role::Nurse => "nurse",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "patient" => Ok(Role::Patient),
            "doctor" => Ok(Role::Doctor),
            "admin" => Ok(Role::Admin),
            "caretaker" => Ok(Role::Caretaker),
            "lab_reporter" => Ok(Role::LabReporter),
            "nurse" => Ok(Role::Nurse),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(format!("Unknown gender: {}", other)),
        }
    }
}
