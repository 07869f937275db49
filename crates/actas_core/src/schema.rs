use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Literal used by the source documents for the presiding officer's seat.
pub const PRESIDING_SEAT: &str = "Presidente";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VotingAct {
    pub act_id: u64,                       // archive identifier, assigned by the controller
    pub motion_number: Option<String>,     // e.g. "1234/24" or an order-of-business id
    pub project_title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,              // "dd/mm/yyyy HH:MM:SS", kept exactly as captured
    pub quorum_type: Option<String>,
    pub majority_required: Option<String>,
    pub total_members: Option<u32>,
    pub present: Option<u32>,
    pub absent: Option<u32>,
    pub affirmative: Option<u32>,
    pub negative: Option<u32>,
    pub abstentions: Option<u32>,
    pub result: Option<String>,
    pub votes: Vec<VoteEntry>,             // order of appearance in the source text
}

impl VotingAct {
    pub fn count_votes(&self, value: VoteValue) -> u32 {
        self.votes.iter().filter(|entry| entry.vote == value).count() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VoteEntry {
    pub name: String,
    pub vote: VoteValue,
    #[schemars(with = "String")]
    pub seat: Seat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum VoteValue {
    #[serde(rename = "SI")]
    Affirmative,
    #[serde(rename = "NO")]
    Negative,
    #[serde(rename = "AUSENTE")]
    Absent,
}

impl VoteValue {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "SI" => Some(VoteValue::Affirmative),
            "NO" => Some(VoteValue::Negative),
            "AUSENTE" => Some(VoteValue::Absent),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            VoteValue::Affirmative => "SI",
            VoteValue::Negative => "NO",
            VoteValue::Absent => "AUSENTE",
        }
    }
}

impl fmt::Display for VoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// A numbered seat, or the presiding officer who sits without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Seat {
    Number(String),
    Presiding,
}

impl Seat {
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == PRESIDING_SEAT {
            Some(Seat::Presiding)
        } else if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
            Some(Seat::Number(raw.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Seat::Number(digits) => digits,
            Seat::Presiding => PRESIDING_SEAT,
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Seat> for String {
    fn from(seat: Seat) -> Self {
        seat.as_str().to_string()
    }
}

impl TryFrom<String> for Seat {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Seat::parse(&value).ok_or_else(|| format!("invalid seat: {value:?}"))
    }
}
