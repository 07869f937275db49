//! Best-effort extraction of a [`VotingAct`] from the plain text of a voting record.
//!
//! Every field is located by its own label or marker and captured independently, so a
//! layout change that breaks one rule leaves the rest of the record intact. Nothing here
//! fails: an unmatched rule yields `None`.

use crate::schema::{Seat, VoteEntry, VoteValue, VotingAct};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

/// Names shorter than this (in characters, after whitespace normalization) are scanner noise.
pub const MIN_NAME_CHARS: usize = 2;

lazy_static! {
    // "ORDEN DEL DIA Nº 123/24 (Proyecto de ley ...)" or "O.D. Nº 123"
    static ref ORDER_OF_BUSINESS: Regex = Regex::new(
        r"(?:ORDEN DEL D[IÍ]A|O\.D\.)[ \t]+N[º°o]\.?[ \t]*(\d+(?:/\d+)?)(?:[ \t]*\(([^)\n]+)\))?"
    )
    .unwrap();
    static ref MOTION_ON_FLOOR: Regex =
        Regex::new(r"MOCI[OÓ]N SOBRE TABLAS[ \t]+N[º°][ \t]*(\d+/\d+)").unwrap();
    static ref DESCRIPTION: Regex = Regex::new(r"Descripci[oó]n:[ \t]*([^\n]+)").unwrap();
    static ref DATE: Regex = Regex::new(r"(\d{2}/\d{2}/\d{4} \d{2}:\d{2}:\d{2})").unwrap();
    static ref QUORUM_TYPE: Regex = Regex::new(r"Tipo Quorum:[ \t]*([^\n]+)").unwrap();
    static ref MAJORITY: Regex = Regex::new(r"Mayoría:[ \t]*([^\n]+)").unwrap();
    static ref TOTAL_MEMBERS: Regex = Regex::new(r"Miembros del cuerpo:\s*(\d+)").unwrap();
    static ref PRESENT: Regex = Regex::new(r"Presentes:\s*(\d+)").unwrap();
    static ref ABSENT: Regex = Regex::new(r"Ausentes:\s*(\d+)").unwrap();
    static ref AFFIRMATIVE: Regex = Regex::new(r"Afirmativos:\s*(\d+)").unwrap();
    static ref NEGATIVE: Regex = Regex::new(r"Negativos:\s*(\d+)").unwrap();
    static ref ABSTENTIONS: Regex = Regex::new(r"Abstenciones:\s*(\d+)").unwrap();
    static ref RESULT: Regex =
        Regex::new(r"Resultado:[ \t]*(\p{Lu}(?:[\p{Lu} ]*\p{Lu})?)").unwrap();
    // "[12. ]ABAD, Maximiliano SI 3" / "... NO Presidente"
    static ref VOTE_LINE: Regex = Regex::new(
        r"(?:\d+\.[ \t]+)?(\p{Lu}[\p{L}\p{M} \t,.'-]*?)[ \t]+(SI|NO|AUSENTE)[ \t]+(\d+|Presidente)\b"
    )
    .unwrap();
}

/// Parses a voting record. Never fails; missing markers leave their fields empty.
pub fn parse(text: &str) -> VotingAct {
    let mut act = VotingAct::default();

    if let Some(caps) = ORDER_OF_BUSINESS.captures(text) {
        act.motion_number = caps.get(1).map(|m| m.as_str().to_string());
        act.project_title = caps.get(2).and_then(|m| non_empty(m.as_str()));
    } else {
        act.motion_number = capture_text(&MOTION_ON_FLOOR, text);
    }

    act.description = capture_text(&DESCRIPTION, text);
    act.date = DATE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());
    act.quorum_type = capture_text(&QUORUM_TYPE, text);
    act.majority_required = capture_text(&MAJORITY, text);

    act.total_members = capture_count(&TOTAL_MEMBERS, text);
    act.present = capture_count(&PRESENT, text);
    act.absent = capture_count(&ABSENT, text);
    act.affirmative = capture_count(&AFFIRMATIVE, text);
    act.negative = capture_count(&NEGATIVE, text);
    act.abstentions = capture_count(&ABSTENTIONS, text);

    act.result = capture_text(&RESULT, text);
    act.votes = scan_votes(text);

    act
}

/// Collects every "{name} {SI|NO|AUSENTE} {seat}" occurrence in order. Duplicates are kept.
pub fn scan_votes(text: &str) -> Vec<VoteEntry> {
    VOTE_LINE
        .captures_iter(text)
        .filter_map(|caps| {
            let name = normalize_name(caps.get(1)?.as_str());
            if name.chars().count() < MIN_NAME_CHARS {
                return None;
            }
            let vote = VoteValue::from_token(caps.get(2)?.as_str())?;
            let seat = Seat::parse(caps.get(3)?.as_str())?;
            Some(VoteEntry { name, vote, seat })
        })
        .collect()
}

fn normalize_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn capture_text(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| non_empty(m.as_str()))
}

fn capture_count(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Disagreement between the scanned vote list and the totals printed on the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    VoteCount {
        vote: VoteValue,
        reported: u32,
        extracted: u32,
    },
    Membership {
        total_members: u32,
        present: u32,
        absent: u32,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::VoteCount {
                vote,
                reported,
                extracted,
            } => write!(
                f,
                "{vote} count mismatch: reported {reported}, extracted {extracted}"
            ),
            Mismatch::Membership {
                total_members,
                present,
                absent,
            } => write!(
                f,
                "membership mismatch: total {total_members} != present {present} + absent {absent}"
            ),
        }
    }
}

/// Compares scanned votes and membership against the reported tallies.
///
/// Advisory only: the act is never modified, and tallies that were not reported are
/// not compared.
pub fn reconcile(act: &VotingAct) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();

    let tallies = [
        (VoteValue::Affirmative, act.affirmative),
        (VoteValue::Negative, act.negative),
        (VoteValue::Absent, act.absent),
    ];
    for (vote, reported) in tallies {
        let Some(reported) = reported else {
            continue;
        };
        let extracted = act.count_votes(vote);
        if extracted != reported {
            mismatches.push(Mismatch::VoteCount {
                vote,
                reported,
                extracted,
            });
        }
    }

    if let (Some(total_members), Some(present), Some(absent)) =
        (act.total_members, act.present, act.absent)
    {
        if u64::from(present) + u64::from(absent) != u64::from(total_members) {
            mismatches.push(Mismatch::Membership {
                total_members,
                present,
                absent,
            });
        }
    }

    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_RECORD: &str = "\
Acta de Votación Nº 12
MOCION SOBRE TABLAS Nº 1234/24
Descripción: Apartamiento del reglamento
Fecha: 14/03/2024 18:42:07
Tipo Quorum: Más de la mitad de los presentes
Mayoría: Dos tercios
Miembros del cuerpo: 72
Presentes: 70   Ausentes: 2
Afirmativos: 2
Negativos:   1
Abstenciones:  0
Resultado: AFIRMATIVO
1. ABAD, Maximiliano SI 1
2. NÚÑEZ, José María SI 22
3. PEÑA, Lucía NO 40
4. VILLARRUEL, Victoria AUSENTE Presidente
5. ZAMORA, Gerardo AUSENTE 71
";

    #[test]
    fn extracts_every_labelled_field() {
        let act = parse(FULL_RECORD);

        assert_eq!(act.motion_number.as_deref(), Some("1234/24"));
        assert_eq!(act.project_title, None);
        assert_eq!(act.description.as_deref(), Some("Apartamiento del reglamento"));
        assert_eq!(act.date.as_deref(), Some("14/03/2024 18:42:07"));
        assert_eq!(
            act.quorum_type.as_deref(),
            Some("Más de la mitad de los presentes")
        );
        assert_eq!(act.majority_required.as_deref(), Some("Dos tercios"));
        assert_eq!(act.total_members, Some(72));
        assert_eq!(act.present, Some(70));
        assert_eq!(act.absent, Some(2));
        assert_eq!(act.affirmative, Some(2));
        assert_eq!(act.negative, Some(1));
        assert_eq!(act.abstentions, Some(0));
        assert_eq!(act.result.as_deref(), Some("AFIRMATIVO"));
        assert_eq!(act.votes.len(), 5);
    }

    #[test]
    fn vote_entries_keep_source_order_and_accents() {
        let act = parse(FULL_RECORD);
        let names: Vec<&str> = act.votes.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "ABAD, Maximiliano",
                "NÚÑEZ, José María",
                "PEÑA, Lucía",
                "VILLARRUEL, Victoria",
                "ZAMORA, Gerardo",
            ]
        );
        assert_eq!(act.votes[2].vote, VoteValue::Negative);
        assert_eq!(act.votes[3].seat, Seat::Presiding);
        assert_eq!(act.votes[4].seat, Seat::Number("71".into()));
    }

    #[test]
    fn order_of_business_wins_over_motion_marker() {
        let text = "ORDEN DEL DIA Nº 345/23 (Ley de presupuesto)\nMOCION SOBRE TABLAS Nº 9/23";
        let act = parse(text);
        assert_eq!(act.motion_number.as_deref(), Some("345/23"));
        assert_eq!(act.project_title.as_deref(), Some("Ley de presupuesto"));
    }

    #[test]
    fn order_of_business_title_is_optional() {
        let act = parse("O.D. Nº 88\nResultado: NEGATIVO");
        assert_eq!(act.motion_number.as_deref(), Some("88"));
        assert_eq!(act.project_title, None);
        assert_eq!(act.result.as_deref(), Some("NEGATIVO"));
    }

    #[test]
    fn empty_text_yields_all_fields_absent() {
        let act = parse("");
        assert_eq!(act, VotingAct::default());
    }

    #[test]
    fn unrelated_text_never_produces_placeholders() {
        let act = parse("Informe de gestión sin datos de votación.\nPágina 1 de 1");
        assert!(act.motion_number.is_none());
        assert!(act.date.is_none());
        assert!(act.affirmative.is_none());
        assert!(act.result.is_none());
        assert!(act.votes.is_empty());
    }

    #[test]
    fn date_is_captured_verbatim() {
        let act = parse("Emitida el 01/12/2019 09:05:00 en sesión especial");
        assert_eq!(act.date.as_deref(), Some("01/12/2019 09:05:00"));
    }

    #[test]
    fn several_votes_on_one_line_are_all_scanned() {
        let votes = scan_votes("ABAD, Maximiliano SI 1   BASUALDO, Roberto NO 2");
        assert_eq!(votes.len(), 2);
        assert_eq!(votes[1].name, "BASUALDO, Roberto");
        assert_eq!(votes[1].vote, VoteValue::Negative);
    }

    #[test]
    fn names_are_whitespace_normalized() {
        let votes = scan_votes("GARCÍA   LARRABURU,\tSilvina   SI   14");
        assert_eq!(votes[0].name, "GARCÍA LARRABURU, Silvina");
    }

    #[test]
    fn single_letter_names_are_discarded() {
        let votes = scan_votes("X SI 3\nLOPEZ, Ana NO 4");
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].name, "LOPEZ, Ana");
    }

    #[test]
    fn duplicate_matches_are_kept() {
        let votes = scan_votes("LOPEZ, Ana NO 4\nLOPEZ, Ana NO 4");
        assert_eq!(votes.len(), 2);
    }

    #[test]
    fn seats_are_digits_or_presiding_marker() {
        let votes = scan_votes(FULL_RECORD);
        for entry in votes {
            match &entry.seat {
                Seat::Number(digits) => assert!(digits.chars().all(|c| c.is_ascii_digit())),
                Seat::Presiding => assert_eq!(entry.seat.as_str(), "Presidente"),
            }
        }
    }

    #[test]
    fn token_inside_a_word_is_not_a_vote() {
        assert!(scan_votes("JUAN SIMÓN 3").is_empty());
        assert!(scan_votes("ABAD SI Presidentes").is_empty());
    }

    #[test]
    fn count_overflow_degrades_to_absent() {
        let act = parse("Afirmativos: 99999999999999");
        assert_eq!(act.affirmative, None);
    }

    #[test]
    fn reconcile_reports_nothing_when_counts_agree() {
        let text = "Afirmativos: 1\nNegativos: 1\nAusentes: 0\nLOPEZ, Ana SI 4\nPEREZ, Juan NO 5";
        assert!(reconcile(&parse(text)).is_empty());
    }

    #[test]
    fn reconcile_flags_vote_count_mismatch_without_touching_votes() {
        let text = "Afirmativos: 3\nLOPEZ, Ana SI 4\nPEREZ, Juan SI 5";
        let act = parse(text);
        let mismatches = reconcile(&act);

        assert_eq!(
            mismatches,
            vec![Mismatch::VoteCount {
                vote: VoteValue::Affirmative,
                reported: 3,
                extracted: 2,
            }]
        );
        assert_eq!(act.votes.len(), 2);
        assert_eq!(act.affirmative, Some(3));
    }

    #[test]
    fn reconcile_flags_membership_mismatch() {
        let act = parse(FULL_RECORD);
        assert!(reconcile(&act).is_empty());

        let act = VotingAct {
            total_members: Some(72),
            present: Some(60),
            absent: Some(10),
            ..Default::default()
        };
        let mismatches = reconcile(&act);
        assert!(mismatches.contains(&Mismatch::Membership {
            total_members: 72,
            present: 60,
            absent: 10,
        }));
    }

    #[test]
    fn reconcile_skips_unreported_tallies() {
        let act = parse("LOPEZ, Ana SI 4");
        assert!(reconcile(&act).is_empty());
    }
}
