use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::domain::rules::RuleViolation;
use crate::domain::users::user::UserSummary;

pub fn check_follow(follower: Uuid, followee: Uuid) -> Result<(), RuleViolation> {
    if follower == followee {
        return Err(RuleViolation::invalid("you cannot follow yourself"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub user: UserSummary,
    pub mutual_count: i64,
}

/// Ranks second-degree connections.
///
/// `edges` are `(via, candidate)` pairs: `via` is someone `me` follows and
/// `candidate` is someone `via` follows. Candidates already followed (or
/// `me` itself) are discarded; the rest are ordered by how many followed
/// users lead to them, then by name.
pub fn rank_suggestions(
    me: Uuid,
    following: &HashSet<Uuid>,
    edges: &[(Uuid, UserSummary)],
) -> Vec<Suggestion> {
    let mut counts: HashMap<Uuid, (UserSummary, HashSet<Uuid>)> = HashMap::new();
    for (via, candidate) in edges {
        if candidate.id == me || following.contains(&candidate.id) {
            continue;
        }
        let entry = counts
            .entry(candidate.id)
            .or_insert_with(|| (candidate.clone(), HashSet::new()));
        entry.1.insert(*via);
    }
    let mut out: Vec<Suggestion> = counts
        .into_values()
        .map(|(user, vias)| Suggestion {
            user,
            mutual_count: vias.len() as i64,
        })
        .collect();
    out.sort_by(|a, b| {
        b.mutual_count
            .cmp(&a.mutual_count)
            .then_with(|| a.user.name.cmp(&b.user.name))
            .then_with(|| a.user.id.cmp(&b.user.id))
    });
    out
}
