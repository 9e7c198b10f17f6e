use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::rules::RuleViolation;
use crate::domain::users::user::UserSummary;

pub const MAX_TAGS: usize = 10;
pub const MAX_TAG_LEN: usize = 30;

#[derive(Debug, Clone)]
pub struct Post {
    pub id: Uuid,
    pub author: UserSummary,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub like_count: i64,
    pub comment_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author: UserSummary,
    pub parent_id: Option<Uuid>,
    pub body: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct CommentThread {
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

/// Trims, lower-cases and de-duplicates tags, keeping first-seen order.
pub fn normalize_tags(raw: &[String]) -> Result<Vec<String>, RuleViolation> {
    let mut out: Vec<String> = Vec::new();
    for tag in raw {
        let t = tag.trim().to_lowercase();
        if t.is_empty() {
            continue;
        }
        if t.chars().count() > MAX_TAG_LEN {
            return Err(RuleViolation::invalid(format!(
                "tag '{t}' is longer than {MAX_TAG_LEN} characters"
            )));
        }
        if !out.contains(&t) {
            out.push(t);
        }
    }
    if out.len() > MAX_TAGS {
        return Err(RuleViolation::invalid(format!(
            "a post can carry at most {MAX_TAGS} tags"
        )));
    }
    Ok(out)
}

/// Groups a flat, chronologically ordered comment list into top-level
/// threads. Replies whose parent is missing are dropped.
pub fn build_threads(comments: Vec<Comment>) -> Vec<CommentThread> {
    let mut threads: Vec<CommentThread> = Vec::new();
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    let mut replies: Vec<Comment> = Vec::new();
    for c in comments {
        if c.parent_id.is_none() {
            index.insert(c.id, threads.len());
            threads.push(CommentThread {
                comment: c,
                replies: Vec::new(),
            });
        } else {
            replies.push(c);
        }
    }
    for r in replies {
        if let Some(&i) = r.parent_id.as_ref().and_then(|p| index.get(p)) {
            threads[i].replies.push(r);
        }
    }
    threads
}

/// Replies stay one level deep: replying to a reply attaches to its root.
pub fn reply_root(target: &Comment) -> Uuid {
    target.parent_id.unwrap_or(target.id)
}

pub fn can_delete_comment(comment: &Comment, post_author: Uuid, actor: Uuid) -> bool {
    comment.author.id == actor || post_author == actor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: Uuid, parent: Option<Uuid>, body: &str) -> Comment {
        Comment {
            id,
            post_id: Uuid::nil(),
            author: UserSummary {
                id: Uuid::nil(),
                name: "ann".into(),
            },
            parent_id: parent,
            body: body.into(),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn tags_are_normalized_and_deduplicated() {
        let tags = vec![" Rust ".to_string(), "rust".into(), "".into(), "Web".into()];
        assert_eq!(normalize_tags(&tags).unwrap(), vec!["rust", "web"]);
    }

    #[test]
    fn too_many_tags_is_rejected() {
        let tags: Vec<String> = (0..11).map(|i| format!("t{i}")).collect();
        assert!(normalize_tags(&tags).is_err());
        let long = vec!["x".repeat(31)];
        assert!(normalize_tags(&long).is_err());
    }

    #[test]
    fn threads_group_replies_under_roots() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let threads = build_threads(vec![
            comment(a, None, "first"),
            comment(Uuid::new_v4(), Some(a), "re first"),
            comment(b, None, "second"),
            comment(Uuid::new_v4(), Some(Uuid::new_v4()), "orphan"),
            comment(Uuid::new_v4(), Some(a), "re first again"),
        ]);
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].replies.len(), 2);
        assert_eq!(threads[0].replies[1].body, "re first again");
        assert!(threads[1].replies.is_empty());
    }

    #[test]
    fn replying_to_a_reply_targets_the_root() {
        let root = Uuid::new_v4();
        let reply = comment(Uuid::new_v4(), Some(root), "r");
        assert_eq!(reply_root(&reply), root);
        let top = comment(root, None, "t");
        assert_eq!(reply_root(&top), root);
    }
}
