use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::diag::Diagnostics;
use crate::window::Timestamped;

/// Well-known forge event kinds (keep-list).
pub mod kind {
    pub const COMMENT_ON_COMMIT: &str = "comment-on-commit";
    pub const WIKI_PAGE_CHANGE: &str = "wiki-page-change";
    pub const ISSUE_COMMENT: &str = "issue-comment";
    pub const ISSUE_CHANGE: &str = "issue-metadata-change";
    pub const REPO_MADE_PUBLIC: &str = "repo-made-public";
    pub const PULL_REQUEST_CHANGE: &str = "pull-request-change";
    pub const PR_REVIEW_COMMENT: &str = "pull-request-review-comment";
    pub const BRANCH_PUSH: &str = "branch-push";
    pub const RELEASE_PUBLISHED: &str = "release-published";
}

/// One forge event as materialized by the platform adapter
/// (one JSON object per event, payload still untyped).
#[derive(Debug, Clone, Deserialize)]
pub struct RawForgeEvent {
    pub kind: String,
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    pub repo: String,
    #[serde(default)]
    pub payload: Value,
}

/// Kind-specific payload, resolved once at ingestion.
///
/// Downstream stages never probe raw JSON; anything they need is a named
/// field here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForgePayload {
    Push {
        branch: String,
        size: u64,
    },
    PullRequest {
        action: String,
        number: u64,
        title: String,
        url: String,
        author: String,
    },
    IssueComment {
        action: String,
        number: u64,
        title: String,
        url: String,
        author: String,
        on_pull_request: bool,
    },
    ReviewComment {
        action: String,
        number: u64,
        title: String,
        url: String,
        author: String,
    },
    Issue {
        action: String,
        number: u64,
        title: String,
        url: String,
    },
    CommitComment {
        sha: String,
    },
    WikiEdit {
        pages: Vec<String>,
    },
    MadePublic,
    Release {
        name: String,
    },
}

impl ForgePayload {
    /// Whether any section handler claims events of this kind.
    ///
    /// The kind filter and the handlers can drift apart (a keep-list entry
    /// with no typed form); that drift must surface as a warning, not as a
    /// silently dropped event.
    pub fn handles(kind: &str) -> bool {
        matches!(
            kind,
            kind::BRANCH_PUSH
                | kind::PULL_REQUEST_CHANGE
                | kind::ISSUE_COMMENT
                | kind::PR_REVIEW_COMMENT
                | kind::ISSUE_CHANGE
                | kind::COMMENT_ON_COMMIT
                | kind::WIKI_PAGE_CHANGE
                | kind::REPO_MADE_PUBLIC
                | kind::RELEASE_PUBLISHED
        )
    }

    /// Resolve a raw payload for `kind` into its typed form.
    ///
    /// Total over its input: a structurally malformed payload (or a kind
    /// with no typed form) yields `None`, never an error.
    pub fn decode(kind: &str, payload: &Value) -> Option<Self> {
        match kind {
            kind::BRANCH_PUSH => {
                let git_ref = payload.get("ref")?.as_str()?;
                let size = payload.get("size")?.as_u64()?;
                let branch = git_ref.rsplit('/').next().unwrap_or(git_ref).to_string();
                Some(Self::Push { branch, size })
            }
            kind::PULL_REQUEST_CHANGE => {
                let mut action = payload.get("action")?.as_str()?.to_string();
                let merged = payload
                    .get("merged")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                // A merge arrives as a close with the merged flag set.
                if action == "closed" && merged {
                    action = "merged".to_string();
                }
                Some(Self::PullRequest {
                    action,
                    number: payload.get("number")?.as_u64()?,
                    title: payload.get("title")?.as_str()?.to_string(),
                    url: payload.get("url")?.as_str()?.to_string(),
                    author: payload.get("author")?.as_str()?.to_string(),
                })
            }
            kind::ISSUE_COMMENT => Some(Self::IssueComment {
                action: payload.get("action")?.as_str()?.to_string(),
                number: payload.get("number")?.as_u64()?,
                title: payload.get("title")?.as_str()?.to_string(),
                url: payload.get("url")?.as_str()?.to_string(),
                author: payload.get("author")?.as_str()?.to_string(),
                // The adapter marks comments on pull requests by carrying a
                // `pull_request` member; resolve that probe here, once.
                on_pull_request: payload.get("pull_request").is_some(),
            }),
            kind::PR_REVIEW_COMMENT => Some(Self::ReviewComment {
                action: payload.get("action")?.as_str()?.to_string(),
                number: payload.get("number")?.as_u64()?,
                title: payload.get("title")?.as_str()?.to_string(),
                url: payload.get("url")?.as_str()?.to_string(),
                author: payload.get("author")?.as_str()?.to_string(),
            }),
            kind::ISSUE_CHANGE => Some(Self::Issue {
                action: payload.get("action")?.as_str()?.to_string(),
                number: payload.get("number")?.as_u64()?,
                title: payload.get("title")?.as_str()?.to_string(),
                url: payload.get("url")?.as_str()?.to_string(),
            }),
            kind::COMMENT_ON_COMMIT => Some(Self::CommitComment {
                sha: payload.get("sha")?.as_str()?.to_string(),
            }),
            kind::WIKI_PAGE_CHANGE => {
                let pages = payload.get("pages")?.as_array()?;
                let titles = pages
                    .iter()
                    .map(|p| p.get("title").and_then(Value::as_str).map(str::to_string))
                    .collect::<Option<Vec<String>>>()?;
                Some(Self::WikiEdit { pages: titles })
            }
            kind::REPO_MADE_PUBLIC => Some(Self::MadePublic),
            kind::RELEASE_PUBLISHED => Some(Self::Release {
                name: payload.get("name")?.as_str()?.to_string(),
            }),
            _ => None,
        }
    }
}

/// A forge event with its payload fully resolved.
#[derive(Debug, Clone)]
pub struct ForgeEvent {
    pub ts: OffsetDateTime,
    pub repo: String,
    pub payload: ForgePayload,
}

impl ForgeEvent {
    /// Decode one raw event. An unclaimed kind or a malformed payload is
    /// excluded with a warning; the pipeline continues.
    pub fn from_raw(raw: &RawForgeEvent, diags: &mut Diagnostics) -> Option<Self> {
        if !ForgePayload::handles(&raw.kind) {
            diags.warn(
                format!("event kind {} not claimed by any section handler", raw.kind),
                format!("repo {}", raw.repo),
            );
            return None;
        }
        match ForgePayload::decode(&raw.kind, &raw.payload) {
            Some(payload) => Some(Self {
                ts: raw.ts,
                repo: raw.repo.clone(),
                payload,
            }),
            None => {
                diags.warn(
                    format!("malformed payload for event kind {}", raw.kind),
                    format!("repo {}", raw.repo),
                );
                None
            }
        }
    }
}

/// One low-level field change on a tracked work item.
///
/// `item` is a numeric id stored as text, as the tracker reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerEvent {
    pub item: String,
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    pub title: String,
    pub field: String,
    #[serde(default)]
    pub old: String,
    #[serde(default)]
    pub new: String,
}

impl Timestamped for RawForgeEvent {
    fn ts(&self) -> OffsetDateTime {
        self.ts
    }
}

impl Timestamped for ForgeEvent {
    fn ts(&self) -> OffsetDateTime {
        self.ts
    }
}

impl Timestamped for TrackerEvent {
    fn ts(&self) -> OffsetDateTime {
        self.ts
    }
}
