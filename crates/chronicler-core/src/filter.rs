use std::collections::BTreeSet;

use crate::diag::Diagnostics;
use crate::event::{kind, RawForgeEvent};

/// Where a kind falls in the two-tier taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindClass {
    Kept,
    Ignored,
    Unknown,
}

/// Explicit keep/ignore taxonomy for forge event kinds.
///
/// Passed into the pipeline rather than baked in, so tests (and future
/// sources) can substitute alternate taxonomies. Kinds in neither set are
/// unknown: new platform kinds must surface as warnings, never vanish.
#[derive(Debug, Clone)]
pub struct KindFilter {
    keep: BTreeSet<String>,
    ignore: BTreeSet<String>,
}

impl KindFilter {
    pub fn new<K, I, S>(keep: K, ignore: I) -> Self
    where
        K: IntoIterator<Item = S>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keep: keep.into_iter().map(Into::into).collect(),
            ignore: ignore.into_iter().map(Into::into).collect(),
        }
    }

    /// The default forge taxonomy.
    pub fn forge_default() -> Self {
        let keep = [
            kind::COMMENT_ON_COMMIT,
            kind::WIKI_PAGE_CHANGE,
            kind::ISSUE_COMMENT,
            kind::ISSUE_CHANGE,
            kind::REPO_MADE_PUBLIC,
            kind::PULL_REQUEST_CHANGE,
            kind::PR_REVIEW_COMMENT,
            kind::BRANCH_PUSH,
            kind::RELEASE_PUBLISHED,
        ];
        let ignore = [
            // Webhook-only
            "deployment",
            "deployment-status",
            "team-membership-change",
            "pages-build",
            "repo-lifecycle",
            "commit-status-change",
            "team-repo-link",
            // Inconsequential
            "repo-creation",
            "ref-deletion",
            "fork",
            "collaborator-added",
            "star-added",
            // Obsolete
            "download",
            "follow",
            "fork-apply",
            "gist",
        ];
        Self::new(keep, ignore)
    }

    pub fn classify(&self, kind: &str) -> KindClass {
        if self.keep.contains(kind) {
            KindClass::Kept
        } else if self.ignore.contains(kind) {
            KindClass::Ignored
        } else {
            KindClass::Unknown
        }
    }

    pub fn keep_kinds(&self) -> impl Iterator<Item = &str> {
        self.keep.iter().map(String::as_str)
    }

    pub fn ignore_kinds(&self) -> impl Iterator<Item = &str> {
        self.ignore.iter().map(String::as_str)
    }

    /// Keep only keep-list events. Ignore-list events are dropped silently;
    /// every unknown-kind event is dropped with exactly one warning.
    pub fn retain(&self, events: Vec<RawForgeEvent>, diags: &mut Diagnostics) -> Vec<RawForgeEvent> {
        events
            .into_iter()
            .filter(|event| match self.classify(&event.kind) {
                KindClass::Kept => true,
                KindClass::Ignored => false,
                KindClass::Unknown => {
                    diags.warn(
                        format!("unknown event kind: {}", event.kind),
                        format!("repo {}", event.repo),
                    );
                    false
                }
            })
            .collect()
    }
}
