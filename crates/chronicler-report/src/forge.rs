//! The key-grouping (narrative) pipeline for forge activity.
//!
//! One subject's raw history goes through prune → kind filter → payload
//! decode, then events are grouped per work item with their full ordered
//! action history, aggregated into one line each, and rendered as
//! fixed-order markdown sections.

use std::collections::{BTreeMap, BTreeSet};

use chronicler_core::{
    collapse_consecutive, oxford_join, prune, Diagnostics, ForgeEvent, ForgePayload, KindFilter,
    RawForgeEvent, ReportWindow,
};

/// Composite identity of one pull request's interactions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct PullKey {
    repo: String,
    number: u64,
    title: String,
    url: String,
    author: String,
}

/// Composite identity of one issue's interactions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct IssueKey {
    repo: String,
    number: u64,
    title: String,
    url: String,
}

/// Section accumulators. BTree keys give every section its deterministic
/// sort order; action lists stay in chronological arrival order.
#[derive(Debug, Default)]
struct Sections {
    releases: BTreeMap<String, BTreeSet<String>>,
    made_public: BTreeSet<String>,
    pushes: BTreeMap<(String, String), u64>,
    commit_comments: BTreeSet<(String, String)>,
    pulls: BTreeMap<PullKey, Vec<String>>,
    issues: BTreeMap<IssueKey, Vec<String>>,
    wiki: BTreeMap<String, BTreeSet<String>>,
}

impl Sections {
    fn claim(&mut self, event: ForgeEvent) {
        let repo = event.repo;
        match event.payload {
            ForgePayload::Push { branch, size } => {
                *self.pushes.entry((repo, branch)).or_default() += size;
            }
            ForgePayload::PullRequest {
                action,
                number,
                title,
                url,
                author,
            } => {
                let key = PullKey {
                    repo,
                    number,
                    title,
                    url,
                    author,
                };
                self.pulls.entry(key).or_default().push(action);
            }
            ForgePayload::IssueComment {
                action,
                number,
                title,
                url,
                author,
                on_pull_request,
            } => {
                if action == "deleted" {
                    return;
                }
                if on_pull_request {
                    let key = PullKey {
                        repo,
                        number,
                        title,
                        url,
                        author,
                    };
                    self.pulls.entry(key).or_default().push("discussed".to_string());
                } else {
                    let key = IssueKey {
                        repo,
                        number,
                        title,
                        url,
                    };
                    self.issues.entry(key).or_default().push("discussed".to_string());
                }
            }
            ForgePayload::ReviewComment {
                action,
                number,
                title,
                url,
                author,
            } => {
                if action == "deleted" {
                    return;
                }
                let key = PullKey {
                    repo,
                    number,
                    title,
                    url,
                    author,
                };
                self.pulls.entry(key).or_default().push("discussed".to_string());
            }
            ForgePayload::Issue {
                action,
                number,
                title,
                url,
            } => {
                let key = IssueKey {
                    repo,
                    number,
                    title,
                    url,
                };
                self.issues.entry(key).or_default().push(action);
            }
            ForgePayload::CommitComment { sha } => {
                self.commit_comments.insert((repo, sha));
            }
            ForgePayload::WikiEdit { pages } => {
                self.wiki.entry(repo).or_default().extend(pages);
            }
            ForgePayload::MadePublic => {
                self.made_public.insert(repo);
            }
            ForgePayload::Release { name } => {
                self.releases.entry(repo).or_default().insert(name);
            }
        }
    }

    fn render_publications(&self) -> Option<String> {
        let mut lines = Vec::new();
        for (repo, names) in &self.releases {
            for name in names {
                lines.push(format!("* published release of {repo} - {name}"));
            }
        }
        for repo in &self.made_public {
            lines.push(format!("* made {repo} public"));
        }
        section("Publications and Releases", lines)
    }

    fn render_commits(&self) -> Option<String> {
        let mut lines = Vec::new();
        for ((repo, branch), count) in &self.pushes {
            // Zero-commit pushes (e.g. force pushes) carry no narrative.
            if *count == 0 {
                continue;
            }
            let noun = if *count == 1 { "commit" } else { "commits" };
            lines.push(format!("* pushed {count} {noun} to {repo} branch {branch}"));
        }
        for (repo, sha) in &self.commit_comments {
            let short: String = sha.chars().take(8).collect();
            lines.push(format!("* commented on commit {short} in {repo}"));
        }
        section("Commits and Comments", lines)
    }

    fn render_pulls(&self, subject: &str) -> Option<String> {
        let mut lines = Vec::new();
        for (key, actions) in &self.pulls {
            let mut actions = collapse_consecutive(actions);
            if key.author == subject {
                actions = reframe_self_authored(&actions);
            }
            lines.push(format!(
                "* {} pull request [{}#{}]({}) by @{} - {}",
                oxford_join(&actions),
                key.repo,
                key.number,
                key.url,
                key.author,
                key.title
            ));
        }
        section("Pull Requests", lines)
    }

    fn render_issues(&self) -> Option<String> {
        let mut lines = Vec::new();
        for (key, actions) in &self.issues {
            let actions = collapse_consecutive(actions);
            lines.push(format!(
                "* {} issue [{}#{}]({}) - {}",
                oxford_join(&actions),
                key.repo,
                key.number,
                key.url,
                key.title
            ));
        }
        section("Issues", lines)
    }

    fn render_wiki(&self) -> Option<String> {
        let mut lines = Vec::new();
        for (repo, pages) in &self.wiki {
            for page in pages {
                lines.push(format!("* edited {repo} wiki page - {page}"));
            }
        }
        section("Wiki", lines)
    }
}

/// An empty section renders nothing, header included.
fn section(title: &str, lines: Vec<String>) -> Option<String> {
    if lines.is_empty() {
        None
    } else {
        Some(format!("#### {title}\n\n{}", lines.join("\n")))
    }
}

/// First-person substitutions for items the report subject authored.
///
/// "opened" reads as someone else's act; the subject proposing their own
/// change is "proposed". A close-without-merge of one's own pull request is
/// "rescinded". A merge is not a close-without-merge and is never reframed
/// (decode already rewrote merged closes to "merged").
fn reframe_self_authored(actions: &[String]) -> Vec<String> {
    actions
        .iter()
        .map(|action| match action.as_str() {
            "opened" => "proposed".to_string(),
            "closed" => "rescinded".to_string(),
            _ => action.clone(),
        })
        .collect()
}

/// Generate the forge report block for one subject over one window.
///
/// Always returns a best-effort report; every data-quality finding lands in
/// the returned diagnostics. An empty window yields an empty string.
pub fn report(
    subject: &str,
    history: &[RawForgeEvent],
    window: &ReportWindow,
    filter: &KindFilter,
) -> (String, Diagnostics) {
    let mut diags = Diagnostics::new();

    // The completeness check must see the full unfiltered history, so the
    // pruner runs before the kind filter.
    let pruned = prune(history, window, &mut diags);
    let kept = filter.retain(pruned, &mut diags);

    let mut events: Vec<ForgeEvent> = kept
        .iter()
        .filter_map(|raw| ForgeEvent::from_raw(raw, &mut diags))
        .collect();
    // Chronological order for stable action sequences; grouping and section
    // sort keys take over from here.
    events.sort_by_key(|e| e.ts);

    let mut sections = Sections::default();
    for event in events {
        sections.claim(event);
    }

    let blocks: Vec<String> = [
        sections.render_publications(),
        sections.render_commits(),
        sections.render_pulls(subject),
        sections.render_issues(),
        sections.render_wiki(),
    ]
    .into_iter()
    .flatten()
    .collect();

    let text = if blocks.is_empty() {
        String::new()
    } else {
        format!("{}\n", blocks.join("\n\n"))
    };
    (text, diags)
}
