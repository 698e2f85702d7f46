//! Raw records → score-ready entities.

use std::collections::{BTreeSet, HashSet};

use time::OffsetDateTime;
use tracing::debug;

use triage_config::Config;
use triage_core::raw::{login_of, RawComment, RawIssue, RawPullRequest, RawReactionGroup, RawReview, RawReviewThread};
use triage_core::text::tokenize;
use triage_core::time_util::{days_between, parse_timestamp};
use triage_core::{
    Actionability, Comment, ImplementationTier, Issue, ItemType, PullRequest, ReactionCounts,
    RelationshipQuality, Relations, Result, Review, ReviewComment, AgentConfidence,
};

use crate::links::LinkPatterns;
use crate::relations::DuplicateIndex;
use crate::score;

// ── Reactions ──

/// Reaction groups → counts, dropping kinds nobody used.
pub fn reaction_counts(groups: Option<&[RawReactionGroup]>) -> ReactionCounts {
    let mut counts = ReactionCounts::new();
    for group in groups.unwrap_or_default() {
        if group.users.total_count > 0 {
            counts.insert(group.content.clone(), group.users.total_count);
        }
    }
    counts
}

pub fn add_reactions(total: &mut ReactionCounts, source: &ReactionCounts) {
    for (kind, n) in source {
        *total.entry(kind.clone()).or_insert(0) += n;
    }
}

// ── Chronological ordering ──

/// Stable sort by parsed timestamp. An unparsable timestamp aborts the batch.
fn chronological<'a, T>(
    items: &'a [T],
    stamp: impl Fn(&T) -> &str,
    context: &str,
) -> Result<Vec<&'a T>> {
    let mut keyed = Vec::with_capacity(items.len());
    for item in items {
        let ts = parse_timestamp(stamp(item), || context.to_string())?;
        keyed.push((ts, item));
    }
    keyed.sort_by_key(|(ts, _)| *ts);
    Ok(keyed.into_iter().map(|(_, item)| item).collect())
}

fn normalize_comments(raw: &[RawComment], context: &str) -> Result<Vec<Comment>> {
    let sorted = chronological(raw, |c| c.created_at.as_str(), context)?;
    Ok(sorted
        .into_iter()
        .enumerate()
        .map(|(i, c)| Comment {
            index: i + 1,
            url: c.url.clone(),
            body: c.body.clone(),
            created_at: c.created_at.clone(),
            author: login_of(&c.author),
            author_association: c.author_association.clone(),
            reactions: reaction_counts(c.reaction_groups.as_deref()),
        })
        .collect())
}

fn normalize_reviews(raw: &[RawReview], context: &str) -> Result<Vec<Review>> {
    let sorted = chronological(raw, |r| r.submitted_at.as_str(), context)?;
    Ok(sorted
        .into_iter()
        .enumerate()
        .map(|(i, r)| Review {
            index: i + 1,
            url: r.url.clone(),
            body: r.body.clone(),
            state: r.state.clone(),
            submitted_at: r.submitted_at.clone(),
            author: login_of(&r.author),
            author_association: r.author_association.clone(),
            reactions: reaction_counts(r.reaction_groups.as_deref()),
        })
        .collect())
}

/// Flatten every thread, then re-sort globally and re-index from 1.
fn normalize_review_comments(threads: &[RawReviewThread], context: &str) -> Result<Vec<ReviewComment>> {
    let mut flattened = Vec::new();
    for (t, thread) in threads.iter().enumerate() {
        for rc in chronological(&thread.comments.nodes, |c| c.comment.created_at.as_str(), context)? {
            let c = &rc.comment;
            flattened.push(ReviewComment {
                index: 0,
                thread_index: t + 1,
                thread_resolved: thread.is_resolved,
                url: c.url.clone(),
                body: c.body.clone(),
                created_at: c.created_at.clone(),
                author: login_of(&c.author),
                author_association: c.author_association.clone(),
                reactions: reaction_counts(c.reaction_groups.as_deref()),
                path: rc.path.clone(),
                position: rc.position,
            });
        }
    }
    let mut sorted: Vec<ReviewComment> = chronological(&flattened, |c| c.created_at.as_str(), context)?
        .into_iter()
        .cloned()
        .collect();
    for (i, c) in sorted.iter_mut().enumerate() {
        c.index = i + 1;
    }
    Ok(sorted)
}

// ── Small derivations ──

fn participants<'a>(authors: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    authors
        .into_iter()
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn is_test_path(path: &str) -> bool {
    let lower = path.to_lowercase();
    lower.contains("test") || lower.contains("__tests__") || lower.contains("spec")
}

/// Sentiment lexicon as lookup sets.
pub struct SentimentSets {
    positive: HashSet<String>,
    negative: HashSet<String>,
}

impl SentimentSets {
    pub fn from_config(config: &Config) -> Self {
        Self {
            positive: config.sentiment.positive_words.iter().cloned().collect(),
            negative: config.sentiment.negative_words.iter().cloned().collect(),
        }
    }

    /// Σ over texts of (positive hits − negative hits).
    pub fn score<'a>(&self, texts: impl IntoIterator<Item = Option<&'a str>>) -> i64 {
        let mut score = 0;
        for text in texts.into_iter().flatten() {
            for token in tokenize(text) {
                if self.positive.contains(&token) {
                    score += 1;
                }
                if self.negative.contains(&token) {
                    score -= 1;
                }
            }
        }
        score
    }
}

/// Label pass (labels and title markers) first, then free-text intent phrases.
pub fn classify_item_type(title: &str, body: Option<&str>, labels: &[String], config: &Config) -> ItemType {
    let title = title.to_lowercase();
    let body = body.unwrap_or_default().to_lowercase();
    let labels: HashSet<String> = labels.iter().map(|l| l.to_lowercase()).collect();
    let has_label = |kind: ItemType| config.type_labels_for(kind).iter().any(|l| labels.contains(l));

    const ORDER: [ItemType; 5] = [
        ItemType::Bug,
        ItemType::Feature,
        ItemType::Question,
        ItemType::Support,
        ItemType::Meta,
    ];

    for kind in ORDER {
        let marker = match kind {
            ItemType::Bug => title.contains("[bug]") || title.contains("bug:"),
            ItemType::Feature => title.contains("[feature]") || title.contains("feat:"),
            ItemType::Question => title.contains("[question]") || title.contains('?'),
            ItemType::Support => {
                title.contains("help") || body.contains("how do i") || body.contains("how can i")
            }
            ItemType::Meta => {
                title.contains("contributor") || title.contains("maintainer") || title.contains("roadmap")
            }
            ItemType::Unknown => false,
        };
        if has_label(kind) || marker {
            return kind;
        }
    }

    for kind in ORDER {
        let phrases = config.intent_for(kind);
        if phrases
            .iter()
            .any(|p| title.contains(p.as_str()) || body.contains(p.as_str()))
        {
            return kind;
        }
    }
    ItemType::Unknown
}

/// Outgoing references from the body and every comment, self excluded.
fn outgoing_mentions(number: u64, body: Option<&str>, comments: &[Comment], links: &LinkPatterns) -> Vec<u64> {
    let mut all = links.mentions(body);
    for c in comments {
        for n in links.mentions(c.body.as_deref()) {
            if !all.contains(&n) {
                all.push(n);
            }
        }
    }
    all.retain(|&n| n != number);
    all
}

// ── Entities ──

pub fn normalize_issues(
    raw: &[RawIssue],
    as_of: OffsetDateTime,
    config: &Config,
    links: &LinkPatterns,
) -> Result<Vec<Issue>> {
    let duplicates = DuplicateIndex::build(
        raw.iter().map(|r| (r.number, r.title.as_str(), r.body.as_deref())),
        config,
    );
    let sentiment = SentimentSets::from_config(config);

    raw.iter()
        .map(|r| {
            let ctx = format!("issue #{}", r.number);
            let comments = normalize_comments(&r.comments.nodes, &format!("{ctx} comment createdAt"))?;
            let mut reaction_totals = ReactionCounts::new();
            for c in &comments {
                add_reactions(&mut reaction_totals, &c.reactions);
            }
            let author = login_of(&r.author);
            let labels = r.label_names();
            let created = parse_timestamp(&r.created_at, || format!("{ctx} createdAt"))?;
            let updated = parse_timestamp(&r.updated_at, || format!("{ctx} updatedAt"))?;

            let mut issue = Issue {
                number: r.number,
                title: r.title.clone(),
                body: r.body.clone(),
                url: r.url.clone(),
                created_at: r.created_at.clone(),
                updated_at: r.updated_at.clone(),
                participants: participants(
                    std::iter::once(author.as_str()).chain(comments.iter().map(|c| c.author.as_str())),
                ),
                author,
                item_type: classify_item_type(&r.title, r.body.as_deref(), &labels, config),
                labels,
                assignees: r.assignee_logins(),
                comments_total: r.comments.total_count,
                sentiment_score: sentiment.score(
                    [Some(r.title.as_str()), r.body.as_deref()]
                        .into_iter()
                        .chain(comments.iter().map(|c| c.body.as_deref())),
                ),
                relations: Relations {
                    mentions: outgoing_mentions(r.number, r.body.as_deref(), &comments, links),
                    mentioned_by: Vec::new(),
                    possible_duplicates: duplicates.possible_duplicates(r.number, config),
                },
                comments,
                reaction_totals,
                age_in_days: days_between(created, as_of),
                days_since_update: days_between(updated, as_of),
                priority_score: 0.0,
                actionability: Actionability::Ready,
                needs_info_score: 0.0,
                needs_info_signals: Vec::new(),
            };

            let (needs_info_score, signals) = score::issue_needs_info(&issue, config);
            issue.needs_info_score = needs_info_score;
            issue.needs_info_signals = signals;
            issue.priority_score = score::issue_priority(&issue, config);
            issue.actionability = score::issue_actionability(&issue, config);
            debug!(
                number = issue.number,
                item_type = %issue.item_type,
                priority = issue.priority_score,
                actionability = %issue.actionability,
                "normalized issue"
            );
            Ok(issue)
        })
        .collect()
}

pub fn normalize_pull_requests(
    raw: &[RawPullRequest],
    as_of: OffsetDateTime,
    config: &Config,
    links: &LinkPatterns,
) -> Result<Vec<PullRequest>> {
    let duplicates = DuplicateIndex::build(
        raw.iter().map(|r| (r.number, r.title.as_str(), r.body.as_deref())),
        config,
    );
    let sentiment = SentimentSets::from_config(config);

    raw.iter()
        .map(|r| {
            let ctx = format!("pull request #{}", r.number);
            let comments = normalize_comments(&r.comments.nodes, &format!("{ctx} comment createdAt"))?;
            let reviews = normalize_reviews(&r.reviews.nodes, &format!("{ctx} review submittedAt"))?;
            let review_comments =
                normalize_review_comments(&r.review_threads.nodes, &format!("{ctx} review comment createdAt"))?;

            let mut reaction_totals = ReactionCounts::new();
            comments
                .iter()
                .map(|c| &c.reactions)
                .chain(reviews.iter().map(|rv| &rv.reactions))
                .chain(review_comments.iter().map(|rc| &rc.reactions))
                .for_each(|counts| add_reactions(&mut reaction_totals, counts));

            let author = login_of(&r.author);
            let created = parse_timestamp(&r.created_at, || format!("{ctx} createdAt"))?;
            let updated = parse_timestamp(&r.updated_at, || format!("{ctx} updatedAt"))?;
            let files = r.files.nodes.clone();

            let mut pr = PullRequest {
                number: r.number,
                title: r.title.clone(),
                body: r.body.clone(),
                url: r.url.clone(),
                created_at: r.created_at.clone(),
                updated_at: r.updated_at.clone(),
                is_draft: r.is_draft,
                participants: participants(
                    std::iter::once(author.as_str())
                        .chain(comments.iter().map(|c| c.author.as_str()))
                        .chain(reviews.iter().map(|rv| rv.author.as_str()))
                        .chain(review_comments.iter().map(|rc| rc.author.as_str())),
                ),
                author,
                labels: r.label_names(),
                assignees: r.assignee_logins(),
                comments_total: r.comments.total_count,
                sentiment_score: sentiment.score(
                    [Some(r.title.as_str()), r.body.as_deref()]
                        .into_iter()
                        .chain(comments.iter().map(|c| c.body.as_deref()))
                        .chain(reviews.iter().map(|rv| rv.body.as_deref()))
                        .chain(review_comments.iter().map(|rc| rc.body.as_deref())),
                ),
                reviews_total: r.reviews.total_count,
                has_approval: reviews.iter().any(|rv| rv.state == "APPROVED"),
                has_changes_requested: reviews.iter().any(|rv| rv.state == "CHANGES_REQUESTED"),
                unresolved_threads: r.review_threads.nodes.iter().filter(|t| !t.is_resolved).count(),
                review_comments_total: r.review_threads.total_count,
                files_total: r.files.total_count,
                lines_changed: files.iter().map(|f| f.additions + f.deletions).sum(),
                touches_tests: files.iter().any(|f| is_test_path(&f.path)),
                status_check_state: r.status_check_state(),
                relations: Relations {
                    mentions: outgoing_mentions(r.number, r.body.as_deref(), &comments, links),
                    mentioned_by: Vec::new(),
                    possible_duplicates: duplicates.possible_duplicates(r.number, config),
                },
                files,
                comments,
                reviews,
                review_comments,
                reaction_totals,
                age_in_days: days_between(created, as_of),
                days_since_update: days_between(updated, as_of),
                priority_score: 0.0,
                actionability: Actionability::NeedsAnalysis,
                needs_info_score: 0.0,
                needs_info_signals: Vec::new(),
                linked_issues: Vec::new(),
                linked_issue_priority: 0.0,
                relationship_score: 0,
                relationship_overlap: 0.0,
                relationship_quality_auto: RelationshipQuality::None,
                relationship_quality_final: RelationshipQuality::None,
                implementation_score_auto: 0,
                implementation_score_final: 0,
                implementation_tier_auto: ImplementationTier::Weak,
                implementation_tier_final: ImplementationTier::Weak,
                agent_score: 0.0,
                agent_confidence: AgentConfidence::Unset,
                agent_rationale: String::new(),
            };

            pr.priority_score = score::pr_priority(&pr, config);
            let (needs_info_score, signals) = score::pr_needs_info(&pr, config);
            pr.needs_info_score = needs_info_score;
            pr.needs_info_signals = signals;
            pr.actionability = score::pr_actionability(&pr, config);
            debug!(
                number = pr.number,
                priority = pr.priority_score,
                actionability = %pr.actionability,
                "normalized pull request"
            );
            Ok(pr)
        })
        .collect()
}
