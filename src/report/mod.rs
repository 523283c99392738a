//! HTML report and alert-email rendering.
//!
//! Pure functions from structured input to a complete HTML string: no
//! network, no disk, no clock reads. The rendered timestamp always
//! comes from [`ReportInput::generated_at`], so identical input
//! produces byte-identical output.

use chrono::{DateTime, Utc};

use crate::domain::{ChangeRecord, PageType, Significance, Snapshot};

/// Everything the renderer needs for one report.
#[derive(Debug, Clone)]
pub struct ReportInput {
    /// Timestamp printed in the header; injected for determinism.
    pub generated_at: DateTime<Utc>,

    /// Per-target sections, rendered in order.
    pub targets: Vec<TargetReport>,
}

/// One target's section of the report.
#[derive(Debug, Clone)]
pub struct TargetReport {
    /// Display name.
    pub name: String,

    /// Monitored domain.
    pub domain: String,

    /// Per-page blocks, rendered in order.
    pub pages: Vec<PageReport>,
}

/// One scanned page: its latest snapshot and the changes seen this run.
#[derive(Debug, Clone)]
pub struct PageReport {
    /// Page type.
    pub page_type: PageType,

    /// Snapshot captured this run (possibly errored).
    pub snapshot: Snapshot,

    /// Changes detected against the previous baseline.
    pub changes: Vec<ChangeRecord>,
}

const STYLE: &str = "body{font-family:Helvetica,Arial,sans-serif;margin:24px;color:#1a1a1a}\
h1{font-size:22px}h2{font-size:18px;border-bottom:1px solid #ddd;padding-bottom:4px}\
h3{font-size:15px;margin-bottom:4px}table{border-collapse:collapse;margin:8px 0}\
td,th{border:1px solid #ccc;padding:4px 8px;font-size:13px;text-align:left}\
.badge{display:inline-block;padding:1px 6px;border-radius:3px;font-size:12px;margin-right:6px}\
.high{background:#fdd}.major{background:#fed}.moderate{background:#ffd}\
.check_manually{background:#eef}.info{background:#efe}\
.error{color:#a00}.muted{color:#777;font-size:12px}";

/// Renders the full scan report as a self-contained HTML document.
#[must_use]
pub fn render_report(input: &ReportInput) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">");
    out.push_str("<title>Competitor scan report</title><style>");
    out.push_str(STYLE);
    out.push_str("</style></head><body>");
    out.push_str("<h1>Competitor scan report</h1>");
    out.push_str(&format!(
        "<p class=\"muted\">Generated {}</p>",
        input.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    let total_changes: usize = input
        .targets
        .iter()
        .flat_map(|t| t.pages.iter())
        .map(|p| p.changes.len())
        .sum();
    out.push_str(&format!(
        "<p>{} target(s) scanned, {} change(s) detected.</p>",
        input.targets.len(),
        total_changes
    ));

    for target in &input.targets {
        render_target(&mut out, target);
    }

    out.push_str("</body></html>");
    out
}

fn render_target(out: &mut String, target: &TargetReport) {
    out.push_str(&format!(
        "<h2>{} <span class=\"muted\">({})</span></h2>",
        escape(&target.name),
        escape(&target.domain)
    ));

    for page in &target.pages {
        render_page(out, page);
    }
}

fn render_page(out: &mut String, page: &PageReport) {
    out.push_str(&format!("<h3>{}</h3>", escape(page.page_type.as_str())));

    if let Some(error) = &page.snapshot.fetch_error {
        out.push_str(&format!(
            "<p class=\"error\">Fetch failed: {}</p>",
            escape(error)
        ));
        return;
    }

    render_snapshot_summary(out, &page.snapshot);

    if page.changes.is_empty() {
        out.push_str("<p class=\"muted\">No changes.</p>");
        return;
    }

    out.push_str("<ul>");
    for change in &page.changes {
        out.push_str("<li>");
        out.push_str(&significance_badge(change.significance()));
        out.push_str(&escape(&describe_change(change)));
        out.push_str("</li>");
    }
    out.push_str("</ul>");
}

fn render_snapshot_summary(out: &mut String, snapshot: &Snapshot) {
    if !snapshot.title.is_empty() {
        out.push_str(&format!("<p>{}</p>", escape(&snapshot.title)));
    }
    if !snapshot.pricing.is_empty() {
        out.push_str("<table><tr><th>Detected pricing</th></tr>");
        for price in &snapshot.pricing {
            out.push_str(&format!("<tr><td>{}</td></tr>", escape(price)));
        }
        out.push_str("</table>");
    }
    if !snapshot.blog_posts.is_empty() {
        out.push_str(&format!(
            "<p class=\"muted\">{} blog post(s) listed.</p>",
            snapshot.blog_posts.len()
        ));
    }
}

/// Renders the alert email body for one batch of changes.
#[must_use]
pub fn render_alert_email(
    label: &str,
    changes: &[ChangeRecord],
    generated_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\"><style>");
    out.push_str(STYLE);
    out.push_str("</style></head><body>");
    out.push_str(&format!("<h1>{}</h1>", escape(label)));
    out.push_str(&format!(
        "<p class=\"muted\">Detected {}</p>",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str("<ul>");
    for change in changes {
        out.push_str("<li>");
        out.push_str(&significance_badge(change.significance()));
        out.push_str(&escape(&describe_change(change)));
        out.push_str("</li>");
    }
    out.push_str("</ul></body></html>");
    out
}

/// Builds the severity-tagged alert subject: the emoji of the most
/// severe change, the change count, and the label.
#[must_use]
pub fn alert_subject(label: &str, changes: &[ChangeRecord]) -> String {
    let emoji = changes
        .iter()
        .map(ChangeRecord::significance)
        .max()
        .unwrap_or(Significance::Info)
        .emoji();
    format!("{emoji} {} change(s) — {label}", changes.len())
}

fn significance_badge(significance: Significance) -> String {
    let class = match significance {
        Significance::Info => "info",
        Significance::CheckManually => "check_manually",
        Significance::Moderate => "moderate",
        Significance::Major => "major",
        Significance::High => "high",
    };
    format!("<span class=\"badge {class}\">{class}</span>")
}

fn describe_change(change: &ChangeRecord) -> String {
    match change {
        ChangeRecord::TitleChange { old, new, .. } => {
            format!("Title changed: \"{old}\" → \"{new}\"")
        }
        ChangeRecord::MetaChange { old, new, .. } => {
            format!("Meta description changed: \"{old}\" → \"{new}\"")
        }
        ChangeRecord::ContentChange { .. } => {
            "Page content changed (hash mismatch) — check manually".to_string()
        }
        ChangeRecord::PricingChange { old, new, .. } => {
            format!("Pricing changed: [{}] → [{}]", old.join(", "), new.join(", "))
        }
        ChangeRecord::StatisticsChange { old, new, .. } => {
            format!(
                "Statistics changed: [{}] → [{}]",
                old.join(", "),
                new.join(", ")
            )
        }
        ChangeRecord::RankingChange {
            keyword,
            domain,
            old_position,
            new_position,
            ..
        } => {
            format!(
                "Ranking for \"{keyword}\": {domain} moved {old_position} → {new_position}"
            )
        }
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::TargetId;
    use chrono::TimeZone;

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).single().unwrap_or_default()
    }

    fn sample_input() -> ReportInput {
        let mut snapshot =
            Snapshot::empty(TargetId::new("acme"), PageType::Pricing, generated_at());
        snapshot.title = "Pricing — Acme <Dental>".to_string();
        snapshot.pricing = vec!["$49.99/mo".to_string()];

        ReportInput {
            generated_at: generated_at(),
            targets: vec![TargetReport {
                name: "Acme Dental".to_string(),
                domain: "acmedental.com".to_string(),
                pages: vec![PageReport {
                    page_type: PageType::Pricing,
                    snapshot,
                    changes: vec![ChangeRecord::PricingChange {
                        target_id: TargetId::new("acme"),
                        page_type: PageType::Pricing,
                        old: vec!["$39.99/mo".to_string()],
                        new: vec!["$49.99/mo".to_string()],
                    }],
                }],
            }],
        }
    }

    #[test]
    fn identical_input_renders_byte_identical_output() {
        let input = sample_input();
        assert_eq!(render_report(&input), render_report(&input));
    }

    #[test]
    fn report_contains_target_and_changes() {
        let html = render_report(&sample_input());
        assert!(html.contains("Acme Dental"));
        assert!(html.contains("badge high"));
        assert!(html.contains("$49.99/mo"));
        assert!(html.contains("Generated 2025-06-02 09:00:00 UTC"));
    }

    #[test]
    fn html_in_extracted_text_is_escaped() {
        let html = render_report(&sample_input());
        assert!(html.contains("Pricing — Acme &lt;Dental&gt;"));
        assert!(!html.contains("<Dental>"));
    }

    #[test]
    fn errored_page_renders_error_not_changes() {
        let snapshot = Snapshot::errored(
            TargetId::new("acme"),
            PageType::Home,
            generated_at(),
            "timed out fetching https://acmedental.com".to_string(),
        );
        let input = ReportInput {
            generated_at: generated_at(),
            targets: vec![TargetReport {
                name: "Acme Dental".to_string(),
                domain: "acmedental.com".to_string(),
                pages: vec![PageReport {
                    page_type: PageType::Home,
                    snapshot,
                    changes: Vec::new(),
                }],
            }],
        };
        let html = render_report(&input);
        assert!(html.contains("Fetch failed"));
        assert!(html.contains("timed out fetching"));
    }

    #[test]
    fn subject_uses_most_severe_emoji() {
        let changes = vec![
            ChangeRecord::TitleChange {
                target_id: TargetId::new("acme"),
                page_type: PageType::Home,
                old: "a".to_string(),
                new: "b".to_string(),
            },
            ChangeRecord::PricingChange {
                target_id: TargetId::new("acme"),
                page_type: PageType::Pricing,
                old: vec![],
                new: vec!["$9/mo".to_string()],
            },
        ];
        let subject = alert_subject("Competitor scan", &changes);
        assert!(subject.starts_with("🚨"));
        assert!(subject.contains("2 change(s)"));
    }

    #[test]
    fn empty_change_list_gets_info_emoji() {
        let subject = alert_subject("Weekly report", &[]);
        assert!(subject.starts_with("ℹ️"));
    }
}
