//! Client-side input validation.
//!
//! Every rule here runs before a request leaves the process. Statuses go
//! through a three-tier resolution: exact match → synonym lookup → error
//! with the closest suggestion.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::model::{
    DueDate, ProjectDraft, ProjectStatus, StatusFilter, TaskDraft, TaskStatus,
};

/// Minimum password length accepted by the login and register forms.
pub const MIN_PASSWORD_LEN: usize = 6;

// ── Valid value sets (O(1) lookups) ──────────────────────────

pub static VALID_PROJECT_STATUSES: LazyLock<HashSet<&str>> =
    LazyLock::new(|| ["active", "completed"].into_iter().collect());

pub static VALID_TASK_STATUSES: LazyLock<HashSet<&str>> =
    LazyLock::new(|| ["todo", "in-progress", "done"].into_iter().collect());

// ── Synonym maps ─────────────────────────────────────────────

pub static PROJECT_STATUS_SYNONYMS: LazyLock<HashMap<&str, &str>> = LazyLock::new(|| {
    [
        ("done", "completed"),
        ("complete", "completed"),
        ("finished", "completed"),
        ("closed", "completed"),
        ("open", "active"),
        ("current", "active"),
        ("ongoing", "active"),
    ]
    .into_iter()
    .collect()
});

pub static TASK_STATUS_SYNONYMS: LazyLock<HashMap<&str, &str>> = LazyLock::new(|| {
    [
        ("in_progress", "in-progress"),
        ("inprogress", "in-progress"),
        ("wip", "in-progress"),
        ("doing", "in-progress"),
        ("started", "in-progress"),
        ("open", "todo"),
        ("new", "todo"),
        ("pending", "todo"),
        ("complete", "done"),
        ("completed", "done"),
        ("finished", "done"),
        ("closed", "done"),
    ]
    .into_iter()
    .collect()
});

/// Resolve a status through the valid set and synonym map.
fn resolve_status<'a>(
    input: &str,
    valid: &HashSet<&'a str>,
    synonyms: &HashMap<&str, &'a str>,
) -> Result<&'a str> {
    let lower = input.trim().to_lowercase();

    // Tier 1: exact match
    if let Some(&v) = valid.get(lower.as_str()) {
        return Ok(v);
    }

    // Tier 2: synonym lookup
    if let Some(&canonical) = synonyms.get(lower.as_str()) {
        return Ok(canonical);
    }

    // Tier 3: closest suggestion
    let message = match find_closest_match(&lower, valid, synonyms) {
        Some(suggestion) => format!("unknown status '{input}' (did you mean: {suggestion}?)"),
        None => format!("unknown status '{input}'"),
    };
    Err(Error::validation("status", message))
}

/// Normalize a project status via exact match or synonym lookup.
pub fn normalize_project_status(input: &str) -> Result<ProjectStatus> {
    match resolve_status(input, &VALID_PROJECT_STATUSES, &PROJECT_STATUS_SYNONYMS)? {
        "completed" => Ok(ProjectStatus::Completed),
        _ => Ok(ProjectStatus::Active),
    }
}

/// Normalize a task status via exact match or synonym lookup.
pub fn normalize_task_status(input: &str) -> Result<TaskStatus> {
    match resolve_status(input, &VALID_TASK_STATUSES, &TASK_STATUS_SYNONYMS)? {
        "in-progress" => Ok(TaskStatus::InProgress),
        "done" => Ok(TaskStatus::Done),
        _ => Ok(TaskStatus::Todo),
    }
}

/// Parse a list filter: `all` or any accepted project status.
pub fn parse_project_filter(input: &str) -> Result<StatusFilter<ProjectStatus>> {
    if input.trim().eq_ignore_ascii_case("all") {
        return Ok(StatusFilter::All);
    }
    normalize_project_status(input).map(StatusFilter::Only)
}

/// Parse a list filter: `all` or any accepted task status.
pub fn parse_task_filter(input: &str) -> Result<StatusFilter<TaskStatus>> {
    if input.trim().eq_ignore_ascii_case("all") {
        return Ok(StatusFilter::All);
    }
    normalize_task_status(input).map(StatusFilter::Only)
}

/// Parse a user-supplied due date.
///
/// Accepts `YYYY-MM-DD`, an RFC 3339 timestamp, `today`, or `tomorrow`.
/// Locale formats such as `05/06/2024` are ambiguous and rejected.
pub fn parse_due_date(input: &str) -> Result<DueDate> {
    let trimmed = input.trim();
    match trimmed.to_lowercase().as_str() {
        "" => return Err(Error::validation("due_date", "Due date is required")),
        "today" => return Ok(DueDate::today()),
        "tomorrow" => return Ok(DueDate::tomorrow()),
        _ => {}
    }

    if trimmed.contains('/') || (trimmed.contains('.') && !trimmed.contains('T')) {
        return Err(Error::validation(
            "due_date",
            format!("ambiguous date '{trimmed}', use YYYY-MM-DD"),
        ));
    }

    // Reject dates like 2024-5-1 that chrono would otherwise accept
    if trimmed.len() == 10 && NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_err() {
        return Err(Error::validation(
            "due_date",
            format!("invalid date '{trimmed}'"),
        ));
    }

    DueDate::parse_wire(trimmed)
        .filter(|_| trimmed.len() >= 10)
        .ok_or_else(|| Error::validation("due_date", format!("invalid date '{trimmed}', use YYYY-MM-DD")))
}

/// Require a non-blank title, returning it trimmed.
pub fn require_title(title: Option<&str>) -> Result<String> {
    match title.map(str::trim) {
        Some(t) if !t.is_empty() => Ok(t.to_string()),
        _ => Err(Error::validation("title", "Title is required")),
    }
}

/// Ids are interpolated into URL paths, so they must be a single segment.
pub fn require_id(field: &str, id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::validation(field, format!("{field} is required")));
    }
    if id.contains(['/', '?', '#']) || id.chars().any(char::is_whitespace) {
        return Err(Error::validation(field, format!("invalid {field} '{id}'")));
    }
    Ok(())
}

/// Basic `local@domain.tld` shape check.
pub fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(Error::validation("email", "Email is required"));
    }

    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        })
        && !email.chars().any(char::is_whitespace);

    if valid {
        Ok(())
    } else {
        Err(Error::validation("email", "Invalid email"))
    }
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(Error::validation("password", "Password is required"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::validation(
            "password",
            format!("Minimum {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok(())
}

pub fn validate_confirmation(password: &str, confirm_password: &str) -> Result<()> {
    if confirm_password.is_empty() {
        return Err(Error::validation(
            "confirm_password",
            "Confirm Password is required",
        ));
    }
    if password != confirm_password {
        return Err(Error::validation("confirm_password", "Passwords must match"));
    }
    Ok(())
}

/// Validate a new project, filling the default status.
pub fn validate_project_create(draft: ProjectDraft) -> Result<ProjectDraft> {
    let title = require_title(draft.title.as_deref())?;
    Ok(ProjectDraft {
        title: Some(title),
        description: draft.description,
        status: Some(draft.status.unwrap_or_default()),
    })
}

/// Validate a partial project update.
pub fn validate_project_update(draft: ProjectDraft) -> Result<ProjectDraft> {
    if draft.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to update: pass at least one of --title, --description, --status".into(),
        ));
    }
    let title = match draft.title {
        Some(ref t) => Some(require_title(Some(t))?),
        None => None,
    };
    Ok(ProjectDraft { title, ..draft })
}

/// Validate a new task, filling the default status and due date.
pub fn validate_task_create(draft: TaskDraft) -> Result<TaskDraft> {
    let title = require_title(draft.title.as_deref())?;
    Ok(TaskDraft {
        title: Some(title),
        description: draft.description,
        status: Some(draft.status.unwrap_or_default()),
        due_date: Some(draft.due_date.unwrap_or_else(DueDate::tomorrow)),
    })
}

/// Validate a partial task update.
pub fn validate_task_update(draft: TaskDraft) -> Result<TaskDraft> {
    if draft.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to update: pass at least one of --title, --description, --status, --due"
                .into(),
        ));
    }
    let title = match draft.title {
        Some(ref t) => Some(require_title(Some(t))?),
        None => None,
    };
    Ok(TaskDraft { title, ..draft })
}

/// Find the closest matching value across valid set and synonyms.
fn find_closest_match(
    input: &str,
    valid: &HashSet<&str>,
    synonyms: &HashMap<&str, &str>,
) -> Option<String> {
    // Valid values first, then synonyms, each sorted so ties resolve the
    // same way on every run.
    let mut canonical: Vec<&str> = valid.iter().copied().collect();
    canonical.sort_unstable();
    let mut aliases: Vec<&str> = synonyms.keys().copied().collect();
    aliases.sort_unstable();

    let mut best: Option<(&str, usize)> = None;

    for v in canonical.into_iter().chain(aliases) {
        let dist = levenshtein_distance(input, v);
        if dist <= 3 && best.is_none_or(|(_, d)| dist < d) {
            // For synonyms, show what it maps to
            let shown = synonyms.get(v).copied().unwrap_or(v);
            best = Some((shown, dist));
        }
    }

    best.map(|(v, _)| v.to_string())
}

// ── Levenshtein distance ─────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_project_status() {
        assert_eq!(normalize_project_status("active").unwrap(), ProjectStatus::Active);
        assert_eq!(normalize_project_status("DONE").unwrap(), ProjectStatus::Completed);
        assert!(normalize_project_status("nonsense").is_err());
    }

    #[test]
    fn test_normalize_task_status_accepts_underscore_form() {
        assert_eq!(normalize_task_status("in_progress").unwrap(), TaskStatus::InProgress);
        assert_eq!(normalize_task_status("in-progress").unwrap(), TaskStatus::InProgress);
        assert_eq!(normalize_task_status("wip").unwrap(), TaskStatus::InProgress);
        assert_eq!(normalize_task_status("todo").unwrap(), TaskStatus::Todo);
    }

    #[test]
    fn test_unknown_status_suggests_closest() {
        let err = normalize_task_status("dnoe").unwrap_err();
        assert!(err.to_string().contains("did you mean: done"), "{err}");
    }

    #[test]
    fn test_filters() {
        assert_eq!(parse_project_filter("all").unwrap(), StatusFilter::All);
        assert_eq!(
            parse_task_filter("done").unwrap(),
            StatusFilter::Only(TaskStatus::Done)
        );
    }

    #[test]
    fn test_parse_due_date() {
        let d = parse_due_date("2024-05-01").unwrap();
        assert_eq!(d.to_wire(), "2024-05-01T00:00:00.000Z");
        let d = parse_due_date("2024-05-01T00:00:00.000Z").unwrap();
        assert_eq!(d.to_string(), "2024-05-01");
        assert!(parse_due_date("tomorrow").is_ok());
    }

    #[test]
    fn test_parse_due_date_rejects_ambiguous() {
        for bad in ["05/06/2024", "06.05.2024", "2024-5-1", "next week", ""] {
            let err = parse_due_date(bad).unwrap_err();
            assert!(
                matches!(err, Error::Validation { ref field, .. } if field == "due_date"),
                "{bad}: {err}"
            );
        }
    }

    #[test]
    fn test_credentials_rules() {
        assert!(validate_email("dev@example.com").is_ok());
        assert!(validate_email("dev@example").is_err());
        assert!(validate_email("").is_err());
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
        assert!(validate_confirmation("secret1", "secret1").is_ok());
        let err = validate_confirmation("secret1", "secret2").unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "confirm_password"));
    }

    #[test]
    fn test_require_id() {
        assert!(require_id("project_id", "665f1c2e9b1d").is_ok());
        assert!(require_id("project_id", "").is_err());
        assert!(require_id("project_id", "a/b").is_err());
    }

    #[test]
    fn test_project_create_defaults() {
        let draft = validate_project_create(ProjectDraft::titled("  Launch  ")).unwrap();
        assert_eq!(draft.title.as_deref(), Some("Launch"));
        assert_eq!(draft.status, Some(ProjectStatus::Active));
        assert!(validate_project_create(ProjectDraft::titled("   ")).is_err());
    }

    #[test]
    fn test_task_create_defaults() {
        let draft = validate_task_create(TaskDraft::titled("Write")).unwrap();
        assert_eq!(draft.status, Some(TaskStatus::Todo));
        assert_eq!(draft.due_date, Some(DueDate::tomorrow()));
    }

    #[test]
    fn test_empty_updates_rejected() {
        assert!(validate_project_update(ProjectDraft::default()).is_err());
        assert!(validate_task_update(TaskDraft::default()).is_err());
    }

    #[test]
    fn test_closest_match_ties_are_stable() {
        for _ in 0..16 {
            // Fresh collections get fresh hash seeds.
            let valid: HashSet<&str> = ["cat", "bat"].into_iter().collect();
            let synonyms: HashMap<&str, &str> = [("rat", "cat")].into_iter().collect();
            assert_eq!(
                find_closest_match("hat", &valid, &synonyms).as_deref(),
                Some("bat")
            );
        }
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("abc", "abd"), 1);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
    }
}
