//! Event record data model
//!
//! An event exists as a record only until it is written and committed; after
//! that its truth is the markdown file plus the commit's timestamps.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use regex::Regex;

use crate::error::ValidationError;

/// Strict `YYYY-MM-DD`
static DATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Invalid date regex"));

/// Runs of characters that may not appear in a slug
static SLUG_SEPARATOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("Invalid slug regex"));

/// Front matter line: `key: value`
static FRONT_MATTER_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(title|date|type|description):\s*(.*)$").expect("Invalid front matter regex")
});

/// Media extensions embedded as images rather than linked
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Earliest date git accepts as a commit date
pub const EARLIEST_DATE: NaiveDate = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();

/// Latest date git accepts as a commit date
pub const LATEST_DATE: NaiveDate = NaiveDate::from_ymd_opt(2099, 12, 31).unwrap();

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let raw = raw.trim();
    if !DATE_REGEX.is_match(raw) {
        return Err(ValidationError::InvalidDate(raw.to_string()));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(raw.to_string()))
}

/// Lowercase ASCII slug: alphanumeric runs joined by single hyphens
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    SLUG_SEPARATOR_REGEX
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// A timeline event about to be recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub title: String,

    /// When the event happened (not when it is recorded)
    pub date: NaiveDate,

    /// Category, one of the configured event types
    pub event_type: String,

    pub description: String,

    /// Source files to copy next to the event
    pub media: Vec<PathBuf>,

    slug: String,
}

impl EventRecord {
    /// Validate raw input into a record
    ///
    /// `allowed_types` is the configured closed set of event types.
    pub fn new(
        title: &str,
        date: &str,
        event_type: &str,
        description: &str,
        allowed_types: &[String],
    ) -> Result<Self, ValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        let date = parse_date(date)?;
        if !(EARLIEST_DATE..=LATEST_DATE).contains(&date) {
            return Err(ValidationError::DateOutOfRange {
                date,
                earliest: EARLIEST_DATE,
                latest: LATEST_DATE,
            });
        }
        if !allowed_types.iter().any(|t| t == event_type) {
            return Err(ValidationError::DisallowedType {
                given: event_type.to_string(),
                allowed: allowed_types.to_vec(),
            });
        }
        let slug = slugify(title);
        if slug.is_empty() {
            return Err(ValidationError::UnsluggableTitle(title.to_string()));
        }

        Ok(Self {
            title: title.to_string(),
            date,
            event_type: event_type.to_string(),
            description: description.trim().to_string(),
            media: Vec::new(),
            slug,
        })
    }

    /// Attach media files; each must exist
    pub fn with_media(mut self, media: Vec<PathBuf>) -> Result<Self, ValidationError> {
        if let Some(missing) = media.iter().find(|p| !p.is_file()) {
            return Err(ValidationError::MediaNotFound(missing.clone()));
        }
        self.media = media;
        Ok(self)
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// `<date>_<slug>.md`
    pub fn filename(&self) -> String {
        format!("{}_{}.md", self.date, self.slug)
    }

    /// `<date>-<slug>`, the media directory next to the event file
    pub fn media_dir_name(&self) -> String {
        format!("{}-{}", self.date, self.slug)
    }

    /// Authored (and committed) time: midnight UTC on the event date
    pub fn authored_at(&self) -> DateTime<FixedOffset> {
        self.date.and_time(NaiveTime::MIN).and_utc().fixed_offset()
    }

    pub fn commit_message(&self) -> String {
        format!("Add event: {}", self.title)
    }

    /// File names the media will have once copied
    pub fn media_names(&self) -> Vec<String> {
        self.media
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect()
    }

    /// Render the event file: front matter, then a markdown body
    pub fn to_markdown(&self, events_dir: &Path) -> String {
        let media_dir = self.media_dir_name();
        let names = self.media_names();

        let mut out = String::from("---\n");
        out.push_str(&format!("title: {}\n", quote(&self.title)));
        out.push_str(&format!("date: {}\n", self.date));
        out.push_str(&format!("type: {}\n", self.event_type));
        out.push_str(&format!("description: {}\n", quote(&self.description)));
        if !names.is_empty() {
            out.push_str("media:\n");
            for name in &names {
                let path = events_dir.join(&media_dir).join(name);
                out.push_str(&format!("  - {}\n", path.to_string_lossy()));
            }
        }
        out.push_str("---\n\n");
        out.push_str(&format!("# {}\n\n", self.title));
        if !self.description.is_empty() {
            out.push_str(&format!("{}\n", self.description));
        }
        if !names.is_empty() {
            out.push('\n');
            for name in &names {
                let link = format!("{}/{}", media_dir, name);
                if is_image(name) {
                    out.push_str(&format!("![{}]({})\n", name, link));
                } else {
                    out.push_str(&format!("[{}]({})\n", name, link));
                }
            }
        }
        out
    }
}

/// An event read back from its file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSummary {
    pub date: NaiveDate,
    pub title: String,
    pub event_type: String,
    pub description: String,
    /// File name within the events directory
    pub file: String,
}

impl EventSummary {
    /// Read the front matter of an event file
    ///
    /// Returns `None` when the front matter is missing or lacks a valid date
    /// or title.
    pub fn from_markdown(file: &str, content: &str) -> Option<Self> {
        let mut lines = content.lines();
        if lines.next()?.trim() != "---" {
            return None;
        }

        let mut date = None;
        let mut title = None;
        let mut event_type = String::new();
        let mut description = String::new();
        for line in lines.take_while(|l| l.trim() != "---") {
            let Some(caps) = FRONT_MATTER_LINE_REGEX.captures(line) else {
                continue;
            };
            let value = unquote(caps[2].trim());
            match &caps[1] {
                "title" => title = Some(value),
                "date" => date = parse_date(&value).ok(),
                "type" => event_type = value,
                "description" => description = value,
                _ => {}
            }
        }

        Some(Self {
            date: date?,
            title: title?,
            event_type,
            description,
            file: file.to_string(),
        })
    }
}

fn is_image(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Double-quoted YAML scalar
fn quote(raw: &str) -> String {
    let escaped = raw
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n");
    format!("\"{}\"", escaped)
}

/// Inverse of [`quote`]; bare values are returned as-is
fn unquote(raw: &str) -> String {
    let Some(inner) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) else {
        return raw.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn types() -> Vec<String> {
        ["life", "education", "work", "travel", "health"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn record(title: &str, date: &str) -> EventRecord {
        EventRecord::new(title, date, "life", "A description", &types()).unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Moved to Lisbon"), "moved-to-lisbon");
        assert_eq!(slugify("  Hello,   World!  "), "hello-world");
        assert_eq!(slugify("Q&A -- 2024"), "q-a-2024");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_parse_date_is_strict() {
        assert!(parse_date("2024-02-29").is_ok());
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("2024-2-1").is_err());
        assert!(parse_date("01/02/2024").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_filename_and_media_dir() {
        let event = record("Started at ACME", "2021-06-01");
        assert_eq!(event.filename(), "2021-06-01_started-at-acme.md");
        assert_eq!(event.media_dir_name(), "2021-06-01-started-at-acme");
        assert_eq!(event.commit_message(), "Add event: Started at ACME");
    }

    #[test]
    fn test_authored_at_is_midnight_utc() {
        let event = record("Graduation", "2015-05-20");
        assert_eq!(event.authored_at().to_rfc3339(), "2015-05-20T00:00:00+00:00");
    }

    #[test]
    fn test_validation_errors() {
        assert_eq!(
            EventRecord::new("   ", "2024-01-01", "life", "", &types()),
            Err(ValidationError::EmptyTitle)
        );
        assert_eq!(
            EventRecord::new("Title", "Jan 1", "life", "", &types()),
            Err(ValidationError::InvalidDate("Jan 1".to_string()))
        );
        assert!(matches!(
            EventRecord::new("Title", "2024-01-01", "party", "", &types()),
            Err(ValidationError::DisallowedType { .. })
        ));
        assert!(matches!(
            EventRecord::new("???", "2024-01-01", "life", "", &types()),
            Err(ValidationError::UnsluggableTitle(_))
        ));
    }

    #[test]
    fn test_date_range_matches_commit_dates() {
        let new = |date: &str| EventRecord::new("Title", date, "life", "", &types());

        assert!(new("1970-01-01").is_ok());
        assert!(new("2099-12-31").is_ok());
        assert!(matches!(
            new("1969-12-31"),
            Err(ValidationError::DateOutOfRange { date, .. }) if date.to_string() == "1969-12-31"
        ));
        assert!(matches!(
            new("2100-01-01"),
            Err(ValidationError::DateOutOfRange { .. })
        ));
        assert_eq!(
            new("1965-05-01").unwrap_err().to_string(),
            "Date 1965-05-01 is outside the supported range 1970-01-01 to 2099-12-31"
        );
    }

    #[test]
    fn test_missing_media_rejected() {
        let err = record("Trip", "2024-01-01")
            .with_media(vec![PathBuf::from("/no/such/photo.jpg")])
            .unwrap_err();
        assert!(matches!(err, ValidationError::MediaNotFound(_)));
    }

    #[test]
    fn test_markdown_rendering() {
        let event = EventRecord::new(
            "Moved to \"Lisbon\"",
            "2022-09-01",
            "travel",
            "New city, new start",
            &types(),
        )
        .unwrap();
        assert_snapshot!(event.to_markdown(Path::new("events")), @r#"
        ---
        title: "Moved to \"Lisbon\""
        date: 2022-09-01
        type: travel
        description: "New city, new start"
        ---

        # Moved to "Lisbon"

        New city, new start
        "#);
    }

    #[test]
    fn test_markdown_rendering_with_media() {
        let mut event = record("Road trip", "2023-07-04");
        event.media = vec![PathBuf::from("/tmp/photo.JPG"), PathBuf::from("/tmp/route.gpx")];
        assert_snapshot!(event.to_markdown(Path::new("events")), @r#"
        ---
        title: "Road trip"
        date: 2023-07-04
        type: life
        description: "A description"
        media:
          - events/2023-07-04-road-trip/photo.JPG
          - events/2023-07-04-road-trip/route.gpx
        ---

        # Road trip

        A description

        ![photo.JPG](2023-07-04-road-trip/photo.JPG)
        [route.gpx](2023-07-04-road-trip/route.gpx)
        "#);
    }

    #[test]
    fn test_summary_round_trips_front_matter() {
        let event = EventRecord::new(
            "Moved to \"Lisbon\"",
            "2022-09-01",
            "travel",
            "Line one\nline two",
            &types(),
        )
        .unwrap();
        let markdown = event.to_markdown(Path::new("events"));
        let summary = EventSummary::from_markdown(&event.filename(), &markdown).unwrap();
        assert_eq!(summary.title, "Moved to \"Lisbon\"");
        assert_eq!(summary.date, event.date);
        assert_eq!(summary.event_type, "travel");
        assert_eq!(summary.description, "Line one\nline two");
        assert_eq!(summary.file, "2022-09-01_moved-to-lisbon.md");
    }

    #[test]
    fn test_summary_requires_front_matter() {
        assert!(EventSummary::from_markdown("a.md", "# Just a heading\n").is_none());
        assert!(EventSummary::from_markdown("a.md", "---\ntitle: x\n---\n").is_none());
    }
}
