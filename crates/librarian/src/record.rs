//! Catalog records: one entry per known paper.
//!
//! A [`CatalogRecord`] is what the catalog persists for every PDF it knows about. Its
//! bibliographic fields start out as whatever [`MetadataResolver`](crate::resolver::MetadataResolver)
//! could recover and may later be overwritten by an analysis. User-entered state (read
//! status, trash) survives reconciliation untouched.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use super::*;

/// Sentinel stored when no author information could be recovered.
pub const UNKNOWN_AUTHORS: &str = "Unknown";

/// Category assigned to every record until an analysis says otherwise.
pub const DEFAULT_CATEGORY: &str = "uncategorized";

/// Which evidence produced a record's title and authors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMethod {
  /// Derived from the file name only.
  Filename,
  /// Read from the layout of the PDF's first page.
  Pdf,
  /// Taken from an external analysis of the full text.
  Ai,
}

/// How much trust to place in resolved metadata.
///
/// Variants are declared in ascending order so that `Ord` follows the confidence ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseConfidence {
  /// Filename-only or fallback evidence.
  Low,
  /// Reserved for partially corroborated evidence.
  Medium,
  /// Layout or analysis evidence.
  High,
}

impl ParseConfidence {
  /// Raises the confidence to `other` if that is higher. Never lowers it.
  pub fn escalate(&mut self, other: ParseConfidence) {
    if other > *self {
      *self = other;
    }
  }
}

/// Reading progress as tracked by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadStatus {
  /// Not opened yet.
  #[default]
  Unread,
  /// Started but not finished.
  Reading,
  /// Finished.
  Read,
}

impl ReadStatus {
  /// The status reached by toggling: anything unfinished becomes read, read becomes unread.
  pub fn toggled(self) -> Self {
    match self {
      ReadStatus::Read => ReadStatus::Unread,
      ReadStatus::Unread | ReadStatus::Reading => ReadStatus::Read,
    }
  }
}

/// Where a record sits in its life: visible in the catalog, or in the trash.
///
/// Purging is terminal and leaves no record behind, so it has no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Lifecycle {
  /// Part of the visible catalog.
  #[default]
  Active,
  /// Soft-deleted; can be restored or purged.
  Trashed {
    /// When the record was moved to the trash.
    deleted_at: DateTime<Utc>,
  },
}

/// Implements the string, SQL and display conversions shared by the small metadata enums.
macro_rules! text_enum {
  ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
    impl $name {
      /// The canonical lowercase name, as stored in the catalog.
      pub fn as_str(&self) -> &'static str {
        match self {
          $($name::$variant => $text),+
        }
      }
    }

    impl Display for $name {
      fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
    }

    impl FromStr for $name {
      type Err = LibrarianError;

      fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
          $($text => Ok($name::$variant),)+
          other => Err(LibrarianError::InvalidValue(format!(
            "\"{}\" is not a valid {}",
            other,
            stringify!($name)
          ))),
        }
      }
    }

    impl ToSql for $name {
      fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> { Ok(ToSqlOutput::from(self.as_str())) }
    }

    impl FromSql for $name {
      fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|_| FromSqlError::InvalidType)
      }
    }
  };
}

text_enum!(ParseMethod { Filename => "filename", Pdf => "pdf", Ai => "ai" });
text_enum!(ParseConfidence { Low => "low", Medium => "medium", High => "high" });
text_enum!(ReadStatus { Unread => "unread", Reading => "reading", Read => "read" });

/// A persisted catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
  /// Stable identity, assigned on creation and never reused
  pub id:                  i64,
  /// Best known title
  pub title:               String,
  /// Author line, or [`UNKNOWN_AUTHORS`]
  pub authors:             String,
  /// Journal or venue, once known
  pub journal:             Option<String>,
  /// Publication year (import year until an analysis says otherwise)
  pub year:                Option<i32>,
  /// Subject category
  pub category:            String,
  /// Path of the backing PDF relative to the library root, with forward slashes
  pub storage_path:        Option<String>,
  /// File name the PDF had when it was imported
  pub source_filename:     Option<String>,
  /// Evidence that produced the current title
  pub parse_method:        ParseMethod,
  /// Trust in the current title and authors
  pub parse_confidence:    ParseConfidence,
  /// Reading progress
  pub read_status:         ReadStatus,
  /// Whether a well-formed analysis payload is stored
  pub ai_analyzed:         bool,
  /// Whether the stored analysis contains an experiment plan
  pub has_experiment_plan: bool,
  /// Serialized analysis payload
  pub analysis_payload:    Option<String>,
  /// When the stored analysis was produced
  pub analysis_timestamp:  Option<DateTime<Utc>>,
  /// When the record was created
  pub imported_at:         DateTime<Utc>,
  /// Active or trashed
  pub lifecycle:           Lifecycle,
}

impl CatalogRecord {
  /// Convenience flag mirroring `read_status == Read`.
  pub fn is_read(&self) -> bool { self.read_status == ReadStatus::Read }

  /// Whether the record is in the trash.
  pub fn is_deleted(&self) -> bool { matches!(self.lifecycle, Lifecycle::Trashed { .. }) }

  /// When the record was trashed, if it is.
  pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
    match self.lifecycle {
      Lifecycle::Active => None,
      Lifecycle::Trashed { deleted_at } => Some(deleted_at),
    }
  }

  /// The storage path in canonical forward-slash form.
  pub fn normalized_path(&self) -> Option<String> {
    self.storage_path.as_deref().map(normalize_path)
  }
}

/// A record that has not been inserted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
  /// Title to store
  pub title:            String,
  /// Author line to store
  pub authors:          String,
  /// Publication year placeholder
  pub year:             Option<i32>,
  /// Category placeholder
  pub category:         String,
  /// Normalized storage path
  pub storage_path:     String,
  /// Original file name
  pub source_filename:  String,
  /// Evidence behind the title
  pub parse_method:     ParseMethod,
  /// Trust in the title
  pub parse_confidence: ParseConfidence,
}

impl NewRecord {
  /// Builds a record with the default bibliographic placeholders around resolved metadata.
  ///
  /// The year defaults to the current import year, the category to [`DEFAULT_CATEGORY`].
  pub fn from_resolved(storage_path: impl AsRef<str>, metadata: ResolvedMetadata) -> Self {
    Self {
      title:            metadata.title,
      authors:          metadata.authors,
      year:             Some(Utc::now().year()),
      category:         DEFAULT_CATEGORY.to_string(),
      storage_path:     normalize_path(storage_path.as_ref()),
      source_filename:  metadata.source_filename,
      parse_method:     metadata.parse_method,
      parse_confidence: metadata.parse_confidence,
    }
  }
}

/// Canonical relative form of a storage path: forward slashes only.
pub fn normalize_path(path: &str) -> String { path.replace('\\', "/") }
