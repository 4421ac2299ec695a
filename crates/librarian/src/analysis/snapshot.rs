//! Display snapshots rebuilt from a stored analysis.
//!
//! A snapshot is a sectioned, display-oriented view of an [`AnalysisPayload`]. It is
//! derived on demand, never stored, and never calls the analysis endpoint, so the
//! display format can change without paying for new analyses.
//!
//! The snapshot `version` is a content hash of the payload: the payload is serialized
//! with object keys sorted at every level, hashed with SHA-256, and the first 16 hex
//! digits are prefixed with [`VERSION_SCHEME`]. Equal payloads always share a version.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use super::*;

/// Prefix of every snapshot version.
pub const VERSION_SCHEME: &str = "v1.0";

/// Hex digits of the content hash kept in the version.
const VERSION_HASH_CHARS: usize = 16;

/// How a front end should render a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayType {
  /// Key/value facts
  Metadata,
  /// Paragraphs of prose
  TextBlock,
  /// Prose mixed with lists
  Structured,
  /// Step-by-step instructions
  Guide,
  /// Bullet lists only
  List,
}

/// One rendered section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
  /// Stable identifier, e.g. `methodology`
  pub id:           String,
  /// Human readable heading
  pub title:        String,
  /// Rendering hint
  pub display_type: DisplayType,
  /// Every known sub-field of the section, present even when empty
  pub content:      BTreeMap<String, Value>,
}

/// Counters describing a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
  /// Number of sections emitted
  pub total_sections:      usize,
  /// Whether a replication guide or extension suggestions are present
  pub has_experiment_plan: bool,
  /// Always `snapshot_rebuild`
  pub refresh_type:        String,
  /// Always `cached_analysis`
  pub source:              String,
}

/// A versioned, sectioned view of an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
  /// Content-derived version, e.g. `v1.0-3f2a9c0d41b7e855`
  pub version:                String,
  /// When this snapshot was built
  pub generated_at:           DateTime<Utc>,
  /// When the underlying analysis was produced, if recorded
  pub original_analysis_time: Option<String>,
  /// Model that produced the underlying analysis, if recorded
  pub analysis_model:         Option<String>,
  /// Sections present in the payload, in display order
  pub sections:               Vec<Section>,
  /// Counters
  pub metadata:               SnapshotMetadata,
}

/// Layout of one known payload section.
struct SectionLayout {
  /// Top-level key in the payload
  key:     &'static str,
  /// Section id in the snapshot
  id:      &'static str,
  /// Heading
  title:   &'static str,
  /// Rendering hint
  display: DisplayType,
  /// Sub-fields rendered as text
  text:    &'static [&'static str],
  /// Sub-fields rendered as lists
  lists:   &'static [&'static str],
}

/// Known sections in display order.
const SECTIONS: [SectionLayout; 11] = [
  SectionLayout {
    key:     "basic_info",
    id:      "basic_info",
    title:   "Basic Information",
    display: DisplayType::Metadata,
    text:    &["title", "authors", "journal", "publisher", "publish_date", "doi", "category"],
    lists:   &["keywords"],
  },
  SectionLayout {
    key:     "background_and_problem",
    id:      "background",
    title:   "Background and Problem",
    display: DisplayType::TextBlock,
    text:    &["research_background", "field_pain_points", "existing_methods_limitations"],
    lists:   &[],
  },
  SectionLayout {
    key:     "research_objectives",
    id:      "objectives",
    title:   "Research Objectives",
    display: DisplayType::TextBlock,
    text:    &["core_research_question", "scope_description"],
    lists:   &[],
  },
  SectionLayout {
    key:     "methodology",
    id:      "methodology",
    title:   "Methodology",
    display: DisplayType::Structured,
    text:    &["overall_workflow", "experimental_design_logic"],
    lists:   &["key_techniques", "characterization_methods"],
  },
  SectionLayout {
    key:     "key_results",
    id:      "results",
    title:   "Key Results",
    display: DisplayType::TextBlock,
    text:    &["main_findings", "data_trends", "supporting_evidence"],
    lists:   &[],
  },
  SectionLayout {
    key:     "innovation_analysis",
    id:      "innovation",
    title:   "Innovation Analysis",
    display: DisplayType::Structured,
    text:    &[
      "method_innovation",
      "mechanism_innovation",
      "application_innovation",
      "difference_from_prior_work",
    ],
    lists:   &[],
  },
  SectionLayout {
    key:     "limitations",
    id:      "limitations",
    title:   "Limitations",
    display: DisplayType::TextBlock,
    text:    &["author_acknowledged", "ai_inferred_risks"],
    lists:   &[],
  },
  SectionLayout {
    key:     "experiment_replication",
    id:      "replication",
    title:   "Experiment Replication Guide",
    display: DisplayType::Guide,
    text:    &[
      "materials_preparation",
      "process_parameters",
      "characterization_methods",
      "evaluation_metrics",
    ],
    lists:   &["step_by_step_guide"],
  },
  SectionLayout {
    key:     "experiment_extension",
    id:      "extension",
    title:   "Experiment Extension Suggestions",
    display: DisplayType::TextBlock,
    text:    &["parameter_optimization", "material_system_transfer", "alternative_routes"],
    lists:   &[],
  },
  SectionLayout {
    key:     "comparative_analysis",
    id:      "comparison",
    title:   "Comparative Analysis",
    display: DisplayType::TextBlock,
    text:    &["similar_works_comparison", "performance_cost_comparison", "application_scenarios"],
    lists:   &[],
  },
  SectionLayout {
    key:     "risks_and_warnings",
    id:      "risks",
    title:   "Risks and Warnings",
    display: DisplayType::List,
    text:    &[],
    lists:   &["failure_prone_steps", "experimental_precautions", "beginner_warnings"],
  },
];

/// Builds [`AnalysisSnapshot`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct SnapshotBuilder;

impl SnapshotBuilder {
  /// Builds a snapshot stamped with the current time.
  pub fn build(payload: &AnalysisPayload) -> Result<AnalysisSnapshot> {
    Self::build_at(payload, Utc::now())
  }

  /// Builds a snapshot stamped with `generated_at`.
  ///
  /// Everything but the timestamp depends only on the payload.
  pub fn build_at(
    payload: &AnalysisPayload,
    generated_at: DateTime<Utc>,
  ) -> Result<AnalysisSnapshot> {
    let value = serde_json::to_value(payload)?;
    let version = Self::version_of(&value);

    let sections: Vec<Section> = SECTIONS
      .iter()
      .filter_map(|layout| value.get(layout.key).map(|section| render(layout, section)))
      .collect();

    let meta = payload.ai_meta.as_ref();
    let non_empty = |s: &String| (!s.is_empty()).then(|| s.clone());

    Ok(AnalysisSnapshot {
      version,
      generated_at,
      original_analysis_time: meta.and_then(|m| non_empty(&m.analysis_time)),
      analysis_model: meta.and_then(|m| non_empty(&m.analysis_model)),
      metadata: SnapshotMetadata {
        total_sections:      sections.len(),
        has_experiment_plan: payload.has_experiment_plan(),
        refresh_type:        "snapshot_rebuild".to_string(),
        source:              "cached_analysis".to_string(),
      },
      sections,
    })
  }

  /// Content-derived version of a serialized payload.
  pub fn version_of(value: &Value) -> String {
    let mut canonical = String::new();
    write_canonical(value, &mut canonical);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{VERSION_SCHEME}-{}", &digest[..VERSION_HASH_CHARS])
  }
}

fn render(layout: &SectionLayout, section: &Value) -> Section {
  let mut content = BTreeMap::new();
  for field in layout.text {
    let text = match section.get(*field) {
      Some(Value::String(s)) => s.clone(),
      None | Some(Value::Null) => String::new(),
      Some(other) => other.to_string(),
    };
    content.insert((*field).to_string(), Value::String(text));
  }
  for field in layout.lists {
    let items = match section.get(*field) {
      Some(Value::Array(items)) => items.clone(),
      None | Some(Value::Null) => Vec::new(),
      Some(other) => vec![other.clone()],
    };
    content.insert((*field).to_string(), Value::Array(items));
  }

  Section {
    id: layout.id.to_string(),
    title: layout.title.to_string(),
    display_type: layout.display,
    content,
  }
}

/// Writes `value` as compact JSON with object keys sorted at every level.
fn write_canonical(value: &Value, out: &mut String) {
  match value {
    Value::Object(map) => {
      let mut keys: Vec<&String> = map.keys().collect();
      keys.sort();
      out.push('{');
      for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
          out.push(',');
        }
        out.push_str(&Value::String(key.clone()).to_string());
        out.push(':');
        write_canonical(&map[key], out);
      }
      out.push('}');
    },
    Value::Array(items) => {
      out.push('[');
      for (i, item) in items.iter().enumerate() {
        if i > 0 {
          out.push(',');
        }
        write_canonical(item, out);
      }
      out.push(']');
    },
    scalar => out.push_str(&scalar.to_string()),
  }
}
