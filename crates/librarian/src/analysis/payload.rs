//! The structured analysis of one paper.
//!
//! A payload is a set of optional, independently typed sections. Any top-level section
//! this crate does not know about is kept verbatim in [`AnalysisPayload::extra`] and
//! written back unchanged, so payloads produced by newer prompts survive a round trip.
//!
//! Model output is loosely typed. Text fields therefore accept strings, numbers, `null`
//! or arrays (joined with `", "`), and list fields accept a single string as a
//! one-element list.

use std::collections::BTreeMap;

use serde::Deserializer;

use super::*;

/// Declares a section record whose fields all default when absent.
macro_rules! section {
  (
    $(#[$meta:meta])*
    $name:ident {
      $(text: $($text:ident),+;)?
      $(list: $($list:ident),+;)?
    }
  ) => {
    $(#[$meta])*
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    #[allow(missing_docs)]
    pub struct $name {
      $($(
        #[serde(deserialize_with = "lenient_text")]
        pub $text: String,
      )+)?
      $($(
        #[serde(deserialize_with = "lenient_list")]
        pub $list: Vec<String>,
      )+)?
    }
  };
}

section!(
  /// Bibliographic facts about the paper.
  BasicInfo {
    text: title, authors, journal, publisher, publish_date, doi, category;
    list: keywords;
  }
);

section!(
  /// Research background and the problem addressed.
  Background {
    text: research_background, field_pain_points, existing_methods_limitations;
  }
);

section!(
  /// What the paper sets out to answer.
  Objectives {
    text: core_research_question, scope_description;
  }
);

section!(
  /// How the work was done.
  Methodology {
    text: overall_workflow, experimental_design_logic;
    list: key_techniques, characterization_methods;
  }
);

section!(
  /// Main findings.
  KeyResults {
    text: main_findings, data_trends, supporting_evidence;
  }
);

section!(
  /// What is new compared to prior work.
  Innovation {
    text: method_innovation, mechanism_innovation, application_innovation,
      difference_from_prior_work;
  }
);

section!(
  /// Acknowledged and inferred weaknesses.
  Limitations {
    text: author_acknowledged, ai_inferred_risks;
  }
);

section!(
  /// A guide for reproducing the experiments.
  ExperimentReplication {
    text: materials_preparation, process_parameters, characterization_methods,
      evaluation_metrics;
    list: step_by_step_guide;
  }
);

section!(
  /// Suggested follow-up experiments.
  ExperimentExtension {
    text: parameter_optimization, material_system_transfer, alternative_routes;
  }
);

section!(
  /// Comparison with related work.
  ComparativeAnalysis {
    text: similar_works_comparison, performance_cost_comparison, application_scenarios;
  }
);

section!(
  /// Practical hazards when following the paper.
  RisksAndWarnings {
    list: failure_prone_steps, experimental_precautions, beginner_warnings;
  }
);

section!(
  /// Provenance of the analysis itself.
  AiMeta {
    text: analysis_model, analysis_time, confidence, analysis_depth;
  }
);

/// A complete analysis. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisPayload {
  /// Bibliographic facts, propagated onto the catalog record
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub basic_info:             Option<BasicInfo>,
  /// Background and problem
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub background_and_problem: Option<Background>,
  /// Research objectives
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub research_objectives:    Option<Objectives>,
  /// Methodology
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub methodology:            Option<Methodology>,
  /// Key results
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub key_results:            Option<KeyResults>,
  /// Innovation analysis
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub innovation_analysis:    Option<Innovation>,
  /// Limitations
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub limitations:            Option<Limitations>,
  /// Replication guide
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub experiment_replication: Option<ExperimentReplication>,
  /// Extension suggestions
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub experiment_extension:   Option<ExperimentExtension>,
  /// Comparative analysis
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub comparative_analysis:   Option<ComparativeAnalysis>,
  /// Risks and warnings
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub risks_and_warnings:     Option<RisksAndWarnings>,
  /// Analysis provenance
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ai_meta:                Option<AiMeta>,
  /// Sections this crate does not know, kept as they were
  #[serde(flatten)]
  pub extra:                  BTreeMap<String, Value>,
}

impl AnalysisPayload {
  /// Parses a stored or freshly received payload.
  ///
  /// Anything that is not a JSON object of sections is rejected as
  /// [`LibrarianError::MalformedAnalysis`].
  pub fn from_json(json: &str) -> Result<Self> {
    let value: Value =
      serde_json::from_str(json).map_err(|e| LibrarianError::MalformedAnalysis(e.to_string()))?;
    Self::from_value(value)
  }

  /// Converts an already parsed JSON value.
  pub fn from_value(value: Value) -> Result<Self> {
    if !value.is_object() {
      return Err(LibrarianError::MalformedAnalysis(format!(
        "expected a JSON object, found {}",
        json_kind(&value)
      )));
    }
    serde_json::from_value(value).map_err(|e| LibrarianError::MalformedAnalysis(e.to_string()))
  }

  /// Serializes the payload for storage.
  pub fn to_json(&self) -> Result<String> { Ok(serde_json::to_string(self)?) }

  /// Whether the analysis includes a replication guide or extension suggestions.
  pub fn has_experiment_plan(&self) -> bool {
    self.experiment_replication.is_some() || self.experiment_extension.is_some()
  }

  /// A clearly marked stand-in built from what the catalog already knows.
  ///
  /// Used by callers that prefer showing something over showing an error when the
  /// external analysis fails. The result is never stored.
  pub fn degraded(record: &CatalogRecord, reason: &str) -> Self {
    Self {
      basic_info: Some(BasicInfo {
        title: record.title.clone(),
        authors: record.authors.clone(),
        journal: record.journal.clone().unwrap_or_default(),
        publish_date: record.year.map(|year| year.to_string()).unwrap_or_default(),
        category: record.category.clone(),
        ..BasicInfo::default()
      }),
      limitations: Some(Limitations {
        author_acknowledged: String::new(),
        ai_inferred_risks:   format!("Analysis unavailable: {reason}"),
      }),
      ai_meta: Some(AiMeta {
        analysis_model: String::new(),
        analysis_time:  Utc::now().to_rfc3339(),
        confidence:     DEGRADED_CONFIDENCE.to_string(),
        analysis_depth: "none".to_string(),
      }),
      ..Self::default()
    }
  }

  /// Whether this payload was produced by [`AnalysisPayload::degraded`].
  pub fn is_degraded(&self) -> bool {
    self.ai_meta.as_ref().is_some_and(|meta| meta.confidence == DEGRADED_CONFIDENCE)
  }
}

/// `ai_meta.confidence` of a degraded payload.
pub const DEGRADED_CONFIDENCE: &str = "degraded";

fn json_kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}

/// Renders a scalar the way a human would write it.
fn value_text(value: &Value) -> String {
  match value {
    Value::Null => String::new(),
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> core::result::Result<String, D::Error> {
  Ok(match Value::deserialize(deserializer)? {
    Value::Array(items) =>
      items.iter().map(value_text).filter(|s| !s.is_empty()).collect::<Vec<_>>().join(", "),
    other => value_text(&other),
  })
}

fn lenient_list<'de, D: Deserializer<'de>>(
  deserializer: D,
) -> core::result::Result<Vec<String>, D::Error> {
  Ok(match Value::deserialize(deserializer)? {
    Value::Null => Vec::new(),
    Value::Array(items) => items.iter().map(value_text).collect(),
    Value::String(s) if s.trim().is_empty() => Vec::new(),
    other => vec![value_text(&other)],
  })
}
