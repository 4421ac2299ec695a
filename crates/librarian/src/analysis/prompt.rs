//! The analysis prompt.

/// Placeholder replaced by the paper's text.
const CONTENT_PLACEHOLDER: &str = "{paper_content}";

/// Appended when the paper's text was cut to fit the prompt.
pub const TRUNCATION_MARKER: &str = "\n\n[Content truncated due to length...]";

/// Instructions and answer skeleton sent with every paper.
const TEMPLATE: &str = r#"You are an experienced researcher reviewing a scientific paper for a colleague who wants to understand it and possibly reproduce it.

Read the paper below and answer with a single JSON object, and nothing else, using exactly this structure:

{
  "basic_info": {
    "title": "full title of the paper",
    "authors": "author names separated by commas",
    "journal": "journal or venue",
    "publisher": "publisher",
    "publish_date": "YYYY or YYYY-MM",
    "doi": "DOI if present",
    "category": "one short subject category",
    "keywords": ["keyword"]
  },
  "background_and_problem": {
    "research_background": "",
    "field_pain_points": "",
    "existing_methods_limitations": ""
  },
  "research_objectives": {
    "core_research_question": "",
    "scope_description": ""
  },
  "methodology": {
    "overall_workflow": "",
    "experimental_design_logic": "",
    "key_techniques": [""],
    "characterization_methods": [""]
  },
  "key_results": {
    "main_findings": "",
    "data_trends": "",
    "supporting_evidence": ""
  },
  "innovation_analysis": {
    "method_innovation": "",
    "mechanism_innovation": "",
    "application_innovation": "",
    "difference_from_prior_work": ""
  },
  "limitations": {
    "author_acknowledged": "",
    "ai_inferred_risks": ""
  },
  "experiment_replication": {
    "materials_preparation": "",
    "process_parameters": "",
    "characterization_methods": "",
    "evaluation_metrics": "",
    "step_by_step_guide": ["step 1"]
  },
  "experiment_extension": {
    "parameter_optimization": "",
    "material_system_transfer": "",
    "alternative_routes": ""
  },
  "comparative_analysis": {
    "similar_works_comparison": "",
    "performance_cost_comparison": "",
    "application_scenarios": ""
  },
  "risks_and_warnings": {
    "failure_prone_steps": [""],
    "experimental_precautions": [""],
    "beginner_warnings": [""]
  }
}

Leave a field empty rather than guessing. Omit "experiment_replication" and "experiment_extension" if the paper describes no experiments.

Paper:

{paper_content}"#;

/// Frames extracted pages as `=== Page N ===` blocks and cuts the result at `max_chars`
/// characters, marking the cut with [`TRUNCATION_MARKER`].
pub fn frame_pages(pages: &[String], max_chars: usize) -> String {
  let text: String = pages
    .iter()
    .enumerate()
    .filter(|(_, page)| !page.trim().is_empty())
    .map(|(i, page)| format!("=== Page {} ===\n{}\n\n", i + 1, page.trim()))
    .collect();
  let text = text.trim_end();

  match text.char_indices().nth(max_chars) {
    Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &text[..cut]),
    None => text.to_string(),
  }
}

/// The full prompt for one paper.
pub fn analysis_prompt(paper_content: &str) -> String {
  TEMPLATE.replace(CONTENT_PLACEHOLDER, paper_content)
}
