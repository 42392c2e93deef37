use crate::workflows::efficiency::domain::BuildingType;

const RECOMMENDATIONS_TITLE: &str = "Recommendations";
const EXPLANATION_TITLE: &str = "Explanation";
const UNSPLIT_EXPLANATION_SHARE: f64 = 0.6;

pub(crate) fn analysis_heading(building_type: &BuildingType) -> String {
    format!("Energy Efficiency Analysis for {} Building", building_type.label())
}

/// Splits generated text into explanation and recommendations on their headings.
///
/// A heading is a line holding only the section title, optionally behind any number of
/// `#`, wrapped in `**` or followed by a colon. Text without a recommendations heading is
/// cut at 60% of its length on a character boundary. `heading` titles the explanation
/// when the text does not open with one of its own.
pub(crate) fn split_sections(text: &str, heading: &str) -> (String, String) {
    let (explanation, recommendations) = match split_at_heading(text, RECOMMENDATIONS_TITLE) {
        Some((head, tail)) => (head, tail.trim().to_string()),
        None => {
            let cut = char_boundary_at(text, UNSPLIT_EXPLANATION_SHARE);
            (&text[..cut], text[cut..].trim().to_string())
        }
    };

    let explanation = explanation
        .lines()
        .filter(|line| !is_heading(line, EXPLANATION_TITLE))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    let explanation = if explanation.is_empty() || explanation.starts_with('#') {
        explanation
    } else {
        format!("## {heading}\n\n{explanation}")
    };

    let recommendations = if recommendations.is_empty() {
        "## Recommended Actions\n\nSee the explanation above.".to_string()
    } else if recommendations.starts_with('#') {
        recommendations
    } else {
        format!("## Recommended Actions\n\n{recommendations}")
    };

    (explanation, recommendations)
}

/// Text before and after the first line that is a `title` heading.
fn split_at_heading<'a>(text: &'a str, title: &str) -> Option<(&'a str, &'a str)> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if is_heading(line, title) {
            return Some((&text[..offset], &text[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

fn is_heading(line: &str, title: &str) -> bool {
    line.trim()
        .trim_start_matches('#')
        .trim()
        .trim_matches('*')
        .trim()
        .trim_end_matches(':')
        .trim_end()
        .eq_ignore_ascii_case(title)
}

fn char_boundary_at(text: &str, share: f64) -> usize {
    let target = (text.len() as f64 * share) as usize;
    (target..=text.len())
        .find(|index| text.is_char_boundary(*index))
        .unwrap_or(text.len())
}
