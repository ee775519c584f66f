use crate::frontmatter::Note;
use crate::value::{DynamicValue, FieldAccessor};
use std::collections::HashMap;

/// Counts each distinct value of `property`; list elements count separately.
pub fn collect_values(notes: &[Note], property: &str) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    for note in notes {
        let Some(value) = note.get_field(property) else {
            continue;
        };

        match value {
            DynamicValue::List(items) => {
                for item in &items {
                    if let Some(s) = value_to_string(item) {
                        *counts.entry(s).or_default() += 1;
                    }
                }
            }
            _ => {
                if let Some(s) = value_to_string(&value) {
                    *counts.entry(s).or_default() += 1;
                }
            }
        }
    }

    counts
}

/// With counts: `value: n` lines, most frequent first. Without: values only,
/// sorted.
pub fn format_values(counts: HashMap<String, usize>, show_count: bool) -> Vec<String> {
    let mut items: Vec<(String, usize)> = counts.into_iter().collect();

    if !show_count {
        let mut values: Vec<String> = items.into_iter().map(|(value, _)| value).collect();
        values.sort();
        return values;
    }

    items.sort_by(|(a, a_count), (b, b_count)| b_count.cmp(a_count).then_with(|| a.cmp(b)));
    items
        .into_iter()
        .map(|(value, count)| format!("{}: {}", value, count))
        .collect()
}

fn value_to_string(v: &DynamicValue) -> Option<String> {
    match v {
        DynamicValue::Null | DynamicValue::List(_) => None,
        DynamicValue::String(s) if s.is_empty() => None,
        other => Some(other.to_string()),
    }
}
