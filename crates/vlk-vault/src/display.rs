//! Display-label disambiguation for site and user tables.

/// Make duplicate labels unique for display by appending `" #N"` to the
/// second and later occurrences of the same normalized text.
///
/// Normalization is trim + case-fold, so `"GitHub"` and `"github "`
/// collide. The first occurrence keeps its original label. A generated
/// suffix can itself collide with a literal label like `"a #2"`, so the
/// counter keeps bumping until the candidate is unseen.
pub fn display_labels(labels: &[String]) -> Vec<String> {
    use std::collections::{HashMap, HashSet};

    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut taken: HashSet<String> = HashSet::new();
    labels
        .iter()
        .map(|label| {
            let key = label.trim().to_lowercase();
            let count = counts.entry(key).or_insert(0);
            *count += 1;
            let mut display = if *count == 1 {
                label.clone()
            } else {
                format!("{label} #{count}")
            };
            while !taken.insert(display.trim().to_lowercase()) {
                *count += 1;
                display = format!("{label} #{count}");
            }
            display
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unique_labels_unchanged() {
        let input = labels(&["github", "bank", "mail"]);
        assert_eq!(display_labels(&input), input);
    }

    #[test]
    fn test_duplicates_get_counter_suffix() {
        let input = labels(&["github", "github", "github"]);
        assert_eq!(
            display_labels(&input),
            labels(&["github", "github #2", "github #3"])
        );
    }

    #[test]
    fn test_normalized_collision() {
        let input = labels(&["GitHub", "github "]);
        assert_eq!(display_labels(&input), labels(&["GitHub", "github  #2"]));
    }

    #[test]
    fn test_literal_label_matching_a_generated_suffix() {
        let input = labels(&["a", "a", "a #2"]);
        let output = display_labels(&input);
        assert_eq!(output, labels(&["a", "a #2", "a #2 #2"]));

        let unique: std::collections::HashSet<_> = output.iter().collect();
        assert_eq!(unique.len(), output.len());
    }

    #[test]
    fn test_literal_suffix_seen_first_is_skipped_over() {
        let input = labels(&["a #2", "a", "a"]);
        assert_eq!(
            display_labels(&input),
            labels(&["a #2", "a", "a #3"])
        );
    }

    #[test]
    fn test_interleaved_duplicates() {
        let input = labels(&["a", "b", "a", "b", "a"]);
        assert_eq!(
            display_labels(&input),
            labels(&["a", "b", "a #2", "b #2", "a #3"])
        );
    }
}
