use rand::Rng;
use rand::seq::SliceRandom;

use crate::suggestions::TermSuggestions;

/// Picks the terms that go into the prompt.
///
/// `more` is shuffled in place every time, even when `ok` wins and `more` is
/// never read. When `ok` has entries only `ok` is used, in the order the
/// service returned it, even if it holds fewer than `count` terms; otherwise
/// the first `count` shuffled `more` terms are used.
pub fn select_terms<R>(suggestions: &mut TermSuggestions, count: usize, rng: &mut R) -> Vec<String>
where
    R: Rng + ?Sized,
{
    suggestions.more.shuffle(rng);

    let source = if suggestions.ok.is_empty() {
        &suggestions.more
    } else {
        &suggestions.ok
    };

    source.iter().take(count).cloned().collect()
}

/// `trim(prefix) + " " + selected.join(", ")`, no length checks.
pub fn build_prompt(prefix: &str, selected: &[String]) -> String {
    format!("{} {}", prefix.trim(), selected.join(", "))
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn terms(ok: &[&str], more: &[&str]) -> TermSuggestions {
        TermSuggestions {
            ok: ok.iter().map(|s| s.to_string()).collect(),
            more: more.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_ok_wins_in_order() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut suggestions = terms(&["a", "b", "c", "d"], &["x", "y", "z"]);

        let selected = select_terms(&mut suggestions, 3, &mut rng);

        assert_eq!(selected, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_short_ok_is_not_topped_up_from_more() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut suggestions = terms(&["a"], &["x", "y", "z"]);

        assert_eq!(select_terms(&mut suggestions, 3, &mut rng), vec!["a"]);
    }

    #[test]
    fn test_more_fallback_takes_everything_available() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut suggestions = terms(&[], &["x", "y"]);

        let selected = select_terms(&mut suggestions, 5, &mut rng);

        assert_eq!(selected.len(), 2);
        let unique: HashSet<_> = selected.iter().map(String::as_str).collect();
        assert_eq!(unique, HashSet::from(["x", "y"]));
    }

    #[test]
    fn test_more_is_shuffled_even_when_ok_is_used() {
        let more: Vec<String> = (0..32).map(|i| format!("term-{i}")).collect();
        let mut suggestions = TermSuggestions {
            ok: vec!["a".to_string()],
            more: more.clone(),
        };

        select_terms(&mut suggestions, 3, &mut StdRng::seed_from_u64(1));

        assert_ne!(suggestions.more, more);
        let mut sorted = suggestions.more.clone();
        sorted.sort();
        let mut expected = more;
        expected.sort();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn test_more_fallback_varies_between_runs() {
        let more: Vec<String> = (0..20).map(|i| format!("term-{i}")).collect();

        let selections: HashSet<Vec<String>> = (0..10u64)
            .map(|seed| {
                let mut suggestions = TermSuggestions {
                    ok: Vec::new(),
                    more: more.clone(),
                };
                select_terms(&mut suggestions, 3, &mut StdRng::seed_from_u64(seed))
            })
            .collect();

        assert!(selections.len() > 1);
    }

    #[test]
    fn test_empty_suggestions() {
        let mut suggestions = TermSuggestions::default();
        assert!(select_terms(&mut suggestions, 3, &mut StdRng::seed_from_u64(0)).is_empty());
    }

    #[test]
    fn test_build_prompt() {
        let selected = vec!["cats".to_string(), "dogs".to_string()];
        assert_eq!(
            build_prompt("A comment about", &selected),
            "A comment about cats, dogs"
        );
        assert_eq!(
            build_prompt("  A comment about \n", &selected),
            "A comment about cats, dogs"
        );
        assert_eq!(build_prompt("Prefix", &["solo".to_string()]), "Prefix solo");
    }
}
