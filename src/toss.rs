//! Picking who pays.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::template::ReplyBook;

#[derive(Debug, thiserror::Error)]
pub enum TossError {
    #[error("no names to toss between")]
    EmptyList,

    #[error("rendering reply: {0}")]
    Render(#[from] minijinja::Error),
}

/// Choose a name uniformly at random and phrase the result with a random
/// reply template. Every call is independent of the previous ones.
pub fn toss<R: Rng + ?Sized>(
    names: &[String],
    replies: &ReplyBook,
    rng: &mut R,
) -> Result<String, TossError> {
    let payer = names.choose(rng).ok_or(TossError::EmptyList)?;
    Ok(replies.render_random(payer, rng)?)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn plain_replies() -> ReplyBook {
        ReplyBook::new(vec!["{{ name }}".into()]).unwrap()
    }

    #[test]
    fn empty_list_is_refused() {
        let mut rng = StdRng::seed_from_u64(7);
        let err = toss(&[], &plain_replies(), &mut rng).unwrap_err();
        assert!(matches!(err, TossError::EmptyList));
    }

    #[test]
    fn single_name_always_wins() {
        let names = vec!["Ann".to_string()];
        let replies =
            ReplyBook::new(vec!["{{ name }} pays".into(), "go {{ name }}".into()]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let reply = toss(&names, &replies, &mut rng).unwrap();
            assert!(reply == "Ann pays" || reply == "go Ann", "unexpected reply {reply:?}");
        }
    }

    #[test]
    fn selection_is_roughly_uniform() {
        let names: Vec<String> =
            ["Ann", "Bob", "Cy", "Dee"].iter().map(ToString::to_string).collect();
        let replies = plain_replies();
        let mut rng = StdRng::seed_from_u64(42);
        let draws = 40_000;

        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..draws {
            *counts.entry(toss(&names, &replies, &mut rng).unwrap()).or_default() += 1;
        }

        let expected = draws / names.len();
        assert_eq!(counts.len(), names.len());
        for name in &names {
            let seen = counts[name];
            // ~7 standard deviations either side of the mean
            assert!(
                seen.abs_diff(expected) < 600,
                "{name} drawn {seen} times, expected about {expected}"
            );
        }
    }

    #[test]
    fn every_template_gets_used() {
        let names = vec!["Ann".to_string()];
        let replies = ReplyBook::new(vec![
            "a {{ name }}".into(),
            "b {{ name }}".into(),
            "c {{ name }}".into(),
        ])
        .unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..300 {
            seen.insert(toss(&names, &replies, &mut rng).unwrap());
        }
        assert_eq!(seen.len(), 3);
    }
}
