use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::Question;

/// Display order for a question's answers: every correct and incorrect
/// string exactly once, shuffled with the thread-local RNG.
pub fn shuffle_answers(question: &Question) -> Vec<String> {
    shuffle_answers_with(question, &mut rand::rng())
}

pub fn shuffle_answers_with<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> Vec<String> {
    let mut answers: Vec<String> = question
        .correct_answer
        .iter()
        .chain(question.incorrect_answers.iter())
        .cloned()
        .collect();
    answers.shuffle(rng);
    answers
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn question() -> Question {
        Question {
            category: "Science".to_string(),
            kind: "multiple".to_string(),
            difficulty: "medium".to_string(),
            question: "Which are noble gases?".to_string(),
            correct_answer: vec!["Neon".to_string(), "Argon".to_string()],
            incorrect_answers: vec![
                "Oxygen".to_string(),
                "Nitrogen".to_string(),
                "Hydrogen".to_string(),
            ],
            image: None,
        }
    }

    fn sorted(mut answers: Vec<String>) -> Vec<String> {
        answers.sort();
        answers
    }

    #[test]
    fn test_output_is_permutation_of_input() {
        let q = question();
        let mut expected: Vec<String> = q
            .correct_answer
            .iter()
            .chain(q.incorrect_answers.iter())
            .cloned()
            .collect();
        expected.sort();

        for _ in 0..50 {
            assert_eq!(sorted(shuffle_answers(&q)), expected);
        }
    }

    #[test]
    fn test_duplicate_strings_are_kept() {
        let mut q = question();
        q.incorrect_answers = vec!["Oxygen".to_string(), "Oxygen".to_string()];

        let shuffled = shuffle_answers(&q);
        assert_eq!(shuffled.len(), 4);
        assert_eq!(shuffled.iter().filter(|a| *a == "Oxygen").count(), 2);
    }

    #[test]
    fn test_only_correct_answers() {
        let mut q = question();
        q.incorrect_answers.clear();
        assert_eq!(
            sorted(shuffle_answers(&q)),
            vec!["Argon".to_string(), "Neon".to_string()]
        );
    }

    #[test]
    fn test_same_seed_same_order() {
        let q = question();
        let a = shuffle_answers_with(&q, &mut StdRng::seed_from_u64(7));
        let b = shuffle_answers_with(&q, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_order_varies_between_calls() {
        let q = question();
        let orders: HashSet<Vec<String>> = (0..64).map(|_| shuffle_answers(&q)).collect();
        assert!(orders.len() > 1);
    }
}
