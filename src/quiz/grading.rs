use serde::Serialize;

use super::{AnswerSelection, QuizQuestion};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionResult {
    pub index: usize,
    pub correct_answer: String,
    pub user_answer: Option<String>,
    pub is_correct: bool,
}

/// Compare every answer with the question's correct answer. Exact, case
/// sensitive string equality, no trimming.
pub fn grade(questions: &[QuizQuestion], answers: &AnswerSelection) -> Vec<QuestionResult> {
    questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let user_answer = answers.get(index);
            QuestionResult {
                index,
                correct_answer: question.correct_answer.clone(),
                user_answer: user_answer.map(str::to_string),
                is_correct: user_answer == Some(question.correct_answer.as_str()),
            }
        })
        .collect()
}

/// Percentage of correct answers rounded to the nearest integer, 0 for an
/// empty quiz.
pub fn score(questions: &[QuizQuestion], answers: &AnswerSelection) -> u8 {
    if questions.is_empty() {
        return 0;
    }
    let correct = grade(questions, answers)
        .iter()
        .filter(|r| r.is_correct)
        .count();
    (correct as f64 / questions.len() as f64 * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions(n: usize) -> Vec<QuizQuestion> {
        (0..n)
            .map(|i| QuizQuestion {
                question: format!("Q{i}"),
                options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                correct_answer: "A".into(),
            })
            .collect()
    }

    #[test]
    fn three_of_five() {
        let answers = AnswerSelection::from_iter([(0, "A"), (1, "A"), (2, "B"), (3, "A"), (4, "C")]);
        assert_eq!(score(&questions(5), &answers), 60);
    }

    #[test]
    fn none_and_all() {
        let qs = questions(4);
        let wrong = AnswerSelection::from_iter((0..4).map(|i| (i, "D")));
        let right = AnswerSelection::from_iter((0..4).map(|i| (i, "A")));
        assert_eq!(score(&qs, &wrong), 0);
        assert_eq!(score(&qs, &right), 100);
    }

    #[test]
    fn rounds_to_nearest() {
        // 2/3 = 66.67 -> 67, 1/3 = 33.33 -> 33
        let qs = questions(3);
        let two = AnswerSelection::from_iter([(0, "A"), (1, "A"), (2, "B")]);
        let one = AnswerSelection::from_iter([(0, "A"), (1, "B"), (2, "B")]);
        assert_eq!(score(&qs, &two), 67);
        assert_eq!(score(&qs, &one), 33);
        // 1/8 = 12.5 -> 13
        let qs = questions(8);
        let one = AnswerSelection::from_iter([(0, "A")]);
        assert_eq!(score(&qs, &one), 13);
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let qs = questions(1);
        let answers = AnswerSelection::from_iter([(0, "a")]);
        assert_eq!(score(&qs, &answers), 0);
        let answers = AnswerSelection::from_iter([(0, " A")]);
        assert_eq!(score(&qs, &answers), 0);
    }

    #[test]
    fn empty_quiz_scores_zero() {
        assert_eq!(score(&[], &AnswerSelection::new()), 0);
    }

    #[test]
    fn per_question_results() {
        let answers = AnswerSelection::from_iter([(0, "A"), (1, "B")]);
        let results = grade(&questions(3), &answers);
        assert!(results[0].is_correct);
        assert!(!results[1].is_correct);
        assert_eq!(results[1].user_answer.as_deref(), Some("B"));
        assert_eq!(results[2].user_answer, None);
        assert!(!results[2].is_correct);
    }
}
