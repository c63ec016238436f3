use crate::{ai_utils::list_schema, flashcard::FlashcardItem, quiz::QuizQuestion};

pub fn build_quiz_prompt(content: &str, count: usize) -> String {
    format!(
        "Generate {count} multiple-choice questions from this text:\n\
        \"{content}\".\n\
        Format as a JSON array where each question has:\n\
        {{\n    \
            \"question\": \"The question text\",\n    \
            \"options\": [\"Option 1\", \"Option 2\", \"Option 3\", \"Option 4\"],\n    \
            \"correctAnswer\": \"Correct option text\"\n\
        }}\n\
        Every question must have exactly 4 options and correctAnswer must be copied exactly from one of them.\n\
        The array must match this JSON schema:\n{schema}\n\
        Return ONLY the JSON array with no additional text or markdown formatting.",
        schema = list_schema::<QuizQuestion>()
    )
}

pub fn build_flashcard_prompt(content: &str) -> String {
    format!(
        "Analyze the following text and generate concise flashcards that summarize all the key points:\n\
        \"{content}\".\n\n\
        Each flashcard should have:\n\
        - A term/concept (short and clear)\n\
        - A definition/explanation (concise but detailed enough to understand the concept)\n\n\
        Format as a JSON array where each flashcard has:\n\
        {{\n    \
            \"term\": \"The term or concept\",\n    \
            \"definition\": \"The definition or explanation\"\n\
        }}\n\n\
        Make sure the flashcards cover all the important concepts, so that someone could understand \
        the whole chapter by studying just these flashcards. \
        Generate as many flashcards as needed to properly cover the material - don't limit the number, \
        but keep each flashcard focused on one key concept.\n\
        The array must match this JSON schema:\n{schema}\n\
        Return ONLY the JSON array with no additional text or markdown formatting.",
        schema = list_schema::<FlashcardItem>()
    )
}

pub fn build_summary_prompt(content: &str) -> String {
    format!(
        "Summarize this text in short concise bullet points:\n\
        \"{content}\"\n\n\
        Requirements:\n\
        - Use markdown formatting with bullet points\n\
        - Each point should be 1-2 sentences\n\
        - Focus on key concepts\n\
        - Skip introductions\n\
        - Return only the bullet points\n\
        - Leave a blank line between points"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_prompt_embeds_content_and_count() {
        let prompt = build_quiz_prompt("Photosynthesis converts light to energy.", 5);
        assert!(prompt.starts_with("Generate 5 multiple-choice questions"));
        assert!(prompt.contains("\"Photosynthesis converts light to energy.\""));
        assert!(prompt.contains("\"correctAnswer\""));
        assert!(prompt.contains("correctAnswer\": {"));
        assert!(prompt.ends_with("Return ONLY the JSON array with no additional text or markdown formatting."));
    }

    #[test]
    fn prompts_are_deterministic() {
        assert_eq!(build_quiz_prompt("abc", 7), build_quiz_prompt("abc", 7));
        assert_eq!(build_flashcard_prompt("abc"), build_flashcard_prompt("abc"));
    }

    #[test]
    fn empty_content_is_accepted() {
        let prompt = build_quiz_prompt("", 5);
        assert!(prompt.contains("from this text:\n\"\""));
    }

    #[test]
    fn flashcard_prompt_does_not_limit_count() {
        let prompt = build_flashcard_prompt("Cells are small.");
        assert!(prompt.contains("\"Cells are small.\""));
        assert!(prompt.contains("don't limit the number"));
        assert!(prompt.contains("\"definition\""));
        assert!(prompt.contains("Return ONLY the JSON array"));
    }

    #[test]
    fn summary_prompt() {
        let prompt = build_summary_prompt("Cells are small.");
        assert!(prompt.contains("bullet points"));
        assert!(prompt.contains("\"Cells are small.\""));
    }
}
