//! 解题提示词
//!
//! 同样的页面文本与 URL 必须生成同样的提示词

use crate::infrastructure::QuizPrompt;

const SYSTEM_MESSAGE: &str = "You are a data analysis expert. Analyze quiz questions and \
provide precise answers. You always reply with a single JSON object and nothing else.";

/// 构建解题提示词
pub fn build_quiz_prompt(page_text: &str, quiz_url: &str) -> QuizPrompt {
    let user = format!(
        r#"You are an expert data analyst and quiz solver. The quiz below may involve:
- Data sourcing (downloading files, scraping websites, calling APIs)
- Data preparation (cleaning, parsing PDFs, text processing)
- Data analysis (filtering, aggregation, statistics, machine learning)
- Data visualization (charts, narratives)

QUIZ CONTENT:
{page_text}

QUIZ URL: {quiz_url}

Your task:
1. Read and understand the quiz question
2. Identify the data sources that must be accessed (URLs, APIs, files)
3. Determine the processing or analysis required
4. Calculate or determine the correct answer
5. Extract the submission URL from the quiz content

CRITICAL INSTRUCTIONS:
- The quiz content contains a submission URL (often https://.../submit). Copy it EXACTLY.
- The answer type may be boolean, number, string, base64 data URI or a JSON object.
  Use the JSON type the question expects (a number must not be quoted).
- Be precise with numbers and calculations.

Respond with a JSON object in this EXACT format:
{{
    "submit_url": "the submission endpoint URL from the quiz content",
    "answer": <your answer>,
    "reasoning": "brief explanation of your solution",
    "data_sources": ["URLs or files used"],
    "processing_steps": ["step 1", "step 2"]
}}

Output ONLY the JSON object, nothing else."#
    );

    QuizPrompt {
        system: SYSTEM_MESSAGE.to_string(),
        user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_page_and_url() {
        let prompt = build_quiz_prompt(
            "Q1. Sum the column. Submit to https://host/submit/abc",
            "https://host/quiz/1",
        );
        assert!(prompt.user.contains("Sum the column"));
        assert!(prompt.user.contains("QUIZ URL: https://host/quiz/1"));
        assert!(prompt.user.contains("\"submit_url\""));
        assert!(prompt.system.contains("JSON"));
    }

    #[test]
    fn prompt_is_deterministic() {
        let a = build_quiz_prompt("page", "https://host/quiz/1");
        let b = build_quiz_prompt("page", "https://host/quiz/1");
        assert_eq!(a, b);
    }
}
