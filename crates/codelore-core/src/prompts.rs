//! Prompt templates for commit summarization, file summarization, and
//! question answering.

use std::fmt::Write as _;

/// Prompt for summarizing a git diff as bullet comments.
#[must_use]
pub fn commit_summary(diff: &str) -> String {
    let mut prompt = String::from(
        "You are an expert programmer, and you are trying to summarize a git diff.\n\
         \n\
         Reminders about the git diff format:\n\
         For every file, there are a few metadata lines, for example:\n\
         '''\n\
         diff --git a/lib/index.js b/lib/index.js\n\
         index aadf691..bfef603 100644\n\
         --- a/lib/index.js\n\
         +++ b/lib/index.js\n\
         '''\n\
         This means that `lib/index.js` was modified in this commit. Note that this is only an example.\n\
         Then there is a specifier of the lines that were modified.\n\
         A line starting with `+` means it was added.\n\
         A line starting with `-` means that line was deleted.\n\
         A line that starts with neither `+` nor `-` is code given for context and better understanding.\n\
         It is not part of the diff.\n\
         \n\
         EXAMPLE SUMMARY COMMENTS:\n\
         '''\n\
         * Raised the amount of returned recordings from 10 to 100 (packages/server/recordings_api.ts, packages/server/constants.ts)\n\
         * Fixed a typo in the github action name (.github/workflows/gpt-commit-summarizer.yml)\n\
         * Moved the octokit initialization to a separate file (src/octokit.ts, src/index.ts)\n\
         * Added an OpenAI API for completions (packages/utils/apis/openai.ts)\n\
         * Lowered numeric tolerance for test files\n\
         '''\n\
         Most commits will have fewer comments than this example list.\n\
         The last comment does not include the file names because there were more than two relevant files in the hypothetical commit.\n\
         Do not include parts of the example in your summary; it is given only as an example of appropriate comments.\n\
         \n\
         Please summarise the following diff file:\n\n",
    );
    let _ = write!(prompt, "{diff}");
    prompt
}

/// Prompt for explaining one source file to a junior engineer.
#[must_use]
pub fn file_summary(file_name: &str, code: &str) -> String {
    format!(
        "You are an experienced senior software engineer specializing in onboarding junior developers onto projects.\n\
         \n\
         Your task is to help a junior engineer understand the purpose and functionality of the `{file_name}` file.\n\
         \n\
         ### Code:\n\
         ```\n\
         {code}\n\
         ```\n\
         \n\
         ### Instructions:\n\
         - Provide a concise and clear summary of what this file does.\n\
         - Keep the explanation within 150 words.\n\
         - Focus on the main purpose, key functions, and important concepts used in the code.\n\
         \n\
         Respond with the summary only, without additional commentary.\n"
    )
}

/// The reply the assistant must give when the context cannot answer the
/// question.
pub const INSUFFICIENT_CONTEXT_REPLY: &str =
    "I'm sorry, but I don't have the answer to that question based on the provided context.";

/// Prompt combining the retrieved context block with the user's question.
#[must_use]
pub fn answer_question(context: &str, question: &str) -> String {
    format!(
        "You are an AI code assistant answering questions about a codebase for a technical intern.\n\
         Only use information found in the CONTEXT BLOCK below to answer. Do not invent details that the context does not support.\n\
         If the context does not provide the answer, reply exactly: \"{INSUFFICIENT_CONTEXT_REPLY}\"\n\
         Answer in markdown, including code snippets where relevant, and be as detailed as you can.\n\
         \n\
         START CONTEXT BLOCK\n\
         {context}\n\
         END OF CONTEXT BLOCK\n\
         \n\
         START QUESTION\n\
         {question}\n\
         END OF QUESTION\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_summary_embeds_diff() {
        let prompt = commit_summary("diff --git a/x b/x\n+added line");
        assert!(prompt.contains("summarize a git diff"));
        assert!(prompt.contains("EXAMPLE SUMMARY COMMENTS"));
        assert!(prompt.ends_with("+added line"));
    }

    #[test]
    fn file_summary_embeds_name_and_code() {
        let prompt = file_summary("src/auth.rs", "fn login() {}");
        assert!(prompt.contains("`src/auth.rs`"));
        assert!(prompt.contains("fn login() {}"));
        assert!(prompt.contains("150 words"));
    }

    #[test]
    fn answer_question_frames_context_and_question() {
        let prompt = answer_question("source: a.rs", "what is a?");
        assert!(prompt.contains("START CONTEXT BLOCK\nsource: a.rs\nEND OF CONTEXT BLOCK"));
        assert!(prompt.contains("START QUESTION\nwhat is a?\nEND OF QUESTION"));
        assert!(prompt.contains(INSUFFICIENT_CONTEXT_REPLY));
    }
}
