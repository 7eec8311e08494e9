/// Fixed templates for the two language-model calls. Kept as plain string
/// formatting: the pipeline owns the sequencing, the templates stay inert.

const STANDALONE_QUESTION_TEMPLATE: &str = "Given a question, convert it to a standalone question. question: {question} standalone question:";

const ANSWER_TEMPLATE: &str = "You are a helpful and enthusiastic support bot who can answer a given question about professional experience on the context provided. Try to find the answer in the context. If you really don't know the answer, say \"I'm sorry, I don't know the answer to that\" and direct the questioner to email support@example.com. Don't try to make up an answer. Always speak as if you were chatting to a friend.
context: {context}
question: {question}
answer:";

pub fn standalone_question_prompt(question: &str) -> String {
    STANDALONE_QUESTION_TEMPLATE.replace("{question}", question)
}

pub fn answer_prompt(context: &str, question: &str) -> String {
    ANSWER_TEMPLATE
        .replace("{context}", context)
        .replace("{question}", question)
}
