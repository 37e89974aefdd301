// Bundled default prompt texts. These seed `prompt_templates` on first boot and are
// the target of every reset. Edit live templates through the admin API, not here.

pub const PASSAGE_SYSTEM: &str = "\
You are an experienced reading curriculum writer producing original passages for \
classroom use. Write accurate, age-appropriate, engaging prose. \
You MUST respond with valid JSON only. \
Do NOT include any text outside the JSON object. \
Do NOT use markdown code fences.";

/// Replace: {passageType}, {topic}, {gradeLevel}, {wordCount}, {difficulty},
///          {additionalInstructions}
pub const PASSAGE_USER: &str = r#"Write an original {passageType} reading passage about "{topic}".

AUDIENCE: grade {gradeLevel} students
LENGTH: approximately {wordCount} words
DIFFICULTY: {difficulty}

Rules:
1. Use vocabulary and sentence structure suitable for the audience and difficulty.
2. Every factual claim must be accurate. Do not invent statistics, dates or quotations.
3. Organise the passage into short paragraphs separated by blank lines.
4. Do not include questions, answer keys or teacher notes.

Additional instructions:
{additionalInstructions}

Return a JSON object with this EXACT schema:
{
  "title": "A short, descriptive title",
  "content": "The full passage text"
}"#;

pub const QUESTION_SYSTEM: &str = "\
You are an assessment designer writing reading comprehension questions. \
Every question must be answerable from the passage alone. \
You MUST respond with a valid JSON array of question objects only. \
Do NOT include any text outside the JSON array. \
Do NOT use markdown code fences.";

/// Replace: {questionCount}, {questionTypePrompt}, {difficulty}, {passageTitle},
///          {passageText}
pub const QUESTION_USER: &str = r#"Write {questionCount} questions about the passage below.

QUESTION TYPE INSTRUCTIONS:
{questionTypePrompt}

DIFFICULTY: {difficulty}

PASSAGE TITLE: {passageTitle}
PASSAGE:
{passageText}

Return a JSON ARRAY:
[
  {
    "question": "The question text",
    "options": ["A", "B", "C", "D"],
    "answer": "The correct answer",
    "explanation": "Why the answer is correct, citing the passage"
  }
]
Use an empty "options" array for question types without choices."#;

pub const TYPE_MULTIPLE_CHOICE: &str = "\
Each question has exactly four options with one correct answer. \
Distractors must be plausible but clearly wrong to a careful reader. \
Vary the position of the correct option across the {questionCount} questions.";

pub const TYPE_TRUE_FALSE: &str = "\
Each item is a single declarative statement about the passage. \
Use options [\"True\", \"False\"]. Roughly half of the statements should be false. \
Avoid absolute words such as \"always\" or \"never\" as giveaways.";

pub const TYPE_SHORT_ANSWER: &str = "\
Each question asks for a one- or two-sentence written answer. \
The answer field holds a model answer; the explanation lists the key points a \
correct response must mention.";

pub const TYPE_FILL_IN_BLANK: &str = "\
Each item is a sentence taken or paraphrased from the passage with one key word \
replaced by \"____\". The answer is the missing word.";

pub const TYPE_VOCABULARY: &str = "\
Each question targets one word from the passage that is challenging for grade \
{gradeLevel} readers. Ask for its meaning in context and offer four options.";

pub const TYPE_MAIN_IDEA: &str = "\
Ask about the central idea of the passage or of a specific paragraph. \
Offer four options; distractors should be true details that are not the main idea.";

pub const TYPE_INFERENCE: &str = "\
Each question requires the reader to combine clues from the passage to reach a \
conclusion that is not stated directly. Offer four options and cite the clues in \
the explanation.";
