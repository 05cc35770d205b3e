//! LLM prompt constants for the judgment and rewrite collaborators.
//!
//! Both prompts instruct the model to return a single JSON object only.
//! Callers deserialize via `LlmClient::call_json`.

// ────────────────────────────────────────────────────────────────────────────
// Judgment prompt (story relevance vs job requirements)
// ────────────────────────────────────────────────────────────────────────────

pub const JUDGMENT_SYSTEM: &str = "\
You are a technical recruiter scoring how relevant one role from a candidate's \
history is to a specific job's requirements. Judge substance over keyword \
density: transferable depth counts, buzzword repetition does not.\n\
\n\
Respond with valid JSON only: {\"score\": 0.0, \"rationale\": \"...\"}\n\
`score` is a number between 0 and 1. Do NOT use markdown code fences. Do NOT \
add any explanation outside the JSON object.";

pub const JUDGMENT_PROMPT_TEMPLATE: &str = "\
Score the relevance of this role to the job requirements.\n\
\n\
ROLE: {role} at {company}\n\
BULLETS:\n{bullets}\n\
\n\
JOB REQUIREMENTS (weight in parentheses):\n{requirements}\n\
\n\
SCORING GUIDANCE:\n\
1. Direct, recent use of a required skill scores higher than adjacent experience\n\
2. Quantified outcomes using a required skill score higher than bare mentions\n\
3. Preferred (non-required) skills contribute, weighted less\n\
4. Ignore skills the requirements do not ask for\n\
\n\
Return JSON only: {\"score\": 0.0, \"rationale\": \"one or two sentences\"}";

// ────────────────────────────────────────────────────────────────────────────
// Rewrite prompt (shorten a bullet to a target length)
// ────────────────────────────────────────────────────────────────────────────

pub const REWRITE_SYSTEM: &str = "\
You are a resume bullet editor. Your task is to shorten a bullet to a strict \
character target while preserving its quantified outcomes and primary \
technical claim. Remove redundant words and soft qualifiers first.\n\
\n\
Respond with valid JSON only: {\"text\": \"...\"}\n\
Do NOT use markdown code fences. Do NOT add any explanation outside the JSON object.";

pub const REWRITE_PROMPT_TEMPLATE: &str = "\
Shorten this resume bullet to at most {target_chars} characters.\n\
\n\
CURRENT BULLET: {bullet_text}\n\
CURRENT LENGTH: {current_chars} characters\n\
\n\
PRIORITY ORDER (keep > remove):\n\
1. KEEP: Quantified outcomes (%, $, x multipliers, counts, time reductions)\n\
2. KEEP: The primary technical claim and action verb\n\
3. REMOVE: Redundant context phrases (\"in order to\", \"as a result of\")\n\
4. REMOVE: Soft qualifiers (\"various\", \"multiple\", \"significant\")\n\
5. REMOVE: Verbose prepositions and filler clauses\n\
\n\
The result MUST be at most {target_chars} characters. \
Return JSON only: {\"text\": \"shortened bullet text here\"}";
