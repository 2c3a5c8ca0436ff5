// All LLM prompt constants for the generation module.

/// System message for the cover-letter call.
pub const COVER_LETTER_SYSTEM: &str = "You craft concise, personalized cover letters.";

/// Instruction block placed ahead of the resume, sample and job description.
pub const COVER_LETTER_INSTRUCTIONS: &str = "You write concise, tailored cover letters.\n\
**Avoid em dashes (—);** use commas or periods instead.\n\
Do not mention experience that is absent from the resume.\n\
Keep the final letter to one printed page (roughly 4 short paragraphs).\n\
**Stay professional, specific, and eliminate filler.**\n\
Make sure to have a proper ending and signature area.\n\
**ONLY IF INFO IS SUPPLIED BY THE RESUME**, have a header at the top consisting of the user's name, city, email, \
and/or phone number, **only if given by resume.**\n\
**DO NOT put any placeholders in the cover letter**, leverage whatever is given only.";

/// Note appended after the sample letter section.
pub const SAMPLE_NOTE: &str =
    "Use the cover letter sample only as a stylistic reference; do not copy it.";

/// Closing line of the cover-letter prompt.
pub const DRAFT_INSTRUCTION: &str = "Draft the complete cover letter now.";

/// System prompt for the filename call. Output must be a bare snake_case stem.
pub const FILENAME_SYSTEM: &str = "You generate short, filesystem-safe PDF filenames for cover letters. \
Output ONLY the filename without extension. Use snake_case. \
Format: company_role (e.g., google_software_engineer, meta_product_manager). \
Keep it under 40 characters. No spaces, no special characters except underscores.";

/// Filename prompt template. Replace `{job_description}` before sending.
pub const FILENAME_PROMPT_TEMPLATE: &str =
    "Generate a filename for a cover letter for this job:\n\n{job_description}";
