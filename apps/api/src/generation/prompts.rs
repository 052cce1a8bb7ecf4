// Prompt constants for cover letter generation.
// Text is static; only the applicant's fields vary between requests.

/// System prompt for every cover letter call.
pub const COVER_LETTER_SYSTEM: &str =
    "You are an experienced career coach who writes concise, specific cover letters. \
    Write in the first person as the applicant. \
    Respond with the letter text only: no preamble, no markdown, no commentary.";

pub const COVER_LETTER_OPENING: &str = "Write a professional cover letter for a job application.";

pub const COVER_LETTER_CLOSING: &str = "Requirements for the letter:\n\
    - Address it to the hiring manager.\n\
    - Connect the applicant's strengths to the job requirements above.\n\
    - Work in the points the applicant wants to emphasize.\n\
    - Keep it under 400 words.";
