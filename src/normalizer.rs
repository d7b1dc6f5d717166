//! Input normalization
//!
//! Every input source converges on a single [`CanonicalRow`] shape:
//! - Reference data: first row of the loaded dataset
//! - Uploaded file: first data row of any delimited file with a header
//! - Questionnaire: one 0/1 value per yes/no question
//!
//! No range checks are applied; values are forwarded as read.

use std::path::Path;

use crate::error::ScreenError;
use crate::table::ReferenceTable;
use crate::types::{CanonicalRow, InputMethod, Value};

/// Version of [`QUESTIONS`]. Bump whenever the list changes, since its length
/// is the length of every questionnaire row.
pub const QUESTIONNAIRE_VERSION: u32 = 1;

/// Ordered yes/no screening questions
pub const QUESTIONS: [&str; 23] = [
    "Do you snore loudly?",
    "Do you feel tired during the day?",
    "Has anyone said you stop breathing while asleep?",
    "Do you wake up gasping or choking?",
    "Do you have high blood pressure?",
    "Do you frequently wake up feeling short of breath?",
    "Do you have a dry mouth or sore throat when you wake up?",
    "Do you often have trouble staying awake during the day?",
    "Do you experience headaches upon waking?",
    "Do you experience restless sleep or toss and turn frequently?",
    "Have you had difficulty concentrating or memory problems during the day?",
    "Do you have difficulty staying awake while driving or watching TV?",
    "Have you ever been told you stop breathing while asleep?",
    "Do you have a history of diabetes?",
    "Do you have a family history of sleep apnea or other sleep disorders?",
    "Have you been diagnosed with any other sleep disorders, such as insomnia?",
    "Do you have heart disease or a history of heart problems?",
    "Do you experience acid reflux or heartburn, especially at night?",
    "Do you smoke or have a history of smoking?",
    "Do you consume alcohol frequently?",
    "Do you consume caffeine, especially in the late afternoon or evening?",
    "Do you follow an irregular sleep schedule or work night shifts?",
    "Do you have nasal congestion or difficulty breathing through your nose?",
];

/// Shown after a response that is neither yes nor no
pub const REPROMPT_MESSAGE: &str = "Please answer with 'yes' or 'no'.";

const USER_INPUT_DETAILS: &str = "User Input";

/// Supplies questionnaire responses one prompt at a time.
///
/// Returning `None` means the response stream has ended.
pub trait AnswerSource {
    fn ask(&mut self, prompt: &str) -> Option<String>;

    /// Called after a response was rejected, before the prompt is repeated
    fn rejected(&mut self, _response: &str) {}
}

/// Replays a fixed list of responses, useful for scripted input and tests
#[derive(Debug, Clone, Default)]
pub struct ScriptedAnswers {
    responses: std::collections::VecDeque<String>,
    prompts_seen: usize,
}

impl ScriptedAnswers {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: responses.into_iter().map(Into::into).collect(),
            prompts_seen: 0,
        }
    }

    /// Number of times a prompt was asked, re-prompts included
    pub fn prompts_seen(&self) -> usize {
        self.prompts_seen
    }
}

impl AnswerSource for ScriptedAnswers {
    fn ask(&mut self, _prompt: &str) -> Option<String> {
        self.prompts_seen += 1;
        self.responses.pop_front()
    }
}

/// A versioned list of yes/no prompts
#[derive(Debug, Clone, Copy)]
pub struct Questionnaire<'a> {
    questions: &'a [&'a str],
}

impl Default for Questionnaire<'static> {
    fn default() -> Self {
        Self {
            questions: &QUESTIONS,
        }
    }
}

impl<'a> Questionnaire<'a> {
    pub fn new(questions: &'a [&'a str]) -> Self {
        Self { questions }
    }

    pub fn questions(&self) -> &[&'a str] {
        self.questions
    }

    /// Length of the rows this questionnaire produces
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Ask every question in order, repeating a question until it gets a
    /// valid answer. Only the end of the response stream stops collection.
    pub fn collect(&self, answers: &mut dyn AnswerSource) -> Result<Vec<bool>, ScreenError> {
        let mut collected = Vec::with_capacity(self.questions.len());

        for question in self.questions {
            let prompt = format!("{} (yes/no): ", question);
            loop {
                let response = answers.ask(&prompt).ok_or(ScreenError::AnswersExhausted {
                    answered: collected.len(),
                    total: self.questions.len(),
                })?;

                if let Some(answer) = parse_answer(&response) {
                    collected.push(answer);
                    break;
                }
                tracing::warn!(response = %response.trim(), "rejected questionnaire response");
                answers.rejected(&response);
            }
        }

        Ok(collected)
    }
}

/// Accepts exactly "yes" or "no", ignoring case and surrounding whitespace
pub fn parse_answer(response: &str) -> Option<bool> {
    let response = response.trim();
    if response.eq_ignore_ascii_case("yes") {
        Some(true)
    } else if response.eq_ignore_ascii_case("no") {
        Some(false)
    } else {
        None
    }
}

/// Where a detection request takes its features from
pub enum InputSource<'a> {
    Reference(&'a ReferenceTable),
    Upload(&'a Path),
    Questionnaire(Questionnaire<'a>, &'a mut dyn AnswerSource),
}

/// Normalizer for converting any input source to a canonical row
pub struct Normalizer;

impl Normalizer {
    /// Normalize any supported input source
    pub fn normalize(source: InputSource<'_>) -> Result<CanonicalRow, ScreenError> {
        match source {
            InputSource::Reference(table) => Self::from_reference(table),
            InputSource::Upload(path) => Self::from_upload(path),
            InputSource::Questionnaire(questionnaire, answers) => {
                Self::from_questionnaire(&questionnaire, answers)
            }
        }
    }

    /// First row of the reference dataset, tagged with the dataset path
    pub fn from_reference(table: &ReferenceTable) -> Result<CanonicalRow, ScreenError> {
        first_row(table, InputMethod::SampleData, table.path())
    }

    /// First data row of a user-supplied delimited file
    pub fn from_upload(path: &Path) -> Result<CanonicalRow, ScreenError> {
        let table = ReferenceTable::load(path)?;
        first_row(&table, InputMethod::UploadFile, &path.display().to_string())
    }

    /// One 1/0 value per question, in question order
    pub fn from_questionnaire(
        questionnaire: &Questionnaire<'_>,
        answers: &mut dyn AnswerSource,
    ) -> Result<CanonicalRow, ScreenError> {
        let values = questionnaire
            .collect(answers)?
            .into_iter()
            .map(|yes| Value::Integer(i64::from(yes)))
            .collect();

        Ok(CanonicalRow::new(
            InputMethod::AnswerQuestions,
            USER_INPUT_DETAILS,
            None,
            values,
        ))
    }
}

fn first_row(
    table: &ReferenceTable,
    method: InputMethod,
    details: &str,
) -> Result<CanonicalRow, ScreenError> {
    let values = table.row(0).ok_or_else(|| ScreenError::EmptyTable {
        source_name: details.to_string(),
    })?;
    tracing::debug!(method = %method, details, features = values.len(), "normalized input");

    Ok(CanonicalRow::new(
        method,
        details,
        Some(table.column_names()),
        values,
    ))
}
