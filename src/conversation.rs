//! # Conversation Module
//!
//! The single dispatch function of the bot. [`route_message`] decides what an
//! inbound message means for the current state, and [`advance`] is the one
//! total transition function over `(ConversationState, Input)`. Typed text,
//! button presses and replayed voice transcripts all go through [`advance`].
//!
//! `advance` is pure: it never talks to Telegram or the database. Whatever has
//! to be persisted or fetched is returned as an [`Effect`] for the bot layer.

use crate::dialogue::{
    ConversationState, Cursor, FormState, FuneralDraft, FuneralField, MemoryDraft, MemoryField,
    ProductCategory, ProductDraft, ProductField, RegistrationDraft, RegistrationField, RemovalStep,
};
use crate::localization::all_labels;
use crate::package_matcher::{BudgetTier, FuneralType, ServiceTag};
use crate::validation::{
    validate_date, validate_death_date, validate_email, validate_min_length, validate_passport_number,
    validate_passport_series, validate_phone, validate_price, validate_product_id, validate_question,
    ValidationError,
};

/// Normalized user input fed to [`advance`]
#[derive(Clone, Debug, PartialEq)]
pub enum Input {
    Text(String),
    Photo { file_id: String },
    Skip,
    /// Value carried by an inline button, tagged with the field it answers
    Choice { field: String, value: String },
    Done,
    Confirm,
    Change,
    /// Confirm or change button of one per-field confirmation
    ConfirmField(String),
    ChangeField(String),
    EditField(String),
    Cancel,
}

/// What the bot should tell the user after a transition
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    /// Ask for whatever the new state waits for
    Prompt,
    /// Explain the problem and ask the same step again
    Rejected(ValidationError),
    Cancelled,
    /// Offer the list of fields that can be edited
    ChooseField,
    /// The attached effect produces the answer
    Handled,
    /// A confirmed transcript with no flow to go to
    Echo(String),
    Unrecognized,
}

impl Input {
    pub fn choice(field: &str, value: &str) -> Self {
        Input::Choice {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// Persistence or lookup requested by a transition
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    SaveClient(RegistrationDraft),
    SaveFuneralForm(FuneralDraft),
    CreateMemory(MemoryDraft),
    AddProduct(ProductDraft),
    AskAssistant { question: String },
    /// Show removable products; the state moves on only when some exist
    ListRemovalCandidates { category: ProductCategory },
    /// Delete the product; the flow ends only when it existed
    RemoveProduct { category: ProductCategory, id: i64 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub next: ConversationState,
    pub reply: Reply,
    pub effect: Option<Effect>,
}

impl Step {
    fn prompt(next: ConversationState) -> Self {
        Self {
            next,
            reply: Reply::Prompt,
            effect: None,
        }
    }

    fn rejected(next: ConversationState, error: ValidationError) -> Self {
        Self {
            next,
            reply: Reply::Rejected(error),
            effect: None,
        }
    }

    fn handled(next: ConversationState, effect: Effect) -> Self {
        Self {
            next,
            reply: Reply::Handled,
            effect: Some(effect),
        }
    }
}

/// Outcome of feeding one input to a form field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Accepted {
    Advance,
    /// The value was recorded but the field keeps waiting (toggles)
    Stay,
}

/// Description of a linear form: its fields, their rules and its final effect
pub trait FormSpec: Clone + Default {
    type Field: Copy + PartialEq + 'static;

    /// Fields in the order they are asked
    const FIELDS: &'static [Self::Field];
    /// Whether the form ends with a confirmation summary
    const HAS_SUMMARY: bool;
    /// Whether every accepted value needs an explicit confirm or change
    const CONFIRM_EACH_FIELD: bool;

    fn field_from_key(key: &str) -> Option<Self::Field>;

    fn accept(&mut self, field: Self::Field, input: &Input) -> Result<Accepted, ValidationError>;

    fn finish(self) -> Effect;
}

fn text_of(input: &Input) -> Result<&str, ValidationError> {
    match input {
        Input::Text(text) | Input::Choice { value: text, .. } => Ok(text),
        Input::Skip => Err(ValidationError::SkipNotAllowed),
        _ => Err(ValidationError::UnexpectedInput),
    }
}

impl FormSpec for RegistrationDraft {
    type Field = RegistrationField;

    const FIELDS: &'static [RegistrationField] = &RegistrationField::ALL;
    const HAS_SUMMARY: bool = true;
    const CONFIRM_EACH_FIELD: bool = false;

    fn field_from_key(key: &str) -> Option<RegistrationField> {
        RegistrationField::from_key(key)
    }

    fn accept(&mut self, field: RegistrationField, input: &Input) -> Result<Accepted, ValidationError> {
        if field == RegistrationField::Email && *input == Input::Skip {
            self.email = None;
            return Ok(Accepted::Advance);
        }

        let text = text_of(input)?;
        let value = match field {
            RegistrationField::FullName => validate_min_length(text, 5)?,
            RegistrationField::Phone => validate_phone(text)?,
            RegistrationField::Email => validate_email(text)?,
            RegistrationField::BirthDate | RegistrationField::PassportIssueDate => validate_date(text)?,
            RegistrationField::PassportSeries => validate_passport_series(text)?,
            RegistrationField::PassportNumber => validate_passport_number(text)?,
            RegistrationField::PassportIssuedBy => validate_min_length(text, 5)?,
            RegistrationField::Address | RegistrationField::EmergencyContact => validate_min_length(text, 10)?,
            RegistrationField::Relationship => validate_min_length(text, 2)?,
        };
        *self.slot(field) = Some(value);
        Ok(Accepted::Advance)
    }

    fn finish(self) -> Effect {
        Effect::SaveClient(self)
    }
}

impl FormSpec for FuneralDraft {
    type Field = FuneralField;

    const FIELDS: &'static [FuneralField] = &FuneralField::ALL;
    const HAS_SUMMARY: bool = true;
    const CONFIRM_EACH_FIELD: bool = false;

    fn field_from_key(key: &str) -> Option<FuneralField> {
        FuneralField::from_key(key)
    }

    fn accept(&mut self, field: FuneralField, input: &Input) -> Result<Accepted, ValidationError> {
        match field {
            FuneralField::BodyLocation => {
                self.body_location = Some(validate_min_length(text_of(input)?, 5)?);
                Ok(Accepted::Advance)
            }
            FuneralField::FuneralType => {
                let funeral_type =
                    FuneralType::parse(text_of(input)?).ok_or(ValidationError::UnknownFuneralType)?;
                self.funeral_type = Some(funeral_type);
                Ok(Accepted::Advance)
            }
            FuneralField::Services => match input {
                Input::Choice { value: tag, .. } => {
                    let service = ServiceTag::parse(tag).ok_or(ValidationError::UnknownService)?;
                    self.toggle_service(service);
                    Ok(Accepted::Stay)
                }
                Input::Done if self.services.is_empty() => Err(ValidationError::NoServicesSelected),
                Input::Done => Ok(Accepted::Advance),
                Input::Text(list) => {
                    let mut services = Vec::new();
                    for item in list.split([',', ';', '\n']).map(str::trim).filter(|s| !s.is_empty()) {
                        let service = ServiceTag::parse(item).ok_or(ValidationError::UnknownService)?;
                        if !services.contains(&service) {
                            services.push(service);
                        }
                    }
                    if services.is_empty() {
                        return Err(ValidationError::NoServicesSelected);
                    }
                    self.services = services;
                    Ok(Accepted::Advance)
                }
                Input::Skip => Err(ValidationError::SkipNotAllowed),
                _ => Err(ValidationError::UnexpectedInput),
            },
            FuneralField::Budget => {
                let budget = BudgetTier::parse(text_of(input)?).ok_or(ValidationError::UnknownBudget)?;
                self.budget = Some(budget);
                Ok(Accepted::Advance)
            }
        }
    }

    fn finish(self) -> Effect {
        Effect::SaveFuneralForm(self)
    }
}

impl FormSpec for MemoryDraft {
    type Field = MemoryField;

    const FIELDS: &'static [MemoryField] = &MemoryField::ALL;
    const HAS_SUMMARY: bool = true;
    const CONFIRM_EACH_FIELD: bool = false;

    fn field_from_key(key: &str) -> Option<MemoryField> {
        MemoryField::from_key(key)
    }

    fn accept(&mut self, field: MemoryField, input: &Input) -> Result<Accepted, ValidationError> {
        match field {
            MemoryField::Photo => match input {
                Input::Photo { file_id } => {
                    self.photo_file_id = Some(file_id.clone());
                    Ok(Accepted::Advance)
                }
                Input::Skip => {
                    self.photo_file_id = None;
                    Ok(Accepted::Advance)
                }
                _ => Err(ValidationError::PhotoRequired),
            },
            MemoryField::Name => {
                self.name = Some(validate_min_length(text_of(input)?, 2)?);
                Ok(Accepted::Advance)
            }
            MemoryField::BirthDate => {
                let birth = validate_date(text_of(input)?)?;
                // an edited birth date must still precede a known death date
                if let Some(death) = self.death_date.as_deref() {
                    validate_death_date(death, Some(&birth))?;
                }
                self.birth_date = Some(birth);
                Ok(Accepted::Advance)
            }
            MemoryField::DeathDate => {
                self.death_date = Some(validate_death_date(text_of(input)?, self.birth_date.as_deref())?);
                Ok(Accepted::Advance)
            }
            MemoryField::MemoryText => {
                self.memory_text = Some(validate_min_length(text_of(input)?, 10)?);
                Ok(Accepted::Advance)
            }
        }
    }

    fn finish(self) -> Effect {
        Effect::CreateMemory(self)
    }
}

impl FormSpec for ProductDraft {
    type Field = ProductField;

    const FIELDS: &'static [ProductField] = &ProductField::ALL;
    const HAS_SUMMARY: bool = false;
    const CONFIRM_EACH_FIELD: bool = true;

    fn field_from_key(key: &str) -> Option<ProductField> {
        ProductField::from_key(key)
    }

    fn accept(&mut self, field: ProductField, input: &Input) -> Result<Accepted, ValidationError> {
        match field {
            ProductField::Category => {
                let category =
                    ProductCategory::parse(text_of(input)?).ok_or(ValidationError::UnknownCategory)?;
                self.category = Some(category);
            }
            ProductField::Name => self.name = Some(validate_min_length(text_of(input)?, 2)?),
            ProductField::Description => {
                self.description = match input {
                    Input::Skip => None,
                    other => Some(validate_min_length(text_of(other)?, 1)?),
                };
            }
            ProductField::Price => self.price = Some(validate_price(text_of(input)?)?),
        }
        Ok(Accepted::Advance)
    }

    fn finish(self) -> Effect {
        Effect::AddProduct(self)
    }
}

fn next_field<D: FormSpec>(field: D::Field) -> Option<D::Field> {
    let pos = D::FIELDS.iter().position(|f| *f == field)?;
    D::FIELDS.get(pos + 1).copied()
}

/// Moves past a field whose value has been accepted (and confirmed if needed)
fn after_field<D: FormSpec>(
    mut form: FormState<D, D::Field>,
    field: D::Field,
    editing: bool,
    wrap: fn(FormState<D, D::Field>) -> ConversationState,
) -> Step {
    if editing && D::HAS_SUMMARY {
        form.cursor = Cursor::Summary;
        return Step::prompt(wrap(form));
    }

    match next_field::<D>(field) {
        Some(next) => {
            form.cursor = Cursor::Field {
                field: next,
                editing: false,
            };
            Step::prompt(wrap(form))
        }
        None if D::HAS_SUMMARY => {
            form.cursor = Cursor::Summary;
            Step::prompt(wrap(form))
        }
        None => Step::handled(ConversationState::Idle, form.draft.finish()),
    }
}

/// Whether a button input was sent for `field`; typed input always is
fn answers_field<D: FormSpec>(input: &Input, field: D::Field) -> bool {
    match input {
        Input::Choice { field: key, .. } | Input::ConfirmField(key) | Input::ChangeField(key) => {
            D::field_from_key(key) == Some(field)
        }
        _ => true,
    }
}

/// Generic step of a [`FormSpec`] form
fn form_step<D: FormSpec>(
    mut form: FormState<D, D::Field>,
    input: Input,
    wrap: fn(FormState<D, D::Field>) -> ConversationState,
) -> Step {
    match form.cursor {
        Cursor::Field { field, .. } if !answers_field::<D>(&input, field) => {
            Step::rejected(wrap(form), ValidationError::UnexpectedInput)
        }
        Cursor::Field { field, editing } => match form.draft.accept(field, &input) {
            Ok(Accepted::Stay) => Step::prompt(wrap(form)),
            Ok(Accepted::Advance) if D::CONFIRM_EACH_FIELD => {
                form.cursor = Cursor::ConfirmField { field, editing };
                Step::prompt(wrap(form))
            }
            Ok(Accepted::Advance) => after_field(form, field, editing, wrap),
            Err(error) => Step::rejected(wrap(form), error),
        },
        Cursor::ConfirmField { field, .. } if !answers_field::<D>(&input, field) => {
            Step::rejected(wrap(form), ValidationError::UnexpectedInput)
        }
        Cursor::ConfirmField { field, editing } => match input {
            Input::Confirm | Input::ConfirmField(_) => after_field(form, field, editing, wrap),
            Input::Change | Input::ChangeField(_) => {
                form.cursor = Cursor::Field { field, editing };
                Step::prompt(wrap(form))
            }
            _ => Step::rejected(wrap(form), ValidationError::UnexpectedInput),
        },
        Cursor::Summary => match input {
            Input::Confirm => Step::handled(ConversationState::Idle, form.draft.finish()),
            Input::Change => Step {
                next: wrap(form),
                reply: Reply::ChooseField,
                effect: None,
            },
            Input::EditField(key) => match D::field_from_key(&key) {
                Some(field) => {
                    form.cursor = Cursor::Field { field, editing: true };
                    Step::prompt(wrap(form))
                }
                None => Step::rejected(wrap(form), ValidationError::UnexpectedInput),
            },
            _ => Step::rejected(wrap(form), ValidationError::UnexpectedInput),
        },
    }
}

fn removal_step(step: RemovalStep, input: Input) -> Step {
    let current = ConversationState::RemoveProduct(step);
    if let Input::Choice { field, .. } = &input {
        if field != step.key() {
            return Step::rejected(current, ValidationError::UnexpectedInput);
        }
    }
    match step {
        RemovalStep::ChooseCategory => match text_of(&input).map(ProductCategory::parse) {
            Ok(Some(category)) => Step::handled(current, Effect::ListRemovalCandidates { category }),
            Ok(None) => Step::rejected(current, ValidationError::UnknownCategory),
            Err(error) => Step::rejected(current, error),
        },
        RemovalStep::EnterId { category } => match text_of(&input).map(validate_product_id) {
            Ok(Ok(id)) => Step::handled(current, Effect::RemoveProduct { category, id }),
            Ok(Err(error)) | Err(error) => Step::rejected(current, error),
        },
    }
}

/// The single transition function of the bot
pub fn advance(state: ConversationState, input: Input) -> Step {
    if input == Input::Cancel {
        return Step {
            next: ConversationState::Idle,
            reply: Reply::Cancelled,
            effect: None,
        };
    }

    match state {
        ConversationState::Idle => Step {
            next: ConversationState::Idle,
            reply: Reply::Unrecognized,
            effect: None,
        },
        ConversationState::Registration(form) => form_step(form, input, ConversationState::Registration),
        ConversationState::Funeral(form) => form_step(form, input, ConversationState::Funeral),
        ConversationState::Memory(form) => form_step(form, input, ConversationState::Memory),
        ConversationState::AddProduct(form) => form_step(form, input, ConversationState::AddProduct),
        ConversationState::RemoveProduct(step) => removal_step(step, input),
        ConversationState::AiQuestion { max_chars } => {
            let current = ConversationState::AiQuestion { max_chars };
            match text_of(&input).and_then(|text| validate_question(text, max_chars)) {
                Ok(question) => Step::handled(current, Effect::AskAssistant { question }),
                Err(error) => Step::rejected(current, error),
            }
        }
        ConversationState::VoiceConfirm { transcript, resume } => match input {
            Input::Confirm if resume.is_idle() => Step {
                next: ConversationState::Idle,
                reply: Reply::Echo(transcript),
                effect: None,
            },
            Input::Confirm => advance(*resume, normalize_text(&transcript)),
            Input::Change => Step::prompt(ConversationState::VoiceEdit { resume }),
            // typing instead of pressing a button answers the interrupted step
            other => advance(*resume, other),
        },
        ConversationState::VoiceEdit { resume } => advance(*resume, input),
    }
}

/// State after a new voice transcript arrives, replacing any pending one
pub fn pending_voice(state: ConversationState, transcript: String) -> ConversationState {
    let resume = match state {
        ConversationState::VoiceConfirm { resume, .. } | ConversationState::VoiceEdit { resume } => *resume,
        other => other,
    };
    ConversationState::VoiceConfirm {
        transcript,
        resume: Box::new(resume),
    }
}

/// Start state of each flow that begins with a typed answer
pub fn registration_start() -> ConversationState {
    ConversationState::Registration(FormState::starting_at(RegistrationField::FullName))
}

pub fn funeral_start() -> ConversationState {
    ConversationState::Funeral(FormState::starting_at(FuneralField::BodyLocation))
}

pub fn memory_start() -> ConversationState {
    ConversationState::Memory(FormState::starting_at(MemoryField::Photo))
}

pub fn add_product_start() -> ConversationState {
    ConversationState::AddProduct(FormState::starting_at(ProductField::Category))
}

pub fn ai_question_start(max_chars: usize) -> ConversationState {
    ConversationState::AiQuestion { max_chars }
}

/// Registration summary prefilled from a stored profile, for editing it
pub fn registration_edit(draft: RegistrationDraft) -> ConversationState {
    ConversationState::Registration(FormState {
        draft,
        cursor: Cursor::Summary,
    })
}

/// Commands that leave any flow and open a section of the bot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuCommand {
    Start,
    MainMenu,
    Help,
    Funeral,
    Assistant,
    Shop,
    Memory,
    Registration,
    Admin,
    AdminAddProduct,
    AdminRemoveProduct,
    AdminStats,
    AdminBack,
}

impl MenuCommand {
    const SLASH: [(&'static str, MenuCommand); 9] = [
        ("/start", MenuCommand::Start),
        ("/help", MenuCommand::Help),
        ("/services", MenuCommand::Funeral),
        ("/shop", MenuCommand::Shop),
        ("/memory", MenuCommand::Memory),
        ("/ask_lawyer", MenuCommand::Assistant),
        ("/documents", MenuCommand::Assistant),
        ("/register", MenuCommand::Registration),
        ("/admin", MenuCommand::Admin),
    ];

    const LABELS: [(&'static str, MenuCommand); 8] = [
        ("menu-funeral", MenuCommand::Funeral),
        ("menu-assistant", MenuCommand::Assistant),
        ("menu-shop", MenuCommand::Shop),
        ("menu-memory", MenuCommand::Memory),
        ("menu-registration", MenuCommand::Registration),
        ("menu-admin", MenuCommand::Admin),
        ("menu-main", MenuCommand::MainMenu),
        ("menu-help", MenuCommand::Help),
    ];

    const ADMIN_LABELS: [(&'static str, MenuCommand); 4] = [
        ("admin-add-product", MenuCommand::AdminAddProduct),
        ("admin-remove-product", MenuCommand::AdminRemoveProduct),
        ("admin-stats", MenuCommand::AdminStats),
        ("admin-back", MenuCommand::AdminBack),
    ];

    /// Recognizes a slash command or a reply keyboard label.
    ///
    /// Admin panel labels are only commands for admins so that other users
    /// can type the same words into a form.
    pub fn parse(text: &str, is_admin: bool) -> Option<Self> {
        let trimmed = text.trim();

        if trimmed.starts_with('/') {
            let command = trimmed
                .split_whitespace()
                .next()
                .and_then(|c| c.split('@').next())
                .unwrap_or(trimmed)
                .to_lowercase();
            return Self::SLASH
                .iter()
                .find(|(name, _)| *name == command)
                .map(|(_, cmd)| *cmd);
        }

        let matches_label = |key: &str| all_labels(key).iter().any(|label| label == trimmed);

        if let Some((_, cmd)) = Self::LABELS.iter().find(|(key, _)| matches_label(key)) {
            return Some(*cmd);
        }
        if is_admin {
            return Self::ADMIN_LABELS
                .iter()
                .find(|(key, _)| matches_label(key))
                .map(|(_, cmd)| *cmd);
        }
        None
    }
}

/// Inbound message reduced to what routing needs
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Text(String),
    Photo { file_id: String },
    Voice,
    Other,
}

/// Decision of the router for one inbound message
#[derive(Clone, Debug, PartialEq)]
pub enum Route {
    Menu(MenuCommand),
    Advance(Input),
    Voice,
    Unrecognized,
}

pub fn is_cancel(text: &str) -> bool {
    let normalized = text.trim().to_lowercase();
    matches!(normalized.as_str(), "отмена" | "cancel" | "/cancel")
        || all_labels("button-cancel")
            .iter()
            .any(|label| label.to_lowercase() == normalized)
}

pub fn is_skip(text: &str) -> bool {
    let normalized = text.trim().to_lowercase();
    matches!(normalized.as_str(), "пропустить" | "skip")
        || all_labels("button-skip")
            .iter()
            .any(|label| label.to_lowercase() == normalized)
}

/// Turns free text into an input, recognizing the skip answer
pub fn normalize_text(text: &str) -> Input {
    if is_skip(text) {
        Input::Skip
    } else {
        Input::Text(text.to_string())
    }
}

/// Routes a message with a fixed precedence: menu command, cancel, voice,
/// input of the active state, then the unrecognized fallback.
pub fn route_message(state: &ConversationState, event: &Event, is_admin: bool) -> Route {
    if let Event::Text(text) = event {
        if let Some(cmd) = MenuCommand::parse(text, is_admin) {
            return Route::Menu(cmd);
        }
        if is_cancel(text) {
            return Route::Advance(Input::Cancel);
        }
    }

    if *event == Event::Voice {
        return Route::Voice;
    }

    if state.is_idle() {
        return Route::Unrecognized;
    }

    match event {
        Event::Text(text) => Route::Advance(normalize_text(text)),
        Event::Photo { file_id } => Route::Advance(Input::Photo {
            file_id: file_id.clone(),
        }),
        Event::Voice | Event::Other => Route::Unrecognized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_only_where_allowed() {
        let state = registration_start();
        let step = advance(state.clone(), Input::Skip);
        assert_eq!(step.next, state);
        assert_eq!(step.reply, Reply::Rejected(ValidationError::SkipNotAllowed));
    }

    #[test]
    fn test_services_toggle_stays_on_field() {
        let mut state = funeral_start();
        state = advance(state, Input::Text("Москва, морг №1".into())).next;
        state = advance(state, Input::choice("funeral_type", "cremation")).next;

        let step = advance(state, Input::choice("services", "hall"));
        assert_eq!(step.reply, Reply::Prompt);
        match &step.next {
            ConversationState::Funeral(form) => {
                assert_eq!(form.draft.services, vec![ServiceTag::Hall]);
                assert_eq!(
                    form.cursor,
                    Cursor::Field {
                        field: FuneralField::Services,
                        editing: false
                    }
                );
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn test_done_without_services_is_rejected() {
        let mut state = funeral_start();
        state = advance(state, Input::Text("Москва, морг №1".into())).next;
        state = advance(state, Input::Text("традиционные".into())).next;
        let step = advance(state.clone(), Input::Done);
        assert_eq!(step.next, state);
        assert_eq!(step.reply, Reply::Rejected(ValidationError::NoServicesSelected));
    }

    #[test]
    fn test_pending_voice_replaces_previous_transcript() {
        let first = pending_voice(registration_start(), "первый".into());
        let second = pending_voice(first, "второй".into());
        assert_eq!(
            second,
            ConversationState::VoiceConfirm {
                transcript: "второй".into(),
                resume: Box::new(registration_start()),
            }
        );
    }

    #[test]
    fn test_slash_commands_with_bot_suffix() {
        assert_eq!(MenuCommand::parse("/start@euroservice_bot", false), Some(MenuCommand::Start));
        assert_eq!(MenuCommand::parse("/documents", false), Some(MenuCommand::Assistant));
        assert_eq!(MenuCommand::parse("/unknown", false), None);
    }
}
