//! Conversation state module holding the per-chat session of every flow.
//!
//! Each flow keeps a typed draft of the answers collected so far together
//! with a cursor telling which step the chat is waiting at.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

use crate::db::ClientData;
use crate::package_matcher::{BudgetTier, FuneralType, ServiceTag};

/// Represents the conversation state of a chat
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum ConversationState {
    #[default]
    Idle,
    Registration(RegistrationState),
    Funeral(FuneralState),
    Memory(MemoryState),
    AddProduct(ProductState),
    RemoveProduct(RemovalStep),
    /// Waits for a question of at most `max_chars` characters
    AiQuestion { max_chars: usize },
    /// A transcript waits for confirmation before it is replayed into `resume`
    VoiceConfirm {
        transcript: String,
        resume: Box<ConversationState>,
    },
    /// The next typed text replaces the transcript and goes to `resume`
    VoiceEdit { resume: Box<ConversationState> },
}

/// Type alias for the bot dialogue
pub type BotDialogue = Dialogue<ConversationState, InMemStorage<ConversationState>>;

/// Flow a state belongs to, used to reject buttons of flows that are not active
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Registration,
    Funeral,
    Memory,
    AddProduct,
    RemoveProduct,
    AiQuestion,
}

impl ConversationState {
    /// The flow in progress, looking through a pending voice transcript
    pub fn flow(&self) -> Option<Flow> {
        match self {
            ConversationState::Idle => None,
            ConversationState::Registration(_) => Some(Flow::Registration),
            ConversationState::Funeral(_) => Some(Flow::Funeral),
            ConversationState::Memory(_) => Some(Flow::Memory),
            ConversationState::AddProduct(_) => Some(Flow::AddProduct),
            ConversationState::RemoveProduct(_) => Some(Flow::RemoveProduct),
            ConversationState::AiQuestion { .. } => Some(Flow::AiQuestion),
            ConversationState::VoiceConfirm { resume, .. } | ConversationState::VoiceEdit { resume } => {
                resume.flow()
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, ConversationState::Idle)
    }
}

/// Where a form is waiting
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cursor<F> {
    /// Waiting for a value; `editing` returns to the summary once it is valid
    Field { field: F, editing: bool },
    /// Waiting for an explicit confirm or change of an accepted value
    ConfirmField { field: F, editing: bool },
    Summary,
}

/// Typed draft plus cursor of one form
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormState<D, F> {
    pub draft: D,
    pub cursor: Cursor<F>,
}

impl<D: Default, F> FormState<D, F> {
    pub fn starting_at(field: F) -> Self {
        Self {
            draft: D::default(),
            cursor: Cursor::Field {
                field,
                editing: false,
            },
        }
    }
}

pub type RegistrationState = FormState<RegistrationDraft, RegistrationField>;
pub type FuneralState = FormState<FuneralDraft, FuneralField>;
pub type MemoryState = FormState<MemoryDraft, MemoryField>;
pub type ProductState = FormState<ProductDraft, ProductField>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationField {
    FullName,
    Phone,
    Email,
    BirthDate,
    PassportSeries,
    PassportNumber,
    PassportIssuedBy,
    PassportIssueDate,
    Address,
    EmergencyContact,
    Relationship,
}

impl RegistrationField {
    pub const ALL: [RegistrationField; 11] = [
        RegistrationField::FullName,
        RegistrationField::Phone,
        RegistrationField::Email,
        RegistrationField::BirthDate,
        RegistrationField::PassportSeries,
        RegistrationField::PassportNumber,
        RegistrationField::PassportIssuedBy,
        RegistrationField::PassportIssueDate,
        RegistrationField::Address,
        RegistrationField::EmergencyContact,
        RegistrationField::Relationship,
    ];

    pub fn key(self) -> &'static str {
        match self {
            RegistrationField::FullName => "full_name",
            RegistrationField::Phone => "phone",
            RegistrationField::Email => "email",
            RegistrationField::BirthDate => "birth_date",
            RegistrationField::PassportSeries => "passport_series",
            RegistrationField::PassportNumber => "passport_number",
            RegistrationField::PassportIssuedBy => "passport_issued_by",
            RegistrationField::PassportIssueDate => "passport_issue_date",
            RegistrationField::Address => "address",
            RegistrationField::EmergencyContact => "emergency_contact",
            RegistrationField::Relationship => "relationship",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

/// Answers of the client registration form
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationDraft {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<String>,
    pub passport_series: Option<String>,
    pub passport_number: Option<String>,
    pub passport_issued_by: Option<String>,
    pub passport_issue_date: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub relationship: Option<String>,
}

impl RegistrationDraft {
    pub fn value(&self, field: RegistrationField) -> Option<&str> {
        match field {
            RegistrationField::FullName => self.full_name.as_deref(),
            RegistrationField::Phone => self.phone.as_deref(),
            RegistrationField::Email => self.email.as_deref(),
            RegistrationField::BirthDate => self.birth_date.as_deref(),
            RegistrationField::PassportSeries => self.passport_series.as_deref(),
            RegistrationField::PassportNumber => self.passport_number.as_deref(),
            RegistrationField::PassportIssuedBy => self.passport_issued_by.as_deref(),
            RegistrationField::PassportIssueDate => self.passport_issue_date.as_deref(),
            RegistrationField::Address => self.address.as_deref(),
            RegistrationField::EmergencyContact => self.emergency_contact.as_deref(),
            RegistrationField::Relationship => self.relationship.as_deref(),
        }
    }

    pub fn slot(&mut self, field: RegistrationField) -> &mut Option<String> {
        match field {
            RegistrationField::FullName => &mut self.full_name,
            RegistrationField::Phone => &mut self.phone,
            RegistrationField::Email => &mut self.email,
            RegistrationField::BirthDate => &mut self.birth_date,
            RegistrationField::PassportSeries => &mut self.passport_series,
            RegistrationField::PassportNumber => &mut self.passport_number,
            RegistrationField::PassportIssuedBy => &mut self.passport_issued_by,
            RegistrationField::PassportIssueDate => &mut self.passport_issue_date,
            RegistrationField::Address => &mut self.address,
            RegistrationField::EmergencyContact => &mut self.emergency_contact,
            RegistrationField::Relationship => &mut self.relationship,
        }
    }
}

impl From<&RegistrationDraft> for ClientData {
    fn from(draft: &RegistrationDraft) -> Self {
        ClientData {
            full_name: draft.full_name.clone(),
            phone: draft.phone.clone(),
            email: draft.email.clone(),
            birth_date: draft.birth_date.clone(),
            passport_series: draft.passport_series.clone(),
            passport_number: draft.passport_number.clone(),
            passport_issued_by: draft.passport_issued_by.clone(),
            passport_issue_date: draft.passport_issue_date.clone(),
            address: draft.address.clone(),
            emergency_contact: draft.emergency_contact.clone(),
            relationship: draft.relationship.clone(),
        }
    }
}

impl From<&ClientData> for RegistrationDraft {
    fn from(data: &ClientData) -> Self {
        RegistrationDraft {
            full_name: data.full_name.clone(),
            phone: data.phone.clone(),
            email: data.email.clone(),
            birth_date: data.birth_date.clone(),
            passport_series: data.passport_series.clone(),
            passport_number: data.passport_number.clone(),
            passport_issued_by: data.passport_issued_by.clone(),
            passport_issue_date: data.passport_issue_date.clone(),
            address: data.address.clone(),
            emergency_contact: data.emergency_contact.clone(),
            relationship: data.relationship.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FuneralField {
    BodyLocation,
    FuneralType,
    Services,
    Budget,
}

impl FuneralField {
    pub const ALL: [FuneralField; 4] = [
        FuneralField::BodyLocation,
        FuneralField::FuneralType,
        FuneralField::Services,
        FuneralField::Budget,
    ];

    pub fn key(self) -> &'static str {
        match self {
            FuneralField::BodyLocation => "body_location",
            FuneralField::FuneralType => "funeral_type",
            FuneralField::Services => "services",
            FuneralField::Budget => "budget",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

/// Answers of the funeral intake form
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FuneralDraft {
    pub body_location: Option<String>,
    pub funeral_type: Option<FuneralType>,
    pub services: Vec<ServiceTag>,
    pub budget: Option<BudgetTier>,
}

impl FuneralDraft {
    /// Adds the service when missing, removes it otherwise
    pub fn toggle_service(&mut self, service: ServiceTag) {
        if let Some(pos) = self.services.iter().position(|s| *s == service) {
            self.services.remove(pos);
        } else {
            self.services.push(service);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryField {
    Photo,
    Name,
    BirthDate,
    DeathDate,
    MemoryText,
}

impl MemoryField {
    pub const ALL: [MemoryField; 5] = [
        MemoryField::Photo,
        MemoryField::Name,
        MemoryField::BirthDate,
        MemoryField::DeathDate,
        MemoryField::MemoryText,
    ];

    pub fn key(self) -> &'static str {
        match self {
            MemoryField::Photo => "photo",
            MemoryField::Name => "name",
            MemoryField::BirthDate => "birth_date",
            MemoryField::DeathDate => "death_date",
            MemoryField::MemoryText => "memory_text",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

/// Answers of the memory record form
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryDraft {
    /// Telegram file id of the photo, downloaded only when the record is created
    pub photo_file_id: Option<String>,
    pub name: Option<String>,
    pub birth_date: Option<String>,
    pub death_date: Option<String>,
    pub memory_text: Option<String>,
}

/// Catalog category a product belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Coffin,
    Wreath,
    Cross,
}

impl ProductCategory {
    pub const ALL: [ProductCategory; 3] = [
        ProductCategory::Coffin,
        ProductCategory::Wreath,
        ProductCategory::Cross,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProductCategory::Coffin => "coffin",
            ProductCategory::Wreath => "wreath",
            ProductCategory::Cross => "cross",
        }
    }

    /// Accepts the stored tag or a typed Russian category name
    pub fn parse(input: &str) -> Option<Self> {
        let normalized = input.trim().to_lowercase();
        if let Some(category) = Self::ALL.into_iter().find(|c| c.as_str() == normalized) {
            return Some(category);
        }
        if normalized.contains("гроб") {
            Some(ProductCategory::Coffin)
        } else if normalized.contains("вен") {
            Some(ProductCategory::Wreath)
        } else if normalized.contains("крест") {
            Some(ProductCategory::Cross)
        } else {
            None
        }
    }

    pub fn label_key(self) -> &'static str {
        match self {
            ProductCategory::Coffin => "category-coffin",
            ProductCategory::Wreath => "category-wreath",
            ProductCategory::Cross => "category-cross",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductField {
    Category,
    Name,
    Description,
    Price,
}

impl ProductField {
    pub const ALL: [ProductField; 4] = [
        ProductField::Category,
        ProductField::Name,
        ProductField::Description,
        ProductField::Price,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ProductField::Category => "category",
            ProductField::Name => "name",
            ProductField::Description => "description",
            ProductField::Price => "price",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

/// Product being added from the admin panel
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub category: Option<ProductCategory>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
}

/// Steps of the admin product removal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalStep {
    ChooseCategory,
    EnterId { category: ProductCategory },
}

impl RemovalStep {
    pub const ID_KEY: &'static str = "id";

    /// Key of the value the step waits for, matched against button payloads
    pub fn key(self) -> &'static str {
        match self {
            RemovalStep::ChooseCategory => "category",
            RemovalStep::EnterId { .. } => Self::ID_KEY,
        }
    }
}
